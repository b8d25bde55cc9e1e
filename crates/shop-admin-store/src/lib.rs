mod schema;
pub mod settings;

pub use settings::{CredentialUpdate, SettingsError, SettingsStore, ViewMode};
