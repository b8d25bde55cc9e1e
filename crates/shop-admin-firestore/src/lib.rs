pub mod auth;
pub mod client;
pub mod value;
mod wire;

pub use auth::{AuthClient, AuthConfig, AuthError, Session};
pub use client::{FirestoreConfig, FirestoreStore};
