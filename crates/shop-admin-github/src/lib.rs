pub mod content;
pub mod file_host;

pub use file_host::{GitHubFileHost, GitHubFileHostConfig};
