pub mod format;
pub mod github;
pub mod image;
pub mod products;
pub mod reviews;
pub mod session;
