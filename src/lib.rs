pub mod auth;
pub mod cache;
pub mod config;
pub mod error;
pub mod files;
pub mod http;
pub mod img;
pub mod preview;

mod types;

pub use config::PreviewSettings;
pub use error::{PreviewError, Result};
pub use types::*;
