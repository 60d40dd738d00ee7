pub mod config;
pub mod error;
pub mod types;

pub use config::{AdapterConfig, BuildMode, ImageFormat, ImagesConfig, RemotePattern};
pub use error::{BundlingFailure, PackError, PackResult};
pub use types::*;
