mod cache;
pub mod commands;
pub mod config;
pub mod constants;
pub mod dashcam;
pub mod error;
pub mod file;
mod keepalive;
pub mod protocol;
pub mod settings;
pub mod transport;

pub use commands::*;
pub use config::{ConfigOption, ConfigSnapshot, ConfigValue, ValueType};
pub use dashcam::YiDashcam;
pub use error::{DashcamError, Result};
pub use file::{FileCategory, FileRecord, FileRef};
pub use protocol::Mode;
pub use settings::ClientSettings;
