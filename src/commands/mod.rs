pub mod capture;
pub mod configuration;
pub mod connection;
pub mod device_info;
pub mod file_management;

pub use capture::Capture;
pub use configuration::Configuration;
pub use connection::Connection;
pub use device_info::{CardInfo, DeviceInfo};
pub use file_management::FileManagement;
