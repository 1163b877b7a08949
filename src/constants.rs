use crate::file::FileCategory;
use phf::phf_map;

pub const HOST: &str = "192.168.1.254";
pub const HTTP_PORT: u16 = 80;
pub const KEEPALIVE_PORT: u16 = 3333;

pub const KEEPALIVE_PAYLOAD: &[u8] = b"02:001:0";

/// Status the device reports once it has dropped the client's session.
pub const SESSION_LOST_STATUS: i32 = -256;

/// Drive prefix of every path on the SD card.
pub const CARD_DRIVE: &str = "A:";

pub const FILE_TIME_FORMAT: &str = "%Y/%m/%d %H:%M:%S";
pub const CLOCK_FORMAT: &str = "%Y-%m-%d_%H:%M:%S";

pub const NOT_FOUND_TITLE: &str = "page not found";

pub static FILE_CATEGORIES: phf::Map<&'static str, FileCategory> = phf_map! {
    "roadmap" => FileCategory::Roadmap,
    "emergency" => FileCategory::Emergency,
    "photo" => FileCategory::Photo,
};
