use crate::constants::{CARD_DRIVE, FILE_CATEGORIES, FILE_TIME_FORMAT};
use crate::error::{DashcamError, Result};
use crate::protocol::{child_text, parse_document};
use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use strum_macros::{AsRefStr, EnumIter};

/// A file on the dashcam SD card.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileRecord {
    pub name: String,
    /// Device path, e.g. `A:\CARDV\MOVIE\2017_0101_120000_001.MP4`.
    pub path: String,
    pub size: u64,
    pub time: NaiveDateTime,
    pub read_only: bool,
}

impl FileRecord {
    /// Path usable in URLs and as an opaque token, e.g. `/CARDV/MOVIE/x.MP4`.
    pub fn url_path(&self) -> String {
        url_path(&self.path)
    }
}

/// Oldest first. Ties are broken on the remaining fields so that ordering
/// agrees with equality.
impl Ord for FileRecord {
    fn cmp(&self, other: &Self) -> Ordering {
        (self.time, &self.path, &self.name, self.size, self.read_only).cmp(&(
            other.time,
            &other.path,
            &other.name,
            other.size,
            other.read_only,
        ))
    }
}

impl PartialOrd for FileRecord {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

fn split_drive(path: &str) -> (&str, &str) {
    let bytes = path.as_bytes();
    if bytes.len() >= 2 && bytes[1] == b':' && bytes[0].is_ascii_alphabetic() {
        path.split_at(2)
    } else {
        ("", path)
    }
}

/// Drops the drive and converts backslashes to forward slashes.
pub fn url_path(path: &str) -> String {
    split_drive(path).1.replace('\\', "/")
}

/// Inverse of [`url_path`], always on the card drive.
pub fn device_path(path: &str) -> String {
    format!("{}{}", CARD_DRIVE, url_path(path).replace('/', "\\"))
}

/// Either a catalog record or a path in device or URL form.
#[derive(Debug, Clone, Copy)]
pub enum FileRef<'a> {
    Record(&'a FileRecord),
    Path(&'a str),
}

impl FileRef<'_> {
    pub fn url_path(&self) -> String {
        match self {
            FileRef::Record(record) => record.url_path(),
            FileRef::Path(path) => url_path(path),
        }
    }

    pub fn device_path(&self) -> String {
        match self {
            FileRef::Record(record) => record.path.clone(),
            FileRef::Path(path) => device_path(path),
        }
    }
}

impl<'a> From<&'a FileRecord> for FileRef<'a> {
    fn from(record: &'a FileRecord) -> Self {
        FileRef::Record(record)
    }
}

impl<'a> From<&'a str> for FileRef<'a> {
    fn from(path: &'a str) -> Self {
        FileRef::Path(path)
    }
}

impl<'a> From<&'a String> for FileRef<'a> {
    fn from(path: &'a String) -> Self {
        FileRef::Path(path)
    }
}

/// Folders of the card, matched by a substring of the path.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, AsRefStr, EnumIter)]
#[strum(serialize_all = "snake_case")]
pub enum FileCategory {
    Roadmap,
    Emergency,
    Photo,
}

impl FileCategory {
    pub fn from_name(name: &str) -> Option<Self> {
        FILE_CATEGORIES.get(name.to_ascii_lowercase().as_str()).copied()
    }

    fn needle(self) -> &'static str {
        match self {
            FileCategory::Roadmap => "movie",
            FileCategory::Emergency => "emr",
            FileCategory::Photo => "photo",
        }
    }

    pub fn matches(self, record: &FileRecord) -> bool {
        record.path.to_lowercase().contains(self.needle())
    }

    pub fn filter(self, files: &[FileRecord]) -> Vec<FileRecord> {
        files
            .iter()
            .filter(|record| self.matches(record))
            .cloned()
            .collect()
    }
}

fn required<'a>(file: roxmltree::Node<'a, '_>, name: &str) -> Result<&'a str> {
    child_text(file, name)
        .map(str::trim)
        .ok_or_else(|| DashcamError::Protocol(format!("File entry without {name}")))
}

fn parse_number<T: std::str::FromStr>(file: roxmltree::Node<'_, '_>, name: &str) -> Result<T> {
    let text = required(file, name)?;
    text.parse()
        .map_err(|_| DashcamError::Protocol(format!("Invalid {name} {text:?}")))
}

/// Decodes every `File` element of a file-list document, in document order.
pub fn parse_file_list(body: &str) -> Result<Vec<FileRecord>> {
    let document = parse_document(body)?;
    document
        .descendants()
        .filter(|node| node.has_tag_name("File"))
        .map(|file| {
            let time = required(file, "TIME")?;
            Ok(FileRecord {
                name: required(file, "NAME")?.to_string(),
                path: required(file, "FPATH")?.to_string(),
                size: parse_number(file, "SIZE")?,
                time: NaiveDateTime::parse_from_str(time, FILE_TIME_FORMAT).map_err(|e| {
                    DashcamError::Protocol(format!("Error parsing date {time:?}: {}", e))
                })?,
                read_only: parse_number::<u32>(file, "ATTR")? & 1 == 1,
            })
        })
        .collect()
}
