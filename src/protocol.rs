use crate::constants::{NOT_FOUND_TITLE, SESSION_LOST_STATUS};
use crate::error::{DashcamError, Result};
use roxmltree::{Document, Node, ParsingOptions};
use serde::{Deserialize, Serialize};
use strum_macros::{AsRefStr, Display, EnumIter, EnumString, FromRepr};

/// Dashcam commands and their opcodes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, AsRefStr, FromRepr, EnumIter)]
#[repr(i32)]
pub enum Command {
    CardInfo = 3039,
    Clock = 3034,
    Config = 3014,
    Connect = 8001,
    Disconnect = 8002,
    EmergencyClip = 2019,
    FileDelete = 4003,
    FileForceDelete = 4009,
    /// Not really a command: a bare GET of the file path.
    FileGet = -1,
    FileList = 3015,
    FileThumbnail = 4001,
    Mode = 3001,
    PhotoTake = 1001,
    Record = 2001,
    RecordState = 2016,
    VideoPhoto = 2017,
}

impl Command {
    pub fn opcode(self) -> i32 {
        self as i32
    }
}

/// Dashcam operating modes. Exactly one is active while connected.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    Serialize,
    Deserialize,
    AsRefStr,
    Display,
    EnumIter,
    EnumString,
    FromRepr,
)]
#[strum(serialize_all = "snake_case")]
#[serde(rename_all = "snake_case")]
#[repr(i32)]
pub enum Mode {
    Photo = 0,
    Video = 1,
    File = 2,
    Stream = 3,
}

impl Mode {
    pub fn code(self) -> i32 {
        self as i32
    }
}

impl TryFrom<i32> for Mode {
    type Error = DashcamError;

    fn try_from(value: i32) -> Result<Self> {
        Mode::from_repr(value).ok_or_else(|| DashcamError::Validation(format!("Invalid mode {value}")))
    }
}

/// A single exchange with the device, encoded as ordered query parameters.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandRequest {
    pub opcode: i32,
    pub path: String,
    pub par: Option<i32>,
    pub string: Option<String>,
    pub extra: Vec<(String, String)>,
}

impl CommandRequest {
    pub fn new(command: Command) -> Self {
        Self::with_opcode(command.opcode())
    }

    pub fn with_opcode(opcode: i32) -> Self {
        Self {
            opcode,
            path: "/".to_string(),
            par: None,
            string: None,
            extra: Vec::new(),
        }
    }

    pub fn with_par(mut self, par: i32) -> Self {
        self.par = Some(par);
        self
    }

    pub fn with_str(mut self, value: impl Into<String>) -> Self {
        self.string = Some(value.into());
        self
    }

    pub fn with_path(mut self, path: impl Into<String>) -> Self {
        self.path = path.into();
        self
    }

    pub fn with_param(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.extra.push((key.into(), value.into()));
        self
    }

    pub fn is_pseudo(&self) -> bool {
        self.opcode < 0
    }

    /// Query parameters in wire order. The firmware rejects requests where
    /// `custom` is not the first parameter.
    pub fn params(&self) -> Vec<(String, String)> {
        let mut params = Vec::with_capacity(4 + self.extra.len());
        if !self.is_pseudo() {
            params.push(("custom".to_string(), "1".to_string()));
            params.push(("cmd".to_string(), self.opcode.to_string()));
        }
        if let Some(par) = self.par {
            params.push(("par".to_string(), par.to_string()));
        }
        if let Some(string) = &self.string {
            params.push(("str".to_string(), string.clone()));
        }
        params.extend(self.extra.iter().cloned());
        params
    }
}

/// Decoded result of a non-streaming exchange.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Reply {
    /// Scalar result of a command response.
    Value(String),
    /// Any other body, returned as-is.
    Document(String),
}

impl Reply {
    pub fn value(&self) -> Option<&str> {
        match self {
            Reply::Value(value) => Some(value),
            Reply::Document(_) => None,
        }
    }

    pub fn into_document(self) -> Result<String> {
        match self {
            Reply::Document(body) => Ok(body),
            Reply::Value(value) => Err(DashcamError::Protocol(format!(
                "Expected a document, got scalar {value}"
            ))),
        }
    }
}

/// Lowercased media type without parameters, e.g. `text/xml`.
pub fn media_type(content_type: Option<&str>) -> Option<String> {
    content_type?
        .split(';')
        .next()
        .map(str::trim)
        .filter(|part| !part.is_empty())
        .map(|part| part.to_ascii_lowercase())
}

pub fn decode_reply(
    request: &CommandRequest,
    content_type: Option<&str>,
    body: &str,
) -> Result<Reply> {
    match media_type(content_type).as_deref() {
        Some("text/xml") => {
            if let Some(reply) = decode_command_xml(request.opcode, body)? {
                return Ok(reply);
            }
        }
        Some("text/html") => {
            // The firmware answers 200 with an HTML page instead of a 404.
            if is_not_found_page(body) {
                return Err(DashcamError::FileNotFound(request.path.clone()));
            }
        }
        _ => {}
    }
    Ok(Reply::Document(body.to_string()))
}

fn decode_command_xml(opcode: i32, body: &str) -> Result<Option<Reply>> {
    let document = match Document::parse(body) {
        Ok(document) => document,
        Err(e) => {
            log::debug!("Response is not well-formed XML: {}", e);
            return Ok(None);
        }
    };
    let root = document.root_element();

    let cmd = child_text(root, "Cmd").and_then(|text| text.trim().parse::<i32>().ok());
    let Some(status) = child_text(root, "Status") else {
        return Ok(None);
    };
    if cmd != Some(opcode) {
        return Ok(None);
    }

    let status: i32 = status
        .trim()
        .parse()
        .map_err(|_| DashcamError::Protocol(format!("Invalid status {status:?}")))?;
    if status == SESSION_LOST_STATUS {
        return Err(DashcamError::ConnectionLost);
    }
    if status < 0 {
        return Err(DashcamError::CommandRejected { opcode, status });
    }

    let value = child_text(root, "String")
        .or_else(|| child_text(root, "Value"))
        .map(str::to_string)
        .unwrap_or_else(|| status.to_string());
    Ok(Some(Reply::Value(value)))
}

pub fn parse_document(body: &str) -> Result<Document<'_>> {
    Document::parse(body).map_err(|e| DashcamError::Protocol(format!("Error parsing XML: {}", e)))
}

/// Text of the first direct child called `name`. Present-but-empty is `""`.
pub fn child_text<'a>(node: Node<'a, '_>, name: &str) -> Option<&'a str> {
    node.children()
        .find(|child| child.has_tag_name(name))
        .map(|child| child.text().unwrap_or(""))
}

/// Text of `head/title`, or `None` when the page is not well-formed or has
/// no title.
pub fn html_title(body: &str) -> Option<String> {
    let options = ParsingOptions {
        allow_dtd: true,
        ..ParsingOptions::default()
    };
    let document = Document::parse_with_options(body, options).ok()?;
    let element = |node: Node<'_, '_>, name: &str| {
        node.is_element() && node.tag_name().name().eq_ignore_ascii_case(name)
    };
    let head = document.root_element().children().find(|n| element(*n, "head"))?;
    let title = head.children().find(|n| element(*n, "title"))?;
    Some(title.text().unwrap_or("").to_string())
}

pub fn is_not_found_page(body: &str) -> bool {
    html_title(body).is_some_and(|title| title.eq_ignore_ascii_case(NOT_FOUND_TITLE))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn xml(cmd: i32, status: i32, extra: &str) -> String {
        format!(
            "<?xml version=\"1.0\" encoding=\"UTF-8\" ?>\n<Function>\n<Cmd>{cmd}</Cmd>\n<Status>{status}</Status>{extra}\n</Function>"
        )
    }

    #[test]
    fn params_keep_marker_and_opcode_first() {
        let request = CommandRequest::new(Command::Mode)
            .with_par(2)
            .with_str("x")
            .with_param("extra", "1");
        let keys: Vec<_> = request.params().into_iter().map(|(k, _)| k).collect();
        assert_eq!(keys, ["custom", "cmd", "par", "str", "extra"]);
        assert_eq!(request.params()[1].1, "3001");
    }

    #[test]
    fn pseudo_command_has_no_opcode() {
        let request = CommandRequest::new(Command::FileGet).with_path("/CARDV/MOVIE/a.MP4");
        assert!(request.is_pseudo());
        assert!(request.params().is_empty());
    }

    #[test]
    fn status_only_reply_is_stringified() {
        let request = CommandRequest::new(Command::Mode);
        let reply = decode_reply(&request, Some("text/xml"), &xml(3001, 0, "")).unwrap();
        assert_eq!(reply, Reply::Value("0".to_string()));
    }

    #[test]
    fn string_field_beats_value_field() {
        let request = CommandRequest::new(Command::RecordState);
        let body = xml(2016, 0, "<Value>7</Value><String>hello</String>");
        let reply = decode_reply(&request, Some("text/xml; charset=UTF-8"), &body).unwrap();
        assert_eq!(reply.value(), Some("hello"));

        let body = xml(2016, 0, "<Value>7</Value>");
        let reply = decode_reply(&request, Some("text/xml"), &body).unwrap();
        assert_eq!(reply.value(), Some("7"));
    }

    #[test]
    fn mismatched_cmd_falls_through_to_text() {
        let request = CommandRequest::new(Command::Config);
        let body = xml(3012, 0, "<String>1.0</String>");
        let reply = decode_reply(&request, Some("text/xml"), &body).unwrap();
        assert_eq!(reply, Reply::Document(body));
    }

    #[test]
    fn session_lost_status() {
        let request = CommandRequest::new(Command::Config);
        let err = decode_reply(&request, Some("text/xml"), &xml(3014, -256, "")).unwrap_err();
        assert!(matches!(err, DashcamError::ConnectionLost));
    }

    #[test]
    fn negative_status_is_rejected() {
        let request = CommandRequest::new(Command::FileDelete);
        let err = decode_reply(&request, Some("text/xml"), &xml(4003, -5, "")).unwrap_err();
        assert!(matches!(
            err,
            DashcamError::CommandRejected {
                opcode: 4003,
                status: -5
            }
        ));
    }

    #[test]
    fn not_found_page_any_case() {
        let request = CommandRequest::new(Command::FileThumbnail).with_path("/CARDV/x.JPG");
        for title in ["Page Not Found", "PAGE NOT FOUND", "page not found"] {
            let body = format!("<html><head><title>{title}</title></head><body></body></html>");
            let err = decode_reply(&request, Some("text/html"), &body).unwrap_err();
            assert!(matches!(err, DashcamError::FileNotFound(ref p) if p == "/CARDV/x.JPG"));
        }
    }

    #[test]
    fn title_is_looked_up_by_element() {
        let request = CommandRequest::new(Command::FileThumbnail).with_path("/x");
        let body = "<html><head><titlebar>x</titlebar><title>Page Not Found</title></head></html>";
        let err = decode_reply(&request, Some("text/html"), body).unwrap_err();
        assert!(matches!(err, DashcamError::FileNotFound(ref p) if p == "/x"));

        let body = "<!DOCTYPE html>\n<HTML><HEAD><TITLE>page not found</TITLE></HEAD></HTML>";
        assert!(decode_reply(&request, Some("text/html"), body).is_err());

        let body = "<html><body><title>Page Not Found</title></body></html>";
        assert!(decode_reply(&request, Some("text/html"), body).is_ok());
    }

    #[test]
    fn padded_title_is_not_the_not_found_page() {
        let request = CommandRequest::new(Command::FileThumbnail).with_path("/x");
        let body = "<html><head><title>  Page Not Found\n</title></head></html>";
        let reply = decode_reply(&request, Some("text/html"), body).unwrap();
        assert_eq!(reply, Reply::Document(body.to_string()));
    }

    #[test]
    fn malformed_html_is_returned() {
        let request = CommandRequest::new(Command::FileThumbnail);
        let body = "<html><head><title>Page Not Found</title><br></head></html>";
        let reply = decode_reply(&request, Some("text/html"), body).unwrap();
        assert_eq!(reply, Reply::Document(body.to_string()));
    }

    #[test]
    fn other_html_titles_are_returned() {
        let request = CommandRequest::new(Command::FileThumbnail);
        let body = "<html><head><title>Page Not Found!</title></head></html>";
        let reply = decode_reply(&request, Some("text/html"), body).unwrap();
        assert_eq!(reply, Reply::Document(body.to_string()));
    }

    #[test]
    fn plain_text_is_returned_as_is() {
        let request = CommandRequest::new(Command::CardInfo);
        let reply = decode_reply(&request, None, "hello").unwrap();
        assert_eq!(reply, Reply::Document("hello".to_string()));
    }

    #[test]
    fn mode_from_code() {
        assert_eq!(Mode::try_from(2).unwrap(), Mode::File);
        assert!(matches!(Mode::try_from(9), Err(DashcamError::Validation(_))));
        assert_eq!("video".parse::<Mode>().unwrap(), Mode::Video);
    }
}
