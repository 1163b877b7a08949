#![allow(dead_code)]

use async_trait::async_trait;
use bytes::Bytes;
use futures::stream::{self, StreamExt};
use std::collections::{HashMap, VecDeque};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use yi_dashcam::transport::{
    BufferedResponse, ByteStream, KeepaliveLink, StreamedResponse, Transport,
};
use yi_dashcam::{ClientSettings, DashcamError, Result, YiDashcam};

pub const FILE_LIST: &str = r#"<?xml version="1.0" encoding="UTF-8" ?>
<LIST>
<ALLFile><File>
<NAME>2017_0103_090000_003.MP4</NAME>
<FPATH>A:\CARDV\MOVIE\2017_0103_090000_003.MP4</FPATH>
<SIZE>104857600</SIZE>
<TIMECODE>1</TIMECODE>
<TIME>2017/01/03 09:00:00</TIME>
<ATTR>32</ATTR></File>
</ALLFile>
<ALLFile><File>
<NAME>2017_0102_080000_002.MP4</NAME>
<FPATH>A:\CARDV\EMR\2017_0102_080000_002.MP4</FPATH>
<SIZE>52428800</SIZE>
<TIMECODE>1</TIMECODE>
<TIME>2017/01/02 08:00:00</TIME>
<ATTR>33</ATTR></File>
</ALLFile>
<ALLFile><File>
<NAME>2017_0104_100000_004.JPG</NAME>
<FPATH>A:\CARDV\PHOTO\2017_0104_100000_004.JPG</FPATH>
<SIZE>2097152</SIZE>
<TIMECODE>1</TIMECODE>
<TIME>2017/01/04 10:00:00</TIME>
<ATTR>32</ATTR></File>
</ALLFile>
<ALLFile><File>
<NAME>2017_0101_070000_001.MP4</NAME>
<FPATH>A:\CARDV\emr\2017_0101_070000_001.MP4</FPATH>
<SIZE>52428800</SIZE>
<TIMECODE>1</TIMECODE>
<TIME>2017/01/01 07:00:00</TIME>
<ATTR>33</ATTR></File>
</ALLFile>
</LIST>"#;

pub const CONFIG: &str = r#"<?xml version="1.0" encoding="UTF-8" ?>
<Function>
<Cmd>3012</Cmd>
<Status>V1.0.3_20170303</Status>
<Cmd>3035</Cmd>
<Status>YHS-DVR</Status>
<Cmd>3037</Cmd>
<Status>0123456789</Status>
<Cmd>2005</Cmd>
<Status>6</Status>
<Cmd>2007</Cmd>
<Status>1</Status>
<Cmd>3041</Cmd>
<Status>0</Status>
</Function>"#;

pub fn status_xml(cmd: i32, status: i32) -> String {
    format!(
        "<?xml version=\"1.0\" encoding=\"UTF-8\" ?>\n<Function>\n<Cmd>{cmd}</Cmd>\n<Status>{status}</Status>\n</Function>"
    )
}

pub fn value_xml(cmd: i32, value: &str) -> String {
    format!(
        "<?xml version=\"1.0\" encoding=\"UTF-8\" ?>\n<Function>\n<Cmd>{cmd}</Cmd>\n<Status>0</Status>\n<Value>{value}</Value>\n</Function>"
    )
}

pub const NOT_FOUND_PAGE: &str =
    "<html><head><title>Page Not Found</title></head><body>404</body></html>";

#[derive(Clone)]
pub struct Canned {
    pub content_type: Option<String>,
    pub body: String,
}

impl Canned {
    pub fn xml(body: impl Into<String>) -> Self {
        Self {
            content_type: Some("text/xml".to_string()),
            body: body.into(),
        }
    }

    pub fn html(body: impl Into<String>) -> Self {
        Self {
            content_type: Some("text/html".to_string()),
            body: body.into(),
        }
    }

    pub fn raw(body: impl Into<String>) -> Self {
        Self {
            content_type: None,
            body: body.into(),
        }
    }
}

/// Scripted dashcam. Unscripted commands answer with status 0.
#[derive(Default)]
pub struct FakeDevice {
    pub requests: Mutex<Vec<(String, Vec<(String, String)>)>>,
    scripted: Mutex<HashMap<String, VecDeque<Canned>>>,
    fallback: Mutex<HashMap<String, Canned>>,
    pub keepalive_fail_after: Mutex<Option<usize>>,
    pub pulses: Arc<AtomicUsize>,
    pub keepalive_closed: Arc<AtomicBool>,
    pub refuse_connect: AtomicBool,
}

impl FakeDevice {
    pub fn new() -> Arc<Self> {
        let device = Self::default();
        device.always("3015", Canned::xml(FILE_LIST));
        device.always("3014", Canned::xml(CONFIG));
        device.always("2016", Canned::xml(value_xml(2016, "0")));
        Arc::new(device)
    }

    /// Key is the `cmd` parameter, or the path for bare file fetches.
    pub fn always(&self, key: &str, response: Canned) {
        self.fallback
            .lock()
            .unwrap()
            .insert(key.to_string(), response);
    }

    pub fn once(&self, key: &str, response: Canned) {
        self.scripted
            .lock()
            .unwrap()
            .entry(key.to_string())
            .or_default()
            .push_back(response);
    }

    pub fn fail_keepalive_after(&self, pulses: usize) {
        *self.keepalive_fail_after.lock().unwrap() = Some(pulses);
    }

    pub fn exchanges(&self) -> usize {
        self.requests.lock().unwrap().len()
    }

    /// `cmd` values sent, in order.
    pub fn commands(&self) -> Vec<String> {
        self.requests
            .lock()
            .unwrap()
            .iter()
            .map(|(path, params)| {
                params
                    .iter()
                    .find(|(k, _)| k == "cmd")
                    .map(|(_, v)| v.clone())
                    .unwrap_or_else(|| path.clone())
            })
            .collect()
    }

    pub fn count(&self, cmd: &str) -> usize {
        self.commands().iter().filter(|c| c.as_str() == cmd).count()
    }

    pub fn last_params(&self) -> Vec<(String, String)> {
        self.requests
            .lock()
            .unwrap()
            .last()
            .map(|(_, params)| params.clone())
            .unwrap_or_default()
    }

    fn respond(&self, path: &str, params: &[(String, String)]) -> Result<Canned> {
        self.requests
            .lock()
            .unwrap()
            .push((path.to_string(), params.to_vec()));

        let cmd = params.iter().find(|(k, _)| k == "cmd").map(|(_, v)| v.clone());
        let key = cmd.clone().unwrap_or_else(|| path.to_string());
        if key == "8001" && self.refuse_connect.load(Ordering::SeqCst) {
            return Err(DashcamError::Transport("Failed to send command".to_string()));
        }
        if let Some(canned) = self
            .scripted
            .lock()
            .unwrap()
            .get_mut(&key)
            .and_then(VecDeque::pop_front)
        {
            return Ok(canned);
        }
        if let Some(canned) = self.fallback.lock().unwrap().get(&key) {
            return Ok(canned.clone());
        }
        let opcode = cmd.and_then(|c| c.parse().ok()).unwrap_or(0);
        Ok(Canned::xml(status_xml(opcode, 0)))
    }
}

#[async_trait]
impl Transport for FakeDevice {
    async fn exchange(&self, path: &str, params: &[(String, String)]) -> Result<BufferedResponse> {
        let canned = self.respond(path, params)?;
        Ok(BufferedResponse {
            content_type: canned.content_type,
            body: canned.body,
        })
    }

    async fn exchange_streamed(
        &self,
        path: &str,
        params: &[(String, String)],
    ) -> Result<StreamedResponse> {
        let canned = self.respond(path, params)?;
        let chunks: Vec<Result<Bytes>> = canned
            .body
            .into_bytes()
            .chunks(4)
            .map(|chunk| Ok(Bytes::copy_from_slice(chunk)))
            .collect();
        Ok(StreamedResponse {
            content_type: canned.content_type,
            body: stream::iter(chunks).boxed(),
        })
    }

    async fn open_keepalive(&self) -> Result<Box<dyn KeepaliveLink>> {
        Ok(Box::new(FakeLink {
            pulses: self.pulses.clone(),
            closed: self.keepalive_closed.clone(),
            fail_after: *self.keepalive_fail_after.lock().unwrap(),
        }))
    }
}

struct FakeLink {
    pulses: Arc<AtomicUsize>,
    closed: Arc<AtomicBool>,
    fail_after: Option<usize>,
}

#[async_trait]
impl KeepaliveLink for FakeLink {
    async fn pulse(&mut self, _payload: &[u8]) -> Result<()> {
        let sent = self.pulses.fetch_add(1, Ordering::SeqCst);
        match self.fail_after {
            Some(limit) if sent >= limit => {
                Err(DashcamError::Transport("Timeout sending keepalive".to_string()))
            }
            _ => Ok(()),
        }
    }

    async fn close(&mut self) {
        self.closed.store(true, Ordering::SeqCst);
    }
}

pub fn fast_settings() -> ClientSettings {
    ClientSettings::default()
        .with_keepalive_interval(Duration::from_millis(10))
        .with_mode_settle(Duration::ZERO)
        .with_record_poll(Duration::ZERO, 5)
}

pub fn dashcam(device: &Arc<FakeDevice>) -> YiDashcam {
    YiDashcam::with_transport(fast_settings(), device.clone())
}

/// Waits until the keepalive failure has been observed.
pub async fn wait_disconnected(cam: &YiDashcam) {
    use yi_dashcam::Connection;
    for _ in 0..200 {
        if !cam.is_connected().await {
            return;
        }
        tokio::time::sleep(Duration::from_millis(5)).await;
    }
    panic!("dashcam still connected");
}

pub async fn collect(mut stream: ByteStream) -> Vec<u8> {
    let mut out = Vec::new();
    while let Some(chunk) = stream.next().await {
        out.extend_from_slice(&chunk.unwrap());
    }
    out
}
