use crate::cache::Cached;
use crate::config::ConfigSnapshot;
use crate::error::{DashcamError, Result};
use crate::file::FileRecord;
use crate::keepalive::{Keepalive, SessionEvent};
use crate::protocol::{
    Command, CommandRequest, Mode, Reply, decode_reply, is_not_found_page, media_type,
};
use crate::settings::ClientSettings;
use crate::transport::{ByteStream, HttpTransport, Transport};
use bytes::Bytes;
use futures::stream::{self, StreamExt};
use std::sync::Arc;
use tokio::sync::{Mutex, mpsc};

/// Connection state shared by foreground calls and the keepalive task.
///
/// Only foreground calls mutate it. The keepalive task reports failures over
/// `events`, which are applied by [`Session::sync`] under the session lock.
pub(crate) struct Session {
    pub(crate) mode: Option<Mode>,
    pub(crate) keepalive: Option<Keepalive>,
    pub(crate) epoch: u64,
    events: mpsc::UnboundedReceiver<SessionEvent>,
    pub(crate) events_tx: mpsc::UnboundedSender<SessionEvent>,
}

impl Session {
    fn new() -> Self {
        let (events_tx, events) = mpsc::unbounded_channel();
        Self {
            mode: None,
            keepalive: None,
            epoch: 0,
            events,
            events_tx,
        }
    }

    pub(crate) fn is_connected(&self) -> bool {
        self.keepalive.is_some()
    }

    /// Applies keepalive failures reported since the last call. Reports from
    /// an earlier connection are ignored.
    pub(crate) fn sync(&mut self) {
        while let Ok(event) = self.events.try_recv() {
            match event {
                SessionEvent::KeepaliveFailed { epoch }
                    if epoch == self.epoch && self.is_connected() =>
                {
                    log::warn!("Lost connection to dashcam: keepalive failed");
                    drop(self.reset());
                }
                SessionEvent::KeepaliveFailed { .. } => {}
            }
        }
    }

    /// Clears all session state, handing back the keepalive to stop.
    pub(crate) fn reset(&mut self) -> Option<Keepalive> {
        self.mode = None;
        self.epoch += 1;
        self.keepalive.take()
    }
}

/// Client for the YI dashcam.
///
/// Command methods live on the traits in [`crate::commands`]. Dropping a
/// connected client aborts the keepalive; the dashcam then expires the session
/// on its own.
pub struct YiDashcam {
    pub(crate) settings: ClientSettings,
    pub(crate) transport: Arc<dyn Transport>,
    pub(crate) session: Mutex<Session>,
    pub(crate) config: Cached<ConfigSnapshot>,
    pub(crate) files: Cached<Vec<FileRecord>>,
}

impl YiDashcam {
    pub fn new() -> Result<Self> {
        Self::with_settings(ClientSettings::default())
    }

    pub fn with_settings(settings: ClientSettings) -> Result<Self> {
        let transport = HttpTransport::new(&settings)?;
        Ok(Self::with_transport(settings, Arc::new(transport)))
    }

    pub fn with_transport(settings: ClientSettings, transport: Arc<dyn Transport>) -> Self {
        Self {
            settings,
            transport,
            session: Mutex::new(Session::new()),
            config: Cached::new(),
            files: Cached::new(),
        }
    }

    pub fn settings(&self) -> &ClientSettings {
        &self.settings
    }

    fn gate(session: &mut Session, request: &CommandRequest) -> Result<()> {
        session.sync();
        if !session.is_connected() && request.opcode != Command::Connect.opcode() {
            return Err(DashcamError::NotConnected);
        }
        Ok(())
    }

    pub(crate) async fn send_command(&self, request: CommandRequest) -> Result<Reply> {
        let mut session = self.session.lock().await;
        self.exchange(&mut session, &request).await
    }

    /// One gated exchange. A session-lost status tears the session down
    /// before the error is returned.
    pub(crate) async fn exchange(
        &self,
        session: &mut Session,
        request: &CommandRequest,
    ) -> Result<Reply> {
        Self::gate(session, request)?;
        let response = self
            .transport
            .exchange(&request.path, &request.params())
            .await?;

        match decode_reply(request, response.content_type.as_deref(), &response.body) {
            Err(DashcamError::ConnectionLost) => {
                log::warn!("Dashcam dropped the session");
                if let Some(keepalive) = session.reset() {
                    keepalive.stop().await;
                }
                Err(DashcamError::ConnectionLost)
            }
            reply => reply,
        }
    }

    /// Gated streaming exchange. The session lock is released once headers
    /// have arrived.
    pub(crate) async fn open_stream(&self, request: CommandRequest) -> Result<ByteStream> {
        let response = {
            let mut session = self.session.lock().await;
            Self::gate(&mut session, &request)?;
            self.transport
                .exchange_streamed(&request.path, &request.params())
                .await?
        };

        if media_type(response.content_type.as_deref()).as_deref() != Some("text/html") {
            return Ok(response.body);
        }

        let mut body = response.body;
        let mut page = Vec::new();
        while let Some(chunk) = body.next().await {
            page.extend_from_slice(&chunk?);
        }
        if is_not_found_page(&String::from_utf8_lossy(&page)) {
            return Err(DashcamError::FileNotFound(request.path));
        }
        Ok(stream::once(async move { Ok(Bytes::from(page)) }).boxed())
    }

    pub(crate) async fn switch_mode(&self, session: &mut Session, mode: Mode) -> Result<()> {
        let request = CommandRequest::new(Command::Mode).with_par(mode.code());
        self.exchange(session, &request).await?;
        session.mode = Some(mode);
        if mode == Mode::File {
            self.files.invalidate().await;
        }
        log::debug!("Dashcam entered {} mode", mode);
        Ok(())
    }

    /// Switches to `mode` unless already there. Returns whether it switched.
    pub(crate) async fn ensure_mode(&self, mode: Mode) -> Result<bool> {
        let mut session = self.session.lock().await;
        session.sync();
        if !session.is_connected() {
            return Err(DashcamError::NotConnected);
        }
        if session.mode == Some(mode) {
            return Ok(false);
        }
        self.switch_mode(&mut session, mode).await?;
        Ok(true)
    }

    pub(crate) async fn current_mode(&self) -> Option<Mode> {
        let mut session = self.session.lock().await;
        session.sync();
        session.mode
    }

    pub(crate) async fn require_connected(&self) -> Result<()> {
        let mut session = self.session.lock().await;
        session.sync();
        if session.is_connected() {
            Ok(())
        } else {
            Err(DashcamError::NotConnected)
        }
    }

    /// Asks the device whether it is recording. Never cached.
    pub(crate) async fn recording_state(&self) -> Result<bool> {
        let reply = self
            .send_command(CommandRequest::new(Command::RecordState))
            .await?;
        let value = reply.value().ok_or_else(|| {
            DashcamError::Protocol("No recording state in response".to_string())
        })?;
        value
            .trim()
            .parse::<i64>()
            .map(|state| state != 0)
            .map_err(|_| DashcamError::Protocol(format!("Invalid recording state {value:?}")))
    }
}
