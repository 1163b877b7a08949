use crate::dashcam::YiDashcam;
use crate::error::{DashcamError, Result};
use crate::keepalive::Keepalive;
use crate::protocol::{Command, CommandRequest, Mode, decode_reply};
use async_trait::async_trait;

#[async_trait]
pub trait Connection: Send + Sync {
    /// Connect to the dashcam and enter `mode`
    async fn connect(&self, mode: Mode) -> Result<()>;

    /// Disconnect from the dashcam. Never fails once connected
    async fn disconnect(&self) -> Result<()>;

    /// Enter a dashcam mode. Requires a connection: fails with `NotConnected`
    /// otherwise, without contacting the dashcam
    async fn set_mode(&self, mode: Mode) -> Result<()>;

    /// Current mode, `None` while disconnected
    async fn mode(&self) -> Option<Mode>;

    /// Check if connected
    async fn is_connected(&self) -> bool;

    /// Get the dashcam address
    fn host(&self) -> &str;
}

#[async_trait]
impl Connection for YiDashcam {
    async fn connect(&self, mode: Mode) -> Result<()> {
        let mut session = self.session.lock().await;
        session.sync();
        if session.is_connected() {
            return Err(DashcamError::AlreadyConnected);
        }

        let request = CommandRequest::new(Command::Connect);
        self.exchange(&mut session, &request)
            .await
            .map_err(|e| DashcamError::ConnectionFailed(Box::new(e)))?;

        let link = self
            .transport
            .open_keepalive()
            .await
            .map_err(|e| DashcamError::ConnectionFailed(Box::new(e)))?;
        let keepalive = Keepalive::spawn(
            link,
            self.settings.keepalive_interval,
            session.epoch,
            session.events_tx.clone(),
        );
        session.keepalive = Some(keepalive);

        self.config.invalidate().await;
        self.files.invalidate().await;

        if let Err(e) = self.switch_mode(&mut session, mode).await {
            if let Some(keepalive) = session.reset() {
                keepalive.stop().await;
            }
            return Err(e);
        }

        log::info!("Connected to dashcam at {}", self.settings.host);
        Ok(())
    }

    async fn disconnect(&self) -> Result<()> {
        let mut session = self.session.lock().await;
        session.sync();
        if !session.is_connected() {
            return Ok(());
        }

        if let Some(keepalive) = session.reset() {
            keepalive.stop().await;
        }

        // Doesn't matter if this fails: without a heartbeat the dashcam
        // drops the session by itself.
        let request = CommandRequest::new(Command::Disconnect);
        let result = match self.transport.exchange(&request.path, &request.params()).await {
            Ok(response) => {
                decode_reply(&request, response.content_type.as_deref(), &response.body)
            }
            Err(e) => Err(e),
        };
        match result {
            Ok(_) => log::info!("Disconnected from dashcam"),
            Err(e) => log::debug!("Error disconnecting: {}", e),
        }
        Ok(())
    }

    async fn set_mode(&self, mode: Mode) -> Result<()> {
        let mut session = self.session.lock().await;
        session.sync();
        if !session.is_connected() {
            return Err(DashcamError::NotConnected);
        }
        self.switch_mode(&mut session, mode).await
    }

    async fn mode(&self) -> Option<Mode> {
        self.current_mode().await
    }

    async fn is_connected(&self) -> bool {
        self.require_connected().await.is_ok()
    }

    fn host(&self) -> &str {
        &self.settings.host
    }
}
