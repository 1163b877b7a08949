use crate::dashcam::YiDashcam;
use crate::error::{DashcamError, Result};
use crate::protocol::{Command, CommandRequest, Mode};
use async_trait::async_trait;

#[async_trait]
pub trait Capture: Send + Sync {
    /// Take a photo, entering photo mode if needed
    async fn take_photo(&self) -> Result<()>;

    /// Start recording, entering video mode if needed
    async fn start_record(&self) -> Result<()>;

    /// Stop recording
    async fn stop_record(&self) -> Result<()>;

    /// Ask the dashcam whether it is recording
    async fn is_recording(&self) -> Result<bool>;

    /// Take a still while recording
    async fn take_video_photo(&self) -> Result<()>;

    /// Save the current recording as an emergency clip
    async fn take_emergency_clip(&self) -> Result<()>;
}

#[async_trait]
impl Capture for YiDashcam {
    async fn take_photo(&self) -> Result<()> {
        self.ensure_mode(Mode::Photo).await?;
        self.send_command(CommandRequest::new(Command::PhotoTake))
            .await?;
        self.files.invalidate().await;
        Ok(())
    }

    async fn start_record(&self) -> Result<()> {
        self.ensure_mode(Mode::Video).await?;
        self.send_command(CommandRequest::new(Command::Record).with_par(1))
            .await?;
        Ok(())
    }

    async fn stop_record(&self) -> Result<()> {
        self.send_command(CommandRequest::new(Command::Record).with_par(0))
            .await?;
        Ok(())
    }

    async fn is_recording(&self) -> Result<bool> {
        self.recording_state().await
    }

    async fn take_video_photo(&self) -> Result<()> {
        if !self.recording_state().await? {
            return Err(DashcamError::Precondition(
                "Dashcam is not recording".to_string(),
            ));
        }
        self.send_command(CommandRequest::new(Command::VideoPhoto))
            .await?;
        self.files.invalidate().await;
        Ok(())
    }

    async fn take_emergency_clip(&self) -> Result<()> {
        self.ensure_mode(Mode::Video).await?;
        self.send_command(CommandRequest::new(Command::EmergencyClip))
            .await?;
        self.files.invalidate().await;
        Ok(())
    }
}
