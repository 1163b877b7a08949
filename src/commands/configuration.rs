use crate::config::{ConfigOption, ConfigSnapshot, ConfigValue};
use crate::dashcam::YiDashcam;
use crate::error::{DashcamError, Result};
use crate::protocol::{Command, CommandRequest, Mode};
use async_trait::async_trait;

#[async_trait]
pub trait Configuration: Send + Sync {
    /// Get the dashcam configuration, fetching it if not cached
    async fn get_config(&self) -> Result<ConfigSnapshot>;

    /// Set a config option
    async fn set_config(&self, option: ConfigOption, value: ConfigValue) -> Result<()>;

    /// Set a config option from raw device codes
    async fn set_config_code(&self, option: i32, value: i32) -> Result<()>;
}

impl YiDashcam {
    /// Puts the dashcam in the mode `option` needs, with recording stopped.
    async fn prepare_for_config(&self, option: ConfigOption) -> Result<()> {
        let mode = option.required_mode();
        if self.ensure_mode(mode).await? {
            tokio::time::sleep(self.settings.mode_settle).await;
        }
        if mode != Mode::Video {
            return Ok(());
        }

        let mut attempts = 0;
        while self.recording_state().await? {
            if attempts >= self.settings.record_poll_limit {
                return Err(DashcamError::Precondition(
                    "Dashcam did not stop recording".to_string(),
                ));
            }
            self.send_command(CommandRequest::new(Command::Record).with_par(0))
                .await?;
            attempts += 1;
            tokio::time::sleep(self.settings.record_poll).await;
        }
        Ok(())
    }

    async fn write_config(&self, option: ConfigOption, code: i32) -> Result<()> {
        let result = match self.prepare_for_config(option).await {
            Ok(()) => self
                .send_command(CommandRequest::with_opcode(option.code()).with_par(code))
                .await
                .map(|_| ()),
            Err(e) => Err(e),
        };
        self.config.invalidate().await;
        result
    }
}

#[async_trait]
impl Configuration for YiDashcam {
    async fn get_config(&self) -> Result<ConfigSnapshot> {
        self.require_connected().await?;
        if let Some(snapshot) = self.config.get().await {
            return Ok(snapshot);
        }

        let generation = self.config.generation().await;
        let body = self
            .send_command(CommandRequest::new(Command::Config))
            .await?
            .into_document()?;
        let snapshot = ConfigSnapshot::from_xml(&body)?;
        self.config.store(generation, snapshot.clone()).await;
        Ok(snapshot)
    }

    async fn set_config(&self, option: ConfigOption, value: ConfigValue) -> Result<()> {
        let code = option.value_type().encode(&value)?;
        self.write_config(option, code).await
    }

    async fn set_config_code(&self, option: i32, value: i32) -> Result<()> {
        let option = ConfigOption::try_from(option)?;
        let code = option.value_type().validate_code(value)?;
        self.write_config(option, code).await
    }
}
