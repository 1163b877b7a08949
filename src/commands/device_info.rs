use crate::commands::Configuration;
use crate::config::ConfigOption;
use crate::constants::CLOCK_FORMAT;
use crate::dashcam::YiDashcam;
use crate::error::{DashcamError, Result};
use crate::protocol::{Command, CommandRequest, child_text, parse_document};
use async_trait::async_trait;
use chrono::{Local, NaiveDateTime};
use serde::{Deserialize, Serialize};

/// SD card details as reported by the dashcam.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CardInfo {
    pub card_type: String,
    pub write_rate: i64,
    pub capacity: i64,
    pub vendor: i64,
    pub slow_card: bool,
    pub average_use_duration: i64,
    pub total_use: i64,
}

impl CardInfo {
    pub fn from_xml(body: &str) -> Result<Self> {
        let document = parse_document(body)?;
        let root = document.root_element();

        let text = |name: &str| {
            child_text(root, name)
                .map(str::trim)
                .ok_or_else(|| DashcamError::Protocol(format!("Card info without {name}")))
        };
        let number = |name: &str| -> Result<i64> {
            let value = text(name)?;
            value
                .parse()
                .map_err(|_| DashcamError::Protocol(format!("Invalid {name} {value:?}")))
        };

        Ok(Self {
            card_type: text("CARDTYPE")?.to_string(),
            write_rate: number("CARDWRITERATE")?,
            capacity: number("CARDCAPACITY")?,
            vendor: number("CARDVENDOR")?,
            slow_card: number("CTNSLOWCARD")? != 0,
            average_use_duration: number("AVGUSEDUR")?,
            total_use: number("CTNTOTALUSE")?,
        })
    }
}

#[async_trait]
pub trait DeviceInfo: Send + Sync {
    /// Get SD card information
    async fn card_info(&self) -> Result<CardInfo>;

    /// Get the firmware version
    async fn firmware_version(&self) -> Result<String>;

    /// Get the model name
    async fn model(&self) -> Result<String>;

    /// Get the serial number
    async fn serial_number(&self) -> Result<String>;

    /// Set the dashcam clock (default: now)
    async fn set_clock(&self, time: Option<NaiveDateTime>) -> Result<()>;
}

impl YiDashcam {
    async fn config_text(&self, option: ConfigOption) -> Result<String> {
        self.get_config()
            .await?
            .get(option)
            .map(ToString::to_string)
            .ok_or_else(|| DashcamError::Protocol(format!("Dashcam did not report {option}")))
    }
}

#[async_trait]
impl DeviceInfo for YiDashcam {
    async fn card_info(&self) -> Result<CardInfo> {
        let body = self
            .send_command(CommandRequest::new(Command::CardInfo))
            .await?
            .into_document()?;
        CardInfo::from_xml(&body)
    }

    async fn firmware_version(&self) -> Result<String> {
        self.config_text(ConfigOption::FirmwareVersion).await
    }

    async fn model(&self) -> Result<String> {
        self.config_text(ConfigOption::Model).await
    }

    async fn serial_number(&self) -> Result<String> {
        self.config_text(ConfigOption::SerialNumber).await
    }

    async fn set_clock(&self, time: Option<NaiveDateTime>) -> Result<()> {
        let time = time.unwrap_or_else(|| Local::now().naive_local());
        let request =
            CommandRequest::new(Command::Clock).with_str(time.format(CLOCK_FORMAT).to_string());
        self.send_command(request).await?;
        Ok(())
    }
}
