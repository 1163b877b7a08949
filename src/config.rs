//! Dashcam configuration options and their value types.

use crate::error::{DashcamError, Result};
use crate::protocol::{Mode, parse_document};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use strum::IntoEnumIterator;
use strum_macros::{AsRefStr, Display, EnumIter, EnumString, FromRepr, IntoStaticStr};

/// Dashcam config options, keyed by their device opcode.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    PartialOrd,
    Ord,
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
pub enum ConfigOption {
    Adas = 2031,
    Audio = 2007,
    Exposure = 2005,
    FirmwareVersion = 3012,
    Gsensor = 2011,
    Language = 3008,
    Model = 3035,
    PhotoResolution = 1002,
    SerialNumber = 3037,
    StandbyClock = 2050,
    VideoAutoStart = 2012,
    VideoLength = 2003,
    VideoLogo = 2040,
    VideoResolution = 2002,
    VideoTimestamp = 2008,
}

impl ConfigOption {
    pub fn code(self) -> i32 {
        self as i32
    }

    pub fn value_type(self) -> ValueType {
        match self {
            ConfigOption::Adas => ValueType::Bool,
            ConfigOption::Audio => ValueType::Bool,
            ConfigOption::Exposure => ValueType::Exposure,
            ConfigOption::FirmwareVersion => ValueType::Text,
            ConfigOption::Gsensor => ValueType::GSensor,
            ConfigOption::Language => ValueType::Language,
            ConfigOption::Model => ValueType::Text,
            ConfigOption::PhotoResolution => ValueType::PhotoResolution,
            ConfigOption::SerialNumber => ValueType::Text,
            ConfigOption::StandbyClock => ValueType::Bool,
            ConfigOption::VideoAutoStart => ValueType::Bool,
            ConfigOption::VideoLength => ValueType::VideoLength,
            ConfigOption::VideoLogo => ValueType::Bool,
            ConfigOption::VideoResolution => ValueType::VideoResolution,
            ConfigOption::VideoTimestamp => ValueType::Bool,
        }
    }

    /// Mode the device must be in before the option can be written.
    pub fn required_mode(self) -> Mode {
        match self {
            ConfigOption::PhotoResolution => Mode::Photo,
            _ => Mode::Video,
        }
    }

    pub fn is_writable(self) -> bool {
        self.value_type() != ValueType::Text
    }
}

impl TryFrom<i32> for ConfigOption {
    type Error = DashcamError;

    fn try_from(code: i32) -> Result<Self> {
        ConfigOption::from_repr(code)
            .ok_or_else(|| DashcamError::Validation(format!("Unknown config option {code}")))
    }
}

/// Device value enumeration: discriminants are the device codes, names are the
/// strum/serde spelling. `=> "label"` overrides the snake_case name.
macro_rules! value_enum {
    (
        $(#[$meta:meta])*
        $name:ident { $($variant:ident = $code:literal $(=> $label:literal)?),* $(,)? }
    ) => {
        $(#[$meta])*
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
            IntoStaticStr,
        )]
        #[strum(serialize_all = "snake_case")]
        #[serde(rename_all = "snake_case")]
        #[repr(i32)]
        pub enum $name {
            $(
                $(#[strum(serialize = $label)] #[serde(rename = $label)])?
                $variant = $code,
            )*
        }

        impl From<$name> for i32 {
            fn from(value: $name) -> i32 {
                value as i32
            }
        }
    };
}

value_enum!(Exposure {
    PlusTwo = 0,
    PlusFiveThirds = 1,
    PlusFourThirds = 2,
    PlusOne = 3,
    PlusTwoThirds = 4,
    PlusOneThird = 5,
    Zero = 6,
    MinusOneThird = 7,
    MinusTwoThirds = 8,
    MinusOne = 9,
    MinusFourThirds = 10,
    MinusFiveThirds = 11,
    MinusTwo = 12,
});

value_enum!(GSensor {
    Low = 0,
    Medium = 1,
    High = 2,
});

value_enum!(Language {
    English = 0,
    French = 1,
    Spanish = 2,
    Portuguese = 3,
    German = 4,
    Italian = 5,
    ChineseSimplified = 6,
    ChineseTraditional = 7,
    Russian = 8,
    Japanese = 9,
});

value_enum!(PhotoResolution {
    R4032x3024 = 0 => "4032x3024",
    R3648x2736 = 1 => "3648x2736",
    R3264x2448 = 2 => "3264x2448",
    R2592x1944 = 3 => "2592x1944",
    R2048x1536 = 4 => "2048x1536",
    R640x480 = 5 => "640x480",
    R1280x960 = 6 => "1280x960",
    R1920x1080 = 7 => "1920x1080",
});

value_enum!(
    /// Loop recording segment length. 0 (no limit) exists on the device but is not offered.
    VideoLength {
        ThreeMinutes = 1,
        FiveMinutes = 2,
        TenMinutes = 3,
    }
);

value_enum!(VideoResolution {
    R1920x1080p30 = 0 => "1920x1080p_30fps",
    R1920x1080p60 = 1 => "1920x1080p_60fps",
    R2304x1296p30 = 2 => "2304x1296p_30fps",
});

/// Declared type of a config option's value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, AsRefStr)]
pub enum ValueType {
    Bool,
    Text,
    Exposure,
    GSensor,
    Language,
    PhotoResolution,
    VideoLength,
    VideoResolution,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", content = "value", rename_all = "snake_case")]
pub enum ConfigValue {
    Bool(bool),
    Text(String),
    Exposure(Exposure),
    GSensor(GSensor),
    Language(Language),
    PhotoResolution(PhotoResolution),
    VideoLength(VideoLength),
    VideoResolution(VideoResolution),
    /// Device reading that did not fit the declared type.
    Raw(String),
}

impl ValueType {
    /// Converts a device reading. Never fails: values that do not fit the
    /// declared type are kept as [`ConfigValue::Raw`].
    pub fn decode(self, raw: &str) -> ConfigValue {
        let raw = raw.trim();
        if self == ValueType::Text {
            return ConfigValue::Text(raw.to_string());
        }
        let decoded = raw.parse::<i32>().ok().and_then(|code| self.from_code(code));
        match decoded {
            Some(value) => value,
            None => {
                log::warn!("Value {:?} is not a valid {}", raw, self.as_ref());
                ConfigValue::Raw(raw.to_string())
            }
        }
    }

    fn from_code(self, code: i32) -> Option<ConfigValue> {
        match self {
            ValueType::Bool => Some(ConfigValue::Bool(code != 0)),
            ValueType::Text => Some(ConfigValue::Text(code.to_string())),
            ValueType::Exposure => Exposure::from_repr(code).map(ConfigValue::Exposure),
            ValueType::GSensor => GSensor::from_repr(code).map(ConfigValue::GSensor),
            ValueType::Language => Language::from_repr(code).map(ConfigValue::Language),
            ValueType::PhotoResolution => {
                PhotoResolution::from_repr(code).map(ConfigValue::PhotoResolution)
            }
            ValueType::VideoLength => VideoLength::from_repr(code).map(ConfigValue::VideoLength),
            ValueType::VideoResolution => {
                VideoResolution::from_repr(code).map(ConfigValue::VideoResolution)
            }
        }
    }

    /// Device code for `value`, if it is a settable member of this type.
    pub fn encode(self, value: &ConfigValue) -> Result<i32> {
        let code = match (self, value) {
            (ValueType::Bool, ConfigValue::Bool(flag)) => *flag as i32,
            (ValueType::Exposure, ConfigValue::Exposure(v)) => *v as i32,
            (ValueType::GSensor, ConfigValue::GSensor(v)) => *v as i32,
            (ValueType::Language, ConfigValue::Language(v)) => *v as i32,
            (ValueType::PhotoResolution, ConfigValue::PhotoResolution(v)) => *v as i32,
            (ValueType::VideoLength, ConfigValue::VideoLength(v)) => *v as i32,
            (ValueType::VideoResolution, ConfigValue::VideoResolution(v)) => *v as i32,
            (ValueType::Text, _) => {
                return Err(DashcamError::Validation(
                    "Text options are read-only".to_string(),
                ));
            }
            _ => {
                return Err(DashcamError::Validation(format!(
                    "{:?} is not a {} value",
                    value,
                    self.as_ref()
                )));
            }
        };
        Ok(code)
    }

    /// Checks a raw device code, as posted by front-ends.
    pub fn validate_code(self, code: i32) -> Result<i32> {
        let valid = match self {
            ValueType::Bool => code == 0 || code == 1,
            ValueType::Text => false,
            _ => self.from_code(code).is_some(),
        };
        if valid {
            Ok(code)
        } else {
            Err(DashcamError::Validation(format!(
                "{code} is not a valid {} value",
                self.as_ref()
            )))
        }
    }

    /// Names of the settable members, in code order.
    pub fn choices(self) -> Vec<(&'static str, i32)> {
        fn all<E>() -> Vec<(&'static str, i32)>
        where
            E: IntoEnumIterator + Copy + Into<&'static str> + Into<i32>,
        {
            E::iter().map(|v| (v.into(), v.into())).collect()
        }
        match self {
            ValueType::Bool => vec![("false", 0), ("true", 1)],
            ValueType::Text => Vec::new(),
            ValueType::Exposure => all::<Exposure>(),
            ValueType::GSensor => all::<GSensor>(),
            ValueType::Language => all::<Language>(),
            ValueType::PhotoResolution => all::<PhotoResolution>(),
            ValueType::VideoLength => all::<VideoLength>(),
            ValueType::VideoResolution => all::<VideoResolution>(),
        }
    }
}

impl ConfigValue {
    /// Device code of the value; `None` for text and raw readings.
    pub fn code(&self) -> Option<i32> {
        match self {
            ConfigValue::Bool(flag) => Some(*flag as i32),
            ConfigValue::Exposure(v) => Some((*v).into()),
            ConfigValue::GSensor(v) => Some((*v).into()),
            ConfigValue::Language(v) => Some((*v).into()),
            ConfigValue::PhotoResolution(v) => Some((*v).into()),
            ConfigValue::VideoLength(v) => Some((*v).into()),
            ConfigValue::VideoResolution(v) => Some((*v).into()),
            ConfigValue::Text(_) | ConfigValue::Raw(_) => None,
        }
    }
}

impl std::fmt::Display for ConfigValue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConfigValue::Bool(flag) => write!(f, "{flag}"),
            ConfigValue::Text(text) | ConfigValue::Raw(text) => f.write_str(text),
            ConfigValue::Exposure(v) => write!(f, "{v}"),
            ConfigValue::GSensor(v) => write!(f, "{v}"),
            ConfigValue::Language(v) => write!(f, "{v}"),
            ConfigValue::PhotoResolution(v) => write!(f, "{v}"),
            ConfigValue::VideoLength(v) => write!(f, "{v}"),
            ConfigValue::VideoResolution(v) => write!(f, "{v}"),
        }
    }
}

/// Point-in-time copy of the device configuration.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConfigSnapshot {
    values: BTreeMap<ConfigOption, ConfigValue>,
}

impl ConfigSnapshot {
    /// Decodes the fetch-all table of parallel `Cmd`/`Status` elements.
    ///
    /// Options the firmware exposes but this crate does not model are skipped.
    pub fn from_xml(body: &str) -> Result<Self> {
        let document = parse_document(body)?;
        let cmds = document.descendants().filter(|n| n.has_tag_name("Cmd"));
        let statuses = document.descendants().filter(|n| n.has_tag_name("Status"));

        let mut values = BTreeMap::new();
        for (cmd, status) in cmds.zip(statuses) {
            let cmd = cmd.text().unwrap_or("").trim();
            let Some(option) = cmd.parse::<i32>().ok().and_then(ConfigOption::from_repr) else {
                log::debug!("Config option {} not recognised", cmd);
                continue;
            };
            let value = option.value_type().decode(status.text().unwrap_or(""));
            values.insert(option, value);
        }
        Ok(Self { values })
    }

    pub fn get(&self, option: ConfigOption) -> Option<&ConfigValue> {
        self.values.get(&option)
    }

    pub fn iter(&self) -> impl Iterator<Item = (ConfigOption, &ConfigValue)> {
        self.values.iter().map(|(option, value)| (*option, value))
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}
