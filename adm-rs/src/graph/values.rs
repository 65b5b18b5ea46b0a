//! Provides the typed values stored in entity records.
//!
//! Each value is parsed from and rendered to the textual form used in ADM documents:
//!
//! ```
//! use adm::graph::values::AttributeValue;
//! use adm::schema::ValueType;
//!
//! let value = AttributeValue::parse(ValueType::Bool, "true").unwrap();
//! assert_eq!(value, AttributeValue::Bool(true));
//! assert_eq!(value.to_string(), "1");
//!
//! let value = AttributeValue::parse(ValueType::Timecode, "00:00:01.00000S48000").unwrap();
//! assert_eq!(value.to_string(), "00:00:01.00000S48000");
//! ```
use std::fmt::{Display, Formatter};

use regex::Regex;

use crate::adm_error;
use crate::schema::ValueType;
use crate::status::AdmResult;

/// Enumerates the audio types of pack and channel formats.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash)]
pub enum AudioType {
    /// Channel based audio (`0001`).
    DirectSpeakers = 1,
    /// Matrix based audio (`0002`).
    Matrix = 2,
    /// Object based audio (`0003`).
    Objects = 3,
    /// Scene based audio (`0004`).
    Hoa = 4,
    /// Binaural audio (`0005`).
    Binaural = 5,
}

const AUDIO_TYPES: [AudioType; 5] = [
    AudioType::DirectSpeakers,
    AudioType::Matrix,
    AudioType::Objects,
    AudioType::Hoa,
    AudioType::Binaural,
];

impl AudioType {
    /// Returns the hex label like `0001`.
    pub fn label(self) -> String {
        format!("{:04X}", self as u8)
    }

    /// Returns the definition name like `DirectSpeakers`.
    pub fn definition(self) -> &'static str {
        match self {
            AudioType::DirectSpeakers => "DirectSpeakers",
            AudioType::Matrix => "Matrix",
            AudioType::Objects => "Objects",
            AudioType::Hoa => "HOA",
            AudioType::Binaural => "Binaural",
        }
    }

    /// Parses either a hex label or a definition name.
    ///
    /// # Example
    /// ```
    /// # use adm::graph::values::AudioType;
    /// assert_eq!(AudioType::parse("0003").unwrap(), AudioType::Objects);
    /// assert_eq!(AudioType::parse("HOA").unwrap(), AudioType::Hoa);
    /// assert!(AudioType::parse("0042").is_err());
    /// ```
    pub fn parse(text: &str) -> AdmResult<AudioType> {
        AUDIO_TYPES
            .iter()
            .copied()
            .find(|audio_type| {
                audio_type.definition() == text || audio_type.label().eq_ignore_ascii_case(text)
            })
            .ok_or_else(|| adm_error!(ValueTypeMismatch, "Unknown audio type: {}", text))
    }
}

/// Represents an ADM timecode.
///
/// Both the decimal grammar `hh:mm:ss.fffff` and the fractional grammar `hh:mm:ss.nnnnnSddddd`
/// (where `nnnnn` samples of a rate of `ddddd` make up the fraction) are supported.
#[derive(Clone, Debug, Eq, PartialEq, Hash)]
pub struct Timecode {
    hours: u32,
    hours_digits: usize,
    minutes: u8,
    seconds: u8,
    fraction: u64,
    fraction_digits: usize,
    rate: Option<u64>,
}

lazy_static::lazy_static! {
    static ref TIMECODE: Regex =
        Regex::new(r"^(\d{2,}):(\d{2}):(\d{2})\.(\d{1,18})(?:S(\d{1,18}))?$").unwrap();
}

impl Timecode {
    /// Parses the given text.
    ///
    /// # Example
    /// ```
    /// # use adm::graph::values::Timecode;
    /// let timecode = Timecode::parse("00:01:02.50000").unwrap();
    /// assert_eq!(timecode.as_seconds(), 62.5);
    ///
    /// let timecode = Timecode::parse("00:00:00.24000S48000").unwrap();
    /// assert_eq!(timecode.as_seconds(), 0.5);
    ///
    /// assert!(Timecode::parse("00:61:00.00000").is_err());
    /// ```
    pub fn parse(text: &str) -> AdmResult<Timecode> {
        let captures = TIMECODE
            .captures(text)
            .ok_or_else(|| adm_error!(ValueTypeMismatch, "Invalid timecode: {}", text))?;

        let number = |index: usize| -> AdmResult<u64> {
            captures
                .get(index)
                .map(|group| group.as_str())
                .unwrap_or_default()
                .parse::<u64>()
                .map_err(|_| adm_error!(ValueTypeMismatch, "Invalid timecode: {}", text))
        };

        let hours = number(1)?;
        let minutes = number(2)?;
        let seconds = number(3)?;
        if hours > u32::MAX as u64 || minutes > 59 || seconds > 59 {
            return Err(adm_error!(ValueTypeMismatch, "Invalid timecode: {}", text));
        }

        let rate = if captures.get(5).is_some() {
            Some(number(5)?)
        } else {
            None
        };
        if rate == Some(0) {
            return Err(adm_error!(
                ValueTypeMismatch,
                "Invalid timecode (zero rate): {}",
                text
            ));
        }

        Ok(Timecode {
            hours: hours as u32,
            hours_digits: captures
                .get(1)
                .map(|group| group.as_str().len())
                .unwrap_or(2),
            minutes: minutes as u8,
            seconds: seconds as u8,
            fraction: number(4)?,
            fraction_digits: captures
                .get(4)
                .map(|group| group.as_str().len())
                .unwrap_or(1),
            rate,
        })
    }

    /// Converts the timecode into seconds.
    pub fn as_seconds(&self) -> f64 {
        let whole = self.hours as f64 * 3600.0 + self.minutes as f64 * 60.0 + self.seconds as f64;
        let fraction = match self.rate {
            Some(rate) => self.fraction as f64 / rate as f64,
            None => self.fraction as f64 / 10f64.powi(self.fraction_digits as i32),
        };

        whole + fraction
    }
}

impl Display for Timecode {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{:0hours_width$}:{:02}:{:02}.{:0width$}",
            self.hours,
            self.minutes,
            self.seconds,
            self.fraction,
            hours_width = self.hours_digits,
            width = self.fraction_digits
        )?;
        if let Some(rate) = self.rate {
            write!(f, "S{}", rate)?;
        }

        Ok(())
    }
}

/// Represents a value stored for an attribute tag.
#[derive(Clone, Debug, PartialEq)]
pub enum AttributeValue {
    /// A flag.
    Bool(bool),
    /// A non-negative integer.
    Unsigned(u64),
    /// A signed integer.
    Signed(i64),
    /// A floating point number.
    Float(f64),
    /// An audio type.
    AudioType(AudioType),
    /// A timecode.
    Timecode(Timecode),
    /// Plain text.
    String(String),
}

impl AttributeValue {
    /// Returns the type of this value.
    pub fn value_type(&self) -> ValueType {
        match self {
            AttributeValue::Bool(_) => ValueType::Bool,
            AttributeValue::Unsigned(_) => ValueType::Unsigned,
            AttributeValue::Signed(_) => ValueType::Signed,
            AttributeValue::Float(_) => ValueType::Float,
            AttributeValue::AudioType(_) => ValueType::AudioType,
            AttributeValue::Timecode(_) => ValueType::Timecode,
            AttributeValue::String(_) => ValueType::String,
        }
    }

    /// Parses the given text as a value of the given type.
    ///
    /// Fails with `VALUE_TYPE_MISMATCH` if the text doesn't match the grammar of the type.
    ///
    /// # Example
    /// ```
    /// # use adm::graph::values::AttributeValue;
    /// # use adm::schema::ValueType;
    /// # use adm::status::Status;
    /// assert_eq!(AttributeValue::parse(ValueType::Float, "-23.5").unwrap(), AttributeValue::Float(-23.5));
    /// assert_eq!(AttributeValue::parse(ValueType::Unsigned, "-1").unwrap_err().status(),
    ///            Status::ValueTypeMismatch);
    /// ```
    pub fn parse(value_type: ValueType, text: &str) -> AdmResult<AttributeValue> {
        let mismatch = || {
            adm_error!(
                ValueTypeMismatch,
                "Cannot parse '{}' as {:?}",
                text,
                value_type
            )
        };

        match value_type {
            ValueType::Bool => match text {
                "1" | "true" => Ok(AttributeValue::Bool(true)),
                "0" | "false" => Ok(AttributeValue::Bool(false)),
                _ => Err(mismatch()),
            },
            ValueType::Unsigned => text
                .parse::<u64>()
                .map(AttributeValue::Unsigned)
                .map_err(|_| mismatch()),
            ValueType::Signed => text
                .parse::<i64>()
                .map(AttributeValue::Signed)
                .map_err(|_| mismatch()),
            ValueType::Float => text
                .parse::<f64>()
                .map(AttributeValue::Float)
                .map_err(|_| mismatch()),
            ValueType::AudioType => AudioType::parse(text).map(AttributeValue::AudioType),
            ValueType::Timecode => Timecode::parse(text).map(AttributeValue::Timecode),
            ValueType::String => Ok(AttributeValue::String(text.to_owned())),
        }
    }

    /// Returns the contained string if this is a text value.
    pub fn as_str(&self) -> Option<&str> {
        match self {
            AttributeValue::String(text) => Some(text.as_str()),
            _ => None,
        }
    }
}

impl Display for AttributeValue {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            AttributeValue::Bool(value) => f.write_str(if *value { "1" } else { "0" }),
            AttributeValue::Unsigned(value) => write!(f, "{}", value),
            AttributeValue::Signed(value) => write!(f, "{}", value),
            AttributeValue::Float(value) => write!(f, "{}", value),
            AttributeValue::AudioType(value) => f.write_str(&value.label()),
            AttributeValue::Timecode(value) => write!(f, "{}", value),
            AttributeValue::String(value) => f.write_str(value),
        }
    }
}
