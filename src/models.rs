// Closed enumerations and identifier pairs shared by the Calendar and Gmail types

use chrono_tz::Tz;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Event colors as accepted by `colorId` (sent on the wire as the numeric string)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(into = "String", try_from = "String")]
pub enum CalendarColor {
    Blue = 1,
    Green = 2,
    Purple = 3,
    Red = 4,
    Yellow = 5,
    Orange = 6,
    Turquoise = 7,
    Gray = 8,
    BoldBlue = 9,
    BoldGreen = 10,
    BoldRed = 11,
}

impl CalendarColor {
    pub fn from_id(id: u8) -> Option<Self> {
        use CalendarColor::*;
        Some(match id {
            1 => Blue,
            2 => Green,
            3 => Purple,
            4 => Red,
            5 => Yellow,
            6 => Orange,
            7 => Turquoise,
            8 => Gray,
            9 => BoldBlue,
            10 => BoldGreen,
            11 => BoldRed,
            _ => return None,
        })
    }

    pub fn id(self) -> u8 {
        self as u8
    }
}

impl Default for CalendarColor {
    fn default() -> Self {
        CalendarColor::BoldRed
    }
}

impl From<CalendarColor> for String {
    fn from(color: CalendarColor) -> Self {
        color.id().to_string()
    }
}

impl TryFrom<String> for CalendarColor {
    type Error = String;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value
            .parse::<u8>()
            .ok()
            .and_then(CalendarColor::from_id)
            .ok_or_else(|| format!("Unknown calendar color id: {}", value))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum EventType {
    #[default]
    #[serde(rename = "default")]
    Default,
    #[serde(rename = "birthday")]
    Birthday,
    #[serde(rename = "focusTime")]
    FocusTime,
    #[serde(rename = "fromGmail")]
    FromGmail,
    #[serde(rename = "outOfOffice")]
    OutOfOffice,
    #[serde(rename = "workingLocation")]
    WorkingLocation,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Transparency {
    #[default]
    Opaque,
    Transparent,
}

/// US time zones commonly used for event times
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LocalTimeZone {
    Est,
    Cst,
    Mtn,
    Pst,
}

impl LocalTimeZone {
    pub fn iana_name(self) -> &'static str {
        match self {
            LocalTimeZone::Est => "America/New_York",
            LocalTimeZone::Cst => "America/Chicago",
            LocalTimeZone::Mtn => "America/Denver",
            LocalTimeZone::Pst => "America/Los_Angeles",
        }
    }

    pub fn tz(self) -> Tz {
        match self {
            LocalTimeZone::Est => Tz::America__New_York,
            LocalTimeZone::Cst => Tz::America__Chicago,
            LocalTimeZone::Mtn => Tz::America__Denver,
            LocalTimeZone::Pst => Tz::America__Los_Angeles,
        }
    }
}

impl fmt::Display for LocalTimeZone {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.iana_name())
    }
}

impl From<LocalTimeZone> for String {
    fn from(tz: LocalTimeZone) -> Self {
        tz.iana_name().to_string()
    }
}

/// `format` parameter of the drafts/messages get endpoints
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MailFormat {
    Minimal,
    Full,
    Raw,
    Metadata,
}

impl MailFormat {
    pub fn as_str(&self) -> &'static str {
        match self {
            MailFormat::Minimal => "minimal",
            MailFormat::Full => "full",
            MailFormat::Raw => "raw",
            MailFormat::Metadata => "metadata",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MessageListVisibility {
    Show,
    Hide,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum LabelListVisibility {
    LabelShow,
    LabelShowIfUnread,
    LabelHide,
}

/// `system` labels are created by Gmail, `user` labels by the user or an application
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LabelType {
    System,
    User,
}

/// Label palette colors; any other hex value is kept verbatim in `Other`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum LabelColorValue {
    #[serde(rename = "#000000")]
    Black,
    #[serde(rename = "#999999")]
    Gray60,
    #[serde(rename = "#89d3b2")]
    LightGreen,
    #[serde(rename = "#094228")]
    Green,
    #[serde(rename = "#ffffff")]
    White,
    #[serde(rename = "#aa8831")]
    PumpkinOrange,
    #[serde(rename = "#6d9eeb")]
    LightBlue,
    #[serde(untagged)]
    Other(String),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CalendarId {
    pub name: String,
    pub id: String,
}

impl CalendarId {
    pub fn new(name: impl Into<String>, id: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            id: id.into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LabelId {
    pub name: String,
    pub id: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_color_wire_format() {
        assert_eq!(serde_json::to_string(&CalendarColor::BoldRed).unwrap(), "\"11\"");
        let parsed: CalendarColor = serde_json::from_str("\"7\"").unwrap();
        assert_eq!(parsed, CalendarColor::Turquoise);
        assert!(serde_json::from_str::<CalendarColor>("\"12\"").is_err());
    }

    #[test]
    fn test_event_type_names() {
        assert_eq!(serde_json::to_string(&EventType::FocusTime).unwrap(), "\"focusTime\"");
        assert_eq!(serde_json::to_string(&EventType::default()).unwrap(), "\"default\"");
    }

    #[test]
    fn test_local_time_zone() {
        assert_eq!(LocalTimeZone::Pst.iana_name(), "America/Los_Angeles");
        assert_eq!(LocalTimeZone::Est.tz().name(), "America/New_York");
        assert_eq!(String::from(LocalTimeZone::Mtn), "America/Denver");
    }

    #[test]
    fn test_label_enums() {
        let vis: LabelListVisibility = serde_json::from_str("\"labelShowIfUnread\"").unwrap();
        assert_eq!(vis, LabelListVisibility::LabelShowIfUnread);

        let color: LabelColorValue = serde_json::from_str("\"#6d9eeb\"").unwrap();
        assert_eq!(color, LabelColorValue::LightBlue);

        let unknown: LabelColorValue = serde_json::from_str("\"#123456\"").unwrap();
        assert_eq!(unknown, LabelColorValue::Other("#123456".to_string()));
        assert_eq!(serde_json::to_string(&unknown).unwrap(), "\"#123456\"");
    }
}
