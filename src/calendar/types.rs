// Calendar v3 resource schemas

use crate::error::{ApiError, ApiResult};
use crate::models::{CalendarColor, EventType, Transparency};
use chrono::{DateTime, Duration, NaiveDate, NaiveDateTime, SecondsFormat, TimeZone, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::cmp::Ordering;
use std::fmt;

/// Start or end of an event: either `{date}` (all-day) or `{dateTime, timeZone}` (timed)
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EventTime {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub date: Option<String>,
    #[serde(rename = "dateTime", skip_serializing_if = "Option::is_none")]
    pub date_time: Option<String>,
    #[serde(rename = "timeZone", skip_serializing_if = "Option::is_none")]
    pub time_zone: Option<String>,
}

impl EventTime {
    pub fn all_day(date: NaiveDate) -> Self {
        Self {
            date: Some(date.format("%Y-%m-%d").to_string()),
            ..Default::default()
        }
    }

    /// Wall-clock time interpreted in `time_zone` (an IANA name such as "America/Los_Angeles")
    pub fn timed(date_time: NaiveDateTime, time_zone: impl Into<String>) -> Self {
        Self {
            date_time: Some(date_time.format("%Y-%m-%dT%H:%M:%S").to_string()),
            time_zone: Some(time_zone.into()),
            ..Default::default()
        }
    }

    pub fn from_zoned(date_time: DateTime<chrono_tz::Tz>) -> Self {
        Self {
            date_time: Some(date_time.to_rfc3339_opts(SecondsFormat::Secs, true)),
            time_zone: Some(date_time.timezone().name().to_string()),
            ..Default::default()
        }
    }

    pub fn is_all_day(&self) -> bool {
        self.date.is_some()
    }

    /// `date` for all-day times, `dateTime` otherwise
    pub fn value(&self) -> Option<&str> {
        self.date.as_deref().or(self.date_time.as_deref())
    }

    pub fn validate(&self, attribute: &str) -> ApiResult<()> {
        if self.date_time.is_some() && self.time_zone.is_none() {
            return Err(ApiError::validation(format!(
                "You must have the key value of `timeZone` inside your {}",
                attribute
            )));
        }

        match (&self.date, &self.date_time) {
            (None, None) => Err(ApiError::validation(format!(
                "You must have the key value `date` or `dateTime` inside your {}",
                attribute
            ))),
            (Some(_), Some(_)) => Err(ApiError::validation(format!(
                "You cannot have both `date` and `dateTime` keys inside your {}",
                attribute
            ))),
            _ => Ok(()),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EventUser {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub display_name: Option<String>,
    #[serde(rename = "self", skip_serializing_if = "Option::is_none")]
    pub is_self: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub organizer: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub resource: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub optional: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub response_status: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub comment: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub additional_guests: Option<u32>,
}

impl EventUser {
    pub fn attendee(email: impl Into<String>) -> Self {
        Self {
            email: Some(email.into()),
            ..Default::default()
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReminderOverride {
    pub method: String,
    pub minutes: u32,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Reminders {
    pub use_default: bool,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub overrides: Vec<ReminderOverride>,
}

impl Default for Reminders {
    fn default() -> Self {
        Self {
            use_default: true,
            overrides: Vec::new(),
        }
    }
}

/// An event that has not been submitted yet. Start and end are validated when set.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EventsDraft {
    #[serde(skip)]
    calendar_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    pub summary: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,
    pub color_id: CalendarColor,
    pub event_type: EventType,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub transparency: Option<Transparency>,
    start: EventTime,
    end: EventTime,
    pub reminders: Reminders,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub attendees: Vec<EventUser>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub recurrence: Vec<String>,
}

impl EventsDraft {
    pub fn new(
        calendar_id: impl Into<String>,
        summary: impl Into<String>,
        start: EventTime,
        end: EventTime,
    ) -> ApiResult<Self> {
        start.validate("start")?;
        end.validate("end")?;

        Ok(Self {
            calendar_id: calendar_id.into(),
            id: None,
            summary: summary.into(),
            description: None,
            location: None,
            color_id: CalendarColor::default(),
            event_type: EventType::default(),
            transparency: None,
            start,
            end,
            reminders: Reminders::default(),
            attendees: Vec::new(),
            recurrence: Vec::new(),
        })
    }

    pub fn calendar_id(&self) -> &str {
        &self.calendar_id
    }

    pub fn start(&self) -> &EventTime {
        &self.start
    }

    pub fn end(&self) -> &EventTime {
        &self.end
    }

    pub fn with_start(mut self, start: EventTime) -> ApiResult<Self> {
        start.validate("start")?;
        self.start = start;
        Ok(self)
    }

    pub fn with_end(mut self, end: EventTime) -> ApiResult<Self> {
        end.validate("end")?;
        self.end = end;
        Ok(self)
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn with_location(mut self, location: impl Into<String>) -> Self {
        self.location = Some(location.into());
        self
    }

    pub fn with_color(mut self, color: CalendarColor) -> Self {
        self.color_id = color;
        self
    }

    pub fn with_event_type(mut self, event_type: EventType) -> Self {
        self.event_type = event_type;
        self
    }

    pub fn with_transparency(mut self, transparency: Transparency) -> Self {
        self.transparency = Some(transparency);
        self
    }

    pub fn with_reminders(mut self, reminders: Reminders) -> Self {
        self.reminders = reminders;
        self
    }

    pub fn with_attendees(mut self, attendees: Vec<EventUser>) -> Self {
        self.attendees = attendees;
        self
    }

    pub fn with_recurrence(mut self, rules: Vec<String>) -> Self {
        self.recurrence = rules;
        self
    }
}

/// Server-confirmed event
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Events {
    /// Calendar the event was read from; not part of the resource
    #[serde(skip)]
    pub calendar_id: String,
    #[serde(default)]
    pub id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub kind: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub etag: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub html_link: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub created: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub updated: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub summary: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub color_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub event_type: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub creator: Option<EventUser>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub organizer: Option<EventUser>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub start: Option<EventTime>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub end: Option<EventTime>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub end_time_unspecified: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub recurrence: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub recurring_event_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub original_start_time: Option<EventTime>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub transparency: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub visibility: Option<String>,
    #[serde(rename = "iCalUID", skip_serializing_if = "Option::is_none")]
    pub ical_uid: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sequence: Option<i64>,
    /// In the order returned by the server
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub attendees: Vec<EventUser>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub attendees_omitted: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub extended_properties: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reminders: Option<Reminders>,
    /// Fields this crate does not model, preserved for full-overwrite updates
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Events {
    pub fn color(&self) -> Option<CalendarColor> {
        self.color_id
            .as_deref()
            .and_then(|id| id.parse::<u8>().ok())
            .and_then(CalendarColor::from_id)
    }

    pub(crate) fn with_calendar_id(mut self, calendar_id: &str) -> Self {
        self.calendar_id = calendar_id.to_string();
        self
    }
}

impl PartialEq for Events {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for Events {}

impl PartialOrd for Events {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Events {
    fn cmp(&self, other: &Self) -> Ordering {
        self.id.cmp(&other.id)
    }
}

impl fmt::Display for Events {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let time = |t: &Option<EventTime>| t.as_ref().and_then(|t| t.value()).unwrap_or("").to_string();
        writeln!(f, "Title: {} | ID: {}", self.summary.as_deref().unwrap_or("(No title)"), self.id)?;
        writeln!(f, "Start: {}", time(&self.start))?;
        writeln!(f, "End: {}", time(&self.end))?;
        writeln!(f, "Description: {}", self.description.as_deref().unwrap_or(""))?;
        writeln!(f, "Location: {}", self.location.as_deref().unwrap_or(""))?;
        write!(f, "CalendarID: {}", self.calendar_id)
    }
}

/// One page of `events.list`
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EventsList {
    #[serde(skip)]
    pub calendar_id: String,
    pub kind: Option<String>,
    pub etag: Option<String>,
    pub summary: Option<String>,
    pub description: Option<String>,
    pub updated: Option<String>,
    pub time_zone: Option<String>,
    pub access_role: Option<String>,
    #[serde(default)]
    pub default_reminders: Vec<ReminderOverride>,
    pub next_page_token: Option<String>,
    pub next_sync_token: Option<String>,
    #[serde(rename = "items", default)]
    pub events: Vec<Events>,
}

impl EventsList {
    pub(crate) fn with_calendar_id(mut self, calendar_id: &str) -> Self {
        self.calendar_id = calendar_id.to_string();
        self.events = self
            .events
            .into_iter()
            .map(|e| e.with_calendar_id(calendar_id))
            .collect();
        self
    }
}

impl fmt::Display for EventsList {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let rendered: Vec<String> = self.events.iter().map(|e| e.to_string()).collect();
        f.write_str(&rendered.join("\n\n"))
    }
}

/// Summary of one calendar in the user's calendar list
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CalendarList {
    pub id: String,
    #[serde(default)]
    pub summary: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub summary_override: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub color_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub time_zone: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub access_role: Option<String>,
    #[serde(default)]
    pub hidden: bool,
    #[serde(default)]
    pub selected: bool,
    #[serde(default)]
    pub primary: bool,
    #[serde(default)]
    pub deleted: bool,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub default_reminders: Vec<ReminderOverride>,
}

impl fmt::Display for CalendarList {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} | {} | {}",
            self.summary,
            self.id,
            self.color_id.as_deref().unwrap_or("")
        )
    }
}

/// One page of `calendarList.list`; a missing or empty `nextPageToken` ends pagination
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CalendarListEntry {
    pub kind: Option<String>,
    pub etag: Option<String>,
    pub next_page_token: Option<String>,
    pub next_sync_token: Option<String>,
    #[serde(default)]
    pub items: Vec<CalendarList>,
}

impl CalendarListEntry {
    pub fn next_page(&self) -> Option<&str> {
        self.next_page_token.as_deref().filter(|t| !t.is_empty())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OrderBy {
    /// Only available when expanding recurring events into single events
    #[default]
    StartTime,
    Updated,
}

impl OrderBy {
    pub fn as_str(&self) -> &'static str {
        match self {
            OrderBy::StartTime => "startTime",
            OrderBy::Updated => "updated",
        }
    }
}

/// Parameters for listing a calendar's events within `[since, until)`
#[derive(Debug, Clone)]
pub struct EventsQuery {
    pub calendar_id: String,
    pub since: DateTime<Utc>,
    pub until: DateTime<Utc>,
    pub max_results: u32,
    pub single_events: bool,
    pub order_by: OrderBy,
}

impl Default for EventsQuery {
    fn default() -> Self {
        let now = Utc::now();
        Self {
            calendar_id: "primary".to_string(),
            since: now,
            until: now + Duration::days(30),
            max_results: 10,
            single_events: true,
            order_by: OrderBy::StartTime,
        }
    }
}

impl EventsQuery {
    pub fn new(calendar_id: impl Into<String>) -> Self {
        Self {
            calendar_id: calendar_id.into(),
            ..Default::default()
        }
    }

    /// Set the range; both ends are converted to UTC
    pub fn between<Tz: TimeZone>(mut self, since: DateTime<Tz>, until: DateTime<Tz>) -> Self {
        self.since = since.with_timezone(&Utc);
        self.until = until.with_timezone(&Utc);
        self
    }

    pub fn max_results(mut self, max_results: u32) -> Self {
        self.max_results = max_results;
        self
    }

    pub fn single_events(mut self, single_events: bool) -> Self {
        self.single_events = single_events;
        self
    }

    pub fn order_by(mut self, order_by: OrderBy) -> Self {
        self.order_by = order_by;
        self
    }

    pub fn validate(&self) -> ApiResult<()> {
        if self.until <= self.since {
            return Err(ApiError::validation("`until` must be later than `since`"));
        }
        if self.order_by == OrderBy::StartTime && !self.single_events {
            return Err(ApiError::validation(
                "Ordering by `startTime` is only available when `single_events` is true",
            ));
        }
        Ok(())
    }

    pub fn to_query(&self) -> Vec<(&'static str, String)> {
        vec![
            ("timeMin", format_timestamp(&self.since)),
            ("timeMax", format_timestamp(&self.until)),
            ("maxResults", self.max_results.to_string()),
            ("singleEvents", self.single_events.to_string()),
            ("orderBy", self.order_by.as_str().to_string()),
        ]
    }
}

/// RFC 3339 in UTC with a `Z` suffix, e.g. 2024-01-01T08:00:00Z
pub fn format_timestamp(dt: &DateTime<Utc>) -> String {
    dt.to_rfc3339_opts(SecondsFormat::Secs, true)
}
