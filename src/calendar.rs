// Google Calendar service

pub mod types;

pub use types::{
    format_timestamp, CalendarList, CalendarListEntry, EventTime, EventUser, Events, EventsDraft,
    EventsList, EventsQuery, OrderBy, ReminderOverride, Reminders,
};

use crate::client::{segment, token_preview, GoogleClient};
use crate::config::Config;
use crate::error::{ApiError, ApiResult};
use crate::models::CalendarId;

/// Page size requested from `calendarList.list`
const CALENDAR_LIST_PAGE_SIZE: u32 = 250;

pub struct CalendarService {
    client: GoogleClient,
}

impl CalendarService {
    /// Obtain calendar credentials (refresh or consent as needed) and build the service
    pub async fn connect(config: &Config) -> ApiResult<Self> {
        let creds = config.calendar_credentials().credentials().await?;
        let token = creds
            .access_token()
            .ok_or_else(|| ApiError::Parse("Token file has no access token".to_string()))?
            .to_string();

        tracing::info!(
            "Calendar service ready (token: {}...)",
            token_preview(&token)
        );
        Ok(Self::with_client(GoogleClient::new(
            "Calendar",
            config.calendar_api_base.clone(),
            token,
        )))
    }

    pub fn with_client(client: GoogleClient) -> Self {
        Self { client }
    }

    pub async fn create_event(&self, draft: &EventsDraft) -> ApiResult<Events> {
        let calendar_id = draft.calendar_id();
        let path = format!("/calendars/{}/events", segment(calendar_id));

        let event: Events = self.client.post(&path, draft).await?;
        tracing::info!("Created event {} in {}", event.id, calendar_id);
        Ok(event.with_calendar_id(calendar_id))
    }

    /// Fetch one event; `time_zone` is only sent when given
    pub async fn get_event(
        &self,
        event_id: &str,
        calendar_id: &str,
        time_zone: Option<&str>,
    ) -> ApiResult<Events> {
        let path = format!(
            "/calendars/{}/events/{}",
            segment(calendar_id),
            segment(event_id)
        );
        let mut query = Vec::new();
        if let Some(tz) = time_zone {
            query.push(("timeZone", tz.to_string()));
        }

        let event: Events = self.client.get(&path, &query).await?;
        Ok(event.with_calendar_id(calendar_id))
    }

    /// Replace the stored event with `event` (PUT, not PATCH)
    pub async fn update_event(&self, event: &Events) -> ApiResult<Events> {
        if event.id.is_empty() {
            return Err(ApiError::validation("Cannot update an event without an id"));
        }
        let calendar_id = calendar_or_primary(&event.calendar_id);
        let path = format!(
            "/calendars/{}/events/{}",
            segment(calendar_id),
            segment(&event.id)
        );

        let updated: Events = self.client.put(&path, event).await?;
        tracing::info!("Updated event {} in {}", updated.id, calendar_id);
        Ok(updated.with_calendar_id(calendar_id))
    }

    /// Delete `event`. Remote rejections are logged and swallowed; transport failures propagate.
    pub async fn delete_event(&self, event: &Events) -> ApiResult<()> {
        let calendar_id = calendar_or_primary(&event.calendar_id);
        let path = format!(
            "/calendars/{}/events/{}",
            segment(calendar_id),
            segment(&event.id)
        );

        match self.client.delete(&path).await {
            Ok(body) if body.trim().is_empty() => {
                tracing::info!("Deleted event {} from {}", event.id, calendar_id);
                Ok(())
            }
            Ok(body) => {
                tracing::warn!("Unexpected response deleting event {}: {}", event.id, body);
                Ok(())
            }
            Err(ApiError::Api { status, message }) => {
                tracing::warn!("Failed to delete event {} ({}): {}", event.id, status, message);
                Ok(())
            }
            Err(e) => Err(e),
        }
    }

    /// Events of `query.calendar_id` within `[since, until)`
    pub async fn get_calendar_events_by_date(&self, query: &EventsQuery) -> ApiResult<EventsList> {
        query.validate()?;
        let path = format!("/calendars/{}/events", segment(&query.calendar_id));

        tracing::debug!(
            "Listing events in {} from {} to {}",
            query.calendar_id,
            format_timestamp(&query.since),
            format_timestamp(&query.until)
        );
        let list: EventsList = self.client.get(&path, &query.to_query()).await?;
        Ok(list.with_calendar_id(&query.calendar_id))
    }

    /// Every page of the user's calendar list, following `nextPageToken` until it is absent or empty
    pub async fn list_calendar_pages(&self) -> ApiResult<Vec<CalendarListEntry>> {
        let mut pages = Vec::new();
        let mut page_token: Option<String> = None;

        loop {
            let mut query = vec![("maxResults", CALENDAR_LIST_PAGE_SIZE.to_string())];
            if let Some(token) = &page_token {
                query.push(("pageToken", token.clone()));
            }

            let page: CalendarListEntry = self.client.get("/users/me/calendarList", &query).await?;
            if page.items.is_empty() {
                tracing::info!("Calendar list page returned no calendars");
            }

            page_token = page.next_page().map(str::to_string);
            pages.push(page);

            if page_token.is_none() {
                break;
            }
        }

        tracing::debug!("Fetched {} calendar list page(s)", pages.len());
        Ok(pages)
    }

    pub async fn list_calendars(&self) -> ApiResult<Vec<CalendarList>> {
        Ok(self
            .list_calendar_pages()
            .await?
            .into_iter()
            .flat_map(|page| page.items)
            .collect())
    }

    /// One `Name: {summary} | ID: {id}` line per calendar
    pub async fn get_calendar_list(&self) -> ApiResult<String> {
        let lines: Vec<String> = self
            .list_calendars()
            .await?
            .iter()
            .map(|c| format!("Name: {} | ID: {}", c.summary, c.id))
            .collect();
        Ok(lines.join("\n"))
    }

    /// Upcoming events (default query window) for each calendar, one calendar at a time
    pub async fn get_all_events(&self, calendars: &[CalendarId]) -> ApiResult<Vec<Events>> {
        let mut all = Vec::new();

        for calendar in calendars {
            let query = EventsQuery::new(calendar_or_primary(&calendar.id));
            let list = self.get_calendar_events_by_date(&query).await?;

            if list.events.is_empty() {
                tracing::info!("No upcoming events found in {}", calendar.name);
                continue;
            }
            all.extend(list.events);
        }

        Ok(all)
    }
}

fn calendar_or_primary(calendar_id: &str) -> &str {
    if calendar_id.is_empty() {
        "primary"
    } else {
        calendar_id
    }
}
