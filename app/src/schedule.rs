//! Arrival schedule for one stop on one day.

use chrono::{Duration, NaiveDate, NaiveDateTime, NaiveTime};
use reqwest::Url;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::client::TransitApi;
use crate::error::{Result, ViewerError};
use crate::session::Generation;
use crate::types::{ScheduleEntry, StopRecord};

pub const UPCOMING_TITLE: &str = "Upcoming arrival";

const DATE_FORMAT: &str = "%Y-%m-%d";

/// Parses `HH:MM[:SS]` on `date`. Hours past 23 belong to the following day.
pub fn parse_arrival(date: NaiveDate, time: &str) -> Option<NaiveDateTime> {
    let mut parts = time.trim().split(':');
    let hours: i64 = parts.next()?.parse().ok()?;
    let minutes: i64 = parts.next()?.parse().ok()?;
    let seconds: i64 = match parts.next() {
        Some(s) => s.parse().ok()?,
        None => 0,
    };
    if parts.next().is_some()
        || hours < 0
        || !(0..60).contains(&minutes)
        || !(0..60).contains(&seconds)
    {
        return None;
    }

    let total = hours.checked_mul(3600)?.checked_add(minutes * 60 + seconds)?;
    date.and_time(NaiveTime::MIN)
        .checked_add_signed(Duration::try_seconds(total)?)
}

/// Index of the first arrival after `now`, in list order. Only today's
/// schedule has one.
pub fn next_arrival_index(entries: &[ScheduleEntry], date: NaiveDate, now: NaiveDateTime) -> Option<usize> {
    if date != now.date() {
        return None;
    }
    entries.iter().position(|entry| {
        parse_arrival(date, &entry.arrival_time).is_some_and(|at| at > now)
    })
}

/// `?stop=<id>&date=YYYY-MM-DD`. A missing date means today.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScheduleQuery {
    pub stop_id: String,
    pub date: Option<NaiveDate>,
}

impl ScheduleQuery {
    pub fn new(stop_id: impl Into<String>, date: Option<NaiveDate>) -> Self {
        Self {
            stop_id: stop_id.into(),
            date,
        }
    }

    pub fn from_pairs<I, K, V>(pairs: I) -> Result<Self>
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: AsRef<str>,
    {
        let mut stop_id = None;
        let mut date = None;
        for (key, value) in pairs {
            match key.as_ref() {
                "stop" => stop_id = Some(value.as_ref().to_string()),
                "date" => date = Some(value.as_ref().to_string()),
                _ => {}
            }
        }

        let stop_id = stop_id
            .filter(|s| !s.is_empty())
            .ok_or_else(|| ViewerError::NotFound("no stop given".to_string()))?;
        let date = date
            .filter(|d| !d.is_empty())
            .map(|d| parse_date(&d))
            .transpose()?;

        Ok(Self { stop_id, date })
    }

    /// Parses a query string, with or without the leading `?`.
    pub fn from_query_string(query: &str) -> Result<Self> {
        let query = query.trim_start_matches('?');
        let url = Url::parse(&format!("http://localhost/?{query}"))
            .map_err(|e| ViewerError::NotFound(format!("malformed query: {e}")))?;
        Self::from_pairs(url.query_pairs())
    }

    pub fn to_query_string(&self) -> String {
        let mut pairs = vec![("stop", self.stop_id.clone())];
        if let Some(date) = self.date {
            pairs.push(("date", format_date(date)));
        }
        Url::parse_with_params("http://localhost/", &pairs)
            .ok()
            .and_then(|url| url.query().map(str::to_string))
            .unwrap_or_default()
    }

    pub fn resolved_date(&self, today: NaiveDate) -> NaiveDate {
        self.date.unwrap_or(today)
    }

    /// Same stop, `days` away from the resolved date.
    pub fn shifted(&self, today: NaiveDate, days: i64) -> Self {
        Self {
            stop_id: self.stop_id.clone(),
            date: Some(self.resolved_date(today) + Duration::days(days)),
        }
    }

    pub fn with_date(&self, date: NaiveDate) -> Self {
        Self {
            stop_id: self.stop_id.clone(),
            date: Some(date),
        }
    }
}

pub fn parse_date(s: &str) -> Result<NaiveDate> {
    NaiveDate::parse_from_str(s.trim(), DATE_FORMAT)
        .map_err(|_| ViewerError::InvalidDate(s.to_string()))
}

pub fn format_date(date: NaiveDate) -> String {
    date.format(DATE_FORMAT).to_string()
}

pub fn page_title(stop: &StopRecord, date: NaiveDate) -> String {
    format!("Arrivals - {} - {}", stop.full_name(), format_date(date))
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScheduleRow {
    /// 1-based.
    pub number: usize,
    pub time: String,
    pub route: String,
    pub headsign: String,
    pub upcoming: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScheduleTable {
    pub stop: StopRecord,
    pub date: NaiveDate,
    pub title: String,
    pub rows: Vec<ScheduleRow>,
}

impl ScheduleTable {
    pub fn new(stop: StopRecord, date: NaiveDate, entries: &[ScheduleEntry], now: NaiveDateTime) -> Self {
        let upcoming = next_arrival_index(entries, date, now);
        let rows = entries
            .iter()
            .enumerate()
            .map(|(idx, entry)| ScheduleRow {
                number: idx + 1,
                time: entry.arrival_time.clone(),
                route: entry.route_name(),
                headsign: entry.trip_headsign.clone(),
                upcoming: upcoming == Some(idx),
            })
            .collect();

        Self {
            title: page_title(&stop, date),
            stop,
            date,
            rows,
        }
    }

    pub fn upcoming(&self) -> Option<&ScheduleRow> {
        self.rows.iter().find(|r| r.upcoming)
    }
}

/// Fetches the stop and its arrivals for the query's date.
pub async fn load_schedule<A: TransitApi>(
    api: &A,
    query: &ScheduleQuery,
    now: NaiveDateTime,
) -> Result<ScheduleTable> {
    let date = query.resolved_date(now.date());
    let stop = api.fetch_stop(&query.stop_id).await?;
    let entries = api.fetch_schedule(&query.stop_id, date).await?;
    debug!(
        "Loaded {} arrivals for stop {} on {}",
        entries.len(),
        query.stop_id,
        date
    );
    Ok(ScheduleTable::new(stop, date, &entries, now))
}

/// Tracks the schedule request in flight so a slow response for an older
/// query cannot overwrite a newer one.
#[derive(Debug, Default)]
pub struct ScheduleRequests {
    generation: Generation,
    loading: bool,
}

impl ScheduleRequests {
    pub fn begin(&mut self) -> Generation {
        self.loading = true;
        self.generation.advance()
    }

    /// Returns false when `ticket` has been superseded.
    pub fn finish(&mut self, ticket: Generation) -> bool {
        if ticket != self.generation {
            debug!("Dropping stale schedule response");
            return false;
        }
        self.loading = false;
        true
    }

    /// Controls are disabled while this is true.
    pub fn is_loading(&self) -> bool {
        self.loading
    }
}
