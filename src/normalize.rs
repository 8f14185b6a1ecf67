//! Mapping of raw Discovery API records into the app's event model.
//!
//! Nothing in here fails: every missing or malformed upstream field is
//! defaulted so one odd record never costs the user a whole page.

use chrono::{DateTime, Local, NaiveDate, NaiveDateTime};
use std::fmt::Write as _;

use crate::api::models::{
    EventDetail, EventSearchResult, EventSummary, EventVenue, RawClassification, RawEvent,
    RawImage, RawNamed, RawSearchResponse, RawVenue,
};

pub const DATE_TBD: &str = "TBD";
pub const DEFAULT_DATE_FORMAT: &str = "%b %-d, %Y, %-I:%M %p";
const WIDESCREEN_RATIO: &str = "16_9";

/// Turns raw date strings into display strings.
///
/// The pattern is a chrono strftime pattern standing in for the host's
/// "medium date, short time" style.
#[derive(Debug, Clone)]
pub struct DateFormatter {
    pattern: String,
}

impl Default for DateFormatter {
    fn default() -> Self {
        Self::new(DEFAULT_DATE_FORMAT)
    }
}

impl DateFormatter {
    pub fn new(pattern: impl Into<String>) -> Self {
        Self {
            pattern: pattern.into(),
        }
    }

    /// Display string for a raw date.
    ///
    /// Missing dates read "Date TBD", unparseable ones are echoed unchanged, and
    /// a pattern that fails to render falls back to chrono's default output.
    pub fn format(&self, raw: Option<&str>) -> String {
        let raw = match raw.map(str::trim) {
            Some(raw) if !raw.is_empty() && raw != DATE_TBD => raw,
            _ => return "Date TBD".to_string(),
        };

        let Some(date) = parse_event_date(raw) else {
            return raw.to_string();
        };

        let mut out = String::new();
        match write!(out, "{}", date.format(&self.pattern)) {
            Ok(()) => out,
            Err(_) => {
                tracing::debug!(pattern = %self.pattern, "date pattern failed, using default format");
                date.to_string()
            }
        }
    }
}

/// Parse the ISO-ish shapes upstream produces into local wall-clock time.
fn parse_event_date(raw: &str) -> Option<NaiveDateTime> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Some(dt.with_timezone(&Local).naive_local());
    }
    for pattern in ["%Y-%m-%dT%H:%M:%S", "%Y-%m-%dT%H:%M", "%Y-%m-%d %H:%M:%S"] {
        if let Ok(dt) = NaiveDateTime::parse_from_str(raw, pattern) {
            return Some(dt);
        }
    }
    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
}

/// Absolute timestamp first, then local date + time, then local date alone.
pub fn resolve_date(event: &RawEvent) -> Option<String> {
    let start = event.dates.as_ref()?.start.as_ref()?;
    let non_empty = |value: &Option<String>| {
        value
            .as_deref()
            .map(str::trim)
            .filter(|v| !v.is_empty())
            .map(str::to_string)
    };

    if let Some(date_time) = non_empty(&start.date_time) {
        return Some(date_time);
    }
    match (non_empty(&start.local_date), non_empty(&start.local_time)) {
        (Some(date), Some(time)) => Some(format!("{}T{}", date, time)),
        (Some(date), None) => Some(date),
        _ => None,
    }
}

/// Widest widescreen image, else widest image of any ratio. Ties keep the first.
pub fn select_image(images: Option<&[RawImage]>) -> Option<String> {
    let candidates: Vec<(&RawImage, &str)> = images?
        .iter()
        .filter_map(|img| {
            let url = img.url.as_deref()?.trim();
            (!url.is_empty()).then_some((img, url))
        })
        .collect();

    let widescreen: Vec<(&RawImage, &str)> = candidates
        .iter()
        .copied()
        .filter(|(img, _)| {
            img.ratio
                .as_deref()
                .is_some_and(|ratio| ratio.contains(WIDESCREEN_RATIO))
        })
        .collect();

    let pool = if widescreen.is_empty() {
        &candidates
    } else {
        &widescreen
    };

    let mut best: Option<(&RawImage, &str)> = None;
    for &(img, url) in pool {
        let width = img.width.unwrap_or(0);
        match best {
            Some((current, _)) if current.width.unwrap_or(0) >= width => {}
            _ => best = Some((img, url)),
        }
    }

    best.map(|(_, url)| normalize_image_url(url))
}

fn normalize_image_url(url: &str) -> String {
    if let Some(rest) = url.strip_prefix("http://") {
        format!("https://{}", rest)
    } else if url.starts_with("//") {
        format!("https:{}", url)
    } else {
        url.to_string()
    }
}

/// "Segment / Genre" from the first classification, or whichever half exists.
pub fn derive_category(classifications: Option<&[RawClassification]>) -> Option<String> {
    let first = classifications?.first()?;
    let name = |named: &Option<RawNamed>| {
        named
            .as_ref()
            .and_then(|n| n.name.as_deref())
            .map(str::trim)
            .filter(|n| !n.is_empty())
            .map(str::to_string)
    };

    match (name(&first.segment), name(&first.genre)) {
        (Some(segment), Some(genre)) => Some(format!("{} / {}", segment, genre)),
        (Some(one), None) | (None, Some(one)) => Some(one),
        (None, None) => None,
    }
}

fn parse_coordinate(raw: Option<&str>) -> Option<f64> {
    raw?.trim().parse::<f64>().ok().filter(|v| v.is_finite())
}

pub fn transform_venue(venue: &RawVenue) -> EventVenue {
    let state = venue.state.as_ref().and_then(|s| {
        s.name
            .clone()
            .filter(|n| !n.is_empty())
            .or_else(|| s.state_code.clone())
    });

    let location = venue.location.as_ref();
    let coordinates = match (
        parse_coordinate(location.and_then(|l| l.latitude.as_deref())),
        parse_coordinate(location.and_then(|l| l.longitude.as_deref())),
    ) {
        (Some(lat), Some(lon)) => Some((lat, lon)),
        _ => None,
    };

    EventVenue {
        id: venue.id.clone(),
        name: venue.name.clone(),
        city: venue.city.as_ref().and_then(|c| c.name.clone()),
        state,
        country: venue.country.as_ref().and_then(|c| c.name.clone()),
        address: venue.address.as_ref().and_then(|a| a.line1.clone()),
        latitude: coordinates.map(|(lat, _)| lat),
        longitude: coordinates.map(|(_, lon)| lon),
    }
}

pub fn to_summary(event: &RawEvent, formatter: &DateFormatter) -> EventSummary {
    let date = resolve_date(event);
    let formatted_date = formatter.format(date.as_deref());

    EventSummary {
        id: event.id.clone(),
        name: event.name.clone(),
        date: date.unwrap_or_else(|| DATE_TBD.to_string()),
        formatted_date,
        category: derive_category(event.classifications.as_deref()),
        image_url: select_image(event.images.as_deref()),
        venue: event
            .embedded
            .as_ref()
            .and_then(|e| e.venues.as_ref())
            .and_then(|venues| venues.first())
            .map(transform_venue),
    }
}

pub fn to_detail(event: &RawEvent, formatter: &DateFormatter) -> EventDetail {
    let non_empty = |value: &Option<String>| value.clone().filter(|v| !v.trim().is_empty());

    EventDetail {
        summary: to_summary(event, formatter),
        description: non_empty(&event.description).or_else(|| non_empty(&event.info)),
        additional_info: non_empty(&event.please_note),
        ticket_url: non_empty(&event.url),
        price_ranges: event.price_ranges.clone().unwrap_or_default(),
    }
}

pub fn to_search_result(response: &RawSearchResponse, formatter: &DateFormatter) -> EventSearchResult {
    let events: Vec<EventSummary> = response
        .embedded
        .as_ref()
        .map(|e| e.events.iter().map(|raw| to_summary(raw, formatter)).collect())
        .unwrap_or_default();

    EventSearchResult {
        events,
        page: response.page.number,
        total_pages: response.page.total_pages,
        total_elements: response.page.total_elements,
    }
}
