use serde::{Deserialize, Serialize};

/// Raw event record as returned by the Discovery API.
///
/// Everything except `id` and `name` is optional upstream, and even those are
/// defaulted so a sparse record still deserializes.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawEvent {
    #[serde(default)]
    pub id: String,
    #[serde(default)]
    pub name: String,
    pub url: Option<String>,
    pub info: Option<String>,
    pub description: Option<String>,
    pub please_note: Option<String>,
    pub images: Option<Vec<RawImage>>,
    pub price_ranges: Option<Vec<PriceRange>>,
    pub classifications: Option<Vec<RawClassification>>,
    pub dates: Option<RawDates>,
    #[serde(rename = "_embedded")]
    pub embedded: Option<RawEventEmbedded>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RawImage {
    pub url: Option<String>,
    pub width: Option<u32>,
    pub height: Option<u32>,
    pub ratio: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RawNamed {
    pub name: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RawClassification {
    pub segment: Option<RawNamed>,
    pub genre: Option<RawNamed>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RawDates {
    pub start: Option<RawStart>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawStart {
    pub date_time: Option<String>,
    pub local_date: Option<String>,
    pub local_time: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RawEventEmbedded {
    pub venues: Option<Vec<RawVenue>>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawState {
    pub name: Option<String>,
    pub state_code: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RawAddress {
    pub line1: Option<String>,
}

/// Coordinates arrive as strings upstream.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RawLocation {
    pub latitude: Option<String>,
    pub longitude: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RawVenue {
    pub id: Option<String>,
    pub name: Option<String>,
    pub city: Option<RawNamed>,
    pub state: Option<RawState>,
    pub country: Option<RawNamed>,
    pub address: Option<RawAddress>,
    pub location: Option<RawLocation>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawPage {
    #[serde(default)]
    pub size: u32,
    #[serde(default)]
    pub total_elements: u64,
    #[serde(default)]
    pub total_pages: u32,
    #[serde(default)]
    pub number: u32,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RawSearchEmbedded {
    #[serde(default)]
    pub events: Vec<RawEvent>,
}

/// Body of `GET /events.json`. A missing `_embedded` block means an empty page.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RawSearchResponse {
    #[serde(rename = "_embedded")]
    pub embedded: Option<RawSearchEmbedded>,
    #[serde(default)]
    pub page: RawPage,
}

/// Ticket price band. Any missing bound renders as "TBD", never as zero.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PriceRange {
    #[serde(rename = "type", skip_serializing_if = "Option::is_none")]
    pub kind: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub currency: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub min: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max: Option<f64>,
}

impl PriceRange {
    /// Format as e.g. `$25.00 - $80.00 USD (standard)`
    pub fn display(&self) -> String {
        let bound = |value: Option<f64>| match value {
            Some(v) => format!("${:.2}", v),
            None => "TBD".to_string(),
        };

        let mut text = match (self.min, self.max) {
            (Some(min), Some(max)) if (min - max).abs() < f64::EPSILON => bound(Some(min)),
            (min, max) => format!("{} - {}", bound(min), bound(max)),
        };

        if let Some(currency) = &self.currency {
            text.push(' ');
            text.push_str(currency);
        }
        if let Some(kind) = &self.kind {
            text.push_str(&format!(" ({})", kind));
        }
        text
    }
}

/// Normalized venue. `latitude` and `longitude` are either both set or both absent.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EventVenue {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub city: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub state: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub country: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub address: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub latitude: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub longitude: Option<f64>,
}

impl EventVenue {
    pub fn coordinates(&self) -> Option<(f64, f64)> {
        match (self.latitude, self.longitude) {
            (Some(lat), Some(lon)) => Some((lat, lon)),
            _ => None,
        }
    }

    /// "City, State, Country" with missing parts skipped
    pub fn location_display(&self) -> String {
        let parts: Vec<&str> = [&self.city, &self.state, &self.country]
            .into_iter()
            .filter_map(|part| part.as_deref())
            .filter(|part| !part.is_empty())
            .collect();

        if parts.is_empty() {
            "Location TBD".to_string()
        } else {
            parts.join(", ")
        }
    }
}

/// List-level view of an event. This is also what the favorites store keeps.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EventSummary {
    pub id: String,
    pub name: String,
    pub date: String,
    #[serde(default)]
    pub formatted_date: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub image_url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub venue: Option<EventVenue>,
}

impl EventSummary {
    pub fn venue_display(&self) -> String {
        match &self.venue {
            Some(venue) => {
                let name = venue.name.as_deref().unwrap_or("Venue TBD");
                format!("{} · {}", name, venue.location_display())
            }
            None => "Venue TBD".to_string(),
        }
    }

    pub fn category_display(&self) -> &str {
        self.category.as_deref().unwrap_or("-")
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct EventDetail {
    pub summary: EventSummary,
    pub description: Option<String>,
    pub additional_info: Option<String>,
    pub ticket_url: Option<String>,
    pub price_ranges: Vec<PriceRange>,
}

impl From<EventDetail> for EventSummary {
    fn from(detail: EventDetail) -> Self {
        detail.summary
    }
}

impl From<EventSummary> for EventDetail {
    fn from(summary: EventSummary) -> Self {
        Self {
            summary,
            ..Self::default()
        }
    }
}

/// One normalized page of search results. `page` is 0-based.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct EventSearchResult {
    pub events: Vec<EventSummary>,
    pub page: u32,
    pub total_pages: u32,
    pub total_elements: u64,
}

impl EventSearchResult {
    pub fn has_more(&self) -> bool {
        self.page.saturating_add(1) < self.total_pages
    }
}
