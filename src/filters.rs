use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Category filter shown to the user. `All` means "no classification filter".
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum EventCategory {
    #[default]
    #[serde(rename = "all")]
    All,
    #[serde(rename = "music")]
    Music,
    #[serde(rename = "sports")]
    Sports,
    #[serde(rename = "arts & theatre")]
    ArtsAndTheatre,
    #[serde(rename = "film")]
    Film,
    #[serde(rename = "miscellaneous")]
    Miscellaneous,
}

impl EventCategory {
    pub const ALL: [EventCategory; 6] = [
        EventCategory::All,
        EventCategory::Music,
        EventCategory::Sports,
        EventCategory::ArtsAndTheatre,
        EventCategory::Film,
        EventCategory::Miscellaneous,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            EventCategory::All => "all",
            EventCategory::Music => "music",
            EventCategory::Sports => "sports",
            EventCategory::ArtsAndTheatre => "arts & theatre",
            EventCategory::Film => "film",
            EventCategory::Miscellaneous => "miscellaneous",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            EventCategory::All => "All",
            EventCategory::Music => "Music",
            EventCategory::Sports => "Sports",
            EventCategory::ArtsAndTheatre => "Arts & Theatre",
            EventCategory::Film => "Film",
            EventCategory::Miscellaneous => "Misc",
        }
    }

    /// Upstream `classificationName` for this category
    pub fn classification_name(&self) -> Option<&'static str> {
        match self {
            EventCategory::All => None,
            EventCategory::Music => Some("Music"),
            EventCategory::Sports => Some("Sports"),
            EventCategory::ArtsAndTheatre => Some("Arts & Theatre"),
            EventCategory::Film => Some("Film"),
            EventCategory::Miscellaneous => Some("Miscellaneous"),
        }
    }

    pub fn next(&self) -> Self {
        let index = Self::ALL.iter().position(|c| c == self).unwrap_or(0);
        Self::ALL[(index + 1) % Self::ALL.len()]
    }
}

impl fmt::Display for EventCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for EventCategory {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim().to_lowercase();
        match wanted.as_str() {
            "" | "all" => return Ok(EventCategory::All),
            "misc" => return Ok(EventCategory::Miscellaneous),
            "arts" | "theatre" | "arts-theatre" => return Ok(EventCategory::ArtsAndTheatre),
            _ => {}
        }
        Self::ALL
            .iter()
            .find(|c| c.as_str() == wanted || c.label().to_lowercase() == wanted)
            .copied()
            .ok_or_else(|| {
                let options: Vec<&str> = Self::ALL.iter().map(|c| c.as_str()).collect();
                format!("unknown category '{}' (expected one of: {})", s, options.join(", "))
            })
    }
}

/// Current search criteria. Pure in-memory state.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FiltersState {
    pub keyword: String,
    pub city: String,
    pub category: EventCategory,
}

/// Partial update merged into [`FiltersState`]; `None` fields are left alone.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FiltersUpdate {
    pub keyword: Option<String>,
    pub city: Option<String>,
    pub category: Option<EventCategory>,
}

impl FiltersState {
    pub fn update_filters(&mut self, update: FiltersUpdate) {
        if let Some(keyword) = update.keyword {
            self.keyword = keyword;
        }
        if let Some(city) = update.city {
            self.city = city;
        }
        if let Some(category) = update.category {
            self.category = category;
        }
    }

    pub fn reset_filters(&mut self) {
        *self = Self::default();
    }

    /// A search needs a keyword or a city once whitespace is trimmed
    pub fn is_searchable(&self) -> bool {
        !self.keyword.trim().is_empty() || !self.city.trim().is_empty()
    }
}
