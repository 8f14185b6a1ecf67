use anyhow::{anyhow, Result};

use crate::api::{ApiClient, ApiError, EventDetail, EventSummary};
use crate::config::Config;
use crate::favorites::FavoritesStore;
use crate::filters::{EventCategory, FiltersState};
use crate::normalize;
use crate::search::SearchRequest;
use crate::storage::{FileStore, KeyValueStore, MemoryStore};

/// Open the persisted favorites, falling back to an in-memory store when
/// the data directory is unusable.
pub fn open_favorites(config: &Config) -> FavoritesStore {
    let path = config.store_path();
    let backend: Box<dyn KeyValueStore> = match FileStore::open(path.clone()) {
        Ok(store) => {
            tracing::debug!(path = %store.path().display(), "favorites store opened");
            Box::new(store)
        }
        Err(e) => {
            tracing::warn!(path = %path.display(), error = %e, "favorites will not be saved");
            Box::new(MemoryStore::new())
        }
    };
    FavoritesStore::load(backend, &config.date_formatter())
}

fn client(config: &Config) -> Result<ApiClient> {
    ApiClient::new(config.api_url.clone(), config.api_key()?.to_string(), config.timeout_secs)
}

fn api_failure(error: ApiError) -> anyhow::Error {
    tracing::debug!(error = ?error, "request failed");
    anyhow!(error.user_message())
}

pub async fn search(config: &Config, keyword: String, city: String, category: EventCategory, page: u32) -> Result<()> {
    let filters = FiltersState {
        keyword,
        city,
        category,
    };

    let Some(request) = SearchRequest::from_filters(&filters, page, config.page_size) else {
        println!("Enter a keyword or a city to search (--keyword, --city).");
        return Ok(());
    };

    let client = client(config)?;
    let favorites = open_favorites(config);
    let response = client.search_events(&request).await.map_err(api_failure)?;
    let result = normalize::to_search_result(&response, &config.date_formatter());

    if result.events.is_empty() {
        println!("🔍 No events found.");
        return Ok(());
    }

    println!(
        "🎫 Events (page {}/{}, {} total):",
        result.page + 1,
        result.total_pages.max(1),
        result.total_elements
    );
    print_event_table(&result.events.iter().collect::<Vec<_>>(), &favorites);

    if result.has_more() {
        println!("More results: --page {}", result.page + 1);
    }

    Ok(())
}

pub async fn show(config: &Config, event_id: &str) -> Result<()> {
    let client = client(config)?;
    let favorites = open_favorites(config);
    let raw = client.get_event(event_id).await.map_err(api_failure)?;
    let detail = normalize::to_detail(&raw, &config.date_formatter());

    print_detail(&detail, favorites.is_favorite(&detail.summary.id));
    Ok(())
}

pub fn list_favorites(config: &Config) -> Result<()> {
    let favorites = open_favorites(config);

    if favorites.is_empty() {
        println!("☆ No favorites yet.");
        return Ok(());
    }

    println!("★ Favorites ({}):", favorites.len());
    print_event_table(&favorites.sorted(), &favorites);
    Ok(())
}

pub async fn favorite(config: &Config, event_id: &str) -> Result<()> {
    let client = client(config)?;
    let mut favorites = open_favorites(config);
    let raw = client.get_event(event_id).await.map_err(api_failure)?;
    let summary = normalize::to_summary(&raw, &config.date_formatter());
    let name = summary.name.clone();

    if favorites.toggle_favorite(summary) {
        println!("★ Added to favorites: {}", name);
    } else {
        println!("☆ Removed from favorites: {}", name);
    }
    Ok(())
}

pub fn unfavorite(config: &Config, event_id: &str) -> Result<()> {
    let mut favorites = open_favorites(config);

    if favorites.remove_favorite(event_id) {
        println!("☆ Removed {} from favorites.", event_id);
    } else {
        println!("{} is not a favorite.", event_id);
    }
    Ok(())
}

fn print_event_table(events: &[&EventSummary], favorites: &FavoritesStore) {
    println!("{}", "─".repeat(110));
    println!(
        "{:<2} {:<24} {:<36} {:<20} {:<26}",
        "", "Date", "Event", "Category", "Venue"
    );
    println!("{}", "─".repeat(110));

    for event in events {
        let star = if favorites.is_favorite(&event.id) { "★" } else { " " };
        println!(
            "{:<2} {:<24} {:<36} {:<20} {:<26}",
            star,
            truncate(&event.formatted_date, 24),
            truncate(&event.name, 36),
            truncate(event.category_display(), 20),
            truncate(&event.venue_display(), 26),
        );
        println!("   \x1b[2mid: {}\x1b[0m", event.id);
    }
    println!("{}", "─".repeat(110));
}

fn print_detail(detail: &EventDetail, is_favorite: bool) {
    let summary = &detail.summary;
    let star = if is_favorite { "★" } else { "☆" };

    println!("{} {}", star, summary.name);
    println!("{}", "─".repeat(60));
    println!("   Date:     {}", summary.formatted_date);
    println!("   Category: {}", summary.category_display());

    match &summary.venue {
        Some(venue) => {
            println!("   Venue:    {}", venue.name.as_deref().unwrap_or("TBD"));
            if let Some(address) = &venue.address {
                println!("   Address:  {}", address);
            }
            println!("   Location: {}", venue.location_display());
            match venue.coordinates() {
                Some((lat, lon)) => println!("   Map:      {:.5}, {:.5}", lat, lon),
                None => println!("   Map:      unavailable"),
            }
        }
        None => println!("   Venue:    TBD"),
    }

    println!();
    if detail.price_ranges.is_empty() {
        println!("   Prices TBD");
    } else {
        for range in &detail.price_ranges {
            println!("   💵 {}", range.display());
        }
    }
    if let Some(url) = &detail.ticket_url {
        println!("   Tickets: {}", url);
    }

    if let Some(description) = &detail.description {
        println!();
        println!("{}", description);
    }
    if let Some(info) = &detail.additional_info {
        println!();
        println!("⚠️  Please note: {}", info);
    }
    if let Some(image) = &summary.image_url {
        println!();
        println!("   Image: {}", image);
    }
}

/// Cut `text` to at most `width` characters, marking the cut with an ellipsis.
fn truncate(text: &str, width: usize) -> String {
    if text.chars().count() <= width {
        return text.to_string();
    }
    let kept: String = text.chars().take(width.saturating_sub(1)).collect();
    format!("{}…", kept)
}
