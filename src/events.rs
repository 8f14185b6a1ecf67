use crate::api::{ApiError, EventDetail, EventSearchResult};

/// Events delivered to the dashboard loop from timers and background fetches
#[derive(Debug)]
pub enum AppEvent {
    /// Filter quiet period elapsed; search page 0 with the filters as they are now
    SearchRequested,

    /// A search page came back and was normalized
    SearchLoaded { generation: u64, result: EventSearchResult },

    /// A search request failed
    SearchFailed { generation: u64, error: ApiError },

    /// Detail fetch finished
    DetailLoaded(EventDetail),

    /// Detail fetch failed
    DetailFailed { event_id: String, error: ApiError },
}
