pub mod details;
pub mod message;
pub mod results;

pub use details::DetailView;
pub use message::{centered_rect, render_state_message};
pub use results::EventsView;
