use anyhow::Result;
use crossterm::event::{self, Event, KeyCode, KeyEventKind};
use rand::seq::SliceRandom;
use ratatui::{
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Clear, Paragraph, Tabs, Wrap},
    Frame,
};
use std::time::Duration;
use tokio::sync::mpsc;

use crate::api::{ApiClient, EventDetail, EventSummary};
use crate::debounce::{Debouncer, SEARCH_QUIET_PERIOD};
use crate::events::AppEvent;
use crate::favorites::FavoritesStore;
use crate::filters::{FiltersState, FiltersUpdate};
use crate::normalize::{self, DateFormatter};
use crate::search::{SearchEngine, SearchRequest};
use crate::ui::{centered_rect, render_state_message, DetailView, EventsView};

const SEED_CITIES: [&str; 10] = [
    "New York",
    "Los Angeles",
    "Chicago",
    "San Francisco",
    "Austin",
    "London",
    "Paris",
    "Berlin",
    "Tokyo",
    "Sydney",
];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Tab {
    Explore,
    Favorites,
    Details,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FilterField {
    Keyword,
    City,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputMode {
    Normal,
    Editing(FilterField),
}

pub struct App {
    api_client: ApiClient,
    formatter: DateFormatter,
    filters: FiltersState,
    engine: SearchEngine,
    favorites: FavoritesStore,
    debouncer: Debouncer,
    event_tx: mpsc::UnboundedSender<AppEvent>,
    event_rx: mpsc::UnboundedReceiver<AppEvent>,
    results_view: EventsView,
    favorites_view: EventsView,
    detail_view: DetailView,
    detail: Option<EventDetail>,
    detail_loading: bool,
    detail_error: Option<String>,
    tab: Tab,
    return_tab: Tab,
    input_mode: InputMode,
    seeded_city: bool,
    should_quit: bool,
    show_help: bool,
    help_scroll: u16,
}

impl App {
    pub fn new(
        api_client: ApiClient,
        formatter: DateFormatter,
        favorites: FavoritesStore,
        page_size: u32,
    ) -> Self {
        let (event_tx, event_rx) = mpsc::unbounded_channel::<AppEvent>();

        Self {
            api_client,
            formatter,
            filters: FiltersState::default(),
            engine: SearchEngine::new(page_size),
            favorites,
            debouncer: Debouncer::new(SEARCH_QUIET_PERIOD),
            event_tx,
            event_rx,
            results_view: EventsView::new(),
            favorites_view: EventsView::new(),
            detail_view: DetailView::new(),
            detail: None,
            detail_loading: false,
            detail_error: None,
            tab: Tab::Explore,
            return_tab: Tab::Explore,
            input_mode: InputMode::Normal,
            seeded_city: false,
            should_quit: false,
            show_help: false,
            help_scroll: 0,
        }
    }

    pub async fn run(&mut self, terminal: &mut ratatui::Terminal<impl ratatui::backend::Backend>) -> Result<()> {
        self.seed_initial_city();

        loop {
            terminal.draw(|frame| self.render(frame))?;

            // Drain timer and fetch results (non-blocking)
            while let Ok(event) = self.event_rx.try_recv() {
                self.handle_event(event);
            }

            // Handle keyboard events with short timeout
            let timeout = Duration::from_millis(50);
            if event::poll(timeout)? {
                if let Event::Key(key) = event::read()? {
                    if key.kind == KeyEventKind::Press {
                        self.handle_key(key.code);
                    }
                }
            }

            if self.should_quit {
                break;
            }
        }

        self.debouncer.cancel();
        Ok(())
    }

    /// Pick a random city so a fresh start shows something.
    fn seed_initial_city(&mut self) {
        if self.seeded_city || self.filters.is_searchable() || self.engine.has_searched() {
            return;
        }
        self.seeded_city = true;

        if let Some(city) = SEED_CITIES.choose(&mut rand::thread_rng()) {
            tracing::info!(city = *city, "seeding initial search city");
            self.update_filters(FiltersUpdate {
                city: Some(city.to_string()),
                ..FiltersUpdate::default()
            });
        }
    }

    fn update_filters(&mut self, update: FiltersUpdate) {
        self.filters.update_filters(update);
        if self.filters.is_searchable() {
            self.schedule_search();
        } else {
            self.debouncer.cancel();
        }
    }

    /// (Re)start the quiet period; page 0 is searched when it elapses.
    fn schedule_search(&mut self) {
        let tx = self.event_tx.clone();
        self.debouncer.trigger(move || {
            tx.send(AppEvent::SearchRequested).ok();
        });
    }

    fn search_now(&mut self) {
        self.debouncer.cancel();
        if let Some(request) = self.engine.search(&self.filters, 0) {
            self.spawn_search(request);
        }
    }

    fn load_more(&mut self) {
        if let Some(request) = self.engine.load_more(&self.filters) {
            self.spawn_search(request);
        }
    }

    fn spawn_search(&self, request: SearchRequest) {
        let client = self.api_client.clone();
        let formatter = self.formatter.clone();
        let tx = self.event_tx.clone();

        tokio::spawn(async move {
            let generation = request.generation;
            let event = match client.search_events(&request).await {
                Ok(response) => AppEvent::SearchLoaded {
                    generation,
                    result: normalize::to_search_result(&response, &formatter),
                },
                Err(error) => AppEvent::SearchFailed { generation, error },
            };
            tx.send(event).ok();
        });
    }

    fn open_details(&mut self, summary: EventSummary) {
        let event_id = summary.id.clone();
        self.detail = Some(summary.into());
        self.detail_loading = true;
        self.detail_error = None;
        self.detail_view.scroll = 0;
        if self.tab != Tab::Details {
            self.return_tab = self.tab;
        }
        self.tab = Tab::Details;

        let client = self.api_client.clone();
        let formatter = self.formatter.clone();
        let tx = self.event_tx.clone();

        tokio::spawn(async move {
            let event = match client.get_event(&event_id).await {
                Ok(raw) => AppEvent::DetailLoaded(normalize::to_detail(&raw, &formatter)),
                Err(error) => AppEvent::DetailFailed { event_id, error },
            };
            tx.send(event).ok();
        });
    }

    fn handle_event(&mut self, event: AppEvent) {
        match event {
            AppEvent::SearchRequested => {
                self.search_now();
            }
            AppEvent::SearchLoaded { generation, result } => {
                let first_page = result.page == 0 && generation == self.engine.generation();
                self.engine.apply_result(generation, result);
                if first_page {
                    self.results_view.reset();
                }
                self.results_view.clamp(self.engine.results().len());
            }
            AppEvent::SearchFailed { generation, error } => {
                self.engine.apply_error(generation, &error);
            }
            AppEvent::DetailLoaded(detail) => {
                if self.detail.as_ref().map(|d| d.summary.id.as_str()) == Some(detail.summary.id.as_str()) {
                    self.detail = Some(detail);
                    self.detail_loading = false;
                }
            }
            AppEvent::DetailFailed { event_id, error } => {
                tracing::warn!(event_id = %event_id, error = %error, "detail fetch failed");
                if self.detail.as_ref().map(|d| d.summary.id.as_str()) == Some(event_id.as_str()) {
                    self.detail_loading = false;
                    self.detail_error = Some(error.user_message());
                }
            }
        }
    }

    fn handle_key(&mut self, key: KeyCode) {
        if let InputMode::Editing(field) = self.input_mode {
            self.handle_editing_key(field, key);
            return;
        }

        if self.show_help {
            match key {
                KeyCode::Up => self.help_scroll = self.help_scroll.saturating_sub(1),
                KeyCode::Down => self.help_scroll = self.help_scroll.saturating_add(1),
                KeyCode::Char('q') | KeyCode::Char('Q') => self.should_quit = true,
                _ => {
                    self.show_help = false;
                    self.help_scroll = 0;
                }
            }
            return;
        }

        match key {
            KeyCode::Char('q') | KeyCode::Char('Q') => {
                self.should_quit = true;
            }
            KeyCode::Char('h') | KeyCode::Char('H') | KeyCode::Char('?') => {
                self.show_help = true;
                self.help_scroll = 0;
            }
            KeyCode::Char('/') => {
                self.tab = Tab::Explore;
                self.input_mode = InputMode::Editing(FilterField::Keyword);
            }
            KeyCode::Char('l') => {
                self.tab = Tab::Explore;
                self.input_mode = InputMode::Editing(FilterField::City);
            }
            KeyCode::Char('c') => {
                let category = self.filters.category.next();
                self.update_filters(FiltersUpdate {
                    category: Some(category),
                    ..FiltersUpdate::default()
                });
            }
            KeyCode::Char('r') | KeyCode::Char('R') => {
                self.search_now();
            }
            KeyCode::Char('m') => {
                self.load_more();
            }
            KeyCode::Char('x') => {
                self.debouncer.cancel();
                self.engine.reset(&mut self.filters);
                self.results_view.reset();
            }
            KeyCode::Char('f') => {
                self.toggle_selected_favorite();
            }
            KeyCode::Char('d') if self.tab == Tab::Favorites => {
                let selected = self.selected_favorite().map(|e| e.id.clone());
                if let Some(id) = selected {
                    self.favorites.remove_favorite(&id);
                    self.favorites_view.clamp(self.favorites.len());
                }
            }
            KeyCode::Tab => {
                self.tab = match self.tab {
                    Tab::Explore => Tab::Favorites,
                    Tab::Favorites | Tab::Details => Tab::Explore,
                };
                self.favorites_view.clamp(self.favorites.len());
            }
            KeyCode::Esc => {
                if self.tab == Tab::Details {
                    self.tab = self.return_tab;
                }
            }
            KeyCode::Enter => {
                let selected = match self.tab {
                    Tab::Explore => self.selected_result().cloned(),
                    Tab::Favorites => self.selected_favorite().cloned(),
                    Tab::Details => None,
                };
                if let Some(summary) = selected {
                    self.open_details(summary);
                }
            }
            KeyCode::Up => match self.tab {
                Tab::Explore => self.results_view.select_previous(self.engine.results().len()),
                Tab::Favorites => self.favorites_view.select_previous(self.favorites.len()),
                Tab::Details => self.detail_view.scroll = self.detail_view.scroll.saturating_sub(1),
            },
            KeyCode::Down => match self.tab {
                Tab::Explore => {
                    let len = self.engine.results().len();
                    self.results_view.select_next(len);
                    // end of list reached
                    if len > 0 && self.results_view.selected() == Some(len - 1) {
                        self.load_more();
                    }
                }
                Tab::Favorites => self.favorites_view.select_next(self.favorites.len()),
                Tab::Details => self.detail_view.scroll = self.detail_view.scroll.saturating_add(1),
            },
            _ => {}
        }
    }

    fn handle_editing_key(&mut self, field: FilterField, key: KeyCode) {
        let current = match field {
            FilterField::Keyword => self.filters.keyword.clone(),
            FilterField::City => self.filters.city.clone(),
        };

        let edited = match key {
            KeyCode::Char(c) => {
                let mut text = current;
                text.push(c);
                text
            }
            KeyCode::Backspace => {
                let mut text = current;
                text.pop();
                text
            }
            KeyCode::Tab => {
                self.input_mode = InputMode::Editing(match field {
                    FilterField::Keyword => FilterField::City,
                    FilterField::City => FilterField::Keyword,
                });
                return;
            }
            KeyCode::Enter => {
                self.input_mode = InputMode::Normal;
                self.search_now();
                return;
            }
            KeyCode::Esc => {
                self.input_mode = InputMode::Normal;
                return;
            }
            _ => return,
        };

        let update = match field {
            FilterField::Keyword => FiltersUpdate {
                keyword: Some(edited),
                ..FiltersUpdate::default()
            },
            FilterField::City => FiltersUpdate {
                city: Some(edited),
                ..FiltersUpdate::default()
            },
        };
        self.update_filters(update);
    }

    fn toggle_selected_favorite(&mut self) {
        let target: Option<EventSummary> = match self.tab {
            Tab::Explore => self.selected_result().cloned(),
            Tab::Favorites => self.selected_favorite().cloned(),
            Tab::Details => self.detail.clone().map(EventSummary::from),
        };

        if let Some(event) = target {
            self.favorites.toggle_favorite(event);
            self.favorites_view.clamp(self.favorites.len());
        }
    }

    fn selected_result(&self) -> Option<&EventSummary> {
        self.results_view
            .selected()
            .and_then(|i| self.engine.results().get(i))
    }

    fn selected_favorite(&self) -> Option<&EventSummary> {
        let index = self.favorites_view.selected()?;
        self.favorites.sorted().get(index).copied()
    }

    fn render(&mut self, frame: &mut Frame) {
        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .constraints([
                Constraint::Length(3), // Tabs + status
                Constraint::Length(3), // Filters
                Constraint::Min(0),    // Main content
                Constraint::Length(3), // Footer
            ])
            .split(frame.size());

        self.render_status_bar(frame, chunks[0]);
        self.render_filters(frame, chunks[1]);

        match self.tab {
            Tab::Explore => self.render_explore(frame, chunks[2]),
            Tab::Favorites => self.render_favorites(frame, chunks[2]),
            Tab::Details => match &self.detail {
                Some(detail) => self.detail_view.render(
                    frame,
                    chunks[2],
                    detail,
                    self.favorites.is_favorite(&detail.summary.id),
                    self.detail_loading,
                    self.detail_error.as_deref(),
                ),
                None => render_state_message(frame, chunks[2], "No event selected", "Pick an event and press Enter.", Color::Gray),
            },
        }

        self.render_footer(frame, chunks[3]);

        if self.show_help {
            self.render_help(frame);
        }
    }

    fn render_status_bar(&self, frame: &mut Frame, area: Rect) {
        let chunks = Layout::default()
            .direction(Direction::Horizontal)
            .constraints([Constraint::Percentage(50), Constraint::Percentage(50)])
            .split(area);

        let selected = match self.tab {
            Tab::Explore => 0,
            Tab::Favorites => 1,
            Tab::Details => 2,
        };
        let tabs = Tabs::new(vec![
            "Explore".to_string(),
            format!("Favorites ({})", self.favorites.len()),
            "Details".to_string(),
        ])
        .select(selected)
        .block(Block::default().borders(Borders::ALL).title(" EVENT EXPLORER "))
        .highlight_style(Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD));
        frame.render_widget(tabs, chunks[0]);

        let activity = if self.engine.is_refreshing() {
            Span::styled("⟳ Refreshing", Style::default().fg(Color::Yellow))
        } else if self.engine.is_fetching() {
            Span::styled("● Loading", Style::default().fg(Color::Yellow))
        } else if self.debouncer.is_pending() {
            Span::styled("… Typing", Style::default().fg(Color::DarkGray))
        } else {
            Span::styled("● Idle", Style::default().fg(Color::Green))
        };

        let pages = if self.engine.has_searched() && self.engine.total_pages() > 0 {
            format!(
                "Page {}/{}  │  {} events",
                self.engine.current_page() + 1,
                self.engine.total_pages(),
                self.engine.total_elements()
            )
        } else {
            "Page --".to_string()
        };

        let line = Line::from(vec![activity, Span::raw("  │  "), Span::raw(pages)]);
        let paragraph = Paragraph::new(line).block(Block::default().borders(Borders::ALL));
        frame.render_widget(paragraph, chunks[1]);
    }

    fn render_filters(&self, frame: &mut Frame, area: Rect) {
        let field = |label: &str, value: &str, active: bool| {
            let style = if active {
                Style::default().fg(Color::Black).bg(Color::Cyan)
            } else {
                Style::default().fg(Color::White)
            };
            let shown = if active {
                format!("{}▏", value)
            } else if value.is_empty() {
                "-".to_string()
            } else {
                value.to_string()
            };
            vec![
                Span::styled(format!("{}: ", label), Style::default().fg(Color::Gray)),
                Span::styled(shown, style),
                Span::raw("   "),
            ]
        };

        let mut spans = Vec::new();
        spans.extend(field(
            "Keyword",
            &self.filters.keyword,
            self.input_mode == InputMode::Editing(FilterField::Keyword),
        ));
        spans.extend(field(
            "City",
            &self.filters.city,
            self.input_mode == InputMode::Editing(FilterField::City),
        ));
        spans.push(Span::styled("Category: ", Style::default().fg(Color::Gray)));
        spans.push(Span::styled(
            self.filters.category.label(),
            Style::default().fg(Color::Magenta),
        ));

        let paragraph = Paragraph::new(Line::from(spans))
            .block(Block::default().borders(Borders::ALL).title(" Search "));
        frame.render_widget(paragraph, area);
    }

    fn render_explore(&mut self, frame: &mut Frame, area: Rect) {
        let results = self.engine.results();

        if results.is_empty() {
            let (title, body, color) = if self.engine.is_initial_loading() {
                ("Searching…", "Looking for events".to_string(), Color::Yellow)
            } else if let Some(error) = self.engine.error_message() {
                ("Something went wrong", error.to_string(), Color::Red)
            } else if !self.engine.has_searched() {
                (
                    "Find something to do",
                    "Press / to enter a keyword or l to enter a city".to_string(),
                    Color::Cyan,
                )
            } else {
                (
                    "No events found",
                    "Try a different keyword, city or category".to_string(),
                    Color::Gray,
                )
            };
            render_state_message(frame, area, title, &body, color);
            return;
        }

        let rows: Vec<&EventSummary> = results.iter().collect();
        let title = if self.engine.is_loading_more() {
            format!(" RESULTS ({}) · loading more… ", rows.len())
        } else if self.engine.has_more_results() {
            format!(" RESULTS ({}) · ↓ for more ", rows.len())
        } else {
            format!(" RESULTS ({}) ", rows.len())
        };
        self.results_view
            .render(frame, area, &rows, &self.favorites, &title);
    }

    fn render_favorites(&mut self, frame: &mut Frame, area: Rect) {
        if self.favorites.is_empty() {
            render_state_message(
                frame,
                area,
                "No favorites yet",
                "Press f on any event to save it here",
                Color::Gray,
            );
            return;
        }

        let rows = self.favorites.sorted();
        let title = format!(" FAVORITES ({}) ", rows.len());
        self.favorites_view
            .render(frame, area, &rows, &self.favorites, &title);
    }

    fn render_footer(&self, frame: &mut Frame, area: Rect) {
        let key = |k: &str| Span::styled(k.to_string(), Style::default().fg(Color::Yellow));

        let footer_text = if let Some(error) = self.engine.error_message().filter(|_| !self.engine.results().is_empty()) {
            Line::from(vec![
                Span::styled("ERROR: ", Style::default().fg(Color::Red).add_modifier(Modifier::BOLD)),
                Span::styled(error.to_string(), Style::default().fg(Color::Red)),
                Span::raw("  "),
                key("[r] "),
                Span::raw("Retry"),
            ])
        } else if let InputMode::Editing(_) = self.input_mode {
            Line::from(vec![
                key("[Enter] "),
                Span::raw("Search now  "),
                key("[Tab] "),
                Span::raw("Switch field  "),
                key("[Esc] "),
                Span::raw("Done"),
            ])
        } else {
            Line::from(vec![
                key("[/] "),
                Span::raw("Keyword  "),
                key("[l] "),
                Span::raw("City  "),
                key("[c] "),
                Span::raw("Category  "),
                key("[f] "),
                Span::raw("Favorite  "),
                key("[Tab] "),
                Span::raw("Favorites  "),
                key("[h/?] "),
                Span::raw("Help  "),
                key("[q] "),
                Span::raw("Quit"),
            ])
        };

        let paragraph = Paragraph::new(footer_text).block(Block::default().borders(Borders::ALL));
        frame.render_widget(paragraph, area);
    }

    fn render_help(&self, frame: &mut Frame) {
        // Centered popup area (70% width, 80% height)
        let popup_area = centered_rect(70, 80, frame.size());

        frame.render_widget(Clear, popup_area);

        let heading = |text: &str| {
            Line::from(Span::styled(
                text.to_string(),
                Style::default().fg(Color::Yellow).add_modifier(Modifier::BOLD),
            ))
        };
        let binding = |keys: &str, what: &str| {
            Line::from(vec![
                Span::styled(format!("  {:<8}", keys), Style::default().fg(Color::Cyan)),
                Span::raw(what.to_string()),
            ])
        };

        let help_text = vec![
            heading("SEARCH"),
            binding("/", "Edit keyword (artist, team, genre)"),
            binding("l", "Edit city"),
            binding("c", "Cycle category"),
            binding("Enter", "Search immediately while editing"),
            binding("r", "Refresh from the first page"),
            binding("m / ↓", "Load the next page"),
            binding("x", "Reset filters and results"),
            Line::from(""),
            heading("EVENTS"),
            binding("↑ ↓", "Move selection"),
            binding("Enter", "Open event details"),
            binding("f", "Toggle favorite"),
            binding("d", "Remove favorite (Favorites tab)"),
            binding("Tab", "Switch Explore / Favorites"),
            binding("Esc", "Back from details"),
            Line::from(""),
            heading("GENERAL"),
            binding("h / ?", "Toggle this help"),
            binding("q", "Quit"),
            Line::from(""),
            Line::from("  Searches run 400ms after you stop typing. Favorites are saved"),
            Line::from("  locally as soon as they change."),
        ];

        let paragraph = Paragraph::new(help_text)
            .block(
                Block::default()
                    .borders(Borders::ALL)
                    .border_style(Style::default().fg(Color::Cyan))
                    .title(" HELP (any key to close) ")
                    .title_style(Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD)),
            )
            .wrap(Wrap { trim: false })
            .scroll((self.help_scroll, 0));

        frame.render_widget(paragraph, popup_area);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::EventSearchResult;
    use crate::storage::MemoryStore;

    fn app() -> App {
        // Port 9 (discard) is never served; spawned fetches fail quietly.
        let client = ApiClient::new("http://127.0.0.1:9".to_string(), "test-key".to_string(), 1).unwrap();
        let formatter = DateFormatter::default();
        let favorites = FavoritesStore::load(Box::new(MemoryStore::new()), &formatter);
        App::new(client, formatter, favorites, 20)
    }

    fn summary(id: &str) -> EventSummary {
        EventSummary {
            id: id.to_string(),
            name: format!("Event {}", id),
            date: "TBD".to_string(),
            formatted_date: "Date TBD".to_string(),
            ..EventSummary::default()
        }
    }

    fn type_text(app: &mut App, text: &str) {
        for c in text.chars() {
            app.handle_key(KeyCode::Char(c));
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_typing_schedules_debounced_search() {
        let mut app = app();
        app.handle_key(KeyCode::Char('/'));
        type_text(&mut app, "jazz");

        assert_eq!(app.filters.keyword, "jazz");
        assert!(app.debouncer.is_pending());
        assert!(!app.engine.has_searched());

        tokio::time::sleep(SEARCH_QUIET_PERIOD + Duration::from_millis(10)).await;
        let event = app.event_rx.try_recv().unwrap();
        assert!(matches!(event, AppEvent::SearchRequested));
        assert!(app.event_rx.try_recv().is_err());

        app.handle_event(event);
        assert!(app.engine.has_searched());
        assert!(app.engine.is_fetching());
    }

    #[tokio::test(start_paused = true)]
    async fn test_enter_searches_immediately_and_cancels_debounce() {
        let mut app = app();
        app.handle_key(KeyCode::Char('l'));
        type_text(&mut app, "Austin");
        app.handle_key(KeyCode::Enter);

        assert_eq!(app.input_mode, InputMode::Normal);
        assert!(app.engine.is_fetching());
        assert!(!app.debouncer.is_pending());
    }

    #[tokio::test]
    async fn test_clearing_filters_cancels_pending_search() {
        let mut app = app();
        app.handle_key(KeyCode::Char('/'));
        type_text(&mut app, "a");
        assert!(app.debouncer.is_pending());
        app.handle_key(KeyCode::Backspace);
        assert!(!app.debouncer.is_pending());
    }

    #[tokio::test]
    async fn test_loaded_pages_fill_results_and_favorite_toggle() {
        let mut app = app();
        app.filters.keyword = "jazz".to_string();
        app.search_now();
        app.handle_event(AppEvent::SearchLoaded {
            generation: app.engine.generation(),
            result: EventSearchResult {
                events: vec![summary("a"), summary("b")],
                page: 0,
                total_pages: 1,
                total_elements: 2,
            },
        });

        assert_eq!(app.engine.results().len(), 2);
        assert_eq!(app.results_view.selected(), Some(0));

        app.handle_key(KeyCode::Char('f'));
        assert!(app.favorites.is_favorite("a"));

        app.handle_key(KeyCode::Tab);
        assert_eq!(app.tab, Tab::Favorites);
        app.handle_key(KeyCode::Char('d'));
        assert!(app.favorites.is_empty());
    }

    #[tokio::test]
    async fn test_page_from_superseded_search_is_dropped() {
        let mut app = app();
        let page = |number: u32, ids: &[&str]| EventSearchResult {
            events: ids.iter().map(|id| summary(id)).collect(),
            page: number,
            total_pages: 5,
            total_elements: 100,
        };

        app.filters.keyword = "jazz".to_string();
        app.search_now();
        let jazz = app.engine.generation();
        app.handle_event(AppEvent::SearchLoaded { generation: jazz, result: page(0, &["jazz0"]) });
        app.handle_key(KeyCode::Char('m'));
        assert!(app.engine.is_loading_more());

        app.filters.keyword = "rock".to_string();
        app.search_now();
        let rock = app.engine.generation();
        app.handle_event(AppEvent::SearchLoaded { generation: rock, result: page(0, &["rock0"]) });
        app.handle_event(AppEvent::SearchLoaded { generation: jazz, result: page(1, &["jazz1"]) });

        let ids: Vec<&str> = app.engine.results().iter().map(|e| e.id.as_str()).collect();
        assert_eq!(ids, vec!["rock0"]);
        assert_eq!(app.engine.current_page(), 0);
    }

    #[tokio::test]
    async fn test_stale_detail_is_ignored() {
        let mut app = app();
        app.open_details(summary("current"));
        assert_eq!(app.tab, Tab::Details);

        let mut other = EventDetail::from(summary("other"));
        other.description = Some("not this one".to_string());
        app.handle_event(AppEvent::DetailLoaded(other));
        assert!(app.detail_loading);

        let mut fresh = EventDetail::from(summary("current"));
        fresh.description = Some("Doors open at 7pm".to_string());
        app.handle_event(AppEvent::DetailLoaded(fresh));
        assert!(!app.detail_loading);
        assert_eq!(
            app.detail.as_ref().and_then(|d| d.description.as_deref()),
            Some("Doors open at 7pm")
        );

        app.handle_key(KeyCode::Esc);
        assert_eq!(app.tab, Tab::Explore);
    }

    #[tokio::test]
    async fn test_seed_city_only_once() {
        let mut app = app();
        app.seed_initial_city();
        assert!(SEED_CITIES.contains(&app.filters.city.as_str()));

        app.handle_key(KeyCode::Char('x'));
        assert_eq!(app.filters, FiltersState::default());
        app.seed_initial_city();
        assert_eq!(app.filters.city, "");
    }
}
