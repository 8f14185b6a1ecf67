use ratatui::{
    layout::{Constraint, Rect},
    style::{Color, Modifier, Style},
    widgets::{Block, Borders, Row, Table, TableState},
    Frame,
};

use crate::api::EventSummary;
use crate::favorites::FavoritesStore;

/// Scrollable event table used by both the Explore and Favorites tabs.
pub struct EventsView {
    pub table_state: TableState,
}

impl EventsView {
    pub fn new() -> Self {
        Self {
            table_state: TableState::default(),
        }
    }

    pub fn selected(&self) -> Option<usize> {
        self.table_state.selected()
    }

    pub fn select_next(&mut self, len: usize) {
        if len == 0 {
            self.table_state.select(None);
            return;
        }
        let next = match self.table_state.selected() {
            Some(i) => (i + 1).min(len - 1),
            None => 0,
        };
        self.table_state.select(Some(next));
    }

    pub fn select_previous(&mut self, len: usize) {
        if len == 0 {
            self.table_state.select(None);
            return;
        }
        let previous = match self.table_state.selected() {
            Some(i) => i.saturating_sub(1),
            None => 0,
        };
        self.table_state.select(Some(previous));
    }

    /// Keep the selection inside a list that may have shrunk or been replaced
    pub fn clamp(&mut self, len: usize) {
        match self.table_state.selected() {
            _ if len == 0 => self.table_state.select(None),
            Some(i) if i >= len => self.table_state.select(Some(len - 1)),
            None => self.table_state.select(Some(0)),
            _ => {}
        }
    }

    pub fn reset(&mut self) {
        self.table_state = TableState::default();
    }

    pub fn render(
        &mut self,
        frame: &mut Frame,
        area: Rect,
        events: &[&EventSummary],
        favorites: &FavoritesStore,
        title: &str,
    ) {
        let header = Row::new(["", "Date", "Event", "Category", "Venue"])
            .style(Style::default().fg(Color::Yellow).add_modifier(Modifier::BOLD))
            .bottom_margin(1);

        let rows: Vec<Row> = events
            .iter()
            .map(|event| {
                let is_favorite = favorites.is_favorite(&event.id);
                let star = if is_favorite { "★" } else { "☆" };
                let style = if is_favorite {
                    Style::default().fg(Color::LightYellow)
                } else {
                    Style::default().fg(Color::White)
                };

                Row::new(vec![
                    star.to_string(),
                    event.formatted_date.clone(),
                    event.name.clone(),
                    event.category_display().to_string(),
                    event.venue_display(),
                ])
                .style(style)
                .height(1)
            })
            .collect();

        let widths = [
            Constraint::Length(2),
            Constraint::Length(22),
            Constraint::Percentage(35),
            Constraint::Length(22),
            Constraint::Min(20),
        ];

        let table = Table::new(rows, widths)
            .header(header)
            .block(Block::default().borders(Borders::ALL).title(title.to_string()))
            .highlight_style(Style::default().bg(Color::DarkGray))
            .highlight_symbol("▶ ");

        frame.render_stateful_widget(table, area, &mut self.table_state);
    }
}
