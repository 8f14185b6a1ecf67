use ratatui::{
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph, Wrap},
    Frame,
};

use crate::api::{EventDetail, EventVenue};

pub struct DetailView {
    pub scroll: u16,
}

impl DetailView {
    pub fn new() -> Self {
        Self { scroll: 0 }
    }

    pub fn render(
        &self,
        frame: &mut Frame,
        area: Rect,
        detail: &EventDetail,
        is_favorite: bool,
        loading: bool,
        error: Option<&str>,
    ) {
        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .constraints([
                Constraint::Length(3), // Title
                Constraint::Length(7), // Venue + pricing
                Constraint::Min(0),    // Description
            ])
            .split(area);

        self.render_title(frame, chunks[0], detail, is_favorite, loading, error);

        let columns = Layout::default()
            .direction(Direction::Horizontal)
            .constraints([Constraint::Percentage(50), Constraint::Percentage(50)])
            .split(chunks[1]);

        self.render_venue(frame, columns[0], detail.summary.venue.as_ref());
        self.render_prices(frame, columns[1], detail);
        self.render_description(frame, chunks[2], detail);
    }

    fn render_title(
        &self,
        frame: &mut Frame,
        area: Rect,
        detail: &EventDetail,
        is_favorite: bool,
        loading: bool,
        error: Option<&str>,
    ) {
        let star = if is_favorite {
            Span::styled("★ ", Style::default().fg(Color::LightYellow))
        } else {
            Span::styled("☆ ", Style::default().fg(Color::Gray))
        };

        let status = match (loading, error) {
            (_, Some(err)) => Span::styled(format!("  {}", err), Style::default().fg(Color::Red)),
            (true, None) => Span::styled("  loading…", Style::default().fg(Color::Yellow)),
            (false, None) => Span::raw(""),
        };

        let line = Line::from(vec![
            star,
            Span::styled(
                detail.summary.name.clone(),
                Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD),
            ),
            Span::raw("  │  "),
            Span::raw(detail.summary.formatted_date.clone()),
            Span::raw("  │  "),
            Span::styled(
                detail.summary.category_display().to_string(),
                Style::default().fg(Color::Magenta),
            ),
            status,
        ]);

        let paragraph = Paragraph::new(line).block(Block::default().borders(Borders::ALL));
        frame.render_widget(paragraph, area);
    }

    fn render_venue(&self, frame: &mut Frame, area: Rect, venue: Option<&EventVenue>) {
        let label = |text: &str| Span::styled(text.to_string(), Style::default().fg(Color::Gray));

        let lines = match venue {
            Some(venue) => vec![
                Line::from(vec![
                    label("Venue: "),
                    Span::raw(venue.name.clone().unwrap_or_else(|| "TBD".to_string())),
                ]),
                Line::from(vec![
                    label("Address: "),
                    Span::raw(venue.address.clone().unwrap_or_else(|| "-".to_string())),
                ]),
                Line::from(vec![label("Location: "), Span::raw(venue.location_display())]),
                Line::from(vec![
                    label("Map: "),
                    match venue.coordinates() {
                        Some((lat, lon)) => Span::styled(
                            format!("{:.5}, {:.5}", lat, lon),
                            Style::default().fg(Color::Green),
                        ),
                        None => Span::styled("unavailable", Style::default().fg(Color::DarkGray)),
                    },
                ]),
            ],
            None => vec![Line::from(Span::styled(
                "Venue TBD",
                Style::default().fg(Color::DarkGray),
            ))],
        };

        let paragraph = Paragraph::new(lines)
            .block(Block::default().borders(Borders::ALL).title(" Venue "));
        frame.render_widget(paragraph, area);
    }

    fn render_prices(&self, frame: &mut Frame, area: Rect, detail: &EventDetail) {
        let mut lines: Vec<Line> = if detail.price_ranges.is_empty() {
            vec![Line::from(Span::styled(
                "Prices TBD",
                Style::default().fg(Color::DarkGray),
            ))]
        } else {
            detail
                .price_ranges
                .iter()
                .map(|range| Line::from(Span::styled(range.display(), Style::default().fg(Color::Green))))
                .collect()
        };

        if let Some(url) = &detail.ticket_url {
            lines.push(Line::from(vec![
                Span::styled("Tickets: ", Style::default().fg(Color::Gray)),
                Span::styled(url.clone(), Style::default().fg(Color::Cyan)),
            ]));
        }

        let paragraph = Paragraph::new(lines)
            .block(Block::default().borders(Borders::ALL).title(" Pricing "))
            .wrap(Wrap { trim: true });
        frame.render_widget(paragraph, area);
    }

    fn render_description(&self, frame: &mut Frame, area: Rect, detail: &EventDetail) {
        let mut lines = vec![Line::from(
            detail
                .description
                .clone()
                .unwrap_or_else(|| "No description available.".to_string()),
        )];

        if let Some(info) = &detail.additional_info {
            lines.push(Line::from(""));
            lines.push(Line::from(Span::styled(
                "Please note",
                Style::default().fg(Color::Yellow).add_modifier(Modifier::BOLD),
            )));
            lines.push(Line::from(info.clone()));
        }

        if let Some(image) = &detail.summary.image_url {
            lines.push(Line::from(""));
            lines.push(Line::from(vec![
                Span::styled("Image: ", Style::default().fg(Color::Gray)),
                Span::raw(image.clone()),
            ]));
        }

        let paragraph = Paragraph::new(lines)
            .block(Block::default().borders(Borders::ALL).title(" About "))
            .wrap(Wrap { trim: false })
            .scroll((self.scroll, 0));
        frame.render_widget(paragraph, area);
    }
}
