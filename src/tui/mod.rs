//! Ratatui-based terminal UI.
//!
//! The TUI provides a selection panel for the sector, its three dimensions and
//! an Analyze action, then renders the resulting series as a line chart.
//!
//! Analyses run on a worker thread. Every request gets a token from the
//! `RequestSequencer`; changing the selection supersedes whatever is in flight,
//! so a late result for an old selection is dropped instead of drawn.

use std::io;
use std::sync::Arc;
use std::sync::mpsc::{self, Receiver, Sender};
use std::thread;
use std::time::Duration;

use chrono::Local;
use crossterm::{
    event::{self, Event, KeyCode, KeyEventKind},
    execute,
    terminal::{EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode},
};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use ratatui::{
    Frame, Terminal,
    backend::CrosstermBackend,
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span, Text},
    widgets::{Block, Borders, Clear, List, ListItem, ListState, Paragraph},
};
use tracing::{debug, info};

use crate::app::pipeline::{Provenance, SeriesData, acquire};
use crate::app::sequence::{RequestSequencer, RequestToken};
use crate::config::Settings;
use crate::data::{RemoteFetcher, build_fetcher};
use crate::domain::{Sector, Selection, SeriesRequest};
use crate::error::{AppError, FetchError};
use crate::render::svg::format_value;
use crate::render::{LineChart, RenderOutcome};

mod chart;

use chart::FrameSurface;

/// Index of the Analyze entry in the settings list (after the three dimensions).
const ANALYZE_FIELD: usize = 3;

/// Start the TUI.
pub fn run(settings: Settings, seed: Option<u64>) -> Result<(), AppError> {
    let _guard = TerminalGuard::new()?;

    let backend = CrosstermBackend::new(io::stdout());
    let mut terminal =
        Terminal::new(backend).map_err(|e| AppError::new(4, format!("Failed to initialize terminal: {e}")))?;

    let mut app = App::new(settings, seed);
    app.event_loop(&mut terminal)
}

/// Ensures the terminal is restored (raw mode, alternate screen) on exit.
struct TerminalGuard;

impl TerminalGuard {
    fn new() -> Result<Self, AppError> {
        enable_raw_mode().map_err(|e| AppError::new(4, format!("Failed to enable raw mode: {e}")))?;
        if let Err(e) = execute!(io::stdout(), EnterAlternateScreen) {
            let _ = disable_raw_mode();
            return Err(AppError::new(4, format!("Failed to enter alternate screen: {e}")));
        }
        Ok(Self)
    }
}

impl Drop for TerminalGuard {
    fn drop(&mut self) {
        let _ = disable_raw_mode();
        let _ = execute!(io::stdout(), LeaveAlternateScreen);
    }
}

/// A finished worker request.
struct Completed {
    token: RequestToken,
    result: Result<SeriesData, FetchError>,
}

struct App {
    settings: Arc<Settings>,
    sector: Sector,
    tech: Selection,
    agriculture: Selection,
    selected_field: usize,
    status: String,
    sequencer: Arc<RequestSequencer>,
    in_flight: Option<RequestToken>,
    tx: Sender<Completed>,
    rx: Receiver<Completed>,
    /// Seeds each request's sample generator.
    seeds: StdRng,
    data: Option<SeriesData>,
}

impl App {
    fn new(settings: Settings, seed: Option<u64>) -> Self {
        let (tx, rx) = mpsc::channel();
        Self {
            settings: Arc::new(settings),
            sector: Sector::Tech,
            tech: Selection::empty(Sector::Tech),
            agriculture: Selection::empty(Sector::Agriculture),
            selected_field: 0,
            status: "Pick a category, company and metric, then Analyze.".to_string(),
            sequencer: Arc::new(RequestSequencer::new()),
            in_flight: None,
            tx,
            rx,
            seeds: seed.map(StdRng::seed_from_u64).unwrap_or_else(StdRng::from_entropy),
            data: None,
        }
    }

    fn event_loop<B: ratatui::backend::Backend>(&mut self, terminal: &mut Terminal<B>) -> Result<(), AppError> {
        let mut needs_redraw = true;
        loop {
            if self.drain_completed() {
                needs_redraw = true;
            }

            if needs_redraw {
                terminal
                    .draw(|f| self.draw(f))
                    .map_err(|e| AppError::new(4, format!("Terminal draw error: {e}")))?;
                needs_redraw = false;
            }

            if !event::poll(Duration::from_millis(100)).map_err(|e| AppError::new(4, format!("Event poll error: {e}")))? {
                continue;
            }

            match event::read().map_err(|e| AppError::new(4, format!("Event read error: {e}")))? {
                Event::Key(key) => {
                    if key.kind != KeyEventKind::Press {
                        continue;
                    }
                    if self.handle_key(key.code) {
                        break;
                    }
                    needs_redraw = true;
                }
                Event::Resize(_, _) => {
                    needs_redraw = true;
                }
                _ => {}
            }
        }
        Ok(())
    }

    fn selection(&self) -> &Selection {
        match self.sector {
            Sector::Tech => &self.tech,
            Sector::Agriculture => &self.agriculture,
        }
    }

    fn selection_mut(&mut self) -> &mut Selection {
        match self.sector {
            Sector::Tech => &mut self.tech,
            Sector::Agriculture => &mut self.agriculture,
        }
    }

    fn can_analyze(&self) -> bool {
        self.in_flight.is_none() && self.selection().is_ready()
    }

    fn handle_key(&mut self, code: KeyCode) -> bool {
        match code {
            KeyCode::Char('q') | KeyCode::Esc => return true,
            KeyCode::Tab | KeyCode::Char('s') => {
                self.sector = self.sector.toggle();
                self.selected_field = 0;
                self.selection_changed(format!("sector: {}", self.sector.display_name()));
            }
            KeyCode::Up => {
                if self.selected_field > 0 {
                    self.selected_field -= 1;
                }
            }
            KeyCode::Down => {
                if self.selected_field < ANALYZE_FIELD {
                    self.selected_field += 1;
                }
            }
            KeyCode::Left => self.cycle_field(-1),
            KeyCode::Right => self.cycle_field(1),
            KeyCode::Enter | KeyCode::Char('a') => self.start_analysis(),
            _ => {}
        }
        false
    }

    /// Choices for one dimension of the current selection.
    fn options(&self, field: usize) -> Vec<String> {
        let lookup = &self.settings.lookup;
        let [group, _, _] = self.selection().dimensions();
        let names: Vec<&str> = match (self.sector, field) {
            (Sector::Tech, 0) => lookup.categories(),
            (Sector::Tech, 1) => lookup.listed_companies(group, self.settings.strategy.include_untraded),
            (Sector::Agriculture, 0) => lookup.crops(),
            (Sector::Agriculture, 1) => lookup
                .regions(group)
                .unwrap_or_default()
                .iter()
                .map(String::as_str)
                .collect(),
            (sector, 2) => sector.metrics().iter().map(|m| m.key()).collect(),
            _ => Vec::new(),
        };
        names.into_iter().map(String::from).collect()
    }

    fn cycle_field(&mut self, delta: i32) {
        let field = self.selected_field;
        if field >= ANALYZE_FIELD {
            return;
        }

        let labels = self.selection().dimension_labels();
        let options = self.options(field);
        if options.is_empty() {
            self.status = format!("Choose a {} first.", labels[0]);
            return;
        }

        let current = self.selection().dimensions()[field];
        let len = options.len();
        let next = match options.iter().position(|o| o == current) {
            Some(i) if delta >= 0 => (i + 1) % len,
            Some(i) => (i + len - 1) % len,
            None if delta >= 0 => 0,
            None => len - 1,
        };
        let value = options[next].clone();

        self.selection_mut().set_dimension(field, value.clone());
        self.selection_changed(format!("{}: {value}", labels[field]));
    }

    /// Any selection change supersedes the pending analysis and re-enables Analyze.
    fn selection_changed(&mut self, status: String) {
        if let Some(token) = self.in_flight.take() {
            self.sequencer.supersede();
            debug!(?token, "selection changed, superseding in-flight analysis");
            self.status = format!("{status} (pending analysis discarded)");
        } else {
            self.status = status;
        }
    }

    fn start_analysis(&mut self) {
        if self.in_flight.is_some() {
            self.status = "Analysis already running.".to_string();
            return;
        }
        if !self.selection().is_ready() {
            let labels = self.selection().dimension_labels();
            self.status = format!("Choose a {}, {} and {} first.", labels[0], labels[1], labels[2]);
            return;
        }

        let request = match self.selection().resolve(&self.settings.lookup) {
            Ok(request) => request,
            Err(err) => {
                self.status = err.to_string();
                return;
            }
        };

        let token = self.sequencer.issue();
        self.in_flight = Some(token);
        self.status = format!("Fetching {}...", request.title());
        info!(?token, title = %request.title(), "analysis started");

        let settings = Arc::clone(&self.settings);
        let sequencer = Arc::clone(&self.sequencer);
        let tx = self.tx.clone();
        let seed = self.seeds.r#gen::<u64>();
        thread::spawn(move || {
            let result = fetch_series(&settings, &request, seed);
            if !sequencer.is_current(token) {
                debug!(?token, "analysis finished after being superseded");
                return;
            }
            // The receiver is gone only when the UI has exited.
            let _ = tx.send(Completed { token, result });
        });
    }

    /// Apply finished requests. Returns whether anything changed on screen.
    fn drain_completed(&mut self) -> bool {
        let mut changed = false;
        while let Ok(done) = self.rx.try_recv() {
            changed |= self.apply(done);
        }
        changed
    }

    fn apply(&mut self, done: Completed) -> bool {
        if self.in_flight != Some(done.token) || !self.sequencer.is_current(done.token) {
            debug!(token = ?done.token, "dropping stale analysis result");
            return false;
        }
        self.in_flight = None;

        match done.result {
            Ok(data) => {
                self.status = match &data.provenance {
                    Provenance::Live => format!("Loaded {} records.", data.records.len()),
                    Provenance::Sample { reason } => {
                        format!("Live data unavailable ({reason}); showing sample data.")
                    }
                };
                self.data = Some(data);
            }
            Err(err) => {
                self.status = err.to_string();
            }
        }
        true
    }

    fn draw(&mut self, frame: &mut Frame<'_>) {
        let size = frame.area();
        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .constraints([Constraint::Length(6), Constraint::Min(0), Constraint::Length(3)])
            .split(size);

        self.draw_header(frame, chunks[0]);
        self.draw_body(frame, chunks[1]);
        self.draw_footer(frame, chunks[2]);
    }

    fn draw_header(&self, frame: &mut Frame<'_>, area: Rect) {
        let mut lines: Vec<Line> = Vec::new();
        lines.push(Line::from(vec![
            Span::styled("ht", Style::default().fg(Color::Cyan)),
            Span::raw(" | tech markets and crop weather"),
        ]));

        let mut tabs = Vec::new();
        for sector in Sector::ALL {
            let style = if sector == self.sector {
                Style::default().fg(Color::Black).bg(Color::White)
            } else {
                Style::default().fg(Color::Gray)
            };
            tabs.push(Span::styled(format!(" {} ", sector.display_name()), style));
            tabs.push(Span::raw(" "));
        }
        lines.push(Line::from(tabs));

        if let Some(data) = &self.data {
            let range = match (data.records.first(), data.records.last()) {
                (Some(first), Some(last)) => format!("{} .. {}", first.date, last.date),
                _ => "-".to_string(),
            };
            lines.push(Line::from(Span::styled(
                format!("records: {} | {range}", data.records.len()),
                Style::default().fg(Color::Gray),
            )));
            if let Provenance::Sample { reason } = &data.provenance {
                lines.push(Line::from(Span::styled(
                    format!("Showing sample data: {reason}"),
                    Style::default().fg(Color::Yellow),
                )));
            }
        }

        let p = Paragraph::new(Text::from(lines)).block(Block::default().borders(Borders::ALL));
        frame.render_widget(p, area);
    }

    fn draw_body(&self, frame: &mut Frame<'_>, area: Rect) {
        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .constraints([Constraint::Min(0), Constraint::Length(6)])
            .split(area);

        self.draw_chart(frame, chunks[0]);
        self.draw_settings(frame, chunks[1]);
    }

    fn draw_chart(&self, frame: &mut Frame<'_>, area: Rect) {
        let title = self.data.as_ref().map(SeriesData::title).unwrap_or_else(|| "Chart".to_string());
        let block = Block::default().title(title).borders(Borders::ALL);
        let inner = block.inner(area);
        frame.render_widget(block, area);
        frame.render_widget(Clear, inner);

        let Some(data) = &self.data else {
            let msg = if self.in_flight.is_some() {
                "Fetching..."
            } else {
                "No analysis yet."
            };
            frame.render_widget(Paragraph::new(msg).style(Style::default().fg(Color::Yellow)), inner);
            return;
        };

        let (chart_rect, insets) = chart_layout(inner);
        let outcome = data.render_on(&mut FrameSurface::new(frame, chart_rect));
        match outcome {
            RenderOutcome::Drawn(chart) => {
                if let Some(insets) = insets {
                    draw_axis_ticks(frame, inner, chart_rect, insets, &chart);
                }
            }
            RenderOutcome::NoData => {
                let msg = format!("No data available for {}.", data.request.title());
                frame.render_widget(Paragraph::new(msg).style(Style::default().fg(Color::Yellow)), inner);
            }
            RenderOutcome::Failed { detail } => {
                let msg = format!("Chart could not be drawn: {detail}");
                frame.render_widget(Paragraph::new(msg).style(Style::default().fg(Color::Red)), inner);
            }
        }
    }

    fn draw_settings(&self, frame: &mut Frame<'_>, area: Rect) {
        let selection = self.selection();
        let labels = selection.dimension_labels();
        let values = selection.dimensions();

        let mut items = Vec::new();
        for (label, value) in labels.iter().zip(values) {
            let shown = if value.is_empty() { "-" } else { value };
            items.push(ListItem::new(format!("{}: {shown}", capitalize(label))));
        }

        let analyze = if self.in_flight.is_some() {
            "[ Analyzing... ]"
        } else {
            "[ Analyze ]"
        };
        let analyze_style = if self.can_analyze() {
            Style::default().fg(Color::Green).add_modifier(Modifier::BOLD)
        } else {
            Style::default().fg(Color::DarkGray)
        };
        items.push(ListItem::new(analyze).style(analyze_style));

        let list = List::new(items)
            .block(
                Block::default()
                    .title(self.sector.display_name())
                    .borders(Borders::ALL),
            )
            .highlight_style(Style::default().fg(Color::Black).bg(Color::White))
            .highlight_symbol("» ");

        let mut state = ListState::default();
        state.select(Some(self.selected_field));
        frame.render_stateful_widget(list, area, &mut state);
    }

    fn draw_footer(&self, frame: &mut Frame<'_>, area: Rect) {
        let help = "Tab sector  ↑/↓ select  ←/→ change  Enter analyze  q quit";
        let line = Line::from(vec![
            Span::styled(help, Style::default().fg(Color::Gray)),
            Span::raw(" | "),
            Span::styled(&self.status, Style::default().fg(Color::Yellow)),
        ]);
        let p = Paragraph::new(line).block(Block::default().borders(Borders::ALL));
        frame.render_widget(p, area);
    }
}

/// Worker body: build the fetcher for the current mode and acquire one series.
fn fetch_series(settings: &Settings, request: &SeriesRequest, seed: u64) -> Result<SeriesData, FetchError> {
    let fetcher = build_fetcher(settings)?;
    let mut rng = StdRng::seed_from_u64(seed);
    acquire(
        request,
        fetcher.as_deref().map(|f| f as &dyn RemoteFetcher),
        &mut rng,
        settings.days,
        Local::now().date_naive(),
    )
}

fn capitalize(s: &str) -> String {
    let mut chars = s.chars();
    match chars.next() {
        Some(c) => c.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

#[derive(Debug, Clone, Copy)]
struct AxisInsets {
    left: u16,
    right: u16,
    top: u16,
    bottom: u16,
}

fn chart_layout(inner: Rect) -> (Rect, Option<AxisInsets>) {
    let insets = AxisInsets {
        left: 8,
        right: 2,
        top: 1,
        bottom: 2,
    };

    if inner.width <= insets.left + insets.right + 10 || inner.height <= insets.top + insets.bottom + 5 {
        return (inner, None);
    }

    let rect = Rect {
        x: inner.x + insets.left,
        y: inner.y + insets.top,
        width: inner.width - insets.left - insets.right,
        height: inner.height - insets.top - insets.bottom,
    };

    (rect, Some(insets))
}

/// Date ticks under the chart, value ticks to its left, axis labels around it.
fn draw_axis_ticks(frame: &mut Frame<'_>, inner: Rect, chart_rect: Rect, insets: AxisInsets, chart: &LineChart) {
    let ticks = 5usize;
    let style = Style::default().fg(Color::Gray);
    let x_bounds = chart.x_bounds();
    let y_bounds = chart.y_bounds(0.05);

    for i in 0..ticks {
        let u = i as f64 / (ticks as f64 - 1.0);
        let x_val = x_bounds[0] + u * (x_bounds[1] - x_bounds[0]);
        let Some(date) = chart.date_at(x_val) else {
            continue;
        };
        let label = date.format("%m-%d").to_string();
        let x = chart_rect.x + ((chart_rect.width - 1) as f64 * u).round() as u16;
        let start = x.saturating_sub((label.len() / 2) as u16);
        let y = chart_rect.y + chart_rect.height;
        if y >= inner.y + inner.height - 1 {
            continue;
        }
        let width = label.len() as u16;
        frame.render_widget(Paragraph::new(label).style(style), Rect { x: start, y, width, height: 1 });
    }

    for i in 0..ticks {
        let u = i as f64 / (ticks as f64 - 1.0);
        let y_val = y_bounds[0] + u * (y_bounds[1] - y_bounds[0]);
        let y = chart_rect.y + (chart_rect.height - 1) - ((chart_rect.height - 1) as f64 * u).round() as u16;
        let label = format_value(y_val);
        let x = inner.x + insets.left.saturating_sub(1);
        let start = x.saturating_sub(label.len() as u16);
        if start < inner.x {
            continue;
        }
        let width = label.len() as u16;
        frame.render_widget(Paragraph::new(label).style(style), Rect { x: start, y, width, height: 1 });
    }

    let x_label = Paragraph::new(chart.x_label.as_str())
        .alignment(Alignment::Center)
        .style(style);
    let x_rect = Rect {
        x: chart_rect.x,
        y: chart_rect.y + chart_rect.height + 1,
        width: chart_rect.width,
        height: 1,
    };
    if x_rect.y < inner.y + inner.height {
        frame.render_widget(x_label, x_rect);
    }

    let y_label = Paragraph::new(chart.y_label.as_str()).style(style.add_modifier(Modifier::BOLD));
    let y_rect = Rect {
        x: inner.x,
        y: inner.y,
        width: inner.width.min(insets.left.saturating_sub(1) + chart_rect.width),
        height: 1,
    };
    frame.render_widget(y_label, y_rect);
}

#[cfg(test)]
mod tests {
    use super::*;
    use ratatui::backend::TestBackend;

    use crate::config::FetchMode;

    fn sample_app() -> App {
        let mut settings = Settings::default();
        settings.strategy.mode = FetchMode::Sample;
        App::new(settings, Some(7))
    }

    fn wait(app: &App) -> Completed {
        app.rx.recv_timeout(Duration::from_secs(5)).unwrap()
    }

    /// category -> first, company -> first listed, metric -> first.
    fn fill_selection(app: &mut App) {
        for field in 0..3 {
            app.selected_field = field;
            app.handle_key(KeyCode::Right);
        }
    }

    #[test]
    fn analyze_is_disabled_until_selection_is_complete() {
        let mut app = sample_app();
        assert!(!app.can_analyze());
        app.handle_key(KeyCode::Enter);
        assert!(app.in_flight.is_none());
        assert!(app.status.contains("first"));

        fill_selection(&mut app);
        assert_eq!(app.selection().dimensions(), ["computers", "Apple", "stock_price"]);
        assert!(app.can_analyze());
    }

    #[test]
    fn sample_mode_analysis_is_applied() {
        let mut app = sample_app();
        fill_selection(&mut app);
        app.handle_key(KeyCode::Enter);
        assert!(app.in_flight.is_some());
        assert!(!app.can_analyze());

        let done = wait(&app);
        assert!(app.apply(done));
        assert!(app.in_flight.is_none());
        let data = app.data.as_ref().unwrap();
        assert!(data.is_sample());
        assert_eq!(data.records.len(), app.settings.days);
        assert_eq!(data.title(), "APPLE - STOCK PRICE (sample data)");
        assert!(app.status.contains("sample data"));
    }

    #[test]
    fn second_trigger_while_in_flight_is_ignored() {
        let mut app = sample_app();
        fill_selection(&mut app);
        app.handle_key(KeyCode::Enter);
        let first = app.in_flight;
        app.handle_key(KeyCode::Char('a'));
        assert_eq!(app.in_flight, first);
        assert_eq!(app.status, "Analysis already running.");
    }

    #[test]
    fn selection_change_discards_the_pending_result() {
        let mut app = sample_app();
        fill_selection(&mut app);
        app.handle_key(KeyCode::Enter);
        let stale = app.in_flight.unwrap();

        app.selected_field = 2;
        app.handle_key(KeyCode::Right);
        assert!(app.in_flight.is_none());
        assert!(app.can_analyze());
        assert!(app.status.contains("discarded"));

        let late = Completed {
            token: stale,
            result: Err(FetchError::Network("late".into())),
        };
        assert!(!app.apply(late));
        assert!(app.data.is_none());
    }

    #[test]
    fn sector_toggle_keeps_each_sides_selection() {
        let mut app = sample_app();
        fill_selection(&mut app);
        app.handle_key(KeyCode::Tab);
        assert_eq!(app.sector, Sector::Agriculture);
        assert!(!app.selection().is_ready());

        app.selected_field = 1;
        app.handle_key(KeyCode::Right);
        assert_eq!(app.status, "Choose a crop first.");

        app.handle_key(KeyCode::Tab);
        assert_eq!(app.selection().dimensions(), ["computers", "Apple", "stock_price"]);
    }

    #[test]
    fn draws_chart_and_notice_after_analysis() {
        let mut app = sample_app();
        fill_selection(&mut app);
        app.handle_key(KeyCode::Enter);
        let done = wait(&app);
        app.apply(done);

        let mut terminal = Terminal::new(TestBackend::new(100, 40)).unwrap();
        terminal.draw(|f| app.draw(f)).unwrap();
        let buffer = terminal.backend().buffer();
        let text: String = buffer.content().iter().map(|c| c.symbol()).collect();
        assert!(text.contains("APPLE - STOCK PRICE (sample data)"));
        assert!(text.contains("Showing sample data"));
        assert!(text.contains("[ Analyze ]"));
    }
}
