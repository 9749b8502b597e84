use anyhow::Result;
use crossterm::{
    event::{self, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{
    backend::CrosstermBackend,
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Cell, Paragraph, Row, Table, TableState},
    Frame, Terminal,
};
use std::io;
use tcg_collector::{
    CardEntry, CardKind, CollectionLedger, LedgerEntry, SearchOutcome, Session, PRESET_SEPARATORS,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatusKind {
    Info,
    Success,
    Warning,
    Error,
}

#[derive(Debug, Clone)]
pub struct StatusMessage {
    pub kind: StatusKind,
    pub text: String,
}

impl StatusMessage {
    fn new(kind: StatusKind, text: impl Into<String>) -> Self {
        Self {
            kind,
            text: text.into(),
        }
    }

    fn color(&self) -> Color {
        match self.kind {
            StatusKind::Info => Color::Cyan,
            StatusKind::Success => Color::Green,
            StatusKind::Warning => Color::Yellow,
            StatusKind::Error => Color::Red,
        }
    }
}

pub struct App {
    pub session: Session,
    pub input: String,
    pub state: TableState,
    pub show_detail: bool,
    pub status: StatusMessage,
}

impl App {
    pub fn new(session: Session) -> Self {
        let mut state = TableState::default();
        let len = session.entries().len();
        if len > 0 {
            state.select(Some(len - 1));
        }

        let status = StatusMessage::new(
            StatusKind::Info,
            format!(
                "{} cards indexed, {} entries in collection",
                session.index().len(),
                len
            ),
        );

        Self {
            session,
            input: String::new(),
            state,
            show_detail: false,
            status,
        }
    }

    pub fn toggle_detail(&mut self) {
        self.show_detail = !self.show_detail;
    }

    pub fn selected_entry(&self) -> Option<&LedgerEntry> {
        self.state
            .selected()
            .and_then(|i| self.session.entries().get(i))
    }

    /// Search the typed passcode and record it on a hit
    pub fn submit(&mut self) {
        let input = std::mem::take(&mut self.input);

        self.status = match self.session.search(&input) {
            Ok(outcome @ SearchOutcome::Recorded(_)) => {
                self.select_last();
                StatusMessage::new(StatusKind::Success, outcome.message())
            }
            Ok(outcome) => StatusMessage::new(StatusKind::Warning, outcome.message()),
            Err(err) => {
                // Keep what was typed so the user can retry
                self.input = input;
                StatusMessage::new(StatusKind::Error, err.to_string())
            }
        };
    }

    /// Insert one of the preset separators (0-based)
    pub fn add_preset_separator(&mut self, preset: usize) {
        let Some(label) = PRESET_SEPARATORS.get(preset) else {
            return;
        };

        self.status = match self.session.add_separator(label) {
            Ok(()) => {
                self.select_last();
                StatusMessage::new(StatusKind::Success, format!("Separator added: {}", label))
            }
            Err(err) => StatusMessage::new(StatusKind::Error, err.to_string()),
        };
    }

    pub fn reload(&mut self) {
        self.status = match self.session.reload() {
            Ok(()) => {
                self.select_last();
                StatusMessage::new(
                    StatusKind::Info,
                    format!("Reloaded {} entries", self.session.entries().len()),
                )
            }
            Err(err) => StatusMessage::new(StatusKind::Error, err.to_string()),
        };
    }

    /// Switch to the collection file whose path is in the input line
    pub fn open_typed_ledger(&mut self) {
        let path = std::mem::take(&mut self.input);
        if path.trim().is_empty() {
            self.status = StatusMessage::new(
                StatusKind::Warning,
                "Type a collection file path, then press Ctrl+O",
            );
            return;
        }

        let result = CollectionLedger::open(path.trim())
            .and_then(|ledger| self.session.switch_ledger(ledger));

        self.status = match result {
            Ok(()) => {
                self.select_last();
                StatusMessage::new(
                    StatusKind::Info,
                    format!("Opened {}", self.session.ledger().path().display()),
                )
            }
            Err(err) => {
                self.input = path;
                StatusMessage::new(StatusKind::Error, err.to_string())
            }
        };
    }

    fn select_last(&mut self) {
        let len = self.session.entries().len();
        self.state
            .select(if len == 0 { None } else { Some(len - 1) });
    }

    pub fn next(&mut self) {
        let len = self.session.entries().len();
        if len == 0 {
            return;
        }
        let i = match self.state.selected() {
            Some(i) => {
                if i >= len - 1 {
                    0
                } else {
                    i + 1
                }
            }
            None => 0,
        };
        self.state.select(Some(i));
    }

    pub fn previous(&mut self) {
        let len = self.session.entries().len();
        if len == 0 {
            return;
        }
        let i = match self.state.selected() {
            Some(i) => {
                if i == 0 {
                    len - 1
                } else {
                    i - 1
                }
            }
            None => 0,
        };
        self.state.select(Some(i));
    }

    pub fn page_down(&mut self) {
        let len = self.session.entries().len();
        if len == 0 {
            return;
        }
        let i = match self.state.selected() {
            Some(i) => (i + 20).min(len - 1),
            None => 0,
        };
        self.state.select(Some(i));
    }

    pub fn page_up(&mut self) {
        if self.session.entries().is_empty() {
            return;
        }
        let i = self.state.selected().map(|i| i.saturating_sub(20)).unwrap_or(0);
        self.state.select(Some(i));
    }

    pub fn stats(&self) -> CollectionStats {
        let mut stats = CollectionStats::default();

        for entry in self.session.entries() {
            match entry {
                LedgerEntry::Card(card) => {
                    stats.cards += 1;
                    match card.kind() {
                        CardKind::Spell => stats.spells += 1,
                        CardKind::Trap => stats.traps += 1,
                        _ => stats.monsters += 1,
                    }
                }
                LedgerEntry::Separator(_) => stats.separators += 1,
            }
        }

        stats
    }

    /// Returns false when the app should quit
    pub fn handle_key(&mut self, key: KeyEvent) -> bool {
        if key.modifiers.contains(KeyModifiers::CONTROL) {
            match key.code {
                KeyCode::Char('q') | KeyCode::Char('c') => return false,
                KeyCode::Char('r') => self.reload(),
                KeyCode::Char('o') => self.open_typed_ledger(),
                _ => {}
            }
            return true;
        }

        match key.code {
            KeyCode::Esc => return false,
            KeyCode::Enter => self.submit(),
            KeyCode::Char(c) => self.input.push(c),
            KeyCode::Backspace => {
                self.input.pop();
            }
            KeyCode::F(n @ 1..=4) => self.add_preset_separator(n as usize - 1),
            KeyCode::Tab => self.toggle_detail(),
            KeyCode::Down => self.next(),
            KeyCode::Up => self.previous(),
            KeyCode::PageDown => self.page_down(),
            KeyCode::PageUp => self.page_up(),
            KeyCode::Home => {
                if !self.session.entries().is_empty() {
                    self.state.select(Some(0));
                }
            }
            KeyCode::End => self.select_last(),
            _ => {}
        }
        true
    }
}

#[derive(Default)]
pub struct CollectionStats {
    pub cards: usize,
    pub monsters: usize,
    pub spells: usize,
    pub traps: usize,
    pub separators: usize,
}

pub fn run_ui(app: &mut App) -> Result<()> {
    // Setup terminal
    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let res = run_app(&mut terminal, app);

    // Restore terminal
    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()?;

    res?;
    Ok(())
}

fn run_app<B: ratatui::backend::Backend>(
    terminal: &mut Terminal<B>,
    app: &mut App,
) -> io::Result<()> {
    loop {
        terminal.draw(|f| ui(f, app))?;

        if let Event::Key(key) = event::read()? {
            if key.kind == KeyEventKind::Press && !app.handle_key(key) {
                return Ok(());
            }
        }
    }
}

fn ui(f: &mut Frame, app: &mut App) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3), // Header
            Constraint::Length(3), // Passcode input
            Constraint::Min(0),    // Collection table
            Constraint::Length(3), // Status bar
        ])
        .split(f.size());

    render_header(f, chunks[0], app);
    render_input(f, chunks[1], app);

    if app.show_detail {
        let content_chunks = Layout::default()
            .direction(Direction::Horizontal)
            .constraints([Constraint::Percentage(65), Constraint::Percentage(35)])
            .split(chunks[2]);

        render_table(f, content_chunks[0], app);
        render_detail_panel(f, content_chunks[1], app);
    } else {
        render_table(f, chunks[2], app);
    }

    render_status_bar(f, chunks[3], app);
}

fn render_header(f: &mut Frame, area: Rect, app: &App) {
    let stats = app.stats();

    let spans = vec![
        Span::styled(
            "TCG Collector",
            Style::default()
                .fg(Color::Yellow)
                .add_modifier(Modifier::BOLD),
        ),
        Span::raw("  |  "),
        Span::styled(
            truncate(&app.session.ledger().path().display().to_string(), 40),
            Style::default().fg(Color::White),
        ),
        Span::raw("  |  "),
        Span::styled(
            format!("Cards: {}", stats.cards),
            Style::default().fg(Color::Green),
        ),
        Span::raw("  "),
        Span::styled(
            format!("M {} / S {} / T {}", stats.monsters, stats.spells, stats.traps),
            Style::default().fg(Color::DarkGray),
        ),
        Span::raw("  "),
        Span::styled(
            format!("Separators: {}", stats.separators),
            Style::default().fg(Color::Magenta),
        ),
        Span::raw("  |  "),
        Span::styled(
            format!("Indexed: {}", app.session.index().len()),
            Style::default().fg(Color::Cyan),
        ),
    ];

    let header = Paragraph::new(vec![Line::from(spans)]).block(
        Block::default()
            .borders(Borders::ALL)
            .border_style(Style::default().fg(Color::Cyan)),
    );

    f.render_widget(header, area);
}

fn render_input(f: &mut Frame, area: Rect, app: &App) {
    let input = Paragraph::new(app.input.as_str())
        .style(Style::default().fg(Color::White))
        .block(
            Block::default()
                .borders(Borders::ALL)
                .border_style(Style::default().fg(Color::Yellow))
                .title(" Enter Card Passcode "),
        );

    f.render_widget(input, area);
    f.set_cursor(area.x + app.input.chars().count() as u16 + 1, area.y + 1);
}

/// Row colours by attribute
fn kind_style(kind: CardKind) -> Style {
    let (bg, fg) = match kind {
        CardKind::Earth => (Color::Rgb(255, 165, 79), Color::Black),
        CardKind::Water => (Color::Rgb(0, 191, 255), Color::Black),
        CardKind::Fire => (Color::Rgb(255, 69, 0), Color::Black),
        CardKind::Wind => (Color::Rgb(0, 255, 127), Color::Black),
        CardKind::Dark => (Color::Rgb(64, 64, 64), Color::White),
        CardKind::Light => (Color::Rgb(238, 238, 224), Color::Black),
        CardKind::Divine => (Color::Rgb(255, 215, 0), Color::Black),
        CardKind::Spell => (Color::Reset, Color::Green),
        CardKind::Trap => (Color::Reset, Color::Magenta),
        CardKind::Unknown => (Color::Reset, Color::White),
    };
    Style::default().bg(bg).fg(fg)
}

fn card_row(card: &CardEntry) -> Row<'static> {
    let cells = vec![
        Cell::from(card.passcode.clone()),
        Cell::from(truncate(&card.name, 38)),
        Cell::from(card.status.clone()),
        Cell::from(card.attack.clone()),
        Cell::from(card.defense.clone()),
        Cell::from(card.attribute.clone()),
        Cell::from(truncate(&card.source_file, 20)),
    ];

    Row::new(cells).style(kind_style(card.kind())).height(1)
}

fn separator_row(label: &str) -> Row<'static> {
    Row::new(vec![
        Cell::from("────────"),
        Cell::from(label.to_string()),
    ])
    .style(
        Style::default()
            .fg(Color::Yellow)
            .add_modifier(Modifier::BOLD | Modifier::ITALIC),
    )
    .height(1)
}

fn render_table(f: &mut Frame, area: Rect, app: &mut App) {
    let header_cells = ["Passcode", "Name", "Status", "Attack", "Defense", "Attribute", "Database"]
        .iter()
        .map(|h| {
            Cell::from(*h).style(
                Style::default()
                    .fg(Color::Yellow)
                    .add_modifier(Modifier::BOLD),
            )
        });

    let header = Row::new(header_cells)
        .style(Style::default().bg(Color::DarkGray))
        .height(1);

    let rows: Vec<Row> = app
        .session
        .entries()
        .iter()
        .map(|entry| match entry {
            LedgerEntry::Card(card) => card_row(card),
            LedgerEntry::Separator(label) => separator_row(label),
        })
        .collect();

    let table = Table::new(
        rows,
        [
            Constraint::Length(10),
            Constraint::Length(40),
            Constraint::Length(14),
            Constraint::Length(8),
            Constraint::Length(8),
            Constraint::Length(10),
            Constraint::Length(22),
        ],
    )
    .header(header)
    .block(
        Block::default()
            .borders(Borders::ALL)
            .border_style(Style::default().fg(Color::White))
            .title(" Collection "),
    )
    .highlight_style(Style::default().add_modifier(Modifier::BOLD | Modifier::REVERSED))
    .highlight_symbol("→ ");

    f.render_stateful_widget(table, area, &mut app.state);
}

fn render_status_bar(f: &mut Frame, area: Rect, app: &App) {
    let selected = app.state.selected().map(|i| i + 1).unwrap_or(0);
    let total = app.session.entries().len();

    let mut status_spans = vec![
        Span::styled(
            format!(" Row: {}/{} ", selected, total),
            Style::default().fg(Color::Cyan),
        ),
        Span::raw(" | "),
        Span::styled(app.status.text.clone(), Style::default().fg(app.status.color())),
        Span::raw(" | "),
    ];

    for (i, label) in PRESET_SEPARATORS.iter().enumerate() {
        status_spans.push(Span::styled(
            format!("F{}", i + 1),
            Style::default().fg(Color::Yellow),
        ));
        status_spans.push(Span::raw(format!(" {}  ", label)));
    }

    status_spans.push(Span::raw("| "));
    status_spans.push(Span::styled("Tab", Style::default().fg(Color::Yellow)));
    status_spans.push(Span::raw(" Details | "));
    status_spans.push(Span::styled("^R", Style::default().fg(Color::Yellow)));
    status_spans.push(Span::raw(" Reload | "));
    status_spans.push(Span::styled("^O", Style::default().fg(Color::Yellow)));
    status_spans.push(Span::raw(" Open | "));
    status_spans.push(Span::styled("Esc", Style::default().fg(Color::Red)));
    status_spans.push(Span::raw(" Quit"));

    let status_bar = Paragraph::new(vec![Line::from(status_spans)]).block(
        Block::default()
            .borders(Borders::ALL)
            .border_style(Style::default().fg(Color::White)),
    );

    f.render_widget(status_bar, area);
}

fn render_detail_panel(f: &mut Frame, area: Rect, app: &App) {
    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::Yellow))
        .title(" Card Details ");

    let card = match app.selected_entry() {
        Some(LedgerEntry::Card(card)) => card,
        Some(LedgerEntry::Separator(label)) => {
            let content = vec![
                Line::from(""),
                Line::from(vec![
                    Span::styled("  Separator: ", label_style()),
                    Span::raw(label.as_str()),
                ]),
            ];
            f.render_widget(Paragraph::new(content).block(block), area);
            return;
        }
        None => {
            f.render_widget(Paragraph::new("No entry selected").block(block), area);
            return;
        }
    };

    let field = |name: &'static str, value: &str| {
        Line::from(vec![
            Span::styled(format!("  {}: ", name), label_style()),
            Span::raw(value.to_string()),
        ])
    };

    let content = vec![
        Line::from(""),
        field("Passcode", &card.passcode),
        Line::from(""),
        field("Name", &card.name),
        Line::from(""),
        field("Status", &card.status),
        Line::from(""),
        Line::from(vec![
            Span::styled("  Attribute: ", label_style()),
            Span::styled(card.attribute.clone(), kind_style(card.kind())),
        ]),
        Line::from(""),
        field("Attack", &card.attack),
        field("Defense", &card.defense),
        Line::from(""),
        Line::from("  ─────────────────────────────────────"),
        Line::from(""),
        Line::from(vec![Span::styled("  Database: ", label_style()), Span::styled(
            card.source_file.clone(),
            Style::default().fg(Color::Green),
        )]),
        Line::from(""),
        Line::from(vec![Span::styled(
            "  Press Tab to close",
            Style::default()
                .fg(Color::DarkGray)
                .add_modifier(Modifier::ITALIC),
        )]),
    ];

    f.render_widget(Paragraph::new(content).block(block), area);
}

fn label_style() -> Style {
    Style::default()
        .fg(Color::Cyan)
        .add_modifier(Modifier::BOLD)
}

fn truncate(s: &str, max_len: usize) -> String {
    if s.chars().count() <= max_len {
        s.to_string()
    } else {
        let kept: String = s.chars().take(max_len.saturating_sub(3)).collect();
        format!("{}...", kept)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tcg_collector::{CardRecord, ReferenceIndex};
    use tempfile::TempDir;

    fn app_in(dir: &TempDir) -> App {
        let index = ReferenceIndex::from_records(vec![CardRecord::derive(
            "12345", "Test Dragon", "", "Monster", "2500", "2100", "LOB",
        )]);
        let ledger = CollectionLedger::open(dir.path().join("Collection.csv")).unwrap();
        App::new(Session::new(index, ledger).unwrap())
    }

    fn press(app: &mut App, code: KeyCode) -> bool {
        app.handle_key(KeyEvent::new(code, KeyModifiers::NONE))
    }

    #[test]
    fn test_typing_and_submit_records_card() {
        let dir = TempDir::new().unwrap();
        let mut app = app_in(&dir);

        for c in "12345".chars() {
            press(&mut app, KeyCode::Char(c));
        }
        press(&mut app, KeyCode::Enter);

        assert!(app.input.is_empty());
        assert_eq!(app.status.kind, StatusKind::Success);
        assert_eq!(app.session.entries().len(), 1);
        assert_eq!(app.state.selected(), Some(0));
    }

    #[test]
    fn test_not_found_and_empty_input_warn() {
        let dir = TempDir::new().unwrap();
        let mut app = app_in(&dir);

        press(&mut app, KeyCode::Enter);
        assert_eq!(app.status.kind, StatusKind::Warning);

        press(&mut app, KeyCode::Char('9'));
        press(&mut app, KeyCode::Enter);
        assert_eq!(app.status.kind, StatusKind::Warning);
        assert!(app.session.entries().is_empty());
    }

    #[test]
    fn test_function_keys_add_separators() {
        let dir = TempDir::new().unwrap();
        let mut app = app_in(&dir);

        press(&mut app, KeyCode::F(2));
        assert_eq!(
            app.session.entries(),
            &[LedgerEntry::Separator("Picture Holos".to_string())]
        );
        assert_eq!(app.stats().separators, 1);
    }

    #[test]
    fn test_quit_keys() {
        let dir = TempDir::new().unwrap();
        let mut app = app_in(&dir);

        assert!(!press(&mut app, KeyCode::Esc));
        assert!(!app.handle_key(KeyEvent::new(KeyCode::Char('q'), KeyModifiers::CONTROL)));
        assert!(press(&mut app, KeyCode::Char('q')));
        assert_eq!(app.input, "q");
    }

    #[test]
    fn test_truncate_is_char_safe() {
        assert_eq!(truncate("short", 10), "short");
        assert_eq!(truncate("Évolution Dragon", 8), "Évolu...");
    }
}
