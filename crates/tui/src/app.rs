use std::{cmp, io, thread, time::Duration};

use aerolines_core::{
    booking::{boarding_users, describe_bookings},
    BookingSession, Direction as FlightDirection, FareClass, Flight, FlightStatus, LoginOutcome,
};
use anyhow::{Context, Result};
use crossterm::{
    event::{self, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{
    backend::CrosstermBackend,
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Cell, Clear, List, ListItem, ListState, Paragraph, Row, Table, Wrap},
    Frame, Terminal,
};
use tokio::sync::mpsc;
use tracing::{info, warn};

const TICK_RATE: Duration = Duration::from_millis(250);
const MAX_INPUT_LEN: usize = 64;

const MENU_ITEMS: [&str; 8] = [
    "Display Flight Status",
    "Search Flight",
    "Book a Flight",
    "Cancel Booking",
    "Show My Details",
    "Show Boarding Users",
    "Log Out",
    "Exit",
];

#[derive(Debug, Clone)]
struct Theme {
    primary_fg: Color,
    accent: Color,
    muted: Color,
    selection_bg: Color,
    success: Color,
    warning: Color,
    danger: Color,
}

impl Default for Theme {
    fn default() -> Self {
        Self {
            primary_fg: Color::White,
            accent: Color::Cyan,
            muted: Color::DarkGray,
            selection_bg: Color::DarkGray,
            success: Color::Green,
            warning: Color::Yellow,
            danger: Color::Red,
        }
    }
}

impl Theme {
    fn status_color(&self, status: FlightStatus) -> Color {
        match status {
            FlightStatus::Scheduled => self.success,
            FlightStatus::Boarding => self.accent,
            FlightStatus::Delayed => self.warning,
            FlightStatus::Cancelled => self.danger,
            FlightStatus::Landed => self.muted,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Screen {
    Login,
    Menu,
    Board,
    Search,
    Book,
    Cancel,
    Details,
    Boarding,
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum PromptKind {
    Email,
    Name { email: String },
    Search,
}

#[derive(Debug, Clone)]
struct InputPrompt {
    kind: PromptKind,
    input: String,
    cursor: usize,
}

impl InputPrompt {
    fn new(kind: PromptKind) -> Self {
        Self {
            kind,
            input: String::new(),
            cursor: 0,
        }
    }

    fn title(&self) -> &'static str {
        match self.kind {
            PromptKind::Email => "Login",
            PromptKind::Name { .. } => "New User",
            PromptKind::Search => "Search Flight",
        }
    }

    fn instruction(&self, domain: &str) -> String {
        match &self.kind {
            PromptKind::Email => format!("Enter your email (must end with @{domain})"),
            PromptKind::Name { email } => format!("Welcome! Enter a name for {email}"),
            PromptKind::Search => "Enter flight number".to_string(),
        }
    }

    fn move_cursor(&mut self, delta: isize) {
        let len = self.input.chars().count() as isize;
        let next = (self.cursor as isize + delta).clamp(0, len);
        self.cursor = next as usize;
    }

    fn move_home(&mut self) {
        self.cursor = 0;
    }

    fn move_end(&mut self) {
        self.cursor = self.input.chars().count();
    }

    fn insert(&mut self, ch: char) {
        if self.input.chars().count() >= MAX_INPUT_LEN {
            return;
        }
        let byte_index = self.byte_index(self.cursor);
        self.input.insert(byte_index, ch);
        self.cursor += 1;
    }

    fn backspace(&mut self) {
        if self.cursor == 0 {
            return;
        }
        self.cursor -= 1;
        let byte_index = self.byte_index(self.cursor);
        self.input.remove(byte_index);
    }

    fn delete(&mut self) {
        if self.cursor < self.input.chars().count() {
            let byte_index = self.byte_index(self.cursor);
            self.input.remove(byte_index);
        }
    }

    /// Display columns between the start of the input and the cursor.
    fn cursor_column(&self) -> u16 {
        let before = &self.input[..self.byte_index(self.cursor)];
        u16::try_from(Span::raw(before).width()).unwrap_or(u16::MAX)
    }

    fn value(&self) -> String {
        self.input.trim().to_string()
    }

    fn byte_index(&self, char_index: usize) -> usize {
        self.input
            .char_indices()
            .nth(char_index)
            .map(|(idx, _)| idx)
            .unwrap_or(self.input.len())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum BookStep {
    Flight,
    Class { flight_number: String },
}

#[derive(Debug, Clone)]
enum SearchResult {
    Found(Box<Flight>),
    Missing(String),
}

enum AppEvent {
    Input(Event),
    Tick,
}

struct UiState {
    status: String,
    should_quit: bool,
    menu_cursor: usize,
    list_cursor: usize,
    book_step: BookStep,
    search_result: Option<SearchResult>,
}

impl Default for UiState {
    fn default() -> Self {
        Self {
            status: "Ready".to_string(),
            should_quit: false,
            menu_cursor: 0,
            list_cursor: 0,
            book_step: BookStep::Flight,
            search_result: None,
        }
    }
}

impl UiState {
    fn set_status(&mut self, message: impl Into<String>) {
        self.status = message.into();
    }

    fn move_menu_cursor(&mut self, delta: isize) {
        self.menu_cursor = step(self.menu_cursor, delta, MENU_ITEMS.len());
    }

    fn move_list_cursor(&mut self, delta: isize, total: usize) {
        self.list_cursor = step(self.list_cursor, delta, total);
    }
}

fn step(current: usize, delta: isize, total: usize) -> usize {
    if total == 0 {
        return 0;
    }
    (current as isize + delta).clamp(0, total as isize - 1) as usize
}

/// Full-screen terminal frontend for a [`BookingSession`].
pub struct AerolinesApp {
    session: BookingSession,
    state: UiState,
    screen: Screen,
    prompt: Option<InputPrompt>,
    theme: Theme,
}

impl AerolinesApp {
    pub fn new(session: BookingSession) -> Self {
        Self {
            session,
            state: UiState::default(),
            screen: Screen::Login,
            prompt: Some(InputPrompt::new(PromptKind::Email)),
            theme: Theme::default(),
        }
    }

    pub async fn run(&mut self) -> Result<()> {
        self.state.set_status(format!(
            "{} flights on the board • {} users on file",
            self.session.registry().len(),
            self.session.users().len()
        ));

        let mut stdout = io::stdout();
        enable_raw_mode().context("failed to enter raw mode")?;
        execute!(stdout, EnterAlternateScreen).context("failed to enter alternate screen")?;
        let backend = CrosstermBackend::new(stdout);
        let mut terminal = Terminal::new(backend).context("failed to create terminal")?;
        terminal.hide_cursor()?;
        terminal.clear()?;

        let (event_tx, mut event_rx) = mpsc::channel::<AppEvent>(128);
        spawn_input_thread(event_tx);

        loop {
            terminal.draw(|frame| self.draw(frame))?;
            if self.state.should_quit {
                break;
            }

            match event_rx.recv().await {
                Some(AppEvent::Input(event)) => {
                    if let Err(err) = self.handle_input(event) {
                        self.state.set_status(format!("Error: {err}"));
                    }
                }
                Some(AppEvent::Tick) => {}
                None => break,
            }

            if self.state.should_quit {
                break;
            }
        }

        self.session.persist();
        restore_terminal(&mut terminal)?;
        info!("Session ended");
        Ok(())
    }

    fn handle_input(&mut self, event: Event) -> Result<()> {
        let Event::Key(key) = event else {
            return Ok(());
        };
        if key.kind != KeyEventKind::Press {
            return Ok(());
        }
        if key.modifiers == KeyModifiers::CONTROL && key.code == KeyCode::Char('c') {
            self.state.should_quit = true;
            return Ok(());
        }
        if self.prompt.is_some() {
            return self.handle_prompt_key(key);
        }
        match self.screen {
            Screen::Menu => self.handle_menu_key(key),
            Screen::Book => self.handle_book_key(key),
            Screen::Cancel => self.handle_cancel_key(key),
            Screen::Board | Screen::Search | Screen::Details | Screen::Boarding => {
                self.handle_view_key(key)
            }
            Screen::Login => {
                self.prompt = Some(InputPrompt::new(PromptKind::Email));
                Ok(())
            }
        }
    }

    fn handle_prompt_key(&mut self, key: KeyEvent) -> Result<()> {
        let Some(prompt) = self.prompt.as_mut() else {
            return Ok(());
        };
        match key.code {
            KeyCode::Esc => {
                let kind = prompt.kind.clone();
                self.prompt = None;
                match kind {
                    PromptKind::Email => self.state.should_quit = true,
                    PromptKind::Name { .. } => {
                        self.prompt = Some(InputPrompt::new(PromptKind::Email));
                        self.state.set_status("Registration cancelled");
                    }
                    PromptKind::Search => self.open_menu("Search cancelled"),
                }
            }
            KeyCode::Enter => {
                let kind = prompt.kind.clone();
                let value = prompt.value();
                self.submit_prompt(kind, value);
            }
            KeyCode::Left => prompt.move_cursor(-1),
            KeyCode::Right => prompt.move_cursor(1),
            KeyCode::Home => prompt.move_home(),
            KeyCode::End => prompt.move_end(),
            KeyCode::Backspace => prompt.backspace(),
            KeyCode::Delete => prompt.delete(),
            KeyCode::Char(ch) => {
                if key.modifiers.is_empty() || key.modifiers == KeyModifiers::SHIFT {
                    prompt.insert(ch);
                }
            }
            _ => {}
        }
        Ok(())
    }

    fn submit_prompt(&mut self, kind: PromptKind, value: String) {
        match kind {
            PromptKind::Email => match self.session.login(&value) {
                Ok(LoginOutcome::Existing(_)) => {
                    let name = self
                        .session
                        .current_user()
                        .map(|user| user.name.clone())
                        .unwrap_or_default();
                    self.prompt = None;
                    self.open_menu(format!("Welcome back, {name}!"));
                }
                Ok(LoginOutcome::NewUser(email)) => {
                    self.prompt = Some(InputPrompt::new(PromptKind::Name { email }));
                    self.state.set_status("New user! Choose a display name");
                }
                Err(err) => self.state.set_status(format!("⚠ {err}")),
            },
            PromptKind::Name { email } => match self.session.register(&value, &email) {
                Ok(user) => {
                    let message = format!("Registered successfully as {}", user.name);
                    self.prompt = None;
                    self.open_menu(message);
                }
                Err(err) => self.state.set_status(format!("⚠ {err}")),
            },
            PromptKind::Search => {
                let query = value.to_uppercase();
                let result = match self.session.registry().find_by_number(&query) {
                    Some(flight) => SearchResult::Found(Box::new(flight.clone())),
                    None => SearchResult::Missing(query),
                };
                let message = match &result {
                    SearchResult::Found(flight) => format!("Found flight {}", flight.flight_number),
                    SearchResult::Missing(query) => format!("Flight {query} not found"),
                };
                self.state.search_result = Some(result);
                self.prompt = None;
                self.screen = Screen::Search;
                self.state.set_status(message);
            }
        }
    }

    fn open_menu(&mut self, message: impl Into<String>) {
        self.screen = Screen::Menu;
        self.state.set_status(message);
    }

    fn handle_menu_key(&mut self, key: KeyEvent) -> Result<()> {
        match key.code {
            KeyCode::Char('q') | KeyCode::Char('Q') => self.state.should_quit = true,
            KeyCode::Char('j') | KeyCode::Down => self.state.move_menu_cursor(1),
            KeyCode::Char('k') | KeyCode::Up => self.state.move_menu_cursor(-1),
            KeyCode::Char(ch @ '1'..='8') => {
                self.state.menu_cursor = (ch as usize) - ('1' as usize);
                self.activate_menu_item();
            }
            KeyCode::Enter => self.activate_menu_item(),
            _ => {}
        }
        Ok(())
    }

    fn activate_menu_item(&mut self) {
        self.state.list_cursor = 0;
        match self.state.menu_cursor {
            0 => {
                self.screen = Screen::Board;
                self.state.set_status("Flight status board");
            }
            1 => self.prompt = Some(InputPrompt::new(PromptKind::Search)),
            2 => {
                self.state.book_step = BookStep::Flight;
                self.screen = Screen::Book;
                if self.session.registry().list_bookable().next().is_none() {
                    self.state
                        .set_status("No flights available for booking at the moment");
                } else {
                    self.state.set_status("Select a flight to book");
                }
            }
            3 => {
                self.screen = Screen::Cancel;
                let empty = self
                    .session
                    .current_user()
                    .map(|user| user.bookings().is_empty())
                    .unwrap_or(true);
                if empty {
                    self.state.set_status("No bookings to cancel");
                } else {
                    self.state.set_status("Select a booking to cancel");
                }
            }
            4 => {
                self.screen = Screen::Details;
                self.state.set_status("Your details");
            }
            5 => {
                self.screen = Screen::Boarding;
                self.state.set_status("Boarding users");
            }
            6 => {
                self.session.logout();
                self.screen = Screen::Login;
                self.prompt = Some(InputPrompt::new(PromptKind::Email));
                self.state.set_status("Logged out");
            }
            _ => self.state.should_quit = true,
        }
    }

    fn handle_view_key(&mut self, key: KeyEvent) -> Result<()> {
        if matches!(key.code, KeyCode::Esc | KeyCode::Char('q') | KeyCode::Enter) {
            self.open_menu("Main menu");
        }
        Ok(())
    }

    fn handle_book_key(&mut self, key: KeyEvent) -> Result<()> {
        match self.state.book_step.clone() {
            BookStep::Flight => {
                let total = self.session.registry().list_bookable().count();
                match key.code {
                    KeyCode::Esc | KeyCode::Char('q') => self.open_menu("Booking cancelled"),
                    KeyCode::Char('j') | KeyCode::Down => self.state.move_list_cursor(1, total),
                    KeyCode::Char('k') | KeyCode::Up => self.state.move_list_cursor(-1, total),
                    KeyCode::Enter => {
                        let selected = self
                            .session
                            .registry()
                            .list_bookable()
                            .nth(self.state.list_cursor)
                            .map(|flight| flight.flight_number.clone());
                        if let Some(flight_number) = selected {
                            self.state.book_step = BookStep::Class {
                                flight_number: flight_number.clone(),
                            };
                            self.state.list_cursor = 0;
                            self.state
                                .set_status(format!("Choose a ticket class for {flight_number}"));
                        }
                    }
                    _ => {}
                }
            }
            BookStep::Class { flight_number } => match key.code {
                KeyCode::Esc => {
                    self.state.book_step = BookStep::Flight;
                    self.state.list_cursor = 0;
                    self.state.set_status("Select a flight to book");
                }
                KeyCode::Char('j') | KeyCode::Down => {
                    self.state.move_list_cursor(1, FareClass::ALL.len())
                }
                KeyCode::Char('k') | KeyCode::Up => {
                    self.state.move_list_cursor(-1, FareClass::ALL.len())
                }
                KeyCode::Enter => {
                    let class = FareClass::ALL[self.state.list_cursor.min(FareClass::ALL.len() - 1)];
                    match self.session.book(&flight_number, class.name()) {
                        Ok(flight) => {
                            info!(flight = %flight.flight_number, %class, "Booked from UI");
                            self.state.book_step = BookStep::Flight;
                            self.open_menu(format!(
                                "✔ Booked {class} ticket for flight {} to {} at {}",
                                flight.flight_number,
                                flight.destination,
                                flight.time_label()
                            ));
                        }
                        Err(err) => {
                            warn!(%flight_number, %class, "Booking rejected: {err}");
                            self.state.set_status(format!("✘ {err}"));
                        }
                    }
                }
                _ => {}
            },
        }
        Ok(())
    }

    fn handle_cancel_key(&mut self, key: KeyEvent) -> Result<()> {
        let total = self
            .session
            .current_user()
            .map(|user| user.bookings().len())
            .unwrap_or(0);
        match key.code {
            KeyCode::Esc | KeyCode::Char('q') => self.open_menu("Main menu"),
            KeyCode::Char('j') | KeyCode::Down => self.state.move_list_cursor(1, total),
            KeyCode::Char('k') | KeyCode::Up => self.state.move_list_cursor(-1, total),
            KeyCode::Enter => match self.session.cancel(self.state.list_cursor) {
                Ok(removed) => {
                    self.state.list_cursor = self.state.list_cursor.min(total.saturating_sub(2));
                    self.state
                        .set_status(format!("✘ Booking for flight {removed} cancelled"));
                }
                Err(err) => self.state.set_status(format!("⚠ {err}")),
            },
            _ => {}
        }
        Ok(())
    }

    fn draw(&mut self, frame: &mut Frame) {
        let area = frame.size();
        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .constraints([
                Constraint::Length(3),
                Constraint::Min(5),
                Constraint::Length(3),
            ])
            .split(area);

        self.render_header(frame, chunks[0]);
        match self.screen {
            Screen::Login => self.render_login(frame, chunks[1]),
            Screen::Menu => self.render_menu(frame, chunks[1]),
            Screen::Board => self.render_board(frame, chunks[1]),
            Screen::Search => self.render_search(frame, chunks[1]),
            Screen::Book => self.render_book(frame, chunks[1]),
            Screen::Cancel => self.render_cancel(frame, chunks[1]),
            Screen::Details => self.render_details(frame, chunks[1]),
            Screen::Boarding => self.render_boarding(frame, chunks[1]),
        }
        self.render_status(frame, chunks[2]);

        if let Some(prompt) = &self.prompt {
            self.render_prompt(frame, prompt);
        }
    }

    fn render_header(&self, frame: &mut Frame, area: Rect) {
        let user = self
            .session
            .current_user()
            .map(|user| format!("{} <{}>", user.name, user.email))
            .unwrap_or_else(|| "not logged in".to_string());
        let line = Line::from(vec![
            Span::styled(
                "✈ AEROLINES SYSTEM ✈",
                Style::default()
                    .fg(self.theme.accent)
                    .add_modifier(Modifier::BOLD),
            ),
            Span::raw("   "),
            Span::styled(user, Style::default().fg(self.theme.muted)),
        ]);
        let header = Paragraph::new(line)
            .block(Block::default().borders(Borders::ALL))
            .alignment(Alignment::Center);
        frame.render_widget(header, area);
    }

    fn render_login(&self, frame: &mut Frame, area: Rect) {
        let lines = vec![
            Line::from("Welcome to Aerolines."),
            Line::from(""),
            Line::from(Span::styled(
                format!(
                    "Log in with your @{} address. New addresses are registered automatically.",
                    self.session.email_domain()
                ),
                Style::default().fg(self.theme.muted),
            )),
        ];
        let paragraph = Paragraph::new(lines)
            .block(Block::default().borders(Borders::ALL).title("Login"))
            .alignment(Alignment::Center)
            .wrap(Wrap { trim: true });
        frame.render_widget(paragraph, area);
    }

    fn render_menu(&self, frame: &mut Frame, area: Rect) {
        let menu_height = (MENU_ITEMS.len() as u16 + 2).min(area.height);
        let menu_width = 34.min(area.width.max(1));
        let menu_area = centered_rect(menu_width, menu_height, area);

        let lines: Vec<Line> = MENU_ITEMS
            .iter()
            .enumerate()
            .map(|(idx, item)| {
                if idx == self.state.menu_cursor {
                    Line::from(Span::styled(
                        format!("▶ {}. {item}", idx + 1),
                        Style::default()
                            .fg(self.theme.accent)
                            .add_modifier(Modifier::BOLD),
                    ))
                } else {
                    Line::from(Span::styled(
                        format!("  {}. {item}", idx + 1),
                        Style::default().fg(self.theme.primary_fg),
                    ))
                }
            })
            .collect();

        let menu = Paragraph::new(lines).block(Block::default().borders(Borders::ALL).title("Menu"));
        frame.render_widget(menu, menu_area);
    }

    fn render_board(&self, frame: &mut Frame, area: Rect) {
        let header = Row::new(["DATE", "FLIGHT", "AIRLINE", "TO/FROM", "TIME", "GATE", "STATUS"])
            .style(
                Style::default()
                    .fg(self.theme.accent)
                    .add_modifier(Modifier::BOLD),
            );
        let rows: Vec<Row> = self
            .session
            .registry()
            .flights()
            .iter()
            .map(|flight| {
                Row::new(vec![
                    Cell::from(flight.date_label()),
                    Cell::from(flight.flight_number.clone()),
                    Cell::from(flight.airline.clone()),
                    Cell::from(format!("{} {}", flight.direction.label(), flight.destination)),
                    Cell::from(flight.time_label()),
                    Cell::from(flight.gate.clone()),
                    Cell::from(Span::styled(
                        flight.status.label(),
                        Style::default().fg(self.theme.status_color(flight.status)),
                    )),
                ])
            })
            .collect();
        let widths = [
            Constraint::Length(10),
            Constraint::Length(6),
            Constraint::Length(11),
            Constraint::Length(14),
            Constraint::Length(5),
            Constraint::Length(4),
            Constraint::Length(10),
        ];
        let table = Table::new(rows, widths)
            .header(header)
            .column_spacing(2)
            .block(
                Block::default()
                    .borders(Borders::ALL)
                    .title("Flight Status (Esc to return)"),
            );
        frame.render_widget(table, area);
    }

    fn render_search(&self, frame: &mut Frame, area: Rect) {
        let lines = match &self.state.search_result {
            Some(SearchResult::Found(flight)) => self.flight_detail_lines(flight),
            Some(SearchResult::Missing(query)) => vec![Line::from(Span::styled(
                format!("✘ Flight {query} not found."),
                Style::default().fg(self.theme.danger),
            ))],
            None => vec![Line::from("No search yet.")],
        };
        let paragraph = Paragraph::new(lines)
            .block(
                Block::default()
                    .borders(Borders::ALL)
                    .title("Search Result (Esc to return)"),
            )
            .wrap(Wrap { trim: true });
        frame.render_widget(paragraph, area);
    }

    fn flight_detail_lines(&self, flight: &Flight) -> Vec<Line<'static>> {
        let label = |name: &str| {
            Span::styled(
                format!("{name:<12}"),
                Style::default().add_modifier(Modifier::BOLD),
            )
        };
        let mut lines = vec![
            Line::from(vec![label("Date"), Span::raw(flight.date_label())]),
            Line::from(vec![label("Flight"), Span::raw(flight.flight_number.clone())]),
            Line::from(vec![label("Airline"), Span::raw(flight.airline.clone())]),
            Line::from(vec![
                label(match flight.direction {
                    FlightDirection::Departure => "Destination",
                    FlightDirection::Arrival => "Origin",
                }),
                Span::raw(flight.destination.clone()),
            ]),
            Line::from(vec![label("Time"), Span::raw(flight.time_label())]),
            Line::from(vec![label("Gate"), Span::raw(flight.gate.clone())]),
            Line::from(vec![
                label("Status"),
                Span::styled(
                    flight.status.label(),
                    Style::default().fg(self.theme.status_color(flight.status)),
                ),
            ]),
            Line::from(""),
        ];
        for (class, remaining) in flight.seats().iter() {
            lines.push(Line::from(vec![
                label(class.name()),
                Span::raw(format!("{remaining} seats")),
            ]));
        }
        lines
    }

    fn render_book(&self, frame: &mut Frame, area: Rect) {
        match &self.state.book_step {
            BookStep::Flight => {
                let flights: Vec<&Flight> = self.session.registry().list_bookable().collect();
                let items: Vec<ListItem> = flights
                    .iter()
                    .map(|flight| {
                        ListItem::new(Line::from(vec![
                            Span::styled(
                                flight.flight_number.clone(),
                                Style::default().add_modifier(Modifier::BOLD),
                            ),
                            Span::raw(format!(
                                " to {} at {} ",
                                flight.destination,
                                flight.time_label()
                            )),
                            Span::styled(
                                format!("({})", flight.status),
                                Style::default().fg(self.theme.status_color(flight.status)),
                            ),
                        ]))
                    })
                    .collect();
                self.render_selection(frame, area, items, "Available Flights for Booking");
            }
            BookStep::Class { flight_number } => {
                let Some(flight) = self.session.registry().find_by_number(flight_number) else {
                    return;
                };
                let items: Vec<ListItem> = flight
                    .seats()
                    .iter()
                    .map(|(class, remaining)| {
                        let style = if remaining == 0 {
                            Style::default().fg(self.theme.muted)
                        } else {
                            Style::default().fg(self.theme.primary_fg)
                        };
                        ListItem::new(Line::from(Span::styled(
                            format!("{:<12}{remaining:>4} available", class.name()),
                            style,
                        )))
                    })
                    .collect();
                let title = format!(
                    "Ticket class for {} to {} at {}",
                    flight.flight_number,
                    flight.destination,
                    flight.time_label()
                );
                self.render_selection(frame, area, items, &title);
            }
        }
    }

    fn render_cancel(&self, frame: &mut Frame, area: Rect) {
        let items: Vec<ListItem> = self
            .session
            .current_user()
            .map(|user| {
                user.bookings()
                    .iter()
                    .enumerate()
                    .map(|(idx, flight_number)| {
                        ListItem::new(Line::from(format!("{}. {flight_number}", idx + 1)))
                    })
                    .collect()
            })
            .unwrap_or_default();
        self.render_selection(frame, area, items, "Your Bookings (Enter to cancel)");
    }

    fn render_selection(&self, frame: &mut Frame, area: Rect, items: Vec<ListItem>, title: &str) {
        let mut list_state = ListState::default();
        if !items.is_empty() {
            list_state.select(Some(self.state.list_cursor.min(items.len() - 1)));
        }
        let list = List::new(items)
            .block(Block::default().borders(Borders::ALL).title(title.to_string()))
            .highlight_symbol("▶ ")
            .highlight_style(
                Style::default()
                    .bg(self.theme.selection_bg)
                    .add_modifier(Modifier::BOLD),
            );
        frame.render_stateful_widget(list, area, &mut list_state);
    }

    fn render_details(&self, frame: &mut Frame, area: Rect) {
        let mut lines = Vec::new();
        if let Some(user) = self.session.current_user() {
            lines.push(Line::from(format!("Name:  {}", user.name)));
            lines.push(Line::from(format!("Email: {}", user.email)));
            lines.push(Line::from(""));
            if user.bookings().is_empty() {
                lines.push(Line::from("Booked Flights: None"));
            } else {
                lines.push(Line::from("Booked Flights:"));
                for (flight_number, flight) in describe_bookings(user, self.session.registry()) {
                    let line = match flight {
                        Some(flight) => Line::from(format!(
                            "- {} to {} at {}",
                            flight.flight_number,
                            flight.destination,
                            flight.time_label()
                        )),
                        None => Line::from(Span::styled(
                            format!("- {flight_number} (Not Found)"),
                            Style::default().fg(self.theme.muted),
                        )),
                    };
                    lines.push(line);
                }
            }
        }
        let paragraph = Paragraph::new(lines)
            .block(
                Block::default()
                    .borders(Borders::ALL)
                    .title("User Details (Esc to return)"),
            )
            .wrap(Wrap { trim: true });
        frame.render_widget(paragraph, area);
    }

    fn render_boarding(&self, frame: &mut Frame, area: Rect) {
        let items: Vec<ListItem> = boarding_users(self.session.users(), self.session.registry())
            .map(|(user, flight)| {
                ListItem::new(Line::from(format!(
                    "- {} ({}) → {} to {} at {}",
                    user.name,
                    user.email,
                    flight.flight_number,
                    flight.destination,
                    flight.time_label()
                )))
            })
            .collect();
        let list = List::new(items).block(
            Block::default()
                .borders(Borders::ALL)
                .title("Boarding Users (Esc to return)"),
        );
        frame.render_widget(list, area);
    }

    fn render_status(&self, frame: &mut Frame, area: Rect) {
        let seat_policy = if self.session.restores_seats_on_cancel() {
            "seats restored on cancel"
        } else {
            "seats kept on cancel"
        };
        let line = Line::from(vec![
            Span::raw(self.state.status.clone()),
            Span::styled(
                format!("   ({seat_policy})"),
                Style::default().fg(self.theme.muted),
            ),
        ]);
        let paragraph = Paragraph::new(line)
            .block(Block::default().borders(Borders::ALL).title("Status"))
            .wrap(Wrap { trim: true });
        frame.render_widget(paragraph, area);
    }

    fn render_prompt(&self, frame: &mut Frame, prompt: &InputPrompt) {
        let frame_area = frame.size();
        let mut width = cmp::min(64_u16, frame_area.width.saturating_sub(4));
        width = cmp::max(width, 24_u16);
        let height = 6_u16.min(frame_area.height.saturating_sub(2)).max(5_u16);
        let area = centered_rect(width, height, frame_area);

        frame.render_widget(Clear, area);

        let input_line = Line::from(vec![
            Span::styled("> ", Style::default().fg(self.theme.accent)),
            Span::raw(prompt.input.clone()),
        ]);
        let helper = Line::from(vec![
            Span::styled("Enter", Style::default().add_modifier(Modifier::BOLD)),
            Span::raw(" submit  "),
            Span::styled("Esc", Style::default().add_modifier(Modifier::BOLD)),
            Span::raw(if prompt.kind == PromptKind::Email {
                " quit"
            } else {
                " cancel"
            }),
        ]);

        let paragraph = Paragraph::new(vec![
            Line::from(prompt.instruction(self.session.email_domain())),
            input_line,
            Line::from(""),
            helper,
        ])
        .block(Block::default().borders(Borders::ALL).title(prompt.title()));
        frame.render_widget(paragraph, area);

        // Unwrapped, so the input always sits on the second inner row.
        let cursor_x = area
            .x
            .saturating_add(3)
            .saturating_add(prompt.cursor_column())
            .min(area.x + area.width.saturating_sub(2));
        let cursor_y = area.y + 2;
        frame.set_cursor(cursor_x, cursor_y);
    }
}

fn centered_rect(width: u16, height: u16, area: Rect) -> Rect {
    let width = width.min(area.width);
    let height = height.min(area.height);
    Rect::new(
        area.x + (area.width - width) / 2,
        area.y + (area.height - height) / 2,
        width,
        height,
    )
}

fn restore_terminal(terminal: &mut Terminal<CrosstermBackend<io::Stdout>>) -> Result<()> {
    disable_raw_mode().context("failed to disable raw mode")?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)
        .context("failed to leave alternate screen")?;
    terminal.show_cursor()?;
    Ok(())
}

fn spawn_input_thread(sender: mpsc::Sender<AppEvent>) {
    thread::spawn(move || loop {
        match event::poll(TICK_RATE) {
            Ok(true) => match event::read() {
                Ok(evt) => {
                    if sender.blocking_send(AppEvent::Input(evt)).is_err() {
                        break;
                    }
                }
                Err(_) => break,
            },
            Ok(false) => {
                if sender.blocking_send(AppEvent::Tick).is_err() {
                    break;
                }
            }
            Err(_) => break,
        }
    });
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn prompt_edits_at_cursor() {
        let mut prompt = InputPrompt::new(PromptKind::Search);
        for ch in "fl10".chars() {
            prompt.insert(ch);
        }
        prompt.move_cursor(-1);
        prompt.insert('1');
        assert_eq!(prompt.input, "fl110");
        prompt.move_home();
        prompt.delete();
        assert_eq!(prompt.input, "l110");
        prompt.move_end();
        prompt.backspace();
        assert_eq!(prompt.input, "l11");
        prompt.move_cursor(10);
        assert_eq!(prompt.cursor, 3);
    }

    #[test]
    fn prompt_input_is_bounded() {
        let mut prompt = InputPrompt::new(PromptKind::Email);
        for _ in 0..(MAX_INPUT_LEN + 10) {
            prompt.insert('a');
        }
        assert_eq!(prompt.input.len(), MAX_INPUT_LEN);
    }

    #[test]
    fn cursor_steps_are_clamped() {
        assert_eq!(step(0, -1, 5), 0);
        assert_eq!(step(4, 1, 5), 4);
        assert_eq!(step(2, 1, 5), 3);
        assert_eq!(step(3, 1, 0), 0);

        let mut state = UiState::default();
        state.move_menu_cursor(20);
        assert_eq!(state.menu_cursor, MENU_ITEMS.len() - 1);
    }

    #[test]
    fn cursor_column_counts_display_width() {
        let mut prompt = InputPrompt::new(PromptKind::Search);
        for ch in "日本fl".chars() {
            prompt.insert(ch);
        }
        assert_eq!(prompt.cursor_column(), 6);
        prompt.move_cursor(-2);
        assert_eq!(prompt.cursor, 2);
        assert_eq!(prompt.cursor_column(), 4);
        prompt.move_home();
        assert_eq!(prompt.cursor_column(), 0);
    }
}
