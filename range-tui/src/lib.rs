use anyhow::Result;
use chrono::{Datelike, Days, NaiveDate};
use crossterm::{
    event::{
        self, DisableMouseCapture, EnableMouseCapture, Event, KeyCode, KeyEvent, KeyEventKind,
        MouseButton, MouseEvent, MouseEventKind,
    },
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use range_core::{CalendarDay, DateRangePicker, DisplayMonth, WEEKDAY_LABELS};
use range_table::users::{fetch_users_by_range, user_rows, User};
use range_table::{DataTable, RowKey, SortDirection, EMPTY_TABLE_TEXT};
use ratatui::{
    layout::{Constraint, Direction, Layout, Position},
    prelude::*,
    style::{Color, Modifier, Style},
    widgets::{Block, Borders, Cell, Clear, Paragraph, Row, Table, TableState},
};
use std::{io, time::{Duration, Instant}};
use tracing::debug;

// Day cells are three columns wide plus one column of spacing.
const DAY_CELL_WIDTH: u16 = 3;
const DAY_CELL_STRIDE: u16 = DAY_CELL_WIDTH + 1;
const PANEL_WIDTH: u16 = 7 * DAY_CELL_STRIDE + 1;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputMode {
    Normal,
    Search,
}

/// Screen regions from the last draw, used to route mouse presses.
#[derive(Debug, Clone, Copy, Default)]
struct Screen {
    trigger: Rect,
    panel: Option<Rect>,
    grid: Option<Rect>,
}

pub struct App {
    picker: DateRangePicker,
    table: DataTable,
    users: Vec<User>,
    cursor: usize,
    focused_column: usize,
    selected_row: Option<RowKey>,
    input_mode: InputMode,
    screen: Screen,
}

impl App {
    pub fn new(picker: DateRangePicker, table: DataTable, users: Vec<User>) -> Self {
        let mut app = Self {
            picker,
            table,
            users,
            cursor: 0,
            focused_column: 0,
            selected_row: None,
            input_mode: InputMode::Normal,
            screen: Screen::default(),
        };
        app.refresh_rows();
        app
    }

    pub fn picker(&self) -> &DateRangePicker {
        &self.picker
    }

    pub fn table(&self) -> &DataTable {
        &self.table
    }

    pub fn input_mode(&self) -> InputMode {
        self.input_mode
    }

    pub fn selected_row(&self) -> Option<RowKey> {
        self.selected_row
    }

    /// Moves the row cursor through the visible rows, keeping it on the same
    /// row when a sort or search reorders them.
    fn move_row(&mut self, delta: isize) {
        let visible: Vec<RowKey> = self.table.visible_rows().iter().map(|row| row.key).collect();
        if visible.is_empty() {
            self.selected_row = None;
            return;
        }
        let next = match self.selected_row.and_then(|key| self.table.visible_position(key)) {
            Some(index) => index.saturating_add_signed(delta).min(visible.len() - 1),
            None => 0,
        };
        self.selected_row = Some(visible[next]);
    }

    /// Re-runs the user lookup for the committed range.
    fn refresh_rows(&mut self) {
        let zone = self.picker.config().timezone.clone();
        let users = fetch_users_by_range(&self.users, &self.picker.committed(), &zone);
        debug!(count = users.len(), "table rows refreshed");
        self.table.set_rows(user_rows(&users));
        self.selected_row = None;
    }

    fn cursor_day(&self) -> Option<CalendarDay> {
        self.picker.calendar_days().get(self.cursor).copied()
    }

    fn place_cursor(&mut self, date: NaiveDate) -> bool {
        match self
            .picker
            .calendar_days()
            .iter()
            .position(|d| d.date == date && d.is_current_month)
        {
            Some(index) => {
                self.cursor = index;
                true
            }
            None => false,
        }
    }

    fn reset_cursor(&mut self) {
        let month = self.picker.display_month();
        let candidates = [self.picker.selection().from(), Some(self.picker.today())];
        for date in candidates.into_iter().flatten() {
            if DisplayMonth::containing(date) == month && self.place_cursor(date) {
                return;
            }
        }
        self.place_cursor(month.first_day());
    }

    /// Moves the cursor by whole days, following it into adjacent months.
    fn move_cursor(&mut self, delta: i64) {
        let Some(current) = self.cursor_day() else {
            return;
        };
        let days = Days::new(delta.unsigned_abs());
        let target = if delta >= 0 {
            current.date.checked_add_days(days)
        } else {
            current.date.checked_sub_days(days)
        };
        let Some(target) = target else {
            return;
        };
        let month = self.picker.display_month();
        let months_apart = (target.year() - month.year()) * 12 + target.month() as i32 - month.month() as i32;
        if months_apart != 0 {
            self.picker.navigate_month(months_apart);
        }
        self.place_cursor(target);
    }

    fn navigate(&mut self, delta: i32) {
        self.picker.navigate_month(delta);
        self.place_cursor(self.picker.display_month().first_day());
    }

    fn open_picker(&mut self) {
        self.picker.open();
        self.reset_cursor();
    }

    fn apply(&mut self) {
        if self.picker.apply().is_some() {
            self.refresh_rows();
        }
    }

    fn select(&mut self, day: CalendarDay) {
        self.picker.select_day(&day);
    }

    /// Returns `true` when the app should quit.
    pub fn handle_key(&mut self, key: KeyEvent) -> bool {
        if key.kind != KeyEventKind::Press {
            return false;
        }
        if self.picker.is_open() {
            self.handle_picker_key(key.code);
            return false;
        }
        match self.input_mode {
            InputMode::Search => {
                self.handle_search_key(key.code);
                false
            }
            InputMode::Normal => self.handle_table_key(key.code),
        }
    }

    fn handle_picker_key(&mut self, code: KeyCode) {
        match code {
            KeyCode::Left => self.move_cursor(-1),
            KeyCode::Right => self.move_cursor(1),
            KeyCode::Up => self.move_cursor(-7),
            KeyCode::Down => self.move_cursor(7),
            KeyCode::PageUp | KeyCode::Char('[') => self.navigate(-1),
            KeyCode::PageDown | KeyCode::Char(']') => self.navigate(1),
            KeyCode::Char(' ') => {
                if let Some(day) = self.cursor_day() {
                    self.select(day);
                }
            }
            KeyCode::Enter => self.apply(),
            KeyCode::Esc | KeyCode::Char('d') => self.picker.cancel(),
            _ => {}
        }
    }

    fn handle_search_key(&mut self, code: KeyCode) {
        match code {
            KeyCode::Enter => {
                self.table.submit_search();
                self.input_mode = InputMode::Normal;
            }
            KeyCode::Esc => self.input_mode = InputMode::Normal,
            KeyCode::Backspace => self.table.pop_search_char(),
            KeyCode::Char(c) => self.table.push_search_char(c),
            _ => {}
        }
    }

    fn handle_table_key(&mut self, code: KeyCode) -> bool {
        let column_count = self.table.columns().len();
        match code {
            KeyCode::Char('q') => return true,
            KeyCode::Char('d') => self.open_picker(),
            KeyCode::Left if self.focused_column > 0 => self.focused_column -= 1,
            KeyCode::Right if self.focused_column + 1 < column_count => self.focused_column += 1,
            KeyCode::Up | KeyCode::Char('k') => self.move_row(-1),
            KeyCode::Down | KeyCode::Char('j') => self.move_row(1),
            KeyCode::Char('s') => {
                if let Some(key) = self.focused_key() {
                    self.table.handle_sort(&key);
                }
            }
            KeyCode::Char('c') => {
                if let Some(key) = self.focused_key() {
                    self.table.set_search_column(&key);
                }
            }
            KeyCode::Char('/') => self.input_mode = InputMode::Search,
            KeyCode::Char('x') => self.table.clear_search(),
            _ => {}
        }
        false
    }

    fn focused_key(&self) -> Option<String> {
        self.table.columns().get(self.focused_column).map(|c| c.key.clone())
    }

    pub fn handle_mouse(&mut self, mouse: MouseEvent) {
        if mouse.kind != MouseEventKind::Down(MouseButton::Left) {
            return;
        }
        let at = Position::new(mouse.column, mouse.row);
        if self.screen.trigger.contains(at) {
            if self.picker.is_open() {
                self.picker.cancel();
            } else {
                self.open_picker();
            }
            return;
        }
        if !self.picker.is_open() {
            return;
        }
        match self.screen.panel {
            Some(panel) if panel.contains(at) => {
                if let Some(index) = self.screen.grid.and_then(|grid| grid_index(grid, at)) {
                    if let Some(day) = self.picker.calendar_days().get(index).copied() {
                        self.cursor = index;
                        self.select(day);
                    }
                }
            }
            _ => self.picker.outside_interaction(),
        }
    }
}

/// Cell index under `at` inside the grid area (header row excluded).
fn grid_index(grid: Rect, at: Position) -> Option<usize> {
    if !grid.contains(at) || at.y == grid.y {
        return None;
    }
    let column = (at.x - grid.x) / DAY_CELL_STRIDE;
    if (at.x - grid.x) % DAY_CELL_STRIDE >= DAY_CELL_WIDTH || column >= 7 {
        return None;
    }
    let row = at.y - grid.y - 1;
    Some(usize::from(row) * 7 + usize::from(column))
}

pub fn run(app: App) -> Result<()> {
    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen, EnableMouseCapture)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let res = run_app(&mut terminal, app);

    disable_raw_mode()?;
    execute!(
        terminal.backend_mut(),
        LeaveAlternateScreen,
        DisableMouseCapture
    )?;
    terminal.show_cursor()?;

    res
}

fn run_app<B: Backend>(terminal: &mut Terminal<B>, mut app: App) -> Result<()> {
    let mut last_tick = Instant::now();
    let tick_rate = Duration::from_millis(250);

    loop {
        terminal.draw(|f| ui(f, &mut app))?;

        let timeout = tick_rate
            .checked_sub(last_tick.elapsed())
            .unwrap_or_else(|| Duration::from_secs(0));

        if crossterm::event::poll(timeout)? {
            match event::read()? {
                Event::Key(key) => {
                    if app.handle_key(key) {
                        return Ok(());
                    }
                }
                Event::Mouse(mouse) => app.handle_mouse(mouse),
                _ => {}
            }
        }

        if last_tick.elapsed() >= tick_rate {
            last_tick = Instant::now();
        }
    }
}

fn day_style(app: &App, day: &CalendarDay, index: usize) -> Style {
    let state = app.picker.day_state(day.date);
    let mut style = if !day.is_current_month || day.is_disabled {
        Style::default().fg(Color::DarkGray)
    } else {
        Style::default()
    };
    if day.is_disabled && day.is_current_month {
        style = style.add_modifier(Modifier::CROSSED_OUT);
    }
    if day.is_current_month && state.is_in_range {
        style = style.bg(Color::LightBlue).fg(Color::Black);
    }
    if day.is_current_month && state.is_selected {
        style = style.bg(Color::Blue).fg(Color::White).add_modifier(Modifier::BOLD);
    }
    if day.date == app.picker.today() {
        style = style.add_modifier(Modifier::UNDERLINED);
    }
    if index == app.cursor {
        style = style.add_modifier(Modifier::REVERSED);
    }
    style
}

fn render_panel(f: &mut Frame, app: &mut App, anchor: Rect) {
    let days = app.picker.calendar_days();
    let weeks = (days.len() / 7) as u16;
    let height = weeks + 5;
    let panel = Rect::new(anchor.x, anchor.y + anchor.height, PANEL_WIDTH, height).intersection(f.area());

    let block = Block::default().borders(Borders::ALL);
    let inner = block.inner(panel);
    f.render_widget(Clear, panel);
    f.render_widget(block, panel);

    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(1),
            Constraint::Length(weeks + 1),
            Constraint::Length(1),
        ])
        .split(inner);

    let title = Paragraph::new(format!("‹  {}  ›", app.picker.month_label()))
        .style(Style::default().add_modifier(Modifier::BOLD))
        .alignment(Alignment::Center);
    f.render_widget(title, chunks[0]);

    let header = Row::new(WEEKDAY_LABELS.iter().map(|h| Cell::from(*h).style(Style::default().fg(Color::Gray))))
        .height(1);
    let rows: Vec<Row> = days
        .chunks(7)
        .enumerate()
        .map(|(week, cells)| {
            Row::new(cells.iter().enumerate().map(|(weekday, day)| {
                let index = week * 7 + weekday;
                Cell::from(format!("{:>2} ", day.day_of_month)).style(day_style(app, day, index))
            }))
        })
        .collect();
    let grid = Table::new(rows, [Constraint::Length(DAY_CELL_WIDTH); 7])
        .header(header)
        .column_spacing(1);
    f.render_widget(grid, chunks[1]);

    let apply_style = if app.picker.can_apply() {
        Style::default().fg(Color::Blue).add_modifier(Modifier::BOLD)
    } else {
        Style::default().fg(Color::DarkGray)
    };
    let footer = Line::from(vec![
        Span::raw("[Esc] Cancel  "),
        Span::styled("[Enter] Apply", apply_style),
    ]);
    f.render_widget(Paragraph::new(footer).alignment(Alignment::Right), chunks[2]);

    app.screen.panel = Some(panel);
    app.screen.grid = Some(chunks[1]);
}

fn create_user_table(app: &App) -> Table<'static> {
    let header_cells = app.table.columns().iter().enumerate().map(|(i, column)| {
        let arrow = match app.table.sort_indicator(column) {
            Some(SortDirection::Ascending) => " ↓",
            Some(SortDirection::Descending) => " ↑",
            None => "",
        };
        let mut style = Style::default().add_modifier(Modifier::BOLD);
        if i == app.focused_column {
            style = style.add_modifier(Modifier::UNDERLINED);
        }
        Cell::from(format!("{}{}", column.header, arrow)).style(style)
    });
    let header = Row::new(header_cells).height(1);

    let rows: Vec<Row> = app
        .table
        .visible_rows()
        .into_iter()
        .map(|row| {
            Row::new(app.table.columns().iter().map(|column| Cell::from(app.table.cell_text(row, column))))
        })
        .collect();

    let widths = vec![Constraint::Ratio(1, app.table.columns().len().max(1) as u32); app.table.columns().len()];
    Table::new(rows, widths)
        .header(header)
        .row_highlight_style(Style::default().add_modifier(Modifier::REVERSED))
        .block(Block::default().borders(Borders::ALL).title("Data Table"))
        .column_spacing(1)
}

fn ui(f: &mut Frame, app: &mut App) {
    let area = f.area();

    let main_chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3),
            Constraint::Min(5),
            Constraint::Length(1),
        ])
        .split(area);

    let header_layout = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Percentage(50),
            Constraint::Percentage(50),
        ])
        .split(main_chunks[0]);

    let trigger = Paragraph::new(format!("▦ {}", app.picker.display_text()))
        .style(Style::default().add_modifier(Modifier::BOLD))
        .block(Block::default().borders(Borders::ALL).title("Registered"));
    f.render_widget(trigger, header_layout[0]);
    app.screen.trigger = header_layout[0];

    let search_column = app
        .table
        .search_column()
        .and_then(|key| app.table.columns().iter().find(|c| c.key == key))
        .map(|c| c.header.clone())
        .unwrap_or_else(|| "No columns".to_string());
    let search_text = match (app.input_mode, app.table.active_search()) {
        (InputMode::Search, _) => format!("{}▏", app.table.search_draft()),
        (InputMode::Normal, "") => "Type and enter to search".to_string(),
        (InputMode::Normal, active) => format!("[{active}] (x to clear)"),
    };
    let search = Paragraph::new(search_text)
        .block(Block::default().borders(Borders::ALL).title(format!("Search: {search_column}")));
    f.render_widget(search, header_layout[1]);

    if app.table.visible_rows().is_empty() {
        let empty = Paragraph::new(EMPTY_TABLE_TEXT)
            .alignment(Alignment::Center)
            .block(Block::default().borders(Borders::ALL).title("Data Table"));
        f.render_widget(empty, main_chunks[1]);
    } else {
        let mut state = TableState::default()
            .with_selected(app.selected_row.and_then(|key| app.table.visible_position(key)));
        f.render_stateful_widget(create_user_table(app), main_chunks[1], &mut state);
    }

    let help = if app.picker.is_open() {
        "←↑↓→ move  space pick  [ ] month  enter apply  esc cancel"
    } else {
        "d dates  ←→ column  ↑↓ row  s sort  c search column  / search  x clear  q quit"
    };
    f.render_widget(Paragraph::new(help).style(Style::default().fg(Color::Gray)), main_chunks[2]);

    app.screen.panel = None;
    app.screen.grid = None;
    if app.picker.is_open() {
        render_panel(f, app, header_layout[0]);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{DateTime, Utc};
    use crossterm::event::KeyModifiers;
    use range_core::{DateRange, FixedClock, PickerConfig};
    use range_table::users::{sample_users, user_columns};
    use ratatui::backend::TestBackend;

    fn utc(s: &str) -> DateTime<Utc> {
        DateTime::parse_from_rfc3339(s).unwrap().with_timezone(&Utc)
    }

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn app() -> App {
        let picker = DateRangePicker::with_clock(
            PickerConfig::default(),
            DateRange::empty(),
            FixedClock(utc("2025-04-15T06:00:00Z")),
        );
        let table = DataTable::new(user_columns(), Vec::new()).with_initial_sort(Some("name"), SortDirection::Ascending);
        App::new(picker, table, sample_users())
    }

    fn press(app: &mut App, code: KeyCode) -> bool {
        app.handle_key(KeyEvent::new(code, KeyModifiers::NONE))
    }

    fn click(app: &mut App, column: u16, row: u16) {
        app.handle_mouse(MouseEvent {
            kind: MouseEventKind::Down(MouseButton::Left),
            column,
            row,
            modifiers: KeyModifiers::NONE,
        });
    }

    fn draw(app: &mut App) -> String {
        let mut terminal = Terminal::new(TestBackend::new(100, 30)).unwrap();
        terminal.draw(|f| ui(f, app)).unwrap();
        terminal.backend().buffer().content().iter().map(|c| c.symbol()).collect()
    }

    #[test]
    fn test_keyboard_range_selection_refreshes_rows() {
        let mut app = app();
        assert!(app.table().rows().is_empty());

        press(&mut app, KeyCode::Char('d'));
        assert!(app.picker().is_open());
        assert_eq!(app.cursor_day().unwrap().date, date(2025, 4, 15));

        for _ in 0..5 {
            press(&mut app, KeyCode::Left);
        }
        press(&mut app, KeyCode::Char(' '));
        press(&mut app, KeyCode::Right);
        press(&mut app, KeyCode::Char(' '));
        press(&mut app, KeyCode::Enter);

        assert!(!app.picker().is_open());
        assert_eq!(app.picker().display_text(), "Apr 10, 2025 - Apr 11, 2025");
        let names: Vec<String> = app.table().visible_rows().iter().map(|r| r.get("name").to_string()).collect();
        assert_eq!(names, vec!["Whitney Francis"]);
    }

    #[test]
    fn test_cursor_follows_into_previous_month() {
        let mut app = app();
        press(&mut app, KeyCode::Char('d'));
        for _ in 0..3 {
            press(&mut app, KeyCode::Up);
        }
        assert_eq!(app.picker().month_label(), "March 2025");
        assert_eq!(app.cursor_day().unwrap().date, date(2025, 3, 25));
    }

    #[test]
    fn test_escape_cancels_without_refresh() {
        let mut app = app();
        press(&mut app, KeyCode::Char('d'));
        press(&mut app, KeyCode::Char(' '));
        press(&mut app, KeyCode::Esc);
        assert!(!app.picker().is_open());
        assert!(app.picker().committed().is_empty());
        assert!(!press(&mut app, KeyCode::Char('x')));
        assert!(press(&mut app, KeyCode::Char('q')));
    }

    #[test]
    fn test_search_mode_typing() {
        let mut app = app();
        app.picker.set_value(DateRange::new(Some(utc("2024-01-01T00:00:00Z")), Some(utc("2025-12-31T00:00:00Z"))));
        app.refresh_rows();
        assert_eq!(app.table().visible_rows().len(), 6);

        press(&mut app, KeyCode::Char('/'));
        assert_eq!(app.input_mode(), InputMode::Search);
        for c in "tom".chars() {
            press(&mut app, KeyCode::Char(c));
        }
        press(&mut app, KeyCode::Enter);
        assert_eq!(app.input_mode(), InputMode::Normal);
        assert_eq!(app.table().visible_rows().len(), 1);

        press(&mut app, KeyCode::Char('x'));
        assert_eq!(app.table().visible_rows().len(), 6);
    }

    #[test]
    fn test_row_cursor_stays_on_row_through_sort() {
        let mut app = app();
        app.picker.set_value(DateRange::new(Some(utc("2024-01-01T00:00:00Z")), Some(utc("2025-12-31T00:00:00Z"))));
        app.refresh_rows();

        press(&mut app, KeyCode::Down);
        press(&mut app, KeyCode::Down);
        let key = app.selected_row().unwrap();
        assert_eq!(app.table().row(key).unwrap().get("name").to_string(), "Floyd Miles");

        press(&mut app, KeyCode::Char('s'));
        assert_eq!(app.selected_row(), Some(key));
        assert_eq!(app.table().visible_position(key), Some(4));

        press(&mut app, KeyCode::Up);
        let above = app.selected_row().unwrap();
        assert_eq!(app.table().row(above).unwrap().get("name").to_string(), "Leonard Krasner");
        draw(&mut app);
    }

    #[test]
    fn test_sort_focused_column() {
        let mut app = app();
        press(&mut app, KeyCode::Right);
        press(&mut app, KeyCode::Char('s'));
        assert_eq!(app.table().sort_key(), Some("title"));
        press(&mut app, KeyCode::Right);
        press(&mut app, KeyCode::Char('s'));
        assert_eq!(app.table().sort_key(), Some("title"));
    }

    #[test]
    fn test_render_and_mouse_outside_cancels() {
        let mut app = app();
        let screen = draw(&mut app);
        assert!(screen.contains("Select Registration Dates"));
        assert!(screen.contains(EMPTY_TABLE_TEXT));

        let trigger = app.screen.trigger;
        click(&mut app, trigger.x + 1, trigger.y + 1);
        assert!(app.picker().is_open());
        let screen = draw(&mut app);
        assert!(screen.contains("April 2025"));

        click(&mut app, 99, 29);
        assert!(!app.picker().is_open());
    }

    #[test]
    fn test_mouse_selects_grid_cell() {
        let mut app = app();
        press(&mut app, KeyCode::Char('d'));
        draw(&mut app);
        let grid = app.screen.grid.unwrap();
        // April 2025 starts on a Tuesday: second row, first column is the 6th.
        click(&mut app, grid.x, grid.y + 2);
        assert_eq!(app.picker().selection().from(), Some(date(2025, 4, 6)));
        assert!(app.picker().is_open());
    }

    #[test]
    fn test_grid_index_skips_spacing_and_header() {
        let grid = Rect::new(10, 5, 28, 7);
        assert_eq!(grid_index(grid, Position::new(10, 5)), None);
        assert_eq!(grid_index(grid, Position::new(10, 6)), Some(0));
        assert_eq!(grid_index(grid, Position::new(13, 6)), None);
        assert_eq!(grid_index(grid, Position::new(14, 7)), Some(8));
    }
}
