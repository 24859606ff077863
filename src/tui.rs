use anyhow::Result;
use crossterm::{
    event::{self, Event, KeyCode, KeyEventKind},
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
    ExecutableCommand,
};
use ratatui::{
    prelude::*,
    widgets::{Block, Borders, List, ListItem, ListState, Paragraph, Wrap},
};
use std::io::stdout;

use crate::board::Board;
use crate::models::{FilterCriteria, Listing};
use crate::store::DocumentStore;
use crate::{format_wage, truncate};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Focus {
    List,
    Keyword,
    MinWage,
    Date,
}

impl Focus {
    fn next(self) -> Self {
        match self {
            Focus::List => Focus::Keyword,
            Focus::Keyword => Focus::MinWage,
            Focus::MinWage => Focus::Date,
            Focus::Date => Focus::List,
        }
    }

    fn prev(self) -> Self {
        match self {
            Focus::List => Focus::Date,
            Focus::Keyword => Focus::List,
            Focus::MinWage => Focus::Keyword,
            Focus::Date => Focus::MinWage,
        }
    }
}

struct AppState {
    criteria: FilterCriteria,
    focus: Focus,
    selected: usize,
    scroll_offset: u16,
    message: Option<String>,
}

impl AppState {
    fn new() -> Self {
        Self {
            criteria: FilterCriteria::default(),
            focus: Focus::List,
            selected: 0,
            scroll_offset: 0,
            message: None,
        }
    }

    fn field_mut(&mut self) -> Option<&mut String> {
        match self.focus {
            Focus::List => None,
            Focus::Keyword => Some(&mut self.criteria.keyword),
            Focus::MinWage => Some(&mut self.criteria.min_wage),
            Focus::Date => Some(&mut self.criteria.date),
        }
    }

    fn next(&mut self, visible: usize) {
        if visible > 0 && self.selected < visible - 1 {
            self.selected += 1;
            self.scroll_offset = 0;
        }
    }

    fn prev(&mut self) {
        if self.selected > 0 {
            self.selected -= 1;
            self.scroll_offset = 0;
        }
    }

    fn scroll_down(&mut self) {
        self.scroll_offset = self.scroll_offset.saturating_add(3);
    }

    fn scroll_up(&mut self) {
        self.scroll_offset = self.scroll_offset.saturating_sub(3);
    }
}

fn clamp_selection(selected: usize, visible: usize) -> usize {
    selected.min(visible.saturating_sub(1))
}

pub fn run_browse<S: DocumentStore>(board: &mut Board<S>) -> Result<()> {
    board.refresh()?;

    let mut state = AppState::new();

    // Setup terminal
    enable_raw_mode()?;
    stdout().execute(EnterAlternateScreen)?;
    let mut terminal = Terminal::new(CrosstermBackend::new(stdout()))?;

    let result = run_loop(&mut terminal, &mut state, board);

    // Restore terminal
    disable_raw_mode()?;
    stdout().execute(LeaveAlternateScreen)?;

    result
}

fn run_loop<S: DocumentStore>(
    terminal: &mut Terminal<CrosstermBackend<std::io::Stdout>>,
    state: &mut AppState,
    board: &mut Board<S>,
) -> Result<()> {
    let mut list_state = ListState::default();

    loop {
        let visible = board.filtered(&state.criteria);
        state.selected = clamp_selection(state.selected, visible.len());
        list_state.select((!visible.is_empty()).then_some(state.selected));
        terminal.draw(|frame| draw(frame, state, &visible, board.listings().len(), &mut list_state))?;
        let visible_len = visible.len();

        let Event::Key(key) = event::read()? else {
            continue;
        };
        if key.kind != KeyEventKind::Press {
            continue;
        }

        match key.code {
            KeyCode::Tab => state.focus = state.focus.next(),
            KeyCode::BackTab => state.focus = state.focus.prev(),
            _ if state.focus != Focus::List => match key.code {
                KeyCode::Esc | KeyCode::Enter => state.focus = Focus::List,
                KeyCode::Backspace => {
                    if let Some(field) = state.field_mut() {
                        field.pop();
                    }
                    state.selected = 0;
                }
                KeyCode::Char(c) => {
                    if let Some(field) = state.field_mut() {
                        field.push(c);
                    }
                    state.selected = 0;
                }
                _ => {}
            },
            KeyCode::Char('q') | KeyCode::Esc => break,
            KeyCode::Down | KeyCode::Char('j') => state.next(visible_len),
            KeyCode::Up | KeyCode::Char('k') => state.prev(),
            KeyCode::Char('J') | KeyCode::PageDown => state.scroll_down(),
            KeyCode::Char('K') | KeyCode::PageUp => state.scroll_up(),
            KeyCode::Char('/') => state.focus = Focus::Keyword,
            KeyCode::Char('R') => {
                state.criteria.reset();
                state.selected = 0;
                state.message = Some("Filters cleared".to_string());
            }
            KeyCode::Char('r') => {
                state.message = Some(match board.refresh() {
                    Ok(count) => format!("Loaded {} listing(s)", count),
                    Err(e) => {
                        tracing::warn!(error = %e, "refresh failed, keeping current listings");
                        format!("Refresh failed: {}", e)
                    }
                });
            }
            _ => {}
        }
    }
    Ok(())
}

fn draw(
    frame: &mut Frame,
    state: &AppState,
    visible: &[&Listing],
    total: usize,
    list_state: &mut ListState,
) {
    let rows = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3),
            Constraint::Min(0),
            Constraint::Length(1),
        ])
        .split(frame.area());

    // Top bar: filter inputs
    let fields = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Percentage(50),
            Constraint::Percentage(25),
            Constraint::Percentage(25),
        ])
        .split(rows[0]);

    let inputs = [
        (" Keyword ", &state.criteria.keyword, Focus::Keyword),
        (" Min wage ", &state.criteria.min_wage, Focus::MinWage),
        (" Date (YYYY-MM-DD) ", &state.criteria.date, Focus::Date),
    ];
    for (area, (title, value, focus)) in fields.iter().zip(inputs) {
        let style = if state.focus == focus {
            Style::default().fg(Color::Yellow)
        } else {
            Style::default()
        };
        let input = Paragraph::new(value.as_str())
            .block(Block::default().borders(Borders::ALL).title(title).border_style(style));
        frame.render_widget(input, *area);
    }

    let chunks = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Percentage(40),
            Constraint::Percentage(60),
        ])
        .split(rows[1]);

    // Left panel: listings
    let items: Vec<ListItem> = visible
        .iter()
        .map(|listing| {
            ListItem::new(format!(
                "{} | {} | {}",
                truncate(&listing.title, 28),
                truncate(&listing.keyword, 12),
                format_wage(listing.wage)
            ))
        })
        .collect();

    let list_style = if state.focus == Focus::List {
        Style::default().fg(Color::Yellow)
    } else {
        Style::default()
    };
    let list = List::new(items)
        .block(
            Block::default()
                .borders(Borders::ALL)
                .border_style(list_style)
                .title(format!(" Listings ({}/{}) ", visible.len(), total)),
        )
        .highlight_style(Style::default().bg(Color::DarkGray).add_modifier(Modifier::BOLD))
        .highlight_symbol("> ");

    frame.render_stateful_widget(list, chunks[0], list_state);

    // Right panel: listing detail
    let detail = build_detail(visible.get(state.selected).copied());
    let detail_widget = Paragraph::new(detail)
        .block(Block::default().borders(Borders::ALL).title(" Detail "))
        .wrap(Wrap { trim: false })
        .scroll((state.scroll_offset, 0));

    frame.render_widget(detail_widget, chunks[1]);

    // Footer help
    let help_text = match &state.message {
        Some(msg) => format!(" {}  |  tab:filters  R:reset  r:reload  q:quit", msg),
        None => " j/k:navigate  J/K:scroll  tab or /:edit filters  R:reset  r:reload  q:quit".to_string(),
    };
    let help = Paragraph::new(help_text).style(Style::default().fg(Color::DarkGray));
    frame.render_widget(help, rows[2]);
}

fn build_detail(listing: Option<&Listing>) -> Text<'_> {
    let Some(listing) = listing else {
        return Text::raw("No listings match the current filters");
    };

    let mut lines: Vec<Line> = Vec::new();

    lines.push(Line::from(Span::styled(
        &listing.title,
        Style::default().add_modifier(Modifier::BOLD),
    )));
    lines.push(Line::from(Span::styled(
        format!("#{}", listing.id),
        Style::default().fg(Color::DarkGray),
    )));

    if !listing.keyword.is_empty() {
        lines.push(Line::from(Span::styled(
            format!("[{}]", listing.keyword),
            Style::default().fg(Color::Cyan),
        )));
    }

    lines.push(Line::from(format!("Wage: {}/h", format_wage(listing.wage))));
    lines.push(Line::from(format!(
        "Period: {} ~ {}",
        listing.start_date.as_deref().unwrap_or("not set"),
        listing.end_date.as_deref().unwrap_or("not set")
    )));
    if let Some(created) = &listing.created_at {
        lines.push(Line::from(format!("Posted: {}", created.display())));
    }

    lines.push(Line::from(""));

    if listing.description.is_empty() {
        lines.push(Line::from(Span::styled(
            "(No description)",
            Style::default().fg(Color::DarkGray),
        )));
    } else {
        for line in textwrap::fill(&listing.description, 70).lines() {
            lines.push(Line::from(line.to_string()));
        }
    }

    Text::from(lines)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_focus_cycle() {
        let mut focus = Focus::List;
        for expected in [Focus::Keyword, Focus::MinWage, Focus::Date, Focus::List] {
            focus = focus.next();
            assert_eq!(focus, expected);
        }
        assert_eq!(Focus::List.prev(), Focus::Date);
        assert_eq!(Focus::Keyword.prev(), Focus::List);
    }

    #[test]
    fn test_typing_edits_focused_filter() {
        let mut state = AppState::new();
        assert!(state.field_mut().is_none());

        state.focus = Focus::MinWage;
        state.field_mut().unwrap().push_str("1200");
        assert_eq!(state.criteria.min_wage, "1200");
        assert!(state.criteria.keyword.is_empty());

        state.criteria.reset();
        assert!(state.criteria.is_empty());
    }

    #[test]
    fn test_selection_clamps_to_visible() {
        let mut state = AppState::new();
        state.next(3);
        state.next(3);
        state.next(3);
        assert_eq!(state.selected, 2);
        assert_eq!(clamp_selection(state.selected, 5), 2);
        assert_eq!(clamp_selection(state.selected, 1), 0);
        assert_eq!(clamp_selection(state.selected, 0), 0);
    }
}
