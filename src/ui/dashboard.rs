use chrono::{DateTime, Utc};
use crossterm::event::KeyCode;
use tui::{
    backend::Backend,
    layout::{Constraint, Direction, Layout},
    style::{Color, Modifier, Style},
    text::{Span, Spans},
    widgets::{Block, Borders, List, ListItem, ListState, Paragraph},
    Frame,
};
use uuid::Uuid;

use crate::board::{is_overdue, Progress};
use crate::models::AssignedTask;
use crate::ui::components::popup::step;

pub struct DashboardState {
    tasks: Option<Vec<AssignedTask>>,
    list_state: ListState,
}

#[derive(Debug, PartialEq, Eq)]
pub enum DashboardAction {
    Back,
    Reload,
    OpenProject(Uuid),
}

impl DashboardState {
    pub fn loading() -> Self {
        Self {
            tasks: None,
            list_state: ListState::default(),
        }
    }

    pub fn set_tasks(&mut self, tasks: Vec<AssignedTask>) {
        self.list_state.select(if tasks.is_empty() { None } else { Some(0) });
        self.tasks = Some(tasks);
    }

    fn len(&self) -> usize {
        self.tasks.as_ref().map_or(0, Vec::len)
    }

    pub fn selected(&self) -> Option<&AssignedTask> {
        self.tasks.as_ref()?.get(self.list_state.selected()?)
    }
}

fn task_item(assigned: &AssignedTask, now: DateTime<Utc>) -> ListItem<'static> {
    let progress = Progress::of(&assigned.checklist);
    let overdue = is_overdue(&assigned.checklist, now);
    let title_style = if overdue {
        Style::default().fg(Color::Red).add_modifier(Modifier::BOLD)
    } else {
        Style::default().add_modifier(Modifier::BOLD)
    };

    let mut lines = vec![
        Spans::from(Span::styled(assigned.task.title.clone(), title_style)),
        Spans::from(vec![
            Span::styled(
                assigned.project_name.clone().unwrap_or_else(|| "Unknown project".to_string()),
                Style::default().fg(Color::Cyan),
            ),
            Span::raw("  "),
            Span::raw(format!("{} {}", progress.bar(10), progress.label())),
        ]),
    ];
    if overdue {
        lines.push(Spans::from(Span::styled("! Overdue", Style::default().fg(Color::Red))));
    }
    ListItem::new(lines)
}

pub fn render_dashboard<B: Backend>(f: &mut Frame<B>, state: &mut DashboardState, now: DateTime<Utc>) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Min(1), Constraint::Length(3)].as_ref())
        .split(f.size());

    let block = Block::default().title("My tasks").borders(Borders::ALL);
    match &state.tasks {
        None => f.render_widget(Paragraph::new("Loading...").block(block), chunks[0]),
        Some(tasks) if tasks.is_empty() => f.render_widget(
            Paragraph::new("Nothing assigned to you. Enjoy the quiet.")
                .style(Style::default().fg(Color::Gray))
                .block(block),
            chunks[0],
        ),
        Some(tasks) => {
            let items: Vec<ListItem> = tasks.iter().map(|t| task_item(t, now)).collect();
            let list = List::new(items)
                .block(block)
                .highlight_style(Style::default().bg(Color::Blue).fg(Color::White));
            f.render_stateful_widget(list, chunks[0], &mut state.list_state);
        }
    }

    let buttons = Paragraph::new("<Enter> Open board | <R> Refresh | <Esc> Back")
        .block(Block::default().borders(Borders::TOP))
        .style(Style::default().fg(Color::White));
    f.render_widget(buttons, chunks[1]);
}

pub fn handle_key(state: &mut DashboardState, key: KeyCode) -> Option<DashboardAction> {
    match key {
        KeyCode::Esc | KeyCode::Char('q') => return Some(DashboardAction::Back),
        KeyCode::Char('r') => return Some(DashboardAction::Reload),
        KeyCode::Down | KeyCode::Char('j') => {
            let selected = step(state.list_state.selected(), state.len(), true);
            state.list_state.select(selected);
        }
        KeyCode::Up | KeyCode::Char('k') => {
            let selected = step(state.list_state.selected(), state.len(), false);
            state.list_state.select(selected);
        }
        KeyCode::Enter => {
            if let Some(assigned) = state.selected() {
                return Some(DashboardAction::OpenProject(assigned.task.project_id));
            }
        }
        _ => {}
    }
    None
}
