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

use crate::models::{Project, UserProfile};
use crate::ui::components::popup::step;

// Row 0 is the dashboard entry; projects follow it.
pub struct ProjectsState {
    projects: Option<Vec<Project>>,
    list_state: ListState,
}

#[derive(Debug, PartialEq, Eq)]
pub enum ProjectAction {
    OpenDashboard,
    OpenProject(Uuid),
    NewProject,
    Logout,
    Quit,
}

impl ProjectsState {
    /// A list still waiting for its projects.
    pub fn loading() -> Self {
        let mut list_state = ListState::default();
        list_state.select(Some(0));
        Self {
            projects: None,
            list_state,
        }
    }

    pub fn set_projects(&mut self, projects: Vec<Project>) {
        let rows = projects.len() + 1;
        self.projects = Some(projects);
        if self.list_state.selected().map_or(true, |i| i >= rows) {
            self.list_state.select(Some(0));
        }
    }

    pub fn is_loading(&self) -> bool {
        self.projects.is_none()
    }

    fn rows(&self) -> usize {
        self.projects.as_ref().map_or(0, Vec::len) + 1
    }

    pub fn next(&mut self) {
        let selected = step(self.list_state.selected(), self.rows(), true);
        self.list_state.select(selected);
    }

    pub fn previous(&mut self) {
        let selected = step(self.list_state.selected(), self.rows(), false);
        self.list_state.select(selected);
    }

    pub fn selected_project(&self) -> Option<&Project> {
        let index = self.list_state.selected()?.checked_sub(1)?;
        self.projects.as_ref()?.get(index)
    }
}

pub fn render_projects<B: Backend>(f: &mut Frame<B>, state: &mut ProjectsState, profile: Option<&UserProfile>) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Length(3), Constraint::Min(1), Constraint::Length(3)].as_ref())
        .split(f.size());

    let who = profile.map_or_else(
        || "Loading profile...".to_string(),
        |p| format!("{} [{}]  {}", p.full_name, p.initials, p.email),
    );
    let header = Paragraph::new(who)
        .style(Style::default().fg(Color::Cyan))
        .block(Block::default().borders(Borders::ALL).title("Task Board"));
    f.render_widget(header, chunks[0]);

    let mut items = vec![ListItem::new(Spans::from(Span::styled(
        "My tasks (dashboard)",
        Style::default().fg(Color::Magenta),
    )))];
    match &state.projects {
        None => items.push(ListItem::new("Loading projects...")),
        Some(projects) if projects.is_empty() => {
            items.push(ListItem::new(Span::styled(
                "No projects yet. Press N to create one.",
                Style::default().fg(Color::Gray),
            )))
        }
        Some(projects) => items.extend(projects.iter().map(|project| {
            let mut spans = vec![Span::raw(project.name.clone())];
            if let Some(description) = &project.description {
                spans.push(Span::styled(
                    format!("  {description}"),
                    Style::default().fg(Color::Gray),
                ));
            }
            ListItem::new(Spans::from(spans))
        })),
    }

    let list = List::new(items)
        .block(Block::default().title("Projects").borders(Borders::ALL))
        .highlight_style(
            Style::default()
                .bg(Color::Blue)
                .fg(Color::White)
                .add_modifier(Modifier::BOLD),
        );
    f.render_stateful_widget(list, chunks[1], &mut state.list_state);

    let buttons = Paragraph::new("<Enter> Open | <N> New Project | <L> Log out | <Q> Quit")
        .block(Block::default().borders(Borders::TOP))
        .style(Style::default().fg(Color::White));
    f.render_widget(buttons, chunks[2]);
}

pub fn handle_key(state: &mut ProjectsState, key: KeyCode) -> Option<ProjectAction> {
    match key {
        KeyCode::Char('q') | KeyCode::Esc => return Some(ProjectAction::Quit),
        KeyCode::Char('n') => return Some(ProjectAction::NewProject),
        KeyCode::Char('l') => return Some(ProjectAction::Logout),
        KeyCode::Down | KeyCode::Char('j') => state.next(),
        KeyCode::Up | KeyCode::Char('k') => state.previous(),
        KeyCode::Enter => {
            if state.list_state.selected() == Some(0) {
                return Some(ProjectAction::OpenDashboard);
            }
            if let Some(project) = state.selected_project() {
                return Some(ProjectAction::OpenProject(project.id));
            }
        }
        _ => {}
    }
    None
}
