use crossterm::event::KeyCode;
use tui::{
    backend::Backend,
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Span, Spans},
    widgets::{Block, Borders, List, ListItem, Paragraph},
    Frame,
};

#[derive(Debug, PartialEq, Eq)]
pub enum ProjectWizardAction {
    Cancel,
    Save { name: String, description: String },
}

#[derive(Clone, PartialEq, Copy)]
pub enum ProjectField {
    Name,
    Description,
}

pub struct ProjectWizardState {
    pub name: String,
    pub description: String,
    pub current_field: ProjectField,
    pub editing: bool,
    pub saving: bool,
    pub error: Option<String>,
}

impl ProjectWizardState {
    pub fn new() -> Self {
        Self {
            name: String::new(),
            description: String::new(),
            current_field: ProjectField::Name,
            editing: true,
            saving: false,
            error: None,
        }
    }

    pub fn toggle_editing(&mut self) {
        self.editing = !self.editing;
    }

    pub fn next_field(&mut self) {
        self.current_field = match self.current_field {
            ProjectField::Name => ProjectField::Description,
            ProjectField::Description => ProjectField::Name,
        };
    }

    pub fn edit_current_field(&mut self, key: KeyCode) {
        if !self.editing {
            return;
        }

        let value = match self.current_field {
            ProjectField::Name => &mut self.name,
            ProjectField::Description => &mut self.description,
        };
        match key {
            KeyCode::Char(c) => value.push(c),
            KeyCode::Backspace => {
                value.pop();
            }
            _ => {}
        }
    }

    pub fn is_valid(&self) -> bool {
        !self.name.trim().is_empty()
    }

    pub fn failed(&mut self, message: String) {
        self.saving = false;
        self.error = Some(message);
    }
}

impl Default for ProjectWizardState {
    fn default() -> Self {
        Self::new()
    }
}

pub fn render_project_wizard<B: Backend>(f: &mut Frame<B>, state: &ProjectWizardState) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .margin(2)
        .constraints(
            [
                Constraint::Length(3),
                Constraint::Min(6),
                Constraint::Length(3),
            ]
            .as_ref(),
        )
        .split(f.size());

    let title = Paragraph::new("New Project")
        .style(Style::default().fg(Color::Cyan))
        .block(Block::default().borders(Borders::ALL));
    f.render_widget(title, chunks[0]);

    render_form(f, state, chunks[1]);

    let help_text = if state.saving {
        "Saving..."
    } else if state.editing {
        "Enter - Done editing | Esc - Stop editing"
    } else {
        "Enter - Edit field | Up/Down - Navigate fields | S - Save project | Esc - Cancel"
    };
    let help = Paragraph::new(help_text)
        .style(Style::default().fg(Color::Gray))
        .block(Block::default().borders(Borders::ALL));
    f.render_widget(help, chunks[2]);
}

fn render_form<B: Backend>(f: &mut Frame<B>, state: &ProjectWizardState, area: Rect) {
    let fields = [
        (ProjectField::Name, "Name", &state.name),
        (ProjectField::Description, "Description", &state.description),
    ];

    let mut items: Vec<ListItem> = fields
        .iter()
        .map(|(field, name, value)| {
            let current = *field == state.current_field;
            let label_style = if current {
                Style::default().fg(Color::Yellow)
            } else {
                Style::default()
            };
            let value = if current && state.editing {
                Span::styled(format!("{value}|"), Style::default().add_modifier(Modifier::BOLD))
            } else {
                Span::raw(value.to_string())
            };
            ListItem::new(Spans::from(vec![Span::styled(format!("{name}: "), label_style), value]))
        })
        .collect();

    if let Some(error) = &state.error {
        items.push(ListItem::new(""));
        items.push(ListItem::new(Span::styled(error.clone(), Style::default().fg(Color::Red))));
    }

    let form_list = List::new(items).block(Block::default().borders(Borders::ALL).title("Project Details"));
    f.render_widget(form_list, area);
}

pub fn handle_key(state: &mut ProjectWizardState, key: KeyCode) -> Option<ProjectWizardAction> {
    if state.saving {
        return None;
    }

    match key {
        KeyCode::Esc => {
            if state.editing {
                state.toggle_editing();
            } else {
                return Some(ProjectWizardAction::Cancel);
            }
        }
        KeyCode::Enter => state.toggle_editing(),
        KeyCode::Tab => state.next_field(),
        KeyCode::Up | KeyCode::Down if !state.editing => state.next_field(),
        KeyCode::Char('s') if !state.editing => {
            if state.is_valid() {
                state.saving = true;
                state.error = None;
                return Some(ProjectWizardAction::Save {
                    name: state.name.clone(),
                    description: state.description.clone(),
                });
            }
            state.error = Some("Project name is required".to_string());
        }
        _ if state.editing => state.edit_current_field(key),
        _ => {}
    }

    None
}
