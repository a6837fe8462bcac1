mod assignment;
mod checklist_item;
mod column;
mod member;
mod profile;
mod project;
mod role;
mod session;
mod task;

pub use assignment::{AssignmentView, NewAssignment, TaskAssignment};
pub use checklist_item::{ChecklistItem, NewChecklistItem};
pub use column::Column;
pub use member::{MemberView, NewMember, ProjectMember};
pub use profile::UserProfile;
pub use project::{NewProject, Project};
pub use role::Role;
pub use session::Session;
pub use task::{AssignedTask, NewTask, Task, TaskView};
