//! Screen services: the fetch and mutate flows behind each screen.
//!
//! Mutating operations take an [`Actor`] and return [`Mutation::ReadOnly`]
//! without touching the backend when the actor is a viewer.

pub mod board;
pub mod dashboard;
pub mod invite;
pub mod projects;
pub mod session;
pub mod task_detail;

use uuid::Uuid;

use crate::error::ServiceError;
use crate::models::Role;

pub type ServiceResult<T> = std::result::Result<T, ServiceError>;

/// The acting user and their resolved role within one project.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Actor {
    pub user_id: Uuid,
    pub role: Role,
}

impl Actor {
    pub fn new(user_id: Uuid, role: Role) -> Self {
        Self { user_id, role }
    }

    pub fn can_edit(&self) -> bool {
        self.role.can_edit()
    }
}

/// Result of a mutating call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mutation {
    Applied,
    /// The actor is a viewer; nothing was written.
    ReadOnly,
}

fn require_text(value: &str, err: ServiceError) -> ServiceResult<String> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        Err(err)
    } else {
        Ok(trimmed.to_string())
    }
}
