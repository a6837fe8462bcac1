use std::fmt;
use std::str::FromStr;

use crate::error::ServiceError;

/// Project-level permission. Editors may mutate, viewers only read.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Role {
    Editor,
    Viewer,
}

impl Role {
    pub fn as_str(self) -> &'static str {
        match self {
            Role::Editor => "editor",
            Role::Viewer => "viewer",
        }
    }

    pub fn can_edit(self) -> bool {
        matches!(self, Role::Editor)
    }

    pub fn toggled(self) -> Role {
        match self {
            Role::Editor => Role::Viewer,
            Role::Viewer => Role::Editor,
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Role {
    type Err = ServiceError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "editor" => Ok(Role::Editor),
            "viewer" => Ok(Role::Viewer),
            other => Err(ServiceError::UnknownRole(other.to_string())),
        }
    }
}
