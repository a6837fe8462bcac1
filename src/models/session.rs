use uuid::Uuid;

/// An authenticated identity as reported by the auth API.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Session {
    pub user_id: Uuid,
    pub email: Option<String>,
}
