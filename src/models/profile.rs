use uuid::Uuid;

const FALLBACK_EMAIL: &str = "user@example.com";

#[derive(sqlx::FromRow, Debug, Clone, PartialEq, Eq)]
pub struct UserProfile {
    pub user_id: Uuid,
    pub full_name: String,
    pub initials: String,
    pub email: String,
}

impl UserProfile {
    /// Builds the profile created on first login: the display name is the
    /// local part of the email and the initials its first two characters.
    pub fn synthesize(user_id: Uuid, email: Option<&str>) -> Self {
        let email = email.filter(|e| !e.is_empty()).unwrap_or(FALLBACK_EMAIL);
        let full_name = email.split('@').next().unwrap_or_default().to_string();
        let initials = full_name.chars().take(2).collect::<String>().to_uppercase();

        Self {
            user_id,
            full_name,
            initials,
            email: email.to_string(),
        }
    }
}
