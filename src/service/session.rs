use crate::db::Database;
use crate::error::ServiceError;
use crate::models::{Session, UserProfile};

use super::{require_text, ServiceResult};

pub const MIN_PASSWORD_LEN: usize = 6;

fn credentials(email: &str, password: &str) -> ServiceResult<String> {
    let email = require_text(email, ServiceError::EmptyEmail)?.to_lowercase();
    if password.chars().count() < MIN_PASSWORD_LEN {
        return Err(ServiceError::PasswordTooShort {
            min: MIN_PASSWORD_LEN,
        });
    }
    Ok(email)
}

pub async fn sign_in(db: &dyn Database, email: &str, password: &str) -> ServiceResult<Session> {
    let email = credentials(email, password)?;
    let session = db.sign_in(&email, password).await?;
    tracing::info!(user_id = %session.user_id, "signed in");
    Ok(session)
}

/// Registers an account. The caller still has to sign in afterwards.
pub async fn sign_up(db: &dyn Database, email: &str, password: &str) -> ServiceResult<()> {
    let email = credentials(email, password)?;
    let user_id = db.sign_up(&email, password).await?;
    tracing::info!(%user_id, "account created");
    Ok(())
}

pub async fn sign_out(db: &dyn Database) -> ServiceResult<()> {
    db.sign_out().await?;
    tracing::info!("signed out");
    Ok(())
}

/// Fetches the profile for `session`, creating it on first login.
pub async fn resolve_profile(db: &dyn Database, session: &Session) -> ServiceResult<UserProfile> {
    match db.get_profile(session.user_id).await.map_err(ServiceError::from) {
        Ok(profile) => Ok(profile),
        Err(err) if err.is_not_found() => {
            let profile = UserProfile::synthesize(session.user_id, session.email.as_deref());
            tracing::info!(user_id = %session.user_id, name = %profile.full_name, "creating profile on first login");
            Ok(db.create_profile(&profile).await?)
        }
        Err(err) => Err(err),
    }
}
