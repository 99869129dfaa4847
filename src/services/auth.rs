use std::sync::Arc;

use argon2::{
    password_hash::{rand_core::OsRng, PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Argon2,
};
use sea_orm::{ColumnTrait, EntityTrait, QueryFilter};
use tracing::{instrument, warn};

use crate::{
    db::DbPool,
    entities::{production_user, user},
    errors::ServiceError,
    models::UserInfo,
};

/// Credential verification backed by salted argon2 hashes. Plaintext
/// passwords never touch the database.
#[derive(Clone)]
pub struct AuthService {
    db: Arc<DbPool>,
}

impl AuthService {
    pub fn new(db: Arc<DbPool>) -> Self {
        Self { db }
    }

    /// Verifies a dashboard user's credentials.
    #[instrument(skip(self, password), fields(username = %username))]
    pub async fn verify_login(
        &self,
        username: &str,
        password: &str,
    ) -> Result<UserInfo, ServiceError> {
        let record = user::Entity::find()
            .filter(user::Column::Username.eq(username))
            .one(&*self.db)
            .await
            .map_err(ServiceError::DatabaseError)?;

        match record {
            Some(found) if verify_password(&found.password_hash, password) => Ok(UserInfo {
                id: found.id,
                username: found.username,
                name: Some(found.name),
            }),
            _ => {
                warn!(%username, "Login rejected");
                Err(ServiceError::AuthError("Invalid credentials".to_string()))
            }
        }
    }

    /// Verifies a production-unit user's credentials.
    #[instrument(skip(self, password), fields(username = %username))]
    pub async fn verify_production_login(
        &self,
        username: &str,
        password: &str,
    ) -> Result<UserInfo, ServiceError> {
        let record = production_user::Entity::find()
            .filter(production_user::Column::Username.eq(username))
            .one(&*self.db)
            .await
            .map_err(ServiceError::DatabaseError)?;

        match record {
            Some(found) if verify_password(&found.password_hash, password) => Ok(UserInfo {
                id: found.id,
                username: found.username,
                name: None,
            }),
            _ => {
                warn!(%username, "Production login rejected");
                Err(ServiceError::AuthError(
                    "Invalid production credentials".to_string(),
                ))
            }
        }
    }

    /// Hashes a password for storage; used when seeding or registering
    /// accounts.
    pub fn hash_password(password: &str) -> Result<String, ServiceError> {
        let salt = SaltString::generate(&mut OsRng);
        Argon2::default()
            .hash_password(password.as_bytes(), &salt)
            .map(|hash| hash.to_string())
            .map_err(|e| ServiceError::InternalError(format!("Password hashing failed: {e}")))
    }
}

fn verify_password(stored_hash: &str, candidate: &str) -> bool {
    let Ok(parsed) = PasswordHash::new(stored_hash) else {
        warn!("Stored password hash is not a valid PHC string");
        return false;
    };
    Argon2::default()
        .verify_password(candidate.as_bytes(), &parsed)
        .is_ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hash_then_verify_round_trip() {
        let hash = AuthService::hash_password("hunter2").unwrap();
        assert_ne!(hash, "hunter2");
        assert!(verify_password(&hash, "hunter2"));
        assert!(!verify_password(&hash, "hunter3"));
    }

    #[test]
    fn malformed_stored_hash_is_rejected() {
        assert!(!verify_password("not-a-phc-string", "anything"));
    }
}
