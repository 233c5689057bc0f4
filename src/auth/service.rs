//! Account and session orchestration.
//!
//! Each operation is a single check-then-act sequence over one user row.
//! Expected outcomes (missing user, wrong password, taken name) come back as
//! typed errors with their HTTP status; only storage and signing faults are
//! logged. Every identity-affecting operation reissues a fresh token pair so
//! the caller's claims track the row without a server-side session store.
//!
//! There is deliberately no transaction around "check name free, then
//! insert": two concurrent registrations can both pass the check, and the
//! second insert then fails on the UNIQUE constraint. The storage layer is
//! the authority on name uniqueness.

use std::sync::Arc;

use crate::api::{ApiError, ResultExt};
use crate::db::{Database, User};
use crate::jwt::{JwtConfig, SessionUser, TokenPair};
use crate::password::PasswordService;

/// Auth service with explicit dependencies, cheap to clone.
#[derive(Clone)]
pub struct AuthService {
    db: Database,
    jwt: Arc<JwtConfig>,
    passwords: PasswordService,
}

impl AuthService {
    pub fn new(db: Database, jwt: Arc<JwtConfig>, passwords: PasswordService) -> Self {
        Self { db, jwt, passwords }
    }

    fn issue_for(&self, user: &User) -> Result<TokenPair, ApiError> {
        let session = SessionUser {
            id: user.id,
            name: user.name.clone(),
            role: user.role,
            about: user.about.clone(),
        };
        self.jwt
            .issue(&session)
            .map_err(|e| ApiError::signing_error("Failed to issue token pair", e))
    }

    /// Register a new account and issue its first token pair.
    pub async fn register(&self, name: &str, password: &str) -> Result<TokenPair, ApiError> {
        let existing = self
            .db
            .users()
            .get_by_name(name)
            .await
            .db_err("Failed to check name availability")?;
        if existing.is_some() {
            return Err(ApiError::bad_request("User already exists"));
        }

        let password_hash = self
            .passwords
            .hash(password)
            .map_err(|e| ApiError::signing_error("Failed to hash password", e))?;

        let id = self
            .db
            .users()
            .create(name, &password_hash)
            .await
            .db_err("Failed to create user")?;

        let user = self
            .db
            .users()
            .get_by_id(id)
            .await
            .db_err("Failed to load created user")?
            .ok_or_else(|| ApiError::internal("Created user vanished"))?;

        self.issue_for(&user)
    }

    /// Verify credentials and issue a fresh token pair.
    pub async fn login(&self, name: &str, password: &str) -> Result<TokenPair, ApiError> {
        let hash = self
            .db
            .users()
            .password_hash_by_name(name)
            .await
            .db_err("Failed to look up credentials")?
            .ok_or_else(|| ApiError::not_found("No such user"))?;

        if !self.passwords.verify(password, &hash) {
            return Err(ApiError::forbidden("Wrong password"));
        }

        let user = self
            .db
            .users()
            .get_by_name(name)
            .await
            .db_err("Failed to load user")?
            .ok_or_else(|| ApiError::not_found("No such user"))?;

        self.issue_for(&user)
    }

    /// Exchange a refresh token for a brand-new pair. Claims are taken from
    /// the token itself, not re-read from the row.
    pub fn refresh(&self, refresh_token: &str) -> Result<TokenPair, ApiError> {
        let claims = self
            .jwt
            .validate_refresh(refresh_token)
            .ok_or_else(|| ApiError::unauthorized("Invalid or expired refresh token"))?;

        let session = SessionUser {
            id: claims.id,
            name: claims.name,
            role: claims.role,
            about: claims.about,
        };
        self.jwt
            .issue(&session)
            .map_err(|e| ApiError::signing_error("Failed to issue token pair", e))
    }

    /// Replace the password after verifying the old one. Claims for the
    /// reissued pair are re-derived from the current row state.
    pub async fn change_password(
        &self,
        id: i64,
        old_password: &str,
        new_password: &str,
    ) -> Result<TokenPair, ApiError> {
        let user = self
            .db
            .users()
            .get_by_id(id)
            .await
            .db_err("Failed to load user")?
            .ok_or_else(|| ApiError::not_found("No user with this ID"))?;

        let hash = self
            .db
            .users()
            .password_hash_by_id(id)
            .await
            .db_err("Failed to look up credentials")?
            .ok_or_else(|| ApiError::not_found("No user with this ID"))?;

        if !self.passwords.verify(old_password, &hash) {
            return Err(ApiError::forbidden("Wrong password"));
        }

        let new_hash = self
            .passwords
            .hash(new_password)
            .map_err(|e| ApiError::signing_error("Failed to hash password", e))?;
        self.db
            .users()
            .update_password(id, &new_hash)
            .await
            .db_err("Failed to update password")?;

        self.issue_for(&user)
    }

    /// Rename the account if the new name is free.
    pub async fn change_name(&self, id: i64, new_name: &str) -> Result<TokenPair, ApiError> {
        let user = self
            .db
            .users()
            .get_by_id(id)
            .await
            .db_err("Failed to load user")?
            .ok_or_else(|| ApiError::not_found("No user with this ID"))?;

        let taken = self
            .db
            .users()
            .get_by_name(new_name)
            .await
            .db_err("Failed to check name availability")?
            .is_some_and(|other| other.id != id);
        if taken {
            return Err(ApiError::bad_request("Name already taken"));
        }

        self.db
            .users()
            .update_name(id, new_name)
            .await
            .db_err("Failed to update name")?;

        self.issue_for(&User {
            name: new_name.to_string(),
            ..user
        })
    }

    /// Update the profile text.
    pub async fn change_about(&self, id: i64, about: &str) -> Result<TokenPair, ApiError> {
        let user = self
            .db
            .users()
            .get_by_id(id)
            .await
            .db_err("Failed to load user")?
            .ok_or_else(|| ApiError::not_found("No user with this ID"))?;

        self.db
            .users()
            .update_about(id, about)
            .await
            .db_err("Failed to update about")?;

        self.issue_for(&User {
            about: Some(about.to_string()),
            ..user
        })
    }

    /// Delete the account after verifying the password. Owned products (and
    /// through them, favorites) are swept before the identity row goes.
    pub async fn delete_account(&self, id: i64, password: &str) -> Result<&'static str, ApiError> {
        let hash = self
            .db
            .users()
            .password_hash_by_id(id)
            .await
            .db_err("Failed to look up credentials")?
            .ok_or_else(|| ApiError::not_found("No such user"))?;

        if !self.passwords.verify(password, &hash) {
            return Err(ApiError::forbidden("Wrong password"));
        }

        self.db
            .products()
            .delete_all_owned_by(id)
            .await
            .db_err("Failed to delete owned products")?;
        self.db
            .users()
            .delete(id)
            .await
            .db_err("Failed to delete user")?;

        Ok("User and all their products were deleted")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    async fn service() -> AuthService {
        let db = Database::open(":memory:").await.unwrap();
        let jwt = Arc::new(JwtConfig::new(
            b"access-secret-for-testing",
            b"refresh-secret-for-testing",
        ));
        let passwords = PasswordService::with_params(8, 1, 1).unwrap();
        AuthService::new(db, jwt, passwords)
    }

    fn jwt() -> JwtConfig {
        JwtConfig::new(b"access-secret-for-testing", b"refresh-secret-for-testing")
    }

    #[tokio::test]
    async fn test_register_then_login() {
        let service = service().await;

        let registered = service.register("alice", "pw1").await.unwrap();
        let logged_in = service.login("alice", "pw1").await.unwrap();

        let a = jwt().validate_access(&registered.access).unwrap();
        let b = jwt().validate_access(&logged_in.access).unwrap();
        assert_eq!(a.id, b.id);
        assert_eq!(a.name, "alice");
        assert_eq!(b.name, "alice");
    }

    #[tokio::test]
    async fn test_login_wrong_password() {
        let service = service().await;
        service.register("alice", "pw1").await.unwrap();

        match service.login("alice", "wrong").await {
            Err(ApiError::Forbidden(_)) => {}
            other => panic!("expected Forbidden, got {:?}", other.map(|_| ())),
        }
    }

    #[tokio::test]
    async fn test_login_unknown_user() {
        let service = service().await;

        match service.login("nobody", "pw").await {
            Err(ApiError::NotFound(_)) => {}
            other => panic!("expected NotFound, got {:?}", other.map(|_| ())),
        }
    }

    #[tokio::test]
    async fn test_register_taken_name_rejected() {
        let service = service().await;
        service.register("alice", "pw1").await.unwrap();

        match service.register("alice", "pw2").await {
            Err(ApiError::BadRequest(_)) => {}
            other => panic!("expected BadRequest, got {:?}", other.map(|_| ())),
        }

        // Rejection mutates nothing: the original password still works.
        service.login("alice", "pw1").await.unwrap();
    }

    #[tokio::test]
    async fn test_refresh_reissues_from_token_claims() {
        let service = service().await;
        let pair = service.register("alice", "pw1").await.unwrap();

        let rotated = service.refresh(&pair.refresh).unwrap();
        let claims = jwt().validate_access(&rotated.access).unwrap();
        assert_eq!(claims.name, "alice");

        assert!(matches!(
            service.refresh("garbage"),
            Err(ApiError::Unauthorized(_))
        ));
        // Access tokens do not pass as refresh tokens.
        assert!(matches!(
            service.refresh(&pair.access),
            Err(ApiError::Unauthorized(_))
        ));
    }

    #[tokio::test]
    async fn test_change_password_flow() {
        let service = service().await;
        let pair = service.register("alice", "old-pw").await.unwrap();
        let id = jwt().validate_access(&pair.access).unwrap().id;

        assert!(matches!(
            service.change_password(id, "bad", "new-pw").await,
            Err(ApiError::Forbidden(_))
        ));
        assert!(matches!(
            service.change_password(999, "old-pw", "new-pw").await,
            Err(ApiError::NotFound(_))
        ));

        service.change_password(id, "old-pw", "new-pw").await.unwrap();
        assert!(matches!(
            service.login("alice", "old-pw").await,
            Err(ApiError::Forbidden(_))
        ));
        service.login("alice", "new-pw").await.unwrap();
    }

    #[tokio::test]
    async fn test_change_name_conflict_leaves_row_unchanged() {
        let service = service().await;
        let alice = service.register("alice", "pw").await.unwrap();
        service.register("bob", "pw").await.unwrap();
        let alice_id = jwt().validate_access(&alice.access).unwrap().id;

        assert!(matches!(
            service.change_name(alice_id, "bob").await,
            Err(ApiError::BadRequest(_))
        ));
        // Alice keeps her name.
        service.login("alice", "pw").await.unwrap();

        // Renaming to a free name reissues claims carrying it.
        let pair = service.change_name(alice_id, "alicia").await.unwrap();
        let claims = jwt().validate_access(&pair.access).unwrap();
        assert_eq!(claims.name, "alicia");
        assert_eq!(claims.id, alice_id);
    }

    #[tokio::test]
    async fn test_change_name_to_own_name_is_allowed() {
        let service = service().await;
        let pair = service.register("alice", "pw").await.unwrap();
        let id = jwt().validate_access(&pair.access).unwrap().id;

        service.change_name(id, "alice").await.unwrap();
    }

    #[tokio::test]
    async fn test_change_about_reissues_claims() {
        let service = service().await;
        let pair = service.register("alice", "pw").await.unwrap();
        let id = jwt().validate_access(&pair.access).unwrap().id;

        let rotated = service.change_about(id, "hat merchant").await.unwrap();
        let claims = jwt().validate_access(&rotated.access).unwrap();
        assert_eq!(claims.about.as_deref(), Some("hat merchant"));

        assert!(matches!(
            service.change_about(999, "x").await,
            Err(ApiError::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn test_delete_account_cascades_and_removes_login() {
        let service = service().await;
        let pair = service.register("seller", "pw").await.unwrap();
        let id = jwt().validate_access(&pair.access).unwrap().id;

        let db = service.db.clone();
        db.products().create(id, "Hat", 500, "RUB").await.unwrap();

        assert!(matches!(
            service.delete_account(id, "wrong").await,
            Err(ApiError::Forbidden(_))
        ));

        service.delete_account(id, "pw").await.unwrap();
        assert_eq!(db.products().count_by_owner(id).await.unwrap(), 0);
        assert!(matches!(
            service.login("seller", "pw").await,
            Err(ApiError::NotFound(_))
        ));
        assert!(matches!(
            service.delete_account(id, "pw").await,
            Err(ApiError::NotFound(_))
        ));
    }
}
