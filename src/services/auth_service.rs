use chrono::{DateTime, Duration, Utc};
use sea_orm::DatabaseConnection;

use crate::config::Config;
use crate::error::ApiError;
use crate::models::users;
use crate::services::mail_service::MailSender;
use crate::services::user_service::UserService;
use crate::utils::{jwt, password, token};

/// Paire émise à chaque login/refresh. Le refresh token n'est stocké
/// en base que sous forme de hash salé.
#[derive(Debug)]
pub struct TokenPair {
    pub access_token: String,
    pub refresh_token: String,
}

/// Résultat de POST /auth/resend-confirmation
#[derive(Debug, PartialEq)]
pub enum ResendOutcome {
    /// Email inconnu ou déjà confirmé: on ne révèle pas son existence
    Ok,
    /// Un token de confirmation non expiré existe encore
    Cooldown { seconds_left: i64 },
    /// Nouveau token émis et email envoyé
    Sent,
}

/// Résultat de GET /auth/confirmation-status
#[derive(Debug, PartialEq)]
pub struct ConfirmationStatus {
    pub can_resend: bool,
    pub reason: Option<&'static str>, // "already_verified" | "cooldown"
    pub seconds_left: Option<i64>,
}

pub struct RegisterData {
    pub email: String,
    pub password: String,
    pub name: String,
}

pub struct AuthService;

impl AuthService {
    pub async fn register(
        db: &DatabaseConnection,
        config: &Config,
        mail: &dyn MailSender,
        data: RegisterData,
    ) -> Result<(), ApiError> {
        if let Some(candidate) = UserService::find_by_email(db, &data.email).await? {
            if !candidate.is_email_verified {
                // Marqueur exact attendu par le client
                return Err(ApiError::Conflict("EMAIL_EXISTS_NOT_VERIFIED".to_string()));
            }
            return Err(ApiError::Conflict("Email already registered".to_string()));
        }

        let password_hash = password::hash_password(&data.password).map_err(ApiError::Internal)?;
        let user = UserService::create(db, &data.email, &password_hash, &data.name).await?;

        Self::issue_email_confirmation(db, config, mail, user.id, &user.email).await?;

        Ok(())
    }

    pub async fn login(
        db: &DatabaseConnection,
        email: &str,
        raw_password: &str,
    ) -> Result<TokenPair, ApiError> {
        let user = UserService::find_by_email(db, email)
            .await?
            .ok_or_else(|| ApiError::Unauthorized("Invalid email or password".to_string()))?;

        if !user.is_email_verified {
            return Err(ApiError::Forbidden("Email is not verified".to_string()));
        }

        let password_matches = password::verify_password(raw_password, &user.password_hash)
            .map_err(ApiError::Internal)?;
        if !password_matches {
            return Err(ApiError::Unauthorized("Invalid email or password".to_string()));
        }

        Self::generate_tokens(db, &user).await
    }

    /// Rotation: chaque refresh réussi émet une nouvelle paire et écrase
    /// le hash stocké. Pas de détection de réutilisation.
    pub async fn refresh(
        db: &DatabaseConnection,
        user_id: i32,
        presented_token: &str,
    ) -> Result<TokenPair, ApiError> {
        let user = UserService::find_by_id(db, user_id)
            .await?
            .ok_or_else(|| ApiError::Unauthorized("Invalid token".to_string()))?;

        let stored_hash = user
            .refresh_token_hash
            .as_deref()
            .ok_or_else(|| ApiError::Unauthorized("Invalid token".to_string()))?;

        let token_matches =
            password::verify_password(presented_token, stored_hash).map_err(ApiError::Internal)?;
        if !token_matches {
            return Err(ApiError::Unauthorized("Invalid token".to_string()));
        }

        Self::generate_tokens(db, &user).await
    }

    pub async fn logout(db: &DatabaseConnection, user_id: i32) -> Result<(), ApiError> {
        UserService::clear_refresh_token(db, user_id).await?;
        Ok(())
    }

    pub async fn confirm_email(
        db: &DatabaseConnection,
        presented_token: Option<String>,
    ) -> Result<(), ApiError> {
        let presented_token = presented_token
            .filter(|t| !t.is_empty())
            .ok_or_else(|| ApiError::BadRequest("Token is required".to_string()))?;

        let token_hash = token::sha256_hex(&presented_token);
        let user = UserService::find_by_email_verification_token_hash(db, &token_hash)
            .await?
            .ok_or_else(|| ApiError::BadRequest("Invalid token".to_string()))?;

        match user.email_verification_token_expires_at {
            Some(expires_at) if expires_at > Utc::now() => {}
            _ => return Err(ApiError::BadRequest("Token has expired".to_string())),
        }

        UserService::mark_email_verified(db, user.id).await?;

        Ok(())
    }

    pub async fn resend_confirmation(
        db: &DatabaseConnection,
        config: &Config,
        mail: &dyn MailSender,
        email: &str,
    ) -> Result<ResendOutcome, ApiError> {
        let user = match UserService::find_by_email(db, email).await? {
            // On ne révèle pas l'existence de l'email
            None => return Ok(ResendOutcome::Ok),
            Some(user) if user.is_email_verified => return Ok(ResendOutcome::Ok),
            Some(user) => user,
        };

        if let Some(expires_at) = user.email_verification_token_expires_at {
            let now = Utc::now();
            if expires_at > now {
                return Ok(ResendOutcome::Cooldown {
                    seconds_left: Self::seconds_left(expires_at, now),
                });
            }
        }

        Self::issue_email_confirmation(db, config, mail, user.id, &user.email).await?;

        Ok(ResendOutcome::Sent)
    }

    pub async fn confirmation_status(
        db: &DatabaseConnection,
        email: &str,
    ) -> Result<ConfirmationStatus, ApiError> {
        let can_resend = ConfirmationStatus {
            can_resend: true,
            reason: None,
            seconds_left: None,
        };

        let user = match UserService::find_by_email(db, email).await? {
            // On ne révèle pas l'existence de l'email
            None => return Ok(can_resend),
            Some(user) => user,
        };

        if user.is_email_verified {
            return Ok(ConfirmationStatus {
                can_resend: false,
                reason: Some("already_verified"),
                seconds_left: None,
            });
        }

        match user.email_verification_token_expires_at {
            Some(expires_at) => {
                let now = Utc::now();
                if expires_at > now {
                    Ok(ConfirmationStatus {
                        can_resend: false,
                        reason: Some("cooldown"),
                        seconds_left: Some(Self::seconds_left(expires_at, now)),
                    })
                } else {
                    Ok(can_resend)
                }
            }
            None => Ok(can_resend),
        }
    }

    pub async fn change_password(
        db: &DatabaseConnection,
        user_id: i32,
        current_password: &str,
        new_password: &str,
    ) -> Result<(), ApiError> {
        let user = UserService::find_by_id(db, user_id)
            .await?
            .ok_or_else(|| ApiError::Unauthorized("User not found".to_string()))?;

        let password_matches = password::verify_password(current_password, &user.password_hash)
            .map_err(ApiError::Internal)?;
        if !password_matches {
            return Err(ApiError::BadRequest("Current password is incorrect".to_string()));
        }

        let new_hash = password::hash_password(new_password).map_err(ApiError::Internal)?;
        UserService::set_password(db, user.id, &new_hash).await?;

        // La session refresh en cours tombe avec l'ancien mot de passe
        UserService::clear_refresh_token(db, user.id).await?;

        Ok(())
    }

    pub async fn request_password_reset(
        db: &DatabaseConnection,
        config: &Config,
        mail: &dyn MailSender,
        email: &str,
    ) -> Result<(), ApiError> {
        let user = match UserService::find_by_email(db, email).await? {
            // On ne révèle pas l'existence de l'email
            None => return Ok(()),
            Some(user) => user,
        };

        let raw_token = token::generate_token();
        let token_hash = token::sha256_hex(&raw_token);
        let expires_at = Utc::now() + Duration::seconds(config.password_reset_token_expiration);

        UserService::set_password_reset_token(db, user.id, &token_hash, expires_at).await?;

        let reset_url = format!("{}/auth/reset-password?token={}", config.domen, raw_token);
        mail.send_password_reset(&user.email, &reset_url).await?;

        Ok(())
    }

    pub async fn confirm_password_reset(
        db: &DatabaseConnection,
        presented_token: &str,
        new_password: &str,
    ) -> Result<(), ApiError> {
        if presented_token.is_empty() {
            return Err(ApiError::BadRequest("Token is required".to_string()));
        }

        let token_hash = token::sha256_hex(presented_token);
        let user = UserService::find_by_password_reset_token_hash(db, &token_hash)
            .await?
            .ok_or_else(|| ApiError::BadRequest("Invalid token".to_string()))?;

        match user.password_reset_token_expires_at {
            Some(expires_at) if expires_at > Utc::now() => {}
            _ => return Err(ApiError::BadRequest("Token has expired".to_string())),
        }

        let new_hash = password::hash_password(new_password).map_err(ApiError::Internal)?;
        UserService::set_password(db, user.id, &new_hash).await?;

        UserService::clear_password_reset_token(db, user.id).await?;
        UserService::clear_refresh_token(db, user.id).await?;

        Ok(())
    }

    /// Émet un token de confirmation: hash + expiration stockés, token brut
    /// envoyé par email dans l'URL de confirmation.
    async fn issue_email_confirmation(
        db: &DatabaseConnection,
        config: &Config,
        mail: &dyn MailSender,
        user_id: i32,
        email: &str,
    ) -> Result<(), ApiError> {
        let raw_token = token::generate_token();
        let token_hash = token::sha256_hex(&raw_token);
        let expires_at = Utc::now() + Duration::seconds(config.email_confirm_token_expiration);

        UserService::set_email_verification_token(db, user_id, &token_hash, expires_at).await?;

        let confirm_url = format!("{}/api/auth/confirm-email?token={}", config.domen, raw_token);
        mail.send_email_confirmation(email, &confirm_url).await?;

        Ok(())
    }

    async fn generate_tokens(
        db: &DatabaseConnection,
        user: &users::Model,
    ) -> Result<TokenPair, ApiError> {
        let roles = UserService::roles_of(db, user).await?;

        let access_token =
            jwt::generate_access_token(user.id, &user.email, &roles).map_err(ApiError::Internal)?;
        let refresh_token =
            jwt::generate_refresh_token(user.id, &user.email, &roles).map_err(ApiError::Internal)?;

        UserService::set_refresh_token(db, user.id, &refresh_token).await?;

        Ok(TokenPair {
            access_token,
            refresh_token,
        })
    }

    /// Secondes restantes avant expiration, arrondies vers le haut
    fn seconds_left(expires_at: DateTime<Utc>, now: DateTime<Utc>) -> i64 {
        ((expires_at - now).num_milliseconds() + 999) / 1000
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sea_orm::{DatabaseBackend, MockDatabase, MockExecResult};

    use crate::models::roles;

    struct MockMail;

    #[async_trait::async_trait]
    impl MailSender for MockMail {
        async fn send_email_confirmation(&self, _to: &str, _url: &str) -> Result<(), ApiError> {
            Ok(())
        }

        async fn send_password_reset(&self, _to: &str, _url: &str) -> Result<(), ApiError> {
            Ok(())
        }

        async fn send_support_email(&self, _from: &str, _message: &str) -> Result<(), ApiError> {
            Ok(())
        }
    }

    fn test_config() -> Config {
        Config {
            port: 5000,
            client_url: "http://localhost:5173".to_string(),
            domen: "http://localhost:5000".to_string(),
            cookie_secure: false,
            email_confirm_token_expiration: 300,
            password_reset_token_expiration: 3600,
            smtp_host: "localhost".to_string(),
            smtp_port: 587,
            smtp_user: "support@mail.ru".to_string(),
            smtp_pass: "password".to_string(),
            smtp_from: "support@mail.ru".to_string(),
        }
    }

    fn test_user() -> users::Model {
        users::Model {
            id: 1,
            email: "you@mail.ru".to_string(),
            password_hash: String::new(),
            name: "Иван".to_string(),
            country: None,
            region: None,
            district: None,
            is_estate: false,
            estate_type: None,
            settlement: None,
            photo_url: None,
            is_email_verified: false,
            refresh_token_hash: None,
            email_verification_token_hash: None,
            email_verification_token_expires_at: None,
            password_reset_token_hash: None,
            password_reset_token_expires_at: None,
        }
    }

    fn exec_ok() -> MockExecResult {
        MockExecResult {
            last_insert_id: 0,
            rows_affected: 1,
        }
    }

    #[tokio::test]
    async fn test_confirm_email_requires_token() {
        let db = MockDatabase::new(DatabaseBackend::Postgres).into_connection();

        let err = AuthService::confirm_email(&db, None).await.unwrap_err();
        assert!(matches!(err, ApiError::BadRequest(_)));

        let err = AuthService::confirm_email(&db, Some(String::new()))
            .await
            .unwrap_err();
        assert!(matches!(err, ApiError::BadRequest(_)));
    }

    #[tokio::test]
    async fn test_confirm_email_rejects_unknown_token() {
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([Vec::<users::Model>::new()])
            .into_connection();

        let err = AuthService::confirm_email(&db, Some("deadbeef".to_string()))
            .await
            .unwrap_err();
        assert!(matches!(err, ApiError::BadRequest(_)));
    }

    #[tokio::test]
    async fn test_confirm_email_rejects_expired_token() {
        let user = users::Model {
            email_verification_token_hash: Some(token::sha256_hex("deadbeef")),
            email_verification_token_expires_at: Some(Utc::now() - Duration::hours(1)),
            ..test_user()
        };

        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([vec![user]])
            .into_connection();

        let err = AuthService::confirm_email(&db, Some("deadbeef".to_string()))
            .await
            .unwrap_err();
        assert!(matches!(err, ApiError::BadRequest(_)));
    }

    #[tokio::test]
    async fn test_confirm_email_marks_user_verified() {
        let user = users::Model {
            email_verification_token_hash: Some(token::sha256_hex("deadbeef")),
            email_verification_token_expires_at: Some(Utc::now() + Duration::hours(24)),
            ..test_user()
        };

        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([vec![user]])
            .append_exec_results([exec_ok()])
            .into_connection();

        assert!(AuthService::confirm_email(&db, Some("deadbeef".to_string()))
            .await
            .is_ok());
    }

    #[tokio::test]
    async fn test_register_rejects_existing_unverified_email() {
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([vec![test_user()]])
            .into_connection();

        let data = RegisterData {
            email: "you@mail.ru".to_string(),
            password: "qwerty123".to_string(),
            name: "Иван".to_string(),
        };

        let err = AuthService::register(&db, &test_config(), &MockMail, data)
            .await
            .unwrap_err();
        match err {
            ApiError::Conflict(msg) => assert_eq!(msg, "EMAIL_EXISTS_NOT_VERIFIED"),
            other => panic!("expected Conflict, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_register_rejects_existing_verified_email() {
        let user = users::Model {
            is_email_verified: true,
            ..test_user()
        };

        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([vec![user]])
            .into_connection();

        let data = RegisterData {
            email: "you@mail.ru".to_string(),
            password: "qwerty123".to_string(),
            name: "Иван".to_string(),
        };

        let err = AuthService::register(&db, &test_config(), &MockMail, data)
            .await
            .unwrap_err();
        assert!(matches!(err, ApiError::Conflict(_)));
    }

    #[tokio::test]
    async fn test_login_rejects_unverified_email() {
        let user = users::Model {
            password_hash: password::hash_password("qwerty123").unwrap(),
            ..test_user()
        };

        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([vec![user]])
            .into_connection();

        let err = AuthService::login(&db, "you@mail.ru", "qwerty123")
            .await
            .unwrap_err();
        assert!(matches!(err, ApiError::Forbidden(_)));
    }

    #[tokio::test]
    async fn test_login_rejects_wrong_password() {
        let user = users::Model {
            is_email_verified: true,
            password_hash: password::hash_password("qwerty123").unwrap(),
            ..test_user()
        };

        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([vec![user]])
            .into_connection();

        let err = AuthService::login(&db, "you@mail.ru", "qwerty124")
            .await
            .unwrap_err();
        assert!(matches!(err, ApiError::Unauthorized(_)));
    }

    #[tokio::test]
    async fn test_refresh_rotates_stored_hash() {
        let old_refresh = jwt::generate_refresh_token(1, "you@mail.ru", &[]).unwrap();
        let user = users::Model {
            is_email_verified: true,
            refresh_token_hash: Some(password::hash_password(&old_refresh).unwrap()),
            ..test_user()
        };

        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([vec![user]])
            .append_query_results([Vec::<roles::Model>::new()])
            .append_exec_results([exec_ok()])
            .into_connection();

        let pair = AuthService::refresh(&db, 1, &old_refresh).await.unwrap();

        // Une nouvelle paire est émise, le hash stocké est écrasé
        assert!(!pair.access_token.is_empty());
        assert_ne!(pair.refresh_token, old_refresh);
        assert_eq!(jwt::verify_refresh_token(&pair.refresh_token).unwrap().sub, 1);
    }

    #[tokio::test]
    async fn test_refresh_rejects_mismatched_token() {
        let user = users::Model {
            is_email_verified: true,
            refresh_token_hash: Some(password::hash_password("stored-token").unwrap()),
            ..test_user()
        };

        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([vec![user]])
            .into_connection();

        let err = AuthService::refresh(&db, 1, "another-token").await.unwrap_err();
        assert!(matches!(err, ApiError::Unauthorized(_)));
    }

    #[tokio::test]
    async fn test_refresh_rejects_user_without_stored_hash() {
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([vec![test_user()]])
            .into_connection();

        let err = AuthService::refresh(&db, 1, "whatever").await.unwrap_err();
        assert!(matches!(err, ApiError::Unauthorized(_)));
    }

    #[tokio::test]
    async fn test_resend_confirmation_reports_cooldown() {
        let user = users::Model {
            email_verification_token_hash: Some("hash".to_string()),
            email_verification_token_expires_at: Some(Utc::now() + Duration::seconds(90)),
            ..test_user()
        };

        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([vec![user]])
            .into_connection();

        let outcome = AuthService::resend_confirmation(&db, &test_config(), &MockMail, "you@mail.ru")
            .await
            .unwrap();

        match outcome {
            ResendOutcome::Cooldown { seconds_left } => {
                assert!(seconds_left > 0 && seconds_left <= 90);
            }
            other => panic!("expected cooldown, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_resend_confirmation_silent_for_unknown_email() {
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([Vec::<users::Model>::new()])
            .into_connection();

        let outcome = AuthService::resend_confirmation(&db, &test_config(), &MockMail, "nobody@mail.ru")
            .await
            .unwrap();

        assert_eq!(outcome, ResendOutcome::Ok);
    }

    #[tokio::test]
    async fn test_confirmation_status_for_verified_user() {
        let user = users::Model {
            is_email_verified: true,
            ..test_user()
        };

        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([vec![user]])
            .into_connection();

        let status = AuthService::confirmation_status(&db, "you@mail.ru").await.unwrap();

        assert!(!status.can_resend);
        assert_eq!(status.reason, Some("already_verified"));
    }

    #[tokio::test]
    async fn test_change_password_rejects_wrong_current_password() {
        let user = users::Model {
            is_email_verified: true,
            password_hash: password::hash_password("qwerty123").unwrap(),
            ..test_user()
        };

        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([vec![user]])
            .into_connection();

        let err = AuthService::change_password(&db, 1, "wrong-password", "new-password")
            .await
            .unwrap_err();
        assert!(matches!(err, ApiError::BadRequest(_)));
    }

    #[test]
    fn test_seconds_left_rounds_up() {
        let now = Utc::now();

        assert_eq!(AuthService::seconds_left(now + Duration::milliseconds(1500), now), 2);
        assert_eq!(AuthService::seconds_left(now + Duration::seconds(90), now), 90);
    }
}
