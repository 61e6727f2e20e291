use actix_web::{get, post, web, HttpResponse};
use actix_web::cookie::{Cookie, SameSite};
use sea_orm::DatabaseConnection;
use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::config::Config;
use crate::error::ApiError;
use crate::middleware::refresh::REFRESH_COOKIE;
use crate::middleware::{AuthUser, RefreshUser};
use crate::services::auth_service::{AuthService, RegisterData, ResendOutcome};
use crate::services::mail_service::MailService;

// Le cookie ne circule que sur les routes auth
const COOKIE_PATH: &str = "/api/auth";

// DTO pour l'inscription
#[derive(Deserialize, Validate)]
pub struct RegisterRequest {
    #[validate(email)]
    pub email: String,
    #[validate(length(min = 6))]
    pub password: String,
    pub name: String,
}

// DTO pour la connexion
#[derive(Deserialize, Validate)]
pub struct LoginRequest {
    #[validate(email)]
    pub email: String,
    pub password: String,
}

// DTO pour changer le mot de passe
#[derive(Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct ChangePasswordRequest {
    pub current_password: String,
    #[validate(length(min = 6))]
    pub new_password: String,
}

#[derive(Deserialize, Validate)]
pub struct ResendConfirmationRequest {
    #[validate(email)]
    pub email: String,
}

#[derive(Deserialize, Validate)]
pub struct RequestPasswordResetRequest {
    #[validate(email)]
    pub email: String,
}

#[derive(Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct ConfirmPasswordResetRequest {
    pub token: String,
    #[validate(length(min = 6))]
    pub new_password: String,
}

#[derive(Deserialize)]
pub struct ConfirmEmailQuery {
    pub token: Option<String>,
}

#[derive(Deserialize)]
pub struct ConfirmationStatusQuery {
    pub email: String,
}

// Réponse après login/refresh: le refresh token part en cookie, pas en JSON
#[derive(Serialize)]
pub struct AuthResponse {
    pub access_token: String,
}

// Réponse pour /auth/me
#[derive(Serialize)]
pub struct MeResponse {
    pub id: i32,
    pub email: String,
    pub roles: Vec<String>,
}

#[derive(Serialize)]
pub struct ResendConfirmationResponse {
    pub status: &'static str,
    #[serde(rename = "secondsLeft", skip_serializing_if = "Option::is_none")]
    pub seconds_left: Option<i64>,
}

#[derive(Serialize)]
pub struct ConfirmationStatusResponse {
    #[serde(rename = "canResend")]
    pub can_resend: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason: Option<&'static str>,
    #[serde(rename = "secondsLeft", skip_serializing_if = "Option::is_none")]
    pub seconds_left: Option<i64>,
}

fn refresh_cookie(token: &str, secure: bool) -> Cookie<'static> {
    let mut cookie = Cookie::new(REFRESH_COOKIE, token.to_string());
    cookie.set_http_only(true);
    cookie.set_same_site(SameSite::Lax);
    cookie.set_secure(secure);
    cookie.set_path(COOKIE_PATH);
    cookie
}

fn removal_cookie() -> Cookie<'static> {
    let mut cookie = Cookie::new(REFRESH_COOKIE, "");
    cookie.set_path(COOKIE_PATH);
    cookie.make_removal();
    cookie
}

/// POST /auth/register - Créer un compte, envoie l'email de confirmation (PUBLIC)
#[post("/register")]
pub async fn register(
    body: web::Json<RegisterRequest>,
    db: web::Data<DatabaseConnection>,
    config: web::Data<Config>,
    mail: web::Data<MailService>,
) -> Result<HttpResponse, ApiError> {
    if let Err(errors) = body.validate() {
        return Ok(HttpResponse::BadRequest().json(errors));
    }

    let body = body.into_inner();
    AuthService::register(
        db.get_ref(),
        config.get_ref(),
        mail.get_ref(),
        RegisterData {
            email: body.email,
            password: body.password,
            name: body.name,
        },
    )
    .await?;

    Ok(HttpResponse::Created().json(serde_json::json!({ "status": "ok" })))
}

/// POST /auth/login - Se connecter, pose le cookie refreshToken (PUBLIC)
#[post("/login")]
pub async fn login(
    body: web::Json<LoginRequest>,
    db: web::Data<DatabaseConnection>,
    config: web::Data<Config>,
) -> Result<HttpResponse, ApiError> {
    if let Err(errors) = body.validate() {
        return Ok(HttpResponse::BadRequest().json(errors));
    }

    let tokens = AuthService::login(db.get_ref(), &body.email, &body.password).await?;

    Ok(HttpResponse::Ok()
        .cookie(refresh_cookie(&tokens.refresh_token, config.cookie_secure))
        .json(AuthResponse {
            access_token: tokens.access_token,
        }))
}

/// POST /auth/refresh - Nouvelle paire de tokens par rotation (cookie refreshToken)
#[post("/refresh")]
pub async fn refresh(
    refresh_user: RefreshUser,
    db: web::Data<DatabaseConnection>,
    config: web::Data<Config>,
) -> Result<HttpResponse, ApiError> {
    let tokens = AuthService::refresh(
        db.get_ref(),
        refresh_user.user_id,
        &refresh_user.refresh_token,
    )
    .await?;

    Ok(HttpResponse::Ok()
        .cookie(refresh_cookie(&tokens.refresh_token, config.cookie_secure))
        .json(AuthResponse {
            access_token: tokens.access_token,
        }))
}

/// POST /auth/logout - Révoque le refresh token et supprime le cookie
#[post("/logout")]
pub async fn logout(
    refresh_user: RefreshUser,
    db: web::Data<DatabaseConnection>,
) -> Result<HttpResponse, ApiError> {
    AuthService::logout(db.get_ref(), refresh_user.user_id).await?;

    Ok(HttpResponse::Ok()
        .cookie(removal_cookie())
        .json(serde_json::json!({ "status": "ok" })))
}

/// GET /auth/confirm-email?token=... - Confirme l'email puis redirige vers le client (PUBLIC)
#[get("/confirm-email")]
pub async fn confirm_email(
    query: web::Query<ConfirmEmailQuery>,
    db: web::Data<DatabaseConnection>,
    config: web::Data<Config>,
) -> Result<HttpResponse, ApiError> {
    AuthService::confirm_email(db.get_ref(), query.into_inner().token).await?;

    let redirect_url = format!("{}/auth/email-confirmed", config.client_url);
    Ok(HttpResponse::Found()
        .append_header(("Location", redirect_url))
        .finish())
}

/// GET /auth/me - Identité portée par l'access token (PROTÉGÉE)
#[get("/me")]
pub async fn me(auth_user: AuthUser) -> HttpResponse {
    HttpResponse::Ok().json(MeResponse {
        id: auth_user.user_id,
        email: auth_user.email,
        roles: auth_user.roles,
    })
}

/// POST /auth/resend-confirmation - Renvoie l'email de confirmation, avec cooldown (PUBLIC)
#[post("/resend-confirmation")]
pub async fn resend_confirmation(
    body: web::Json<ResendConfirmationRequest>,
    db: web::Data<DatabaseConnection>,
    config: web::Data<Config>,
    mail: web::Data<MailService>,
) -> Result<HttpResponse, ApiError> {
    if let Err(errors) = body.validate() {
        return Ok(HttpResponse::BadRequest().json(errors));
    }

    let outcome = AuthService::resend_confirmation(
        db.get_ref(),
        config.get_ref(),
        mail.get_ref(),
        &body.email,
    )
    .await?;

    let response = match outcome {
        ResendOutcome::Ok => ResendConfirmationResponse {
            status: "ok",
            seconds_left: None,
        },
        ResendOutcome::Cooldown { seconds_left } => ResendConfirmationResponse {
            status: "cooldown",
            seconds_left: Some(seconds_left),
        },
        ResendOutcome::Sent => ResendConfirmationResponse {
            status: "sent",
            seconds_left: None,
        },
    };

    Ok(HttpResponse::Ok().json(response))
}

/// GET /auth/confirmation-status?email=... - Peut-on renvoyer la confirmation ? (PUBLIC)
#[get("/confirmation-status")]
pub async fn confirmation_status(
    query: web::Query<ConfirmationStatusQuery>,
    db: web::Data<DatabaseConnection>,
) -> Result<HttpResponse, ApiError> {
    let status = AuthService::confirmation_status(db.get_ref(), &query.email).await?;

    Ok(HttpResponse::Ok().json(ConfirmationStatusResponse {
        can_resend: status.can_resend,
        reason: status.reason,
        seconds_left: status.seconds_left,
    }))
}

/// POST /auth/change-password - Changer son mot de passe (PROTÉGÉE)
#[post("/change-password")]
pub async fn change_password(
    auth_user: AuthUser,
    body: web::Json<ChangePasswordRequest>,
    db: web::Data<DatabaseConnection>,
) -> Result<HttpResponse, ApiError> {
    if let Err(errors) = body.validate() {
        return Ok(HttpResponse::BadRequest().json(errors));
    }

    AuthService::change_password(
        db.get_ref(),
        auth_user.user_id,
        &body.current_password,
        &body.new_password,
    )
    .await?;

    Ok(HttpResponse::Ok().json(serde_json::json!({ "status": "ok" })))
}

/// POST /auth/request-password-reset - Demande de reset, silencieux si email inconnu (PUBLIC)
#[post("/request-password-reset")]
pub async fn request_password_reset(
    body: web::Json<RequestPasswordResetRequest>,
    db: web::Data<DatabaseConnection>,
    config: web::Data<Config>,
    mail: web::Data<MailService>,
) -> Result<HttpResponse, ApiError> {
    if let Err(errors) = body.validate() {
        return Ok(HttpResponse::BadRequest().json(errors));
    }

    AuthService::request_password_reset(
        db.get_ref(),
        config.get_ref(),
        mail.get_ref(),
        &body.email,
    )
    .await?;

    Ok(HttpResponse::Ok().json(serde_json::json!({ "status": "ok" })))
}

/// POST /auth/confirm-password-reset - Applique le nouveau mot de passe (PUBLIC)
#[post("/confirm-password-reset")]
pub async fn confirm_password_reset(
    body: web::Json<ConfirmPasswordResetRequest>,
    db: web::Data<DatabaseConnection>,
) -> Result<HttpResponse, ApiError> {
    if let Err(errors) = body.validate() {
        return Ok(HttpResponse::BadRequest().json(errors));
    }

    AuthService::confirm_password_reset(db.get_ref(), &body.token, &body.new_password).await?;

    Ok(HttpResponse::Ok().json(serde_json::json!({ "status": "ok" })))
}

pub fn auth_routes(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/auth")
            .service(register)
            .service(login)
            .service(refresh)
            .service(logout)
            .service(confirm_email)
            .service(me)
            .service(resend_confirmation)
            .service(confirmation_status)
            .service(change_password)
            .service(request_password_reset)
            .service(confirm_password_reset)
    );
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_refresh_cookie_flags() {
        let cookie = refresh_cookie("token-value", true);

        assert_eq!(cookie.name(), "refreshToken");
        assert_eq!(cookie.value(), "token-value");
        assert_eq!(cookie.path(), Some("/api/auth"));
        assert_eq!(cookie.http_only(), Some(true));
        assert_eq!(cookie.secure(), Some(true));
        assert_eq!(cookie.same_site(), Some(SameSite::Lax));
    }

    #[test]
    fn test_refresh_cookie_secure_flag_follows_config() {
        let cookie = refresh_cookie("token-value", false);

        assert_eq!(cookie.secure(), Some(false));
    }

    #[test]
    fn test_removal_cookie_clears_value() {
        let cookie = removal_cookie();

        assert_eq!(cookie.name(), "refreshToken");
        assert_eq!(cookie.value(), "");
        assert_eq!(cookie.path(), Some("/api/auth"));
    }
}
