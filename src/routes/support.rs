use actix_web::{post, web, HttpResponse};
use serde::Deserialize;
use validator::Validate;

use crate::error::ApiError;
use crate::middleware::AuthUser;
use crate::services::mail_service::MailService;
use crate::services::support_service::SupportService;

#[derive(Deserialize, Validate)]
pub struct SupportRequest {
    #[validate(length(min = 1))]
    pub message: String,
}

/// POST /support - Envoyer un message au support (PROTÉGÉE)
#[post("")]
pub async fn send_message(
    auth_user: AuthUser,
    body: web::Json<SupportRequest>,
    mail: web::Data<MailService>,
) -> Result<HttpResponse, ApiError> {
    if let Err(errors) = body.validate() {
        return Ok(HttpResponse::BadRequest().json(errors));
    }

    SupportService::send_support_message(mail.get_ref(), &auth_user.email, &body.message).await?;

    Ok(HttpResponse::Ok().json(serde_json::json!({ "ok": true })))
}

pub fn support_routes(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/support")
            .service(send_message)
    );
}
