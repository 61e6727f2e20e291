use actix_web::{dev::Payload, Error, FromRequest, HttpRequest, HttpResponse};
use futures::future::{ready, Ready};

use crate::utils::jwt;

pub const REFRESH_COOKIE: &str = "refreshToken";
pub const REFRESH_HEADER: &str = "x-refresh-token";

/// Identité portée par le refresh token, plus le token brut lui-même:
/// le service auth doit le comparer au hash stocké avant de tourner la paire.
#[derive(Debug, Clone)]
pub struct RefreshUser {
    pub user_id: i32,
    pub email: String,
    pub roles: Vec<String>,
    pub refresh_token: String,
}

fn unauthorized(message: &str) -> Error {
    let response = HttpResponse::Unauthorized().json(serde_json::json!({
        "error": message
    }));
    actix_web::error::InternalError::from_response("", response).into()
}

impl FromRequest for RefreshUser {
    type Error = Error;
    type Future = Ready<Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _payload: &mut Payload) -> Self::Future {
        // 1. Cookie refreshToken d'abord, header x-refresh-token en secours
        let token = req
            .cookie(REFRESH_COOKIE)
            .map(|cookie| cookie.value().to_string())
            .or_else(|| {
                req.headers()
                    .get(REFRESH_HEADER)
                    .and_then(|header| header.to_str().ok())
                    .map(|s| s.to_string())
            });

        let token = match token {
            Some(token) => token,
            None => return ready(Err(unauthorized("Missing refresh token"))),
        };

        // 2. Vérifier signature + expiration avec le secret refresh
        let claims = match jwt::verify_refresh_token(&token) {
            Ok(claims) => claims,
            Err(e) => return ready(Err(unauthorized(&format!("Invalid token: {}", e)))),
        };

        ready(Ok(RefreshUser {
            user_id: claims.sub,
            email: claims.email,
            roles: claims.roles,
            refresh_token: token,
        }))
    }
}
