use jsonwebtoken::{encode, decode, Header, Validation, EncodingKey, DecodingKey, Algorithm};
use serde::{Deserialize, Serialize};
use chrono::{Utc, Duration};
use std::env;

/// Payload commun aux tokens access et refresh
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    pub sub: i32,            // user id
    pub email: String,
    pub roles: Vec<String>,  // valeurs des rôles ("USER", "ADMIN", ...)
    pub exp: i64,            // expiration timestamp
}

/// Récupère la clé secrète des access tokens depuis les variables d'environnement
fn get_access_secret() -> String {
    env::var("JWT_SECRET").unwrap_or_else(|_| {
        eprintln!("⚠️  WARNING: JWT_SECRET not found in .env, using default (INSECURE)");
        "default-insecure-access-key-change-this".to_string()
    })
}

/// Récupère la clé secrète des refresh tokens (distincte de celle des access tokens)
fn get_refresh_secret() -> String {
    env::var("JWT_REFRESH_SECRET").unwrap_or_else(|_| {
        eprintln!("⚠️  WARNING: JWT_REFRESH_SECRET not found in .env, using default (INSECURE)");
        "default-insecure-refresh-key-change-this".to_string()
    })
}

/// Durée de vie en secondes, lue depuis l'environnement
fn get_ttl_seconds(var: &str, default: i64) -> i64 {
    env::var(var)
        .ok()
        .and_then(|v| v.parse::<i64>().ok())
        .unwrap_or(default)
}

fn generate(user_id: i32, email: &str, roles: &[String], secret: &str, ttl_seconds: i64) -> Result<String, String> {
    let expiration = Utc::now()
        .checked_add_signed(Duration::seconds(ttl_seconds))
        .ok_or("Failed to calculate expiration")?
        .timestamp();

    let claims = Claims {
        sub: user_id,
        email: email.to_string(),
        roles: roles.to_vec(),
        exp: expiration,
    };

    encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(secret.as_ref()),
    )
        .map_err(|e| format!("Failed to generate token: {}", e))
}

fn verify(token: &str, secret: &str) -> Result<Claims, String> {
    decode::<Claims>(
        token,
        &DecodingKey::from_secret(secret.as_ref()),
        &Validation::new(Algorithm::HS256),
    )
        .map(|data| data.claims)
        .map_err(|e| format!("Invalid token: {}", e))
}

/// Génère un access token (courte durée, header Authorization)
pub fn generate_access_token(user_id: i32, email: &str, roles: &[String]) -> Result<String, String> {
    let ttl = get_ttl_seconds("JWT_EXPIRATION", 900);
    generate(user_id, email, roles, &get_access_secret(), ttl)
}

/// Génère un refresh token (longue durée, cookie httpOnly)
pub fn generate_refresh_token(user_id: i32, email: &str, roles: &[String]) -> Result<String, String> {
    let ttl = get_ttl_seconds("JWT_REFRESH_EXPIRATION", 2592000);
    generate(user_id, email, roles, &get_refresh_secret(), ttl)
}

/// Vérifie et décode un access token
pub fn verify_access_token(token: &str) -> Result<Claims, String> {
    verify(token, &get_access_secret())
}

/// Vérifie et décode un refresh token
pub fn verify_refresh_token(token: &str) -> Result<Claims, String> {
    verify(token, &get_refresh_secret())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_generate_and_verify_access_token() {
        let token = generate_access_token(123, "you@mail.ru", &["USER".to_string()]).unwrap();
        let claims = verify_access_token(&token).unwrap();

        assert_eq!(claims.sub, 123);
        assert_eq!(claims.email, "you@mail.ru");
        assert_eq!(claims.roles, vec!["USER".to_string()]);
    }

    #[test]
    fn test_generate_and_verify_refresh_token() {
        let token = generate_refresh_token(7, "you@mail.ru", &[]).unwrap();
        let claims = verify_refresh_token(&token).unwrap();

        assert_eq!(claims.sub, 7);
    }

    #[test]
    fn test_access_token_rejected_as_refresh_token() {
        // Secrets distincts: un access token ne passe jamais la vérification refresh
        let token = generate_access_token(123, "you@mail.ru", &[]).unwrap();

        assert!(verify_refresh_token(&token).is_err());
    }

    #[test]
    fn test_invalid_token() {
        let result = verify_access_token("invalid.token.here");
        assert!(result.is_err());
    }
}
