use std::env;

/// Configuration chargée une fois au démarrage depuis les variables
/// d'environnement (.env). Les secrets et durées JWT sont lus directement
/// par utils::jwt.
#[derive(Clone)]
pub struct Config {
    pub port: u16,
    pub client_url: String,
    pub domen: String,
    pub cookie_secure: bool,
    pub email_confirm_token_expiration: i64,   // secondes
    pub password_reset_token_expiration: i64,  // secondes
    pub smtp_host: String,
    pub smtp_port: u16,
    pub smtp_user: String,
    pub smtp_pass: String,
    pub smtp_from: String,
}

fn required(name: &str) -> String {
    env::var(name).unwrap_or_else(|_| panic!("{} must be set in .env file", name))
}

fn required_seconds(name: &str) -> i64 {
    required(name)
        .parse::<i64>()
        .unwrap_or_else(|_| panic!("{} must be a number (seconds)", name))
}

impl Config {
    pub fn from_env() -> Config {
        Config {
            port: env::var("PORT")
                .ok()
                .and_then(|v| v.parse::<u16>().ok())
                .unwrap_or(5000),
            client_url: required("CLIENT_URL"),
            domen: required("DOMEN"),
            cookie_secure: env::var("COOKIE_SECURE").as_deref() == Ok("true"),
            email_confirm_token_expiration: required_seconds("EMAIL_CONFIRM_TOKEN_EXPIRATION"),
            password_reset_token_expiration: required_seconds("PASSWORD_RESET_TOKEN_EXPIRATION"),
            smtp_host: required("SMTP_HOST"),
            smtp_port: required("SMTP_PORT")
                .parse::<u16>()
                .unwrap_or_else(|_| panic!("SMTP_PORT must be a number")),
            smtp_user: required("SMTP_USER"),
            smtp_pass: required("SMTP_PASS"),
            // SMTP_FROM optionnel: retombe sur SMTP_USER
            smtp_from: env::var("SMTP_FROM").unwrap_or_else(|_| required("SMTP_USER")),
        }
    }
}
