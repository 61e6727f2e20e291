use async_trait::async_trait;
use lettre::message::header::ContentType;
use lettre::message::{MultiPart, SinglePart};
use lettre::transport::smtp::authentication::Credentials;
use lettre::{Message, SmtpTransport, Transport};

use crate::config::Config;
use crate::error::ApiError;

/// Envoi d'emails transactionnels. Pas de retry, pas de file d'attente:
/// un échec SMTP remonte en erreur 500.
#[async_trait]
pub trait MailSender: Send + Sync {
    async fn send_email_confirmation(&self, to: &str, confirm_url: &str) -> Result<(), ApiError>;
    async fn send_password_reset(&self, to: &str, reset_url: &str) -> Result<(), ApiError>;
    async fn send_support_email(&self, from_email: &str, message: &str) -> Result<(), ApiError>;
}

#[derive(Clone)]
pub struct MailService {
    mailer: SmtpTransport,
    from: String,
    support_to: String,
}

impl MailService {
    pub fn new(config: &Config) -> Result<Self, ApiError> {
        let creds = Credentials::new(config.smtp_user.clone(), config.smtp_pass.clone());

        // TLS implicite sur 465, STARTTLS sinon
        let builder = if config.smtp_port == 465 {
            SmtpTransport::relay(&config.smtp_host)
        } else {
            SmtpTransport::starttls_relay(&config.smtp_host)
        };

        let mailer = builder
            .map_err(|e| ApiError::Internal(format!("SMTP transport error: {}", e)))?
            .credentials(creds)
            .port(config.smtp_port)
            .build();

        Ok(MailService {
            mailer,
            from: config.smtp_from.clone(),
            support_to: config.smtp_user.clone(),
        })
    }

    async fn send(
        &self,
        to: &str,
        reply_to: Option<&str>,
        subject: &str,
        text: String,
        html: String,
    ) -> Result<(), ApiError> {
        let mut builder = Message::builder()
            .from(self.from.parse().map_err(|e| {
                ApiError::Internal(format!("Invalid from address: {}", e))
            })?)
            .to(to.parse().map_err(|e| {
                ApiError::Internal(format!("Invalid to address: {}", e))
            })?)
            .subject(subject);

        if let Some(reply_to) = reply_to {
            builder = builder.reply_to(reply_to.parse().map_err(|e| {
                ApiError::Internal(format!("Invalid reply-to address: {}", e))
            })?);
        }

        let email = builder
            .multipart(
                MultiPart::alternative()
                    .singlepart(
                        SinglePart::builder()
                            .header(ContentType::TEXT_PLAIN)
                            .body(text),
                    )
                    .singlepart(
                        SinglePart::builder()
                            .header(ContentType::TEXT_HTML)
                            .body(html),
                    ),
            )
            .map_err(|e| ApiError::Internal(format!("Failed to build email: {}", e)))?;

        // L'envoi SMTP est bloquant: on le sort du runtime async
        let mailer = self.mailer.clone();
        let result = tokio::task::spawn_blocking(move || mailer.send(&email))
            .await
            .map_err(|e| ApiError::Internal(format!("Mail task failed: {}", e)))?;

        match result {
            Ok(_) => Ok(()),
            Err(e) => {
                eprintln!("❌ Failed to send email to {}: {}", to, e);
                Err(ApiError::Internal(format!("Failed to send email: {}", e)))
            }
        }
    }
}

#[async_trait]
impl MailSender for MailService {
    async fn send_email_confirmation(&self, to: &str, confirm_url: &str) -> Result<(), ApiError> {
        self.send(
            to,
            None,
            "Подтверждение email",
            format!("Подтвердите email, перейдя по ссылке: {}", confirm_url),
            format!(
                "Подтвердите email, перейдя по ссылке: <a href=\"{}\">{}</a>",
                confirm_url, confirm_url
            ),
        )
        .await?;

        println!("📧 Email confirmation sent to {}", to);
        Ok(())
    }

    async fn send_password_reset(&self, to: &str, reset_url: &str) -> Result<(), ApiError> {
        self.send(
            to,
            None,
            "Восстановление пароля",
            format!("Для сброса пароля перейдите по ссылке: {}", reset_url),
            format!(
                "Для сброса пароля перейдите по ссылке: <a href=\"{}\">{}</a>",
                reset_url, reset_url
            ),
        )
        .await?;

        println!("📧 Password reset email sent to {}", to);
        Ok(())
    }

    async fn send_support_email(&self, from_email: &str, message: &str) -> Result<(), ApiError> {
        self.send(
            &self.support_to,
            Some(from_email),
            "Сообщение в поддержку",
            format!("Сообщение от {}:\n\n{}", from_email, message),
            format!("Сообщение от {}:<br><br>{}", from_email, message),
        )
        .await
    }
}
