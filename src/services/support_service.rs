use crate::error::ApiError;
use crate::services::mail_service::MailSender;

pub struct SupportService;

impl SupportService {
    /// Relaye le message vers la boîte support, avec l'email de l'auteur en reply-to
    pub async fn send_support_message(
        mail: &dyn MailSender,
        user_email: &str,
        message: &str,
    ) -> Result<(), ApiError> {
        mail.send_support_email(user_email, message).await?;

        println!("📨 Support message from {}", user_email);
        Ok(())
    }
}
