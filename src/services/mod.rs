pub mod auth_service;
pub mod mail_service;
pub mod role_service;
pub mod support_service;
pub mod user_service;
