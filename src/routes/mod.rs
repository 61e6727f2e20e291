pub mod auth;
pub mod health;
pub mod roles;
pub mod support;
pub mod users;

use actix_web::web;

pub fn configure_routes(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/api")
            .service(health::health_check)
            .configure(auth::auth_routes)
            .configure(users::users_routes)
            .configure(roles::roles_routes)
            .configure(support::support_routes)
    );
}
