use actix_web::{get, post, web, HttpResponse};
use sea_orm::DatabaseConnection;
use serde::Deserialize;

use crate::error::ApiError;
use crate::middleware::AuthUser;
use crate::services::role_service::RoleService;

#[derive(Deserialize)]
pub struct CreateRoleRequest {
    pub value: String,
}

/// GET /roles/get-all-roles - Liste des rôles (PUBLIC)
#[get("/get-all-roles")]
pub async fn get_all_roles(db: web::Data<DatabaseConnection>) -> Result<HttpResponse, ApiError> {
    let roles = RoleService::get_all(db.get_ref()).await?;

    Ok(HttpResponse::Ok().json(roles))
}

/// POST /roles/create-new-role - Créer un rôle (PROTÉGÉE)
#[post("/create-new-role")]
pub async fn create_role(
    _auth_user: AuthUser,
    body: web::Json<CreateRoleRequest>,
    db: web::Data<DatabaseConnection>,
) -> Result<HttpResponse, ApiError> {
    let role = RoleService::create(db.get_ref(), &body.value).await?;

    Ok(HttpResponse::Created().json(role))
}

pub fn roles_routes(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/roles")
            .service(get_all_roles)
            .service(create_role)
    );
}
