use actix_web::{delete, get, patch, post, web, HttpResponse};
use sea_orm::DatabaseConnection;
use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::error::ApiError;
use crate::middleware::AuthUser;
use crate::services::user_service::{NewUser, UserPatch, UserService};
use crate::utils::password;

// DTO pour la création d'un utilisateur
#[derive(Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CreateUserRequest {
    #[validate(email)]
    pub email: String,
    #[validate(length(min = 6))]
    pub password: String,
    pub name: String,
    pub is_email_verified: Option<bool>,
    pub photo_url: Option<String>,
    pub country: Option<String>,
    pub region: Option<String>,
    pub district: Option<String>,
    pub is_estate: Option<bool>,
    pub estate_type: Option<String>,
    pub settlement: Option<String>,
}

// DTO pour la mise à jour partielle d'un utilisateur
#[derive(Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct UpdateUserRequest {
    #[validate(email)]
    pub email: Option<String>,
    #[validate(length(min = 6))]
    pub password: Option<String>,
    pub name: Option<String>,
    pub is_email_verified: Option<bool>,
    pub photo_url: Option<String>,
    pub country: Option<String>,
    pub region: Option<String>,
    pub district: Option<String>,
    pub is_estate: Option<bool>,
    pub estate_type: Option<String>,
    pub settlement: Option<String>,
}

// DTO pour attacher/détacher un rôle
#[derive(Serialize, Deserialize)]
pub struct AddRoleRequest {
    #[serde(rename = "userId")]
    pub user_id: i32,
    pub value: String,
}

/// POST /users - Créer un utilisateur avec le rôle USER par défaut (PUBLIC)
#[post("")]
pub async fn create(
    body: web::Json<CreateUserRequest>,
    db: web::Data<DatabaseConnection>,
) -> Result<HttpResponse, ApiError> {
    if let Err(errors) = body.validate() {
        return Ok(HttpResponse::BadRequest().json(errors));
    }

    let body = body.into_inner();
    let password_hash = password::hash_password(&body.password).map_err(ApiError::Internal)?;

    let user = UserService::create_with_default_role(
        db.get_ref(),
        NewUser {
            email: body.email,
            password_hash,
            name: body.name,
            is_email_verified: body.is_email_verified.unwrap_or(false),
            photo_url: body.photo_url,
            country: body.country,
            region: body.region,
            district: body.district,
            is_estate: body.is_estate.unwrap_or(false),
            estate_type: body.estate_type,
            settlement: body.settlement,
        },
    )
    .await?;

    Ok(HttpResponse::Created().json(user))
}

/// GET /users - Liste des utilisateurs (PUBLIC)
#[get("")]
pub async fn find_all(db: web::Data<DatabaseConnection>) -> Result<HttpResponse, ApiError> {
    let users = UserService::find_all(db.get_ref()).await?;

    Ok(HttpResponse::Ok().json(users))
}

/// POST /users/add-role - Attacher un rôle à un utilisateur (PROTÉGÉE)
#[post("/add-role")]
pub async fn add_role(
    _auth_user: AuthUser,
    body: web::Json<AddRoleRequest>,
    db: web::Data<DatabaseConnection>,
) -> Result<HttpResponse, ApiError> {
    UserService::add_role(db.get_ref(), body.user_id, &body.value).await?;

    Ok(HttpResponse::Created().json(body.into_inner()))
}

/// DELETE /users/remove-role - Détacher un rôle d'un utilisateur (PROTÉGÉE)
#[delete("/remove-role")]
pub async fn remove_role(
    _auth_user: AuthUser,
    body: web::Json<AddRoleRequest>,
    db: web::Data<DatabaseConnection>,
) -> Result<HttpResponse, ApiError> {
    UserService::remove_role(db.get_ref(), body.user_id, &body.value).await?;

    Ok(HttpResponse::Ok().json(body.into_inner()))
}

/// GET /users/{id} - Un utilisateur par id (PUBLIC)
#[get("/{id}")]
pub async fn find_one(
    path: web::Path<i32>,
    db: web::Data<DatabaseConnection>,
) -> Result<HttpResponse, ApiError> {
    let user = UserService::find_by_id(db.get_ref(), path.into_inner())
        .await?
        .ok_or_else(|| ApiError::NotFound("User not found".to_string()))?;

    Ok(HttpResponse::Ok().json(user))
}

/// PATCH /users/{id} - Mettre à jour son propre profil (PROTÉGÉE)
#[patch("/{id}")]
pub async fn update(
    auth_user: AuthUser,
    path: web::Path<i32>,
    body: web::Json<UpdateUserRequest>,
    db: web::Data<DatabaseConnection>,
) -> Result<HttpResponse, ApiError> {
    if let Err(errors) = body.validate() {
        return Ok(HttpResponse::BadRequest().json(errors));
    }

    let id = path.into_inner();
    let user = UserService::find_by_id(db.get_ref(), id)
        .await?
        .ok_or_else(|| ApiError::NotFound("User not found".to_string()))?;

    // Chacun ne gère que son propre compte
    if auth_user.user_id != user.id {
        return Err(ApiError::Forbidden("Insufficient rights".to_string()));
    }

    let body = body.into_inner();
    let updated = UserService::update_profile(
        db.get_ref(),
        user,
        UserPatch {
            email: body.email,
            password: body.password,
            name: body.name,
            is_email_verified: body.is_email_verified,
            photo_url: body.photo_url,
            country: body.country,
            region: body.region,
            district: body.district,
            is_estate: body.is_estate,
            estate_type: body.estate_type,
            settlement: body.settlement,
        },
    )
    .await?;

    Ok(HttpResponse::Ok().json(updated))
}

/// DELETE /users/{id} - Supprimer son propre compte (PROTÉGÉE)
#[delete("/{id}")]
pub async fn remove(
    auth_user: AuthUser,
    path: web::Path<i32>,
    db: web::Data<DatabaseConnection>,
) -> Result<HttpResponse, ApiError> {
    let id = path.into_inner();
    let user = UserService::find_by_id(db.get_ref(), id)
        .await?
        .ok_or_else(|| ApiError::NotFound("User not found".to_string()))?;

    if auth_user.user_id != user.id {
        return Err(ApiError::Forbidden("Insufficient rights".to_string()));
    }

    UserService::delete(db.get_ref(), user).await?;

    Ok(HttpResponse::Ok().json(serde_json::json!({ "deleted": true })))
}

pub fn users_routes(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/users")
            .service(create)
            .service(find_all)
            // add-role/remove-role avant les routes /{id}
            .service(add_role)
            .service(remove_role)
            .service(find_one)
            .service(update)
            .service(remove)
    );
}
