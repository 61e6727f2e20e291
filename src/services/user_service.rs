use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, DbErr, EntityTrait, ModelTrait,
    QueryFilter, Set,
};
use sea_orm::prelude::DateTimeUtc;

use crate::error::ApiError;
use crate::models::{roles, user_roles, users};
use crate::services::role_service::RoleService;
use crate::utils::password;

/// Données d'un nouvel utilisateur créé via POST /users
pub struct NewUser {
    pub email: String,
    pub password_hash: String,
    pub name: String,
    pub is_email_verified: bool,
    pub photo_url: Option<String>,
    pub country: Option<String>,
    pub region: Option<String>,
    pub district: Option<String>,
    pub is_estate: bool,
    pub estate_type: Option<String>,
    pub settlement: Option<String>,
}

/// Patch partiel appliqué via PATCH /users/{id}
#[derive(Default)]
pub struct UserPatch {
    pub email: Option<String>,
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

pub struct UserService;

impl UserService {
    pub async fn find_by_email(
        db: &DatabaseConnection,
        email: &str,
    ) -> Result<Option<users::Model>, DbErr> {
        users::Entity::find()
            .filter(users::Column::Email.eq(email))
            .one(db)
            .await
    }

    pub async fn find_by_id(
        db: &DatabaseConnection,
        id: i32,
    ) -> Result<Option<users::Model>, DbErr> {
        users::Entity::find_by_id(id).one(db).await
    }

    pub async fn find_by_email_verification_token_hash(
        db: &DatabaseConnection,
        token_hash: &str,
    ) -> Result<Option<users::Model>, DbErr> {
        users::Entity::find()
            .filter(users::Column::EmailVerificationTokenHash.eq(token_hash))
            .one(db)
            .await
    }

    pub async fn find_by_password_reset_token_hash(
        db: &DatabaseConnection,
        token_hash: &str,
    ) -> Result<Option<users::Model>, DbErr> {
        users::Entity::find()
            .filter(users::Column::PasswordResetTokenHash.eq(token_hash))
            .one(db)
            .await
    }

    pub async fn find_all(db: &DatabaseConnection) -> Result<Vec<users::Model>, DbErr> {
        users::Entity::find().all(db).await
    }

    /// Création côté inscription: email non confirmé, aucun rôle attaché
    pub async fn create(
        db: &DatabaseConnection,
        email: &str,
        password_hash: &str,
        name: &str,
    ) -> Result<users::Model, DbErr> {
        let new_user = users::ActiveModel {
            email: Set(email.to_string()),
            password_hash: Set(password_hash.to_string()),
            name: Set(name.to_string()),
            is_estate: Set(false),
            is_email_verified: Set(false),
            ..Default::default()
        };

        new_user.insert(db).await
    }

    /// Création côté CRUD: tous les champs du profil + rôle USER par défaut
    pub async fn create_with_default_role(
        db: &DatabaseConnection,
        data: NewUser,
    ) -> Result<users::Model, ApiError> {
        let new_user = users::ActiveModel {
            email: Set(data.email),
            password_hash: Set(data.password_hash),
            name: Set(data.name),
            is_email_verified: Set(data.is_email_verified),
            photo_url: Set(data.photo_url),
            country: Set(data.country),
            region: Set(data.region),
            district: Set(data.district),
            is_estate: Set(data.is_estate),
            estate_type: Set(data.estate_type),
            settlement: Set(data.settlement),
            ..Default::default()
        };

        let user = new_user.insert(db).await?;

        let role = match RoleService::get_by_value(db, "USER").await? {
            Some(role) => role,
            None => RoleService::create(db, "USER").await?,
        };

        Self::attach_role(db, user.id, role.id).await?;

        Ok(user)
    }

    pub async fn update_profile(
        db: &DatabaseConnection,
        user: users::Model,
        patch: UserPatch,
    ) -> Result<users::Model, ApiError> {
        let mut active_model: users::ActiveModel = user.into();

        if let Some(email) = patch.email {
            active_model.email = Set(email);
        }
        if let Some(raw_password) = patch.password {
            let hash = password::hash_password(&raw_password).map_err(ApiError::Internal)?;
            active_model.password_hash = Set(hash);
        }
        if let Some(name) = patch.name {
            active_model.name = Set(name);
        }
        if let Some(is_email_verified) = patch.is_email_verified {
            active_model.is_email_verified = Set(is_email_verified);
        }
        if let Some(photo_url) = patch.photo_url {
            active_model.photo_url = Set(Some(photo_url));
        }
        if let Some(country) = patch.country {
            active_model.country = Set(Some(country));
        }
        if let Some(region) = patch.region {
            active_model.region = Set(Some(region));
        }
        if let Some(district) = patch.district {
            active_model.district = Set(Some(district));
        }
        if let Some(is_estate) = patch.is_estate {
            active_model.is_estate = Set(is_estate);
        }
        if let Some(estate_type) = patch.estate_type {
            active_model.estate_type = Set(Some(estate_type));
        }
        if let Some(settlement) = patch.settlement {
            active_model.settlement = Set(Some(settlement));
        }

        Ok(active_model.update(db).await?)
    }

    pub async fn delete(db: &DatabaseConnection, user: users::Model) -> Result<(), DbErr> {
        user.delete(db).await?;
        Ok(())
    }

    /// Valeurs des rôles attachés, embarquées dans le payload des JWT
    pub async fn roles_of(
        db: &DatabaseConnection,
        user: &users::Model,
    ) -> Result<Vec<String>, DbErr> {
        let roles = user.find_related(roles::Entity).all(db).await?;
        Ok(roles.into_iter().map(|role| role.value).collect())
    }

    pub async fn set_email_verification_token(
        db: &DatabaseConnection,
        user_id: i32,
        token_hash: &str,
        expires_at: DateTimeUtc,
    ) -> Result<(), DbErr> {
        users::Entity::update_many()
            .set(users::ActiveModel {
                email_verification_token_hash: Set(Some(token_hash.to_string())),
                email_verification_token_expires_at: Set(Some(expires_at)),
                ..Default::default()
            })
            .filter(users::Column::Id.eq(user_id))
            .exec(db)
            .await?;
        Ok(())
    }

    pub async fn mark_email_verified(db: &DatabaseConnection, user_id: i32) -> Result<(), DbErr> {
        users::Entity::update_many()
            .set(users::ActiveModel {
                is_email_verified: Set(true),
                email_verification_token_hash: Set(None),
                email_verification_token_expires_at: Set(None),
                ..Default::default()
            })
            .filter(users::Column::Id.eq(user_id))
            .exec(db)
            .await?;
        Ok(())
    }

    /// Stocke le refresh token sous forme de hash salé, jamais en clair
    pub async fn set_refresh_token(
        db: &DatabaseConnection,
        user_id: i32,
        refresh_token: &str,
    ) -> Result<(), ApiError> {
        let hash = password::hash_password(refresh_token).map_err(ApiError::Internal)?;

        users::Entity::update_many()
            .set(users::ActiveModel {
                refresh_token_hash: Set(Some(hash)),
                ..Default::default()
            })
            .filter(users::Column::Id.eq(user_id))
            .exec(db)
            .await?;
        Ok(())
    }

    pub async fn clear_refresh_token(db: &DatabaseConnection, user_id: i32) -> Result<(), DbErr> {
        users::Entity::update_many()
            .set(users::ActiveModel {
                refresh_token_hash: Set(None),
                ..Default::default()
            })
            .filter(users::Column::Id.eq(user_id))
            .exec(db)
            .await?;
        Ok(())
    }

    pub async fn set_password_reset_token(
        db: &DatabaseConnection,
        user_id: i32,
        token_hash: &str,
        expires_at: DateTimeUtc,
    ) -> Result<(), DbErr> {
        users::Entity::update_many()
            .set(users::ActiveModel {
                password_reset_token_hash: Set(Some(token_hash.to_string())),
                password_reset_token_expires_at: Set(Some(expires_at)),
                ..Default::default()
            })
            .filter(users::Column::Id.eq(user_id))
            .exec(db)
            .await?;
        Ok(())
    }

    pub async fn clear_password_reset_token(
        db: &DatabaseConnection,
        user_id: i32,
    ) -> Result<(), DbErr> {
        users::Entity::update_many()
            .set(users::ActiveModel {
                password_reset_token_hash: Set(None),
                password_reset_token_expires_at: Set(None),
                ..Default::default()
            })
            .filter(users::Column::Id.eq(user_id))
            .exec(db)
            .await?;
        Ok(())
    }

    pub async fn set_password(
        db: &DatabaseConnection,
        user_id: i32,
        password_hash: &str,
    ) -> Result<(), DbErr> {
        users::Entity::update_many()
            .set(users::ActiveModel {
                password_hash: Set(password_hash.to_string()),
                ..Default::default()
            })
            .filter(users::Column::Id.eq(user_id))
            .exec(db)
            .await?;
        Ok(())
    }

    pub async fn add_role(
        db: &DatabaseConnection,
        user_id: i32,
        value: &str,
    ) -> Result<(), ApiError> {
        let user = Self::find_by_id(db, user_id).await?;
        let role = RoleService::get_by_value(db, value).await?;

        match (user, role) {
            (Some(user), Some(role)) => Self::attach_role(db, user.id, role.id).await,
            _ => Err(ApiError::BadRequest("User or role not found".to_string())),
        }
    }

    pub async fn remove_role(
        db: &DatabaseConnection,
        user_id: i32,
        value: &str,
    ) -> Result<(), ApiError> {
        let user = Self::find_by_id(db, user_id).await?;
        let role = RoleService::get_by_value(db, value).await?;

        match (user, role) {
            (Some(user), Some(role)) => {
                user_roles::Entity::delete_many()
                    .filter(user_roles::Column::UserId.eq(user.id))
                    .filter(user_roles::Column::RoleId.eq(role.id))
                    .exec(db)
                    .await?;
                Ok(())
            }
            _ => Err(ApiError::BadRequest("User or role not found".to_string())),
        }
    }

    async fn attach_role(db: &DatabaseConnection, user_id: i32, role_id: i32) -> Result<(), ApiError> {
        let existing = user_roles::Entity::find_by_id((user_id, role_id)).one(db).await?;
        if existing.is_some() {
            return Ok(());
        }

        let link = user_roles::ActiveModel {
            user_id: Set(user_id),
            role_id: Set(role_id),
        };
        link.insert(db).await?;
        Ok(())
    }
}
