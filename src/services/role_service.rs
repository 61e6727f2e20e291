use sea_orm::{ActiveModelTrait, ColumnTrait, DatabaseConnection, DbErr, EntityTrait, QueryFilter, Set};

use crate::error::ApiError;
use crate::models::roles;

pub struct RoleService;

impl RoleService {
    pub async fn get_by_value(
        db: &DatabaseConnection,
        value: &str,
    ) -> Result<Option<roles::Model>, DbErr> {
        roles::Entity::find()
            .filter(roles::Column::Value.eq(value))
            .one(db)
            .await
    }

    pub async fn get_all(db: &DatabaseConnection) -> Result<Vec<roles::Model>, DbErr> {
        roles::Entity::find().all(db).await
    }

    pub async fn create(db: &DatabaseConnection, value: &str) -> Result<roles::Model, ApiError> {
        if Self::get_by_value(db, value).await?.is_some() {
            return Err(ApiError::Forbidden("Role already exists".to_string()));
        }

        let role = roles::ActiveModel {
            value: Set(value.to_string()),
            ..Default::default()
        };

        Ok(role.insert(db).await?)
    }
}
