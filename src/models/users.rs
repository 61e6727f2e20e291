use serde::Serialize;
use sea_orm::entity::prelude::*;

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize)]
#[sea_orm(table_name = "users")]
#[serde(rename_all = "camelCase")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,

    #[sea_orm(unique)]
    pub email: String,

    #[serde(skip_serializing)]
    pub password_hash: String, // Format: pbkdf2:sha256:iterations$salt$hash

    pub name: String,

    pub country: Option<String>,
    pub region: Option<String>,
    pub district: Option<String>,
    pub is_estate: bool,
    pub estate_type: Option<String>, // 'INDIVIDUAL' | 'SETTLEMENT'
    pub settlement: Option<String>,
    pub photo_url: Option<String>,

    pub is_email_verified: bool,

    // Un seul token actif par usage: écrasé à chaque réémission, effacé à l'usage
    #[serde(skip_serializing)]
    pub refresh_token_hash: Option<String>,
    #[serde(skip_serializing)]
    pub email_verification_token_hash: Option<String>,
    #[serde(skip_serializing)]
    pub email_verification_token_expires_at: Option<DateTimeUtc>,
    #[serde(skip_serializing)]
    pub password_reset_token_hash: Option<String>,
    #[serde(skip_serializing)]
    pub password_reset_token_expires_at: Option<DateTimeUtc>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::products::Entity")]
    Products,

    #[sea_orm(has_many = "super::services::Entity")]
    Services,

    #[sea_orm(has_many = "super::jobs::Entity")]
    Jobs,

    #[sea_orm(has_many = "super::resumes::Entity")]
    Resumes,

    #[sea_orm(has_many = "super::user_roles::Entity")]
    UserRoles,
}

impl Related<super::products::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Products.def()
    }
}

impl Related<super::services::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Services.def()
    }
}

impl Related<super::jobs::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Jobs.def()
    }
}

impl Related<super::resumes::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Resumes.def()
    }
}

impl Related<super::roles::Entity> for Entity {
    fn to() -> RelationDef {
        super::user_roles::Relation::Role.def()
    }

    fn via() -> Option<RelationDef> {
        Some(super::user_roles::Relation::User.def().rev())
    }
}

impl ActiveModelBehavior for ActiveModel {}
