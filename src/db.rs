// connexion BD + création du schéma par l'ORM

use sea_orm::{ConnectionTrait, Database, DatabaseConnection, DbErr, Schema};
use std::env;

use crate::models::{jobs, products, resumes, roles, services, user_roles, users};

pub async fn establish_connection() -> Result<DatabaseConnection, DbErr> {
    let database_url = env::var("POSTGRES_URI")
        .expect("POSTGRES_URI must be set in .env file");

    Database::connect(&database_url).await
}

/// Crée les tables manquantes à partir des entités (CREATE TABLE IF NOT EXISTS),
/// l'équivalent ORM de l'auto-sync du schéma au démarrage.
pub async fn sync_schema(db: &DatabaseConnection) -> Result<(), DbErr> {
    let backend = db.get_database_backend();
    let schema = Schema::new(backend);

    let mut statements = vec![
        schema.create_table_from_entity(users::Entity),
        schema.create_table_from_entity(roles::Entity),
        schema.create_table_from_entity(user_roles::Entity),
        schema.create_table_from_entity(products::Entity),
        schema.create_table_from_entity(services::Entity),
        schema.create_table_from_entity(jobs::Entity),
        schema.create_table_from_entity(resumes::Entity),
    ];

    for statement in statements.iter_mut() {
        statement.if_not_exists();
        db.execute(backend.build(statement)).await?;
    }

    Ok(())
}
