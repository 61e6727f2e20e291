// ============================================================================
// MODELS - MODULE PRINCIPAL
// ============================================================================
//
// Description:
//   Point d'entrée pour tous les modèles de données.
//   Chaque modèle correspond à une table PostgreSQL avec SeaORM.
//
// Liste des modules:
//   - health : Health check API
//   - users : Utilisateurs (email confirmé, hashs des tokens auth)
//   - roles : Rôles ("USER", "ADMIN", ...)
//   - user_roles : Table de liaison users <-> roles (N-N)
//   - products : Annonces produits
//   - services : Annonces services
//   - jobs : Annonces emplois
//   - resumes : Annonces CV
//
// Points d'attention:
//   - Tous les modèles utilisent SeaORM (pas de SQL brut)
//   - Les colonnes sensibles (hashs, expirations) ne sortent jamais en JSON
//   - Les relations entre tables sont définies dans chaque modèle
//
// ============================================================================

pub mod health;
pub mod users;
pub mod roles;
pub mod user_roles;
pub mod products;
pub mod services;
pub mod jobs;
pub mod resumes;
