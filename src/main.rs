mod config;
mod db;
mod error;
mod middleware;
mod models;
mod routes;
mod services;
mod utils;

use actix_cors::Cors;
use actix_web::{http, web, App, HttpServer};

use crate::services::mail_service::MailService;

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    dotenv::dotenv().ok();

    let config = config::Config::from_env();
    let port = config.port;

    println!("🔌 Connecting to database...");
    let db = db::establish_connection()
        .await
        .expect("Failed to connect to database");
    db::sync_schema(&db)
        .await
        .expect("Failed to sync database schema");
    println!("✅ Database connected!");

    let mail = MailService::new(&config).expect("Failed to initialise mail transport");

    println!("🚀 Starting server on http://0.0.0.0:{}", port);

    // `web::Data` wraps the connection in an `Arc`, so every worker shares the
    // same pool. Cloning the `Data` handle (always `Clone`) avoids requiring
    // `DatabaseConnection: Clone`, which sea-orm's `mock` feature removes.
    let db = web::Data::new(db);

    HttpServer::new(move || {
        // CORS avec credentials: le cookie refreshToken part du SPA
        let cors = Cors::default()
            .allowed_origin(&config.client_url)
            .allowed_methods(vec!["GET", "POST", "PUT", "PATCH", "DELETE", "OPTIONS"])
            .allowed_headers(vec![http::header::CONTENT_TYPE, http::header::AUTHORIZATION])
            .allowed_header("x-refresh-token")
            .supports_credentials();

        App::new()
            .wrap(cors)
            .app_data(db.clone())
            .app_data(web::Data::new(config.clone()))
            .app_data(web::Data::new(mail.clone()))
            .configure(routes::configure_routes)
    })
        .bind(("0.0.0.0", port))?
        .run()
        .await
}
