use actix_cors::Cors;
use actix_web::{middleware::Logger, web, App, HttpServer};
use dotenv::dotenv;
use std::sync::Arc;

mod auth;
mod config;
mod controllers;
mod db;
mod models;

use config::Config;
use db::Database;

pub struct AppState {
    pub db: Arc<Database>,
}

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    dotenv().ok();
    env_logger::init();

    let config = Config::from_env();
    let port = config.port;

    log::info!("notes-backend v{}", env!("CARGO_PKG_VERSION"));
    log::info!("Initializing database at {}", config.database_url);
    let db = Database::new(&config.database_url).expect("Failed to initialize database");
    let db = Arc::new(db);

    log::info!("Starting server on port {}", port);

    HttpServer::new(move || {
        let cors = Cors::permissive();

        App::new()
            .wrap(Logger::default())
            .wrap(cors)
            .app_data(web::Data::new(AppState { db: db.clone() }))
            .configure(controllers::health::config_routes)
            .configure(controllers::auth::config)
            .configure(controllers::notes::config)
    })
    .bind(("0.0.0.0", port))?
    .run()
    .await
}
