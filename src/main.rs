mod config;
mod model;
mod shell;
mod web;

use actix_web::{App, HttpServer, web::Data};
use actix_files as fs;
use dotenv::dotenv;
use log::{info, error};
use std::sync::{Arc, Mutex};
use tera::Tera;

use config::{AppConfig, EnvCredentialSource};
use model::backend::GeminiBackend;
use model::Gateway;
use web::routes;
use web::session::SessionStore;

// App state structure
pub struct AppState {
    tera: Tera,
    gateway: Arc<Gateway>,
    sessions: Mutex<SessionStore>,
}

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    // Initialize environment
    dotenv().ok();
    env_logger::init_from_env(env_logger::Env::new().default_filter_or("info"));

    info!("Starting CyberShield security lab");

    let config = match AppConfig::from_env() {
        Ok(config) => config,
        Err(e) => {
            error!("Configuration error: {:#}", e);
            std::process::exit(1);
        }
    };

    let backend = match GeminiBackend::new(config.base_url.clone(), config.request_timeout) {
        Ok(backend) => backend,
        Err(e) => {
            error!("Failed to build HTTP client: {}", e);
            std::process::exit(1);
        }
    };
    let gateway = Arc::new(Gateway::new(
        Arc::new(backend),
        Arc::new(EnvCredentialSource::default()),
        config.models.clone(),
    ));

    // Initialize template engine
    let mut tera = match Tera::new("templates/**/*") {
        Ok(t) => t,
        Err(e) => {
            error!("Template parsing error: {}", e);
            std::process::exit(1);
        }
    };
    tera.autoescape_on(vec![".html"]);

    // Create app state
    let app_state = Data::new(AppState {
        tera,
        gateway,
        sessions: Mutex::new(SessionStore::default()),
    });

    info!("Listening on {}:{}", config.host, config.port);

    // Start web server
    HttpServer::new(move || {
        App::new()
            .app_data(app_state.clone())
            .configure(routes::configure)
            .service(fs::Files::new("/static", "./static"))
    })
    .bind((config.host.as_str(), config.port))?
    .run()
    .await
}
