use std::sync::Arc;

use actix_web::{cookie::Key, web, HttpServer};
use todoforge::{
    auth::TokenService,
    config::Config,
    create_app,
    error::AppError,
    notifier,
    oauth::GoogleProvider,
    store::PgStore,
    AppState, Collaborators,
};

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    dotenv::dotenv().ok();
    env_logger::init_from_env(env_logger::Env::default().default_filter_or("info"));

    let config = match Config::from_env() {
        Ok(config) => config,
        Err(e) => {
            log::error!("Refusing to start: {}", e);
            std::process::exit(1);
        }
    };

    let provider = GoogleProvider::new(&config.google).map_err(to_io_error)?;
    let store = Arc::new(
        PgStore::connect(&config.database_url)
            .await
            .map_err(to_io_error)?,
    );

    let state = web::Data::new(AppState::new(
        Collaborators {
            users: store.clone(),
            tasks: store,
            provider: Arc::new(provider),
            notifier: notifier::from_config(config.mail.as_ref()),
        },
        TokenService::new(&config.jwt_secret, config.token_ttl_seconds),
        config.bcrypt_cost,
        &config.frontend_url,
    ));
    let session_key = Key::derive_from(config.secret_key.as_bytes());
    let secure_cookies = config.secure_cookies();

    log::info!("Starting server at {}", config.server_url());
    HttpServer::new(move || create_app(state.clone(), session_key.clone(), secure_cookies))
        .bind((config.server_host.as_str(), config.server_port))?
        .run()
        .await
}

fn to_io_error(e: AppError) -> std::io::Error {
    log::error!("Startup failed: {}", e);
    std::io::Error::new(std::io::ErrorKind::Other, e.to_string())
}
