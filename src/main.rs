use actix_cors::Cors;
use actix_web::middleware::NormalizePath;
use actix_web::web::Data;
use actix_web::{App, HttpServer, web};
use dotenvy::dotenv;

mod api;
mod config;
mod docs;
mod error;
mod geofence;
mod provider;
mod routes;

use config::Config;
use geofence::Geofence;
use provider::ProviderClient;

use crate::docs::ApiDoc;
use tracing::info;
use tracing_appender::rolling;
use utoipa::OpenApi; // ← needed for ApiDoc::openapi()
use utoipa_swagger_ui::SwaggerUi;

#[actix_web::main]
async fn main() -> anyhow::Result<()> {
    dotenv().ok();

    let config = Config::from_env()?;

    // Rolling daily log
    let file_appender = rolling::daily("logs", "app.log");
    let (non_blocking, _guard) = tracing_appender::non_blocking(file_appender);

    tracing_subscriber::fmt()
        .with_writer(non_blocking)
        .with_max_level(tracing::Level::DEBUG)
        .with_ansi(false)
        .with_target(false) // removes module path
        .with_level(true)
        .with_thread_ids(false)
        .with_thread_names(false)
        .pretty()
        .init();

    info!("Server starting...");

    let geofence = Data::new(Geofence::new(config.allowed_zones.clone()));
    let provider = Data::new(ProviderClient::from_config(&config)?);

    let server_addr = config.server_addr.clone();
    let allowed_origins = config.allowed_origins.clone();
    let config = Data::new(config);

    HttpServer::new(move || {
        App::new()
            .wrap(actix_web::middleware::Logger::default())
            .wrap(NormalizePath::trim())
            .wrap(build_cors(allowed_origins.as_deref()))
            .service(
                SwaggerUi::new("/swagger-ui/{_:.*}") // ← important: wildcard {_:.*} to match JS/CSS files
                    .url("/api-doc/openapi.json", ApiDoc::openapi()),
            )
            .app_data(config.clone())
            .app_data(geofence.clone())
            .app_data(provider.clone())
            .app_data(error::json_config())
            .app_data(error::query_config())
            .configure(routes::configure)
            .default_service(web::route().to(api::health::not_found))
    })
    .bind(server_addr)?
    .run()
    .await?;

    Ok(())
}

/// Origins configured: exact allow-list with credentials. Unset: permissive.
fn build_cors(allowed_origins: Option<&[String]>) -> Cors {
    match allowed_origins {
        Some(origins) => {
            let mut cors = Cors::default()
                .allow_any_method()
                .allow_any_header()
                .supports_credentials();
            for origin in origins {
                cors = cors.allowed_origin(origin);
            }
            cors
        }
        None => Cors::permissive(),
    }
}
