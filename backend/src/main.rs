mod auth;
mod config;
mod db;
mod inference;
mod routes;

use actix_cors::Cors;
use actix_web::{App, HttpServer, web};

use auth::jwt::JwtService;
use auth::middleware::AuthMiddleware;
use config::Config;
use db::predictions::PredictionRepository;
use db::users::UserRepository;
use inference::artifact::{HttpArtifactResolver, ensure_artifact};
use inference::model::ModelHandle;
use inference::pipeline::InferencePipeline;
use routes::configure_routes;

fn fatal(context: &str, err: impl std::fmt::Display) -> std::io::Error {
    log::error!("{}: {}", context, err);
    std::io::Error::new(std::io::ErrorKind::Other, format!("{}: {}", context, err))
}

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    env_logger::init_from_env(env_logger::Env::new().default_filter_or("info"));
    dotenv::dotenv().ok();

    let config = Config::from_env();

    // Startup failures around the model are fatal; request-level
    // failures later are not.
    let resolver = HttpArtifactResolver::new();
    ensure_artifact(&resolver, &config.model_url, &config.model_path)
        .await
        .map_err(|e| fatal("Model artifact fetch failed", e))?;

    let model = ModelHandle::load(&config.model_path)
        .map_err(|e| fatal("Model loading failed", e))?;
    let pipeline = InferencePipeline::new(model);
    log::info!("Model loaded from {}", config.model_path.display());

    let pool = db::connect(&config.database_url)
        .await
        .map_err(|e| fatal("Database connection failed", e))?;
    db::init_schema(&pool)
        .await
        .map_err(|e| fatal("Schema initialization failed", e))?;
    let users = UserRepository::new(pool.clone());
    let predictions = PredictionRepository::new(pool);

    let jwt_service = JwtService::new(&config.jwt_secret);
    let auth_middleware = AuthMiddleware::new(jwt_service.clone());

    let bind_address = format!("0.0.0.0:{}", config.port);
    log::info!("Starting server on {}", bind_address);

    HttpServer::new(move || {
        App::new()
            .wrap(auth_middleware.clone())
            .wrap(
                Cors::default()
                    .allow_any_origin()
                    .allowed_methods(vec!["GET", "POST", "OPTIONS"])
                    .allowed_headers(vec![
                        actix_web::http::header::AUTHORIZATION,
                        actix_web::http::header::ACCEPT,
                        actix_web::http::header::CONTENT_TYPE,
                    ])
                    .max_age(3600),
            )
            .app_data(web::Data::new(pipeline.clone()))
            .app_data(web::Data::new(users.clone()))
            .app_data(web::Data::new(predictions.clone()))
            .app_data(web::Data::new(jwt_service.clone()))
            .app_data(web::Data::new(config.clone()))
            .configure(configure_routes)
    })
    .bind(&bind_address)?
    .run()
    .await
}
