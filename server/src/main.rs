use actix_web::{middleware as actix_middleware, web, App, HttpServer};
use anyhow::Context;
use std::path::PathBuf;
use tokio::time;

use audiocall_server::access_token::AccessTokenIssuer;
use audiocall_server::config::Settings;
use audiocall_server::handlers;
use audiocall_server::middleware::RateLimiter;

#[actix_web::main]
async fn main() {
    // Load .env file if it exists (for development)
    // Try loading from current directory first, then from server/ directory
    if dotenvy::dotenv().is_err() {
        dotenvy::from_filename("server/.env").ok();
    }

    env_logger::init_from_env(env_logger::Env::default().default_filter_or("info"));

    if let Err(err) = run().await {
        log::error!("{:#}", err);
        std::process::exit(1);
    }
}

async fn run() -> anyhow::Result<()> {
    log::info!("Starting audiocall server...");

    let config_path = std::env::var("CONFIG_PATH").ok().map(PathBuf::from);
    if let Some(path) = &config_path {
        log::info!("Loading configuration from {}", path.display());
    }

    let settings =
        Settings::load(config_path.as_deref()).context("Failed to load server configuration")?;

    let issuer = AccessTokenIssuer::new(
        settings.livekit.api_key.clone(),
        settings.livekit.api_secret.clone().into_bytes(),
        settings.token_ttl(),
    )
    .context("Failed to create access token issuer")?;

    log::info!("LiveKit URL: {}", settings.livekit.url);
    log::info!("Token TTL set to {} seconds", issuer.ttl().as_secs());

    let rate_limiter = if settings.rate_limit.enabled {
        let limiter = RateLimiter::from_settings(&settings.rate_limit);
        log::info!(
            "Rate limiting /get-token/ to {} requests per {} seconds",
            settings.rate_limit.max_requests,
            settings.rate_limit.window_secs
        );

        let limiter_clone = limiter.clone();
        tokio::spawn(async move {
            let mut interval = time::interval(limiter_clone.window());
            loop {
                interval.tick().await;
                let removed = limiter_clone.cleanup_old_entries();
                log::debug!("Background cleanup: dropped {} idle rate limiter entries", removed);
            }
        });

        Some(limiter)
    } else {
        log::warn!("Token endpoint is unauthenticated and not rate limited");
        None
    };

    let host = settings.http.host.clone();
    let port = settings.http.port;
    log::info!("Starting HTTP server at {}:{}...", host, port);

    let settings = web::Data::new(settings);
    let issuer = web::Data::new(issuer);

    HttpServer::new(move || {
        let mut app = App::new()
            .app_data(settings.clone())
            .app_data(issuer.clone());
        if let Some(limiter) = &rate_limiter {
            app = app.app_data(web::Data::new(limiter.clone()));
        }

        app.wrap(actix_middleware::Logger::default())
            .wrap(actix_middleware::Compress::default())
            .configure(handlers::routes)
    })
    .bind((host.as_str(), port))
    .with_context(|| format!("Failed to bind {}:{}", host, port))?
    .run()
    .await
    .context("HTTP server terminated with an error")?;

    Ok(())
}
