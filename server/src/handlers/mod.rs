pub mod health;
pub mod page;
pub mod token;

pub use health::health_check;
pub use page::index;
pub use token::get_token;

use actix_web::{middleware::from_fn, web};

use crate::middleware::rate_limit_middleware;

/// Registers every route. Shared state (`AccessTokenIssuer`, `Settings` and
/// optionally `RateLimiter`) is expected as app data. Only `/get-token/` is
/// rate limited.
pub fn routes(cfg: &mut web::ServiceConfig) {
    cfg.service(index).service(health_check).service(
        web::resource("/get-token/")
            .wrap(from_fn(rate_limit_middleware))
            .route(web::get().to(get_token)),
    );
}
