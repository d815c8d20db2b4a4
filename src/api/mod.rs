pub mod auth;
pub mod error;

mod builds;
mod cart;
mod categories;
mod products;
mod validation;

use axum::{
    http::{header, HeaderValue, Method},
    routing::{delete, get, post, put},
    Router,
};
use std::sync::Arc;
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use crate::AppState;

pub fn create_router(state: Arc<AppState>) -> Router {
    // Auth routes (session issuance and teardown)
    let auth_routes = Router::new()
        .route("/register", post(auth::register))
        .route("/login", post(auth::login))
        .route("/logout", post(auth::logout))
        .route("/me", get(auth::me));

    // Catalog, cart, and build routes. Browsing is public; everything
    // else authenticates per handler via extractors.
    let api_routes = Router::new()
        .route("/products", get(products::list_products))
        .route("/products", post(products::create_product))
        .route("/products/:id", get(products::get_product))
        .route("/products/:id", put(products::update_product))
        .route("/products/:id", delete(products::delete_product))
        .route("/categories", get(categories::list_categories))
        .route("/cart", get(cart::get_cart))
        .route("/cart", post(cart::add_to_cart))
        .route("/cart", put(cart::update_cart_item))
        .route("/cart", delete(cart::remove_cart_item))
        .route("/builds", get(builds::list_builds))
        .route("/builds", post(builds::create_build));

    let mut router = Router::new()
        .route("/health", get(health_check))
        .nest("/api/auth", auth_routes)
        .nest("/api", api_routes)
        .layer(TraceLayer::new_for_http());

    // Credentialed CORS for the storefront frontend, when configured
    if let Some(origin) = &state.config.server.cors_origin {
        match origin.parse::<HeaderValue>() {
            Ok(origin) => {
                let cors = CorsLayer::new()
                    .allow_origin(origin)
                    .allow_methods([Method::GET, Method::POST, Method::PUT, Method::DELETE])
                    .allow_headers([header::CONTENT_TYPE])
                    .allow_credentials(true);
                router = router.layer(cors);
            }
            Err(_) => {
                tracing::warn!("Invalid cors_origin in config, skipping CORS layer");
            }
        }
    }

    router.with_state(state)
}

async fn health_check() -> &'static str {
    "OK"
}
