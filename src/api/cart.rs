//! Cart endpoints.
//!
//! Thin wrappers over the cart operations in the model layer; every
//! handler resolves the account from the session first and returns the
//! freshly reloaded cart.

use axum::{extract::State, Json};
use serde::Deserialize;
use std::sync::Arc;

use crate::db::{self, AuthenticatedUser, CartView};
use crate::AppState;

use super::error::ApiError;

fn default_quantity() -> i64 {
    1
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AddToCartRequest {
    pub product_id: String,
    #[serde(default = "default_quantity")]
    pub quantity: i64,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateCartItemRequest {
    pub cart_item_id: String,
    pub quantity: i64,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RemoveCartItemRequest {
    pub cart_item_id: String,
}

/// Get the account's cart, creating it lazily
pub async fn get_cart(
    State(state): State<Arc<AppState>>,
    user: AuthenticatedUser,
) -> Result<Json<CartView>, ApiError> {
    let cart = db::load_cart(&state.db, &user.id).await?;
    Ok(Json(cart))
}

/// Add a product to the cart, merging with an existing line
pub async fn add_to_cart(
    State(state): State<Arc<AppState>>,
    user: AuthenticatedUser,
    Json(req): Json<AddToCartRequest>,
) -> Result<Json<CartView>, ApiError> {
    if req.product_id.is_empty() {
        return Err(ApiError::validation_field(
            "productId",
            "productId is required",
        ));
    }

    let cart = db::add_to_cart(&state.db, &user.id, &req.product_id, req.quantity).await?;
    Ok(Json(cart))
}

/// Overwrite a cart line's quantity
pub async fn update_cart_item(
    State(state): State<Arc<AppState>>,
    user: AuthenticatedUser,
    Json(req): Json<UpdateCartItemRequest>,
) -> Result<Json<CartView>, ApiError> {
    if req.cart_item_id.is_empty() {
        return Err(ApiError::validation_field(
            "cartItemId",
            "cartItemId is required",
        ));
    }

    let cart = db::update_quantity(&state.db, &user.id, &req.cart_item_id, req.quantity).await?;
    Ok(Json(cart))
}

/// Remove a cart line
pub async fn remove_cart_item(
    State(state): State<Arc<AppState>>,
    user: AuthenticatedUser,
    Json(req): Json<RemoveCartItemRequest>,
) -> Result<Json<CartView>, ApiError> {
    if req.cart_item_id.is_empty() {
        return Err(ApiError::validation_field(
            "cartItemId",
            "cartItemId is required",
        ));
    }

    let cart = db::remove_from_cart(&state.db, &user.id, &req.cart_item_id).await?;
    Ok(Json(cart))
}
