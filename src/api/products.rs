//! Product catalog endpoints.
//!
//! Browsing is public; every write is gated on the ADMIN role via the
//! `AdminUser` extractor.

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use serde::Deserialize;
use std::sync::Arc;
use uuid::Uuid;

use crate::db::{Category, CreateProductRequest, Product, UpdateProductRequest};
use crate::AppState;

use super::auth::AdminUser;
use super::error::{ApiError, ValidationErrorBuilder};
use super::validation::{
    validate_brand, validate_description, validate_image, validate_price, validate_product_name,
    validate_sale_price, validate_stock,
};

#[derive(Debug, Deserialize)]
pub struct ListProductsQuery {
    pub category: Option<String>,
}

/// Validate a create/update product request
fn validate_product_request(req: &CreateProductRequest) -> Result<Category, ApiError> {
    let mut errors = ValidationErrorBuilder::new();

    if let Err(e) = validate_product_name(&req.name) {
        errors.add("name", &e);
    }
    if let Err(e) = validate_description(&req.description) {
        errors.add("description", &e);
    }
    if let Err(e) = validate_price(req.price) {
        errors.add("price", &e);
    }
    if let Err(e) = validate_sale_price(req.sale_price, req.price) {
        errors.add("salePrice", &e);
    }
    if let Err(e) = validate_image(&req.image) {
        errors.add("image", &e);
    }
    if let Err(e) = validate_brand(&req.brand) {
        errors.add("brand", &e);
    }
    if let Err(e) = validate_stock(req.stock) {
        errors.add("stock", &e);
    }

    let category = Category::from_str(&req.category);
    if category.is_none() {
        errors.add("category", format!("Invalid category: {}", req.category));
    }

    errors.finish()?;

    category.ok_or_else(|| {
        ApiError::validation_field("category", format!("Invalid category: {}", req.category))
    })
}

/// List products, optionally filtered by category (case-insensitive)
pub async fn list_products(
    State(state): State<Arc<AppState>>,
    Query(query): Query<ListProductsQuery>,
) -> Result<Json<Vec<Product>>, ApiError> {
    let products = match query.category {
        Some(category) => {
            sqlx::query_as::<_, Product>(
                "SELECT * FROM products WHERE category = ? ORDER BY created_at DESC",
            )
            .bind(category.to_lowercase())
            .fetch_all(&state.db)
            .await?
        }
        None => {
            sqlx::query_as::<_, Product>("SELECT * FROM products ORDER BY created_at DESC")
                .fetch_all(&state.db)
                .await?
        }
    };

    Ok(Json(products))
}

/// Get a single product
pub async fn get_product(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Json<Product>, ApiError> {
    let product = sqlx::query_as::<_, Product>("SELECT * FROM products WHERE id = ?")
        .bind(&id)
        .fetch_optional(&state.db)
        .await?
        .ok_or_else(|| ApiError::not_found("Product not found"))?;

    Ok(Json(product))
}

/// Create a product (admin only)
pub async fn create_product(
    State(state): State<Arc<AppState>>,
    _admin: AdminUser,
    Json(req): Json<CreateProductRequest>,
) -> Result<(StatusCode, Json<Product>), ApiError> {
    let category = validate_product_request(&req)?;

    let id = Uuid::new_v4().to_string();
    let now = chrono::Utc::now().to_rfc3339();

    sqlx::query(
        r#"
        INSERT INTO products (id, name, description, price, sale_price, image, category, brand, stock, created_at, updated_at)
        VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
        "#,
    )
    .bind(&id)
    .bind(req.name.trim())
    .bind(&req.description)
    .bind(req.price)
    .bind(req.sale_price)
    .bind(&req.image)
    .bind(category.as_str())
    .bind(req.brand.as_deref().unwrap_or("Unbranded"))
    .bind(req.stock)
    .bind(&now)
    .bind(&now)
    .execute(&state.db)
    .await?;

    let product = sqlx::query_as::<_, Product>("SELECT * FROM products WHERE id = ?")
        .bind(&id)
        .fetch_one(&state.db)
        .await?;

    tracing::info!(product = %product.name, "Product created");

    Ok((StatusCode::CREATED, Json(product)))
}

/// Update a product (admin only, full replace)
pub async fn update_product(
    State(state): State<Arc<AppState>>,
    _admin: AdminUser,
    Path(id): Path<String>,
    Json(req): Json<UpdateProductRequest>,
) -> Result<Json<Product>, ApiError> {
    let category = validate_product_request(&req)?;

    let _existing = sqlx::query_as::<_, Product>("SELECT * FROM products WHERE id = ?")
        .bind(&id)
        .fetch_optional(&state.db)
        .await?
        .ok_or_else(|| ApiError::not_found("Product not found"))?;

    let now = chrono::Utc::now().to_rfc3339();

    sqlx::query(
        r#"
        UPDATE products SET
            name = ?, description = ?, price = ?, sale_price = ?,
            image = ?, category = ?, brand = ?, stock = ?, updated_at = ?
        WHERE id = ?
        "#,
    )
    .bind(req.name.trim())
    .bind(&req.description)
    .bind(req.price)
    .bind(req.sale_price)
    .bind(&req.image)
    .bind(category.as_str())
    .bind(req.brand.as_deref().unwrap_or("Unbranded"))
    .bind(req.stock)
    .bind(&now)
    .bind(&id)
    .execute(&state.db)
    .await?;

    let product = sqlx::query_as::<_, Product>("SELECT * FROM products WHERE id = ?")
        .bind(&id)
        .fetch_one(&state.db)
        .await?;

    Ok(Json(product))
}

/// Delete a product (admin only)
pub async fn delete_product(
    State(state): State<Arc<AppState>>,
    _admin: AdminUser,
    Path(id): Path<String>,
) -> Result<StatusCode, ApiError> {
    let result = sqlx::query("DELETE FROM products WHERE id = ?")
        .bind(&id)
        .execute(&state.db)
        .await?;

    if result.rows_affected() == 0 {
        return Err(ApiError::not_found("Product not found"));
    }

    Ok(StatusCode::NO_CONTENT)
}
