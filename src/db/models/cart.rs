//! Cart models and the stock-gated cart operations.
//!
//! A cart is one-to-one with an account and created lazily on first
//! access. Stock is advisory: it gates admission into the cart but is
//! never reserved or decremented, so two concurrent shoppers can both
//! pass the check for the last unit. The get-or-create is likewise not
//! transactional; the UNIQUE constraint on user_id backstops the race.

use serde::{Deserialize, Serialize};
use sqlx::{FromRow, SqlitePool};
use thiserror::Error;
use uuid::Uuid;

use super::product::Product;

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Cart {
    pub id: String,
    pub user_id: String,
    pub created_at: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct CartItem {
    pub id: String,
    pub cart_id: String,
    pub product_id: String,
    pub quantity: i64,
}

/// Cart line denormalized for the storefront: carries the product's
/// current display price (sale price if set, else list price).
#[derive(Debug, Clone, Serialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct CartItemView {
    pub id: String,
    pub product_id: String,
    pub name: String,
    pub price: f64,
    pub image: String,
    pub category: String,
    pub quantity: i64,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CartView {
    pub cart_id: String,
    pub items: Vec<CartItemView>,
}

#[derive(Debug, Error)]
pub enum CartError {
    #[error("product not found")]
    ProductNotFound,
    #[error("only {available} left in stock")]
    InsufficientStock { available: i64 },
    #[error("cart item not found")]
    ItemNotFound,
    #[error("cart item belongs to another account")]
    NotOwner,
    #[error("quantity must be at least 1")]
    InvalidQuantity,
    #[error(transparent)]
    Db(#[from] sqlx::Error),
}

/// Get the account's cart, creating an empty one on first access.
pub async fn get_or_create_cart(pool: &SqlitePool, user_id: &str) -> Result<Cart, sqlx::Error> {
    let existing = sqlx::query_as::<_, Cart>("SELECT * FROM carts WHERE user_id = ?")
        .bind(user_id)
        .fetch_optional(pool)
        .await?;

    if let Some(cart) = existing {
        return Ok(cart);
    }

    let id = Uuid::new_v4().to_string();
    let now = chrono::Utc::now().to_rfc3339();
    sqlx::query("INSERT INTO carts (id, user_id, created_at) VALUES (?, ?, ?)")
        .bind(&id)
        .bind(user_id)
        .bind(&now)
        .execute(pool)
        .await?;

    sqlx::query_as::<_, Cart>("SELECT * FROM carts WHERE id = ?")
        .bind(&id)
        .fetch_one(pool)
        .await
}

/// Reload a cart's lines, denormalized with current product details.
async fn cart_items(pool: &SqlitePool, cart_id: &str) -> Result<Vec<CartItemView>, sqlx::Error> {
    sqlx::query_as::<_, CartItemView>(
        r#"
        SELECT ci.id, ci.product_id, p.name,
               COALESCE(p.sale_price, p.price) AS price,
               p.image, p.category, ci.quantity
        FROM cart_items ci
        JOIN products p ON p.id = ci.product_id
        WHERE ci.cart_id = ?
        ORDER BY ci.id
        "#,
    )
    .bind(cart_id)
    .fetch_all(pool)
    .await
}

/// The account's cart with its current lines, created lazily.
pub async fn load_cart(pool: &SqlitePool, user_id: &str) -> Result<CartView, CartError> {
    let cart = get_or_create_cart(pool, user_id).await?;
    let items = cart_items(pool, &cart.id).await?;
    Ok(CartView {
        cart_id: cart.id,
        items,
    })
}

/// Add a product to the account's cart, or bump the quantity of an
/// existing line. The stock check runs against current stock, and again
/// with the combined quantity when a line already exists.
pub async fn add_to_cart(
    pool: &SqlitePool,
    user_id: &str,
    product_id: &str,
    quantity: i64,
) -> Result<CartView, CartError> {
    if quantity < 1 {
        return Err(CartError::InvalidQuantity);
    }

    let product = sqlx::query_as::<_, Product>("SELECT * FROM products WHERE id = ?")
        .bind(product_id)
        .fetch_optional(pool)
        .await?
        .ok_or(CartError::ProductNotFound)?;

    if product.stock < quantity {
        return Err(CartError::InsufficientStock {
            available: product.stock,
        });
    }

    let cart = get_or_create_cart(pool, user_id).await?;

    let existing = sqlx::query_as::<_, CartItem>(
        "SELECT * FROM cart_items WHERE cart_id = ? AND product_id = ?",
    )
    .bind(&cart.id)
    .bind(product_id)
    .fetch_optional(pool)
    .await?;

    match existing {
        Some(item) => {
            let combined = item.quantity + quantity;
            if product.stock < combined {
                return Err(CartError::InsufficientStock {
                    available: product.stock,
                });
            }
            sqlx::query("UPDATE cart_items SET quantity = ? WHERE id = ?")
                .bind(combined)
                .bind(&item.id)
                .execute(pool)
                .await?;
        }
        None => {
            let id = Uuid::new_v4().to_string();
            sqlx::query(
                "INSERT INTO cart_items (id, cart_id, product_id, quantity) VALUES (?, ?, ?, ?)",
            )
            .bind(&id)
            .bind(&cart.id)
            .bind(product_id)
            .bind(quantity)
            .execute(pool)
            .await?;
        }
    }

    let items = cart_items(pool, &cart.id).await?;
    Ok(CartView {
        cart_id: cart.id,
        items,
    })
}

/// Cart line joined with its owning cart, for ownership checks
#[derive(Debug, FromRow)]
struct OwnedCartItem {
    id: String,
    cart_id: String,
    product_id: String,
    owner_id: String,
}

async fn find_owned_item(
    pool: &SqlitePool,
    cart_item_id: &str,
) -> Result<OwnedCartItem, CartError> {
    sqlx::query_as::<_, OwnedCartItem>(
        r#"
        SELECT ci.id, ci.cart_id, ci.product_id, c.user_id AS owner_id
        FROM cart_items ci
        JOIN carts c ON c.id = ci.cart_id
        WHERE ci.id = ?
        "#,
    )
    .bind(cart_item_id)
    .fetch_optional(pool)
    .await?
    .ok_or(CartError::ItemNotFound)
}

/// Overwrite a cart line's quantity after ownership and stock checks.
pub async fn update_quantity(
    pool: &SqlitePool,
    user_id: &str,
    cart_item_id: &str,
    quantity: i64,
) -> Result<CartView, CartError> {
    let item = find_owned_item(pool, cart_item_id).await?;

    if item.owner_id != user_id {
        return Err(CartError::NotOwner);
    }

    if quantity < 1 {
        return Err(CartError::InvalidQuantity);
    }

    let stock: i64 = sqlx::query_scalar("SELECT stock FROM products WHERE id = ?")
        .bind(&item.product_id)
        .fetch_one(pool)
        .await?;

    if stock < quantity {
        return Err(CartError::InsufficientStock { available: stock });
    }

    sqlx::query("UPDATE cart_items SET quantity = ? WHERE id = ?")
        .bind(quantity)
        .bind(&item.id)
        .execute(pool)
        .await?;

    let items = cart_items(pool, &item.cart_id).await?;
    Ok(CartView {
        cart_id: item.cart_id,
        items,
    })
}

/// Delete a cart line after the ownership check.
pub async fn remove_from_cart(
    pool: &SqlitePool,
    user_id: &str,
    cart_item_id: &str,
) -> Result<CartView, CartError> {
    let item = find_owned_item(pool, cart_item_id).await?;

    if item.owner_id != user_id {
        return Err(CartError::NotOwner);
    }

    sqlx::query("DELETE FROM cart_items WHERE id = ?")
        .bind(&item.id)
        .execute(pool)
        .await?;

    let items = cart_items(pool, &item.cart_id).await?;
    Ok(CartView {
        cart_id: item.cart_id,
        items,
    })
}
