//! PC build snapshots: a named set of one-product-per-part-type picks.
//!
//! A build is persisted with its items in a single transaction. It never
//! touches the cart; the storefront chains separate add-to-cart calls
//! after a successful create and surfaces partial failure as a warning.

use serde::{Deserialize, Serialize};
use sqlx::{FromRow, SqlitePool};
use thiserror::Error;
use uuid::Uuid;

/// Slot a product occupies in a build. Upper-cased before storage.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum PartType {
    Cpu,
    Gpu,
    Mainboard,
    Ram,
    Storage,
    Psu,
    Case,
    Cooling,
    Monitor,
}

impl PartType {
    pub fn as_str(&self) -> &'static str {
        match self {
            PartType::Cpu => "CPU",
            PartType::Gpu => "GPU",
            PartType::Mainboard => "MAINBOARD",
            PartType::Ram => "RAM",
            PartType::Storage => "STORAGE",
            PartType::Psu => "PSU",
            PartType::Case => "CASE",
            PartType::Cooling => "COOLING",
            PartType::Monitor => "MONITOR",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_uppercase().as_str() {
            "CPU" => Some(PartType::Cpu),
            "GPU" => Some(PartType::Gpu),
            "MAINBOARD" => Some(PartType::Mainboard),
            "RAM" => Some(PartType::Ram),
            "STORAGE" => Some(PartType::Storage),
            "PSU" => Some(PartType::Psu),
            "CASE" => Some(PartType::Case),
            "COOLING" => Some(PartType::Cooling),
            "MONITOR" => Some(PartType::Monitor),
            _ => None,
        }
    }
}

impl std::fmt::Display for PartType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Build {
    pub id: String,
    pub user_id: String,
    pub name: String,
    pub created_at: String,
}

/// One selected part, denormalized with current product details
#[derive(Debug, Clone, Serialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct BuildItemView {
    pub id: String,
    pub product_id: String,
    pub part_type: String,
    pub name: String,
    pub price: f64,
    pub image: String,
    pub category: String,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BuildView {
    pub id: String,
    pub name: String,
    pub created_at: String,
    pub items: Vec<BuildItemView>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BuildItemInput {
    pub product_id: String,
    pub part_type: String,
}

#[derive(Debug, Error)]
pub enum BuildError {
    #[error("a build needs at least one part")]
    Empty,
    #[error("invalid part type: {0}")]
    UnknownPartType(String),
    #[error("product not found: {0}")]
    ProductNotFound(String),
    #[error(transparent)]
    Db(#[from] sqlx::Error),
}

async fn build_items(pool: &SqlitePool, build_id: &str) -> Result<Vec<BuildItemView>, sqlx::Error> {
    sqlx::query_as::<_, BuildItemView>(
        r#"
        SELECT bi.id, bi.product_id, bi.part_type, p.name,
               COALESCE(p.sale_price, p.price) AS price,
               p.image, p.category
        FROM build_items bi
        JOIN products p ON p.id = bi.product_id
        WHERE bi.build_id = ?
        ORDER BY bi.id
        "#,
    )
    .bind(build_id)
    .fetch_all(pool)
    .await
}

/// Persist a build and its items as one unit.
///
/// Every item is validated (known part type, existing product) before
/// anything is written; the writes themselves run in one transaction.
pub async fn create_build(
    pool: &SqlitePool,
    user_id: &str,
    name: &str,
    items: &[BuildItemInput],
) -> Result<BuildView, BuildError> {
    if items.is_empty() {
        return Err(BuildError::Empty);
    }

    let mut validated = Vec::with_capacity(items.len());
    for item in items {
        let part_type = PartType::from_str(&item.part_type)
            .ok_or_else(|| BuildError::UnknownPartType(item.part_type.clone()))?;

        let exists: Option<String> = sqlx::query_scalar("SELECT id FROM products WHERE id = ?")
            .bind(&item.product_id)
            .fetch_optional(pool)
            .await?;
        if exists.is_none() {
            return Err(BuildError::ProductNotFound(item.product_id.clone()));
        }

        validated.push((item.product_id.as_str(), part_type));
    }

    let build_id = Uuid::new_v4().to_string();
    let now = chrono::Utc::now().to_rfc3339();

    let mut tx = pool.begin().await?;
    sqlx::query("INSERT INTO builds (id, user_id, name, created_at) VALUES (?, ?, ?, ?)")
        .bind(&build_id)
        .bind(user_id)
        .bind(name)
        .bind(&now)
        .execute(&mut *tx)
        .await?;

    for (product_id, part_type) in &validated {
        sqlx::query(
            "INSERT INTO build_items (id, build_id, product_id, part_type) VALUES (?, ?, ?, ?)",
        )
        .bind(Uuid::new_v4().to_string())
        .bind(&build_id)
        .bind(*product_id)
        .bind(part_type.as_str())
        .execute(&mut *tx)
        .await?;
    }
    tx.commit().await?;

    let build = sqlx::query_as::<_, Build>("SELECT * FROM builds WHERE id = ?")
        .bind(&build_id)
        .fetch_one(pool)
        .await?;
    let items = build_items(pool, &build_id).await?;

    Ok(BuildView {
        id: build.id,
        name: build.name,
        created_at: build.created_at,
        items,
    })
}

/// The account's builds with their items, newest first.
pub async fn list_builds(pool: &SqlitePool, user_id: &str) -> Result<Vec<BuildView>, sqlx::Error> {
    let builds = sqlx::query_as::<_, Build>(
        "SELECT * FROM builds WHERE user_id = ? ORDER BY created_at DESC",
    )
    .bind(user_id)
    .fetch_all(pool)
    .await?;

    let mut views = Vec::with_capacity(builds.len());
    for build in builds {
        let items = build_items(pool, &build.id).await?;
        views.push(BuildView {
            id: build.id,
            name: build.name,
            created_at: build.created_at,
            items,
        });
    }
    Ok(views)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::test_pool;

    async fn seed_user(pool: &SqlitePool, email: &str) -> String {
        let id = Uuid::new_v4().to_string();
        let now = chrono::Utc::now().to_rfc3339();
        sqlx::query(
            "INSERT INTO users (id, email, password_hash, role, created_at, updated_at)
             VALUES (?, ?, 'x', 'USER', ?, ?)",
        )
        .bind(&id)
        .bind(email)
        .bind(&now)
        .bind(&now)
        .execute(pool)
        .await
        .unwrap();
        id
    }

    async fn seed_product(pool: &SqlitePool, name: &str, category: &str) -> String {
        let id = Uuid::new_v4().to_string();
        let now = chrono::Utc::now().to_rfc3339();
        sqlx::query(
            "INSERT INTO products (id, name, description, price, sale_price, image, category, brand, stock, created_at, updated_at)
             VALUES (?, ?, '', 100.0, NULL, '', ?, 'ACME', 5, ?, ?)",
        )
        .bind(&id)
        .bind(name)
        .bind(category)
        .bind(&now)
        .bind(&now)
        .execute(pool)
        .await
        .unwrap();
        id
    }

    async fn build_count(pool: &SqlitePool) -> i64 {
        sqlx::query_scalar("SELECT COUNT(*) FROM builds")
            .fetch_one(pool)
            .await
            .unwrap()
    }

    #[test]
    fn test_part_type_roundtrip() {
        assert_eq!(PartType::Cpu.as_str(), "CPU");
        assert_eq!(PartType::from_str("cpu"), Some(PartType::Cpu));
        assert_eq!(PartType::from_str("Mainboard"), Some(PartType::Mainboard));
        assert_eq!(PartType::from_str("TURBOCHARGER"), None);
    }

    #[tokio::test]
    async fn test_empty_build_persists_nothing() {
        let pool = test_pool().await;
        let user = seed_user(&pool, "a@example.com").await;

        let err = create_build(&pool, &user, "My PC Build", &[])
            .await
            .unwrap_err();
        assert!(matches!(err, BuildError::Empty));
        assert_eq!(build_count(&pool).await, 0);
    }

    #[tokio::test]
    async fn test_unknown_part_type_persists_nothing() {
        let pool = test_pool().await;
        let user = seed_user(&pool, "a@example.com").await;
        let cpu = seed_product(&pool, "Ryzen 5", "cpu").await;

        let items = vec![
            BuildItemInput {
                product_id: cpu,
                part_type: "CPU".to_string(),
            },
            BuildItemInput {
                product_id: "whatever".to_string(),
                part_type: "TURBOCHARGER".to_string(),
            },
        ];

        let err = create_build(&pool, &user, "My PC Build", &items)
            .await
            .unwrap_err();
        assert!(matches!(err, BuildError::UnknownPartType(ref t) if t == "TURBOCHARGER"));
        assert_eq!(build_count(&pool).await, 0);
    }

    #[tokio::test]
    async fn test_unknown_product_persists_nothing() {
        let pool = test_pool().await;
        let user = seed_user(&pool, "a@example.com").await;

        let items = vec![BuildItemInput {
            product_id: "ghost".to_string(),
            part_type: "GPU".to_string(),
        }];

        let err = create_build(&pool, &user, "My PC Build", &items)
            .await
            .unwrap_err();
        assert!(matches!(err, BuildError::ProductNotFound(ref id) if id == "ghost"));
        assert_eq!(build_count(&pool).await, 0);
    }

    #[tokio::test]
    async fn test_create_build_uppercases_part_types() {
        let pool = test_pool().await;
        let user = seed_user(&pool, "a@example.com").await;
        let cpu = seed_product(&pool, "Ryzen 5", "cpu").await;
        let gpu = seed_product(&pool, "RTX 4070", "gpu").await;

        let items = vec![
            BuildItemInput {
                product_id: cpu,
                part_type: "cpu".to_string(),
            },
            BuildItemInput {
                product_id: gpu,
                part_type: "Gpu".to_string(),
            },
        ];

        let build = create_build(&pool, &user, "Gaming rig", &items)
            .await
            .unwrap();
        assert_eq!(build.name, "Gaming rig");
        assert_eq!(build.items.len(), 2);
        assert!(build
            .items
            .iter()
            .all(|i| i.part_type == "CPU" || i.part_type == "GPU"));
    }

    #[tokio::test]
    async fn test_list_builds_is_scoped_to_owner() {
        let pool = test_pool().await;
        let alice = seed_user(&pool, "alice@example.com").await;
        let bob = seed_user(&pool, "bob@example.com").await;
        let cpu = seed_product(&pool, "Ryzen 5", "cpu").await;

        let items = vec![BuildItemInput {
            product_id: cpu,
            part_type: "CPU".to_string(),
        }];
        create_build(&pool, &alice, "Alice's rig", &items)
            .await
            .unwrap();

        assert_eq!(list_builds(&pool, &alice).await.unwrap().len(), 1);
        assert!(list_builds(&pool, &bob).await.unwrap().is_empty());
    }
}
