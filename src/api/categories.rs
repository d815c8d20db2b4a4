//! Category listing derived from the catalog.

use axum::{extract::State, Json};
use std::sync::Arc;

use crate::db::CategorySummary;
use crate::AppState;

use super::error::ApiError;

/// List the categories present in the catalog with product counts
pub async fn list_categories(
    State(state): State<Arc<AppState>>,
) -> Result<Json<Vec<CategorySummary>>, ApiError> {
    let rows: Vec<(String, i64)> = sqlx::query_as(
        "SELECT category, COUNT(*) FROM products GROUP BY category ORDER BY category",
    )
    .fetch_all(&state.db)
    .await?;

    let categories = rows
        .into_iter()
        .map(|(category, count)| CategorySummary {
            id: category.clone(),
            name: category,
            product_count: count,
        })
        .collect();

    Ok(Json(categories))
}
