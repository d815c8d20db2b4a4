//! Product catalog models and DTOs.

use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// Fixed set of catalog categories. Stored as the lowercase slug.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Category {
    Cpu,
    Gpu,
    Mainboard,
    Ram,
    Storage,
    Psu,
    Case,
    Cooling,
    Monitor,
    GamingGear,
    Keyboard,
    Mouse,
}

impl Category {
    pub fn as_str(&self) -> &'static str {
        match self {
            Category::Cpu => "cpu",
            Category::Gpu => "gpu",
            Category::Mainboard => "mainboard",
            Category::Ram => "ram",
            Category::Storage => "storage",
            Category::Psu => "psu",
            Category::Case => "case",
            Category::Cooling => "cooling",
            Category::Monitor => "monitor",
            Category::GamingGear => "gaming-gear",
            Category::Keyboard => "keyboard",
            Category::Mouse => "mouse",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "cpu" => Some(Category::Cpu),
            "gpu" => Some(Category::Gpu),
            "mainboard" => Some(Category::Mainboard),
            "ram" => Some(Category::Ram),
            "storage" => Some(Category::Storage),
            "psu" => Some(Category::Psu),
            "case" => Some(Category::Case),
            "cooling" => Some(Category::Cooling),
            "monitor" => Some(Category::Monitor),
            "gaming-gear" => Some(Category::GamingGear),
            "keyboard" => Some(Category::Keyboard),
            "mouse" => Some(Category::Mouse),
            _ => None,
        }
    }
}

impl std::fmt::Display for Category {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Product {
    pub id: String,
    pub name: String,
    pub description: String,
    pub price: f64,
    pub sale_price: Option<f64>,
    pub image: String,
    pub category: String,
    pub brand: String,
    pub stock: i64,
    pub created_at: String,
    pub updated_at: String,
}

impl Product {
    /// Price shown to shoppers: sale price when set, else list price.
    pub fn display_price(&self) -> f64 {
        self.sale_price.unwrap_or(self.price)
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateProductRequest {
    pub name: String,
    pub description: String,
    pub price: f64,
    pub sale_price: Option<f64>,
    pub image: String,
    pub category: String,
    pub brand: Option<String>,
    pub stock: i64,
}

/// Full-replace update; every field is resubmitted, mirroring the admin form.
pub type UpdateProductRequest = CreateProductRequest;

/// Category summary for the storefront navigation
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CategorySummary {
    pub id: String,
    pub name: String,
    pub product_count: i64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_category_roundtrip() {
        assert_eq!(Category::Cpu.as_str(), "cpu");
        assert_eq!(Category::GamingGear.as_str(), "gaming-gear");

        assert_eq!(Category::from_str("CPU"), Some(Category::Cpu));
        assert_eq!(Category::from_str("Gaming-Gear"), Some(Category::GamingGear));
        assert_eq!(Category::from_str("turbocharger"), None);
    }

    #[test]
    fn test_display_price_prefers_sale_price() {
        let mut product = Product {
            id: "p-1".to_string(),
            name: "RTX 4070".to_string(),
            description: String::new(),
            price: 599.0,
            sale_price: None,
            image: String::new(),
            category: "gpu".to_string(),
            brand: "NVIDIA".to_string(),
            stock: 10,
            created_at: "2024-01-01T00:00:00Z".to_string(),
            updated_at: "2024-01-01T00:00:00Z".to_string(),
        };

        assert_eq!(product.display_price(), 599.0);
        product.sale_price = Some(549.0);
        assert_eq!(product.display_price(), 549.0);
    }
}
