//! Input validation for API requests.
//!
//! Validation functions return `Result<(), String>` so handlers can
//! collect field-level errors with the `ValidationErrorBuilder` from the
//! `error` module.

use lazy_static::lazy_static;
use regex::Regex;

lazy_static! {
    /// Regex for validating email addresses
    static ref EMAIL_REGEX: Regex = Regex::new(
        r"^[^\s@]+@[^\s@]+\.[^\s@]+$"
    ).unwrap();

    /// Characters rejected in emails to keep them out of markup and queries
    static ref EMAIL_DANGEROUS_CHARS: Regex = Regex::new(
        r#"[<>"'%;()&+]"#
    ).unwrap();
}

/// Validate an email address
pub fn validate_email(email: &str) -> Result<(), String> {
    let trimmed = email.trim();

    if trimmed.is_empty() {
        return Err("Email is required".to_string());
    }

    if trimmed.len() > 254 {
        return Err("Email is too long (max 254 characters)".to_string());
    }

    if !EMAIL_REGEX.is_match(trimmed) {
        return Err("Invalid email format".to_string());
    }

    if EMAIL_DANGEROUS_CHARS.is_match(trimmed) {
        return Err("Email contains invalid characters".to_string());
    }

    Ok(())
}

/// Validate a password (length only; strength is the user's business)
pub fn validate_password(password: &str) -> Result<(), String> {
    if password.is_empty() {
        return Err("Password is required".to_string());
    }

    if password.len() < 6 {
        return Err("Password must be at least 6 characters".to_string());
    }

    // Upper bound guards the hash against oversized inputs
    if password.len() > 128 {
        return Err("Password is too long (max 128 characters)".to_string());
    }

    Ok(())
}

/// Validate a product name
pub fn validate_product_name(name: &str) -> Result<(), String> {
    let trimmed = name.trim();

    if trimmed.is_empty() {
        return Err("Product name is required".to_string());
    }

    if trimmed.len() > 200 {
        return Err("Product name is too long (max 200 characters)".to_string());
    }

    Ok(())
}

/// Validate a product description
pub fn validate_description(description: &str) -> Result<(), String> {
    if description.len() > 2000 {
        return Err("Description is too long (max 2000 characters)".to_string());
    }

    Ok(())
}

/// Validate a list price
pub fn validate_price(price: f64) -> Result<(), String> {
    if !price.is_finite() {
        return Err("Price must be a number".to_string());
    }

    if price < 0.0 {
        return Err("Price must not be negative".to_string());
    }

    if price > 99_999_999.0 {
        return Err("Price is too large".to_string());
    }

    Ok(())
}

/// Validate a sale price against the list price; must be strictly less
pub fn validate_sale_price(sale_price: Option<f64>, price: f64) -> Result<(), String> {
    if let Some(sale) = sale_price {
        validate_price(sale)?;

        if sale >= price {
            return Err("Sale price must be less than the list price".to_string());
        }
    }

    Ok(())
}

/// Validate an image reference (URL or path into the asset store)
pub fn validate_image(image: &str) -> Result<(), String> {
    if image.len() > 500 {
        return Err("Image reference is too long (max 500 characters)".to_string());
    }

    Ok(())
}

/// Validate a brand name (optional field)
pub fn validate_brand(brand: &Option<String>) -> Result<(), String> {
    if let Some(b) = brand {
        if b.len() > 100 {
            return Err("Brand is too long (max 100 characters)".to_string());
        }
    }

    Ok(())
}

/// Validate a stock count
pub fn validate_stock(stock: i64) -> Result<(), String> {
    if stock < 0 {
        return Err("Stock must not be negative".to_string());
    }

    if stock > 999_999 {
        return Err("Stock is too large".to_string());
    }

    Ok(())
}

/// Validate a build name
pub fn validate_build_name(name: &str) -> Result<(), String> {
    if name.len() > 200 {
        return Err("Build name is too long (max 200 characters)".to_string());
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_email() {
        assert!(validate_email("shopper@example.com").is_ok());
        assert!(validate_email("  padded@example.com  ").is_ok());

        assert!(validate_email("").is_err());
        assert!(validate_email("not-an-email").is_err());
        assert!(validate_email("two@at@example.com").is_err());
        assert!(validate_email("quote'@example.com").is_err());
        assert!(validate_email(&format!("{}@example.com", "a".repeat(260))).is_err());
    }

    #[test]
    fn test_validate_password() {
        assert!(validate_password("secret123").is_ok());
        assert!(validate_password("").is_err());
        assert!(validate_password("short").is_err());
        assert!(validate_password(&"x".repeat(129)).is_err());
    }

    #[test]
    fn test_validate_price_bounds() {
        assert!(validate_price(0.0).is_ok());
        assert!(validate_price(599.99).is_ok());
        assert!(validate_price(-1.0).is_err());
        assert!(validate_price(f64::NAN).is_err());
        assert!(validate_price(100_000_000.0).is_err());
    }

    #[test]
    fn test_validate_sale_price_strictly_less() {
        assert!(validate_sale_price(None, 100.0).is_ok());
        assert!(validate_sale_price(Some(80.0), 100.0).is_ok());
        assert!(validate_sale_price(Some(100.0), 100.0).is_err());
        assert!(validate_sale_price(Some(120.0), 100.0).is_err());
        assert!(validate_sale_price(Some(-5.0), 100.0).is_err());
    }

    #[test]
    fn test_validate_stock() {
        assert!(validate_stock(0).is_ok());
        assert!(validate_stock(500).is_ok());
        assert!(validate_stock(-1).is_err());
        assert!(validate_stock(1_000_000).is_err());
    }
}
