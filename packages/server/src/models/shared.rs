use crate::error::AppError;

/// Validate a trimmed display name (1-256 Unicode characters).
pub fn validate_name(field: &str, value: &str) -> Result<(), AppError> {
    let value = value.trim();
    if value.is_empty() || value.chars().count() > 256 {
        return Err(AppError::Validation(format!(
            "{field} must be 1-256 characters"
        )));
    }
    Ok(())
}

/// Validate an optional non-negative number (nutrition value or price).
pub fn validate_optional_amount(field: &str, value: Option<f64>) -> Result<(), AppError> {
    if let Some(v) = value
        && !(v.is_finite() && v >= 0.0)
    {
        return Err(AppError::Validation(format!(
            "{field} must be a non-negative number"
        )));
    }
    Ok(())
}

/// Validate a quantity in grams (strictly positive).
pub fn validate_quantity(value: f64) -> Result<(), AppError> {
    if !(value.is_finite() && value > 0.0) {
        return Err(AppError::Validation(
            "quantity_grams must be a positive number".into(),
        ));
    }
    Ok(())
}
