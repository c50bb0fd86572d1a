use rust_decimal::Decimal;
use validator::ValidationError;

/// Exclusive upper bound of a `NUMERIC(12,2)` amount column
const MAX_AMOUNT: Decimal = Decimal::from_parts(1_410_065_408, 2, 0, false, 0);

/// Validates that an amount is positive and fits the stored precision
pub fn validate_positive_amount(amount: &Decimal) -> Result<(), ValidationError> {
    let message = if *amount <= Decimal::ZERO {
        "Amount must be greater than 0"
    } else if amount.normalize().scale() > 2 {
        "Amount must have at most 2 decimal places"
    } else if *amount >= MAX_AMOUNT {
        "Amount must be less than 10000000000"
    } else {
        return Ok(());
    };

    let mut error = ValidationError::new("invalid_amount");
    error.message = Some(message.into());
    Err(error)
}

/// Validates that a name still has content once surrounding whitespace is removed
pub fn validate_not_blank(value: &str) -> Result<(), ValidationError> {
    if value.trim().is_empty() {
        let mut error = ValidationError::new("blank");
        error.message = Some("Name cannot be blank".into());
        return Err(error);
    }
    Ok(())
}

/// Validates a `#rgb` or `#rrggbb` color
pub fn validate_hex_color(color: &str) -> Result<(), ValidationError> {
    let valid = color
        .strip_prefix('#')
        .map(|hex| {
            (hex.len() == 3 || hex.len() == 6) && hex.chars().all(|c| c.is_ascii_hexdigit())
        })
        .unwrap_or(false);

    if !valid {
        let mut error = ValidationError::new("invalid_color");
        error.message = Some(format!("'{}' is not a hex color like #1890ff", color).into());
        return Err(error);
    }
    Ok(())
}

/// Flatten validator errors into one `field: message` line per field
pub fn format_validation_errors(errors: &validator::ValidationErrors) -> String {
    let mut fields: Vec<String> = errors
        .field_errors()
        .iter()
        .map(|(field, errors)| {
            let messages: Vec<String> = errors
                .iter()
                .filter_map(|e| e.message.as_ref().map(|m| m.to_string()))
                .collect();
            format!("{}: {}", field, messages.join(", "))
        })
        .collect();
    fields.sort();
    fields.join("; ")
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    #[test]
    fn test_positive_amount() {
        assert!(validate_positive_amount(&Decimal::from_str("0.01").unwrap()).is_ok());
        assert!(validate_positive_amount(&Decimal::ZERO).is_err());
        assert!(validate_positive_amount(&Decimal::from_str("-5").unwrap()).is_err());
    }

    #[test]
    fn test_amount_must_fit_two_decimal_places() {
        assert!(validate_positive_amount(&Decimal::from_str("0.001").unwrap()).is_err());
        assert!(validate_positive_amount(&Decimal::from_str("12.345").unwrap()).is_err());
        // Trailing zeros do not count as extra precision
        assert!(validate_positive_amount(&Decimal::from_str("12.500").unwrap()).is_ok());
    }

    #[test]
    fn test_amount_upper_bound() {
        assert!(validate_positive_amount(&Decimal::from_str("9999999999.99").unwrap()).is_ok());
        assert!(validate_positive_amount(&Decimal::from_str("10000000000").unwrap()).is_err());
        assert!(validate_positive_amount(&Decimal::from_str("100000000000").unwrap()).is_err());
    }

    #[test]
    fn test_not_blank() {
        assert!(validate_not_blank("Rent").is_ok());
        assert!(validate_not_blank("  Rent ").is_ok());
        assert!(validate_not_blank("").is_err());
        assert!(validate_not_blank("   ").is_err());
        assert!(validate_not_blank("\t\n").is_err());
    }

    #[test]
    fn test_hex_color() {
        assert!(validate_hex_color("#1890ff").is_ok());
        assert!(validate_hex_color("#ccc").is_ok());
        assert!(validate_hex_color("1890ff").is_err());
        assert!(validate_hex_color("#12345g").is_err());
        assert!(validate_hex_color("#1234").is_err());
    }
}
