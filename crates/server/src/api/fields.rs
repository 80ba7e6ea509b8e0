//! Parsing of numeric form text. Blank input reads as zero.

use shared::error::{ApiError, ErrorCode};

pub(crate) fn parse_whole(field: &str, raw: &str) -> Result<i64, ApiError> {
    let raw = raw.trim();
    if raw.is_empty() {
        return Ok(0);
    }
    raw.parse::<i64>()
        .map_err(|_| invalid_number(field, raw))
}

pub(crate) fn parse_decimal(field: &str, raw: &str) -> Result<f64, ApiError> {
    let raw = raw.trim();
    if raw.is_empty() {
        return Ok(0.0);
    }
    match raw.parse::<f64>() {
        Ok(value) if value.is_finite() => Ok(value),
        _ => Err(invalid_number(field, raw)),
    }
}

fn invalid_number(field: &str, raw: &str) -> ApiError {
    ApiError::new(
        ErrorCode::Validation,
        format!("{field} must be a number, got '{raw}'"),
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn blank_fields_read_as_zero() {
        assert_eq!(parse_whole("price", "  ").expect("whole"), 0);
        assert_eq!(parse_decimal("lotSize", "").expect("decimal"), 0.0);
    }

    #[test]
    fn rejects_text_and_non_finite_values() {
        let err = parse_whole("price", "cheap").expect_err("text");
        assert!(matches!(err.code, ErrorCode::Validation));
        assert!(err.message.contains("price"));
        assert!(parse_whole("numBedrooms", "2.5").is_err());
        assert!(parse_decimal("lotSize", "NaN").is_err());
        assert_eq!(parse_decimal("numBathrooms", " 2.5 ").expect("decimal"), 2.5);
    }
}
