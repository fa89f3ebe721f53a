//! Car search parameters and their validation

use serde::Deserialize;
use utoipa::IntoParams;

use crate::types::FieldIssue;

/// Query parameters accepted by `GET /cars`, exactly as they arrived
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RawCarQuery {
    pub id: Vec<String>,
    pub brand: Vec<String>,
    pub model: Vec<String>,
    pub year: Vec<String>,
    pub max_price: Vec<String>,
}

impl RawCarQuery {
    /// Collect recognized keys from decoded query pairs; unknown keys are dropped
    pub fn from_pairs<I, K, V>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: Into<String>,
    {
        let mut raw = Self::default();
        for (key, value) in pairs {
            let slot = match key.as_ref() {
                "id" => &mut raw.id,
                "brand" => &mut raw.brand,
                "model" => &mut raw.model,
                "year" => &mut raw.year,
                "maxPrice" => &mut raw.max_price,
                _ => continue,
            };
            slot.push(value.into());
        }
        raw
    }
}

/// Validated car filter. Every field is optional; supplied fields are AND-combined.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
#[serde(rename_all = "camelCase")]
pub struct CarFilter {
    /// Exact listing id
    pub id: Option<i64>,
    /// Case-insensitive substring of the brand
    pub brand: Option<String>,
    /// Case-insensitive substring of the model
    pub model: Option<String>,
    /// Exact model year
    pub year: Option<i64>,
    /// Inclusive upper price bound
    pub max_price: Option<i64>,
}

/// Validate raw parameters, reporting every failing field at once
pub fn validate_car_query(raw: &RawCarQuery) -> Result<CarFilter, Vec<FieldIssue>> {
    let mut issues = Vec::new();

    let filter = CarFilter {
        id: positive_int("id", &raw.id, &mut issues),
        brand: single_string("brand", &raw.brand, &mut issues),
        model: single_string("model", &raw.model, &mut issues),
        year: positive_int("year", &raw.year, &mut issues),
        max_price: positive_int("maxPrice", &raw.max_price, &mut issues),
    };

    if issues.is_empty() {
        Ok(filter)
    } else {
        Err(issues)
    }
}

fn single_string(field: &str, values: &[String], issues: &mut Vec<FieldIssue>) -> Option<String> {
    match values {
        [] => None,
        [value] => Some(value.clone()),
        _ => {
            issues.push(FieldIssue::new(
                field,
                "invalid_type",
                "Expected string, received array",
            ));
            None
        }
    }
}

fn positive_int(field: &str, values: &[String], issues: &mut Vec<FieldIssue>) -> Option<i64> {
    let value = match values {
        [] => return None,
        [value] => value,
        // A list never coerces to a number
        _ => {
            issues.push(FieldIssue::new(field, "invalid_type", "Expected number, received nan"));
            return None;
        }
    };

    // Large integers lose precision through f64
    if let Ok(n) = value.trim().parse::<i64>() {
        if n > 0 {
            return Some(n);
        }
    }

    let n = coerce_number(value);
    if n.is_nan() {
        issues.push(FieldIssue::new(field, "invalid_type", "Expected number, received nan"));
        return None;
    }
    if !n.is_finite() || n.fract() != 0.0 {
        issues.push(FieldIssue::new(field, "invalid_type", "Expected integer, received float"));
        return None;
    }
    if n <= 0.0 {
        issues.push(FieldIssue::new(field, "too_small", "Number must be greater than 0"));
        return None;
    }

    Some(n as i64)
}

/// Loose string-to-number coercion.
///
/// Whitespace is trimmed and an empty string is zero. `0x`, `0o` and `0b` prefixes are
/// read in their radix, `Infinity` may carry a sign, and anything else that is not a
/// decimal literal is NaN.
pub fn coerce_number(input: &str) -> f64 {
    let s = input.trim();
    if s.is_empty() {
        return 0.0;
    }

    match s {
        "Infinity" | "+Infinity" => return f64::INFINITY,
        "-Infinity" => return f64::NEG_INFINITY,
        _ => {}
    }

    let radix = match s.get(..2) {
        Some("0x") | Some("0X") => Some(16),
        Some("0o") | Some("0O") => Some(8),
        Some("0b") | Some("0B") => Some(2),
        _ => None,
    };
    if let Some(radix) = radix {
        return u64::from_str_radix(&s[2..], radix)
            .map(|n| n as f64)
            .unwrap_or(f64::NAN);
    }

    let is_decimal_literal = s
        .chars()
        .all(|c| c.is_ascii_digit() || matches!(c, '+' | '-' | '.' | 'e' | 'E'));
    if !is_decimal_literal {
        return f64::NAN;
    }

    s.parse::<f64>().unwrap_or(f64::NAN)
}
