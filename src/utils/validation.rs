//! Utilidades de validación
//!
//! Funciones helper para validación de datos y conversión de fechas que
//! complementan las reglas declarativas de `validator` en los DTOs.

use chrono::{DateTime, NaiveDate, TimeZone, Utc};
use lazy_static::lazy_static;
use regex::Regex;
use serde::{Deserialize, Deserializer};
use validator::ValidationError;

use crate::utils::errors::{validation_error, AppResult};

lazy_static! {
    /// Matrícula ya normalizada: letras, dígitos, espacios y guiones
    static ref LICENSE_PLATE_RE: Regex = Regex::new(r"^[A-Z0-9][A-Z0-9 \-]{0,18}[A-Z0-9]$")
        .expect("license plate regex is valid");
}

/// Validar y convertir string a fecha
pub fn validate_date(value: &str) -> Result<NaiveDate, ValidationError> {
    NaiveDate::parse_from_str(value, "%Y-%m-%d").map_err(|_| {
        let mut error = ValidationError::new("date");
        error.add_param("value".into(), &value.to_string());
        error.add_param("format".into(), &"YYYY-MM-DD".to_string());
        error
    })
}

/// Validar y convertir string a datetime
pub fn validate_datetime(value: &str) -> Result<DateTime<Utc>, ValidationError> {
    DateTime::parse_from_rfc3339(value)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|_| {
            let mut error = ValidationError::new("datetime");
            error.add_param("value".into(), &value.to_string());
            error.add_param("format".into(), &"RFC3339".to_string());
            error
        })
}

/// Acepta RFC 3339 o una fecha simple (medianoche UTC)
pub fn validate_date_or_datetime(value: &str) -> Result<DateTime<Utc>, ValidationError> {
    if let Ok(datetime) = validate_datetime(value) {
        return Ok(datetime);
    }
    let date = validate_date(value)?;
    date.and_hms_opt(0, 0, 0)
        .map(|naive| Utc.from_utc_datetime(&naive))
        .ok_or_else(|| ValidationError::new("date"))
}

/// `deserialize_with` para fechas que llegan de inputs tipo date
pub fn deserialize_datetime<'de, D>(deserializer: D) -> Result<DateTime<Utc>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = String::deserialize(deserializer)?;
    validate_date_or_datetime(raw.trim())
        .map_err(|_| serde::de::Error::custom(format!("invalid date '{}'", raw)))
}

/// Variante opcional de [`deserialize_datetime`]; requiere `#[serde(default)]`
pub fn deserialize_optional_datetime<'de, D>(
    deserializer: D,
) -> Result<Option<DateTime<Utc>>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = Option::<String>::deserialize(deserializer)?;
    match raw {
        Some(value) if !value.trim().is_empty() => validate_date_or_datetime(value.trim())
            .map(Some)
            .map_err(|_| serde::de::Error::custom(format!("invalid date '{}'", value))),
        _ => Ok(None),
    }
}

/// Un valor estrictamente positivo (capacidad, peso de carga)
pub fn require_positive(field: &'static str, value: f64) -> AppResult<()> {
    if !value.is_finite() || value <= 0.0 {
        return Err(validation_error(field, "must be greater than zero"));
    }
    Ok(())
}

/// Un valor mayor o igual a cero (odómetro)
pub fn require_non_negative(field: &'static str, value: f64) -> AppResult<()> {
    if !value.is_finite() || value < 0.0 {
        return Err(validation_error(field, "must not be negative"));
    }
    Ok(())
}

pub fn require_license_plate(normalized: &str) -> AppResult<()> {
    if !LICENSE_PLATE_RE.is_match(normalized) {
        return Err(validation_error(
            "license_plate",
            "must contain 2-20 letters, digits, spaces or dashes",
        ));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Datelike;

    #[test]
    fn test_date_or_datetime_accepts_both_formats() {
        let from_date = validate_date_or_datetime("2027-03-01").unwrap();
        assert_eq!(from_date.year(), 2027);
        assert_eq!(from_date.month(), 3);

        let from_rfc = validate_date_or_datetime("2027-03-01T10:30:00Z").unwrap();
        assert_eq!(from_rfc.day(), 1);

        assert!(validate_date_or_datetime("01/03/2027").is_err());
    }

    #[test]
    fn test_positive_and_non_negative() {
        assert!(require_positive("cargo_weight", 1.0).is_ok());
        assert!(require_positive("cargo_weight", 0.0).is_err());
        assert!(require_positive("cargo_weight", f64::NAN).is_err());
        assert!(require_non_negative("odometer", 0.0).is_ok());
        assert!(require_non_negative("odometer", -0.5).is_err());
    }

    #[test]
    fn test_license_plate_format() {
        assert!(require_license_plate("AB-123-CD").is_ok());
        assert!(require_license_plate("MH 12 AB 1234").is_ok());
        assert!(require_license_plate("A").is_err());
        assert!(require_license_plate("AB_123").is_err());
    }
}
