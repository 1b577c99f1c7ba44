//! Utilidades de validación
//!
//! Este módulo contiene funciones helper para validación de datos
//! y conversión de tipos.

use lazy_static::lazy_static;
use regex::Regex;
use uuid::Uuid;
use validator::ValidationError;

lazy_static! {
    // Placas: solo letras, números y guiones
    static ref PLATE_REGEX: Regex = Regex::new(r"^[A-Za-z0-9-]+$").unwrap();
}

/// Validar formato de placa de vehículo
pub fn validate_plate(value: &str) -> Result<(), ValidationError> {
    if !PLATE_REGEX.is_match(value) {
        let mut error = ValidationError::new("plate");
        error.add_param("value".into(), &value.to_string());
        return Err(error);
    }
    Ok(())
}

/// Validar y convertir string a UUID
pub fn validate_uuid(value: &str) -> Result<Uuid, ValidationError> {
    Uuid::parse_str(value).map_err(|_| {
        let mut error = ValidationError::new("uuid");
        error.add_param("value".into(), &value.to_string());
        error
    })
}

/// Validar que un string no esté vacío
pub fn validate_not_empty(value: &str) -> Result<(), ValidationError> {
    if value.trim().is_empty() {
        let mut error = ValidationError::new("not_empty");
        error.add_param("value".into(), &value.to_string());
        return Err(error);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_plate_accepts_alphanumeric_and_dashes() {
        assert!(validate_plate("ABC-123").is_ok());
        assert!(validate_plate("abc123").is_ok());
        assert!(validate_plate("A-1-B-2").is_ok());
    }

    #[test]
    fn test_validate_plate_rejects_whitespace_and_punctuation() {
        assert!(validate_plate("ABC 123").is_err());
        assert!(validate_plate("ABC_123").is_err());
        assert!(validate_plate("ABC.123").is_err());
        assert!(validate_plate("ABC#123").is_err());
        assert!(validate_plate("").is_err());
    }

    #[test]
    fn test_validate_uuid() {
        let valid_uuid = "550e8400-e29b-41d4-a716-446655440000";
        assert!(validate_uuid(valid_uuid).is_ok());

        let invalid_uuid = "invalid-uuid";
        assert!(validate_uuid(invalid_uuid).is_err());
    }

    #[test]
    fn test_validate_not_empty() {
        assert!(validate_not_empty("texto").is_ok());
        assert!(validate_not_empty("   ").is_err());
        assert!(validate_not_empty("").is_err());
    }
}
