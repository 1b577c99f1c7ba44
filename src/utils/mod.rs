//! Utilidades compartidas

pub mod errors;
pub mod logging;
pub mod validation;
