//! Type-safe physical units for field extrapolation
//!
//! This module provides strongly-typed lengths using the `uom` crate to
//! prevent unit confusion at the public API, plus parsing of the magnetic
//! field unit strings carried by magnetogram metadata. Internally the
//! numerical kernels work in centimeters and the magnetogram's native
//! field unit.

use thiserror::Error;
use uom::si::f64::*;
use uom::si::length::{centimeter, kilometer, megameter, meter};

/// Type alias for length measurements with convenient methods
pub type Length = uom::si::f64::Length;

/// Extension trait for length conversions used in solar physics
pub trait LengthExt {
    /// Create length from centimeters (the internal working unit)
    fn from_centimeters(cm: f64) -> Self;

    /// Get length in centimeters
    fn as_centimeters(&self) -> f64;

    /// Create length from meters
    fn from_meters(m: f64) -> Self;

    /// Get length in meters
    fn as_meters(&self) -> f64;

    /// Create length from kilometers
    fn from_kilometers(km: f64) -> Self;

    /// Get length in kilometers
    fn as_kilometers(&self) -> f64;

    /// Create length from megameters (typical coronal loop scales)
    fn from_megameters(mm: f64) -> Self;

    /// Get length in megameters
    fn as_megameters(&self) -> f64;
}

impl LengthExt for Length {
    fn from_centimeters(cm: f64) -> Self {
        Length::new::<centimeter>(cm)
    }

    fn as_centimeters(&self) -> f64 {
        self.get::<centimeter>()
    }

    fn from_meters(m: f64) -> Self {
        Length::new::<meter>(m)
    }

    fn as_meters(&self) -> f64 {
        self.get::<meter>()
    }

    fn from_kilometers(km: f64) -> Self {
        Length::new::<kilometer>(km)
    }

    fn as_kilometers(&self) -> f64 {
        self.get::<kilometer>()
    }

    fn from_megameters(mm: f64) -> Self {
        Length::new::<megameter>(mm)
    }

    fn as_megameters(&self) -> f64 {
        self.get::<megameter>()
    }
}

/// Error raised when a magnetogram carries an unusable field unit string
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum UnitError {
    #[error("unrecognized magnetic field unit '{0}'")]
    UnrecognizedFieldUnit(String),
    #[error("missing magnetic field unit")]
    MissingFieldUnit,
}

/// Magnetic field unit of a magnetogram's pixel values.
///
/// Every downstream quantity (boundary field, vector field) is expressed in
/// this unit; the scalar potential in this unit times centimeters.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldUnit {
    /// Gauss (CGS), the conventional magnetogram unit
    Gauss,
    /// Tesla (SI)
    Tesla,
    /// Millitesla
    Millitesla,
}

impl FieldUnit {
    /// Parse a metadata unit string (e.g. the FITS `BUNIT` value).
    ///
    /// Fails fast on unknown or empty strings: every downstream computation
    /// assumes a consistent physical unit, so an unusable string is a
    /// construction error, not something to guess around.
    pub fn parse(unit: &str) -> Result<Self, UnitError> {
        let trimmed = unit.trim();
        if trimmed.is_empty() {
            return Err(UnitError::MissingFieldUnit);
        }
        match trimmed {
            "G" | "g" | "Gauss" | "gauss" => Ok(FieldUnit::Gauss),
            "T" | "Tesla" | "tesla" => Ok(FieldUnit::Tesla),
            "mT" | "millitesla" => Ok(FieldUnit::Millitesla),
            other => Err(UnitError::UnrecognizedFieldUnit(other.to_string())),
        }
    }

    /// Conversion factor from this unit to gauss
    pub fn gauss_factor(&self) -> f64 {
        match self {
            FieldUnit::Gauss => 1.0,
            FieldUnit::Tesla => 1.0e4,
            FieldUnit::Millitesla => 10.0,
        }
    }

    /// Canonical unit string
    pub fn symbol(&self) -> &'static str {
        match self {
            FieldUnit::Gauss => "G",
            FieldUnit::Tesla => "T",
            FieldUnit::Millitesla => "mT",
        }
    }
}

impl std::fmt::Display for FieldUnit {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.symbol())
    }
}
