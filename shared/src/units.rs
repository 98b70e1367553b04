//! Unit conversion engine
//!
//! Pure, stateless conversion between the kitchen units used by recipes and
//! inventory. Units fall into three families, weight (base: grams), volume
//! (base: milliliters) and count (base: pieces), plus compound units (tray,
//! sack, case, ...) that expand to a declared base unit with a scalar factor.
//! Conversions across families are rejected.

use std::fmt;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Unit family sharing a common base unit
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UnitFamily {
    Weight,
    Volume,
    Count,
}

/// A measurement unit known to the inventory system
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Unit {
    // Weight (base: grams)
    Gram,
    Kilogram,
    Pound,
    Ounce,
    // Volume (base: milliliters)
    Milliliter,
    Liter,
    Gallon,
    Cup,
    Tablespoon,
    Teaspoon,
    // Count (base: pieces)
    Piece,
    // Compound units, each a scalar multiple of a base unit
    Tray,
    Dozen,
    Case,
    Pack,
    Sack,
    Bottle,
}

/// Errors from the conversion engine
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConversionError {
    #[error("unknown unit: {0}")]
    UnknownUnit(String),

    #[error("unsupported conversion from {from} to {to}")]
    UnsupportedConversion { from: Unit, to: Unit },
}

impl Unit {
    /// Parse a unit from the free-text spellings found in recipes and
    /// threshold settings. Matching is case-insensitive.
    pub fn parse(s: &str) -> Result<Unit, ConversionError> {
        match s.trim().to_lowercase().as_str() {
            "g" | "gram" | "grams" => Ok(Unit::Gram),
            "kg" | "kilo" | "kilogram" | "kilograms" => Ok(Unit::Kilogram),
            "lb" | "lbs" | "pound" | "pounds" => Ok(Unit::Pound),
            "oz" | "ounce" | "ounces" => Ok(Unit::Ounce),
            "ml" | "milliliter" | "milliliters" => Ok(Unit::Milliliter),
            "l" | "liter" | "liters" | "litre" | "litres" => Ok(Unit::Liter),
            "gal" | "gallon" | "gallons" => Ok(Unit::Gallon),
            "cup" | "cups" => Ok(Unit::Cup),
            "tbsp" | "tablespoon" | "tablespoons" => Ok(Unit::Tablespoon),
            "tsp" | "teaspoon" | "teaspoons" => Ok(Unit::Teaspoon),
            "pc" | "pcs" | "piece" | "pieces" | "unit" | "units" => Ok(Unit::Piece),
            "tray" | "trays" => Ok(Unit::Tray),
            "dozen" | "dozens" | "doz" => Ok(Unit::Dozen),
            "case" | "cases" => Ok(Unit::Case),
            "pack" | "packs" => Ok(Unit::Pack),
            "sack" | "sacks" => Ok(Unit::Sack),
            "bottle" | "bottles" => Ok(Unit::Bottle),
            other => Err(ConversionError::UnknownUnit(other.to_string())),
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Unit::Gram => "g",
            Unit::Kilogram => "kg",
            Unit::Pound => "lb",
            Unit::Ounce => "oz",
            Unit::Milliliter => "ml",
            Unit::Liter => "l",
            Unit::Gallon => "gal",
            Unit::Cup => "cup",
            Unit::Tablespoon => "tbsp",
            Unit::Teaspoon => "tsp",
            Unit::Piece => "pc",
            Unit::Tray => "tray",
            Unit::Dozen => "dozen",
            Unit::Case => "case",
            Unit::Pack => "pack",
            Unit::Sack => "sack",
            Unit::Bottle => "bottle",
        }
    }

    /// Declared base unit and scalar factor for compound units.
    /// 1 tray = 30 pieces, 1 sack = 25 kg, and so on.
    pub fn compound(&self) -> Option<(Unit, Decimal)> {
        match self {
            Unit::Tray => Some((Unit::Piece, Decimal::from(30))),
            Unit::Dozen => Some((Unit::Piece, Decimal::from(12))),
            Unit::Case => Some((Unit::Piece, Decimal::from(24))),
            Unit::Pack => Some((Unit::Piece, Decimal::from(12))),
            Unit::Sack => Some((Unit::Kilogram, Decimal::from(25))),
            Unit::Bottle => Some((Unit::Liter, Decimal::ONE)),
            _ => None,
        }
    }

    /// Family of this unit (compound units take their base unit's family)
    pub fn family(&self) -> UnitFamily {
        if let Some((base, _)) = self.compound() {
            return base.family();
        }
        match self {
            Unit::Gram | Unit::Kilogram | Unit::Pound | Unit::Ounce => UnitFamily::Weight,
            Unit::Milliliter
            | Unit::Liter
            | Unit::Gallon
            | Unit::Cup
            | Unit::Tablespoon
            | Unit::Teaspoon => UnitFamily::Volume,
            Unit::Piece => UnitFamily::Count,
            // Compound units are handled above
            _ => unreachable!("compound unit without declared base"),
        }
    }

    /// Multiplicative factor from a non-compound unit to its family base
    /// (grams, milliliters or pieces).
    fn base_factor(&self) -> Decimal {
        match self {
            Unit::Gram | Unit::Milliliter | Unit::Piece => Decimal::ONE,
            Unit::Kilogram | Unit::Liter => Decimal::from(1000),
            Unit::Pound => Decimal::new(45_359_237, 5), // 453.59237 g
            Unit::Ounce => Decimal::new(28_349_523_125, 9), // 28.349523125 g
            Unit::Gallon => Decimal::new(3_785_411_784, 6), // 3785.411784 ml
            Unit::Cup => Decimal::from(240),
            Unit::Tablespoon => Decimal::from(15),
            Unit::Teaspoon => Decimal::from(5),
            Unit::Tray | Unit::Dozen | Unit::Case | Unit::Pack | Unit::Sack | Unit::Bottle => {
                unreachable!("compound units must be expanded before base conversion")
            }
        }
    }
}

impl fmt::Display for Unit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Convert a quantity between two units.
///
/// Same-unit requests short-circuit to identity. Compound sources are
/// expanded to their base unit first; compound targets are re-expressed by
/// dividing through their factor at the end. Conversions between different
/// families fail with `UnsupportedConversion`.
pub fn convert(quantity: Decimal, from: Unit, to: Unit) -> Result<Decimal, ConversionError> {
    if from == to {
        return Ok(quantity);
    }

    let (src_unit, src_quantity) = match from.compound() {
        Some((base, factor)) => (base, quantity * factor),
        None => (from, quantity),
    };
    let (dst_unit, dst_factor) = match to.compound() {
        Some((base, factor)) => (base, factor),
        None => (to, Decimal::ONE),
    };

    if src_unit.family() != dst_unit.family() {
        return Err(ConversionError::UnsupportedConversion { from, to });
    }

    let in_base = src_quantity * src_unit.base_factor();
    Ok(in_base / dst_unit.base_factor() / dst_factor)
}

/// Convert a quantity given free-text unit names.
pub fn convert_named(quantity: Decimal, from: &str, to: &str) -> Result<Decimal, ConversionError> {
    let from = Unit::parse(from)?;
    let to = Unit::parse(to)?;
    convert(quantity, from, to)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tray_expands_to_pieces() {
        let result = convert(Decimal::from(2), Unit::Tray, Unit::Piece).unwrap();
        assert_eq!(result, Decimal::from(60));
    }

    #[test]
    fn sack_expands_through_weight_base() {
        // 1 sack = 25 kg = 25000 g
        let result = convert(Decimal::ONE, Unit::Sack, Unit::Gram).unwrap();
        assert_eq!(result, Decimal::from(25_000));
    }

    #[test]
    fn cross_family_is_rejected() {
        let err = convert(Decimal::ONE, Unit::Tray, Unit::Kilogram).unwrap_err();
        assert_eq!(
            err,
            ConversionError::UnsupportedConversion {
                from: Unit::Tray,
                to: Unit::Kilogram
            }
        );
    }
}
