//! Tests for the unit conversion engine
//! Verifies family-based conversion, compound unit expansion and rejection
//! of cross-family conversions

use proptest::prelude::*;
use rust_decimal::Decimal;
use shared::{convert, convert_named, ConversionError, Unit, UnitFamily};
use std::str::FromStr;

/// Helper to create Decimal from string
fn dec(s: &str) -> Decimal {
    Decimal::from_str(s).unwrap()
}

// =============================================================================
// Simple Conversion Tests
// =============================================================================

mod weight_conversions {
    use super::*;

    #[test]
    fn kilograms_to_grams() {
        assert_eq!(
            convert(dec("2.5"), Unit::Kilogram, Unit::Gram).unwrap(),
            dec("2500")
        );
    }

    #[test]
    fn grams_to_kilograms() {
        assert_eq!(
            convert(dec("250"), Unit::Gram, Unit::Kilogram).unwrap(),
            dec("0.25")
        );
    }

    #[test]
    fn pounds_to_grams() {
        assert_eq!(
            convert(Decimal::ONE, Unit::Pound, Unit::Gram).unwrap(),
            dec("453.59237")
        );
    }

    #[test]
    fn ounces_to_pounds() {
        // 16 oz = 1 lb
        let result = convert(dec("16"), Unit::Ounce, Unit::Pound).unwrap();
        assert!((result - Decimal::ONE).abs() < dec("0.000001"));
    }
}

mod volume_conversions {
    use super::*;

    #[test]
    fn liters_to_milliliters() {
        assert_eq!(
            convert(dec("1.5"), Unit::Liter, Unit::Milliliter).unwrap(),
            dec("1500")
        );
    }

    #[test]
    fn cups_to_milliliters() {
        assert_eq!(
            convert(dec("2"), Unit::Cup, Unit::Milliliter).unwrap(),
            dec("480")
        );
    }

    #[test]
    fn tablespoons_to_teaspoons() {
        // 15 ml / 5 ml
        assert_eq!(
            convert(Decimal::ONE, Unit::Tablespoon, Unit::Teaspoon).unwrap(),
            dec("3")
        );
    }

    #[test]
    fn gallons_to_liters() {
        assert_eq!(
            convert(Decimal::ONE, Unit::Gallon, Unit::Liter).unwrap(),
            dec("3.785411784")
        );
    }
}

// =============================================================================
// Compound Unit Tests
// tray=30pc, dozen=12pc, case=24pc, pack=12pc, sack=25kg, bottle=1l
// =============================================================================

mod compound_units {
    use super::*;

    #[test]
    fn tray_to_pieces() {
        assert_eq!(
            convert(dec("2"), Unit::Tray, Unit::Piece).unwrap(),
            dec("60")
        );
    }

    #[test]
    fn pieces_to_dozen() {
        assert_eq!(
            convert(dec("36"), Unit::Piece, Unit::Dozen).unwrap(),
            dec("3")
        );
    }

    #[test]
    fn case_to_tray() {
        // Both expand through pieces: 24 / 30
        assert_eq!(
            convert(Decimal::ONE, Unit::Case, Unit::Tray).unwrap(),
            dec("0.8")
        );
    }

    #[test]
    fn sack_to_grams() {
        // 1 sack = 25 kg = 25000 g
        assert_eq!(
            convert(Decimal::ONE, Unit::Sack, Unit::Gram).unwrap(),
            dec("25000")
        );
    }

    #[test]
    fn milliliters_to_bottles() {
        // 1 bottle = 1 l = 1000 ml
        assert_eq!(
            convert(dec("2500"), Unit::Milliliter, Unit::Bottle).unwrap(),
            dec("2.5")
        );
    }

    #[test]
    fn compound_families_follow_base() {
        assert_eq!(Unit::Tray.family(), UnitFamily::Count);
        assert_eq!(Unit::Sack.family(), UnitFamily::Weight);
        assert_eq!(Unit::Bottle.family(), UnitFamily::Volume);
    }
}

// =============================================================================
// Rejection and Parsing Tests
// =============================================================================

mod conversion_errors {
    use super::*;

    #[test]
    fn cross_family_weight_to_volume() {
        let err = convert(Decimal::ONE, Unit::Kilogram, Unit::Liter).unwrap_err();
        assert_eq!(
            err,
            ConversionError::UnsupportedConversion {
                from: Unit::Kilogram,
                to: Unit::Liter
            }
        );
    }

    #[test]
    fn cross_family_compound_source() {
        // tray expands to pieces, incompatible with grams
        let err = convert(Decimal::ONE, Unit::Tray, Unit::Gram).unwrap_err();
        assert!(matches!(err, ConversionError::UnsupportedConversion { .. }));
    }

    #[test]
    fn same_unit_is_identity() {
        // Identity short-circuits before compound expansion
        assert_eq!(
            convert(dec("7.77"), Unit::Bottle, Unit::Bottle).unwrap(),
            dec("7.77")
        );
    }

    #[test]
    fn unknown_unit_name_is_rejected() {
        let err = convert_named(Decimal::ONE, "bushel", "kg").unwrap_err();
        assert_eq!(err, ConversionError::UnknownUnit("bushel".to_string()));
    }

    #[test]
    fn parsing_is_case_insensitive() {
        assert_eq!(Unit::parse("KG").unwrap(), Unit::Kilogram);
        assert_eq!(Unit::parse(" Grams ").unwrap(), Unit::Gram);
        assert_eq!(Unit::parse("Pieces").unwrap(), Unit::Piece);
    }

    #[test]
    fn convert_named_handles_recipe_spellings() {
        assert_eq!(
            convert_named(dec("3"), "kilograms", "g").unwrap(),
            dec("3000")
        );
        assert_eq!(convert_named(dec("24"), "pcs", "dozen").unwrap(), dec("2"));
    }
}

// =============================================================================
// Property Tests
// =============================================================================

fn positive_quantity() -> impl Strategy<Value = Decimal> {
    (1u64..1_000_000).prop_map(|cents| Decimal::new(cents as i64, 2))
}

fn any_unit() -> impl Strategy<Value = Unit> {
    prop::sample::select(vec![
        Unit::Gram,
        Unit::Kilogram,
        Unit::Pound,
        Unit::Ounce,
        Unit::Milliliter,
        Unit::Liter,
        Unit::Gallon,
        Unit::Cup,
        Unit::Tablespoon,
        Unit::Teaspoon,
        Unit::Piece,
        Unit::Tray,
        Unit::Dozen,
        Unit::Case,
        Unit::Pack,
        Unit::Sack,
        Unit::Bottle,
    ])
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(200))]

    /// Converting there and back recovers the original quantity within
    /// rounding noise
    #[test]
    fn prop_round_trip_within_tolerance(
        quantity in positive_quantity(),
        from in any_unit(),
        to in any_unit()
    ) {
        if from.family() == to.family() {
            let forward = convert(quantity, from, to).unwrap();
            let back = convert(forward, to, from).unwrap();
            prop_assert!((back - quantity).abs() < Decimal::new(1, 6));
        }
    }

    /// Conversion preserves sign and scales positives to positives
    #[test]
    fn prop_positive_stays_positive(
        quantity in positive_quantity(),
        from in any_unit(),
        to in any_unit()
    ) {
        if from.family() == to.family() {
            prop_assert!(convert(quantity, from, to).unwrap() > Decimal::ZERO);
        }
    }

    /// Cross-family conversions always fail (and never panic)
    #[test]
    fn prop_cross_family_always_rejected(
        quantity in positive_quantity(),
        from in any_unit(),
        to in any_unit()
    ) {
        if from.family() != to.family() {
            prop_assert!(convert(quantity, from, to).is_err());
        }
    }
}
