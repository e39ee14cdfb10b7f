//! Known unit labels with their category and plausible value range.
use super::error::{ValidationError, ValidationErrorType};
use std::borrow::Cow;

/// The physical or financial quantity a unit measures.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnitCategory {
    Power,
    Energy,
    Currency,
    Time,
    Ratio,
    Rate,
    Volume,
    Temperature,
    Dimensionless,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct UnitInfo {
    pub category: UnitCategory,
    /// Inclusive `(min, max)` of values that are plausible for an input.
    pub range: Option<(f64, f64)>,
}

const fn unit(category: UnitCategory, min: f64, max: f64) -> UnitInfo {
    UnitInfo { category, range: Some((min, max)) }
}

const fn unbounded(category: UnitCategory) -> UnitInfo {
    UnitInfo { category, range: None }
}

use UnitCategory::*;

static UNITS: [(&str, UnitInfo); 26] = [
    ("W", unit(Power, 0.0, 1e12)),
    ("kW", unit(Power, 0.0, 1e9)),
    ("MW", unit(Power, 0.0, 1e6)),
    ("GW", unit(Power, 0.0, 1e3)),
    ("Wh", unit(Energy, 0.0, 1e15)),
    ("kWh", unit(Energy, 0.0, 1e12)),
    ("MWh", unit(Energy, 0.0, 1e9)),
    ("GWh", unit(Energy, 0.0, 1e6)),
    ("USD", unit(Currency, 0.0, 1e12)),
    ("EUR", unit(Currency, 0.0, 1e12)),
    ("GBP", unit(Currency, 0.0, 1e12)),
    ("hours", unit(Time, 0.0, 1e6)),
    ("days", unit(Time, 0.0, 1e5)),
    ("years", unit(Time, 0.0, 100.0)),
    ("%", unit(Ratio, 0.0, 100.0)),
    ("ratio", unit(Ratio, 0.0, 1.0)),
    ("liters", unit(Volume, 0.0, 1e12)),
    ("gallons", unit(Volume, 0.0, 1e12)),
    ("C", unit(Temperature, -50.0, 100.0)),
    ("F", unit(Temperature, -60.0, 200.0)),
    ("USD/kWh", unbounded(Rate)),
    ("USD/year", unbounded(Rate)),
    ("USD/MW", unbounded(Rate)),
    ("kWh/year", unbounded(Rate)),
    ("MW/rack", unbounded(Rate)),
    ("dimensionless", unbounded(Dimensionless)),
];

const CURRENCY_SYMBOLS: [(&str, &str); 3] = [("$", "USD"), ("€", "EUR"), ("£", "GBP")];

/// Maps a bare currency symbol to its code; other labels pass through.
pub(crate) fn canonical_base(base: &str) -> &str {
    CURRENCY_SYMBOLS
        .iter()
        .find(|(symbol, _)| *symbol == base)
        .map_or(base, |&(_, code)| code)
}

/// Rewrites currency symbols inside a compound label, e.g. `$/kWh` -> `USD/kWh`.
pub(crate) fn canonical_label(label: &str) -> Cow<'_, str> {
    let label = label.trim();
    if !CURRENCY_SYMBOLS.iter().any(|(symbol, _)| label.contains(symbol)) {
        return Cow::Borrowed(label);
    }
    let mut owned = label.to_string();
    for (symbol, code) in CURRENCY_SYMBOLS {
        owned = owned.replace(symbol, code);
    }
    Cow::Owned(owned)
}

/// Looks up a unit label, accepting currency symbols for their codes.
pub fn lookup(label: &str) -> Option<&'static UnitInfo> {
    let label = canonical_label(label);
    if label.is_empty() {
        return UNITS.iter().find(|(name, _)| *name == "dimensionless").map(|(_, info)| info);
    }
    UNITS.iter().find(|(name, _)| *name == &*label).map(|(_, info)| info)
}

/// Checks one supplied input against its declared unit, reporting the first problem found.
pub fn check_input(parameter: &str, value: f64, label: &str) -> Option<ValidationError> {
    let report = |error_type: ValidationErrorType, message: String| {
        Some(ValidationError { parameter: parameter.to_string(), error_type, message })
    };

    let Some(info) = lookup(label) else {
        return report(
            ValidationErrorType::UnknownUnit,
            format!("Unknown unit '{}' for parameter '{}'", label, parameter),
        );
    };

    if let Some((min, max)) = info.range {
        if value < min || value > max {
            return report(
                ValidationErrorType::ValueOutOfRange,
                format!("Value {} {} is outside reasonable range ({}, {})", value, label, min, max),
            );
        }
    }

    match &*canonical_label(label) {
        "MW" if value > 1000.0 => report(
            ValidationErrorType::PossibleScaleError,
            format!("Value {} MW seems very high; did you mean {:.2} MW (entered in kW)?", value, value / 1000.0),
        ),
        "kW" if value > 0.0 && value < 0.001 => report(
            ValidationErrorType::PossibleScaleError,
            format!("Value {} kW seems very low; did you mean {:.2} W?", value, value * 1000.0),
        ),
        "%" if value > 1.0 && value < 100.0 => report(
            ValidationErrorType::PercentageFormat,
            format!("Value {}% looks like a whole percentage; enter it as a fraction ({})", value, value / 100.0),
        ),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case("$", "USD")]
    #[case("€", "EUR")]
    #[case("£", "GBP")]
    #[case("USD", "USD")]
    #[case("kWh", "kWh")]
    fn test_currency_symbols(#[case] base: &str, #[case] expected: &str) {
        assert_eq!(canonical_base(base), expected);
    }

    #[test]
    fn test_lookup_accepts_symbols_and_rates() {
        assert_eq!(lookup("$").unwrap().category, UnitCategory::Currency);
        assert_eq!(lookup("$/kWh").unwrap().category, UnitCategory::Rate);
        assert_eq!(lookup("").unwrap().category, UnitCategory::Dimensionless);
        assert!(lookup("furlongs").is_none());
    }

    #[rstest]
    #[case("MW", 50.0)]
    #[case("%", 0.15)]
    #[case("%", 100.0)]
    #[case("kW", 0.0)]
    #[case("C", -10.0)]
    #[case("USD/kWh", 1e9)]
    #[case("dimensionless", -5.0)]
    fn test_plausible_inputs_pass(#[case] label: &str, #[case] value: f64) {
        assert_eq!(check_input("p", value, label), None);
    }

    #[rstest]
    #[case("furlongs", 1.0, ValidationErrorType::UnknownUnit)]
    #[case("years", 150.0, ValidationErrorType::ValueOutOfRange)]
    #[case("USD", -1.0, ValidationErrorType::ValueOutOfRange)]
    #[case("MW", 5000.0, ValidationErrorType::PossibleScaleError)]
    #[case("kW", 0.0005, ValidationErrorType::PossibleScaleError)]
    #[case("%", 15.0, ValidationErrorType::PercentageFormat)]
    fn test_implausible_inputs_are_flagged(
        #[case] label: &str,
        #[case] value: f64,
        #[case] expected: ValidationErrorType,
    ) {
        let error = check_input("capacity", value, label).unwrap();
        assert_eq!(error.parameter, "capacity");
        assert_eq!(error.error_type, expected);
    }
}
