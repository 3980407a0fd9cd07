//! Unit conversion table.
//!
//! Every accepted alias maps onto one canonical [`ConversionUnit`]. Units only
//! convert within their own [`Category`]; temperature is affine and goes
//! through [`convert_temperature`] instead of a `to_base` factor.

use std::collections::HashMap;
use std::f64::consts::PI;
use std::fmt;
use std::sync::OnceLock;

use serde::Serialize;

use crate::error::{CalcError, Result};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum Category {
    Length,
    Area,
    Volume,
    Weight,
    Temperature,
    Data,
    Time,
    Angle,
    Currency,
    CssLength,
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Category::Length => "length",
            Category::Area => "area",
            Category::Volume => "volume",
            Category::Weight => "weight",
            Category::Temperature => "temperature",
            Category::Data => "data",
            Category::Time => "time",
            Category::Angle => "angle",
            Category::Currency => "currency",
            Category::CssLength => "css-length",
        };
        f.write_str(name)
    }
}

/// A canonical unit: `to_base` converts one of it into the category's base unit.
#[derive(Clone, Copy, Debug, PartialEq, Serialize)]
pub struct ConversionUnit {
    pub name: &'static str,
    pub symbol: &'static str,
    pub to_base: f64,
    pub category: Category,
}

struct UnitDef {
    unit: ConversionUnit,
    aliases: &'static [&'static str],
}

const fn def(
    name: &'static str,
    symbol: &'static str,
    to_base: f64,
    category: Category,
    aliases: &'static [&'static str],
) -> UnitDef {
    UnitDef {
        unit: ConversionUnit {
            name,
            symbol,
            to_base,
            category,
        },
        aliases,
    }
}

use Category::{Angle, Area, CssLength, Data, Length, Time, Volume, Weight};

const UNITS: &[UnitDef] = &[
    // Length (base: meter)
    def("meter", "m", 1.0, Length, &["meter", "meters", "metre", "metres", "m"]),
    def("kilometer", "km", 1000.0, Length, &["kilometer", "kilometers", "km"]),
    def("centimeter", "cm", 0.01, Length, &["centimeter", "centimeters", "cm"]),
    def("millimeter", "mm", 0.001, Length, &["millimeter", "millimeters", "mm"]),
    def("inch", "in", 0.0254, Length, &["inch", "inches", "in"]),
    def("foot", "ft", 0.3048, Length, &["foot", "feet", "ft"]),
    def("yard", "yd", 0.9144, Length, &["yard", "yards", "yd"]),
    def("mile", "mi", 1609.344, Length, &["mile", "miles", "mi"]),
    // Area (base: square meter)
    def("square meter", "m²", 1.0, Area, &["sqm"]),
    def("square foot", "ft²", 0.092903, Area, &["sqft"]),
    def("square inch", "in²", 0.00064516, Area, &["sqin"]),
    def("acre", "acre", 4046.86, Area, &["acre", "acres"]),
    def("hectare", "ha", 10000.0, Area, &["hectare", "hectares", "ha"]),
    // Volume (base: liter)
    def("liter", "L", 1.0, Volume, &["liter", "liters", "litre", "litres", "l", "L"]),
    def("milliliter", "mL", 0.001, Volume, &["milliliter", "milliliters", "ml"]),
    def("gallon", "gal", 3.78541, Volume, &["gallon", "gallons", "gal"]),
    def("quart", "qt", 0.946353, Volume, &["quart", "quarts", "qt"]),
    def("pint", "pt", 0.473176, Volume, &["pint", "pints", "pt"]),
    def("cup", "cup", 0.236588, Volume, &["cup", "cups"]),
    // Weight (base: kilogram)
    def("kilogram", "kg", 1.0, Weight, &["kilogram", "kilograms", "kg"]),
    def("gram", "g", 0.001, Weight, &["gram", "grams", "g"]),
    def("milligram", "mg", 0.000001, Weight, &["milligram", "milligrams", "mg"]),
    def("pound", "lb", 0.453592, Weight, &["pound", "pounds", "lb", "lbs"]),
    def("ounce", "oz", 0.0283495, Weight, &["ounce", "ounces", "oz"]),
    def("stone", "st", 6.35029, Weight, &["stone", "st"]),
    // Data (base: byte, binary multiples)
    def("byte", "B", 1.0, Data, &["byte", "bytes", "B"]),
    def("kilobyte", "KB", 1024.0, Data, &["kilobyte", "kilobytes", "KB"]),
    def("megabyte", "MB", 1048576.0, Data, &["megabyte", "megabytes", "MB"]),
    def("gigabyte", "GB", 1073741824.0, Data, &["gigabyte", "gigabytes", "GB"]),
    def("terabyte", "TB", 1099511627776.0, Data, &["terabyte", "terabytes", "TB"]),
    // Time (base: second)
    def("second", "s", 1.0, Time, &["second", "seconds", "sec", "s"]),
    def("minute", "min", 60.0, Time, &["minute", "minutes", "min"]),
    def("hour", "h", 3600.0, Time, &["hour", "hours", "hr", "h"]),
    def("day", "d", 86400.0, Time, &["day", "days", "d"]),
    def("week", "wk", 604800.0, Time, &["week", "weeks", "wk"]),
    def("month", "mo", 2628000.0, Time, &["month", "months"]),
    def("year", "yr", 31536000.0, Time, &["year", "years", "yr"]),
    // Angle (base: radian)
    def("radian", "rad", 1.0, Angle, &["radian", "radians", "rad"]),
    def("degree", "°", PI / 180.0, Angle, &["degree", "degrees", "deg"]),
    // CSS lengths (base: pixel at 96 DPI, 16px font, 375x768 viewport)
    def("pixel", "px", 1.0, CssLength, &["pixel", "pixels", "px"]),
    def("point", "pt", 4.0 / 3.0, CssLength, &["point", "points"]),
    def("em", "em", 16.0, CssLength, &["em", "ems"]),
    def("rem", "rem", 16.0, CssLength, &["rem", "rems"]),
    def("vh", "vh", 7.68, CssLength, &["vh"]),
    def("vw", "vw", 3.75, CssLength, &["vw"]),
    def("vmin", "vmin", 3.75, CssLength, &["vmin"]),
    def("vmax", "vmax", 7.68, CssLength, &["vmax"]),
    def("percent", "%", 0.16, CssLength, &["percent"]),
];

struct AliasIndex {
    exact: HashMap<&'static str, &'static ConversionUnit>,
    folded: HashMap<String, &'static ConversionUnit>,
}

fn alias_index() -> &'static AliasIndex {
    static INDEX: OnceLock<AliasIndex> = OnceLock::new();
    INDEX.get_or_init(|| {
        let mut exact = HashMap::new();
        let mut folded = HashMap::new();
        for def in UNITS {
            for alias in def.aliases {
                exact.insert(*alias, &def.unit);
                if alias.chars().count() > 1 {
                    folded.entry(alias.to_lowercase()).or_insert(&def.unit);
                }
            }
        }
        AliasIndex { exact, folded }
    })
}

/// Look up a unit alias. Exact spelling wins; multi-letter aliases also
/// match case-insensitively (`KM`, `Feet`). Single letters are
/// case-sensitive so `m` and `M`, `B` and `b` stay distinct.
pub fn lookup(alias: &str) -> Option<&'static ConversionUnit> {
    let index = alias_index();
    if let Some(unit) = index.exact.get(alias) {
        return Some(*unit);
    }
    if alias.chars().count() > 1 {
        return index.folded.get(&alias.to_lowercase()).copied();
    }
    None
}

/// All canonical units of a category, in table order.
pub fn units_in(category: Category) -> Vec<&'static ConversionUnit> {
    UNITS
        .iter()
        .map(|def| &def.unit)
        .filter(|unit| unit.category == category)
        .collect()
}

/// Convert `value` between two units of the same category.
pub fn convert(value: f64, from: &str, to: &str) -> Result<f64> {
    let from_unit = lookup(from).ok_or_else(|| CalcError::UnknownUnit(from.to_string()))?;
    let to_unit = lookup(to).ok_or_else(|| CalcError::UnknownUnit(to.to_string()))?;

    if from_unit.category != to_unit.category {
        return Err(CalcError::CategoryMismatch {
            from: from_unit.category,
            to: to_unit.category,
        });
    }

    Ok(value * from_unit.to_base / to_unit.to_base)
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TemperatureScale {
    Celsius,
    Fahrenheit,
    Kelvin,
}

impl TemperatureScale {
    /// Temperature aliases are case-insensitive (`C`, `celsius`, `Kelvin`).
    pub fn from_alias(alias: &str) -> Option<Self> {
        match alias.to_lowercase().as_str() {
            "celsius" | "c" => Some(TemperatureScale::Celsius),
            "fahrenheit" | "f" => Some(TemperatureScale::Fahrenheit),
            "kelvin" | "k" => Some(TemperatureScale::Kelvin),
            _ => None,
        }
    }

    pub fn symbol(self) -> &'static str {
        match self {
            TemperatureScale::Celsius => "°C",
            TemperatureScale::Fahrenheit => "°F",
            TemperatureScale::Kelvin => "K",
        }
    }

    fn to_celsius(self, value: f64) -> f64 {
        match self {
            TemperatureScale::Celsius => value,
            TemperatureScale::Fahrenheit => (value - 32.0) * 5.0 / 9.0,
            TemperatureScale::Kelvin => value - 273.15,
        }
    }

    fn from_celsius(self, celsius: f64) -> f64 {
        match self {
            TemperatureScale::Celsius => celsius,
            TemperatureScale::Fahrenheit => celsius * 9.0 / 5.0 + 32.0,
            TemperatureScale::Kelvin => celsius + 273.15,
        }
    }
}

/// Convert a temperature, pivoting through Celsius.
pub fn convert_temperature(value: f64, from: &str, to: &str) -> Result<f64> {
    let from_scale = TemperatureScale::from_alias(from)
        .ok_or_else(|| CalcError::UnknownTemperatureUnit(from.to_string()))?;
    let to_scale = TemperatureScale::from_alias(to)
        .ok_or_else(|| CalcError::UnknownTemperatureUnit(to.to_string()))?;
    Ok(to_scale.from_celsius(from_scale.to_celsius(value)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn close(a: f64, b: f64) -> bool {
        (a - b).abs() <= 1e-9 * a.abs().max(b.abs()).max(1.0)
    }

    #[test]
    fn test_inches_to_cm() {
        assert!(close(convert(20.0, "inches", "cm").unwrap(), 50.8));
    }

    #[test]
    fn test_aliases_share_canonical_unit() {
        let foot = lookup("ft").unwrap();
        assert_eq!(lookup("foot").unwrap(), foot);
        assert_eq!(lookup("feet").unwrap(), foot);
        assert_eq!(foot.name, "foot");
    }

    #[test]
    fn test_lookup_case_rules() {
        assert_eq!(lookup("KM").unwrap().name, "kilometer");
        assert_eq!(lookup("mb").unwrap().name, "megabyte");
        assert_eq!(lookup("B").unwrap().name, "byte");
        assert!(lookup("b").is_none());
        assert!(lookup("M").is_none());
        assert_eq!(lookup("L").unwrap().name, "liter");
    }

    #[test]
    fn test_category_mismatch() {
        let err = convert(10.0, "kg", "cm").unwrap_err();
        assert_eq!(
            err,
            CalcError::CategoryMismatch {
                from: Category::Weight,
                to: Category::Length
            }
        );
        assert_eq!(err.to_string(), "Cannot convert between weight and length");
    }

    #[test]
    fn test_unknown_unit_names_the_missing_side() {
        assert_eq!(
            convert(1.0, "furlong", "m").unwrap_err(),
            CalcError::UnknownUnit("furlong".into())
        );
        assert_eq!(
            convert(1.0, "m", "parsec").unwrap_err(),
            CalcError::UnknownUnit("parsec".into())
        );
    }

    #[test]
    fn test_temperature_conversion() {
        assert!(close(convert_temperature(100.0, "C", "F").unwrap(), 212.0));
        assert!(close(convert_temperature(32.0, "fahrenheit", "celsius").unwrap(), 0.0));
        assert!(close(convert_temperature(0.0, "k", "c").unwrap(), -273.15));
        assert_eq!(
            convert_temperature(1.0, "c", "rankine").unwrap_err(),
            CalcError::UnknownTemperatureUnit("rankine".into())
        );
    }

    #[test]
    fn test_units_in_category() {
        let data = units_in(Category::Data);
        assert_eq!(data.len(), 5);
        assert!(units_in(Category::Currency).is_empty());
    }

    fn same_category_pair() -> impl Strategy<Value = (&'static str, &'static str)> {
        let aliases: Vec<(Category, &'static str)> = UNITS
            .iter()
            .flat_map(|def| def.aliases.iter().map(move |a| (def.unit.category, *a)))
            .collect();
        let pairs: Vec<(&'static str, &'static str)> = aliases
            .iter()
            .flat_map(|(ca, a)| {
                aliases
                    .iter()
                    .filter(move |(cb, _)| cb == ca)
                    .map(move |(_, b)| (*a, *b))
            })
            .collect();
        proptest::sample::select(pairs)
    }

    proptest! {
        #[test]
        fn prop_convert_is_inverse_of_reverse((a, b) in same_category_pair(), v in -1.0e6f64..1.0e6) {
            let there = convert(v, a, b).unwrap();
            let back = convert(there, b, a).unwrap();
            prop_assert!(close(back, v), "{} {} -> {} -> {}", v, a, b, back);
        }

        #[test]
        fn prop_temperature_round_trip(v in -500.0f64..5000.0) {
            let f = convert_temperature(v, "C", "F").unwrap();
            let back = convert_temperature(f, "F", "C").unwrap();
            prop_assert!((back - v).abs() < 1e-9);
        }
    }
}
