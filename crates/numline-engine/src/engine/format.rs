/// Format a number for display.
///
/// Magnitudes above 1e6 or below 1e-4 render in exponential form with six
/// fraction digits (`1.500000e+7`). Everything else is rounded to ten decimal
/// places to drop floating point noise, then grouped with `,`: integral values
/// without fraction digits, others with at most six.
pub fn format_number(value: f64) -> String {
    if value.is_nan() {
        return "NaN".to_string();
    }
    if value.is_infinite() {
        return if value > 0.0 { "Infinity" } else { "-Infinity" }.to_string();
    }

    let magnitude = value.abs();
    if magnitude > 1e6 || (magnitude > 0.0 && magnitude < 1e-4) {
        return format_exponential(value);
    }

    let rounded = (value * 1e10).round() / 1e10;
    let fixed = if rounded.fract() == 0.0 {
        format!("{:.0}", rounded.abs())
    } else {
        let text = format!("{:.6}", rounded.abs());
        text.trim_end_matches('0').trim_end_matches('.').to_string()
    };

    let (integral, fraction) = match fixed.split_once('.') {
        Some((i, f)) => (i, Some(f)),
        None => (fixed.as_str(), None),
    };

    let mut out = String::new();
    if rounded < 0.0 && fixed.bytes().any(|b| b != b'0' && b != b'.') {
        out.push('-');
    }
    out.push_str(&group_thousands(integral));
    if let Some(fraction) = fraction {
        out.push('.');
        out.push_str(fraction);
    }
    out
}

/// Parse text produced by [`format_number`] back into a number.
pub fn parse_formatted(text: &str) -> Option<f64> {
    let cleaned: String = text.trim().chars().filter(|c| *c != ',').collect();
    match cleaned.as_str() {
        "Infinity" => Some(f64::INFINITY),
        "-Infinity" => Some(f64::NEG_INFINITY),
        "NaN" => Some(f64::NAN),
        other => other.parse().ok(),
    }
}

fn format_exponential(value: f64) -> String {
    let text = format!("{:.6e}", value);
    match text.split_once('e') {
        Some((mantissa, exponent)) if !exponent.starts_with('-') => {
            format!("{}e+{}", mantissa, exponent)
        }
        _ => text,
    }
}

fn group_thousands(digits: &str) -> String {
    let len = digits.len();
    let mut out = String::with_capacity(len + len / 3);
    for (idx, ch) in digits.chars().enumerate() {
        if idx > 0 && (len - idx) % 3 == 0 {
            out.push(',');
        }
        out.push(ch);
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_format_integers_grouped() {
        assert_eq!(format_number(0.0), "0");
        assert_eq!(format_number(20.0), "20");
        assert_eq!(format_number(1234.0), "1,234");
        assert_eq!(format_number(-1000000.0), "-1,000,000");
        assert_eq!(format_number(999999.0), "999,999");
    }

    #[test]
    fn test_format_fractions() {
        assert_eq!(format_number(50.8), "50.8");
        assert_eq!(format_number(0.1 + 0.2), "0.3");
        assert_eq!(format_number(1234.5678912), "1,234.567891");
        assert_eq!(format_number(-0.5), "-0.5");
        assert_eq!(format_number(0.9999999), "1");
    }

    #[test]
    fn test_format_exponential() {
        assert_eq!(format_number(15_000_000.0), "1.500000e+7");
        assert_eq!(format_number(0.00005), "5.000000e-5");
        assert_eq!(format_number(-2.5e9), "-2.500000e+9");
    }

    #[test]
    fn test_format_special_values() {
        assert_eq!(format_number(f64::INFINITY), "Infinity");
        assert_eq!(format_number(f64::NEG_INFINITY), "-Infinity");
        assert_eq!(format_number(f64::NAN), "NaN");
        assert_eq!(format_number(-0.0), "0");
        assert_eq!(format_number(-0.00000000001), "-1.000000e-11");
    }

    #[test]
    fn test_parse_formatted() {
        assert_eq!(parse_formatted("1,234.5"), Some(1234.5));
        assert_eq!(parse_formatted("1.500000e+7"), Some(15_000_000.0));
        assert_eq!(parse_formatted("Error"), None);
    }

    proptest! {
        #[test]
        fn prop_format_is_idempotent_in_grouped_range(v in 1.0e-3f64..999_000.0, negative: bool) {
            let v = if negative { -v } else { v };
            let shown = format_number(v);
            let reparsed = parse_formatted(&shown).unwrap();
            prop_assert_eq!(format_number(reparsed), shown);
        }

        #[test]
        fn prop_format_is_idempotent_in_exponential_range(v in 1.01e6f64..1.0e300) {
            let shown = format_number(v);
            let reparsed = parse_formatted(&shown).unwrap();
            prop_assert_eq!(format_number(reparsed), shown);
        }
    }
}
