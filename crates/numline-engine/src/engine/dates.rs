//! Date arithmetic and the timezone shape.
//!
//! Both produce an instant as epoch milliseconds.

use chrono::{DateTime, Months, TimeDelta, Utc};

use super::token::{Op, Token};
use crate::error::{CalcError, Result};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Span {
    Days,
    Weeks,
    Months,
    Years,
}

impl Span {
    fn from_word(word: &str) -> Option<Self> {
        match word.to_lowercase().as_str() {
            "day" | "days" => Some(Span::Days),
            "week" | "weeks" => Some(Span::Weeks),
            "month" | "months" => Some(Span::Months),
            "year" | "years" => Some(Span::Years),
            _ => None,
        }
    }
}

fn is_now(token: &Token) -> bool {
    token.is_word("today") || token.is_word("now")
}

/// `today`, `now`, or `today|now (+|-) N day|week|month|year[s]`.
///
/// Returns `Ok(None)` when the tokens are not a date expression.
pub(crate) fn date_arithmetic(tokens: &[Token], now: DateTime<Utc>) -> Result<Option<f64>> {
    match tokens {
        [only] if is_now(only) => Ok(Some(now.timestamp_millis() as f64)),
        [anchor, Token::Op(op @ (Op::Add | Op::Sub)), Token::Number(amount), Token::Ident(unit)]
            if is_now(anchor) =>
        {
            let Some(span) = Span::from_word(unit) else {
                return Ok(None);
            };
            if amount.fract() != 0.0 || *amount < 0.0 || *amount > u32::MAX as f64 {
                return Ok(None);
            }
            let shifted = shift(now, *op == Op::Add, *amount as u32, span)
                .ok_or(CalcError::DateOutOfRange)?;
            Ok(Some(shifted.timestamp_millis() as f64))
        }
        _ => Ok(None),
    }
}

fn shift(now: DateTime<Utc>, forward: bool, amount: u32, span: Span) -> Option<DateTime<Utc>> {
    match span {
        Span::Days | Span::Weeks => {
            let days = if span == Span::Weeks {
                i64::from(amount) * 7
            } else {
                i64::from(amount)
            };
            let delta = TimeDelta::try_days(days)?;
            if forward {
                now.checked_add_signed(delta)
            } else {
                now.checked_sub_signed(delta)
            }
        }
        Span::Months | Span::Years => {
            let months = if span == Span::Years {
                amount.checked_mul(12)?
            } else {
                amount
            };
            if forward {
                now.checked_add_months(Months::new(months))
            } else {
                now.checked_sub_months(Months::new(months))
            }
        }
    }
}

/// `H:MM [am|pm] ZONE in ZONE` anywhere in the line.
///
/// Zone offsets are not applied: a match evaluates to the current instant.
pub(crate) fn timezone_placeholder(tokens: &[Token], now: DateTime<Utc>) -> Option<f64> {
    let found = (0..tokens.len()).find_map(|start| match_time_in_zone(&tokens[start..]))?;
    tracing::debug!(
        from = %found.0,
        to = %found.1,
        "timezone conversion is not supported, returning current time"
    );
    Some(now.timestamp_millis() as f64)
}

fn match_time_in_zone(tokens: &[Token]) -> Option<(String, String)> {
    let [Token::Number(hour), Token::Colon, Token::Number(minute), rest @ ..] = tokens else {
        return None;
    };
    if !is_whole_in(*hour, 0.0, 99.0) || !is_whole_in(*minute, 0.0, 59.0) {
        return None;
    }

    let zones = |rest: &[Token]| match rest {
        [Token::Ident(from), keyword, Token::Ident(to), ..] if keyword.is_word("in") => {
            Some((from.clone(), to.clone()))
        }
        _ => None,
    };

    match rest {
        [meridiem, tail @ ..] if meridiem.is_word("am") || meridiem.is_word("pm") => {
            zones(tail).or_else(|| zones(rest))
        }
        _ => zones(rest),
    }
}

fn is_whole_in(value: f64, min: f64, max: f64) -> bool {
    value.fract() == 0.0 && value >= min && value <= max
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::token::tokenize;
    use chrono::TimeZone;

    fn fixed_now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 1, 31, 12, 0, 0).unwrap()
    }

    fn date(input: &str) -> Option<f64> {
        date_arithmetic(&tokenize(input), fixed_now()).unwrap()
    }

    #[test]
    fn test_today_and_now() {
        let expected = fixed_now().timestamp_millis() as f64;
        assert_eq!(date("today"), Some(expected));
        assert_eq!(date("NOW"), Some(expected));
    }

    #[test]
    fn test_days_and_weeks() {
        let base = fixed_now().timestamp_millis() as f64;
        assert_eq!(date("today + 2 days"), Some(base + 2.0 * 86_400_000.0));
        assert_eq!(date("now - 1 week"), Some(base - 7.0 * 86_400_000.0));
    }

    #[test]
    fn test_calendar_months_clamp_to_month_end() {
        let expected = Utc.with_ymd_and_hms(2024, 2, 29, 12, 0, 0).unwrap();
        assert_eq!(date("today + 1 month"), Some(expected.timestamp_millis() as f64));
        let expected = Utc.with_ymd_and_hms(2023, 1, 31, 12, 0, 0).unwrap();
        assert_eq!(date("today - 1 year"), Some(expected.timestamp_millis() as f64));
    }

    #[test]
    fn test_non_date_shapes_pass_through() {
        assert_eq!(date("today + 2"), None);
        assert_eq!(date("today + 2 apples"), None);
        assert_eq!(date("today + 1.5 days"), None);
        assert_eq!(date("2 + 2"), None);
    }

    #[test]
    fn test_timezone_shape() {
        let now = fixed_now();
        let expected = Some(now.timestamp_millis() as f64);
        assert_eq!(timezone_placeholder(&tokenize("2:30 pm HKT in Berlin"), now), expected);
        assert_eq!(timezone_placeholder(&tokenize("14:05 UTC in PST"), now), expected);
        assert_eq!(timezone_placeholder(&tokenize("2:30 pm in UTC"), now), expected);
        assert_eq!(timezone_placeholder(&tokenize("2:75 UTC in PST"), now), None);
        assert_eq!(timezone_placeholder(&tokenize("20 inches in cm"), now), None);
    }
}
