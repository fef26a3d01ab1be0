// SPDX-FileCopyrightText: 2025 Joost van der Laan <joost@fashionunited.com>
//
// SPDX-License-Identifier: AGPL-3.0-only

use std::collections::HashMap;

/// Convert `amount` from one currency to another through `base`.
///
/// Rates are base-relative: `rate(code)` is 1.0 for the base itself and
/// `rates[code]` otherwise. The only path is the two-hop through the base;
/// no direct cross-rate lookup is attempted. Returns `None` when the amount
/// is not finite or a needed rate is missing or non-finite.
pub fn convert(
    amount: f64,
    from: &str,
    to: &str,
    rates: &HashMap<String, f64>,
    base: &str,
) -> Option<f64> {
    if !amount.is_finite() {
        return None;
    }

    // Identity conversion needs no rate, even for unknown codes.
    if from == to {
        return Some(amount);
    }

    let rate = |code: &str| -> Option<f64> {
        if code == base {
            Some(1.0)
        } else {
            rates.get(code).copied().filter(|r| r.is_finite())
        }
    };

    let amount_in_base = if from == base {
        amount
    } else {
        amount / rate(from)?
    };

    if to == base {
        Some(amount_in_base)
    } else {
        Some(amount_in_base * rate(to)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn usd_rates() -> HashMap<String, f64> {
        HashMap::from([
            ("EUR".to_string(), 0.9),
            ("GBP".to_string(), 0.8),
            ("JPY".to_string(), 150.0),
        ])
    }

    #[test]
    fn test_base_to_quote() {
        let result = convert(10.0, "USD", "EUR", &usd_rates(), "USD").unwrap();
        assert_relative_eq!(result, 9.0, epsilon = 1e-9);
    }

    #[test]
    fn test_quote_to_base() {
        let result = convert(9.0, "EUR", "USD", &usd_rates(), "USD").unwrap();
        assert_relative_eq!(result, 10.0, epsilon = 1e-9);
    }

    #[test]
    fn test_cross_rate_goes_through_base() {
        // EUR -> USD -> JPY
        let result = convert(9.0, "EUR", "JPY", &usd_rates(), "USD").unwrap();
        assert_relative_eq!(result, 1500.0, epsilon = 1e-9);
    }

    #[test]
    fn test_same_currency_is_identity_even_when_unknown() {
        let result = convert(42.5, "ZZZ", "ZZZ", &usd_rates(), "USD").unwrap();
        assert_relative_eq!(result, 42.5, epsilon = 1e-12);
    }

    #[test]
    fn test_round_trip_within_tolerance() {
        let rates = usd_rates();
        let there = convert(123.45, "USD", "EUR", &rates, "USD").unwrap();
        let back = convert(there, "EUR", "USD", &rates, "USD").unwrap();
        assert_relative_eq!(back, 123.45, epsilon = 1e-9);
    }

    #[test]
    fn test_missing_rate_is_unconvertible() {
        let rates = HashMap::from([("EUR".to_string(), 0.9)]);
        assert_eq!(convert(100.0, "USD", "ZZZ", &rates, "USD"), None);
        assert_eq!(convert(100.0, "ZZZ", "EUR", &rates, "USD"), None);
    }

    #[test]
    fn test_non_finite_inputs_are_unconvertible() {
        let mut rates = usd_rates();
        assert_eq!(convert(f64::NAN, "USD", "EUR", &rates, "USD"), None);
        assert_eq!(convert(f64::INFINITY, "USD", "EUR", &rates, "USD"), None);

        rates.insert("BAD".to_string(), f64::NAN);
        assert_eq!(convert(1.0, "USD", "BAD", &rates, "USD"), None);
    }

    #[test]
    fn test_base_without_rate_entry() {
        // The base never needs its own rates entry.
        let rates = HashMap::from([("EUR".to_string(), 0.9)]);
        let result = convert(5.0, "USD", "EUR", &rates, "USD").unwrap();
        assert_relative_eq!(result, 4.5, epsilon = 1e-9);
    }
}
