// Copyright (c) The xunitnet Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Conversions between durations and the decimal seconds used in test reports.

use std::time::Duration;
use thiserror::Error;

const NANOS_PER_SEC: u128 = 1_000_000_000;

/// An error returned by [`parse_seconds`].
#[derive(Clone, Debug, Eq, PartialEq, Error)]
pub enum ParseSecondsError {
    /// The input was not a decimal number.
    #[error("`{input}` is not a decimal number of seconds")]
    Invalid {
        /// The input.
        input: String,
    },

    /// The input was a negative number.
    #[error("`{input}` is negative")]
    Negative {
        /// The input.
        input: String,
    },

    /// The input does not fit in a duration.
    #[error("`{input}` is too large to represent")]
    Overflow {
        /// The input.
        input: String,
    },
}

/// Parses a decimal number of seconds, such as `0.0123456` or `1.5E-05`, into a duration.
///
/// Parsing is exact down to nanoseconds; digits beyond that are truncated. Negative values,
/// non-finite values and localized forms (such as `0,5`) are rejected.
pub fn parse_seconds(input: &str) -> Result<Duration, ParseSecondsError> {
    let invalid = || ParseSecondsError::Invalid {
        input: input.to_owned(),
    };
    let overflow = || ParseSecondsError::Overflow {
        input: input.to_owned(),
    };

    let trimmed = input.trim();
    let unsigned = trimmed.strip_prefix('+').unwrap_or(trimmed);
    if unsigned.starts_with('-') {
        // "-0" and "-0.000" are still zero.
        let magnitude = parse_seconds(&unsigned[1..])?;
        return if magnitude.is_zero() {
            Ok(Duration::ZERO)
        } else {
            Err(ParseSecondsError::Negative {
                input: input.to_owned(),
            })
        };
    }

    let (mantissa, exponent) = match unsigned.find(['e', 'E']) {
        Some(index) => {
            let exponent: i64 = unsigned[index + 1..].parse().map_err(|_| invalid())?;
            (&unsigned[..index], exponent)
        }
        None => (unsigned, 0),
    };
    let (int_part, frac_part) = mantissa.split_once('.').unwrap_or((mantissa, ""));
    if int_part.is_empty() && frac_part.is_empty() {
        return Err(invalid());
    }

    let mut digits: u128 = 0;
    for c in int_part.chars().chain(frac_part.chars()) {
        let digit = c.to_digit(10).ok_or_else(invalid)?;
        digits = digits
            .checked_mul(10)
            .and_then(|d| d.checked_add(u128::from(digit)))
            .ok_or_else(overflow)?;
    }

    // nanos = digits * 10^scale
    let scale = i64::try_from(frac_part.len())
        .ok()
        .and_then(|frac_len| exponent.checked_add(9)?.checked_sub(frac_len));
    let nanos = match scale {
        _ if digits == 0 => 0,
        Some(scale) if scale >= 0 => {
            let factor = u32::try_from(scale)
                .ok()
                .and_then(|scale| 10u128.checked_pow(scale))
                .ok_or_else(overflow)?;
            digits.checked_mul(factor).ok_or_else(overflow)?
        }
        Some(scale) => match u32::try_from(scale.unsigned_abs())
            .ok()
            .and_then(|scale| 10u128.checked_pow(scale))
        {
            Some(divisor) => digits / divisor,
            None => 0,
        },
        // The exponent is beyond what a scale can hold.
        None if exponent < 0 => 0,
        None => return Err(overflow()),
    };

    let secs = u64::try_from(nanos / NANOS_PER_SEC).map_err(|_| overflow())?;
    Ok(Duration::new(secs, (nanos % NANOS_PER_SEC) as u32))
}

/// Formats a duration as seconds with three decimal places, rounding to the nearest millisecond.
pub fn format_seconds(time: Duration) -> String {
    let millis = (time.as_nanos() + 500_000) / 1_000_000;
    format!("{}.{:03}", millis / 1000, millis % 1000)
}
