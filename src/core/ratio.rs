// src/core/ratio.rs

use crate::core::coord::SelectionKey;

/// Simple gcd (Euclidean algorithm)
pub const fn gcd(mut a: u64, mut b: u64) -> u64 {
    while b != 0 {
        let tmp = b;
        b = a % b;
        a = tmp;
    }
    a
}

/// Overflow-checked multiply. `None` means the ratio is out of integer
/// range and the caller should skip the node rather than show garbage.
pub fn mul_or_none(a: u64, b: u64) -> Option<u64> {
    a.checked_mul(b)
}

/// Overflow-checked integer power.
pub fn pow_or_none(base: u64, exp: u32) -> Option<u64> {
    base.checked_pow(exp)
}

/// Build `(numerator, denominator)` from prime/exponent pairs. Positive
/// exponents multiply into the numerator, negative into the denominator.
pub fn fraction_from_exponents(pairs: &[(u32, i32)]) -> Option<(u64, u64)> {
    let mut num: u64 = 1;
    let mut den: u64 = 1;
    for &(prime, exp) in pairs {
        if exp == 0 {
            continue;
        }
        let mag = exp.unsigned_abs();
        let power = pow_or_none(prime as u64, mag)?;
        if exp > 0 {
            num = mul_or_none(num, power)?;
        } else {
            den = mul_or_none(den, power)?;
        }
    }
    Some((num, den))
}

/// Fold a positive fraction into `[1, 2)` by moving powers of two, then
/// reduce by gcd. This is the single shared canonicalization used by
/// labels, audio, and hit-test candidates alike.
pub fn canonicalize(mut num: u64, mut den: u64) -> Option<(u64, u64)> {
    if num == 0 || den == 0 {
        return None;
    }
    // When doubling the denominator would overflow, num < den*2 already
    // holds, so the fold is finished rather than failed.
    while let Some(d2) = den.checked_mul(2) {
        if num >= d2 {
            den = d2;
        } else {
            break;
        }
    }
    while num < den {
        num = num.checked_mul(2)?;
    }
    let g = gcd(num, den);
    Some((num / g, den / g))
}

/// Tenney height: `max(num, den)` of a canonical fraction, a complexity
/// proxy for rendering weight.
pub fn tenney_height(num: u64, den: u64) -> u64 {
    num.max(den)
}

/// Interval size of `num/den` in cents.
pub fn cents(num: u64, den: u64) -> f64 {
    1200.0 * (num as f64 / den as f64).log2()
}

/// Apply a signed octave offset to a fraction by scaling with a power of
/// two on the appropriate side.
pub fn with_octave(num: u64, den: u64, octave: i32) -> Option<(u64, u64)> {
    if octave == 0 {
        return Some((num, den));
    }
    let factor = pow_or_none(2, octave.unsigned_abs())?;
    if octave > 0 {
        Some((mul_or_none(num, factor)?, den))
    } else {
        Some((num, mul_or_none(den, factor)?))
    }
}

/// An ordered selection entry resolved to a concrete ratio, octave baked
/// in. Consumed downstream by scale building.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RatioRef {
    pub key: SelectionKey,
    pub num: u64,
    pub den: u64,
}

impl RatioRef {
    pub fn value(&self) -> f64 {
        self.num as f64 / self.den as f64
    }
}
