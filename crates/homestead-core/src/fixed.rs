use fixed::types::I32F32;

/// Q32.32 fixed-point: 32 integer bits, 32 fractional bits.
pub type Fixed64 = I32F32;

const MILLIS_PER_MINUTE: i128 = 60_000;

/// Convert an f64 to Fixed64. Use only for initialization, never in sim loop.
#[inline]
pub fn f64_to_fixed64(v: f64) -> Fixed64 {
    Fixed64::from_num(v)
}

/// Convert Fixed64 to f64. Use only for display, never in sim loop.
#[inline]
pub fn fixed64_to_f64(v: Fixed64) -> f64 {
    v.to_num::<f64>()
}

/// `numerator / denominator` as a Fixed64, computed on the raw bits so the
/// result is exact up to the last fractional bit. Saturates at the type's
/// bounds. A zero denominator yields `Fixed64::MAX`.
pub fn ratio(numerator: u64, denominator: u64) -> Fixed64 {
    if denominator == 0 {
        return Fixed64::MAX;
    }
    let bits = ((numerator as i128) << 32) / denominator as i128;
    Fixed64::from_bits(bits.min(i64::MAX as i128) as i64)
}

/// Elapsed milliseconds expressed in minutes.
#[inline]
pub fn minutes_from_millis(ms: u64) -> Fixed64 {
    ratio(ms, MILLIS_PER_MINUTE as u64)
}
