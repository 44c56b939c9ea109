//! Reconstruction of numeric constants from their raw big-endian bit patterns.
//!
//! https://docs.oracle.com/javase/specs/jvms/se19/html/jvms-4.html#jvms-4.4.4
//! https://docs.oracle.com/javase/specs/jvms/se19/html/jvms-4.html#jvms-4.4.5

const F64_EXPONENT_BIAS: i32 = 1023;
const F64_MIN_EXPONENT: i32 = -1022;

/// Joins the high and low words of a CONSTANT_Long_info or CONSTANT_Double_info.
pub fn join_halves(high_bytes: u32, low_bytes: u32) -> u64 {
    ((high_bytes as u64) << 32) | low_bytes as u64
}

pub fn long_from_halves(high_bytes: u32, low_bytes: u32) -> i64 {
    join_halves(high_bytes, low_bytes) as i64
}

pub fn float_from_bits(bits: u32) -> f32 {
    match bits {
        // If bits is 0x7f800000, the float value will be positive infinity.
        0x7f80_0000 => f32::INFINITY,
        // If bits is 0xff800000, the float value will be negative infinity.
        0xff80_0000 => f32::NEG_INFINITY,
        // If bits is in the range 0x7f800001 through 0x7fffffff or in the range 0xff800001
        // through 0xffffffff, the float value will be NaN.
        0x7f80_0001..=0x7fff_ffff | 0xff80_0001..=0xffff_ffff => f32::NAN,
        _ => {
            let s = if (bits >> 31) == 0 { 1. } else { -1. };
            let e = ((bits >> 23) & 0xff) as i32;
            let m = if e == 0 {
                (bits & 0x7f_ffff) << 1
            } else {
                (bits & 0x7f_ffff) | 0x80_0000
            };

            // Every finite f32 is exact in f64, so the product is never rounded.
            (s * m as f64 * pow2(e - 150)) as f32
        }
    }
}

pub fn double_from_bits(bits: u64) -> f64 {
    match bits {
        0x7ff0_0000_0000_0000 => f64::INFINITY,
        0xfff0_0000_0000_0000 => f64::NEG_INFINITY,
        0x7ff0_0000_0000_0001..=0x7fff_ffff_ffff_ffff
        | 0xfff0_0000_0000_0001..=0xffff_ffff_ffff_ffff => f64::NAN,
        _ => {
            let s = if (bits >> 63) == 0 { 1. } else { -1. };
            let e = ((bits >> 52) & 0x7ff) as i32;
            let m = if e == 0 {
                (bits & 0xf_ffff_ffff_ffff) << 1
            } else {
                (bits & 0xf_ffff_ffff_ffff) | 0x10_0000_0000_0000
            };

            s * scale(m as f64, e - 1075)
        }
    }
}

/// `value * 2^exp`, split in two steps when `2^exp` itself is below the normal range.
fn scale(value: f64, exp: i32) -> f64 {
    if exp < F64_MIN_EXPONENT {
        value * pow2(F64_MIN_EXPONENT) * pow2(exp - F64_MIN_EXPONENT)
    } else {
        value * pow2(exp)
    }
}

/// Exact power of two for exponents in the normal f64 range.
fn pow2(exp: i32) -> f64 {
    debug_assert!((F64_MIN_EXPONENT..=F64_EXPONENT_BIAS).contains(&exp));
    f64::from_bits(((exp + F64_EXPONENT_BIAS) as u64) << 52)
}
