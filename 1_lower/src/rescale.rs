//! 浮点缩放因子到定点 `(multiplier, shift)` 的编码，以及 RESCALE 算子的构造。
//!
//! 编码满足 `value * scale ≈ (value * multiplier) >> shift`，
//! 其中 `multiplier` 是 `B + 1` 位有符号整数，`B` 为 31 或 15。

use crate::LowerError;
use ir::{Op, Operator, RescaleAttribute};

/// 定点缩放参数。`shift` 可以为负或超过尾数位宽，32 位编码的 `shift` 不超过 47。
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub struct FixedPoint {
    pub multiplier: i32,
    pub shift: i32,
}

const MAX_SHIFT32: i32 = 47;

/// 32 位累加器的编码，尾数占 31 位。
///
/// `shift` 超过 47 时，把尾数按绝对值右移多出的位数，`shift` 截为 47。
pub fn encode_scale32(scale: f64) -> Result<FixedPoint, LowerError> {
    let FixedPoint { multiplier, shift } = encode(scale, 31)?;
    if shift <= MAX_SHIFT32 {
        return Ok(FixedPoint { multiplier, shift });
    }
    let magnitude = multiplier
        .unsigned_abs()
        .checked_shr((shift - MAX_SHIFT32) as u32)
        .unwrap_or(0);
    Ok(FixedPoint {
        multiplier: multiplier.signum() * magnitude as i32,
        shift: MAX_SHIFT32,
    })
}

/// 16 位累加器的编码，尾数占 15 位。
#[inline]
pub fn encode_scale16(scale: f64) -> Result<FixedPoint, LowerError> {
    encode(scale, 15)
}

/// [`encode_scale32`] 与 [`encode_scale16`] 的逆运算。
pub fn decode_scale(FixedPoint { multiplier, shift }: FixedPoint) -> f64 {
    multiplier as f64 * (-shift as f64).exp2()
}

fn encode(scale: f64, bits: u32) -> Result<FixedPoint, LowerError> {
    let limit = (1i64 << bits) as f64;
    let (mantissa, exp) = frexp(scale);
    let shifted = (mantissa * limit).round();
    if !(-limit..limit).contains(&shifted) {
        return Err(LowerError::MantissaOverflow(bits + 1));
    }
    Ok(FixedPoint {
        multiplier: shifted as i32,
        shift: bits as i32 - exp,
    })
}

/// 把 `x` 分解为 `m * 2^e`，`0.5 <= |m| < 1`。0 和非有限值原样返回，指数为 0。
fn frexp(x: f64) -> (f64, i32) {
    const EXP_MASK: u64 = 0x7ff << 52;
    // 2^54
    const SUBNORMAL_SCALE: f64 = f64::from_bits(0x4350_0000_0000_0000);

    if x == 0. || !x.is_finite() {
        return (x, 0);
    }
    let bits = x.to_bits();
    match ((bits & EXP_MASK) >> 52) as i32 {
        0 => {
            let (m, e) = frexp(x * SUBNORMAL_SCALE);
            (m, e - 54)
        }
        exp => (f64::from_bits((bits & !EXP_MASK) | (1022 << 52)), exp - 1022),
    }
}

/// RESCALE 的取整与符号选项。
#[derive(Clone, Copy, PartialEq, Eq, Default, Debug)]
pub struct RescaleFlags {
    pub input_unsigned: bool,
    pub output_unsigned: bool,
    pub double_round: bool,
    pub scale32: bool,
}

impl RescaleFlags {
    /// 有符号输入输出、单次取整、32 位尾数。
    pub const SCALE32: Self = Self {
        input_unsigned: false,
        output_unsigned: false,
        double_round: false,
        scale32: true,
    };

    pub const fn double_round(self, double_round: bool) -> Self {
        Self {
            double_round,
            ..self
        }
    }
}

/// 用显式的 multiplier 与 shift 构造 RESCALE。
///
/// 依次检查：multipliers 非空；两者等长；逐通道时多于一个；逐张量时恰好一个。
#[allow(clippy::too_many_arguments)]
pub fn create_raw_rescale(
    input: impl Into<String>,
    output: impl Into<String>,
    multiplier: Vec<i32>,
    shift: Vec<i32>,
    input_zp: i32,
    output_zp: i32,
    flags: RescaleFlags,
    per_channel: bool,
) -> Result<Operator, LowerError> {
    if multiplier.is_empty() {
        return Err(LowerError::EmptyMultipliers);
    }
    if multiplier.len() != shift.len() {
        return Err(LowerError::MultiplierShiftMismatch);
    }
    match (per_channel, multiplier.len()) {
        (true, 1) => return Err(LowerError::PerChannelSingle),
        (false, n) if n != 1 => return Err(LowerError::PerTensorMultiple),
        _ => {}
    }

    let RescaleFlags {
        input_unsigned,
        output_unsigned,
        double_round,
        scale32,
    } = flags;
    Ok(Operator::new(
        Op::Rescale,
        RescaleAttribute {
            input_zp,
            output_zp,
            multiplier,
            shift,
            scale32,
            double_round,
            per_channel,
            input_unsigned,
            output_unsigned,
        },
        [input.into()],
        [output.into()],
    ))
}

/// 按 `flags.scale32` 选择编码位宽，构造逐张量的 RESCALE。
pub fn create_rescale(
    input: impl Into<String>,
    output: impl Into<String>,
    scale: f64,
    input_zp: i32,
    output_zp: i32,
    flags: RescaleFlags,
) -> Result<Operator, LowerError> {
    let FixedPoint { multiplier, shift } = if flags.scale32 {
        encode_scale32(scale)?
    } else {
        encode_scale16(scale)?
    };
    create_raw_rescale(
        input,
        output,
        vec![multiplier],
        vec![shift],
        input_zp,
        output_zp,
        flags,
        false,
    )
}
