use crate::{DType, Op};

/// 算子属性，每个算子族一个变体。
#[derive(Clone, PartialEq, Default, Debug)]
pub enum Attribute {
    #[default]
    None,
    Axis(AxisAttribute),
    Conv(ConvAttribute),
    TransposeConv(TransposeConvAttribute),
    Pool(PoolAttribute),
    Pad(PadAttribute),
    Reshape(ReshapeAttribute),
    Slice(SliceAttribute),
    Transpose(TransposeAttribute),
    Mul(MulAttribute),
    Clamp(ClampAttribute),
    Rescale(RescaleAttribute),
    Table(TableAttribute),
    ArithmeticRightShift(ArithmeticRightShiftAttribute),
}

#[derive(Clone, PartialEq, Eq, Debug)]
pub struct AxisAttribute {
    pub axis: i32,
}

/// `pad` 为 `[top, bottom, left, right]`，`stride` 与 `dilation` 为 `[y, x]`。
#[derive(Clone, PartialEq, Eq, Debug)]
pub struct ConvAttribute {
    pub pad: Vec<i32>,
    pub stride: Vec<i32>,
    pub dilation: Vec<i32>,
    pub input_zp: i32,
    pub weight_zp: i32,
}

#[derive(Clone, PartialEq, Eq, Debug)]
pub struct TransposeConvAttribute {
    pub out_pad: Vec<i32>,
    pub stride: Vec<i32>,
    pub output_shape: Vec<i32>,
    pub input_zp: i32,
    pub weight_zp: i32,
}

#[derive(Clone, PartialEq, Eq, Debug)]
pub struct PoolAttribute {
    pub pad: Vec<i32>,
    pub kernel: Vec<i32>,
    pub stride: Vec<i32>,
    pub input_zp: i32,
    pub output_zp: i32,
    pub accum_dtype: DType,
}

/// `padding` 按维度展平为 `[before, after]` 对。
#[derive(Clone, PartialEq, Debug)]
pub struct PadAttribute {
    pub padding: Vec<i32>,
    pub pad_const_int: i32,
    pub pad_const_fp: f32,
}

#[derive(Clone, PartialEq, Eq, Debug)]
pub struct ReshapeAttribute {
    pub new_shape: Vec<i32>,
}

#[derive(Clone, PartialEq, Eq, Debug)]
pub struct SliceAttribute {
    pub start: Vec<i32>,
    pub size: Vec<i32>,
}

#[derive(Clone, PartialEq, Eq, Debug)]
pub struct TransposeAttribute {
    pub perms: Vec<i32>,
}

#[derive(Clone, PartialEq, Eq, Debug)]
pub struct MulAttribute {
    pub shift: i32,
}

#[derive(Clone, PartialEq, Debug)]
pub struct ClampAttribute {
    pub min_int: i32,
    pub max_int: i32,
    pub min_fp: f32,
    pub max_fp: f32,
}

/// 定点重缩放：`(value - input_zp) * multiplier >> shift + output_zp`。
#[derive(Clone, PartialEq, Eq, Debug)]
pub struct RescaleAttribute {
    pub input_zp: i32,
    pub output_zp: i32,
    pub multiplier: Vec<i32>,
    pub shift: Vec<i32>,
    pub scale32: bool,
    pub double_round: bool,
    pub per_channel: bool,
    pub input_unsigned: bool,
    pub output_unsigned: bool,
}

#[derive(Clone, PartialEq, Eq, Debug)]
pub struct TableAttribute {
    pub table: Vec<i16>,
}

#[derive(Clone, PartialEq, Eq, Debug)]
pub struct ArithmeticRightShiftAttribute {
    pub round: bool,
}

impl Attribute {
    /// 判断属性变体是否是 `op` 所要求的。
    pub fn fits(&self, op: Op) -> bool {
        use Op::*;
        match self {
            Self::None => matches!(
                op,
                Unknown
                    | Add
                    | Sub
                    | Maximum
                    | Minimum
                    | Const
                    | Cast
                    | LogicalLeftShift
                    | Clz
                    | GreaterEqual
                    | Select
                    | Gather
            ),
            Self::Axis(_) => matches!(op, Concat | ReduceMax | ReduceSum),
            Self::Conv(_) => op == Conv2d,
            Self::TransposeConv(_) => op == TransposeConv2d,
            Self::Pool(_) => matches!(op, AvgPool2d | MaxPool2d),
            Self::Pad(_) => op == Pad,
            Self::Reshape(_) => op == Reshape,
            Self::Slice(_) => op == Slice,
            Self::Transpose(_) => op == Transpose,
            Self::Mul(_) => op == Mul,
            Self::Clamp(_) => op == Clamp,
            Self::Rescale(_) => op == Rescale,
            Self::Table(_) => op == Table,
            Self::ArithmeticRightShift(_) => op == ArithmeticRightShift,
        }
    }
}

impl From<()> for Attribute {
    fn from((): ()) -> Self {
        Self::None
    }
}

macro_rules! impl_from {
    ($( $ty:ty => $variant:ident )+) => {
        $(
            impl From<$ty> for Attribute {
                fn from(value: $ty) -> Self {
                    Self::$variant(value)
                }
            }
        )+
    };
}

impl_from! {
    AxisAttribute                 => Axis
    ConvAttribute                 => Conv
    TransposeConvAttribute        => TransposeConv
    PoolAttribute                 => Pool
    PadAttribute                  => Pad
    ReshapeAttribute              => Reshape
    SliceAttribute                => Slice
    TransposeAttribute            => Transpose
    MulAttribute                  => Mul
    ClampAttribute                => Clamp
    RescaleAttribute              => Rescale
    TableAttribute                => Table
    ArithmeticRightShiftAttribute => ArithmeticRightShift
}

#[cfg(test)]
mod test {
    use super::{Attribute, AxisAttribute, TransposeAttribute};
    use crate::Op;

    #[test]
    fn test_fits() {
        for op in [Op::GreaterEqual, Op::Select, Op::Gather, Op::Add] {
            assert!(Attribute::None.fits(op), "{op}")
        }
        assert!(!Attribute::None.fits(Op::Transpose));
        assert!(!Attribute::from(AxisAttribute { axis: 0 }).fits(Op::Gather));
        assert!(Attribute::from(TransposeAttribute { perms: vec![1, 0] }).fits(Op::Transpose));
    }
}
