use digit_layout::{DigitLayout, types};
use std::fmt;

/// 目标 IR 张量的数据类型。
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug)]
#[repr(u8)]
pub enum DType {
    Unknown,
    Bool,
    Uint8,
    Int4,
    Int8,
    Int16,
    Int32,
    Int48,
    Fp32,
    Uint16,
    Fp16,
    Bf16,
}

impl DType {
    /// 元素的存储布局。没有字节对齐存储形式的类型返回 `None`。
    pub fn layout(self) -> Option<DigitLayout> {
        match self {
            Self::Bool | Self::Uint8 => Some(types::U8),
            Self::Int8 => Some(types::I8),
            Self::Int16 => Some(types::I16),
            Self::Uint16 => Some(types::U16),
            Self::Int32 => Some(types::I32),
            Self::Fp16 => Some(types::F16),
            Self::Bf16 => Some(types::BF16),
            Self::Fp32 => Some(types::F32),
            Self::Unknown | Self::Int4 | Self::Int48 => None,
        }
    }

    #[inline]
    pub fn nbytes(self) -> Option<usize> {
        self.layout().map(|dt| dt.nbytes())
    }

    #[inline]
    pub const fn is_float(self) -> bool {
        matches!(self, Self::Fp16 | Self::Bf16 | Self::Fp32)
    }

    /// 整型的取值范围，用于饱和量化边界。
    pub const fn int_range(self) -> Option<(i64, i64)> {
        match self {
            Self::Bool => Some((0, 1)),
            Self::Uint8 => Some((u8::MIN as _, u8::MAX as _)),
            Self::Int4 => Some((-8, 7)),
            Self::Int8 => Some((i8::MIN as _, i8::MAX as _)),
            Self::Int16 => Some((i16::MIN as _, i16::MAX as _)),
            Self::Uint16 => Some((u16::MIN as _, u16::MAX as _)),
            Self::Int32 => Some((i32::MIN as _, i32::MAX as _)),
            Self::Int48 => Some((-(1 << 47), (1 << 47) - 1)),
            Self::Unknown | Self::Fp16 | Self::Bf16 | Self::Fp32 => None,
        }
    }

    pub const fn name(self) -> &'static str {
        match self {
            Self::Unknown => "DType_UNKNOWN",
            Self::Bool => "DType_BOOL",
            Self::Uint8 => "DType_UINT8",
            Self::Int4 => "DType_INT4",
            Self::Int8 => "DType_INT8",
            Self::Int16 => "DType_INT16",
            Self::Int32 => "DType_INT32",
            Self::Int48 => "DType_INT48",
            Self::Fp32 => "DType_FP32",
            Self::Uint16 => "DType_UINT16",
            Self::Fp16 => "DType_FP16",
            Self::Bf16 => "DType_BF16",
        }
    }
}

impl fmt::Display for DType {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(self.name())
    }
}
