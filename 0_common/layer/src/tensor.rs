use digit_layout::{DigitLayout, types};

/// 计算图层张量的元素类型，区分量化语义。
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug)]
pub enum DataType {
    Float16,
    BFloat16,
    Float32,
    QAsymmU8,
    QAsymmS8,
    QSymmS8,
    QSymmS16,
    Signed32,
    Signed64,
    Boolean,
}

impl DataType {
    /// 元素的存储布局。布尔按一个字节存储。
    pub fn layout(self) -> DigitLayout {
        match self {
            Self::Float16 => types::F16,
            Self::BFloat16 => types::BF16,
            Self::Float32 => types::F32,
            Self::QAsymmU8 | Self::Boolean => types::U8,
            Self::QAsymmS8 | Self::QSymmS8 => types::I8,
            Self::QSymmS16 => types::I16,
            Self::Signed32 => types::I32,
            Self::Signed64 => types::I64,
        }
    }

    #[inline]
    pub fn nbytes(self) -> usize {
        self.layout().nbytes()
    }

    #[inline]
    pub const fn is_float(self) -> bool {
        matches!(self, Self::Float16 | Self::BFloat16 | Self::Float32)
    }

    #[inline]
    pub const fn is_quantized_8bit(self) -> bool {
        matches!(self, Self::QAsymmU8 | Self::QAsymmS8 | Self::QSymmS8)
    }

    #[inline]
    pub const fn is_quantized(self) -> bool {
        self.is_quantized_8bit() || matches!(self, Self::QSymmS16)
    }
}

/// 量化参数。`scales` 多于一个时为逐通道量化，`axis` 指明通道维。
#[derive(Clone, PartialEq, Debug)]
pub struct Quantization {
    pub scales: Vec<f32>,
    pub offset: i32,
    pub axis: Option<u32>,
}

/// 计算图提供的张量描述，构造后不可变。
#[derive(Clone, PartialEq, Debug)]
pub struct TensorDescriptor {
    pub shape: Box<[u32]>,
    pub dt: DataType,
    pub quant: Option<Quantization>,
    pub constant: bool,
    pub data: Option<Box<[u8]>>,
}

impl TensorDescriptor {
    pub fn new(dt: DataType, shape: impl IntoIterator<Item = u32>) -> Self {
        Self {
            shape: shape.into_iter().collect(),
            dt,
            quant: None,
            constant: false,
            data: None,
        }
    }

    pub fn with_quant(self, scale: f32, offset: i32) -> Self {
        Self {
            quant: Some(Quantization {
                scales: vec![scale],
                offset,
                axis: None,
            }),
            ..self
        }
    }

    pub fn with_per_channel_quant(self, scales: Vec<f32>, axis: u32) -> Self {
        Self {
            quant: Some(Quantization {
                scales,
                offset: 0,
                axis: Some(axis),
            }),
            ..self
        }
    }

    /// 标记为常量，不携带数据，用于只做校验的场合。
    pub fn as_constant(self) -> Self {
        Self {
            constant: true,
            ..self
        }
    }

    /// 标记为常量并携带数据。
    pub fn with_data(self, data: impl Into<Box<[u8]>>) -> Self {
        Self {
            constant: true,
            data: Some(data.into()),
            ..self
        }
    }

    #[inline]
    pub fn shape(&self) -> &[u32] {
        &self.shape
    }

    #[inline]
    pub fn rank(&self) -> usize {
        self.shape.len()
    }

    pub fn num_elements(&self) -> usize {
        self.shape.iter().map(|&d| d as usize).product()
    }

    /// 逐张量量化尺度。未量化或逐通道量化时为 `None`。
    pub fn scale(&self) -> Option<f32> {
        match self.quant.as_ref()?.scales[..] {
            [scale] => Some(scale),
            _ => None,
        }
    }

    #[inline]
    pub fn is_per_channel(&self) -> bool {
        self.quant.as_ref().is_some_and(|q| q.scales.len() > 1)
    }

    /// 量化零点，未量化时为 0。
    pub fn offset(&self) -> i32 {
        self.quant.as_ref().map_or(0, |q| q.offset)
    }
}
