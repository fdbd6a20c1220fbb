/// 张量在内存中的维度排列。
#[derive(Clone, Copy, PartialEq, Eq, Default, Debug)]
pub enum DataLayout {
    Nchw,
    #[default]
    Nhwc,
}

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum BinaryOperation {
    Add,
    Sub,
    Mul,
    Maximum,
    Minimum,
}

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum ActivationFunction {
    ReLu,
    /// 上界为 `a`，下界为 `b`
    BoundedReLu,
    /// 负半轴斜率为 `a`
    LeakyReLu,
    Sigmoid,
    TanH,
}

#[derive(Clone, PartialEq, Debug)]
pub struct ActivationDescriptor {
    pub function: ActivationFunction,
    pub a: f32,
    pub b: f32,
}

#[derive(Clone, PartialEq, Eq, Debug)]
pub struct Convolution2dDescriptor {
    pub pad_left: u32,
    pub pad_right: u32,
    pub pad_top: u32,
    pub pad_bottom: u32,
    pub stride_x: u32,
    pub stride_y: u32,
    pub dilation_x: u32,
    pub dilation_y: u32,
    pub bias_enabled: bool,
    pub data_layout: DataLayout,
}

#[derive(Clone, PartialEq, Eq, Debug)]
pub struct TransposeConvolution2dDescriptor {
    pub pad_left: u32,
    pub pad_right: u32,
    pub pad_top: u32,
    pub pad_bottom: u32,
    pub stride_x: u32,
    pub stride_y: u32,
    pub bias_enabled: bool,
    pub data_layout: DataLayout,
    /// 显式给出的输出形状，为空时由输出张量推出
    pub output_shape: Vec<u32>,
}

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum PoolingAlgorithm {
    Max,
    Average,
    L2,
}

/// 边界窗口中填充元素的处理方式。
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum PaddingMethod {
    /// 填充元素参与平均
    IgnoreValue,
    /// 填充元素不参与平均
    Exclude,
}

#[derive(Clone, PartialEq, Eq, Debug)]
pub struct Pooling2dDescriptor {
    pub pool_type: PoolingAlgorithm,
    pub pad_left: u32,
    pub pad_right: u32,
    pub pad_top: u32,
    pub pad_bottom: u32,
    pub pool_width: u32,
    pub pool_height: u32,
    pub stride_x: u32,
    pub stride_y: u32,
    pub padding_method: PaddingMethod,
    pub data_layout: DataLayout,
}

impl Pooling2dDescriptor {
    #[inline]
    pub fn has_padding(&self) -> bool {
        self.pad_left + self.pad_right + self.pad_top + self.pad_bottom > 0
    }
}

#[derive(Clone, PartialEq, Eq, Debug)]
pub struct ReshapeDescriptor {
    pub target_shape: Vec<u32>,
}

#[derive(Clone, PartialEq, Eq, Debug)]
pub struct SliceDescriptor {
    pub begin: Vec<u32>,
    pub size: Vec<u32>,
}

#[derive(Clone, PartialEq, Eq, Debug)]
pub struct TransposeDescriptor {
    pub permutation: Vec<u32>,
}

#[derive(Clone, PartialEq, Debug)]
pub struct SoftmaxDescriptor {
    pub beta: f32,
    /// 只支持最后一维，`-1` 表示最后一维
    pub axis: i32,
}

impl Default for Convolution2dDescriptor {
    fn default() -> Self {
        Self {
            pad_left: 0,
            pad_right: 0,
            pad_top: 0,
            pad_bottom: 0,
            stride_x: 1,
            stride_y: 1,
            dilation_x: 1,
            dilation_y: 1,
            bias_enabled: false,
            data_layout: DataLayout::Nhwc,
        }
    }
}

impl Default for TransposeConvolution2dDescriptor {
    fn default() -> Self {
        Self {
            pad_left: 0,
            pad_right: 0,
            pad_top: 0,
            pad_bottom: 0,
            stride_x: 1,
            stride_y: 1,
            bias_enabled: false,
            data_layout: DataLayout::Nhwc,
            output_shape: Vec::new(),
        }
    }
}

impl Default for Pooling2dDescriptor {
    fn default() -> Self {
        Self {
            pool_type: PoolingAlgorithm::Max,
            pad_left: 0,
            pad_right: 0,
            pad_top: 0,
            pad_bottom: 0,
            pool_width: 1,
            pool_height: 1,
            stride_x: 1,
            stride_y: 1,
            padding_method: PaddingMethod::Exclude,
            data_layout: DataLayout::Nhwc,
        }
    }
}

impl Default for SoftmaxDescriptor {
    fn default() -> Self {
        Self {
            beta: 1.,
            axis: -1,
        }
    }
}

/// 计算图层的种类及其参数。
#[derive(Clone, PartialEq, Debug)]
pub enum LayerDescriptor {
    Input,
    Output,
    Constant,
    ElementwiseBinary(BinaryOperation),
    Activation(ActivationDescriptor),
    Convolution2d(Convolution2dDescriptor),
    TransposeConvolution2d(TransposeConvolution2dDescriptor),
    Pooling2d(Pooling2dDescriptor),
    Reshape(ReshapeDescriptor),
    Slice(SliceDescriptor),
    Transpose(TransposeDescriptor),
    Concat { axis: u32 },
    Quantize,
    Splitter { axis: u32 },
    Softmax(SoftmaxDescriptor),
    Floor,
    Gather { axis: i32 },
    Prelu,
}

/// 去掉参数的层种类标签，用于连接和命名。
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug)]
pub enum LayerType {
    Input,
    Output,
    Constant,
    ElementwiseBinary,
    Activation,
    Convolution2d,
    TransposeConvolution2d,
    Pooling2d,
    Reshape,
    Slice,
    Transpose,
    Concat,
    Quantize,
    Splitter,
    Softmax,
    Floor,
    Gather,
    Prelu,
}

impl LayerDescriptor {
    pub const fn layer_type(&self) -> LayerType {
        match self {
            Self::Input => LayerType::Input,
            Self::Output => LayerType::Output,
            Self::Constant => LayerType::Constant,
            Self::ElementwiseBinary(_) => LayerType::ElementwiseBinary,
            Self::Activation(_) => LayerType::Activation,
            Self::Convolution2d(_) => LayerType::Convolution2d,
            Self::TransposeConvolution2d(_) => LayerType::TransposeConvolution2d,
            Self::Pooling2d(_) => LayerType::Pooling2d,
            Self::Reshape(_) => LayerType::Reshape,
            Self::Slice(_) => LayerType::Slice,
            Self::Transpose(_) => LayerType::Transpose,
            Self::Concat { .. } => LayerType::Concat,
            Self::Quantize => LayerType::Quantize,
            Self::Splitter { .. } => LayerType::Splitter,
            Self::Softmax(_) => LayerType::Softmax,
            Self::Floor => LayerType::Floor,
            Self::Gather { .. } => LayerType::Gather,
            Self::Prelu => LayerType::Prelu,
        }
    }
}

impl LayerType {
    pub const fn name(self) -> &'static str {
        match self {
            Self::Input => "Input",
            Self::Output => "Output",
            Self::Constant => "Constant",
            Self::ElementwiseBinary => "ElementwiseBinary",
            Self::Activation => "Activation",
            Self::Convolution2d => "Convolution2d",
            Self::TransposeConvolution2d => "TransposeConvolution2d",
            Self::Pooling2d => "Pooling2d",
            Self::Reshape => "Reshape",
            Self::Slice => "Slice",
            Self::Transpose => "Transpose",
            Self::Concat => "Concat",
            Self::Quantize => "Quantize",
            Self::Splitter => "Splitter",
            Self::Softmax => "Softmax",
            Self::Floor => "Floor",
            Self::Gather => "Gather",
            Self::Prelu => "Prelu",
        }
    }
}

impl std::fmt::Display for LayerType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

macro_rules! impl_from {
    ($( $ty:ty => $variant:ident )+) => {
        $(
            impl From<$ty> for LayerDescriptor {
                fn from(value: $ty) -> Self {
                    Self::$variant(value)
                }
            }
        )+
    };
}

impl_from! {
    BinaryOperation                  => ElementwiseBinary
    ActivationDescriptor             => Activation
    Convolution2dDescriptor          => Convolution2d
    TransposeConvolution2dDescriptor => TransposeConvolution2d
    Pooling2dDescriptor              => Pooling2d
    ReshapeDescriptor                => Reshape
    SliceDescriptor                  => Slice
    TransposeDescriptor              => Transpose
    SoftmaxDescriptor                => Softmax
}
