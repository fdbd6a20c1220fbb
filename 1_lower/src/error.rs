use ir::BlockError;
use layer::{DataType, LayerType};
use thiserror::Error;

#[derive(Error, Clone, PartialEq, Debug)]
pub enum LowerError {
    #[error("Shifted mantissa exceeds {0} signed bits")]
    MantissaOverflow(u32),
    #[error("multipliers is empty")]
    EmptyMultipliers,
    #[error("multipliers and shift not same size")]
    MultiplierShiftMismatch,
    #[error("multipliers must be greater than 1 if per_channel is true")]
    PerChannelSingle,
    #[error("multipliers size must be 1 if per_channel is false")]
    PerTensorMultiple,

    #[error("{layer}: {expected} {what} tensor(s) required, got {got}")]
    Arity {
        layer: LayerType,
        what: &'static str,
        expected: usize,
        got: usize,
    },
    #[error("{layer}: {msg}")]
    Shape { layer: LayerType, msg: String },
    #[error("{layer}: unsupported data type {dt:?}")]
    DataType { layer: LayerType, dt: DataType },
    #[error("{layer}: {msg}")]
    Arg { layer: LayerType, msg: String },
    #[error("{layer}: {msg}")]
    Unsupported { layer: LayerType, msg: &'static str },
    #[error("{layer}: per-tensor quantization parameters required")]
    MissingQuantization { layer: LayerType },
    #[error("{layer}: only NHWC data layout is supported")]
    DataLayout { layer: LayerType },
    #[error("dimension {0} does not fit in i32")]
    DimOverflow(u32),
    #[error(transparent)]
    Verify(#[from] BlockError),
}
