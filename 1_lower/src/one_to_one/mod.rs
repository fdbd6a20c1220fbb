//! 可以直接映射到单个目标算子的节点。

mod activation;
mod constant;
pub(crate) mod conv;
mod elementwise;
pub(crate) mod pool;
mod shape;

use crate::{BlockBuilder, LowerConfig, LowerError};
use layer::{
    ActivationFunction, LayerDescriptor as L, PaddingMethod, Pooling2dDescriptor, PoolingAlgorithm,
};

/// 尝试一对一映射。节点不属于一对一映射时返回 `None`，且不修改 `b`。
pub(crate) fn lower(
    b: &mut BlockBuilder,
    desc: &L,
    config: &LowerConfig,
) -> Result<Option<&'static str>, LowerError> {
    let tag = match desc {
        L::ElementwiseBinary(op) => elementwise::binary(b, *op)?,
        L::Activation(act) => match act.function {
            ActivationFunction::ReLu | ActivationFunction::BoundedReLu => {
                activation::clamp(b, act)?
            }
            _ => return Ok(None),
        },
        L::Convolution2d(d) if d.bias_enabled => conv::conv2d(b, d, config)?,
        L::TransposeConvolution2d(d) if d.bias_enabled => conv::transpose_conv2d(b, d, config)?,
        L::Pooling2d(d) if is_direct_pool(d) => pool::pool2d(b, d)?,
        L::Reshape(d) => shape::reshape(b, d)?,
        L::Slice(d) => shape::slice(b, d)?,
        L::Transpose(d) => shape::transpose(b, d)?,
        L::Concat { axis } => shape::concat(b, *axis)?,
        L::Constant => constant::constant(b)?,
        L::Convolution2d(_)
        | L::TransposeConvolution2d(_)
        | L::Pooling2d(_)
        | L::Input
        | L::Output
        | L::Quantize
        | L::Splitter { .. }
        | L::Softmax(_)
        | L::Floor
        | L::Gather { .. }
        | L::Prelu => return Ok(None),
    };
    Ok(Some(tag))
}

/// 最大池化，以及填充不参与平均或没有填充的平均池化。
fn is_direct_pool(d: &Pooling2dDescriptor) -> bool {
    match d.pool_type {
        PoolingAlgorithm::Max => true,
        PoolingAlgorithm::Average => d.padding_method == PaddingMethod::Exclude || !d.has_padding(),
        PoolingAlgorithm::L2 => false,
    }
}
