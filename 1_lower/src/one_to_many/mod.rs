//! 需要分解为一段直线型算子程序的节点。

mod avg_pool;
mod conv;
mod gather;
mod leaky_relu;
mod prelu;
mod quantize;
mod softmax;
mod split;

use crate::{BlockBuilder, LowerConfig, LowerError};
use layer::{ActivationFunction, LayerDescriptor as L, PoolingAlgorithm};

/// 尝试一对多分解。没有对应的分解时返回 `None`，且不修改 `b`。
pub(crate) fn lower(
    b: &mut BlockBuilder,
    desc: &L,
    config: &LowerConfig,
) -> Result<Option<&'static str>, LowerError> {
    let tag = match desc {
        L::Pooling2d(d) if d.pool_type == PoolingAlgorithm::Average => avg_pool::avg_pool(b, d)?,
        L::Quantize => quantize::quantize(b)?,
        L::Splitter { axis } => split::split(b, *axis)?,
        L::Softmax(d) => softmax::softmax(b, d)?,
        L::Activation(act) if act.function == ActivationFunction::LeakyReLu => {
            leaky_relu::leaky_relu(b, act.a)?
        }
        L::Convolution2d(d) => conv::conv2d(b, d, config)?,
        L::TransposeConvolution2d(d) => conv::transpose_conv2d(b, d, config)?,
        L::Prelu => prelu::prelu(b)?,
        L::Gather { axis } => gather::gather(b, *axis)?,
        _ => return Ok(None),
    };
    Ok(Some(tag))
}
