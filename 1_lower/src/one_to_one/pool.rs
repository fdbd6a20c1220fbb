use crate::{BlockBuilder, LowerError, builder::destruct, dtype, shape};
use ir::{DType, Op, Operator, PoolAttribute};
use layer::{Pooling2dDescriptor, PoolingAlgorithm};

pub(super) fn pool2d(
    b: &mut BlockBuilder,
    d: &Pooling2dDescriptor,
) -> Result<&'static str, LowerError> {
    destruct!(b, "input", [_x] = b.inputs());
    destruct!(b, "output", [_y] = b.outputs());

    let op = match d.pool_type {
        PoolingAlgorithm::Max => Op::MaxPool2d,
        PoolingAlgorithm::Average => Op::AvgPool2d,
        PoolingAlgorithm::L2 => {
            return Err(LowerError::Unsupported {
                layer: b.layer(),
                msg: "L2 pooling has no direct mapping",
            });
        }
    };
    let pad = shape(&[d.pad_top, d.pad_bottom, d.pad_left, d.pad_right])?;
    let attr = attribute(b, d, pad)?;
    b.push(Operator::new(op, attr, [b.input_name(0)], [b.output_name(0)]));
    Ok(op.name())
}

/// 池化属性。`pad` 由调用者决定，其余取自描述符与边界张量。
pub(crate) fn attribute(
    b: &BlockBuilder,
    d: &Pooling2dDescriptor,
    pad: Vec<i32>,
) -> Result<PoolAttribute, LowerError> {
    let (x, y) = (&b.inputs()[0], &b.outputs()[0]);
    Ok(PoolAttribute {
        pad,
        kernel: shape(&[d.pool_height, d.pool_width])?,
        stride: shape(&[d.stride_y, d.stride_x])?,
        input_zp: x.offset(),
        output_zp: y.offset(),
        accum_dtype: if dtype(x.dt).is_float() {
            DType::Fp32
        } else {
            DType::Int32
        },
    })
}
