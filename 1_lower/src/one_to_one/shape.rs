use crate::{BlockBuilder, LowerError, builder::destruct, shape};
use ir::{AxisAttribute, Op, Operator, ReshapeAttribute, SliceAttribute, TransposeAttribute};
use layer::{ReshapeDescriptor, SliceDescriptor, TransposeDescriptor};

/// 目标形状原样复制，元素数量守恒由图保证。
pub(super) fn reshape(
    b: &mut BlockBuilder,
    d: &ReshapeDescriptor,
) -> Result<&'static str, LowerError> {
    destruct!(b, "input", [_x] = b.inputs());
    destruct!(b, "output", [_y] = b.outputs());

    let attr = ReshapeAttribute {
        new_shape: shape(&d.target_shape)?,
    };
    b.push(Operator::new(
        Op::Reshape,
        attr,
        [b.input_name(0)],
        [b.output_name(0)],
    ));
    Ok(Op::Reshape.name())
}

pub(super) fn slice(b: &mut BlockBuilder, d: &SliceDescriptor) -> Result<&'static str, LowerError> {
    destruct!(b, "input", [x] = b.inputs());
    destruct!(b, "output", [y] = b.outputs());

    let rank = x.rank();
    if d.begin.len() != rank || d.size.len() != rank || y.rank() != rank {
        return Err(b.shape_error(format!(
            "begin, size and output must have the rank of input ({rank})"
        )));
    }

    let attr = SliceAttribute {
        start: shape(&d.begin)?,
        size: shape(&d.size)?,
    };
    b.push(Operator::new(
        Op::Slice,
        attr,
        [b.input_name(0)],
        [b.output_name(0)],
    ));
    Ok(Op::Slice.name())
}

pub(super) fn transpose(
    b: &mut BlockBuilder,
    d: &TransposeDescriptor,
) -> Result<&'static str, LowerError> {
    destruct!(b, "input", [x] = b.inputs());
    destruct!(b, "output", [_y] = b.outputs());

    if d.permutation.len() != x.rank() {
        return Err(b.shape_error(format!(
            "permutation of length {} does not match rank {}",
            d.permutation.len(),
            x.rank()
        )));
    }

    let attr = TransposeAttribute {
        perms: shape(&d.permutation)?,
    };
    b.push(Operator::new(
        Op::Transpose,
        attr,
        [b.input_name(0)],
        [b.output_name(0)],
    ));
    Ok(Op::Transpose.name())
}

pub(super) fn concat(b: &mut BlockBuilder, axis: u32) -> Result<&'static str, LowerError> {
    destruct!(b, "output", [y] = b.outputs());
    if b.inputs().is_empty() {
        return Err(LowerError::Arity {
            layer: b.layer(),
            what: "input",
            expected: 1,
            got: 0,
        });
    }
    if axis as usize >= y.rank() {
        return Err(b.shape_error(format!("axis {axis} out of rank {}", y.rank())));
    }

    let inputs = (0..b.inputs().len()).map(|i| b.input_name(i)).collect::<Vec<_>>();
    let attr = AxisAttribute { axis: axis as _ };
    b.push(Operator::new(Op::Concat, attr, inputs, [b.output_name(0)]));
    Ok(Op::Concat.name())
}
