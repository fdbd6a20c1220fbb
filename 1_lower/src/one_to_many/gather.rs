use crate::{BlockBuilder, LowerError, builder::destruct, dtype, shape};
use ir::{DType, Op, Operator, ReshapeAttribute, TransposeAttribute};
use layer::DataType;

/// 沿 `axis` 按索引取值：`y[l.., i.., r..] = params[l.., indices[i..], r..]`。
///
/// 把 `axis` 换到最前，整理成 `[1, K, C]`，索引整理成 `[1, W]`，
/// GATHER 得到 `[1, W, C]` 后再还原形状和维度顺序。`axis` 为 0 时省去两次转置。
pub(super) fn gather(b: &mut BlockBuilder, axis: i32) -> Result<&'static str, LowerError> {
    destruct!(b, "input", [params, indices] = b.inputs());
    destruct!(b, "output", [y] = b.outputs());

    let layer = b.layer();
    let rank = params.rank();
    let Some(axis) = usize::try_from(axis).ok().filter(|&a| a < rank) else {
        return Err(b.shape_error(format!("axis {axis} out of rank {rank}")));
    };
    if params.dt == DataType::QAsymmU8 {
        return Err(LowerError::DataType {
            layer,
            dt: params.dt,
        });
    }
    if indices.dt != DataType::Signed32 {
        return Err(LowerError::DataType {
            layer,
            dt: indices.dt,
        });
    }

    let left = &params.shape[..axis];
    let right = &params.shape[axis + 1..];
    let expected = [left, indices.shape(), right].concat();
    if *y.shape != *expected {
        return Err(b.shape_error(format!(
            "output shape {:?} differs from {expected:?}",
            y.shape
        )));
    }

    let volume = |dims: &[u32]| dims.iter().try_fold(1u32, |acc, &d| acc.checked_mul(d));
    let (Some(w), Some(l), Some(r)) = (volume(indices.shape()), volume(left), volume(right)) else {
        return Err(b.shape_error("element count overflows"));
    };
    let Some(c) = l.checked_mul(r) else {
        return Err(b.shape_error("element count overflows"));
    };
    let k = params.shape[axis];

    let dt = dtype(params.dt);
    let input = b.input_name(0);
    let values_src = if axis > 0 {
        let perms = [axis]
            .into_iter()
            .chain(0..axis)
            .chain(axis + 1..rank)
            .map(|i| i as i32)
            .collect();
        let transposed = b.intermediate(dt, shape(&[&[k][..], left, right].concat())?);
        b.push(Operator::new(
            Op::Transpose,
            TransposeAttribute { perms },
            [input],
            [&transposed],
        ));
        transposed
    } else {
        input
    };

    let values_shape = shape(&[1, k, c])?;
    let values = b.intermediate(dt, values_shape.clone());
    b.push(Operator::new(
        Op::Reshape,
        ReshapeAttribute {
            new_shape: values_shape,
        },
        [values_src],
        [&values],
    ));
    let index_shape = shape(&[1, w])?;
    let index = b.intermediate(DType::Int32, index_shape.clone());
    b.push(Operator::new(
        Op::Reshape,
        ReshapeAttribute {
            new_shape: index_shape,
        },
        [b.input_name(1)],
        [&index],
    ));

    let gathered = b.intermediate(dt, shape(&[1, w, c])?);
    b.push(Operator::new(
        Op::Gather,
        (),
        [values, index],
        [&gathered],
    ));

    // 索引维在前，axis 左右两侧的维度依次在后
    let result_shape = shape(&[indices.shape(), left, right].concat())?;
    if axis > 0 {
        let reshaped = b.intermediate(dt, result_shape.clone());
        b.push(Operator::new(
            Op::Reshape,
            ReshapeAttribute {
                new_shape: result_shape,
            },
            [gathered],
            [&reshaped],
        ));
        let n = indices.rank();
        let perms = (n..n + left.len())
            .chain(0..n)
            .chain(n + left.len()..n + left.len() + right.len())
            .map(|i| i as i32)
            .collect();
        b.push(Operator::new(
            Op::Transpose,
            TransposeAttribute { perms },
            [reshaped],
            [b.output_name(0)],
        ));
    } else {
        b.push(Operator::new(
            Op::Reshape,
            ReshapeAttribute {
                new_shape: result_shape,
            },
            [gathered],
            [b.output_name(0)],
        ));
    }
    Ok(Op::Gather.name())
}
