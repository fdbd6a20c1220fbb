use crate::{BlockBuilder, LowerError, builder::destruct, shape};
use ir::{Op, Operator, SliceAttribute};

/// 沿 `axis` 切分为若干视图，每个输出一个 SLICE，共享同一个输入。
pub(super) fn split(b: &mut BlockBuilder, axis: u32) -> Result<&'static str, LowerError> {
    destruct!(b, "input", [x] = b.inputs());
    let outputs = b.outputs();
    if outputs.is_empty() {
        return Err(LowerError::Arity {
            layer: b.layer(),
            what: "output",
            expected: 1,
            got: 0,
        });
    }

    let rank = x.rank();
    let axis = axis as usize;
    if axis >= rank {
        return Err(b.shape_error(format!("axis {axis} out of rank {rank}")));
    }

    let mut start: u32 = 0;
    for (i, y) in outputs.iter().enumerate() {
        if y.rank() != rank {
            return Err(b.shape_error(format!("output {i} has rank {}", y.rank())));
        }
        if let Some(j) = (0..rank).find(|&j| j != axis && y.shape[j] != x.shape[j]) {
            return Err(b.shape_error(format!(
                "output {i} dimension {j} is {}, input has {}",
                y.shape[j], x.shape[j]
            )));
        }
        let end = match start.checked_add(y.shape[axis]) {
            Some(end) if end <= x.shape[axis] => end,
            _ => {
                return Err(b.shape_error(format!(
                    "parts exceed input dimension {} along axis {axis}",
                    x.shape[axis]
                )));
            }
        };

        let mut begin = vec![0; rank];
        begin[axis] = start;
        let attr = SliceAttribute {
            start: shape(&begin)?,
            size: shape(&y.shape)?,
        };
        b.push(Operator::new(
            Op::Slice,
            attr,
            [b.input_name(0)],
            [b.output_name(i)],
        ));
        start = end
    }
    Ok("Op_SPLIT")
}
