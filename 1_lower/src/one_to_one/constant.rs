use crate::{BlockBuilder, LowerError, builder::destruct};
use ir::{Op, Operator};

/// 物化常量层。描述符不带数据时只产生张量声明。
pub(super) fn constant(b: &mut BlockBuilder) -> Result<&'static str, LowerError> {
    destruct!(b, "output", [y] = b.outputs());
    if !b.inputs().is_empty() {
        return Err(LowerError::Arity {
            layer: b.layer(),
            what: "input",
            expected: 0,
            got: b.inputs().len(),
        });
    }

    if let Some(data) = &y.data {
        b.fill_output(0, data.to_vec())
    }
    b.push(Operator::new(
        Op::Const,
        (),
        [] as [&str; 0],
        [b.output_name(0)],
    ));
    Ok(Op::Const.name())
}
