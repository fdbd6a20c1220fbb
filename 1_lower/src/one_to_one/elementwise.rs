use crate::{BlockBuilder, LowerError, builder::destruct};
use ir::{Attribute, MulAttribute, Op, Operator};
use layer::BinaryOperation;

pub(super) fn binary(
    b: &mut BlockBuilder,
    op: BinaryOperation,
) -> Result<&'static str, LowerError> {
    destruct!(b, "input", [_a, _b] = b.inputs());
    destruct!(b, "output", [_y] = b.outputs());

    let (op, attr) = match op {
        BinaryOperation::Add => (Op::Add, Attribute::None),
        BinaryOperation::Sub => (Op::Sub, Attribute::None),
        BinaryOperation::Mul => (Op::Mul, MulAttribute { shift: 0 }.into()),
        BinaryOperation::Maximum => (Op::Maximum, Attribute::None),
        BinaryOperation::Minimum => (Op::Minimum, Attribute::None),
    };
    b.push(Operator::new(
        op,
        attr,
        [b.input_name(0), b.input_name(1)],
        [b.output_name(0)],
    ));
    Ok(op.name())
}
