//! 8 位量化 softmax 的定点分解。
//!
//! 输入减去最大值后查 4 张指数表，拼回 32 位定点指数；
//! 分母用 CLZ 归一化，再以 3 次 Newton–Raphson 迭代求倒数。

use crate::{BlockBuilder, LowerError, RescaleFlags, builder::destruct, create_rescale, shape};
use ir::{
    ArithmeticRightShiftAttribute, Attribute, AxisAttribute, DType, MulAttribute, Op, Operator,
    TableAttribute,
};
use layer::SoftmaxDescriptor;

/// 指数表的项数，覆盖 `[-256, 256]`。
const TABLE_LEN: usize = 513;

/// `-32/17` 的 Q2.29 定点值。
const NEG_32_OVER_17: i32 = -1010580540;
/// `48/17` 的 Q2.29 定点值。
const C_48_OVER_17: i32 = 1515870810;
/// Q2.29 的 1。
const F2_ONE: i32 = 536870912;

pub(super) fn softmax(
    b: &mut BlockBuilder,
    d: &SoftmaxDescriptor,
) -> Result<&'static str, LowerError> {
    destruct!(b, "input", [x] = b.inputs());
    destruct!(b, "output", [y] = b.outputs());

    let layer = b.layer();
    if !x.dt.is_quantized_8bit() {
        return Err(LowerError::Unsupported {
            layer,
            msg: "Softmax currently only supports 8-bit quantized inputs",
        });
    }
    let in_scale = x.scale().ok_or(LowerError::MissingQuantization { layer })?;
    let rank = x.rank();
    if rank == 0 || !(d.axis == -1 || d.axis == rank as i32 - 1) {
        return Err(LowerError::Unsupported {
            layer,
            msg: "Softmax is only supported along the last dimension",
        });
    }

    let input_shape = shape(&x.shape)?;
    let output_shape = shape(&y.shape)?;
    let mut reduce_shape = input_shape.clone();
    reduce_shape[rank - 1] = 1;
    let axis = AxisAttribute {
        axis: rank as i32 - 1,
    };

    let mut s = Seq { b, rank };

    let r1 = s.b.intermediate(DType::Int32, input_shape.clone());
    s.b.push(create_rescale(
        s.b.input_name(0),
        &r1,
        1.,
        x.offset(),
        0,
        RescaleFlags::SCALE32,
    )?);
    let max = s.b.intermediate(DType::Int32, reduce_shape.clone());
    s.b.push(Operator::new(Op::ReduceMax, axis.clone(), [&r1], [&max]));
    let sub1 = s.binary(Op::Sub, &r1, &max, &input_shape);
    let r2 = s.b.intermediate(DType::Int16, input_shape.clone());
    s.b.push(create_rescale(&sub1, &r2, 128., 0, 0, RescaleFlags::SCALE32)?);

    // 指数的四个字节分别查表
    let [t1, t2, t3, t4] = exp_tables(d.beta, in_scale).map(|table| {
        let t = s.b.intermediate(DType::Int32, input_shape.clone());
        s.b.push(Operator::new(
            Op::Table,
            TableAttribute { table },
            [&r2],
            [&t],
        ));
        t
    });

    let l1 = s.with_const(Op::LogicalLeftShift, &t1, 17, &input_shape);
    let l2 = s.with_const(Op::LogicalLeftShift, &t2, 9, &input_shape);
    let l3 = s.with_const(Op::LogicalLeftShift, &t3, 1, &input_shape);
    let a1 = s.with_const(Op::ArithmeticRightShift, &t4, 7, &input_shape);
    let add1 = s.binary(Op::Add, &l1, &l2, &input_shape);
    let add2 = s.binary(Op::Add, &add1, &l3, &input_shape);
    let exp = s.binary(Op::Add, &add2, &a1, &input_shape);
    let a2 = s.with_const(Op::ArithmeticRightShift, &exp, 12, &input_shape);

    // 分母归一化到 [0.5, 1)
    let sum = s.b.intermediate(DType::Int32, reduce_shape.clone());
    s.b.push(Operator::new(Op::ReduceSum, axis, [&a2], [&sum]));
    let clz = s.b.intermediate(DType::Int32, reduce_shape.clone());
    s.b.push(Operator::new(Op::Clz, (), [&sum], [&clz]));
    let headroom = s.with_const(Op::Sub, &clz, 1, &reduce_shape);
    let half_denominator = s.binary(Op::LogicalLeftShift, &sum, &headroom, &reduce_shape);

    // 倒数的初值 48/17 - 32/17 * d
    let c = s.b.scalar_i32(rank, NEG_32_OVER_17);
    let mul = s.mul(&half_denominator, &c, 31, &reduce_shape);
    let c = s.b.scalar_i32(rank, C_48_OVER_17);
    let mut reciprocal = s.binary(Op::Add, &mul, &c, &reduce_shape);
    for _ in 0..3 {
        let product = s.mul(&reciprocal, &half_denominator, 31, &reduce_shape);
        let one = s.b.scalar_i32(rank, F2_ONE);
        let error = s.binary(Op::Sub, &one, &product, &reduce_shape);
        let correction = s.mul(&reciprocal, &error, 31, &reduce_shape);
        let four = s.b.scalar_i32(rank, 4);
        let correction = s.mul(&correction, &four, 0, &reduce_shape);
        reciprocal = s.binary(Op::Add, &reciprocal, &correction, &reduce_shape)
    }

    let scaled = s.mul(&exp, &reciprocal, 30, &output_shape);
    let c = s.b.scalar_i32(rank, 35);
    let shift = s.binary(Op::Sub, &c, &clz, &reduce_shape);
    let a3 = s.b.intermediate(DType::Int32, output_shape);
    s.b.push(Operator::new(
        Op::ArithmeticRightShift,
        ArithmeticRightShiftAttribute { round: true },
        [&scaled, &shift],
        [&a3],
    ));

    let op = create_rescale(
        a3,
        s.b.output_name(0),
        1.,
        0,
        y.offset(),
        RescaleFlags::SCALE32,
    )?;
    s.b.push(op);
    Ok("Op_SOFTMAX")
}

/// 分解过程中的 INT32 算子序列。
struct Seq<'b, 'a> {
    b: &'b mut BlockBuilder<'a>,
    rank: usize,
}

impl Seq<'_, '_> {
    fn binary(&mut self, op: Op, lhs: &str, rhs: &str, shape: &[i32]) -> String {
        let out = self.b.intermediate(DType::Int32, shape);
        let attr = match op {
            Op::ArithmeticRightShift => ArithmeticRightShiftAttribute { round: true }.into(),
            _ => Attribute::None,
        };
        self.b.push(Operator::new(op, attr, [lhs, rhs], [&*out]));
        out
    }

    fn mul(&mut self, lhs: &str, rhs: &str, shift: i32, shape: &[i32]) -> String {
        let out = self.b.intermediate(DType::Int32, shape);
        self.b.push(Operator::new(
            Op::Mul,
            MulAttribute { shift },
            [lhs, rhs],
            [&*out],
        ));
        out
    }

    /// 先发射标量常量，再以它为右操作数。
    fn with_const(&mut self, op: Op, lhs: &str, value: i32, shape: &[i32]) -> String {
        let c = self.b.scalar_i32(self.rank, value);
        self.binary(op, lhs, &c, shape)
    }
}

/// `exp(beta * scale * x)` 的 Q0.31 值，按字节从高到低拆成 4 张表，`x` 取 `-256..=256`。
fn exp_tables(beta: f32, scale: f32) -> [Vec<i16>; 4] {
    let q = (0..TABLE_LEN)
        .map(|i| {
            let x = i as f64 - 256.;
            let v = (beta as f64 * scale as f64 * x).exp() * (1u64 << 31) as f64;
            v.round().min(i32::MAX as f64) as i32
        })
        .collect::<Vec<_>>();
    [24, 16, 8, 0].map(|shift| q.iter().map(|&v| ((v >> shift) & 0xff) as i16).collect())
}

#[cfg(test)]
mod test {
    use super::{TABLE_LEN, exp_tables};
    use crate::{LowerError, test_utils::*};
    use ir::{Attribute, DType, Op};
    use layer::{DataType, LayerDescriptor, SoftmaxDescriptor};

    #[test]
    fn test_tables() {
        let tables = exp_tables(1., 0.1);
        for table in &tables {
            assert_eq!(table.len(), TABLE_LEN)
        }
        let at = |i: usize| tables.each_ref().map(|t| t[i]);
        // exp(0) = 1 饱和到 i32::MAX
        assert_eq!(at(256), [127, 255, 255, 255]);
        // 正半轴全部饱和
        assert_eq!(at(512), [127, 255, 255, 255]);
        // 所有项都是一个字节
        assert!(tables.iter().flatten().all(|&v| (0..=255).contains(&v)));
    }

    #[test]
    fn test_softmax() {
        let x = qt(DataType::QAsymmS8, [1, 2, 8], 0.1, -3);
        let y = qt(DataType::QAsymmS8, [1, 2, 8], 1. / 256., -128);
        let block = lowering()
            .assemble(
                &LayerDescriptor::Softmax(SoftmaxDescriptor::default()),
                &[x],
                &[y],
            )
            .unwrap();
        assert!(block.name.starts_with("Op_SOFTMAX_block_"));
        assert_eq!(block.operators.len(), 56);
        assert_eq!(block.tensors.len(), 57);
        assert_eq!(
            block.tensors.iter().filter(|t| t.is_constant()).count(),
            15
        );
        assert_eq!(block.verify(), Ok(()));

        let first = &block.operators[0];
        assert_eq!(first.op, Op::Rescale);
        assert_eq!(first.inputs, block.inputs);
        let Attribute::Rescale(attr) = &first.attr else {
            panic!()
        };
        assert_eq!(attr.input_zp, -3);
        assert!(attr.scale32 && !attr.double_round);

        let last = block.operators.last().unwrap();
        assert_eq!(last.op, Op::Rescale);
        assert_eq!(last.outputs, block.outputs);
        let Attribute::Rescale(attr) = &last.attr else {
            panic!()
        };
        assert_eq!(attr.output_zp, -128);

        assert_eq!(
            block.operators.iter().filter(|op| op.op == Op::Table).count(),
            4
        );
        let max = &block.operators[1];
        assert_eq!(max.op, Op::ReduceMax);
        let max = block.tensor(&max.outputs[0]).unwrap();
        assert_eq!(max.shape, [1, 2, 1]);
        assert_eq!(max.dt, DType::Int32);

        for t in block.tensors.iter().filter(|t| t.is_constant()) {
            assert_eq!(t.shape, [1, 1, 1]);
            assert_eq!(t.dt, DType::Int32);
        }
    }

    #[test]
    fn test_float_input() {
        let e = lowering()
            .assemble(
                &LayerDescriptor::Softmax(SoftmaxDescriptor::default()),
                &[f32t([1, 8])],
                &[f32t([1, 8])],
            )
            .unwrap_err();
        assert_eq!(
            e.to_string(),
            "Softmax: Softmax currently only supports 8-bit quantized inputs"
        )
    }

    #[test]
    fn test_axis() {
        let x = qt(DataType::QAsymmU8, [2, 8], 0.1, 0);
        let y = qt(DataType::QAsymmU8, [2, 8], 1. / 256., 0);
        let d = SoftmaxDescriptor { beta: 1., axis: 0 };
        let e = lowering()
            .assemble(&LayerDescriptor::Softmax(d), &[x.clone()], &[y.clone()])
            .unwrap_err();
        assert!(matches!(e, LowerError::Unsupported { .. }));

        let d = SoftmaxDescriptor { beta: 1., axis: 1 };
        let block = lowering()
            .assemble(&LayerDescriptor::Softmax(d), &[x], &[y])
            .unwrap();
        assert_eq!(block.operators.len(), 56)
    }
}
