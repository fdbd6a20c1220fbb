use crate::{
    BlockBuilder, LowerError, RescaleFlags, builder::destruct, create_rescale, dtype, shape, splat,
};
use ir::{DType, MulAttribute, Op, Operator};
use layer::DataType;

/// `x >= 0 ? x : alpha * x`，`alpha` 是第二个输入，按广播参与乘法。
///
/// 8 位量化输入先去掉零点转到 INT32 再比较和相乘，
/// 两路各自缩放到输出类型后由 SELECT 合并。
pub(super) fn prelu(b: &mut BlockBuilder) -> Result<&'static str, LowerError> {
    destruct!(b, "input", [x, alpha] = b.inputs());
    destruct!(b, "output", [y] = b.outputs());

    let layer = b.layer();
    let input = b.input_name(0);
    let slope = b.input_name(1);
    let x_shape = shape(&x.shape)?;
    let y_shape = shape(&y.shape)?;

    if x.dt.is_float() {
        if alpha.dt != x.dt {
            return Err(LowerError::DataType {
                layer,
                dt: alpha.dt,
            });
        }
        let dt = dtype(x.dt);
        let data = splat(dt, 0., 1).ok_or(LowerError::DataType { layer, dt: x.dt })?;
        let zero = b.constant(dt, vec![1; x.rank()], data);
        let mul = b.intermediate(dt, y_shape);
        b.push(Operator::new(
            Op::Mul,
            MulAttribute { shift: 0 },
            [&*input, &*slope],
            [&mul],
        ));
        let ge = b.intermediate(DType::Bool, x_shape);
        b.push(Operator::new(
            Op::GreaterEqual,
            (),
            [&*input, &*zero],
            [&ge],
        ));
        b.push(Operator::new(
            Op::Select,
            (),
            [ge, input, mul],
            [b.output_name(0)],
        ));
    } else if [x.dt, alpha.dt, y.dt].iter().all(|dt| dt.is_quantized_8bit()) {
        let missing = || LowerError::MissingQuantization { layer };
        let in_scale = x.scale().ok_or_else(missing)? as f64;
        let alpha_scale = alpha.scale().ok_or_else(missing)? as f64;
        let out_scale = y.scale().ok_or_else(missing)? as f64;
        let flags = |from: DataType, to: DataType| RescaleFlags {
            input_unsigned: from == DataType::QAsymmU8,
            output_unsigned: to == DataType::QAsymmU8,
            ..RescaleFlags::SCALE32.double_round(true)
        };

        let x32 = b.intermediate(DType::Int32, x_shape.clone());
        let to_i32 = flags(x.dt, DataType::Signed32);
        let op = create_rescale(&input, &x32, 1., x.offset(), 0, to_i32)?;
        b.push(op);
        let zero = b.scalar_i32(x.rank(), 0);
        let ge = b.intermediate(DType::Bool, x_shape);
        b.push(Operator::new(Op::GreaterEqual, (), [&*x32, &*zero], [&ge]));

        let alpha32 = b.intermediate(DType::Int32, shape(&alpha.shape)?);
        let op = create_rescale(
            &slope,
            &alpha32,
            1.,
            alpha.offset(),
            0,
            flags(alpha.dt, DataType::Signed32),
        )?;
        b.push(op);
        let mul = b.intermediate(DType::Int32, y_shape.clone());
        b.push(Operator::new(
            Op::Mul,
            MulAttribute { shift: 0 },
            [x32, alpha32],
            [&mul],
        ));

        let out_dt = dtype(y.dt);
        let scaled = b.intermediate(out_dt, y_shape.clone());
        let op = create_rescale(
            mul,
            &scaled,
            in_scale * alpha_scale / out_scale,
            0,
            y.offset(),
            flags(DataType::Signed32, y.dt),
        )?;
        b.push(op);
        let identity = b.intermediate(out_dt, y_shape);
        let op = create_rescale(
            input,
            &identity,
            in_scale / out_scale,
            x.offset(),
            y.offset(),
            flags(x.dt, y.dt),
        )?;
        b.push(op);

        b.push(Operator::new(
            Op::Select,
            (),
            [ge, identity, scaled],
            [b.output_name(0)],
        ));
    } else {
        let dt = [x.dt, alpha.dt, y.dt]
            .into_iter()
            .find(|dt| !dt.is_quantized_8bit())
            .unwrap_or(x.dt);
        return Err(LowerError::DataType { layer, dt });
    }
    Ok("Op_PRELU")
}
