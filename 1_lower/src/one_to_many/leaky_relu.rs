use crate::{
    BlockBuilder, LowerError, RescaleFlags, builder::destruct, create_rescale, dtype, shape, splat,
};
use ir::{DType, MulAttribute, Op, Operator};
use layer::DataType;

/// `alpha <= 1` 时为 `max(x, alpha * x)`，否则为 `min(x, alpha * x)`。
///
/// 量化输入在 INT32 上比较两路重缩放的结果，最后再缩放回输出类型。
pub(super) fn leaky_relu(b: &mut BlockBuilder, alpha: f32) -> Result<&'static str, LowerError> {
    destruct!(b, "input", [x] = b.inputs());
    destruct!(b, "output", [y] = b.outputs());

    let layer = b.layer();
    let select = if alpha <= 1. { Op::Maximum } else { Op::Minimum };
    let input = b.input_name(0);

    if x.dt.is_float() {
        let dt = dtype(x.dt);
        let data = splat(dt, alpha as f64, 1).ok_or(LowerError::DataType { layer, dt: x.dt })?;
        let alpha = b.constant(dt, vec![1; x.rank()], data);
        let mul = b.intermediate(dt, shape(&x.shape)?);
        b.push(Operator::new(
            Op::Mul,
            MulAttribute { shift: 0 },
            [&*input, &*alpha],
            [&mul],
        ));
        b.push(Operator::new(select, (), [input, mul], [b.output_name(0)]));
    } else if x.dt.is_quantized() {
        let missing = || LowerError::MissingQuantization { layer };
        let in_scale = x.scale().ok_or_else(missing)? as f64;
        let out_scale = y.scale().ok_or_else(missing)? as f64;
        let flags = RescaleFlags {
            input_unsigned: x.dt == DataType::QAsymmU8,
            ..RescaleFlags::SCALE32.double_round(true)
        };

        let y_shape = shape(&y.shape)?;
        let scaled = b.intermediate(DType::Int32, y_shape.clone());
        let op = create_rescale(
            &input,
            &scaled,
            in_scale * alpha as f64 / out_scale,
            x.offset(),
            0,
            flags,
        )?;
        b.push(op);
        let identity = b.intermediate(DType::Int32, y_shape.clone());
        let op = create_rescale(&input, &identity, in_scale / out_scale, x.offset(), 0, flags)?;
        b.push(op);

        let selected = b.intermediate(DType::Int32, y_shape);
        b.push(Operator::new(select, (), [scaled, identity], [&selected]));
        let flags = RescaleFlags {
            output_unsigned: y.dt == DataType::QAsymmU8,
            ..RescaleFlags::SCALE32.double_round(true)
        };
        let op = create_rescale(selected, b.output_name(0), 1., 0, y.offset(), flags)?;
        b.push(op)
    } else {
        return Err(LowerError::DataType { layer, dt: x.dt });
    }
    Ok("Op_LEAKY_RELU")
}
