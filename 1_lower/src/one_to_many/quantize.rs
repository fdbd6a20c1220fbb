use crate::{
    BlockBuilder, LowerError, RescaleFlags, builder::destruct, create_rescale, dtype, shape, splat,
};
use ir::{MulAttribute, Op, Operator};
use layer::DataType;

/// 浮点输入：`cast(x * (1 / scale) + zero_point)`；量化输入：一次 RESCALE 重量化。
pub(super) fn quantize(b: &mut BlockBuilder) -> Result<&'static str, LowerError> {
    destruct!(b, "input", [x] = b.inputs());
    destruct!(b, "output", [y] = b.outputs());

    let layer = b.layer();
    let out_scale = y.scale().ok_or(LowerError::MissingQuantization { layer })?;

    if x.dt.is_float() {
        // 截断转换不能得到布尔语义
        if y.dt == DataType::Boolean {
            return Err(LowerError::DataType { layer, dt: y.dt });
        }

        let dt = dtype(x.dt);
        let shape = shape(&x.shape)?;
        let n = x.num_elements();
        let fill = |v: f64| splat(dt, v, n).ok_or(LowerError::DataType { layer, dt: x.dt });

        let input = b.input_name(0);
        let scale = b.constant(dt, shape.clone(), fill(1. / out_scale as f64)?);
        let zero_point = b.constant(dt, shape.clone(), fill(y.offset() as f64)?);
        let mul = b.intermediate(dt, shape.clone());
        b.push(Operator::new(
            Op::Mul,
            MulAttribute { shift: 0 },
            [input, scale],
            [&mul],
        ));
        let add = b.intermediate(dt, shape);
        b.push(Operator::new(Op::Add, (), [mul, zero_point], [&add]));
        b.push(Operator::new(Op::Cast, (), [add], [b.output_name(0)]));
    } else if x.dt.is_quantized() {
        let in_scale = x.scale().ok_or(LowerError::MissingQuantization { layer })?;
        let flags = RescaleFlags {
            input_unsigned: x.dt == DataType::QAsymmU8,
            output_unsigned: y.dt == DataType::QAsymmU8,
            double_round: true,
            scale32: true,
        };
        let op = create_rescale(
            b.input_name(0),
            b.output_name(0),
            in_scale as f64 / out_scale as f64,
            x.offset(),
            y.offset(),
            flags,
        )?;
        b.push(op)
    } else {
        return Err(LowerError::DataType { layer, dt: x.dt });
    }
    Ok("Op_QUANTIZE")
}

#[cfg(test)]
mod test {
    use crate::{LowerError, test_utils::*};
    use ir::{Attribute, DType, Op};
    use layer::{DataType, LayerDescriptor, TensorDescriptor};

    #[test]
    fn test_float() {
        let x = f32t([1, 3, 3, 1]);
        let y = qt(DataType::Signed32, [1, 3, 3, 1], 0.25, 3);
        let block = lowering()
            .assemble(&LayerDescriptor::Quantize, &[x], &[y])
            .unwrap();
        assert!(block.name.starts_with("Op_QUANTIZE_block_"));
        assert_eq!(block.operators.len(), 5);
        assert_eq!(block.tensors.len(), 6);
        assert_eq!(
            block.operators.iter().map(|op| op.op).collect::<Vec<_>>(),
            [Op::Const, Op::Const, Op::Mul, Op::Add, Op::Cast]
        );

        let input = block.tensor(&block.inputs[0]).unwrap();
        assert_eq!(input.dt, DType::Fp32);
        let cast = &block.operators[4];
        assert_eq!(cast.outputs, block.outputs);
        assert_eq!(block.tensor(&cast.outputs[0]).unwrap().dt, DType::Int32);

        let scale = block.tensor(&block.operators[0].outputs[0]).unwrap();
        assert_eq!(scale.shape, [1, 3, 3, 1]);
        assert_eq!(scale.data, 4f32.to_le_bytes().repeat(9));
        let zp = block.tensor(&block.operators[1].outputs[0]).unwrap();
        assert_eq!(zp.data, 3f32.to_le_bytes().repeat(9));
    }

    #[test]
    fn test_boolean() {
        let x = f32t([1, 4]);
        let y = qt(DataType::Boolean, [1, 4], 1., 0);
        let e = lowering()
            .assemble(&LayerDescriptor::Quantize, &[x], &[y])
            .unwrap_err();
        assert_eq!(
            e,
            LowerError::DataType {
                layer: layer::LayerType::Quantize,
                dt: DataType::Boolean
            }
        )
    }

    #[test]
    fn test_requantize() {
        let x = qt(DataType::QAsymmU8, [1, 4], 0.5, 128);
        let y = qt(DataType::QAsymmS8, [1, 4], 0.25, -1);
        let block = lowering()
            .assemble(&LayerDescriptor::Quantize, &[x], &[y])
            .unwrap();
        assert_one_to_one(&block, 1, 1);
        let Attribute::Rescale(attr) = &block.operators[0].attr else {
            panic!()
        };
        // 0.5 / 0.25 = 2 = 0.5 * 2^2
        assert_eq!((attr.multiplier[0], attr.shift[0]), (1 << 30, 29));
        assert_eq!((attr.input_zp, attr.output_zp), (128, -1));
        assert!(attr.input_unsigned && !attr.output_unsigned);
        assert!(attr.double_round && attr.scale32);
    }

    #[test]
    fn test_missing_quantization() {
        let e = lowering()
            .assemble(&LayerDescriptor::Quantize, &[f32t([4])], &[f32t([4])])
            .unwrap_err();
        assert!(matches!(e, LowerError::MissingQuantization { .. }));

        // 逐通道尺度不能当作单一尺度使用
        let y = TensorDescriptor::new(DataType::QSymmS8, [2, 2])
            .with_per_channel_quant(vec![0.5, 0.25], 0);
        let e = lowering()
            .assemble(&LayerDescriptor::Quantize, &[f32t([2, 2])], &[y])
            .unwrap_err();
        assert!(matches!(e, LowerError::MissingQuantization { .. }))
    }
}
