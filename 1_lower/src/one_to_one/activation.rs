use crate::{BlockBuilder, LowerError, builder::destruct, dtype};
use ir::{ClampAttribute, Op, Operator};
use layer::{ActivationDescriptor, ActivationFunction};

/// ReLU 与有界 ReLU 都是 CLAMP。
pub(super) fn clamp(
    b: &mut BlockBuilder,
    act: &ActivationDescriptor,
) -> Result<&'static str, LowerError> {
    destruct!(b, "input", [_x] = b.inputs());
    destruct!(b, "output", [y] = b.outputs());

    let (min, max) = match act.function {
        ActivationFunction::BoundedReLu => (act.b, act.a),
        _ => (0., f32::MAX),
    };

    let dt = dtype(y.dt);
    let attr = if dt.is_float() {
        ClampAttribute {
            min_int: 0,
            max_int: 0,
            min_fp: min,
            max_fp: max,
        }
    } else {
        let Some((lo, hi)) = dt.int_range() else {
            return Err(LowerError::DataType {
                layer: b.layer(),
                dt: y.dt,
            });
        };
        let scale = y.scale().ok_or(LowerError::MissingQuantization { layer: b.layer() })?;
        let offset = y.offset();
        let quantize = |v: f32| {
            let q = (v as f64 / scale as f64).round() as i64;
            q.saturating_add(offset as i64).clamp(lo, hi) as i32
        };
        ClampAttribute {
            min_int: quantize(min),
            max_int: quantize(max),
            min_fp: min,
            max_fp: max,
        }
    };

    b.push(Operator::new(
        Op::Clamp,
        attr,
        [b.input_name(0)],
        [b.output_name(0)],
    ));
    Ok(Op::Clamp.name())
}

#[cfg(test)]
mod test {
    use crate::test_utils::*;
    use ir::{Attribute, ClampAttribute, Op};
    use layer::{ActivationDescriptor, ActivationFunction, DataType, LayerDescriptor};

    fn act(function: ActivationFunction, a: f32, b: f32) -> LayerDescriptor {
        ActivationDescriptor { function, a, b }.into()
    }

    #[test]
    fn test_relu() {
        let block = lowering()
            .assemble(
                &act(ActivationFunction::ReLu, 0., 0.),
                &[f32t([1, 8])],
                &[f32t([1, 8])],
            )
            .unwrap();
        assert_one_to_one(&block, 1, 1);
        assert_eq!(block.operators[0].op, Op::Clamp);
        assert_eq!(
            block.operators[0].attr,
            Attribute::Clamp(ClampAttribute {
                min_int: 0,
                max_int: 0,
                min_fp: 0.,
                max_fp: f32::MAX,
            })
        )
    }

    #[test]
    fn test_bounded_relu_quantized() {
        let x = qt(DataType::QAsymmS8, [1, 8], 0.5, -10);
        let block = lowering()
            .assemble(
                &act(ActivationFunction::BoundedReLu, 6., -1.),
                &[x.clone()],
                &[x],
            )
            .unwrap();
        assert_one_to_one(&block, 1, 1);
        let Attribute::Clamp(attr) = &block.operators[0].attr else {
            panic!()
        };
        // -1 / 0.5 - 10 = -12, 6 / 0.5 - 10 = 2
        assert_eq!((attr.min_int, attr.max_int), (-12, 2));

        // 上界饱和到 INT8 范围
        let x = qt(DataType::QAsymmS8, [1, 8], 0.01, 0);
        let block = lowering()
            .assemble(
                &act(ActivationFunction::ReLu, 0., 0.),
                &[x.clone()],
                &[x],
            )
            .unwrap();
        let Attribute::Clamp(attr) = &block.operators[0].attr else {
            panic!()
        };
        assert_eq!((attr.min_int, attr.max_int), (0, 127));
    }

    #[test]
    fn test_sigmoid_unknown() {
        let block = lowering()
            .assemble(
                &act(ActivationFunction::Sigmoid, 0., 0.),
                &[f32t([4])],
                &[f32t([4])],
            )
            .unwrap();
        assert!(block.is_unknown())
    }
}
