use crate::{
    BlockBuilder, LowerError, builder::destruct, dtype, one_to_one::pool::attribute, shape,
};
use ir::{Op, Operator, PadAttribute};
use layer::{DataLayout, Pooling2dDescriptor};

/// 填充参与平均的平均池化：先用 PAD 显式补零，再做无填充的 AVG_POOL2D。
pub(super) fn avg_pool(
    b: &mut BlockBuilder,
    d: &Pooling2dDescriptor,
) -> Result<&'static str, LowerError> {
    destruct!(b, "input", [x] = b.inputs());
    destruct!(b, "output", [_y] = b.outputs());

    let mut padded = shape(&x.shape)?;
    let [top, bottom, left, right] = [d.pad_top, d.pad_bottom, d.pad_left, d.pad_right];
    let (h, w) = match d.data_layout {
        DataLayout::Nchw => (2, 3),
        DataLayout::Nhwc => (1, 2),
    };
    if padded.len() != 4 {
        return Err(b.shape_error(format!("expect 4-D input, got {}-D", padded.len())));
    }
    let mut padding = vec![0; 8];
    for (axis, before, after) in [(h, top, bottom), (w, left, right)] {
        let overflow = || {
            let dim = x.shape[axis];
            format!("padding {before}+{after} overflows dimension {dim}")
        };
        let (Ok(before), Ok(after)) = (i32::try_from(before), i32::try_from(after)) else {
            return Err(b.shape_error(overflow()));
        };
        let Some(dim) = padded[axis]
            .checked_add(before)
            .and_then(|dim| dim.checked_add(after))
        else {
            return Err(b.shape_error(overflow()));
        };
        padding[2 * axis] = before;
        padding[2 * axis + 1] = after;
        padded[axis] = dim
    }

    let input = b.input_name(0);
    let pad_out = b.intermediate(dtype(x.dt), padded);
    b.push(Operator::new(
        Op::Pad,
        PadAttribute {
            padding,
            pad_const_int: 0,
            pad_const_fp: 0.,
        },
        [input],
        [&pad_out],
    ));

    let attr = attribute(b, d, vec![0; 4])?;
    b.push(Operator::new(
        Op::AvgPool2d,
        attr,
        [pad_out],
        [b.output_name(0)],
    ));
    Ok(Op::AvgPool2d.name())
}

#[cfg(test)]
mod test {
    use crate::{LowerError, test_utils::*};
    use ir::{Attribute, Op, PadAttribute};
    use layer::{DataLayout, PaddingMethod, Pooling2dDescriptor, PoolingAlgorithm};

    fn desc(data_layout: DataLayout) -> Pooling2dDescriptor {
        Pooling2dDescriptor {
            pool_type: PoolingAlgorithm::Average,
            pad_left: 1,
            pad_right: 1,
            pad_top: 1,
            pad_bottom: 1,
            pool_width: 2,
            pool_height: 2,
            stride_x: 2,
            stride_y: 2,
            padding_method: PaddingMethod::IgnoreValue,
            data_layout,
        }
    }

    #[test]
    fn test_nchw() {
        let block = lowering()
            .assemble(
                &desc(DataLayout::Nchw).into(),
                &[f32t([1, 1, 4, 4])],
                &[f32t([1, 1, 3, 3])],
            )
            .unwrap();
        assert_eq!(block.operators.len(), 2);
        assert_eq!(block.tensors.len(), 3);

        let [pad, pool] = &*block.operators else {
            panic!()
        };
        assert_eq!(pad.op, Op::Pad);
        assert_eq!(pool.op, Op::AvgPool2d);
        assert_eq!(pad.inputs, block.inputs);
        assert_eq!(pool.outputs, block.outputs);
        assert_eq!(pad.outputs, pool.inputs);

        let mid = block.tensor(&pad.outputs[0]).unwrap();
        assert_eq!(mid.shape, [1, 1, 6, 6]);
        let out = block.tensor(&block.outputs[0]).unwrap();
        assert_eq!(out.shape, [1, 1, 3, 3]);

        assert_eq!(
            pad.attr,
            Attribute::Pad(PadAttribute {
                padding: vec![0, 0, 0, 0, 1, 1, 1, 1],
                pad_const_int: 0,
                pad_const_fp: 0.,
            })
        );
        let Attribute::Pool(attr) = &pool.attr else {
            panic!()
        };
        assert_eq!(attr.pad, [0, 0, 0, 0]);
        assert_eq!(attr.kernel, [2, 2]);
        assert_eq!(attr.stride, [2, 2]);
    }

    #[test]
    fn test_nhwc() {
        let d = Pooling2dDescriptor {
            pad_top: 0,
            pad_bottom: 2,
            ..desc(DataLayout::Nhwc)
        };
        let block = lowering()
            .assemble(&d.into(), &[f32t([1, 4, 5, 3])], &[f32t([1, 3, 3, 3])])
            .unwrap();
        let pad = &block.operators[0];
        let Attribute::Pad(attr) = &pad.attr else {
            panic!()
        };
        assert_eq!(attr.padding, [0, 0, 0, 2, 1, 1, 0, 0]);
        assert_eq!(block.tensor(&pad.outputs[0]).unwrap().shape, [1, 6, 7, 3]);
    }

    #[test]
    fn test_rank() {
        let e = lowering()
            .assemble(
                &desc(DataLayout::Nhwc).into(),
                &[f32t([4, 4])],
                &[f32t([3, 3])],
            )
            .unwrap_err();
        assert!(matches!(e, LowerError::Shape { .. }))
    }

    #[test]
    fn test_huge_padding() {
        let lowering = lowering();
        for d in [
            Pooling2dDescriptor {
                pad_top: u32::MAX,
                ..desc(DataLayout::Nhwc)
            },
            Pooling2dDescriptor {
                pad_left: i32::MAX as u32,
                ..desc(DataLayout::Nchw)
            },
        ] {
            let e = lowering
                .assemble(&d.into(), &[f32t([1, 4, 4, 1])], &[f32t([1, 3, 3, 1])])
                .unwrap_err();
            let LowerError::Shape { msg, .. } = e else {
                panic!("unexpected error {e:?}")
            };
            assert!(msg.contains("overflows"), "{msg}")
        }
    }
}
