use crate::{BlockBuilder, LowerConfig, LowerError, builder::destruct, shape};
use ir::{ConvAttribute, Op, Operator, TransposeConvAttribute};
use layer::{Convolution2dDescriptor, DataLayout, TransposeConvolution2dDescriptor};

pub(super) fn conv2d(
    b: &mut BlockBuilder,
    d: &Convolution2dDescriptor,
    config: &LowerConfig,
) -> Result<&'static str, LowerError> {
    destruct!(b, "input", [_x, _w, _bias] = b.inputs());
    let bias = b.input_name(2);
    emit_conv2d(b, d, config, bias)
}

pub(super) fn transpose_conv2d(
    b: &mut BlockBuilder,
    d: &TransposeConvolution2dDescriptor,
    config: &LowerConfig,
) -> Result<&'static str, LowerError> {
    destruct!(b, "input", [_x, _w, _bias] = b.inputs());
    let bias = b.input_name(2);
    emit_transpose_conv2d(b, d, config, bias)
}

/// 发射 CONV2D，偏置由调用者提供。
pub(crate) fn emit_conv2d(
    b: &mut BlockBuilder,
    d: &Convolution2dDescriptor,
    config: &LowerConfig,
    bias: String,
) -> Result<&'static str, LowerError> {
    check_layout(b, d.data_layout, config)?;
    let [x, w, ..] = b.inputs() else {
        return Err(arity(b));
    };
    destruct!(b, "output", [_y] = b.outputs());

    let attr = ConvAttribute {
        pad: shape(&[d.pad_top, d.pad_bottom, d.pad_left, d.pad_right])?,
        stride: shape(&[d.stride_y, d.stride_x])?,
        dilation: shape(&[d.dilation_y, d.dilation_x])?,
        input_zp: x.offset(),
        weight_zp: w.offset(),
    };
    b.push(Operator::new(
        Op::Conv2d,
        attr,
        [b.input_name(0), b.input_name(1), bias],
        [b.output_name(0)],
    ));
    Ok(Op::Conv2d.name())
}

/// 发射 TRANSPOSE_CONV2D。输出填充取描述符填充的相反数。
pub(crate) fn emit_transpose_conv2d(
    b: &mut BlockBuilder,
    d: &TransposeConvolution2dDescriptor,
    config: &LowerConfig,
    bias: String,
) -> Result<&'static str, LowerError> {
    check_layout(b, d.data_layout, config)?;
    let [x, w, ..] = b.inputs() else {
        return Err(arity(b));
    };
    destruct!(b, "output", [y] = b.outputs());

    let out_pad = shape(&[d.pad_top, d.pad_bottom, d.pad_left, d.pad_right])?
        .into_iter()
        .map(|p| -p)
        .collect();
    let output_shape = if d.output_shape.is_empty() {
        shape(&y.shape)?
    } else {
        shape(&d.output_shape)?
    };
    let attr = TransposeConvAttribute {
        out_pad,
        stride: shape(&[d.stride_y, d.stride_x])?,
        output_shape,
        input_zp: x.offset(),
        weight_zp: w.offset(),
    };
    b.push(Operator::new(
        Op::TransposeConv2d,
        attr,
        [b.input_name(0), b.input_name(1), bias],
        [b.output_name(0)],
    ));
    Ok(Op::TransposeConv2d.name())
}

/// 开启布局检查时只接受 NHWC。
pub(crate) fn check_layout(
    b: &BlockBuilder,
    layout: DataLayout,
    config: &LowerConfig,
) -> Result<(), LowerError> {
    if config.layout_check && layout != DataLayout::Nhwc {
        Err(LowerError::DataLayout { layer: b.layer() })
    } else {
        Ok(())
    }
}

fn arity(b: &BlockBuilder) -> LowerError {
    LowerError::Arity {
        layer: b.layer(),
        what: "input",
        expected: 2,
        got: b.inputs().len(),
    }
}
