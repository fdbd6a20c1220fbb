use crate::{
    BlockBuilder, LowerConfig, LowerError, builder::destruct, dtype,
    one_to_one::conv::{check_layout, emit_conv2d, emit_transpose_conv2d},
    shape,
};
use ir::DType;
use layer::{Convolution2dDescriptor, DataLayout, DataType, TransposeConvolution2dDescriptor};

/// 无偏置卷积：补一个全零偏置常量再卷积。
pub(super) fn conv2d(
    b: &mut BlockBuilder,
    d: &Convolution2dDescriptor,
    config: &LowerConfig,
) -> Result<&'static str, LowerError> {
    destruct!(b, "input", [_x, _w] = b.inputs());
    check_layout(b, d.data_layout, config)?;
    let bias = zero_bias(b, d.data_layout)?;
    emit_conv2d(b, d, config, bias)
}

pub(super) fn transpose_conv2d(
    b: &mut BlockBuilder,
    d: &TransposeConvolution2dDescriptor,
    config: &LowerConfig,
) -> Result<&'static str, LowerError> {
    destruct!(b, "input", [_x, _w] = b.inputs());
    check_layout(b, d.data_layout, config)?;
    let bias = zero_bias(b, d.data_layout)?;
    emit_transpose_conv2d(b, d, config, bias)
}

/// 形状为输出通道数的零偏置。8 位输入累加到 INT32，16 位输入累加到 INT48。
fn zero_bias(b: &mut BlockBuilder, layout: DataLayout) -> Result<String, LowerError> {
    destruct!(b, "output", [y] = b.outputs());
    let channel = match layout {
        DataLayout::Nhwc => y.rank().checked_sub(1),
        DataLayout::Nchw => Some(1).filter(|&c| c < y.rank()),
    };
    let Some(&channels) = channel.and_then(|c| y.shape.get(c)) else {
        return Err(b.shape_error("output has no channel dimension"));
    };

    let (dt, width) = match b.inputs()[0].dt {
        dt if dt.is_quantized_8bit() => (DType::Int32, 4),
        DataType::QSymmS16 => (DType::Int48, 6),
        _ => {
            let dt = dtype(y.dt);
            let layer = b.layer();
            let width = dt
                .nbytes()
                .ok_or(LowerError::DataType { layer, dt: y.dt })?;
            (dt, width)
        }
    };
    let data = vec![0; channels as usize * width];
    Ok(b.constant(dt, shape(&[channels])?, data))
}
