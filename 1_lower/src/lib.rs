//! 把计算图节点下降为目标算子集的基本块。
//!
//! 能直接映射到单个目标算子的节点走一对一映射，
//! 其余有分解方案的节点展开为一段直线型算子程序，
//! 都不支持时产生只含一个 `Op_UNKNOWN` 的退化块。

mod assemble;
mod builder;
mod config;
mod error;
mod name;
mod one_to_many;
mod one_to_one;
mod rescale;

pub use assemble::Lowering;
pub use config::LowerConfig;
pub use error::LowerError;
pub use name::{Names, Role};
pub use rescale::{
    FixedPoint, RescaleFlags, create_raw_rescale, create_rescale, decode_scale, encode_scale16,
    encode_scale32,
};
pub use {ir, layer};

pub(crate) use builder::{BlockBuilder, dtype, shape, splat};

#[cfg(test)]
mod test_utils {
    use crate::{LowerConfig, Lowering};
    use ir::BasicBlock;
    use layer::{DataType, TensorDescriptor};

    pub fn lowering() -> Lowering {
        let _ = env_logger::builder().is_test(true).try_init();
        Lowering::new(LowerConfig {
            verify: true,
            layout_check: true,
        })
    }

    pub fn f32t(shape: impl IntoIterator<Item = u32>) -> TensorDescriptor {
        TensorDescriptor::new(DataType::Float32, shape)
    }

    pub fn qt(
        dt: DataType,
        shape: impl IntoIterator<Item = u32>,
        scale: f32,
        offset: i32,
    ) -> TensorDescriptor {
        TensorDescriptor::new(dt, shape).with_quant(scale, offset)
    }

    /// 一对一映射：一个算子，张量只有边界张量。
    pub fn assert_one_to_one(block: &BasicBlock, inputs: usize, outputs: usize) {
        assert_eq!(block.operators.len(), 1);
        assert_eq!(block.tensors.len(), inputs + outputs);
        assert_eq!(block.inputs.len(), inputs);
        assert_eq!(block.outputs.len(), outputs);
        assert_eq!(block.verify(), Ok(()));
    }
}
