//! 目标算子集 IR 的内存表示。
//!
//! 一个 [`BasicBlock`] 对应计算图中一个节点的下降结果，
//! 由按执行顺序排列的 [`Operator`] 和它拥有的全部 [`Tensor`] 组成。

mod attribute;
mod block;
mod dtype;
mod op;

pub use attribute::*;
pub use block::{BasicBlock, BlockError};
pub use dtype::DType;
pub use op::Op;

/// 目标 IR 张量。`data` 仅在张量是物化的常量时非空。
#[derive(Clone, PartialEq, Eq, Debug)]
pub struct Tensor {
    pub name: String,
    pub dt: DType,
    pub shape: Vec<i32>,
    pub data: Vec<u8>,
}

impl Tensor {
    pub fn new(name: impl Into<String>, dt: DType, shape: impl Into<Vec<i32>>) -> Self {
        Self {
            name: name.into(),
            dt,
            shape: shape.into(),
            data: Vec::new(),
        }
    }

    pub fn constant(
        name: impl Into<String>,
        dt: DType,
        shape: impl Into<Vec<i32>>,
        data: Vec<u8>,
    ) -> Self {
        Self {
            data,
            ..Self::new(name, dt, shape)
        }
    }

    /// 元素数量，负维度按 0 计。
    pub fn num_elements(&self) -> usize {
        self.shape.iter().map(|&d| d.max(0) as usize).product()
    }

    #[inline]
    pub fn is_constant(&self) -> bool {
        !self.data.is_empty()
    }
}

/// 目标 IR 算子，通过名字引用同一基本块中的张量。
#[derive(Clone, PartialEq, Debug)]
pub struct Operator {
    pub op: Op,
    pub attr: Attribute,
    pub inputs: Vec<String>,
    pub outputs: Vec<String>,
}

impl Operator {
    pub fn new<I, O>(op: Op, attr: impl Into<Attribute>, inputs: I, outputs: O) -> Self
    where
        I: IntoIterator,
        I::Item: Into<String>,
        O: IntoIterator,
        O::Item: Into<String>,
    {
        let attr = attr.into();
        debug_assert!(attr.fits(op), "{op} does not take {attr:?}");
        Self {
            op,
            attr,
            inputs: inputs.into_iter().map(Into::into).collect(),
            outputs: outputs.into_iter().map(Into::into).collect(),
        }
    }

    /// 未实现映射的占位算子。
    pub fn unknown() -> Self {
        Self {
            op: Op::Unknown,
            attr: Attribute::None,
            inputs: Vec::new(),
            outputs: Vec::new(),
        }
    }
}
