//! 计算图一侧的词汇：层种类、层参数和张量描述。
//!
//! 图的存储与形状推导不在这里，下降只通过 [`GraphNode`] 读取一个节点。

mod descriptor;
mod node;
mod tensor;

pub use descriptor::*;
pub use node::{Endpoint, GraphNode, InputSlot, Layer, OutputSlot};
pub use tensor::{DataType, Quantization, TensorDescriptor};
