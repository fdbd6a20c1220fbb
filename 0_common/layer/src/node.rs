use crate::{LayerDescriptor, LayerType, TensorDescriptor};

/// 连接的另一端：层种类、层标识和该层上的槽位序号。
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug)]
pub struct Endpoint {
    pub ty: LayerType,
    pub guid: u64,
    pub slot: u32,
}

/// 输入槽，`source` 是产生该张量的输出槽。
#[derive(Clone, PartialEq, Debug)]
pub struct InputSlot {
    pub info: TensorDescriptor,
    pub source: Endpoint,
}

/// 输出槽，`target` 是第一个消费者，悬空时为 `None`。
#[derive(Clone, PartialEq, Debug)]
pub struct OutputSlot {
    pub info: TensorDescriptor,
    pub target: Option<Endpoint>,
}

/// 计算图节点的只读视图。
pub trait GraphNode {
    fn guid(&self) -> u64;
    fn descriptor(&self) -> &LayerDescriptor;
    fn inputs(&self) -> &[InputSlot];
    fn outputs(&self) -> &[OutputSlot];

    /// 第 `i` 个输入张量的名字，由生产者决定，相邻的基本块据此连接。
    fn input_name(&self, i: usize) -> Option<String> {
        let Endpoint { ty, guid, slot } = self.inputs().get(i)?.source;
        Some(match ty {
            LayerType::Input => format!("input{slot}_{guid}"),
            LayerType::Constant => format!("constant_{guid}"),
            _ => format!("intermediate{slot}_{guid}"),
        })
    }

    /// 第 `i` 个输出张量的名字。消费者是输出层时使用输出层的标识。
    fn output_name(&self, i: usize) -> Option<String> {
        let slot = self.outputs().get(i)?;
        Some(match slot.target {
            Some(Endpoint {
                ty: LayerType::Output,
                guid,
                ..
            }) => format!("output{i}_{guid}"),
            _ => format!("intermediate{i}_{}", self.guid()),
        })
    }
}

/// [`GraphNode`] 的简单实现，持有自己的全部连接信息。
#[derive(Clone, PartialEq, Debug)]
pub struct Layer {
    pub guid: u64,
    pub descriptor: LayerDescriptor,
    pub inputs: Vec<InputSlot>,
    pub outputs: Vec<OutputSlot>,
}

impl Layer {
    pub fn new(guid: u64, descriptor: impl Into<LayerDescriptor>) -> Self {
        Self {
            guid,
            descriptor: descriptor.into(),
            inputs: Vec::new(),
            outputs: Vec::new(),
        }
    }

    pub fn input(mut self, info: TensorDescriptor, source: Endpoint) -> Self {
        self.inputs.push(InputSlot { info, source });
        self
    }

    pub fn output(mut self, info: TensorDescriptor, target: Option<Endpoint>) -> Self {
        self.outputs.push(OutputSlot { info, target });
        self
    }
}

impl GraphNode for Layer {
    #[inline]
    fn guid(&self) -> u64 {
        self.guid
    }

    #[inline]
    fn descriptor(&self) -> &LayerDescriptor {
        &self.descriptor
    }

    #[inline]
    fn inputs(&self) -> &[InputSlot] {
        &self.inputs
    }

    #[inline]
    fn outputs(&self) -> &[OutputSlot] {
        &self.outputs
    }
}

#[cfg(test)]
mod test {
    use super::{Endpoint, GraphNode, Layer};
    use crate::{BinaryOperation, DataType, LayerDescriptor, LayerType, TensorDescriptor};

    fn endpoint(ty: LayerType, guid: u64, slot: u32) -> Endpoint {
        Endpoint { ty, guid, slot }
    }

    #[test]
    fn test_names() {
        let t = || TensorDescriptor::new(DataType::Float32, [1, 4]);
        let layer = Layer::new(7, LayerDescriptor::ElementwiseBinary(BinaryOperation::Add))
            .input(t(), endpoint(LayerType::Input, 1, 0))
            .input(t(), endpoint(LayerType::Splitter, 5, 2))
            .output(t(), Some(endpoint(LayerType::Output, 9, 0)))
            .output(t(), Some(endpoint(LayerType::Floor, 8, 0)))
            .output(t(), None);

        assert_eq!(layer.descriptor().layer_type(), LayerType::ElementwiseBinary);
        assert_eq!(layer.input_name(0).as_deref(), Some("input0_1"));
        assert_eq!(layer.input_name(1).as_deref(), Some("intermediate2_5"));
        assert_eq!(layer.input_name(2), None);
        assert_eq!(layer.output_name(0).as_deref(), Some("output0_9"));
        assert_eq!(layer.output_name(1).as_deref(), Some("intermediate1_7"));
        assert_eq!(layer.output_name(2).as_deref(), Some("intermediate2_7"));
    }

    #[test]
    fn test_constant_source() {
        let layer = Layer::new(3, LayerDescriptor::Floor).input(
            TensorDescriptor::new(DataType::Float32, [2]),
            endpoint(LayerType::Constant, 2, 0),
        );
        assert_eq!(layer.input_name(0).as_deref(), Some("constant_2"));
    }
}
