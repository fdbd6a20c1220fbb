use crate::{
    LowerError,
    name::{Names, Role},
};
use half::{bf16, f16};
use ir::{BasicBlock, DType, Op, Operator, Tensor};
use itertools::Itertools;
use layer::{DataType, LayerType, TensorDescriptor};
use log::trace;

/// 计算图数据类型到目标 IR 数据类型。没有对应类型的映射为 `Unknown`。
pub fn dtype(dt: DataType) -> DType {
    match dt {
        DataType::Float16 => DType::Fp16,
        DataType::BFloat16 => DType::Bf16,
        DataType::Float32 => DType::Fp32,
        DataType::QAsymmU8 => DType::Uint8,
        DataType::QAsymmS8 | DataType::QSymmS8 => DType::Int8,
        DataType::QSymmS16 => DType::Int16,
        DataType::Signed32 => DType::Int32,
        DataType::Boolean => DType::Bool,
        DataType::Signed64 => DType::Unknown,
    }
}

/// 无符号形状转为目标 IR 的有符号形状。
pub fn shape(dims: &[u32]) -> Result<Vec<i32>, LowerError> {
    dims.iter()
        .map(|&d| i32::try_from(d).map_err(|_| LowerError::DimOverflow(d)))
        .collect()
}

/// 把 `value` 按 `dt` 编码 `n` 次，得到常量张量的字节。
pub fn splat(dt: DType, value: f64, n: usize) -> Option<Vec<u8>> {
    let one = match dt {
        DType::Fp32 => (value as f32).to_le_bytes().to_vec(),
        DType::Fp16 => f16::from_f64(value).to_le_bytes().to_vec(),
        DType::Bf16 => bf16::from_f64(value).to_le_bytes().to_vec(),
        DType::Int32 => (value as i32).to_le_bytes().to_vec(),
        DType::Int16 => (value as i16).to_le_bytes().to_vec(),
        DType::Uint16 => (value as u16).to_le_bytes().to_vec(),
        DType::Int8 => (value as i8).to_le_bytes().to_vec(),
        DType::Uint8 | DType::Bool => (value as u8).to_le_bytes().to_vec(),
        DType::Unknown | DType::Int4 | DType::Int48 => return None,
    };
    Some(one.repeat(n))
}

/// 检查张量个数并按位置解构。
macro_rules! destruct {
    ($b:expr, $what:literal, [$( $name:ident ),+] = $slice:expr) => {
        let slice = $slice;
        let [$( $name ),+] = slice else {
            return Err($crate::LowerError::Arity {
                layer: $b.layer(),
                what: $what,
                expected: [$( stringify!($name) ),+].len(),
                got: slice.len(),
            });
        };
    };
}

pub(crate) use destruct;

/// 一个基本块的构造现场。
///
/// 构造时即登记所有边界张量：先输入后输出，各自保持节点上的顺序。
/// 之后的中间张量和常量按产生顺序追加。
pub struct BlockBuilder<'a> {
    names: &'a Names,
    layer: LayerType,
    inputs: &'a [TensorDescriptor],
    outputs: &'a [TensorDescriptor],
    input_names: Vec<String>,
    output_names: Vec<String>,
    operators: Vec<Operator>,
    tensors: Vec<Tensor>,
    intermediates: usize,
}

impl<'a> BlockBuilder<'a> {
    pub fn new(
        names: &'a Names,
        layer: LayerType,
        inputs: &'a [TensorDescriptor],
        outputs: &'a [TensorDescriptor],
        input_names: Vec<String>,
        output_names: Vec<String>,
    ) -> Result<Self, LowerError> {
        debug_assert_eq!(inputs.len(), input_names.len());
        debug_assert_eq!(outputs.len(), output_names.len());

        let mut tensors = Vec::<Tensor>::with_capacity(inputs.len() + outputs.len());
        for (desc, name) in inputs
            .iter()
            .zip(&input_names)
            .chain(outputs.iter().zip(&output_names))
        {
            // 同一个生产者可能连到多个输入槽
            if tensors.iter().any(|t| t.name == *name) {
                continue;
            }
            tensors.push(Tensor::new(name, dtype(desc.dt), shape(&desc.shape)?))
        }

        Ok(Self {
            names,
            layer,
            inputs,
            outputs,
            input_names,
            output_names,
            operators: Vec::new(),
            tensors,
            intermediates: 0,
        })
    }

    #[inline]
    pub fn layer(&self) -> LayerType {
        self.layer
    }

    #[inline]
    pub fn inputs(&self) -> &'a [TensorDescriptor] {
        self.inputs
    }

    #[inline]
    pub fn outputs(&self) -> &'a [TensorDescriptor] {
        self.outputs
    }

    #[inline]
    pub fn input_name(&self, i: usize) -> String {
        self.input_names[i].clone()
    }

    #[inline]
    pub fn output_name(&self, i: usize) -> String {
        self.output_names[i].clone()
    }

    /// 把常量数据写入边界上的输出张量。
    pub fn fill_output(&mut self, i: usize, data: Vec<u8>) {
        let name = &self.output_names[i];
        if let Some(t) = self.tensors.iter_mut().find(|t| t.name == *name) {
            t.data = data
        }
    }

    /// 登记一个中间张量，返回它的名字。
    pub fn intermediate(&mut self, dt: DType, shape: impl Into<Vec<i32>>) -> String {
        let name = self.names.fresh(Role::Intermediate(self.intermediates));
        self.intermediates += 1;
        self.tensors.push(Tensor::new(&name, dt, shape));
        name
    }

    /// 登记一个常量张量并发射产生它的 CONST 算子，返回它的名字。
    pub fn constant(&mut self, dt: DType, shape: impl Into<Vec<i32>>, data: Vec<u8>) -> String {
        let name = self.names.fresh(Role::Constant);
        self.tensors.push(Tensor::constant(&name, dt, shape, data));
        self.push(Operator::new(Op::Const, (), [] as [&str; 0], [&name]));
        name
    }

    /// 所有维度为 1 的 INT32 标量常量。
    pub fn scalar_i32(&mut self, rank: usize, value: i32) -> String {
        self.constant(DType::Int32, vec![1; rank], value.to_le_bytes().to_vec())
    }

    pub fn push(&mut self, op: Operator) {
        trace!(
            "{} ({}) -> ({})",
            op.op,
            op.inputs.iter().join(", "),
            op.outputs.iter().join(", "),
        );
        self.operators.push(op)
    }

    pub fn finish(self, tag: &'static str) -> BasicBlock {
        BasicBlock {
            name: self.names.fresh(Role::Block(tag)),
            operators: self.operators,
            tensors: self.tensors,
            inputs: self.input_names,
            outputs: self.output_names,
        }
    }

    pub fn shape_error(&self, msg: impl Into<String>) -> LowerError {
        LowerError::Shape {
            layer: self.layer,
            msg: msg.into(),
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_dtype() {
        assert_eq!(dtype(DataType::QAsymmU8), DType::Uint8);
        assert_eq!(dtype(DataType::QSymmS8), DType::Int8);
        assert_eq!(dtype(DataType::Signed64), DType::Unknown);
        assert_eq!(dtype(DataType::Boolean), DType::Bool);
    }

    #[test]
    fn test_shape() {
        assert_eq!(shape(&[1, 2, 3]), Ok(vec![1, 2, 3]));
        assert_eq!(shape(&[u32::MAX]), Err(LowerError::DimOverflow(u32::MAX)));
    }

    #[test]
    fn test_splat() {
        assert_eq!(splat(DType::Fp32, 0.5, 2), Some([0, 0, 0, 0x3f].repeat(2)));
        assert_eq!(splat(DType::Fp16, 1., 1), Some(vec![0x00, 0x3c]));
        assert_eq!(splat(DType::Int32, -1., 1), Some(vec![0xff; 4]));
        assert_eq!(splat(DType::Int48, 0., 1), None);
    }

    #[test]
    fn test_builder() {
        let names = Names::new();
        let x = [TensorDescriptor::new(DataType::Float32, [1, 4])];
        let y = [TensorDescriptor::new(DataType::Float32, [1, 4])];
        let mut b = BlockBuilder::new(
            &names,
            LayerType::Floor,
            &x,
            &y,
            vec!["x".into()],
            vec!["y".into()],
        )
        .unwrap();

        let c = b.scalar_i32(2, 3);
        let t = b.intermediate(DType::Fp32, [1, 4]);
        assert!(c.starts_with("constant_"));
        assert!(t.starts_with("intermediate0_"));
        b.push(Operator::new(Op::Add, (), ["x", &*c], [&*t]));
        b.push(Operator::new(Op::Sub, (), [&*t, &*c], ["y"]));

        let block = b.finish("Op_TEST");
        assert!(block.name.starts_with("Op_TEST_block_"));
        assert_eq!(block.operators.len(), 3);
        assert_eq!(block.tensors.len(), 4);
        assert_eq!(block.verify(), Ok(()));
    }

    #[test]
    fn test_shared_input() {
        let names = Names::new();
        let x = [
            TensorDescriptor::new(DataType::Float32, [2]),
            TensorDescriptor::new(DataType::Float32, [2]),
        ];
        let y = [TensorDescriptor::new(DataType::Float32, [2])];
        let b = BlockBuilder::new(
            &names,
            LayerType::ElementwiseBinary,
            &x,
            &y,
            vec!["x".into(), "x".into()],
            vec!["y".into()],
        )
        .unwrap();
        assert_eq!(b.tensors.len(), 2)
    }
}
