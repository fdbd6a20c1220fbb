use crate::{Op, Operator, Tensor};
use std::collections::{HashMap, hash_map::Entry};
use thiserror::Error;

/// 基本块：一个计算图节点下降得到的直线型算子程序。
#[derive(Clone, PartialEq, Default, Debug)]
pub struct BasicBlock {
    pub name: String,
    pub operators: Vec<Operator>,
    pub tensors: Vec<Tensor>,
    pub inputs: Vec<String>,
    pub outputs: Vec<String>,
}

#[derive(Error, Clone, PartialEq, Eq, Debug)]
pub enum BlockError {
    #[error("tensor {0} is declared more than once")]
    DuplicateTensor(String),
    #[error("boundary tensor {0} is not owned by the block")]
    BoundaryNotOwned(String),
    #[error("boundary tensors are not declared in argument order")]
    BoundaryOrder,
    #[error("operator #{index} ({op}) references unknown tensor {name}")]
    Dangling { index: usize, op: Op, name: String },
    #[error("operator #{index} ({op}) reads {name} before it is produced")]
    ReadBeforeWrite { index: usize, op: Op, name: String },
    #[error("tensor {0} is produced more than once")]
    MultipleProducers(String),
    #[error("tensor {0} is never produced")]
    NeverProduced(String),
    #[error("tensor {0} is never consumed")]
    NeverConsumed(String),
    #[error("constant {name} holds {actual} bytes, expected {expected}")]
    ConstantSize {
        name: String,
        expected: usize,
        actual: usize,
    },
    #[error("operator #{index} ({op}) carries a mismatched attribute")]
    AttributeMismatch { index: usize, op: Op },
}

#[derive(Clone, Copy, PartialEq, Eq)]
enum State {
    Input,
    Pending,
    Produced { consumed: bool },
}

impl BasicBlock {
    /// 没有实现映射时返回的退化块：只有一个 `Op_UNKNOWN` 算子。
    pub fn unknown() -> Self {
        Self {
            operators: vec![Operator::unknown()],
            ..Default::default()
        }
    }

    pub fn is_unknown(&self) -> bool {
        matches!(&*self.operators, [op] if op.op == Op::Unknown) && self.tensors.is_empty()
    }

    pub fn tensor(&self, name: &str) -> Option<&Tensor> {
        self.tensors.iter().find(|t| t.name == name)
    }

    /// 校验块的封闭性与直线型程序约束。
    ///
    /// - 算子引用的名字都属于本块；
    /// - 块输入不被任何算子产生，其余张量恰好由一个更早的算子产生；
    /// - 非边界张量至少被一个更晚的算子消费；
    /// - 常量的字节数等于元素数乘以元素宽度。
    pub fn verify(&self) -> Result<(), BlockError> {
        let mut states = HashMap::with_capacity(self.tensors.len());
        for (i, t) in self.tensors.iter().enumerate() {
            match states.entry(&*t.name) {
                Entry::Vacant(entry) => {
                    entry.insert((i, State::Pending));
                }
                Entry::Occupied(_) => return Err(BlockError::DuplicateTensor(t.name.clone())),
            }
            if let Some(width) = t.dt.nbytes() {
                let expected = t.num_elements() * width;
                if t.is_constant() && t.data.len() != expected {
                    return Err(BlockError::ConstantSize {
                        name: t.name.clone(),
                        expected,
                        actual: t.data.len(),
                    });
                }
            }
        }

        for names in [&self.inputs, &self.outputs] {
            let mut last = None;
            for name in names {
                let Some(&(pos, _)) = states.get(&**name) else {
                    return Err(BlockError::BoundaryNotOwned(name.clone()));
                };
                if last.is_some_and(|last| pos < last) {
                    return Err(BlockError::BoundaryOrder);
                }
                last = Some(pos)
            }
        }
        for name in &self.inputs {
            if let Some((_, state)) = states.get_mut(&**name) {
                *state = State::Input
            }
        }

        for (index, op) in self.operators.iter().enumerate() {
            if !op.attr.fits(op.op) {
                return Err(BlockError::AttributeMismatch { index, op: op.op });
            }
            for name in &op.inputs {
                let Some((_, state)) = states.get_mut(&**name) else {
                    return Err(BlockError::Dangling {
                        index,
                        op: op.op,
                        name: name.clone(),
                    });
                };
                match state {
                    State::Input => {}
                    State::Pending => {
                        return Err(BlockError::ReadBeforeWrite {
                            index,
                            op: op.op,
                            name: name.clone(),
                        });
                    }
                    State::Produced { consumed } => *consumed = true,
                }
            }
            for name in &op.outputs {
                let Some((_, state)) = states.get_mut(&**name) else {
                    return Err(BlockError::Dangling {
                        index,
                        op: op.op,
                        name: name.clone(),
                    });
                };
                match state {
                    State::Pending => *state = State::Produced { consumed: false },
                    State::Input | State::Produced { .. } => {
                        return Err(BlockError::MultipleProducers(name.clone()));
                    }
                }
            }
        }

        for t in &self.tensors {
            let boundary_output = self.outputs.contains(&t.name);
            match states[&*t.name].1 {
                State::Input => {}
                State::Pending => return Err(BlockError::NeverProduced(t.name.clone())),
                State::Produced { consumed: false } if !boundary_output => {
                    return Err(BlockError::NeverConsumed(t.name.clone()));
                }
                State::Produced { .. } => {}
            }
        }
        Ok(())
    }
}
