use crate::{BlockBuilder, LowerConfig, LowerError, Names, Role, one_to_many, one_to_one};
use ir::BasicBlock;
use layer::{GraphNode, LayerDescriptor, TensorDescriptor};
use log::{debug, warn};

/// 下降引擎：持有名字分配器和配置，可在多个线程间共享。
#[derive(Default, Debug)]
pub struct Lowering {
    names: Names,
    config: LowerConfig,
}

impl Lowering {
    pub const fn new(config: LowerConfig) -> Self {
        Self {
            names: Names::new(),
            config,
        }
    }

    #[inline]
    pub fn names(&self) -> &Names {
        &self.names
    }

    #[inline]
    pub fn config(&self) -> &LowerConfig {
        &self.config
    }

    /// 用显式描述符下降一个节点。边界张量名由分配器产生。
    pub fn assemble(
        &self,
        desc: &LayerDescriptor,
        inputs: &[TensorDescriptor],
        outputs: &[TensorDescriptor],
    ) -> Result<BasicBlock, LowerError> {
        let input_names = (0..inputs.len())
            .map(|i| self.names.fresh(Role::Input(i)))
            .collect();
        let output_names = (0..outputs.len())
            .map(|i| self.names.fresh(Role::Output(i)))
            .collect();
        self.lower(desc, inputs, outputs, input_names, output_names)
    }

    /// 下降计算图中的一个节点。边界张量名由节点的连接决定，相邻的块按名字衔接。
    pub fn assemble_node(&self, node: &impl GraphNode) -> Result<BasicBlock, LowerError> {
        let inputs = node
            .inputs()
            .iter()
            .map(|slot| slot.info.clone())
            .collect::<Vec<_>>();
        let outputs = node
            .outputs()
            .iter()
            .map(|slot| slot.info.clone())
            .collect::<Vec<_>>();
        let input_names = (0..inputs.len())
            .filter_map(|i| node.input_name(i))
            .collect();
        let output_names = (0..outputs.len())
            .filter_map(|i| node.output_name(i))
            .collect();
        self.lower(
            node.descriptor(),
            &inputs,
            &outputs,
            input_names,
            output_names,
        )
    }

    fn lower(
        &self,
        desc: &LayerDescriptor,
        inputs: &[TensorDescriptor],
        outputs: &[TensorDescriptor],
        input_names: Vec<String>,
        output_names: Vec<String>,
    ) -> Result<BasicBlock, LowerError> {
        let layer = desc.layer_type();
        let mut b = BlockBuilder::new(
            &self.names,
            layer,
            inputs,
            outputs,
            input_names,
            output_names,
        )?;

        let tag = match one_to_one::lower(&mut b, desc, &self.config)? {
            Some(tag) => tag,
            None => match one_to_many::lower(&mut b, desc, &self.config)? {
                Some(tag) => tag,
                None => {
                    warn!("{layer} has no lowering, emit unknown block");
                    return Ok(BasicBlock::unknown());
                }
            },
        };

        let block = b.finish(tag);
        debug!(
            "{layer} -> {}: {} operators, {} tensors",
            block.name,
            block.operators.len(),
            block.tensors.len(),
        );
        if self.config.verify {
            block.verify()?
        }
        Ok(block)
    }
}
