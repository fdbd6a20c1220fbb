/// 下降的可调项。
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub struct LowerConfig {
    /// 对每个产出的基本块执行 [`ir::BasicBlock::verify`]
    pub verify: bool,
    /// 卷积类节点只接受 NHWC 布局
    pub layout_check: bool,
}

impl Default for LowerConfig {
    fn default() -> Self {
        Self {
            verify: cfg!(debug_assertions),
            layout_check: true,
        }
    }
}
