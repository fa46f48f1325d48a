use crate::impl_default;
use serde::{Deserialize, Serialize};

/// 调试绘制配置
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DebugConfig {
    /// 绘制插槽四边形轮廓
    pub slots: bool,

    /// 绘制骨骼线段和原点
    pub bones: bool,
}

impl_default!(DebugConfig {
    slots: false,
    bones: false,
});
