use super::instance::Skeleton;

/// 姿态驱动器
///
/// 外部动画系统在每帧世界变换之前修改骨骼局部姿态、插槽颜色/附件和绘制顺序。
/// 闭包 `FnMut(&mut Skeleton, f32)` 也可以直接作为驱动器使用。
pub trait PoseDriver {
    /// 应用 `delta_time`（已乘以时间缩放）后的姿态
    fn apply(&mut self, skeleton: &mut Skeleton, delta_time: f32);
}

impl<F> PoseDriver for F
where
    F: FnMut(&mut Skeleton, f32),
{
    fn apply(&mut self, skeleton: &mut Skeleton, delta_time: f32) {
        self(skeleton, delta_time)
    }
}
