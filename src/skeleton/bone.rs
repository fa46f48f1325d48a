//! 骨骼节点
//!
//! 世界变换由 2x2 线性部分 (m00, m01, m10, m11) 和世界平移 (world_x, world_y) 组成。
//! 骨骼按父先子后的顺序存放，世界变换一次顺序遍历即可算完。

use serde::{Deserialize, Serialize};

/// 骨骼设置姿态数据（只读，由骨骼数据共享）
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct BoneData {
    /// 骨骼名称
    pub name: String,
    /// 父骨骼索引（None 表示根骨骼）
    pub parent: Option<usize>,
    /// 骨骼长度（沿局部 X 轴）
    pub length: f32,
    pub x: f32,
    pub y: f32,
    /// 旋转（角度）
    pub rotation: f32,
    pub scale_x: f32,
    pub scale_y: f32,
    /// 是否继承父骨骼缩放
    pub inherit_scale: bool,
    /// 是否继承父骨骼旋转
    pub inherit_rotation: bool,
}

impl BoneData {
    pub fn new(name: impl Into<String>, parent: Option<usize>) -> Self {
        Self {
            name: name.into(),
            parent,
            length: 0.0,
            x: 0.0,
            y: 0.0,
            rotation: 0.0,
            scale_x: 1.0,
            scale_y: 1.0,
            inherit_scale: true,
            inherit_rotation: true,
        }
    }

    pub fn with_length(mut self, length: f32) -> Self {
        self.length = length;
        self
    }

    pub fn with_position(mut self, x: f32, y: f32) -> Self {
        self.x = x;
        self.y = y;
        self
    }

    pub fn with_rotation(mut self, degrees: f32) -> Self {
        self.rotation = degrees;
        self
    }

    pub fn with_scale(mut self, scale_x: f32, scale_y: f32) -> Self {
        self.scale_x = scale_x;
        self.scale_y = scale_y;
        self
    }
}

/// 运行时骨骼
#[derive(Clone, Debug)]
pub struct Bone {
    /// 骨骼名称
    pub name: String,
    /// 父骨骼索引
    pub parent: Option<usize>,
    pub length: f32,

    // 局部姿态（由姿态驱动器修改）
    pub x: f32,
    pub y: f32,
    pub rotation: f32,
    pub scale_x: f32,
    pub scale_y: f32,
    pub inherit_scale: bool,
    pub inherit_rotation: bool,

    // 世界变换（由 update_world_transform 计算）
    pub world_x: f32,
    pub world_y: f32,
    pub world_rotation: f32,
    pub world_scale_x: f32,
    pub world_scale_y: f32,
    pub m00: f32,
    pub m01: f32,
    pub m10: f32,
    pub m11: f32,
}

impl Bone {
    /// 从设置姿态创建骨骼
    pub fn new(data: &BoneData) -> Self {
        let mut bone = Self {
            name: data.name.clone(),
            parent: data.parent,
            length: data.length,
            x: 0.0,
            y: 0.0,
            rotation: 0.0,
            scale_x: 1.0,
            scale_y: 1.0,
            inherit_scale: true,
            inherit_rotation: true,
            world_x: 0.0,
            world_y: 0.0,
            world_rotation: 0.0,
            world_scale_x: 1.0,
            world_scale_y: 1.0,
            m00: 1.0,
            m01: 0.0,
            m10: 0.0,
            m11: 1.0,
        };
        bone.set_to_setup_pose(data);
        bone
    }

    /// 恢复设置姿态
    pub fn set_to_setup_pose(&mut self, data: &BoneData) {
        self.x = data.x;
        self.y = data.y;
        self.rotation = data.rotation;
        self.scale_x = data.scale_x;
        self.scale_y = data.scale_y;
        self.inherit_scale = data.inherit_scale;
        self.inherit_rotation = data.inherit_rotation;
    }

    /// 是否为根骨骼
    pub fn is_root(&self) -> bool {
        self.parent.is_none()
    }

    /// 根据父骨骼计算世界变换
    pub fn update_world_transform(&mut self, parent: Option<&Bone>) {
        match parent {
            Some(parent) => {
                self.world_x = self.x * parent.m00 + self.y * parent.m01 + parent.world_x;
                self.world_y = self.x * parent.m10 + self.y * parent.m11 + parent.world_y;
                if self.inherit_scale {
                    self.world_scale_x = parent.world_scale_x * self.scale_x;
                    self.world_scale_y = parent.world_scale_y * self.scale_y;
                } else {
                    self.world_scale_x = self.scale_x;
                    self.world_scale_y = self.scale_y;
                }
                self.world_rotation = if self.inherit_rotation {
                    parent.world_rotation + self.rotation
                } else {
                    self.rotation
                };
            }
            None => {
                self.world_x = self.x;
                self.world_y = self.y;
                self.world_scale_x = self.scale_x;
                self.world_scale_y = self.scale_y;
                self.world_rotation = self.rotation;
            }
        }

        let (sine, cosine) = self.world_rotation.to_radians().sin_cos();
        self.m00 = cosine * self.world_scale_x;
        self.m10 = sine * self.world_scale_x;
        self.m01 = -sine * self.world_scale_y;
        self.m11 = cosine * self.world_scale_y;
    }

    /// 骨骼末端的世界坐标（不含骨架自身位置）
    pub fn tip(&self) -> (f32, f32) {
        (
            self.length * self.m00 + self.world_x,
            self.length * self.m10 + self.world_y,
        )
    }
}
