//! 骨架实例
//!
//! 持有骨骼/插槽的运行时状态。姿态求值由外部 `PoseDriver` 完成，
//! 这里只负责设置姿态、世界变换和按名称的查询与修改。

use std::sync::Arc;

use crate::render::color::Color;

use super::attachment::Attachment;
use super::bone::Bone;
use super::data::SkeletonData;
use super::slot::Slot;

/// 骨架实例
#[derive(Clone, Debug)]
pub struct Skeleton {
    data: Arc<SkeletonData>,
    pub bones: Vec<Bone>,
    pub slots: Vec<Slot>,
    /// 绘制顺序（插槽索引，从后往前）
    draw_order: Vec<usize>,
    /// 当前皮肤在 `data.skins` 中的索引
    skin: Option<usize>,
    /// 骨架整体颜色
    pub color: Color,
    /// 骨架自身位置
    pub x: f32,
    pub y: f32,
    /// 累计时间
    pub time: f32,
}

impl Skeleton {
    /// 创建骨架并应用设置姿态
    pub fn new(data: Arc<SkeletonData>) -> Self {
        let bones = data.bones.iter().map(Bone::new).collect();
        let slots = data.slots.iter().map(Slot::new).collect();
        let draw_order = (0..data.slots.len()).collect();

        let mut skeleton = Self {
            data,
            bones,
            slots,
            draw_order,
            skin: None,
            color: Color::WHITE,
            x: 0.0,
            y: 0.0,
            time: 0.0,
        };
        skeleton.set_slots_to_setup_pose();
        skeleton.update_world_transform();
        skeleton
    }

    pub fn data(&self) -> &Arc<SkeletonData> {
        &self.data
    }

    /// 推进时间
    pub fn update(&mut self, delta_time: f32) {
        self.time += delta_time;
    }

    /// 按父先子后顺序计算所有骨骼的世界变换
    pub fn update_world_transform(&mut self) {
        for i in 0..self.bones.len() {
            let (before, rest) = self.bones.split_at_mut(i);
            let parent = rest[0].parent.and_then(|p| before.get(p));
            rest[0].update_world_transform(parent);
        }
    }

    pub fn set_to_setup_pose(&mut self) {
        self.set_bones_to_setup_pose();
        self.set_slots_to_setup_pose();
    }

    pub fn set_bones_to_setup_pose(&mut self) {
        for (bone, data) in self.bones.iter_mut().zip(self.data.bones.iter()) {
            bone.set_to_setup_pose(data);
        }
    }

    /// 恢复插槽颜色、附件和绘制顺序
    pub fn set_slots_to_setup_pose(&mut self) {
        self.draw_order = (0..self.slots.len()).collect();
        for i in 0..self.slots.len() {
            let data = Arc::clone(&self.data);
            let slot_data = &data.slots[i];
            let attachment = slot_data
                .attachment_name
                .as_deref()
                .and_then(|name| self.attachment_for_slot_index(i, name));
            let slot = &mut self.slots[i];
            slot.color = slot_data.color;
            slot.blend_mode = slot_data.blend_mode;
            slot.set_attachment(attachment);
        }
    }

    /// 当前绘制顺序
    pub fn draw_order(&self) -> &[usize] {
        &self.draw_order
    }

    /// 替换绘制顺序，必须是插槽索引的一个排列
    pub fn set_draw_order(&mut self, order: Vec<usize>) -> bool {
        if order.len() != self.slots.len() {
            return false;
        }
        let mut seen = vec![false; order.len()];
        for &i in &order {
            if i >= seen.len() || seen[i] {
                return false;
            }
            seen[i] = true;
        }
        self.draw_order = order;
        true
    }

    pub fn find_bone(&self, name: &str) -> Option<usize> {
        self.bones.iter().position(|b| b.name == name)
    }

    pub fn find_slot(&self, name: &str) -> Option<usize> {
        self.slots.iter().position(|s| s.name == name)
    }

    pub fn bone(&self, index: usize) -> Option<&Bone> {
        self.bones.get(index)
    }

    pub fn slot(&self, index: usize) -> Option<&Slot> {
        self.slots.get(index)
    }

    pub fn slot_mut(&mut self, index: usize) -> Option<&mut Slot> {
        self.slots.get_mut(index)
    }

    /// 当前皮肤名称
    pub fn skin_name(&self) -> Option<&str> {
        self.skin.map(|i| self.data.skins[i].name.as_str())
    }

    /// 按名称切换皮肤，`None` 表示不使用皮肤；找不到皮肤返回 false
    pub fn set_skin_by_name(&mut self, name: Option<&str>) -> bool {
        match name {
            None => {
                self.set_skin(None);
                true
            }
            Some(name) => match self.data.find_skin(name) {
                Some(index) => {
                    self.set_skin(Some(index));
                    true
                }
                None => false,
            },
        }
    }

    /// 切换皮肤
    ///
    /// 已有皮肤时：仍显示旧皮肤附件的插槽换成新皮肤中同名的附件。
    /// 没有皮肤时：每个插槽的设置附件若在新皮肤中存在则挂上。
    pub fn set_skin(&mut self, skin: Option<usize>) {
        let data = Arc::clone(&self.data);
        if let Some(new_index) = skin {
            let new_skin = &data.skins[new_index];
            match self.skin {
                Some(old_index) => {
                    for (slot_index, name, old_attachment) in data.skins[old_index].iter() {
                        let slot = &mut self.slots[slot_index];
                        let showing_old = slot
                            .attachment
                            .as_ref()
                            .is_some_and(|a| Arc::ptr_eq(a, old_attachment));
                        if showing_old {
                            if let Some(attachment) = new_skin.attachment(slot_index, name) {
                                slot.set_attachment(Some(Arc::clone(attachment)));
                            }
                        }
                    }
                }
                None => {
                    for (slot_index, slot_data) in data.slots.iter().enumerate() {
                        if let Some(name) = slot_data.attachment_name.as_deref() {
                            if let Some(attachment) = new_skin.attachment(slot_index, name) {
                                self.slots[slot_index].set_attachment(Some(Arc::clone(attachment)));
                            }
                        }
                    }
                }
            }
        }
        self.skin = skin;
    }

    /// 先查当前皮肤，再查默认皮肤
    pub fn attachment_for_slot_index(&self, slot_index: usize, name: &str) -> Option<Arc<Attachment>> {
        if let Some(skin) = self.skin.map(|i| &self.data.skins[i]) {
            if let Some(attachment) = skin.attachment(slot_index, name) {
                return Some(Arc::clone(attachment));
            }
        }
        self.data
            .default_skin
            .as_ref()
            .and_then(|skin| skin.attachment(slot_index, name))
            .cloned()
    }

    pub fn attachment_for_slot_name(&self, slot_name: &str, name: &str) -> Option<Arc<Attachment>> {
        let slot_index = self.find_slot(slot_name)?;
        self.attachment_for_slot_index(slot_index, name)
    }

    /// 设置插槽附件，`None` 清空；插槽或附件不存在返回 false
    pub fn set_attachment(&mut self, slot_name: &str, attachment_name: Option<&str>) -> bool {
        let Some(slot_index) = self.find_slot(slot_name) else {
            return false;
        };
        match attachment_name {
            None => {
                self.slots[slot_index].set_attachment(None);
                true
            }
            Some(name) => match self.attachment_for_slot_index(slot_index, name) {
                Some(attachment) => {
                    self.slots[slot_index].set_attachment(Some(attachment));
                    true
                }
                None => false,
            },
        }
    }
}
