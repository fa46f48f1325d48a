use std::collections::HashMap;
use std::sync::Arc;

use super::attachment::Attachment;

/// 皮肤：按 (插槽索引, 附件名) 查找附件
#[derive(Clone, Debug, Default)]
pub struct Skin {
    pub name: String,
    attachments: HashMap<(usize, String), Arc<Attachment>>,
}

impl Skin {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            attachments: HashMap::new(),
        }
    }

    /// 添加附件，同名覆盖
    pub fn add_attachment(&mut self, slot_index: usize, name: impl Into<String>, attachment: Attachment) {
        self.attachments
            .insert((slot_index, name.into()), Arc::new(attachment));
    }

    pub fn attachment(&self, slot_index: usize, name: &str) -> Option<&Arc<Attachment>> {
        self.attachments.get(&(slot_index, name.to_string()))
    }

    /// 遍历 (插槽索引, 附件名, 附件)
    pub fn iter(&self) -> impl Iterator<Item = (usize, &str, &Arc<Attachment>)> {
        self.attachments
            .iter()
            .map(|((slot, name), attachment)| (*slot, name.as_str(), attachment))
    }

    pub fn len(&self) -> usize {
        self.attachments.len()
    }

    pub fn is_empty(&self) -> bool {
        self.attachments.is_empty()
    }
}
