use std::fs;
use std::path::Path;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::event::CapturedImage;
use crate::store::error::StoreError;

/// 截图历史，最新的在最前，超过容量时丢弃最旧的
#[derive(Debug, Clone)]
pub struct History {
    capacity: usize,
    entries: Vec<CapturedImage>,
}

impl History {
    pub fn new(capacity: usize) -> Self {
        Self {
            capacity: capacity.max(1),
            entries: Vec::new(),
        }
    }

    /// 从 JSON 文件加载，文件不存在时返回空历史
    pub fn load<P: AsRef<Path>>(path: P, capacity: usize) -> Result<Self, StoreError> {
        let path = path.as_ref();
        let mut history = Self::new(capacity);
        if !path.exists() {
            debug!("No history file at {}, starting empty", path.display());
            return Ok(history);
        }

        let content = fs::read_to_string(path)?;
        let mut entries: Vec<CapturedImage> = serde_json::from_str(&content)?;
        if entries.len() > history.capacity {
            warn!(
                "History file holds {} entries, truncating to {}",
                entries.len(),
                history.capacity
            );
            entries.truncate(history.capacity);
        }
        history.entries = entries;
        info!("Loaded {} history entries", history.entries.len());
        Ok(history)
    }

    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<(), StoreError> {
        let path = path.as_ref();
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(path, serde_json::to_string_pretty(&self.entries)?)?;
        debug!("Saved {} history entries to {}", self.entries.len(), path.display());
        Ok(())
    }

    pub fn add(&mut self, image: CapturedImage) {
        self.entries.insert(0, image);
        if self.entries.len() > self.capacity {
            for evicted in self.entries.drain(self.capacity..) {
                debug!("Evicted history entry {}", evicted.id);
            }
        }
    }

    /// 全部历史，最新的在最前
    pub fn get_all(&self) -> &[CapturedImage] {
        &self.entries
    }

    pub fn get(&self, id: &Uuid) -> Option<&CapturedImage> {
        self.entries.iter().find(|entry| &entry.id == id)
    }

    /// 按 id 前缀查找(便于命令行输入)，前缀有歧义时返回 None
    pub fn find_by_prefix(&self, prefix: &str) -> Option<&CapturedImage> {
        let prefix = prefix.to_ascii_lowercase();
        let mut matches = self
            .entries
            .iter()
            .filter(|entry| entry.id.to_string().starts_with(&prefix));
        let first = matches.next()?;
        if matches.next().is_some() {
            return None;
        }
        Some(first)
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
