use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::capture::utils::decode_png_data_url;
use crate::store::error::StoreError;

/// 置顶查看器的不透明标识
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PinId(Uuid);

impl fmt::Display for PinId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for PinId {
    type Err = uuid::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Uuid::parse_str(s).map(PinId)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Pin {
    pub id: PinId,
    /// 来源截图(如果来自历史)
    pub image_id: Option<Uuid>,
    pub path: PathBuf,
    pub width: u32,
    pub height: u32,
    pub created_at: DateTime<Utc>,
}

/// 已置顶图像的登记表
///
/// 每个置顶对应 `dir` 下的一张 PNG，登记表本身以 JSON 保存
#[derive(Debug)]
pub struct PinBoard {
    dir: PathBuf,
    pins: Vec<Pin>,
}

impl PinBoard {
    pub fn new<P: Into<PathBuf>>(dir: P) -> Self {
        Self {
            dir: dir.into(),
            pins: Vec::new(),
        }
    }

    pub fn load<P: AsRef<Path>, D: Into<PathBuf>>(index: P, dir: D) -> Result<Self, StoreError> {
        let mut board = Self::new(dir);
        if index.as_ref().exists() {
            let content = fs::read_to_string(index.as_ref())?;
            board.pins = serde_json::from_str(&content)?;
            debug!("Loaded {} pins", board.pins.len());
        }
        Ok(board)
    }

    pub fn save<P: AsRef<Path>>(&self, index: P) -> Result<(), StoreError> {
        if let Some(parent) = index.as_ref().parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(index.as_ref(), serde_json::to_string_pretty(&self.pins)?)?;
        Ok(())
    }

    /// 置顶一张 PNG data URL 图像
    pub fn pin(&mut self, data_url: &str, image_id: Option<Uuid>) -> Result<PinId, StoreError> {
        let png = decode_png_data_url(data_url).ok_or(StoreError::InvalidDataUrl)?;
        let decoded = image::load_from_memory_with_format(&png, image::ImageFormat::Png)
            .map_err(|_| StoreError::InvalidDataUrl)?;

        let id = PinId(Uuid::new_v4());
        fs::create_dir_all(&self.dir)?;
        let path = self.dir.join(format!("{}.png", id));
        fs::write(&path, &png)?;

        info!(
            "Pinned {}x{} image as {} ({})",
            decoded.width(),
            decoded.height(),
            id,
            path.display()
        );
        self.pins.push(Pin {
            id,
            image_id,
            path,
            width: decoded.width(),
            height: decoded.height(),
            created_at: Utc::now(),
        });
        Ok(id)
    }

    /// 置顶并立即保存登记表，保存失败时撤销本次置顶并删除已写入的 PNG
    pub fn pin_and_save<P: AsRef<Path>>(
        &mut self,
        data_url: &str,
        image_id: Option<Uuid>,
        index: P,
    ) -> Result<PinId, StoreError> {
        let id = self.pin(data_url, image_id)?;
        if let Err(e) = self.save(index) {
            warn!("Failed to save pin index, rolling back {}: {}", id, e);
            if let Some(pin) = self.pins.pop() {
                if let Err(remove_err) = fs::remove_file(&pin.path) {
                    warn!("Failed to remove {}: {}", pin.path.display(), remove_err);
                }
            }
            return Err(e);
        }
        Ok(id)
    }

    pub fn unpin(&mut self, id: &PinId) -> Result<Pin, StoreError> {
        let index = self
            .pins
            .iter()
            .position(|pin| &pin.id == id)
            .ok_or_else(|| StoreError::NotFound(format!("pin {}", id)))?;
        let pin = self.pins.remove(index);

        match fs::remove_file(&pin.path) {
            Ok(()) => {}
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                debug!("Pin image {} already removed", pin.path.display());
            }
            Err(e) => return Err(e.into()),
        }
        info!("Unpinned {}", id);
        Ok(pin)
    }

    pub fn get(&self, id: &PinId) -> Option<&Pin> {
        self.pins.iter().find(|pin| &pin.id == id)
    }

    pub fn list(&self) -> &[Pin] {
        &self.pins
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::capture::utils::{encode_png, png_data_url};
    use image::{Rgba, RgbaImage};

    fn data_url() -> String {
        let img = RgbaImage::from_pixel(4, 3, Rgba([9, 9, 9, 255]));
        png_data_url(&encode_png(&img).unwrap())
    }

    #[test]
    fn test_pin_writes_png() {
        let dir = tempfile::tempdir().unwrap();
        let mut board = PinBoard::new(dir.path().join("pins"));

        let id = board.pin(&data_url(), None).unwrap();
        let pin = board.get(&id).unwrap();
        assert_eq!((pin.width, pin.height), (4, 3));
        assert!(pin.path.exists());
    }

    #[test]
    fn test_pin_rejects_invalid_data_url() {
        let dir = tempfile::tempdir().unwrap();
        let mut board = PinBoard::new(dir.path());

        assert!(matches!(
            board.pin("data:text/plain;base64,aGk=", None),
            Err(StoreError::InvalidDataUrl)
        ));
        // base64 合法但不是 PNG
        assert!(matches!(
            board.pin("data:image/png;base64,aGVsbG8=", None),
            Err(StoreError::InvalidDataUrl)
        ));
        assert!(board.list().is_empty());
    }

    #[test]
    fn test_failed_index_save_leaves_no_orphan() {
        let dir = tempfile::tempdir().unwrap();
        let pins_dir = dir.path().join("pins");
        // 登记表路径被目录占用，写入必然失败
        let index = dir.path().join("pins.json");
        fs::create_dir_all(&index).unwrap();

        let mut board = PinBoard::new(&pins_dir);
        assert!(matches!(
            board.pin_and_save(&data_url(), None, &index),
            Err(StoreError::Io(_))
        ));
        assert!(board.list().is_empty());
        assert_eq!(fs::read_dir(&pins_dir).unwrap().count(), 0);
    }

    #[test]
    fn test_pin_and_save_persists() {
        let dir = tempfile::tempdir().unwrap();
        let index = dir.path().join("pins.json");
        let mut board = PinBoard::new(dir.path().join("pins"));

        let id = board.pin_and_save(&data_url(), None, &index).unwrap();
        let loaded = PinBoard::load(&index, dir.path().join("pins")).unwrap();
        assert!(loaded.get(&id).is_some());
    }

    #[test]
    fn test_unpin_removes_file() {
        let dir = tempfile::tempdir().unwrap();
        let mut board = PinBoard::new(dir.path());
        let id = board.pin(&data_url(), None).unwrap();
        let path = board.get(&id).unwrap().path.clone();

        board.unpin(&id).unwrap();
        assert!(!path.exists());
        assert!(board.get(&id).is_none());
        assert!(matches!(board.unpin(&id), Err(StoreError::NotFound(_))));
    }

    #[test]
    fn test_save_and_load() {
        let dir = tempfile::tempdir().unwrap();
        let index = dir.path().join("pins.json");
        let mut board = PinBoard::new(dir.path().join("pins"));
        let image_id = Uuid::new_v4();
        let id = board.pin(&data_url(), Some(image_id)).unwrap();
        board.save(&index).unwrap();

        let loaded = PinBoard::load(&index, dir.path().join("pins")).unwrap();
        assert_eq!(loaded.list(), board.list());
        assert_eq!(loaded.get(&id).unwrap().image_id, Some(image_id));
    }

    #[test]
    fn test_pin_id_parse() {
        let id = PinId(Uuid::new_v4());
        assert_eq!(id.to_string().parse::<PinId>().unwrap(), id);
        assert!("not-a-uuid".parse::<PinId>().is_err());
    }
}
