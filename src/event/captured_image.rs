use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::capture::region::Region;

/// 一次区域截图的结果，创建后不可修改
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CapturedImage {
    pub id: Uuid,
    /// `data:image/png;base64,...`
    pub data_url: String,
    pub created_at: DateTime<Utc>,
    /// dHash 的十六进制表示
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hash: Option<String>,
    pub region: Region,
    pub width: u32,
    pub height: u32,
}

impl CapturedImage {
    pub fn new(
        data_url: String,
        region: Region,
        width: u32,
        height: u32,
        hash: Option<u64>,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            data_url,
            created_at: Utc::now(),
            hash: hash.map(|h| format!("{:016x}", h)),
            region,
            width,
            height,
        }
    }
}
