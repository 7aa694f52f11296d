use std::time::Duration;

/// 区域截图流程中的错误
///
/// 所有错误都只终止当前这一次截图，不会自动重试
#[derive(Debug, thiserror::Error)]
pub enum CaptureError {
    #[error("Selection does not touch any display")]
    NoIntersection,

    #[error("Screen capture permission denied: {0}. Grant screen recording permission and retry")]
    PermissionDenied(String),

    #[error("No capturable source: {0}")]
    NoSource(String),

    #[error("Failed to composite captured regions: {0}")]
    Composite(String),

    #[error("Capture did not complete within {}ms", .0.as_millis())]
    Timeout(Duration),

    #[error("Another capture is already in progress")]
    InProgress,

    #[error("PNG encoding failed: {0}")]
    Encode(String),
}

impl CaptureError {
    /// 用户重新发起截图是否有可能成功
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            CaptureError::NoSource(_) | CaptureError::Timeout(_) | CaptureError::InProgress
        )
    }
}
