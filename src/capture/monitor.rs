use image::RgbaImage;
use regex::Regex;
use std::sync::LazyLock;
use tracing::{debug, warn};
use xcap::Monitor;

use crate::capture::error::CaptureError;
use crate::capture::region::{Display, Region};

/// 显示器来源
///
/// 负责枚举显示器以及抓取单个显示器的整屏图像。
/// 实现必须可以跨线程共享，抓取会在阻塞线程池中并发执行
pub trait DisplaySource: Send + Sync {
    fn displays(&self) -> Result<Vec<Display>, CaptureError>;

    /// 以原生分辨率抓取整个显示器
    fn capture(&self, target: &Display) -> Result<RgbaImage, CaptureError>;
}

/// 基于 xcap 的显示器来源
#[derive(Debug, Default, Clone, Copy)]
pub struct XcapDisplays;

// xcap 没有跨平台的结构化权限错误码，只能匹配各平台的错误文本
static PERMISSION_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?i)(permission|not authori[sz]ed|access (is )?denied|screen ?recording|failed to get sources|TCC)",
    )
    .expect("permission pattern is valid")
});

/// 把平台错误信息归类为权限错误或无可用源
pub fn classify_platform_error(message: String) -> CaptureError {
    if PERMISSION_RE.is_match(&message) {
        CaptureError::PermissionDenied(message)
    } else {
        CaptureError::NoSource(message)
    }
}

impl XcapDisplays {
    pub fn new() -> Self {
        Self
    }

    fn monitors() -> Result<Vec<Monitor>, CaptureError> {
        Monitor::all().map_err(|e| classify_platform_error(format!("{:?}", e)))
    }

    fn describe(monitor: &Monitor) -> Result<Display, CaptureError> {
        let describe_err = |e: xcap::XCapError| classify_platform_error(format!("{:?}", e));

        let id = monitor.id().map_err(describe_err)?;
        let name = monitor.name().unwrap_or_else(|_| format!("monitor-{}", id));
        let bounds = Region::new(
            monitor.x().map_err(describe_err)?,
            monitor.y().map_err(describe_err)?,
            monitor.width().map_err(describe_err)?,
            monitor.height().map_err(describe_err)?,
        );
        let scale_factor = match monitor.scale_factor() {
            Ok(scale) if scale > 0.0 => scale,
            Ok(scale) => {
                warn!("Monitor {} reported scale factor {}, using 1.0", id, scale);
                1.0
            }
            Err(e) => {
                warn!("Failed to read scale factor of monitor {}: {:?}", id, e);
                1.0
            }
        };

        Ok(Display {
            id,
            name,
            bounds,
            scale_factor,
        })
    }
}

impl DisplaySource for XcapDisplays {
    fn displays(&self) -> Result<Vec<Display>, CaptureError> {
        let monitors = Self::monitors()?;
        let mut displays = Vec::with_capacity(monitors.len());
        for monitor in &monitors {
            let found = Self::describe(monitor)?;
            debug!("Found display {}", found);
            displays.push(found);
        }
        Ok(displays)
    }

    fn capture(&self, target: &Display) -> Result<RgbaImage, CaptureError> {
        let monitor = Self::monitors()?
            .into_iter()
            .find(|m| m.id().map(|id| id == target.id).unwrap_or(false))
            .ok_or_else(|| CaptureError::NoSource(format!("display {} disappeared", target.id)))?;

        let image = monitor
            .capture_image()
            .map_err(|e| classify_platform_error(format!("{:?}", e)))?;

        if image.width() == 0 || image.height() == 0 {
            return Err(CaptureError::NoSource(format!(
                "display {} returned an empty frame",
                target.id
            )));
        }

        debug!(
            "Captured display {} frame {}x{}",
            target.id,
            image.width(),
            image.height()
        );
        Ok(image)
    }
}
