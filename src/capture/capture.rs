use image::RgbaImage;
use std::sync::Arc;
use std::time::Instant;
use tokio::sync::Mutex;
use tokio::task::JoinSet;
use tokio::time::{Duration, timeout};
use tracing::{debug, error, info, warn};

use crate::capture::compositor::composite;
use crate::capture::crop::{DisplayCrop, capture_intersection};
use crate::capture::error::CaptureError;
use crate::capture::monitor::DisplaySource;
use crate::capture::region::{Display, DisplayIntersection, Region, intersect_displays};
use crate::capture::utils::{dhash, encode_png, png_data_url};
use crate::config::CaptureConfig;
use crate::event::CapturedImage;

/// 区域截图管理器
///
/// 一次只允许一个截图在进行；跨多个显示器时并发抓取各显示器再拼接
pub struct RegionCapture {
    source: Arc<dyn DisplaySource>,
    config: CaptureConfig,
    in_flight: Mutex<()>,
}

impl RegionCapture {
    pub fn new(source: Arc<dyn DisplaySource>, config: CaptureConfig) -> Self {
        info!("Initialized region capture: {}", config);
        Self {
            source,
            config,
            in_flight: Mutex::new(()),
        }
    }

    /// 列出当前所有显示器
    pub async fn displays(&self) -> Result<Vec<Display>, CaptureError> {
        let source = self.source.clone();
        tokio::task::spawn_blocking(move || source.displays())
            .await
            .map_err(|e| CaptureError::NoSource(format!("display enumeration task failed: {}", e)))?
    }

    /// 截取全局坐标下的选区
    ///
    /// 抓取与拼接整体受 `timeout_ms` 约束，超时返回 `CaptureError::Timeout`
    pub async fn capture(&self, selection: Region) -> Result<CapturedImage, CaptureError> {
        let _guard = self.in_flight.try_lock().map_err(|_| {
            warn!("Rejected capture of {}: another capture is in progress", selection);
            CaptureError::InProgress
        })?;

        let started = Instant::now();
        info!("Capturing region {}", selection);

        let limit = Duration::from_millis(self.config.timeout_ms);
        let image = match timeout(limit, self.capture_image(selection)).await {
            Ok(Ok(image)) => image,
            Ok(Err(e)) => {
                error!("Capture of {} failed: {}", selection, e);
                return Err(e);
            }
            Err(_) => {
                error!("Capture of {} timed out after {:?}", selection, limit);
                return Err(CaptureError::Timeout(limit));
            }
        };

        let compute_hash = self.config.compute_hash;
        let resolution = self.config.dhash_resolution;
        let (width, height) = image.dimensions();
        let (png, hash) = tokio::task::spawn_blocking(move || {
            let hash = compute_hash.then(|| dhash(&image, resolution));
            encode_png(&image).map(|png| (png, hash))
        })
        .await
        .map_err(|e| CaptureError::Encode(format!("encoding task failed: {}", e)))??;

        let captured = CapturedImage::new(png_data_url(&png), selection, width, height, hash);
        info!(
            "Captured {} as {} ({}x{}, {} bytes) in {}ms",
            selection,
            captured.id,
            width,
            height,
            png.len(),
            started.elapsed().as_millis()
        );
        Ok(captured)
    }

    async fn capture_image(&self, selection: Region) -> Result<RgbaImage, CaptureError> {
        let displays = self.displays().await?;
        let hits = intersect_displays(&selection, &displays)?;
        debug!("Selection {} touches {} display(s)", selection, hits.len());

        let mut crops = self.capture_all(hits).await?;
        if crops.len() == 1 {
            if let Some(crop) = crops.pop() {
                return Ok(crop.image);
            }
        }

        tokio::task::spawn_blocking(move || composite(&selection, &crops))
            .await
            .map_err(|e| CaptureError::Composite(format!("composite task failed: {}", e)))?
    }

    /// 并发抓取所有相交的显示器，任一失败即整体失败
    async fn capture_all(
        &self,
        hits: Vec<DisplayIntersection>,
    ) -> Result<Vec<DisplayCrop>, CaptureError> {
        let mut slots: Vec<Option<DisplayCrop>> = (0..hits.len()).map(|_| None).collect();
        let mut tasks = JoinSet::new();

        for (index, hit) in hits.into_iter().enumerate() {
            let source = self.source.clone();
            tasks.spawn_blocking(move || (index, capture_intersection(source.as_ref(), &hit)));
        }

        while let Some(joined) = tasks.join_next().await {
            let (index, result) = joined.map_err(|e| {
                CaptureError::Composite(format!("display capture task failed: {}", e))
            })?;
            match result {
                Ok(crop) => slots[index] = Some(crop),
                Err(e) => {
                    tasks.abort_all();
                    return Err(e);
                }
            }
        }

        slots
            .into_iter()
            .map(|slot| {
                slot.ok_or_else(|| CaptureError::Composite("missing display crop".to_string()))
            })
            .collect()
    }
}
