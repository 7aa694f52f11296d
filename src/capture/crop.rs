use image::{RgbaImage, imageops};
use tracing::debug;

use crate::capture::error::CaptureError;
use crate::capture::monitor::DisplaySource;
use crate::capture::region::{DisplayIntersection, LocalRegion, Region};

/// 单个显示器上裁剪出的图像
#[derive(Debug, Clone)]
pub struct DisplayCrop {
    pub display_id: u32,
    /// 该裁剪在全局坐标中的位置(逻辑像素)
    pub placement: Region,
    pub scale_factor: f32,
    /// 物理像素图像
    pub image: RgbaImage,
}

/// 全局逻辑坐标到物理像素坐标
///
/// 所有边都在全局坐标中取整，裁剪和拼接共用，保证同一缩放比下
/// 相邻裁剪的宽度之和正好等于画布宽度
pub fn to_physical(value: i64, scale_factor: f32) -> i64 {
    (value as f64 * scale_factor as f64).round() as i64
}

/// 把局部矩形按缩放比换算成物理像素，并限制在帧范围内
///
/// `origin` 是显示器左上角的全局坐标。
/// 返回 `(x, y, width, height)`，宽或高为 0 时返回 None
pub fn physical_rect(
    local: &LocalRegion,
    origin: (i32, i32),
    scale_factor: f32,
    frame_width: u32,
    frame_height: u32,
) -> Option<(u32, u32, u32, u32)> {
    let edge = |origin: i32, offset: u32, limit: u32| {
        let global = origin as i64 + offset as i64;
        (to_physical(global, scale_factor) - to_physical(origin as i64, scale_factor))
            .clamp(0, limit as i64) as u32
    };

    let x0 = edge(origin.0, local.x, frame_width);
    let y0 = edge(origin.1, local.y, frame_height);
    let x1 = edge(origin.0, local.x + local.width, frame_width);
    let y1 = edge(origin.1, local.y + local.height, frame_height);

    if x0 < x1 && y0 < y1 {
        Some((x0, y0, x1 - x0, y1 - y0))
    } else {
        None
    }
}

/// 从整屏帧中裁出局部区域
pub fn crop_frame(
    frame: &RgbaImage,
    local: &LocalRegion,
    origin: (i32, i32),
    scale_factor: f32,
) -> Result<RgbaImage, CaptureError> {
    let (x, y, width, height) =
        physical_rect(local, origin, scale_factor, frame.width(), frame.height()).ok_or_else(
            || {
                CaptureError::NoSource(format!(
                    "region {:?} lies outside the {}x{} frame",
                    local,
                    frame.width(),
                    frame.height()
                ))
            },
        )?;

    Ok(imageops::crop_imm(frame, x, y, width, height).to_image())
}

/// 抓取一个显示器并裁剪到选区落在其上的部分
pub fn capture_intersection<S>(
    source: &S,
    hit: &DisplayIntersection,
) -> Result<DisplayCrop, CaptureError>
where
    S: DisplaySource + ?Sized,
{
    let frame = source.capture(&hit.display)?;
    let origin = (hit.display.bounds.x, hit.display.bounds.y);
    let image = crop_frame(&frame, &hit.local, origin, hit.display.scale_factor)?;

    debug!(
        "Cropped display {} to {}x{} (local {:?}, scale {})",
        hit.display.id,
        image.width(),
        image.height(),
        hit.local,
        hit.display.scale_factor
    );

    Ok(DisplayCrop {
        display_id: hit.display.id,
        placement: hit.global(),
        scale_factor: hit.display.scale_factor,
        image,
    })
}
