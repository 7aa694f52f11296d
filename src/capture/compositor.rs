//! 多显示器裁剪结果的拼接
//!
//! 所有裁剪必须全部放置成功，否则整体失败，不产出部分图像

use image::{RgbaImage, imageops};
use tracing::debug;

use crate::capture::crop::{DisplayCrop, to_physical};
use crate::capture::error::CaptureError;
use crate::capture::region::Region;

/// 把各显示器的裁剪拼接成一张 `selection` 大小的图像
///
/// 画布按裁剪中最大的缩放比放大，缩放比不同的裁剪会被重采样到同一密度。
/// 全部为 1 倍时画布尺寸与选区完全一致
pub fn composite(selection: &Region, crops: &[DisplayCrop]) -> Result<RgbaImage, CaptureError> {
    if crops.is_empty() {
        return Err(CaptureError::Composite("no crops to composite".to_string()));
    }
    if selection.is_empty() {
        return Err(CaptureError::Composite(format!(
            "selection {} has no area",
            selection
        )));
    }

    let scale = crops
        .iter()
        .map(|crop| crop.scale_factor)
        .fold(1.0_f32, f32::max);

    // 各边都在全局坐标中取整，与逐屏裁剪的取整方式一致
    let origin_x = to_physical(selection.x as i64, scale);
    let origin_y = to_physical(selection.y as i64, scale);
    let canvas_width = (to_physical(selection.right(), scale) - origin_x) as u32;
    let canvas_height = (to_physical(selection.bottom(), scale) - origin_y) as u32;
    let mut canvas = RgbaImage::new(canvas_width, canvas_height);

    for crop in crops {
        if crop.image.width() == 0 || crop.image.height() == 0 {
            return Err(CaptureError::Composite(format!(
                "crop from display {} is empty",
                crop.display_id
            )));
        }

        let dest_x = to_physical(crop.placement.x as i64, scale) - origin_x;
        let dest_y = to_physical(crop.placement.y as i64, scale) - origin_y;
        let dest_width = to_physical(crop.placement.right(), scale) - origin_x - dest_x;
        let dest_height = to_physical(crop.placement.bottom(), scale) - origin_y - dest_y;

        if dest_x < 0
            || dest_y < 0
            || dest_width <= 0
            || dest_height <= 0
            || dest_x + dest_width > canvas_width as i64
            || dest_y + dest_height > canvas_height as i64
        {
            return Err(CaptureError::Composite(format!(
                "crop from display {} at {} does not fit selection {}",
                crop.display_id, crop.placement, selection
            )));
        }

        let (dest_width, dest_height) = (dest_width as u32, dest_height as u32);
        if crop.image.dimensions() == (dest_width, dest_height) {
            imageops::replace(&mut canvas, &crop.image, dest_x, dest_y);
        } else {
            debug!(
                "Resampling crop from display {} {}x{} -> {}x{}",
                crop.display_id,
                crop.image.width(),
                crop.image.height(),
                dest_width,
                dest_height
            );
            let resized = imageops::resize(
                &crop.image,
                dest_width,
                dest_height,
                imageops::FilterType::Lanczos3,
            );
            imageops::replace(&mut canvas, &resized, dest_x, dest_y);
        }
    }

    debug!(
        "Composited {} crops into {}x{}",
        crops.len(),
        canvas_width,
        canvas_height
    );
    Ok(canvas)
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Rgba;

    fn pattern(width: u32, height: u32, seed: u8) -> RgbaImage {
        RgbaImage::from_fn(width, height, |x, y| {
            Rgba([seed, (x % 256) as u8, (y % 256) as u8, 255])
        })
    }

    fn crop(display_id: u32, placement: Region, scale_factor: f32, image: RgbaImage) -> DisplayCrop {
        DisplayCrop {
            display_id,
            placement,
            scale_factor,
            image,
        }
    }

    #[test]
    fn test_composite_preserves_pixels() {
        let selection = Region::new(1800, 100, 300, 200);
        let left = pattern(120, 200, 10);
        let right = pattern(180, 200, 200);
        let crops = vec![
            crop(1, Region::new(1800, 100, 120, 200), 1.0, left.clone()),
            crop(2, Region::new(1920, 100, 180, 200), 1.0, right.clone()),
        ];

        let canvas = composite(&selection, &crops).unwrap();
        assert_eq!(canvas.dimensions(), (300, 200));

        for y in 0..200 {
            for x in 0..120 {
                assert_eq!(canvas.get_pixel(x, y), left.get_pixel(x, y));
            }
            for x in 0..180 {
                assert_eq!(canvas.get_pixel(120 + x, y), right.get_pixel(x, y));
            }
        }
    }

    #[test]
    fn test_fractional_scale_crops_fill_canvas() {
        // 1.5 倍下左侧 121 逻辑像素 -> 181 物理像素，右侧 179 -> 269
        let selection = Region::new(1799, 100, 300, 200);
        let left = pattern(181, 300, 10);
        let right = pattern(269, 300, 200);
        let crops = vec![
            crop(1, Region::new(1799, 100, 121, 200), 1.5, left.clone()),
            crop(2, Region::new(1920, 100, 179, 200), 1.5, right.clone()),
        ];

        let canvas = composite(&selection, &crops).unwrap();
        assert_eq!(canvas.dimensions(), (450, 300));

        for y in 0..300 {
            for x in 0..181 {
                assert_eq!(canvas.get_pixel(x, y), left.get_pixel(x, y));
            }
            for x in 0..269 {
                assert_eq!(canvas.get_pixel(181 + x, y), right.get_pixel(x, y));
            }
        }
    }

    #[test]
    fn test_uncovered_area_stays_transparent() {
        // 两块屏幕高度不同，选区下半部分只有左屏
        let selection = Region::new(0, 0, 40, 40);
        let crops = vec![
            crop(1, Region::new(0, 0, 20, 40), 1.0, pattern(20, 40, 1)),
            crop(2, Region::new(20, 0, 20, 20), 1.0, pattern(20, 20, 2)),
        ];
        let canvas = composite(&selection, &crops).unwrap();
        assert_eq!(canvas.get_pixel(30, 30), &Rgba([0, 0, 0, 0]));
        assert_eq!(canvas.get_pixel(30, 10)[0], 2);
    }

    #[test]
    fn test_mixed_scale_uses_highest_density() {
        let selection = Region::new(0, 0, 20, 10);
        let crops = vec![
            crop(1, Region::new(0, 0, 10, 10), 2.0, pattern(20, 20, 1)),
            crop(2, Region::new(10, 0, 10, 10), 1.0, pattern(10, 10, 2)),
        ];
        let canvas = composite(&selection, &crops).unwrap();
        assert_eq!(canvas.dimensions(), (40, 20));
        assert_eq!(canvas.get_pixel(5, 5)[0], 1);
        assert_eq!(canvas.get_pixel(35, 5)[0], 2);
    }

    #[test]
    fn test_crop_outside_selection_fails() {
        let selection = Region::new(0, 0, 100, 100);
        let crops = vec![crop(1, Region::new(90, 0, 20, 20), 1.0, pattern(20, 20, 1))];
        assert!(matches!(
            composite(&selection, &crops),
            Err(CaptureError::Composite(_))
        ));
    }

    #[test]
    fn test_empty_crop_fails() {
        let selection = Region::new(0, 0, 100, 100);
        let crops = vec![
            crop(1, Region::new(0, 0, 50, 100), 1.0, pattern(50, 100, 1)),
            crop(2, Region::new(50, 0, 50, 100), 1.0, RgbaImage::new(0, 0)),
        ];
        assert!(matches!(
            composite(&selection, &crops),
            Err(CaptureError::Composite(_))
        ));
    }

    #[test]
    fn test_no_crops_fails() {
        assert!(matches!(
            composite(&Region::new(0, 0, 10, 10), &[]),
            Err(CaptureError::Composite(_))
        ));
    }
}
