//! 选区与显示器的几何计算
//!
//! 纯函数，不依赖任何平台 API

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::capture::error::CaptureError;

/// 虚拟桌面(全局)坐标下的矩形
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Region {
    pub x: i32,
    pub y: i32,
    pub width: u32,
    pub height: u32,
}

impl Region {
    pub fn new(x: i32, y: i32, width: u32, height: u32) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    pub fn right(&self) -> i64 {
        self.x as i64 + self.width as i64
    }

    pub fn bottom(&self) -> i64 {
        self.y as i64 + self.height as i64
    }

    pub fn is_empty(&self) -> bool {
        self.width == 0 || self.height == 0
    }

    pub fn area(&self) -> u64 {
        self.width as u64 * self.height as u64
    }

    /// 两个矩形的交集，没有重叠时返回 None
    pub fn intersect(&self, other: &Region) -> Option<Region> {
        let ix0 = (self.x as i64).max(other.x as i64);
        let iy0 = (self.y as i64).max(other.y as i64);
        let ix1 = self.right().min(other.right());
        let iy1 = self.bottom().min(other.bottom());

        if ix0 < ix1 && iy0 < iy1 {
            Some(Region {
                x: ix0 as i32,
                y: iy0 as i32,
                width: (ix1 - ix0) as u32,
                height: (iy1 - iy0) as u32,
            })
        } else {
            None
        }
    }
}

impl fmt::Display for Region {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}x{}+{}+{}", self.width, self.height, self.x, self.y)
    }
}

/// 相对于某个显示器左上角的矩形，仅在计算中间使用
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LocalRegion {
    pub x: u32,
    pub y: u32,
    pub width: u32,
    pub height: u32,
}

impl LocalRegion {
    pub fn new(x: u32, y: u32, width: u32, height: u32) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }
}

/// 物理显示器
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Display {
    pub id: u32,
    pub name: String,
    pub bounds: Region,
    pub scale_factor: f32,
}

impl fmt::Display for Display {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} ({}) bounds={}, scale={}",
            self.id, self.name, self.bounds, self.scale_factor
        )
    }
}

/// 选区落在某个显示器上的部分
#[derive(Debug, Clone, PartialEq)]
pub struct DisplayIntersection {
    pub display: Display,
    pub local: LocalRegion,
}

impl DisplayIntersection {
    /// 把局部矩形映射回全局坐标
    pub fn global(&self) -> Region {
        Region {
            x: self.display.bounds.x + self.local.x as i32,
            y: self.display.bounds.y + self.local.y as i32,
            width: self.local.width,
            height: self.local.height,
        }
    }
}

/// 计算选区与每个显示器的交集
///
/// 结果顺序与 `displays` 一致；没有任何显示器与选区重叠时返回
/// `CaptureError::NoIntersection`
pub fn intersect_displays(
    selection: &Region,
    displays: &[Display],
) -> Result<Vec<DisplayIntersection>, CaptureError> {
    let hits: Vec<DisplayIntersection> = displays
        .iter()
        .filter_map(|display| {
            let overlap = selection.intersect(&display.bounds)?;
            Some(DisplayIntersection {
                display: display.clone(),
                local: LocalRegion {
                    x: (overlap.x as i64 - display.bounds.x as i64) as u32,
                    y: (overlap.y as i64 - display.bounds.y as i64) as u32,
                    width: overlap.width,
                    height: overlap.height,
                },
            })
        })
        .collect();

    if hits.is_empty() {
        return Err(CaptureError::NoIntersection);
    }
    Ok(hits)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn display(id: u32, x: i32, y: i32, width: u32, height: u32) -> Display {
        Display {
            id,
            name: format!("display-{}", id),
            bounds: Region::new(x, y, width, height),
            scale_factor: 1.0,
        }
    }

    fn side_by_side() -> Vec<Display> {
        vec![
            display(1, 0, 0, 1920, 1080),
            display(2, 1920, 0, 1920, 1080),
        ]
    }

    #[test]
    fn test_selection_inside_one_display() {
        let hits = intersect_displays(&Region::new(100, 100, 400, 300), &side_by_side()).unwrap();
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].display.id, 1);
        assert_eq!(hits[0].local, LocalRegion::new(100, 100, 400, 300));
    }

    #[test]
    fn test_selection_straddles_two_displays() {
        let hits =
            intersect_displays(&Region::new(1800, 100, 300, 200), &side_by_side()).unwrap();
        assert_eq!(hits.len(), 2);
        assert_eq!(hits[0].display.id, 1);
        assert_eq!(hits[0].local, LocalRegion::new(1800, 100, 120, 200));
        assert_eq!(hits[1].display.id, 2);
        assert_eq!(hits[1].local, LocalRegion::new(0, 100, 180, 200));
    }

    #[test]
    fn test_zero_sized_selection() {
        let displays = side_by_side();
        assert!(matches!(
            intersect_displays(&Region::new(100, 100, 0, 50), &displays),
            Err(CaptureError::NoIntersection)
        ));
        assert!(matches!(
            intersect_displays(&Region::new(100, 100, 50, 0), &displays),
            Err(CaptureError::NoIntersection)
        ));
    }

    #[test]
    fn test_selection_outside_all_displays() {
        let result = intersect_displays(&Region::new(-500, -500, 100, 100), &side_by_side());
        assert!(matches!(result, Err(CaptureError::NoIntersection)));
    }

    #[test]
    fn test_touching_edge_is_not_overlap() {
        // 右边缘恰好贴着第二块屏幕
        let hits =
            intersect_displays(&Region::new(1820, 0, 100, 100), &side_by_side()).unwrap();
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].display.id, 1);
    }

    #[test]
    fn test_negative_origin_display() {
        let displays = vec![display(1, 0, 0, 1920, 1080), display(2, -1280, 0, 1280, 1024)];
        let hits = intersect_displays(&Region::new(-100, 50, 200, 100), &displays).unwrap();
        assert_eq!(hits.len(), 2);
        assert_eq!(hits[0].local, LocalRegion::new(0, 50, 100, 100));
        assert_eq!(hits[1].local, LocalRegion::new(1180, 50, 100, 100));
    }

    #[test]
    fn test_local_regions_cover_selection_overlap() {
        // 田字形四块屏幕加一块偏移的副屏
        let displays = vec![
            display(1, 0, 0, 1000, 800),
            display(2, 1000, 0, 1000, 800),
            display(3, 0, 800, 1000, 800),
            display(4, 1000, 800, 1000, 800),
            display(5, 2000, 300, 600, 400),
        ];
        let selections = [
            Region::new(900, 700, 200, 200),
            Region::new(-50, -50, 3000, 2000),
            Region::new(1500, 200, 900, 300),
            Region::new(10, 10, 5, 5),
            Region::new(1999, 799, 2, 2),
        ];

        for selection in selections {
            let hits = intersect_displays(&selection, &displays).unwrap();

            let covered: u64 = hits.iter().map(|hit| hit.global().area()).sum();
            let expected: u64 = displays
                .iter()
                .filter_map(|d| selection.intersect(&d.bounds))
                .map(|r| r.area())
                .sum();
            assert_eq!(covered, expected, "selection {}", selection);

            for hit in &hits {
                let global = hit.global();
                assert_eq!(selection.intersect(&global), Some(global));
                assert_eq!(hit.display.bounds.intersect(&global), Some(global));
            }
        }
    }
}
