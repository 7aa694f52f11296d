use tracing::debug;

use crate::capture::region::Region;

/// 一次拖拽选区的会话
///
/// 在按下鼠标时创建，松开时通过 `finish` 消费得到选区，取消时直接丢弃。
/// 支持任意方向拖拽
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SelectionSession {
    anchor: (i32, i32),
    cursor: (i32, i32),
}

impl SelectionSession {
    pub fn begin(x: i32, y: i32) -> Self {
        debug!("Selection started at ({}, {})", x, y);
        Self {
            anchor: (x, y),
            cursor: (x, y),
        }
    }

    pub fn update(&mut self, x: i32, y: i32) {
        self.cursor = (x, y);
    }

    /// 当前拖拽范围(用于预览)
    pub fn current(&self) -> Region {
        let (ax, ay) = self.anchor;
        let (cx, cy) = self.cursor;
        Region::new(
            ax.min(cx),
            ay.min(cy),
            (ax as i64 - cx as i64).unsigned_abs() as u32,
            (ay as i64 - cy as i64).unsigned_abs() as u32,
        )
    }

    pub fn finish(self) -> Region {
        let region = self.current();
        debug!("Selection finished: {}", region);
        region
    }

    pub fn cancel(self) {
        debug!("Selection cancelled");
    }
}
