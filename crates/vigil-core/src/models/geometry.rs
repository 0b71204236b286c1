//! 축 정렬 박스, 화면 좌표, IoU 계산.

use serde::{Deserialize, Serialize};

/// 축 정렬 바운딩 박스 (픽셀 좌표)
///
/// 너비/높이는 `u32`이므로 음수가 될 수 없다.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct BoundingBox {
    /// 좌상단 X 좌표
    pub x: i32,
    /// 좌상단 Y 좌표
    pub y: i32,
    /// 너비
    pub width: u32,
    /// 높이
    pub height: u32,
}

impl BoundingBox {
    pub fn new(x: i32, y: i32, width: u32, height: u32) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    /// 오른쪽 경계 (배타적)
    pub fn right(&self) -> i64 {
        self.x as i64 + self.width as i64
    }

    /// 아래쪽 경계 (배타적)
    pub fn bottom(&self) -> i64 {
        self.y as i64 + self.height as i64
    }

    /// 면적
    pub fn area(&self) -> u64 {
        self.width as u64 * self.height as u64
    }

    /// 중심 좌표 (정수 나눗셈)
    pub fn center(&self) -> (i64, i64) {
        (
            self.x as i64 + (self.width / 2) as i64,
            self.y as i64 + (self.height / 2) as i64,
        )
    }

    /// 두 박스의 교집합 면적
    pub fn intersection_area(&self, other: &BoundingBox) -> u64 {
        let left = (self.x as i64).max(other.x as i64);
        let top = (self.y as i64).max(other.y as i64);
        let right = self.right().min(other.right());
        let bottom = self.bottom().min(other.bottom());

        if right <= left || bottom <= top {
            return 0;
        }
        ((right - left) * (bottom - top)) as u64
    }

    /// Intersection-over-Union.
    ///
    /// 어느 한쪽 면적이 0이거나 겹치지 않으면 0을 반환한다.
    pub fn iou(&self, other: &BoundingBox) -> f64 {
        let area_a = self.area();
        let area_b = other.area();
        if area_a == 0 || area_b == 0 {
            return 0.0;
        }

        let intersection = self.intersection_area(other);
        if intersection == 0 {
            return 0.0;
        }

        let union = area_a + area_b - intersection;
        intersection as f64 / union as f64
    }
}

/// 화면 좌표 한 점
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct Point {
    pub x: i32,
    pub y: i32,
}

impl Point {
    pub fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }
}
