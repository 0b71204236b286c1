//! 분수 좌표 영역.
//!
//! 트리거 파라미터는 해상도와 무관하게 전체 프레임 대비 비율로 영역을 지정한다.
//! 매처는 픽셀 공간에서 동작하므로 호출자가 `to_pixel_rect`로 변환한다.

use serde::{Deserialize, Serialize};

use super::geometry::BoundingBox;
use crate::error::CoreError;

/// 전체 프레임 대비 분수 영역
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Region {
    /// 좌상단 X 비율 (0.0 이상 1.0 미만)
    pub x: f64,
    /// 좌상단 Y 비율 (0.0 이상 1.0 미만)
    pub y: f64,
    /// 너비 비율 (0.0 초과 1.0 이하)
    pub width: f64,
    /// 높이 비율 (0.0 초과 1.0 이하)
    pub height: f64,
}

impl Region {
    /// 전체 프레임
    pub const FULL: Region = Region {
        x: 0.0,
        y: 0.0,
        width: 1.0,
        height: 1.0,
    };

    pub fn validate(&self) -> Result<(), CoreError> {
        if !(0.0..1.0).contains(&self.x) || !(0.0..1.0).contains(&self.y) {
            return Err(CoreError::validation(
                "region",
                format!("x, y는 0.0 이상 1.0 미만이어야 함 ({}, {})", self.x, self.y),
            ));
        }
        if !(self.width > 0.0 && self.width <= 1.0) || !(self.height > 0.0 && self.height <= 1.0) {
            return Err(CoreError::validation(
                "region",
                format!(
                    "width, height는 0.0 초과 1.0 이하여야 함 ({}, {})",
                    self.width, self.height
                ),
            ));
        }
        Ok(())
    }

    /// 픽셀 사각형으로 변환 (프레임 경계로 클램프)
    ///
    /// 시작점은 내림, 끝점은 올림으로 계산하여 영역 경계의 픽셀을 포함한다.
    pub fn to_pixel_rect(&self, frame_width: u32, frame_height: u32) -> BoundingBox {
        let (fw, fh) = (frame_width as f64, frame_height as f64);

        let left = (self.x.clamp(0.0, 1.0) * fw).floor();
        let top = (self.y.clamp(0.0, 1.0) * fh).floor();
        let right = ((self.x + self.width).clamp(0.0, 1.0) * fw).ceil();
        let bottom = ((self.y + self.height).clamp(0.0, 1.0) * fh).ceil();

        BoundingBox::new(
            left as i32,
            top as i32,
            (right - left).max(0.0) as u32,
            (bottom - top).max(0.0) as u32,
        )
    }
}

impl Default for Region {
    fn default() -> Self {
        Self::FULL
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn full_region_covers_frame() {
        let rect = Region::FULL.to_pixel_rect(640, 480);
        assert_eq!(rect, BoundingBox::new(0, 0, 640, 480));
    }

    #[test]
    fn quarter_region() {
        let region = Region {
            x: 0.5,
            y: 0.5,
            width: 0.5,
            height: 0.5,
        };
        assert_eq!(
            region.to_pixel_rect(640, 480),
            BoundingBox::new(320, 240, 320, 240)
        );
    }

    #[test]
    fn overflowing_region_is_clamped() {
        let region = Region {
            x: 0.8,
            y: 0.0,
            width: 0.5,
            height: 1.0,
        };
        let rect = region.to_pixel_rect(100, 100);
        assert_eq!(rect.x, 80);
        assert_eq!(rect.width, 20);
    }

    #[test]
    fn validate_rejects_zero_width() {
        let region = Region {
            x: 0.1,
            y: 0.1,
            width: 0.0,
            height: 0.5,
        };
        assert!(region.validate().is_err());
        assert!(Region::FULL.validate().is_ok());
    }
}
