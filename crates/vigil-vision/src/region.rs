//! 분수 영역 → 픽셀 부분 이미지.

use std::borrow::Cow;

use image::GrayImage;
use vigil_core::models::geometry::BoundingBox;
use vigil_core::models::region::Region;

/// 잘라낸 부분 이미지와 전체 프레임 내 위치
#[derive(Debug, Clone)]
pub struct RegionView<'a> {
    /// 부분 이미지 (영역이 없으면 원본을 빌린다)
    pub image: Cow<'a, GrayImage>,
    /// 전체 프레임 기준 픽셀 사각형
    pub rect: BoundingBox,
}

impl RegionView<'_> {
    /// 부분 이미지 좌상단의 전체 프레임 좌표
    pub fn origin(&self) -> (i32, i32) {
        (self.rect.x, self.rect.y)
    }
}

/// 영역만큼 프레임을 잘라낸다 (`None`이면 전체 프레임)
pub fn crop_region<'a>(frame: &'a GrayImage, region: Option<&Region>) -> RegionView<'a> {
    let full = BoundingBox::new(0, 0, frame.width(), frame.height());

    let Some(region) = region else {
        return RegionView {
            image: Cow::Borrowed(frame),
            rect: full,
        };
    };

    let rect = region.to_pixel_rect(frame.width(), frame.height());
    if rect == full {
        return RegionView {
            image: Cow::Borrowed(frame),
            rect,
        };
    }

    let cropped =
        image::imageops::crop_imm(frame, rect.x as u32, rect.y as u32, rect.width, rect.height)
            .to_image();

    RegionView {
        image: Cow::Owned(cropped),
        rect,
    }
}
