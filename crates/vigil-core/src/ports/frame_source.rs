//! 프레임 소스 포트.
//!
//! 화면 캡처 자체는 코어의 범위 밖이다. 코어는 디코딩된 래스터만 받는다.
//! 구현: `vigil-vision::capture::FileFrameSource`

use async_trait::async_trait;
use image::DynamicImage;

use crate::error::CoreError;

/// 디코딩된 화면 프레임을 제공하는 소스
#[async_trait]
pub trait FrameSource: Send + Sync {
    /// 최신 프레임 1장 반환
    async fn capture(&self) -> Result<DynamicImage, CoreError>;

    /// 소스 이름 (로그용)
    fn name(&self) -> &str;
}
