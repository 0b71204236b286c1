//! 참조 템플릿 저장소 포트.
//!
//! "식별자 → 이미지" 해석은 외부 협력자 책임이다.
//! 구현: `DirectoryTemplateStore`, `InMemoryTemplateStore` (`vigil-vision::template_store`)

use std::sync::Arc;

use image::GrayImage;

use crate::error::CoreError;

/// 식별자로 참조 템플릿(단일 채널)을 조회
pub trait TemplateStore: Send + Sync {
    /// 템플릿 조회. 없으면 `Ok(None)`.
    fn load(&self, reference_id: &str) -> Result<Option<Arc<GrayImage>>, CoreError>;
}
