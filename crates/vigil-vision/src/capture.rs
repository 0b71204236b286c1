//! 파일 기반 프레임 소스.
//!
//! 외부 캡처 도구가 주기적으로 덮어쓰는 이미지 파일을 매번 다시 읽는다.

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use image::DynamicImage;
use tracing::debug;
use vigil_core::error::CoreError;
use vigil_core::ports::frame_source::FrameSource;

/// 이미지 파일을 프레임으로 읽는 소스
pub struct FileFrameSource {
    path: PathBuf,
}

impl FileFrameSource {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

#[async_trait]
impl FrameSource for FileFrameSource {
    async fn capture(&self) -> Result<DynamicImage, CoreError> {
        let bytes = tokio::fs::read(&self.path).await.map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                CoreError::NotFound {
                    resource_type: "Frame".to_string(),
                    id: self.path.display().to_string(),
                }
            } else {
                CoreError::Io(e)
            }
        })?;

        let frame = image::load_from_memory(&bytes)?;
        debug!(
            path = %self.path.display(),
            width = frame.width(),
            height = frame.height(),
            "프레임 로드"
        );
        Ok(frame)
    }

    fn name(&self) -> &str {
        "file"
    }
}
