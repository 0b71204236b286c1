//! 참조 템플릿 저장소 구현.
//!
//! - `DirectoryTemplateStore`: `<dir>/<id>.{png,jpg,jpeg,bmp}` 디코딩 + LRU 캐시
//! - `InMemoryTemplateStore`: 테스트/임베딩용 고정 맵

use std::collections::HashMap;
use std::num::NonZeroUsize;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use image::GrayImage;
use lru::LruCache;
use parking_lot::{Mutex, RwLock};
use tracing::{debug, warn};
use vigil_core::config::TemplateStoreConfig;
use vigil_core::error::CoreError;
use vigil_core::ports::template_store::TemplateStore;

/// 탐색할 확장자 (우선순위 순)
const EXTENSIONS: [&str; 4] = ["png", "jpg", "jpeg", "bmp"];

/// 식별자 검증 — 경로 구분자와 상위 디렉토리 참조 금지
fn validate_reference_id(reference_id: &str) -> Result<(), CoreError> {
    if reference_id.trim().is_empty() {
        return Err(CoreError::validation("reference_id", "비어 있음"));
    }
    if reference_id.contains(['/', '\\']) || reference_id.contains("..") {
        return Err(CoreError::validation(
            "reference_id",
            format!("경로 문자를 포함할 수 없음: {reference_id}"),
        ));
    }
    Ok(())
}

/// 디렉토리 기반 템플릿 저장소
pub struct DirectoryTemplateStore {
    directory: PathBuf,
    cache: Mutex<LruCache<String, Arc<GrayImage>>>,
}

impl DirectoryTemplateStore {
    /// 새 저장소 생성 (용량 0은 1로 올린다)
    pub fn new(directory: impl Into<PathBuf>, cache_capacity: usize) -> Self {
        let capacity = NonZeroUsize::new(cache_capacity).unwrap_or(NonZeroUsize::MIN);
        Self {
            directory: directory.into(),
            cache: Mutex::new(LruCache::new(capacity)),
        }
    }

    /// 설정에서 생성
    pub fn from_config(config: &TemplateStoreConfig) -> Self {
        Self::new(&config.directory, config.cache_capacity)
    }

    pub fn directory(&self) -> &Path {
        &self.directory
    }

    /// 캐시된 템플릿 수
    pub fn cached_len(&self) -> usize {
        self.cache.lock().len()
    }

    /// 식별자에 해당하는 파일 탐색
    ///
    /// 정확한 파일명을 먼저 찾고, 없으면 대소문자 무시 비교로 디렉토리를 훑는다.
    fn locate(&self, reference_id: &str) -> Result<Option<PathBuf>, CoreError> {
        for ext in EXTENSIONS {
            let candidate = self.directory.join(format!("{reference_id}.{ext}"));
            if candidate.is_file() {
                return Ok(Some(candidate));
            }
        }

        if !self.directory.is_dir() {
            warn!(directory = %self.directory.display(), "템플릿 디렉토리 없음");
            return Ok(None);
        }

        for entry in std::fs::read_dir(&self.directory)? {
            let path = entry?.path();
            let (Some(stem), Some(ext)) = (
                path.file_stem().and_then(|s| s.to_str()),
                path.extension().and_then(|s| s.to_str()),
            ) else {
                continue;
            };

            if stem.eq_ignore_ascii_case(reference_id)
                && EXTENSIONS.iter().any(|e| e.eq_ignore_ascii_case(ext))
                && path.is_file()
            {
                return Ok(Some(path));
            }
        }

        Ok(None)
    }
}

impl TemplateStore for DirectoryTemplateStore {
    fn load(&self, reference_id: &str) -> Result<Option<Arc<GrayImage>>, CoreError> {
        validate_reference_id(reference_id)?;

        if let Some(hit) = self.cache.lock().get(reference_id) {
            return Ok(Some(Arc::clone(hit)));
        }

        let Some(path) = self.locate(reference_id)? else {
            debug!(reference_id, "템플릿 미발견");
            return Ok(None);
        };

        let template = Arc::new(image::open(&path)?.to_luma8());
        debug!(
            reference_id,
            path = %path.display(),
            width = template.width(),
            height = template.height(),
            "템플릿 로드"
        );

        self.cache
            .lock()
            .put(reference_id.to_string(), Arc::clone(&template));
        Ok(Some(template))
    }
}

/// 메모리 템플릿 저장소
#[derive(Default)]
pub struct InMemoryTemplateStore {
    templates: RwLock<HashMap<String, Arc<GrayImage>>>,
}

impl InMemoryTemplateStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// 템플릿 등록 (같은 식별자는 덮어쓴다)
    pub fn insert(&self, reference_id: impl Into<String>, template: GrayImage) {
        self.templates
            .write()
            .insert(reference_id.into(), Arc::new(template));
    }

    /// 빌더 형태 등록
    pub fn with(self, reference_id: impl Into<String>, template: GrayImage) -> Self {
        self.insert(reference_id, template);
        self
    }
}

impl TemplateStore for InMemoryTemplateStore {
    fn load(&self, reference_id: &str) -> Result<Option<Arc<GrayImage>>, CoreError> {
        Ok(self.templates.read().get(reference_id).cloned())
    }
}
