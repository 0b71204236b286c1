//! 애플리케이션 설정 구조체.
//!
//! 매칭 기본값, 텍스트 인식 엔진, 템플릿 디렉토리, 스윕 주기 등
//! 런타임 설정을 정의한다. `vigil-app`이 `config` crate로 파일/환경변수에서 로드한다.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::PathBuf;
use std::time::Duration;

use crate::error::CoreError;
use crate::models::detection::MatchConfig;

/// 최상위 애플리케이션 설정
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    /// 템플릿 매칭 기본값
    #[serde(default)]
    pub matching: MatchingConfig,
    /// 텍스트 인식 엔진 설정
    #[serde(default)]
    pub recognizer: RecognizerConfig,
    /// 템플릿 저장소 설정
    #[serde(default)]
    pub templates: TemplateStoreConfig,
    /// 트리거 스윕 설정
    #[serde(default)]
    pub sweep: SweepConfig,
}

// ============================================================
// 매칭 설정
// ============================================================

/// 템플릿 매칭 기본값
///
/// 이미지 트리거는 `threshold` 대신 자신의 유사도 임계값을 쓰고,
/// `overlap`과 `max_results`만 여기서 가져간다.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct MatchingConfig {
    /// 후보 발견 임계값
    pub threshold: f64,
    /// 중복 억제 IoU 임계값
    pub overlap: f64,
    /// 최대 검출 수
    pub max_results: usize,
}

impl Default for MatchingConfig {
    fn default() -> Self {
        Self {
            threshold: 0.8,
            overlap: 0.3,
            max_results: 10,
        }
    }
}

impl MatchingConfig {
    /// 호출별 `MatchConfig`로 변환
    pub fn to_match_config(&self) -> MatchConfig {
        MatchConfig::new(self.threshold, self.max_results, self.overlap)
    }
}

// ============================================================
// 텍스트 인식 설정
// ============================================================

/// Tesseract CLI 설정
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RecognizerConfig {
    /// 실행 파일 경로 또는 이름
    pub executable: PathBuf,
    /// 언어 코드 (예: "eng", "eng+kor")
    pub language: String,
    /// 페이지 분할 모드 (--psm)
    pub psm: u8,
    /// tessdata 디렉토리 (None이면 엔진 기본값)
    pub tessdata_dir: Option<PathBuf>,
    /// 사용자 단어 목록 파일
    pub user_words: Option<PathBuf>,
    /// `-c key=value`로 전달할 엔진 변수
    pub extra_vars: BTreeMap<String, String>,
}

impl Default for RecognizerConfig {
    fn default() -> Self {
        Self {
            executable: PathBuf::from("tesseract"),
            language: "eng".to_string(),
            psm: 6,
            tessdata_dir: None,
            user_words: None,
            extra_vars: BTreeMap::new(),
        }
    }
}

// ============================================================
// 템플릿 저장소 설정
// ============================================================

/// 디렉토리 기반 템플릿 저장소 설정
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TemplateStoreConfig {
    /// 템플릿 이미지 디렉토리
    pub directory: PathBuf,
    /// 디코딩된 템플릿 LRU 캐시 크기
    pub cache_capacity: usize,
}

impl Default for TemplateStoreConfig {
    fn default() -> Self {
        Self {
            directory: PathBuf::from("templates"),
            cache_capacity: 32,
        }
    }
}

// ============================================================
// 스윕 설정
// ============================================================

/// 트리거 스윕 주기 설정
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SweepConfig {
    /// 스윕 간격 (밀리초)
    pub interval_ms: u64,
    /// 실행할 스윕 횟수
    pub cycles: u32,
}

impl Default for SweepConfig {
    fn default() -> Self {
        Self {
            interval_ms: 1_000,
            cycles: 1,
        }
    }
}

impl AppConfig {
    /// 기본 설정
    pub fn default_config() -> Self {
        Self::default()
    }

    /// 스윕 간격
    pub fn sweep_interval(&self) -> Duration {
        Duration::from_millis(self.sweep.interval_ms)
    }

    /// 범위 검증
    pub fn validate(&self) -> Result<(), CoreError> {
        self.matching
            .to_match_config()
            .validate()
            .map_err(|e| match e {
                CoreError::Validation { field, message } => CoreError::Validation {
                    field: format!("matching.{field}"),
                    message,
                },
                other => other,
            })?;

        if self.recognizer.language.trim().is_empty() {
            return Err(CoreError::validation(
                "recognizer.language",
                "비어 있을 수 없음",
            ));
        }
        if self.recognizer.psm > 13 {
            return Err(CoreError::validation(
                "recognizer.psm",
                format!("0 ~ 13 범위여야 함 (입력: {})", self.recognizer.psm),
            ));
        }
        if self.templates.cache_capacity == 0 {
            return Err(CoreError::validation(
                "templates.cache_capacity",
                "1 이상이어야 함",
            ));
        }
        if self.sweep.interval_ms == 0 {
            return Err(CoreError::validation("sweep.interval_ms", "1 이상이어야 함"));
        }
        Ok(())
    }
}
