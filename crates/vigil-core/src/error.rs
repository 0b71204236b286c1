//! Vigil 핵심 에러 타입.
//!
//! 어댑터 crate(`vigil-vision`, `vigil-automation`)는 이 타입을 그대로 반환한다.
//! 매칭 실패나 모호성 같은 "정상적인 실패"는 에러가 아니라 값으로 표현되므로
//! 여기에는 인프라 계층의 실패만 정의한다.

use thiserror::Error;

/// 코어 레이어 에러.
#[derive(Debug, Error)]
pub enum CoreError {
    /// JSON 직렬화/역직렬화 실패
    #[error("직렬화 에러: {0}")]
    Serialization(#[from] serde_json::Error),

    /// 설정값 오류
    #[error("설정 에러: {0}")]
    Config(String),

    /// 필드 유효성 검증 실패
    #[error("유효성 검증 실패 — {field}: {message}")]
    Validation {
        /// 검증 실패한 필드명
        field: String,
        /// 실패 사유
        message: String,
    },

    /// 리소스를 찾을 수 없음
    #[error("{resource_type} 미발견: {id}")]
    NotFound {
        /// 리소스 종류 (예: "Template", "Trigger")
        resource_type: String,
        /// 리소스 식별자
        id: String,
    },

    /// 이미지 디코딩/인코딩 실패
    #[error("이미지 에러: {0}")]
    Image(#[from] image::ImageError),

    /// 텍스트 인식 엔진 실행 실패
    #[error("텍스트 인식 에러: {0}")]
    Recognizer(String),

    /// I/O 에러
    #[error("I/O 에러: {0}")]
    Io(#[from] std::io::Error),

    /// 내부 에러 (예상치 못한 상황)
    #[error("내부 에러: {0}")]
    Internal(String),
}

impl CoreError {
    /// `Validation` 에러 생성 헬퍼
    pub fn validation(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Validation {
            field: field.into(),
            message: message.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn validation_display_includes_field() {
        let err = CoreError::validation("matching.threshold", "0..=1 범위여야 함");
        let msg = err.to_string();
        assert!(msg.contains("matching.threshold"));
        assert!(msg.contains("0..=1"));
    }

    #[test]
    fn not_found_display() {
        let err = CoreError::NotFound {
            resource_type: "Template".to_string(),
            id: "start_button".to_string(),
        };
        assert_eq!(err.to_string(), "Template 미발견: start_button");
    }

    #[test]
    fn io_error_converts() {
        let io = std::io::Error::new(std::io::ErrorKind::NotFound, "없음");
        let err: CoreError = io.into();
        assert!(matches!(err, CoreError::Io(_)));
    }
}
