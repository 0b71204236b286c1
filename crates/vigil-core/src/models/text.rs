//! 텍스트 인식 결과 모델.

use serde::{Deserialize, Serialize};

use super::geometry::BoundingBox;

/// 엔진이 잡음으로 표시한 토큰의 신뢰도 값
pub const NOISE_CONFIDENCE: f64 = -1.0;

/// 헤더에 `conf` 컬럼이 없을 때의 사유 문자열
pub const REASON_TSV_FORMAT_UNEXPECTED: &str = "tsv_format_unexpected";

/// 인식된 텍스트 조각
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TextToken {
    /// 인식된 텍스트
    pub text: String,
    /// 토큰 신뢰도 (`-1`은 잡음)
    pub confidence: f64,
    /// 위치 정보 (엔진 출력에 좌표 컬럼이 있을 때만)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bounds: Option<BoundingBox>,
}

impl TextToken {
    /// 잡음 토큰 여부 — 집계에서는 제외되지만 목록에는 남는다
    pub fn is_noise(&self) -> bool {
        self.confidence == NOISE_CONFIDENCE
    }
}

/// 파싱 + 집계 결과
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TextRecognition {
    /// 토큰 목록 (잡음 토큰 포함)
    pub tokens: Vec<TextToken>,
    /// 비잡음 토큰 신뢰도의 산술 평균 (없으면 0)
    pub confidence: f64,
    /// 형식 오류 사유 (헤더 불일치일 때만 설정)
    pub reason: Option<String>,
}

impl TextRecognition {
    /// 형식 오류 결과
    pub fn format_unexpected() -> Self {
        Self {
            tokens: Vec::new(),
            confidence: 0.0,
            reason: Some(REASON_TSV_FORMAT_UNEXPECTED.to_string()),
        }
    }

    /// 비어 있지 않은 토큰 텍스트를 공백 하나로 연결 (표시용, 잡음 포함)
    pub fn text(&self) -> String {
        join_tokens(self.tokens.iter())
    }

    /// 잡음 토큰을 뺀 텍스트 — 문자열 조건 판정은 이것으로만 한다
    pub fn reliable_text(&self) -> String {
        join_tokens(self.tokens.iter().filter(|t| !t.is_noise()))
    }

    /// 형식이 정상인지 여부
    pub fn is_well_formed(&self) -> bool {
        self.reason.is_none()
    }
}

fn join_tokens<'a>(tokens: impl Iterator<Item = &'a TextToken>) -> String {
    tokens
        .map(|t| t.text.trim())
        .filter(|t| !t.is_empty())
        .collect::<Vec<_>>()
        .join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn token(text: &str, confidence: f64) -> TextToken {
        TextToken {
            text: text.to_string(),
            confidence,
            bounds: None,
        }
    }

    #[test]
    fn noise_detection() {
        assert!(token("", -1.0).is_noise());
        assert!(!token("OK", 0.0).is_noise());
    }

    #[test]
    fn text_skips_empty_tokens() {
        let recognition = TextRecognition {
            tokens: vec![token("", -1.0), token("Level", 91.0), token(" Up ", 88.0)],
            confidence: 89.5,
            reason: None,
        };
        assert_eq!(recognition.text(), "Level Up");
    }

    #[test]
    fn reliable_text_drops_noise_tokens() {
        let recognition = TextRecognition {
            tokens: vec![token("Press", 95.0), token("Victory", -1.0), token("Start", 0.0)],
            confidence: 47.5,
            reason: None,
        };
        assert_eq!(recognition.text(), "Press Victory Start");
        assert_eq!(recognition.reliable_text(), "Press Start");
    }

    #[test]
    fn format_unexpected_has_reason() {
        let r = TextRecognition::format_unexpected();
        assert!(!r.is_well_formed());
        assert_eq!(r.reason.as_deref(), Some("tsv_format_unexpected"));
        assert_eq!(r.confidence, 0.0);
    }
}
