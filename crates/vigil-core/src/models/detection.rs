//! 템플릿 매칭 결과 모델.
//!
//! 매처가 만든 후보(`Detection`), 호출별 매칭 설정(`MatchConfig`),
//! 억제 후 결과(`MatchOutcome`), 좌표 해석 대상(`DetectionTarget`)을 정의한다.

use serde::{Deserialize, Serialize};

use super::geometry::BoundingBox;
use crate::error::CoreError;

/// 점수가 매겨진 박스 (억제 전에는 후보, 억제 후에는 검출)
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Detection {
    /// 템플릿 배치 영역
    pub bounds: BoundingBox,
    /// 유사도 점수 (일반적으로 0.0 ~ 1.0)
    pub confidence: f64,
}

impl Detection {
    pub fn new(bounds: BoundingBox, confidence: f64) -> Self {
        Self { bounds, confidence }
    }
}

/// 호출별 매칭 설정
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MatchConfig {
    /// 후보 발견 임계값 (0.0 ~ 1.0)
    pub threshold: f64,
    /// 반환할 최대 검출 수 (1 이상)
    pub max_results: usize,
    /// 중복 억제 IoU 임계값 (0.0 ~ 1.0)
    pub overlap: f64,
}

impl MatchConfig {
    pub fn new(threshold: f64, max_results: usize, overlap: f64) -> Self {
        Self {
            threshold,
            max_results,
            overlap,
        }
    }

    /// 범위 검증
    pub fn validate(&self) -> Result<(), CoreError> {
        if !(0.0..=1.0).contains(&self.threshold) {
            return Err(CoreError::validation(
                "threshold",
                format!("0.0 ~ 1.0 범위여야 함 (입력: {})", self.threshold),
            ));
        }
        if self.max_results == 0 {
            return Err(CoreError::validation("max_results", "1 이상이어야 함"));
        }
        if !(0.0..=1.0).contains(&self.overlap) {
            return Err(CoreError::validation(
                "overlap",
                format!("0.0 ~ 1.0 범위여야 함 (입력: {})", self.overlap),
            ));
        }
        Ok(())
    }
}

impl Default for MatchConfig {
    fn default() -> Self {
        Self {
            threshold: 0.8,
            max_results: 10,
            overlap: 0.3,
        }
    }
}

/// 매칭 결과 — 억제 후 검출 목록 (신뢰도 내림차순)
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MatchOutcome {
    /// 검출 목록
    pub detections: Vec<Detection>,
    /// 반환 한도 때문에 잘려나간 후보가 있었는지 여부
    pub limits_hit: bool,
}

impl MatchOutcome {
    /// 빈 결과 ("매칭 불가" 포함)
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn is_empty(&self) -> bool {
        self.detections.is_empty()
    }

    pub fn len(&self) -> usize {
        self.detections.len()
    }
}

/// 좌표 해석 대상
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DetectionTarget {
    /// 참조 템플릿 식별자
    pub reference_id: String,
    /// 수락 임계값 — 매처의 발견 임계값과 독립적
    pub confidence: f64,
    /// 중심 좌표에 더할 X 오프셋 (픽셀)
    #[serde(default)]
    pub offset_x: i32,
    /// 중심 좌표에 더할 Y 오프셋 (픽셀)
    #[serde(default)]
    pub offset_y: i32,
}

impl DetectionTarget {
    pub fn new(reference_id: impl Into<String>, confidence: f64) -> Self {
        Self {
            reference_id: reference_id.into(),
            confidence,
            offset_x: 0,
            offset_y: 0,
        }
    }

    pub fn with_offset(mut self, offset_x: i32, offset_y: i32) -> Self {
        self.offset_x = offset_x;
        self.offset_y = offset_y;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_is_valid() {
        assert!(MatchConfig::default().validate().is_ok());
    }

    #[test]
    fn config_rejects_out_of_range() {
        assert!(MatchConfig::new(1.5, 10, 0.3).validate().is_err());
        assert!(MatchConfig::new(0.5, 0, 0.3).validate().is_err());
        assert!(MatchConfig::new(0.5, 10, -0.1).validate().is_err());
    }

    #[test]
    fn target_offset_defaults_to_zero_in_json() {
        let target: DetectionTarget =
            serde_json::from_str(r#"{"reference_id":"ok_button","confidence":0.9}"#).unwrap();
        assert_eq!(target.offset_x, 0);
        assert_eq!(target.offset_y, 0);
    }
}
