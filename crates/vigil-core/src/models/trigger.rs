//! 트리거 모델.
//!
//! 트리거는 저작 계층(외부)이 생성/편집하고, 평가기가 반복 평가한다.
//! `last_fired_at`, `last_evaluated_at`, `last_result`는 평가기만 변경한다.
//! 유형별 파라미터는 `type` 태그로 구분되는 `TriggerCondition`에 담긴다.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::geometry::Point;
use super::region::Region;
use crate::error::CoreError;

/// 평가 결과 상태
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TriggerStatus {
    /// 조건 미충족
    Pending,
    /// 조건 충족, 쿨다운 아님
    Satisfied,
    /// 조건은 충족했지만 쿨다운 중
    Cooldown,
    /// 비활성화됨
    Disabled,
}

impl std::fmt::Display for TriggerStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            TriggerStatus::Pending => "pending",
            TriggerStatus::Satisfied => "satisfied",
            TriggerStatus::Cooldown => "cooldown",
            TriggerStatus::Disabled => "disabled",
        };
        f.write_str(s)
    }
}

/// 텍스트 매칭 모드
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TextMatchMode {
    /// 대상 문자열이 임계 신뢰도 이상으로 보이면 충족
    #[default]
    Found,
    /// 대상 문자열이 보이지 않으면 (또는 임계 미만이면) 충족
    NotFound,
}

/// 유형별 트리거 조건
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum TriggerCondition {
    /// 기준 시각(세션 시작 등) 이후 경과 시간
    Delay {
        /// 경과 초
        seconds: u64,
    },
    /// 절대 시각
    Schedule {
        /// 발동 시각
        at: DateTime<Utc>,
    },
    /// 이미지 템플릿 매칭
    ImageMatch {
        /// 참조 템플릿 식별자
        reference_id: String,
        /// 탐색 영역 (없으면 전체 프레임)
        #[serde(default, skip_serializing_if = "Option::is_none")]
        region: Option<Region>,
        /// 유사도 임계값 (0.0 ~ 1.0)
        similarity_threshold: f64,
    },
    /// 텍스트 인식 매칭
    TextMatch {
        /// 대상 문자열
        text: String,
        /// 인식 영역 (없으면 전체 프레임)
        #[serde(default, skip_serializing_if = "Option::is_none")]
        region: Option<Region>,
        /// 집계 신뢰도 임계값 (인식 엔진 척도, 0 ~ 100)
        confidence_threshold: f64,
        /// 매칭 모드
        #[serde(default)]
        mode: TextMatchMode,
    },
}

impl TriggerCondition {
    /// 유형 이름 (로그용)
    pub fn kind(&self) -> &'static str {
        match self {
            TriggerCondition::Delay { .. } => "delay",
            TriggerCondition::Schedule { .. } => "schedule",
            TriggerCondition::ImageMatch { .. } => "image_match",
            TriggerCondition::TextMatch { .. } => "text_match",
        }
    }

    /// 프레임이 필요한 조건인지 여부
    pub fn needs_frame(&self) -> bool {
        matches!(
            self,
            TriggerCondition::ImageMatch { .. } | TriggerCondition::TextMatch { .. }
        )
    }
}

/// 트리거 평가 결과
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TriggerEvaluationResult {
    /// 상태
    pub status: TriggerStatus,
    /// 이미지 매칭 유사도
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub similarity: Option<f64>,
    /// 텍스트 인식 집계 신뢰도
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub confidence: Option<f64>,
    /// 사유 (UI/로그에 그대로 표시)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
    /// 이미지 매칭으로 확정된 전체 프레임 좌표
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub location: Option<Point>,
    /// 평가 시각
    pub evaluated_at: DateTime<Utc>,
}

impl TriggerEvaluationResult {
    pub fn new(status: TriggerStatus, evaluated_at: DateTime<Utc>) -> Self {
        Self {
            status,
            similarity: None,
            confidence: None,
            reason: None,
            location: None,
            evaluated_at,
        }
    }

    pub fn with_reason(mut self, reason: impl Into<String>) -> Self {
        self.reason = Some(reason.into());
        self
    }
}

/// 트리거
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Trigger {
    /// 트리거 ID
    pub id: String,
    /// 표시 이름
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    /// 활성화 여부
    #[serde(default = "default_true")]
    pub enabled: bool,
    /// 연속 발동 사이 최소 간격 (초)
    #[serde(default)]
    pub cooldown_seconds: u64,
    /// 마지막 발동 시각
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_fired_at: Option<DateTime<Utc>>,
    /// 마지막 평가 시각
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_evaluated_at: Option<DateTime<Utc>>,
    /// 마지막 평가 결과
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_result: Option<TriggerEvaluationResult>,
    /// 유형별 조건
    #[serde(flatten)]
    pub condition: TriggerCondition,
}

fn default_true() -> bool {
    true
}

impl Trigger {
    /// 활성화된 새 트리거 (쿨다운 0, 평가 이력 없음)
    pub fn new(id: impl Into<String>, condition: TriggerCondition) -> Self {
        Self {
            id: id.into(),
            name: None,
            enabled: true,
            cooldown_seconds: 0,
            last_fired_at: None,
            last_evaluated_at: None,
            last_result: None,
            condition,
        }
    }

    pub fn with_cooldown(mut self, seconds: u64) -> Self {
        self.cooldown_seconds = seconds;
        self
    }

    pub fn with_enabled(mut self, enabled: bool) -> Self {
        self.enabled = enabled;
        self
    }

    /// 파라미터 유효성 검증 (저작 계층에서 받은 레코드용)
    pub fn validate(&self) -> Result<(), CoreError> {
        if self.id.trim().is_empty() {
            return Err(CoreError::validation("id", "비어 있을 수 없음"));
        }
        match &self.condition {
            TriggerCondition::Delay { .. } | TriggerCondition::Schedule { .. } => Ok(()),
            TriggerCondition::ImageMatch {
                reference_id,
                region,
                similarity_threshold,
            } => {
                if reference_id.trim().is_empty() {
                    return Err(CoreError::validation("reference_id", "비어 있을 수 없음"));
                }
                if !(0.0..=1.0).contains(similarity_threshold) {
                    return Err(CoreError::validation(
                        "similarity_threshold",
                        format!("0.0 ~ 1.0 범위여야 함 (입력: {similarity_threshold})"),
                    ));
                }
                region.as_ref().map_or(Ok(()), Region::validate)
            }
            TriggerCondition::TextMatch {
                text,
                region,
                confidence_threshold,
                ..
            } => {
                if text.trim().is_empty() {
                    return Err(CoreError::validation("text", "비어 있을 수 없음"));
                }
                if !confidence_threshold.is_finite() || *confidence_threshold < 0.0 {
                    return Err(CoreError::validation(
                        "confidence_threshold",
                        format!("0 이상이어야 함 (입력: {confidence_threshold})"),
                    ));
                }
                region.as_ref().map_or(Ok(()), Region::validate)
            }
        }
    }
}
