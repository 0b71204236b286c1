//! 트리거 평가기.
//!
//! `(trigger, context) -> (result, updated trigger)` 순수 함수.
//! 평가기 자체는 상태가 없고, 갱신된 트리거의 저장은 호출자 책임이다.
//!
//! 평가 순서:
//! 1. 비활성 → `Disabled` (조건 평가 생략)
//! 2. 유형별 조건 평가 (경과 시간 / 절대 시각 / 이미지 / 텍스트)
//! 3. 조건 충족 시 쿨다운 확인 → `Cooldown` 또는 `Satisfied` (+ `last_fired_at` 갱신)
//! 4. 미충족 → `Pending`

use chrono::{DateTime, Utc};
use image::GrayImage;
use tracing::{debug, info};
use vigil_core::config::MatchingConfig;
use vigil_core::models::detection::{DetectionTarget, MatchConfig};
use vigil_core::models::geometry::Point;
use vigil_core::models::region::Region;
use vigil_core::models::trigger::{
    TextMatchMode, Trigger, TriggerCondition, TriggerEvaluationResult, TriggerStatus,
};
use vigil_core::ports::template_store::TemplateStore;
use vigil_core::ports::text_recognizer::TextRecognizer;
use vigil_vision::region::crop_region;
use vigil_vision::{matcher, resolver, tsv};

/// 비활성 트리거 사유
pub const REASON_DISABLED: &str = "disabled";
/// 프레임 없이 화면 조건을 평가한 경우
pub const REASON_FRAME_UNAVAILABLE: &str = "frame unavailable";

/// 한 번의 평가에 필요한 입력
///
/// 한 스윕의 모든 트리거는 같은 `now`와 같은 프레임을 공유한다.
#[derive(Clone, Copy)]
pub struct EvaluationContext<'a> {
    /// 평가 시각
    pub now: DateTime<Utc>,
    /// `Delay` 기준 시각 (세션 시작)
    pub session_started_at: DateTime<Utc>,
    /// 이번 스윕의 프레임 (단일 채널)
    pub frame: Option<&'a GrayImage>,
    /// 참조 템플릿 저장소
    pub templates: &'a dyn TemplateStore,
    /// 텍스트 인식 엔진
    pub recognizer: &'a dyn TextRecognizer,
    /// 중복 억제 설정 (`overlap`, `max_results`)
    pub matching: &'a MatchingConfig,
}

impl<'a> EvaluationContext<'a> {
    /// 프레임 없는 컨텍스트
    pub fn new(
        now: DateTime<Utc>,
        session_started_at: DateTime<Utc>,
        templates: &'a dyn TemplateStore,
        recognizer: &'a dyn TextRecognizer,
        matching: &'a MatchingConfig,
    ) -> Self {
        Self {
            now,
            session_started_at,
            frame: None,
            templates,
            recognizer,
            matching,
        }
    }

    pub fn with_frame(mut self, frame: &'a GrayImage) -> Self {
        self.frame = Some(frame);
        self
    }
}

/// 평가 결과 + 갱신된 트리거 사본
#[derive(Debug, Clone, PartialEq)]
pub struct TriggerEvaluation {
    pub result: TriggerEvaluationResult,
    pub trigger: Trigger,
}

/// 유형별 조건 평가 결과
#[derive(Debug, Default)]
struct ConditionCheck {
    met: bool,
    similarity: Option<f64>,
    confidence: Option<f64>,
    reason: Option<String>,
    location: Option<Point>,
}

impl ConditionCheck {
    fn met(met: bool) -> Self {
        Self {
            met,
            ..Self::default()
        }
    }

    fn unmet_because(reason: impl Into<String>) -> Self {
        Self {
            met: false,
            reason: Some(reason.into()),
            ..Self::default()
        }
    }
}

/// 트리거 평가 — 원본은 건드리지 않고 갱신된 사본을 돌려준다
pub fn evaluate(trigger: &Trigger, ctx: &EvaluationContext<'_>) -> TriggerEvaluation {
    let mut updated = trigger.clone();
    let result = evaluate_in_place(&mut updated, ctx);
    TriggerEvaluation {
        result,
        trigger: updated,
    }
}

/// 트리거 평가 — `last_fired_at`, `last_evaluated_at`, `last_result`를 직접 갱신
pub fn evaluate_in_place(trigger: &mut Trigger, ctx: &EvaluationContext<'_>) -> TriggerEvaluationResult {
    let now = ctx.now;

    let result = if !trigger.enabled {
        TriggerEvaluationResult::new(TriggerStatus::Disabled, now).with_reason(REASON_DISABLED)
    } else {
        let check = check_condition(&trigger.condition, ctx);
        let status = if !check.met {
            TriggerStatus::Pending
        } else if in_cooldown(trigger, now) {
            TriggerStatus::Cooldown
        } else {
            trigger.last_fired_at = Some(now);
            TriggerStatus::Satisfied
        };

        TriggerEvaluationResult {
            status,
            similarity: check.similarity,
            confidence: check.confidence,
            reason: check.reason,
            location: check.location,
            evaluated_at: now,
        }
    };

    if result.status == TriggerStatus::Satisfied {
        info!(
            trigger_id = %trigger.id,
            kind = trigger.condition.kind(),
            similarity = ?result.similarity,
            confidence = ?result.confidence,
            "트리거 발동"
        );
    } else {
        debug!(
            trigger_id = %trigger.id,
            kind = trigger.condition.kind(),
            status = %result.status,
            reason = ?result.reason,
            "트리거 평가"
        );
    }

    trigger.last_evaluated_at = Some(now);
    trigger.last_result = Some(result.clone());
    result
}

/// `now - since`가 `seconds` 이상인지 (밀리초 정밀도, 음수 경과는 미충족)
fn elapsed_at_least(since: DateTime<Utc>, now: DateTime<Utc>, seconds: u64) -> bool {
    let elapsed_ms = i128::from((now - since).num_milliseconds());
    elapsed_ms >= i128::from(seconds) * 1_000
}

/// 조건 충족 + 마지막 발동 후 쿨다운 미경과
fn in_cooldown(trigger: &Trigger, now: DateTime<Utc>) -> bool {
    match trigger.last_fired_at {
        Some(last) if trigger.cooldown_seconds > 0 => {
            !elapsed_at_least(last, now, trigger.cooldown_seconds)
        }
        _ => false,
    }
}

fn check_condition(condition: &TriggerCondition, ctx: &EvaluationContext<'_>) -> ConditionCheck {
    match condition {
        TriggerCondition::Delay { seconds } => {
            ConditionCheck::met(elapsed_at_least(ctx.session_started_at, ctx.now, *seconds))
        }
        TriggerCondition::Schedule { at } => ConditionCheck::met(ctx.now >= *at),
        TriggerCondition::ImageMatch {
            reference_id,
            region,
            similarity_threshold,
        } => check_image(reference_id, region.as_ref(), *similarity_threshold, ctx),
        TriggerCondition::TextMatch {
            text,
            region,
            confidence_threshold,
            mode,
        } => check_text(text, region.as_ref(), *confidence_threshold, *mode, ctx),
    }
}

/// 이미지 조건 — 영역 안에서 유사도 임계값 이상인 검출이 정확히 하나
fn check_image(
    reference_id: &str,
    region: Option<&Region>,
    similarity_threshold: f64,
    ctx: &EvaluationContext<'_>,
) -> ConditionCheck {
    let Some(frame) = ctx.frame else {
        return ConditionCheck::unmet_because(REASON_FRAME_UNAVAILABLE);
    };

    let template = match ctx.templates.load(reference_id) {
        Ok(Some(template)) => template,
        Ok(None) => {
            return ConditionCheck::unmet_because(format!("template not found: {reference_id}"))
        }
        Err(e) => {
            return ConditionCheck::unmet_because(format!(
                "template unavailable: {reference_id}: {e}"
            ))
        }
    };

    let view = crop_region(frame, region);
    let config = MatchConfig::new(
        similarity_threshold,
        ctx.matching.max_results,
        ctx.matching.overlap,
    );
    let outcome = matcher::match_template(&view.image, &template, &config);
    let target = DetectionTarget::new(reference_id, similarity_threshold);

    match resolver::resolve(&target, &outcome, view.image.width(), view.image.height()) {
        Ok(coordinate) => {
            let (ox, oy) = view.origin();
            let coordinate = coordinate.translated(ox, oy);
            ConditionCheck {
                met: true,
                similarity: Some(coordinate.score()),
                location: Some(coordinate.point()),
                ..ConditionCheck::default()
            }
        }
        Err(e) => ConditionCheck {
            met: false,
            similarity: outcome.detections.first().map(|d| d.confidence),
            reason: Some(e.to_string()),
            ..ConditionCheck::default()
        },
    }
}

/// 텍스트 조건 — 인식 실패/형식 오류는 두 모드 모두 미충족
fn check_text(
    target: &str,
    region: Option<&Region>,
    confidence_threshold: f64,
    mode: TextMatchMode,
    ctx: &EvaluationContext<'_>,
) -> ConditionCheck {
    let Some(frame) = ctx.frame else {
        return ConditionCheck::unmet_because(REASON_FRAME_UNAVAILABLE);
    };

    let view = crop_region(frame, region);
    let raw = match ctx.recognizer.recognize_tsv(&view.image) {
        Ok(raw) => raw,
        Err(e) => {
            return ConditionCheck::unmet_because(format!(
                "recognizer failed ({}): {e}",
                ctx.recognizer.name()
            ))
        }
    };

    let recognition = tsv::parse_tsv(&raw);
    if let Some(reason) = recognition.reason {
        return ConditionCheck::unmet_because(reason);
    }

    let found = contains_normalized(&recognition.reliable_text(), target)
        && recognition.confidence >= confidence_threshold;
    let met = match mode {
        TextMatchMode::Found => found,
        TextMatchMode::NotFound => !found,
    };

    ConditionCheck {
        met,
        confidence: Some(recognition.confidence),
        ..ConditionCheck::default()
    }
}

/// 소문자 + 공백 축약
fn normalize(text: &str) -> String {
    text.split_whitespace()
        .map(str::to_lowercase)
        .collect::<Vec<_>>()
        .join(" ")
}

fn contains_normalized(haystack: &str, needle: &str) -> bool {
    let needle = normalize(needle);
    !needle.is_empty() && normalize(haystack).contains(&needle)
}
