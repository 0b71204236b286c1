//! 트리거 스윕.
//!
//! 한 번의 스윕은 프레임 1장과 `now` 1개를 캡처해 모든 트리거에 공유한다.
//! 트리거마다 자기 `Mutex`를 가지므로 같은 트리거의 평가는 직렬화되고,
//! 서로 다른 트리거는 blocking 풀에서 병렬로 평가된다.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use futures::future::join_all;
use image::GrayImage;
use parking_lot::Mutex;
use serde::Serialize;
use tracing::{debug, warn};
use vigil_core::config::MatchingConfig;
use vigil_core::error::CoreError;
use vigil_core::models::trigger::{Trigger, TriggerEvaluationResult, TriggerStatus};
use vigil_core::ports::frame_source::FrameSource;
use vigil_core::ports::template_store::TemplateStore;
use vigil_core::ports::text_recognizer::TextRecognizer;

use crate::evaluator::{evaluate_in_place, EvaluationContext};

/// 평가 태스크가 패닉 등으로 끝나지 못했을 때의 사유 접두사
pub const REASON_EVALUATION_FAILED: &str = "evaluation task failed";

/// 스윕 한 번의 트리거별 결과
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SweepEntry {
    pub trigger_id: String,
    pub result: TriggerEvaluationResult,
}

/// 스윕 한 번의 결과 (등록 순서)
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SweepReport {
    pub evaluated_at: DateTime<Utc>,
    /// 프레임 캡처 여부
    pub frame_captured: bool,
    pub entries: Vec<SweepEntry>,
}

impl SweepReport {
    /// 이번 스윕에서 발동한 트리거 ID
    pub fn satisfied(&self) -> impl Iterator<Item = &str> {
        self.entries
            .iter()
            .filter(|e| e.result.status == TriggerStatus::Satisfied)
            .map(|e| e.trigger_id.as_str())
    }
}

/// 트리거 레지스트리 + 스윕 실행기
pub struct TriggerSweeper {
    triggers: Vec<Arc<Mutex<Trigger>>>,
    templates: Arc<dyn TemplateStore>,
    recognizer: Arc<dyn TextRecognizer>,
    matching: Arc<MatchingConfig>,
    session_started_at: DateTime<Utc>,
}

impl TriggerSweeper {
    pub fn new(
        templates: Arc<dyn TemplateStore>,
        recognizer: Arc<dyn TextRecognizer>,
        matching: MatchingConfig,
        session_started_at: DateTime<Utc>,
    ) -> Self {
        Self {
            triggers: Vec::new(),
            templates,
            recognizer,
            matching: Arc::new(matching),
            session_started_at,
        }
    }

    /// 트리거 등록 (검증 실패 또는 중복 ID는 거부)
    pub fn register(&mut self, trigger: Trigger) -> Result<(), CoreError> {
        trigger.validate()?;
        if self.triggers.iter().any(|t| t.lock().id == trigger.id) {
            return Err(CoreError::validation(
                "id",
                format!("중복된 트리거 ID: {}", trigger.id),
            ));
        }
        debug!(trigger_id = %trigger.id, kind = trigger.condition.kind(), "트리거 등록");
        self.triggers.push(Arc::new(Mutex::new(trigger)));
        Ok(())
    }

    pub fn len(&self) -> usize {
        self.triggers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.triggers.is_empty()
    }

    /// 현재 트리거 상태 사본 (저장용)
    pub fn snapshot(&self) -> Vec<Trigger> {
        self.triggers.iter().map(|t| t.lock().clone()).collect()
    }

    /// 화면 조건이 있는 활성 트리거가 하나라도 있는지
    fn needs_frame(&self) -> bool {
        self.triggers.iter().any(|t| {
            let t = t.lock();
            t.enabled && t.condition.needs_frame()
        })
    }

    /// 스윕 1회
    ///
    /// 프레임 캡처 실패는 스윕을 중단하지 않는다 — 화면 조건 트리거가 사유와 함께
    /// `Pending`이 될 뿐이다.
    pub async fn sweep(&self, source: &dyn FrameSource, now: DateTime<Utc>) -> SweepReport {
        let frame: Option<Arc<GrayImage>> = if self.needs_frame() {
            match source.capture().await {
                Ok(frame) => Some(Arc::new(frame.to_luma8())),
                Err(e) => {
                    warn!(source = source.name(), error = %e, "프레임 캡처 실패");
                    None
                }
            }
        } else {
            None
        };
        let frame_captured = frame.is_some();

        let trigger_ids: Vec<String> = self.triggers.iter().map(|t| t.lock().id.clone()).collect();

        let tasks = self.triggers.iter().map(|trigger| {
            let trigger = Arc::clone(trigger);
            let frame = frame.clone();
            let templates = Arc::clone(&self.templates);
            let recognizer = Arc::clone(&self.recognizer);
            let matching = Arc::clone(&self.matching);
            let session_started_at = self.session_started_at;

            tokio::task::spawn_blocking(move || {
                let mut trigger = trigger.lock();
                let mut ctx = EvaluationContext::new(
                    now,
                    session_started_at,
                    templates.as_ref(),
                    recognizer.as_ref(),
                    &matching,
                );
                if let Some(frame) = frame.as_deref() {
                    ctx = ctx.with_frame(frame);
                }
                evaluate_in_place(&mut trigger, &ctx)
            })
        });

        // 태스크가 실패해도 자리를 지켜 등록 순서를 유지
        let entries: Vec<SweepEntry> = join_all(tasks)
            .await
            .into_iter()
            .zip(trigger_ids)
            .map(|(joined, trigger_id)| {
                let result = joined.unwrap_or_else(|e| {
                    warn!(trigger_id = %trigger_id, error = %e, "트리거 평가 태스크 실패");
                    TriggerEvaluationResult::new(TriggerStatus::Pending, now)
                        .with_reason(format!("{REASON_EVALUATION_FAILED}: {e}"))
                });
                SweepEntry { trigger_id, result }
            })
            .collect();

        debug!(
            triggers = entries.len(),
            frame_captured,
            satisfied = entries
                .iter()
                .filter(|e| e.result.status == TriggerStatus::Satisfied)
                .count(),
            "스윕 완료"
        );

        SweepReport {
            evaluated_at: now,
            frame_captured,
            entries,
        }
    }
}
