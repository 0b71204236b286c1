//! 좌표 해석기.
//!
//! 억제된 검출 목록에서 대상의 수락 임계값을 넘는 검출이 **정확히 하나**일 때만
//! 화면 좌표를 확정한다. 여러 개면 최고 점수를 고르지 않고 모호성 실패로 돌려준다.
//! 모든 함수는 순수 함수다.

use serde::Serialize;
use thiserror::Error;
use tracing::debug;
use vigil_core::models::detection::{DetectionTarget, MatchOutcome};
use vigil_core::models::geometry::{BoundingBox, Point};

/// 좌표 해석 실패 — `Display` 문자열이 그대로 사용자 사유가 된다
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ResolveError {
    /// 수락 임계값 이상인 검출 없음
    #[error("no detection above threshold")]
    NoDetection,

    /// 수락 임계값 이상인 검출이 여러 개
    #[error("multiple detections ({count}) above threshold")]
    Ambiguous {
        /// 임계값을 넘은 검출 수
        count: usize,
    },
}

/// 확정된 화면 좌표 — `resolve`로만 만들어진다
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ResolvedCoordinate {
    x: i32,
    y: i32,
    score: f64,
    reference_id: String,
    source: BoundingBox,
}

impl ResolvedCoordinate {
    pub fn x(&self) -> i32 {
        self.x
    }

    pub fn y(&self) -> i32 {
        self.y
    }

    pub fn point(&self) -> Point {
        Point::new(self.x, self.y)
    }

    /// 원래 검출 신뢰도
    pub fn score(&self) -> f64 {
        self.score
    }

    pub fn reference_id(&self) -> &str {
        &self.reference_id
    }

    /// 원래 검출 박스
    pub fn source(&self) -> &BoundingBox {
        &self.source
    }

    /// 부분 영역 좌표를 전체 프레임 좌표로 옮긴다
    pub fn translated(mut self, dx: i32, dy: i32) -> Self {
        self.x = self.x.saturating_add(dx);
        self.y = self.y.saturating_add(dy);
        self.source.x = self.source.x.saturating_add(dx);
        self.source.y = self.source.y.saturating_add(dy);
        self
    }
}

/// 단일 좌표 확정
///
/// 1. `target.confidence` 이상인 검출만 남긴다
/// 2. 0개 → `NoDetection`, 2개 이상 → `Ambiguous`
/// 3. 1개 → 박스 중심 + 오프셋을 `[0, w-1] × [0, h-1]`로 클램프
pub fn resolve(
    target: &DetectionTarget,
    outcome: &MatchOutcome,
    frame_width: u32,
    frame_height: u32,
) -> Result<ResolvedCoordinate, ResolveError> {
    let passing: Vec<_> = outcome
        .detections
        .iter()
        .filter(|d| d.confidence >= target.confidence)
        .collect();

    let detection = match passing.as_slice() {
        [] => {
            debug!(reference_id = %target.reference_id, "수락 임계값 이상 검출 없음");
            return Err(ResolveError::NoDetection);
        }
        [single] => *single,
        many => {
            debug!(
                reference_id = %target.reference_id,
                count = many.len(),
                "모호한 검출 — 좌표 확정 거부"
            );
            return Err(ResolveError::Ambiguous { count: many.len() });
        }
    };

    let (cx, cy) = detection.bounds.center();
    let x = clamp_axis(cx + target.offset_x as i64, frame_width);
    let y = clamp_axis(cy + target.offset_y as i64, frame_height);

    debug!(
        reference_id = %target.reference_id,
        x,
        y,
        score = detection.confidence,
        "좌표 확정"
    );

    Ok(ResolvedCoordinate {
        x,
        y,
        score: detection.confidence,
        reference_id: target.reference_id.clone(),
        source: detection.bounds,
    })
}

/// `[0, extent-1]`로 클램프 (extent 0이면 0)
fn clamp_axis(value: i64, extent: u32) -> i32 {
    let max = extent.saturating_sub(1) as i64;
    value.clamp(0, max) as i32
}
