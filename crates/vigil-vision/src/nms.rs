//! 중복 억제 (NMS).
//!
//! 신뢰도 순으로 정렬된 후보에서 겹치는 군집마다 가장 높은 것 하나만 남긴다.
//! 탐욕적 단일 패스, 난수 없음 — 입력 순서가 같으면 결과도 같다.

use vigil_core::models::detection::Detection;

/// 신뢰도 내림차순 안정 정렬 (동점은 기존 순서 유지)
pub fn sort_by_confidence(detections: &mut [Detection]) {
    detections.sort_by(|a, b| b.confidence.total_cmp(&a.confidence));
}

/// 탐욕적 중복 억제
///
/// - `candidates`는 신뢰도 내림차순이어야 한다
/// - 수락한 박스와 IoU가 `overlap_threshold`를 **초과**하는 이후 후보는 버린다
/// - `max_results`개를 수락하면 중단한다
pub fn suppress(candidates: &[Detection], overlap_threshold: f64, max_results: usize) -> Vec<Detection> {
    let mut kept: Vec<Detection> = Vec::with_capacity(max_results.min(candidates.len()));
    let mut discarded = vec![false; candidates.len()];

    for (i, candidate) in candidates.iter().enumerate() {
        if kept.len() >= max_results {
            break;
        }
        if discarded[i] {
            continue;
        }

        kept.push(*candidate);

        for (j, later) in candidates.iter().enumerate().skip(i + 1) {
            if !discarded[j] && candidate.bounds.iou(&later.bounds) > overlap_threshold {
                discarded[j] = true;
            }
        }
    }

    kept
}
