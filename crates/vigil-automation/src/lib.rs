//! # vigil-automation
//!
//! 트리거 평가 크레이트.
//! 활성화/쿨다운/유형별 조건을 묶은 상태 머신(`evaluator`)과,
//! 같은 프레임·같은 시각으로 모든 트리거를 평가하는 스윕 실행기(`sweeper`)를 담당한다.

pub mod evaluator;
pub mod sweeper;
