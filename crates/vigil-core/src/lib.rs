//! # vigil-core
//!
//! Vigil 도메인 모델, 포트(trait) 정의, 에러 타입, 설정.
//! 모든 크레이트가 공유하는 핵심 타입과 인터페이스를 제공한다.
//!
//! ## 구조
//!
//! - [`models`] — 박스/검출/텍스트/트리거 값 타입 (serde Serialize/Deserialize)
//! - [`ports`] — 프레임 소스, 템플릿 저장소, 텍스트 인식 엔진 경계
//! - [`error`] — 핵심 에러 타입 (thiserror)
//! - [`config`] — 애플리케이션 설정 구조체

pub mod config;
pub mod error;
pub mod models;
pub mod ports;

#[cfg(test)]
mod tests {
    use crate::models::detection::{Detection, MatchOutcome};
    use crate::models::geometry::BoundingBox;

    #[test]
    fn match_outcome_serde_roundtrip() {
        let outcome = MatchOutcome {
            detections: vec![Detection::new(BoundingBox::new(10, 20, 64, 64), 0.97)],
            limits_hit: false,
        };

        let json = serde_json::to_string(&outcome).unwrap();
        let deserialized: MatchOutcome = serde_json::from_str(&json).unwrap();

        assert_eq!(deserialized, outcome);
        assert_eq!(deserialized.detections[0].bounds.width, 64);
    }
}
