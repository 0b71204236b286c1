//! Vigil 도메인 모델.
//!
//! 인식-판단 파이프라인이 주고받는 값 타입을 정의한다.
//! 외부 저장 계층과 CLI 출력을 위해 모든 모델은 `serde` Serialize/Deserialize를 구현한다.

pub mod detection;
pub mod geometry;
pub mod region;
pub mod text;
pub mod trigger;
