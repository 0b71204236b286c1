//! 포트 인터페이스 (trait).
//!
//! 코어가 외부 협력자에게 기대하는 경계를 정의한다.
//! 구현은 `vigil-vision` crate에 있고, `vigil-app`에서 `Arc<dyn T>`로 와이어링한다.

pub mod frame_source;
pub mod template_store;
pub mod text_recognizer;
