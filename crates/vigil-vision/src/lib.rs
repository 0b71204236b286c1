//! # vigil-vision
//!
//! 화면 인식 파이프라인 크레이트.
//! 템플릿 매칭(ZNCC), 중복 억제, 좌표 해석, 영역 잘라내기, TSV 신뢰도 집계와
//! 프레임/템플릿/텍스트 인식 어댑터를 담당한다.

pub mod capture;
pub mod matcher;
pub mod nms;
pub mod region;
pub mod resolver;
pub mod template_store;
pub mod tesseract;
pub mod tsv;
