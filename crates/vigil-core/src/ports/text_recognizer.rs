//! 텍스트 인식 엔진 포트.
//!
//! 코어는 엔진의 표 형식(TSV) 출력만 파싱한다.
//! 엔진 실행, 프로세스 수명 관리, 로그용 인자 마스킹은 구현체 책임이다.
//! 구현: `vigil-vision::tesseract::TesseractCli`

use image::GrayImage;

use crate::error::CoreError;

/// 이미지 → TSV 원문
pub trait TextRecognizer: Send + Sync {
    /// 이미지에서 텍스트를 인식하여 헤더 포함 TSV 원문을 반환
    fn recognize_tsv(&self, image: &GrayImage) -> Result<String, CoreError>;

    /// 엔진 이름 (예: "tesseract")
    fn name(&self) -> &str;
}
