//! Tesseract CLI 어댑터.
//!
//! 이미지를 PNG로 인코딩해 stdin으로 넘기고, stdout의 TSV를 그대로 돌려준다.
//! 임시 파일을 쓰지 않으며 인자 조립과 로그 마스킹은 순수 함수로 분리한다.

use std::io::{Cursor, Write};
use std::process::{Command, Stdio};

use image::{DynamicImage, GrayImage, ImageFormat};
use tracing::{debug, warn};
use vigil_core::config::RecognizerConfig;
use vigil_core::error::CoreError;
use vigil_core::ports::text_recognizer::TextRecognizer;

/// 로그에서 값이 가려지는 자리 표시
pub const REDACTED: &str = "<redacted>";

/// 다음 인자가 민감한 값인 플래그
const SENSITIVE_FLAGS: [&str; 4] = ["--user-words", "--user-patterns", "--tessdata-dir", "-c"];

/// 엔진 호출 인자 조립
///
/// `stdin stdout -l <lang> --psm <n> [--tessdata-dir d] [--user-words f] [-c k=v ...] tsv`
pub fn build_args(config: &RecognizerConfig) -> Vec<String> {
    let mut args = vec![
        "stdin".to_string(),
        "stdout".to_string(),
        "-l".to_string(),
        config.language.clone(),
        "--psm".to_string(),
        config.psm.to_string(),
    ];

    if let Some(dir) = &config.tessdata_dir {
        args.push("--tessdata-dir".to_string());
        args.push(dir.to_string_lossy().into_owned());
    }
    if let Some(words) = &config.user_words {
        args.push("--user-words".to_string());
        args.push(words.to_string_lossy().into_owned());
    }
    for (key, value) in &config.extra_vars {
        args.push("-c".to_string());
        args.push(format!("{key}={value}"));
    }

    args.push("tsv".to_string());
    args
}

/// 로그용 인자 마스킹 — 민감 플래그의 값과 경로처럼 보이는 인자를 가린다
pub fn redact_args(args: &[String]) -> Vec<String> {
    let mut redacted = Vec::with_capacity(args.len());
    let mut hide_next = false;

    for arg in args {
        if hide_next {
            redacted.push(REDACTED.to_string());
            hide_next = false;
            continue;
        }

        if SENSITIVE_FLAGS.contains(&arg.as_str()) {
            hide_next = true;
            redacted.push(arg.clone());
        } else if looks_like_path(arg) {
            redacted.push(REDACTED.to_string());
        } else {
            redacted.push(arg.clone());
        }
    }

    redacted
}

fn looks_like_path(arg: &str) -> bool {
    !arg.starts_with('-') && (arg.contains('/') || arg.contains('\\'))
}

/// Tesseract 실행 파일 기반 텍스트 인식기
pub struct TesseractCli {
    config: RecognizerConfig,
}

impl TesseractCli {
    pub fn new(config: RecognizerConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &RecognizerConfig {
        &self.config
    }

    fn encode_png(image: &GrayImage) -> Result<Vec<u8>, CoreError> {
        let mut buf = Cursor::new(Vec::new());
        DynamicImage::ImageLuma8(image.clone()).write_to(&mut buf, ImageFormat::Png)?;
        Ok(buf.into_inner())
    }
}

impl TextRecognizer for TesseractCli {
    fn recognize_tsv(&self, image: &GrayImage) -> Result<String, CoreError> {
        if image.width() == 0 || image.height() == 0 {
            return Err(CoreError::Recognizer("빈 이미지: 너비 또는 높이가 0".to_string()));
        }

        let png = Self::encode_png(image)?;
        let args = build_args(&self.config);
        debug!(
            executable = %self.config.executable.display(),
            args = ?redact_args(&args),
            bytes = png.len(),
            "텍스트 인식 실행"
        );

        let mut child = Command::new(&self.config.executable)
            .args(&args)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(|e| {
                CoreError::Recognizer(format!(
                    "실행 실패 ({}): {e}",
                    self.config.executable.display()
                ))
            })?;

        let mut stdin = child
            .stdin
            .take()
            .ok_or_else(|| CoreError::Internal("stdin 파이프 없음".to_string()))?;

        // 큰 이미지에서 파이프가 가득 차 교착되지 않도록 쓰기는 별도 스레드에서
        let output = std::thread::scope(|scope| {
            let writer = scope.spawn(move || stdin.write_all(&png));
            let output = child.wait_with_output();
            let written = writer
                .join()
                .map_err(|_| CoreError::Internal("stdin 쓰기 스레드 패닉".to_string()))?;
            if let Err(e) = written {
                // 엔진이 일찍 종료하면 BrokenPipe — 종료 코드로 판단한다
                debug!(error = %e, "stdin 쓰기 중단");
            }
            output.map_err(CoreError::from)
        })?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            warn!(status = %output.status, "텍스트 인식 실패");
            return Err(CoreError::Recognizer(format!(
                "종료 코드 {}: {}",
                output.status,
                stderr.trim()
            )));
        }

        Ok(String::from_utf8_lossy(&output.stdout).into_owned())
    }

    fn name(&self) -> &str {
        "tesseract"
    }
}
