//! 서브커맨드 실행.

use std::io::Read;
use std::path::Path;
use std::sync::Arc;

use anyhow::{anyhow, Context, Result};
use chrono::Utc;
use tracing::{info, warn};
use vigil_automation::sweeper::TriggerSweeper;
use vigil_core::config::AppConfig;
use vigil_core::models::detection::DetectionTarget;
use vigil_core::models::trigger::Trigger;
use vigil_vision::capture::FileFrameSource;
use vigil_vision::template_store::DirectoryTemplateStore;
use vigil_vision::tesseract::TesseractCli;
use vigil_vision::{matcher, resolver, tsv};

use crate::{EvaluateArgs, MatchArgs, MatchingOverrides, ParseTsvArgs, ResolveArgs};

/// 매칭 플래그를 설정에 덮어쓰고 재검증
pub(crate) fn apply_matching(config: &mut AppConfig, overrides: &MatchingOverrides) -> Result<()> {
    if let Some(threshold) = overrides.threshold {
        config.matching.threshold = threshold;
    }
    if let Some(overlap) = overrides.overlap {
        config.matching.overlap = overlap;
    }
    if let Some(max_results) = overrides.max_results {
        config.matching.max_results = max_results;
    }
    config.validate().context("CLI 인자 검증 실패")
}

/// evaluate 전용 플래그 적용
pub(crate) fn apply_evaluate(config: &mut AppConfig, cmd: &EvaluateArgs) -> Result<()> {
    if let Some(dir) = &cmd.templates {
        config.templates.directory = dir.clone();
    }
    if let Some(exe) = &cmd.tesseract {
        config.recognizer.executable = exe.clone();
    }
    if let Some(cycles) = cmd.cycles {
        config.sweep.cycles = cycles;
    }
    if let Some(interval_ms) = cmd.interval_ms {
        config.sweep.interval_ms = interval_ms;
    }
    config.validate().context("CLI 인자 검증 실패")
}

fn open_image(path: &Path) -> Result<image::DynamicImage> {
    image::open(path).with_context(|| format!("이미지 열기 실패: {}", path.display()))
}

fn print_json<T: serde::Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

/// 템플릿 파일 이름 → 참조 ID
fn reference_id(path: &Path) -> String {
    path.file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}

pub(crate) fn run_match(config: &AppConfig, cmd: &MatchArgs) -> Result<()> {
    let frame = open_image(&cmd.frame)?;
    let template = open_image(&cmd.template)?;

    let outcome = matcher::match_image(&frame, &template, &config.matching.to_match_config());
    info!(
        detections = outcome.len(),
        limits_hit = outcome.limits_hit,
        "매칭 완료"
    );
    print_json(&outcome)
}

pub(crate) fn run_resolve(config: &AppConfig, cmd: &ResolveArgs) -> Result<()> {
    let frame = open_image(&cmd.frame)?;
    let template = open_image(&cmd.template)?;

    let outcome = matcher::match_image(&frame, &template, &config.matching.to_match_config());
    let target = DetectionTarget::new(
        reference_id(&cmd.template),
        cmd.confidence.unwrap_or(config.matching.threshold),
    )
    .with_offset(cmd.offset_x, cmd.offset_y);

    let coordinate = resolver::resolve(&target, &outcome, frame.width(), frame.height())
        .map_err(|e| anyhow!("{e}"))?;
    print_json(&coordinate)
}

pub(crate) fn run_parse_tsv(cmd: &ParseTsvArgs) -> Result<()> {
    let raw = if cmd.input.as_os_str() == "-" {
        let mut buf = String::new();
        std::io::stdin()
            .read_to_string(&mut buf)
            .context("stdin 읽기 실패")?;
        buf
    } else {
        std::fs::read_to_string(&cmd.input)
            .with_context(|| format!("TSV 읽기 실패: {}", cmd.input.display()))?
    };

    let recognition = tsv::parse_tsv(&raw);
    if let Some(reason) = &recognition.reason {
        warn!(reason = %reason, "TSV 형식 오류");
    }
    print_json(&recognition)
}

/// 트리거 JSON 배열 로드
pub(crate) fn load_triggers(path: &Path) -> Result<Vec<Trigger>> {
    let raw = std::fs::read_to_string(path)
        .with_context(|| format!("트리거 파일 읽기 실패: {}", path.display()))?;
    let triggers: Vec<Trigger> = serde_json::from_str(&raw)
        .with_context(|| format!("트리거 파일 파싱 실패: {}", path.display()))?;
    Ok(triggers)
}

pub(crate) async fn run_evaluate(config: &AppConfig, cmd: &EvaluateArgs) -> Result<()> {
    let triggers = load_triggers(&cmd.triggers)?;

    let mut sweeper = TriggerSweeper::new(
        Arc::new(DirectoryTemplateStore::from_config(&config.templates)),
        Arc::new(TesseractCli::new(config.recognizer.clone())),
        config.matching.clone(),
        Utc::now(),
    );
    for trigger in triggers {
        let id = trigger.id.clone();
        sweeper
            .register(trigger)
            .with_context(|| format!("트리거 등록 실패: {id}"))?;
    }

    let source = FileFrameSource::new(&cmd.frame);
    let cycles = config.sweep.cycles;
    info!(
        triggers = sweeper.len(),
        cycles,
        interval_ms = config.sweep.interval_ms,
        "스윕 시작"
    );

    for cycle in 0..cycles {
        if cycle > 0 {
            tokio::time::sleep(config.sweep_interval()).await;
        }
        let report = sweeper.sweep(&source, Utc::now()).await;
        println!("{}", serde_json::to_string(&report)?);
    }

    print_json(&sweeper.snapshot())
}
