//! 인식 파이프라인 통합 테스트.
//!
//! 매처 → 중복 억제 → 좌표 해석, 그리고 파일 어댑터 → 스윕 → 평가기 cross-crate 연동.

use std::sync::Arc;

use assert_matches::assert_matches;
use chrono::{DateTime, Duration, Utc};
use image::{DynamicImage, GrayImage, Luma, Rgb, RgbImage};
use vigil_automation::sweeper::TriggerSweeper;
use vigil_core::config::MatchingConfig;
use vigil_core::error::CoreError;
use vigil_core::models::detection::{DetectionTarget, MatchConfig};
use vigil_core::models::geometry::{BoundingBox, Point};
use vigil_core::models::trigger::{TextMatchMode, Trigger, TriggerCondition, TriggerStatus};
use vigil_core::ports::frame_source::FrameSource;
use vigil_core::ports::text_recognizer::TextRecognizer;
use vigil_vision::capture::FileFrameSource;
use vigil_vision::matcher;
use vigil_vision::resolver::{self, ResolveError};
use vigil_vision::template_store::DirectoryTemplateStore;

const SOLID: u8 = 200;

/// 640×480 질감 배경 + (x, y)에 64×64 단색 사각형
fn frame_with_solid_block(x: u32, y: u32) -> GrayImage {
    GrayImage::from_fn(640, 480, |px, py| {
        if px >= x && px < x + 64 && py >= y && py < y + 64 {
            Luma([SOLID])
        } else {
            Luma([((px * 7 + py * 13) % 100) as u8])
        }
    })
}

fn solid_template() -> GrayImage {
    GrayImage::from_pixel(64, 64, Luma([SOLID]))
}

fn t0() -> DateTime<Utc> {
    DateTime::parse_from_rfc3339("2024-05-01T12:00:00Z")
        .unwrap()
        .with_timezone(&Utc)
}

/// 640×480 / 64×64 단색 템플릿 → 검출 1개 → 배치 중심 좌표
#[test]
fn solid_template_end_to_end() {
    let frame = frame_with_solid_block(300, 200);
    let config = MatchConfig::new(0.5, 10, 0.3);

    let outcome = matcher::match_template(&frame, &solid_template(), &config);
    assert_eq!(outcome.len(), 1, "지배적인 배치 하나만 남아야 함");
    assert!(!outcome.limits_hit);
    assert_eq!(outcome.detections[0].bounds, BoundingBox::new(300, 200, 64, 64));
    assert!(outcome.detections[0].confidence >= 0.5);

    let target = DetectionTarget::new("solid", 0.5);
    let coordinate = resolver::resolve(&target, &outcome, 640, 480).unwrap();
    assert_eq!(coordinate.point(), Point::new(332, 232));
    assert_eq!(coordinate.reference_id(), "solid");
}

/// 우하단 배치 + 큰 오프셋 → 프레임 안으로 클램프
#[test]
fn corner_placement_clamps_offset() {
    let frame = frame_with_solid_block(576, 416);
    let outcome = matcher::match_template(&frame, &solid_template(), &MatchConfig::new(0.5, 10, 0.3));
    assert_eq!(outcome.len(), 1);

    let target = DetectionTarget::new("solid", 0.5).with_offset(100, 100);
    let coordinate = resolver::resolve(&target, &outcome, 640, 480).unwrap();
    assert_eq!(coordinate.point(), Point::new(639, 479));
}

/// 컬러 프레임도 luma 변환 후 같은 결과
#[test]
fn color_frame_matches_after_luma_conversion() {
    let gray = frame_with_solid_block(100, 50);
    let color = RgbImage::from_fn(640, 480, |x, y| {
        let v = gray.get_pixel(x, y)[0];
        Rgb([v, v, v])
    });
    let template = DynamicImage::ImageLuma8(solid_template());

    let outcome = matcher::match_image(
        &DynamicImage::ImageRgb8(color),
        &template,
        &MatchConfig::new(0.5, 10, 0.3),
    );
    assert_eq!(outcome.len(), 1);
    assert_eq!(outcome.detections[0].bounds.x, 100);
    assert_eq!(outcome.detections[0].bounds.y, 50);
}

/// 템플릿이 프레임보다 크면 빈 결과
#[test]
fn oversized_template_yields_empty_outcome() {
    let frame = GrayImage::new(32, 32);
    let outcome = matcher::match_template(&frame, &solid_template(), &MatchConfig::default());
    assert!(outcome.is_empty());
    assert!(!outcome.limits_hit);

    let target = DetectionTarget::new("solid", 0.5);
    assert_matches!(
        resolver::resolve(&target, &outcome, 32, 32),
        Err(ResolveError::NoDetection)
    );
}

/// 같은 블록 두 개 → 모호성 실패
#[test]
fn duplicated_block_is_ambiguous() {
    let mut frame = frame_with_solid_block(40, 40);
    for y in 300..364 {
        for x in 500..564 {
            frame.put_pixel(x, y, Luma([SOLID]));
        }
    }

    let outcome = matcher::match_template(&frame, &solid_template(), &MatchConfig::new(0.5, 10, 0.3));
    assert_eq!(outcome.len(), 2);

    let err = resolver::resolve(&DetectionTarget::new("solid", 0.5), &outcome, 640, 480).unwrap_err();
    assert_eq!(err.to_string(), "multiple detections (2) above threshold");
}

struct StaticRecognizer(&'static str);

impl TextRecognizer for StaticRecognizer {
    fn recognize_tsv(&self, _image: &GrayImage) -> Result<String, CoreError> {
        Ok(self.0.to_string())
    }

    fn name(&self) -> &str {
        "static"
    }
}

const READY_TSV: &str = "level\tpage_num\tblock_num\tpar_num\tline_num\tword_num\tleft\ttop\twidth\theight\tconf\ttext\n\
1\t1\t0\t0\t0\t0\t0\t0\t640\t480\t-1\t\n\
5\t1\t1\t1\t1\t1\t10\t10\t60\t20\t95\tPress\n\
5\t1\t1\t1\t1\t2\t80\t10\t60\t20\t90\tStart";

/// 파일 어댑터 → 스윕 → 이미지/텍스트 트리거 + 쿨다운
#[tokio::test]
async fn sweep_over_file_adapters() {
    let dir = tempfile::tempdir().unwrap();
    let frame_path = dir.path().join("frame.png");
    let templates_dir = dir.path().join("templates");
    std::fs::create_dir(&templates_dir).unwrap();

    frame_with_solid_block(300, 200).save(&frame_path).unwrap();
    solid_template().save(templates_dir.join("solid.png")).unwrap();

    let mut sweeper = TriggerSweeper::new(
        Arc::new(DirectoryTemplateStore::new(&templates_dir, 4)),
        Arc::new(StaticRecognizer(READY_TSV)),
        MatchingConfig::default(),
        t0(),
    );
    sweeper
        .register(
            Trigger::new(
                "block",
                TriggerCondition::ImageMatch {
                    reference_id: "solid".to_string(),
                    region: None,
                    similarity_threshold: 0.9,
                },
            )
            .with_cooldown(60),
        )
        .unwrap();
    sweeper
        .register(Trigger::new(
            "ready",
            TriggerCondition::TextMatch {
                text: "press start".to_string(),
                region: None,
                confidence_threshold: 90.0,
                mode: TextMatchMode::Found,
            },
        ))
        .unwrap();
    sweeper
        .register(Trigger::new(
            "missing",
            TriggerCondition::ImageMatch {
                reference_id: "no_such_template".to_string(),
                region: None,
                similarity_threshold: 0.9,
            },
        ))
        .unwrap();

    let source = FileFrameSource::new(&frame_path);

    let first = sweeper.sweep(&source, t0()).await;
    assert!(first.frame_captured);
    assert_eq!(first.entries[0].result.status, TriggerStatus::Satisfied);
    assert_eq!(first.entries[0].result.location, Some(Point::new(332, 232)));
    assert_eq!(first.entries[1].result.status, TriggerStatus::Satisfied);
    assert_eq!(first.entries[1].result.confidence, Some(92.5));
    assert_eq!(first.entries[2].result.status, TriggerStatus::Pending);
    assert_eq!(
        first.entries[2].result.reason.as_deref(),
        Some("template not found: no_such_template")
    );

    let second = sweeper.sweep(&source, t0() + Duration::seconds(10)).await;
    assert_eq!(second.entries[0].result.status, TriggerStatus::Cooldown);
    assert_eq!(second.entries[1].result.status, TriggerStatus::Satisfied);

    let snapshot = sweeper.snapshot();
    assert_eq!(snapshot[0].last_fired_at, Some(t0()));
    assert_eq!(snapshot[1].last_fired_at, Some(t0() + Duration::seconds(10)));
    assert!(snapshot[2].last_fired_at.is_none());

    // 갱신된 레코드는 JSON으로 그대로 저장 가능
    let json = serde_json::to_string(&snapshot).unwrap();
    let restored: Vec<Trigger> = serde_json::from_str(&json).unwrap();
    assert_eq!(restored, snapshot);
}

/// 프레임 파일이 없으면 화면 트리거는 Pending, 시간 트리거는 정상 평가
#[tokio::test]
async fn missing_frame_file_keeps_time_triggers_running() {
    let dir = tempfile::tempdir().unwrap();
    let mut sweeper = TriggerSweeper::new(
        Arc::new(DirectoryTemplateStore::new(dir.path(), 4)),
        Arc::new(StaticRecognizer(READY_TSV)),
        MatchingConfig::default(),
        t0(),
    );
    sweeper
        .register(Trigger::new("boot", TriggerCondition::Delay { seconds: 0 }))
        .unwrap();
    sweeper
        .register(Trigger::new(
            "ready",
            TriggerCondition::TextMatch {
                text: "press start".to_string(),
                region: None,
                confidence_threshold: 0.0,
                mode: TextMatchMode::Found,
            },
        ))
        .unwrap();

    let source = FileFrameSource::new(dir.path().join("absent.png"));
    assert_matches!(source.capture().await, Err(CoreError::NotFound { .. }));

    let report = sweeper.sweep(&source, t0()).await;
    assert!(!report.frame_captured);
    assert_eq!(report.entries[0].result.status, TriggerStatus::Satisfied);
    assert_eq!(report.entries[1].result.status, TriggerStatus::Pending);
}
