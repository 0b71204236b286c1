//! # vigil
//!
//! 화면 인식 트리거 CLI 진입점.
//! 설정 로드, 어댑터 조립, 명령 실행을 담당한다. 결과는 stdout에 JSON으로, 로그는 stderr로.

mod commands;
mod settings;

use std::path::PathBuf;

use anyhow::Result;
use clap::{Args as ClapArgs, Parser, Subcommand};
use tracing::debug;
use tracing_subscriber::EnvFilter;

/// 화면 인식 트리거 엔진
///
/// 템플릿 매칭, 좌표 해석, 텍스트 인식 신뢰도 집계, 트리거 평가
#[derive(Parser, Debug)]
#[command(name = "vigil")]
#[command(author, version, about, long_about = None)]
struct Args {
    /// 설정 파일 (TOML/JSON)
    #[arg(long, short = 'c', global = true)]
    config: Option<PathBuf>,

    /// 로그 레벨 (trace, debug, info, warn, error)
    #[arg(long, short = 'l', default_value = "info", global = true)]
    log_level: String,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// 프레임에서 템플릿 검출 → MatchOutcome JSON
    Match(MatchArgs),
    /// 단일 좌표 확정 → 좌표 JSON (실패 시 사유와 함께 비정상 종료)
    Resolve(ResolveArgs),
    /// 텍스트 인식 TSV 파싱 → TextRecognition JSON
    ParseTsv(ParseTsvArgs),
    /// 트리거 파일을 스윕으로 평가
    Evaluate(EvaluateArgs),
}

/// 매칭 설정 오버라이드
#[derive(ClapArgs, Debug)]
struct MatchingOverrides {
    /// 후보 발견 임계값 (0.0 ~ 1.0)
    #[arg(long)]
    threshold: Option<f64>,

    /// 중복 억제 IoU 임계값 (0.0 ~ 1.0)
    #[arg(long)]
    overlap: Option<f64>,

    /// 최대 검출 수
    #[arg(long)]
    max_results: Option<usize>,
}

#[derive(ClapArgs, Debug)]
struct MatchArgs {
    /// 프레임 이미지
    #[arg(long)]
    frame: PathBuf,

    /// 템플릿 이미지
    #[arg(long)]
    template: PathBuf,

    #[command(flatten)]
    matching: MatchingOverrides,
}

#[derive(ClapArgs, Debug)]
struct ResolveArgs {
    /// 프레임 이미지
    #[arg(long)]
    frame: PathBuf,

    /// 템플릿 이미지 (파일 이름이 참조 ID)
    #[arg(long)]
    template: PathBuf,

    /// 수락 임계값 (기본: 매칭 임계값)
    #[arg(long)]
    confidence: Option<f64>,

    /// 중심에서 X 오프셋 (픽셀)
    #[arg(long, default_value_t = 0, allow_hyphen_values = true)]
    offset_x: i32,

    /// 중심에서 Y 오프셋 (픽셀)
    #[arg(long, default_value_t = 0, allow_hyphen_values = true)]
    offset_y: i32,

    #[command(flatten)]
    matching: MatchingOverrides,
}

#[derive(ClapArgs, Debug)]
struct ParseTsvArgs {
    /// TSV 파일 ("-"이면 stdin)
    input: PathBuf,
}

#[derive(ClapArgs, Debug)]
struct EvaluateArgs {
    /// 트리거 JSON 파일 (배열)
    #[arg(long)]
    triggers: PathBuf,

    /// 프레임 이미지 (외부 캡처 도구가 갱신)
    #[arg(long)]
    frame: PathBuf,

    /// 템플릿 디렉토리
    #[arg(long)]
    templates: Option<PathBuf>,

    /// Tesseract 실행 파일
    #[arg(long)]
    tesseract: Option<PathBuf>,

    /// 스윕 횟수
    #[arg(long)]
    cycles: Option<u32>,

    /// 스윕 간격 (밀리초)
    #[arg(long)]
    interval_ms: Option<u64>,

    #[command(flatten)]
    matching: MatchingOverrides,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    // RUST_LOG가 있으면 우선
    let log_filter = format!(
        "vigil={},vigil_app={},vigil_core={},vigil_vision={},vigil_automation={}",
        args.log_level, args.log_level, args.log_level, args.log_level, args.log_level
    );
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&log_filter)),
        )
        .init();

    let mut config = settings::load(args.config.as_deref(), None)?;
    debug!(?config, "설정 로드 완료");

    match args.command {
        Command::Match(cmd) => {
            commands::apply_matching(&mut config, &cmd.matching)?;
            commands::run_match(&config, &cmd)
        }
        Command::Resolve(cmd) => {
            commands::apply_matching(&mut config, &cmd.matching)?;
            commands::run_resolve(&config, &cmd)
        }
        Command::ParseTsv(cmd) => commands::run_parse_tsv(&cmd),
        Command::Evaluate(cmd) => {
            commands::apply_matching(&mut config, &cmd.matching)?;
            commands::apply_evaluate(&mut config, &cmd)?;
            commands::run_evaluate(&config, &cmd).await
        }
    }
}
