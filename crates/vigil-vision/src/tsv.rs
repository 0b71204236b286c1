//! 텍스트 인식 TSV 파서 + 신뢰도 집계.
//!
//! 헤더 행 뒤에 데이터 행이 오는 형식(Tesseract `tsv` 출력)을 컬럼 이름으로 읽는다.
//! - `conf` 컬럼이 없으면 위치를 추측하지 않고 `tsv_format_unexpected`로 실패한다
//! - 행마다 독립적으로 파싱하며, 잘못된 행은 건너뛴다
//! - 신뢰도 `-1`은 잡음 토큰: 목록에는 남고 평균에서는 빠진다

use tracing::{debug, trace};
use vigil_core::models::geometry::BoundingBox;
use vigil_core::models::text::{TextRecognition, TextToken, NOISE_CONFIDENCE};

/// 헤더에서 찾은 컬럼 위치
struct Columns {
    count: usize,
    conf: usize,
    text: Option<usize>,
    left: Option<usize>,
    top: Option<usize>,
    width: Option<usize>,
    height: Option<usize>,
}

impl Columns {
    fn from_header(header: &str) -> Option<Self> {
        let names: Vec<&str> = header.split('\t').map(str::trim).collect();
        let find = |name: &str| names.iter().position(|n| n.eq_ignore_ascii_case(name));

        Some(Self {
            count: names.len(),
            conf: find("conf")?,
            text: find("text"),
            left: find("left"),
            top: find("top"),
            width: find("width"),
            height: find("height"),
        })
    }

    fn bounds(&self, fields: &[&str]) -> Option<BoundingBox> {
        let left = fields.get(self.left?)?.trim().parse::<i32>().ok()?;
        let top = fields.get(self.top?)?.trim().parse::<i32>().ok()?;
        let width = fields.get(self.width?)?.trim().parse::<u32>().ok()?;
        let height = fields.get(self.height?)?.trim().parse::<u32>().ok()?;
        Some(BoundingBox::new(left, top, width, height))
    }
}

/// 신뢰도 파싱 — 유한한 값이면서 `-1`이거나 0 이상이어야 한다
fn parse_confidence(raw: &str) -> Option<f64> {
    let value = raw.trim().parse::<f64>().ok()?;
    (value.is_finite() && (value == NOISE_CONFIDENCE || value >= 0.0)).then_some(value)
}

/// 한 데이터 행 → 토큰. 형식이 어긋나면 `None`.
fn parse_row(columns: &Columns, line: &str) -> Option<TextToken> {
    let fields: Vec<&str> = line.split('\t').collect();
    if fields.len() != columns.count {
        return None;
    }

    let confidence = parse_confidence(fields[columns.conf])?;
    let text = columns
        .text
        .map(|idx| fields[idx].trim().to_string())
        .unwrap_or_default();

    Some(TextToken {
        text,
        confidence,
        bounds: columns.bounds(&fields),
    })
}

/// 비잡음 토큰 신뢰도의 산술 평균 (없으면 0)
pub fn aggregate_confidence(tokens: &[TextToken]) -> f64 {
    let (sum, count) = tokens
        .iter()
        .filter(|t| !t.is_noise())
        .fold((0.0, 0usize), |(sum, count), t| (sum + t.confidence, count + 1));

    if count == 0 {
        0.0
    } else {
        sum / count as f64
    }
}

/// TSV 원문 → 토큰 + 집계 신뢰도 + 형식 사유
pub fn parse_tsv(output: &str) -> TextRecognition {
    let mut lines = output
        .lines()
        .map(|l| l.trim_end_matches('\r'))
        .filter(|l| !l.trim().is_empty());

    let Some(columns) = lines.next().and_then(Columns::from_header) else {
        debug!("TSV 헤더에 conf 컬럼 없음");
        return TextRecognition::format_unexpected();
    };

    let mut tokens = Vec::new();
    let mut skipped = 0usize;

    for (row, line) in lines.enumerate() {
        match parse_row(&columns, line) {
            Some(token) => tokens.push(token),
            None => {
                skipped += 1;
                trace!(row, line, "잘못된 TSV 행 건너뜀");
            }
        }
    }

    let confidence = aggregate_confidence(&tokens);
    debug!(tokens = tokens.len(), skipped, confidence, "TSV 파싱 완료");

    TextRecognition {
        tokens,
        confidence,
        reason: None,
    }
}
