//! 후보 매처.
//!
//! 전체 프레임과 템플릿으로 점수 맵을 만들고, 임계값 이상인 배치를 후보로 뽑은 뒤
//! 중복 억제(`nms`)로 넘긴다.
//!
//! 점수는 영평균 정규화 상호상관(ZNCC)으로, 절대 밝기를 상쇄하며 범위는 `[-1, 1]`이다.
//! - 윈도우 합/제곱합: 적분 영상으로 O(1)
//! - 상호 항: 프레임 크기 FFT 상관 (Lewis, "Fast Normalized Cross-Correlation")
//! - 평탄한(분산 0) 템플릿: 평균 밝기가 같은 평탄한 윈도우면 1.0, 아니면 0.0

use image::{DynamicImage, GrayImage};
use rustfft::num_complex::Complex;
use rustfft::{Fft, FftPlanner};
use tracing::debug;
use vigil_core::models::detection::{Detection, MatchConfig, MatchOutcome};
use vigil_core::models::geometry::BoundingBox;

use crate::nms;

/// 평탄한 템플릿과 평탄한 윈도우의 평균 밝기 허용 차이
const FLAT_MEAN_TOLERANCE: f64 = 1.0;

/// 유효한 템플릿 배치마다의 유사도
#[derive(Debug, Clone)]
pub struct ScoreMap {
    width: u32,
    height: u32,
    scores: Vec<f64>,
}

impl ScoreMap {
    /// 배치 가능한 가로 위치 수
    pub fn width(&self) -> u32 {
        self.width
    }

    /// 배치 가능한 세로 위치 수
    pub fn height(&self) -> u32 {
        self.height
    }

    /// (x, y) 배치의 점수
    pub fn get(&self, x: u32, y: u32) -> Option<f64> {
        if x >= self.width || y >= self.height {
            return None;
        }
        self.scores
            .get(y as usize * self.width as usize + x as usize)
            .copied()
    }

    /// 최고 점수와 위치 (행 우선 순서에서 처음 나온 것)
    pub fn max(&self) -> Option<(u32, u32, f64)> {
        let mut best: Option<(u32, u32, f64)> = None;
        for (idx, &score) in self.scores.iter().enumerate() {
            if best.map_or(true, |(_, _, s)| score > s) {
                let x = (idx % self.width as usize) as u32;
                let y = (idx / self.width as usize) as u32;
                best = Some((x, y, score));
            }
        }
        best
    }
}

/// 합/제곱합 적분 영상 (가로세로 +1 패딩)
struct IntegralImage {
    stride: usize,
    sum: Vec<u64>,
    sum_sq: Vec<u64>,
}

impl IntegralImage {
    fn new(image: &GrayImage) -> Self {
        let (w, h) = (image.width() as usize, image.height() as usize);
        let stride = w + 1;
        let mut sum = vec![0u64; stride * (h + 1)];
        let mut sum_sq = vec![0u64; stride * (h + 1)];
        let raw = image.as_raw();

        for y in 0..h {
            let mut row_sum = 0u64;
            let mut row_sum_sq = 0u64;
            for x in 0..w {
                let v = raw[y * w + x] as u64;
                row_sum += v;
                row_sum_sq += v * v;
                let idx = (y + 1) * stride + (x + 1);
                sum[idx] = sum[idx - stride] + row_sum;
                sum_sq[idx] = sum_sq[idx - stride] + row_sum_sq;
            }
        }

        Self {
            stride,
            sum,
            sum_sq,
        }
    }

    /// (x, y)에서 시작하는 w×h 윈도우의 (합, 제곱합)
    fn window(&self, x: usize, y: usize, w: usize, h: usize) -> (u64, u64) {
        let a = y * self.stride + x;
        let b = y * self.stride + x + w;
        let c = (y + h) * self.stride + x;
        let d = (y + h) * self.stride + x + w;
        (
            self.sum[d] + self.sum[a] - self.sum[b] - self.sum[c],
            self.sum_sq[d] + self.sum_sq[a] - self.sum_sq[b] - self.sum_sq[c],
        )
    }
}

/// `n·Σx² − (Σx)²` — 분산의 n² 배. 정수로 계산하여 평탄 여부를 정확히 판정한다.
fn scaled_variance(n: u64, sum: u64, sum_sq: u64) -> u128 {
    (n as u128 * sum_sq as u128).saturating_sub(sum as u128 * sum as u128)
}

/// 행 우선 `width`×`height` 버퍼를 전치 (결과는 `height`가 행 길이)
fn transpose(data: &[Complex<f64>], width: usize, height: usize) -> Vec<Complex<f64>> {
    let mut out = vec![Complex::new(0.0, 0.0); data.len()];
    for y in 0..height {
        for x in 0..width {
            out[x * height + y] = data[y * width + x];
        }
    }
    out
}

/// 2D 순방향 FFT. 결과는 전치된(열 우선) 배치로 남는다.
fn forward_2d(
    data: &mut Vec<Complex<f64>>,
    width: usize,
    height: usize,
    rows: &dyn Fft<f64>,
    cols: &dyn Fft<f64>,
) {
    rows.process(data);
    let mut columns = transpose(data, width, height);
    cols.process(&mut columns);
    *data = columns;
}

/// 모든 배치 (x, y)에서 `Σ f(x+dx, y+dy) · t'(dx, dy)` 계산
///
/// `zero_mean`은 `tw`×`th` 영평균 템플릿. 프레임 크기의 순환 상관이지만
/// 유효 배치는 프레임 경계를 넘지 않으므로 감싸기 항이 섞이지 않는다.
/// 반환 버퍼는 프레임과 같은 행 우선 배치.
fn cross_correlation(frame: &GrayImage, zero_mean: &[f64], tw: usize, th: usize) -> Vec<f64> {
    let (w, h) = (frame.width() as usize, frame.height() as usize);

    let mut planner = FftPlanner::<f64>::new();
    let row_forward = planner.plan_fft_forward(w);
    let col_forward = planner.plan_fft_forward(h);
    let row_inverse = planner.plan_fft_inverse(w);
    let col_inverse = planner.plan_fft_inverse(h);

    let mut spectrum: Vec<Complex<f64>> = frame
        .as_raw()
        .iter()
        .map(|&v| Complex::new(v as f64, 0.0))
        .collect();
    let mut kernel = vec![Complex::new(0.0, 0.0); w * h];
    for dy in 0..th {
        for dx in 0..tw {
            kernel[dy * w + dx] = Complex::new(zero_mean[dy * tw + dx], 0.0);
        }
    }

    forward_2d(&mut spectrum, w, h, row_forward.as_ref(), col_forward.as_ref());
    forward_2d(&mut kernel, w, h, row_forward.as_ref(), col_forward.as_ref());

    for (f, t) in spectrum.iter_mut().zip(&kernel) {
        *f *= t.conj();
    }

    col_inverse.process(&mut spectrum);
    let mut spatial = transpose(&spectrum, h, w);
    row_inverse.process(&mut spatial);

    // rustfft는 정규화하지 않음
    let scale = (w * h) as f64;
    spatial.iter().map(|c| c.re / scale).collect()
}

/// 매칭 불가 입력인지 확인 (빈 래스터, 템플릿이 프레임보다 큼)
fn can_match(frame: &GrayImage, template: &GrayImage) -> bool {
    frame.width() > 0
        && frame.height() > 0
        && template.width() > 0
        && template.height() > 0
        && template.width() <= frame.width()
        && template.height() <= frame.height()
}

/// 점수 맵 계산. 매칭 불가 입력이면 `None`.
pub fn score_map(frame: &GrayImage, template: &GrayImage) -> Option<ScoreMap> {
    if !can_match(frame, template) {
        return None;
    }

    let (fw, fh) = (frame.width() as usize, frame.height() as usize);
    let (tw, th) = (template.width() as usize, template.height() as usize);
    let n = (tw * th) as u64;

    let t_raw = template.as_raw();
    let t_sum: u64 = t_raw.iter().map(|&v| v as u64).sum();
    let t_sum_sq: u64 = t_raw.iter().map(|&v| (v as u64) * (v as u64)).sum();
    let t_mean = t_sum as f64 / n as f64;
    let t_scaled_var = scaled_variance(n, t_sum, t_sum_sq);
    let t_flat = t_scaled_var == 0;
    let t_energy = t_scaled_var as f64 / n as f64;

    let cross = if t_flat {
        Vec::new()
    } else {
        let zero_mean: Vec<f64> = t_raw.iter().map(|&v| v as f64 - t_mean).collect();
        cross_correlation(frame, &zero_mean, tw, th)
    };

    let integral = IntegralImage::new(frame);
    let (mw, mh) = (fw - tw + 1, fh - th + 1);
    let mut scores = Vec::with_capacity(mw * mh);

    for y in 0..mh {
        for x in 0..mw {
            let (w_sum, w_sum_sq) = integral.window(x, y, tw, th);
            let w_scaled_var = scaled_variance(n, w_sum, w_sum_sq);

            let score = if t_flat {
                let w_mean = w_sum as f64 / n as f64;
                if w_scaled_var == 0 && (w_mean - t_mean).abs() <= FLAT_MEAN_TOLERANCE {
                    1.0
                } else {
                    0.0
                }
            } else if w_scaled_var == 0 {
                0.0
            } else {
                let w_energy = w_scaled_var as f64 / n as f64;
                (cross[y * fw + x] / (w_energy * t_energy).sqrt()).clamp(-1.0, 1.0)
            };
            scores.push(score);
        }
    }

    Some(ScoreMap {
        width: mw as u32,
        height: mh as u32,
        scores,
    })
}

/// 임계값 이상인 모든 배치를 후보로 추출 (신뢰도 내림차순, 동점은 행 우선 순서)
pub fn find_candidates(frame: &GrayImage, template: &GrayImage, threshold: f64) -> Vec<Detection> {
    let Some(map) = score_map(frame, template) else {
        return Vec::new();
    };

    let mut candidates: Vec<Detection> = map
        .scores
        .iter()
        .enumerate()
        .filter(|(_, &score)| score >= threshold)
        .map(|(idx, &score)| {
            let x = (idx % map.width as usize) as i32;
            let y = (idx / map.width as usize) as i32;
            Detection::new(
                BoundingBox::new(x, y, template.width(), template.height()),
                score,
            )
        })
        .collect();

    nms::sort_by_confidence(&mut candidates);
    candidates
}

/// 프레임에서 템플릿을 찾아 억제된 검출 목록을 반환
///
/// 빈 래스터나 프레임보다 큰 템플릿은 에러가 아니라 빈 결과다.
pub fn match_template(frame: &GrayImage, template: &GrayImage, config: &MatchConfig) -> MatchOutcome {
    if !can_match(frame, template) {
        debug!(
            frame = ?frame.dimensions(),
            template = ?template.dimensions(),
            "매칭 불가 입력 — 빈 결과 반환"
        );
        return MatchOutcome::empty();
    }

    let candidates = find_candidates(frame, template, config.threshold);
    if candidates.is_empty() {
        debug!(threshold = config.threshold, "후보 없음");
        return MatchOutcome::empty();
    }

    let detections = nms::suppress(&candidates, config.overlap, config.max_results);
    let limits_hit = detections.len() == config.max_results && candidates.len() > detections.len();

    debug!(
        candidates = candidates.len(),
        detections = detections.len(),
        limits_hit,
        "템플릿 매칭 완료"
    );

    MatchOutcome {
        detections,
        limits_hit,
    }
}

/// 컬러 이미지용 — 표준 luma 가중치로 단일 채널 변환 후 매칭
pub fn match_image(frame: &DynamicImage, template: &DynamicImage, config: &MatchConfig) -> MatchOutcome {
    match_template(&frame.to_luma8(), &template.to_luma8(), config)
}
