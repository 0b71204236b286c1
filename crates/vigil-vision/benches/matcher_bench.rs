//! vigil-vision 성능 벤치마크
//!
//! 실행: cargo bench -p vigil-vision
//!
//! 벤치마크 대상:
//! - 템플릿 매칭 (match_template) — 질감 있는(24, 64)/평탄한 템플릿
//! - 중복 억제 (suppress)
//! - TSV 파싱 (parse_tsv)

use std::hint::black_box;

use criterion::{criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use image::{GrayImage, Luma};
use vigil_core::models::detection::{Detection, MatchConfig};
use vigil_core::models::geometry::BoundingBox;
use vigil_vision::{matcher, nms, tsv};

/// 결정적 질감 프레임
fn create_textured_frame(width: u32, height: u32, seed: u8) -> GrayImage {
    GrayImage::from_fn(width, height, |x, y| {
        let v = (x as u8)
            .wrapping_mul(31)
            .wrapping_add((y as u8).wrapping_mul(17))
            .wrapping_add(seed);
        Luma([v])
    })
}

/// 프레임 일부를 잘라 템플릿으로 사용
fn cut_template(frame: &GrayImage, x: u32, y: u32, size: u32) -> GrayImage {
    image::imageops::crop_imm(frame, x, y, size, size).to_image()
}

/// 템플릿 매칭 벤치마크
fn bench_match_template(c: &mut Criterion) {
    let mut group = c.benchmark_group("match_template");
    group.sample_size(10);

    let config = MatchConfig::new(0.9, 10, 0.3);
    let resolutions = [(320, 240), (640, 480)];

    for (width, height) in resolutions {
        group.throughput(Throughput::Elements((width * height) as u64));

        let frame = create_textured_frame(width, height, 3);
        let flat = GrayImage::from_pixel(64, 64, Luma([128]));

        // 상호 항 비용은 템플릿 크기와 무관해야 함
        for size in [24, 64] {
            let textured = cut_template(&frame, width / 3, height / 3, size);
            group.bench_with_input(
                BenchmarkId::new(format!("textured_{size}"), format!("{width}x{height}")),
                &(&frame, &textured),
                |b, (frame, template)| {
                    b.iter(|| black_box(matcher::match_template(frame, template, &config)));
                },
            );
        }

        group.bench_with_input(
            BenchmarkId::new("flat_64", format!("{width}x{height}")),
            &(&frame, &flat),
            |b, (frame, template)| {
                b.iter(|| black_box(matcher::match_template(frame, template, &config)));
            },
        );
    }

    group.finish();
}

/// 중복 억제 벤치마크 — 밀집 후보 군집
fn bench_suppress(c: &mut Criterion) {
    let mut group = c.benchmark_group("suppress");

    for count in [100usize, 1_000] {
        let mut candidates: Vec<Detection> = (0..count)
            .map(|i| {
                let x = (i % 40) as i32 * 3;
                let y = (i / 40) as i32 * 3;
                let confidence = 1.0 - (i as f64 / count as f64) * 0.2;
                Detection::new(BoundingBox::new(x, y, 16, 16), confidence)
            })
            .collect();
        nms::sort_by_confidence(&mut candidates);

        group.throughput(Throughput::Elements(count as u64));
        group.bench_with_input(BenchmarkId::from_parameter(count), &candidates, |b, c| {
            b.iter(|| black_box(nms::suppress(c, 0.3, 10)));
        });
    }

    group.finish();
}

/// TSV 파싱 벤치마크
fn bench_parse_tsv(c: &mut Criterion) {
    let mut input =
        String::from("level\tpage_num\tblock_num\tpar_num\tline_num\tword_num\tleft\ttop\twidth\theight\tconf\ttext");
    for i in 0..500 {
        input.push_str(&format!(
            "\n5\t1\t1\t1\t{}\t{}\t{}\t{}\t40\t12\t{}\tword{}",
            i / 10,
            i % 10,
            i * 3,
            i * 2,
            80 + i % 20,
            i
        ));
    }

    c.bench_function("parse_tsv_500_rows", |b| {
        b.iter(|| black_box(tsv::parse_tsv(&input)));
    });
}

criterion_group!(benches, bench_match_template, bench_suppress, bench_parse_tsv);
criterion_main!(benches);
