//! 亮度计算 (纯函数,无状态)
//!
//! 流程: sRGB 线性化 → Rec.709 相对亮度 Y → CIE L* 感知明度
//! → 去除少量极暗/极亮像素后再统计一次

use image::RgbImage;

use super::LumaValues;

/// 明度低于此值视为黑
const BLACK_THR: f64 = 9.0;
/// 明度高于此值视为白
const WHITE_THR: f64 = 95.0;
/// 黑/白像素占比低于此值时才过滤
const BLACK_LIM: f64 = 0.6;
const WHITE_LIM: f64 = 0.6;

/// 均值 / 几何均值 / 中位数
#[derive(Clone, Copy, Debug, Default, PartialEq)]
struct Summary {
    mean: f64,
    geom_mean: f64,
    median: f64,
}

pub struct LumaCalculator;

impl LumaCalculator {
    pub fn calculate(image: &RgbImage) -> LumaValues {
        let luma: Vec<f64> = image
            .pixels()
            .map(|p| pixel_luma(p.0[0], p.0[1], p.0[2]))
            .collect();
        let lightness: Vec<f64> = luma.iter().map(|&y| perceived_lightness(y)).collect();
        let filtered = filter_extremes(&lightness);

        let luma_summary = summarize(&luma);
        let lightness_summary = summarize(&lightness);
        let filtered_summary = summarize(&filtered);

        LumaValues {
            mean_luma: luma_summary.mean,
            geom_mean_luma: luma_summary.geom_mean,
            mean_lightness: lightness_summary.mean,
            geom_mean_lightness: lightness_summary.geom_mean,
            median_lightness: lightness_summary.median,
            mean_filtered_lightness: filtered_summary.mean,
            geom_mean_filtered_lightness: filtered_summary.geom_mean,
            median_filtered_lightness: filtered_summary.median,
        }
    }
}

fn linearize(channel: f64) -> f64 {
    if channel < 0.04045 {
        channel / 12.92
    } else {
        ((channel + 0.055) / 1.055).powf(2.4)
    }
}

/// 相对亮度 Y ∈ [0, 1]
fn pixel_luma(r: u8, g: u8, b: u8) -> f64 {
    let lin = |c: u8| linearize(c as f64 / 255.0);
    0.2126 * lin(r) + 0.7152 * lin(g) + 0.0722 * lin(b)
}

/// CIE L* ∈ [0, 100]
fn perceived_lightness(y: f64) -> f64 {
    if y <= 0.008856 {
        y * 903.3
    } else {
        y.cbrt() * 116.0 - 16.0
    }
}

fn filter_extremes(lightness: &[f64]) -> Vec<f64> {
    if lightness.is_empty() {
        return Vec::new();
    }
    let n = lightness.len() as f64;
    let black = lightness.iter().filter(|&&l| l < BLACK_THR).count() as f64 / n;
    let white = lightness.iter().filter(|&&l| l > WHITE_THR).count() as f64 / n;

    lightness
        .iter()
        .copied()
        .filter(|&l| black >= BLACK_LIM || l > BLACK_THR)
        .filter(|&l| white >= WHITE_LIM || l < WHITE_THR)
        .collect()
}

fn summarize(values: &[f64]) -> Summary {
    if values.is_empty() {
        return Summary::default();
    }
    let n = values.len() as f64;
    let mean = values.iter().sum::<f64>() / n;

    // 含 0 时几何均值为 0
    let geom_mean = if values.iter().any(|&v| v <= 0.0) {
        0.0
    } else {
        (values.iter().map(|v| v.ln()).sum::<f64>() / n).exp()
    };

    let mut sorted = values.to_vec();
    sorted.sort_by(|a, b| a.total_cmp(b));
    let mid = sorted.len() / 2;
    let median = if sorted.len() % 2 == 0 {
        (sorted[mid - 1] + sorted[mid]) / 2.0
    } else {
        sorted[mid]
    };

    Summary {
        mean,
        geom_mean,
        median,
    }
}
