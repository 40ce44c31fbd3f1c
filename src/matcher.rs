//! Pure-Rust template matching using normalized cross-correlation.
//!
//! Matching is grayscale and zero-mean: a template is compared against every
//! candidate window and scored in [0, 1], with anti-correlated and flat
//! windows scoring 0. Only the single best window is reported.

use image::{imageops, GrayImage, RgbaImage};
use serde::Serialize;

/// Best-match location in frame coordinates (full resolution).
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Match {
    pub x: u32,
    pub y: u32,
    pub width: u32,
    pub height: u32,
    pub center_x: u32,
    pub center_y: u32,
    pub confidence: f32,
}

/// Knobs for a single search.
#[derive(Debug, Clone, Copy)]
pub struct MatchPolicy {
    /// Sweep floor. The acceptance sweep walks 1.0, 0.9, ... and stops
    /// before dropping below this.
    pub min_confidence: f32,
    /// Frames larger than this on either axis are searched downscaled.
    pub max_search_dim: u32,
}

impl Default for MatchPolicy {
    fn default() -> Self {
        Self { min_confidence: 0.5, max_search_dim: 1920 }
    }
}

/// Search `frame` for the single best occurrence of `template`.
///
/// Returns `None` when the template cannot be matched at all (flat, larger
/// than the frame, degenerate after downscaling) or when the adaptive sweep
/// finds no threshold at or above `min_confidence` that the best score
/// clears. Never panics on odd inputs.
pub fn find_best_match(
    frame: &RgbaImage,
    template: &RgbaImage,
    policy: &MatchPolicy,
) -> Option<Match> {
    if template.width() < 4 || template.height() < 4 {
        tracing::debug!(
            template_w = template.width(),
            template_h = template.height(),
            "template too small to correlate"
        );
        return None;
    }
    if template.width() > frame.width() || template.height() > frame.height() {
        tracing::debug!(
            template_w = template.width(),
            template_h = template.height(),
            frame_w = frame.width(),
            frame_h = frame.height(),
            "template larger than frame"
        );
        return None;
    }

    let frame_gray = imageops::grayscale(frame);
    let template_gray = imageops::grayscale(template);
    let stats = TemplateStats::of(&template_gray)?;

    // Oversized frames are searched downscaled for speed, keeping the
    // factor to map the winning position back to full resolution.
    let max_dim = frame_gray.width().max(frame_gray.height());
    let factor = if max_dim > policy.max_search_dim {
        max_dim as f32 / policy.max_search_dim as f32
    } else {
        1.0
    };

    let (best_x, best_y, best_score) = if factor > 1.0 {
        let sw = (frame_gray.width() as f32 / factor).max(1.0) as u32;
        let sh = (frame_gray.height() as f32 / factor).max(1.0) as u32;
        let pw = (template_gray.width() as f32 / factor).max(1.0) as u32;
        let ph = (template_gray.height() as f32 / factor).max(1.0) as u32;
        let scene = imageops::resize(&frame_gray, sw, sh, imageops::FilterType::Triangle);
        let probe = imageops::resize(&template_gray, pw, ph, imageops::FilterType::Triangle);
        if probe.width() < 4 || probe.height() < 4 {
            tracing::debug!("template degenerate after downscaling");
            return None;
        }
        if probe.width() > scene.width() || probe.height() > scene.height() {
            return None;
        }
        let probe_stats = TemplateStats::of(&probe)?;
        let (coarse_x, coarse_y, _) = scan(&scene, &probe_stats);
        // The downscaled winner is exact only to within one scale factor.
        let radius = factor.ceil() as u32 + 1;
        refine(
            &frame_gray,
            &stats,
            (coarse_x as f32 * factor) as u32,
            (coarse_y as f32 * factor) as u32,
            radius,
        )
    } else {
        scan(&frame_gray, &stats)
    };

    // Adaptive acceptance: walk thresholds from 1.0 downward in 0.1 steps,
    // never below the configured floor.
    let mut accepted = None;
    for tier in (0..=10).rev() {
        let threshold = tier as f32 / 10.0;
        if threshold < policy.min_confidence {
            break;
        }
        if best_score >= threshold {
            accepted = Some(threshold);
            break;
        }
    }
    let threshold = match accepted {
        Some(t) => t,
        None => {
            tracing::debug!(best_score, floor = policy.min_confidence, "no acceptable match");
            return None;
        }
    };
    tracing::debug!(best_score, threshold, "template matched");

    let width = template.width();
    let height = template.height();
    Some(Match {
        x: best_x,
        y: best_y,
        width,
        height,
        center_x: best_x + width / 2,
        center_y: best_y + height / 2,
        confidence: best_score,
    })
}

struct TemplateStats {
    pixels: Vec<f32>,
    mean: f32,
    std: f32,
    width: u32,
    height: u32,
}

impl TemplateStats {
    /// Precompute mean and deviation; a flat template has no signal to
    /// correlate against and yields `None`.
    fn of(probe: &GrayImage) -> Option<Self> {
        let pixels: Vec<f32> = probe.pixels().map(|p| p.0[0] as f32).collect();
        let mean = pixels.iter().sum::<f32>() / pixels.len() as f32;
        let std = (pixels.iter().map(|&p| (p - mean).powi(2)).sum::<f32>()
            / pixels.len() as f32)
            .sqrt();
        if std < 1e-6 {
            tracing::debug!("template is flat, refusing to match");
            return None;
        }
        Some(Self { pixels, mean, std, width: probe.width(), height: probe.height() })
    }
}

/// Score every placement of the template over the scene.
fn scan(scene: &GrayImage, stats: &TemplateStats) -> (u32, u32, f32) {
    let span_x = scene.width() - stats.width;
    let span_y = scene.height() - stats.height;
    let mut best = (0u32, 0u32, f32::MIN);
    for y in 0..=span_y {
        for x in 0..=span_x {
            let score = ncc_at(scene, x, y, stats);
            if score > best.2 {
                best = (x, y, score);
            }
        }
    }
    best
}

/// Re-score the neighborhood of a seed position. Recovers the rounding lost
/// when a downscaled winner is mapped back to full resolution.
fn refine(
    scene: &GrayImage,
    stats: &TemplateStats,
    seed_x: u32,
    seed_y: u32,
    radius: u32,
) -> (u32, u32, f32) {
    let span_x = scene.width() - stats.width;
    let span_y = scene.height() - stats.height;
    let seed_x = seed_x.min(span_x);
    let seed_y = seed_y.min(span_y);
    let mut best = (seed_x, seed_y, f32::MIN);
    for y in seed_y.saturating_sub(radius)..=(seed_y + radius).min(span_y) {
        for x in seed_x.saturating_sub(radius)..=(seed_x + radius).min(span_x) {
            let score = ncc_at(scene, x, y, stats);
            if score > best.2 {
                best = (x, y, score);
            }
        }
    }
    best
}

/// Zero-mean NCC at one window position, clamped to [0, 1].
fn ncc_at(scene: &GrayImage, x: u32, y: u32, stats: &TemplateStats) -> f32 {
    let n = (stats.width * stats.height) as f32;
    let mut sum = 0.0f32;
    let mut sum_sq = 0.0f32;
    let mut cross = 0.0f32;

    let mut idx = 0usize;
    for ty in 0..stats.height {
        for tx in 0..stats.width {
            let s = scene.get_pixel(x + tx, y + ty).0[0] as f32;
            let t = stats.pixels[idx];
            idx += 1;
            sum += s;
            sum_sq += s * s;
            cross += s * (t - stats.mean);
        }
    }

    let mean = sum / n;
    let var = sum_sq / n - mean * mean;
    let std = var.max(0.0).sqrt();
    if std < 1e-6 {
        return 0.0;
    }
    (cross / (n * std * stats.std)).clamp(0.0, 1.0)
}
