//! Attention-anchored crop window selection.
//!
//! The saliency score of a pixel is its gradient magnitude on a downscaled
//! luma copy. Only one axis ever overflows after a cover scale, so the best
//! window is found with a 1-D sliding sum over per-column (or per-row) energy.

use image::{imageops, DynamicImage, GenericImageView, GrayImage};

/// Factor the luma copy is reduced by before scoring.
const SCALE: u32 = 4;

/// Top-left corner of the most salient `target_width` x `target_height`
/// window inside `img`.
pub fn attention_offset(img: &DynamicImage, target_width: u32, target_height: u32) -> (u32, u32) {
    let (width, height) = img.dimensions();
    let slack_x = width.saturating_sub(target_width);
    let slack_y = height.saturating_sub(target_height);
    if slack_x == 0 && slack_y == 0 {
        return (0, 0);
    }

    let small_width = (width / SCALE).max(1);
    let small_height = (height / SCALE).max(1);
    let small = imageops::resize(
        &img.to_luma8(),
        small_width,
        small_height,
        imageops::FilterType::Triangle,
    );
    let energy = edge_energy(&small);

    let x = if slack_x > 0 {
        let columns: Vec<f32> = (0..small_width)
            .map(|x| (0..small_height).map(|y| energy[(y * small_width + x) as usize]).sum())
            .collect();
        best_window(&columns, target_width / SCALE, slack_x / SCALE) * SCALE
    } else {
        0
    };

    let y = if slack_y > 0 {
        let rows: Vec<f32> = (0..small_height)
            .map(|y| (0..small_width).map(|x| energy[(y * small_width + x) as usize]).sum())
            .collect();
        best_window(&rows, target_height / SCALE, slack_y / SCALE) * SCALE
    } else {
        0
    };

    (x.min(slack_x), y.min(slack_y))
}

fn edge_energy(gray: &GrayImage) -> Vec<f32> {
    let (width, height) = gray.dimensions();
    let mut energy = vec![0.0f32; (width * height) as usize];

    for y in 1..height.saturating_sub(1) {
        for x in 1..width.saturating_sub(1) {
            let gx = gray.get_pixel(x + 1, y)[0] as f32 - gray.get_pixel(x - 1, y)[0] as f32;
            let gy = gray.get_pixel(x, y + 1)[0] as f32 - gray.get_pixel(x, y - 1)[0] as f32;
            energy[(y * width + x) as usize] = (gx * gx + gy * gy).sqrt();
        }
    }

    energy
}

/// Start of the `window`-long run with the largest sum, searched over
/// `0..=max_start`. Ties keep the most central start.
fn best_window(values: &[f32], window: u32, max_start: u32) -> u32 {
    let window = (window as usize).clamp(1, values.len().max(1));
    let max_start = (max_start as usize).min(values.len().saturating_sub(window));
    let center = max_start / 2;

    let mut sum: f32 = values.iter().take(window).sum();
    let mut best = (sum, 0usize);

    for start in 1..=max_start {
        sum += values[start + window - 1] - values[start - 1];
        let closer = start.abs_diff(center) < best.1.abs_diff(center);
        if sum > best.0 || (sum == best.0 && closer) {
            best = (sum, start);
        }
    }

    best.1 as u32
}
