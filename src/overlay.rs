//! Navigation guides drawn on zoom artifacts.
//!
//! The canvas is the current viewport crop. Guides give a vision model the
//! anchors the direction vocabulary talks about: semi-transparent red lines
//! at the horizontal and vertical thirds, and a green border around the
//! middle 50% box that `center` zooms into. Guides go onto a copy returned
//! to the caller; the source image stays clean, so template crops never
//! carry them.

use image::RgbaImage;

const THIRDS_COLOR: [u8; 4] = [255, 0, 0, 102];
const CENTER_COLOR: [u8; 4] = [0, 255, 0, 153];
const LINE_THICKNESS: u32 = 2;

pub fn with_navigation_guides(source: &RgbaImage) -> RgbaImage {
    let mut canvas = source.clone();
    let (w, h) = canvas.dimensions();
    if w < 8 || h < 8 {
        return canvas;
    }

    // Thirds lines.
    for col in 1..3u32 {
        draw_vertical(&mut canvas, col * w / 3, THIRDS_COLOR);
    }
    for row in 1..3u32 {
        draw_horizontal(&mut canvas, row * h / 3, THIRDS_COLOR);
    }

    // Middle 50% box border.
    let x1 = w / 4;
    let y1 = h / 4;
    let x2 = x1 + w / 2 - 1;
    let y2 = y1 + h / 2 - 1;
    draw_box_border(&mut canvas, x1, y1, x2, y2, CENTER_COLOR);
    canvas
}

fn draw_vertical(canvas: &mut RgbaImage, x: u32, col: [u8; 4]) {
    let (w, h) = canvas.dimensions();
    for t in 0..LINE_THICKNESS {
        let x = x + t;
        if x >= w {
            break;
        }
        for y in 0..h {
            blend_pixel(canvas.get_pixel_mut(x, y), col);
        }
    }
}

fn draw_horizontal(canvas: &mut RgbaImage, y: u32, col: [u8; 4]) {
    let (w, h) = canvas.dimensions();
    for t in 0..LINE_THICKNESS {
        let y = y + t;
        if y >= h {
            break;
        }
        for x in 0..w {
            blend_pixel(canvas.get_pixel_mut(x, y), col);
        }
    }
}

fn draw_box_border(canvas: &mut RgbaImage, x1: u32, y1: u32, x2: u32, y2: u32, col: [u8; 4]) {
    let (w, h) = canvas.dimensions();
    for t in 0..LINE_THICKNESS {
        let ty = y1 + t;
        let by = y2.saturating_sub(t);
        for x in x1..=x2.min(w - 1) {
            if ty < h {
                blend_pixel(canvas.get_pixel_mut(x, ty), col);
            }
            if by < h {
                blend_pixel(canvas.get_pixel_mut(x, by), col);
            }
        }
        let lx = x1 + t;
        let rx = x2.saturating_sub(t);
        for y in y1..=y2.min(h - 1) {
            if lx < w {
                blend_pixel(canvas.get_pixel_mut(lx, y), col);
            }
            if rx < w {
                blend_pixel(canvas.get_pixel_mut(rx, y), col);
            }
        }
    }
}

fn blend_pixel(pixel: &mut image::Rgba<u8>, col: [u8; 4]) {
    let alpha = col[3] as f32 / 255.0;
    pixel[0] = (pixel[0] as f32 * (1.0 - alpha) + col[0] as f32 * alpha).round() as u8;
    pixel[1] = (pixel[1] as f32 * (1.0 - alpha) + col[1] as f32 * alpha).round() as u8;
    pixel[2] = (pixel[2] as f32 * (1.0 - alpha) + col[2] as f32 * alpha).round() as u8;
    // alpha channel intentionally preserved
}
