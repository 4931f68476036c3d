//! Field rendering: colored segments to PNG bytes via plotters.

use crate::field::ColoredSegment;
use crate::plot::types::RenderedField;
use image::codecs::png::PngEncoder;
use image::ImageEncoder;
use plotters::prelude::*;

/// Background color (near-black, so the hue buckets stand out).
const BG_COLOR: RGBColor = RGBColor(17, 17, 27);
/// Axis / grid color.
const AXIS_COLOR: RGBColor = RGBColor(88, 91, 112);

/// Render a segment sequence to a PNG image.
pub fn render_png(
    segments: &[ColoredSegment],
    width: u32,
    height: u32,
) -> Result<RenderedField, String> {
    let mut buf = vec![0u8; (width * height * 3) as usize];

    {
        let root = BitMapBackend::with_buffer(&mut buf, (width, height)).into_drawing_area();
        root.fill(&BG_COLOR).map_err(|e| format!("fill: {}", e))?;

        let ((x_min, x_max), (y_min, y_max)) = compute_bounds(segments);

        let mut chart = ChartBuilder::on(&root)
            .margin(10)
            .build_cartesian_2d(x_min..x_max, y_min..y_max)
            .map_err(|e| format!("chart build: {}", e))?;

        chart
            .configure_mesh()
            .axis_style(AXIS_COLOR)
            .bold_line_style(AXIS_COLOR.mix(0.3))
            .light_line_style(AXIS_COLOR.mix(0.1))
            .x_labels(0)
            .y_labels(0)
            .draw()
            .map_err(|e| format!("mesh: {}", e))?;

        for seg in segments {
            let (r, g, b) = seg.color;
            let color = RGBColor(r, g, b);
            chart
                .draw_series(LineSeries::new(
                    [seg.start, seg.end],
                    color.mix(segment_opacity(seg)).stroke_width(1),
                ))
                .map_err(|e| format!("draw segment: {}", e))?;
        }

        root.present().map_err(|e| format!("present: {}", e))?;
    }

    let png_bytes = encode_rgb_to_png(&buf, width, height)?;

    Ok(RenderedField {
        png_bytes,
        width,
        height,
    })
}

/// Opacity follows the segment's verticality: |Δy| over the segment
/// length, clamped to [0.2, 1.0] so flat segments fade toward the
/// background without vanishing.
fn segment_opacity(seg: &ColoredSegment) -> f64 {
    let dx = seg.end.0 - seg.start.0;
    let dy = seg.end.1 - seg.start.1;
    let len = (dx * dx + dy * dy).sqrt();
    if len <= 0.0 || !len.is_finite() {
        return 1.0;
    }
    (dy.abs() / len).clamp(0.2, 1.0)
}

/// Bounding box of all segment endpoints, padded; falls back to a unit
/// box for an empty render.
fn compute_bounds(segments: &[ColoredSegment]) -> ((f64, f64), (f64, f64)) {
    let mut x_min = f64::INFINITY;
    let mut x_max = f64::NEG_INFINITY;
    let mut y_min = f64::INFINITY;
    let mut y_max = f64::NEG_INFINITY;

    for seg in segments {
        for (x, y) in [seg.start, seg.end] {
            if x.is_finite() && y.is_finite() {
                x_min = x_min.min(x);
                x_max = x_max.max(x);
                y_min = y_min.min(y);
                y_max = y_max.max(y);
            }
        }
    }

    if !x_min.is_finite() || !y_min.is_finite() {
        return ((-1.0, 1.0), (-1.0, 1.0));
    }
    if (x_max - x_min).abs() < 1e-10 {
        x_min -= 1.0;
        x_max += 1.0;
    }
    if (y_max - y_min).abs() < 1e-10 {
        y_min -= 1.0;
        y_max += 1.0;
    }

    // 5% padding
    let x_pad = (x_max - x_min) * 0.05;
    let y_pad = (y_max - y_min) * 0.05;
    ((x_min - x_pad, x_max + x_pad), (y_min - y_pad, y_max + y_pad))
}

/// Encode a raw RGB pixel buffer to PNG.
fn encode_rgb_to_png(rgb: &[u8], width: u32, height: u32) -> Result<Vec<u8>, String> {
    let mut png = Vec::new();
    let encoder = PngEncoder::new(&mut png);
    encoder
        .write_image(rgb, width, height, image::ExtendedColorType::Rgb8)
        .map_err(|e| format!("PNG encode: {}", e))?;
    Ok(png)
}
