//! Final assembly: color mapping, bounds, raster fill, document emission.

use std::collections::BTreeMap;

use base64::Engine;
use regex::RegexBuilder;
use uuid::Uuid;

use crate::convert::convert_leaf;
use crate::document::{
    Bounds, Drawing, Frame, Layer, PathSegment, DRAWING_SCALE, DRAWING_VERSION,
    FILL_PIXELS_PER_UNIT, GRID_SIZE,
};
use crate::flatten::FlatSvg;
use crate::palette::{match_colors, ColorMatch};
use crate::raster::Rasterizer;
use crate::Options;

/// Padding applied around the scanned segment bounds, in drawing units.
const BOUNDS_PADDING: f64 = 0.1;

/// The result of one conversion.
#[derive(Debug)]
pub struct Conversion {
    pub document: Drawing,
    /// Normalized input hex to chosen palette entry.
    pub mappings: BTreeMap<String, ColorMatch>,
    pub warnings: Vec<String>,
}

/// Assemble the target document from a flattened SVG.
///
/// `svg_source` is the original input; the raster fill renders a recolored
/// copy of it so the preview matches the snapped palette.
pub fn assemble(
    svg_source: &str,
    flat: &FlatSvg,
    options: &Options,
    rasterizer: &dyn Rasterizer,
) -> Conversion {
    let mut warnings = flat.warnings.clone();
    let mappings = match_colors(&flat.colors, &options.palette, &mut warnings);

    let mut segments: Vec<PathSegment> = Vec::new();
    for leaf in &flat.leaves {
        segments.extend(convert_leaf(
            leaf,
            &flat.view_box,
            &mappings,
            options.tolerance,
        ));
    }

    if let Some(message) = stroke_width_warning(flat) {
        log::warn!("{message}");
        warnings.push(message);
    }

    let bounds = segment_bounds(&segments);

    let fill_png = if segments.is_empty() {
        String::new()
    } else {
        render_fill(svg_source, &mappings, bounds, rasterizer, &mut warnings)
    };

    let document = Drawing {
        version: DRAWING_VERSION,
        scale: DRAWING_SCALE,
        grid_size: GRID_SIZE,
        fill_pixels_per_unit: FILL_PIXELS_PER_UNIT,
        colors: options.palette.colors.clone(),
        layers: vec![Layer {
            title: "Imported".into(),
            id: Uuid::new_v4().to_string(),
            is_visible: true,
            is_bitmap: false,
            frames: vec![Frame {
                is_linked: false,
                path_data_list: segments,
                fill_image_bounds: bounds,
                fill_png,
            }],
        }],
    };

    Conversion {
        document,
        mappings,
        warnings,
    }
}

/// One warning when painted leaves disagree on stroke width.
fn stroke_width_warning(flat: &FlatSvg) -> Option<String> {
    let mut widths: Vec<f64> = Vec::new();
    for leaf in &flat.leaves {
        if leaf.fill.is_none() && leaf.stroke.is_none() {
            continue;
        }
        if !widths.iter().any(|w| (w - leaf.stroke_width).abs() < 1e-9) {
            widths.push(leaf.stroke_width);
        }
    }
    (widths.len() > 1).then(|| {
        "varying stroke widths are not preserved; all outlines render at the editor default"
            .to_string()
    })
}

/// Scan every segment's endpoints, pad, and fall back to the full canvas
/// when nothing was emitted.
fn segment_bounds(segments: &[PathSegment]) -> Bounds {
    if segments.is_empty() {
        return Bounds {
            min_x: -DRAWING_SCALE,
            max_x: DRAWING_SCALE,
            min_y: -DRAWING_SCALE,
            max_y: DRAWING_SCALE,
        };
    }

    let mut min_x = f64::INFINITY;
    let mut min_y = f64::INFINITY;
    let mut max_x = f64::NEG_INFINITY;
    let mut max_y = f64::NEG_INFINITY;
    for seg in segments {
        for (x, y) in [(seg.p[0], seg.p[1]), (seg.p[2], seg.p[3])] {
            min_x = min_x.min(x);
            min_y = min_y.min(y);
            max_x = max_x.max(x);
            max_y = max_y.max(y);
        }
    }

    Bounds {
        min_x: min_x - BOUNDS_PADDING,
        max_x: max_x + BOUNDS_PADDING,
        min_y: min_y - BOUNDS_PADDING,
        max_y: max_y + BOUNDS_PADDING,
    }
}

/// Replace every mapped hex with its palette hex, case-insensitively.
fn recolor_svg(svg: &str, mappings: &BTreeMap<String, ColorMatch>) -> String {
    let mut out = svg.to_string();
    for (input, m) in mappings {
        if input == &m.hex {
            continue;
        }
        let re = RegexBuilder::new(&regex::escape(input))
            .case_insensitive(true)
            .build()
            .expect("valid regex");
        out = re.replace_all(&out, m.hex.as_str()).into_owned();
    }
    out
}

fn render_fill(
    svg_source: &str,
    mappings: &BTreeMap<String, ColorMatch>,
    bounds: Bounds,
    rasterizer: &dyn Rasterizer,
    warnings: &mut Vec<String>,
) -> String {
    let width = ((bounds.max_x - bounds.min_x) * FILL_PIXELS_PER_UNIT).ceil() as i64;
    let height = ((bounds.max_y - bounds.min_y) * FILL_PIXELS_PER_UNIT).ceil() as i64;
    if width <= 0 || height <= 0 {
        return String::new();
    }

    let recolored = recolor_svg(svg_source, mappings);
    match rasterizer.rasterize(&recolored, width as u32, height as u32) {
        Ok(png) => base64::engine::general_purpose::STANDARD.encode(png),
        Err(e) => {
            let message = format!("fill layer not rendered: {e}");
            log::warn!("{message}");
            warnings.push(message);
            String::new()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::color::PaletteColor;
    use crate::document::STYLE_LINE;

    fn segment(p: [f64; 4]) -> PathSegment {
        PathSegment {
            p,
            s: STYLE_LINE,
            f: false,
            bp: None,
            c: None,
            is_transparent: None,
        }
    }

    fn match_to(hex: &str) -> ColorMatch {
        ColorMatch {
            index: 0,
            hex: hex.to_string(),
            color: PaletteColor::from_hex(hex).unwrap(),
            delta_e: 0.0,
        }
    }

    #[test]
    fn test_fallback_bounds() {
        let b = segment_bounds(&[]);
        assert_eq!(
            b,
            Bounds {
                min_x: -10.0,
                max_x: 10.0,
                min_y: -10.0,
                max_y: 10.0
            }
        );
    }

    #[test]
    fn test_bounds_padding() {
        let b = segment_bounds(&[segment([-1.0, -2.0, 3.0, 4.0])]);
        assert_eq!(b.min_x, -1.1);
        assert_eq!(b.min_y, -2.1);
        assert_eq!(b.max_x, 3.1);
        assert_eq!(b.max_y, 4.1);
    }

    #[test]
    fn test_recolor_case_insensitive() {
        let mut mappings = BTreeMap::new();
        mappings.insert("#ff0000".to_string(), match_to("#b4202a"));
        let out = recolor_svg(r##"<rect fill="#FF0000" stroke="#ff0000"/>"##, &mappings);
        assert_eq!(out, r##"<rect fill="#b4202a" stroke="#b4202a"/>"##);
    }

    #[test]
    fn test_recolor_skips_identity() {
        let mut mappings = BTreeMap::new();
        mappings.insert("#ffffff".to_string(), match_to("#ffffff"));
        let svg = r##"<rect fill="#ffffff"/>"##;
        assert_eq!(recolor_svg(svg, &mappings), svg);
    }
}
