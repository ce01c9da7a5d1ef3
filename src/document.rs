//! The target drawing document schema.
//!
//! This is the fixed JSON shape the downstream pixel-art editor imports.
//! Field names and constants are part of that contract and must not drift.

use serde::Serialize;

use crate::color::PaletteColor;

pub const DRAWING_VERSION: u32 = 3;
/// Half-extent of the square canvas: coordinates span [-10, +10].
pub const DRAWING_SCALE: f64 = 10.0;
pub const GRID_SIZE: f64 = 0.71428571428571;
pub const FILL_PIXELS_PER_UNIT: f64 = 25.6;

/// Straight line, or quadratic when a bend point is present.
pub const STYLE_LINE: u8 = 1;
/// Clockwise arc. Reserved by the editor; the converter never emits it.
pub const STYLE_ARC_CW: u8 = 2;
/// Counter-clockwise arc. Reserved, like [`STYLE_ARC_CW`].
pub const STYLE_ARC_CCW: u8 = 3;

#[derive(Debug, Clone, Serialize)]
pub struct Drawing {
    pub version: u32,
    pub scale: f64,
    #[serde(rename = "gridSize")]
    pub grid_size: f64,
    #[serde(rename = "fillPixelsPerUnit")]
    pub fill_pixels_per_unit: f64,
    pub colors: Vec<PaletteColor>,
    pub layers: Vec<Layer>,
}

#[derive(Debug, Clone, Serialize)]
pub struct Layer {
    pub title: String,
    pub id: String,
    #[serde(rename = "isVisible")]
    pub is_visible: bool,
    #[serde(rename = "isBitmap")]
    pub is_bitmap: bool,
    pub frames: Vec<Frame>,
}

#[derive(Debug, Clone, Serialize)]
pub struct Frame {
    #[serde(rename = "isLinked")]
    pub is_linked: bool,
    #[serde(rename = "pathDataList")]
    pub path_data_list: Vec<PathSegment>,
    #[serde(rename = "fillImageBounds")]
    pub fill_image_bounds: Bounds,
    /// Base64 PNG body without a data-URI prefix; empty when no fill was
    /// rendered.
    #[serde(rename = "fillPng")]
    pub fill_png: String,
}

/// Fill image bounds in drawing units.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Bounds {
    #[serde(rename = "minX")]
    pub min_x: f64,
    #[serde(rename = "maxX")]
    pub max_x: f64,
    #[serde(rename = "minY")]
    pub min_y: f64,
    #[serde(rename = "maxY")]
    pub max_y: f64,
}

/// One editor path segment: two endpoints, an optional quadratic bend
/// point, and paint flags.
#[derive(Debug, Clone, Serialize)]
pub struct PathSegment {
    /// Endpoints as [x1, y1, x2, y2] in drawing units.
    pub p: [f64; 4],
    /// Style tag: see the STYLE_* constants.
    pub s: u8,
    /// true = fill-only (no outline).
    pub f: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub bp: Option<BendPoint>,
    /// RGBA in [0, 1]; absent means the editor default.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub c: Option<[f64; 4]>,
    #[serde(rename = "isTransparent", skip_serializing_if = "Option::is_none")]
    pub is_transparent: Option<bool>,
}

#[derive(Debug, Clone, Copy, Serialize)]
pub struct BendPoint {
    pub x: f64,
    pub y: f64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_segment_json_shape() {
        let seg = PathSegment {
            p: [0.0, 1.0, 2.0, 3.0],
            s: STYLE_LINE,
            f: true,
            bp: None,
            c: Some([0.5, 0.5, 0.5, 1.0]),
            is_transparent: None,
        };
        let json = serde_json::to_value(&seg).unwrap();
        assert_eq!(json["p"].as_array().unwrap().len(), 4);
        assert_eq!(json["s"], 1);
        assert_eq!(json["f"], true);
        assert!(json.get("bp").is_none());
        assert!(json.get("isTransparent").is_none());
        assert_eq!(json["c"].as_array().unwrap().len(), 4);
    }

    #[test]
    fn test_document_field_names() {
        let doc = Drawing {
            version: DRAWING_VERSION,
            scale: DRAWING_SCALE,
            grid_size: GRID_SIZE,
            fill_pixels_per_unit: FILL_PIXELS_PER_UNIT,
            colors: vec![],
            layers: vec![Layer {
                title: "Imported".into(),
                id: "x".into(),
                is_visible: true,
                is_bitmap: false,
                frames: vec![Frame {
                    is_linked: false,
                    path_data_list: vec![],
                    fill_image_bounds: Bounds {
                        min_x: -10.0,
                        max_x: 10.0,
                        min_y: -10.0,
                        max_y: 10.0,
                    },
                    fill_png: String::new(),
                }],
            }],
        };
        let json = serde_json::to_value(&doc).unwrap();
        assert_eq!(json["version"], 3);
        assert_eq!(json["gridSize"], GRID_SIZE);
        assert_eq!(json["fillPixelsPerUnit"], 25.6);
        let layer = &json["layers"][0];
        assert_eq!(layer["isVisible"], true);
        assert_eq!(layer["isBitmap"], false);
        let frame = &layer["frames"][0];
        assert_eq!(frame["isLinked"], false);
        assert!(frame["fillImageBounds"]["minX"].is_number());
        assert!(frame["pathDataList"].is_array());
        assert_eq!(frame["fillPng"], "");
    }
}
