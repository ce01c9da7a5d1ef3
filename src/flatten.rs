//! SVG flattening: resolve inheritance, transforms and shape primitives
//! into a flat list of transformed path leaves.

use std::sync::OnceLock;

use regex::Regex;

use crate::ast::Element;
use crate::color;
use crate::error::PixvecError;
use crate::matrix::{parse_number_list, Matrix};

/// The rectangle of user-space coordinates the document occupies.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ViewBox {
    pub x: f64,
    pub y: f64,
    pub w: f64,
    pub h: f64,
}

/// One leaf path with resolved paint and its accumulated transform.
#[derive(Debug, Clone)]
pub struct Leaf {
    pub d: String,
    /// Normalized fill hex, or None for no paint.
    pub fill: Option<String>,
    /// Normalized stroke hex, or None for no paint.
    pub stroke: Option<String>,
    pub stroke_width: f64,
    pub transform: Matrix,
}

/// The flattened document: leaves in document order plus the distinct
/// normalized colors they use.
#[derive(Debug, Clone)]
pub struct FlatSvg {
    pub view_box: ViewBox,
    pub leaves: Vec<Leaf>,
    pub colors: Vec<String>,
    pub warnings: Vec<String>,
}

fn fill_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"fill\s*:\s*([^;]+)").expect("valid regex"))
}

fn stroke_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"stroke\s*:\s*([^;]+)").expect("valid regex"))
}

fn stop_color_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"stop-color\s*:\s*([^;]+)").expect("valid regex"))
}

fn url_ref_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"url\(\s*#([^)\s]+)\s*\)").expect("valid regex"))
}

/// Flatten a parsed SVG tree. Fails only when no `<svg>` element exists.
pub fn flatten(root: &Element) -> Result<FlatSvg, PixvecError> {
    let svg = root.find_tag("svg").ok_or(PixvecError::NoSvgRoot)?;

    let mut flat = FlatSvg {
        view_box: read_view_box(svg),
        leaves: Vec::new(),
        colors: Vec::new(),
        warnings: Vec::new(),
    };

    let mut walker = Walker {
        svg_root: svg,
        flat: &mut flat,
    };
    walker.walk(svg, Matrix::IDENTITY, None, None);

    Ok(flat)
}

fn read_view_box(svg: &Element) -> ViewBox {
    if let Some(vb) = svg.get_attr("viewBox") {
        let n = parse_number_list(vb);
        if n.len() == 4 && n[2] > 0.0 && n[3] > 0.0 {
            return ViewBox {
                x: n[0],
                y: n[1],
                w: n[2],
                h: n[3],
            };
        }
    }
    let w = svg
        .get_attr("width")
        .and_then(parse_length)
        .filter(|v| *v > 0.0)
        .unwrap_or(100.0);
    let h = svg
        .get_attr("height")
        .and_then(parse_length)
        .filter(|v| *v > 0.0)
        .unwrap_or(100.0);
    ViewBox {
        x: 0.0,
        y: 0.0,
        w,
        h,
    }
}

/// Parse a dimension, ignoring a trailing unit suffix.
fn parse_length(input: &str) -> Option<f64> {
    let s = input.trim();
    let s = s
        .trim_end_matches("px")
        .trim_end_matches("pt")
        .trim_end_matches("mm")
        .trim_end_matches("cm")
        .trim_end_matches("in")
        .trim_end_matches('%')
        .trim();
    s.parse::<f64>().ok()
}

fn attr_f64(elem: &Element, name: &str, default: f64) -> f64 {
    elem.get_attr(name)
        .and_then(parse_length)
        .unwrap_or(default)
}

/// Scan an inline `style` attribute for one property value.
fn style_value(elem: &Element, re: &Regex) -> Option<String> {
    let style = elem.get_attr("style")?;
    re.captures(style)
        .map(|caps| caps[1].trim().to_string())
}

struct Walker<'a> {
    svg_root: &'a Element,
    flat: &'a mut FlatSvg,
}

const SKIPPED_TAGS: [&str; 5] = ["defs", "clipPath", "mask", "linearGradient", "radialGradient"];

const LEAF_TAGS: [&str; 7] = [
    "path", "rect", "circle", "ellipse", "line", "polygon", "polyline",
];

impl Walker<'_> {
    fn walk(
        &mut self,
        elem: &Element,
        ctm: Matrix,
        inherited_fill: Option<&str>,
        inherited_stroke: Option<&str>,
    ) {
        let tag = elem.name.local.as_str();
        if SKIPPED_TAGS.contains(&tag) {
            return;
        }

        let mut local_ctm = ctm;
        if let Some(t) = elem.get_attr("transform") {
            local_ctm = local_ctm.mul(Matrix::parse(t));
        }

        // Inline style wins over the presentation attribute, which wins
        // over the inherited value.
        let mut fill = style_value(elem, fill_re())
            .or_else(|| elem.get_attr("fill").map(str::to_string))
            .or_else(|| inherited_fill.map(str::to_string));
        let stroke = style_value(elem, stroke_re())
            .or_else(|| elem.get_attr("stroke").map(str::to_string))
            .or_else(|| inherited_stroke.map(str::to_string));

        if let Some(value) = &fill {
            if let Some(caps) = url_ref_re().captures(value) {
                let id = caps[1].to_string();
                let substituted = self.first_stop_color(&id);
                let message =
                    format!("gradient fill url(#{id}) approximated by its first stop color");
                log::warn!("{message}");
                self.flat.warnings.push(message);
                if let Some(stop) = substituted {
                    fill = Some(stop);
                }
            }
        }

        match tag {
            "g" | "svg" => {
                for child in elem.child_elements() {
                    self.walk(child, local_ctm, fill.as_deref(), stroke.as_deref());
                }
            }
            t if LEAF_TAGS.contains(&t) => {
                let Some(d) = shape_to_d(elem) else { return };

                // Absent fill paints black; absent stroke paints nothing.
                let fill = match &fill {
                    Some(v) => color::normalize(v),
                    None => Some("#000000".to_string()),
                };
                let stroke = stroke.as_deref().and_then(color::normalize);
                let stroke_width = attr_f64(elem, "stroke-width", 1.0);

                for c in [&fill, &stroke].into_iter().flatten() {
                    if !self.flat.colors.contains(c) {
                        self.flat.colors.push(c.clone());
                    }
                }

                self.flat.leaves.push(Leaf {
                    d,
                    fill,
                    stroke,
                    stroke_width,
                    transform: local_ctm,
                });
            }
            _ => {
                log::debug!("skipping unsupported element <{tag}>");
            }
        }
    }

    /// Look up a gradient by id and return its first stop's color string.
    fn first_stop_color(&self, id: &str) -> Option<String> {
        let target = self.svg_root.find_by_id(id)?;
        if !target.is("linearGradient") && !target.is("radialGradient") {
            return None;
        }
        let stop = target.child_elements().find(|c| c.is("stop"))?;
        stop.get_attr("stop-color")
            .map(str::to_string)
            .or_else(|| style_value(stop, stop_color_re()))
    }
}

/// Convert a recognized leaf element to an SVG path `d` string.
fn shape_to_d(elem: &Element) -> Option<String> {
    match elem.name.local.as_str() {
        "path" => Some(elem.get_attr("d").unwrap_or_default().to_string()),
        "rect" => rect_to_d(elem),
        "circle" => {
            let cx = attr_f64(elem, "cx", 0.0);
            let cy = attr_f64(elem, "cy", 0.0);
            let r = attr_f64(elem, "r", 0.0);
            if r <= 0.0 {
                return None;
            }
            Some(ellipse_d(cx, cy, r, r))
        }
        "ellipse" => {
            let cx = attr_f64(elem, "cx", 0.0);
            let cy = attr_f64(elem, "cy", 0.0);
            let rx = attr_f64(elem, "rx", 0.0);
            let ry = attr_f64(elem, "ry", 0.0);
            if rx <= 0.0 || ry <= 0.0 {
                return None;
            }
            Some(ellipse_d(cx, cy, rx, ry))
        }
        "line" => {
            let x1 = attr_f64(elem, "x1", 0.0);
            let y1 = attr_f64(elem, "y1", 0.0);
            let x2 = attr_f64(elem, "x2", 0.0);
            let y2 = attr_f64(elem, "y2", 0.0);
            Some(format!("M {x1} {y1} L {x2} {y2}"))
        }
        "polygon" => poly_to_d(elem, true),
        "polyline" => poly_to_d(elem, false),
        _ => None,
    }
}

fn rect_to_d(elem: &Element) -> Option<String> {
    let x = attr_f64(elem, "x", 0.0);
    let y = attr_f64(elem, "y", 0.0);
    let w = parse_length(elem.get_attr("width")?)?;
    let h = parse_length(elem.get_attr("height")?)?;
    if w <= 0.0 || h <= 0.0 {
        return None;
    }

    // Missing rx borrows ry and vice versa, per the SVG auto rule.
    let rx_attr = elem.get_attr("rx").and_then(parse_length);
    let ry_attr = elem.get_attr("ry").and_then(parse_length);
    let (rx, ry) = match (rx_attr, ry_attr) {
        (Some(rx), Some(ry)) => (rx, ry),
        (Some(rx), None) => (rx, rx),
        (None, Some(ry)) => (ry, ry),
        (None, None) => (0.0, 0.0),
    };
    let rx = rx.min(w / 2.0);
    let ry = ry.min(h / 2.0);

    if rx > 0.0 && ry > 0.0 {
        let (x2, y2) = (x + w, y + h);
        Some(format!(
            "M {mx} {y} L {lx} {y} A {rx} {ry} 0 0 1 {x2} {ty} \
             L {x2} {by} A {rx} {ry} 0 0 1 {lx} {y2} \
             L {mx} {y2} A {rx} {ry} 0 0 1 {x} {by} \
             L {x} {ty} A {rx} {ry} 0 0 1 {mx} {y} Z",
            mx = x + rx,
            lx = x2 - rx,
            ty = y + ry,
            by = y2 - ry,
        ))
    } else {
        Some(format!(
            "M {x} {y} L {x2} {y} L {x2} {y2} L {x} {y2} Z",
            x2 = x + w,
            y2 = y + h,
        ))
    }
}

fn ellipse_d(cx: f64, cy: f64, rx: f64, ry: f64) -> String {
    // Two semicircular sweeps forming a closed ellipse.
    format!(
        "M {left} {cy} A {rx} {ry} 0 1 0 {right} {cy} A {rx} {ry} 0 1 0 {left} {cy} Z",
        left = cx - rx,
        right = cx + rx,
    )
}

fn poly_to_d(elem: &Element, close: bool) -> Option<String> {
    let nums = parse_number_list(elem.get_attr("points")?);
    let points: Vec<(f64, f64)> = nums.chunks_exact(2).map(|p| (p[0], p[1])).collect();
    if points.len() < 2 {
        return None;
    }
    let mut d = format!("M {} {}", points[0].0, points[0].1);
    for (x, y) in &points[1..] {
        d.push_str(&format!(" L {x} {y}"));
    }
    if close {
        d.push_str(" Z");
    }
    Some(d)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parse::parse_svg;

    fn flatten_str(svg: &str) -> FlatSvg {
        let root = parse_svg(svg).unwrap();
        flatten(&root).unwrap()
    }

    #[test]
    fn test_viewbox_from_attribute() {
        let flat = flatten_str(r#"<svg viewBox="-5 -5 10 10"/>"#);
        assert_eq!(
            flat.view_box,
            ViewBox {
                x: -5.0,
                y: -5.0,
                w: 10.0,
                h: 10.0
            }
        );
    }

    #[test]
    fn test_viewbox_fallback_to_size() {
        let flat = flatten_str(r#"<svg width="200px" height="50"/>"#);
        assert_eq!(
            flat.view_box,
            ViewBox {
                x: 0.0,
                y: 0.0,
                w: 200.0,
                h: 50.0
            }
        );
        let flat = flatten_str("<svg/>");
        assert_eq!(flat.view_box.w, 100.0);
        assert_eq!(flat.view_box.h, 100.0);
    }

    #[test]
    fn test_rect_leaf() {
        let flat = flatten_str(
            r##"<svg viewBox="0 0 10 10"><rect x="1" y="2" width="3" height="4" fill="#ff0000"/></svg>"##,
        );
        assert_eq!(flat.leaves.len(), 1);
        assert_eq!(flat.leaves[0].d, "M 1 2 L 4 2 L 4 6 L 1 6 Z");
        assert_eq!(flat.leaves[0].fill.as_deref(), Some("#ff0000"));
        assert_eq!(flat.leaves[0].stroke, None);
        assert_eq!(flat.colors, vec!["#ff0000".to_string()]);
    }

    #[test]
    fn test_rect_rounded_uses_arcs() {
        let flat = flatten_str(
            r#"<svg viewBox="0 0 10 10"><rect width="10" height="10" rx="2"/></svg>"#,
        );
        assert!(flat.leaves[0].d.contains('A'));
    }

    #[test]
    fn test_rect_zero_size_dropped() {
        let flat = flatten_str(
            r#"<svg viewBox="0 0 10 10"><rect width="0" height="5"/></svg>"#,
        );
        assert!(flat.leaves.is_empty());
    }

    #[test]
    fn test_default_fill_is_black() {
        let flat = flatten_str(r#"<svg viewBox="0 0 10 10"><rect width="1" height="1"/></svg>"#);
        assert_eq!(flat.leaves[0].fill.as_deref(), Some("#000000"));
        assert_eq!(flat.colors, vec!["#000000".to_string()]);
    }

    #[test]
    fn test_fill_none_with_stroke() {
        let flat = flatten_str(
            r##"<svg viewBox="0 0 10 10"><circle r="4" fill="none" stroke="#000000"/></svg>"##,
        );
        assert_eq!(flat.leaves[0].fill, None);
        assert_eq!(flat.leaves[0].stroke.as_deref(), Some("#000000"));
    }

    #[test]
    fn test_inherited_paint_and_transform() {
        let flat = flatten_str(
            r##"<svg viewBox="0 0 100 100">
                <g fill="#00ff00" transform="translate(50,50)">
                    <rect x="-10" y="-10" width="20" height="20"/>
                </g>
            </svg>"##,
        );
        let leaf = &flat.leaves[0];
        assert_eq!(leaf.fill.as_deref(), Some("#00ff00"));
        assert_eq!(leaf.transform.apply(0.0, 0.0), (50.0, 50.0));
    }

    #[test]
    fn test_style_wins_over_attribute() {
        let flat = flatten_str(
            r##"<svg viewBox="0 0 10 10"><rect width="1" height="1" fill="#ff0000" style="fill: #0000ff"/></svg>"##,
        );
        assert_eq!(flat.leaves[0].fill.as_deref(), Some("#0000ff"));
    }

    #[test]
    fn test_defs_subtree_skipped() {
        let flat = flatten_str(
            r#"<svg viewBox="0 0 10 10"><defs><rect width="5" height="5"/></defs></svg>"#,
        );
        assert!(flat.leaves.is_empty());
        assert!(flat.colors.is_empty());
    }

    #[test]
    fn test_unknown_leaf_dropped() {
        let flat = flatten_str(
            r#"<svg viewBox="0 0 10 10"><text x="0" y="0">hi</text><image href="x.png"/></svg>"#,
        );
        assert!(flat.leaves.is_empty());
    }

    #[test]
    fn test_gradient_first_stop() {
        let flat = flatten_str(
            r##"<svg viewBox="0 0 100 100">
                <defs><linearGradient id="g">
                    <stop stop-color="#ff0000"/>
                    <stop stop-color="#0000ff"/>
                </linearGradient></defs>
                <rect width="100" height="100" fill="url(#g)"/>
            </svg>"##,
        );
        assert_eq!(flat.leaves[0].fill.as_deref(), Some("#ff0000"));
        assert_eq!(flat.warnings.len(), 1);
        assert!(flat.warnings[0].contains("gradient"));
    }

    #[test]
    fn test_gradient_missing_id_still_warns() {
        let flat = flatten_str(
            r##"<svg viewBox="0 0 10 10"><rect width="1" height="1" fill="url(#nope)"/></svg>"##,
        );
        assert_eq!(flat.warnings.len(), 1);
        // Unresolvable reference degrades to no paint.
        assert_eq!(flat.leaves[0].fill, None);
    }

    #[test]
    fn test_polygon_and_polyline() {
        let flat = flatten_str(
            r#"<svg viewBox="0 0 10 10">
                <polygon points="0,0 4,0 4,4"/>
                <polyline points="0 0 1 1 2 0"/>
            </svg>"#,
        );
        assert_eq!(flat.leaves[0].d, "M 0 0 L 4 0 L 4 4 Z");
        assert_eq!(flat.leaves[1].d, "M 0 0 L 1 1 L 2 0");
    }

    #[test]
    fn test_color_dedup_order() {
        let flat = flatten_str(
            r##"<svg viewBox="0 0 10 10">
                <rect width="1" height="1" fill="#ff0000"/>
                <rect width="1" height="1" fill="red" stroke="#00ff00"/>
            </svg>"##,
        );
        assert_eq!(
            flat.colors,
            vec!["#ff0000".to_string(), "#00ff00".to_string()]
        );
    }
}
