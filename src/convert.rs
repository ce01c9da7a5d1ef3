//! Path conversion: SVG command streams to editor path segments.
//!
//! Every curve the editor cannot represent is reduced to quadratics: cubics
//! by adaptive midpoint-error subdivision, arcs by per-quadrant tangent
//! intersection.

use std::collections::BTreeMap;
use std::f64::consts::{FRAC_PI_2, TAU};

use crate::document::{BendPoint, PathSegment, DRAWING_SCALE, STYLE_LINE};
use crate::flatten::{Leaf, ViewBox};
use crate::palette::ColorMatch;
use crate::path::{parse_path, PathCommand};

/// Drawing-unit threshold under which a `Z` back-edge is skipped.
const CLOSE_EPSILON: f64 = 1e-3;

/// Cap on cubic subdivision recursion.
const MAX_SUBDIVISION_DEPTH: u32 = 8;

type Point = (f64, f64);

/// The viewBox to drawing-unit projection: the longer viewBox side spans
/// the full canvas width, aspect preserved, centered at the origin.
#[derive(Debug, Clone, Copy)]
pub struct Remap {
    scale: f64,
    vx: f64,
    vy: f64,
    vw: f64,
    vh: f64,
}

impl Remap {
    pub fn new(view_box: &ViewBox) -> Self {
        Self {
            scale: 2.0 * DRAWING_SCALE / view_box.w.max(view_box.h),
            vx: view_box.x,
            vy: view_box.y,
            vw: view_box.w,
            vh: view_box.h,
        }
    }

    pub fn apply(&self, x: f64, y: f64) -> Point {
        let s = self.scale;
        (
            x * s - self.vx * s - self.vw * s / 2.0,
            y * s - self.vy * s - self.vh * s / 2.0,
        )
    }
}

/// One emission pass: geometry is re-walked once per resolved paint.
struct Pass {
    color: Option<[f64; 4]>,
    fill: bool,
}

/// Convert one leaf into target segments.
///
/// A filled-and-stroked leaf emits its geometry twice, the fill pass
/// first. Unparseable or empty path data yields no segments.
pub fn convert_leaf(
    leaf: &Leaf,
    view_box: &ViewBox,
    mapping: &BTreeMap<String, ColorMatch>,
    tolerance: f64,
) -> Vec<PathSegment> {
    let commands = match parse_path(&leaf.d) {
        Ok(c) => c,
        Err(e) => {
            log::debug!("dropping unparseable path data: {e}");
            return Vec::new();
        }
    };
    if commands.is_empty() {
        return Vec::new();
    }

    let mut passes = Vec::new();
    if let Some(m) = leaf.fill.as_ref().and_then(|hex| mapping.get(hex)) {
        passes.push(Pass {
            color: Some(m.color.to_array()),
            fill: true,
        });
    }
    if let Some(m) = leaf.stroke.as_ref().and_then(|hex| mapping.get(hex)) {
        passes.push(Pass {
            color: Some(m.color.to_array()),
            fill: false,
        });
    }
    if passes.is_empty() {
        passes.push(Pass {
            color: None,
            fill: false,
        });
    }

    let remap = Remap::new(view_box);
    let project = |x: f64, y: f64| {
        let (tx, ty) = leaf.transform.apply(x, y);
        remap.apply(tx, ty)
    };

    let mut out = Vec::new();
    for pass in &passes {
        emit_pass(&commands, &project, pass, tolerance, &mut out);
    }
    out
}

fn emit_pass(
    commands: &[PathCommand],
    project: &impl Fn(f64, f64) -> Point,
    pass: &Pass,
    tolerance: f64,
    out: &mut Vec<PathSegment>,
) {
    let mut cur: Point = (0.0, 0.0);
    let mut start: Point = (0.0, 0.0);

    for cmd in commands {
        match *cmd {
            PathCommand::MoveTo { x, y } => {
                cur = (x, y);
                start = (x, y);
            }
            PathCommand::LineTo { x, y } => {
                push_line(out, project(cur.0, cur.1), project(x, y), pass);
                cur = (x, y);
            }
            PathCommand::QuadTo { x1, y1, x, y } => {
                push_quad(
                    out,
                    project(cur.0, cur.1),
                    project(x1, y1),
                    project(x, y),
                    pass,
                );
                cur = (x, y);
            }
            PathCommand::CurveTo {
                x1,
                y1,
                x2,
                y2,
                x,
                y,
            } => {
                // Subdivide in drawing-unit space; the tolerance lives there.
                let mut quads = Vec::new();
                cubic_to_quads(
                    project(cur.0, cur.1),
                    project(x1, y1),
                    project(x2, y2),
                    project(x, y),
                    tolerance,
                    0,
                    &mut quads,
                );
                for (a, c, b) in quads {
                    push_quad(out, a, c, b, pass);
                }
                cur = (x, y);
            }
            PathCommand::Arc {
                rx,
                ry,
                x_axis_rotation,
                large_arc,
                sweep,
                x,
                y,
            } => {
                match arc_to_quads(cur, (x, y), rx, ry, x_axis_rotation, large_arc, sweep) {
                    Some(quads) => {
                        // Affine maps quadratics to quadratics, so the arc
                        // is built in local space and projected per point.
                        for (a, c, b) in quads {
                            push_quad(
                                out,
                                project(a.0, a.1),
                                project(c.0, c.1),
                                project(b.0, b.1),
                                pass,
                            );
                        }
                    }
                    None => {
                        push_line(out, project(cur.0, cur.1), project(x, y), pass);
                    }
                }
                cur = (x, y);
            }
            PathCommand::Close => {
                let a = project(cur.0, cur.1);
                let b = project(start.0, start.1);
                if (a.0 - b.0).abs() > CLOSE_EPSILON || (a.1 - b.1).abs() > CLOSE_EPSILON {
                    push_line(out, a, b, pass);
                }
                cur = start;
            }
        }
    }
}

fn push_line(out: &mut Vec<PathSegment>, a: Point, b: Point, pass: &Pass) {
    out.push(PathSegment {
        p: [a.0, a.1, b.0, b.1],
        s: STYLE_LINE,
        f: pass.fill,
        bp: None,
        c: pass.color,
        is_transparent: None,
    });
}

fn push_quad(out: &mut Vec<PathSegment>, a: Point, ctrl: Point, b: Point, pass: &Pass) {
    out.push(PathSegment {
        p: [a.0, a.1, b.0, b.1],
        s: STYLE_LINE,
        f: pass.fill,
        bp: Some(BendPoint {
            x: ctrl.0,
            y: ctrl.1,
        }),
        c: pass.color,
        is_transparent: None,
    });
}

fn mid(a: Point, b: Point) -> Point {
    ((a.0 + b.0) / 2.0, (a.1 + b.1) / 2.0)
}

/// Approximate a cubic by quadratics, splitting until the midpoint error
/// is within tolerance or the depth cap is hit.
fn cubic_to_quads(
    p0: Point,
    p1: Point,
    p2: Point,
    p3: Point,
    tolerance: f64,
    depth: u32,
    out: &mut Vec<(Point, Point, Point)>,
) {
    // One-sided quadratic controls; they coincide exactly when the cubic
    // is a degree-elevated quadratic.
    let q1 = ((3.0 * p1.0 - p0.0) / 2.0, (3.0 * p1.1 - p0.1) / 2.0);
    let q2 = ((3.0 * p2.0 - p3.0) / 2.0, (3.0 * p2.1 - p3.1) / 2.0);

    // Emit the averaged control; a quarter of the control separation is
    // the curve-midpoint deviation of the one-sided fit.
    let q = ((q1.0 + q2.0) / 2.0, (q1.1 + q2.1) / 2.0);
    let err = ((q2.0 - q1.0).powi(2) + (q2.1 - q1.1).powi(2)).sqrt() / 4.0;

    if err <= tolerance || depth >= MAX_SUBDIVISION_DEPTH {
        out.push((p0, q, p3));
        return;
    }

    // de Casteljau split at t = 0.5.
    let p01 = mid(p0, p1);
    let p12 = mid(p1, p2);
    let p23 = mid(p2, p3);
    let p012 = mid(p01, p12);
    let p123 = mid(p12, p23);
    let pm = mid(p012, p123);

    cubic_to_quads(p0, p01, p012, pm, tolerance, depth + 1, out);
    cubic_to_quads(pm, p123, p23, p3, tolerance, depth + 1, out);
}

fn vector_angle(ux: f64, uy: f64, vx: f64, vy: f64) -> f64 {
    let dot = ux * vx + uy * vy;
    let len = (ux * ux + uy * uy).sqrt() * (vx * vx + vy * vy).sqrt();
    if len == 0.0 {
        return 0.0;
    }
    let mut angle = (dot / len).clamp(-1.0, 1.0).acos();
    if ux * vy - uy * vx < 0.0 {
        angle = -angle;
    }
    angle
}

/// Convert an endpoint-parameterized elliptical arc to quadratics, one per
/// sub-arc of at most a quarter turn. Returns None for degenerate radii
/// (the caller emits a straight segment).
fn arc_to_quads(
    from: Point,
    to: Point,
    rx: f64,
    ry: f64,
    rotation_deg: f64,
    large_arc: bool,
    sweep: bool,
) -> Option<Vec<(Point, Point, Point)>> {
    let mut rx = rx.abs();
    let mut ry = ry.abs();
    if rx == 0.0 || ry == 0.0 {
        return None;
    }

    let phi = rotation_deg.to_radians();
    let (sin_phi, cos_phi) = phi.sin_cos();

    let (cx, cy, theta1, delta);
    if (from.0 - to.0).abs() < 1e-9 && (from.1 - to.1).abs() < 1e-9 {
        // Coincident endpoints leave the center underdetermined; pin the
        // start angle at 0 and sweep a full turn.
        cx = from.0 - cos_phi * rx;
        cy = from.1 - sin_phi * rx;
        theta1 = 0.0;
        delta = if sweep { TAU } else { -TAU };
    } else {
        // W3C SVG F.6.5: endpoint to center parameterization.
        let dx2 = (from.0 - to.0) / 2.0;
        let dy2 = (from.1 - to.1) / 2.0;
        let x1p = cos_phi * dx2 + sin_phi * dy2;
        let y1p = -sin_phi * dx2 + cos_phi * dy2;

        // F.6.6: scale up out-of-range radii.
        let lambda = x1p * x1p / (rx * rx) + y1p * y1p / (ry * ry);
        if lambda > 1.0 {
            let s = lambda.sqrt();
            rx *= s;
            ry *= s;
        }

        let num = rx * rx * ry * ry - rx * rx * y1p * y1p - ry * ry * x1p * x1p;
        let den = rx * rx * y1p * y1p + ry * ry * x1p * x1p;
        let mut coef = (num.max(0.0) / den).sqrt();
        if large_arc == sweep {
            coef = -coef;
        }

        let cxp = coef * rx * y1p / ry;
        let cyp = -coef * ry * x1p / rx;

        cx = cos_phi * cxp - sin_phi * cyp + (from.0 + to.0) / 2.0;
        cy = sin_phi * cxp + cos_phi * cyp + (from.1 + to.1) / 2.0;

        let ux = (x1p - cxp) / rx;
        let uy = (y1p - cyp) / ry;
        let vx = (-x1p - cxp) / rx;
        let vy = (-y1p - cyp) / ry;
        theta1 = vector_angle(1.0, 0.0, ux, uy);
        let mut d = vector_angle(ux, uy, vx, vy);
        if !sweep && d > 0.0 {
            d -= TAU;
        }
        if sweep && d < 0.0 {
            d += TAU;
        }
        delta = d;
    }

    let point_at = |theta: f64| -> Point {
        let (s, c) = theta.sin_cos();
        (
            cx + cos_phi * rx * c - sin_phi * ry * s,
            cy + sin_phi * rx * c + cos_phi * ry * s,
        )
    };

    let n = ((delta.abs() / FRAC_PI_2).ceil() as usize).max(1);
    let mut quads = Vec::with_capacity(n);
    for i in 0..n {
        let ta = theta1 + delta * i as f64 / n as f64;
        let tb = theta1 + delta * (i + 1) as f64 / n as f64;
        let tm = (ta + tb) / 2.0;
        let h = (tb - ta) / 2.0;

        // Control point at the intersection of the endpoint tangents.
        let (sin_m, cos_m) = tm.sin_cos();
        let ex = rx * cos_m / h.cos();
        let ey = ry * sin_m / h.cos();
        let ctrl = (
            cx + cos_phi * ex - sin_phi * ey,
            cy + sin_phi * ex + cos_phi * ey,
        );
        quads.push((point_at(ta), ctrl, point_at(tb)));
    }
    Some(quads)
}
