//! 2D affine transforms and CSS-style `transform` attribute parsing.

/// Row-major 2D affine transform (a, b, c, d, e, f).
///
/// A point maps to `(a*x + c*y + e, b*x + d*y + f)`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Matrix {
    pub a: f64,
    pub b: f64,
    pub c: f64,
    pub d: f64,
    pub e: f64,
    pub f: f64,
}

impl Default for Matrix {
    fn default() -> Self {
        Self::IDENTITY
    }
}

impl Matrix {
    pub const IDENTITY: Self = Self {
        a: 1.0,
        b: 0.0,
        c: 0.0,
        d: 1.0,
        e: 0.0,
        f: 0.0,
    };

    pub fn translate(tx: f64, ty: f64) -> Self {
        Self {
            e: tx,
            f: ty,
            ..Self::IDENTITY
        }
    }

    pub fn scale(sx: f64, sy: f64) -> Self {
        Self {
            a: sx,
            d: sy,
            ..Self::IDENTITY
        }
    }

    pub fn rotate(deg: f64) -> Self {
        let rad = deg.to_radians();
        let (s, c) = rad.sin_cos();
        Self {
            a: c,
            b: s,
            c: -s,
            d: c,
            e: 0.0,
            f: 0.0,
        }
    }

    pub fn skew_x(deg: f64) -> Self {
        Self {
            c: deg.to_radians().tan(),
            ..Self::IDENTITY
        }
    }

    pub fn skew_y(deg: f64) -> Self {
        Self {
            b: deg.to_radians().tan(),
            ..Self::IDENTITY
        }
    }

    /// Concatenate: the resulting transform applies `other` first, then
    /// `self`. Walkers compose `parent.mul(local)` so a node's own
    /// transform applies before everything inherited from above.
    pub fn mul(self, other: Self) -> Self {
        Self {
            a: self.a * other.a + self.c * other.b,
            b: self.b * other.a + self.d * other.b,
            c: self.a * other.c + self.c * other.d,
            d: self.b * other.c + self.d * other.d,
            e: self.a * other.e + self.c * other.f + self.e,
            f: self.b * other.e + self.d * other.f + self.f,
        }
    }

    pub fn apply(self, x: f64, y: f64) -> (f64, f64) {
        (
            self.a * x + self.c * y + self.e,
            self.b * x + self.d * y + self.f,
        )
    }

    /// Parse a CSS-style transform attribute into a single matrix.
    ///
    /// Accepts `matrix`, `translate`, `scale`, `rotate`, `skewX`, `skewY`
    /// in any order, with comma or whitespace separated arguments. Unknown
    /// primitives and malformed argument lists contribute identity.
    pub fn parse(input: &str) -> Self {
        let mut out = Self::IDENTITY;
        let mut s = input.trim();

        while !s.is_empty() {
            let Some(open) = s.find('(') else { break };
            let name = s[..open].trim();
            let Some(close) = s[open + 1..].find(')') else {
                break;
            };
            let args = parse_number_list(&s[open + 1..open + 1 + close]);

            let m = match name {
                "translate" => {
                    let tx = args.first().copied().unwrap_or(0.0);
                    let ty = args.get(1).copied().unwrap_or(0.0);
                    Self::translate(tx, ty)
                }
                "scale" => {
                    let sx = args.first().copied().unwrap_or(1.0);
                    let sy = args.get(1).copied().unwrap_or(sx);
                    Self::scale(sx, sy)
                }
                "rotate" => {
                    let a = args.first().copied().unwrap_or(0.0);
                    if args.len() >= 3 {
                        let (cx, cy) = (args[1], args[2]);
                        Self::translate(cx, cy)
                            .mul(Self::rotate(a))
                            .mul(Self::translate(-cx, -cy))
                    } else {
                        Self::rotate(a)
                    }
                }
                "skewX" => {
                    let a = args.first().copied().unwrap_or(0.0);
                    Self::skew_x(a)
                }
                "skewY" => {
                    let a = args.first().copied().unwrap_or(0.0);
                    Self::skew_y(a)
                }
                "matrix" => {
                    if args.len() >= 6 {
                        Self {
                            a: args[0],
                            b: args[1],
                            c: args[2],
                            d: args[3],
                            e: args[4],
                            f: args[5],
                        }
                    } else {
                        Self::IDENTITY
                    }
                }
                _ => Self::IDENTITY,
            };

            out = out.mul(m);
            s = s[open + 1 + close + 1..].trim_start();
        }

        out
    }
}

pub(crate) fn parse_number_list(input: &str) -> Vec<f64> {
    input
        .split(|c: char| c.is_whitespace() || c == ',')
        .filter(|s| !s.is_empty())
        .filter_map(|s| s.parse::<f64>().ok())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn close(a: (f64, f64), b: (f64, f64)) -> bool {
        (a.0 - b.0).abs() < 1e-9 && (a.1 - b.1).abs() < 1e-9
    }

    #[test]
    fn test_identity_is_noop() {
        assert!(close(Matrix::IDENTITY.apply(3.5, -7.25), (3.5, -7.25)));
    }

    #[test]
    fn test_translate_then_scale() {
        // "translate(10,20) scale(2)": scaling applies to the point first.
        let m = Matrix::parse("translate(10,20) scale(2)");
        assert!(close(m.apply(1.0, 1.0), (12.0, 22.0)));
    }

    #[test]
    fn test_rotate_about_center() {
        let m = Matrix::parse("rotate(90, 5, 5)");
        let eq = Matrix::translate(5.0, 5.0)
            .mul(Matrix::rotate(90.0))
            .mul(Matrix::translate(-5.0, -5.0));
        assert!(close(m.apply(7.0, 5.0), eq.apply(7.0, 5.0)));
        // (7,5) rotated 90 deg about (5,5) lands at (5,7).
        assert!(close(m.apply(7.0, 5.0), (5.0, 7.0)));
    }

    #[test]
    fn test_mul_associative() {
        let a = Matrix::parse("rotate(33)");
        let b = Matrix::translate(4.0, -2.0);
        let c = Matrix::scale(1.5, 0.5);
        let p = (2.0, 3.0);
        assert!(close(
            a.mul(b).mul(c).apply(p.0, p.1),
            a.mul(b.mul(c)).apply(p.0, p.1)
        ));
    }

    #[test]
    fn test_parse_comma_and_whitespace() {
        let a = Matrix::parse("matrix(1,0,0,1,5,6)");
        let b = Matrix::parse("matrix(1 0 0 1 5 6)");
        assert_eq!(a, b);
        assert!(close(a.apply(0.0, 0.0), (5.0, 6.0)));
    }

    #[test]
    fn test_parse_single_arg_scale() {
        let m = Matrix::parse("scale(3)");
        assert!(close(m.apply(1.0, 1.0), (3.0, 3.0)));
    }

    #[test]
    fn test_parse_skew() {
        let m = Matrix::parse("skewX(45)");
        assert!(close(m.apply(0.0, 1.0), (1.0, 1.0)));
        let m = Matrix::parse("skewY(45)");
        assert!(close(m.apply(1.0, 0.0), (1.0, 1.0)));
    }

    #[test]
    fn test_parse_unknown_primitive() {
        let m = Matrix::parse("perspective(10) translate(1,2)");
        assert!(close(m.apply(0.0, 0.0), (1.0, 2.0)));
    }
}
