//! SVG path data parsing.
//!
//! Path grammar: https://www.w3.org/TR/SVG11/paths.html#PathData
//!
//! Parsing goes straight to absolute commands in one pass. The parser
//! carries the pen position, so relative offsets, `H`/`V`, the smooth
//! shorthands and implicit command repetition are all resolved as they
//! are read; downstream geometry only ever sees the six shapes below.

use crate::error::PixvecError;

/// A path command with every coordinate absolute and every shorthand
/// resolved.
///
/// `H`, `V` and the smooth quadratic shorthand arrive as `LineTo`; the
/// smooth cubic shorthand arrives as a `CurveTo` whose first control is
/// the point the curve starts from (reflected controls are not tracked).
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum PathCommand {
    MoveTo {
        x: f64,
        y: f64,
    },
    LineTo {
        x: f64,
        y: f64,
    },
    CurveTo {
        x1: f64,
        y1: f64,
        x2: f64,
        y2: f64,
        x: f64,
        y: f64,
    },
    QuadTo {
        x1: f64,
        y1: f64,
        x: f64,
        y: f64,
    },
    Arc {
        rx: f64,
        ry: f64,
        x_axis_rotation: f64,
        large_arc: bool,
        sweep: bool,
        x: f64,
        y: f64,
    },
    Close,
}

/// Parse SVG path data into absolute commands. Empty input is an empty
/// command list, not an error.
pub fn parse_path(d: &str) -> Result<Vec<PathCommand>, PixvecError> {
    let mut parser = Parser {
        src: d.as_bytes(),
        pos: 0,
        pen: (0.0, 0.0),
        subpath: (0.0, 0.0),
        out: Vec::new(),
    };
    parser.run()?;
    Ok(parser.out)
}

struct Parser<'a> {
    src: &'a [u8],
    pos: usize,
    /// Current pen position; every drawing command moves it.
    pen: (f64, f64),
    /// Start of the open subpath, where `Z` returns the pen.
    subpath: (f64, f64),
    out: Vec<PathCommand>,
}

impl Parser<'_> {
    fn run(&mut self) -> Result<(), PixvecError> {
        let mut repeat = None;
        loop {
            self.skip_separators();
            let Some(&b) = self.src.get(self.pos) else {
                break;
            };
            let op = if b.is_ascii_alphabetic() {
                self.pos += 1;
                b
            } else {
                // Leftover argument groups repeat the command, with a
                // moveto falling through to lineto.
                match repeat {
                    Some(b'M') => b'L',
                    Some(b'm') => b'l',
                    // Z takes no arguments, so nothing can repeat it.
                    Some(b'Z' | b'z') => {
                        return Err(self.fail("unexpected arguments after Z"))
                    }
                    Some(prev) => prev,
                    None => return Err(self.fail("expected a command letter")),
                }
            };
            self.command(op)?;
            repeat = Some(op);
        }
        Ok(())
    }

    fn command(&mut self, op: u8) -> Result<(), PixvecError> {
        let rel = op.is_ascii_lowercase();
        match op.to_ascii_lowercase() {
            b'm' => {
                let (x, y) = self.endpoint(rel)?;
                self.pen = (x, y);
                self.subpath = (x, y);
                self.out.push(PathCommand::MoveTo { x, y });
            }
            b'l' => {
                let (x, y) = self.endpoint(rel)?;
                self.push_line(x, y);
            }
            b'h' => {
                let [x] = self.numbers()?;
                let x = if rel { self.pen.0 + x } else { x };
                self.push_line(x, self.pen.1);
            }
            b'v' => {
                let [y] = self.numbers()?;
                let y = if rel { self.pen.1 + y } else { y };
                self.push_line(self.pen.0, y);
            }
            b'c' => {
                let [x1, y1, x2, y2, x, y] = self.numbers()?;
                let (x1, y1) = self.offset(rel, x1, y1);
                let (x2, y2) = self.offset(rel, x2, y2);
                let (x, y) = self.offset(rel, x, y);
                self.out.push(PathCommand::CurveTo {
                    x1,
                    y1,
                    x2,
                    y2,
                    x,
                    y,
                });
                self.pen = (x, y);
            }
            b's' => {
                // The missing first control is not reflected; the pen
                // stands in for it.
                let [x2, y2, x, y] = self.numbers()?;
                let (x1, y1) = self.pen;
                let (x2, y2) = self.offset(rel, x2, y2);
                let (x, y) = self.offset(rel, x, y);
                self.out.push(PathCommand::CurveTo {
                    x1,
                    y1,
                    x2,
                    y2,
                    x,
                    y,
                });
                self.pen = (x, y);
            }
            b'q' => {
                let [x1, y1, x, y] = self.numbers()?;
                let (x1, y1) = self.offset(rel, x1, y1);
                let (x, y) = self.offset(rel, x, y);
                self.out.push(PathCommand::QuadTo { x1, y1, x, y });
                self.pen = (x, y);
            }
            b't' => {
                // Reflected control dropped entirely; degrades to a line.
                let (x, y) = self.endpoint(rel)?;
                self.push_line(x, y);
            }
            b'a' => {
                let [rx, ry, x_axis_rotation] = self.numbers()?;
                let large_arc = self.flag()?;
                let sweep = self.flag()?;
                let (x, y) = self.endpoint(rel)?;
                self.out.push(PathCommand::Arc {
                    rx,
                    ry,
                    x_axis_rotation,
                    large_arc,
                    sweep,
                    x,
                    y,
                });
                self.pen = (x, y);
            }
            b'z' => {
                self.pen = self.subpath;
                self.out.push(PathCommand::Close);
            }
            _ => {
                return Err(self.fail(&format!("unknown command '{}'", op as char)));
            }
        }
        Ok(())
    }

    fn offset(&self, rel: bool, x: f64, y: f64) -> (f64, f64) {
        if rel {
            (self.pen.0 + x, self.pen.1 + y)
        } else {
            (x, y)
        }
    }

    fn endpoint(&mut self, rel: bool) -> Result<(f64, f64), PixvecError> {
        let [x, y] = self.numbers()?;
        Ok(self.offset(rel, x, y))
    }

    fn push_line(&mut self, x: f64, y: f64) {
        self.pen = (x, y);
        self.out.push(PathCommand::LineTo { x, y });
    }

    fn numbers<const N: usize>(&mut self) -> Result<[f64; N], PixvecError> {
        let mut out = [0.0; N];
        for slot in &mut out {
            *slot = self.number()?;
        }
        Ok(out)
    }

    /// Scan one number token: sign, mantissa, optional exponent.
    fn number(&mut self) -> Result<f64, PixvecError> {
        self.skip_separators();
        let start = self.pos;
        let mut i = self.pos;

        if matches!(self.src.get(i), Some(b'+' | b'-')) {
            i += 1;
        }
        let mut digits = digit_run(self.src, &mut i);
        if matches!(self.src.get(i), Some(b'.')) {
            i += 1;
            digits += digit_run(self.src, &mut i);
        }
        if digits == 0 {
            return Err(self.fail("expected a number"));
        }
        if matches!(self.src.get(i), Some(b'e' | b'E')) {
            // Only consume the exponent if digits actually follow it.
            let mut j = i + 1;
            if matches!(self.src.get(j), Some(b'+' | b'-')) {
                j += 1;
            }
            if digit_run(self.src, &mut j) > 0 {
                i = j;
            }
        }

        self.pos = i;
        let text = std::str::from_utf8(&self.src[start..i])?;
        text.parse()
            .map_err(|_| PixvecError::InvalidPath(format!("bad number '{text}'")))
    }

    /// Arc flags are single digits and may butt up against the next token.
    fn flag(&mut self) -> Result<bool, PixvecError> {
        self.skip_separators();
        match self.src.get(self.pos) {
            Some(b'0') => {
                self.pos += 1;
                Ok(false)
            }
            Some(b'1') => {
                self.pos += 1;
                Ok(true)
            }
            _ => Err(self.fail("arc flags must be 0 or 1")),
        }
    }

    /// Skip whitespace and at most one comma.
    fn skip_separators(&mut self) {
        let mut comma_seen = false;
        while let Some(&b) = self.src.get(self.pos) {
            if b.is_ascii_whitespace() {
                self.pos += 1;
            } else if b == b',' && !comma_seen {
                comma_seen = true;
                self.pos += 1;
            } else {
                break;
            }
        }
    }

    fn fail(&self, message: &str) -> PixvecError {
        PixvecError::InvalidPath(format!("{message} at offset {}", self.pos))
    }
}

fn digit_run(src: &[u8], i: &mut usize) -> usize {
    let from = *i;
    while matches!(src.get(*i), Some(b'0'..=b'9')) {
        *i += 1;
    }
    *i - from
}
