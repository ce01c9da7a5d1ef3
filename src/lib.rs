//! pixvec - SVG to pixel-art vector drawing converter
//!
//! pixvec flattens an SVG document, snaps its colors to a fixed drawing
//! palette, reduces all curves to lines and single-bend quadratics, and
//! emits the JSON drawing document the downstream pixel-art editor
//! imports.

mod assemble;
mod ast;
mod color;
mod convert;
mod document;
mod error;
mod flatten;
mod matrix;
mod palette;
mod parse;
mod path;
mod raster;

pub use assemble::{assemble, Conversion};
pub use color::{normalize as normalize_color, Lab, PaletteColor};
pub use convert::{convert_leaf, Remap};
pub use document::*;
pub use error::{PixvecError, RasterError};
pub use flatten::{flatten, FlatSvg, Leaf, ViewBox};
pub use matrix::Matrix;
pub use palette::{match_colors, ColorMatch, Palette, DELTA_E_WARN, MAX_PALETTE};
pub use parse::parse_svg;
pub use raster::{NullRasterizer, Rasterizer, ResvgRasterizer};

/// Convert an SVG string with default settings.
pub fn convert(svg: &str) -> Result<Conversion, PixvecError> {
    convert_with_options(svg, &Options::default())
}

/// Convert an SVG string with custom options, rendering the fill layer
/// with the built-in resvg backend.
pub fn convert_with_options(svg: &str, options: &Options) -> Result<Conversion, PixvecError> {
    convert_with_rasterizer(svg, options, &ResvgRasterizer)
}

/// Convert an SVG string with a caller-supplied raster backend.
pub fn convert_with_rasterizer(
    svg: &str,
    options: &Options,
    rasterizer: &dyn Rasterizer,
) -> Result<Conversion, PixvecError> {
    let root = parse_svg(svg)?;
    let flat = flatten(&root)?;
    Ok(assemble(svg, &flat, options, rasterizer))
}

/// Conversion options.
#[derive(Debug, Clone)]
pub struct Options {
    /// Target palette (default: AAP-64).
    pub palette: Palette,
    /// Curve approximation tolerance in drawing units (default: 0.05).
    pub tolerance: f64,
}

impl Default for Options {
    fn default() -> Self {
        Self {
            palette: Palette::aap64(),
            tolerance: 0.05,
        }
    }
}
