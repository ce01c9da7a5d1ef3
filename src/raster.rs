//! Raster fill backends.

use resvg::{tiny_skia, usvg};

use crate::error::RasterError;

/// Renders an SVG string into PNG bytes at the requested pixel size, with
/// the document's native viewBox scaled to fit.
///
/// The assembler treats any failure as recoverable: the fill image is
/// simply omitted from the output document.
pub trait Rasterizer {
    fn rasterize(&self, svg: &str, width: u32, height: u32) -> Result<Vec<u8>, RasterError>;
}

/// The in-process backend: resvg + tiny-skia.
#[derive(Debug, Default)]
pub struct ResvgRasterizer;

impl Rasterizer for ResvgRasterizer {
    fn rasterize(&self, svg: &str, width: u32, height: u32) -> Result<Vec<u8>, RasterError> {
        let options = usvg::Options::default();
        let tree = usvg::Tree::from_str(svg, &options)
            .map_err(|e| RasterError::Render(e.to_string()))?;

        let mut pixmap = tiny_skia::Pixmap::new(width, height)
            .ok_or_else(|| RasterError::Render("zero-sized pixel buffer".into()))?;

        let size = tree.size();
        let transform = tiny_skia::Transform::from_scale(
            width as f32 / size.width(),
            height as f32 / size.height(),
        );
        resvg::render(&tree, transform, &mut pixmap.as_mut());

        pixmap
            .encode_png()
            .map_err(|e| RasterError::Encode(e.to_string()))
    }
}

/// A backend that always fails, for callers that want vector output only.
#[derive(Debug, Default)]
pub struct NullRasterizer;

impl Rasterizer for NullRasterizer {
    fn rasterize(&self, _svg: &str, _width: u32, _height: u32) -> Result<Vec<u8>, RasterError> {
        Err(RasterError::Unavailable)
    }
}
