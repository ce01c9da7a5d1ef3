use thiserror::Error;

#[derive(Debug, Error)]
pub enum PixvecError {
    #[error("XML parsing error: {0}")]
    XmlParse(#[from] quick_xml::Error),

    #[error("no <svg> root element found")]
    NoSvgRoot,

    #[error("invalid path data: {0}")]
    InvalidPath(String),

    #[error("invalid palette: {0}")]
    InvalidPalette(String),

    #[error("UTF-8 error: {0}")]
    Utf8(#[from] std::str::Utf8Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Failures of the raster fill backend. These never abort a conversion;
/// the assembler downgrades them to a warning and an empty fill image.
#[derive(Debug, Error)]
pub enum RasterError {
    #[error("SVG rendering failed: {0}")]
    Render(String),

    #[error("PNG encoding failed: {0}")]
    Encode(String),

    #[error("no rasterizer backend available")]
    Unavailable,
}
