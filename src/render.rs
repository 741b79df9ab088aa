//! Contract for the external raster re-encode collaborator.
//!
//! The search engine never touches pixels itself; it asks a
//! [`RenderPrimitive`] for the payload bytes a given (format, quality,
//! size) combination produces and measures only the encoded result.

use serde::Serialize;
use thiserror::Error;

/// Candidate output formats, in the order callers typically prefer them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    Jpeg,
    Webp,
    Png,
}

/// Failure of the render collaborator.
#[derive(Error, Debug)]
pub enum RenderError {
    #[error("unsupported format {0:?}")]
    UnsupportedFormat(OutputFormat),

    #[error("invalid render parameters: {0}")]
    InvalidParameters(String),
}

/// Raster re-encode/resize primitive. One render call at a time; the
/// engine waits for each result before issuing the next.
pub trait RenderPrimitive {
    /// Source image dimensions in pixels.
    fn dimensions(&self) -> (u32, u32);

    /// Re-encode the source at the given format, quality (0-1) and output
    /// size, returning the encoded image bytes.
    fn render(
        &mut self,
        format: OutputFormat,
        quality: f64,
        width: u32,
        height: u32,
    ) -> Result<Vec<u8>, RenderError>;
}
