use std::ops::Range;
use std::path::PathBuf;

use thiserror::Error;

use crate::text::FontId;

/// Errors surfaced by the engine core.
///
/// Resource failures carry the offending path or character so the caller can
/// report them; nothing in the engine terminates the process on its own.
#[derive(Debug, Error)]
pub enum EngineError {
    #[error("unable to load font {}: {message}", path.display())]
    FontLoad { path: PathBuf, message: String },

    #[error("failed to rasterize glyph {code:#04x}: {message}")]
    GlyphRaster { code: u8, message: String },

    #[error("could not compile shader: {message}")]
    ShaderCompile { message: String },

    #[error("unknown shader extension `{extension}` for {}", path.display())]
    UnsupportedFormat { path: PathBuf, extension: String },

    #[error("failed to read {}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("texture `{label}` expects {expected} bytes, got {actual}")]
    InvalidTextureData {
        label: String,
        expected: usize,
        actual: usize,
    },

    #[error("draw reads indices {range:?} but the buffer holds {available}")]
    InvalidDrawRange { range: Range<u32>, available: usize },

    #[error("no active document for `{operation}`")]
    NoActiveDocument { operation: &'static str },

    #[error("font {0:?} has not been submitted")]
    UnknownFont(FontId),

    #[error("{0} not found")]
    UnknownResource(&'static str),
}

pub type Result<T> = std::result::Result<T, EngineError>;
