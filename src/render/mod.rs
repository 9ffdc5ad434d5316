//! Drawing labelled boxes onto images.
//!
//! Coordinates arrive as percentages of the image size and are turned into
//! pixel boxes by [`geometry`]; [`renderer::Renderer`] does the decode, draw
//! and PNG encode.

pub mod font;
pub mod geometry;
pub mod renderer;
pub mod spec;

use thiserror::Error;

pub use font::LabelFont;
pub use geometry::{percent, PixelBox};
pub use renderer::{RenderOptions, Renderer};
pub use spec::{Annotation, RenderSpec};

#[derive(Error, Debug)]
pub enum RenderError {
    #[error("Could not decode image: {0}")]
    Decode(String),
    #[error("Invalid render spec: {0}")]
    InvalidSpec(String),
    #[error("Invalid annotation at index {index}: {reason}")]
    InvalidAnnotation { index: usize, reason: String },
    #[error("Could not encode PNG: {0}")]
    Encode(String),
}

impl From<serde_json::Error> for RenderError {
    fn from(err: serde_json::Error) -> Self {
        RenderError::InvalidSpec(err.to_string())
    }
}
