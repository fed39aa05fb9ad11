/// Gemini REST API module
///
/// This module handles all traffic to the generative models:
/// - Poster generation from product images and a creative concept
/// - Instruction-based edits of the current poster
/// - Concept suggestions from product images

pub mod client;

pub use client::{EditPosterParams, GeminiClient, GeneratePosterParams};

use thiserror::Error;

/// Errors from the Gemini API layer. The application surfaces these with a
/// generic message and never retries automatically.
#[derive(Debug, Error)]
pub enum GeminiError {
    /// The HTTP request itself failed (network, TLS, timeout).
    #[error("request to the Gemini API failed: {0}")]
    Http(#[from] reqwest::Error),

    /// The API answered with a non-success status.
    #[error("Gemini API returned HTTP {status}: {message}")]
    Api { status: u16, message: String },

    /// The model answered, but with no image part. `reason` carries any
    /// text the model returned instead.
    #[error("the model did not return an image: {reason}")]
    NoImageReturned { reason: String },

    /// The response did not have the structure we expect.
    #[error("unexpected response from the Gemini API: {0}")]
    MalformedResponse(String),
}
