//! Error types for the image effects app.
//!
//! Each failure the user can run into has its own type so the controller can
//! decide what reaches the error banner and what only reaches the log.

use std::io;
use std::path::PathBuf;

use thiserror::Error;

/// Startup configuration problems. Fatal: the window never opens.
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("API_KEY environment variable is not set.")]
    MissingApiKey,
}

/// Rejected file selections.
#[derive(Error, Debug)]
pub enum UploadError {
    #[error("Please upload a valid image file.")]
    NotAnImage(PathBuf),
}

/// Failures turning a file into (or back from) a base64 payload.
#[derive(Error, Debug)]
pub enum DecodeError {
    #[error("Failed to read image file: {0}")]
    Read(#[from] io::Error),
    #[error("Failed to extract base64 string from file.")]
    EmptyPayload,
    #[error("Invalid base64 payload: {0}")]
    Base64(#[from] base64::DecodeError),
}

/// Transport or parse failure talking to the AI service.
///
/// Deliberately carries no detail: the cause is logged where it happens.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
#[error("Failed to process image with AI. Please check the logs for details.")]
pub struct AiCallError;

/// Everything that can end an effect request without an image.
#[derive(Error, Debug)]
pub enum EditError {
    #[error(transparent)]
    Decode(#[from] DecodeError),
    #[error("AI Response: {0}")]
    Refusal(String),
    #[error("The AI did not return an image. Please try again.")]
    NoImage,
    #[error(transparent)]
    Call(#[from] AiCallError),
}
