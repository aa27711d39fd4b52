// SPDX-License-Identifier: GPL-3.0-only

//! Error types for the photo booth

use std::fmt;

/// Result type alias using BoothError
pub type BoothResult<T> = Result<T, BoothError>;

/// Main application error type
#[derive(Debug, Clone)]
pub enum BoothError {
    /// Camera-related errors
    Camera(CameraError),
    /// Compositing errors
    Compose(ComposeError),
    /// Overlay image errors
    Overlay(OverlayError),
    /// Configuration errors
    Config(String),
    /// Storage/filesystem errors
    Storage(String),
    /// Generic error with message
    Other(String),
}

/// Camera-specific errors
#[derive(Debug, Clone)]
pub enum CameraError {
    /// No camera devices found
    NoCameraFound,
    /// Camera initialization failed
    InitializationFailed(String),
    /// No capturable format offered by the device
    InvalidFormat(String),
    /// No frame available at the capture instant
    NoFrameAvailable,
}

/// Compositing errors
#[derive(Debug, Clone)]
pub enum ComposeError {
    /// PNG encoding failed
    EncodingFailed(String),
}

/// Overlay image errors
#[derive(Debug, Clone)]
pub enum OverlayError {
    /// The file is not a PNG
    NotPng,
    /// The file could not be read
    Io(String),
    /// The PNG could not be decoded
    Decode(String),
}

impl fmt::Display for BoothError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BoothError::Camera(e) => write!(f, "Camera error: {}", e),
            BoothError::Compose(e) => write!(f, "Compositing error: {}", e),
            BoothError::Overlay(e) => write!(f, "Overlay error: {}", e),
            BoothError::Config(msg) => write!(f, "Configuration error: {}", msg),
            BoothError::Storage(msg) => write!(f, "Storage error: {}", msg),
            BoothError::Other(msg) => write!(f, "{}", msg),
        }
    }
}

impl fmt::Display for CameraError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CameraError::NoCameraFound => write!(f, "No camera devices found"),
            CameraError::InitializationFailed(msg) => write!(f, "Initialization failed: {}", msg),
            CameraError::InvalidFormat(msg) => write!(f, "Invalid format: {}", msg),
            CameraError::NoFrameAvailable => write!(f, "No frame available for capture"),
        }
    }
}

impl fmt::Display for ComposeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ComposeError::EncodingFailed(msg) => write!(f, "PNG encoding failed: {}", msg),
        }
    }
}

impl fmt::Display for OverlayError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OverlayError::NotPng => write!(f, "Only PNG files are allowed"),
            OverlayError::Io(msg) => write!(f, "Failed to read file: {}", msg),
            OverlayError::Decode(msg) => write!(f, "Failed to decode PNG: {}", msg),
        }
    }
}

impl std::error::Error for BoothError {}
impl std::error::Error for CameraError {}
impl std::error::Error for ComposeError {}
impl std::error::Error for OverlayError {}

// Conversions from sub-errors to BoothError
impl From<CameraError> for BoothError {
    fn from(err: CameraError) -> Self {
        BoothError::Camera(err)
    }
}

impl From<ComposeError> for BoothError {
    fn from(err: ComposeError) -> Self {
        BoothError::Compose(err)
    }
}

impl From<OverlayError> for BoothError {
    fn from(err: OverlayError) -> Self {
        BoothError::Overlay(err)
    }
}

// Conversion from String for messages bubbled out of threads
impl From<String> for BoothError {
    fn from(msg: String) -> Self {
        BoothError::Other(msg)
    }
}

impl From<&str> for BoothError {
    fn from(msg: &str) -> Self {
        BoothError::Other(msg.to_string())
    }
}

// Conversions for I/O errors
impl From<std::io::Error> for BoothError {
    fn from(err: std::io::Error) -> Self {
        BoothError::Storage(err.to_string())
    }
}

impl From<std::io::Error> for OverlayError {
    fn from(err: std::io::Error) -> Self {
        OverlayError::Io(err.to_string())
    }
}
