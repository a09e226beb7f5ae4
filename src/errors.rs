//! Error Types
//!
//! This module defines the error types used throughout the rasterizer.
//!
//! # Overview
//!
//! The per-pixel core never fails: out-of-bounds accesses degrade to zero values
//! or no-ops, and objects lacking a capability are skipped. Errors therefore only
//! surface at configuration and resource-construction boundaries:
//! - Invalid renderer settings (sizes, multisample factor, tile size, gamma)
//! - Rendering a scene that has no camera
//! - Building a texture from malformed raw pixel data
//!
//! # Usage
//!
//! All fallible public APIs return [`Result<T>`] which is an alias for
//! `std::result::Result<T, TesseraError>`.
//!
//! ```rust,ignore
//! use tessera::errors::Result;
//!
//! fn build() -> Result<()> {
//!     let renderer = tessera::Renderer::new(Default::default())?;
//!     Ok(())
//! }
//! ```

use thiserror::Error;

/// The main error type for the rasterizer.
#[derive(Error, Debug)]
pub enum TesseraError {
    // ========================================================================
    // Configuration Errors
    // ========================================================================
    /// The output image must have a non-zero width and height.
    #[error("Invalid image size: {width}x{height}")]
    InvalidSize {
        /// Requested width in pixels
        width: u32,
        /// Requested height in pixels
        height: u32,
    },

    /// The multisample factor must be at least 1.
    #[error("Invalid multisample factor: {0}")]
    InvalidMultisample(u32),

    /// The tile block size must be at least 1.
    #[error("Invalid tile block size: {0}")]
    InvalidBlockSize(u32),

    /// The gamma exponent must be finite and positive.
    #[error("Invalid gamma exponent: {0}")]
    InvalidGamma(f32),

    /// Settings could not be parsed.
    #[error("Settings parse error: {0}")]
    SettingsParse(#[from] serde_json::Error),

    // ========================================================================
    // Scene Errors
    // ========================================================================
    /// The scene holds no camera and none was supplied.
    #[error("Scene has no camera to render from")]
    MissingCamera,

    // ========================================================================
    // Resource Errors
    // ========================================================================
    /// Raw texture data does not match the declared dimensions.
    #[error("Invalid texture data: {len} bytes for a {width}x{height} RGBA8 image")]
    InvalidTextureData {
        /// Declared width in pixels
        width: u32,
        /// Declared height in pixels
        height: u32,
        /// Number of bytes supplied
        len: usize,
    },
}

/// Alias for `Result<T, TesseraError>`.
pub type Result<T> = std::result::Result<T, TesseraError>;
