//! Client-side style image downscaler
//!
//! Shrinks an arbitrarily large raster image to fit a bounding box, re-encodes
//! it at a chosen quality and hands it back as a `data:` URL ready to be
//! stored as a text field or used as an image source.

pub mod app;
pub mod error;
pub mod image;
pub mod mime;
pub mod models;
pub mod source;

pub use error::{Error, Result};
