//! Two-tone raster primitives shared by the apps.

/// Vector drawing on a CPU canvas and reduction to a [`crate::foundation::core::Bitmap`].
pub mod canvas;
/// Time-series trend charts.
pub mod chart;
/// Even line splitting for description blocks.
pub mod textwrap;
/// Geographic extent to pixel projection.
pub mod viewport;
