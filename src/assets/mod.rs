//! Read-only inputs: track recordings, topographic layers, the UI font and weather icons.

pub mod fonts;
pub mod geo;
pub mod icons;
