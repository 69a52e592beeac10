//! External data: weather forecasts, indoor climate history, and the local sun model.

/// Indoor climate samples from an InfluxDB bucket.
pub mod air_quality;
/// Bounded attempts with exponential backoff around fallible fetches.
pub mod retry;
/// Sun elevation and sunrise/sunset from a location and a date.
pub mod solar;
/// Multi-day forecasts from Open-Meteo.
pub mod weather;
