//! Unit conversions
//!
//! Lengths are carried in meters inside the crate, pixels and millimeters only
//! appear at the API boundary.

use std::f64::consts::PI;

/// millimeters to meters
pub fn mm2m(mm: f64) -> f64 {
    mm * 1e-3
}
/// micrometers to meters
pub fn um2m(um: f64) -> f64 {
    um * 1e-6
}
/// nanometers to meters
pub fn nm2m(nm: f64) -> f64 {
    nm * 1e-9
}
/// meters to millimeters
pub fn m2mm(m: f64) -> f64 {
    m * 1e3
}
/// pixels to meters for a given pixel size [m]
pub fn px2m(px: f64, pixel_size: f64) -> f64 {
    px * pixel_size
}
/// meters to pixels for a given pixel size [m]
pub fn m2px(m: f64, pixel_size: f64) -> f64 {
    m / pixel_size
}
/// Optical path in millimeters of a phase [rad] at the wavelength [m]
pub fn rad2mm(rad: f64, wavelength: f64) -> f64 {
    let wave_number = 2. * PI / m2mm(wavelength);
    rad / wave_number
}
