//! Counts to lux, per Vishay's "Designing the VEML7700 Into an Application"
//! application note, section "Calculating the LUX Level".

use num_traits::Float;

use crate::config::{Gain, IntegrationTime};

/// lx/count at gain 2 and 800 ms
pub const MAX_RESOLUTION: f64 = 0.0042;
pub const MAX_INTEGRATION_TIME_MS: f64 = 800.0;
pub const MAX_GAIN: f64 = 2.0;

/// Above this the response is non-linear regardless of gain
pub const CORRECTION_THRESHOLD_LUX: f64 = 1000.0;

const A: f64 = 6.0135e-13;
const B: f64 = -9.3924e-9;
const C: f64 = 8.1488e-5;
const D: f64 = 1.0023;

/// lx per count for the given settings
pub fn resolution(gain: Gain, integration_time: IntegrationTime) -> f64 {
    let it_ms = f64::from(integration_time.millis());

    MAX_RESOLUTION * (MAX_INTEGRATION_TIME_MS / it_ms) * (MAX_GAIN / gain.factor())
}

/// Low gains are always corrected, the others only in bright light.
pub fn needs_correction(gain: Gain, linear_lux: f64) -> bool {
    matches!(gain, Gain::x1_4 | Gain::x1_8) || linear_lux > CORRECTION_THRESHOLD_LUX
}

/// Datasheet correction polynomial `a·l⁴ + b·l³ + c·l² + d·l`
pub fn correct(lux: f64) -> f64 {
    A * Float::powi(lux, 4) + B * Float::powi(lux, 3) + C * Float::powi(lux, 2) + D * lux
}

pub fn compute_lux(gain: Gain, integration_time: IntegrationTime, raw: u16) -> f64 {
    let lux = resolution(gain, integration_time) * f64::from(raw);

    if needs_correction(gain, lux) {
        correct(lux)
    } else {
        lux
    }
}
