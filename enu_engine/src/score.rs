use enu_schema::ModCombo;

use crate::ScoreError;

const HIT_SCORE: f64 = 5.0;
const MISS_PENALTY: f64 = 5.0;
const EARLY_ERROR_WEIGHT: f64 = 3.0;
const TIMING_HALF_LIFE_MS: f64 = 1000.0;

/// Score multiplier for a playback speed and mod selection.
pub fn score_multiplier(speed: f64, mods: &ModCombo) -> Result<f64, ScoreError> {
    if speed.is_nan() || speed < 0.0 {
        return Err(ScoreError::NegativeSpeed(speed));
    }
    let mut mult = if speed < 1.0 {
        speed.powf(1.5)
    } else {
        speed.powf(0.4)
    };
    if mods.hidden {
        mult *= 1.05;
    }
    Ok(mult)
}

/// Bonus factor in `(1, 5]` for a keystroke `error_ms` after its syllable.
/// Early keystrokes decay three times as fast.
pub fn timing_multiplier(error_ms: f64) -> f64 {
    let effective = if error_ms < 0.0 {
        -EARLY_ERROR_WEIGHT * error_ms
    } else {
        error_ms
    };
    1.0 + 4.0 * 0.5_f64.powf(effective / TIMING_HALF_LIFE_MS)
}

/// Score for one keystroke before the mod multiplier.
pub fn keystroke_score(hits: u32, misses: u32, error_ms: f64) -> f64 {
    -MISS_PENALTY * misses as f64 + HIT_SCORE * hits as f64 * timing_multiplier(error_ms)
}

/// Percentage of hits, 100 when nothing has been attempted.
pub fn accuracy(hits: u32, misses: u32) -> f64 {
    if hits + misses == 0 {
        return 100.0;
    }
    100.0 * hits as f64 / (hits + misses) as f64
}
