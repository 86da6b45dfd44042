use crate::error::FormatError;
use crate::field::{sensor_type, FieldKey};
use crate::reading::DisplayValue;
use crate::snapshot::{RawValue, TIMESTAMP_FORMAT};

/// Absorbs binary representation error so that a value reported as `12.345`
/// rounds the way its decimal form reads.
const ROUNDING_TOLERANCE: f64 = 1e-9;

/// Rounds half away from zero to `decimals` places.
///
/// `1234.5 -> 1235`, `12.345 -> 12.35`, `-0.25 -> -0.3` (one decimal).
pub fn round_half_away_from_zero(value: f64, decimals: u32) -> f64 {
    let factor = 10f64.powi(decimals as i32);
    let scaled = value * factor;
    let nudged = scaled + scaled.signum() * ROUNDING_TOLERANCE;
    nudged.round() / factor
}

/// Converts a raw snapshot value into the value shown for `field`.
pub fn format(field: FieldKey, raw: &RawValue) -> Result<DisplayValue, FormatError> {
    let Some(decimals) = sensor_type(field).precision.decimals() else {
        return pass_through(field, raw);
    };

    let value = to_number(raw).ok_or_else(|| FormatError {
        field,
        raw: raw.to_string(),
    })?;
    let rounded = round_half_away_from_zero(value, decimals);

    if decimals == 0 {
        Ok(DisplayValue::Integer(rounded as i64))
    } else {
        Ok(DisplayValue::Float(rounded))
    }
}

fn to_number(raw: &RawValue) -> Option<f64> {
    let value = match raw {
        RawValue::Number(n) => *n,
        RawValue::Text(s) => s.trim().parse::<f64>().ok()?,
        RawValue::Timestamp(_) | RawValue::Diagnostic(_) | RawValue::Other(_) => return None,
    };
    value.is_finite().then_some(value)
}

fn pass_through(field: FieldKey, raw: &RawValue) -> Result<DisplayValue, FormatError> {
    match raw {
        RawValue::Number(n) => Ok(DisplayValue::Float(*n)),
        RawValue::Text(s) => Ok(DisplayValue::Text(s.clone())),
        RawValue::Timestamp(ts) => Ok(DisplayValue::Text(ts.format(TIMESTAMP_FORMAT).to_string())),
        RawValue::Diagnostic(_) | RawValue::Other(_) => Err(FormatError {
            field,
            raw: raw.to_string(),
        }),
    }
}
