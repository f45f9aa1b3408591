// ── Input validation ──
//
// Range and format checks applied before any optimistic update or network
// call. Limits match what the pod server accepts.

use std::ops::RangeInclusive;

use crate::error::CoreError;

pub const TEMPERATURE_F: RangeInclusive<u16> = 55..=110;
pub const VIBRATION_INTENSITY: RangeInclusive<u8> = 1..=100;
pub const LED_BRIGHTNESS: RangeInclusive<u8> = 0..=100;
pub const VIBRATION_DURATION_SECS: RangeInclusive<u16> = 0..=180;

pub(crate) fn in_range<T>(field: &str, value: T, range: &RangeInclusive<T>) -> Result<(), CoreError>
where
    T: PartialOrd + std::fmt::Display,
{
    if range.contains(&value) {
        Ok(())
    } else {
        Err(CoreError::invalid(
            field,
            format!(
                "{value} is outside {}..={}",
                range.start(),
                range.end()
            ),
        ))
    }
}

/// `HH:MM`, 24-hour, zero-padded.
pub(crate) fn clock_time(field: &str, value: &str) -> Result<(), CoreError> {
    let invalid = || CoreError::invalid(field, format!("{value:?} is not a HH:MM time"));
    let (hours, minutes) = value.split_once(':').ok_or_else(invalid)?;
    if hours.len() != 2
        || minutes.len() != 2
        || !hours.bytes().chain(minutes.bytes()).all(|b| b.is_ascii_digit())
    {
        return Err(invalid());
    }
    let h: u8 = hours.parse().map_err(|_| invalid())?;
    let m: u8 = minutes.parse().map_err(|_| invalid())?;
    if h > 23 || m > 59 {
        return Err(invalid());
    }
    Ok(())
}
