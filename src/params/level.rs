//! The fader law: raw level in `[0, 1]` against decibels.
//!
//! The curve is piecewise linear over four bands, with finer raw resolution the
//! closer it gets to unity gain:
//!
//! | raw               | dB            |
//! |-------------------|---------------|
//! | `[0, 0.00625]`    | -inf          |
//! | `(0.00625, 0.0625]` | `[-87, -60]` |
//! | `(0.0625, 0.25]`  | `[-60, -30]`  |
//! | `(0.25, 0.5]`     | `[-30, -10]`  |
//! | `(0.5, 1.0]`      | `[-10, +10]`  |

use rosc::OscType;

use crate::error::ConversionError;
use crate::params::mapper::{Mapper, UnitValue, WireType, unit_interval};

pub const MIN_DB: f64 = -87.0;
pub const MAX_DB: f64 = 10.0;
const SILENCE_LEVEL: f64 = 0.00625;

/// Converts a raw fader level to decibels. Levels above 1.0 clamp to +10 dB.
pub fn level_to_db(level: f64) -> f64 {
    if level <= SILENCE_LEVEL {
        f64::NEG_INFINITY
    } else if level <= 0.0625 {
        level * 480.0 - 90.0
    } else if level <= 0.25 {
        level * 160.0 - 70.0
    } else if level <= 0.5 {
        level * 80.0 - 50.0
    } else if level <= 1.0 {
        level * 40.0 - 30.0
    } else {
        MAX_DB
    }
}

/// Converts decibels to a raw fader level, clamping below -87 dB to 0 and above
/// +10 dB to 1.
pub fn db_to_level(db: f64) -> f64 {
    if db < MIN_DB {
        0.0
    } else if db <= -60.0 {
        (db + 90.0) / 480.0
    } else if db <= -30.0 {
        (db + 70.0) / 160.0
    } else if db <= -10.0 {
        (db + 50.0) / 80.0
    } else if db <= MAX_DB {
        (db + 30.0) / 40.0
    } else {
        1.0
    }
}

/// Fader levels in decibels.
#[derive(Clone, Copy, Debug, Default)]
pub struct LevelMapper;

pub const DECIBELS: &str = "decibels";

impl Mapper for LevelMapper {
    fn wire_type(&self) -> WireType {
        WireType::Float
    }

    fn units(&self) -> &[&'static str] {
        &[DECIBELS]
    }

    fn validate_raw(&self, value: &OscType) -> Result<OscType, ConversionError> {
        unit_interval(value).map(|_| value.clone())
    }

    fn validate_unit(&self, value: &UnitValue, unit: &str) -> Result<UnitValue, ConversionError> {
        self.check_unit(unit)?;
        let db = value.as_number()?;
        if db > MAX_DB {
            return Err(ConversionError::OutOfRange {
                value: db,
                min: f64::NEG_INFINITY,
                max: MAX_DB,
            });
        }
        Ok(UnitValue::Number(db))
    }

    fn to_unit(&self, raw: &OscType, unit: &str) -> Result<UnitValue, ConversionError> {
        self.check_unit(unit)?;
        match raw {
            OscType::Float(level) => Ok(UnitValue::Number(level_to_db(f64::from(*level)))),
            other => Err(ConversionError::WrongType {
                expected: "float",
                found: format!("{other:?}"),
            }),
        }
    }

    fn to_raw(&self, value: &UnitValue, unit: &str) -> Result<OscType, ConversionError> {
        self.check_unit(unit)?;
        Ok(OscType::Float(db_to_level(value.as_number()?) as f32))
    }
}
