//! Builders for mixer parameter addresses.
//!
//! Channel and headamp indices are always two digits on the wire (`/ch/01`,
//! `/headamp/16`); the mixer ignores addresses that aren't padded. Bus and eq
//! band indices are single digits and never padded.

use crate::constants::{BUS_COUNT, CHANNEL_COUNT, EQ_BAND_COUNT, HEADAMP_COUNT};
use crate::error::{ConversionError, OscError, Result};

fn check_index(template: &str, index: u8, count: u8) -> Result<()> {
    if (1..=count).contains(&index) {
        Ok(())
    } else {
        Err(OscError::validation(
            template,
            ConversionError::OutOfRange {
                value: f64::from(index),
                min: 1.0,
                max: f64::from(count),
            },
        ))
    }
}

fn join(prefix: String, path: &str) -> String {
    let path = path.trim_start_matches('/');
    if path.is_empty() {
        prefix
    } else {
        format!("{prefix}/{path}")
    }
}

/// `/ch/{01-16}/{path}`
pub fn channel(index: u8, path: &str) -> Result<String> {
    check_index("/ch/{01-16}", index, CHANNEL_COUNT)?;
    Ok(join(format!("/ch/{index:02}"), path))
}

/// `/ch/{01-16}/eq/{1-4}/{path}`
pub fn channel_eq_band(index: u8, band: u8, path: &str) -> Result<String> {
    check_index("/ch/{01-16}/eq/{1-4}", band, EQ_BAND_COUNT)?;
    channel(index, &join(format!("eq/{band}"), path))
}

/// `/bus/{1-6}/{path}`
pub fn bus(index: u8, path: &str) -> Result<String> {
    check_index("/bus/{1-6}", index, BUS_COUNT)?;
    Ok(join(format!("/bus/{index}"), path))
}

/// `/headamp/{01-16}/{path}`
pub fn headamp(index: u8, path: &str) -> Result<String> {
    check_index("/headamp/{01-16}", index, HEADAMP_COUNT)?;
    Ok(join(format!("/headamp/{index:02}"), path))
}

/// `/lr/{path}`
pub fn main_lr(path: &str) -> String {
    join("/lr".to_string(), path)
}
