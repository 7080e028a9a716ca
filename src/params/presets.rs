//! Mappers for the strip parameters most callers need.
//!
//! Ranges follow the mixer's own scales; pair them with the builders in
//! [`crate::address`].

use std::sync::Arc;

use crate::params::level::LevelMapper;
use crate::params::mapper::{
    LinearMapper, LiteralMapper, LogarithmicMapper, Mapper, OnOffMapper, RawMapper, WireType,
};

pub use crate::params::level::DECIBELS;
pub const HERTZ: &str = "hertz";
pub const MILLISECONDS: &str = "milliseconds";
pub const PERCENT: &str = "percent";

pub const EQ_TYPES: [&str; 6] = ["LCut", "LShv", "PEQ", "VEQ", "HShv", "HCut"];

pub const DYN_RATIOS: [&str; 12] = [
    "1.1", "1.3", "1.5", "2.0", "2.5", "3.0", "4.0", "5.0", "7.0", "10", "20", "100",
];

/// `mix/fader`
pub fn fader() -> Arc<dyn Mapper> {
    Arc::new(LevelMapper)
}

/// `mix/pan`, -100 (left) to +100 (right)
pub fn pan() -> Arc<dyn Mapper> {
    Arc::new(LinearMapper::fixed(-100.0, 100.0, PERCENT))
}

/// `mix/on`: raw 1 means the strip is live, so the unit is "muted".
pub fn mute() -> Arc<dyn Mapper> {
    Arc::new(OnOffMapper::inverted("muted"))
}

/// `eq/{n}/f`
pub fn eq_frequency() -> Arc<dyn Mapper> {
    Arc::new(LogarithmicMapper::fixed(20.0, 20000.0, HERTZ))
}

/// `eq/{n}/g`
pub fn eq_gain() -> Arc<dyn Mapper> {
    Arc::new(LinearMapper::fixed(-15.0, 15.0, DECIBELS))
}

/// `eq/{n}/q`, wide (0.3) at raw 1
pub fn eq_q() -> Arc<dyn Mapper> {
    Arc::new(LogarithmicMapper::fixed(10.0, 0.3, "q"))
}

/// `eq/{n}/type`
pub fn eq_type() -> Arc<dyn Mapper> {
    Arc::new(LiteralMapper::fixed(&EQ_TYPES, "type"))
}

/// `eq/{n}/on` and `dyn/on`
pub fn enabled() -> Arc<dyn Mapper> {
    Arc::new(OnOffMapper::new("enabled"))
}

/// `dyn/attack`
pub fn dyn_attack() -> Arc<dyn Mapper> {
    Arc::new(LinearMapper::fixed(0.0, 120.0, MILLISECONDS))
}

/// `dyn/release`
pub fn dyn_release() -> Arc<dyn Mapper> {
    Arc::new(LogarithmicMapper::fixed(5.0, 4000.0, MILLISECONDS))
}

/// `dyn/thr`
pub fn dyn_threshold() -> Arc<dyn Mapper> {
    Arc::new(LinearMapper::fixed(-60.0, 0.0, DECIBELS))
}

/// `dyn/ratio`
pub fn dyn_ratio() -> Arc<dyn Mapper> {
    Arc::new(LiteralMapper::fixed(&DYN_RATIOS, "ratio"))
}

/// `/headamp/{nn}/gain`
pub fn headamp_gain() -> Arc<dyn Mapper> {
    Arc::new(LinearMapper::fixed(-12.0, 60.0, DECIBELS))
}

/// `/headamp/{nn}/phantom`
pub fn phantom() -> Arc<dyn Mapper> {
    Arc::new(OnOffMapper::new("enabled"))
}

/// `config/name`
pub fn name() -> Arc<dyn Mapper> {
    Arc::new(RawMapper::new(WireType::String))
}
