//! Conversion between raw wire values and human units, and the accessors that
//! bind a conversion to a mixer address.

pub mod accessor;
pub mod groups;
pub mod level;
pub mod mapper;
pub mod presets;

pub use accessor::{ParamValue, Parameter};
pub use groups::GroupMask;
pub use level::{LevelMapper, db_to_level, level_to_db};
pub use mapper::{
    LinearMapper, LiteralMapper, LogarithmicMapper, Mapper, OnOffMapper, RawMapper, UnitValue,
    WireType,
};
