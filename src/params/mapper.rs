use std::fmt::Display;

use bimap::BiMap;
use derive_more::From;
use rosc::OscType;

use crate::error::ConversionError;

/// The three argument kinds the mixers use on the wire.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum WireType {
    Int,
    Float,
    String,
}

impl WireType {
    pub fn name(&self) -> &'static str {
        match self {
            WireType::Int => "int",
            WireType::Float => "float",
            WireType::String => "string",
        }
    }

    pub fn matches(&self, value: &OscType) -> bool {
        matches!(
            (self, value),
            (WireType::Int, OscType::Int(_))
                | (WireType::Float, OscType::Float(_))
                | (WireType::String, OscType::String(_))
        )
    }

    fn wrong_type(&self, value: &OscType) -> ConversionError {
        ConversionError::WrongType {
            expected: self.name(),
            found: format!("{value:?}"),
        }
    }
}

/// A parameter value in human units.
#[derive(Clone, Debug, PartialEq, From)]
pub enum UnitValue {
    Number(f64),
    Flag(bool),
    Label(String),
}

impl From<&str> for UnitValue {
    fn from(value: &str) -> Self {
        UnitValue::Label(value.to_string())
    }
}

impl From<f32> for UnitValue {
    fn from(value: f32) -> Self {
        UnitValue::Number(f64::from(value))
    }
}

impl From<i32> for UnitValue {
    fn from(value: i32) -> Self {
        UnitValue::Number(f64::from(value))
    }
}

impl Display for UnitValue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            UnitValue::Number(n) => write!(f, "{n}"),
            UnitValue::Flag(b) => write!(f, "{b}"),
            UnitValue::Label(s) => write!(f, "{s}"),
        }
    }
}

impl UnitValue {
    pub fn as_number(&self) -> Result<f64, ConversionError> {
        match self {
            UnitValue::Number(n) if n.is_nan() => Err(ConversionError::NotANumber),
            UnitValue::Number(n) => Ok(*n),
            other => Err(ConversionError::WrongType {
                expected: "number",
                found: format!("{other:?}"),
            }),
        }
    }

    pub fn as_flag(&self) -> Result<bool, ConversionError> {
        match self {
            UnitValue::Flag(b) => Ok(*b),
            other => Err(ConversionError::WrongType {
                expected: "flag",
                found: format!("{other:?}"),
            }),
        }
    }

    pub fn as_label(&self) -> Result<&str, ConversionError> {
        match self {
            UnitValue::Label(s) => Ok(s),
            other => Err(ConversionError::WrongType {
                expected: "label",
                found: format!("{other:?}"),
            }),
        }
    }
}

/// Bidirectional, validated conversion between a raw wire value and its units.
///
/// `validate_*` never clamp; out-of-range input is an error. Conversions assume
/// their input was validated.
pub trait Mapper: Send + Sync {
    fn wire_type(&self) -> WireType;

    /// Unit names accepted by `to_unit`/`to_raw`. Raw-only mappers have none.
    fn units(&self) -> &[&'static str];

    fn validate_raw(&self, value: &OscType) -> Result<OscType, ConversionError>;

    fn validate_unit(&self, value: &UnitValue, unit: &str) -> Result<UnitValue, ConversionError>;

    fn to_unit(&self, raw: &OscType, unit: &str) -> Result<UnitValue, ConversionError>;

    fn to_raw(&self, value: &UnitValue, unit: &str) -> Result<OscType, ConversionError>;

    fn check_unit(&self, unit: &str) -> Result<(), ConversionError> {
        if self.units().contains(&unit) {
            Ok(())
        } else {
            Err(ConversionError::UnknownUnit {
                unit: unit.to_string(),
                supported: self.units().to_vec(),
            })
        }
    }
}

fn check_range(value: f64, min: f64, max: f64) -> Result<f64, ConversionError> {
    if value.is_nan() {
        return Err(ConversionError::NotANumber);
    }
    let (lo, hi) = if min <= max { (min, max) } else { (max, min) };
    if value < lo || value > hi {
        return Err(ConversionError::OutOfRange {
            value,
            min: lo,
            max: hi,
        });
    }
    Ok(value)
}

/// A float in `[0, 1]`, the raw domain of every continuous parameter.
pub(crate) fn unit_interval(value: &OscType) -> Result<f64, ConversionError> {
    match value {
        OscType::Float(f) => check_range(f64::from(*f), 0.0, 1.0),
        other => Err(WireType::Float.wrong_type(other)),
    }
}

fn check_bounds(min: f64, max: f64) -> Result<(), ConversionError> {
    if !min.is_finite() || !max.is_finite() {
        return Err(ConversionError::InvalidRange {
            min,
            max,
            reason: "bounds must be finite",
        });
    }
    if min == max {
        return Err(ConversionError::InvalidRange {
            min,
            max,
            reason: "min and max must differ",
        });
    }
    Ok(())
}

/// `unit = min + raw * (max - min)`
#[derive(Clone, Debug)]
pub struct LinearMapper {
    min: f64,
    max: f64,
    unit: &'static str,
}

impl LinearMapper {
    pub fn new(min: f64, max: f64, unit: &'static str) -> Result<Self, ConversionError> {
        check_bounds(min, max)?;
        Ok(LinearMapper { min, max, unit })
    }

    pub(crate) const fn fixed(min: f64, max: f64, unit: &'static str) -> Self {
        LinearMapper { min, max, unit }
    }

    pub fn unit_from_raw(&self, raw: f64) -> f64 {
        self.min + raw * (self.max - self.min)
    }

    pub fn raw_from_unit(&self, unit: f64) -> f64 {
        (unit - self.min) / (self.max - self.min)
    }
}

impl Mapper for LinearMapper {
    fn wire_type(&self) -> WireType {
        WireType::Float
    }

    fn units(&self) -> &[&'static str] {
        std::slice::from_ref(&self.unit)
    }

    fn validate_raw(&self, value: &OscType) -> Result<OscType, ConversionError> {
        unit_interval(value).map(|_| value.clone())
    }

    fn validate_unit(&self, value: &UnitValue, unit: &str) -> Result<UnitValue, ConversionError> {
        self.check_unit(unit)?;
        check_range(value.as_number()?, self.min, self.max).map(UnitValue::Number)
    }

    fn to_unit(&self, raw: &OscType, unit: &str) -> Result<UnitValue, ConversionError> {
        self.check_unit(unit)?;
        Ok(UnitValue::Number(self.unit_from_raw(unit_interval(raw)?)))
    }

    fn to_raw(&self, value: &UnitValue, unit: &str) -> Result<OscType, ConversionError> {
        self.check_unit(unit)?;
        Ok(OscType::Float(self.raw_from_unit(value.as_number()?) as f32))
    }
}

/// `unit = min * (max / min) ^ raw`
///
/// `min > max` is allowed and inverts the curve, as used by eq Q where a higher
/// raw value means a narrower band.
#[derive(Clone, Debug)]
pub struct LogarithmicMapper {
    min: f64,
    max: f64,
    unit: &'static str,
}

impl LogarithmicMapper {
    pub fn new(min: f64, max: f64, unit: &'static str) -> Result<Self, ConversionError> {
        check_bounds(min, max)?;
        if min <= 0.0 || max <= 0.0 {
            return Err(ConversionError::InvalidRange {
                min,
                max,
                reason: "logarithmic bounds must be positive",
            });
        }
        Ok(LogarithmicMapper { min, max, unit })
    }

    pub(crate) const fn fixed(min: f64, max: f64, unit: &'static str) -> Self {
        LogarithmicMapper { min, max, unit }
    }

    pub fn unit_from_raw(&self, raw: f64) -> f64 {
        self.min * (self.max / self.min).powf(raw)
    }

    pub fn raw_from_unit(&self, unit: f64) -> f64 {
        (unit / self.min).ln() / (self.max / self.min).ln()
    }
}

impl Mapper for LogarithmicMapper {
    fn wire_type(&self) -> WireType {
        WireType::Float
    }

    fn units(&self) -> &[&'static str] {
        std::slice::from_ref(&self.unit)
    }

    fn validate_raw(&self, value: &OscType) -> Result<OscType, ConversionError> {
        unit_interval(value).map(|_| value.clone())
    }

    fn validate_unit(&self, value: &UnitValue, unit: &str) -> Result<UnitValue, ConversionError> {
        self.check_unit(unit)?;
        check_range(value.as_number()?, self.min, self.max).map(UnitValue::Number)
    }

    fn to_unit(&self, raw: &OscType, unit: &str) -> Result<UnitValue, ConversionError> {
        self.check_unit(unit)?;
        Ok(UnitValue::Number(self.unit_from_raw(unit_interval(raw)?)))
    }

    fn to_raw(&self, value: &UnitValue, unit: &str) -> Result<OscType, ConversionError> {
        self.check_unit(unit)?;
        Ok(OscType::Float(self.raw_from_unit(value.as_number()?) as f32))
    }
}

/// Enumerations: the raw value is the index of a label.
#[derive(Clone, Debug)]
pub struct LiteralMapper {
    labels: BiMap<i32, String>,
    unit: &'static str,
}

impl LiteralMapper {
    pub fn new<S: Into<String>>(
        labels: impl IntoIterator<Item = S>,
        unit: &'static str,
    ) -> Result<Self, ConversionError> {
        let mut map = BiMap::new();
        for (idx, label) in labels.into_iter().enumerate() {
            let label = label.into();
            if map.contains_right(&label) {
                return Err(ConversionError::InvalidRange {
                    min: 0.0,
                    max: idx as f64,
                    reason: "labels must be unique",
                });
            }
            map.insert(idx as i32, label);
        }
        if map.is_empty() {
            return Err(ConversionError::InvalidRange {
                min: 0.0,
                max: 0.0,
                reason: "at least one label is required",
            });
        }
        Ok(LiteralMapper { labels: map, unit })
    }

    /// For label lists known to be unique and non-empty.
    pub(crate) fn fixed(labels: &[&str], unit: &'static str) -> Self {
        let labels = labels
            .iter()
            .enumerate()
            .map(|(idx, label)| (idx as i32, label.to_string()))
            .collect();
        LiteralMapper { labels, unit }
    }

    pub fn labels(&self) -> Vec<String> {
        (0..self.labels.len() as i32)
            .filter_map(|idx| self.labels.get_by_left(&idx).cloned())
            .collect()
    }

    pub fn label_at(&self, index: i32) -> Result<&str, ConversionError> {
        self.labels
            .get_by_left(&index)
            .map(String::as_str)
            .ok_or(ConversionError::OutOfRange {
                value: f64::from(index),
                min: 0.0,
                max: (self.labels.len() - 1) as f64,
            })
    }

    pub fn index_of(&self, label: &str) -> Result<i32, ConversionError> {
        self.labels
            .get_by_right(label)
            .copied()
            .ok_or_else(|| ConversionError::UnknownLabel {
                label: label.to_string(),
                allowed: self.labels(),
            })
    }
}

impl Mapper for LiteralMapper {
    fn wire_type(&self) -> WireType {
        WireType::Int
    }

    fn units(&self) -> &[&'static str] {
        std::slice::from_ref(&self.unit)
    }

    fn validate_raw(&self, value: &OscType) -> Result<OscType, ConversionError> {
        match value {
            OscType::Int(idx) => self.label_at(*idx).map(|_| value.clone()),
            other => Err(WireType::Int.wrong_type(other)),
        }
    }

    fn validate_unit(&self, value: &UnitValue, unit: &str) -> Result<UnitValue, ConversionError> {
        self.check_unit(unit)?;
        let label = value.as_label()?;
        self.index_of(label).map(|_| value.clone())
    }

    fn to_unit(&self, raw: &OscType, unit: &str) -> Result<UnitValue, ConversionError> {
        self.check_unit(unit)?;
        match raw {
            OscType::Int(idx) => Ok(UnitValue::Label(self.label_at(*idx)?.to_string())),
            other => Err(WireType::Int.wrong_type(other)),
        }
    }

    fn to_raw(&self, value: &UnitValue, unit: &str) -> Result<OscType, ConversionError> {
        self.check_unit(unit)?;
        Ok(OscType::Int(self.index_of(value.as_label()?)?))
    }
}

/// Switches: raw `0|1`, unit `false|true`. The inverted variant maps raw `1` to
/// `false`, for addresses like `mix/on` where "on" means "not muted".
#[derive(Clone, Debug)]
pub struct OnOffMapper {
    inverted: bool,
    unit: &'static str,
}

impl OnOffMapper {
    pub fn new(unit: &'static str) -> Self {
        OnOffMapper {
            inverted: false,
            unit,
        }
    }

    pub fn inverted(unit: &'static str) -> Self {
        OnOffMapper {
            inverted: true,
            unit,
        }
    }

    fn raw_bit(value: &OscType) -> Result<i32, ConversionError> {
        match value {
            OscType::Int(bit @ (0 | 1)) => Ok(*bit),
            OscType::Int(other) => Err(ConversionError::OutOfRange {
                value: f64::from(*other),
                min: 0.0,
                max: 1.0,
            }),
            other => Err(WireType::Int.wrong_type(other)),
        }
    }
}

impl Mapper for OnOffMapper {
    fn wire_type(&self) -> WireType {
        WireType::Int
    }

    fn units(&self) -> &[&'static str] {
        std::slice::from_ref(&self.unit)
    }

    fn validate_raw(&self, value: &OscType) -> Result<OscType, ConversionError> {
        Self::raw_bit(value).map(OscType::Int)
    }

    fn validate_unit(&self, value: &UnitValue, unit: &str) -> Result<UnitValue, ConversionError> {
        self.check_unit(unit)?;
        value.as_flag().map(UnitValue::Flag)
    }

    fn to_unit(&self, raw: &OscType, unit: &str) -> Result<UnitValue, ConversionError> {
        self.check_unit(unit)?;
        let on = Self::raw_bit(raw)? == 1;
        Ok(UnitValue::Flag(on != self.inverted))
    }

    fn to_raw(&self, value: &UnitValue, unit: &str) -> Result<OscType, ConversionError> {
        self.check_unit(unit)?;
        let on = value.as_flag()? != self.inverted;
        Ok(OscType::Int(i32::from(on)))
    }
}

/// Raw-only parameters: names, bitmasks and plain integers. Optionally bounded.
#[derive(Clone, Debug)]
pub struct RawMapper {
    wire_type: WireType,
    bounds: Option<(f64, f64)>,
}

impl RawMapper {
    pub fn new(wire_type: WireType) -> Self {
        RawMapper {
            wire_type,
            bounds: None,
        }
    }

    pub fn bounded(wire_type: WireType, min: f64, max: f64) -> Self {
        RawMapper {
            wire_type,
            bounds: Some((min, max)),
        }
    }
}

fn no_unit(unit: &str) -> ConversionError {
    ConversionError::UnknownUnit {
        unit: unit.to_string(),
        supported: Vec::new(),
    }
}

impl Mapper for RawMapper {
    fn wire_type(&self) -> WireType {
        self.wire_type
    }

    fn units(&self) -> &[&'static str] {
        &[]
    }

    fn validate_raw(&self, value: &OscType) -> Result<OscType, ConversionError> {
        if !self.wire_type.matches(value) {
            return Err(self.wire_type.wrong_type(value));
        }
        let number = match value {
            OscType::Int(i) => Some(f64::from(*i)),
            OscType::Float(f) => Some(f64::from(*f)),
            _ => None,
        };
        if let (Some(number), Some((min, max))) = (number, self.bounds) {
            check_range(number, min, max)?;
        }
        Ok(value.clone())
    }

    fn validate_unit(&self, _: &UnitValue, unit: &str) -> Result<UnitValue, ConversionError> {
        Err(no_unit(unit))
    }

    fn to_unit(&self, _: &OscType, unit: &str) -> Result<UnitValue, ConversionError> {
        Err(no_unit(unit))
    }

    fn to_raw(&self, _: &UnitValue, unit: &str) -> Result<OscType, ConversionError> {
        Err(no_unit(unit))
    }
}
