use std::net::SocketAddr;
use std::sync::Arc;

use rosc::{OscMessage, OscType};
use tracing::debug;

use crate::error::{ConversionError, OscError, Result, SchemaError};
use crate::osc::client::Remote;
use crate::osc::registry::{Handler, ListenerId};
use crate::params::mapper::{Mapper, UnitValue};
use crate::traits::{Bind, Query, Set};

/// A value either as it travels on the wire or converted to a named unit.
#[derive(Clone, Debug, PartialEq)]
pub enum ParamValue {
    Raw(OscType),
    Unit { unit: String, value: UnitValue },
}

impl ParamValue {
    pub fn unit(unit: impl Into<String>, value: impl Into<UnitValue>) -> Self {
        ParamValue::Unit {
            unit: unit.into(),
            value: value.into(),
        }
    }
}

/// Pulls the single argument out of a reply and checks its shape.
pub(crate) fn single_arg(message: &OscMessage) -> Result<&OscType> {
    match message.args.as_slice() {
        [arg] => Ok(arg),
        args => Err(SchemaError::new(
            &message.addr,
            format!("expected exactly one argument, got {}", args.len()),
        )
        .into()),
    }
}

/// One mixer parameter: a mapper bound to an address.
pub struct Parameter<R: Remote> {
    remote: Arc<R>,
    address: String,
    mapper: Arc<dyn Mapper>,
}

impl<R: Remote> Clone for Parameter<R> {
    fn clone(&self) -> Self {
        Parameter {
            remote: self.remote.clone(),
            address: self.address.clone(),
            mapper: self.mapper.clone(),
        }
    }
}

impl<R: Remote> Parameter<R> {
    pub fn new(remote: Arc<R>, address: impl Into<String>, mapper: Arc<dyn Mapper>) -> Self {
        Parameter {
            remote,
            address: address.into(),
            mapper,
        }
    }

    pub fn address(&self) -> &str {
        &self.address
    }

    pub fn mapper(&self) -> &dyn Mapper {
        self.mapper.as_ref()
    }

    fn invalid(&self, err: ConversionError) -> OscError {
        OscError::validation(&self.address, err)
    }

    fn validate_reply(&self, message: &OscMessage) -> Result<OscType> {
        let arg = single_arg(message)?;
        self.mapper.validate_raw(arg).map_err(|e| self.invalid(e))
    }

    /// Queries the mixer and returns the validated wire value.
    pub fn fetch_raw(&self) -> Result<OscType> {
        let reply = self.remote.query(&self.address)?;
        self.validate_reply(&reply)
    }

    /// Queries the mixer and converts the reply to `unit`.
    pub fn fetch_unit(&self, unit: &str) -> Result<UnitValue> {
        self.mapper.check_unit(unit).map_err(|e| self.invalid(e))?;
        let raw = self.fetch_raw()?;
        self.mapper.to_unit(&raw, unit).map_err(|e| self.invalid(e))
    }

    /// `fetch_raw` when `unit` is `None`, `fetch_unit` otherwise.
    pub fn fetch(&self, unit: Option<&str>) -> Result<ParamValue> {
        match unit {
            None => self.fetch_raw().map(ParamValue::Raw),
            Some(unit) => Ok(ParamValue::Unit {
                unit: unit.to_string(),
                value: self.fetch_unit(unit)?,
            }),
        }
    }

    pub fn update_raw(&self, raw: OscType) -> Result<()> {
        let raw = self.mapper.validate_raw(&raw).map_err(|e| self.invalid(e))?;
        debug!("update {} = {:?}", self.address, raw);
        self.remote.set(&self.address, vec![raw])
    }

    pub fn update_unit(&self, unit: &str, value: impl Into<UnitValue>) -> Result<()> {
        let value = self
            .mapper
            .validate_unit(&value.into(), unit)
            .map_err(|e| self.invalid(e))?;
        let raw = self.mapper.to_raw(&value, unit).map_err(|e| self.invalid(e))?;
        debug!("update {} = {value} {unit} ({:?})", self.address, raw);
        self.remote.set(&self.address, vec![raw])
    }

    pub fn update(&self, value: ParamValue) -> Result<()> {
        match value {
            ParamValue::Raw(raw) => self.update_raw(raw),
            ParamValue::Unit { unit, value } => self.update_unit(&unit, value),
        }
    }

    pub fn unbind(&self, id: ListenerId) {
        self.remote.unsubscribe(&self.address, Some(id));
    }
}

impl<R: Remote> Query for Parameter<R> {
    type Output = OscType;
    type Error = OscError;

    fn query(&self) -> Result<OscType> {
        self.fetch_raw()
    }
}

impl<R: Remote> Set<OscType> for Parameter<R> {
    type Error = OscError;

    fn set(&self, args: OscType) -> Result<()> {
        self.update_raw(args)
    }
}

/// Values pushed by the mixer (after `/xremote`) are validated before they reach
/// the callback. A push that fails validation is logged and dropped.
impl<R: Remote> Bind<OscType> for Parameter<R> {
    type Error = OscError;

    fn bind<F>(&self, callback: F) -> Result<ListenerId>
    where
        F: Fn(OscType) + Send + Sync + 'static,
    {
        let mapper = self.mapper.clone();
        let address = self.address.clone();
        let handler: Handler = Arc::new(move |message: &OscMessage, _from: SocketAddr| {
            let [raw] = message.args.as_slice() else {
                return Err(OscError::validation(
                    &address,
                    ConversionError::WrongType {
                        expected: "a single argument",
                        found: format!("{} arguments", message.args.len()),
                    },
                ));
            };
            let raw = mapper
                .validate_raw(raw)
                .map_err(|e| OscError::validation(&address, e))?;
            callback(raw);
            Ok(())
        });
        Ok(self.remote.subscribe(&self.address, handler))
    }
}
