use std::io;
use std::net::SocketAddr;
use std::time::Duration;

use thiserror::Error;

/// Everything that can go wrong talking to a mixer.
#[derive(Error, Debug)]
pub enum OscError {
    #[error("failed to bind OSC socket: {0}")]
    Bind(#[source] io::Error),

    #[error("failed to send OSC message to {target}: {source}")]
    Send {
        target: SocketAddr,
        #[source]
        source: io::Error,
    },

    #[error("socket option error: {0}")]
    Socket(#[source] io::Error),

    #[error("failed to encode OSC message for {address}: {reason}")]
    Encode { address: String, reason: String },

    #[error("failed to decode OSC packet from {from}: {reason}")]
    Decode { from: SocketAddr, reason: String },

    #[error("received an OSC bundle from {from}, bundles are not supported")]
    UnsupportedBundle { from: SocketAddr },

    #[error(transparent)]
    Schema(#[from] SchemaError),

    #[error("invalid value for {address}: {source}")]
    Validation {
        address: String,
        #[source]
        source: ConversionError,
    },

    #[error("no reply to query {address} within {timeout:?}")]
    Timeout { address: String, timeout: Duration },

    #[error("OSC socket is closed")]
    Closed,
}

impl OscError {
    /// Whether this error should stop the receive loop: a bundle, or a reply whose
    /// shape shows the peer speaks another protocol. Anything else drops one datagram.
    pub fn is_fatal(&self) -> bool {
        matches!(self, OscError::UnsupportedBundle { .. } | OscError::Schema(_))
    }

    pub(crate) fn validation(address: &str, source: ConversionError) -> Self {
        OscError::Validation {
            address: address.to_string(),
            source,
        }
    }
}

/// A message whose argument list doesn't have the expected shape.
#[derive(Error, Debug, Clone, PartialEq)]
#[error("unexpected arguments at {address}: {reason}")]
pub struct SchemaError {
    pub address: String,
    pub reason: String,
}

impl SchemaError {
    pub fn new(address: impl Into<String>, reason: impl Into<String>) -> Self {
        SchemaError {
            address: address.into(),
            reason: reason.into(),
        }
    }
}

/// Raised by mappers when a raw or unit value can't be accepted.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ConversionError {
    #[error("{value} is outside of [{min}, {max}]")]
    OutOfRange { value: f64, min: f64, max: f64 },

    #[error("expected {expected}, got {found}")]
    WrongType {
        expected: &'static str,
        found: String,
    },

    #[error("{label:?} is not one of {allowed:?}")]
    UnknownLabel { label: String, allowed: Vec<String> },

    #[error("unit {unit:?} is not supported, expected one of {supported:?}")]
    UnknownUnit {
        unit: String,
        supported: Vec<&'static str>,
    },

    #[error("invalid range [{min}, {max}]: {reason}")]
    InvalidRange {
        min: f64,
        max: f64,
        reason: &'static str,
    },

    #[error("value is not a number")]
    NotANumber,
}

pub type Result<T> = std::result::Result<T, OscError>;
