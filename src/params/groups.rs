use std::sync::Arc;

use rosc::OscType;
use tracing::debug;

use crate::constants::GROUP_COUNT;
use crate::error::{ConversionError, OscError, Result};
use crate::osc::client::Remote;
use crate::params::accessor::single_arg;

/// DCA or mute group membership of one strip, stored as a bitmask where bit
/// `n - 1` is group `n`.
pub struct GroupMask<R: Remote> {
    remote: Arc<R>,
    address: String,
    groups: u8,
}

impl<R: Remote> GroupMask<R> {
    pub fn new(remote: Arc<R>, address: impl Into<String>) -> Self {
        Self::with_groups(remote, address, GROUP_COUNT)
    }

    pub fn with_groups(remote: Arc<R>, address: impl Into<String>, groups: u8) -> Self {
        GroupMask {
            remote,
            address: address.into(),
            groups: groups.clamp(1, 30),
        }
    }

    pub fn address(&self) -> &str {
        &self.address
    }

    fn bit(&self, group: u8) -> Result<i32> {
        if !(1..=self.groups).contains(&group) {
            return Err(OscError::validation(
                &self.address,
                ConversionError::OutOfRange {
                    value: f64::from(group),
                    min: 1.0,
                    max: f64::from(self.groups),
                },
            ));
        }
        Ok(1 << (group - 1))
    }

    pub fn fetch_mask(&self) -> Result<i32> {
        let reply = self.remote.query(&self.address)?;
        match single_arg(&reply)? {
            OscType::Int(mask) if (0..(1i32 << self.groups)).contains(mask) => Ok(*mask),
            OscType::Int(mask) => Err(OscError::validation(
                &self.address,
                ConversionError::OutOfRange {
                    value: f64::from(*mask),
                    min: 0.0,
                    max: f64::from((1i32 << self.groups) - 1),
                },
            )),
            other => Err(OscError::validation(
                &self.address,
                ConversionError::WrongType {
                    expected: "int",
                    found: format!("{other:?}"),
                },
            )),
        }
    }

    pub fn is_enabled(&self, group: u8) -> Result<bool> {
        let bit = self.bit(group)?;
        Ok(self.fetch_mask()? & bit != 0)
    }

    pub fn enable(&self, group: u8) -> Result<()> {
        let bit = self.bit(group)?;
        self.modify(|mask| mask | bit)
    }

    pub fn disable(&self, group: u8) -> Result<()> {
        let bit = self.bit(group)?;
        self.modify(|mask| mask & !bit)
    }

    /// Read-modify-write that skips the write when nothing changes.
    fn modify(&self, change: impl FnOnce(i32) -> i32) -> Result<()> {
        let current = self.fetch_mask()?;
        let next = change(current);
        if next == current {
            debug!("{} already {current:#06b}", self.address);
            return Ok(());
        }
        debug!("{} {current:#06b} -> {next:#06b}", self.address);
        self.remote.set(&self.address, vec![OscType::Int(next)])
    }
}
