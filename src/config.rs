/*
    z80nemu: ZiLOG Z80 and ZX Spectrum Next Z80N interpreter library.
    Copyright (C) 2019-2024  Rafal Michalski

    For the full copyright notice, see the lib.rs file.
*/
//! Configuration of the [Machine][crate::Machine].
use core::fmt;

#[cfg(feature = "serde")] use serde::{Serialize, Deserialize};

use crate::bus::MEMORY_SIZE;

/// Settings of a [Machine][crate::Machine].
///
/// Every field has a default, so a partial document deserializes fine:
///
/// ```
/// # #[cfg(feature = "serde")] {
/// use z80nemu::MachineConfig;
/// let config: MachineConfig = serde_json::from_str(r#"{"tact_limit": 1000}"#).unwrap();
/// assert_eq!(config.tact_limit, Some(1000));
/// assert!(config.access_log);
/// # }
/// ```
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct MachineConfig {
    /// Executes the Z80N op-codes instead of treating them as `NOP`s.
    pub extended_instructions: bool,
    /// Records every memory, I/O and TBBlue access in the bus logs.
    pub access_log: bool,
    /// The T-states budget of a single run.
    pub tact_limit: Option<u64>,
    /// Where [Machine::init_code][crate::Machine::init_code] places the code.
    pub code_address: u16,
    /// The initial value of `PC`.
    pub start_address: u16,
}

impl Default for MachineConfig {
    fn default() -> Self {
        MachineConfig {
            extended_instructions: false,
            access_log: true,
            tact_limit: None,
            code_address: 0,
            start_address: 0,
        }
    }
}

/// The error returned by [MachineConfig::validate].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ConfigError {
    /// The code does not fit in memory when placed at the code address.
    CodeOutOfRange { address: u16, len: usize },
    /// A budget of zero T-states would stop every run before it starts.
    ZeroTactLimit,
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::CodeOutOfRange { address, len } => {
                write!(f, "{} bytes of code at 0x{:04X} exceed the 64 KB memory", len, address)
            }
            ConfigError::ZeroTactLimit => f.write_str("the T-states limit must not be 0")
        }
    }
}

impl std::error::Error for ConfigError {}

impl MachineConfig {
    /// Checks the configuration against code of `code_len` bytes.
    pub fn validate(&self, code_len: usize) -> Result<(), ConfigError> {
        if self.tact_limit == Some(0) {
            return Err(ConfigError::ZeroTactLimit)
        }
        if self.code_address as usize + code_len > MEMORY_SIZE {
            return Err(ConfigError::CodeOutOfRange { address: self.code_address, len: code_len })
        }
        Ok(())
    }

    /// Returns the address following the last byte of the code of `code_len` bytes.
    ///
    /// The value is not truncated to 16 bits, so code ending at `0xFFFF` yields `0x10000`.
    pub fn code_end(&self, code_len: usize) -> u32 {
        self.code_address as u32 + code_len as u32
    }
}
