/*
    z80nemu: ZiLOG Z80 and ZX Spectrum Next Z80N interpreter library.
    Copyright (C) 2019-2024  Rafal Michalski

    For the full copyright notice, see the lib.rs file.
*/
//! A flat 64 KB memory and I/O bus with the access logs.
use std::collections::VecDeque;
use core::fmt;
#[cfg(feature = "serde")] use serde::{Serialize, Deserialize};

use crate::host::{Io, Memory};

/// The size of the addressable memory.
pub const MEMORY_SIZE: usize = 0x1_0000;
/// The TBBlue register select port of the ZX Spectrum Next.
pub const TBBLUE_REGISTER_SELECT_PORT: u16 = 0x243B;

/// A single memory access.
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct MemoryOp {
    pub address: u16,
    pub value: u8,
    pub is_write: bool
}

/// A single I/O port access.
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct IoOp {
    pub address: u16,
    pub value: u8,
    pub is_output: bool
}

/// A single write to the TBBlue register ports.
///
/// `is_index` is `true` for the register select half of a `NEXTREG` write.
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct TbBlueOp {
    pub data: u8,
    pub is_index: bool
}

impl fmt::Display for MemoryOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({:04x}) {:02x}", if self.is_write { "WR" } else { "RD" }, self.address, self.value)
    }
}

impl fmt::Display for IoOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({:04x}) {:02x}", if self.is_output { "OUT" } else { "IN" }, self.address, self.value)
    }
}

/// Memory and ports of the test machine.
///
/// Port reads are served from a queue of input bytes given by the caller;
/// an empty queue yields `0x00`. While the access log is enabled every memory and
/// port access is recorded in call order.
#[derive(Clone)]
pub struct Bus {
    memory: Box<[u8; MEMORY_SIZE]>,
    input: VecDeque<u8>,
    access_log: bool,
    memory_log: Vec<MemoryOp>,
    io_log: Vec<IoOp>,
    tbblue_log: Vec<TbBlueOp>,
    next_regs: Box<[u8; 256]>,
}

impl Default for Bus {
    fn default() -> Self {
        Bus {
            memory: Box::new([0; MEMORY_SIZE]),
            input: VecDeque::new(),
            access_log: true,
            memory_log: Vec::new(),
            io_log: Vec::new(),
            tbblue_log: Vec::new(),
            next_regs: Box::new([0; 256]),
        }
    }
}

impl fmt::Debug for Bus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Bus")
         .field("input", &self.input)
         .field("access_log", &self.access_log)
         .field("memory_log", &self.memory_log.len())
         .field("io_log", &self.io_log.len())
         .field("tbblue_log", &self.tbblue_log.len())
         .finish()
    }
}

impl Bus {
    pub fn new() -> Self {
        Self::default()
    }

    /// Enables or disables recording of the access logs.
    pub fn set_access_log(&mut self, enabled: bool) {
        self.access_log = enabled;
    }

    pub fn is_access_log_enabled(&self) -> bool {
        self.access_log
    }

    /// Returns the whole memory image.
    pub fn memory(&self) -> &[u8; MEMORY_SIZE] {
        &self.memory
    }

    pub fn memory_mut(&mut self) -> &mut [u8; MEMORY_SIZE] {
        &mut self.memory
    }

    /// Copies `bytes` into memory starting at `address`, wrapping at the end of the
    /// address space. Returns the address following the last byte.
    pub fn load(&mut self, address: u16, bytes: &[u8]) -> u16 {
        bytes.iter().fold(address, |addr, &byte| {
            self.memory[addr as usize] = byte;
            addr.wrapping_add(1)
        })
    }

    /// Clears the memory image.
    pub fn clear_memory(&mut self) {
        self.memory.fill(0);
    }

    /// Replaces the port input queue.
    pub fn set_input<I: IntoIterator<Item=u8>>(&mut self, input: I) {
        self.input = input.into_iter().collect();
    }

    /// The bytes not yet consumed by port reads.
    pub fn pending_input(&self) -> &VecDeque<u8> {
        &self.input
    }

    /// Returns the logged memory accesses, op-code fetches included.
    pub fn access_log(&self) -> &[MemoryOp] {
        &self.memory_log
    }

    pub fn io_log(&self) -> &[IoOp] {
        &self.io_log
    }

    pub fn tbblue_log(&self) -> &[TbBlueOp] {
        &self.tbblue_log
    }

    /// Returns the last value written to the ZX Spectrum Next register `reg`.
    pub fn next_reg(&self, reg: u8) -> u8 {
        self.next_regs[reg as usize]
    }

    pub fn clear_logs(&mut self) {
        self.memory_log.clear();
        self.io_log.clear();
        self.tbblue_log.clear();
    }

    /// Reads a memory byte and logs it.
    pub fn read_byte(&mut self, address: u16) -> u8 {
        let value = self.memory[address as usize];
        if self.access_log {
            self.memory_log.push(MemoryOp { address, value, is_write: false });
        }
        value
    }

    /// Writes a memory byte and logs it.
    pub fn write_byte(&mut self, address: u16, value: u8) {
        self.memory[address as usize] = value;
        if self.access_log {
            self.memory_log.push(MemoryOp { address, value, is_write: true });
        }
    }

    /// Takes the next input byte for the `port` and logs it.
    pub fn read_port(&mut self, address: u16) -> u8 {
        let value = self.input.pop_front().unwrap_or(0);
        if self.access_log {
            self.io_log.push(IoOp { address, value, is_output: false });
        }
        value
    }

    /// Logs the output to the `port`.
    pub fn write_port(&mut self, address: u16, value: u8) {
        if self.access_log {
            self.io_log.push(IoOp { address, value, is_output: true });
        }
    }

    /// Records a `NEXTREG` write: the register index first, then the value.
    pub fn write_tbblue(&mut self, reg: u8, value: u8) {
        self.next_regs[reg as usize] = value;
        if self.access_log {
            self.tbblue_log.push(TbBlueOp { data: reg, is_index: true });
            self.tbblue_log.push(TbBlueOp { data: value, is_index: false });
        }
    }
}

impl Memory for Bus {
    type Timestamp = u64;

    fn read_mem(&mut self, address: u16, _ts: u64) -> u8 {
        self.read_byte(address)
    }

    fn write_mem(&mut self, address: u16, value: u8, _ts: u64) {
        self.write_byte(address, value)
    }

    fn read_debug(&self, address: u16) -> u8 {
        self.memory[address as usize]
    }
}

impl Io for Bus {
    type Timestamp = u64;

    fn read_io(&mut self, port: u16, _ts: u64) -> u8 {
        self.read_port(port)
    }

    fn write_io(&mut self, port: u16, data: u8, _ts: u64) {
        self.write_port(port, data)
    }

    fn write_next_reg(&mut self, reg: u8, value: u8, _ts: u64) {
        self.write_tbblue(reg, value)
    }
}
