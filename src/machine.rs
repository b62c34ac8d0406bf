/*
    z80nemu: ZiLOG Z80 and ZX Spectrum Next Z80N interpreter library.
    Copyright (C) 2019-2024  Rafal Michalski

    For the full copyright notice, see the lib.rs file.
*/
//! The test machine running the code on a [Z80] attached to a [Bus].
use std::collections::BTreeSet;

use log::{info, warn};

use crate::bus::{Bus, MEMORY_SIZE};
use crate::config::MachineConfig;
use crate::cpu::CpuState;
use crate::host::{Clock, TsCounter};
use crate::z80::Z80;

/// Determines when [Machine::run] returns.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum RunMode {
    /// Executes a single instruction, including all of its prefixes.
    OneInstruction,
    /// Runs until the Cpu enters the `HALT` state.
    UntilHalt,
    /// Runs until `PC` reaches the end of the code loaded with [Machine::init_code].
    UntilEnd,
    /// Runs until a breakpoint is hit or the T-states budget is exhausted.
    Continuous,
}

/// The reason why a run has stopped.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum StopReason {
    InstructionDone,
    Halted,
    CodeEnd,
    Breakpoint,
    LimitReached,
}

/// The result of a single run.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct RunOutcome {
    pub reason: StopReason,
    /// T-states elapsed during the run.
    pub tacts: u64,
}

/// Decides if the run should stop after each executed step.
///
/// `pc` is the address of the next instruction and `halted` tells whether the Cpu
/// is in the `HALT` state. A halted Cpu keeps `pc` on the `HALT` op-code.
pub trait Breakpoints {
    fn should_stop(&mut self, pc: u16, halted: bool) -> bool;
}

impl<F: FnMut(u16, bool) -> bool> Breakpoints for F {
    fn should_stop(&mut self, pc: u16, halted: bool) -> bool {
        self(pc, halted)
    }
}

impl Breakpoints for BTreeSet<u16> {
    fn should_stop(&mut self, pc: u16, _halted: bool) -> bool {
        self.contains(&pc)
    }
}

/// Owns the Cpu, the bus and the clock.
///
/// Each machine is independent. The logs of the [Bus] are cleared at the start of
/// every run, so after a run they contain only the accesses made during that run.
#[derive(Clone, Debug)]
pub struct Machine {
    cpu: Z80,
    bus: Bus,
    tsc: TsCounter<u64>,
    config: MachineConfig,
    code_end: u32,
}

impl Default for Machine {
    fn default() -> Self {
        Machine::with_config(MachineConfig::default())
    }
}

impl Machine {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_config(config: MachineConfig) -> Self {
        let mut cpu = Z80::new();
        cpu.set_extended_instructions(config.extended_instructions);
        cpu.set_pc(config.start_address);
        let mut bus = Bus::new();
        bus.set_access_log(config.access_log);
        Machine {
            cpu,
            bus,
            tsc: TsCounter::default(),
            config,
            code_end: config.code_address as u32,
        }
    }

    pub fn config(&self) -> &MachineConfig {
        &self.config
    }

    pub fn cpu(&self) -> &Z80 {
        &self.cpu
    }

    pub fn cpu_mut(&mut self) -> &mut Z80 {
        &mut self.cpu
    }

    pub fn bus(&self) -> &Bus {
        &self.bus
    }

    pub fn bus_mut(&mut self) -> &mut Bus {
        &mut self.bus
    }

    /// Returns the T-states counter value.
    pub fn tacts(&self) -> u64 {
        self.tsc.as_timestamp()
    }

    pub fn reset_tacts(&mut self) {
        self.tsc = TsCounter::default();
    }

    /// The address following the last byte of the loaded code.
    pub fn code_end(&self) -> u32 {
        self.code_end
    }

    /// Returns the Cpu snapshot with the current T-states counter.
    pub fn cpu_state(&self) -> CpuState {
        let mut state = self.cpu.state();
        state.tacts = self.tacts();
        state
    }

    /// Restores the Cpu and the T-states counter from a snapshot.
    pub fn set_cpu_state(&mut self, state: &CpuState) {
        self.cpu.set_state(state);
        self.tsc = TsCounter::from(state.tacts);
    }

    /// Makes the Z80N op-codes available to the executed code.
    pub fn enable_extended_instructions(&mut self) {
        self.config.extended_instructions = true;
        self.cpu.set_extended_instructions(true);
    }

    /// Resets the Cpu and the clock, loads the `code` at the configured code address,
    /// zeroes the rest of the memory and sets `PC` to the start address.
    ///
    /// The code not fitting in memory wraps around to address 0.
    pub fn init_code(&mut self, code: &[u8]) {
        if let Err(err) = self.config.validate(code.len()) {
            warn!("init code: {}", err);
        }
        self.cpu.reset();
        self.cpu.set_pc(self.config.start_address);
        self.reset_tacts();
        self.bus.clear_memory();
        self.bus.load(self.config.code_address, code);
        self.code_end = self.config.code_end(code.len());
    }

    /// Sets the bytes consumed by the port reads.
    pub fn init_input(&mut self, input: &[u8]) {
        self.bus.set_input(input.iter().copied());
    }

    pub fn raise_nmi(&mut self) {
        self.cpu.raise_nmi()
    }

    pub fn raise_int(&mut self) {
        self.cpu.raise_int()
    }

    /// Runs the code in the given `mode`.
    pub fn run(&mut self, mode: RunMode) -> RunOutcome {
        self.run_with_breakpoints(mode, &mut |_: u16, _: bool| false)
    }

    /// Optionally replaces the Cpu state and the memory, then runs the code.
    ///
    /// Returns the Cpu state after the run with the T-states counter.
    pub fn run_from(&mut self, state: Option<&CpuState>, memory: Option<&[u8]>, mode: RunMode) -> CpuState {
        if let Some(state) = state {
            self.set_cpu_state(state);
        }
        if let Some(memory) = memory {
            let len = memory.len().min(MEMORY_SIZE);
            self.bus.memory_mut()[..len].copy_from_slice(&memory[..len]);
        }
        self.run(mode);
        self.cpu_state()
    }

    /// Runs the code in the given `mode` polling `breakpoints` after each step.
    ///
    /// A configured T-states budget applies to every mode except
    /// [RunMode::OneInstruction].
    pub fn run_with_breakpoints<B: Breakpoints + ?Sized>(&mut self, mode: RunMode, breakpoints: &mut B) -> RunOutcome {
        self.bus.clear_logs();
        let start = self.tacts();
        info!("run {:?} from {:04X} at {} T", mode, self.cpu.get_pc(), start);
        let reason = loop {
            self.cpu.execute_next(&mut self.bus, &mut self.tsc);
            if let Some(reason) = self.stop_reason(mode, start, breakpoints) {
                break reason
            }
        };
        let tacts = self.tacts().wrapping_sub(start);
        info!("stopped {:?} at {:04X} after {} T", reason, self.cpu.get_pc(), tacts);
        RunOutcome { reason, tacts }
    }

    fn stop_reason<B: Breakpoints + ?Sized>(&mut self, mode: RunMode, start: u64, breakpoints: &mut B) -> Option<StopReason> {
        if mode == RunMode::OneInstruction {
            return Some(StopReason::InstructionDone)
        }
        let pc = self.cpu.get_pc();
        let halted = self.cpu.is_halt();
        if breakpoints.should_stop(pc, halted) {
            return Some(StopReason::Breakpoint)
        }
        let idle = halted && !self.cpu.is_interrupt_pending();
        match mode {
            RunMode::UntilHalt if halted => return Some(StopReason::Halted),
            RunMode::UntilEnd if pc as u32 >= self.code_end => return Some(StopReason::CodeEnd),
            RunMode::UntilEnd if idle => return Some(StopReason::Halted),
            RunMode::Continuous if idle && self.config.tact_limit.is_none() => {
                return Some(StopReason::Halted)
            }
            _ => {}
        }
        match self.config.tact_limit {
            Some(limit) if self.tsc.is_past_limit(start.saturating_add(limit)) => {
                Some(StopReason::LimitReached)
            }
            _ => None
        }
    }
}
