//! A test machine remembering its state before each run.
#![allow(dead_code)]
use std::sync::Once;

pub mod opconsts;

use simplelog::{Config, LevelFilter, TestLogger};
use z80nemu::*;

static INIT_LOGGER: Once = Once::new();

fn init_logger() {
    INIT_LOGGER.call_once(|| {
        let _ = TestLogger::init(LevelFilter::Debug, Config::default());
    });
}

pub struct TestMachine {
    pub machine: Machine,
    pub mode: RunMode,
    state_before: CpuState,
    memory_before: Vec<u8>,
}

impl TestMachine {
    pub fn new(mode: RunMode) -> Self {
        init_logger();
        let machine = Machine::new();
        let state_before = machine.cpu_state();
        let memory_before = machine.bus().memory().to_vec();
        TestMachine { machine, mode, state_before, memory_before }
    }

    /// A machine executing the Z80N op-codes.
    pub fn extended(mode: RunMode) -> Self {
        let mut tm = TestMachine::new(mode);
        tm.machine.enable_extended_instructions();
        tm
    }

    pub fn init_code(&mut self, code: &[u8]) {
        self.machine.init_code(code);
    }

    pub fn init_input(&mut self, input: &[u8]) {
        self.machine.init_input(input);
    }

    pub fn cpu(&self) -> &Z80 {
        self.machine.cpu()
    }

    pub fn cpu_mut(&mut self) -> &mut Z80 {
        self.machine.cpu_mut()
    }

    pub fn bus(&self) -> &Bus {
        self.machine.bus()
    }

    pub fn memory(&self) -> &[u8; 0x10000] {
        self.machine.bus().memory()
    }

    pub fn memory_mut(&mut self) -> &mut [u8; 0x10000] {
        self.machine.bus_mut().memory_mut()
    }

    pub fn tacts(&self) -> u64 {
        self.machine.tacts()
    }

    pub fn state(&self) -> CpuState {
        self.machine.cpu_state()
    }

    pub fn flags(&self) -> CpuFlags {
        self.cpu().get_flags()
    }

    pub fn run(&mut self) -> RunOutcome {
        self.state_before = self.machine.cpu_state();
        self.memory_before = self.machine.bus().memory().to_vec();
        self.machine.run(self.mode)
    }

    /// Panics if any register other than `PC`, `WZ`, `R` and those listed in `except`
    /// has changed during the last run.
    ///
    /// `except` is a comma separated list of 8-bit or 16-bit register names.
    pub fn should_keep_registers(&self, except: &str) {
        let exclude: Vec<String> = except.split(',')
                                         .map(|s| s.trim().to_uppercase())
                                         .filter(|s| !s.is_empty())
                                         .collect();
        let excluded = |name: &str| exclude.iter().any(|e| e == name);
        let before = &self.state_before;
        let after = self.state();
        let mut differs = Vec::new();
        for (name, b, a) in [("AF'", before.af_alt, after.af_alt),
                             ("BC'", before.bc_alt, after.bc_alt),
                             ("DE'", before.de_alt, after.de_alt),
                             ("HL'", before.hl_alt, after.hl_alt)]
        {
            if b != a && !excluded(name) {
                differs.push(name.to_string());
            }
        }
        for (name, b, a) in [("SP", before.sp, after.sp),
                             ("IX", before.ix.get16(), after.ix.get16()),
                             ("IY", before.iy.get16(), after.iy.get16())]
        {
            if b != a && !excluded(name) {
                differs.push(name.to_string());
            }
        }
        for (pair, hi, lo, b, a) in [("AF", "A", "F", before.af, after.af),
                                     ("BC", "B", "C", before.bc, after.bc),
                                     ("DE", "D", "E", before.de, after.de),
                                     ("HL", "H", "L", before.hl, after.hl)]
        {
            if excluded(pair) {
                continue
            }
            if b.hi() != a.hi() && !excluded(hi) {
                differs.push(hi.to_string());
            }
            if b.lo() != a.lo() && !excluded(lo) {
                differs.push(lo.to_string());
            }
        }
        assert!(differs.is_empty(),
            "the following registers are expected to remain intact, \
             but their values have been changed: {}", differs.join(", "));
    }

    /// Panics if any memory byte outside the listed ranges has changed during the
    /// last run.
    ///
    /// `except` is a comma separated list of hexadecimal addresses or `start-end`
    /// ranges, inclusive.
    pub fn should_keep_memory(&self, except: &str) {
        let ranges: Vec<(usize, usize)> = except.split(',')
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(|range| {
                let mut bounds = range.split('-').map(|s| {
                    usize::from_str_radix(s.trim(), 16).expect("a hexadecimal address")
                });
                let lower = bounds.next().expect("an address");
                let upper = bounds.next().unwrap_or(lower);
                (lower, upper)
            })
            .collect();
        let deviations: Vec<String> = self.memory_before.iter()
            .zip(self.memory().iter())
            .enumerate()
            .filter(|&(addr, (b, a))| {
                b != a && !ranges.iter().any(|&(lo, hi)| (lo..=hi).contains(&addr))
            })
            .take(10)
            .map(|(addr, _)| format!("{:04X}", addr))
            .collect();
        assert!(deviations.is_empty(),
            "the following memory locations are expected to remain intact, \
             but their values have been changed: {}", deviations.join(", "));
    }
}
