/*
    z80nemu: ZiLOG Z80 and ZX Spectrum Next Z80N interpreter library.
    Copyright (C) 2019-2024  Rafal Michalski

    z80nemu is free software: you can redistribute it and/or modify it under
    the terms of the GNU Lesser General Public License (LGPL) as published
    by the Free Software Foundation, either version 3 of the License, or
    (at your option) any later version.

    z80nemu is distributed in the hope that it will be useful,
    but WITHOUT ANY WARRANTY; without even the implied warranty of
    MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE.  See the
    GNU Lesser General Public License for more details.

    You should have received a copy of the GNU Lesser General Public License
    along with this program.  If not, see <https://www.gnu.org/licenses/>.

    Author contact information: see Cargo.toml file, section [package.authors].
*/
/*! # Z80 Next emu

`z80nemu` crate is a cycle-accurate interpreter of Zilog's Z80 machine code, including the
extended instruction set of the ZX Spectrum Next's Z80N.

```text
  _______
=|       |=
=|       |=
=|       |= ---------------- =[ TsCounter ]
=|       |=                         |
=|       |=                         |
=|  Cpu  |=                    _____|_____
=|       |=                   |           |
=|  Z80  |= \                 |           |
=|       |= <--------------> =|    Bus    |=::::: input queue
=|       |= /                 |           |       memory, I/O and TBBlue logs
=|       |=                   |___________|
=|       |=
=|_______|=
```

The building blocks are the same as in any emulator based on this library:

* [Z80] - the Cpu. It executes one instruction per [Z80::execute_next] call, accepting the
          pending interrupt signals first.
* [Clock] - an interface to the T-state counter. [TsCounter] is the provided implementation.
* [Memory] and [Io] - interfaces to the memory and the I/O ports of the host.

The [Bus] implements both [Memory] and [Io] over a flat 64 KB memory, an input queue for
the port reads and optional logs of every access. The [Machine] owns a [Z80], a [Bus] and a
[TsCounter] and runs the code in one of the [RunMode]s.

The extended Z80N op-codes are only executed when enabled with
[Z80::set_extended_instructions]. Otherwise each of them is a 2-byte `NOP` taking 8 T-states.

## Example

```
use z80nemu::*;

const FIB_N: u8 = 24; // 1..=24

let mut machine = Machine::new();
machine.init_code(&[
    0x21, 0x00, 0x00, // 0x0000 LD   HL, 0x0000
    0x11, 0x01, 0x00, // 0x0003 LD   DE, 0x0001
    0xEB,             // 0x0006 EX   DE, HL
    0x19,             // 0x0007 ADD  HL, DE
    0x10, 0xFC,       // 0x0008 DJNZ 0x0006
    0x76              // 0x000A HALT
]);
machine.cpu_mut().set_reg(Reg8::B, None, FIB_N);
// Let's calculate a Fibbonacci number
let outcome = machine.run(RunMode::UntilHalt);
assert_eq!(outcome.reason, StopReason::Halted);
// PC stays on HALT
assert_eq!(machine.cpu().get_pc(), 0x000A);
// the content of the HL registers
assert_eq!(machine.cpu().get_reg16(Reg16::HL), 46368); // Fib(24)
// the number of T-states passed
assert_eq!(outcome.tacts, 10+10+(FIB_N as u64)*(4+11+13)-5+4);
```
*/
#[macro_use]
mod macros;
mod cpu;
pub mod bus;
pub mod config;
pub mod host;
pub mod machine;
pub mod z80;

pub use cpu::*;
pub use bus::{Bus, IoOp, MemoryOp, TbBlueOp};
pub use config::{ConfigError, MachineConfig};
pub use host::{Clock, Io, Memory, TsCounter};
pub use machine::{Breakpoints, Machine, RunMode, RunOutcome, StopReason};
pub use z80::Z80;

/// An address of the NMI routine.
pub const NMI_RESTART: u16 = 0x66;
/// An address of the maskable interrupt routine in the interrupt modes 0 and 1.
pub const IRQ_RESTART: u16 = 0x38;
