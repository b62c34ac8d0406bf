/*
    z80nemu: ZiLOG Z80 and ZX Spectrum Next Z80N interpreter library.
    Copyright (C) 2019-2024  Rafal Michalski

    For the full copyright notice, see the lib.rs file.
*/
#![macro_use]
//! Crate wide macros.

/// Logs the executed instruction using the `trace!` macro.
///
/// Compiled in debug builds only.
macro_rules! cpu_trace {
    ($($arg:tt)+) => {
        #[cfg(debug_assertions)]
        {
            if ::log::log_enabled!(::log::Level::Trace) {
                ::log::trace!($($arg)+);
            }
        }
    };
}
