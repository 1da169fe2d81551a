//! Statistics Registration

use super::StatsAccumulator;
use std::sync::{Mutex, OnceLock};

/// Callback that moves a thread's statistics into the accumulator.
pub type StatFunc = fn(&mut StatsAccumulator);

/// Return the global statistics registrar.
pub fn stats_registrar() -> &'static Mutex<StatsRegistrar> {
    static DATA: OnceLock<Mutex<StatsRegistrar>> = OnceLock::new();
    DATA.get_or_init(|| Mutex::new(StatsRegistrar::default()))
}

/// Registers callback functions for statistics.
#[derive(Default)]
pub struct StatsRegistrar {
    stats_funcs: Vec<StatFunc>,
}

impl StatsRegistrar {
    /// Register a callback function for reporting statistics. Registering
    /// the same function twice has no effect.
    ///
    /// * `func` - Callback created by one of the `stat_*` macros.
    pub fn register_stat_func(&mut self, func: StatFunc) {
        if !self.stats_funcs.iter().any(|f| *f as usize == func as usize) {
            self.stats_funcs.push(func);
        }
    }

    /// Call all callback functions for reporting statistics.
    ///
    /// * `accum` - The accumulator to report into.
    pub fn call_stat_funcs(&self, accum: &mut StatsAccumulator) {
        self.stats_funcs.iter().for_each(|func| func(accum));
    }
}
