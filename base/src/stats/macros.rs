//! Macros

/// Create a thread local variable to track an `i64` counter across threads.
///
/// * `$title`      - Title using `/` to separate category and name,
///                   e.g. "TriTree/Ray-triangle tests".
/// * `$var`        - An identifier for the thread local variable.
/// * `$stats_func` - An identifier for the callback that moves the value
///                   into the `StatsAccumulator`.
#[macro_export]
macro_rules! stat_counter {
    ($title: expr, $var: ident, $stats_func: ident $(,)?) => {
        thread_local! { pub(crate) static $var: std::cell::RefCell<i64> = std::cell::RefCell::new(0); }

        pub(crate) fn $stats_func(accum: &mut $crate::stats::StatsAccumulator) {
            let val = $var.with(|v| v.replace(0));
            accum.report_counter($title, val);
        }
    };
}

/// Create a thread local variable to track memory usage in bytes.
///
/// * `$title`      - Title using `/` to separate category and name.
/// * `$var`        - An identifier for the thread local variable.
/// * `$stats_func` - An identifier for the reporting callback.
#[macro_export]
macro_rules! stat_memory_counter {
    ($title: expr, $var: ident, $stats_func: ident $(,)?) => {
        thread_local! { pub(crate) static $var: std::cell::RefCell<u64> = std::cell::RefCell::new(0); }

        pub(crate) fn $stats_func(accum: &mut $crate::stats::StatsAccumulator) {
            let val = $var.with(|v| v.replace(0));
            accum.report_memory_counter($title, val);
        }
    };
}

/// Create a thread local variable to track an integer distribution.
///
/// * `$title`      - Title using `/` to separate category and name.
/// * `$var`        - An identifier for the thread local variable.
/// * `$stats_func` - An identifier for the reporting callback.
#[macro_export]
macro_rules! stat_int_distribution {
    ($title: expr, $var: ident, $stats_func: ident $(,)?) => {
        thread_local! {
            pub(crate) static $var: std::cell::RefCell<$crate::stats::StatsDistribution> =
                std::cell::RefCell::new($crate::stats::StatsDistribution::default());
        }

        pub(crate) fn $stats_func(accum: &mut $crate::stats::StatsAccumulator) {
            let val = $var.with(|v| v.take());
            accum.report_int_distribution($title, val);
        }
    };
}

/// Create thread local numerator/denominator variables reported as a
/// percentage.
///
/// * `$title`      - Title using `/` to separate category and name.
/// * `$var_num`    - Numerator (actual count).
/// * `$var_denom`  - Denominator (total count).
/// * `$stats_func` - An identifier for the reporting callback.
#[macro_export]
macro_rules! stat_percent {
    ($title: expr, $var_num: ident, $var_denom: ident, $stats_func: ident $(,)?) => {
        thread_local! {
            pub(crate) static $var_num: std::cell::RefCell<i64> = std::cell::RefCell::new(0);
            pub(crate) static $var_denom: std::cell::RefCell<i64> = std::cell::RefCell::new(0);
        }

        pub(crate) fn $stats_func(accum: &mut $crate::stats::StatsAccumulator) {
            let num = $var_num.with(|v| v.replace(0));
            let denom = $var_denom.with(|v| v.replace(0));
            accum.report_percentage($title, num, denom);
        }
    };
}

/// Create thread local numerator/denominator variables reported as a ratio.
///
/// * `$title`      - Title using `/` to separate category and name.
/// * `$var_num`    - Numerator.
/// * `$var_denom`  - Denominator.
/// * `$stats_func` - An identifier for the reporting callback.
#[macro_export]
macro_rules! stat_ratio {
    ($title: expr, $var_num: ident, $var_denom: ident, $stats_func: ident $(,)?) => {
        thread_local! {
            pub(crate) static $var_num: std::cell::RefCell<i64> = std::cell::RefCell::new(0);
            pub(crate) static $var_denom: std::cell::RefCell<i64> = std::cell::RefCell::new(0);
        }

        pub(crate) fn $stats_func(accum: &mut $crate::stats::StatsAccumulator) {
            let num = $var_num.with(|v| v.replace(0));
            let denom = $var_denom.with(|v| v.replace(0));
            accum.report_ratio($title, num, denom);
        }
    };
}

/// Increment a thread local counter/percent/ratio variable.
#[macro_export]
macro_rules! stat_inc {
    ($var: ident, $e: expr) => {
        $var.with(|v| *v.borrow_mut() += $e);
    };
}

/// Report a sample to a thread local distribution variable.
#[macro_export]
macro_rules! stat_dist {
    ($var: ident, $e: expr) => {
        $var.with(|v| v.borrow_mut().report($e));
    };
}

/// Generates `register_stats()` which registers the callbacks created by the
/// `stat_*` macros once. Call it from constructors of top level types such as
/// `TriTree::new()`, not from per-primitive constructors.
///
/// * `$($func: ident),+` - One or more callback functions.
#[macro_export]
macro_rules! stat_register_fns {
    ($($stat_func: ident),+ $(,)?) => {
        pub(crate) fn register_stats() {
            static REGISTERED: std::sync::Once = std::sync::Once::new();
            REGISTERED.call_once(|| {
                let mut sr = $crate::stats::stats_registrar()
                    .lock()
                    .expect("stats registrar poisoned");
                $(
                    sr.register_stat_func($stat_func);
                )+
            });
        }
    };
}

/// Move the calling thread's statistics into the global accumulator. Call at
/// the end of each worker thread and once from the main thread.
#[macro_export]
macro_rules! report_stats {
    () => {{
        let mut accum = $crate::stats::stats_accumulator()
            .lock()
            .expect("stats accumulator poisoned");
        $crate::stats::stats_registrar()
            .lock()
            .expect("stats registrar poisoned")
            .call_stat_funcs(&mut accum);
    }};
}

/// Print the accumulated statistics.
#[macro_export]
macro_rules! print_stats {
    () => {{
        $crate::stats::stats_accumulator()
            .lock()
            .expect("stats accumulator poisoned")
            .print();
    }};
}

/// Clear the accumulated statistics.
#[macro_export]
macro_rules! clear_stats {
    () => {{
        $crate::stats::stats_accumulator()
            .lock()
            .expect("stats accumulator poisoned")
            .clear();
    }};
}
