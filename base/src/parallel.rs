//! Data parallel dispatch over scoped worker threads.

use std::sync::atomic::{AtomicUsize, Ordering};

/// Default number of items handed to a worker at a time.
pub const DEFAULT_BLOCK_SIZE: usize = 128;

/// Requested worker count; 0 means one per logical CPU.
static THREAD_COUNT: AtomicUsize = AtomicUsize::new(0);

/// Sets the number of worker threads used by batch queries.
///
/// * `n` - Number of threads; 0 selects one per logical CPU.
pub fn set_thread_count(n: usize) {
    THREAD_COUNT.store(n, Ordering::Relaxed);
}

/// Returns the number of worker threads used by batch queries.
pub fn thread_count() -> usize {
    match THREAD_COUNT.load(Ordering::Relaxed) {
        0 => num_cpus::get().max(1),
        n => n,
    }
}

/// Fills `out[i] = f(i)` for every index, handing out blocks of `block_size`
/// consecutive items to worker threads. Each output slot is written by
/// exactly one worker so results are independent of scheduling.
///
/// * `out`        - Output slice.
/// * `block_size` - Number of items per work unit.
/// * `f`          - Computes the item for an index.
pub fn parallel_fill<T, F>(out: &mut [T], block_size: usize, f: F)
where
    T: Send,
    F: Fn(usize) -> T + Sync,
{
    let block_size = block_size.max(1);
    let n_threads = thread_count().min(out.len().div_ceil(block_size));
    if n_threads <= 1 {
        out.iter_mut().enumerate().for_each(|(i, o)| *o = f(i));
        return;
    }

    let f = &f;
    let result = crossbeam::scope(|scope| {
        let (tx_worker, rx_worker) = crossbeam_channel::bounded::<(usize, &mut [T])>(n_threads);

        // Spawn worker threads.
        for _ in 0..n_threads {
            let rx_worker = rx_worker.clone();
            scope.spawn(move |_| {
                for (start, block) in rx_worker.iter() {
                    for (i, o) in block.iter_mut().enumerate() {
                        *o = f(start + i);
                    }
                }
                crate::report_stats!();
            });
        }
        drop(rx_worker); // Drop extra since we've cloned one for each worker.

        // Send work.
        for (b, block) in out.chunks_mut(block_size).enumerate() {
            if tx_worker.send((b * block_size, block)).is_err() {
                // A worker panicked; the scope reports it below.
                break;
            }
        }
    });
    if let Err(e) = result {
        std::panic::resume_unwind(e);
    }
}

/// Returns `[f(0), f(1), ..., f(len - 1)]` computed in parallel.
///
/// * `len`        - Number of items.
/// * `block_size` - Number of items per work unit.
/// * `f`          - Computes the item for an index.
pub fn parallel_map<T, F>(len: usize, block_size: usize, f: F) -> Vec<T>
where
    T: Default + Send,
    F: Fn(usize) -> T + Sync,
{
    let mut out: Vec<T> = std::iter::repeat_with(T::default).take(len).collect();
    parallel_fill(&mut out, block_size, f);
    out
}

/// Calls `f(i)` for every index in `0..len` in parallel.
///
/// * `len`        - Number of items.
/// * `block_size` - Number of items per work unit.
/// * `f`          - Called once per index.
pub fn parallel_for<F>(len: usize, block_size: usize, f: F)
where
    F: Fn(usize) + Sync,
{
    let mut unit = vec![(); len];
    parallel_fill(&mut unit, block_size, |i| f(i));
}

// ----------------------------------------------------------------------------
// Tests
// ----------------------------------------------------------------------------
