/// Upper bound on scan workers so many small file reads do not saturate storage.
pub const MAX_SCAN_WORKERS: usize = 8;

/// Number of workers for a batch of `jobs` independent items.
///
/// Returns `min(cpus, jobs, cap)`, never less than 1. A `cap` of 0 is
/// treated as [`MAX_SCAN_WORKERS`].
pub fn worker_count(jobs: usize, cap: usize) -> usize {
    let cap = if cap == 0 { MAX_SCAN_WORKERS } else { cap };
    num_cpus::get().min(jobs).min(cap).max(1)
}
