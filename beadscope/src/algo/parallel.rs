//! Static work partitioning for the parallel pipeline stages.
//!
//! Every stage of the pipeline parallelizes by handing each worker a disjoint,
//! contiguous slice of the output index space and joining at a barrier. No
//! worker ever writes an index owned by another, which is what keeps the hot
//! paths free of locks: the only synchronization primitive in the whole
//! pipeline is the join itself.

/// Number of rows per worker chunk for a row-partitioned stage.
///
/// Rounds up so that `workers` chunks always cover `total_rows`; the last
/// chunk may be short. Never returns 0, so a degenerate input still forms a
/// single valid chunk.
///
/// # Arguments
/// * `total_rows` - Number of rows (scanlines) in the output index space
/// * `workers` - Worker count the space is divided across
pub fn rows_per_chunk(total_rows: usize, workers: usize) -> usize {
    total_rows.div_ceil(workers.max(1)).max(1)
}

/// Worker count of the current thread pool.
///
/// Resolves against the pool the caller is running in, so a stage invoked
/// from inside a scoped pool partitions for that pool's size rather than the
/// global one.
pub fn workers() -> usize {
    rayon::current_num_threads().max(1)
}
