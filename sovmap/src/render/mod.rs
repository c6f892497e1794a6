//! Multi-threaded rasterization.
//!
//! The image is partitioned into contiguous vertical column slabs, one per
//! worker. Workers run on OS threads and are joined by the coordinator
//! before any result is observed.

mod worker;

pub(crate) use worker::ColumnWorker;

/// Partition `[0, width)` into `workers` contiguous slabs. Covers the range
/// exactly with no overlap; empty slabs (more workers than columns) are
/// dropped.
pub(crate) fn partition_columns(width: u32, workers: u32) -> Vec<(u32, u32)> {
    let width = width as u64;
    let workers = workers.max(1) as u64;
    (0..workers)
        .map(|i| {
            (
                (i * width / workers) as u32,
                ((i + 1) * width / workers) as u32,
            )
        })
        .filter(|&(start_x, end_x)| start_x < end_x)
        .collect()
}
