use ndarray::{ArrayView1, ArrayView2};
use rayon::{
    iter::{IndexedParallelIterator, ParallelIterator},
    slice::ParallelSliceMut,
    ThreadPoolBuilder,
};

use crate::IndexResult;

/// Runs `f(i, queries.row(i), &mut slots[i])` for every query row.
///
/// With `threads <= 1`, or a single query, everything runs on the calling thread. Otherwise the
/// batch is cut into `min(threads, m)` contiguous chunks that a dedicated worker pool processes
/// concurrently. Each call of `f` writes only to its own slot, and a query's result does not
/// depend on which worker computed it.
pub(crate) fn for_each_query<T, R, F>(
    queries: ArrayView2<'_, T>,
    threads: usize,
    slots: &mut [R],
    f: F,
) -> IndexResult<()>
where
    T: Sync,
    R: Send,
    F: Fn(usize, ArrayView1<'_, T>, &mut R) + Sync,
{
    debug_assert_eq!(queries.nrows(), slots.len());
    let total = slots.len();
    let workers = threads.min(total);

    if workers <= 1 {
        for (i, slot) in slots.iter_mut().enumerate() {
            f(i, queries.row(i), slot);
        }
        return Ok(());
    }

    let chunk_size = (total + workers - 1) / workers;
    tracing::debug!(
        queries = total,
        workers,
        chunk_size,
        "dispatching query batch"
    );

    let pool = ThreadPoolBuilder::new().num_threads(workers).build()?;
    pool.install(|| {
        slots
            .par_chunks_mut(chunk_size)
            .enumerate()
            .for_each(|(chunk_idx, chunk)| {
                let offset = chunk_idx * chunk_size;
                for (idx, slot) in chunk.iter_mut().enumerate() {
                    let row_idx = offset + idx;
                    f(row_idx, queries.row(row_idx), slot);
                }
            })
    });

    Ok(())
}
