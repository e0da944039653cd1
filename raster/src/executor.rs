//! Partitioned execution over a raster's cells.

use crate::RasterError;
use grid::Box3D;
use log::debug;
use rayon::prelude::*;
use std::sync::atomic::{AtomicBool, Ordering};

/// How partitions are scheduled.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ProcessingMode {
    /// One partition after another on the calling thread.
    Sequential,
    /// Rayon's global pool.
    #[default]
    Parallel,
    /// A dedicated pool with this many threads.
    ParallelWith(usize),
}

/// Splits `bounds` into about `parts` sub-boxes and runs `f` on each
/// with the matching run of `out`.
///
/// `out` holds one sample per position of `bounds` in iteration order.
/// Each sub-box receives its own disjoint slice, so `f` may write
/// without synchronization. Sub-boxes not yet started when `cancel`
/// is raised are skipped and the whole run reports
/// [RasterError::Cancelled].
pub fn run_partitioned<F>(
    mode: ProcessingMode,
    bounds: Box3D<i64>,
    parts: usize,
    out: &mut [f64],
    cancel: &AtomicBool,
    f: F,
) -> Result<(), RasterError>
where
    F: Fn(Box3D<i64>, &mut [f64]) -> Result<(), RasterError> + Send + Sync,
{
    if out.len() != bounds.volume() {
        return Err(RasterError::SampleLen {
            name: "output".to_owned(),
            expected: bounds.volume(),
            found: out.len(),
        });
    }

    let boxes = bounds.partition(parts);
    debug!("running {} partitions in {mode:?}", boxes.len());
    let mut jobs = Vec::with_capacity(boxes.len());
    let mut rest = out;
    for bx in boxes {
        let (head, tail) = std::mem::take(&mut rest).split_at_mut(bx.volume());
        jobs.push((bx, head));
        rest = tail;
    }

    let work = |(bx, slice): (Box3D<i64>, &mut [f64])| {
        if cancel.load(Ordering::Relaxed) {
            return Err(RasterError::Cancelled);
        }
        f(bx, slice)
    };

    match mode {
        ProcessingMode::Sequential => jobs.into_iter().try_for_each(work),
        ProcessingMode::Parallel => jobs.into_par_iter().try_for_each(work),
        ProcessingMode::ParallelWith(threads) => {
            let pool = rayon::ThreadPoolBuilder::new()
                .num_threads(threads)
                .build()?;
            pool.install(|| jobs.into_par_iter().try_for_each(work))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{run_partitioned, ProcessingMode};
    use crate::RasterError;
    use grid::{Box3D, Size};
    use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

    const MODES: [ProcessingMode; 3] = [
        ProcessingMode::Sequential,
        ProcessingMode::Parallel,
        ProcessingMode::ParallelWith(3),
    ];

    #[test]
    fn test_every_sample_written_once() {
        let bounds: Box3D<i64> = Box3D::from_size(Size::new(9, 7, 2)).unwrap();
        for mode in MODES {
            for parts in [1, 4, 16] {
                let mut out = vec![0.0; bounds.volume()];
                let calls = AtomicUsize::new(0);
                run_partitioned(mode, bounds, parts, &mut out, &AtomicBool::new(false), |bx, slice| {
                    calls.fetch_add(1, Ordering::Relaxed);
                    assert_eq!(bx.volume(), slice.len());
                    for (v, dst) in bx.iter().zip(slice.iter_mut()) {
                        *dst += (v.z * 100 + v.y * 10 + v.x) as f64;
                    }
                    Ok(())
                })
                .unwrap();
                assert_eq!(calls.load(Ordering::Relaxed), bounds.partition(parts).len());
                let expected: Vec<f64> = bounds
                    .iter()
                    .map(|v| (v.z * 100 + v.y * 10 + v.x) as f64)
                    .collect();
                assert_eq!(out, expected, "{mode:?} with {parts} parts");
            }
        }
    }

    #[test]
    fn test_cancelled() {
        let bounds: Box3D<i64> = Box3D::from_size(Size::plane(4, 4)).unwrap();
        let mut out = vec![0.0; 16];
        let res = run_partitioned(
            ProcessingMode::Sequential,
            bounds,
            4,
            &mut out,
            &AtomicBool::new(true),
            |_, _| Ok(()),
        );
        assert!(matches!(res, Err(RasterError::Cancelled)));
    }

    #[test]
    fn test_error_propagates() {
        let bounds: Box3D<i64> = Box3D::from_size(Size::plane(4, 4)).unwrap();
        let mut out = vec![0.0; 16];
        let res = run_partitioned(
            ProcessingMode::Parallel,
            bounds,
            4,
            &mut out,
            &AtomicBool::new(false),
            |bx, _| {
                if bx.min_corner().y == 2 {
                    Err(RasterError::NotFound("band".into()))
                } else {
                    Ok(())
                }
            },
        );
        assert!(matches!(res, Err(RasterError::NotFound(_))));
    }

    #[test]
    fn test_output_len_checked() {
        let bounds: Box3D<i64> = Box3D::from_size(Size::plane(4, 4)).unwrap();
        let mut out = vec![0.0; 15];
        let res = run_partitioned(
            ProcessingMode::Sequential,
            bounds,
            1,
            &mut out,
            &AtomicBool::new(false),
            |_, _| Ok(()),
        );
        assert!(matches!(res, Err(RasterError::SampleLen { .. })));
    }
}
