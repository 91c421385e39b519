//! Row partitioning and the fork-join executor.
//!
//! A transform is split into contiguous row ranges, one per worker. Every
//! worker gets exclusive access to its own destination rows, so the join at
//! the end of [`PartitionedExecutor::run`] is the only synchronization.

use std::num::NonZeroU32;
use std::thread;

use super::errors::TransformError;

/// A contiguous run of destination rows.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RowRange {
    pub start: u32,
    pub count: u32,
}

impl RowRange {
    /// One past the last row.
    pub fn end(&self) -> u32 {
        self.start + self.count
    }
}

/// Row assignment for one parallel stage.
///
/// Every worker gets `height / workers` rows; the leftover
/// `height % workers` rows all go to the last worker.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PartitionPlan {
    pub height: u32,
    pub worker_count: u32,
    pub rows_per_worker: u32,
    pub remainder_rows: u32,
}

impl PartitionPlan {
    pub fn new(height: u32, workers: NonZeroU32) -> Self {
        let worker_count = workers.get();
        Self {
            height,
            worker_count,
            rows_per_worker: height / worker_count,
            remainder_rows: height % worker_count,
        }
    }

    /// The row range of worker `index`.
    pub fn range(&self, index: u32) -> RowRange {
        debug_assert!(index < self.worker_count);
        let mut count = self.rows_per_worker;
        if index + 1 == self.worker_count {
            count += self.remainder_rows;
        }
        RowRange {
            start: self.rows_per_worker * index,
            count,
        }
    }

    /// All row ranges in worker order.
    pub fn ranges(&self) -> impl Iterator<Item = RowRange> + '_ {
        (0..self.worker_count).map(move |i| self.range(i))
    }
}

/// Fork-join executor over destination rows.
///
/// The worker count is taken by value when the executor is built, so it
/// cannot change while a stage is running.
#[derive(Debug, Clone, Copy)]
pub struct PartitionedExecutor {
    stage: &'static str,
    workers: NonZeroU32,
}

impl PartitionedExecutor {
    pub fn new(stage: &'static str, workers: NonZeroU32) -> Self {
        Self { stage, workers }
    }

    pub fn workers(&self) -> NonZeroU32 {
        self.workers
    }

    /// Run `transform` once per partition and wait for all of them.
    ///
    /// `dst` holds `height` rows of `row_stride` bytes each. Every call of
    /// `transform` receives its [`RowRange`] and the slice holding exactly
    /// those rows.
    ///
    /// # Errors
    /// * `TransformError::ResourceExhaustion` - a worker thread could not be spawned
    /// * `TransformError::WorkerPanicked` - a worker panicked
    pub fn run<F>(
        self,
        dst: &mut [u8],
        row_stride: usize,
        height: u32,
        transform: F,
    ) -> Result<(), TransformError>
    where
        F: Fn(RowRange, &mut [u8]) + Sync,
    {
        let plan = PartitionPlan::new(height, self.workers);
        let stage = self.stage;
        debug_assert!(dst.len() >= row_stride * height as usize);

        log::debug!(
            "{}: {} rows over {} worker(s) ({} each, +{} on last)",
            stage,
            height,
            plan.worker_count,
            plan.rows_per_worker,
            plan.remainder_rows
        );

        thread::scope(|scope| {
            let transform = &transform;
            let mut handles = Vec::with_capacity(plan.worker_count as usize);
            let mut spawn_error = None;
            let mut rest: &mut [u8] = dst;

            for (index, range) in plan.ranges().enumerate() {
                let (rows, tail) =
                    std::mem::take(&mut rest).split_at_mut(range.count as usize * row_stride);
                rest = tail;

                let spawned = thread::Builder::new()
                    .name(format!("{}-{}", stage, index))
                    .spawn_scoped(scope, move || transform(range, rows));

                match spawned {
                    Ok(handle) => handles.push(handle),
                    Err(source) => {
                        spawn_error = Some(source);
                        break;
                    }
                }
            }

            // Join everything that did start before reporting anything.
            let mut panicked = None;
            for (worker, handle) in handles.into_iter().enumerate() {
                if handle.join().is_err() && panicked.is_none() {
                    panicked = Some(worker);
                }
            }

            if let Some(source) = spawn_error {
                log::error!("{}: worker spawn failed: {}", stage, source);
                return Err(TransformError::ResourceExhaustion { stage, source });
            }
            if let Some(worker) = panicked {
                return Err(TransformError::WorkerPanicked { stage, worker });
            }
            Ok(())
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    fn workers(n: u32) -> NonZeroU32 {
        NonZeroU32::new(n).unwrap()
    }

    #[test]
    fn test_plan_even_split() {
        let plan = PartitionPlan::new(12, workers(4));
        assert_eq!(plan.rows_per_worker, 3);
        assert_eq!(plan.remainder_rows, 0);
        let ranges: Vec<_> = plan.ranges().collect();
        assert_eq!(ranges[0], RowRange { start: 0, count: 3 });
        assert_eq!(ranges[3], RowRange { start: 9, count: 3 });
    }

    #[test]
    fn test_plan_remainder_goes_to_last_worker() {
        let plan = PartitionPlan::new(10, workers(4));
        let counts: Vec<u32> = plan.ranges().map(|r| r.count).collect();
        assert_eq!(counts, vec![2, 2, 2, 4]);
        assert_eq!(plan.range(3).start, 6);
    }

    #[test]
    fn test_plan_more_workers_than_rows() {
        let plan = PartitionPlan::new(3, workers(5));
        let counts: Vec<u32> = plan.ranges().map(|r| r.count).collect();
        assert_eq!(counts, vec![0, 0, 0, 0, 3]);
        assert_eq!(plan.range(4).start, 0);
    }

    #[test]
    fn test_plan_single_worker_takes_everything() {
        let plan = PartitionPlan::new(7, workers(1));
        assert_eq!(plan.range(0), RowRange { start: 0, count: 7 });
    }

    #[test]
    fn test_run_hands_each_worker_its_own_rows() {
        let width = 3usize;
        let height = 7u32;
        let mut dst = vec![0u8; width * height as usize];
        let seen = Mutex::new(Vec::new());

        PartitionedExecutor::new("test", workers(3))
            .run(&mut dst, width, height, |range, rows| {
                assert_eq!(rows.len(), range.count as usize * width);
                for (i, row) in rows.chunks_mut(width).enumerate() {
                    row.fill((range.start as usize + i) as u8);
                }
                seen.lock().unwrap().push(range);
            })
            .unwrap();

        for (y, row) in dst.chunks(width).enumerate() {
            assert!(row.iter().all(|&v| v as usize == y));
        }
        let mut seen = seen.into_inner().unwrap();
        seen.sort_by_key(|r| r.start);
        assert_eq!(seen.last().unwrap().count, 3);
    }

    #[test]
    fn test_run_reports_worker_panic() {
        let mut dst = vec![0u8; 4];
        let err = PartitionedExecutor::new("boom", workers(2))
            .run(&mut dst, 1, 4, |range, _| {
                if range.start == 0 {
                    panic!("worker failure");
                }
            })
            .unwrap_err();
        assert!(matches!(
            err,
            TransformError::WorkerPanicked {
                stage: "boom",
                worker: 0
            }
        ));
    }
}
