use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::thread;
use std::time::Duration;

use matrix::dispatch::{gated, on_pool};
use matrix::random::Generator;
use matrix::{DispatchContext, Error, Matrix, Strategy, WorkerPool};
use proptest::prelude::*;
use tokio::sync::Semaphore;

fn context(threads: usize, permits: usize) -> DispatchContext {
    DispatchContext::new(WorkerPool::new(threads).unwrap(), permits).unwrap()
}

fn a() -> Matrix {
    Matrix::from_rows(vec![vec![1, 0, 2], vec![-1, 3, 1]]).unwrap()
}

fn b() -> Matrix {
    Matrix::from_rows(vec![vec![3, 1], vec![2, 1], vec![1, 0]]).unwrap()
}

#[test]
fn test_multiply_every_strategy() {
    let context = context(4, 2);
    let ab = Matrix::from_rows(vec![vec![5, 1], vec![4, 2]]).unwrap();
    let ba = Matrix::from_rows(vec![vec![2, 3, 7], vec![1, 3, 5], vec![1, 0, 2]]).unwrap();

    for strategy in Strategy::ALL {
        assert_eq!(matrix::multiply(&context, a(), b(), strategy), Ok(ab.clone()), "{}", strategy);
        assert_eq!(matrix::multiply(&context, b(), a(), strategy), Ok(ba.clone()), "{}", strategy);
    }
}

#[test]
fn test_multiply_accepts_shared_operands() {
    let context = context(2, 1);
    let left = Arc::new(a());
    let right = Arc::new(b());

    let first = matrix::multiply(&context, Arc::clone(&left), Arc::clone(&right), Strategy::WorkerPool);
    let second = matrix::multiply(&context, left, right, Strategy::Latch);
    assert_eq!(first, second);
}

#[test]
fn test_multiply_requires_transposable_shapes() {
    let context = context(2, 2);
    let square = Matrix::new(2, 2, vec![1, 2, 3, 4]).unwrap();
    let tall = Matrix::new(2, 3, vec![1, 2, 3, 4, 5, 6]).unwrap();

    for strategy in Strategy::ALL {
        assert_eq!(
            matrix::multiply(&context, square.clone(), tall.clone(), strategy),
            Err(Error::DimensionMismatch(2, 2, 2, 3))
        );
    }
    assert_eq!(
        matrix::multiply(&context, tall.clone(), tall, Strategy::Sequential),
        Err(Error::DimensionMismatch(2, 3, 2, 3))
    );
}

#[test]
fn test_multiply_large_square() {
    let context = context(8, 3);
    let mut generator = Generator::new(7);
    let m = generator.matrix(60, 60).unwrap();

    let baseline = matrix::multiply(&context, m.clone(), m.clone(), Strategy::Sequential).unwrap();
    assert_eq!(baseline.row_count(), 60);
    assert_eq!(baseline.column_count(), 60);

    for strategy in Strategy::ALL {
        let product = matrix::multiply(&context, m.clone(), m.clone(), strategy).unwrap();
        assert_eq!(product, baseline, "{}", strategy);
    }
}

#[test]
fn test_single_permit_matches_sequential() {
    let context = context(10, 1);
    let mut generator = Generator::new(11);
    let m1 = generator.matrix(25, 40).unwrap();
    let m2 = generator.matrix(40, 25).unwrap();

    let baseline = matrix::multiply(&context, m1.clone(), m2.clone(), Strategy::Sequential);
    let gated = matrix::multiply(&context, m1, m2, Strategy::Semaphore);
    assert_eq!(gated, baseline);
    assert_eq!(context.semaphore().available_permits(), 1);
}

#[test]
fn test_single_permit_serializes_jobs() {
    let pool = WorkerPool::new(10).unwrap();
    let semaphore = Arc::new(Semaphore::new(1));
    let running = Arc::new(AtomicUsize::new(0));
    let peak = Arc::new(AtomicUsize::new(0));

    let jobs: Vec<_> = (0..20)
        .map(|index| {
            let running = Arc::clone(&running);
            let peak = Arc::clone(&peak);
            move || {
                let now = running.fetch_add(1, Ordering::SeqCst) + 1;
                peak.fetch_max(now, Ordering::SeqCst);
                thread::sleep(Duration::from_millis(2));
                running.fetch_sub(1, Ordering::SeqCst);
                index
            }
        })
        .collect();

    let results = gated(&pool, Arc::clone(&semaphore), jobs).unwrap();
    assert_eq!(results, (0..20).collect::<Vec<_>>());
    assert_eq!(peak.load(Ordering::SeqCst), 1);
    assert_eq!(semaphore.available_permits(), 1);
}

#[test]
fn test_permits_bound_concurrency_below_pool_size() {
    let pool = WorkerPool::new(8).unwrap();
    let semaphore = Arc::new(Semaphore::new(3));
    let running = Arc::new(AtomicUsize::new(0));
    let peak = Arc::new(AtomicUsize::new(0));

    let jobs: Vec<_> = (0..24)
        .map(|_| {
            let running = Arc::clone(&running);
            let peak = Arc::clone(&peak);
            move || {
                let now = running.fetch_add(1, Ordering::SeqCst) + 1;
                peak.fetch_max(now, Ordering::SeqCst);
                thread::sleep(Duration::from_millis(2));
                running.fetch_sub(1, Ordering::SeqCst);
            }
        })
        .collect();

    gated(&pool, semaphore, jobs).unwrap();
    assert!(peak.load(Ordering::SeqCst) <= 3);
}

#[test]
fn test_failed_job_reported_and_permit_released() {
    let pool = WorkerPool::new(4).unwrap();
    let semaphore = Arc::new(Semaphore::new(2));

    let jobs: Vec<Box<dyn FnOnce() -> i64 + Send>> = vec![
        Box::new(|| 1),
        Box::new(|| -> i64 { panic!("boom") }),
        Box::new(|| 3),
    ];

    let result = gated(&pool, Arc::clone(&semaphore), jobs);
    assert_eq!(
        result,
        Err(Error::ComputationFailed {
            row: 1,
            reason: "boom".to_string()
        })
    );
    assert_eq!(semaphore.available_permits(), 2);
}

#[test]
fn test_failed_job_on_pool_reports_lowest_row() {
    let pool = WorkerPool::new(4).unwrap();

    let jobs: Vec<Box<dyn FnOnce() -> i64 + Send>> = vec![
        Box::new(|| 1),
        Box::new(|| 2),
        Box::new(|| -> i64 { panic!("row {} failed", 2) }),
        Box::new(|| -> i64 { panic!("row {} failed", 3) }),
    ];

    let result = on_pool(&pool, jobs);
    assert_eq!(
        result,
        Err(Error::ComputationFailed {
            row: 2,
            reason: "row 2 failed".to_string()
        })
    );
}

#[test]
fn test_closed_semaphore_interrupts() {
    let pool = WorkerPool::new(2).unwrap();
    let semaphore = Arc::new(Semaphore::new(1));
    semaphore.close();

    let jobs: Vec<_> = (0..3).map(|index| move || index).collect();
    assert_eq!(
        gated(&pool, semaphore, jobs),
        Err(Error::ComputationInterrupted { row: 0 })
    );
}

#[test]
fn test_blocking_inside_async_runtime_refused() {
    let context = context(2, 1);
    let runtime = tokio::runtime::Builder::new_current_thread().build().unwrap();

    for strategy in [Strategy::WorkerPool, Strategy::Latch, Strategy::Semaphore] {
        let result = runtime.block_on(async { matrix::multiply(&context, a(), b(), strategy) });
        assert!(
            matches!(result, Err(Error::InvalidConfiguration(_))),
            "{}: {:?}",
            strategy,
            result
        );
    }

    let sequential = runtime.block_on(async { matrix::multiply(&context, a(), b(), Strategy::Sequential) });
    assert!(sequential.is_ok());
}

#[test]
fn test_pools_dropped_inside_async_runtime() {
    let runtime = tokio::runtime::Builder::new_current_thread().build().unwrap();

    let product = runtime.block_on(async {
        let context = DispatchContext::new(WorkerPool::new(2)?, 1)?;
        let product = matrix::multiply(&context, a(), b(), Strategy::Sequential)?;

        context.set_worker_pool(WorkerPool::new(3)?);
        assert_eq!(context.worker_pool().threads(), 3);

        drop(context);
        drop(WorkerPool::new(1)?);
        Ok::<Matrix, Error>(product)
    });

    assert_eq!(product, Matrix::from_rows(vec![vec![5, 1], vec![4, 2]]));
}

#[test]
fn test_reconfiguration_between_calls() {
    let context = context(1, 1);
    let m = Generator::new(3).matrix(12, 12).unwrap();
    let baseline = matrix::multiply(&context, m.clone(), m.clone(), Strategy::Semaphore).unwrap();

    context.set_worker_pool(WorkerPool::new(6).unwrap());
    context.set_admission_permits(4).unwrap();
    assert_eq!(context.worker_pool().threads(), 6);
    assert_eq!(context.admission_permits(), 4);

    for strategy in Strategy::ALL {
        assert_eq!(matrix::multiply(&context, m.clone(), m.clone(), strategy), Ok(baseline.clone()));
    }
}

#[test]
fn test_in_flight_snapshot_survives_reconfiguration() {
    let context = Arc::new(context(2, 1));
    let m = Generator::new(5).matrix(40, 40).unwrap();
    let baseline = matrix::multiply(&context, m.clone(), m.clone(), Strategy::Sequential).unwrap();

    thread::scope(|scope| {
        let worker = scope.spawn(|| {
            (0..5)
                .map(|_| matrix::multiply(&context, m.clone(), m.clone(), Strategy::Semaphore))
                .collect::<Vec<_>>()
        });

        for permits in 1..=5 {
            context.set_admission_permits(permits).unwrap();
            context.set_worker_pool(WorkerPool::new(permits).unwrap());
        }

        for product in worker.join().unwrap() {
            assert_eq!(product, Ok(baseline.clone()));
        }
    });
}

#[test]
fn test_invalid_configuration() {
    assert!(matches!(WorkerPool::new(0), Err(Error::InvalidConfiguration(_))));
    assert!(matches!(
        DispatchContext::new(WorkerPool::new(1).unwrap(), 0),
        Err(Error::InvalidConfiguration(_))
    ));

    let context = context(1, 3);
    assert!(matches!(context.set_admission_permits(0), Err(Error::InvalidConfiguration(_))));
    assert!(matches!(
        context.set_admission_permits(usize::MAX),
        Err(Error::InvalidConfiguration(_))
    ));
    assert_eq!(context.admission_permits(), 3);

    for permits in [1, 10, 100, Semaphore::MAX_PERMITS] {
        assert!(context.set_admission_permits(permits).is_ok());
    }
}

#[test]
fn test_common_pool_is_shared() {
    let first = WorkerPool::common().unwrap();
    let second = WorkerPool::common().unwrap();
    assert_eq!(first.threads(), second.threads());
    assert!(first.threads() >= 1);

    let context = DispatchContext::common().unwrap();
    assert_eq!(context.admission_permits(), matrix::default_admission_permits());
}

#[test]
fn test_strategy_names_round_trip() {
    for strategy in Strategy::ALL {
        assert_eq!(strategy.name().parse::<Strategy>(), Ok(strategy));
    }
    assert_eq!("LATCH".parse::<Strategy>(), Ok(Strategy::Latch));
    assert!(matches!("fork-join".parse::<Strategy>(), Err(Error::InvalidConfiguration(_))));
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(32))]

    #[test]
    fn prop_strategies_agree(rows in 1usize..10, inner in 1usize..10, seed in any::<u64>()) {
        let context = context(3, 2);
        let mut generator = Generator::new(seed);
        let m1 = Arc::new(generator.matrix(rows, inner).unwrap());
        let m2 = Arc::new(generator.matrix(inner, rows).unwrap());

        let baseline = matrix::multiply(&context, Arc::clone(&m1), Arc::clone(&m2), Strategy::Sequential).unwrap();
        prop_assert_eq!(baseline.row_count(), rows);
        prop_assert_eq!(baseline.column_count(), rows);

        for strategy in Strategy::ALL {
            let product = matrix::multiply(&context, Arc::clone(&m1), Arc::clone(&m2), strategy).unwrap();
            prop_assert_eq!(&product, &baseline);
        }
    }
}
