use std::env;
use std::sync::Arc;
use std::time::Instant;

use matrix::{DispatchContext, Strategy, WorkerPool, random};
use tracing::info;
use tracing_subscriber::EnvFilter;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let args: Vec<String> = env::args().collect();
    let mode = args.get(1).cloned().unwrap_or_else(|| "bench".to_string());
    let size: Option<usize> = args.get(2).map(|size| size.parse()).transpose()?;

    if let Ok(seed) = env::var("MATRIX_SEED") {
        random::set_seed(seed.parse()?);
    }
    info!(seed = random::seed(), "random generator seeded");

    match mode.as_str() {
        "multiply" => {
            let size = size.unwrap_or(matrix_mul::DEFAULT_SIZE);
            let strategy: Strategy = args.get(3).unwrap_or(&"pool".to_string()).parse()?;
            let context = context(args.get(4), args.get(5))?;

            let left = random::matrix(size, size)?;
            let right = random::matrix(size, size)?;

            println!(
                "Multiplying {}x{} matrices with {} threads and {} permits",
                size,
                size,
                context.worker_pool().threads(),
                context.admission_permits()
            );
            let (product, timing) = matrix_mul::bench::run_strategy(
                &context,
                &Arc::new(left),
                &Arc::new(right),
                strategy,
            )?;
            println!(
                "{}: {}x{} product in {:?}",
                timing.strategy,
                product.row_count(),
                product.column_count(),
                timing.elapsed
            );
        }
        "determinant" => {
            let size = size.unwrap_or(matrix_mul::DEFAULT_DETERMINANT_SIZE);
            let m = random::matrix(size, size)?;

            let started = Instant::now();
            let determinant = m.determinant()?;
            println!("Determinant of {}x{} matrix: {}", size, size, determinant);
            println!("Computed in {:?}", started.elapsed());
        }
        "bench" => {
            let size = size.unwrap_or(matrix_mul::DEFAULT_SIZE);
            let context = context(args.get(3), args.get(4))?;

            let left = random::matrix(size, size)?;
            let right = random::matrix(size, size)?;

            println!("Comparing strategies on {}x{} matrices", size, size);
            for timing in matrix_mul::bench::compare(&context, left, right)? {
                println!("  {:<12}{:?}", timing.strategy, timing.elapsed);
            }
            println!("All strategies agree.");
        }
        _ => {
            eprintln!("Unknown mode: {}", mode);
            eprintln!("Usage: {} <mode> <size> [args...]", args[0]);
            eprintln!("Modes:");
            eprintln!("  multiply <size> <strategy> [threads] [permits]  - Multiply two random matrices");
            eprintln!("  determinant <size>                              - Determinant of a random matrix (cost grows as size!)");
            eprintln!("  bench <size> [threads] [permits]                - Time every strategy (default)");
            eprintln!("Strategies: sequential, pool, latch, semaphore, common");
            eprintln!("Set MATRIX_SEED to replay a previous run.");
            std::process::exit(1);
        }
    }

    Ok(())
}

fn context(
    threads: Option<&String>,
    permits: Option<&String>,
) -> Result<DispatchContext, Box<dyn std::error::Error>> {
    let pool = match threads {
        Some(threads) => WorkerPool::new(threads.parse()?)?,
        None => WorkerPool::common()?,
    };
    let permits = match permits {
        Some(permits) => permits.parse()?,
        None => matrix::default_admission_permits(),
    };
    Ok(DispatchContext::new(pool, permits)?)
}
