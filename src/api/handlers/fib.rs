//! Fibonacci endpoint

use axum::extract::Query;
use rand::Rng;
use serde::Deserialize;
use tracing::info;

use crate::error::{AppError, Result};

/// Largest n whose Fibonacci number fits in a u64
pub const MAX_N: u32 = 93;

/// Upper bound (exclusive) for randomly chosen n
const RANDOM_BOUND: u32 = 45;

#[derive(Debug, Deserialize, Default)]
pub struct FibQuery {
    pub n: Option<u32>,
}

/// `GET /fib` - Fibonacci of `?n=` or of a random n in [0, 45)
pub async fn fibonacci(Query(query): Query<FibQuery>) -> Result<String> {
    let n = match query.n {
        Some(n) if n > MAX_N => {
            return Err(AppError::InvalidRequest(format!(
                "n must be at most {}",
                MAX_N
            )))
        }
        Some(n) => n,
        None => rand::thread_rng().gen_range(0..RANDOM_BOUND),
    };

    info!("Fibonacci number for: {}", n);
    Ok(format!("{}\n", fib(n)))
}

/// Iterative Fibonacci; fib(0) = 0, fib(1) = 1
pub fn fib(n: u32) -> u64 {
    if n <= 1 {
        return n as u64;
    }
    let (mut a, mut b) = (0u64, 1u64);
    for _ in 2..=n {
        (a, b) = (b, a + b);
    }
    b
}
