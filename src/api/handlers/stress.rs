//! Synthetic task/memory stress endpoint

use std::time::{Duration, Instant};

use axum::extract::{Query, State};
use axum::response::IntoResponse;
use axum::Json;
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::api::server::AppState;
use crate::error::{AppError, Result};

const DEFAULT_TASKS: usize = 100;
const DEFAULT_KB: usize = 64;
const MAX_KB: usize = 1024;
const DEFAULT_HOLD_MS: u64 = 100;
const MAX_HOLD_MS: u64 = 10_000;

#[derive(Debug, Deserialize, Default)]
pub struct StressQuery {
    pub tasks: Option<usize>,
    pub kb: Option<usize>,
    pub hold_ms: Option<u64>,
}

#[derive(Debug, Serialize, Deserialize, PartialEq)]
pub struct StressReport {
    pub tasks: usize,
    pub bytes_per_task: usize,
    pub total_bytes: usize,
    pub elapsed_ms: u64,
}

/// `GET /stress` - spawn `tasks` tasks that each hold a `kb` KiB buffer for `hold_ms`
pub async fn stress(
    State(state): State<AppState>,
    Query(query): Query<StressQuery>,
) -> Result<impl IntoResponse> {
    let tasks = query.tasks.unwrap_or(DEFAULT_TASKS);
    let kb = query.kb.unwrap_or(DEFAULT_KB);
    let hold_ms = query.hold_ms.unwrap_or(DEFAULT_HOLD_MS);

    let max_tasks = state.config.stress.max_tasks;
    if tasks == 0 || tasks > max_tasks {
        return Err(AppError::InvalidRequest(format!(
            "tasks must be between 1 and {}",
            max_tasks
        )));
    }
    if kb > MAX_KB {
        return Err(AppError::InvalidRequest(format!(
            "kb must be at most {}",
            MAX_KB
        )));
    }
    if hold_ms > MAX_HOLD_MS {
        return Err(AppError::InvalidRequest(format!(
            "hold_ms must be at most {}",
            MAX_HOLD_MS
        )));
    }

    info!(tasks, kb, hold_ms, "Starting stress run");
    let report = run_stress(tasks, kb * 1024, Duration::from_millis(hold_ms)).await?;
    info!(elapsed_ms = report.elapsed_ms, "Stress run finished");

    Ok(Json(report))
}

async fn run_stress(tasks: usize, bytes: usize, hold: Duration) -> Result<StressReport> {
    let start = Instant::now();

    let handles: Vec<_> = (0..tasks)
        .map(|i| {
            tokio::spawn(async move {
                let buffer = vec![(i % 251) as u8; bytes];
                tokio::time::sleep(hold).await;
                std::hint::black_box(buffer).len()
            })
        })
        .collect();

    let mut total_bytes = 0;
    for handle in handles {
        total_bytes += handle
            .await
            .map_err(|e| AppError::Internal(format!("stress task failed: {}", e)))?;
    }

    Ok(StressReport {
        tasks,
        bytes_per_task: bytes,
        total_bytes,
        elapsed_ms: start.elapsed().as_millis() as u64,
    })
}
