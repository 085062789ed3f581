//! Curve tracing: validate, preprocess, plan, search, assemble.
//!
//! [`compute_curve`] is the single entry point. Searches for distinct
//! targets share nothing mutable, so they are spread over a scoped worker
//! pool; results are put back in job order before assembly, which makes
//! the output independent of the worker count.

pub mod assemble;
pub mod cancel;
pub mod partition;
pub mod point;
pub mod preprocess;
pub mod search;

pub use assemble::{Curve, CurveColumns};
pub use cancel::CancelToken;
pub use partition::Plan;
pub use point::{CurvePoint, PointDegradation, PointStatus};
pub use preprocess::Preprocessed;
pub use search::{Job, Outcome};

use std::sync::atomic::{AtomicUsize, Ordering};
use std::thread;
use std::time::Instant;

use ib_math::Matrix;
use tracing::{debug, error, info, warn};

use crate::config::{validate_config, validate_joint, CurveConfig};
use crate::error::{CurveError, CurveResult};
use crate::logging::{event_names, Stage};
use crate::solver::Solver;
use search::{Deadline, SearchContext};

/// Trace the information curve of `pxy` under `config`.
///
/// Validation and degenerate-input errors are raised before any solver
/// call. Points whose search ran out of budget are still returned, flagged
/// approximate; see [`Curve::require_exact`] for callers that cannot
/// accept them.
pub fn compute_curve<S: Solver + ?Sized>(
    pxy: &Matrix,
    config: &CurveConfig,
    solver: &S,
    cancel: &CancelToken,
) -> CurveResult<Curve> {
    let started = Instant::now();
    let deadline = config.request_timeout.map(Deadline::after);

    if let Err(e) = validate_config(config).and_then(|()| validate_joint(pxy)) {
        warn!(
            stage = %Stage::Validate,
            event = event_names::CURVE_REJECTED,
            error = %e,
            "request rejected"
        );
        return Err(e);
    }

    info!(
        stage = %Stage::Init,
        event = event_names::CURVE_STARTED,
        rows = pxy.rows(),
        cols = pxy.cols(),
        alpha = config.alpha,
        gamma = config.gamma,
        solver = solver.name(),
        "tracing curve"
    );

    let dist = preprocess::preprocess(pxy, config.gamma)?;
    debug!(
        stage = %Stage::Preprocess,
        event = event_names::BOUNDS_COMPUTED,
        hx = dist.hx,
        hgx = dist.hgx,
        ixy = dist.ixy,
        "bounds computed"
    );

    let plan = partition::plan(config, dist.hgx);
    let jobs: Vec<Job> = match &plan {
        Plan::Targets(targets) => targets.iter().copied().map(Job::Target).collect(),
        Plan::Betas(betas) => betas.iter().copied().map(Job::Beta).collect(),
    };
    debug!(
        stage = %Stage::Plan,
        event = event_names::PLAN_READY,
        jobs = jobs.len(),
        explicit = matches!(plan, Plan::Betas(_)),
        "plan ready"
    );

    let ctx = SearchContext::new(solver, pxy, &dist, config, cancel, deadline);
    let outcomes = match run_jobs(&ctx, &jobs, config.worker_count()) {
        Ok(outcomes) => outcomes,
        Err(e) => {
            if matches!(e, CurveError::Cancelled | CurveError::TimedOut(_)) {
                warn!(
                    stage = %Stage::Search,
                    event = event_names::CURVE_CANCELLED,
                    error = %e,
                    "curve aborted"
                );
            }
            return Err(e);
        }
    };

    let assembled = assemble::assemble(&dist, outcomes)?;
    let curve = Curve {
        gamma: config.gamma,
        alpha: config.alpha,
        display: config.display,
        solver: solver.name().to_string(),
        hx: dist.hx,
        hgx: dist.hgx,
        ixy: dist.ixy,
        points: assembled.points,
        degradations: assembled.degradations,
    };

    info!(
        stage = %Stage::Assemble,
        event = event_names::CURVE_FINISHED,
        points = curve.len(),
        approximate = curve.degradations.len(),
        elapsed_ms = started.elapsed().as_millis() as u64,
        "curve traced"
    );
    Ok(curve)
}

/// Run `jobs` on up to `workers` threads; outcomes come back in job order.
///
/// A fatal error in one worker (cancellation, timeout or panic) is returned
/// and the remaining workers stop before taking another job.
fn run_jobs<S: Solver + ?Sized>(
    ctx: &SearchContext<'_, S>,
    jobs: &[Job],
    workers: usize,
) -> CurveResult<Vec<Outcome>> {
    let workers = workers.clamp(1, jobs.len().max(1));
    if workers == 1 {
        return jobs.iter().map(|job| ctx.run(*job)).collect();
    }

    let next = AtomicUsize::new(0);
    let failed = CancelToken::new();
    let batches: Vec<CurveResult<Vec<(usize, Outcome)>>> = thread::scope(|s| {
        let handles: Vec<_> = (0..workers)
            .map(|_| {
                s.spawn(|| {
                    let mut done = Vec::new();
                    loop {
                        if failed.is_cancelled() {
                            break;
                        }
                        let idx = next.fetch_add(1, Ordering::Relaxed);
                        let Some(job) = jobs.get(idx) else { break };
                        match ctx.run(*job) {
                            Ok(outcome) => done.push((idx, outcome)),
                            Err(e) => {
                                failed.cancel();
                                return Err(e);
                            }
                        }
                    }
                    Ok(done)
                })
            })
            .collect();

        handles
            .into_iter()
            .map(|h| {
                h.join().unwrap_or_else(|_| {
                    error!(stage = %Stage::Search, "curve worker panicked");
                    Err(CurveError::Internal("curve worker panicked".to_string()))
                })
            })
            .collect()
    });

    let mut slots: Vec<Option<Outcome>> = vec![None; jobs.len()];
    for batch in batches {
        for (idx, outcome) in batch? {
            slots[idx] = Some(outcome);
        }
    }
    slots
        .into_iter()
        .enumerate()
        .map(|(idx, slot)| {
            slot.ok_or_else(|| CurveError::Internal(format!("job {idx} produced no outcome")))
        })
        .collect()
}
