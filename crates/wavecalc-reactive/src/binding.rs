//! Derivations bound to parameters.
//!
//! [`bind`] registers a derivation as a watcher on a [`ParamSet`]. Every run
//! happens inside a `compute` span, clears the session's [`ErrorContext`]
//! first, and turns any failure (including a panic) into an error record
//! instead of unwinding into the caller.

use std::any::Any;
use std::panic::{self, AssertUnwindSafe};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use thiserror::Error;
use tokio::sync::watch;
use tracing::field;
use wavecalc_common::WavecalcError;

use crate::error_context::ErrorContext;
use crate::param::{ParamError, ParamSet, ParamSnapshot, WatcherId};

#[derive(Debug, Clone, PartialEq, Error)]
pub enum ComputeError {
    #[error(transparent)]
    Param(#[from] ParamError),

    #[error("{0}")]
    Failed(String),

    #[error("Derivation panicked: {0}")]
    Panicked(String),
}

impl ComputeError {
    /// Short machine-readable tag stored as the error record's type.
    pub fn kind(&self) -> &'static str {
        match self {
            ComputeError::Param(_) => "PARAM_ERROR",
            ComputeError::Failed(_) => "COMPUTE_ERROR",
            ComputeError::Panicked(_) => "PANIC",
        }
    }
}

impl From<WavecalcError> for ComputeError {
    fn from(err: WavecalcError) -> Self {
        ComputeError::Failed(err.to_string())
    }
}

/// Latest output of a bound derivation. `None` until the first success and
/// after any failed run.
pub struct Derived<T> {
    name: &'static str,
    output: Arc<watch::Sender<Option<T>>>,
    runs: Arc<AtomicU64>,
    watcher: WatcherId,
}

impl<T> Clone for Derived<T> {
    fn clone(&self) -> Self {
        Self {
            name: self.name,
            output: self.output.clone(),
            runs: self.runs.clone(),
            watcher: self.watcher,
        }
    }
}

impl<T> std::fmt::Debug for Derived<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Derived")
            .field("name", &self.name)
            .field("runs", &self.recomputations())
            .finish()
    }
}

impl<T: Clone> Derived<T> {
    pub fn get(&self) -> Option<T> {
        self.output.borrow().clone()
    }
}

impl<T> Derived<T> {
    pub fn name(&self) -> &'static str {
        self.name
    }

    pub fn subscribe(&self) -> watch::Receiver<Option<T>> {
        self.output.subscribe()
    }

    /// Number of times the derivation has run, including the initial run.
    pub fn recomputations(&self) -> u64 {
        self.runs.load(Ordering::Relaxed)
    }

    pub fn watcher_id(&self) -> WatcherId {
        self.watcher
    }
}

struct Recompute<T, F> {
    name: &'static str,
    derive: F,
    errors: ErrorContext,
    output: Arc<watch::Sender<Option<T>>>,
    runs: Arc<AtomicU64>,
}

impl<T, F> Recompute<T, F>
where
    F: Fn(&ParamSnapshot) -> Result<T, ComputeError>,
{
    fn run(&self, snapshot: &ParamSnapshot) {
        let span = tracing::info_span!(
            "compute",
            binding = self.name,
            params = %snapshot,
            otel.status_code = field::Empty,
            exception.message = field::Empty,
        );
        let _enter = span.enter();

        self.runs.fetch_add(1, Ordering::Relaxed);
        self.errors.clear();

        let outcome = panic::catch_unwind(AssertUnwindSafe(|| (self.derive)(snapshot)))
            .unwrap_or_else(|payload| Err(ComputeError::Panicked(panic_message(payload))));

        match outcome {
            Ok(value) => {
                self.output.send_replace(Some(value));
            }
            Err(err) => {
                tracing::warn!(binding = self.name, error = %err, "derivation failed");
                self.errors.set(err.kind(), err.to_string(), Some(&span));
                self.output.send_replace(None);
            }
        }
    }
}

fn panic_message(payload: Box<dyn Any + Send>) -> String {
    if let Some(msg) = payload.downcast_ref::<&str>() {
        msg.to_string()
    } else if let Some(msg) = payload.downcast_ref::<String>() {
        msg.clone()
    } else {
        "unknown panic payload".to_string()
    }
}

/// Bind `derive` to `deps`: run it now, then again synchronously whenever one
/// of `deps` changes. Failures land in `errors`.
pub fn bind<T, F>(
    params: &mut ParamSet,
    name: &'static str,
    deps: &[&str],
    errors: &ErrorContext,
    derive: F,
) -> Result<Derived<T>, ParamError>
where
    T: Send + Sync + 'static,
    F: Fn(&ParamSnapshot) -> Result<T, ComputeError> + Send + 'static,
{
    for dep in deps {
        params.get(dep)?;
    }

    let (tx, _) = watch::channel(None);
    let output = Arc::new(tx);
    let runs = Arc::new(AtomicU64::new(0));

    let recompute = Recompute {
        name,
        derive,
        errors: errors.clone(),
        output: output.clone(),
        runs: runs.clone(),
    };
    recompute.run(&params.snapshot());

    let watcher = params.watch(deps, move |snapshot| recompute.run(snapshot))?;
    Ok(Derived { name, output, runs, watcher })
}
