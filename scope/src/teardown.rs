use crate::BoxError;
use futures::{FutureExt, future::BoxFuture};
use std::{any::Any, panic::AssertUnwindSafe};

pub(crate) type TeardownFn =
    Box<dyn FnOnce() -> BoxFuture<'static, Result<(), BoxError>> + Send + 'static>;

/// Failures collected while releasing a scope.
///
/// Every callback is attempted even when an earlier one fails; this error is
/// only produced once all of them have run.
#[derive(thiserror::Error, Debug)]
#[error("{}", summarize(.failures))]
pub struct TeardownError {
    failures: Vec<BoxError>,
}

fn summarize(failures: &[BoxError]) -> String {
    match failures {
        [] => "teardown failed".to_string(),
        [only] => format!("teardown callback failed: {only}"),
        [first, ..] => {
            format!(
                "{} teardown callbacks failed, first: {first}",
                failures.len()
            )
        },
    }
}

impl TeardownError {
    pub(crate) fn from_failures(failures: Vec<BoxError>) -> Option<Self> {
        if failures.is_empty() {
            None
        } else {
            Some(Self { failures })
        }
    }

    pub fn failures(&self) -> &[BoxError] {
        &self.failures
    }

    pub fn len(&self) -> usize {
        self.failures.len()
    }

    pub fn is_empty(&self) -> bool {
        self.failures.is_empty()
    }
}

pub(crate) fn panic_message(panic: &(dyn Any + Send)) -> String {
    if let Some(message) = panic.downcast_ref::<&str>() {
        message.to_string()
    } else if let Some(message) = panic.downcast_ref::<String>() {
        message.clone()
    } else {
        "non-string panic payload".to_string()
    }
}

/// Runs callbacks last-registered first.
pub(crate) async fn release(
    scope_id: u64,
    callbacks: Vec<TeardownFn>,
) -> Result<(), TeardownError> {
    let mut failures: Vec<BoxError> = Vec::new();

    for (position, callback) in callbacks
        .into_iter()
        .rev()
        .enumerate()
    {
        let outcome = AssertUnwindSafe(async move { callback().await })
            .catch_unwind()
            .await;

        match outcome {
            Ok(Ok(())) => {},
            Ok(Err(err)) => {
                tracing::warn!(scope = scope_id, position, "teardown callback failed: {err}");
                failures.push(err);
            },
            Err(panic) => {
                let message = panic_message(panic.as_ref());
                tracing::warn!(scope = scope_id, position, "teardown callback panicked: {message}");
                failures.push(format!("teardown callback panicked: {message}").into());
            },
        }
    }

    match TeardownError::from_failures(failures) {
        Some(err) => Err(err),
        None => Ok(()),
    }
}
