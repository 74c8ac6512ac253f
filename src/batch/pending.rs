//! Handles for batches that may still be running.

use crate::error::{ErrorCode, PoseidonResult};
use futures::channel::oneshot;
use futures::executor::block_on;
use std::future::Future;
use std::pin::Pin;
use std::task::{Context, Poll};

/// A batch running in the background.
///
/// Resolves to the output buffer once every instance has been hashed. It can
/// be awaited from an async runtime or waited on with [`PendingHash::wait`].
#[derive(Debug)]
#[must_use = "the output buffer is only returned through the pending handle"]
pub struct PendingHash<O> {
    receiver: oneshot::Receiver<PoseidonResult<O>>,
}

impl<O> PendingHash<O> {
    pub(crate) fn new(receiver: oneshot::Receiver<PoseidonResult<O>>) -> Self {
        Self { receiver }
    }

    /// Block the current thread until the batch completes.
    pub fn wait(self) -> PoseidonResult<O> {
        block_on(self)
    }

    /// Return the result if the batch already finished.
    pub fn try_take(&mut self) -> PoseidonResult<Option<O>> {
        match self.receiver.try_recv() {
            Ok(Some(result)) => result.map(Some),
            Ok(None) => Ok(None),
            Err(oneshot::Canceled) => Err(worker_lost()),
        }
    }
}

impl<O> Future for PendingHash<O> {
    type Output = PoseidonResult<O>;

    fn poll(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        match Pin::new(&mut self.receiver).poll(cx) {
            Poll::Ready(Ok(result)) => Poll::Ready(result),
            Poll::Ready(Err(oneshot::Canceled)) => Poll::Ready(Err(worker_lost())),
            Poll::Pending => Poll::Pending,
        }
    }
}

fn worker_lost() -> ErrorCode {
    ErrorCode::ExecutionFailure("batch worker exited without a result".to_string())
}

/// Outcome of submitting a batch over owned buffers.
#[derive(Debug)]
#[must_use = "the output buffer is only returned through the submission"]
pub enum Submission<O> {
    /// The batch ran to completion before returning.
    Ready(O),
    /// The batch is still running.
    Pending(PendingHash<O>),
}

impl<O> Submission<O> {
    /// Whether the batch has already completed.
    pub fn is_ready(&self) -> bool {
        matches!(self, Submission::Ready(_))
    }

    /// The output buffer, blocking if the batch is still running.
    pub fn wait(self) -> PoseidonResult<O> {
        match self {
            Submission::Ready(output) => Ok(output),
            Submission::Pending(pending) => pending.wait(),
        }
    }
}
