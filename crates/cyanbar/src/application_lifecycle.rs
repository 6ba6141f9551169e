//! Module concerned with the lifecycle of the daemon's long-running tasks.
//! Every task gets its own cancellation token, derived from one root token that is cancelled
//! on shutdown. The task group owns the join handles, so shutdown can wait for every task to finish.

use std::future::Future;

use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

/// A set of named tasks that are cancelled and joined together.
pub struct TaskGroup {
    root: CancellationToken,
    handles: Vec<(&'static str, JoinHandle<()>)>,
}

impl TaskGroup {
    pub fn new(root: CancellationToken) -> Self {
        TaskGroup { root, handles: Vec::new() }
    }

    /// Spawn a task, handing it a token that is cancelled when the group shuts down.
    pub fn spawn<F, Fut>(&mut self, name: &'static str, f: F)
    where
        F: FnOnce(CancellationToken) -> Fut,
        Fut: Future<Output = ()> + Send + 'static,
    {
        log::debug!("Starting task {}", name);
        let handle = tokio::spawn(f(self.root.child_token()));
        self.handles.push((name, handle));
    }

    /// Cancel every task and wait for all of them to finish.
    pub async fn shutdown(self) {
        self.root.cancel();
        for (name, handle) in self.handles {
            match handle.await {
                Ok(()) => log::debug!("Task {} finished", name),
                Err(err) => log::error!("Task {} failed: {:?}", name, err),
            }
        }
    }
}

/// Select in a loop, breaking once the given cancellation token is cancelled.
#[macro_export]
macro_rules! loop_select_cancellable {
    ($token:expr, $($content:tt)*) => {
        loop {
            tokio::select! {
                _ = $token.cancelled() => {
                    break;
                }
                $($content)*
            }
        }
    };
}
