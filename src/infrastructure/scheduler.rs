// Recurring refresh timer behind a start/stop/reset interface
use std::future::Future;
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;

/// Owns at most one recurring timer task. `start` aborts any previous task
/// before spawning the next one, so a parameter change can never leave a
/// stale timer running against old inputs.
pub struct RefreshScheduler {
    task: Option<JoinHandle<()>>,
}

impl RefreshScheduler {
    pub fn new() -> Self {
        Self { task: None }
    }

    /// Start ticking `tick` every `period`. The first invocation happens
    /// one full period after start; callers issue their own immediate
    /// fetch if they want one.
    pub fn start<F, Fut>(&mut self, period: Duration, mut tick: F)
    where
        F: FnMut() -> Fut + Send + 'static,
        Fut: Future<Output = ()> + Send,
    {
        self.stop();
        self.task = Some(tokio::spawn(async move {
            let mut timer = tokio::time::interval(period);
            timer.set_missed_tick_behavior(MissedTickBehavior::Delay);
            // interval fires immediately on the first tick; skip it.
            timer.tick().await;
            loop {
                timer.tick().await;
                tick().await;
            }
        }));
    }

    /// Abort the current timer task, if any.
    pub fn stop(&mut self) {
        if let Some(task) = self.task.take() {
            task.abort();
        }
    }

    /// Replace the current schedule with a new one. Equivalent to
    /// stop-then-start; kept separate to make call sites read as intent.
    pub fn reset<F, Fut>(&mut self, period: Duration, tick: F)
    where
        F: FnMut() -> Fut + Send + 'static,
        Fut: Future<Output = ()> + Send,
    {
        self.start(period, tick);
    }

    pub fn is_running(&self) -> bool {
        self.task.as_ref().map(|t| !t.is_finished()).unwrap_or(false)
    }
}

impl Default for RefreshScheduler {
    fn default() -> Self {
        Self::new()
    }
}

impl Drop for RefreshScheduler {
    fn drop(&mut self) {
        self.stop();
    }
}
