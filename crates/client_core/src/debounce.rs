use std::{future::Future, time::Duration};

use tokio::task::JoinHandle;

pub const DEFAULT_SEARCH_DEBOUNCE: Duration = Duration::from_millis(300);

/// Trailing-edge timer with at most one live handle.
#[derive(Debug, Default)]
pub struct DebounceTimer {
    pending: Option<JoinHandle<()>>,
    armed: u64,
}

impl DebounceTimer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn arm<F, Fut>(&mut self, delay: Duration, action: F) -> u64
    where
        F: FnOnce(u64) -> Fut + Send + 'static,
        Fut: Future<Output = ()> + Send + 'static,
    {
        self.cancel();
        self.armed += 1;
        let token = self.armed;
        self.pending = Some(tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            action(token).await;
        }));
        token
    }

    pub fn cancel(&mut self) -> bool {
        match self.pending.take() {
            Some(handle) => {
                let was_pending = !handle.is_finished();
                handle.abort();
                was_pending
            }
            None => false,
        }
    }

    pub fn is_pending(&self) -> bool {
        self.pending
            .as_ref()
            .is_some_and(|handle| !handle.is_finished())
    }

    /// Releases the slot for a firing action. `false` means the token was
    /// superseded and the action must not run.
    pub fn disarm_if_current(&mut self, token: u64) -> bool {
        if self.armed != token || self.pending.is_none() {
            return false;
        }
        // Dropping the handle detaches the task; it is the caller.
        self.pending = None;
        true
    }
}

impl Drop for DebounceTimer {
    fn drop(&mut self) {
        self.cancel();
    }
}

#[cfg(test)]
mod tests {
    use std::sync::{
        atomic::{AtomicU64, Ordering},
        Arc,
    };

    use super::*;

    #[tokio::test(start_paused = true)]
    async fn only_last_armed_action_fires() {
        let fired = Arc::new(AtomicU64::new(0));
        let mut timer = DebounceTimer::new();

        for _ in 0..3 {
            let fired = Arc::clone(&fired);
            timer.arm(DEFAULT_SEARCH_DEBOUNCE, move |token| async move {
                fired.store(token, Ordering::SeqCst);
            });
            tokio::time::sleep(Duration::from_millis(100)).await;
        }
        assert!(timer.is_pending());

        tokio::time::sleep(Duration::from_millis(400)).await;
        assert_eq!(fired.load(Ordering::SeqCst), 3);
        assert!(!timer.is_pending());
    }

    #[tokio::test(start_paused = true)]
    async fn cancel_prevents_firing() {
        let fired = Arc::new(AtomicU64::new(0));
        let mut timer = DebounceTimer::new();
        let flag = Arc::clone(&fired);
        timer.arm(DEFAULT_SEARCH_DEBOUNCE, move |token| async move {
            flag.store(token, Ordering::SeqCst);
        });

        assert!(timer.cancel());
        assert!(!timer.cancel());
        tokio::time::sleep(Duration::from_secs(1)).await;
        assert_eq!(fired.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn stale_token_is_not_current() {
        let mut timer = DebounceTimer::new();
        assert!(!timer.disarm_if_current(0));
        timer.armed = 2;
        assert!(!timer.disarm_if_current(1));
    }
}
