//! Debounced persistence
//!
//! Coalesces bursts of save requests into at most one physical write per
//! interval. A request that lands inside the window schedules exactly one
//! trailing write; later requests in the same window are absorbed and picked
//! up by that trailing write, which always persists whatever is in memory
//! when it fires.

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::Mutex;
use tokio::time::Instant;

use crate::error::StoreError;

/// Deferred save run by a trailing write
///
/// Implementors acquire whatever locks they need at fire time.
#[async_trait]
pub trait SaveAction: Send + Sync + 'static {
    async fn save(&self) -> Result<(), StoreError>;
}

/// Receives failures of trailing writes, which have no caller to return to
pub type SaveErrorSink = Arc<dyn Fn(&StoreError) + Send + Sync>;

/// Default sink: log and move on
pub fn log_save_errors() -> SaveErrorSink {
    Arc::new(|err| tracing::error!("Trailing save failed, state stays dirty: {}", err))
}

/// What happened to a save request
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SaveOutcome {
    /// Written synchronously
    Written,
    /// Deferred to a newly scheduled trailing write
    Scheduled,
    /// Folded into the trailing write already pending
    Absorbed,
}

#[derive(Debug, Default)]
struct SaverState {
    /// When the most recent physical write completed (immediate) or started
    /// (trailing)
    last_run: Option<Instant>,
    trailing_scheduled: bool,
}

/// Rate limiter for physical writes to a backing medium
#[derive(Clone)]
pub struct DebouncedSaver {
    interval: Duration,
    state: Arc<Mutex<SaverState>>,
    sink: SaveErrorSink,
}

impl DebouncedSaver {
    pub fn new(interval: Duration, sink: SaveErrorSink) -> Self {
        Self {
            interval,
            state: Arc::new(Mutex::new(SaverState::default())),
            sink,
        }
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }

    /// Request a save.
    ///
    /// `immediate` is only polled when the interval since the last write has
    /// elapsed; its error propagates and leaves the last-write time untouched
    /// so the next request tries a real write again. Otherwise `trailing` is
    /// scheduled to run once the window closes, unless a trailing write is
    /// already pending, in which case the request is absorbed.
    pub async fn request_save<F>(
        &self,
        immediate: F,
        trailing: Arc<dyn SaveAction>,
    ) -> Result<SaveOutcome, StoreError>
    where
        F: Future<Output = Result<(), StoreError>>,
    {
        // Held across the immediate write so concurrent requests observe it
        let mut state = self.state.lock().await;

        if state.trailing_scheduled {
            return Ok(SaveOutcome::Absorbed);
        }

        let now = Instant::now();
        match state.last_run {
            Some(last) if now.saturating_duration_since(last) < self.interval => {
                let wait = self.interval - now.saturating_duration_since(last);
                state.trailing_scheduled = true;
                self.spawn_trailing(wait, trailing);
                tracing::debug!("Save deferred by {:?}", wait);
                Ok(SaveOutcome::Scheduled)
            }
            _ => {
                immediate.await?;
                state.last_run = Some(Instant::now());
                Ok(SaveOutcome::Written)
            }
        }
    }

    /// Run `action` now regardless of the window, recording it as a write.
    pub async fn force<F>(&self, action: F) -> Result<(), StoreError>
    where
        F: Future<Output = Result<(), StoreError>>,
    {
        let mut state = self.state.lock().await;
        action.await?;
        state.last_run = Some(Instant::now());
        Ok(())
    }

    pub async fn is_trailing_scheduled(&self) -> bool {
        self.state.lock().await.trailing_scheduled
    }

    fn spawn_trailing(&self, wait: Duration, action: Arc<dyn SaveAction>) {
        let state = Arc::clone(&self.state);
        let sink = Arc::clone(&self.sink);

        tokio::spawn(async move {
            tokio::time::sleep(wait).await;

            // Reopen scheduling before the action reads any state: a request
            // landing while it runs schedules the next trailing write
            {
                let mut state = state.lock().await;
                state.last_run = Some(Instant::now());
                state.trailing_scheduled = false;
            }

            // No retry: the data stays dirty and the next mutation saves again
            if let Err(err) = action.save().await {
                sink(&err);
            }
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::MediumError;
    use crate::store::TableName;
    use std::sync::atomic::{AtomicUsize, Ordering};

    const INTERVAL: Duration = Duration::from_secs(10);

    #[derive(Default)]
    struct CountingAction {
        calls: AtomicUsize,
        fail: bool,
    }

    #[async_trait]
    impl SaveAction for CountingAction {
        async fn save(&self) -> Result<(), StoreError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if self.fail {
                return Err(unavailable());
            }
            Ok(())
        }
    }

    fn unavailable() -> StoreError {
        StoreError::MediumUnavailable {
            table: TableName::Orders,
            source: MediumError::Api {
                status: 500,
                message: "boom".to_string(),
            },
        }
    }

    fn saver() -> DebouncedSaver {
        DebouncedSaver::new(INTERVAL, log_save_errors())
    }

    async fn counted(counter: &AtomicUsize) -> Result<(), StoreError> {
        counter.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    #[tokio::test(start_paused = true)]
    async fn test_first_request_writes_immediately() {
        let saver = saver();
        let immediate = AtomicUsize::new(0);
        let trailing = Arc::new(CountingAction::default());

        let outcome = saver
            .request_save(counted(&immediate), trailing.clone())
            .await
            .unwrap();

        assert_eq!(outcome, SaveOutcome::Written);
        assert_eq!(immediate.load(Ordering::SeqCst), 1);
        assert!(!saver.is_trailing_scheduled().await);
    }

    #[tokio::test(start_paused = true)]
    async fn test_burst_collapses_into_one_trailing_write() {
        let saver = saver();
        let immediate = AtomicUsize::new(0);
        let trailing = Arc::new(CountingAction::default());

        saver
            .request_save(counted(&immediate), trailing.clone())
            .await
            .unwrap();

        tokio::time::sleep(Duration::from_secs(2)).await;
        let second = saver
            .request_save(counted(&immediate), trailing.clone())
            .await
            .unwrap();
        assert_eq!(second, SaveOutcome::Scheduled);

        for _ in 0..5 {
            let outcome = saver
                .request_save(counted(&immediate), trailing.clone())
                .await
                .unwrap();
            assert_eq!(outcome, SaveOutcome::Absorbed);
        }

        // Immediate futures inside the window are dropped unpolled
        assert_eq!(immediate.load(Ordering::SeqCst), 1);
        assert_eq!(trailing.calls.load(Ordering::SeqCst), 0);

        tokio::time::sleep(Duration::from_secs(9)).await;
        assert_eq!(trailing.calls.load(Ordering::SeqCst), 1);
        assert!(!saver.is_trailing_scheduled().await);
    }

    #[tokio::test(start_paused = true)]
    async fn test_request_after_window_writes_immediately_again() {
        let saver = saver();
        let immediate = AtomicUsize::new(0);
        let trailing = Arc::new(CountingAction::default());

        saver
            .request_save(counted(&immediate), trailing.clone())
            .await
            .unwrap();
        tokio::time::sleep(INTERVAL).await;

        let outcome = saver
            .request_save(counted(&immediate), trailing.clone())
            .await
            .unwrap();
        assert_eq!(outcome, SaveOutcome::Written);
        assert_eq!(immediate.load(Ordering::SeqCst), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_failed_immediate_write_does_not_open_window() {
        let saver = saver();
        let trailing = Arc::new(CountingAction::default());

        let result = saver
            .request_save(async { Err::<(), _>(unavailable()) }, trailing.clone())
            .await;
        assert!(matches!(result, Err(StoreError::MediumUnavailable { .. })));

        let immediate = AtomicUsize::new(0);
        let outcome = saver
            .request_save(counted(&immediate), trailing.clone())
            .await
            .unwrap();
        assert_eq!(outcome, SaveOutcome::Written);
        assert_eq!(immediate.load(Ordering::SeqCst), 1);
    }

    /// Trailing action that parks on its first run until released
    #[derive(Default)]
    struct GatedAction {
        calls: AtomicUsize,
        started: tokio::sync::Notify,
        release: tokio::sync::Notify,
    }

    #[async_trait]
    impl SaveAction for GatedAction {
        async fn save(&self) -> Result<(), StoreError> {
            if self.calls.fetch_add(1, Ordering::SeqCst) == 0 {
                self.started.notify_one();
                self.release.notified().await;
            }
            Ok(())
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_request_during_trailing_write_schedules_another() {
        let saver = saver();
        let trailing = Arc::new(GatedAction::default());

        saver.force(async { Ok::<(), StoreError>(()) }).await.unwrap();
        let outcome = saver
            .request_save(async { Ok::<(), StoreError>(()) }, trailing.clone())
            .await
            .unwrap();
        assert_eq!(outcome, SaveOutcome::Scheduled);

        // The first trailing write is running and has read its state
        trailing.started.notified().await;

        let immediate = AtomicUsize::new(0);
        let outcome = saver
            .request_save(counted(&immediate), trailing.clone())
            .await
            .unwrap();
        assert_eq!(outcome, SaveOutcome::Scheduled);
        assert_eq!(immediate.load(Ordering::SeqCst), 0);

        trailing.release.notify_one();
        tokio::time::sleep(INTERVAL + Duration::from_secs(1)).await;

        assert_eq!(trailing.calls.load(Ordering::SeqCst), 2);
        assert!(!saver.is_trailing_scheduled().await);
    }

    #[tokio::test(start_paused = true)]
    async fn test_trailing_failure_reaches_sink() {
        let failures = Arc::new(std::sync::Mutex::new(Vec::new()));
        let recorded = failures.clone();
        let sink: SaveErrorSink = Arc::new(move |err: &StoreError| {
            recorded.lock().unwrap().push(err.to_string());
        });
        let saver = DebouncedSaver::new(INTERVAL, sink);
        let trailing = Arc::new(CountingAction {
            calls: AtomicUsize::new(0),
            fail: true,
        });

        saver.force(async { Ok::<(), StoreError>(()) }).await.unwrap();
        let outcome = saver
            .request_save(async { Ok::<(), StoreError>(()) }, trailing.clone())
            .await
            .unwrap();
        assert_eq!(outcome, SaveOutcome::Scheduled);

        tokio::time::sleep(INTERVAL + Duration::from_secs(1)).await;

        assert_eq!(trailing.calls.load(Ordering::SeqCst), 1);
        assert_eq!(failures.lock().unwrap().len(), 1);
        // The window resets even after a failed trailing write
        assert!(!saver.is_trailing_scheduled().await);
    }
}
