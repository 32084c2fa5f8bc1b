use std::time::Duration;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio::time::{sleep_until, Instant};

/// Delays search text until typing pauses.
///
/// Each [`input`](Self::input) aborts the pending timer task and starts a new
/// one, so only the last text of a burst is ever delivered. Dropping the
/// debouncer aborts the timer, so nothing fires after teardown.
pub struct SearchDebouncer {
    delay: Duration,
    pending: Option<JoinHandle<()>>,
    tx: mpsc::UnboundedSender<String>,
    rx: mpsc::UnboundedReceiver<String>,
}

impl SearchDebouncer {
    pub fn new(delay: Duration) -> Self {
        let (tx, rx) = mpsc::unbounded_channel();
        Self {
            delay,
            pending: None,
            tx,
            rx,
        }
    }

    pub fn delay(&self) -> Duration {
        self.delay
    }

    /// Restart the timer with new text. Must be called inside a tokio runtime.
    pub fn input(&mut self, text: impl Into<String>) {
        self.cancel();

        // The deadline is fixed at the keystroke, not when the task first runs
        let deadline = Instant::now() + self.delay;
        let text = text.into();
        let tx = self.tx.clone();
        self.pending = Some(tokio::spawn(async move {
            sleep_until(deadline).await;
            let _ = tx.send(text);
        }));
    }

    /// Abort the running timer and discard anything it already delivered
    pub fn cancel(&mut self) {
        if let Some(handle) = self.pending.take() {
            handle.abort();
        }
        while self.rx.try_recv().is_ok() {}
    }

    pub fn is_pending(&self) -> bool {
        self.pending.is_some()
    }

    /// Wait for the current burst to settle. Never resolves while nothing is
    /// pending, which makes it safe to poll from a `select!` loop.
    pub async fn settled(&mut self) -> String {
        if self.pending.is_none() {
            return std::future::pending().await;
        }
        match self.rx.recv().await {
            Some(text) => {
                self.pending = None;
                text
            }
            // The sender half lives in `self`, so the channel cannot close
            None => std::future::pending().await,
        }
    }
}

impl Drop for SearchDebouncer {
    fn drop(&mut self) {
        if let Some(handle) = self.pending.take() {
            handle.abort();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::time::advance;
    use tokio_test::{assert_pending, assert_ready_eq, task};

    const DELAY: Duration = Duration::from_millis(500);

    /// Let spawned timer tasks observe the advanced clock
    async fn settle_tasks() {
        for _ in 0..4 {
            tokio::task::yield_now().await;
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_only_last_text_of_burst_is_delivered() {
        let mut debouncer = SearchDebouncer::new(DELAY);

        debouncer.input("a");
        advance(Duration::from_millis(200)).await;
        debouncer.input("ad");
        advance(Duration::from_millis(499)).await;
        debouncer.input("ada");

        assert_eq!(debouncer.settled().await, "ada");
        assert!(!debouncer.is_pending());
    }

    #[tokio::test(start_paused = true)]
    async fn test_not_ready_before_delay() {
        let mut debouncer = SearchDebouncer::new(DELAY);
        debouncer.input("ada");

        {
            let mut settled = task::spawn(debouncer.settled());
            assert_pending!(settled.poll());

            advance(Duration::from_millis(499)).await;
            settle_tasks().await;
            assert_pending!(settled.poll());

            advance(Duration::from_millis(1)).await;
            settle_tasks().await;
            assert_ready_eq!(settled.poll(), "ada".to_string());
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_cancel_discards_pending_text() {
        let mut debouncer = SearchDebouncer::new(DELAY);
        debouncer.input("ada");
        advance(DELAY).await;
        settle_tasks().await;

        // The timer already fired; cancel must still drop its text
        debouncer.cancel();
        assert!(!debouncer.is_pending());

        debouncer.input("b");
        assert_eq!(debouncer.settled().await, "b");
    }
}
