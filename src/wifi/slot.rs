//! One-shot outcome slot.
//!
//! Each `begin` cycle arms the slot with a fresh generation. The event side
//! completes it at most once; any number of waiters, blocking or async, read
//! the value with a timeout. A completed value stays readable until the next
//! cycle arms the slot again, so late waiters never miss it.

use std::fmt;
use std::sync::{Condvar, Mutex, MutexGuard, PoisonError};
use std::time::{Duration, Instant};
use tokio::sync::Notify;

/// Why a wait returned without an outcome.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WaitError {
    /// The deadline elapsed first. The cycle keeps running.
    TimedOut,
    /// A newer cycle replaced the one this handle belongs to.
    Stale,
    /// The station was disconnected before the cycle finished.
    Closed,
}

impl fmt::Display for WaitError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::TimedOut => write!(f, "timed out waiting for connection outcome"),
            Self::Stale => write!(f, "connection attempt was superseded"),
            Self::Closed => write!(f, "station disconnected"),
        }
    }
}

impl std::error::Error for WaitError {}

#[derive(Debug)]
struct SlotState<T> {
    generation: u64,
    value: Option<T>,
    closed: bool,
}

impl<T: Clone> SlotState<T> {
    fn check(&self, generation: u64) -> Option<Result<T, WaitError>> {
        if generation != self.generation {
            return Some(Err(WaitError::Stale));
        }
        if let Some(value) = &self.value {
            return Some(Ok(value.clone()));
        }
        if self.closed {
            return Some(Err(WaitError::Closed));
        }
        None
    }
}

/// Promise-like slot completed once per generation.
#[derive(Debug)]
pub struct OutcomeSlot<T> {
    state: Mutex<SlotState<T>>,
    ready: Condvar,
    notify: Notify,
}

impl<T: Clone> Default for OutcomeSlot<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: Clone> OutcomeSlot<T> {
    /// Create an unarmed slot (generation 0, closed).
    pub fn new() -> Self {
        Self {
            state: Mutex::new(SlotState {
                generation: 0,
                value: None,
                closed: true,
            }),
            ready: Condvar::new(),
            notify: Notify::new(),
        }
    }

    /// Start a new generation, dropping any previous value.
    ///
    /// Waiters on older generations wake up with [`WaitError::Stale`].
    pub fn arm(&self) -> u64 {
        let generation = {
            let mut state = self.lock();
            state.generation += 1;
            state.value = None;
            state.closed = false;
            state.generation
        };
        self.wake_all();
        generation
    }

    /// Complete the current generation.
    ///
    /// Returns false if it was already completed or the slot is closed.
    pub fn complete(&self, value: T) -> bool {
        {
            let mut state = self.lock();
            if state.closed || state.value.is_some() {
                return false;
            }
            state.value = Some(value);
        }
        self.wake_all();
        true
    }

    /// Close the slot. Pending waiters of the current generation get
    /// [`WaitError::Closed`] unless a value was already published.
    pub fn close(&self) {
        self.lock().closed = true;
        self.wake_all();
    }

    /// Current generation.
    pub fn generation(&self) -> u64 {
        self.lock().generation
    }

    /// Non-blocking read of `generation`'s value.
    pub fn peek(&self, generation: u64) -> Option<T> {
        match self.lock().check(generation) {
            Some(Ok(value)) => Some(value),
            _ => None,
        }
    }

    /// Block until `generation` completes or `timeout` elapses.
    pub fn wait(&self, generation: u64, timeout: Duration) -> Result<T, WaitError> {
        let deadline = Instant::now().checked_add(timeout);
        let mut state = self.lock();

        loop {
            if let Some(result) = state.check(generation) {
                return result;
            }

            state = match deadline {
                Some(deadline) => {
                    let now = Instant::now();
                    if now >= deadline {
                        return Err(WaitError::TimedOut);
                    }
                    self.ready
                        .wait_timeout(state, deadline - now)
                        .unwrap_or_else(PoisonError::into_inner)
                        .0
                }
                None => self
                    .ready
                    .wait(state)
                    .unwrap_or_else(PoisonError::into_inner),
            };
        }
    }

    /// Async variant of [`wait`](Self::wait) for tokio callers.
    pub async fn wait_async(&self, generation: u64, timeout: Duration) -> Result<T, WaitError> {
        let deadline = tokio::time::Instant::now().checked_add(timeout);

        loop {
            // Register before checking so a completion in between is not lost
            let notified = self.notify.notified();
            tokio::pin!(notified);
            notified.as_mut().enable();

            let ready = self.lock().check(generation);
            if let Some(result) = ready {
                return result;
            }

            match deadline {
                Some(deadline) => {
                    if tokio::time::timeout_at(deadline, notified).await.is_err() {
                        return self
                            .lock()
                            .check(generation)
                            .unwrap_or(Err(WaitError::TimedOut));
                    }
                }
                None => notified.await,
            }
        }
    }

    fn lock(&self) -> MutexGuard<'_, SlotState<T>> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn wake_all(&self) {
        self.ready.notify_all();
        self.notify.notify_waiters();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::thread;

    #[test]
    fn test_value_visible_after_completion() {
        let slot = OutcomeSlot::new();
        let generation = slot.arm();
        assert!(slot.complete(7u32));
        assert_eq!(slot.wait(generation, Duration::ZERO), Ok(7));
        assert_eq!(slot.wait(generation, Duration::ZERO), Ok(7));
    }

    #[test]
    fn test_completes_only_once() {
        let slot = OutcomeSlot::new();
        let generation = slot.arm();
        assert!(slot.complete(1u32));
        assert!(!slot.complete(2));
        assert_eq!(slot.peek(generation), Some(1));
    }

    #[test]
    fn test_unarmed_slot_rejects_completion() {
        let slot = OutcomeSlot::<u32>::new();
        assert!(!slot.complete(1));
        assert_eq!(slot.generation(), 0);
    }

    #[test]
    fn test_timeout_then_later_value() {
        let slot = OutcomeSlot::new();
        let generation = slot.arm();
        assert_eq!(
            slot.wait(generation, Duration::from_millis(20)),
            Err(WaitError::TimedOut)
        );
        slot.complete(5u32);
        assert_eq!(slot.wait(generation, Duration::from_millis(20)), Ok(5));
    }

    #[test]
    fn test_waiter_wakes_on_completion() {
        let slot = Arc::new(OutcomeSlot::new());
        let generation = slot.arm();

        let waiter = {
            let slot = slot.clone();
            thread::spawn(move || slot.wait(generation, Duration::from_secs(5)))
        };
        thread::sleep(Duration::from_millis(20));
        slot.complete("done".to_string());

        assert_eq!(waiter.join().unwrap(), Ok("done".to_string()));
    }

    #[test]
    fn test_rearm_makes_old_generation_stale() {
        let slot = Arc::new(OutcomeSlot::new());
        let old = slot.arm();

        let waiter = {
            let slot = slot.clone();
            thread::spawn(move || slot.wait(old, Duration::from_secs(5)))
        };
        thread::sleep(Duration::from_millis(20));
        let new = slot.arm();

        assert_eq!(waiter.join().unwrap(), Err::<u32, _>(WaitError::Stale));
        assert_ne!(old, new);
        assert_eq!(slot.peek(new), None);
    }

    #[test]
    fn test_close_wakes_waiters() {
        let slot = Arc::new(OutcomeSlot::<u32>::new());
        let generation = slot.arm();

        let waiter = {
            let slot = slot.clone();
            thread::spawn(move || slot.wait(generation, Duration::from_secs(5)))
        };
        thread::sleep(Duration::from_millis(20));
        slot.close();

        assert_eq!(waiter.join().unwrap(), Err(WaitError::Closed));
        assert!(!slot.complete(1));
    }

    #[test]
    fn test_close_keeps_published_value() {
        let slot = OutcomeSlot::new();
        let generation = slot.arm();
        slot.complete(3u32);
        slot.close();
        assert_eq!(slot.wait(generation, Duration::ZERO), Ok(3));
    }

    #[test]
    fn test_unbounded_timeout() {
        let slot = Arc::new(OutcomeSlot::new());
        let generation = slot.arm();
        let waiter = {
            let slot = slot.clone();
            thread::spawn(move || slot.wait(generation, Duration::MAX))
        };
        thread::sleep(Duration::from_millis(20));
        slot.complete(9u32);
        assert_eq!(waiter.join().unwrap(), Ok(9));
    }

    #[tokio::test]
    async fn test_async_wait_completes() {
        let slot = Arc::new(OutcomeSlot::new());
        let generation = slot.arm();

        let completer = {
            let slot = slot.clone();
            tokio::spawn(async move {
                tokio::time::sleep(Duration::from_millis(20)).await;
                slot.complete(11u32);
            })
        };

        assert_eq!(
            slot.wait_async(generation, Duration::from_secs(5)).await,
            Ok(11)
        );
        completer.await.unwrap();
    }

    #[tokio::test]
    async fn test_async_wait_times_out() {
        let slot = OutcomeSlot::<u32>::new();
        let generation = slot.arm();
        assert_eq!(
            slot.wait_async(generation, Duration::from_millis(20)).await,
            Err(WaitError::TimedOut)
        );
    }
}
