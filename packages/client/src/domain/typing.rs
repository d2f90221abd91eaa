//! Typing signal debouncer.
//!
//! Derives START/STOP typing signals from raw keystroke activity. The pending
//! STOP is a deadline owned by the debouncer; the owner sleeps until
//! [`TypingDebouncer::deadline`] and then calls
//! [`TypingDebouncer::poll_expired`]. Because cancellation on send happens in
//! the same call that emits STOP, a send-triggered STOP and a timer-triggered
//! STOP can never both fire.

use std::time::Duration;

use tokio::time::Instant;

/// A typing signal to transmit
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TypingSignal {
    Start,
    Stop,
}

impl TypingSignal {
    pub fn is_typing(self) -> bool {
        matches!(self, Self::Start)
    }
}

#[derive(Debug, Clone)]
pub struct TypingDebouncer {
    idle: Duration,
    announced: bool,
    deadline: Option<Instant>,
}

impl TypingDebouncer {
    pub const DEFAULT_IDLE: Duration = Duration::from_millis(2_000);

    pub fn new(idle: Duration) -> Self {
        Self {
            idle,
            announced: false,
            deadline: None,
        }
    }

    /// Whether START has been emitted without a matching STOP
    pub fn is_announced(&self) -> bool {
        self.announced
    }

    /// When the pending STOP fires, if one is armed
    pub fn deadline(&self) -> Option<Instant> {
        self.deadline
    }

    /// Register keystroke activity at `now`; emits START on the first one.
    pub fn on_keystroke(&mut self, now: Instant) -> Option<TypingSignal> {
        self.deadline = Some(now + self.idle);
        if self.announced {
            return None;
        }
        self.announced = true;
        Some(TypingSignal::Start)
    }

    /// Emit STOP if the deadline has passed by `now`.
    pub fn poll_expired(&mut self, now: Instant) -> Option<TypingSignal> {
        match self.deadline {
            Some(deadline) if deadline <= now => {
                self.deadline = None;
                self.announced = false;
                Some(TypingSignal::Stop)
            }
            _ => None,
        }
    }

    /// Cancel the pending STOP and emit it immediately if START was announced.
    pub fn on_send(&mut self) -> Option<TypingSignal> {
        self.deadline = None;
        std::mem::take(&mut self.announced).then_some(TypingSignal::Stop)
    }
}

impl Default for TypingDebouncer {
    fn default() -> Self {
        Self::new(Self::DEFAULT_IDLE)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ms(value: u64) -> Duration {
        Duration::from_millis(value)
    }

    /// Fire every deadline up to `until_ms`, logging `(offset_ms, signal)`.
    fn expire_until(
        debouncer: &mut TypingDebouncer,
        t0: Instant,
        until_ms: u64,
        log: &mut Vec<(u64, TypingSignal)>,
    ) {
        while let Some(deadline) = debouncer.deadline() {
            if deadline > t0 + ms(until_ms) {
                break;
            }
            if let Some(signal) = debouncer.poll_expired(deadline) {
                log.push(((deadline - t0).as_millis() as u64, signal));
            }
        }
    }

    #[test]
    fn test_keystrokes_then_idle_emit_start_and_one_stop() {
        // テスト項目: t=0 と t=500ms の入力後は START 1 回、t=2500ms に STOP 1 回
        // given (前提条件):
        let mut debouncer = TypingDebouncer::default();
        let t0 = Instant::now();
        let mut log = Vec::new();

        // when (操作):
        if let Some(signal) = debouncer.on_keystroke(t0) {
            log.push((0, signal));
        }
        expire_until(&mut debouncer, t0, 500, &mut log);
        if let Some(signal) = debouncer.on_keystroke(t0 + ms(500)) {
            log.push((500, signal));
        }
        expire_until(&mut debouncer, t0, 10_000, &mut log);

        // then (期待する結果):
        assert_eq!(log, vec![(0, TypingSignal::Start), (2500, TypingSignal::Stop)]);
        assert!(!debouncer.is_announced());
    }

    #[test]
    fn test_send_emits_stop_and_cancels_timer() {
        // テスト項目: t=600ms の送信で即座に STOP が出て、タイマーの STOP は出ない
        // given (前提条件):
        let mut debouncer = TypingDebouncer::default();
        let t0 = Instant::now();
        let mut log = Vec::new();
        log.extend(debouncer.on_keystroke(t0).map(|s| (0, s)));
        log.extend(debouncer.on_keystroke(t0 + ms(500)).map(|s| (500, s)));

        // when (操作):
        log.extend(debouncer.on_send().map(|s| (600, s)));
        expire_until(&mut debouncer, t0, 10_000, &mut log);

        // then (期待する結果):
        assert_eq!(log, vec![(0, TypingSignal::Start), (600, TypingSignal::Stop)]);
        assert_eq!(debouncer.deadline(), None);
        assert_eq!(debouncer.poll_expired(t0 + ms(60_000)), None);
    }

    #[test]
    fn test_send_without_typing_emits_nothing() {
        // テスト項目: 入力中でなければ送信時に STOP は出ない
        let mut debouncer = TypingDebouncer::default();
        assert_eq!(debouncer.on_send(), None);
    }

    #[test]
    fn test_poll_before_deadline_is_noop() {
        // テスト項目: 期限前のポーリングでは何も出ない
        // given (前提条件):
        let mut debouncer = TypingDebouncer::default();
        let t0 = Instant::now();
        debouncer.on_keystroke(t0);

        // when (操作):
        let signal = debouncer.poll_expired(t0 + ms(1999));

        // then (期待する結果):
        assert_eq!(signal, None);
        assert!(debouncer.is_announced());
    }
}
