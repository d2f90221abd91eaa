//! Reconnect state machine for one logical session.
//!
//! The machine is pure: transitions return the [`ConnectionAction`] the caller
//! must execute (open a connection, drain the queue, arm a timer). The session
//! driver owns the I/O.
//!
//! ```text
//! Idle → Connecting → Open → (close) → Reconnecting(n) → Connecting → …
//!   ↑__________________ teardown from any state ___________________|
//! ```

use std::time::Duration;

/// Exponential backoff between reconnect attempts: `min(base * 2^n, max)`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BackoffPolicy {
    pub base: Duration,
    pub max: Duration,
}

impl BackoffPolicy {
    pub const DEFAULT_BASE: Duration = Duration::from_millis(1_000);
    pub const DEFAULT_MAX: Duration = Duration::from_millis(30_000);

    pub fn new(base: Duration, max: Duration) -> Self {
        Self { base, max }
    }

    /// Delay before reconnect attempt `attempt` (0-indexed). Saturates at `max`.
    pub fn delay(&self, attempt: u32) -> Duration {
        1u32.checked_shl(attempt)
            .and_then(|factor| self.base.checked_mul(factor))
            .map_or(self.max, |delay| delay.min(self.max))
    }
}

impl Default for BackoffPolicy {
    fn default() -> Self {
        Self::new(Self::DEFAULT_BASE, Self::DEFAULT_MAX)
    }
}

/// Observable connection state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ConnectionState {
    #[default]
    Idle,
    Connecting,
    Open,
    /// Waiting for the timer of reconnect attempt `attempt`
    Reconnecting { attempt: u32 },
}

impl ConnectionState {
    pub fn is_open(&self) -> bool {
        matches!(self, Self::Open)
    }
}

/// Side effect requested by a transition
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionAction {
    /// Start a connection attempt for the active room
    Connect,
    /// Drain the offline queue for the active room
    FlushQueue,
    /// Arm the reconnect timer
    ScheduleReconnect { attempt: u32, delay: Duration },
}

/// The state machine plus its attempt counter
#[derive(Debug, Clone)]
pub struct ConnectionMachine {
    state: ConnectionState,
    attempts: u32,
    backoff: BackoffPolicy,
}

impl ConnectionMachine {
    pub fn new(backoff: BackoffPolicy) -> Self {
        Self {
            state: ConnectionState::Idle,
            attempts: 0,
            backoff,
        }
    }

    pub fn state(&self) -> ConnectionState {
        self.state
    }

    /// `Idle → Connecting`. A no-op while a session is already running.
    pub fn start(&mut self) -> Option<ConnectionAction> {
        match self.state {
            ConnectionState::Idle => {
                self.state = ConnectionState::Connecting;
                Some(ConnectionAction::Connect)
            }
            _ => None,
        }
    }

    /// `Connecting → Open` after a successful handshake
    pub fn opened(&mut self) -> Option<ConnectionAction> {
        match self.state {
            ConnectionState::Connecting => {
                self.state = ConnectionState::Open;
                self.attempts = 0;
                Some(ConnectionAction::FlushQueue)
            }
            _ => None,
        }
    }

    /// `Connecting | Open → Reconnecting(n)` on close, error or failed handshake
    pub fn closed(&mut self) -> Option<ConnectionAction> {
        match self.state {
            ConnectionState::Connecting | ConnectionState::Open => {
                let attempt = self.attempts;
                self.attempts = self.attempts.saturating_add(1);
                self.state = ConnectionState::Reconnecting { attempt };
                Some(ConnectionAction::ScheduleReconnect {
                    attempt,
                    delay: self.backoff.delay(attempt),
                })
            }
            _ => None,
        }
    }

    /// `Reconnecting → Connecting` when the backoff delay elapses
    pub fn timer_elapsed(&mut self) -> Option<ConnectionAction> {
        match self.state {
            ConnectionState::Reconnecting { .. } => {
                self.state = ConnectionState::Connecting;
                Some(ConnectionAction::Connect)
            }
            _ => None,
        }
    }

    /// Any state → `Idle`. The caller cancels timers and closes the link.
    pub fn teardown(&mut self) {
        self.state = ConnectionState::Idle;
        self.attempts = 0;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn scheduled_delay(action: Option<ConnectionAction>) -> Duration {
        match action {
            Some(ConnectionAction::ScheduleReconnect { delay, .. }) => delay,
            other => panic!("expected ScheduleReconnect, got {other:?}"),
        }
    }

    #[test]
    fn test_backoff_delays_double_and_cap() {
        // テスト項目: 再接続の待ち時間は 2 倍ずつ増え、30 秒で頭打ちになる
        // given (前提条件):
        let policy = BackoffPolicy::default();

        // when (操作):
        let delays: Vec<u128> = (0..7).map(|n| policy.delay(n).as_millis()).collect();

        // then (期待する結果):
        assert_eq!(delays, vec![1000, 2000, 4000, 8000, 16000, 30000, 30000]);
    }

    #[test]
    fn test_backoff_saturates_for_huge_attempts() {
        // テスト項目: 試行回数が非常に大きくてもオーバーフローせず上限を返す
        let policy = BackoffPolicy::default();
        assert_eq!(policy.delay(31), policy.max);
        assert_eq!(policy.delay(32), policy.max);
        assert_eq!(policy.delay(u32::MAX), policy.max);
    }

    #[test]
    fn test_repeated_failures_follow_backoff_sequence() {
        // テスト項目: 接続失敗を繰り返すと試行回数が増え、待ち時間が backoff に従う
        // given (前提条件):
        let mut machine = ConnectionMachine::new(BackoffPolicy::default());
        assert_eq!(machine.start(), Some(ConnectionAction::Connect));

        // when (操作):
        let mut delays = Vec::new();
        for _ in 0..7 {
            delays.push(scheduled_delay(machine.closed()).as_millis());
            assert_eq!(machine.timer_elapsed(), Some(ConnectionAction::Connect));
        }

        // then (期待する結果):
        assert_eq!(delays, vec![1000, 2000, 4000, 8000, 16000, 30000, 30000]);
        assert_eq!(machine.state(), ConnectionState::Connecting);
    }

    #[test]
    fn test_open_resets_attempt_counter() {
        // テスト項目: 接続成功で試行回数がリセットされ、次の切断は 1 秒後に再接続する
        // given (前提条件):
        let mut machine = ConnectionMachine::new(BackoffPolicy::default());
        machine.start();
        machine.closed();
        machine.timer_elapsed();
        machine.closed();
        machine.timer_elapsed();

        // when (操作):
        let action = machine.opened();

        // then (期待する結果):
        assert_eq!(action, Some(ConnectionAction::FlushQueue));
        assert_eq!(machine.state(), ConnectionState::Open);
        assert_eq!(
            machine.closed(),
            Some(ConnectionAction::ScheduleReconnect {
                attempt: 0,
                delay: Duration::from_millis(1000)
            })
        );
    }

    #[test]
    fn test_start_is_noop_when_session_running() {
        // テスト項目: 既に接続中・接続済みなら start は何もしない
        // given (前提条件):
        let mut machine = ConnectionMachine::new(BackoffPolicy::default());
        machine.start();
        machine.opened();

        // when (操作):
        let action = machine.start();

        // then (期待する結果):
        assert_eq!(action, None);
        assert_eq!(machine.state(), ConnectionState::Open);
    }

    #[test]
    fn test_teardown_returns_to_idle_and_ignores_late_events() {
        // テスト項目: teardown 後は Idle になり、遅れて届いたイベントは無視される
        // given (前提条件):
        let mut machine = ConnectionMachine::new(BackoffPolicy::default());
        machine.start();
        machine.closed();

        // when (操作):
        machine.teardown();

        // then (期待する結果):
        assert_eq!(machine.state(), ConnectionState::Idle);
        assert_eq!(machine.timer_elapsed(), None);
        assert_eq!(machine.closed(), None);
        assert_eq!(machine.opened(), None);
        machine.start();
        assert_eq!(
            machine.closed(),
            Some(ConnectionAction::ScheduleReconnect {
                attempt: 0,
                delay: Duration::from_millis(1000)
            })
        );
    }
}
