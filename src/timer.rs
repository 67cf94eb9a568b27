use crate::runtime::Event;
use std::collections::{BTreeSet, HashMap};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc::Sender;
use std::sync::Arc;
use std::thread;
use std::time::Duration;

/// Period of the session countdown
pub const PULSE_PERIOD: Duration = Duration::from_secs(1);

/// Identifies one armed periodic timer. Pulses carry the id of the timer
/// that produced them so stale pulses can be told apart from live ones.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct TimerId(u64);

impl TimerId {
    pub fn new(raw: u64) -> Self {
        Self(raw)
    }

    pub fn raw(&self) -> u64 {
        self.0
    }
}

/// Host facility that produces periodic pulses
pub trait TimerDriver {
    /// Arm a new periodic timer
    fn arm(&mut self, period: Duration) -> TimerId;
    /// Cancel a timer. Unknown or already-cancelled ids are ignored.
    fn disarm(&mut self, id: TimerId);
}

/// Simulated clock. Nothing fires on its own; the caller reads
/// [`ManualTimer::armed`] and delivers one pulse per armed timer per
/// simulated second.
#[derive(Debug, Default)]
pub struct ManualTimer {
    next_id: u64,
    armed: BTreeSet<TimerId>,
    arm_count: usize,
}

impl ManualTimer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Timers currently armed, in arming order
    pub fn armed(&self) -> Vec<TimerId> {
        self.armed.iter().copied().collect()
    }

    /// Total number of timers ever armed
    pub fn arm_count(&self) -> usize {
        self.arm_count
    }
}

impl TimerDriver for ManualTimer {
    fn arm(&mut self, _period: Duration) -> TimerId {
        self.next_id += 1;
        self.arm_count += 1;
        let id = TimerId(self.next_id);
        self.armed.insert(id);
        id
    }

    fn disarm(&mut self, id: TimerId) {
        self.armed.remove(&id);
    }
}

/// Real timer: each armed timer is a thread posting [`Event::Pulse`] into
/// the application's event channel until it is disarmed or the channel closes.
#[derive(Debug)]
pub struct ThreadTimer {
    tx: Sender<Event>,
    next_id: u64,
    live: HashMap<TimerId, Arc<AtomicBool>>,
}

impl ThreadTimer {
    pub fn new(tx: Sender<Event>) -> Self {
        Self {
            tx,
            next_id: 0,
            live: HashMap::new(),
        }
    }
}

impl TimerDriver for ThreadTimer {
    fn arm(&mut self, period: Duration) -> TimerId {
        self.next_id += 1;
        let id = TimerId(self.next_id);
        let active = Arc::new(AtomicBool::new(true));
        self.live.insert(id, Arc::clone(&active));

        let tx = self.tx.clone();
        thread::spawn(move || loop {
            thread::sleep(period);
            if !active.load(Ordering::Acquire) {
                break;
            }
            if tx.send(Event::Pulse(id)).is_err() {
                break;
            }
        });

        tracing::trace!(timer = id.raw(), "armed pulse thread");
        id
    }

    fn disarm(&mut self, id: TimerId) {
        if let Some(active) = self.live.remove(&id) {
            active.store(false, Ordering::Release);
            tracing::trace!(timer = id.raw(), "disarmed pulse thread");
        }
    }
}

impl Drop for ThreadTimer {
    fn drop(&mut self) {
        for (_, active) in self.live.drain() {
            active.store(false, Ordering::Release);
        }
    }
}
