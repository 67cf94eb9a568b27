use crate::scoring::{self, Outcome};
use crate::sentences::SentenceProvider;
use crate::timer::{TimerDriver, TimerId, PULSE_PERIOD};

/// Default test length in seconds
pub const DEFAULT_TIME: u32 = 60;

/// Result of delivering one pulse to the session
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Tick {
    /// Pulse from a timer the session no longer holds
    Ignored,
    Counted { remaining: u32 },
    /// Countdown hit zero and the session stopped itself
    Expired,
}

/// Derived metrics read in one go
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Metrics {
    pub wpm: u32,
    pub cpm: u32,
    pub accuracy: f64,
    pub elapsed_secs: u32,
    pub correct: usize,
    pub typed: usize,
}

/// A single timed typing test.
///
/// The session is either idle or running. It is running exactly while it
/// holds a timer from its [`TimerDriver`]; `start` is the only place that
/// arms one and `stop` is the only place that releases it, so there is
/// never more than one countdown and no pulse is honoured after a stop.
#[derive(Debug)]
pub struct Session<P, T> {
    provider: P,
    timer: T,
    countdown: Option<TimerId>,
    sentence: String,
    typed: String,
    duration: u32,
    remaining: u32,
}

impl<P: SentenceProvider, T: TimerDriver> Session<P, T> {
    /// A fresh idle session with the default duration. No sentence is
    /// drawn until [`Session::initialize`] is called.
    pub fn new(provider: P, timer: T) -> Self {
        Self::with_duration(provider, timer, DEFAULT_TIME)
    }

    /// Like [`Session::new`] with a custom length. Durations below one
    /// second are raised to one.
    pub fn with_duration(provider: P, timer: T, duration: u32) -> Self {
        let duration = duration.max(1);
        Self {
            provider,
            timer,
            countdown: None,
            sentence: String::new(),
            typed: String::new(),
            duration,
            remaining: duration,
        }
    }

    /// Draw a new sentence, clear the typed text and rewind the countdown.
    /// Any running countdown is cancelled.
    pub fn initialize(&mut self) {
        self.stop();
        self.sentence = self.provider.next_sentence();
        self.typed.clear();
        self.remaining = self.duration;
        tracing::debug!(len = self.sentence.chars().count(), "session initialized");
    }

    /// Begin the countdown. Returns false if already running or if the
    /// countdown is exhausted.
    pub fn start(&mut self) -> bool {
        if self.countdown.is_some() || self.remaining == 0 {
            return false;
        }
        self.countdown = Some(self.timer.arm(PULSE_PERIOD));
        tracing::debug!(remaining = self.remaining, "session started");
        true
    }

    /// Cancel the countdown. Safe to call in any state.
    pub fn stop(&mut self) {
        if let Some(id) = self.countdown.take() {
            self.timer.disarm(id);
            tracing::debug!(remaining = self.remaining, "session stopped");
        }
    }

    pub fn reset(&mut self) {
        self.stop();
        self.initialize();
    }

    /// Deliver a pulse from timer `id`
    pub fn on_tick(&mut self, id: TimerId) -> Tick {
        if self.countdown != Some(id) {
            return Tick::Ignored;
        }
        self.remaining = self.remaining.saturating_sub(1);
        if self.remaining == 0 {
            self.stop();
            Tick::Expired
        } else {
            Tick::Counted {
                remaining: self.remaining,
            }
        }
    }

    pub fn type_char(&mut self, c: char) {
        self.typed.push(c);
    }

    pub fn backspace(&mut self) {
        self.typed.pop();
    }

    /// Replace the typed text wholesale, as a text field would
    pub fn set_typed(&mut self, text: &str) {
        self.typed.clear();
        self.typed.push_str(text);
    }

    pub fn is_running(&self) -> bool {
        self.countdown.is_some()
    }

    pub fn sentence(&self) -> &str {
        &self.sentence
    }

    pub fn typed(&self) -> &str {
        &self.typed
    }

    pub fn remaining_secs(&self) -> u32 {
        self.remaining
    }

    pub fn duration_secs(&self) -> u32 {
        self.duration
    }

    pub fn timer(&self) -> &T {
        &self.timer
    }

    pub fn elapsed_secs(&self) -> u32 {
        self.duration - self.remaining
    }

    pub fn correct_count(&self) -> usize {
        scoring::correct_count(&self.sentence, &self.typed)
    }

    fn never_started(&self) -> bool {
        self.remaining == self.duration && !self.is_running()
    }

    pub fn wpm(&self) -> u32 {
        if self.never_started() {
            return 0;
        }
        scoring::wpm(self.correct_count(), self.elapsed_secs())
    }

    pub fn cpm(&self) -> u32 {
        if self.never_started() {
            return 0;
        }
        scoring::cpm(self.typed.chars().count(), self.elapsed_secs())
    }

    pub fn accuracy(&self) -> f64 {
        scoring::accuracy(self.correct_count(), self.typed.chars().count())
    }

    pub fn metrics(&self) -> Metrics {
        Metrics {
            wpm: self.wpm(),
            cpm: self.cpm(),
            accuracy: self.accuracy(),
            elapsed_secs: self.elapsed_secs(),
            correct: self.correct_count(),
            typed: self.typed.chars().count(),
        }
    }

    pub fn outcomes(&self) -> Vec<Outcome> {
        scoring::outcomes(&self.sentence, &self.typed)
    }
}
