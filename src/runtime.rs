use std::sync::mpsc::{self, Receiver, RecvTimeoutError, Sender};
use std::time::Duration;

use crossterm::event::{self, Event as CtEvent, KeyEvent};

use crate::timer::TimerId;

/// Unified event type consumed by the app runner
#[derive(Clone, Debug)]
pub enum Event {
    Key(KeyEvent),
    Resize,
    /// One-second countdown pulse from the timer with this id
    Pulse(TimerId),
    /// Nothing arrived within the redraw interval
    Idle,
}

/// Source of application events (keyboard, resize, timer pulses)
pub trait EventSource: Send + 'static {
    /// Block for up to `timeout` waiting for an event.
    fn recv_timeout(&self, timeout: Duration) -> Result<Event, RecvTimeoutError>;
}

/// Production event source: a crossterm reader thread plus whatever else
/// posts into [`CrosstermEventSource::sender`] (the countdown timers).
pub struct CrosstermEventSource {
    tx: Sender<Event>,
    rx: Receiver<Event>,
}

impl CrosstermEventSource {
    pub fn new() -> Self {
        let (tx, rx) = mpsc::channel();
        let key_tx = tx.clone();

        std::thread::spawn(move || loop {
            match event::read() {
                Ok(CtEvent::Key(key)) => {
                    if key_tx.send(Event::Key(key)).is_err() {
                        break;
                    }
                }
                Ok(CtEvent::Resize(_, _)) => {
                    if key_tx.send(Event::Resize).is_err() {
                        break;
                    }
                }
                Ok(_) => {}
                Err(err) => {
                    tracing::error!(error = %err, "terminal event reader stopped");
                    break;
                }
            }
        });

        Self { tx, rx }
    }

    pub fn sender(&self) -> Sender<Event> {
        self.tx.clone()
    }
}

impl Default for CrosstermEventSource {
    fn default() -> Self {
        Self::new()
    }
}

impl EventSource for CrosstermEventSource {
    fn recv_timeout(&self, timeout: Duration) -> Result<Event, RecvTimeoutError> {
        self.rx.recv_timeout(timeout)
    }
}

/// Channel-fed event source for tests and headless driving
pub struct TestEventSource {
    rx: Receiver<Event>,
}

impl TestEventSource {
    pub fn new(rx: Receiver<Event>) -> Self {
        Self { rx }
    }
}

impl EventSource for TestEventSource {
    fn recv_timeout(&self, timeout: Duration) -> Result<Event, RecvTimeoutError> {
        self.rx.recv_timeout(timeout)
    }
}

/// Runner that hands out the next event, or `Idle` when the redraw
/// interval passes quietly
pub struct Runner<E: EventSource> {
    event_source: E,
    redraw_interval: Duration,
}

impl<E: EventSource> Runner<E> {
    pub fn new(event_source: E, redraw_interval: Duration) -> Self {
        Self {
            event_source,
            redraw_interval,
        }
    }

    pub fn step(&self) -> Event {
        match self.event_source.recv_timeout(self.redraw_interval) {
            Ok(ev) => ev,
            Err(RecvTimeoutError::Timeout) | Err(RecvTimeoutError::Disconnected) => Event::Idle,
        }
    }
}
