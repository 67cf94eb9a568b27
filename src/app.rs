use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};

use crate::leaderboard::{Leaderboard, Placement, ScoreRecord};
use crate::runtime::Event;
use crate::sentences::SentenceProvider;
use crate::session::{Metrics, Session, Tick};
use crate::store::KeyValueStore;
use crate::timer::{TimerDriver, TimerId};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Screen {
    Typing,
    Results,
}

/// What the event loop should do after handling an event
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Flow {
    Continue,
    Quit,
}

/// How a finished run ended up
#[derive(Debug, Clone, PartialEq)]
pub struct RunResult {
    pub metrics: Metrics,
    /// `None` when nothing was typed and no score was submitted
    pub placement: Option<Placement>,
}

/// Ties a typing session to the leaderboard and maps input onto both.
/// Holds no terminal state so it can be driven headlessly.
#[derive(Debug)]
pub struct App<P, T, S> {
    pub session: Session<P, T>,
    pub leaderboard: Leaderboard<S>,
    pub screen: Screen,
    pub last_result: Option<RunResult>,
}

impl<P, T, S> App<P, T, S>
where
    P: SentenceProvider,
    T: TimerDriver,
    S: KeyValueStore,
{
    /// Initializes the session and loads saved scores
    pub fn new(session: Session<P, T>, leaderboard: Leaderboard<S>) -> Self {
        let mut app = Self {
            session,
            leaderboard,
            screen: Screen::Typing,
            last_result: None,
        };
        app.session.initialize();
        app.leaderboard.load();
        app
    }

    pub fn handle(&mut self, event: Event) -> Flow {
        match event {
            Event::Key(key) => self.on_key(key),
            Event::Pulse(id) => {
                self.on_pulse(id);
                Flow::Continue
            }
            Event::Resize | Event::Idle => Flow::Continue,
        }
    }

    pub fn on_pulse(&mut self, id: TimerId) {
        if self.session.on_tick(id) == Tick::Expired {
            self.finish();
        }
    }

    pub fn on_key(&mut self, key: KeyEvent) -> Flow {
        if key.code == KeyCode::Esc
            || (key.modifiers.contains(KeyModifiers::CONTROL) && key.code == KeyCode::Char('c'))
        {
            return Flow::Quit;
        }

        match self.screen {
            Screen::Typing => match key.code {
                KeyCode::Tab => self.restart(),
                KeyCode::Backspace => self.session.backspace(),
                KeyCode::Char(c) => self.on_char(c),
                _ => {}
            },
            Screen::Results => match key.code {
                KeyCode::Char('r') | KeyCode::Tab | KeyCode::Enter => self.restart(),
                KeyCode::Char('q') => return Flow::Quit,
                _ => {}
            },
        }
        Flow::Continue
    }

    fn on_char(&mut self, c: char) {
        // first keystroke starts the clock
        self.session.start();
        self.session.type_char(c);

        if self.session.typed().chars().count() >= self.session.sentence().chars().count() {
            self.finish();
        }
    }

    /// Stop the run, submit its score, and show results
    pub fn finish(&mut self) {
        self.session.stop();
        let metrics = self.session.metrics();

        let placement = if metrics.typed > 0 {
            let record = ScoreRecord::now(f64::from(metrics.wpm), metrics.accuracy);
            let report = self.leaderboard.insert(record);
            tracing::info!(
                wpm = metrics.wpm,
                accuracy = metrics.accuracy,
                placement = ?report.placement,
                persisted = report.is_persisted(),
                "run finished"
            );
            Some(report.placement)
        } else {
            None
        };

        self.last_result = Some(RunResult { metrics, placement });
        self.screen = Screen::Results;
    }

    pub fn restart(&mut self) {
        self.session.reset();
        self.last_result = None;
        self.screen = Screen::Typing;
    }
}
