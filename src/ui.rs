use std::time::Duration;

use ratatui::{
    buffer::Buffer,
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Cell, Paragraph, Row, Table, Widget, Wrap},
};
use time_humanize::{Accuracy, HumanTime, Tense};
use unicode_width::UnicodeWidthStr;

use crate::app::{App, RunResult, Screen};
use crate::leaderboard::{Placement, ScoreRecord, MAX_ENTRIES};
use crate::scoring::Outcome;
use crate::sentences::SentenceProvider;
use crate::store::KeyValueStore;
use crate::timer::TimerDriver;

const HORIZONTAL_MARGIN: u16 = 5;
const VERTICAL_MARGIN: u16 = 2;

impl<P, T, S> Widget for &App<P, T, S>
where
    P: SentenceProvider,
    T: TimerDriver,
    S: KeyValueStore,
{
    fn render(self, area: Rect, buf: &mut Buffer) {
        match self.screen {
            Screen::Typing => render_typing(self, area, buf),
            Screen::Results => render_results(self, area, buf),
        }
    }
}

fn render_typing<P, T, S>(app: &App<P, T, S>, area: Rect, buf: &mut Buffer)
where
    P: SentenceProvider,
    T: TimerDriver,
    S: KeyValueStore,
{
    let session = &app.session;
    let bold_style = Style::default().add_modifier(Modifier::BOLD);
    let dim_bold_style = bold_style.add_modifier(Modifier::DIM);

    let max_chars_per_line = area.width.saturating_sub(HORIZONTAL_MARGIN * 2).max(1);
    let sentence_width = session.sentence().width();
    let prompt_lines = if sentence_width <= max_chars_per_line as usize {
        1
    } else {
        (sentence_width as f64 / max_chars_per_line as f64).ceil() as u16 + 1
    };
    let padding = area.height.saturating_sub(prompt_lines + 4) / 2;

    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .horizontal_margin(HORIZONTAL_MARGIN)
        .constraints([
            Constraint::Length(padding),
            Constraint::Length(2), // countdown
            Constraint::Length(prompt_lines),
            Constraint::Length(2), // live stats
            Constraint::Min(0),
            Constraint::Length(1), // legend
        ])
        .split(area);

    let timer_style = if session.is_running() {
        bold_style.fg(Color::Yellow)
    } else {
        dim_bold_style
    };
    Paragraph::new(Span::styled(
        format!("{}s", session.remaining_secs()),
        timer_style,
    ))
    .alignment(Alignment::Center)
    .render(chunks[1], buf);

    Paragraph::new(Line::from(sentence_spans(
        session.sentence(),
        session.typed(),
        &session.outcomes(),
    )))
    .alignment(if prompt_lines == 1 {
        Alignment::Center
    } else {
        Alignment::Left
    })
    .wrap(Wrap { trim: true })
    .render(chunks[2], buf);

    let m = session.metrics();
    Paragraph::new(Span::styled(
        format!(
            "{} wpm   {} cpm   {:.0}% acc",
            m.wpm, m.cpm, m.accuracy
        ),
        dim_bold_style,
    ))
    .alignment(Alignment::Center)
    .render(chunks[3], buf);

    Paragraph::new(Span::styled(
        "(tab) new sentence / (esc)ape",
        Style::default().add_modifier(Modifier::ITALIC),
    ))
    .render(chunks[5], buf);
}

/// Styled spans for the reference sentence with typed progress overlaid
pub fn sentence_spans<'a>(sentence: &str, typed: &str, outcomes: &[Outcome]) -> Vec<Span<'a>> {
    let bold = Style::default().add_modifier(Modifier::BOLD);
    let correct = bold.fg(Color::Green);
    let incorrect = bold.fg(Color::Red);
    let pending = bold.add_modifier(Modifier::DIM);
    let cursor = pending.add_modifier(Modifier::UNDERLINED);

    let cursor_idx = typed.chars().count();
    let mut typed_chars = typed.chars();
    let mut expected_chars = sentence.chars();

    outcomes
        .iter()
        .enumerate()
        .map(|(idx, outcome)| {
            let typed_c = typed_chars.next();
            let expected_c = expected_chars.next();
            match outcome {
                Outcome::Correct => Span::styled(expected_c.unwrap_or(' ').to_string(), correct),
                Outcome::Incorrect | Outcome::Extra => Span::styled(
                    match typed_c {
                        Some(' ') | None => "·".to_owned(),
                        Some(c) => c.to_string(),
                    },
                    incorrect,
                ),
                Outcome::Pending => Span::styled(
                    expected_c.unwrap_or(' ').to_string(),
                    if idx == cursor_idx { cursor } else { pending },
                ),
            }
        })
        .collect()
}

fn render_results<P, T, S>(app: &App<P, T, S>, area: Rect, buf: &mut Buffer)
where
    P: SentenceProvider,
    T: TimerDriver,
    S: KeyValueStore,
{
    let bold_style = Style::default().add_modifier(Modifier::BOLD);

    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .horizontal_margin(HORIZONTAL_MARGIN)
        .vertical_margin(VERTICAL_MARGIN)
        .constraints([
            Constraint::Length(1), // stats
            Constraint::Length(1), // placement
            Constraint::Length(1), // padding
            Constraint::Length(MAX_ENTRIES as u16 + 3), // leaderboard
            Constraint::Min(0),
            Constraint::Length(1), // legend
        ])
        .split(area);

    if let Some(result) = &app.last_result {
        let m = &result.metrics;
        Paragraph::new(Span::styled(
            format!(
                "{} wpm   {} cpm   {:.1}% acc   {}s",
                m.wpm, m.cpm, m.accuracy, m.elapsed_secs
            ),
            bold_style,
        ))
        .alignment(Alignment::Center)
        .render(chunks[0], buf);

        Paragraph::new(Span::styled(
            placement_message(result),
            Style::default()
                .fg(Color::Cyan)
                .add_modifier(Modifier::ITALIC),
        ))
        .alignment(Alignment::Center)
        .render(chunks[1], buf);
    }

    let now_ms = chrono::Utc::now().timestamp_millis();
    leaderboard_table(app.leaderboard.entries(), now_ms).render(chunks[3], buf);

    Paragraph::new(Span::styled(
        "(r)etry / (q)uit",
        Style::default().add_modifier(Modifier::ITALIC),
    ))
    .render(chunks[5], buf);
}

pub fn placement_message(result: &RunResult) -> String {
    match &result.placement {
        Some(Placement::Ranked(0)) => "new high score!".to_string(),
        Some(Placement::Ranked(rank)) => format!("ranked #{} on the leaderboard", rank + 1),
        Some(Placement::Dropped) => "not fast enough for the leaderboard".to_string(),
        Some(Placement::Rejected(err)) => format!("score not recorded: {err}"),
        None => "nothing typed, no score recorded".to_string(),
    }
}

/// How long ago `timestamp_ms` was, in words
pub fn relative_time(timestamp_ms: i64, now_ms: i64) -> String {
    if timestamp_ms <= 0 {
        return "-".to_string();
    }
    let age = Duration::from_millis(now_ms.saturating_sub(timestamp_ms).max(0) as u64);
    HumanTime::from(age).to_text_en(Accuracy::Rough, Tense::Past)
}

fn leaderboard_table(entries: &[ScoreRecord], now_ms: i64) -> Table<'static> {
    let header = Row::new(vec!["#", "wpm", "acc", "when"]).style(
        Style::default()
            .fg(Color::Yellow)
            .add_modifier(Modifier::BOLD),
    );

    let rows: Vec<Row> = entries
        .iter()
        .enumerate()
        .map(|(idx, entry)| {
            Row::new(vec![
                Cell::from((idx + 1).to_string()),
                Cell::from(format!("{:.0}", entry.wpm)),
                Cell::from(format!("{:.1}%", entry.accuracy)),
                Cell::from(relative_time(entry.timestamp, now_ms)),
            ])
        })
        .collect();

    Table::new(
        rows,
        [
            Constraint::Length(3),
            Constraint::Length(6),
            Constraint::Length(8),
            Constraint::Min(10),
        ],
    )
    .header(header)
    .block(Block::default().borders(Borders::ALL).title("Leaderboard"))
}
