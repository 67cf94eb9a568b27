/// Per-position result of comparing typed text against the reference
#[derive(Clone, Debug, Copy, PartialEq, Eq)]
pub enum Outcome {
    Correct,
    Incorrect,
    /// Not typed yet
    Pending,
    /// Typed past the end of the reference
    Extra,
}

/// Characters per word in the WPM convention
pub const CHARS_PER_WORD: f64 = 5.0;

/// Number of positions where `typed` matches `reference`. Positions past
/// the end of the reference never match.
pub fn correct_count(reference: &str, typed: &str) -> usize {
    typed
        .chars()
        .zip(reference.chars())
        .filter(|(t, r)| t == r)
        .count()
}

/// Words per minute from correct characters over elapsed whole seconds
pub fn wpm(correct: usize, elapsed_secs: u32) -> u32 {
    if elapsed_secs == 0 {
        return 0;
    }
    let minutes = f64::from(elapsed_secs) / 60.0;
    ((correct as f64 / CHARS_PER_WORD) / minutes).round() as u32
}

/// Characters per minute from every typed character, right or wrong
pub fn cpm(typed: usize, elapsed_secs: u32) -> u32 {
    if elapsed_secs == 0 {
        return 0;
    }
    let minutes = f64::from(elapsed_secs) / 60.0;
    (typed as f64 / minutes).round() as u32
}

/// Percentage of typed characters that were correct; 100 when nothing is typed
pub fn accuracy(correct: usize, typed: usize) -> f64 {
    if typed == 0 {
        100.0
    } else {
        (correct as f64 / typed as f64) * 100.0
    }
}

/// Outcome for every reference position, followed by one `Extra` per
/// character typed beyond the reference.
pub fn outcomes(reference: &str, typed: &str) -> Vec<Outcome> {
    let mut typed_chars = typed.chars();
    let mut out: Vec<Outcome> = reference
        .chars()
        .map(|expected| match typed_chars.next() {
            Some(c) if c == expected => Outcome::Correct,
            Some(_) => Outcome::Incorrect,
            None => Outcome::Pending,
        })
        .collect();
    out.extend(typed_chars.map(|_| Outcome::Extra));
    out
}
