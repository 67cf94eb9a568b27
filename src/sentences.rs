use rand::seq::SliceRandom;

/// Built-in corpus of reference sentences
pub static CORPUS: &[&str] = &[
    "The quick brown fox jumps over the lazy dog.",
    "Never underestimate the power of a good book.",
    "The early bird catches the worm every single time.",
    "Innovation distinguishes between a leader and a follower.",
    "Learning new things can be a truly rewarding experience.",
    "Technology has transformed the way we live and work.",
    "The sun always shines brightest after the rain.",
    "Practice makes perfect in almost every situation.",
    "Creativity is intelligence having fun in its own way.",
    "Challenges are what make life interesting and overcoming them is what makes life meaningful.",
    "The greatest glory in living lies not in never falling, but in rising every time we fall.",
    "It is during our darkest moments that we must focus to see the light.",
    "The future belongs to those who believe in the beauty of their dreams.",
    "Strive not to be a success, but rather to be of value.",
    "The only way to do great work is to love what you do.",
    "If you can dream it, you can achieve it.",
    "The journey of a thousand miles begins with a single step.",
    "Do not go where the path may lead, go instead where there is no path and leave a trail.",
    "The best way to predict the future is to create it.",
    "Life is what happens when you're busy making other plans.",
];

/// Source of reference sentences for a session
pub trait SentenceProvider {
    fn next_sentence(&mut self) -> String;
}

/// Draws uniformly at random from a static, non-empty corpus
#[derive(Debug, Clone)]
pub struct RandomSentences {
    corpus: &'static [&'static str],
}

impl RandomSentences {
    pub fn new() -> Self {
        Self { corpus: CORPUS }
    }

    /// Use a different corpus. An empty slice falls back to the built-in one.
    pub fn with_corpus(corpus: &'static [&'static str]) -> Self {
        if corpus.is_empty() {
            Self::new()
        } else {
            Self { corpus }
        }
    }
}

impl Default for RandomSentences {
    fn default() -> Self {
        Self::new()
    }
}

impl SentenceProvider for RandomSentences {
    fn next_sentence(&mut self) -> String {
        let rng = &mut rand::thread_rng();
        self.corpus
            .choose(rng)
            .map(|s| s.to_string())
            .unwrap_or_default()
    }
}

/// Cycles through a fixed list; handy for deterministic sessions
#[derive(Debug, Clone)]
pub struct FixedSentences {
    sentences: Vec<String>,
    next: usize,
}

impl FixedSentences {
    pub fn new<I, S>(sentences: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            sentences: sentences.into_iter().map(Into::into).collect(),
            next: 0,
        }
    }
}

impl SentenceProvider for FixedSentences {
    fn next_sentence(&mut self) -> String {
        if self.sentences.is_empty() {
            return String::new();
        }
        let s = self.sentences[self.next % self.sentences.len()].clone();
        self.next += 1;
        s
    }
}
