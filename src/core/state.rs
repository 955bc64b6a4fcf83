use std::collections::BTreeMap;
use std::path::PathBuf;

/// Letter key (as written after the header) to prompt text.
pub type PromptMap = BTreeMap<String, String>;

pub const ALPHABET: std::ops::RangeInclusive<char> = 'A'..='Z';

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum VideoOutcome {
    AlreadyExists(PathBuf),
    Generated(PathBuf),
    Failed(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LetterOutcome {
    MissingFrame,
    MissingPrompt,
    SwapFailed(String),
    Video(VideoOutcome),
}

#[derive(Debug, Default, Clone)]
pub struct RunReport {
    pub letters: Vec<(char, LetterOutcome)>,
}

impl RunReport {
    pub fn record(&mut self, letter: char, outcome: LetterOutcome) {
        self.letters.push((letter, outcome));
    }

    pub fn outcome(&self, letter: char) -> Option<&LetterOutcome> {
        self.letters
            .iter()
            .find(|(l, _)| *l == letter)
            .map(|(_, o)| o)
    }

    pub fn generated(&self) -> usize {
        self.count(|o| matches!(o, LetterOutcome::Video(VideoOutcome::Generated(_))))
    }

    pub fn already_present(&self) -> usize {
        self.count(|o| matches!(o, LetterOutcome::Video(VideoOutcome::AlreadyExists(_))))
    }

    pub fn failed(&self) -> usize {
        self.count(|o| {
            matches!(
                o,
                LetterOutcome::SwapFailed(_) | LetterOutcome::Video(VideoOutcome::Failed(_))
            )
        })
    }

    pub fn skipped(&self) -> usize {
        self.count(|o| matches!(o, LetterOutcome::MissingFrame | LetterOutcome::MissingPrompt))
    }

    fn count<F>(&self, pred: F) -> usize
    where
        F: Fn(&LetterOutcome) -> bool,
    {
        self.letters.iter().filter(|(_, o)| pred(o)).count()
    }
}
