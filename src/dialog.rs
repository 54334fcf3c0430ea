use std::fmt;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConfirmPrompt {
    pub title: String,
    pub message: String,
}

impl fmt::Display for ConfirmPrompt {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.title, self.message)
    }
}

/// Yes/no confirmation shown before destructive edits.
pub trait ConfirmDialog {
    fn confirm(&mut self, prompt: &ConfirmPrompt) -> bool;
}

/// Answers every prompt with a fixed value and remembers what it was asked.
#[derive(Debug, Clone, Default)]
pub struct AutoConfirm {
    answer: bool,
    asked: Vec<ConfirmPrompt>,
}

impl AutoConfirm {
    pub fn accept() -> Self {
        Self { answer: true, asked: Vec::new() }
    }

    pub fn decline() -> Self {
        Self { answer: false, asked: Vec::new() }
    }

    pub fn asked(&self) -> &[ConfirmPrompt] {
        &self.asked
    }
}

impl ConfirmDialog for AutoConfirm {
    fn confirm(&mut self, prompt: &ConfirmPrompt) -> bool {
        self.asked.push(prompt.clone());
        self.answer
    }
}
