/// Flashcard review session state machine
///
/// `Closed -> ShowingQuestion <-> ShowingAnswer -> Closed`. Navigation is
/// circular and always lands on the question side.
use crate::annotations::Flashcard;
use crate::error::{ReviewError, Result};
use serde::{Deserialize, Serialize};
use std::fmt;
use tracing::debug;

/// Header shown above the card
pub const SESSION_TITLE: &str = "Test your knowledge!";

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "camelCase")]
pub enum ReviewState {
    #[default]
    Closed,
    ShowingQuestion,
    ShowingAnswer,
}

/// What happens to an open session when the flashcards are replaced
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum ReplacementPolicy {
    /// Force-close the session
    #[default]
    Close,
    /// Keep it open, clamping the index into the new list
    Clamp,
}

/// Visible side of the current card
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CardFace<'a> {
    Question(&'a str),
    Answer(&'a str),
}

impl CardFace<'_> {
    pub fn heading(&self) -> &'static str {
        match self {
            CardFace::Question(_) => "Question:",
            CardFace::Answer(_) => "Answer:",
        }
    }

    pub fn text(&self) -> &str {
        match self {
            CardFace::Question(text) | CardFace::Answer(text) => text,
        }
    }
}

/// Derived `current / total` counter
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Progress {
    pub current: usize,
    pub total: usize,
}

impl fmt::Display for Progress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} / {}", self.current, self.total)
    }
}

#[derive(Debug, Clone, Default)]
pub struct ReviewSession {
    cards: Vec<Flashcard>,
    state: ReviewState,
    current_index: usize,
}

impl ReviewSession {
    pub fn new(cards: Vec<Flashcard>) -> Self {
        Self {
            cards,
            state: ReviewState::Closed,
            current_index: 0,
        }
    }

    pub fn state(&self) -> ReviewState {
        self.state
    }

    pub fn is_open(&self) -> bool {
        self.state != ReviewState::Closed
    }

    pub fn is_answer_shown(&self) -> bool {
        self.state == ReviewState::ShowingAnswer
    }

    pub fn current_index(&self) -> usize {
        self.current_index
    }

    pub fn len(&self) -> usize {
        self.cards.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cards.is_empty()
    }

    /// Open on the first card. Refused with `EmptySession` when there are no cards.
    pub fn try_open(&mut self) -> Result<()> {
        if self.cards.is_empty() {
            debug!("Review session not opened: no flashcards");
            return Err(ReviewError::EmptySession);
        }
        self.state = ReviewState::ShowingQuestion;
        self.current_index = 0;
        Ok(())
    }

    /// `try_open`, reporting only whether the session opened
    pub fn open(&mut self) -> bool {
        self.try_open().is_ok()
    }

    /// Close from any state; the next open starts over at card 1
    pub fn close(&mut self) {
        self.state = ReviewState::Closed;
        self.current_index = 0;
    }

    /// Toggle between question and answer
    pub fn flip(&mut self) {
        self.state = match self.state {
            ReviewState::ShowingQuestion => ReviewState::ShowingAnswer,
            ReviewState::ShowingAnswer => ReviewState::ShowingQuestion,
            ReviewState::Closed => ReviewState::Closed,
        };
    }

    pub fn next(&mut self) {
        if !self.is_open() {
            return;
        }
        self.current_index = (self.current_index + 1) % self.cards.len();
        self.state = ReviewState::ShowingQuestion;
    }

    pub fn prev(&mut self) {
        if !self.is_open() {
            return;
        }
        let len = self.cards.len();
        self.current_index = (self.current_index + len - 1) % len;
        self.state = ReviewState::ShowingQuestion;
    }

    pub fn current_card(&self) -> Option<&Flashcard> {
        if !self.is_open() {
            return None;
        }
        self.cards.get(self.current_index)
    }

    pub fn face(&self) -> Option<CardFace<'_>> {
        let card = self.current_card()?;
        match self.state {
            ReviewState::ShowingQuestion => Some(CardFace::Question(&card.question)),
            ReviewState::ShowingAnswer => Some(CardFace::Answer(&card.answer)),
            ReviewState::Closed => None,
        }
    }

    pub fn progress(&self) -> Option<Progress> {
        self.is_open().then(|| Progress {
            current: self.current_index + 1,
            total: self.cards.len(),
        })
    }

    /// Swap in a new flashcard list, keeping `current_index` valid
    pub fn replace_cards(&mut self, cards: Vec<Flashcard>, policy: ReplacementPolicy) {
        self.cards = cards;
        if !self.is_open() {
            return;
        }

        match policy {
            ReplacementPolicy::Close => {
                debug!("Flashcards replaced: closing review session");
                self.close();
            }
            ReplacementPolicy::Clamp if self.cards.is_empty() => self.close(),
            ReplacementPolicy::Clamp => {
                self.current_index = self.current_index.min(self.cards.len() - 1);
                self.state = ReviewState::ShowingQuestion;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cards(n: usize) -> Vec<Flashcard> {
        (1..=n)
            .map(|i| Flashcard::new(format!("Q{}?", i), format!("A{}", i)))
            .collect()
    }

    #[test]
    fn test_next_wraps_after_n_steps() {
        for n in 1..=5 {
            let mut session = ReviewSession::new(cards(n));
            assert!(session.open());
            for _ in 0..n {
                session.next();
            }
            assert_eq!(session.current_index(), 0);
        }
    }

    #[test]
    fn test_prev_from_first_goes_to_last() {
        let mut session = ReviewSession::new(cards(4));
        session.open();
        session.prev();
        assert_eq!(session.current_index(), 3);
        assert_eq!(session.progress().unwrap().to_string(), "4 / 4");
    }

    #[test]
    fn test_navigation_hides_answer() {
        let mut session = ReviewSession::new(cards(3));
        session.open();

        session.flip();
        assert!(session.is_answer_shown());
        session.next();
        assert!(!session.is_answer_shown());

        session.flip();
        session.prev();
        assert!(!session.is_answer_shown());
        assert_eq!(session.state(), ReviewState::ShowingQuestion);
    }

    #[test]
    fn test_open_refused_without_cards() {
        let mut session = ReviewSession::new(Vec::new());
        assert!(matches!(session.try_open(), Err(ReviewError::EmptySession)));
        assert!(!session.open());
        assert_eq!(session.state(), ReviewState::Closed);
        assert!(session.face().is_none());
        assert!(session.progress().is_none());
    }

    #[test]
    fn test_flip_keeps_index() {
        let mut session = ReviewSession::new(cards(2));
        session.open();
        session.next();
        session.flip();

        assert_eq!(session.current_index(), 1);
        assert_eq!(session.face(), Some(CardFace::Answer("A2")));
        session.flip();
        assert_eq!(session.face(), Some(CardFace::Question("Q2?")));
    }

    #[test]
    fn test_close_resets_position() {
        let mut session = ReviewSession::new(cards(3));
        session.open();
        session.next();
        session.next();
        session.flip();
        session.close();

        assert!(!session.is_open());
        assert!(!session.is_answer_shown());
        assert_eq!(session.current_index(), 0);

        session.open();
        assert_eq!(session.face(), Some(CardFace::Question("Q1?")));
    }

    #[test]
    fn test_closed_session_ignores_navigation() {
        let mut session = ReviewSession::new(cards(3));
        session.next();
        session.prev();
        session.flip();

        assert_eq!(session.state(), ReviewState::Closed);
        assert_eq!(session.current_index(), 0);
    }

    #[test]
    fn test_replace_cards_force_closes_by_default() {
        let mut session = ReviewSession::new(cards(3));
        session.open();
        session.next();
        session.replace_cards(cards(1), ReplacementPolicy::Close);

        assert!(!session.is_open());
        assert_eq!(session.current_index(), 0);
        assert_eq!(session.len(), 1);
    }

    #[test]
    fn test_replace_cards_clamp_policy() {
        let mut session = ReviewSession::new(cards(5));
        session.open();
        session.prev();
        session.flip();
        session.replace_cards(cards(2), ReplacementPolicy::Clamp);

        assert!(session.is_open());
        assert_eq!(session.current_index(), 1);
        assert!(!session.is_answer_shown());

        session.replace_cards(Vec::new(), ReplacementPolicy::Clamp);
        assert!(!session.is_open());
    }

    #[test]
    fn test_card_face_labels() {
        assert_eq!(CardFace::Question("x").heading(), "Question:");
        assert_eq!(CardFace::Answer("y").heading(), "Answer:");
        assert_eq!(CardFace::Answer("y").text(), "y");
    }
}
