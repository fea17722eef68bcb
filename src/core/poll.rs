//! Button polls: one vote per user, re-voting moves the vote.

use crate::errors::{Error, Result};
use std::collections::HashMap;

/// Smallest number of options a poll may have
pub const MIN_OPTIONS: usize = 2;
/// Largest number of options a poll may have
pub const MAX_OPTIONS: usize = 4;
/// Reactions used by reaction polls, one per option
pub const NUMBER_EMOJIS: [&str; MAX_OPTIONS] = ["1️⃣", "2️⃣", "3️⃣", "4️⃣"];

/// One running poll
#[derive(Debug, Clone)]
pub struct Poll {
    question: String,
    options: Vec<String>,
    voters: HashMap<u64, usize>,
}

impl Poll {
    /// Creates a poll from its question and 2 to 4 non-empty options.
    pub fn new<I, S>(question: impl Into<String>, options: I) -> Result<Self>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let options: Vec<String> = options
            .into_iter()
            .map(Into::into)
            .filter(|option: &String| !option.trim().is_empty())
            .collect();

        if !(MIN_OPTIONS..=MAX_OPTIONS).contains(&options.len()) {
            return Err(Error::Game {
                message: format!(
                    "Eine Umfrage braucht {MIN_OPTIONS} bis {MAX_OPTIONS} Optionen."
                ),
            });
        }

        Ok(Self {
            question: question.into(),
            options,
            voters: HashMap::new(),
        })
    }

    /// The question
    #[must_use]
    pub fn question(&self) -> &str {
        &self.question
    }

    /// The options in display order
    #[must_use]
    pub fn options(&self) -> &[String] {
        &self.options
    }

    /// Records the vote of `voter`, replacing an earlier vote.
    pub fn vote(&mut self, voter: u64, option: usize) -> Result<()> {
        if option >= self.options.len() {
            return Err(Error::NotFound {
                what: format!("Option {}", option + 1),
            });
        }
        self.voters.insert(voter, option);
        Ok(())
    }

    /// Vote count per option
    #[must_use]
    pub fn tally(&self) -> Vec<usize> {
        let mut counts = vec![0; self.options.len()];
        for option in self.voters.values() {
            counts[*option] += 1;
        }
        counts
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]
    use super::*;

    #[test]
    fn test_option_count_is_validated() {
        assert!(Poll::new("?", ["a"]).is_err());
        assert!(Poll::new("?", ["a", "  "]).is_err());
        assert!(Poll::new("?", ["a", "b", "c", "d", "e"]).is_err());
        assert_eq!(Poll::new("?", ["a", "b", "c"]).unwrap().options().len(), 3);
    }

    #[test]
    fn test_revote_moves_vote() {
        let mut poll = Poll::new("Pizza?", ["Ja", "Nein"]).unwrap();
        poll.vote(1, 0).unwrap();
        poll.vote(2, 0).unwrap();
        assert_eq!(poll.tally(), vec![2, 0]);

        poll.vote(1, 1).unwrap();
        assert_eq!(poll.tally(), vec![1, 1]);

        poll.vote(1, 1).unwrap();
        assert_eq!(poll.tally(), vec![1, 1]);
    }

    #[test]
    fn test_unknown_option_is_rejected() {
        let mut poll = Poll::new("?", ["a", "b"]).unwrap();
        assert!(matches!(poll.vote(1, 2), Err(Error::NotFound { .. })));
        assert_eq!(poll.tally(), vec![0, 0]);
    }
}
