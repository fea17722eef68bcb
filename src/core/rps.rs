//! Rock-paper-scissors rules and the wagered two-player game state machine.
//!
//! A game waits for an opponent unless one was preset, then for one choice per player,
//! and resolves once both choices are in. Coins only move when the game resolves with a
//! winner; ties and cancelled games have no balance effect.

use crate::errors::{Error, Result};
use rand::Rng;
use std::{fmt, str::FromStr};

/// A hand in rock-paper-scissors
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Choice {
    /// Scissors
    Schere,
    /// Rock
    Stein,
    /// Paper
    Papier,
}

impl Choice {
    /// All choices in button order
    pub const ALL: [Self; 3] = [Self::Schere, Self::Stein, Self::Papier];

    /// Whether `self` beats `other`
    #[must_use]
    pub const fn beats(self, other: Self) -> bool {
        matches!(
            (self, other),
            (Self::Schere, Self::Papier) | (Self::Stein, Self::Schere) | (Self::Papier, Self::Stein)
        )
    }

    /// German name, also used as the component id suffix
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Schere => "Schere",
            Self::Stein => "Stein",
            Self::Papier => "Papier",
        }
    }

    /// Button label with emoji
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Schere => "Schere ✂️",
            Self::Stein => "Stein 🪨",
            Self::Papier => "Papier 📜",
        }
    }

    /// A uniformly random choice
    pub fn random<R>(rng: &mut R) -> Self
    where
        R: Rng,
    {
        Self::ALL[rng.random_range(0..Self::ALL.len())]
    }
}

impl fmt::Display for Choice {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Choice {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Self::ALL
            .into_iter()
            .find(|choice| choice.name().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| Error::Game {
                message: format!("Unbekannte Wahl '{s}'. Erlaubt: Schere, Stein, Papier."),
            })
    }
}

/// Outcome of one round from the first player's point of view
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Verdict {
    /// Both picked the same
    Tie,
    /// The first player won
    FirstWins,
    /// The second player won
    SecondWins,
}

/// Judges a round.
#[must_use]
pub const fn judge(first: Choice, second: Choice) -> Verdict {
    if first.beats(second) {
        Verdict::FirstWins
    } else if second.beats(first) {
        Verdict::SecondWins
    } else {
        Verdict::Tie
    }
}

/// Where a game stands
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GameState {
    /// Nobody has accepted the challenge yet
    AwaitingOpponent,
    /// Both players are known, at least one choice is missing
    AwaitingChoices,
    /// Both players chose
    Resolved(Resolution),
    /// Timed out before resolution
    Cancelled,
}

/// Final result of a resolved game
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Resolution {
    /// Nobody wins, no coins move
    Tie(Choice),
    /// `winner` takes the wager from `loser`
    Win {
        /// Winning user
        winner: u64,
        /// Losing user
        loser: u64,
        /// Winning hand
        winning: Choice,
        /// Losing hand
        losing: Choice,
    },
}

/// What a button press did
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Press {
    /// The presser became player two; their choice is not recorded
    Joined(u64),
    /// The choice was recorded, the other player still has to choose
    Recorded,
    /// The choice completed the game
    Resolved(Resolution),
}

/// One wagered game between two users.
#[derive(Debug, Clone)]
pub struct RpsGame {
    id: u64,
    player_one: u64,
    player_two: Option<u64>,
    wager: i64,
    choices: [Option<Choice>; 2],
    state: GameState,
}

impl RpsGame {
    /// Starts a game. `opponent` skips the waiting-for-opponent phase.
    pub fn new(id: u64, player_one: u64, opponent: Option<u64>, wager: i64) -> Result<Self> {
        if wager < 0 {
            return Err(Error::InvalidAmount { amount: wager });
        }
        if opponent == Some(player_one) {
            return Err(Error::InvalidTarget {
                issue: crate::errors::TargetIssue::SelfTarget,
            });
        }
        Ok(Self {
            id,
            player_one,
            player_two: opponent,
            wager,
            choices: [None, None],
            state: if opponent.is_some() {
                GameState::AwaitingChoices
            } else {
                GameState::AwaitingOpponent
            },
        })
    }

    /// Instance id, used to scope component ids
    #[must_use]
    pub const fn id(&self) -> u64 {
        self.id
    }

    /// The challenger
    #[must_use]
    pub const fn player_one(&self) -> u64 {
        self.player_one
    }

    /// The opponent, once known
    #[must_use]
    pub const fn player_two(&self) -> Option<u64> {
        self.player_two
    }

    /// Coins at stake
    #[must_use]
    pub const fn wager(&self) -> i64 {
        self.wager
    }

    /// Current state
    #[must_use]
    pub const fn state(&self) -> GameState {
        self.state
    }

    /// Whether no further input is accepted
    #[must_use]
    pub const fn is_finished(&self) -> bool {
        matches!(self.state, GameState::Resolved(_) | GameState::Cancelled)
    }

    /// Whether `user` would become player two by pressing a button now.
    #[must_use]
    pub fn would_join(&self, user: u64) -> bool {
        self.state == GameState::AwaitingOpponent && user != self.player_one
    }

    /// Handles a button press by `user`.
    ///
    /// While waiting for an opponent, the challenger may already lock in a choice and
    /// the first other user to press joins as player two. Each player chooses once.
    pub fn press(&mut self, user: u64, choice: Choice) -> Result<Press> {
        if self.is_finished() {
            return Err(Error::Game {
                message: "Dieses Spiel ist bereits beendet.".to_string(),
            });
        }

        if self.would_join(user) {
            self.player_two = Some(user);
            self.state = GameState::AwaitingChoices;
            return Ok(Press::Joined(user));
        }

        let slot = if user == self.player_one {
            0
        } else if Some(user) == self.player_two {
            1
        } else {
            return Err(Error::InvalidTarget {
                issue: crate::errors::TargetIssue::NotParticipant,
            });
        };

        if self.choices[slot].is_some() {
            return Err(Error::Game {
                message: "Du hast bereits gewählt.".to_string(),
            });
        }
        self.choices[slot] = Some(choice);

        match (self.state, self.choices, self.player_two) {
            (GameState::AwaitingChoices, [Some(first), Some(second)], Some(player_two)) => {
                let resolution = match judge(first, second) {
                    Verdict::Tie => Resolution::Tie(first),
                    Verdict::FirstWins => Resolution::Win {
                        winner: self.player_one,
                        loser: player_two,
                        winning: first,
                        losing: second,
                    },
                    Verdict::SecondWins => Resolution::Win {
                        winner: player_two,
                        loser: self.player_one,
                        winning: second,
                        losing: first,
                    },
                };
                self.state = GameState::Resolved(resolution);
                Ok(Press::Resolved(resolution))
            }
            _ => Ok(Press::Recorded),
        }
    }

    /// Cancels an unfinished game. Returns whether an opponent had joined.
    pub fn cancel(&mut self) -> bool {
        if !self.is_finished() {
            self.state = GameState::Cancelled;
        }
        self.player_two.is_some()
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used, clippy::panic)]
    use super::*;
    use crate::errors::TargetIssue;

    #[test]
    fn test_rules() {
        assert_eq!(judge(Choice::Stein, Choice::Schere), Verdict::FirstWins);
        assert_eq!(judge(Choice::Schere, Choice::Stein), Verdict::SecondWins);
        assert_eq!(judge(Choice::Papier, Choice::Stein), Verdict::FirstWins);
        assert_eq!(judge(Choice::Papier, Choice::Papier), Verdict::Tie);
        assert_eq!("stein".parse::<Choice>().unwrap(), Choice::Stein);
        assert!(matches!("Brunnen".parse::<Choice>(), Err(Error::Game { .. })));
    }

    #[test]
    fn test_preset_opponent_game() {
        let mut game = RpsGame::new(1, 10, Some(20), 20).unwrap();
        assert_eq!(game.state(), GameState::AwaitingChoices);

        assert_eq!(game.press(10, Choice::Stein).unwrap(), Press::Recorded);
        let press = game.press(20, Choice::Schere).unwrap();
        assert_eq!(
            press,
            Press::Resolved(Resolution::Win {
                winner: 10,
                loser: 20,
                winning: Choice::Stein,
                losing: Choice::Schere,
            })
        );
        assert!(game.is_finished());
        assert!(game.press(10, Choice::Papier).is_err());
    }

    #[test]
    fn test_open_challenge_join_does_not_count_as_choice() {
        let mut game = RpsGame::new(1, 10, None, 0).unwrap();
        assert_eq!(game.state(), GameState::AwaitingOpponent);

        assert_eq!(game.press(10, Choice::Papier).unwrap(), Press::Recorded);
        assert_eq!(game.state(), GameState::AwaitingOpponent);

        assert_eq!(game.press(30, Choice::Stein).unwrap(), Press::Joined(30));
        assert_eq!(game.player_two(), Some(30));

        assert_eq!(
            game.press(30, Choice::Papier).unwrap(),
            Press::Resolved(Resolution::Tie(Choice::Papier))
        );
    }

    #[test]
    fn test_each_player_chooses_once_and_outsiders_are_rejected() {
        let mut game = RpsGame::new(1, 10, Some(20), 5).unwrap();
        game.press(10, Choice::Stein).unwrap();
        assert!(matches!(game.press(10, Choice::Papier), Err(Error::Game { .. })));
        assert!(matches!(
            game.press(99, Choice::Papier),
            Err(Error::InvalidTarget {
                issue: TargetIssue::NotParticipant
            })
        ));
    }

    #[test]
    fn test_cancel() {
        let mut game = RpsGame::new(1, 10, None, 5).unwrap();
        assert!(!game.cancel());
        assert_eq!(game.state(), GameState::Cancelled);
        assert!(game.press(20, Choice::Stein).is_err());
    }

    #[tokio::test]
    async fn test_cancel_after_join_moves_no_coins() -> Result<()> {
        use crate::core::economy::balance;
        use crate::test_utils::{set_balance, setup_test_db};

        let db = setup_test_db().await?;
        set_balance(&db, 1, 10, 100).await?;
        set_balance(&db, 1, 30, 100).await?;

        let mut game = RpsGame::new(9, 10, None, 40)?;
        game.press(10, Choice::Papier)?;
        assert_eq!(game.press(30, Choice::Stein)?, Press::Joined(30));

        assert!(game.cancel());
        assert_eq!(game.state(), GameState::Cancelled);
        assert!(game.is_finished());
        assert!(game.press(30, Choice::Schere).is_err());

        assert_eq!(balance(&db, 1, 10).await?, 100);
        assert_eq!(balance(&db, 1, 30).await?, 100);
        Ok(())
    }

    #[test]
    fn test_rejected_press_keeps_game_playable() {
        let mut game = RpsGame::new(1, 10, Some(20), 0).unwrap();
        game.press(10, Choice::Stein).unwrap();
        assert!(game.press(30, Choice::Papier).is_err());
        assert!(game.press(10, Choice::Papier).is_err());
        assert!(!game.is_finished());

        assert!(matches!(
            game.press(20, Choice::Schere).unwrap(),
            Press::Resolved(Resolution::Win { winner: 10, loser: 20, .. })
        ));
    }

    #[tokio::test]
    async fn test_wagered_game_moves_coins_to_winner() -> Result<()> {
        use crate::core::economy::{balance, settle_wager};
        use crate::test_utils::{set_balance, setup_test_db};

        let db = setup_test_db().await?;
        set_balance(&db, 1, 10, 100).await?;
        set_balance(&db, 1, 20, 100).await?;

        let mut game = RpsGame::new(7, 10, Some(20), 20)?;
        game.press(10, Choice::Stein)?;
        let Press::Resolved(Resolution::Win { winner, loser, .. }) = game.press(20, Choice::Schere)? else {
            panic!("game should have a winner");
        };
        settle_wager(&db, 1, winner, loser, game.wager()).await?;

        assert_eq!(balance(&db, 1, 10).await?, 120);
        assert_eq!(balance(&db, 1, 20).await?, 80);
        Ok(())
    }

    #[test]
    fn test_invalid_setup() {
        assert!(matches!(
            RpsGame::new(1, 10, None, -1),
            Err(Error::InvalidAmount { amount: -1 })
        ));
        assert!(RpsGame::new(1, 10, Some(10), 0).is_err());
    }
}
