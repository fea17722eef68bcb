//! Multi-turn AI conversations built from Discord reply chains.
//!
//! Every `/ai ask` answer message is recorded as a thread root together with the
//! question that produced it. When somebody replies into such a thread, the chain of
//! replies is walked upward to the root and turned into a chat history.

use crate::{
    core::{layout, store},
    errors::Result,
};
use sea_orm::ConnectionTrait;
use serde::Serialize;
use std::future::Future;

/// Discord's per-message content limit
pub const MESSAGE_LIMIT: usize = 2000;

/// Author role of a chat turn
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    /// A human (and the system prompt, which the model expects as a user turn)
    User,
    /// The bot
    Assistant,
}

/// One message of a chat history
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Turn {
    /// Author role
    pub role: Role,
    /// Message text
    pub content: String,
}

impl Turn {
    /// A user turn
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            content: content.into(),
        }
    }

    /// An assistant turn
    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: Role::Assistant,
            content: content.into(),
        }
    }
}

/// The parts of a chat message the walk needs
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChainMessage {
    /// Message id
    pub id: u64,
    /// Id of the message this one replies to
    pub parent_id: Option<u64>,
    /// Whether the bot wrote the message
    pub from_bot: bool,
    /// Text content
    pub content: String,
}

/// Source of chain messages and recorded thread roots.
pub trait MessageLookup {
    /// Fetches a message, `None` when it is gone or inaccessible.
    fn fetch(&self, id: u64) -> impl Future<Output = Result<Option<ChainMessage>>> + Send;

    /// The question recorded for a thread root, `None` when `root` did not come from
    /// `/ai ask`.
    fn ask_prompt(&self, root: u64) -> impl Future<Output = Result<Option<String>>> + Send;
}

/// Result of walking a reply chain
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ChainOutcome {
    /// The chain ends in an `/ai ask` answer; the history is oldest first
    Rooted(Vec<Turn>),
    /// The chain belongs to some other conversation, is broken, or is too deep
    Unrooted,
}

/// Walks from `start` (the message being replied to) up to the root of its reply chain.
///
/// At most `max_depth` messages are visited. The root's recorded question becomes the
/// first user turn; every later message becomes an assistant turn when the bot wrote
/// it and a user turn otherwise. The root's own text (the first answer) is not part of
/// the history, the model sees only the question that produced it.
pub async fn reconstruct_history<L>(
    lookup: &L,
    start: ChainMessage,
    max_depth: usize,
) -> Result<ChainOutcome>
where
    L: MessageLookup + Sync,
{
    let mut chain = vec![start];

    while let Some(parent) = chain.last().and_then(|m| m.parent_id) {
        if chain.len() >= max_depth {
            tracing::debug!(max_depth, "reply chain exceeds depth limit");
            return Ok(ChainOutcome::Unrooted);
        }
        match lookup.fetch(parent).await? {
            Some(message) => chain.push(message),
            None => return Ok(ChainOutcome::Unrooted),
        }
    }

    chain.reverse();
    let Some((root, rest)) = chain.split_first() else {
        return Ok(ChainOutcome::Unrooted);
    };
    let Some(prompt) = lookup.ask_prompt(root.id).await? else {
        return Ok(ChainOutcome::Unrooted);
    };

    let history = std::iter::once(Turn::user(prompt))
        .chain(rest.iter().map(|message| {
            if message.from_bot {
                Turn::assistant(message.content.clone())
            } else {
                Turn::user(message.content.clone())
            }
        }))
        .collect();

    Ok(ChainOutcome::Rooted(history))
}

/// Records `message` as the root of an AI thread started by `question`.
pub async fn record_thread<C>(db: &C, guild: u64, message: u64, question: &str) -> Result<()>
where
    C: ConnectionTrait,
{
    store::set(db, &layout::ai_thread(guild, message), "question", question).await
}

/// Question recorded for a thread root.
pub async fn thread_question<C>(db: &C, guild: u64, message: u64) -> Result<Option<String>>
where
    C: ConnectionTrait,
{
    store::get_string(db, &format!("{}/question", layout::ai_thread(guild, message))).await
}

/// Splits `text` into pieces of at most `limit` characters, never inside a character.
/// Empty text yields one empty chunk so there is always something to send.
#[must_use]
pub fn chunk_text(text: &str, limit: usize) -> Vec<String> {
    let limit = limit.max(1);
    let chars: Vec<char> = text.chars().collect();
    if chars.is_empty() {
        return vec![String::new()];
    }
    chars.chunks(limit).map(|c| c.iter().collect()).collect()
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]
    use super::*;
    use crate::test_utils::setup_test_db;
    use std::collections::HashMap;

    #[derive(Default)]
    struct FakeChannel {
        messages: HashMap<u64, ChainMessage>,
        prompts: HashMap<u64, String>,
    }

    impl FakeChannel {
        fn add(&mut self, id: u64, parent_id: Option<u64>, from_bot: bool, content: &str) -> ChainMessage {
            let message = ChainMessage {
                id,
                parent_id,
                from_bot,
                content: content.to_string(),
            };
            self.messages.insert(id, message.clone());
            message
        }
    }

    impl MessageLookup for FakeChannel {
        async fn fetch(&self, id: u64) -> Result<Option<ChainMessage>> {
            Ok(self.messages.get(&id).cloned())
        }

        async fn ask_prompt(&self, root: u64) -> Result<Option<String>> {
            Ok(self.prompts.get(&root).cloned())
        }
    }

    #[tokio::test]
    async fn test_rooted_chain_builds_history() -> Result<()> {
        let mut channel = FakeChannel::default();
        channel.add(1, None, true, "Antwort auf P");
        channel.prompts.insert(1, "P".to_string());
        channel.add(2, Some(1), false, "R1");
        let r2 = channel.add(3, Some(2), true, "R2");

        let outcome = reconstruct_history(&channel, r2, 25).await?;
        assert_eq!(
            outcome,
            ChainOutcome::Rooted(vec![
                Turn::user("P"),
                Turn::user("R1"),
                Turn::assistant("R2"),
            ])
        );
        Ok(())
    }

    #[tokio::test]
    async fn test_reply_directly_to_root() -> Result<()> {
        let mut channel = FakeChannel::default();
        let root = channel.add(1, None, true, "Antwort");
        channel.prompts.insert(1, "Frage".to_string());

        let outcome = reconstruct_history(&channel, root, 25).await?;
        assert_eq!(outcome, ChainOutcome::Rooted(vec![Turn::user("Frage")]));
        Ok(())
    }

    #[tokio::test]
    async fn test_chain_not_rooted_in_ask_is_ignored() -> Result<()> {
        let mut channel = FakeChannel::default();
        channel.add(1, None, false, "hallo");
        let reply = channel.add(2, Some(1), true, "hi");

        assert_eq!(
            reconstruct_history(&channel, reply, 25).await?,
            ChainOutcome::Unrooted
        );
        Ok(())
    }

    #[tokio::test]
    async fn test_broken_chain_is_unrooted() -> Result<()> {
        let mut channel = FakeChannel::default();
        channel.prompts.insert(1, "P".to_string());
        let orphan = channel.add(2, Some(1), false, "R1");

        assert_eq!(
            reconstruct_history(&channel, orphan, 25).await?,
            ChainOutcome::Unrooted
        );
        Ok(())
    }

    #[tokio::test]
    async fn test_depth_limit() -> Result<()> {
        let mut channel = FakeChannel::default();
        channel.add(0, None, true, "root");
        channel.prompts.insert(0, "P".to_string());
        let mut last = None;
        for id in 1..=10 {
            last = Some(channel.add(id, Some(id - 1), id % 2 == 0, "x"));
        }
        let last = last.unwrap();

        assert_eq!(
            reconstruct_history(&channel, last.clone(), 5).await?,
            ChainOutcome::Unrooted
        );
        assert!(matches!(
            reconstruct_history(&channel, last, 11).await?,
            ChainOutcome::Rooted(history) if history.len() == 11
        ));
        Ok(())
    }

    #[tokio::test]
    async fn test_thread_records_round_trip() -> Result<()> {
        let db = setup_test_db().await?;
        assert_eq!(thread_question(&db, 1, 99).await?, None);
        record_thread(&db, 1, 99, "Wie spät ist es?").await?;
        assert_eq!(
            thread_question(&db, 1, 99).await?,
            Some("Wie spät ist es?".to_string())
        );
        Ok(())
    }

    #[test]
    fn test_chunk_text() {
        assert_eq!(chunk_text("", 2000), vec![String::new()]);
        assert_eq!(chunk_text("abcde", 2), vec!["ab", "cd", "e"]);
        let umlauts = "ä".repeat(2001);
        let chunks = chunk_text(&umlauts, MESSAGE_LIMIT);
        assert_eq!(chunks.len(), 2);
        assert_eq!(chunks[0].chars().count(), 2000);
    }

    #[test]
    fn test_turn_serializes_as_chat_message() {
        let json = serde_json::to_value(Turn::assistant("ok")).unwrap();
        assert_eq!(json, serde_json::json!({"role": "assistant", "content": "ok"}));
    }
}
