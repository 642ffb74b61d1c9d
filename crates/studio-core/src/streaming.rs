//! Word-by-word reveal of assistant messages
//!
//! A finished response is replayed a word at a time so it reads as if it
//! were being typed. Each presentation runs as its own task with its own
//! buffer and message id; updates go out on a channel and the receiver
//! applies them to the message they name. Dropping the [`StreamHandle`]
//! cancels the presentation.

use std::time::Duration;

use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::debug;

pub const WORD_DELAY: Duration = Duration::from_millis(80);

pub type MessageId = usize;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StreamUpdate {
    pub message_id: MessageId,
    pub content: String,
    /// False only on the last update for a message.
    pub is_streaming: bool,
}

/// Every intermediate content state, in order: one per revealed word.
/// Each state is a prefix of the text cut at the end of a word, so
/// indentation and runs of spaces survive.
pub fn reveal_steps(text: &str) -> Vec<String> {
    let mut steps = Vec::new();
    let mut shown = String::new();

    for line in text.lines() {
        let mut in_word = false;
        for (i, c) in line.char_indices() {
            if c.is_whitespace() {
                if in_word {
                    steps.push(format!("{}{}", shown, &line[..i]));
                }
                in_word = false;
            } else {
                in_word = true;
            }
        }
        if in_word {
            steps.push(format!("{}{}", shown, line));
        }
        shown.push_str(line);
        shown.push('\n');
    }
    steps
}

pub struct StreamHandle {
    task: JoinHandle<()>,
}

impl StreamHandle {
    pub fn is_finished(&self) -> bool {
        self.task.is_finished()
    }

    pub fn abort(&self) {
        self.task.abort();
    }
}

impl Drop for StreamHandle {
    fn drop(&mut self) {
        self.task.abort();
    }
}

#[derive(Clone)]
pub struct StreamingPresenter {
    tx: mpsc::UnboundedSender<StreamUpdate>,
    delay: Duration,
}

impl StreamingPresenter {
    pub fn new(tx: mpsc::UnboundedSender<StreamUpdate>) -> Self {
        Self::with_delay(tx, WORD_DELAY)
    }

    pub fn with_delay(tx: mpsc::UnboundedSender<StreamUpdate>, delay: Duration) -> Self {
        Self { tx, delay }
    }

    /// Start revealing `text` into message `message_id`. Must be called from
    /// within a tokio runtime.
    pub fn present(&self, message_id: MessageId, text: &str) -> StreamHandle {
        let steps = reveal_steps(text);
        let tx = self.tx.clone();
        let delay = self.delay;

        debug!(message_id, words = steps.len(), "stream started");
        let task = tokio::spawn(async move {
            let mut last = String::new();
            for (i, content) in steps.into_iter().enumerate() {
                if i > 0 {
                    tokio::time::sleep(delay).await;
                }
                last = content.clone();
                let update = StreamUpdate {
                    message_id,
                    content,
                    is_streaming: true,
                };
                if tx.send(update).is_err() {
                    return;
                }
            }
            let _ = tx.send(StreamUpdate {
                message_id,
                content: last,
                is_streaming: false,
            });
            debug!(message_id, "stream finished");
        });

        StreamHandle { task }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    async fn collect(rx: &mut mpsc::UnboundedReceiver<StreamUpdate>) -> Vec<StreamUpdate> {
        let mut updates = Vec::new();
        while let Some(update) = rx.recv().await {
            let done = !update.is_streaming;
            updates.push(update);
            if done {
                break;
            }
        }
        updates
    }

    #[test]
    fn test_reveal_steps_multiline() {
        assert_eq!(
            reveal_steps("One two\n\nThree"),
            vec!["One", "One two", "One two\n\nThree"]
        );
        assert!(reveal_steps("").is_empty());
    }

    #[test]
    fn test_reveal_steps_keep_spacing() {
        let text = "Schedule:\n  - Design  — 2 weeks";
        let steps = reveal_steps(text);
        assert_eq!(steps.first().map(String::as_str), Some("Schedule:"));
        assert_eq!(steps[1], "Schedule:\n  -");
        assert_eq!(steps[2], "Schedule:\n  - Design");
        assert_eq!(steps.last().map(String::as_str), Some(text));
        assert_eq!(steps.len(), 6);
    }

    #[tokio::test(start_paused = true)]
    async fn test_hello_world_states() {
        let (tx, mut rx) = mpsc::unbounded_channel();
        let presenter = StreamingPresenter::new(tx);
        let started = tokio::time::Instant::now();
        let _handle = presenter.present(7, "Hello world");

        let updates = collect(&mut rx).await;
        let states: Vec<(&str, bool)> = updates
            .iter()
            .map(|u| (u.content.as_str(), u.is_streaming))
            .collect();
        assert_eq!(
            states,
            vec![("Hello", true), ("Hello world", true), ("Hello world", false)]
        );
        assert!(updates.iter().all(|u| u.message_id == 7));
        assert_eq!(started.elapsed(), WORD_DELAY);
    }

    #[tokio::test(start_paused = true)]
    async fn test_empty_text_finishes_immediately() {
        let (tx, mut rx) = mpsc::unbounded_channel();
        let _handle = StreamingPresenter::new(tx).present(1, "   ");
        let updates = collect(&mut rx).await;
        assert_eq!(
            updates,
            vec![StreamUpdate {
                message_id: 1,
                content: String::new(),
                is_streaming: false
            }]
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_concurrent_streams_stay_separate() {
        let (tx, mut rx) = mpsc::unbounded_channel();
        let presenter = StreamingPresenter::new(tx);
        let _a = presenter.present(1, "alpha beta gamma");
        let _b = presenter.present(2, "one two");

        let mut finals = std::collections::HashMap::new();
        let mut last_seen: std::collections::HashMap<MessageId, String> = Default::default();
        while finals.len() < 2 {
            let update = rx.recv().await.unwrap();
            // Each message only ever grows from its own previous state.
            if let Some(prev) = last_seen.get(&update.message_id) {
                assert!(update.content.starts_with(prev.as_str()));
            }
            last_seen.insert(update.message_id, update.content.clone());
            if !update.is_streaming {
                finals.insert(update.message_id, update.content);
            }
        }
        assert_eq!(finals[&1], "alpha beta gamma");
        assert_eq!(finals[&2], "one two");
    }

    #[tokio::test(start_paused = true)]
    async fn test_dropping_handle_cancels() {
        let (tx, mut rx) = mpsc::unbounded_channel();
        let handle = StreamingPresenter::new(tx).present(3, "a b c d e");
        let first = rx.recv().await.unwrap();
        assert_eq!(first.content, "a");
        drop(handle);

        tokio::time::sleep(WORD_DELAY * 10).await;
        let mut rest = Vec::new();
        while let Ok(update) = rx.try_recv() {
            rest.push(update);
        }
        assert!(rest.iter().all(|u| u.is_streaming));
        assert!(rest.len() < 4);
    }
}
