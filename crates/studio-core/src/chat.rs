//! Conversation helpers
//!
//! The model is stateless, so every refinement re-sends the whole story:
//! the first description, each follow-up request, and the schedule and
//! summary it produced last time.

use crate::i18n::Translate;
use crate::proposal::Proposal;
use crate::state::{ChatMessage, ChatRole};

/// Build the description sent to the model from the conversation so far.
///
/// `initial` is the description the session started with, if any. When it
/// is absent the first user message plays that role. `new_text` is a user
/// message that has not been appended to `history` yet.
pub fn build_description(
    initial: Option<&str>,
    history: &[ChatMessage],
    new_text: Option<&str>,
    proposal: Option<&Proposal>,
    t: &dyn Translate,
) -> String {
    let user_messages: Vec<&str> = history
        .iter()
        .filter(|m| m.role == ChatRole::User)
        .map(|m| m.content.as_str())
        .collect();

    let initial = initial.filter(|s| !s.trim().is_empty());
    let skip = if initial.is_some() { 0 } else { 1 };
    let refinements: Vec<&str> = user_messages
        .iter()
        .skip(skip)
        .copied()
        .chain(new_text)
        .filter(|s| !s.trim().is_empty())
        .collect();

    let mut description = initial
        .or_else(|| user_messages.first().copied())
        .unwrap_or_default()
        .to_string();

    // With no history at all the new text is the description itself.
    if description.is_empty() && refinements.len() == 1 {
        return refinements[0].trim().to_string();
    }

    if !refinements.is_empty() {
        description.push_str("\n\n");
        description.push_str(&t.t("chat.refinements"));
        for item in &refinements {
            description.push_str("\n- ");
            description.push_str(item);
        }
    }

    if let Some(proposal) = proposal {
        if !proposal.timeline.is_empty() {
            description.push_str("\n\n");
            description.push_str(&t.t("chat.timelineContext"));
            for entry in &proposal.timeline {
                description.push_str("\n- ");
                description.push_str(&entry.schedule_line());
            }
        }
        if !proposal.summary.is_empty() {
            description.push_str("\n\n");
            description.push_str(&t.t("chat.currentSummary"));
            description.push('\n');
            description.push_str(&proposal.summary);
        }
    }

    description.trim().to_string()
}

/// Assistant message text for a fresh proposal. `updated` picks the header
/// used for refinements.
pub fn compose_assistant_message(proposal: &Proposal, updated: bool, t: &dyn Translate) -> String {
    let header = if updated {
        t.t("chat.updatedSchedule")
    } else {
        t.t("chat.suggestedSchedule")
    };

    let mut lines = vec![header];
    lines.extend(proposal.timeline.iter().map(|e| e.schedule_line()));

    let mut message = lines.join("\n");
    message.push_str("\n\n");
    message.push_str(&t.t("chat.projectSummary"));
    message.push('\n');
    message.push_str(&proposal.summary);
    message
}
