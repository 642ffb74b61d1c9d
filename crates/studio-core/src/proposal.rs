//! Proposal data returned by the AI collaborator
//!
//! The field names follow the JSON schema the prompt asks the model for,
//! so `serde` does the mapping directly (camelCase on the wire).

use serde::{Deserialize, Serialize};

/// A generated project plan.
///
/// A new proposal always replaces the previous one wholesale; nothing in
/// the studio merges two proposals together.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Proposal {
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub summary: String,
    #[serde(default)]
    pub sections: Vec<Section>,
    #[serde(default)]
    pub timeline: Vec<TimelineEntry>,
    #[serde(default)]
    pub budget_note: String,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Section {
    #[serde(default)]
    pub heading: String,
    #[serde(default)]
    pub content: Vec<String>,
}

/// One phase of the suggested schedule. `duration` is free text
/// ("2-3 weeks", "Ongoing", "4 semanas").
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct TimelineEntry {
    #[serde(default)]
    pub phase: String,
    #[serde(default)]
    pub duration: String,
    #[serde(default)]
    pub details: String,
}

impl TimelineEntry {
    /// `Phase — duration: details`, the line shape the chat transcript uses.
    pub fn schedule_line(&self) -> String {
        format!("{} — {}: {}", self.phase, self.duration, self.details)
    }
}

impl Proposal {
    pub fn is_empty(&self) -> bool {
        self.sections.is_empty() && self.timeline.is_empty() && self.summary.trim().is_empty()
    }

    /// Render the proposal as Markdown for export and clipboard copy.
    pub fn to_markdown(&self) -> String {
        let mut md = String::new();

        if !self.title.is_empty() {
            md.push_str(&format!("# {}\n\n", self.title));
        }
        if !self.summary.is_empty() {
            md.push_str(&format!("{}\n\n", self.summary));
        }

        for section in &self.sections {
            md.push_str(&format!("## {}\n\n", section.heading));
            for item in &section.content {
                md.push_str(&format!("- {}\n", item));
            }
            md.push('\n');
        }

        if !self.timeline.is_empty() {
            md.push_str("## Timeline\n\n");
            for (i, entry) in self.timeline.iter().enumerate() {
                md.push_str(&format!(
                    "{}. **{}** ({}): {}\n",
                    i + 1,
                    entry.phase,
                    entry.duration,
                    entry.details
                ));
            }
            md.push('\n');
        }

        if !self.budget_note.is_empty() {
            md.push_str(&format!("> {}\n", self.budget_note));
        }

        md
    }
}
