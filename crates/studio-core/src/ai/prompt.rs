//! Prompt construction and response parsing shared by every provider

use crate::i18n::Locale;
use crate::proposal::Proposal;

use super::ProposalError;

const GLOBAL_RULES: &[&str] = &[
    "Be concise, practical and free of hype.",
    "Stay strictly on the project scope; do not invent missing details.",
    "If information is insufficient, make minimal safe assumptions and state them explicitly.",
    "Avoid sensitive, illegal or harmful content.",
    "Prefer bullet points and short paragraphs in strings where appropriate.",
    "Do not include markdown code fences or markdown headings; plain text only inside JSON strings.",
    "Keep timelines realistic; do not promise guaranteed results.",
    "Do not include pricing unless asked. If currency appears, use BRL format: R$ 12.345,67.",
];

const SCHEMA_INSTRUCTION: &str = "Return ONLY valid JSON that matches this TypeScript type:
type GeneratedProposal = {
  title: string;
  summary: string;
  sections: Array<{ heading: string; content: string[] }>;
  timeline: Array<{ phase: string; duration: string; details: string }>;
  budgetNote: string;
};
Do not include markdown code fences.";

/// Full prompt: schema instruction, guardrails, then the user's description.
pub fn build_prompt(description: &str, locale: Locale) -> String {
    let mut rules = vec![format!("Write in {}.", locale.prompt_language())];
    rules.extend(GLOBAL_RULES.iter().map(|r| r.to_string()));

    format!(
        "{}\n\nGlobal rules:\n- {}\n\nUser description:\n{}",
        SCHEMA_INSTRUCTION,
        rules.join("\n- "),
        description
    )
}

/// Parse model output into a proposal. Surrounding prose and markdown code
/// fences are tolerated; anything outside the outermost braces is ignored.
pub fn parse_proposal_json(text: &str) -> Result<Proposal, ProposalError> {
    let trimmed = text.trim();
    if trimmed.is_empty() {
        return Err(ProposalError::Empty);
    }

    let body = match (trimmed.find('{'), trimmed.rfind('}')) {
        (Some(start), Some(end)) if end > start => &trimmed[start..=end],
        _ => trimmed,
    };

    Ok(serde_json::from_str(body)?)
}
