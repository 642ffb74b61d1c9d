//! Line classifier for assistant messages
//!
//! Every line of an assistant message maps to one [`Block`]. Classification
//! is a pure function of the line, so it can be re-run on each growing
//! prefix while a message streams in. Lines that almost match a richer
//! pattern (a card missing its detail, say) fall through to the next rule
//! instead of failing.

use std::sync::OnceLock;

use regex::Regex;

/// Duration vocabulary shared by the card patterns.
const DURATION: &str = r"(?:\d+(?:[.,]\d+)?(?:\s*(?:-|–|—|to|a|até)\s*\d+(?:[.,]\d+)?)?\s*(?:days?|weeks?|months?|hours?|dias?|semanas?|m[eê]s|meses|horas?)\b\.?|ongoing|continuous|cont[ií]nuo)";

const HEADING_MAX_CHARS: usize = 80;

/// Headings that render plain instead of accent-colored.
const NEUTRAL_HEADINGS: &[&str] = &[
    "project summary",
    "suggested schedule",
    "updated schedule",
    "updated proposal",
    "resumo do projeto",
    "cronograma sugerido",
    "cronograma atualizado",
    "proposta atualizada",
];

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Segment {
    pub text: String,
    pub bold: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Block {
    /// A schedule line. `title` is absent for the `Duration: Details` form.
    Card {
        title: Option<String>,
        duration: String,
        detail: String,
    },
    Heading {
        text: String,
        neutral: bool,
    },
    Bullet {
        text: String,
    },
    /// Inline `**bold**` runs; odd segments are bold.
    Rich {
        segments: Vec<Segment>,
    },
    Paragraph {
        text: String,
    },
}

fn separator_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    // An en dash only separates when spaced, so "2–3 weeks" stays whole.
    RE.get_or_init(|| Regex::new(r"\s*—\s*|\s+–\s+").expect("valid separator pattern"))
}

fn duration_only_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(&format!(r"(?i)^{}$", DURATION)).expect("valid duration pattern")
    })
}

fn duration_anywhere_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(&format!(r"(?i)(?:^|\W){}", DURATION)).expect("valid duration search pattern")
    })
}

/// The duration may carry qualifiers around it, as in
/// `Build — about 2 weeks (part-time): API`.
fn titled_card_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(&format!(
            r"(?i)^(.+?)\s*(?:—|\s–)\s*([^:]*?{}[^:]*?)\s*:\s*(.+)$",
            DURATION
        ))
        .expect("valid titled card pattern")
    })
}

fn untitled_card_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(&format!(r"(?i)^({})\s*:\s*(.+)$", DURATION)).expect("valid card pattern")
    })
}

fn numbered_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^\d+\.\s*").expect("valid numbered pattern"))
}

pub fn is_duration(text: &str) -> bool {
    duration_only_re().is_match(text.trim())
}

/// True when a duration expression appears anywhere in `text`.
pub fn mentions_duration(text: &str) -> bool {
    duration_anywhere_re().is_match(text)
}

pub fn is_neutral_heading(text: &str) -> bool {
    let label = text.trim().trim_end_matches(':').trim().to_lowercase();
    NEUTRAL_HEADINGS.contains(&label.as_str())
}

/// Split on `**` and alternate plain and bold. Empty runs are dropped.
pub fn inline_segments(line: &str) -> Vec<Segment> {
    line.split("**")
        .enumerate()
        .filter(|(_, part)| !part.is_empty())
        .map(|(i, part)| Segment {
            text: part.to_string(),
            bold: i % 2 == 1,
        })
        .collect()
}

fn triplet(line: &str) -> Option<Block> {
    let parts: Vec<&str> = separator_re().split(line).collect();
    if parts.len() < 3 {
        return None;
    }
    let title = parts[0].trim();
    let duration = parts[1].trim();
    let detail = parts[2..]
        .iter()
        .map(|p| p.trim())
        .collect::<Vec<_>>()
        .join(" — ");
    if title.is_empty() || detail.trim().is_empty() || !mentions_duration(duration) {
        return None;
    }
    Some(Block::Card {
        title: Some(title.to_string()),
        duration: duration.to_string(),
        detail: detail.trim().to_string(),
    })
}

fn titled_card(line: &str) -> Option<Block> {
    let caps = titled_card_re().captures(line)?;
    Some(Block::Card {
        title: Some(caps[1].trim().to_string()),
        duration: caps[2].trim().to_string(),
        detail: caps[3].trim().to_string(),
    })
}

fn untitled_card(line: &str) -> Option<Block> {
    let caps = untitled_card_re().captures(line)?;
    Some(Block::Card {
        title: None,
        duration: caps[1].trim().to_string(),
        detail: caps[2].trim().to_string(),
    })
}

fn heading(line: &str) -> Option<Block> {
    let looks_like_heading = line.ends_with(':')
        || (line.chars().count() <= HEADING_MAX_CHARS
            && line.chars().next().is_some_and(char::is_uppercase)
            && !line.contains(['.', '!', '?']));
    if !looks_like_heading {
        return None;
    }
    Some(Block::Heading {
        text: line.to_string(),
        neutral: is_neutral_heading(line),
    })
}

fn bullet(line: &str) -> Option<Block> {
    let rest = if let Some(rest) = line.strip_prefix('•') {
        rest
    } else if let Some(m) = numbered_re().find(line) {
        &line[m.end()..]
    } else {
        // `-`, `*` and `–` need a space after them, so `**bold**` and
        // `-5%` are not bullets.
        let mut chars = line.chars();
        match (chars.next(), chars.next()) {
            (Some('-' | '*' | '–'), Some(c)) if c.is_whitespace() => chars.as_str(),
            _ => return None,
        }
    };
    Some(Block::Bullet {
        text: rest.trim().to_string(),
    })
}

fn rich(line: &str) -> Option<Block> {
    if line.split("**").count() < 3 {
        return None;
    }
    Some(Block::Rich {
        segments: inline_segments(line),
    })
}

/// Classify one line. Blank lines produce no block.
pub fn classify_line(line: &str) -> Option<Block> {
    let trimmed = line.trim();
    if trimmed.is_empty() {
        return None;
    }

    triplet(trimmed)
        .or_else(|| titled_card(trimmed))
        .or_else(|| untitled_card(trimmed))
        .or_else(|| heading(trimmed))
        .or_else(|| bullet(trimmed))
        .or_else(|| rich(trimmed))
        .or_else(|| {
            Some(Block::Paragraph {
                text: trimmed.to_string(),
            })
        })
}

/// Classify every line of a message, skipping blank lines.
pub fn format_message(text: &str) -> Vec<Block> {
    text.lines().filter_map(classify_line).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn card(title: Option<&str>, duration: &str, detail: &str) -> Block {
        Block::Card {
            title: title.map(str::to_string),
            duration: duration.to_string(),
            detail: detail.to_string(),
        }
    }

    #[test]
    fn test_triplet_card() {
        assert_eq!(
            classify_line("Design — 2-3 weeks — Build wireframes and prototype"),
            Some(card(Some("Design"), "2-3 weeks", "Build wireframes and prototype"))
        );
    }

    #[test]
    fn test_triplet_with_en_dash_and_extra_parts() {
        assert_eq!(
            classify_line("Launch – Ongoing – Monitor — iterate"),
            Some(card(Some("Launch"), "Ongoing", "Monitor — iterate"))
        );
        assert_eq!(
            classify_line("Build — 2–3 semanas — API e painel"),
            Some(card(Some("Build"), "2–3 semanas", "API e painel"))
        );
    }

    #[test]
    fn test_titled_card() {
        assert_eq!(
            classify_line("Discovery — 1 week: Interviews and requirements"),
            Some(card(Some("Discovery"), "1 week", "Interviews and requirements"))
        );
    }

    #[test]
    fn test_qualified_durations_stay_cards() {
        assert_eq!(
            classify_line("Discovery — 1-2 weeks (remote) — Interviews and requirements"),
            Some(card(Some("Discovery"), "1-2 weeks (remote)", "Interviews and requirements"))
        );
        assert_eq!(
            classify_line("Build — about 3 weeks — API and dashboard"),
            Some(card(Some("Build"), "about 3 weeks", "API and dashboard"))
        );
        assert_eq!(
            classify_line("Build — 2 weeks (part-time): API and dashboard"),
            Some(card(Some("Build"), "2 weeks (part-time)", "API and dashboard"))
        );
    }

    #[test]
    fn test_duration_checks() {
        assert!(is_duration("2-3 weeks"));
        assert!(!is_duration("about 3 weeks"));
        assert!(mentions_duration("about 3 weeks"));
        assert!(mentions_duration("Ongoing support"));
        assert!(!mentions_duration("soon"));
        assert!(!mentions_duration("10x faster"));
    }

    #[test]
    fn test_untitled_card() {
        assert_eq!(
            classify_line("2 meses: Desenvolvimento do MVP"),
            Some(card(None, "2 meses", "Desenvolvimento do MVP"))
        );
    }

    #[test]
    fn test_bullet() {
        assert_eq!(
            classify_line("- Implement login flow"),
            Some(Block::Bullet {
                text: "Implement login flow".to_string()
            })
        );
        assert_eq!(
            classify_line("• payments"),
            Some(Block::Bullet {
                text: "payments".to_string()
            })
        );
        assert_eq!(
            classify_line("3. deploy to staging"),
            Some(Block::Bullet {
                text: "deploy to staging".to_string()
            })
        );
    }

    #[test]
    fn test_empty_line() {
        assert_eq!(classify_line(""), None);
        assert_eq!(classify_line("   \t"), None);
    }

    #[test]
    fn test_headings() {
        assert_eq!(
            classify_line("Project Summary:"),
            Some(Block::Heading {
                text: "Project Summary:".to_string(),
                neutral: true
            })
        );
        assert_eq!(
            classify_line("Cronograma sugerido:"),
            Some(Block::Heading {
                text: "Cronograma sugerido:".to_string(),
                neutral: true
            })
        );
        assert_eq!(
            classify_line("Key Features"),
            Some(Block::Heading {
                text: "Key Features".to_string(),
                neutral: false
            })
        );
    }

    #[test]
    fn test_bold_is_not_a_bullet() {
        assert_eq!(
            classify_line("**Note** this is important."),
            Some(Block::Rich {
                segments: vec![
                    Segment {
                        text: "Note".to_string(),
                        bold: true
                    },
                    Segment {
                        text: " this is important.".to_string(),
                        bold: false
                    },
                ]
            })
        );
    }

    #[test]
    fn test_sentence_is_paragraph() {
        assert_eq!(
            classify_line("We will deliver the app in phases. Each phase ends with a demo."),
            Some(Block::Paragraph {
                text: "We will deliver the app in phases. Each phase ends with a demo.".to_string()
            })
        );
    }

    #[test]
    fn test_truncated_lines_fall_through() {
        // Card without detail yet.
        assert!(!matches!(
            classify_line("Design — 2-3 weeks — "),
            Some(Block::Card { .. })
        ));
        // Second part is not a duration.
        assert!(!matches!(
            classify_line("Design — soon — wireframes"),
            Some(Block::Card { .. })
        ));
        // Unclosed bold.
        assert_eq!(
            classify_line("the **plan"),
            Some(Block::Paragraph {
                text: "the **plan".to_string()
            })
        );
        // Every prefix classifies without panicking.
        let line = "Design — 2-3 weeks — Build wireframes and prototype";
        for (i, _) in line.char_indices() {
            let _ = classify_line(&line[..i]);
        }
    }

    #[test]
    fn test_format_message_skips_blank_lines() {
        let text = "Suggested schedule:\nDesign — 2 weeks: Mockups\n\nProject Summary:\nA shop.";
        let blocks = format_message(text);
        assert_eq!(blocks.len(), 4);
        assert!(matches!(&blocks[0], Block::Heading { neutral: true, .. }));
        assert!(matches!(&blocks[1], Block::Card { title: Some(t), .. } if t == "Design"));
        assert!(matches!(&blocks[3], Block::Paragraph { .. }));
    }
}
