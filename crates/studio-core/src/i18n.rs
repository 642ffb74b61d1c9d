//! Label lookup
//!
//! The studio never hard-codes user-facing strings; it asks a [`Translate`]
//! implementation for a dotted key and inserts the answer verbatim. The
//! built-in [`Catalog`] only covers the labels this workspace needs.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Locale {
    #[default]
    Pt,
    En,
}

impl Locale {
    pub fn as_str(&self) -> &'static str {
        match self {
            Locale::Pt => "pt",
            Locale::En => "en",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "pt" | "pt-br" | "pt_br" => Some(Locale::Pt),
            "en" | "en-us" | "en_us" => Some(Locale::En),
            _ => None,
        }
    }

    /// Language name used inside the generation prompt.
    pub fn prompt_language(&self) -> &'static str {
        match self {
            Locale::Pt => "Portuguese (pt-BR)",
            Locale::En => "English",
        }
    }
}

/// Lookup by dotted key. Implementations return the key itself when they
/// have no entry for it.
pub trait Translate {
    fn t(&self, key: &str) -> String;
}

pub struct Catalog {
    locale: Locale,
    entries: HashMap<&'static str, &'static str>,
}

const EN: &[(&str, &str)] = &[
    ("flow.input", "Input"),
    ("flow.output", "Output"),
    ("flow.phases", "Phases"),
    ("flow.sections", "Sections"),
    ("flow.estimatedDuration", "Estimated duration"),
    ("flow.nextSteps", "Next steps: review the plan and schedule a call"),
    ("flow.empty", "Describe your project to see the flow"),
    ("chat.you", "You"),
    ("chat.assistant", "AI"),
    ("chat.thinking", "Thinking"),
    ("chat.placeholder", "Describe your project..."),
    ("chat.suggestedSchedule", "Suggested schedule:"),
    ("chat.updatedSchedule", "Updated schedule:"),
    ("chat.projectSummary", "Project Summary:"),
    ("chat.refinements", "Refinements requested by the user:"),
    ("chat.timelineContext", "Current schedule context (keep continuity):"),
    ("chat.currentSummary", "Current project summary:"),
    ("chat.quotaExceeded", "⚠️ API quota exceeded. Wait a while or configure billing for the AI provider."),
    ("chat.generationFailed", "Error: could not generate the proposal. Check the AI configuration."),
    ("chat.copied", "Copied to clipboard"),
    ("chat.feedbackThanks", "Thanks for the feedback"),
    ("export.done", "Exported"),
    ("duration.ongoing", "Ongoing"),
];

const PT: &[(&str, &str)] = &[
    ("flow.input", "Entrada"),
    ("flow.output", "Saída"),
    ("flow.phases", "Fases"),
    ("flow.sections", "Seções"),
    ("flow.estimatedDuration", "Duração estimada"),
    ("flow.nextSteps", "Próximos passos: revisar o plano e agendar uma conversa"),
    ("flow.empty", "Descreva seu projeto para ver o fluxo"),
    ("chat.you", "Você"),
    ("chat.assistant", "IA"),
    ("chat.thinking", "Pensando"),
    ("chat.placeholder", "Descreva seu projeto..."),
    ("chat.suggestedSchedule", "Cronograma sugerido:"),
    ("chat.updatedSchedule", "Cronograma atualizado:"),
    ("chat.projectSummary", "Resumo do Projeto:"),
    ("chat.refinements", "Refinamentos solicitados pelo usuário:"),
    ("chat.timelineContext", "Contexto do cronograma atual (para manter continuidade):"),
    ("chat.currentSummary", "Resumo atual do projeto:"),
    ("chat.quotaExceeded", "⚠️ Cota da API excedida. Aguarde ou configure o faturamento do provedor de IA."),
    ("chat.generationFailed", "Erro: não foi possível gerar a proposta. Verifique a configuração da IA."),
    ("chat.copied", "Copiado para a área de transferência"),
    ("chat.feedbackThanks", "Obrigado pelo feedback"),
    ("export.done", "Exportado"),
    ("duration.ongoing", "Contínuo"),
];

impl Catalog {
    pub fn new(locale: Locale) -> Self {
        let table = match locale {
            Locale::En => EN,
            Locale::Pt => PT,
        };
        Self {
            locale,
            entries: table.iter().copied().collect(),
        }
    }

    pub fn locale(&self) -> Locale {
        self.locale
    }
}

impl Translate for Catalog {
    fn t(&self, key: &str) -> String {
        self.entries
            .get(key)
            .map(|s| s.to_string())
            .unwrap_or_else(|| key.to_string())
    }
}
