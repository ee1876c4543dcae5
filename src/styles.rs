//! Enhancement styles.
//!
//! The style table is fixed at compile time. Each style contributes the
//! system instruction sent to the model; the core treats it as opaque text.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Key into the style table, as stored in the config file.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StyleKey {
    #[default]
    Gentle,
    Professional,
    Creative,
    Technical,
    Concise,
}

/// A named instruction template.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Style {
    pub name: &'static str,
    pub description: &'static str,
    pub instruction: &'static str,
    /// ANSI SGR color code used when rendering the style name.
    pub ansi_color: &'static str,
}

const GENTLE: Style = Style {
    name: "Gentle",
    description: "Softly improves grammar and clarity while keeping original tone",
    instruction: "Gently improve the user's prompt by fixing grammar, improving clarity, and making it more specific while maintaining the original intent and tone. Return ONLY the enhanced prompt.",
    ansi_color: "92",
};

const PROFESSIONAL: Style = Style {
    name: "Professional",
    description: "Transforms prompts into formal, business-appropriate language",
    instruction: "Transform the user's prompt into a clear, professional, and well-structured request suitable for business or formal contexts. Return ONLY the enhanced prompt.",
    ansi_color: "34",
};

const CREATIVE: Style = Style {
    name: "Creative",
    description: "Adds imaginative flair and vivid descriptions to prompts",
    instruction: "Enhance the user's prompt by adding creative flair, vivid descriptions, and imaginative elements while preserving the core request. Return ONLY the enhanced prompt.",
    ansi_color: "95",
};

const TECHNICAL: Style = Style {
    name: "Technical",
    description: "Makes prompts precise with technical specifications and details",
    instruction: "Refine the user's prompt to be precise, detailed, and technically accurate with clear specifications and requirements. Return ONLY the enhanced prompt.",
    ansi_color: "33",
};

const CONCISE: Style = Style {
    name: "Concise",
    description: "Reduces prompts to essential information, brief and clear",
    instruction: "Make the user's prompt as clear and brief as possible while retaining all essential information and meaning. Return ONLY the enhanced prompt.",
    ansi_color: "36",
};

impl StyleKey {
    pub const ALL: [StyleKey; 5] = [
        StyleKey::Gentle,
        StyleKey::Professional,
        StyleKey::Creative,
        StyleKey::Technical,
        StyleKey::Concise,
    ];

    pub fn style(&self) -> &'static Style {
        match self {
            StyleKey::Gentle => &GENTLE,
            StyleKey::Professional => &PROFESSIONAL,
            StyleKey::Creative => &CREATIVE,
            StyleKey::Technical => &TECHNICAL,
            StyleKey::Concise => &CONCISE,
        }
    }

    pub fn key(&self) -> &'static str {
        match self {
            StyleKey::Gentle => "gentle",
            StyleKey::Professional => "professional",
            StyleKey::Creative => "creative",
            StyleKey::Technical => "technical",
            StyleKey::Concise => "concise",
        }
    }

    pub fn from_key(key: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|s| s.key().eq_ignore_ascii_case(key.trim()))
    }

    /// System instruction for this style, with optional language context
    /// appended verbatim.
    pub fn system_instruction(&self, language_context: Option<&str>) -> String {
        let mut instruction = self.style().instruction.to_string();
        if let Some(context) = language_context.filter(|c| !c.is_empty()) {
            instruction.push_str(&format!(
                " The user is working on a {}, so consider this context when enhancing their prompt.",
                context
            ));
        }
        instruction
    }
}

impl fmt::Display for StyleKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.key())
    }
}
