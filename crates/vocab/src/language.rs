use serde::{Deserialize, Serialize};

/// The two languages the document corpus and chat surface support.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Language {
    English,
    Hindi,
}

impl Language {
    /// Detect the dominant language of a text by script. Devanagari
    /// codepoints outvoting Latin letters means Hindi; everything else
    /// (including empty input) defaults to English.
    pub fn detect(text: &str) -> Self {
        let mut devanagari = 0usize;
        let mut latin = 0usize;

        for c in text.chars() {
            if ('\u{0900}'..='\u{097F}').contains(&c) {
                devanagari += 1;
            } else if c.is_ascii_alphabetic() {
                latin += 1;
            }
        }

        if devanagari > 0 && devanagari >= latin {
            Language::Hindi
        } else {
            Language::English
        }
    }

    pub fn code(&self) -> &'static str {
        match self {
            Language::English => "en",
            Language::Hindi => "hi",
        }
    }
}

impl Default for Language {
    fn default() -> Self {
        Language::English
    }
}
