pub mod language;

pub use language::Language;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::Path;

/// Category of a vocabulary entry. Each category resolves to exactly one
/// entity type on the extraction side.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum VocabCategory {
    SchemeName,
    BenefitType,
    BeneficiaryCategory,
    DocumentType,
    AuthorityOffice,
    DisasterType,
    ProcessTerm,
    FinancialTerm,
}

/// One scheme-domain term with its equivalents in both supported languages.
/// `canonical` is the lowercase English identifier shared by all variants.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VocabEntry {
    pub canonical: String,
    pub english: Vec<String>,
    pub hindi: Vec<String>,
    pub category: VocabCategory,
}

impl VocabEntry {
    fn new(canonical: &str, english: &[&str], hindi: &[&str], category: VocabCategory) -> Self {
        Self {
            canonical: canonical.to_string(),
            english: english.iter().map(|s| s.to_string()).collect(),
            hindi: hindi.iter().map(|s| s.to_string()).collect(),
            category,
        }
    }

    /// The preferred surface term for the given language, falling back to
    /// the canonical form when no equivalent is recorded.
    pub fn term_in(&self, language: Language) -> &str {
        let list = match language {
            Language::English => &self.english,
            Language::Hindi => &self.hindi,
        };
        list.first().map(|s| s.as_str()).unwrap_or(&self.canonical)
    }
}

/// Immutable bilingual vocabulary of welfare-scheme terminology. Built once
/// at startup and shared by reference; lookup goes through a precomputed
/// normalized-term index.
pub struct Vocabulary {
    entries: Vec<VocabEntry>,
    term_index: HashMap<String, usize>,
    procedural_terms: Vec<String>,
}

impl Vocabulary {
    pub fn new(entries: Vec<VocabEntry>) -> Self {
        let mut term_index = HashMap::new();
        let mut procedural_terms = Vec::new();

        for (idx, entry) in entries.iter().enumerate() {
            for term in entry
                .english
                .iter()
                .chain(entry.hindi.iter())
                .chain(std::iter::once(&entry.canonical))
            {
                term_index.entry(normalize_term(term)).or_insert(idx);
            }
            if entry.category == VocabCategory::ProcessTerm {
                for term in entry.english.iter().chain(entry.hindi.iter()) {
                    procedural_terms.push(normalize_term(term));
                }
            }
        }

        Self {
            entries,
            term_index,
            procedural_terms,
        }
    }

    /// Load a vocabulary table from a JSON file (same shape as the
    /// compiled-in table). Used to extend the term list without a rebuild.
    pub fn from_json(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read vocabulary file {}", path.display()))?;
        let entries: Vec<VocabEntry> =
            serde_json::from_str(&content).context("Failed to parse vocabulary JSON")?;
        Ok(Self::new(entries))
    }

    /// Entries in their declared order. Scans over this list are
    /// deterministic; the hash index is only consulted for exact lookups.
    pub fn entries(&self) -> &[VocabEntry] {
        &self.entries
    }

    /// Exact lookup of a normalized term in either language.
    pub fn entry_for_term(&self, normalized: &str) -> Option<&VocabEntry> {
        self.term_index.get(normalized).map(|&idx| &self.entries[idx])
    }

    pub fn entry_for_canonical(&self, canonical: &str) -> Option<&VocabEntry> {
        let wanted = normalize_term(canonical);
        self.entries.iter().find(|e| e.canonical == wanted)
    }

    /// Normalized procedural-category terms (eligibility, application,
    /// documentation) used for the prioritizer's context bonus.
    pub fn procedural_terms(&self) -> &[String] {
        &self.procedural_terms
    }

    /// The equivalent term for a canonical form in the requested language,
    /// if the vocabulary knows the entity at all.
    pub fn equivalent_term(&self, canonical: &str, language: Language) -> Option<&str> {
        self.entry_for_canonical(canonical)
            .map(|e| e.term_in(language))
    }

    /// The compiled-in table of scheme terminology. Seeded from the term
    /// list the assistant's document corpus is known to use.
    pub fn builtin() -> Self {
        use VocabCategory::*;
        Self::new(vec![
            // Scheme names
            VocabEntry::new(
                "abua awaas yojana",
                &["abua awaas yojana", "abua awas yojana"],
                &["अबुआ आवास योजना"],
                SchemeName,
            ),
            VocabEntry::new(
                "pradhan mantri awas yojana",
                &[
                    "pradhan mantri awas yojana",
                    "pm awas yojana",
                    "pm housing scheme",
                ],
                &["प्रधानमंत्री आवास योजना", "पीएम आवास योजना"],
                SchemeName,
            ),
            VocabEntry::new(
                "pm kisan samman nidhi",
                &["pm kisan samman nidhi", "pm kisan", "pm kisan yojana"],
                &["पीएम किसान सम्मान निधि", "पीएम किसान योजना"],
                SchemeName,
            ),
            VocabEntry::new(
                "ujjwala yojana",
                &["ujjwala yojana", "pm ujjwala"],
                &["उज्ज्वला योजना"],
                SchemeName,
            ),
            VocabEntry::new(
                "mukhyamantri pension yojana",
                &["mukhyamantri pension yojana", "cm pension scheme"],
                &["मुख्यमंत्री पेंशन योजना"],
                SchemeName,
            ),
            // Benefit and financial terms
            VocabEntry::new(
                "compensation",
                &["compensation", "muavja", "muawja"],
                &["मुआवजा"],
                FinancialTerm,
            ),
            VocabEntry::new("amount", &["amount", "rashi"], &["राशि"], FinancialTerm),
            VocabEntry::new("subsidy", &["subsidy", "anudan"], &["अनुदान"], BenefitType),
            VocabEntry::new("pension", &["pension"], &["पेंशन"], BenefitType),
            // Beneficiary categories
            VocabEntry::new("farmer", &["farmer", "kisan"], &["किसान"], BeneficiaryCategory),
            VocabEntry::new("widow", &["widow", "vidhwa"], &["विधवा"], BeneficiaryCategory),
            VocabEntry::new(
                "below poverty line",
                &["below poverty line", "bpl"],
                &["गरीबी रेखा से नीचे", "बीपीएल"],
                BeneficiaryCategory,
            ),
            VocabEntry::new(
                "disabled person",
                &["disabled person", "divyang"],
                &["दिव्यांग"],
                BeneficiaryCategory,
            ),
            VocabEntry::new(
                "senior citizen",
                &["senior citizen"],
                &["वरिष्ठ नागरिक"],
                BeneficiaryCategory,
            ),
            // Document types
            VocabEntry::new(
                "ration card",
                &["ration card"],
                &["राशन कार्ड"],
                DocumentType,
            ),
            VocabEntry::new(
                "aadhaar card",
                &["aadhaar card", "aadhaar", "aadhar card"],
                &["आधार कार्ड", "आधार"],
                DocumentType,
            ),
            VocabEntry::new(
                "bank passbook",
                &["bank passbook"],
                &["बैंक पासबुक"],
                DocumentType,
            ),
            VocabEntry::new(
                "income certificate",
                &["income certificate", "aay praman patra"],
                &["आय प्रमाण पत्र"],
                DocumentType,
            ),
            VocabEntry::new(
                "caste certificate",
                &["caste certificate", "jati praman patra"],
                &["जाति प्रमाण पत्र"],
                DocumentType,
            ),
            // Authorities and offices
            VocabEntry::new("panchayat", &["panchayat", "gram panchayat"], &["पंचायत", "ग्राम पंचायत"], AuthorityOffice),
            VocabEntry::new(
                "block office",
                &["block office", "block development office"],
                &["प्रखंड कार्यालय"],
                AuthorityOffice,
            ),
            VocabEntry::new(
                "district collector",
                &["district collector", "collectorate", "upayukt"],
                &["जिला कलेक्टर", "उपायुक्त"],
                AuthorityOffice,
            ),
            VocabEntry::new(
                "anganwadi",
                &["anganwadi", "anganwadi centre"],
                &["आंगनवाड़ी"],
                AuthorityOffice,
            ),
            VocabEntry::new("office", &["office", "karyalay"], &["कार्यालय"], AuthorityOffice),
            // Disaster types
            VocabEntry::new(
                "lightning strike",
                &["lightning strike", "vajrapat"],
                &["वज्रपात"],
                DisasterType,
            ),
            VocabEntry::new("flood", &["flood", "baadh"], &["बाढ़"], DisasterType),
            VocabEntry::new("drought", &["drought", "sukha"], &["सूखा"], DisasterType),
            VocabEntry::new("fire", &["fire", "aag"], &["आग"], DisasterType),
            VocabEntry::new(
                "natural calamity",
                &["natural calamity", "natural disaster", "prakritik aapda"],
                &["प्राकृतिक आपदा"],
                DisasterType,
            ),
            // Procedural terms
            VocabEntry::new(
                "eligibility",
                &["eligibility", "eligible", "patrata"],
                &["पात्रता"],
                ProcessTerm,
            ),
            VocabEntry::new(
                "application",
                &["application", "apply", "aavedan"],
                &["आवेदन"],
                ProcessTerm,
            ),
            VocabEntry::new(
                "document",
                &["document", "documents", "dastavez"],
                &["दस्तावेज़", "दस्तावेज"],
                ProcessTerm,
            ),
            VocabEntry::new(
                "procedure",
                &["procedure", "process", "prakriya"],
                &["प्रक्रिया"],
                ProcessTerm,
            ),
            VocabEntry::new(
                "deadline",
                &["deadline", "last date", "antim tithi"],
                &["अंतिम तिथि"],
                ProcessTerm,
            ),
            VocabEntry::new("contact", &["contact", "sampark"], &["संपर्क"], ProcessTerm),
        ])
    }
}

/// Normalize a term or free text for matching: lowercase, strip punctuation,
/// collapse whitespace. Matches in either script survive this unchanged
/// apart from casing.
pub fn normalize_term(text: &str) -> String {
    let mut normalized = String::with_capacity(text.len());
    let mut last_was_space = true;

    for c in text.to_lowercase().chars() {
        if c.is_whitespace() {
            if !last_was_space {
                normalized.push(' ');
                last_was_space = true;
            }
        } else if matches!(c, '.' | ',' | '!' | '?' | ';' | ':' | '\'' | '"' | '(' | ')') {
            // Dropped entirely so "yojana." and "yojana" index identically.
        } else {
            normalized.push(c);
            last_was_space = false;
        }
    }

    normalized.trim_end().to_string()
}
