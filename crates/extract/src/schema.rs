use serde::{Deserialize, Serialize};
use vocab::VocabCategory;

/// Closed set of entity types the engine recognizes. The first four carry
/// the highest retrieval weight; the generic NER types the lowest.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum EntityType {
    SchemeName,
    MonetaryAmount,
    Percentage,
    Installment,
    BeneficiaryCategory,
    DocumentType,
    AuthorityOffice,
    DisasterType,
    ProcessTerm,
    Location,
    Organization,
    Person,
    Generic,
}

impl EntityType {
    /// Map a vocabulary category onto an entity type. Benefit and financial
    /// vocabulary resolves to `ProcessTerm`; the closed type set has no
    /// separate member for them and they behave as procedural anchors.
    pub fn from_category(category: VocabCategory) -> Self {
        match category {
            VocabCategory::SchemeName => EntityType::SchemeName,
            VocabCategory::BeneficiaryCategory => EntityType::BeneficiaryCategory,
            VocabCategory::DocumentType => EntityType::DocumentType,
            VocabCategory::AuthorityOffice => EntityType::AuthorityOffice,
            VocabCategory::DisasterType => EntityType::DisasterType,
            VocabCategory::ProcessTerm
            | VocabCategory::BenefitType
            | VocabCategory::FinancialTerm => EntityType::ProcessTerm,
        }
    }
}

/// Which extraction strategy produced an entity. When the same canonical
/// entity is found by several strategies, the highest precedence wins:
/// dictionary matches are bilingual-aware and most precise.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SourceStrategy {
    Model,
    Dictionary,
    Pattern,
}

impl SourceStrategy {
    pub fn precedence(&self) -> u8 {
        match self {
            SourceStrategy::Dictionary => 2,
            SourceStrategy::Pattern => 1,
            SourceStrategy::Model => 0,
        }
    }
}

/// A typed entity mention found in a question or passage excerpt.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Entity {
    /// The matched surface string, in its original script.
    pub text: String,
    #[serde(rename = "type")]
    pub entity_type: EntityType,
    /// Dictionary-normalized form when matched via the vocabulary, enabling
    /// cross-language equivalence; otherwise equal to `text`.
    pub canonical_form: String,
    pub source_strategy: SourceStrategy,
    /// True if the surface text occurs verbatim in the user's question.
    pub appears_in_query: bool,
    /// Text surrounding the match, kept for the prioritizer's
    /// procedural-relevance bonus. Not serialized.
    #[serde(skip)]
    pub context_window: String,
    /// Priority assigned after extraction; zero until then.
    pub score: f32,
}

impl Entity {
    pub fn new(
        text: String,
        entity_type: EntityType,
        canonical_form: String,
        source_strategy: SourceStrategy,
        context_window: String,
    ) -> Self {
        Self {
            text,
            entity_type,
            canonical_form,
            source_strategy,
            appears_in_query: false,
            context_window,
            score: 0.0,
        }
    }

    /// Key used for case-insensitive deduplication within one pass.
    pub fn dedup_key(&self) -> String {
        self.canonical_form.to_lowercase()
    }
}
