use std::sync::Arc;

use extract::{Entity, EntityType};
use vocab::{Language, Vocabulary};

use crate::passage::{QueryOrigin, RetrievalQuery};

/// Maps a prioritized entity to one follow-up search query using an
/// entity-type-specific template. Pure: same entity, same query.
///
/// The query is phrased in the dominant language of the canonical form and,
/// when the vocabulary knows the entity, carries the equivalent term from
/// the other language to widen recall against the bilingual store.
pub struct QueryGenerator {
    vocab: Arc<Vocabulary>,
}

impl QueryGenerator {
    pub fn new(vocab: Arc<Vocabulary>) -> Self {
        Self { vocab }
    }

    pub fn generate(&self, entity: &Entity) -> RetrievalQuery {
        let language = Language::detect(&entity.canonical_form);
        let subject = self.bilingual_subject(entity, language);

        let text = match entity.entity_type {
            EntityType::SchemeName => match language {
                Language::English => format!("{subject} eligibility criteria and benefits"),
                Language::Hindi => format!("{subject} पात्रता और लाभ"),
            },
            EntityType::MonetaryAmount | EntityType::Percentage | EntityType::Installment => {
                match language {
                    Language::English => {
                        format!("which scheme provides {subject} and under what disbursement conditions")
                    }
                    Language::Hindi => {
                        format!("{subject} किस योजना के तहत मिलता है और भुगतान की शर्तें क्या हैं")
                    }
                }
            }
            EntityType::BeneficiaryCategory => match language {
                Language::English => format!("schemes and benefits available for {subject}"),
                Language::Hindi => format!("{subject} के लिए उपलब्ध योजनाएं और लाभ"),
            },
            EntityType::DocumentType | EntityType::AuthorityOffice => match language {
                Language::English => {
                    format!("{subject} requirements, process and where to submit")
                }
                Language::Hindi => format!("{subject} की आवश्यकताएं, प्रक्रिया और कहां जमा करें"),
            },
            _ => match language {
                Language::English => format!("{subject} more information"),
                Language::Hindi => format!("{subject} के बारे में अधिक जानकारी"),
            },
        };

        RetrievalQuery {
            text,
            origin: QueryOrigin::Followup {
                entity_type: entity.entity_type,
                canonical_form: entity.canonical_form.clone(),
            },
        }
    }

    /// The canonical form, paired with its equivalent in the other language
    /// when the vocabulary has one.
    fn bilingual_subject(&self, entity: &Entity, language: Language) -> String {
        let other = match language {
            Language::English => Language::Hindi,
            Language::Hindi => Language::English,
        };
        match self.vocab.equivalent_term(&entity.canonical_form, other) {
            Some(equivalent) if equivalent != entity.canonical_form => {
                format!("{} ({})", entity.canonical_form, equivalent)
            }
            _ => entity.canonical_form.clone(),
        }
    }
}
