use std::sync::Arc;

use serde::Serialize;
use tracing::debug;
use uuid::Uuid;

use extract::{Entity, EntityType, Extractor};
use vocab::{Language, Vocabulary};

use crate::llm::ChatModel;

/// At most this many suggestions per turn.
const MAX_SUGGESTIONS: usize = 4;
/// Template categories used when filling out a suggestion list.
const TEMPLATE_CATEGORIES: usize = 3;

/// A follow-up question offered to the user after an answer.
#[derive(Debug, Clone, Serialize)]
pub struct SuggestedQuestion {
    pub id: Uuid,
    pub text: String,
}

/// Generates follow-up question suggestions from the latest turn. Contextual
/// suggestions come from the language model when one is configured; template
/// suggestions keyed off the extracted entities always work, so the result
/// is never empty for a non-trivial conversation and a broken model only
/// reduces variety.
pub struct SuggestionEngine {
    extractor: Extractor,
    chat: Option<ChatModel>,
}

#[derive(Clone, Copy, PartialEq)]
enum Category {
    Eligibility,
    Application,
    Documents,
    Benefits,
    Timeline,
}

impl Category {
    fn question(self, scheme: &str, language: Language) -> String {
        match (self, language) {
            (Category::Eligibility, Language::English) => {
                format!("What are the eligibility criteria for {scheme}?")
            }
            (Category::Eligibility, Language::Hindi) => {
                format!("{scheme} के लिए पात्रता मानदंड क्या हैं?")
            }
            (Category::Application, Language::English) => {
                format!("How do I apply for {scheme} step by step?")
            }
            (Category::Application, Language::Hindi) => {
                format!("{scheme} के लिए आवेदन कैसे करें?")
            }
            (Category::Documents, Language::English) => {
                format!("Which documents are required to apply for {scheme}?")
            }
            (Category::Documents, Language::Hindi) => {
                format!("{scheme} के आवेदन के लिए कौन से दस्तावेज़ चाहिए?")
            }
            (Category::Benefits, Language::English) => {
                format!("How much financial assistance does {scheme} provide?")
            }
            (Category::Benefits, Language::Hindi) => {
                format!("{scheme} के तहत कितनी आर्थिक सहायता मिलती है?")
            }
            (Category::Timeline, Language::English) => {
                format!("What is the last date to apply for {scheme}?")
            }
            (Category::Timeline, Language::Hindi) => {
                format!("{scheme} के लिए आवेदन की अंतिम तिथि क्या है?")
            }
        }
    }
}

impl SuggestionEngine {
    pub fn new(vocab: Arc<Vocabulary>) -> Self {
        Self {
            extractor: Extractor::new(vocab),
            chat: None,
        }
    }

    pub fn with_chat_model(mut self, chat: ChatModel) -> Self {
        self.chat = Some(chat);
        self
    }

    pub async fn suggest(
        &self,
        question: &str,
        answer: &str,
        history: &[(String, String)],
    ) -> Vec<SuggestedQuestion> {
        let basis = if question.trim().is_empty() {
            answer
        } else {
            question
        };
        let language = Language::detect(basis);

        let combined = format!("{} {}", question, answer);
        let entities = self.extractor.extract(&combined, language).await;

        let mut questions: Vec<String> = Vec::new();
        if let Some(chat) = &self.chat {
            match chat.suggest_followups(question, answer, history, language).await {
                Ok(contextual) => questions.extend(contextual),
                Err(e) => {
                    debug!(error = %e, "Contextual suggestions unavailable, templates only");
                }
            }
        }
        questions.extend(self.template_questions(&entities, language));
        questions.truncate(MAX_SUGGESTIONS);

        questions
            .into_iter()
            .map(|text| SuggestedQuestion {
                id: Uuid::new_v4(),
                text,
            })
            .collect()
    }

    /// Pick template categories by what the turn already covered: documents
    /// and amounts that were mentioned need no suggestion of their own.
    fn template_questions(&self, entities: &[Entity], language: Language) -> Vec<String> {
        let scheme = entities
            .iter()
            .find(|e| e.entity_type == EntityType::SchemeName)
            .map(|e| {
                self.extractor
                    .vocabulary()
                    .equivalent_term(&e.canonical_form, language)
                    .unwrap_or(&e.text)
                    .to_string()
            })
            .unwrap_or_else(|| {
                match language {
                    Language::English => "this scheme",
                    Language::Hindi => "इस योजना",
                }
                .to_string()
            });

        let has_documents = entities
            .iter()
            .any(|e| e.entity_type == EntityType::DocumentType);
        let has_amounts = entities.iter().any(|e| {
            matches!(
                e.entity_type,
                EntityType::MonetaryAmount | EntityType::Percentage | EntityType::Installment
            )
        });

        let mut categories = vec![Category::Eligibility, Category::Application];
        if !has_documents {
            categories.push(Category::Documents);
        }
        if !has_amounts {
            categories.push(Category::Benefits);
        }
        categories.push(Category::Timeline);
        categories.truncate(TEMPLATE_CATEGORIES);

        categories
            .into_iter()
            .map(|c| c.question(&scheme, language))
            .collect()
    }
}
