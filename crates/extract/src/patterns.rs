use regex::Regex;
use tracing::warn;

use crate::schema::{Entity, EntityType, SourceStrategy};

/// Regex-based extraction for figures the dictionary cannot enumerate:
/// monetary amounts (including lakh/crore units and their Devanagari
/// equivalents), percentages, and installment phrasing.
pub struct PatternSet {
    rules: Vec<(EntityType, Regex)>,
}

impl PatternSet {
    pub fn new() -> Self {
        let specs: &[(EntityType, &str)] = &[
            // Currency-prefixed amounts: ₹1,20,000  Rs. 6000  रु 500
            (
                EntityType::MonetaryAmount,
                r"(?i)(?:₹|\bRs\.?|\bINR|\bरु\.?|\bरुपये)\s*\d[\d,]*(?:\.\d+)?(?:\s*(?:lakhs?|crores?|लाख|करोड़))?",
            ),
            // Unit-suffixed amounts without a currency marker: 2.5 lakh, 1 करोड़
            (
                EntityType::MonetaryAmount,
                r"(?i)\b\d[\d,]*(?:\.\d+)?\s*(?:lakhs?|crores?|लाख|करोड़)(?:\s*(?:rupees|रुपये))?",
            ),
            (
                EntityType::Percentage,
                r"(?i)\b\d+(?:\.\d+)?\s*(?:%|percent\b|प्रतिशत|फीसदी)",
            ),
            (
                EntityType::Installment,
                r"(?i)\b(?:\d+(?:st|nd|rd|th)?\s+)?(?:installments?|instalments?|kist\b|tranches?|किस्त|क़िस्त)",
            ),
        ];

        let mut rules = Vec::new();
        for (entity_type, pattern) in specs {
            match Regex::new(pattern) {
                Ok(regex) => rules.push((*entity_type, regex)),
                Err(e) => {
                    // Skip the rule; the remaining patterns still apply.
                    warn!(pattern = pattern, error = %e, "Entity pattern failed to compile");
                }
            }
        }

        Self { rules }
    }

    /// Find all pattern matches in an excerpt. Matches already covered by an
    /// earlier rule (same span) are skipped so the two monetary rules do not
    /// double-report one amount.
    pub fn find_all(&self, text: &str) -> Vec<Entity> {
        let mut entities = Vec::new();
        let mut claimed: Vec<(usize, usize)> = Vec::new();

        for (entity_type, regex) in &self.rules {
            for m in regex.find_iter(text) {
                let overlaps = claimed
                    .iter()
                    .any(|&(s, e)| m.start() < e && s < m.end());
                if overlaps {
                    continue;
                }
                claimed.push((m.start(), m.end()));

                let surface = m.as_str().trim().to_string();
                entities.push(Entity::new(
                    surface.clone(),
                    *entity_type,
                    surface,
                    SourceStrategy::Pattern,
                    crate::context_window(text, m.start(), m.end()),
                ));
            }
        }

        entities
    }

    /// Monetary-amount matches only, ordered by position. Shared with the
    /// response formatter so answers and passages agree on what an amount is.
    pub fn find_amounts(&self, text: &str) -> Vec<(usize, String)> {
        let mut amounts: Vec<(usize, usize, String)> = Vec::new();

        for (entity_type, regex) in &self.rules {
            if *entity_type != EntityType::MonetaryAmount {
                continue;
            }
            for m in regex.find_iter(text) {
                let overlaps = amounts
                    .iter()
                    .any(|&(s, e, _)| m.start() < e && s < m.end());
                if !overlaps {
                    amounts.push((m.start(), m.end(), m.as_str().trim().to_string()));
                }
            }
        }

        amounts.sort_by_key(|&(start, _, _)| start);
        amounts
            .into_iter()
            .map(|(start, _, text)| (start, text))
            .collect()
    }
}

impl Default for PatternSet {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rupee_amounts() {
        let patterns = PatternSet::new();

        let found = patterns.find_all("The scheme pays ₹1,20,000 in total.");
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].entity_type, EntityType::MonetaryAmount);
        assert_eq!(found[0].text, "₹1,20,000");

        let found = patterns.find_all("मुआवजा ₹6,000 प्रति परिवार");
        assert_eq!(found[0].text, "₹6,000");
    }

    #[test]
    fn test_lakh_crore_units() {
        let patterns = PatternSet::new();

        let found = patterns.find_all("assistance of 2.5 lakh for housing");
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].text, "2.5 lakh");

        let found = patterns.find_all("कुल 1 करोड़ का बजट");
        assert_eq!(found[0].entity_type, EntityType::MonetaryAmount);
    }

    #[test]
    fn test_currency_and_unit_not_double_counted() {
        let patterns = PatternSet::new();

        let found = patterns.find_all("payout is ₹2.5 lakh per family");
        let amounts: Vec<_> = found
            .iter()
            .filter(|e| e.entity_type == EntityType::MonetaryAmount)
            .collect();
        assert_eq!(amounts.len(), 1);
        assert_eq!(amounts[0].text, "₹2.5 lakh");
    }

    #[test]
    fn test_percentage_and_installment() {
        let patterns = PatternSet::new();

        let found = patterns.find_all("a 50% subsidy paid in the 2nd installment");
        assert_eq!(found.len(), 2);
        assert_eq!(found[0].entity_type, EntityType::Percentage);
        assert_eq!(found[0].text, "50%");
        assert_eq!(found[1].entity_type, EntityType::Installment);
        assert_eq!(found[1].text, "2nd installment");

        let found = patterns.find_all("पहली किस्त में 40 प्रतिशत राशि");
        assert!(found.iter().any(|e| e.entity_type == EntityType::Percentage));
        assert!(found.iter().any(|e| e.entity_type == EntityType::Installment));
    }

    #[test]
    fn test_no_matches_on_plain_text() {
        let patterns = PatternSet::new();
        assert!(patterns.find_all("how do I apply for the scheme").is_empty());
        assert!(patterns.find_all("").is_empty());
    }
}
