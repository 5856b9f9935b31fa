use extract::PatternSet;
use vocab::Language;

/// Terminal formatting step: when the generated answer mentions an
/// entitlement amount but buries it past the first sentence, prepend a
/// short sentence surfacing the first amount in the conversation language.
/// Pure text transformation, shares the monetary patterns with the
/// extractor.
pub struct ResponseFormatter {
    patterns: PatternSet,
}

impl ResponseFormatter {
    pub fn new() -> Self {
        Self {
            patterns: PatternSet::new(),
        }
    }

    pub fn format(&self, answer: &str, language: Language) -> String {
        let amounts = self.patterns.find_amounts(answer);
        let Some((first_pos, first_amount)) = amounts.first() else {
            return answer.to_string();
        };

        if *first_pos < first_sentence_end(answer) {
            // Already prominent.
            return answer.to_string();
        }

        let prefix = match language {
            Language::Hindi => format!("आपको {} की राशि मिल सकती है।", first_amount),
            Language::English => {
                format!("You may be eligible for an amount of {}.", first_amount)
            }
        };
        format!("{} {}", prefix, answer)
    }
}

impl Default for ResponseFormatter {
    fn default() -> Self {
        Self::new()
    }
}

/// Byte offset of the first sentence terminator, honoring the Devanagari
/// danda alongside Latin punctuation.
fn first_sentence_end(text: &str) -> usize {
    text.char_indices()
        .find(|(_, c)| matches!(c, '.' | '?' | '!' | '।' | '\n'))
        .map(|(idx, _)| idx)
        .unwrap_or(text.len())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_buried_amount_is_surfaced_in_english() {
        let formatter = ResponseFormatter::new();
        let answer = "The scheme covers rural families. Beneficiaries receive ₹1,20,000 over three installments.";

        let formatted = formatter.format(answer, Language::English);
        assert!(formatted.starts_with("You may be eligible for an amount of ₹1,20,000."));
        assert!(formatted.ends_with(answer));
    }

    #[test]
    fn test_buried_amount_is_surfaced_in_hindi() {
        let formatter = ResponseFormatter::new();
        let answer = "यह योजना ग्रामीण परिवारों के लिए है। पात्र परिवारों को ₹6,000 मिलते हैं।";

        let formatted = formatter.format(answer, Language::Hindi);
        assert!(formatted.starts_with("आपको ₹6,000 की राशि मिल सकती है।"));
    }

    #[test]
    fn test_prominent_amount_left_alone() {
        let formatter = ResponseFormatter::new();
        let answer = "You will receive ₹6,000 per year. The amount is paid in installments.";
        assert_eq!(formatter.format(answer, Language::English), answer);
    }

    #[test]
    fn test_no_amount_left_alone() {
        let formatter = ResponseFormatter::new();
        let answer = "Apply at your local panchayat office with your ration card.";
        assert_eq!(formatter.format(answer, Language::English), answer);
        assert_eq!(formatter.format("", Language::Hindi), "");
    }
}
