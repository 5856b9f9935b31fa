use vocab::Language;

pub fn build_reformulation_prompt(question: &str, history: &[(String, String)]) -> String {
    let mut conversation = String::new();
    for (asked, answered) in history {
        conversation.push_str(&format!("User: {}\nAssistant: {}\n", asked, answered));
    }
    if conversation.is_empty() {
        conversation.push_str("(no prior turns)\n");
    }

    format!(
        r#"You rewrite citizen questions about Indian government welfare schemes into standalone search queries.

CONVERSATION SO FAR:
{}
LATEST QUESTION: {}

INSTRUCTIONS:
- Resolve pronouns and references using the conversation
- Keep scheme names, amounts and figures exactly as written
- Add the Hindi or English equivalent of key scheme terms in parentheses, since documents exist in both languages
- Output ONLY the rewritten query, one line, no explanations

REWRITTEN QUERY:"#,
        conversation, question
    )
}

pub fn build_answer_prompt(question: &str, context: &str, language: Language) -> String {
    let language_instruction = match language {
        Language::Hindi => "Answer in Hindi",
        Language::English => "Answer in English",
    };

    format!(
        r#"You are a helpful assistant answering citizen questions about government welfare schemes.

CONTEXT PASSAGES:
{}

USER QUESTION: {}

INSTRUCTIONS:
- Answer using only information from the context passages above
- State entitlement amounts, eligibility conditions and required documents explicitly when present
- If the context does not contain the answer, say so plainly
- {}
- Keep the answer practical and concise

ANSWER:"#,
        context, question, language_instruction
    )
}

pub fn build_suggestion_prompt(
    question: &str,
    answer: &str,
    history: &[(String, String)],
    language: Language,
) -> String {
    let mut conversation = String::new();
    for (asked, answered) in history {
        conversation.push_str(&format!("User: {}\nAssistant: {}\n", asked, answered));
    }
    if conversation.is_empty() {
        conversation.push_str("(no prior turns)\n");
    }

    let language_instruction = match language {
        Language::Hindi => "Write every question in Hindi",
        Language::English => "Write every question in English",
    };

    format!(
        r#"You propose follow-up questions a citizen might ask next about Indian government welfare schemes.

CONVERSATION SO FAR:
{}
LATEST QUESTION: {}
LATEST ANSWER: {}

INSTRUCTIONS:
- Propose exactly 4 short follow-up questions about eligibility, application steps, required documents, benefit amounts, deadlines or related schemes
- Each question must be directly relevant to the conversation topic
- {}
- Output ONLY valid JSON in this shape, nothing else:
{{"questions": ["first question", "second question", "third question", "fourth question"]}}

JSON OUTPUT:"#,
        conversation, question, answer, language_instruction
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reformulation_prompt_inlines_history() {
        let history = vec![(
            "What is PM Kisan?".to_string(),
            "An income support scheme for farmers.".to_string(),
        )];
        let prompt = build_reformulation_prompt("How much does it pay?", &history);

        assert!(prompt.contains("What is PM Kisan?"));
        assert!(prompt.contains("income support scheme"));
        assert!(prompt.contains("LATEST QUESTION: How much does it pay?"));
    }

    #[test]
    fn test_suggestion_prompt_carries_turn_and_language() {
        let prompt = build_suggestion_prompt(
            "What is the amount under PM Awas Yojana?",
            "Beneficiaries receive ₹1,20,000.",
            &[],
            Language::English,
        );

        assert!(prompt.contains("PM Awas Yojana"));
        assert!(prompt.contains("₹1,20,000"));
        assert!(prompt.contains("exactly 4"));
        assert!(prompt.contains("Write every question in English"));
    }

    #[test]
    fn test_answer_prompt_sets_language() {
        let prompt = build_answer_prompt("राशि कितनी है?", "some context", Language::Hindi);
        assert!(prompt.contains("Answer in Hindi"));
        assert!(prompt.contains("some context"));
    }
}
