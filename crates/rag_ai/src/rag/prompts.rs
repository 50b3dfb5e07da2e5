use rag_core::domain::SearchResult;

/// Retrieved contents in the given order, separated by a blank line.
pub fn context_block(results: &[SearchResult]) -> String {
    results
        .iter()
        .map(|r| r.document.content.as_str())
        .collect::<Vec<_>>()
        .join("\n\n")
}

pub fn augmented_prompt(context: &str, question: &str) -> String {
    // Contract with the model:
    // - answer from the supplied context only
    // - say so when the context does not cover the question
    format!(
        r#"You are a helpful assistant with access to the following information:

{context}

Based on this information, please answer the following question:
{question}

If the information provided doesn't contain the answer, please say so. Only use the information provided to construct your answer.
"#
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use rag_core::domain::Document;

    #[test]
    fn context_precedes_question() {
        let results = vec![
            SearchResult {
                document: Document::new("a", "first"),
                score: 0.9,
            },
            SearchResult {
                document: Document::new("b", "second"),
                score: 0.1,
            },
        ];
        let ctx = context_block(&results);
        assert_eq!(ctx, "first\n\nsecond");

        let prompt = augmented_prompt(&ctx, "why?");
        let ctx_at = prompt.find("first\n\nsecond").unwrap();
        let q_at = prompt.find("why?").unwrap();
        assert!(ctx_at < q_at);
        assert!(prompt.starts_with("You are a helpful assistant"));
    }
}
