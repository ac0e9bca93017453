//! Prompt templates.

/// Structured summary prompt. `{text}` is replaced with the paper text.
pub const DEFAULT_SUMMARY_PROMPT: &str = r#"Generate a detailed summary of the following research paper.
Structure the summary as follows:
1. Title and Authors
2. Abstract (brief overview)
3. Introduction and Background
4. Methodology
5. Key Findings and Results
6. Discussion
7. Conclusion
8. Implications and Future Work

Ensure each section is comprehensive yet concise. Highlight any significant contributions or novelties presented in the paper.

Paper text:
{text}

Detailed Summary:"#;

/// Follow-up question prompt.
pub fn question_prompt(question: &str, summary: &str, content: &str) -> String {
    format!(
        "Based on the following paper summary and the original content, please answer this question: {question}\n\n\
         Summary: {summary}\n\n\
         Original Content: {content}\n\n\
         Answer:"
    )
}
