//! Prompt templates for the four LLM tasks.
//!
//! Pure string rendering; every template instructs the model to return only
//! JSON of the shape the parser expects. Validation happens downstream.

/// Initial interview questions for a product, exactly `count` of them.
pub fn questions(product: &str, count: usize) -> String {
    let examples = (1..=count)
        .map(|i| format!("\"Question {i}?\""))
        .collect::<Vec<_>>()
        .join(", ");
    format!(
        "You are a product-market fit researcher. Given the following product description, \
generate exactly {count} insightful interview questions to understand the user's needs, \
pain points, and current workflow.

Product: {product}

Requirements:
- Questions should be open-ended
- Focus on understanding their current situation
- Avoid leading questions
- Keep questions concise

Return ONLY a JSON array of {count} questions, like:
[{examples}]"
    )
}

/// Exactly two follow-up questions probing the latest transcript.
pub fn followups(product: &str, transcript: &str) -> String {
    format!(
        "You are a product-market fit researcher conducting a live interview.

Product being researched: {product}

Transcript so far:
{transcript}

Based on what the user just said, suggest exactly 2 follow-up questions that dig deeper \
into their pain points, needs, or workflow.

Requirements:
- Questions should build on what was just said
- Probe for specifics, examples, or emotions
- Keep questions conversational

Return ONLY a JSON array of 2 questions, like:
[\"Follow-up question 1?\", \"Follow-up question 2?\"]"
    )
}

/// Structured question/answer/category rows from the full transcript.
pub fn analysis(product: &str, transcript: &str) -> String {
    format!(
        "You are analyzing a product-market fit interview transcript.

Product: {product}

Full Transcript:
{transcript}

Transform this transcript into a structured table. Extract key question-answer pairs and \
categorize them.

Categories to use:
- Current Workflow
- Pain Point
- Need
- Feature Request
- Competitor Mention
- Budget/Pricing
- Other

Return ONLY a JSON array of objects like:
[
  {{\"question\": \"...\", \"answer\": \"...\", \"category\": \"...\"}},
  {{\"question\": \"...\", \"answer\": \"...\", \"category\": \"...\"}}
]

Extract all meaningful Q&A pairs from the transcript."
    )
}

/// Summary/pains/opportunities report from transcript plus prior analysis.
pub fn report(product: &str, transcript: &str, analysis_json: &str) -> String {
    format!(
        "You are generating a product-market fit report.

Product: {product}

Interview Transcript:
{transcript}

Structured Analysis:
{analysis_json}

Generate a concise PMF report with:
1. A summary (2-3 sentences max)
2. Key pain points identified (list of 2-4 items)
3. Opportunities for the product (list of 2-4 items)

Return ONLY a JSON object like:
{{
  \"summary\": \"...\",
  \"key_pains\": [\"pain 1\", \"pain 2\"],
  \"opportunities\": [\"opportunity 1\", \"opportunity 2\"]
}}"
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn questions_prompt_carries_product_and_count() {
        let prompt = questions("A CRM for freelancers", 3);
        assert!(prompt.contains("Product: A CRM for freelancers"));
        assert!(prompt.contains("exactly 3 insightful interview questions"));
        assert!(prompt.contains("[\"Question 1?\", \"Question 2?\", \"Question 3?\"]"));
    }

    #[test]
    fn example_array_matches_requested_cardinality() {
        let prompt = questions("p", 5);
        assert_eq!(prompt.matches("Question ").count(), 5);
    }

    #[test]
    fn followups_prompt_embeds_transcript() {
        let prompt = followups("a CRM", "I use spreadsheets");
        assert!(prompt.contains("I use spreadsheets"));
        assert!(prompt.contains("exactly 2 follow-up questions"));
    }

    #[test]
    fn analysis_prompt_lists_categories() {
        let prompt = analysis("p", "t");
        for category in [
            "Current Workflow",
            "Pain Point",
            "Need",
            "Feature Request",
            "Competitor Mention",
            "Budget/Pricing",
            "Other",
        ] {
            assert!(prompt.contains(category), "missing category {category}");
        }
    }

    #[test]
    fn report_prompt_embeds_prior_analysis() {
        let prompt = report("p", "t", "[{\"question\": \"q\"}]");
        assert!(prompt.contains("Structured Analysis:\n[{\"question\": \"q\"}]"));
    }
}
