use serde::{Deserialize, Serialize};

/// One structured row extracted from the interview transcript.
///
/// The category is suggested from a fixed set in the prompt (Current
/// Workflow, Pain Point, Need, Feature Request, Competitor Mention,
/// Budget/Pricing, Other) but any string the model returns is accepted.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct AnalysisRow {
    pub question: String,
    pub answer: String,
    pub category: String,
}

/// Final PMF report for a session.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Report {
    pub summary: String,
    pub key_pains: Vec<String>,
    pub opportunities: Vec<String>,
}
