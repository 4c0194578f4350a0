//! Keyword-bucketed knowledge base built from the IPMDAR Implementation and Tailoring Guide.
//!
//! The guide is split into sentences and each sentence is filed under the first
//! category whose keyword list matches it. Unmatched sentences go to `general`.

use serde::Serialize;
use std::collections::BTreeMap;
use std::fmt;
use std::path::Path;

/// Topical bucket for a knowledge item.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Category {
    CompliancePolicy,
    DataAnalytics,
    ProjectManagement,
    RiskForecasting,
    SystemsIntegration,
    Implementation,
    General,
}

impl Category {
    /// Keyword categories in classification order. `General` is the fallback, not a candidate.
    pub const CLASSIFIED: [Category; 6] = [
        Category::CompliancePolicy,
        Category::DataAnalytics,
        Category::ProjectManagement,
        Category::RiskForecasting,
        Category::SystemsIntegration,
        Category::Implementation,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Category::CompliancePolicy => "compliance_policy",
            Category::DataAnalytics => "data_analytics",
            Category::ProjectManagement => "project_management",
            Category::RiskForecasting => "risk_forecasting",
            Category::SystemsIntegration => "systems_integration",
            Category::Implementation => "implementation",
            Category::General => "general",
        }
    }

    /// Lowercase keywords that route a sentence into this bucket.
    pub fn keywords(&self) -> &'static [&'static str] {
        match self {
            Category::CompliancePolicy => &[
                "compliance", "policy", "regulation", "guideline", "requirement", "standard",
                "acquisition", "federal", "law", "statute", "mandate", "rule", "directive",
                "dfars", "far", "cfr", "dcma", "regulatory", "approval", "authorize",
            ],
            Category::DataAnalytics => &[
                "analytics", "metrics", "measurement", "data", "report", "dashboard",
                "analysis", "trend", "statistic", "calculation", "evm", "earned value",
                "performance", "indicator", "spi", "cpi", "variance",
            ],
            Category::ProjectManagement => &[
                "management", "project", "planning", "execution", "cdrl", "deliverable",
                "milestone", "schedule", "timeline", "work breakdown", "wbs", "tailoring",
                "implementation", "contract", "sow", "statement of work",
            ],
            Category::RiskForecasting => &[
                "risk", "forecast", "prediction", "mitigation", "probability", "impact",
                "likelihood", "consequence", "uncertainty", "opportunity", "threat",
                "contingency", "reserve", "estimate", "projection", "future",
            ],
            Category::SystemsIntegration => &[
                "integration", "system", "technical", "interface", "interoperability",
                "architecture", "compatibility", "data format", "json", "schema", "xml",
                "standard", "protocol", "automation", "tool", "software",
            ],
            Category::Implementation => &[
                "implementation", "step", "procedure", "instruction", "guide", "manual",
                "how-to", "process", "workflow", "operation", "conduct", "perform",
                "execute", "action", "activity", "task",
            ],
            Category::General => &[],
        }
    }

    /// First category whose keyword occurs in `sentence` (case-insensitive), else `General`.
    pub fn classify(sentence: &str) -> Category {
        let lower = sentence.to_lowercase();
        Self::CLASSIFIED
            .into_iter()
            .find(|c| contains_any(&lower, c.keywords()))
            .unwrap_or(Category::General)
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// True when `haystack_lower` contains any of the (lowercase) `needles`.
pub fn contains_any(haystack_lower: &str, needles: &[&str]) -> bool {
    needles.iter().any(|n| haystack_lower.contains(n))
}

/// Split text into trimmed sentences on `.`, `!` or `?` followed by whitespace or end of text.
pub fn split_sentences(text: &str) -> Vec<String> {
    let mut sentences = Vec::new();
    let mut current = String::new();
    let mut chars = text.chars().peekable();
    while let Some(c) = chars.next() {
        current.push(c);
        let terminal = matches!(c, '.' | '!' | '?');
        let boundary = chars.peek().map_or(true, |next| next.is_whitespace());
        if terminal && boundary {
            push_trimmed(&mut sentences, &current);
            current.clear();
        }
    }
    push_trimmed(&mut sentences, &current);
    sentences
}

fn push_trimmed(out: &mut Vec<String>, fragment: &str) {
    let trimmed = fragment.split_whitespace().collect::<Vec<_>>().join(" ");
    if !trimmed.is_empty() {
        out.push(trimmed);
    }
}

/// Buckets of sentences keyed by category. Immutable once built.
#[derive(Debug, Clone, Default, Serialize)]
pub struct KnowledgeBase {
    buckets: BTreeMap<Category, Vec<String>>,
}

impl KnowledgeBase {
    /// Classify every sentence of `text`. Sentence order is preserved within each bucket.
    pub fn from_text(text: &str) -> Self {
        let mut buckets: BTreeMap<Category, Vec<String>> = BTreeMap::new();
        for sentence in split_sentences(text) {
            buckets
                .entry(Category::classify(&sentence))
                .or_default()
                .push(sentence);
        }
        Self { buckets }
    }

    /// Read the guide export at `path`. A missing or unreadable file gives an empty base.
    pub fn load(path: impl AsRef<Path>) -> Self {
        let path = path.as_ref();
        match std::fs::read_to_string(path) {
            Ok(text) => {
                let kb = Self::from_text(&text);
                tracing::info!(
                    target: "ipmdar::knowledge",
                    path = %path.display(),
                    items = kb.len(),
                    "knowledge base loaded"
                );
                kb
            }
            Err(e) => {
                tracing::warn!(
                    target: "ipmdar::knowledge",
                    path = %path.display(),
                    error = %e,
                    "guide text not readable; starting with an empty knowledge base"
                );
                Self::default()
            }
        }
    }

    pub fn bucket(&self, category: Category) -> &[String] {
        self.buckets.get(&category).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn len(&self) -> usize {
        self.buckets.values().map(Vec::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Item count per bucket, for startup logs.
    pub fn summary(&self) -> BTreeMap<&'static str, usize> {
        self.buckets.iter().map(|(c, v)| (c.as_str(), v.len())).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn first_matching_category_wins() {
        // "policy" (compliance) and "data" (analytics) both match; compliance is checked first.
        assert_eq!(
            Category::classify("The policy governs data submission."),
            Category::CompliancePolicy
        );
        assert_eq!(Category::classify("Monthly CPI trend."), Category::DataAnalytics);
        assert_eq!(Category::classify("Hello there."), Category::General);
    }

    #[test]
    fn classification_is_case_insensitive() {
        assert_eq!(Category::classify("Submit per DFARS."), Category::CompliancePolicy);
        assert_eq!(Category::classify("RISK MITIGATION"), Category::RiskForecasting);
    }

    #[test]
    fn splits_on_terminal_punctuation_only_before_whitespace() {
        let s = split_sentences("Version 1.2 applies. Is it ready?  Yes!\nDone");
        assert_eq!(s, vec!["Version 1.2 applies.", "Is it ready?", "Yes!", "Done"]);
    }

    #[test]
    fn from_text_fills_buckets_in_order() {
        let kb = KnowledgeBase::from_text(
            "Identify each risk early. Say hello. Track the schedule. Another risk exists.",
        );
        assert_eq!(
            kb.bucket(Category::RiskForecasting),
            ["Identify each risk early.", "Another risk exists."]
        );
        assert_eq!(kb.bucket(Category::ProjectManagement), ["Track the schedule."]);
        assert_eq!(kb.bucket(Category::General), ["Say hello."]);
        assert!(kb.bucket(Category::SystemsIntegration).is_empty());
        assert_eq!(kb.len(), 4);
    }

    #[test]
    fn missing_file_yields_empty_base() {
        let dir = tempfile::tempdir().unwrap();
        let kb = KnowledgeBase::load(dir.path().join("absent.txt"));
        assert!(kb.is_empty());
    }
}
