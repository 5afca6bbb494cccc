//! Heuristic "needs attention" flagging over defect descriptions.
//!
//! A description is expected to state what was expected, what actually
//! happened, and which test data reproduces it. Gherkin step text is also
//! flagged because it points at unabstracted test scripts pasted into a defect.

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::model::Defect;

/// One triggered condition, in report order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum AttentionReason {
    MissingExpected,
    MissingActual,
    MissingTestDataId,
    CucumberSteps,
}

impl AttentionReason {
    pub fn label(self) -> &'static str {
        match self {
            AttentionReason::MissingExpected => "Missing 'Expected'",
            AttentionReason::MissingActual => "Missing 'Actual'",
            AttentionReason::MissingTestDataId => "Missing Test Data ID",
            AttentionReason::CucumberSteps => "cucumber steps present",
        }
    }
}

impl fmt::Display for AttentionReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Tunable inputs to [`assess`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AttentionRules {
    /// Lower-case phrases that count as a test-data reference.
    pub test_data_keywords: Vec<String>,
    /// A bare digit run at least this long counts as a test-data id.
    pub min_id_digits: usize,
    /// How many distinct Gherkin keywords must co-occur.
    pub min_gherkin_keywords: usize,
}

impl Default for AttentionRules {
    fn default() -> Self {
        Self {
            test_data_keywords: [
                "test data",
                "order release id",
                "shipment id",
                "invoice id",
                "otm-",
            ]
            .iter()
            .map(|s| s.to_string())
            .collect(),
            min_id_digits: 7,
            min_gherkin_keywords: 2,
        }
    }
}

static GHERKIN: Lazy<[Regex; 3]> = Lazy::new(|| {
    ["given", "when", "then"].map(|kw| Regex::new(&format!(r"\b{}\b", kw)).expect("valid regex"))
});

impl AttentionRules {
    fn has_test_data(&self, text: &str) -> bool {
        if self.test_data_keywords.iter().any(|k| text.contains(k.as_str())) {
            return true;
        }
        longest_digit_run(text) >= self.min_id_digits
    }

    fn has_gherkin(&self, text: &str) -> bool {
        GHERKIN.iter().filter(|re| re.is_match(text)).count() >= self.min_gherkin_keywords
    }
}

fn longest_digit_run(text: &str) -> usize {
    let mut best = 0;
    let mut run = 0;
    for c in text.chars() {
        if c.is_ascii_digit() {
            run += 1;
            best = best.max(run);
        } else {
            run = 0;
        }
    }
    best
}

/// Every reason `description` triggers, in fixed report order.
pub fn assess(description: Option<&str>, rules: &AttentionRules) -> Vec<AttentionReason> {
    let text = description.unwrap_or("").to_lowercase();
    let mut reasons = Vec::new();
    if !text.contains("expected") {
        reasons.push(AttentionReason::MissingExpected);
    }
    if !text.contains("actual") {
        reasons.push(AttentionReason::MissingActual);
    }
    if !rules.has_test_data(&text) {
        reasons.push(AttentionReason::MissingTestDataId);
    }
    if rules.has_gherkin(&text) {
        reasons.push(AttentionReason::CucumberSteps);
    }
    reasons
}

/// `"Missing 'Expected', Missing 'Actual'"` style summary.
pub fn reason_text(reasons: &[AttentionReason]) -> String {
    reasons
        .iter()
        .map(|r| r.label())
        .collect::<Vec<_>>()
        .join(", ")
}

/// A flagged defect; the source record is copied, not modified.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AttentionRecord {
    #[serde(flatten)]
    pub defect: Defect,
    pub reason_for_attention: String,
    #[serde(skip)]
    pub reasons: Vec<AttentionReason>,
}

/// Open defects whose description triggers at least one reason.
pub fn needs_attention(defects: &[Defect], rules: &AttentionRules) -> Vec<AttentionRecord> {
    defects
        .iter()
        .filter(|d| !d.is_done())
        .filter_map(|d| {
            let reasons = assess(d.description.as_deref(), rules);
            if reasons.is_empty() {
                return None;
            }
            Some(AttentionRecord {
                defect: d.clone(),
                reason_for_attention: reason_text(&reasons),
                reasons,
            })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn open(id: &str, description: Option<&str>) -> Defect {
        Defect {
            id: id.into(),
            summary: "s".into(),
            status: Some("Open".into()),
            description: description.map(str::to_string),
            created_at: "2024-01-01T00:00:00.000Z".into(),
            ..Default::default()
        }
    }

    #[test]
    fn gherkin_only_description_reports_all_four() {
        let d = open(
            "BUG-1",
            Some("Steps: Given a user, When they log in, Then error shown"),
        );
        let flagged = needs_attention(&[d], &AttentionRules::default());
        assert_eq!(flagged.len(), 1);
        assert_eq!(
            flagged[0].reason_for_attention,
            "Missing 'Expected', Missing 'Actual', Missing Test Data ID, cucumber steps present"
        );
    }

    #[test]
    fn well_formed_description_is_not_flagged() {
        let d = open(
            "BUG-2",
            Some("Expected: order saved. Actual: 500 error. Shipment ID 42"),
        );
        assert!(needs_attention(&[d], &AttentionRules::default()).is_empty());
    }

    #[test]
    fn done_defects_are_skipped() {
        let mut d = open("BUG-3", None);
        d.status = Some("DONE".into());
        assert!(needs_attention(&[d], &AttentionRules::default()).is_empty());
    }

    #[test]
    fn missing_description_misses_everything_but_gherkin() {
        let reasons = assess(None, &AttentionRules::default());
        assert_eq!(
            reasons,
            vec![
                AttentionReason::MissingExpected,
                AttentionReason::MissingActual,
                AttentionReason::MissingTestDataId,
            ]
        );
    }

    #[test]
    fn seven_digit_run_counts_as_test_data() {
        let rules = AttentionRules::default();
        let found = assess(Some("expected x actual y for 1234567"), &rules);
        assert!(found.is_empty());
        let short = assess(Some("expected x actual y for 123456"), &rules);
        assert_eq!(short, vec![AttentionReason::MissingTestDataId]);
    }

    #[test]
    fn keyword_match_is_case_insensitive() {
        let found = assess(
            Some("EXPECTED ok, ACTUAL not ok, Order Release ID missing"),
            &AttentionRules::default(),
        );
        assert!(found.is_empty());
    }

    #[test]
    fn one_gherkin_keyword_is_not_enough() {
        let reasons = assess(
            Some("expected a, actual b, test data c. Then it failed"),
            &AttentionRules::default(),
        );
        assert!(reasons.is_empty());
    }

    #[test]
    fn gherkin_keywords_match_whole_words_only() {
        let reasons = assess(
            Some("expected a, actual b, test data c, forgiven whenever"),
            &AttentionRules::default(),
        );
        assert!(!reasons.contains(&AttentionReason::CucumberSteps));
    }

    #[test]
    fn record_serializes_flat_with_reason() -> anyhow::Result<()> {
        let flagged = needs_attention(&[open("BUG-4", None)], &AttentionRules::default());
        let json = serde_json::to_value(&flagged[0])?;
        assert_eq!(json["id"], "BUG-4");
        assert_eq!(
            json["reasonForAttention"],
            "Missing 'Expected', Missing 'Actual', Missing Test Data ID"
        );
        assert!(json.get("reasons").is_none());
        Ok(())
    }
}
