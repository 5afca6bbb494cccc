use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use crate::model::{Defect, Field};

/// Label for records with no value in the grouping field.
pub const UNASSIGNED: &str = "Unassigned";

/// Fields a record set can be grouped by.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GroupField {
    Severity,
    Priority,
    Status,
    Domain,
    Reporter,
}

impl GroupField {
    pub fn field(self) -> Field {
        match self {
            GroupField::Severity => Field::Severity,
            GroupField::Priority => Field::Priority,
            GroupField::Status => Field::Status,
            GroupField::Domain => Field::Domain,
            GroupField::Reporter => Field::ReportedBy,
        }
    }
}

/// Chart order (largest group first) or table order (by name).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GroupOrder {
    #[default]
    Count,
    Name,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GroupCount {
    pub name: String,
    pub count: usize,
}

/// Group key for one record: trimmed value, or [`UNASSIGNED`] when empty.
pub fn group_key(defect: &Defect, field: &Field) -> String {
    match defect.text(field).map(str::trim) {
        Some(v) if !v.is_empty() => v.to_string(),
        _ => UNASSIGNED.to_string(),
    }
}

/// Count records per value of `by`.
///
/// Count order breaks ties by name so repeated calls give identical output.
pub fn group_counts(defects: &[Defect], by: GroupField, order: GroupOrder) -> Vec<GroupCount> {
    let field = by.field();
    let mut counts: HashMap<String, usize> = HashMap::new();
    for d in defects {
        *counts.entry(group_key(d, &field)).or_default() += 1;
    }

    let mut out: Vec<GroupCount> = counts
        .into_iter()
        .map(|(name, count)| GroupCount { name, count })
        .collect();
    match order {
        GroupOrder::Count => {
            out.sort_by(|a, b| b.count.cmp(&a.count).then_with(|| a.name.cmp(&b.name)))
        }
        GroupOrder::Name => out.sort_by(|a, b| a.name.cmp(&b.name)),
    }
    out
}

/// Records per value of `by`, largest group first.
pub fn partition_by(defects: &[Defect], by: GroupField) -> Vec<(String, Vec<&Defect>)> {
    let field = by.field();
    let mut groups: HashMap<String, Vec<&Defect>> = HashMap::new();
    for d in defects {
        groups.entry(group_key(d, &field)).or_default().push(d);
    }

    let mut out: Vec<(String, Vec<&Defect>)> = groups.into_iter().collect();
    out.sort_by(|a, b| b.1.len().cmp(&a.1.len()).then_with(|| a.0.cmp(&b.0)));
    out
}
