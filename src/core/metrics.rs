// ActionBoard - core/metrics.rs
//
// Aggregate counts shown above the result table.
// Recomputed on every query; cost is linear in the filtered set.

use crate::core::model::RecordSet;
use crate::core::schema::{Dimension, ResolvedSchema};
use crate::util::constants::{
    HIGHEST_PRIORITY_CODE, METRIC_APPROVED_LABEL, METRIC_HIGHEST_PRIORITY_LABEL,
    METRIC_PLACEHOLDER_LABEL, METRIC_PLACEHOLDER_VALUE, METRIC_TOTAL_LABEL,
};
use serde::Serialize;

/// Third metric: a priority count when Priority resolved, else a fixed
/// placeholder.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Headline {
    HighestPriority { code: &'static str, count: usize },
    Placeholder {
        label: &'static str,
        value: &'static str,
    },
}

impl Headline {
    pub fn label(&self) -> &'static str {
        match self {
            Headline::HighestPriority { .. } => METRIC_HIGHEST_PRIORITY_LABEL,
            Headline::Placeholder { label, .. } => *label,
        }
    }

    pub fn value(&self) -> String {
        match self {
            Headline::HighestPriority { count, .. } => count.to_string(),
            Headline::Placeholder { value, .. } => (*value).to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Metrics {
    /// Rows left after every filter stage.
    pub approved_actions: usize,
    /// Rows in the normalised source, before any stage.
    pub total_rows: usize,
    pub headline: Headline,
}

impl Metrics {
    /// `(label, value)` pairs in display order.
    pub fn display_pairs(&self) -> [(&'static str, String); 3] {
        [
            (METRIC_APPROVED_LABEL, self.approved_actions.to_string()),
            (METRIC_TOTAL_LABEL, self.total_rows.to_string()),
            (self.headline.label(), self.headline.value()),
        ]
    }
}

pub fn compute(filtered: &RecordSet, unfiltered: &RecordSet, schema: &ResolvedSchema) -> Metrics {
    let headline = match schema.column_for(Dimension::Priority) {
        Some(column) => {
            let count = match filtered.column_index(column) {
                Some(idx) => filtered
                    .rows()
                    .iter()
                    .filter(|r| r.values[idx].as_text() == Some(HIGHEST_PRIORITY_CODE))
                    .count(),
                None => 0,
            };
            Headline::HighestPriority {
                code: HIGHEST_PRIORITY_CODE,
                count,
            }
        }
        None => Headline::Placeholder {
            label: METRIC_PLACEHOLDER_LABEL,
            value: METRIC_PLACEHOLDER_VALUE,
        },
    };

    Metrics {
        approved_actions: filtered.len(),
        total_rows: unfiltered.len(),
        headline,
    }
}
