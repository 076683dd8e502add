// ActionBoard - core/filter.rs
//
// Multi-stage filter pipeline over a normalised record set.
// Stage order is fixed: status gate, structured filters (AND-combined),
// then free-text search (OR across the search columns).
// Core layer: pure logic, no I/O. Every stage yields a new set that is an
// order-preserving subset of its input.

use crate::core::model::{Record, RecordSet};
use crate::core::schema::{Dimension, ResolvedSchema};
use crate::util::constants::{ALL_SENTINEL, APPROVED_STATUS, STATUS_COLUMN};
use crate::util::error::SchemaError;
use std::collections::{BTreeMap, BTreeSet};
use std::convert::Infallible;
use std::fmt;
use std::str::FromStr;

/// Selection on a single dimension.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum Selection {
    /// No constraint; the stage passes every record.
    #[default]
    Unconstrained,
    /// Keep records whose normalised value equals this exactly.
    EqualTo(String),
}

impl Selection {
    pub fn is_unconstrained(&self) -> bool {
        matches!(self, Selection::Unconstrained)
    }
}

/// `"All"` and the empty string both mean unconstrained.
impl FromStr for Selection {
    type Err = Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.is_empty() || s == ALL_SENTINEL {
            Ok(Selection::Unconstrained)
        } else {
            Ok(Selection::EqualTo(s.to_string()))
        }
    }
}

impl fmt::Display for Selection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Selection::Unconstrained => f.write_str(ALL_SENTINEL),
            Selection::EqualTo(v) => f.write_str(v),
        }
    }
}

/// Complete filter state. Dimensions missing from the map are unconstrained.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FilterState {
    /// Per-dimension selections.
    pub selections: BTreeMap<Dimension, Selection>,

    /// Substring text search (case-insensitive). Blank = no filter.
    pub text_search: String,
}

impl FilterState {
    /// Builder-style selection setter.
    pub fn with(mut self, dimension: Dimension, selection: Selection) -> Self {
        self.selections.insert(dimension, selection);
        self
    }

    /// Builder-style search setter.
    pub fn with_search(mut self, term: impl Into<String>) -> Self {
        self.text_search = term.into();
        self
    }

    pub fn selection(&self, dimension: Dimension) -> &Selection {
        const UNCONSTRAINED: &Selection = &Selection::Unconstrained;
        self.selections.get(&dimension).unwrap_or(UNCONSTRAINED)
    }

    /// Returns true if no structured filter or search is active.
    pub fn is_empty(&self) -> bool {
        self.selections.values().all(Selection::is_unconstrained)
            && self.text_search.trim().is_empty()
    }
}

/// A resolved dimension with the options offered for it and the active
/// selection. Options reflect the set left by every earlier stage.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Facet {
    pub dimension: Dimension,
    pub column: String,
    pub options: Vec<String>,
    pub selection: Selection,
}

/// Result of running the full pipeline.
#[derive(Debug, Clone)]
pub struct FilterOutcome {
    pub records: RecordSet,
    pub facets: Vec<Facet>,
}

/// Run every stage in order.
///
/// Fails only when the resolved schema has no status column.
pub fn apply_pipeline(
    records: &RecordSet,
    schema: &ResolvedSchema,
    filter: &FilterState,
) -> Result<FilterOutcome, SchemaError> {
    if !schema.has_status {
        return Err(SchemaError::MissingColumn {
            column: STATUS_COLUMN,
        });
    }
    let mut current = status_gate(records)?;
    tracing::debug!(input = records.len(), approved = current.len(), "Status gate applied");

    let mut facets = Vec::with_capacity(schema.dimensions.len());
    for resolved in &schema.dimensions {
        let selection = filter.selection(resolved.dimension).clone();
        let options = distinct_values(&current, &resolved.column);
        current = equality_filter(&current, &resolved.column, &selection);
        tracing::debug!(
            dimension = %resolved.dimension,
            selection = %selection,
            options = options.len(),
            remaining = current.len(),
            "Structured filter applied"
        );
        facets.push(Facet {
            dimension: resolved.dimension,
            column: resolved.column.clone(),
            options,
            selection,
        });
    }

    for dimension in filter.selections.keys() {
        if !schema.resolves(*dimension) && !filter.selection(*dimension).is_unconstrained() {
            tracing::debug!(%dimension, "Selection ignored: dimension not present in dataset");
        }
    }

    let before_search = current.len();
    current = text_search(&current, &schema.search_columns, &filter.text_search);
    if before_search != current.len() {
        tracing::debug!(before = before_search, after = current.len(), "Text search applied");
    }

    Ok(FilterOutcome {
        records: current,
        facets,
    })
}

/// Keep records whose status equals "approved", ignoring case.
pub fn status_gate(records: &RecordSet) -> Result<RecordSet, SchemaError> {
    let idx = records
        .column_index(STATUS_COLUMN)
        .ok_or(SchemaError::MissingColumn {
            column: STATUS_COLUMN,
        })?;

    Ok(records.retain_where(|r| {
        r.values[idx].to_string().to_lowercase() == APPROVED_STATUS
    }))
}

/// Keep records whose `column` renders to exactly the selected value.
/// An absent column or an unconstrained selection is the identity.
pub fn equality_filter(records: &RecordSet, column: &str, selection: &Selection) -> RecordSet {
    let wanted = match selection {
        Selection::Unconstrained => return records.clone(),
        Selection::EqualTo(v) => v,
    };
    let Some(idx) = records.column_index(column) else {
        return records.clone();
    };
    records.retain_where(|r| !r.values[idx].is_null() && r.values[idx].to_string() == *wanted)
}

/// Keep records where any present search column contains `term`
/// (case-insensitive). Blank terms and a dataset with no search column
/// leave the set unchanged.
pub fn text_search(records: &RecordSet, search_columns: &[String], term: &str) -> RecordSet {
    let needle = term.trim().to_lowercase();
    let indices: Vec<usize> = search_columns
        .iter()
        .filter_map(|c| records.column_index(c))
        .collect();

    if needle.is_empty() || indices.is_empty() {
        return records.clone();
    }

    records.retain_where(|r| matches_any(r, &indices, &needle))
}

fn matches_any(record: &Record, indices: &[usize], needle: &str) -> bool {
    indices
        .iter()
        .any(|&i| record.values[i].to_string().to_lowercase().contains(needle))
}

/// Sorted distinct non-blank rendered values of `column`.
pub fn distinct_values(records: &RecordSet, column: &str) -> Vec<String> {
    let Some(idx) = records.column_index(column) else {
        return Vec::new();
    };
    records
        .rows()
        .iter()
        .filter(|r| !r.values[idx].is_null())
        .map(|r| r.values[idx].to_string())
        .filter(|s| !s.trim().is_empty())
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::normalize::normalize;
    use crate::core::parse::parse_csv;

    fn dataset(csv: &str) -> (RecordSet, ResolvedSchema) {
        let set = normalize(parse_csv(csv).unwrap());
        let schema = ResolvedSchema::resolve(&set);
        (set, schema)
    }

    const SAMPLE: &str = "\
ApprovalStatus,Account,Theme,Project Manager,Priority,SMART Action,Feedback
approved,Acme,Billing,Dana,p1,Automate refunds,Customers want faster refunds
Approved ,Globex,Onboarding,Eli,P2,Shorten signup,Too many steps
rejected,Acme,Billing,Dana,P1,Refund audit,Refund requested
APPROVED,Acme,Support,Eli,P3,Add chat,Hard to reach support
approved,Initech,Billing,Dana,,Fix invoices,Invoice totals wrong
";

    #[test]
    fn test_selection_from_str() {
        assert_eq!("All".parse::<Selection>().unwrap(), Selection::Unconstrained);
        assert_eq!("".parse::<Selection>().unwrap(), Selection::Unconstrained);
        assert_eq!(
            "Acme".parse::<Selection>().unwrap(),
            Selection::EqualTo("Acme".to_string())
        );
        assert_eq!(Selection::Unconstrained.to_string(), "All");
    }

    #[test]
    fn test_empty_filter_keeps_all_approved() {
        let (set, schema) = dataset(SAMPLE);
        let out = apply_pipeline(&set, &schema, &FilterState::default()).unwrap();
        assert_eq!(out.records.source_rows(), vec![0, 1, 3, 4]);
    }

    #[test]
    fn test_scenario_status_gate_and_account() {
        let (set, schema) = dataset(
            "ApprovalStatus,Account,Priority\napproved,Acme,p1\nApproved ,Globex,P2\nrejected,Acme,P1\n",
        );
        let gated = status_gate(&set).unwrap();
        assert_eq!(gated.len(), 2);

        let filter = FilterState::default().with(Dimension::Account, "Acme".parse().unwrap());
        let out = apply_pipeline(&set, &schema, &filter).unwrap();
        assert_eq!(out.records.source_rows(), vec![0]);
        let prio = out.records.value(&out.records.rows()[0], "Priority").unwrap();
        assert_eq!(prio.to_string(), "P1");
    }

    #[test]
    fn test_missing_status_column_is_schema_error() {
        let (set, schema) = dataset("Account,Priority\nAcme,P1\n");
        let err = apply_pipeline(&set, &schema, &FilterState::default()).unwrap_err();
        assert_eq!(
            err,
            SchemaError::MissingColumn {
                column: STATUS_COLUMN
            }
        );
    }

    #[test]
    fn test_pipeline_checks_resolved_schema_for_status() {
        let (set, _) = dataset(SAMPLE);
        let schema = ResolvedSchema::resolve(&parse_csv("Account\n").unwrap());
        let err = apply_pipeline(&set, &schema, &FilterState::default()).unwrap_err();
        assert_eq!(
            err,
            SchemaError::MissingColumn {
                column: STATUS_COLUMN
            }
        );
    }

    #[test]
    fn test_status_gate_idempotent() {
        let (set, _) = dataset(SAMPLE);
        let once = status_gate(&set).unwrap();
        let twice = status_gate(&once).unwrap();
        assert_eq!(once, twice);
    }

    #[test]
    fn test_unconstrained_is_identity() {
        let (set, _) = dataset(SAMPLE);
        for column in ["Account", "Theme", "Priority", "NotAColumn"] {
            let out = equality_filter(&set, column, &Selection::Unconstrained);
            assert_eq!(out, set);
        }
    }

    #[test]
    fn test_structured_filters_and_combined() {
        let (set, schema) = dataset(SAMPLE);
        let filter = FilterState::default()
            .with(Dimension::Account, Selection::EqualTo("Acme".into()))
            .with(Dimension::ProjectManager, Selection::EqualTo("Eli".into()));
        let out = apply_pipeline(&set, &schema, &filter).unwrap();
        assert_eq!(out.records.source_rows(), vec![3]);
    }

    #[test]
    fn test_facet_options_follow_upstream_selection() {
        let (set, schema) = dataset(SAMPLE);
        let filter =
            FilterState::default().with(Dimension::Account, Selection::EqualTo("Acme".into()));
        let out = apply_pipeline(&set, &schema, &filter).unwrap();

        let account = &out.facets[0];
        assert_eq!(account.dimension, Dimension::Account);
        assert_eq!(account.options, vec!["Acme", "Globex", "Initech"]);

        // Theme options only reflect approved Acme rows.
        let theme = &out.facets[1];
        assert_eq!(theme.dimension, Dimension::Theme);
        assert_eq!(theme.options, vec!["Billing", "Support"]);

        // Blank priority on the Initech row is not offered.
        let all = apply_pipeline(&set, &schema, &FilterState::default()).unwrap();
        assert_eq!(all.facets[3].options, vec!["P1", "P2", "P3"]);
    }

    #[test]
    fn test_numeric_looking_values_match_as_written() {
        let (set, schema) = dataset(
            "ApprovalStatus,Account\napproved,007\napproved,12345678901234567891\napproved,Acme\n",
        );
        let out = apply_pipeline(&set, &schema, &FilterState::default()).unwrap();
        assert_eq!(
            out.facets[0].options,
            vec!["007", "12345678901234567891", "Acme"]
        );

        let filter = FilterState::default().with(Dimension::Account, "007".parse().unwrap());
        let out = apply_pipeline(&set, &schema, &filter).unwrap();
        assert_eq!(out.records.source_rows(), vec![0]);

        let filter = FilterState::default().with(Dimension::Account, "7".parse().unwrap());
        let out = apply_pipeline(&set, &schema, &filter).unwrap();
        assert!(out.records.is_empty());

        let filter = FilterState::default()
            .with(Dimension::Account, "12345678901234567891".parse().unwrap());
        let out = apply_pipeline(&set, &schema, &filter).unwrap();
        assert_eq!(out.records.source_rows(), vec![1]);
    }

    #[test]
    fn test_unresolved_dimension_is_noop() {
        let (set, schema) = dataset("ApprovalStatus,Account\napproved,Acme\napproved,Globex\n");
        let filter =
            FilterState::default().with(Dimension::Theme, Selection::EqualTo("Billing".into()));
        let out = apply_pipeline(&set, &schema, &filter).unwrap();
        assert_eq!(out.records.len(), 2);
        assert_eq!(out.facets.len(), 1);
    }

    #[test]
    fn test_search_is_or_across_columns() {
        let (set, schema) = dataset(SAMPLE);
        let filter = FilterState::default().with_search("  REFUND ");
        let out = apply_pipeline(&set, &schema, &filter).unwrap();
        // Row 0 matches in both columns; row 2 is rejected by the gate.
        assert_eq!(out.records.source_rows(), vec![0]);

        let filter = FilterState::default().with_search("support");
        let out = apply_pipeline(&set, &schema, &filter).unwrap();
        assert_eq!(out.records.source_rows(), vec![3]);
    }

    #[test]
    fn test_search_uses_feedback_when_action_column_absent() {
        let (set, schema) =
            dataset("ApprovalStatus,Feedback\napproved,Refund requested\napproved,All good\n");
        let filter = FilterState::default().with_search("refund");
        let out = apply_pipeline(&set, &schema, &filter).unwrap();
        assert_eq!(out.records.source_rows(), vec![0]);
    }

    #[test]
    fn test_search_without_search_columns_is_noop() {
        let (set, schema) = dataset("ApprovalStatus,Account\napproved,Acme\n");
        let filter = FilterState::default().with_search("anything");
        let out = apply_pipeline(&set, &schema, &filter).unwrap();
        assert_eq!(out.records.len(), 1);
    }

    #[test]
    fn test_blank_search_is_noop() {
        let (set, _) = dataset(SAMPLE);
        let out = text_search(&set, &["Feedback".to_string()], "   ");
        assert_eq!(out, set);
    }

    #[test]
    fn test_output_is_ordered_subset() {
        let (set, schema) = dataset(SAMPLE);
        let filters = [
            FilterState::default(),
            FilterState::default().with_search("e"),
            FilterState::default().with(Dimension::Theme, Selection::EqualTo("Billing".into())),
            FilterState::default().with(Dimension::Priority, Selection::EqualTo("P9".into())),
        ];
        for filter in &filters {
            let out = apply_pipeline(&set, &schema, filter).unwrap();
            let rows = out.records.source_rows();
            assert!(rows.len() <= set.len());
            assert!(rows.windows(2).all(|w| w[0] < w[1]), "order broken: {rows:?}");
            let all = set.source_rows();
            assert!(rows.iter().all(|r| all.contains(r)));
        }
    }

    #[test]
    fn test_filter_state_is_empty() {
        assert!(FilterState::default().is_empty());
        assert!(FilterState::default()
            .with(Dimension::Account, Selection::Unconstrained)
            .with_search(" ")
            .is_empty());
        assert!(!FilterState::default().with_search("x").is_empty());
    }
}
