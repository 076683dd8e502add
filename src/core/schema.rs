// ActionBoard - core/schema.rs
//
// Resolves which optional columns the loaded dataset actually carries.
// The result is checked once per query; stages for unresolved
// dimensions become no-ops.

use crate::core::model::RecordSet;
use crate::util::constants::{SEARCH_COLUMNS, STATUS_COLUMN};
use std::fmt;

/// An optional column usable as an equality filter.
///
/// Variant order is the order structured filters are applied in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Dimension {
    Account,
    Theme,
    ProjectManager,
    Priority,
}

impl Dimension {
    /// All dimensions in application order.
    pub fn all() -> &'static [Dimension] {
        &[
            Dimension::Account,
            Dimension::Theme,
            Dimension::ProjectManager,
            Dimension::Priority,
        ]
    }

    /// Column names that may back this dimension, first match wins.
    ///
    /// The lower-case theme spelling exists in older sheets.
    pub fn candidates(self) -> &'static [&'static str] {
        match self {
            Dimension::Account => &["Account"],
            Dimension::Theme => &["Theme", "theme"],
            Dimension::ProjectManager => &["Project Manager"],
            Dimension::Priority => &["Priority"],
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Dimension::Account => "Account",
            Dimension::Theme => "Theme",
            Dimension::ProjectManager => "Project Manager",
            Dimension::Priority => "Priority",
        }
    }
}

impl fmt::Display for Dimension {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// A dimension bound to the column that backs it in this dataset.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedDimension {
    pub dimension: Dimension,
    pub column: String,
}

/// The capability set of the loaded dataset.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ResolvedSchema {
    /// Whether the mandatory status column is present.
    pub has_status: bool,

    /// Resolved dimensions, in application order.
    pub dimensions: Vec<ResolvedDimension>,

    /// Present free-text search columns, in match order.
    pub search_columns: Vec<String>,
}

impl ResolvedSchema {
    pub fn resolve(records: &RecordSet) -> Self {
        let dimensions: Vec<ResolvedDimension> = Dimension::all()
            .iter()
            .filter_map(|&dimension| {
                dimension
                    .candidates()
                    .iter()
                    .find(|c| records.has_column(c))
                    .map(|c| ResolvedDimension {
                        dimension,
                        column: (*c).to_string(),
                    })
            })
            .collect();

        let search_columns: Vec<String> = SEARCH_COLUMNS
            .iter()
            .filter(|c| records.has_column(c))
            .map(|c| (*c).to_string())
            .collect();

        let schema = Self {
            has_status: records.has_column(STATUS_COLUMN),
            dimensions,
            search_columns,
        };

        let resolved: Vec<Dimension> = schema.dimensions.iter().map(|d| d.dimension).collect();
        tracing::debug!(
            has_status = schema.has_status,
            dimensions = ?resolved,
            search_columns = ?schema.search_columns,
            "Schema resolved"
        );

        schema
    }

    /// Column backing `dimension`, or `None` when it did not resolve.
    pub fn column_for(&self, dimension: Dimension) -> Option<&str> {
        self.dimensions
            .iter()
            .find(|d| d.dimension == dimension)
            .map(|d| d.column.as_str())
    }

    pub fn resolves(&self, dimension: Dimension) -> bool {
        self.column_for(dimension).is_some()
    }
}
