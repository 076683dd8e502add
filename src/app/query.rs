// ActionBoard - app/query.rs
//
// One synchronous query pass per user interaction:
// Cache -> SchemaResolver -> FilterPipeline -> Metrics / Projection -> Export.
// Any fatal condition stops the pass and is returned as a QueryCondition.

use crate::app::cache::Cache;
use crate::app::source::SourceId;
use crate::core::export::{ExportFormat, ExportPayload};
use crate::core::filter::{apply_pipeline, Facet, FilterState};
use crate::core::metrics::{self, Metrics};
use crate::core::model::RecordSet;
use crate::core::projection::project;
use crate::core::schema::ResolvedSchema;
use crate::util::constants::PREFERRED_COLUMNS;
use crate::util::error::{ExportError, FetchError, SchemaError};
use chrono::{DateTime, Utc};
use std::fmt;

/// Everything the display layer needs for one interaction.
#[derive(Debug, Clone)]
pub struct QueryView {
    /// Resolved dimensions with their current options and selections.
    pub facets: Vec<Facet>,

    /// Filtered rows, projected onto the display columns.
    pub records: RecordSet,

    pub metrics: Metrics,

    /// Wall-clock time of the fetch that produced the data.
    pub refreshed_at: DateTime<Utc>,

    /// Ready-to-write export. `None` when no rows matched.
    pub export: Option<ExportPayload>,
}

impl QueryView {
    /// True when the filters left no rows: show a neutral "no data" state.
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn columns(&self) -> &[String] {
        self.records.columns()
    }
}

/// Conditions that stop a query pass before a view can be built.
#[derive(Debug)]
pub enum QueryCondition {
    /// The source returned no rows (or no columns at all).
    EmptyDataset,

    /// The mandatory status column is absent.
    MissingMandatoryColumn(SchemaError),

    /// Retrieval failed and no usable cached copy exists.
    FetchFailure(FetchError),

    /// Serialising the export payload failed.
    Export(ExportError),
}

impl QueryCondition {
    /// Whether the condition is a neutral state rather than a failure.
    pub fn is_soft(&self) -> bool {
        matches!(self, QueryCondition::EmptyDataset)
    }
}

impl fmt::Display for QueryCondition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::EmptyDataset => f.write_str("No data found in the sheet."),
            Self::MissingMandatoryColumn(e) => write!(f, "{e}"),
            Self::FetchFailure(e) => write!(f, "Could not load the source: {e}"),
            Self::Export(e) => write!(f, "Could not prepare the export: {e}"),
        }
    }
}

impl std::error::Error for QueryCondition {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::EmptyDataset => None,
            Self::MissingMandatoryColumn(e) => Some(e),
            Self::FetchFailure(e) => Some(e),
            Self::Export(e) => Some(e),
        }
    }
}

impl From<FetchError> for QueryCondition {
    fn from(e: FetchError) -> Self {
        Self::FetchFailure(e)
    }
}

impl From<SchemaError> for QueryCondition {
    fn from(e: SchemaError) -> Self {
        Self::MissingMandatoryColumn(e)
    }
}

impl From<ExportError> for QueryCondition {
    fn from(e: ExportError) -> Self {
        Self::Export(e)
    }
}

/// Run one query pass against the cached source.
pub fn run_query(
    cache: &Cache,
    source: &SourceId,
    filter: &FilterState,
    format: ExportFormat,
) -> Result<QueryView, QueryCondition> {
    let entry = cache.get_entry(source)?;
    let base = entry.records.as_ref();

    if base.is_empty() || base.columns().is_empty() {
        tracing::info!(source = %source, "Source dataset is empty");
        return Err(QueryCondition::EmptyDataset);
    }

    let schema = ResolvedSchema::resolve(base);
    let outcome = apply_pipeline(base, &schema, filter)?;
    let metrics = metrics::compute(&outcome.records, base, &schema);
    let records = project(&outcome.records, PREFERRED_COLUMNS);

    let export = if records.is_empty() {
        None
    } else {
        Some(ExportPayload::build(&records, format)?)
    };

    tracing::debug!(
        source = %source,
        filtered = !filter.is_empty(),
        total = metrics.total_rows,
        shown = metrics.approved_actions,
        columns = records.columns().len(),
        "Query complete"
    );

    Ok(QueryView {
        facets: outcome.facets,
        records,
        metrics,
        refreshed_at: entry.refreshed_at,
        export,
    })
}
