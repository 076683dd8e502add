// ActionBoard - util/constants.rs
//
// Single source of truth for all named constants, limits, and defaults.

// =============================================================================
// Application metadata
// =============================================================================

/// Application display name.
pub const APP_NAME: &str = "ActionBoard";

/// Application identifier used for config/data directories.
pub const APP_ID: &str = "ActionBoard";

/// Current application version (updated by release script).
pub const APP_VERSION: &str = env!("CARGO_PKG_VERSION");

// =============================================================================
// Source retrieval
// =============================================================================

/// Published CSV of the ApprovalQueue sheet.
pub const DEFAULT_SOURCE_URL: &str = "https://docs.google.com/spreadsheets/d/e/2PACX-1vScHlqnqFOunJNbSGHE2a9PRQgy-Lcgummq14rnn1HxkydyDeZ0sSHdW5BFb1Cg3qNaZ4gxtk5ycUJS/pub?gid=304505671&single=true&output=csv";

/// Default HTTP timeout for a single retrieval (seconds).
pub const DEFAULT_FETCH_TIMEOUT_SECS: u64 = 5;

/// Minimum user-configurable retrieval timeout (seconds).
pub const MIN_FETCH_TIMEOUT_SECS: u64 = 1;

/// Maximum user-configurable retrieval timeout (seconds).
/// Retrieval blocks the query pass, so this stays short.
pub const MAX_FETCH_TIMEOUT_SECS: u64 = 30;

// =============================================================================
// Cache
// =============================================================================

/// Maximum age of a cached record set before it is refetched (seconds).
pub const CACHE_TTL_SECS: u64 = 60;

// =============================================================================
// Schema
// =============================================================================

/// The one mandatory column. Rows are gated on it before any other filter.
pub const STATUS_COLUMN: &str = "ApprovalStatus";

/// Lower-cased status value that passes the status gate.
pub const APPROVED_STATUS: &str = "approved";

/// Priority column, normalised to trimmed upper case.
pub const PRIORITY_COLUMN: &str = "Priority";

/// Priority code counted by the headline metric.
pub const HIGHEST_PRIORITY_CODE: &str = "P1";

/// Selection sentinel meaning "no constraint on this dimension".
pub const ALL_SENTINEL: &str = "All";

/// Free-text search columns, in match order.
pub const SEARCH_COLUMNS: &[&str] = &["SMART Action", "Feedback", "FinalFeedback"];

/// Display columns in preference order. Missing ones are skipped.
pub const PREFERRED_COLUMNS: &[&str] = &[
    "Account",
    "Stakeholder (Responder)",
    "Project Manager",
    "PM Email",
    "Theme",
    "Priority",
    "Target Date",
    "Status",
    "SMART Action",
    "KPI Impact",
    "Evidence",
    "SentryStatus",
    "SentryReason",
    "SentryEscalationTo",
    "SentryMessage",
    "Last Update",
];

// =============================================================================
// Metrics
// =============================================================================

/// Label of the first metric.
pub const METRIC_APPROVED_LABEL: &str = "Approved Actions";

/// Label of the second metric.
pub const METRIC_TOTAL_LABEL: &str = "Total Rows in Sheet";

/// Label of the headline metric when the priority dimension resolved.
pub const METRIC_HIGHEST_PRIORITY_LABEL: &str = "P1 Approved";

/// Label shown in place of the priority metric when Priority is absent.
pub const METRIC_PLACEHOLDER_LABEL: &str = "Last Refreshed";

/// Value shown in place of the priority metric when Priority is absent.
pub const METRIC_PLACEHOLDER_VALUE: &str = "live";

// =============================================================================
// Export
// =============================================================================

/// Suggested file name for CSV exports.
pub const EXPORT_CSV_FILE_NAME: &str = "approved_actions.csv";

/// MIME type of CSV exports.
pub const EXPORT_CSV_MIME: &str = "text/csv";

/// Suggested file name for JSON exports.
pub const EXPORT_JSON_FILE_NAME: &str = "approved_actions.json";

/// MIME type of JSON exports.
pub const EXPORT_JSON_MIME: &str = "application/json";

// =============================================================================
// Watch mode
// =============================================================================

/// Minimum interval between watch-mode query passes (seconds).
pub const MIN_WATCH_INTERVAL_SECS: u64 = 1;

/// Maximum interval between watch-mode query passes (seconds).
pub const MAX_WATCH_INTERVAL_SECS: u64 = 3_600;

// =============================================================================
// Logging
// =============================================================================

/// Default log level.
pub const DEFAULT_LOG_LEVEL: &str = "info";

// =============================================================================
// Configuration
// =============================================================================

/// Configuration file name.
pub const CONFIG_FILE_NAME: &str = "config.toml";
