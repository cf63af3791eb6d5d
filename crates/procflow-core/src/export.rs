//! Read-side export projection.
//!
//! Flattens every progress record into one row per (request, SKU, stage)
//! for CSV download. Pure transform over the canonical records; no state
//! machine involvement.

use std::io::Write;

use procflow_store::Store;
use serde::Serialize;
use tracing::warn;

use crate::error::FlowResult;
use crate::progress;
use crate::request;

/// One exported row.
#[derive(Debug, Clone, Serialize)]
pub struct ExportRow {
    pub request_id: String,
    pub requester: String,
    pub flavor: String,
    pub sku_id: String,
    pub stage: String,
    pub stage_label: String,
    pub status: String,
    pub completed_date: String,
    pub remarks: String,
    pub overall_progress: u8,
}

/// Flatten all progress records. Rows for a request whose record has gone
/// missing are emitted with an empty requester rather than dropped.
pub fn progress_rows(store: &Store) -> FlowResult<Vec<ExportRow>> {
    let mut rows = Vec::new();
    for record in progress::list_progress(store, None)? {
        let requester = match request::get_request(store, &record.request_id) {
            Ok(req) => req.requester,
            Err(e) => {
                warn!(request_id = %record.request_id, error = %e, "request missing during export");
                String::new()
            }
        };
        for stage in &record.stages {
            rows.push(ExportRow {
                request_id: record.request_id.clone(),
                requester: requester.clone(),
                flavor: record.flavor.as_str().to_string(),
                sku_id: record.sku_id.clone().unwrap_or_default(),
                stage: stage.key.clone(),
                stage_label: stage.label.clone(),
                status: stage.status.as_str().to_string(),
                completed_date: stage
                    .completed_date
                    .map(|d| d.to_rfc3339())
                    .unwrap_or_default(),
                remarks: stage.remarks.clone().unwrap_or_default(),
                overall_progress: record.overall_progress,
            });
        }
    }
    Ok(rows)
}

/// Serialize rows as CSV with a header record.
pub fn write_csv<W: Write>(rows: &[ExportRow], writer: W) -> FlowResult<()> {
    let mut csv_writer = csv::Writer::from_writer(writer);
    for row in rows {
        csv_writer.serialize(row)?;
    }
    csv_writer.flush()?;
    Ok(())
}
