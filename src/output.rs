use tabled::settings::Style;
use tabled::{Table, Tabled};

use crate::run::{DeletionOutcome, RunSummary};

#[derive(Tabled)]
struct OutcomeRow {
    #[tabled(rename = "Resource")]
    resource: String,
    #[tabled(rename = "Service")]
    service: String,
    #[tabled(rename = "Status")]
    status: &'static str,
    #[tabled(rename = "Detail")]
    detail: String,
}

fn status_of(outcome: &DeletionOutcome) -> &'static str {
    match (outcome.attempted, outcome.succeeded) {
        (true, true) => "deleted",
        (true, false) => "failed",
        (false, _) if outcome.is_unsupported() => "unsupported",
        (false, _) => "preview",
    }
}

/// Renders the per-resource table followed by the summary counts.
pub fn render_table(outcomes: &[DeletionOutcome]) -> String {
    let rows: Vec<OutcomeRow> = outcomes
        .iter()
        .map(|outcome| OutcomeRow {
            resource: outcome.locator.raw.clone(),
            service: outcome.locator.service.clone(),
            status: status_of(outcome),
            detail: outcome.error.clone().unwrap_or_default(),
        })
        .collect();

    let mut table = Table::new(rows);
    table.with(Style::sharp());

    let summary = RunSummary::from_outcomes(outcomes);
    format!(
        "{}\n{} total, {} attempted, {} succeeded, {} failed, {} unsupported",
        table,
        summary.total,
        summary.attempted,
        summary.succeeded,
        summary.failed,
        summary.unsupported
    )
}

pub fn render_json(outcomes: &[DeletionOutcome]) -> serde_json::Result<String> {
    serde_json::to_string_pretty(outcomes)
}
