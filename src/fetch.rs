//! Test-case fetching and classification.
//!
//! This is the first pipeline stage: run a WIQL query against the
//! tracking service, pull each matching work item, and bucket it by
//! automation status into a [`ClassifiedReport`].

use crate::client::WorkItemClient;
use crate::models::{AutomationStatus, CaseEntry, ClassifiedReport};
use anyhow::{Context, Result};
use indicatif::{ProgressBar, ProgressStyle};
use tracing::{debug, info};

/// Field holding the automation status of a test case.
pub const AUTOMATION_STATUS_FIELD: &str = "Microsoft.VSTS.TCM.AutomationStatus";

/// Field holding the area path.
pub const AREA_PATH_FIELD: &str = "System.AreaPath";

/// Query used when the caller supplies none: all Test Case work items,
/// ordered by id.
pub const DEFAULT_QUERY: &str = "\
SELECT [System.Id] \
FROM WorkItems \
WHERE [System.WorkItemType] = 'Test Case' \
ORDER BY [System.Id]";

/// Options for a fetch.
#[derive(Debug, Clone, Default)]
pub struct FetchOptions {
    /// WIQL query to run; [`DEFAULT_QUERY`] when `None`.
    pub query: Option<String>,
    /// Show a progress bar while work items are fetched.
    pub show_progress: bool,
}

/// Fetch and classify test cases.
///
/// Work items are retrieved one at a time, in query order. A missing
/// automation-status field reads as empty and therefore classifies as
/// manual.
pub async fn fetch_test_cases(
    client: &impl WorkItemClient,
    options: &FetchOptions,
) -> Result<ClassifiedReport> {
    let query = options.query.as_deref().unwrap_or(DEFAULT_QUERY);
    debug!("Running WIQL query: {}", query);

    let ids = client
        .query_ids(query)
        .await
        .context("WIQL query failed")?;
    info!("Query matched {} work items", ids.len());

    let progress = if options.show_progress && !ids.is_empty() {
        let pb = ProgressBar::new(ids.len() as u64);
        pb.set_style(
            ProgressStyle::default_bar()
                .template(
                    "{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} ({eta})",
                )
                .unwrap()
                .progress_chars("#>-"),
        );
        Some(pb)
    } else {
        None
    };

    let mut report = ClassifiedReport::new();

    for id in ids {
        let work_item = client
            .get_work_item(id)
            .await
            .with_context(|| format!("failed to fetch work item {}", id))?;

        let status = AutomationStatus::classify(work_item.field_str(AUTOMATION_STATUS_FIELD));
        let area_path = work_item.field_str(AREA_PATH_FIELD).to_string();

        debug!("TC{} is {} in {}", work_item.id, status, area_path);
        report.push(status, CaseEntry::new(work_item.id, area_path));

        if let Some(ref pb) = progress {
            pb.inc(1);
        }
    }

    if let Some(pb) = progress {
        pb.finish_and_clear();
    }

    info!(
        "Classified {} test cases: {} automated, {} manual, {} automatable",
        report.total(),
        report.automated.len(),
        report.manual.len(),
        report.automatable.len()
    );

    Ok(report)
}
