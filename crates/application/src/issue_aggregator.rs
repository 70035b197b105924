use std::collections::BTreeMap;

use formkern_core::{AppResult, FieldId};
use formkern_domain::{
    CustomRuleReport, FieldPathRegistry, IssueSource, ServerFieldErrors, SubmissionStateMachine,
    ValidationIssue,
};

use crate::submission_ports::SchemaIssue;

/// Merges validation signals from the three sources into one ranked list.
///
/// At most one issue survives per field. When sources disagree on the same
/// field the higher-ranked source wins: server over schema over custom. The
/// output is ordered by the canonical field order so it can back the
/// top-level summary banner directly; fields missing from the order are
/// appended last, sorted by field id, to keep the output deterministic.
pub struct IssueAggregator;

impl IssueAggregator {
    /// Builds the ranked issue list for one validation pass.
    pub fn aggregate(
        registry: &FieldPathRegistry,
        schema_issues: &[SchemaIssue],
        custom_reports: &[CustomRuleReport],
        server_errors: &ServerFieldErrors,
    ) -> AppResult<Vec<ValidationIssue>> {
        let mut ranked: BTreeMap<FieldId, ValidationIssue> = BTreeMap::new();

        for report in custom_reports {
            if report.is_valid() {
                continue;
            }

            Self::insert_ranked(
                &mut ranked,
                ValidationIssue::new(
                    report.field().clone(),
                    report.message(),
                    IssueSource::Custom,
                )?,
            );
        }

        for issue in schema_issues {
            Self::insert_ranked(
                &mut ranked,
                ValidationIssue::new(
                    issue.field.clone(),
                    issue.message.clone(),
                    IssueSource::Schema,
                )?,
            );
        }

        for (field, message) in server_errors.iter() {
            // A rejection without a usable message must still surface.
            let message = if message.trim().is_empty() {
                "rejected by the server"
            } else {
                message
            };
            Self::insert_ranked(
                &mut ranked,
                ValidationIssue::new(field.clone(), message, IssueSource::Server)?,
            );
        }

        let mut issues: Vec<ValidationIssue> = ranked.into_values().collect();
        issues.sort_by_key(|issue| match registry.index_of(issue.field()) {
            Some(index) => (0, index, issue.field().clone()),
            None => (1, usize::MAX, issue.field().clone()),
        });

        Ok(issues)
    }

    /// Applies the visibility gate to an aggregated issue list.
    ///
    /// Before the first submit attempt nothing is visible, even when issues
    /// are already computable, unless the caller forces visibility.
    #[must_use]
    pub fn visible_issues<'a>(
        issues: &'a [ValidationIssue],
        machine: &SubmissionStateMachine,
        force_show: bool,
    ) -> &'a [ValidationIssue] {
        if machine.has_attempted() || force_show {
            issues
        } else {
            &[]
        }
    }

    fn insert_ranked(ranked: &mut BTreeMap<FieldId, ValidationIssue>, issue: ValidationIssue) {
        match ranked.get(issue.field()) {
            Some(existing) if existing.source().rank() >= issue.source().rank() => {}
            _ => {
                ranked.insert(issue.field().clone(), issue);
            }
        }
    }
}
