use crate::metrics::{Metric, ValidationReport};

/// Render a deterministic markdown report from a validation run.
pub fn render_report(report: &ValidationReport) -> String {
    let mut lines = Vec::new();

    lines.push("# Synthetic Data Validation Report".to_string());
    lines.push(String::new());
    lines.push(format!("- run_id: {}", report.run_id));
    lines.push(format!("- report_version: {}", report.report_version));
    lines.push(format!("- tables_analyzed: {}", report.tables_analyzed));
    lines.push(String::new());

    push_cardinality(&mut lines, report);
    push_distribution(&mut lines, report);
    push_null_rates(&mut lines, report);
    push_fk_ratios(&mut lines, report);
    push_temporal(&mut lines, report);
    push_integrity(&mut lines, report);
    push_privacy(&mut lines, report);

    lines.push("## SUMMARY".to_string());
    lines.extend(summary(report));
    lines.join("\n")
}

/// Push the failure line for a metric; true when the metric failed.
fn push_failure(lines: &mut Vec<String>, report: &ValidationReport, metric: Metric) -> bool {
    match report.failure(metric) {
        Some(failure) => {
            lines.push(format!("Metric failed: {}", failure.message));
            lines.push(String::new());
            true
        }
        None => false,
    }
}

fn push_cardinality(lines: &mut Vec<String>, report: &ValidationReport) {
    lines.push("## [1] CARDINALITY ANALYSIS".to_string());
    if push_failure(lines, report, Metric::Cardinality) {
        return;
    }
    let Some(cardinality) = &report.cardinality else {
        return;
    };
    lines.push("| table | source_rows | synthetic_rows | match |".to_string());
    lines.push("| --- | --- | --- | --- |".to_string());
    for row in &cardinality.tables {
        let source = row
            .source_rows
            .map(|rows| rows.to_string())
            .unwrap_or_else(|| "-".to_string());
        lines.push(format!(
            "| {} | {} | {} | {} |",
            row.table, source, row.synthetic_rows, row.status
        ));
    }
    lines.push(String::new());
    if cardinality.all_match() {
        lines.push("Cardinality Check: PASS".to_string());
    } else {
        lines.push("NOTE: Row counts differ (expected for synthetic data)".to_string());
    }
    lines.push(String::new());
}

fn push_distribution(lines: &mut Vec<String>, report: &ValidationReport) {
    lines.push("## [2] VALUE DISTRIBUTION".to_string());
    if push_failure(lines, report, Metric::Distribution) {
        return;
    }
    let Some(distribution) = &report.distribution else {
        return;
    };
    if distribution.columns.is_empty() {
        lines.push("No text columns sampled.".to_string());
    } else {
        lines.push("| column | unique_values | top_share | status |".to_string());
        lines.push("| --- | --- | --- | --- |".to_string());
        for finding in &distribution.columns {
            let status = if finding.high_skew { "HIGH SKEW" } else { "OK" };
            lines.push(format!(
                "| {}.{} | {} | {:.1}% | {} |",
                finding.table, finding.column, finding.unique_values, finding.top_share_pct, status
            ));
        }
    }
    lines.push(String::new());
}

fn push_null_rates(lines: &mut Vec<String>, report: &ValidationReport) {
    lines.push("## [3] NULL RATES".to_string());
    if push_failure(lines, report, Metric::NullRates) {
        return;
    }
    let Some(null_rates) = &report.null_rates else {
        return;
    };
    if !null_rates.source_available {
        lines.push("Source statistics unavailable; null rates not compared.".to_string());
    } else if null_rates.comparisons.is_empty() {
        lines.push("No comparable columns.".to_string());
    } else {
        lines.push("| column | source_null | synthetic_null | match |".to_string());
        lines.push("| --- | --- | --- | --- |".to_string());
        for comparison in &null_rates.comparisons {
            lines.push(format!(
                "| {}.{} | {:.1}% | {:.1}% | {} |",
                comparison.table,
                comparison.column,
                comparison.source_null_pct,
                comparison.synthetic_null_pct,
                comparison.status
            ));
        }
    }
    lines.push(String::new());
}

fn push_fk_ratios(lines: &mut Vec<String>, report: &ValidationReport) {
    lines.push("## [4] FOREIGN KEY RATIOS".to_string());
    if push_failure(lines, report, Metric::FkRatios) {
        return;
    }
    let Some(fk_ratios) = &report.fk_ratios else {
        return;
    };
    if fk_ratios.ratios.is_empty() {
        lines.push("No foreign keys analyzed.".to_string());
    }
    for ratio in &fk_ratios.ratios {
        lines.push(format!(
            "- {}.{} -> {}: Avg records per parent: {:.2}",
            ratio.table, ratio.column, ratio.referenced_table, ratio.avg_children_per_parent
        ));
    }
    lines.push(String::new());
}

fn push_temporal(lines: &mut Vec<String>, report: &ValidationReport) {
    lines.push("## [5] TEMPORAL RANGES".to_string());
    if push_failure(lines, report, Metric::Temporal) {
        return;
    }
    let Some(temporal) = &report.temporal else {
        return;
    };
    if temporal.ranges.is_empty() {
        lines.push("No temporal columns analyzed or all values are NULL.".to_string());
    }
    for range in &temporal.ranges {
        lines.push(format!(
            "- {}.{}: {} to {}",
            range.table, range.column, range.min, range.max
        ));
    }
    lines.push(String::new());
}

fn push_integrity(lines: &mut Vec<String>, report: &ValidationReport) {
    lines.push("## [6] REFERENTIAL INTEGRITY".to_string());
    if push_failure(lines, report, Metric::Integrity) {
        return;
    }
    let Some(integrity) = &report.integrity else {
        return;
    };
    lines.push(format!("Total FK Checks: {}", integrity.total_checks));
    lines.push(format!("Orphaned Records: {}", integrity.orphans));
    lines.push(integrity.verdict());
    for orphan in &integrity.examples {
        lines.push(format!(
            "- {}.{} = {} (no row in {})",
            orphan.table, orphan.column, orphan.value, orphan.referenced_table
        ));
    }
    lines.push(String::new());
}

fn push_privacy(lines: &mut Vec<String>, report: &ValidationReport) {
    if report.privacy.is_none() && report.failure(Metric::Privacy).is_none() {
        return;
    }
    lines.push("## PRIVACY".to_string());
    if push_failure(lines, report, Metric::Privacy) {
        return;
    }
    let Some(privacy) = &report.privacy else {
        return;
    };
    if privacy.passed() {
        lines.push(format!(
            "PASS: No data leakage detected ({} PII columns checked)",
            privacy.columns_checked.len()
        ));
    } else {
        lines.push("FAIL: PII overlap detected".to_string());
        for finding in &privacy.findings {
            lines.push(format!("- {finding}"));
        }
    }
    lines.push(String::new());
}

fn summary(report: &ValidationReport) -> Vec<String> {
    let mut lines = Vec::new();
    let skewed = report
        .distribution
        .as_ref()
        .map(|distribution| distribution.columns.iter().filter(|c| c.high_skew).count())
        .unwrap_or_default();
    if skewed > 0 {
        lines.push(format!("- {skewed} column(s) show high value skew."));
    }
    let null_gaps = report
        .null_rates
        .as_ref()
        .map(|nulls| {
            nulls
                .comparisons
                .iter()
                .filter(|c| c.status == crate::metrics::MatchStatus::Differ)
                .count()
        })
        .unwrap_or_default();
    if null_gaps > 0 {
        lines.push(format!("- {null_gaps} column(s) differ in null rate from the source."));
    }
    for failure in &report.failures {
        lines.push(format!("- metric {} did not complete.", failure.metric));
    }
    let verdict = if report.passed() { "PASS" } else { "FAIL" };
    lines.push(format!("- overall: {verdict}"));
    lines
}
