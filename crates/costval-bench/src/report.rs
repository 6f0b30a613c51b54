//! # Batch Report
//!
//! Collects per-instance outcomes and renders them as a table or as JSON.

use clap::ValueEnum;
use comfy_table::{Cell, CellAlignment, Color, ContentArrangement, Table};
use costval_core::compare::{PlanComparison, ValidationSummary};
use costval_core::evaluate::Degradation;
use ordered_float::OrderedFloat;
use serde::Serialize;

/// Output format selection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    Table,
    Json,
}

/// Costs of one evaluated instance.
#[derive(Debug, Clone, Serialize)]
pub struct InstanceResult {
    pub query: String,
    pub approx_cost: f64,
    pub exact_cost: f64,
    pub diff_percent: f64,
    pub degradation: Degradation,
}

/// Why an instance was left out of the summary.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SkipReason {
    /// Ground truth unreadable, malformed or without records.
    GroundTruth,
    /// The benchmark could not be run or timed out.
    Bench,
    /// The benchmark did not announce both trees, or they could not be read.
    TreesNotFound,
}

impl SkipReason {
    pub fn describe(&self) -> &'static str {
        match self {
            SkipReason::GroundTruth => "ground truth unavailable",
            SkipReason::Bench => "benchmark failed or timed out",
            SkipReason::TreesNotFound => "join tree files not found",
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct SkippedInstance {
    pub query: String,
    pub reason: SkipReason,
}

#[derive(Debug, Clone, Serialize)]
pub struct Report {
    pub results: Vec<InstanceResult>,
    pub skipped: Vec<SkippedInstance>,
    pub summary: ValidationSummary,
}

impl Report {
    pub fn new(threshold_percent: f64) -> Self {
        Self {
            results: Vec::new(),
            skipped: Vec::new(),
            summary: ValidationSummary::new(threshold_percent),
        }
    }

    pub fn record(&mut self, query: impl Into<String>, plans: &PlanComparison) {
        self.summary.record_plans(plans);
        self.results.push(InstanceResult {
            query: query.into(),
            approx_cost: plans.comparison.approx_cost,
            exact_cost: plans.comparison.exact_cost,
            diff_percent: plans.comparison.diff_percent,
            degradation: plans.degradation(),
        });
    }

    pub fn skip(&mut self, query: impl Into<String>, reason: SkipReason) {
        self.skipped.push(SkippedInstance {
            query: query.into(),
            reason,
        });
    }

    /// Results ordered from the worst regression to the best.
    pub fn by_regression(&self) -> Vec<&InstanceResult> {
        let mut rows: Vec<&InstanceResult> = self.results.iter().collect();
        rows.sort_by_key(|r| std::cmp::Reverse(OrderedFloat(r.diff_percent)));
        rows
    }

    pub fn render(&self, format: OutputFormat) -> serde_json::Result<String> {
        match format {
            OutputFormat::Json => serde_json::to_string_pretty(self),
            OutputFormat::Table => Ok(self.render_table()),
        }
    }

    fn render_table(&self) -> String {
        let mut out = String::new();
        if self.results.is_empty() {
            out.push_str("No results.\n");
            return out;
        }

        let mut table = Table::new();
        table.set_content_arrangement(ContentArrangement::Dynamic);
        table.load_preset(comfy_table::presets::UTF8_FULL_CONDENSED);
        table.set_header(
            ["Query", "DPconv (approx)", "DPccp (exact)", "Regression %", "Degraded"]
                .iter()
                .map(|h| Cell::new(h).fg(Color::Cyan))
                .collect::<Vec<_>>(),
        );
        for row in self.by_regression() {
            let diff = Cell::new(format!("{:.2}%", row.diff_percent))
                .set_alignment(CellAlignment::Right)
                .fg(if row.diff_percent <= self.summary.threshold_percent {
                    Color::Green
                } else {
                    Color::Red
                });
            table.add_row(vec![
                Cell::new(&row.query),
                Cell::new(format_cost(row.approx_cost)).set_alignment(CellAlignment::Right),
                Cell::new(format_cost(row.exact_cost)).set_alignment(CellAlignment::Right),
                diff,
                Cell::new(row.degradation.total()).set_alignment(CellAlignment::Right),
            ]);
        }
        out.push_str(&format!("{table}\n"));

        let s = &self.summary;
        out.push_str(&format!(
            "Summary: approximation effective (<= {:.1}% regression) in {}/{} cases.\n",
            s.threshold_percent, s.wins, s.instances
        ));
        if let Some(mean) = s.mean_diff_percent() {
            out.push_str(&format!("Mean regression: {:.2}%\n", mean));
        }
        if !self.skipped.is_empty() {
            out.push_str(&format!("Skipped: {}\n", self.skipped.len()));
            for skipped in &self.skipped {
                out.push_str(&format!("  {}: {}\n", skipped.query, skipped.reason.describe()));
            }
        }
        let d = &s.degradation;
        if !d.is_clean() {
            out.push_str(&format!(
                "Degraded nodes: {} malformed, {} unknown relations, {} leaves without \
                 cardinality, {} estimated joins\n",
                d.malformed_nodes, d.unknown_relations, d.missing_leaf_cardinalities, d.estimated_joins
            ));
        }
        out
    }
}

/// Round to an integer and group digits with commas.
pub fn format_cost(value: f64) -> String {
    if !value.is_finite() {
        return value.to_string();
    }
    let digits = format!("{:.0}", value.abs());
    let mut grouped = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, c) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(c);
    }
    if value.is_sign_negative() && digits != "0" {
        grouped.insert(0, '-');
    }
    grouped
}
