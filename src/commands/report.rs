use crate::api::Mode;
use crate::args::{ReportArgs, ReportFormat};
use crate::commands::{load_log, Out};
use crate::error::{ErrorType, IntoResult};
use crate::model::{MonthlyReport, SkippedRow};
use crate::{Config, Result};
use anyhow::Context;
use chrono::{Datelike, Local, Month};
use serde::Serialize;
use std::fmt::Write;

/// The monthly report along with the rows that could not be included in it.
#[derive(Debug, Clone, Serialize)]
pub struct ReportOut {
    #[serde(flatten)]
    report: MonthlyReport,
    skipped_rows: Vec<SkippedRow>,
}

impl ReportOut {
    pub fn report(&self) -> &MonthlyReport {
        &self.report
    }

    pub fn skipped_rows(&self) -> &[SkippedRow] {
        &self.skipped_rows
    }
}

/// Reads the sheet and aggregates the month given in `args` (the current month by default).
pub async fn report(config: Config, mode: Mode, args: ReportArgs) -> Result<Out<ReportOut>> {
    let month = args.month().unwrap_or_else(|| Local::now().month());
    let log = load_log(&config, mode).await.pub_result(ErrorType::Store)?;
    let out = ReportOut {
        report: MonthlyReport::aggregate(&log, args.year(), month),
        skipped_rows: log.skipped().to_vec(),
    };

    let message = match args.format() {
        ReportFormat::Json => serde_json::to_string_pretty(&out)
            .context("Unable to serialize the report")
            .pub_result(ErrorType::Store)?,
        ReportFormat::Table => render_table(&out),
    };
    Ok(Out::new(message, out))
}

fn month_name(month: u32) -> &'static str {
    u8::try_from(month)
        .ok()
        .and_then(|m| Month::try_from(m).ok())
        .map(|m| m.name())
        .unwrap_or("Unknown month")
}

fn render_table(out: &ReportOut) -> String {
    let report = &out.report;
    if report.is_empty() {
        return format!("No data for month {}.", report.month());
    }

    let mut s = String::new();
    let title = match report.year() {
        Some(year) => format!("{} {year}", month_name(report.month())),
        None => month_name(report.month()).to_string(),
    };
    // Writing to a String cannot fail.
    let _ = writeln!(s, "Report for {title}\n");
    let _ = writeln!(s, "  Income   {:>12}", report.total_income().whole_dollars());
    let _ = writeln!(s, "  Expense  {:>12}", report.total_expense().whole_dollars());
    let _ = writeln!(s, "  Balance  {:>12}", report.balance().whole_dollars());

    if !report.hierarchical_breakdown().is_empty() {
        let _ = writeln!(s, "\nExpenses by category");
        for (main, total) in report.main_category_totals() {
            let _ = writeln!(s, "  {main:<34}{:>14}", total.to_string());
            for entry in report
                .hierarchical_breakdown()
                .iter()
                .filter(|e| e.main_category == main)
            {
                let _ = writeln!(
                    s,
                    "    {:<32}{:>14}",
                    entry.sub_category,
                    entry.amount.to_string()
                );
            }
        }

        let _ = writeln!(s, "\nExpenses by member");
        for entry in report.grouped_breakdown() {
            let group = format!(
                "{} / {} / {}",
                entry.main_category, entry.sub_category, entry.member
            );
            let _ = writeln!(s, "  {group:<46}{:>14}", entry.amount.to_string());
        }
    }

    if !out.skipped_rows.is_empty() {
        let _ = writeln!(
            s,
            "\n{} row(s) in the sheet could not be read and were left out.",
            out.skipped_rows.len()
        );
    }
    s.trim_end().to_string()
}
