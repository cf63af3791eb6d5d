//! Terminal output formatting.

use colored::{ColoredString, Colorize};
use procflow_core::allocation::OrderAllocation;
use procflow_core::batch::BatchOutcome;
use procflow_core::inspection::InspectionRecord;
use procflow_core::progress::model::{Progress, StageStatus};
use procflow_core::request::model::PurchaseRequest;
use procflow_core::schedule::ProductionSchedule;
use unicode_width::UnicodeWidthStr;

/// Print requests as a table.
pub fn print_requests_table(requests: &[PurchaseRequest]) {
    if requests.is_empty() {
        println!("{}", "No requests found.".dimmed());
        return;
    }

    println!(
        "{:<36} {:<16} {:>5} {:<14} {:<20}",
        "ID", "Requester", "SKUs", "Status", "Submitted"
    );
    println!("{}", "─".repeat(95));

    for req in requests {
        println!(
            "{:<36} {:<16} {:>5} {:<14} {:<20}",
            req.id,
            truncate(&req.requester, 14),
            req.line_items.len(),
            status_colored(req.status.as_str()),
            req.submitted_at.format("%Y-%m-%d %H:%M")
        );
    }

    println!();
    println!("{} request(s) total", requests.len());
}

/// Print one request with its allocation and progress records.
pub fn print_request(
    req: &PurchaseRequest,
    allocation: Option<&OrderAllocation>,
    records: &[Progress],
    ready_for_inspection: bool,
) {
    println!(
        "{} {}",
        req.requester.cyan().bold(),
        format!("({})", req.id).dimmed()
    );
    println!();
    println!("{}: {}", "Status".bold(), status_colored(req.status.as_str()));
    if let Some(reason) = &req.reject_reason {
        println!("{}: {}", "Rejected".bold(), reason.red());
    }

    println!();
    println!("{}", "Line Items".bold());
    for item in &req.line_items {
        println!(
            "  {} {} × {} @ {:.2}",
            item.sku_id.cyan(),
            item.product_name,
            item.quantity,
            item.unit_price
        );
    }

    if let Some(alloc) = allocation {
        println!();
        println!("{}", "Allocation".bold());
        println!("  Packaging: {}", alloc.packaging.as_str());
        println!(
            "  Payment:   {} (prepayment {:.2})",
            alloc.payment_method.as_str(),
            alloc.prepayment_amount
        );
        println!(
            "  Card:      {}",
            alloc
                .card_type
                .map(|c| c.as_str())
                .unwrap_or("none")
        );
        println!(
            "  Accessories: {}",
            if alloc.needs_accessories { "yes" } else { "no" }
        );
    }

    for progress in records {
        println!();
        print_progress(progress);
    }

    if ready_for_inspection {
        println!();
        println!("{}", "Ready for in-house inspection".green().bold());
    }
}

/// Print one progress record as a stage checklist.
pub fn print_progress(progress: &Progress) {
    let scope = match &progress.sku_id {
        Some(sku) => format!("{} / {}", progress.flavor.as_str(), sku),
        None => progress.flavor.as_str().to_string(),
    };
    println!(
        "{} {}",
        scope.bold(),
        format!("{}%", progress.overall_progress).yellow()
    );

    let label_width = progress
        .stages
        .iter()
        .map(|s| UnicodeWidthStr::width(s.label.as_str()))
        .max()
        .unwrap_or(0);

    // keep the remark column inside the terminal
    let remark_budget = term_width().saturating_sub(label_width + 32).max(10);
    for stage in &progress.stages {
        let marker = stage_marker(stage.status);
        let date = stage
            .completed_date
            .map(|d| d.format("%Y-%m-%d").to_string())
            .unwrap_or_default();
        let remarks = truncate(stage.remarks.as_deref().unwrap_or(""), remark_budget);
        println!(
            "  {} {}  {:<14} {:<10} {}",
            marker,
            pad_right(&stage.label, label_width),
            stage.key.dimmed(),
            date.dimmed(),
            remarks.dimmed()
        );
    }
}

/// Print progress records as a summary table.
pub fn print_progress_table(records: &[Progress]) {
    if records.is_empty() {
        println!("{}", "No progress records found.".dimmed());
        return;
    }

    println!(
        "{:<36} {:<12} {:<12} {:>5}",
        "Request", "Flavor", "SKU", "%"
    );
    println!("{}", "─".repeat(70));

    for progress in records {
        let percent = if progress.is_complete() {
            format!("{}", progress.overall_progress).green()
        } else {
            format!("{}", progress.overall_progress).yellow()
        };
        println!(
            "{:<36} {:<12} {:<12} {:>5}",
            progress.request_id,
            progress.flavor.as_str(),
            progress.sku_id.as_deref().unwrap_or("-"),
            percent
        );
    }
}

/// Print a batch outcome: completed keys, then skipped ones.
pub fn print_batch_outcome(outcome: &BatchOutcome) {
    for key in &outcome.succeeded {
        println!("  {} {}", "✓".green(), key);
    }
    for key in &outcome.skipped {
        println!("  {} {} {}", "·".dimmed(), key, "skipped".dimmed());
    }
    println!();
    println!(
        "{} completed, {} skipped",
        outcome.succeeded.len().to_string().green(),
        outcome.skipped.len()
    );
}

/// Print inspection records for a request.
pub fn print_inspections(records: &[InspectionRecord]) {
    if records.is_empty() {
        println!("{}", "No inspections recorded.".dimmed());
        return;
    }

    println!("{:<12} {:<8} {:>8} {:<20}", "SKU", "Result", "Arrived", "Remarks");
    println!("{}", "─".repeat(55));

    for record in records {
        let decision = match record.decision.as_str() {
            "pass" => "pass".green(),
            "fail" => "fail".red(),
            s => s.dimmed(),
        };
        println!(
            "{:<12} {:<8} {:>8} {:<20}",
            record.sku_id,
            decision,
            record
                .arrival_quantity
                .map(|q| q.to_string())
                .unwrap_or_else(|| "-".to_string()),
            record.remarks.as_deref().unwrap_or("")
        );
    }
}

/// Print production schedules as a table.
pub fn print_schedules_table(schedules: &[ProductionSchedule]) {
    if schedules.is_empty() {
        println!("{}", "No schedules found.".dimmed());
        return;
    }

    println!(
        "{:<36} {:<12} {:>8} {:<14}",
        "Request", "SKU", "Qty", "Status"
    );
    println!("{}", "─".repeat(75));

    for schedule in schedules {
        println!(
            "{:<36} {:<12} {:>8} {:<14}",
            schedule.request_id,
            schedule.sku_id,
            schedule.quantity,
            status_colored(schedule.status.as_str())
        );
    }

    println!();
    println!("{} schedule(s) total", schedules.len());
}

fn stage_marker(status: StageStatus) -> ColoredString {
    match status {
        StageStatus::NotStarted => "○".dimmed(),
        StageStatus::InProgress => "◐".yellow(),
        StageStatus::Completed => "●".green(),
        StageStatus::Skipped => "⊘".cyan(),
        StageStatus::NoRequirement => "—".dimmed(),
    }
}

fn status_colored(status: &str) -> ColoredString {
    match status {
        "submitted" | "pending" => status.to_string().normal(),
        "first_approved" | "scheduled" => status.to_string().cyan(),
        "approved" | "allocated" => status.to_string().blue(),
        "in_production" | "quality_check" | "ready_to_ship" => status.to_string().yellow(),
        "shipped" | "completed" => status.to_string().green(),
        "rejected" | "cancelled" => status.to_string().red(),
        s => s.to_string().dimmed(),
    }
}

/// Get terminal width, defaulting to 80.
fn term_width() -> usize {
    terminal_size::terminal_size()
        .map(|(w, _)| w.0 as usize)
        .unwrap_or(80)
}

/// Pad a plain string to a given visual width (right-padded).
fn pad_right(s: &str, width: usize) -> String {
    let visual = UnicodeWidthStr::width(s);
    if visual >= width {
        s.to_string()
    } else {
        format!("{}{}", s, " ".repeat(width - visual))
    }
}

/// Truncate a string to a maximum number of characters.
fn truncate(s: &str, max_len: usize) -> String {
    if s.chars().count() <= max_len {
        s.to_string()
    } else {
        let kept: String = s.chars().take(max_len.saturating_sub(3)).collect();
        format!("{kept}...")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pad_right_counts_visual_width() {
        // CJK labels are two columns per character
        assert_eq!(pad_right("定金", 6), "定金  ");
        assert_eq!(pad_right("ab", 4), "ab  ");
        assert_eq!(pad_right("abcdef", 4), "abcdef");
    }

    #[test]
    fn test_truncate() {
        assert_eq!(truncate("short", 10), "short");
        assert_eq!(truncate("a-rather-long-name", 10), "a-rathe...");
    }
}
