use console::style;

use crate::artifacts::SignatureEntry;
use crate::cleanup::CleanupReport;
use crate::pipeline::{DisplaySink, EvaluationReport, Notice};
use crate::stage::Classification;
use crate::ui::icons::{
    CHECK, CROSS, FILE_DEL, FOLDER, FORGED, GENUINE, IMAGE, INFO, PROMPT, WARN,
};

/// Renders evaluation reports to stdout, as styled text or one JSON object per pass.
pub struct TerminalSink {
    json: bool,
}

impl TerminalSink {
    pub fn new(json: bool) -> Self {
        Self { json }
    }

    fn render_text(&self, report: &EvaluationReport) {
        println!();
        println!(
            "{} {}",
            style("State:").bold(),
            style(report.state.to_string()).cyan()
        );

        for item in &report.displays {
            println!(
                "  {}{} {}",
                IMAGE,
                style(format!("{}:", item.caption)).bold(),
                style(item.path.display()).dim()
            );
        }

        for notice in &report.notices {
            println!("  {}", format_notice(notice));
        }

        if let Some(verdict) = &report.verdict {
            let (icon, label) = match verdict.classification {
                Classification::Genuine => (&GENUINE, style("GENUINE").green().bold()),
                Classification::Forged => (&FORGED, style("FORGED").red().bold()),
            };
            println!(
                "  {}{} {}",
                icon,
                label,
                style(format!("({})", verdict.candidate.display())).dim()
            );
        }

        if let Some(cleanup) = &report.cleanup {
            print_cleanup(cleanup);
        }
    }
}

impl DisplaySink for TerminalSink {
    fn render(&self, report: &EvaluationReport) {
        if self.json {
            match serde_json::to_string(report) {
                Ok(line) => println!("{}", line),
                Err(e) => tracing::error!(error = %e, "failed to serialize report"),
            }
        } else {
            self.render_text(report);
        }
    }
}

fn format_notice(notice: &Notice) -> String {
    match notice {
        Notice::Prompt(m) => format!("{}{}", PROMPT, style(m).yellow()),
        Notice::Info(m) => format!("{}{}", INFO, m),
        Notice::Success(m) => format!("{}{}", CHECK, style(m).green()),
        Notice::Warning(m) => format!("{}{}", WARN, style(m).yellow()),
        Notice::Error(m) => format!("{}{}", CROSS, style(m).red()),
    }
}

pub fn print_cleanup(cleanup: &CleanupReport) {
    for path in &cleanup.removed {
        println!("  {}Removed {}", FILE_DEL, style(path.display()).dim());
    }
    for failure in &cleanup.failures {
        println!(
            "  {}Could not remove {}: {}",
            CROSS,
            failure.path.display(),
            failure.reason
        );
    }
    if cleanup.removed.is_empty() && cleanup.failures.is_empty() {
        println!("  {}", style("Nothing to clean up").dim());
    }
}

/// Selection listing for `sigcheck signatures`.
pub fn print_signatures(root: &std::path::Path, entries: &[SignatureEntry]) {
    println!("{}{}", FOLDER, style(root.display()).bold());
    if entries.is_empty() {
        println!("  {}", style("No signatures available").dim());
        return;
    }
    for entry in entries {
        println!("  {}", entry.name);
    }
}
