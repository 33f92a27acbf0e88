use colored::*;
use scantag_core::{RunStats, SandboxOutcome, SandboxSummary};

fn stat_lines(stats: &RunStats) -> Vec<String> {
    let mut lines = vec![
        format!("  {:22} {}", "Processed:", stats.processed),
        format!("  {:22} {}", "Edited:", stats.edited.to_string().green().bold()),
        format!("  {:22} {}", "Nothing to do:", stats.untouched),
    ];

    if stats.skipped > 0 {
        lines.push(format!(
            "  {:22} {}",
            "Skipped:",
            stats.skipped.to_string().yellow()
        ));
    }
    if stats.conflicts_abandoned > 0 {
        lines.push(format!(
            "  {:22} {}",
            "Abandoned (conflicts):",
            stats.conflicts_abandoned.to_string().yellow()
        ));
    }
    if stats.missing > 0 {
        lines.push(format!(
            "  {:22} {}",
            "Missing:",
            stats.missing.to_string().bright_black()
        ));
    }

    lines
}

/// Print the counters of a finished run
pub fn print_run_summary(stats: &RunStats) {
    println!();
    println!("{}", "Run summary".bold());
    println!("{}", "=".repeat(40));
    for line in stat_lines(stats) {
        println!("{}", line);
    }
}

/// Print the counters of one pass of a continuous run
pub fn print_pass_summary(pass: u64, rules: Option<usize>, stats: &RunStats) {
    println!();
    println!("{}", format!("Pass {} complete", pass).bold());
    if let Some(rules) = rules {
        println!("  {:22} {}", "Rules:", rules);
    }
    for line in stat_lines(stats) {
        println!("{}", line);
    }
}

fn print_table_summary(summary: &SandboxSummary) {
    println!("  {:22} {}", "Rules:", summary.rules);
    if summary.invalid > 0 {
        println!("  {:22} {}", "Invalid rules:", summary.invalid.to_string().red());
    }
    println!("  {:22} {}", "Test pages run:", summary.tests_run);
    println!(
        "  {:22} {}",
        "Test edits:",
        summary.test_stats.edited.to_string().green()
    );
}

/// Print the result of a sandbox regeneration
pub fn print_sandbox_summary(outcome: &SandboxOutcome) {
    println!();
    match outcome {
        SandboxOutcome::UpToDate => {
            println!("{} Sandbox is up to date", "✓".green());
        }
        SandboxOutcome::Saved(summary) => {
            println!("{} Sandbox updated", "✓".green());
            print_table_summary(summary);
        }
        SandboxOutcome::NoChange(summary) => {
            println!("{} Sandbox rebuilt, but nothing changed", "✓".green());
            print_table_summary(summary);
        }
    }
}
