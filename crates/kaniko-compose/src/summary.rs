use colored::Colorize;
use kaniko_compose_build::{AbortReason, RunReport};
use kaniko_compose_core::{TaskOutcome, TaskStatus};

/// 実行結果のサマリーを表示
pub fn print(report: &RunReport) {
    println!();
    if report.outcomes.iter().all(|o| o.is_skipped()) {
        println!("{}", "Nothing to do.".yellow());
    }

    for outcome in &report.outcomes {
        print_outcome(outcome);
    }

    println!();
    println!(
        "{}: {}  {}: {}  {}: {}  {}: {}  {}: {}",
        "Built".green(),
        report.built(),
        "Failed".red(),
        report.build_failed(),
        "Skipped".yellow(),
        report.skipped(),
        "Mirror failures".red(),
        report.mirror_failed(),
        "Not started".dimmed(),
        report.not_started()
    );

    match report.aborted {
        Some(AbortReason::Interrupted) => println!("{}", "✗ Interrupted".red().bold()),
        Some(AbortReason::FailFast) => {
            println!("{}", "✗ Aborted after the first failed build".red().bold())
        }
        None if report.build_failed() > 0 => println!("{}", "✗ Some builds failed".red().bold()),
        None => println!("{}", "✓ Done".green().bold()),
    }
}

fn print_outcome(outcome: &TaskOutcome) {
    let image = outcome.image.as_deref().unwrap_or("-");
    match &outcome.status {
        TaskStatus::Built { mirror_failures } => {
            println!("  {} {} ({})", "✓".green(), outcome.service.cyan(), image);
            for failure in mirror_failures {
                println!(
                    "      {} mirror {}: {}",
                    "!".red(),
                    failure.mirror,
                    failure.reason
                );
            }
        }
        TaskStatus::BuildFailed(failure) => {
            println!(
                "  {} {} ({}): {}",
                "✗".red(),
                outcome.service.cyan(),
                image,
                failure
            );
            for line in &failure.stderr_tail {
                println!("      {}", line.dimmed());
            }
        }
        TaskStatus::Skipped(reason) => {
            println!(
                "  {} {} skipped: {}",
                "-".yellow(),
                outcome.service.cyan(),
                reason
            );
        }
        TaskStatus::NotStarted(reason) => {
            println!(
                "  {} {} not started: {}",
                "·".dimmed(),
                outcome.service.cyan(),
                reason
            );
        }
    }
}
