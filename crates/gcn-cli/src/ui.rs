//! Terminal output for teardown runs

use colored::*;
use crossterm::terminal::size;
use gcn_core::ProgressSink;
use gcn_undeploy::{BranchState, PlannedDeletion, UndeployOutcome, UndeployReport};

/// Progress sink printing each step as it happens
#[derive(Debug, Default)]
pub struct TerminalProgress;

impl TerminalProgress {
    pub fn new() -> Self {
        Self
    }
}

impl ProgressSink for TerminalProgress {
    fn begin(&self, title: &str) {
        println!("{} {}", "▶".blue(), title.bold());
    }

    fn report(&self, message: &str) {
        println!("  {} {}", "→".dimmed(), message);
    }

    fn error(&self, message: &str) {
        eprintln!("{} {}", "✗".red(), message.red());
    }
}

fn rule() -> String {
    let width = size().map(|(w, _)| w as usize).unwrap_or(80);
    "─".repeat(width.clamp(20, 72))
}

/// One numbered line per planned step
pub fn plan_lines(steps: &[PlannedDeletion]) -> Vec<String> {
    steps
        .iter()
        .enumerate()
        .map(|(i, step)| format!("{:>3}. {} ({})", i + 1, step.description, step.id))
        .collect()
}

pub fn display_plan(steps: &[PlannedDeletion]) {
    if steps.is_empty() {
        println!("{}", "Nothing to undeploy".green());
        return;
    }
    println!("{}", format!("Deletion plan ({} steps)", steps.len()).bold());
    println!("{}", rule().dimmed());
    for line in plan_lines(steps) {
        println!("{}", line);
    }
}

fn branch_label(state: BranchState) -> String {
    match state {
        BranchState::Pending => "pending".to_string(),
        BranchState::Deleting(kind) => format!("deleting {}", kind.display_name()),
        BranchState::Deleted(kind) => format!("deleted {}", kind.display_name()),
        BranchState::Empty => "empty".to_string(),
        BranchState::Failed => "failed".to_string(),
    }
}

/// Plain text summary of a finished run
pub fn report_lines(report: &UndeployReport) -> Vec<String> {
    let mut lines = vec![match &report.outcome {
        UndeployOutcome::Completed => format!("{}: undeployed", report.target),
        UndeployOutcome::InProgress => format!("{}: interrupted", report.target),
        UndeployOutcome::Skipped { reason } => format!("{}: skipped ({})", report.target, reason),
        UndeployOutcome::Failed { message } => format!("{}: failed ({})", report.target, message),
    }];
    lines.push(format!("deleted {} resource(s)", report.deleted.len()));
    for deleted in &report.deleted {
        lines.push(format!("  - {}", deleted.description));
    }
    for (branch, state) in &report.branches {
        lines.push(format!("  {}: {}", branch, branch_label(*state)));
    }
    lines
}

pub fn display_report(report: &UndeployReport) {
    let lines = report_lines(report);
    println!("{}", rule().dimmed());
    for (i, line) in lines.iter().enumerate() {
        if i > 0 {
            println!("{}", line);
            continue;
        }
        let headline = match report.outcome {
            UndeployOutcome::Completed => line.green().bold(),
            UndeployOutcome::Skipped { .. } => line.yellow(),
            UndeployOutcome::InProgress => line.yellow().bold(),
            UndeployOutcome::Failed { .. } => line.red().bold(),
        };
        println!("{}", headline);
    }
    if let Some(duration) = report.duration() {
        println!(
            "{}",
            format!("finished in {:.1}s", duration.num_milliseconds() as f64 / 1000.0).dimmed()
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use gcn_core::{DeploymentState, FolderDeployState, NamedResource, ResourceKind};
    use gcn_undeploy::plan;

    fn state() -> DeploymentState {
        let mut app = FolderDeployState::with_code_repository("repo-app");
        app.dev_build_pipeline = Some("bp-dev".to_string());
        DeploymentState::new(NamedResource::new("dev", "c1"))
            .with_project(NamedResource::new("demo", "p1"))
            .with_repository("app", app)
    }

    #[test]
    fn test_plan_lines_are_numbered() {
        let lines = plan_lines(&plan(&state()));
        assert_eq!(lines.len(), 3);
        assert!(lines[0].starts_with("  1. "));
        assert!(lines[0].ends_with("(bp-dev)"));
        assert_eq!(lines[2], "  3. devops project demo (p1)");
    }

    #[test]
    fn test_report_lines() {
        let mut report = UndeployReport::new("demo");
        report.record_deleted(ResourceKind::CodeRepository, "repo-app", "source code repository for app");
        report.set_branch("app", BranchState::Empty);
        report.set_branch("project", BranchState::Failed);
        report.fail("Failed to delete devops project demo: 409 Conflict");

        let lines = report_lines(&report);
        assert_eq!(
            lines,
            vec![
                "demo: failed (Failed to delete devops project demo: 409 Conflict)",
                "deleted 1 resource(s)",
                "  - source code repository for app",
                "  app: empty",
                "  project: failed",
            ]
        );
    }

    #[test]
    fn test_skipped_report() {
        let mut report = UndeployReport::new("lib");
        report.skip("No services to undeploy for lib");
        assert_eq!(
            report_lines(&report)[0],
            "lib: skipped (No services to undeploy for lib)"
        );
    }
}
