//! # CLI Command Implementations
//!
//! This module contains the actual implementations of CLI commands.

use crate::api;
use crate::config::{ConfigSource, DeploymentConfig, load_troubleshooter};
use remedy_core::{Outcome, RemedyError, Session, SessionState, Troubleshooter};
use std::io::{BufRead, Write};

fn print_json(value: &serde_json::Value) {
    println!("{}", serde_json::to_string_pretty(value).unwrap_or_default());
}

fn load(config: Option<&ConfigSource>) -> Result<Troubleshooter, RemedyError> {
    load_troubleshooter(config).map(|(troubleshooter, _)| troubleshooter)
}

// =============================================================================
// SERVER COMMAND
// =============================================================================

/// Start the HTTP server.
pub async fn cmd_server(config: Option<&ConfigSource>, host: &str, port: u16) -> Result<(), RemedyError> {
    let (troubleshooter, source) = load_troubleshooter(config)?;

    println!("Remedy Troubleshooting Server Starting...");
    println!();
    println!("Configuration:");
    println!("  Host:       {}", host);
    println!("  Port:       {}", port);
    println!("  Deployment: {} ({})", troubleshooter.name(), source);
    println!();
    println!("Endpoints:");
    println!("  GET    /categories                          - List categories");
    println!("  GET    /categories/{{category}}/faults        - List faults");
    println!("  GET    /categories/{{category}}/faults/{{fault}} - Fault details");
    println!("  POST   /session                             - Start a session");
    println!("  GET    /session                             - Session state");
    println!("  POST   /session/steps/{{index}}               - Complete a step");
    println!("  DELETE /session/steps/{{index}}               - Uncomplete a step");
    println!("  POST   /session/outcome                     - Record the outcome");
    println!("  POST   /session/reset                       - Reset progress");
    println!("  GET    /health                              - Health check");
    println!();
    println!("Press Ctrl+C to stop");
    println!();

    let addr = format!("{}:{}", host, port);
    api::run_server(&addr, troubleshooter).await
}

// =============================================================================
// TAXONOMY COMMANDS
// =============================================================================

/// List categories.
pub fn cmd_categories(config: Option<&ConfigSource>, json_mode: bool) -> Result<(), RemedyError> {
    let troubleshooter = load(config)?;
    let categories = troubleshooter.store().list_categories();

    if json_mode {
        let output = serde_json::json!({
            "deployment": troubleshooter.name(),
            "categories": categories
                .iter()
                .map(|c| serde_json::json!({ "name": c.name(), "fault_count": c.faults().len() }))
                .collect::<Vec<_>>(),
        });
        print_json(&output);
        return Ok(());
    }

    println!("{}", troubleshooter.name());
    println!("{}", "=".repeat(troubleshooter.name().len()));
    for category in categories {
        println!("  {} ({} faults)", category.name(), category.faults().len());
    }

    Ok(())
}

/// List the faults of a category.
pub fn cmd_faults(config: Option<&ConfigSource>, json_mode: bool, category: &str) -> Result<(), RemedyError> {
    let troubleshooter = load(config)?;
    let cat = troubleshooter.store().category(category)?;

    if json_mode {
        let output = serde_json::json!({
            "category": cat.name(),
            "faults": cat.fault_names().collect::<Vec<_>>(),
        });
        print_json(&output);
        return Ok(());
    }

    println!("{}", cat.name());
    println!("{}", "=".repeat(cat.name().len()));
    for fault in cat.faults() {
        match &fault.code {
            Some(code) => println!("  [{}] {}", code, fault.name),
            None => println!("  {}", fault.name),
        }
    }

    Ok(())
}

/// Show a fault's details and direct steps.
pub fn cmd_show(
    config: Option<&ConfigSource>,
    json_mode: bool,
    category: &str,
    fault: &str,
) -> Result<(), RemedyError> {
    let troubleshooter = load(config)?;
    let details = troubleshooter.fault(category, fault)?;
    let direct = troubleshooter.direct_steps(category, fault);

    if json_mode {
        let output = serde_json::json!({
            "fault": details,
            "steps_documented": direct.is_ok(),
        });
        print_json(&output);
        return Ok(());
    }

    println!("{} / {}", details.category, details.name);
    if let Some(code) = &details.code {
        println!("Code:       {}", code);
    }
    println!("Indication: {}", details.indication);
    println!("Impact:     {}", details.impact);
    println!();
    println!("Probable causes:");
    for cause in &details.causes {
        println!("  - {}", cause);
    }
    println!();

    match direct {
        Ok(steps) => {
            println!("Troubleshooting steps:");
            for (i, step) in steps.iter().enumerate() {
                println!("  {}. {}", i + 1, step);
            }
        }
        Err(RemedyError::EmptyStepSet { .. }) => {
            println!("No troubleshooting steps documented for this fault.");
            println!("Run `remedy plan` to see the generic procedures that apply.");
        }
        Err(e) => return Err(e),
    }

    Ok(())
}

/// Show the procedures selected for a fault.
pub fn cmd_plan(
    config: Option<&ConfigSource>,
    json_mode: bool,
    category: &str,
    fault: &str,
) -> Result<(), RemedyError> {
    let troubleshooter = load(config)?;
    let procedures = troubleshooter.plan(category, fault)?;

    if json_mode {
        let output = serde_json::json!({
            "category": category,
            "fault": fault,
            "procedures": procedures.iter().map(|p| &**p).collect::<Vec<_>>(),
        });
        print_json(&output);
        return Ok(());
    }

    let total: usize = procedures.iter().map(|p| p.steps.len()).sum();
    println!("{} procedures, {} steps", procedures.len(), total);
    let mut index = 0usize;
    for procedure in &procedures {
        println!();
        println!("{} [{}]", procedure.title, procedure.id);
        for step in &procedure.steps {
            println!("  {:>3}. {}", index, step);
            index += 1;
        }
    }

    Ok(())
}

// =============================================================================
// CHECK COMMAND
// =============================================================================

/// Validate a deployment file.
pub fn cmd_check(file: Option<&ConfigSource>, json_mode: bool) -> Result<(), RemedyError> {
    let (config, source) = DeploymentConfig::load(file)?;
    let troubleshooter = config.build()?;
    let store = troubleshooter.store();

    let undocumented: Vec<String> = store
        .list_categories()
        .iter()
        .flat_map(|c| c.faults())
        .filter(|f| !f.has_steps())
        .map(|f| format!("{} / {}", f.category, f.name))
        .collect();

    if json_mode {
        let output = serde_json::json!({
            "valid": true,
            "source": source.to_string(),
            "deployment": troubleshooter.name(),
            "categories": store.list_categories().len(),
            "faults": store.fault_count(),
            "procedures": troubleshooter.catalog().len(),
            "rules": troubleshooter.selector().rules().len(),
            "faults_without_steps": undocumented,
        });
        print_json(&output);
        return Ok(());
    }

    println!("Deployment OK: {} ({})", troubleshooter.name(), source);
    println!("  Categories: {}", store.list_categories().len());
    println!("  Faults:     {}", store.fault_count());
    println!("  Procedures: {}", troubleshooter.catalog().len());
    println!("  Rules:      {}", troubleshooter.selector().rules().len());
    if !undocumented.is_empty() {
        println!();
        println!("Faults without direct steps:");
        for name in &undocumented {
            println!("  - {}", name);
        }
    }

    Ok(())
}

// =============================================================================
// GUIDE COMMAND
// =============================================================================

/// One line of input to the interactive guide.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GuideCommand {
    Done(usize),
    Undo(usize),
    /// `done` without an index: the next step.
    Next,
    Record(Outcome),
    Reset,
    Status,
    Help,
    Quit,
}

impl std::str::FromStr for GuideCommand {
    type Err = String;

    fn from_str(line: &str) -> Result<Self, Self::Err> {
        let mut parts = line.split_whitespace();
        let word = parts.next().unwrap_or_default().to_ascii_lowercase();
        let arg = parts.next();

        let index = |arg: Option<&str>| -> Result<usize, String> {
            arg.ok_or_else(|| format!("'{}' needs a step number", word))?
                .parse::<usize>()
                .map_err(|_| format!("'{}' is not a step number", arg.unwrap_or_default()))
        };

        match word.as_str() {
            "done" | "d" => match arg {
                Some(_) => index(arg).map(GuideCommand::Done),
                None => Ok(GuideCommand::Next),
            },
            "undo" | "u" => index(arg).map(GuideCommand::Undo),
            "resolved" | "persists" | "unresolved" => word
                .parse::<Outcome>()
                .map(GuideCommand::Record)
                .map_err(|e| e.to_string()),
            "reset" => Ok(GuideCommand::Reset),
            "status" | "s" | "" => Ok(GuideCommand::Status),
            "help" | "?" => Ok(GuideCommand::Help),
            "quit" | "q" | "exit" => Ok(GuideCommand::Quit),
            other => Err(format!("Unknown command '{}'. Type 'help'.", other)),
        }
    }
}

const GUIDE_HELP: &str = "Commands: done [N], undo N, resolved, persists, reset, status, help, quit";

/// Interactive checklist on stdin/stdout.
pub fn cmd_guide(
    config: Option<&ConfigSource>,
    json_mode: bool,
    category: &str,
    fault: &str,
) -> Result<(), RemedyError> {
    let troubleshooter = load(config)?;
    let stdin = std::io::stdin();
    let stdout = std::io::stdout();
    run_guide(
        &troubleshooter,
        category,
        fault,
        stdin.lock(),
        stdout.lock(),
        json_mode,
    )
    .map(|_| ())
}

/// Drive one session from line-based input.
///
/// Returns the final session so callers can inspect where it ended.
pub fn run_guide<R: BufRead, W: Write>(
    troubleshooter: &Troubleshooter,
    category: &str,
    fault: &str,
    input: R,
    mut out: W,
    json_mode: bool,
) -> Result<Session, RemedyError> {
    let mut session = troubleshooter.start_session(category, fault)?;
    tracing::info!(
        "Guide started for '{}' / '{}' ({} steps)",
        category,
        fault,
        session.total()
    );

    render(&mut out, troubleshooter, &session, json_mode)?;
    write_line(&mut out, GUIDE_HELP)?;

    for line in input.lines() {
        let line = line.map_err(|e| RemedyError::Io(format!("Read input: {}", e)))?;
        let command = match line.parse::<GuideCommand>() {
            Ok(c) => c,
            Err(msg) => {
                write_line(&mut out, &msg)?;
                continue;
            }
        };

        let result = match command {
            GuideCommand::Quit => break,
            GuideCommand::Help => {
                write_line(&mut out, GUIDE_HELP)?;
                continue;
            }
            GuideCommand::Status => Ok(session.state()),
            GuideCommand::Done(i) => session.complete_step(i),
            GuideCommand::Next => session.complete_step(session.completed()),
            GuideCommand::Undo(i) => session.uncomplete_step(i),
            GuideCommand::Reset => Ok(session.reset()),
            GuideCommand::Record(outcome) => troubleshooter
                .conclude(&mut session, outcome)
                .map(|(state, _)| state),
        };

        match result {
            Ok(state) => {
                tracing::info!("Guide: {} ({}/{})", state, session.completed(), session.total());
                render(&mut out, troubleshooter, &session, json_mode)?;
            }
            Err(e) if e.is_ui_desync() => {
                tracing::warn!("Guide event rejected: {}", e);
                write_line(&mut out, &format!("Rejected: {}", e))?;
                render(&mut out, troubleshooter, &session, json_mode)?;
            }
            Err(e) => return Err(e),
        }
    }

    Ok(session)
}

fn write_line<W: Write>(out: &mut W, text: &str) -> Result<(), RemedyError> {
    writeln!(out, "{}", text).map_err(|e| RemedyError::Io(format!("Write output: {}", e)))
}

fn render<W: Write>(
    out: &mut W,
    troubleshooter: &Troubleshooter,
    session: &Session,
    json_mode: bool,
) -> Result<(), RemedyError> {
    let follow_up = session
        .outcome()
        .map(|o| troubleshooter.recorder().follow_up(o).to_vec())
        .unwrap_or_default();

    if json_mode {
        let output = serde_json::json!({
            "session": session.view(),
            "follow_up": follow_up,
        });
        return write_line(out, &serde_json::to_string(&output).unwrap_or_default());
    }

    let view = session.view();
    let mut text = String::new();
    text.push_str(&format!(
        "\n{} / {}  [{}]  {}/{} ({}%)\n",
        view.category,
        view.fault,
        view.state,
        view.progress.completed,
        view.progress.total,
        view.progress.percent
    ));
    for procedure in &view.procedures {
        text.push_str(&format!("\n{}\n", procedure.title));
        for step in &procedure.steps {
            let mark = if step.complete { "x" } else { " " };
            text.push_str(&format!("  [{}] {:>3}. {}\n", mark, step.index, step.text));
        }
    }

    match view.state {
        SessionState::AwaitingResolution => {
            text.push_str("\nAll steps complete. Enter 'resolved' or 'persists'.\n");
        }
        SessionState::Resolved | SessionState::Persists => {
            text.push_str(&format!(
                "\n{}\n",
                view.outcome.map(|o| o.label()).unwrap_or_default()
            ));
            for (i, action) in follow_up.iter().enumerate() {
                text.push_str(&format!("  {}. {}\n", i + 1, action.as_str()));
            }
        }
        SessionState::InProgress => {}
    }

    write!(out, "{}", text).map_err(|e| RemedyError::Io(format!("Write output: {}", e)))
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    fn builtin() -> Troubleshooter {
        DeploymentConfig::builtin(remedy_core::Machine::Hemodialysis)
            .expect("parse")
            .build()
            .expect("build")
    }

    #[test]
    fn guide_command_parsing() {
        assert_eq!("done 3".parse(), Ok(GuideCommand::Done(3)));
        assert_eq!("done".parse(), Ok(GuideCommand::Next));
        assert_eq!("UNDO 2".parse(), Ok(GuideCommand::Undo(2)));
        assert_eq!(
            "persists".parse(),
            Ok(GuideCommand::Record(Outcome::Persists))
        );
        assert_eq!(
            "unresolved".parse(),
            Ok(GuideCommand::Record(Outcome::Persists))
        );
        assert_eq!("q".parse(), Ok(GuideCommand::Quit));
        assert!("undo".parse::<GuideCommand>().is_err());
        assert!("done x".parse::<GuideCommand>().is_err());
        assert!("fly".parse::<GuideCommand>().is_err());
    }

    #[test]
    fn guide_walks_session_to_outcome() {
        let troubleshooter = builtin();
        let total = troubleshooter
            .start_session("Blood Circuit Errors", "Air Detector Alarm")
            .expect("session")
            .total();
        let mut script = String::new();
        for _ in 0..total {
            script.push_str("done\n");
        }
        script.push_str("persists\nquit\n");

        let mut out = Vec::new();
        let session = run_guide(
            &troubleshooter,
            "Blood Circuit Errors",
            "Air Detector Alarm",
            Cursor::new(script),
            &mut out,
            false,
        )
        .expect("guide");

        assert_eq!(session.state(), SessionState::Persists);
        let text = String::from_utf8(out).expect("utf8");
        assert!(text.contains("Issue persists"));
        assert!(text.contains("Escalate"));
    }

    #[test]
    fn guide_reports_rejected_events_and_continues() {
        let troubleshooter = builtin();
        let mut out = Vec::new();
        let session = run_guide(
            &troubleshooter,
            "Blood Circuit Errors",
            "Air Detector Alarm",
            Cursor::new("done 5\nresolved\ndone 0\n"),
            &mut out,
            false,
        )
        .expect("guide");

        assert_eq!(session.completed(), 1);
        let text = String::from_utf8(out).expect("utf8");
        assert_eq!(text.matches("Rejected:").count(), 2);
    }

    #[test]
    fn guide_unknown_fault_fails() {
        let troubleshooter = builtin();
        let result = run_guide(
            &troubleshooter,
            "Blood Circuit Errors",
            "No Such Alarm",
            Cursor::new(""),
            Vec::new(),
            true,
        );
        assert!(matches!(result, Err(RemedyError::FaultNotFound { .. })));
    }
}
