//! Panic hook printing a short crash report with run context.

use super::context::{get_current_context, RunContext};
use std::panic::PanicHookInfo;
use tracing::Span;

const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Install the custom panic hook. Call early in `main`.
pub fn install_panic_hook() {
    std::panic::set_hook(Box::new(|info| {
        eprintln!("{}", crash_report(info, &get_current_context()));
    }));
}

fn crash_report(info: &PanicHookInfo<'_>, context: &RunContext) -> String {
    let mut lines = vec![
        format!("noop-lifecycle {} crashed", VERSION),
        format!("  panic: {}", extract_panic_message(info)),
    ];
    if let Some(location) = info.location() {
        lines.push(format!(
            "  location: {}:{}:{}",
            location.file(),
            location.line(),
            location.column()
        ));
    }
    lines.extend(context_lines(context));
    if let Some(metadata) = Span::current().metadata() {
        lines.push(format!("  span: {}", metadata.name()));
    }
    if std::env::var("RUST_BACKTRACE").is_err() {
        lines.push("  run with RUST_BACKTRACE=1 for a stack trace".to_string());
    }
    lines.join("\n")
}

fn context_lines(context: &RunContext) -> Vec<String> {
    let mut lines = Vec::new();
    match context.phase {
        Some(phase) => lines.push(format!("  phase: {}", phase)),
        None => lines.push("  phase: (not set)".to_string()),
    }
    if let Some(file) = &context.current_file {
        lines.push(format!("  file: {}", file.display()));
    }
    lines
}

fn extract_panic_message(info: &PanicHookInfo<'_>) -> String {
    if let Some(s) = info.payload().downcast_ref::<&str>() {
        s.to_string()
    } else if let Some(s) = info.payload().downcast_ref::<String>() {
        s.clone()
    } else {
        "Unknown panic".to_string()
    }
}
