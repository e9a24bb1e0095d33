//! Human-readable rendering of execution results.

use std::fmt::Write;
use triptych_core::{ExecutionResult, ExecutionRun, ResponseStatus};

const PREVIEW_CHARS: usize = 80;

fn preview(text: &str) -> String {
    let line = text.lines().next().unwrap_or_default();
    if line.chars().count() > PREVIEW_CHARS || text.lines().nth(1).is_some() {
        let cut: String = line.chars().take(PREVIEW_CHARS).collect();
        format!("{cut}…")
    } else {
        line.to_string()
    }
}

/// One block per variation, then the comparison verdict and the run journal.
pub fn render_result(result: &ExecutionResult) -> String {
    let mut out = String::new();
    let run = &result.execution_run;
    let _ = writeln!(
        out,
        "Run {} '{}': {} ({} ok, {} failed, {} ms)",
        run.id, run.name, run.status, result.success_count, result.error_count, result.total_time_ms
    );

    for variation in &result.results {
        let response = &variation.response;
        let _ = write!(
            out,
            "  {:<20} {:<8} {:>6} ms",
            variation.variation_name(),
            response.status,
            response.response_time_ms
        );
        match response.status {
            ResponseStatus::Success => {
                let text = response.response_text.as_deref().unwrap_or_default();
                let _ = writeln!(out, "  {}", preview(text));
            }
            _ => {
                let error = response.error_message.as_deref().unwrap_or("unknown error");
                let _ = writeln!(out, "  {error}");
            }
        }
        for call in &variation.function_calls {
            let source = if call.used_mock_data { "mock" } else { "live" };
            let _ = writeln!(
                out,
                "    -> {}() {} [{}]",
                call.function_name, call.execution_status, source
            );
        }
    }

    if let Some(comparison) = &result.comparison {
        let _ = writeln!(
            out,
            "Best: {} by {}",
            comparison.best_configuration.variation_name, comparison.metric_name
        );
        if let Some(notes) = &comparison.analysis_notes {
            let _ = writeln!(out, "  {notes}");
        }
    }

    if !result.logs.is_empty() {
        let _ = writeln!(out, "Log:");
        for entry in &result.logs {
            let _ = writeln!(out, "  {entry}");
        }
    }
    out
}

/// One line per run.
pub fn render_runs(runs: &[ExecutionRun]) -> String {
    let mut out = String::new();
    for run in runs {
        let _ = writeln!(
            out,
            "{}  {:<9}  {}  {}",
            run.id,
            run.status,
            run.created_at.format("%Y-%m-%d %H:%M:%S"),
            run.name
        );
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_preview_truncates_long_and_multiline_text() {
        assert_eq!(preview("short"), "short");
        assert_eq!(preview("first\nsecond"), "first…");
        let long = "x".repeat(200);
        assert_eq!(preview(&long).chars().count(), PREVIEW_CHARS + 1);
    }

    #[test]
    fn test_render_runs_lists_each_run() {
        let runs = vec![
            ExecutionRun::new("alpha", None, false),
            ExecutionRun::new("beta", None, false),
        ];
        let text = render_runs(&runs);
        assert_eq!(text.lines().count(), 2);
        assert!(text.contains("pending"));
        assert!(text.lines().nth(1).unwrap().ends_with("beta"));
    }
}
