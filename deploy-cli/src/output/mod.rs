//! CLI output formatting helpers.

use deploy_core::{DeploymentHistoryEntry, DeploymentOutcome, DeploymentProfile};

/// Returns terminal width from COLUMNS, or 80 if unset/invalid.
pub(crate) fn terminal_width() -> usize {
    std::env::var("COLUMNS")
        .ok()
        .and_then(|value| value.parse::<usize>().ok())
        .filter(|width| *width >= 20)
        .unwrap_or(80)
}

/// Truncates text to at most `width` chars, appending ellipsis if truncated.
pub(crate) fn truncate_to_width(text: &str, width: usize) -> String {
    let text_len = text.chars().count();
    if text_len <= width {
        return text.to_string();
    }
    if width == 0 {
        return String::new();
    }
    if width == 1 {
        return "…".to_string();
    }

    let mut output: String = text.chars().take(width - 1).collect();
    output.push('…');
    output
}

pub(crate) fn render_history_row(entry: &DeploymentHistoryEntry, width: usize) -> String {
    let status = match entry.outcome {
        DeploymentOutcome::Success => "SUCCESS",
        DeploymentOutcome::Partial => "PARTIAL",
        DeploymentOutcome::Failed => "FAILED",
        DeploymentOutcome::Cancelled => "CANCELLED",
    };
    let line = format!(
        "{} | {} | {} | {} uploaded, {} failed{}",
        entry.started_at.format("%Y-%m-%d %H:%M:%S"),
        entry.profile_name,
        status,
        entry.files_uploaded,
        entry.files_failed,
        entry
            .error_summary
            .as_deref()
            .map(|summary| format!(" | {summary}"))
            .unwrap_or_default()
    );
    truncate_to_width(&line, width)
}

pub(crate) fn render_profile(profile: &DeploymentProfile) -> String {
    format!(
        "name: {}\nhost: {}:{}\nprotocol: {:?}\nusername: {}\nremote_root: {}\nlocal_build_dir: {}\nbuild_command: {}\nexclude_patterns: {}\npool_size: {}\nuse_app_offline: {}",
        profile.name,
        profile.host,
        profile.effective_port(),
        profile.protocol,
        profile.username,
        profile.remote_root,
        profile.local_build_dir,
        profile.build_command.as_deref().unwrap_or("(none)"),
        if profile.exclude_patterns.is_empty() {
            "(none)".to_string()
        } else {
            profile.exclude_patterns.join(", ")
        },
        profile.pool_size,
        profile.use_app_offline,
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_terminal_width_returns_sensible_value() {
        let w = terminal_width();
        assert!(w >= 20, "terminal_width should be at least 20, got {w}");
        assert!(w <= 2000, "terminal_width should be at most 2000, got {w}");
    }

    #[test]
    fn test_truncate_to_width_appends_ellipsis() {
        assert_eq!(truncate_to_width("hello world", 5), "hell…");
    }

    #[test]
    fn test_truncate_to_width_leaves_short_text_untouched() {
        assert_eq!(truncate_to_width("hi", 10), "hi");
    }
}
