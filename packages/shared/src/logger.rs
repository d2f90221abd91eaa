//! Logging setup for the Roomlink binaries.

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Crates whose log output is enabled by the default filter.
const WORKSPACE_CRATES: [&str; 2] = ["roomlink_client", "roomlink_shared"];

/// Build the default filter directive for the workspace crates and the binary.
///
/// Hyphens in the binary name are turned into underscores to match the module
/// path tracing records.
pub fn default_directive(binary_name: &str, default_log_level: &str) -> String {
    WORKSPACE_CRATES
        .iter()
        .copied()
        .chain(std::iter::once(binary_name))
        .map(|target| format!("{}={}", target.replace('-', "_"), default_log_level))
        .collect::<Vec<_>>()
        .join(",")
}

/// Initialize the tracing subscriber with the specified default log level.
///
/// Logs go to stderr so they do not interleave with the interactive prompt on
/// stdout. The level can be overridden using the `RUST_LOG` environment variable.
///
/// # Examples
///
/// ```no_run
/// use roomlink_shared::logger::setup_logger;
///
/// setup_logger("roomlink-client", "info");
/// ```
pub fn setup_logger(binary_name: &str, default_log_level: &str) {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| default_directive(binary_name, default_log_level).into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_directive_covers_workspace_and_binary() {
        // テスト項目: ワークスペースのクレートとバイナリ名がフィルタに含まれる
        // given (前提条件):
        let binary_name = "roomlink-client";

        // when (操作):
        let directive = default_directive(binary_name, "debug");

        // then (期待する結果):
        assert!(directive.contains("roomlink_client=debug"));
        assert!(directive.contains("roomlink_shared=debug"));
        assert!(!directive.contains('-'));
    }
}
