//! Compiler configuration.

use std::borrow::Cow;

use tracing::Level;

/// Configuration for [`Compiler`](crate::Compiler).
#[derive(Debug, Clone)]
pub struct CompilerConfig {
    /// Whether to emit compiled statements as `pginsert.sql` tracing events.
    pub logging_enabled: bool,
    /// Tracing event level to emit at.
    pub log_level: Level,
    /// Truncate logged SQL (in bytes, on a char boundary). `None` means no truncation.
    pub max_sql_length: Option<usize>,
}

impl Default for CompilerConfig {
    fn default() -> Self {
        Self {
            logging_enabled: true,
            log_level: Level::DEBUG,
            max_sql_length: Some(200),
        }
    }
}

impl CompilerConfig {
    /// Create a new configuration with defaults.
    pub fn new() -> Self {
        Self::default()
    }

    /// Enable statement logging.
    pub fn with_logging(mut self) -> Self {
        self.logging_enabled = true;
        self
    }

    /// Disable statement logging.
    pub fn no_logging(mut self) -> Self {
        self.logging_enabled = false;
        self
    }

    /// Override the tracing event level.
    pub fn log_level(mut self, level: Level) -> Self {
        self.log_level = level;
        self
    }

    /// Set maximum SQL length to log.
    pub fn max_sql_length(mut self, len: usize) -> Self {
        self.max_sql_length = Some(len);
        self
    }

    /// Disable SQL truncation.
    pub fn no_truncate(mut self) -> Self {
        self.max_sql_length = None;
        self
    }

    pub(crate) fn truncate_sql<'s>(&self, sql: &'s str) -> Cow<'s, str> {
        match self.max_sql_length {
            Some(max) if sql.len() > max => {
                Cow::Owned(format!("{}...", truncate_at_char_boundary(sql, max)))
            }
            _ => Cow::Borrowed(sql),
        }
    }
}

fn truncate_at_char_boundary(sql: &str, max_bytes: usize) -> &str {
    let mut end = max_bytes.min(sql.len());
    while end > 0 && !sql.is_char_boundary(end) {
        end -= 1;
    }
    &sql[..end]
}
