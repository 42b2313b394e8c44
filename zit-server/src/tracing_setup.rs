//! Tracing setup for the zit binary
//!
//! Usage:
//!   zit --debug serve              # Debug logging to console
//!   RUST_LOG=zit_core=debug zit    # Fine-grained log control
//!
//! `db.echo` in the configuration adds statement logging from sqlx on top
//! of whatever filter is active.

use anyhow::{anyhow, Result};
use tracing_subscriber::filter::Directive;
use tracing_subscriber::EnvFilter;

/// Tracing configuration options
#[derive(Debug, Clone, Default)]
pub struct TracingConfig {
    /// Enable debug logging (sets debug level if RUST_LOG is not set)
    pub debug: bool,
    /// Log every SQL statement
    pub sql_echo: bool,
}

impl TracingConfig {
    fn filter(&self) -> Result<EnvFilter> {
        let default = if self.debug { "debug" } else { "info" };
        let filter =
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));

        if !self.sql_echo {
            return Ok(filter);
        }
        let echo: Directive = "sqlx::query=debug".parse().map_err(|err| anyhow!("{err}"))?;
        Ok(filter.add_directive(echo))
    }
}

/// Initialize console tracing
pub fn init_tracing(config: &TracingConfig) -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(config.filter()?)
        .with_target(config.debug)
        .compact()
        .try_init()
        .map_err(|err| anyhow!(err))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn echo_adds_statement_directive() {
        let config = TracingConfig {
            debug: false,
            sql_echo: true,
        };
        let filter = config.filter().unwrap();
        assert!(filter.to_string().contains("sqlx::query=debug"));
    }
}
