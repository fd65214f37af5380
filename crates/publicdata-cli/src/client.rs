//! Shared context, error types, and argument parsers for the CLI.

use std::fmt::{self, Display, Formatter};
use std::time::Duration;

use anyhow::anyhow;

use publicdata_http::HttpClient;
use publicdata_providers::{Language, ProviderError, ProviderRegistry};

use crate::cli::Cli;

/// CLI-level error type to distinguish validation from operational failures.
#[derive(Debug)]
pub(crate) enum CliError {
    Validation(String),
    Failure(anyhow::Error),
}

/// Convenience alias for functions returning a `CliError`.
pub(crate) type CliResult<T> = Result<T, CliError>;

impl CliError {
    pub(crate) fn validation(message: impl Into<String>) -> Self {
        Self::Validation(message.into())
    }

    pub(crate) fn failure(error: impl Into<anyhow::Error>) -> Self {
        Self::Failure(error.into())
    }

    pub(crate) const fn exit_code(&self) -> i32 {
        match self {
            Self::Validation(_) => 2,
            Self::Failure(_) => 3,
        }
    }

    pub(crate) fn display_message(&self) -> String {
        match self {
            Self::Validation(message) => message.clone(),
            Self::Failure(error) => format!("{error:#}"),
        }
    }
}

impl Display for CliError {
    fn fmt(&self, formatter: &mut Formatter<'_>) -> fmt::Result {
        formatter.write_str("cli error")
    }
}

impl std::error::Error for CliError {}

/// Application context passed to command handlers.
pub(crate) struct AppContext {
    pub(crate) registry: ProviderRegistry,
}

impl AppContext {
    /// Build the provider registry from CLI options, with every provider
    /// sharing one client carrying the requested timeout.
    pub(crate) fn from_cli(cli: &Cli) -> CliResult<Self> {
        let client = HttpClient::with_timeout(Duration::from_secs(cli.timeout))
            .map_err(|err| CliError::failure(anyhow!("failed to build HTTP client: {err}")))?;
        Ok(Self {
            registry: ProviderRegistry::with_client(&client),
        })
    }
}

/// Map a provider error onto the validation/failure split: errors caused by
/// what the user typed exit 2, everything else exits 3.
pub(crate) fn classify_provider_error(error: ProviderError) -> CliError {
    match error {
        ProviderError::UnknownProvider { name } => CliError::validation(format!(
            "unknown provider '{name}' (expected one of: cmhc, statcan)"
        )),
        ProviderError::InvalidPid { input } => CliError::validation(format!(
            "'{input}' is not a StatCan table identifier (expected at least 8 leading digits)"
        )),
        ProviderError::UnsupportedLanguage { input } => CliError::validation(format!(
            "unsupported language '{input}' (expected en or fr)"
        )),
        ProviderError::NoAssets {
            landing_url,
            filter,
        } => CliError::failure(match filter {
            Some(filter) => anyhow!("no assets matching '{filter}' on {landing_url}"),
            None => anyhow!("no downloadable assets found on {landing_url}"),
        }),
        ProviderError::StatCanTable { pid, source } => CliError::failure(
            anyhow::Error::new(*source).context(format!("failed to fetch table {pid}")),
        ),
        other => CliError::failure(other),
    }
}

/// Parse the publication language provided to the CLI.
pub(crate) fn parse_language(input: &str) -> Result<Language, String> {
    input
        .parse::<Language>()
        .map_err(|_| format!("invalid language '{input}' (expected en or fr)"))
}
