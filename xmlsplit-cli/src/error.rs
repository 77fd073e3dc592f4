//! Error handling for the CLI application

use std::fmt;

/// Custom error type for CLI-specific errors
#[derive(Debug)]
pub enum CliError {
    /// Settings file not found or inaccessible
    ConfigNotFound(String),
    /// Settings file could not be parsed
    ConfigParse(String),
    /// Refusing to overwrite an existing file
    OutputExists(String),
    /// Configured stylesheet does not exist
    StylesheetNotFound(String),
}

impl fmt::Display for CliError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CliError::ConfigNotFound(path) => write!(f, "Settings file not found: {path}"),
            CliError::ConfigParse(msg) => write!(f, "Invalid settings file: {msg}"),
            CliError::OutputExists(path) => {
                write!(f, "Output file already exists: {path} (use --force to overwrite)")
            }
            CliError::StylesheetNotFound(path) => write!(f, "Stylesheet not found: {path}"),
        }
    }
}

impl std::error::Error for CliError {}

/// Result type alias for CLI operations
pub type CliResult<T> = Result<T, anyhow::Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_not_found_display() {
        let error = CliError::ConfigNotFound("xmlsplit.toml".to_string());
        assert_eq!(error.to_string(), "Settings file not found: xmlsplit.toml");
    }

    #[test]
    fn test_config_parse_display() {
        let error = CliError::ConfigParse("unknown field `elemnt`".to_string());
        assert_eq!(
            error.to_string(),
            "Invalid settings file: unknown field `elemnt`"
        );
    }

    #[test]
    fn test_output_exists_mentions_force() {
        let error = CliError::OutputExists("xmlsplit.toml".to_string());
        assert!(error.to_string().contains("--force"));
    }

    #[test]
    fn test_wrapped_in_anyhow() {
        let result: CliResult<()> =
            Err(CliError::StylesheetNotFound("transform.xslt".to_string()).into());
        let err = result.unwrap_err();
        assert!(err.to_string().contains("transform.xslt"));
        assert!(err.downcast_ref::<CliError>().is_some());
    }
}
