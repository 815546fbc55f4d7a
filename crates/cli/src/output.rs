use anyhow::{Result, bail};
use chrono::NaiveDate;
use leadflow_core::ValidationError;
use leadflow_local_store::Mutation;

/// Output format for listings and reports.
#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum OutputFormat {
    Text,
    Json,
}

pub fn print_json<T: serde::Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

pub fn date_or_dash(date: Option<NaiveDate>) -> String {
    date.map(|d| d.format("%Y-%m-%d").to_string())
        .unwrap_or_else(|| "-".to_string())
}

pub fn or_dash(value: &str) -> &str {
    if value.trim().is_empty() { "-" } else { value }
}

/// Shorten `s` to `max` characters, ending with "…" when cut.
pub fn truncate(s: &str, max: usize) -> String {
    if s.chars().count() <= max {
        return s.to_string();
    }
    let kept: String = s.chars().take(max.saturating_sub(1)).collect();
    format!("{kept}…")
}

/// Turn a store outcome into the applied value or a user-facing error.
pub fn expect_applied<T>(outcome: Mutation<T>, what: &str) -> Result<T> {
    match outcome {
        Mutation::Applied(value) => Ok(value),
        Mutation::Rejected(errors) => bail!("{what} rejected:\n{}", describe(&errors)),
        Mutation::NotFound(id) => bail!("lead {id} no longer exists"),
    }
}

fn describe(errors: &[ValidationError]) -> String {
    errors
        .iter()
        .map(|e| format!("  - {e}"))
        .collect::<Vec<_>>()
        .join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn truncate_counts_characters() {
        assert_eq!(truncate("Peña", 10), "Peña");
        assert_eq!(truncate("Información", 5), "Info…");
    }

    #[test]
    fn rejected_mutation_lists_every_error() {
        let outcome: Mutation<()> = Mutation::Rejected(vec![
            ValidationError::MissingField { field: "name" },
            ValidationError::NoContactMethod,
        ]);
        let message = format!("{:#}", expect_applied(outcome, "lead").unwrap_err());
        assert!(message.contains("missing required field: name"));
        assert!(message.contains("a mobile phone or an email is required"));
    }

    #[test]
    fn not_found_is_reported() {
        let outcome: Mutation<()> = Mutation::NotFound("9".to_string());
        let message = expect_applied(outcome, "lead").unwrap_err().to_string();
        assert_eq!(message, "lead 9 no longer exists");
    }
}
