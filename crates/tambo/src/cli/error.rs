//! Helpful error types for CLI commands
//!
//! Every error includes:
//! - What went wrong
//! - Suggestions for how to fix it

use std::fmt;
use std::path::Path;
use tambo::validate::ValidationErrors;
use tambo_db::DbError;

/// An error with helpful context and suggestions
#[derive(Debug)]
pub struct HelpfulError {
    pub message: String,
    pub context: Option<String>,
    /// Extra lines listed under the message (one per validation failure)
    pub details: Vec<String>,
    pub suggestions: Vec<String>,
}

impl HelpfulError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            context: None,
            details: Vec::new(),
            suggestions: Vec::new(),
        }
    }

    pub fn with_context(mut self, context: impl Into<String>) -> Self {
        self.context = Some(context.into());
        self
    }

    pub fn with_suggestion(mut self, suggestion: impl Into<String>) -> Self {
        self.suggestions.push(suggestion.into());
        self
    }

    pub fn with_details(mut self, details: impl IntoIterator<Item = impl Into<String>>) -> Self {
        self.details.extend(details.into_iter().map(Into::into));
        self
    }

    // === Common error constructors ===

    pub fn unknown_section(name: &str) -> Self {
        let known: Vec<&str> = tambo_db::EntityKind::ALL
            .iter()
            .map(|k| k.section_key())
            .collect();
        Self::new(format!("Unknown section: '{}'", name))
            .with_context(format!("Known sections: {}", known.join(", ")))
            .with_suggestion("TRY: tambo list datos_generales")
    }

    pub fn file_not_found(path: &Path) -> Self {
        Self::new(format!("File not found: {}", path.display()))
            .with_context("The specified file does not exist")
            .with_suggestion(format!("TRY: Check if the file exists: ls -la {}", path.display()))
    }

    pub fn json_parse_error(path: &Path, details: &str) -> Self {
        Self::new(format!("JSON parse error: {}", details))
            .with_context(format!("Failed to parse form file: {}", path.display()))
            .with_suggestion("TRY: The form must be a JSON object of form key -> value")
    }

    pub fn validation(section: &str, errors: &ValidationErrors) -> Self {
        Self::new(format!("Submission for '{}' was rejected", section))
            .with_context("Nothing was saved")
            .with_details(errors.messages.iter().cloned())
    }

    pub fn store(err: DbError) -> Self {
        match err {
            DbError::NoFarm => Self::new("No farm exists yet")
                .with_context("Section data must belong to a farm")
                .with_suggestion("TRY: tambo submit datos_generales --file farm.json"),
            DbError::MissingParent(farm) => Self::new(format!("Farm not found: {}", farm))
                .with_suggestion("TRY: tambo list datos_generales   # show known farms"),
            DbError::Constraint(msg) => Self::new(msg),
            other => Self::new(other.to_string()),
        }
    }

    pub fn no_data() -> Self {
        Self::new("No farm data found")
            .with_suggestion("TRY: tambo submit datos_generales --file farm.json")
            .with_suggestion("TRY: tambo import <dir>   # load section CSV files")
    }
}

impl fmt::Display for HelpfulError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "ERROR: {}", self.message)?;

        if let Some(ctx) = &self.context {
            writeln!(f, "CONTEXT: {}", ctx)?;
        }
        for detail in &self.details {
            writeln!(f, "  - {}", detail)?;
        }

        if !self.suggestions.is_empty() {
            writeln!(f)?;
            for suggestion in &self.suggestions {
                writeln!(f, "  {}", suggestion)?;
            }
        }

        Ok(())
    }
}

impl std::error::Error for HelpfulError {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_helpful_error_display() {
        let err = HelpfulError::new("Something went wrong")
            .with_context("While saving")
            .with_suggestion("Try again");

        let display = format!("{}", err);
        assert!(display.contains("ERROR: Something went wrong"));
        assert!(display.contains("CONTEXT: While saving"));
        assert!(display.contains("Try again"));
    }

    #[test]
    fn test_validation_lists_every_message() {
        let errors = ValidationErrors {
            messages: vec!["first".into(), "second".into()],
        };
        let display = HelpfulError::validation("datos_generales", &errors).to_string();
        assert!(display.contains("  - first"));
        assert!(display.contains("  - second"));
    }

    #[test]
    fn test_unknown_section_lists_known() {
        let display = HelpfulError::unknown_section("vacas").to_string();
        assert!(display.contains("rebano"));
        assert!(display.contains("transporte"));
    }
}
