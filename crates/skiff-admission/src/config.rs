//! User-configuration validation against a recipe's option schema.
//!
//! Every declared option is checked; every problem is collected. The
//! result is one aggregate error, never a piecemeal first-failure.

use std::sync::LazyLock;

use regex::Regex;
use thiserror::Error;

use skiff_core::{OptionKind, Recipe, UserConfig, scalar_to_string};

static EMAIL_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[A-Za-z0-9._%+-]+@[A-Za-z0-9.-]+\.[A-Za-z]{2,}$").expect("static pattern")
});

/// Placeholder domains rejected for email options. Matched as an exact
/// domain or a dot-separated suffix, case-insensitive — `example.com.co`
/// is a different registrable domain and passes.
const RESERVED_EMAIL_DOMAINS: &[&str] = &[
    "example.com",
    "example.org",
    "example.net",
    "test.com",
    "invalid",
    "localhost",
];

/// Documentation domains rejected for domain/hostname options,
/// substring-matched. Narrower than the email list: `localhost` and
/// `.local` are legitimate on private networks.
const RESERVED_HOSTNAME_PARTS: &[&str] = &[
    "example.com",
    "example.org",
    "example.net",
    ".example",
    ".test",
    ".invalid",
];

/// Universally weak passwords, compared case-insensitively.
const WEAK_PASSWORDS: &[&str] = &[
    "password",
    "password1",
    "password123",
    "12345678",
    "123456789",
    "qwerty123",
    "letmein1",
    "changeme",
    "admin123",
    "iloveyou",
];

/// Aggregate of every field-level problem found in one payload.
#[derive(Debug, Error)]
#[error("configuration invalid: {}", .0.join("; "))]
pub struct ConfigValidationError(pub Vec<String>);

/// Validate a user configuration against a recipe's declared options.
///
/// Never mutates the input. An empty error list means success.
pub fn validate_config(recipe: &Recipe, config: &UserConfig) -> Result<(), ConfigValidationError> {
    let mut errors = Vec::new();

    for option in &recipe.options {
        let Some(value) = config.get(&option.name) else {
            if option.required {
                errors.push(format!("missing required field: {}", option.name));
            }
            continue;
        };

        let text = scalar_to_string(value);
        if text.is_empty() {
            if option.required {
                errors.push(format!("field '{}' cannot be empty", option.name));
            }
            // No type-specific check for an empty value.
            continue;
        }

        // Type rules run for every present field, required or not.
        if let Some(problem) = check_typed(option.kind, &option.name, &text) {
            errors.push(problem);
        }
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(ConfigValidationError(errors))
    }
}

fn check_typed(kind: OptionKind, name: &str, value: &str) -> Option<String> {
    match kind {
        OptionKind::Email => check_email(name, value),
        OptionKind::Password => check_password(name, value),
        OptionKind::Domain | OptionKind::Hostname => check_hostname(name, value),
        _ => None,
    }
}

fn check_email(name: &str, value: &str) -> Option<String> {
    if !EMAIL_RE.is_match(value) {
        return Some(format!("field '{name}' is not a valid email address"));
    }
    let domain = value.rsplit('@').next().unwrap_or("").to_lowercase();
    for reserved in RESERVED_EMAIL_DOMAINS {
        if domain == *reserved || domain.ends_with(&format!(".{reserved}")) {
            return Some(format!(
                "field '{name}' uses the placeholder domain '{reserved}'"
            ));
        }
    }
    None
}

fn check_password(name: &str, value: &str) -> Option<String> {
    // Characters, not bytes: multi-byte passwords count per char.
    if value.chars().count() < 8 {
        return Some(format!("field '{name}' must be at least 8 characters"));
    }
    let lowered = value.to_lowercase();
    if WEAK_PASSWORDS.contains(&lowered.as_str()) {
        return Some(format!("field '{name}' is a commonly used weak password"));
    }
    None
}

fn check_hostname(name: &str, value: &str) -> Option<String> {
    let lowered = value.to_lowercase();
    for reserved in RESERVED_HOSTNAME_PARTS {
        if lowered.contains(reserved) {
            return Some(format!(
                "field '{name}' contains the documentation domain '{reserved}'"
            ));
        }
    }
    None
}
