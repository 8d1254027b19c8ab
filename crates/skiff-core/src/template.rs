//! `${VAR}` placeholder scanning and template rendering.
//!
//! Recipe templates are service definitions with `${NAME}` placeholders.
//! A fixed set of names is always available (deployment identity), a
//! fixed set of prefixes is resolved late (database / cache connection
//! variables), and names carrying the derived-value suffix are computed
//! on-device. Everything else must map to a declared config option.

use std::collections::BTreeMap;

use thiserror::Error;

/// Variables the deployment pipeline always provides.
pub const BUILT_IN_VARS: &[&str] = &["DEPLOYMENT_ID", "COMPOSE_PROJECT", "DEVICE_IP"];

/// Prefixes resolved at environment-build time, not declared per recipe.
pub const EXEMPT_PREFIXES: &[&str] = &["DB_", "REDIS_"];

/// Suffix marking a value derived on-device rather than configured.
pub const DERIVED_SUFFIX: &str = "_HASH";

#[derive(Debug, Error, PartialEq)]
pub enum TemplateError {
    #[error("unterminated placeholder at byte offset {offset}")]
    Unterminated { offset: usize },
}

/// Whether a placeholder name is satisfied without a config option.
pub fn is_exempt(name: &str) -> bool {
    BUILT_IN_VARS.contains(&name)
        || EXEMPT_PREFIXES.iter().any(|p| name.starts_with(p))
        || name.ends_with(DERIVED_SUFFIX)
}

/// Collect every `${NAME}` placeholder in order of appearance.
///
/// Duplicates are preserved; an opening `${` with no closing brace is a
/// hard error.
pub fn scan_placeholders(body: &str) -> Result<Vec<String>, TemplateError> {
    let mut names = Vec::new();
    let mut rest = body;
    let mut offset = 0;

    while let Some(start) = rest.find("${") {
        let after = &rest[start + 2..];
        let Some(end) = after.find('}') else {
            return Err(TemplateError::Unterminated { offset: offset + start });
        };
        names.push(after[..end].to_string());
        let consumed = start + 2 + end + 1;
        offset += consumed;
        rest = &rest[consumed..];
    }

    Ok(names)
}

/// Substitute known variables into a template body.
///
/// Unknown placeholders are left intact — recipe validation has already
/// vetted them, and late-bound variables (database credentials, derived
/// values) are resolved after this point. Fails only on malformed
/// syntax.
pub fn render(body: &str, vars: &BTreeMap<String, String>) -> Result<String, TemplateError> {
    // Validates termination as a side effect.
    scan_placeholders(body)?;

    let mut out = String::with_capacity(body.len());
    let mut rest = body;

    while let Some(start) = rest.find("${") {
        out.push_str(&rest[..start]);
        let after = &rest[start + 2..];
        let end = after.find('}').unwrap_or(after.len());
        let name = &after[..end];
        match vars.get(name) {
            Some(value) => out.push_str(value),
            None => {
                out.push_str("${");
                out.push_str(name);
                out.push('}');
            }
        }
        rest = &after[end + 1..];
    }
    out.push_str(rest);

    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn vars(pairs: &[(&str, &str)]) -> BTreeMap<String, String> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn scan_finds_placeholders_in_order() {
        let body = "services:\n  app:\n    image: ${IMAGE}\n    env: ${ADMIN_EMAIL}";
        let names = scan_placeholders(body).unwrap();
        assert_eq!(names, vec!["IMAGE", "ADMIN_EMAIL"]);
    }

    #[test]
    fn scan_rejects_unterminated_placeholder() {
        let err = scan_placeholders("image: ${IMAGE").unwrap_err();
        assert_eq!(err, TemplateError::Unterminated { offset: 7 });
    }

    #[test]
    fn scan_empty_template_is_empty() {
        assert!(scan_placeholders("no placeholders here").unwrap().is_empty());
    }

    #[test]
    fn built_ins_and_prefixes_are_exempt() {
        assert!(is_exempt("DEVICE_IP"));
        assert!(is_exempt("DEPLOYMENT_ID"));
        assert!(is_exempt("COMPOSE_PROJECT"));
        assert!(is_exempt("DB_PASSWORD"));
        assert!(is_exempt("REDIS_HOST"));
        assert!(is_exempt("CONFIG_HASH"));
        assert!(!is_exempt("ADMIN_EMAIL"));
        assert!(!is_exempt("DATABASE_URL"));
    }

    #[test]
    fn render_substitutes_known_vars() {
        let body = "host: ${DEVICE_IP}\nproject: ${COMPOSE_PROJECT}";
        let out = render(body, &vars(&[("DEVICE_IP", "10.0.0.7"), ("COMPOSE_PROJECT", "skiff-x")]))
            .unwrap();
        assert_eq!(out, "host: 10.0.0.7\nproject: skiff-x");
    }

    #[test]
    fn render_leaves_unknown_placeholders_intact() {
        let body = "pass: ${DB_PASSWORD}";
        let out = render(body, &vars(&[("DEVICE_IP", "10.0.0.7")])).unwrap();
        assert_eq!(out, "pass: ${DB_PASSWORD}");
    }

    #[test]
    fn render_fails_on_unterminated() {
        assert!(render("broken ${OOPS", &BTreeMap::new()).is_err());
    }
}
