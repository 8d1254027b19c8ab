//! Recipe structural and semantic validation.
//!
//! `validate` accumulates every problem it finds (operators see the
//! full list in one pass); `ensure_valid` is the loader's drop
//! decision and reports only the first failure.

use skiff_core::{OptionKind, Recipe, template};

use crate::error::CatalogError;

/// Marker a deployable template body must contain.
const SERVICE_MARKER: &str = "services:";

/// Run every structural check, collecting all errors.
pub fn validate(recipe: &Recipe) -> Vec<String> {
    let mut errors = Vec::new();

    check_identity(recipe, &mut errors);
    check_options(recipe, &mut errors);
    check_template_body(recipe, &mut errors);
    check_volumes(recipe, &mut errors);
    check_template_variables(recipe, &mut errors);

    errors
}

/// The loader's gate: the first failing check drops the recipe.
pub fn ensure_valid(recipe: &Recipe) -> Result<(), CatalogError> {
    match validate(recipe).into_iter().next() {
        Some(reason) => Err(CatalogError::Invalid {
            slug: recipe.slug.clone(),
            reason,
        }),
        None => Ok(()),
    }
}

fn check_identity(recipe: &Recipe, errors: &mut Vec<String>) {
    for (field, value) in [
        ("id", &recipe.id),
        ("slug", &recipe.slug),
        ("name", &recipe.name),
        ("category", &recipe.category),
        ("description", &recipe.description),
    ] {
        if value.trim().is_empty() {
            errors.push(format!("recipe field '{field}' must not be empty"));
        }
    }
}

fn check_options(recipe: &Recipe, errors: &mut Vec<String>) {
    let mut seen = std::collections::BTreeSet::new();
    for option in &recipe.options {
        if !seen.insert(option.name.as_str()) {
            errors.push(format!("duplicate config option name: {}", option.name));
        }
        if option.kind == OptionKind::Unknown {
            errors.push(format!(
                "config option '{}' has an unrecognized type",
                option.name
            ));
        }
        // A required option must be satisfiable even when the operator
        // submits nothing.
        if option.required && option.default.is_none() {
            errors.push(format!(
                "required option '{}' has no default value",
                option.name
            ));
        }
    }
}

fn check_template_body(recipe: &Recipe, errors: &mut Vec<String>) {
    if recipe.template.trim().is_empty() {
        errors.push("template body must not be empty".to_string());
    } else if !recipe.template.contains(SERVICE_MARKER) {
        errors.push(format!(
            "template body does not declare any service (missing '{SERVICE_MARKER}')"
        ));
    }
}

fn check_volumes(recipe: &Recipe, errors: &mut Vec<String>) {
    // A declared-but-unused volume is an error; a volume referenced in
    // the template without a declaration is tolerated.
    for name in recipe.volumes.keys() {
        if !recipe.template.contains(name.as_str()) {
            errors.push(format!(
                "declared volume '{name}' is not referenced in the template"
            ));
        }
    }
}

fn check_template_variables(recipe: &Recipe, errors: &mut Vec<String>) {
    let placeholders = match template::scan_placeholders(&recipe.template) {
        Ok(names) => names,
        Err(e) => {
            errors.push(format!("template is malformed: {e}"));
            return;
        }
    };

    for name in placeholders {
        if template::is_exempt(&name) {
            continue;
        }
        let expected = name.to_lowercase();
        if recipe.option(&expected).is_none() {
            errors.push(format!(
                "template variable ${{{name}}} has no matching config option '{expected}'"
            ));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::composite::tests::recipe;
    use skiff_core::ConfigOption;

    fn option(name: &str, kind: OptionKind, required: bool, default: Option<&str>) -> ConfigOption {
        ConfigOption {
            name: name.to_string(),
            label: name.to_string(),
            kind,
            required,
            default: default.map(str::to_string),
        }
    }

    #[test]
    fn valid_recipe_has_no_errors() {
        let r = recipe("ghost", "test");
        assert!(validate(&r).is_empty());
        assert!(ensure_valid(&r).is_ok());
    }

    #[test]
    fn validation_is_deterministic() {
        let mut r = recipe("ghost", "test");
        r.description = String::new();
        r.template = "no marker ${WHO}".to_string();
        assert_eq!(validate(&r), validate(&r));
    }

    #[test]
    fn empty_identity_fields_are_each_reported() {
        let mut r = recipe("x", "test");
        r.name = String::new();
        r.description = "  ".to_string();
        let errors = validate(&r);
        assert_eq!(errors.len(), 2);
        assert!(errors.iter().any(|e| e.contains("'name'")));
        assert!(errors.iter().any(|e| e.contains("'description'")));
    }

    #[test]
    fn duplicate_option_names_rejected() {
        let mut r = recipe("x", "test");
        r.options = vec![
            option("port", OptionKind::Number, false, Some("8080")),
            option("port", OptionKind::Number, false, Some("9090")),
        ];
        let errors = validate(&r);
        assert!(errors.iter().any(|e| e.contains("duplicate config option")));
    }

    #[test]
    fn unknown_option_kind_rejected() {
        let mut r = recipe("x", "test");
        r.options = vec![option("thing", OptionKind::Unknown, false, None)];
        let errors = validate(&r);
        assert!(errors.iter().any(|e| e.contains("unrecognized type")));
    }

    #[test]
    fn required_option_without_default_rejected() {
        let mut r = recipe("x", "test");
        r.options = vec![option("site_name", OptionKind::String, true, None)];
        let errors = validate(&r);
        assert!(errors.iter().any(|e| e.contains("no default value")));
    }

    #[test]
    fn required_secret_without_default_also_rejected() {
        let mut r = recipe("x", "test");
        r.options = vec![option("api_key", OptionKind::ApiKey, true, None)];
        let errors = validate(&r);
        assert!(errors.iter().any(|e| e.contains("no default value")));
    }

    #[test]
    fn missing_service_marker_rejected() {
        let mut r = recipe("x", "test");
        r.template = "just text".to_string();
        let errors = validate(&r);
        assert!(errors.iter().any(|e| e.contains("does not declare any service")));
    }

    #[test]
    fn declared_but_unused_volume_rejected() {
        let mut r = recipe("x", "test");
        r.volumes.insert("orphan_data".to_string(), "/data".to_string());
        let errors = validate(&r);
        assert!(errors.iter().any(|e| e.contains("orphan_data")));
    }

    #[test]
    fn used_but_undeclared_volume_tolerated() {
        let mut r = recipe("x", "test");
        r.template = "services:\n  app:\n    volumes:\n      - app_data:/data\n".to_string();
        assert!(validate(&r).is_empty());
    }

    #[test]
    fn undeclared_template_variable_names_placeholder_and_key() {
        let mut r = recipe("x", "test");
        r.template = "services:\n  app:\n    env: ${UNKNOWN_VAR}\n".to_string();
        let errors = validate(&r);
        assert_eq!(errors.len(), 1);
        assert!(errors[0].contains("${UNKNOWN_VAR}"));
        assert!(errors[0].contains("'unknown_var'"));
    }

    #[test]
    fn built_in_variables_never_fail() {
        let mut r = recipe("x", "test");
        r.template =
            "services:\n  app:\n    env:\n      - IP=${DEVICE_IP}\n      - ID=${DEPLOYMENT_ID}\n"
                .to_string();
        assert!(validate(&r).is_empty());
    }

    #[test]
    fn exempt_prefixes_and_derived_suffix_never_fail() {
        let mut r = recipe("x", "test");
        r.template =
            "services:\n  app:\n    env:\n      - ${DB_PASSWORD}\n      - ${REDIS_HOST}\n      - ${CONFIG_HASH}\n"
                .to_string();
        assert!(validate(&r).is_empty());
    }

    #[test]
    fn declared_option_satisfies_placeholder() {
        let mut r = recipe("x", "test");
        r.template = "services:\n  app:\n    env: ${ADMIN_EMAIL}\n".to_string();
        r.options = vec![option("admin_email", OptionKind::Email, true, Some("a@b.example"))];
        assert!(validate(&r).is_empty());
    }

    #[test]
    fn unterminated_placeholder_is_hard_error() {
        let mut r = recipe("x", "test");
        r.template = "services:\n  app:\n    env: ${BROKEN\n".to_string();
        let errors = validate(&r);
        assert!(errors.iter().any(|e| e.contains("malformed")));
    }

    #[test]
    fn ensure_valid_reports_first_error_only() {
        let mut r = recipe("x", "test");
        r.name = String::new();
        r.template = "nothing".to_string();
        let err = ensure_valid(&r).unwrap_err();
        match err {
            CatalogError::Invalid { slug, reason } => {
                assert_eq!(slug, "x");
                assert!(reason.contains("'name'"));
            }
            other => panic!("unexpected error: {other}"),
        }
    }
}
