//! Naming conventions for projects, environments, and SSM parameters
//!
//! Project and env names feed into AWS resource names (SSM parameters,
//! S3 prefixes, CloudFormation stacks), so they are validated up front
//! instead of failing deep inside a deployment.

use crate::error::ConfigError;

/// Validate a project name.
///
/// Rules: starts with a lowercase letter; body is lowercase alphanumerics,
/// `-`, or `_`; must not end with a separator.
pub fn validate_project_name(name: &str) -> Result<(), ConfigError> {
    let invalid = |reason: &str| ConfigError::InvalidProjectName {
        name: name.to_string(),
        reason: reason.to_string(),
    };

    let mut chars = name.chars();
    match chars.next() {
        None => return Err(invalid("must not be empty")),
        Some(c) if !c.is_ascii_lowercase() => {
            return Err(invalid("must start with a lowercase letter"))
        }
        Some(_) => {}
    }
    for c in name.chars() {
        if !(c.is_ascii_lowercase() || c.is_ascii_digit() || c == '-' || c == '_') {
            return Err(invalid(
                "may only contain lowercase letters, digits, '-' and '_'",
            ));
        }
    }
    if name.ends_with('-') || name.ends_with('_') {
        return Err(invalid("must not end with a separator"));
    }
    Ok(())
}

/// Validate an env name.
///
/// Env names are joined to project names with `-`, so they allow no
/// separators at all: a lowercase letter followed by lowercase alphanumerics.
pub fn validate_env_name(name: &str) -> Result<(), ConfigError> {
    let invalid = |reason: &str| ConfigError::InvalidEnvName {
        name: name.to_string(),
        reason: reason.to_string(),
    };

    let mut chars = name.chars();
    match chars.next() {
        None => return Err(invalid("must not be empty")),
        Some(c) if !c.is_ascii_lowercase() => {
            return Err(invalid("must start with a lowercase letter"))
        }
        Some(_) => {}
    }
    if !name.chars().all(|c| c.is_ascii_lowercase() || c.is_ascii_digit()) {
        return Err(invalid("may only contain lowercase letters and digits"));
    }
    Ok(())
}

/// Normalize a name for use as an SSM parameter name.
///
/// SSM rejects parameter names beginning with `aws` or `ssm` (reserved
/// prefixes); those get a `p-` prefix.
pub fn normalize_parameter_name(name: &str) -> String {
    let lower = name.to_ascii_lowercase();
    if lower.starts_with("aws") || lower.starts_with("ssm") {
        format!("p-{}", name)
    } else {
        name.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_project_name() {
        let good_cases = [
            "my_project",
            "my-project",
            "my_1_project",
            "my1project",
            "myproject1",
        ];
        let bad_cases = ["my project", "1-my-project", "-my-project", "my-project-", ""];
        for name in good_cases {
            validate_project_name(name).unwrap();
        }
        for name in bad_cases {
            assert!(validate_project_name(name).is_err(), "{name:?} should fail");
        }
    }

    #[test]
    fn test_validate_env_name() {
        for name in ["dev", "prod", "test1", "sbx"] {
            validate_env_name(name).unwrap();
        }
        for name in ["Dev", "dev-1", "dev_1", "1dev", "", "dev env"] {
            assert!(validate_env_name(name).is_err(), "{name:?} should fail");
        }
    }

    #[test]
    fn test_normalize_parameter_name() {
        // "aws"-prefixed names need the "p-" prefix
        assert_eq!(normalize_parameter_name("aws"), "p-aws");
        assert_eq!(normalize_parameter_name("aws-project"), "p-aws-project");

        // "ssm"-prefixed names need the "p-" prefix
        assert_eq!(normalize_parameter_name("ssm"), "p-ssm");
        assert_eq!(normalize_parameter_name("ssm-project"), "p-ssm-project");

        // everything else passes through
        assert_eq!(normalize_parameter_name("normal-after_param"), "normal-after_param");
        assert_eq!(normalize_parameter_name("my-project"), "my-project");
    }
}
