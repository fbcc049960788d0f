//! Naming and value conventions for the exported metrics.

/// Prefix shared by every exported metric.
pub const METRIC_PREFIX: &str = "screeps";

/// Convert a Screeps field name to a Prometheus-compatible snake_case name.
///
/// Prometheus metric names must match `[a-zA-Z_:][a-zA-Z0-9_:]*`.
/// This function:
/// - Splits camelCase words with an underscore and lowercases them
/// - Replaces invalid characters with underscores
/// - Collapses multiple underscores into one
pub fn to_snake_case(name: &str) -> String {
    let mut result = String::with_capacity(name.len() + 4);
    let mut last_was_underscore = true;
    let mut last_was_lower = false;

    for c in name.chars() {
        if c.is_ascii_uppercase() {
            if last_was_lower && !last_was_underscore {
                result.push('_');
            }
            result.push(c.to_ascii_lowercase());
            last_was_underscore = false;
            last_was_lower = false;
        } else if c.is_ascii_alphanumeric() {
            result.push(c);
            last_was_underscore = false;
            last_was_lower = true;
        } else if !last_was_underscore {
            // Replace invalid char with underscore (but don't add consecutive)
            result.push('_');
            last_was_underscore = true;
            last_was_lower = false;
        }
    }

    // Remove trailing underscores
    while result.ends_with('_') {
        result.pop();
    }

    result
}

/// Build a full metric name from a section and a field.
///
/// Format: `screeps_{section}_{field}`, or `screeps_{section}` when the field
/// is empty.
pub fn build_metric_name(section: &str, field: &str) -> String {
    let field = to_snake_case(field);

    if field.is_empty() {
        format!("{}_{}", METRIC_PREFIX, to_snake_case(section))
    } else {
        format!("{}_{}_{}", METRIC_PREFIX, to_snake_case(section), field)
    }
}

/// Escape special characters in label values.
pub fn escape_label_value(value: &str) -> String {
    let mut result = String::with_capacity(value.len());
    for c in value.chars() {
        match c {
            '\\' => result.push_str("\\\\"),
            '"' => result.push_str("\\\""),
            '\n' => result.push_str("\\n"),
            _ => result.push(c),
        }
    }
    result
}

/// Format a floating point value for Prometheus.
///
/// Missing readings arrive here as NaN and are rendered as `NaN`.
pub fn format_value(value: f64) -> String {
    if value.is_nan() {
        "NaN".to_string()
    } else if value.is_infinite() {
        if value.is_sign_positive() {
            "+Inf".to_string()
        } else {
            "-Inf".to_string()
        }
    } else if value.fract() == 0.0 {
        format!("{:.0}", value)
    } else {
        format!("{}", value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_to_snake_case_camel() {
        assert_eq!(to_snake_case("storageEnergy"), "storage_energy");
        assert_eq!(
            to_snake_case("energyCapacityAvailable"),
            "energy_capacity_available"
        );
        assert_eq!(
            to_snake_case("controllerProgressTotal"),
            "controller_progress_total"
        );
    }

    #[test]
    fn test_to_snake_case_already_snake() {
        assert_eq!(to_snake_case("bucket"), "bucket");
        assert_eq!(to_snake_case("progress_total"), "progress_total");
    }

    #[test]
    fn test_to_snake_case_special_chars() {
        assert_eq!(to_snake_case("cpu.used%"), "cpu_used");
        assert_eq!(to_snake_case("a--b"), "a_b");
        assert_eq!(to_snake_case(""), "");
    }

    #[test]
    fn test_to_snake_case_acronyms() {
        assert_eq!(to_snake_case("GCL"), "gcl");
        assert_eq!(to_snake_case("gclLevel"), "gcl_level");
    }

    #[test]
    fn test_build_metric_name() {
        assert_eq!(build_metric_name("gcl", "level"), "screeps_gcl_level");
        assert_eq!(
            build_metric_name("gcl", "progressTotal"),
            "screeps_gcl_progress_total"
        );
        assert_eq!(
            build_metric_name("room", "storageEnergy"),
            "screeps_room_storage_energy"
        );
        assert_eq!(build_metric_name("time", ""), "screeps_time");
    }

    #[test]
    fn test_escape_label_value() {
        assert_eq!(escape_label_value("W1N1"), "W1N1");
        assert_eq!(escape_label_value("with\"quote"), "with\\\"quote");
        assert_eq!(escape_label_value("with\\backslash"), "with\\\\backslash");
        assert_eq!(escape_label_value("with\nnewline"), "with\\nnewline");
    }

    #[test]
    fn test_format_value() {
        assert_eq!(format_value(42.0), "42");
        assert_eq!(format_value(5.2), "5.2");
        assert_eq!(format_value(123456.0), "123456");
        assert_eq!(format_value(f64::NAN), "NaN");
        assert_eq!(format_value(f64::INFINITY), "+Inf");
        assert_eq!(format_value(f64::NEG_INFINITY), "-Inf");
    }
}
