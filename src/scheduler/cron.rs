//! Cron expression validation for trigger schedules.

use crate::error::{JobflowError, Result};

const ALIASES: &[&str] = &[
    "@yearly",
    "@annually",
    "@monthly",
    "@weekly",
    "@daily",
    "@midnight",
    "@hourly",
];

/// Name and inclusive bounds of the five cron fields
const FIELDS: [(&str, u32, u32); 5] = [
    ("minute", 0, 59),
    ("hour", 0, 23),
    ("day of month", 1, 31),
    ("month", 1, 12),
    ("day of week", 0, 7),
];

/// Accepts five-field numeric expressions (`*`, lists, ranges, steps) and the
/// `@hourly` style aliases.
pub fn validate_cron_expression(expression: &str) -> Result<()> {
    let expression = expression.trim();
    if expression.starts_with('@') {
        return if ALIASES.contains(&expression) {
            Ok(())
        } else {
            Err(invalid(expression, "unknown alias"))
        };
    }

    let fields: Vec<&str> = expression.split_whitespace().collect();
    if fields.len() != FIELDS.len() {
        return Err(invalid(
            expression,
            &format!("expected 5 fields, found {}", fields.len()),
        ));
    }

    for (field, (name, min, max)) in fields.iter().zip(FIELDS) {
        validate_field(field, min, max)
            .map_err(|reason| invalid(expression, &format!("{name} field: {reason}")))?;
    }
    Ok(())
}

fn validate_field(field: &str, min: u32, max: u32) -> std::result::Result<(), String> {
    for item in field.split(',') {
        let (range, step) = match item.split_once('/') {
            Some((range, step)) => (range, Some(step)),
            None => (item, None),
        };

        if let Some(step) = step {
            let step: u32 = step.parse().map_err(|_| format!("invalid step '{step}'"))?;
            if step == 0 {
                return Err("step must be greater than zero".to_string());
            }
        }

        if range == "*" {
            continue;
        }
        let (start, end) = match range.split_once('-') {
            Some((start, end)) => (parse_value(start, min, max)?, parse_value(end, min, max)?),
            None => {
                let value = parse_value(range, min, max)?;
                (value, value)
            }
        };
        if start > end {
            return Err(format!("range '{range}' is reversed"));
        }
    }
    Ok(())
}

fn parse_value(value: &str, min: u32, max: u32) -> std::result::Result<u32, String> {
    let parsed: u32 = value.parse().map_err(|_| format!("invalid value '{value}'"))?;
    if parsed < min || parsed > max {
        return Err(format!("value {parsed} outside {min}-{max}"));
    }
    Ok(parsed)
}

fn invalid(expression: &str, reason: &str) -> JobflowError {
    JobflowError::Validation(format!("Invalid cron expression '{expression}': {reason}"))
}
