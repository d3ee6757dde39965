//! Structural check of raw pipeline JSON. Runs before anything is decoded
//! and stops at the first bad step; indexes in messages are 1-based.

use serde_json::Value;

use super::step::PipelineStep;
use crate::error::ValidationError;
use crate::format::ImageFormat;

pub const EMPTY_PIPELINE: &str = "Pipeline steps array is required and cannot be empty";

/// Validate `steps` and deserialize them.
pub fn parse_steps(steps: &Value) -> Result<Vec<PipelineStep>, ValidationError> {
    let list = match steps {
        Value::Array(list) if !list.is_empty() => list,
        _ => return Err(ValidationError::new(EMPTY_PIPELINE)),
    };

    validate(list)?;

    list.iter()
        .enumerate()
        .map(|(i, raw)| {
            serde_json::from_value(raw.clone())
                .map_err(|e| ValidationError::at_step(i + 1, format!("Step {} is malformed: {e}", i + 1)))
        })
        .collect()
}

pub fn validate(steps: &[Value]) -> Result<(), ValidationError> {
    if steps.is_empty() {
        return Err(ValidationError::new(EMPTY_PIPELINE));
    }

    for (i, step) in steps.iter().enumerate() {
        check_step(i + 1, step)?;
    }
    Ok(())
}

fn check_step(n: usize, step: &Value) -> Result<(), ValidationError> {
    let kind = step.get("type");
    if !truthy(kind) {
        return Err(ValidationError::at_step(n, format!("Step {n} is missing a type")));
    }

    match kind.and_then(Value::as_str) {
        Some("resize") => {
            if !truthy(step.get("width")) && !truthy(step.get("height")) {
                return Err(ValidationError::at_step(
                    n,
                    format!("Resize step {n} must specify at least one of width or height"),
                ));
            }
        }
        Some("convert") => {
            let format = step.get("format");
            if !truthy(format) {
                return Err(ValidationError::at_step(n, format!("Convert step {n} must specify a format")));
            }
            if format.and_then(Value::as_str).and_then(ImageFormat::from_key).is_none() {
                return Err(ValidationError::at_step(
                    n,
                    format!("Format '{}' in step {n} is not supported", display(format)),
                ));
            }
        }
        Some("compress") | Some("metadata") => {}
        Some("rotate") => {
            if !step.get("angle").is_some_and(Value::is_number) {
                return Err(ValidationError::at_step(n, format!("Rotate step {n} must specify a numeric angle")));
            }
        }
        Some("flip") => {
            let set = |key: &str| step.get(key).and_then(Value::as_bool) == Some(true);
            if !set("horizontal") && !set("vertical") {
                return Err(ValidationError::at_step(
                    n,
                    format!("Flip step {n} must specify at least one of horizontal or vertical as true"),
                ));
            }
        }
        _ => {
            return Err(ValidationError::at_step(
                n,
                format!("Step type '{}' in step {n} is not supported", display(kind)),
            ));
        }
    }

    Ok(())
}

/// Absent, null, false, zero and the empty string all count as "not given".
fn truthy(value: Option<&Value>) -> bool {
    match value {
        None | Some(Value::Null) => false,
        Some(Value::Bool(b)) => *b,
        Some(Value::Number(n)) => n.as_f64().is_some_and(|f| f != 0.0),
        Some(Value::String(s)) => !s.is_empty(),
        Some(_) => true,
    }
}

fn display(value: Option<&Value>) -> String {
    match value {
        Some(Value::String(s)) => s.clone(),
        Some(other) => other.to_string(),
        None => String::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn message(steps: Value) -> String {
        parse_steps(&steps).unwrap_err().message
    }

    #[test]
    fn test_empty_pipeline() {
        assert_eq!(message(json!([])), EMPTY_PIPELINE);
        assert_eq!(message(json!(null)), EMPTY_PIPELINE);
        assert_eq!(message(json!({"type": "resize"})), EMPTY_PIPELINE);
    }

    #[test]
    fn test_resize_needs_a_dimension() {
        let err = parse_steps(&json!([{"type": "resize"}])).unwrap_err();
        assert_eq!(err.step, Some(1));
        assert_eq!(err.message, "Resize step 1 must specify at least one of width or height");
        assert_eq!(
            message(json!([{"type": "resize", "width": 0, "height": 0}])),
            "Resize step 1 must specify at least one of width or height"
        );
    }

    #[test]
    fn test_first_failure_wins() {
        let err = parse_steps(&json!([
            {"type": "flip", "vertical": true},
            {"type": "rotate", "angle": "90"},
            {"type": "convert"}
        ]))
        .unwrap_err();
        assert_eq!(err.step, Some(2));
        assert_eq!(err.message, "Rotate step 2 must specify a numeric angle");
    }

    #[test]
    fn test_convert_messages() {
        assert_eq!(message(json!([{"type": "convert"}])), "Convert step 1 must specify a format");
        assert_eq!(
            message(json!([{"type": "convert", "format": "tiff"}])),
            "Format 'tiff' in step 1 is not supported"
        );
        // Lookup is case-sensitive
        assert_eq!(
            message(json!([{"type": "convert", "format": "PNG"}])),
            "Format 'PNG' in step 1 is not supported"
        );
    }

    #[test]
    fn test_type_messages() {
        assert_eq!(message(json!([{"width": 10}])), "Step 1 is missing a type");
        assert_eq!(
            message(json!([{"type": "compress"}, {"type": "sepia"}])),
            "Step type 'sepia' in step 2 is not supported"
        );
    }

    #[test]
    fn test_flip_needs_a_true_flag() {
        assert_eq!(
            message(json!([{"type": "flip", "horizontal": false, "vertical": "yes"}])),
            "Flip step 1 must specify at least one of horizontal or vertical as true"
        );
    }

    #[test]
    fn test_type_mismatch_after_validation() {
        let err = parse_steps(&json!([{"type": "resize", "width": "wide"}])).unwrap_err();
        assert_eq!(err.step, Some(1));
        assert!(err.message.starts_with("Step 1 is malformed"));
    }

    #[test]
    fn test_valid_pipeline_parses() {
        let steps = parse_steps(&json!([
            {"type": "resize", "width": 300},
            {"type": "compress"},
            {"type": "metadata"},
            {"type": "rotate", "angle": -45.5}
        ]))
        .unwrap();
        assert_eq!(steps.len(), 4);
        assert_eq!(steps[2], PipelineStep::Metadata { keep_exif: false });
    }
}
