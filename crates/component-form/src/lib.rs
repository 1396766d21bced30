use serde::{Deserialize, Serialize};
use serde_json::{Value, json};
use thiserror::Error;
use tracing::debug;

use form_spec::{
    AnswerSet, FormSchema, ImportError, build_preview, grade_visible, locate_key, mask_for,
    merge_import, render_json_ui, render_text, resolve_visibility, validate,
};

const DEFAULT_FORM: &str = include_str!("../../form-spec/tests/fixtures/capital_quiz.json");

#[derive(Debug, Error)]
enum ComponentError {
    #[error("failed to parse config: {0}")]
    ConfigParse(#[source] serde_json::Error),
    #[error("form '{0}' is not available")]
    FormUnavailable(String),
    #[error("json encode error: {0}")]
    JsonEncode(#[source] serde_json::Error),
    #[error("import failed: {0}")]
    Import(#[from] ImportError),
    #[error("answer key '{0}' has no input mask")]
    NoMask(String),
}

#[derive(Debug, Deserialize, Serialize, Default)]
struct ComponentConfig {
    #[serde(default)]
    form_json: Option<String>,
}

fn load_form(config_json: &str) -> Result<FormSchema, ComponentError> {
    let config = if config_json.trim().is_empty() {
        ComponentConfig::default()
    } else {
        serde_json::from_str(config_json).map_err(ComponentError::ConfigParse)?
    };

    let form_json = config.form_json.as_deref().unwrap_or(DEFAULT_FORM);
    serde_json::from_str(form_json).map_err(ComponentError::ConfigParse)
}

fn ensure_form(form_id: &str, config_json: &str) -> Result<FormSchema, ComponentError> {
    let schema = load_form(config_json)?;
    if schema.id != form_id {
        Err(ComponentError::FormUnavailable(form_id.to_string()))
    } else {
        Ok(schema)
    }
}

/// Answers never fail to parse; garbage reads as an empty set.
fn parse_answers(answers_json: &str) -> AnswerSet {
    serde_json::from_str::<Value>(answers_json)
        .map(|value| AnswerSet::from_json(&value))
        .unwrap_or_default()
}

fn respond(result: Result<Value, ComponentError>) -> String {
    match result {
        Ok(value) => serde_json::to_string(&value).unwrap_or_else(|error| {
            json!({"error": format!("json encode: {}", error)}).to_string()
        }),
        Err(err) => json!({ "error": err.to_string() }).to_string(),
    }
}

fn respond_string(result: Result<String, ComponentError>) -> String {
    match result {
        Ok(value) => value,
        Err(err) => json!({ "error": err.to_string() }).to_string(),
    }
}

pub fn describe(form_id: &str, config_json: &str) -> String {
    respond(ensure_form(form_id, config_json).and_then(|schema| {
        serde_json::to_value(schema).map_err(ComponentError::JsonEncode)
    }))
}

/// `{fieldId: bool}` for every field under the given answers.
pub fn visibility(form_id: &str, config_json: &str, answers_json: &str) -> String {
    respond(ensure_form(form_id, config_json).and_then(|schema| {
        let answers = parse_answers(answers_json);
        serde_json::to_value(resolve_visibility(&schema, &answers))
            .map_err(ComponentError::JsonEncode)
    }))
}

pub fn grade(form_id: &str, config_json: &str, answers_json: &str) -> String {
    respond(ensure_form(form_id, config_json).and_then(|schema| {
        let answers = parse_answers(answers_json);
        let report = grade_visible(&schema, &answers);
        debug!(form_id, score = report.score, max_score = report.max_score, "graded submission");
        let mut value = serde_json::to_value(&report).map_err(ComponentError::JsonEncode)?;
        if let Some(object) = value.as_object_mut() {
            object.insert("percentage".into(), json!(report.percentage()));
        }
        Ok(value)
    }))
}

pub fn validate_answers(form_id: &str, config_json: &str, answers_json: &str) -> String {
    respond(ensure_form(form_id, config_json).and_then(|schema| {
        let answers = parse_answers(answers_json);
        serde_json::to_value(validate(&schema, &answers)).map_err(ComponentError::JsonEncode)
    }))
}

/// Formats raw keystrokes for the masked input behind `answer_key`.
pub fn format_mask(form_id: &str, config_json: &str, answer_key: &str, raw: &str) -> String {
    respond(ensure_form(form_id, config_json).and_then(|schema| {
        let mask = locate_key(&schema.fields, answer_key)
            .and_then(|(field, part)| mask_for(field, part))
            .ok_or_else(|| ComponentError::NoMask(answer_key.to_string()))?;
        let value = mask.format(raw);
        Ok(json!({
            "value": value,
            "invalid": mask.has_error(&value),
        }))
    }))
}

pub fn preview(form_id: &str, config_json: &str, answers_json: &str, graded: bool) -> String {
    respond(ensure_form(form_id, config_json).map(|schema| {
        let answers = parse_answers(answers_json);
        render_json_ui(&build_preview(&schema, &answers, graded))
    }))
}

pub fn preview_text(form_id: &str, config_json: &str, answers_json: &str, graded: bool) -> String {
    respond_string(ensure_form(form_id, config_json).map(|schema| {
        let answers = parse_answers(answers_json);
        render_text(&build_preview(&schema, &answers, graded))
    }))
}

/// Loads an exported document into the configured form, keeping its id.
pub fn import_form(form_id: &str, config_json: &str, document_json: &str) -> String {
    respond(ensure_form(form_id, config_json).and_then(|schema| {
        let merged = merge_import(&schema, document_json)?;
        serde_json::to_value(merged).map_err(ComponentError::JsonEncode)
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn config_for(form: Value) -> String {
        json!({ "form_json": form.to_string() }).to_string()
    }

    fn gated_form() -> Value {
        json!({
            "id": "gated",
            "title": "Gated",
            "fields": [
                { "id": "a", "type": "select", "label": "A", "options": ["Yes", "No"] },
                {
                    "id": "b",
                    "type": "text",
                    "label": "B",
                    "correctAnswers": ["Paris"],
                    "conditionalLogic": {
                        "dependsOn": "a",
                        "condition": "equals",
                        "expectedValue": "Yes"
                    }
                }
            ]
        })
    }

    #[test]
    fn describe_returns_schema_json() {
        let payload = describe("capital-quiz", "");
        let schema: Value = serde_json::from_str(&payload).expect("valid json");
        assert_eq!(schema["id"], "capital-quiz");
        assert!(schema["fields"].as_array().is_some());
    }

    #[test]
    fn describe_rejects_unknown_form() {
        let payload = describe("missing", "");
        let parsed: Value = serde_json::from_str(&payload).expect("json");
        assert!(parsed["error"].as_str().unwrap_or_default().contains("missing"));
    }

    #[test]
    fn visibility_follows_answers() {
        let config = config_for(gated_form());
        let shown: Value =
            serde_json::from_str(&visibility("gated", &config, r#"{"a": "Yes"}"#)).expect("json");
        assert_eq!(shown["b"], true);
        let hidden: Value =
            serde_json::from_str(&visibility("gated", &config, r#"{"a": "No"}"#)).expect("json");
        assert_eq!(hidden["b"], false);
    }

    #[test]
    fn malformed_answers_read_as_empty() {
        let config = config_for(gated_form());
        let parsed: Value =
            serde_json::from_str(&visibility("gated", &config, "not json")).expect("json");
        assert_eq!(parsed["a"], true);
        assert_eq!(parsed["b"], false);
    }

    #[test]
    fn grade_reports_score_and_percentage() {
        let config = config_for(gated_form());
        let parsed: Value =
            serde_json::from_str(&grade("gated", &config, r#"{"a": "Yes", "b": "paris"}"#))
                .expect("json");
        assert_eq!(parsed["score"], 1);
        assert_eq!(parsed["max_score"], 1);
        assert_eq!(parsed["percentage"], 100);
        assert_eq!(parsed["per_field"]["b"], true);
    }

    #[test]
    fn validate_answers_reports_missing_required() {
        let answers = json!({ "travelled": "No" });
        let result = validate_answers("capital-quiz", "", &answers.to_string());
        let parsed: Value = serde_json::from_str(&result).expect("json");
        assert_eq!(parsed["valid"], false);
        let missing = parsed["missing_required"].as_array().expect("missing list");
        assert!(missing.iter().any(|key| key == "applicant_lastName"));
    }

    #[test]
    fn format_mask_groups_passport_digits() {
        let result = format_mask("capital-quiz", "", "document_seriesNumber", "12345678901234");
        let parsed: Value = serde_json::from_str(&result).expect("json");
        assert_eq!(parsed["value"], "1234 567890");
        assert_eq!(parsed["invalid"], false);

        let short = format_mask("capital-quiz", "", "document_departmentCode", "12a3");
        let parsed: Value = serde_json::from_str(&short).expect("json");
        assert_eq!(parsed["value"], "123");
        assert_eq!(parsed["invalid"], true);
    }

    #[test]
    fn format_mask_errors_for_plain_inputs() {
        let result = format_mask("capital-quiz", "", "travelled", "Yes");
        let parsed: Value = serde_json::from_str(&result).expect("json");
        assert!(parsed.get("error").is_some());
    }

    #[test]
    fn preview_includes_results_when_graded() {
        let result = preview("capital-quiz", "", r#"{"travelled": "Yes", "capital": "Paris"}"#, true);
        let parsed: Value = serde_json::from_str(&result).expect("json");
        assert_eq!(parsed["results"]["score"], 5);
        assert_eq!(parsed["results"]["maxScore"], 7);

        let text = preview_text("capital-quiz", "", "{}", false);
        assert!(text.starts_with("Form: Capitals"));
    }

    #[test]
    fn import_form_keeps_configured_id() {
        let document = json!({
            "id": "other",
            "title": "Imported",
            "fields": [{ "id": "x", "type": "email", "label": "Mail" }]
        });
        let result = import_form("capital-quiz", "", &document.to_string());
        let parsed: Value = serde_json::from_str(&result).expect("json");
        assert_eq!(parsed["id"], "capital-quiz");
        assert_eq!(parsed["title"], "Imported");
        assert_eq!(parsed["fields"].as_array().map(Vec::len), Some(1));
    }

    #[test]
    fn import_form_surfaces_errors() {
        let result = import_form("capital-quiz", "", r#"{"title": "No fields"}"#);
        let parsed: Value = serde_json::from_str(&result).expect("json");
        assert!(parsed["error"].as_str().unwrap_or_default().contains("fields"));
    }
}
