use serde_json::{Map, Value, json};

use crate::{
    answers::AnswerSet,
    grade::{GradeReport, effective_points, grade_visible, quiz_enabled},
    kinds::answer_keys,
    spec::{FieldType, FormSchema},
    visibility::resolve_visibility,
};

/// Describes a single field for preview outputs.
#[derive(Debug, Clone)]
pub struct PreviewField {
    pub id: String,
    pub label: String,
    pub helper_text: Option<String>,
    pub kind: FieldType,
    pub required: bool,
    pub visible: bool,
    /// Points on offer; only set for graded fields.
    pub points: Option<u64>,
    /// Current value per answer-key, in render order.
    pub values: Vec<(String, Value)>,
    pub correct: Option<bool>,
    /// Accepted answers, exposed once a field has been graded incorrect.
    pub expected: Option<Vec<String>>,
}

/// Collected payload used by both text and JSON renderers.
#[derive(Debug, Clone)]
pub struct PreviewPayload {
    pub form_id: String,
    pub form_title: String,
    pub description: Option<String>,
    pub quiz: bool,
    pub fields: Vec<PreviewField>,
    pub results: Option<GradeReport>,
}

impl PreviewPayload {
    pub fn visible_count(&self) -> usize {
        self.fields.iter().filter(|field| field.visible).count()
    }
}

/// Starting answers for a preview: ranking fields begin in option order so
/// an untouched ranking still submits a full sequence.
pub fn initial_answers(schema: &FormSchema) -> AnswerSet {
    let mut seeded = AnswerSet::new();
    for field in &schema.fields {
        if field.kind == FieldType::Ranking && !field.options().is_empty() {
            seeded.insert(field.id.clone(), field.options().to_vec());
        }
    }
    seeded
}

/// Builds the preview payload. When `graded` is set, visible fields are
/// scored and each graded field carries its outcome.
pub fn build_preview(schema: &FormSchema, answers: &AnswerSet, graded: bool) -> PreviewPayload {
    let visibility = resolve_visibility(schema, answers);

    let results = graded.then(|| grade_visible(schema, answers));

    let fields = schema
        .fields
        .iter()
        .map(|field| {
            let correct = results
                .as_ref()
                .and_then(|report| report.is_correct(&field.id));
            PreviewField {
                id: field.id.clone(),
                label: field.label.clone(),
                helper_text: field.helper_text.clone(),
                kind: field.kind,
                required: field.required,
                visible: visibility.get(&field.id).copied().unwrap_or(true),
                points: field.is_gradable().then(|| effective_points(field)),
                values: answer_keys(field)
                    .into_iter()
                    .filter_map(|slot| {
                        answers
                            .get(&slot.key)
                            .map(|value| (slot.key.clone(), value.to_json()))
                    })
                    .collect(),
                correct,
                expected: (correct == Some(false)).then(|| field.correct_answers().to_vec()),
            }
        })
        .collect();

    PreviewPayload {
        form_id: schema.id.clone(),
        form_title: schema.title.clone(),
        description: Some(schema.description.clone()).filter(|text| !text.is_empty()),
        quiz: quiz_enabled(&schema.fields),
        fields,
        results,
    }
}

/// Render the payload as a structured JSON-friendly value.
pub fn render_json_ui(payload: &PreviewPayload) -> Value {
    let fields = payload
        .fields
        .iter()
        .map(|field| {
            let mut map = Map::new();
            map.insert("id".into(), Value::String(field.id.clone()));
            map.insert("label".into(), Value::String(field.label.clone()));
            map.insert("type".into(), Value::String(field.kind.as_str().to_string()));
            map.insert("required".into(), Value::Bool(field.required));
            map.insert("visible".into(), Value::Bool(field.visible));
            if let Some(helper) = &field.helper_text {
                map.insert("helperText".into(), Value::String(helper.clone()));
            }
            if let Some(points) = field.points {
                map.insert("points".into(), json!(points));
            }
            if !field.values.is_empty() {
                map.insert(
                    "values".into(),
                    Value::Object(field.values.iter().cloned().collect()),
                );
            }
            if let Some(correct) = field.correct {
                map.insert("correct".into(), Value::Bool(correct));
            }
            if let Some(expected) = &field.expected {
                map.insert("expected".into(), json!(expected));
            }
            Value::Object(map)
        })
        .collect::<Vec<_>>();

    let results = payload.results.as_ref().map(|report| {
        json!({
            "score": report.score,
            "maxScore": report.max_score,
            "percentage": report.percentage(),
        })
    });

    json!({
        "formId": payload.form_id,
        "title": payload.form_title,
        "description": payload.description,
        "quiz": payload.quiz,
        "visibleCount": payload.visible_count(),
        "fields": fields,
        "results": results,
    })
}

/// Render the payload as plain text for terminals.
pub fn render_text(payload: &PreviewPayload) -> String {
    let mut lines = Vec::new();
    lines.push(format!("Form: {} ({})", payload.form_title, payload.form_id));
    if let Some(description) = &payload.description {
        lines.push(description.clone());
    }

    if let Some(report) = &payload.results {
        let mut line = format!("Score: {} / {}", report.score, report.max_score);
        if let Some(percentage) = report.percentage() {
            line.push_str(&format!(" ({percentage}%)"));
        }
        lines.push(line);
    }

    lines.push(format!("Visible fields ({}):", payload.visible_count()));
    for field in payload.fields.iter().filter(|field| field.visible) {
        if field.kind == FieldType::Header {
            lines.push(format!("== {} ==", field.label));
            continue;
        }
        let mut entry = format!(" - {} ({}) [{}]", field.id, field.label, field.kind);
        if field.required {
            entry.push_str(" *");
        }
        if let Some(points) = field.points {
            entry.push_str(&format!(" {points} pts"));
        }
        for (key, value) in &field.values {
            entry.push_str(&format!(" {key}={}", value_to_display(value)));
        }
        match field.correct {
            Some(true) => entry.push_str(" ✓"),
            Some(false) => entry.push_str(" ✗"),
            None => {}
        }
        lines.push(entry);
        if let Some(expected) = &field.expected {
            lines.push(format!("     expected: {}", expected.join(", ")));
        }
    }

    lines.join("\n")
}

fn value_to_display(value: &Value) -> String {
    match value {
        Value::String(text) => text.clone(),
        Value::Array(items) => items
            .iter()
            .map(value_to_display)
            .collect::<Vec<_>>()
            .join(", "),
        other => other.to_string(),
    }
}
