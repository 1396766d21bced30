use std::collections::BTreeMap;

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::answers::{AnswerSet, AnswerValue};
use crate::spec::{Field, FieldType, FormSchema};
use crate::visibility::visible_fields;

/// Outcome of grading a set of fields.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct GradeReport {
    /// Correctness of every graded field, keyed by field id.
    pub per_field: BTreeMap<String, bool>,
    pub score: u64,
    pub max_score: u64,
}

impl GradeReport {
    /// Rounded percentage, or `None` when nothing was gradable.
    pub fn percentage(&self) -> Option<u32> {
        if self.max_score == 0 {
            return None;
        }
        Some(((self.score as f64 / self.max_score as f64) * 100.0).round() as u32)
    }

    pub fn is_correct(&self, field_id: &str) -> Option<bool> {
        self.per_field.get(field_id).copied()
    }
}

/// Points a graded field is worth; unset or non-positive counts as 1.
pub fn effective_points(field: &Field) -> u64 {
    match field.points {
        Some(points) if points > 0 => points as u64,
        _ => 1,
    }
}

/// Whether any field carries correct answers.
pub fn quiz_enabled(fields: &[Field]) -> bool {
    fields.iter().any(Field::is_gradable)
}

/// Grades every field with non-empty correct answers. Fields without them are
/// left out of the report entirely.
pub fn grade(fields: &[Field], answers: &AnswerSet) -> GradeReport {
    let mut report = GradeReport::default();

    for field in fields {
        let Some(correct) = grade_field(field, answers.get(&field.id)) else {
            continue;
        };
        let points = effective_points(field);
        report.max_score = report.max_score.saturating_add(points);
        if correct {
            report.score = report.score.saturating_add(points);
        }
        debug!(field_id = %field.id, correct, points, "graded field");
        report.per_field.insert(field.id.clone(), correct);
    }

    report
}

/// Grades only the fields currently visible under `answers`.
pub fn grade_visible(schema: &FormSchema, answers: &AnswerSet) -> GradeReport {
    let shown: Vec<Field> = visible_fields(schema, answers)
        .into_iter()
        .cloned()
        .collect();
    grade(&shown, answers)
}

/// Correctness of a single answer, or `None` when the field is not graded.
pub fn grade_field(field: &Field, answer: Option<&AnswerValue>) -> Option<bool> {
    let correct = field.correct_answers();
    if correct.is_empty() {
        return None;
    }

    let submitted_list = || answer.map(AnswerValue::to_list).unwrap_or_default();

    Some(match field.kind {
        FieldType::Ranking => submitted_list() == correct,
        FieldType::Checkbox => {
            let mut submitted = submitted_list();
            let mut expected = correct.to_vec();
            submitted.sort();
            expected.sort();
            submitted.len() == expected.len()
                && submitted
                    .iter()
                    .zip(&expected)
                    .all(|(given, wanted)| given.to_lowercase() == wanted.to_lowercase())
        }
        _ => {
            let submitted = normalize(&answer.map(AnswerValue::to_text).unwrap_or_default());
            correct
                .iter()
                .any(|accepted| normalize(accepted) == submitted)
        }
    })
}

fn normalize(text: &str) -> String {
    text.to_lowercase().trim().to_string()
}
