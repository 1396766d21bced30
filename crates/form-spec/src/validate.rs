use std::collections::BTreeSet;
use std::sync::LazyLock;

use chrono::NaiveTime;
use globset::{GlobBuilder, GlobSet, GlobSetBuilder};
use regex::Regex;

use crate::answers::{AnswerSet, AnswerValue, ValidationError, ValidationResult};
use crate::kinds::{AnswerPart, answer_keys, mask_for};
use crate::spec::{Field, FieldKind, FieldType, FormSchema};
use crate::visibility::resolve_visibility;

static EMAIL: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[^\s@]+@([^\s@]+\.[^\s@]+)$").expect("email pattern compiles")
});

/// Checks `answers` against the visible fields of `schema`.
pub fn validate(schema: &FormSchema, answers: &AnswerSet) -> ValidationResult {
    let visibility = resolve_visibility(schema, answers);

    let mut errors = Vec::new();
    let mut missing_required = Vec::new();

    for field in &schema.fields {
        if !visibility.get(&field.id).copied().unwrap_or(true) {
            continue;
        }

        for slot in answer_keys(field) {
            match answers.get(&slot.key).filter(|value| !value.is_blank()) {
                None => {
                    if field.required && slot.required {
                        missing_required.push(slot.key);
                    }
                }
                Some(value) => {
                    if let Some(code) = validate_value(field, slot.part, value) {
                        errors.push(ValidationError {
                            field_id: Some(field.id.clone()),
                            answer_key: Some(slot.key),
                            code: code.into(),
                        });
                    }
                }
            }
        }
    }

    let known: BTreeSet<String> = schema
        .fields
        .iter()
        .flat_map(answer_keys)
        .map(|slot| slot.key)
        .collect();
    let unknown_fields: Vec<String> = answers
        .keys()
        .filter(|key| !known.contains(*key))
        .map(str::to_string)
        .collect();

    ValidationResult {
        valid: errors.is_empty() && missing_required.is_empty() && unknown_fields.is_empty(),
        errors,
        missing_required,
        unknown_fields,
    }
}

/// Returns the translation key of the first problem with `value`.
pub fn validate_value(field: &Field, part: AnswerPart, value: &AnswerValue) -> Option<&'static str> {
    if let Some(mask) = mask_for(field, part)
        && !mask.validate_length(&value.to_text())
    {
        return Some("validation.length");
    }

    match field.attributes() {
        FieldKind::Number { allow_decimals } => match value.as_number() {
            None => Some("validation.number"),
            Some(number) if !allow_decimals && number.fract() != 0.0 => Some("validation.integer"),
            Some(_) => None,
        },
        FieldKind::Rating { max_rating } => match value.as_number() {
            Some(stars) if stars.fract() == 0.0 && stars >= 1.0 && stars <= f64::from(max_rating) => {
                None
            }
            _ => Some("validation.rating"),
        },
        FieldKind::Choice { options, multiple } => {
            if field.kind == FieldType::Category || options.is_empty() {
                return None;
            }
            let chosen = if multiple {
                value.to_list()
            } else {
                vec![value.to_text()]
            };
            (!chosen.iter().all(|item| options.contains(item))).then_some("validation.option")
        }
        FieldKind::Checkbox { options } => {
            if options.is_empty() {
                return None;
            }
            (!value.to_list().iter().all(|item| options.contains(item)))
                .then_some("validation.option")
        }
        FieldKind::Ranking { options } => {
            let mut submitted = value.to_list();
            let mut expected = options.to_vec();
            submitted.sort();
            expected.sort();
            (submitted != expected).then_some("validation.ranking")
        }
        FieldKind::Email { allowed_domains } => validate_email(&value.to_text(), allowed_domains),
        FieldKind::File {
            accepted_file_types,
            ..
        } => {
            let matcher = accepted_matcher(accepted_file_types)?;
            (!value.to_list().iter().all(|name| matcher.is_match(name)))
                .then_some("validation.file_type")
        }
        FieldKind::Datetime { .. } => match part {
            AnswerPart::Time => NaiveTime::parse_from_str(value.to_text().trim(), "%H:%M")
                .is_err()
                .then_some("validation.time"),
            _ => value.as_date().is_none().then_some("validation.date"),
        },
        FieldKind::Passport(_) if part == AnswerPart::IssueDate => {
            value.as_date().is_none().then_some("validation.date")
        }
        _ => None,
    }
}

fn validate_email(text: &str, allowed_domains: &[String]) -> Option<&'static str> {
    let Some(captures) = EMAIL.captures(text.trim()) else {
        return Some("validation.email");
    };
    if allowed_domains.is_empty() {
        return None;
    }
    let domain = captures[1].to_lowercase();
    let allowed = allowed_domains
        .iter()
        .map(|allowed| allowed.trim().trim_start_matches('@').to_lowercase())
        .any(|allowed| allowed == domain);
    (!allowed).then_some("validation.email_domain")
}

/// Builds a case-insensitive matcher from entries such as `.pdf`, `pdf` or
/// `*.jpg`. MIME-style entries are skipped. `None` means "anything goes".
fn accepted_matcher(accepted: &[String]) -> Option<GlobSet> {
    let mut builder = GlobSetBuilder::new();
    let mut patterns = 0;
    for entry in accepted {
        let entry = entry.trim();
        if entry.is_empty() || entry.contains('/') {
            continue;
        }
        let pattern = if entry.starts_with('*') {
            entry.to_string()
        } else if entry.starts_with('.') {
            format!("*{entry}")
        } else {
            format!("*.{entry}")
        };
        if let Ok(glob) = GlobBuilder::new(&pattern).case_insensitive(true).build() {
            builder.add(glob);
            patterns += 1;
        }
    }
    if patterns == 0 {
        return None;
    }
    builder.build().ok()
}
