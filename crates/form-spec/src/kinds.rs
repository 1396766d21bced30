//! Per-type behaviour table.
//!
//! Each [`FieldType`] maps to a [`FieldHandler`] of plain functions. Adding a
//! type means adding one row here instead of touching every `match` in the
//! crate.

use crate::mask::{FULLNAME_MAX_CHARS, Mask, PASSPORT_TEXT_MAX_CHARS};
use crate::spec::{Field, FieldKind, FieldType};

/// Sub-input of a field. Composite fields store one answer per part under
/// `{fieldId}_{suffix}`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AnswerPart {
    Whole,
    LastName,
    FirstName,
    Patronymic,
    SeriesNumber,
    IssuedBy,
    IssueDate,
    DepartmentCode,
    BirthPlace,
    Time,
}

impl AnswerPart {
    pub fn suffix(self) -> Option<&'static str> {
        match self {
            AnswerPart::Whole => None,
            AnswerPart::LastName => Some("lastName"),
            AnswerPart::FirstName => Some("firstName"),
            AnswerPart::Patronymic => Some("patronymic"),
            AnswerPart::SeriesNumber => Some("seriesNumber"),
            AnswerPart::IssuedBy => Some("issuedBy"),
            AnswerPart::IssueDate => Some("issueDate"),
            AnswerPart::DepartmentCode => Some("departmentCode"),
            AnswerPart::BirthPlace => Some("birthPlace"),
            AnswerPart::Time => Some("time"),
        }
    }

    pub fn key_for(self, field_id: &str) -> String {
        match self.suffix() {
            Some(suffix) => format!("{field_id}_{suffix}"),
            None => field_id.to_string(),
        }
    }
}

/// One answer slot a field produces.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AnswerKey {
    pub key: String,
    pub part: AnswerPart,
    /// Whether a required field needs this slot filled.
    pub required: bool,
}

impl AnswerKey {
    fn new(field: &Field, part: AnswerPart, required: bool) -> Self {
        Self {
            key: part.key_for(&field.id),
            part,
            required,
        }
    }
}

/// Pure functions describing one field type.
pub struct FieldHandler {
    pub kind: FieldType,
    pub answer_keys: fn(&Field) -> Vec<AnswerKey>,
    pub mask: fn(&Field, AnswerPart) -> Option<Mask>,
}

const fn handler(
    kind: FieldType,
    answer_keys: fn(&Field) -> Vec<AnswerKey>,
    mask: fn(&Field, AnswerPart) -> Option<Mask>,
) -> FieldHandler {
    FieldHandler {
        kind,
        answer_keys,
        mask,
    }
}

static HANDLERS: [FieldHandler; 21] = [
    handler(FieldType::Text, single_key, text_mask),
    handler(FieldType::Number, single_key, no_mask),
    handler(FieldType::Select, single_key, no_mask),
    handler(FieldType::Checkbox, single_key, no_mask),
    handler(FieldType::Radio, single_key, no_mask),
    handler(FieldType::Datetime, datetime_keys, no_mask),
    handler(FieldType::Email, single_key, no_mask),
    handler(FieldType::Header, no_keys, no_mask),
    handler(FieldType::Rating, single_key, no_mask),
    handler(FieldType::Ranking, single_key, no_mask),
    handler(FieldType::File, single_key, no_mask),
    handler(FieldType::Category, single_key, no_mask),
    handler(FieldType::Fullname, fullname_keys, fullname_mask),
    handler(FieldType::Phone, single_key, no_mask),
    handler(FieldType::Passport, passport_keys, passport_mask),
    handler(FieldType::Inn, single_key, inn_mask),
    handler(FieldType::Snils, single_key, no_mask),
    handler(FieldType::Ogrn, single_key, no_mask),
    handler(FieldType::Bik, single_key, no_mask),
    handler(FieldType::Account, single_key, no_mask),
    handler(FieldType::Country, single_key, no_mask),
];

/// Looks up the handler row for `kind`.
pub fn handler_for(kind: FieldType) -> &'static FieldHandler {
    &HANDLERS[kind.index()]
}

/// Answer slots the field produces, in render order.
pub fn answer_keys(field: &Field) -> Vec<AnswerKey> {
    (handler_for(field.kind).answer_keys)(field)
}

/// Mask applied to one part of `field`, if any.
pub fn mask_for(field: &Field, part: AnswerPart) -> Option<Mask> {
    (handler_for(field.kind).mask)(field, part)
}

/// Resolves an answer-key back to the part of `field` it belongs to.
pub fn part_for_key(field: &Field, key: &str) -> Option<AnswerPart> {
    answer_keys(field)
        .into_iter()
        .find(|answer_key| answer_key.key == key)
        .map(|answer_key| answer_key.part)
}

/// Finds the field and part an answer-key belongs to.
pub fn locate_key<'a>(fields: &'a [Field], key: &str) -> Option<(&'a Field, AnswerPart)> {
    fields
        .iter()
        .find_map(|field| part_for_key(field, key).map(|part| (field, part)))
}

fn single_key(field: &Field) -> Vec<AnswerKey> {
    vec![AnswerKey::new(field, AnswerPart::Whole, true)]
}

fn no_keys(_: &Field) -> Vec<AnswerKey> {
    Vec::new()
}

fn datetime_keys(field: &Field) -> Vec<AnswerKey> {
    let mut keys = Vec::new();
    if let FieldKind::Datetime {
        show_date,
        show_time,
    } = field.attributes()
    {
        if show_date {
            keys.push(AnswerKey::new(field, AnswerPart::Whole, true));
        }
        if show_time {
            keys.push(AnswerKey::new(field, AnswerPart::Time, true));
        }
    }
    keys
}

fn fullname_keys(field: &Field) -> Vec<AnswerKey> {
    vec![
        AnswerKey::new(field, AnswerPart::LastName, true),
        AnswerKey::new(field, AnswerPart::FirstName, true),
        AnswerKey::new(field, AnswerPart::Patronymic, false),
    ]
}

fn passport_keys(field: &Field) -> Vec<AnswerKey> {
    let FieldKind::Passport(parts) = field.attributes() else {
        return Vec::new();
    };
    [
        (parts.series_number, AnswerPart::SeriesNumber),
        (parts.issued_by, AnswerPart::IssuedBy),
        (parts.issue_date, AnswerPart::IssueDate),
        (parts.department_code, AnswerPart::DepartmentCode),
        (parts.birth_place, AnswerPart::BirthPlace),
    ]
    .into_iter()
    .filter(|(shown, _)| *shown)
    .map(|(_, part)| AnswerKey::new(field, part, true))
    .collect()
}

fn no_mask(_: &Field, _: AnswerPart) -> Option<Mask> {
    None
}

fn text_mask(field: &Field, _: AnswerPart) -> Option<Mask> {
    match field.attributes() {
        FieldKind::Text {
            max_chars: Some(max),
            ..
        } => Some(Mask::MaxChars(max)),
        _ => None,
    }
}

fn fullname_mask(_: &Field, part: AnswerPart) -> Option<Mask> {
    match part {
        AnswerPart::LastName | AnswerPart::FirstName | AnswerPart::Patronymic => {
            Some(Mask::MaxChars(FULLNAME_MAX_CHARS))
        }
        _ => None,
    }
}

fn passport_mask(_: &Field, part: AnswerPart) -> Option<Mask> {
    match part {
        AnswerPart::SeriesNumber => Some(Mask::PassportSeriesNumber),
        AnswerPart::DepartmentCode => Some(Mask::PassportDepartmentCode),
        AnswerPart::IssuedBy | AnswerPart::BirthPlace => {
            Some(Mask::MaxChars(PASSPORT_TEXT_MAX_CHARS))
        }
        _ => None,
    }
}

fn inn_mask(field: &Field, _: AnswerPart) -> Option<Mask> {
    match field.attributes() {
        FieldKind::Inn { legal_entity } => Some(Mask::Inn { legal_entity }),
        _ => None,
    }
}
