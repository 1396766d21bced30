use form_spec::{
    AnswerSet, FieldKind, FieldType, export_schema, import_schema, merge_import, validate,
};

const FIXTURE: &str = include_str!("fixtures/capital_quiz.json");

#[test]
fn export_then_import_is_lossless() {
    let schema = import_schema(FIXTURE).expect("fixture parses");
    let exported = export_schema(&schema).expect("export");
    let reimported = import_schema(&exported).expect("reimport");
    assert_eq!(schema, reimported);

    let passport = reimported.field("document").expect("passport field");
    assert_eq!(
        passport.extra.get("themeColor").and_then(|value| value.as_str()),
        Some("#ff8800")
    );
}

#[test]
fn imported_attributes_drive_the_typed_view() {
    let schema = import_schema(FIXTURE).expect("fixture parses");
    let passport = schema.field("document").expect("passport field");
    assert_eq!(passport.kind, FieldType::Passport);
    match passport.attributes() {
        FieldKind::Passport(parts) => {
            assert!(!parts.birth_place);
            assert!(parts.series_number);
        }
        other => panic!("unexpected view: {other:?}"),
    }
}

#[test]
fn merged_import_keeps_the_open_form_identity() {
    let current = form_spec::FormSchema::new("Draft", Some("folder-1".into()));
    let merged = merge_import(&current, FIXTURE).expect("merge");
    assert_eq!(merged.id, current.id);
    assert_eq!(merged.folder_id.as_deref(), Some("folder-1"));
    assert_eq!(merged.title, "Capitals");
    assert_eq!(merged.fields.len(), 6);
}

#[test]
fn required_fullname_reports_missing_parts() {
    let schema = import_schema(FIXTURE).expect("fixture parses");
    let answers = AnswerSet::new()
        .with("travelled", "No")
        .with("applicant_lastName", "Ivanov");
    let result = validate(&schema, &answers);
    assert!(!result.valid);
    assert_eq!(result.missing_required, vec!["applicant_firstName".to_string()]);
}

#[test]
fn passport_parts_are_length_checked() {
    let schema = import_schema(FIXTURE).expect("fixture parses");
    let answers = AnswerSet::new()
        .with("travelled", "Yes")
        .with("applicant_lastName", "Ivanov")
        .with("applicant_firstName", "Ivan")
        .with("document_seriesNumber", "1234 56")
        .with("document_departmentCode", "123-456");
    let result = validate(&schema, &answers);
    assert_eq!(result.errors.len(), 1);
    assert_eq!(
        result.errors[0].answer_key.as_deref(),
        Some("document_seriesNumber")
    );
    assert_eq!(result.errors[0].code, "validation.length");
}

#[test]
fn unknown_answer_keys_are_reported() {
    let schema = import_schema(FIXTURE).expect("fixture parses");
    let answers = AnswerSet::new()
        .with("travelled", "Yes")
        .with("applicant_lastName", "Ivanov")
        .with("applicant_firstName", "Ivan")
        .with("document_birthPlace", "Moscow");
    let result = validate(&schema, &answers);
    assert_eq!(result.unknown_fields, vec!["document_birthPlace".to_string()]);
}

#[test]
fn loosely_typed_attributes_still_import() {
    let document = serde_json::json!({
        "id": "loose",
        "title": "Loose",
        "fields": [
            {
                "id": "sum",
                "type": "radio",
                "label": "2 + 2",
                "options": [3, 4, 5],
                "correctAnswers": ["4", 4],
                "points": 2.5
            }
        ]
    });
    let schema = import_schema(&document.to_string()).expect("loose document imports");
    let field = schema.field("sum").expect("sum field");
    assert_eq!(field.options(), ["3", "4", "5"]);
    assert_eq!(form_spec::effective_points(field), 1);

    let answers = AnswerSet::new().with("sum", "4");
    let report = form_spec::grade(&schema.fields, &answers);
    assert_eq!(report.is_correct("sum"), Some(true));
    assert_eq!(report.score, 1);

    let reimported = import_schema(&export_schema(&schema).expect("export")).expect("reimport");
    assert_eq!(schema, reimported);
}
