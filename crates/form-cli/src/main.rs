pub mod builder;

use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use builder::{FieldSpecArg, NewFormInput, build_schema, write_schema};
use clap::{Parser, Subcommand, ValueEnum};
use form_spec::{
    AnswerSet, FormSchema, GradeReport, Mask, ValidationResult, build_preview, export_schema,
    grade_visible, import_schema, initial_answers, merge_import, render_json_ui, render_text,
    validate,
};
use serde_json::Value;
use tracing::{debug, info};
use tracing_subscriber::EnvFilter;

type CliResult<T> = Result<T, Box<dyn std::error::Error>>;

const OUTPUT_DIR_ENV: &str = "FORMCRAFT_OUTPUT_DIR";

#[derive(Parser)]
#[command(
    author,
    version,
    about = "Form and quiz schema toolkit",
    long_about = "Preview, grade, and validate form schemas, format masked inputs, and scaffold new forms"
)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Copy, Clone, Debug, ValueEnum)]
enum OutputFormat {
    Text,
    Json,
}

#[derive(Copy, Clone, Debug, ValueEnum)]
enum MaskKind {
    /// Passport series and number, `XXXX XXXXXX`.
    PassportSeries,
    /// Passport department code, `XXX-XXX`.
    DepartmentCode,
    /// Taxpayer number of an individual (12 characters).
    Inn,
    /// Taxpayer number of a legal entity (10 characters).
    InnLegal,
}

impl MaskKind {
    fn mask(self) -> Mask {
        match self {
            MaskKind::PassportSeries => Mask::PassportSeriesNumber,
            MaskKind::DepartmentCode => Mask::PassportDepartmentCode,
            MaskKind::Inn => Mask::Inn {
                legal_entity: false,
            },
            MaskKind::InnLegal => Mask::Inn { legal_entity: true },
        }
    }
}

#[derive(Subcommand)]
enum Command {
    /// Show which fields are visible for a set of answers.
    Preview {
        /// Path to the form schema JSON.
        #[arg(long, value_name = "SCHEMA")]
        schema: PathBuf,
        /// Optional JSON file containing answers; ranking fields start in option order.
        #[arg(long, value_name = "ANSWERS")]
        answers: Option<PathBuf>,
        /// Grade visible quiz questions as well.
        #[arg(long)]
        grade: bool,
        /// Output format.
        #[arg(long, value_enum, default_value_t = OutputFormat::Text)]
        format: OutputFormat,
    },
    /// Score answers against the quiz questions of a schema.
    Grade {
        /// Path to the form schema JSON.
        #[arg(long, value_name = "SCHEMA")]
        schema: PathBuf,
        /// Path to the answers JSON file.
        #[arg(long, value_name = "ANSWERS")]
        answers: PathBuf,
        /// Output format.
        #[arg(long, value_enum, default_value_t = OutputFormat::Text)]
        format: OutputFormat,
    },
    /// Validate answers against a schema.
    Validate {
        /// Path to the form schema JSON.
        #[arg(long, value_name = "SCHEMA")]
        schema: PathBuf,
        /// Path to the answers JSON file.
        #[arg(long, value_name = "ANSWERS")]
        answers: PathBuf,
    },
    /// Format raw input the way a masked field would.
    Mask {
        /// Mask to apply.
        #[arg(value_enum)]
        kind: MaskKind,
        /// Raw keystrokes.
        raw: String,
    },
    /// Import an exported schema, optionally merging it into an existing form.
    Import {
        /// Exported schema JSON to load.
        #[arg(long, value_name = "INPUT")]
        input: PathBuf,
        /// Existing form whose id and folder are kept.
        #[arg(long, value_name = "SCHEMA")]
        into: Option<PathBuf>,
        /// Write the result here instead of stdout.
        #[arg(long, value_name = "OUT")]
        out: Option<PathBuf>,
    },
    /// Print the JSON Schema of the form schema format.
    Schema,
    /// Scaffold a new form schema file.
    New {
        /// Form title; also determines the file name.
        #[arg(long)]
        title: String,
        /// Optional form description.
        #[arg(long)]
        description: Option<String>,
        /// Folder the form belongs to.
        #[arg(long, value_name = "FOLDER_ID")]
        folder: Option<String>,
        /// Field to add, as `type` or `type:Label`. Repeatable.
        #[arg(long = "field", value_name = "TYPE[:LABEL]")]
        fields: Vec<FieldSpecArg>,
        /// Directory for the schema file (defaults to FORMCRAFT_OUTPUT_DIR or the current directory).
        #[arg(long, value_name = "DIR")]
        out: Option<PathBuf>,
        /// Overwrite an existing file.
        #[arg(long)]
        force: bool,
    },
}

fn main() -> CliResult<()> {
    init_tracing();
    let cli = Cli::parse();
    match cli.command {
        Command::Preview {
            schema,
            answers,
            grade,
            format,
        } => run_preview(schema, answers, grade, format),
        Command::Grade {
            schema,
            answers,
            format,
        } => run_grade(schema, answers, format),
        Command::Validate { schema, answers } => run_validate(schema, answers),
        Command::Mask { kind, raw } => run_mask(kind, &raw),
        Command::Import { input, into, out } => run_import(input, into, out),
        Command::Schema => run_schema(),
        Command::New {
            title,
            description,
            folder,
            fields,
            out,
            force,
        } => run_new(
            NewFormInput {
                title,
                description,
                folder_id: folder,
                fields,
            },
            out,
            force,
        ),
    }
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("formcraft=info,form_spec=warn"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn load_schema(path: &Path) -> CliResult<FormSchema> {
    let json = fs::read_to_string(path)?;
    Ok(import_schema(&json)?)
}

fn load_answers(path: &Path) -> CliResult<AnswerSet> {
    let json = fs::read_to_string(path)?;
    let value: Value = serde_json::from_str(&json)?;
    Ok(AnswerSet::from_json(&value))
}

fn run_preview(
    schema_path: PathBuf,
    answers_path: Option<PathBuf>,
    grade: bool,
    format: OutputFormat,
) -> CliResult<()> {
    let schema = load_schema(&schema_path)?;
    let answers = match answers_path {
        Some(path) => load_answers(&path)?,
        None => initial_answers(&schema),
    };
    let payload = build_preview(&schema, &answers, grade);
    match format {
        OutputFormat::Text => println!("{}", render_text(&payload)),
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&render_json_ui(&payload))?),
    }
    Ok(())
}

fn run_grade(schema_path: PathBuf, answers_path: PathBuf, format: OutputFormat) -> CliResult<()> {
    let schema = load_schema(&schema_path)?;
    let answers = load_answers(&answers_path)?;
    let report = grade_visible(&schema, &answers);
    debug!(form_id = %schema.id, fields = report.per_field.len(), "graded answers");

    match format {
        OutputFormat::Text => describe_grade(&report),
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&report)?),
    }
    Ok(())
}

fn describe_grade(report: &GradeReport) {
    if report.max_score == 0 {
        println!("No quiz questions to grade.");
        return;
    }
    match report.percentage() {
        Some(percentage) => println!(
            "Score: {} / {} ({}%)",
            report.score, report.max_score, percentage
        ),
        None => println!("Score: {} / {}", report.score, report.max_score),
    }
    for (field_id, correct) in &report.per_field {
        println!(
            "  {} - {}",
            field_id,
            if *correct { "correct" } else { "incorrect" }
        );
    }
}

fn run_validate(schema_path: PathBuf, answers_path: PathBuf) -> CliResult<()> {
    let schema = load_schema(&schema_path)?;
    let answers = load_answers(&answers_path)?;

    let result = validate(&schema, &answers);
    println!(
        "Validation result: {}",
        if result.valid { "valid" } else { "invalid" }
    );
    describe_validation(&result);

    if result.valid {
        Ok(())
    } else {
        Err("validation failed".into())
    }
}

fn describe_validation(result: &ValidationResult) {
    if !result.errors.is_empty() {
        println!("Errors:");
        for error in &result.errors {
            println!(
                "  {} - {}",
                error
                    .answer_key
                    .as_deref()
                    .or(error.field_id.as_deref())
                    .unwrap_or("<unknown>"),
                error.code
            );
        }
    }
    if !result.missing_required.is_empty() {
        println!(
            "Missing required answers: {}",
            result.missing_required.join(", ")
        );
    }
    if !result.unknown_fields.is_empty() {
        println!(
            "Unknown answer fields: {}",
            result.unknown_fields.join(", ")
        );
    }
}

fn run_mask(kind: MaskKind, raw: &str) -> CliResult<()> {
    let mask = kind.mask();
    let formatted = mask.format(raw);
    println!("{formatted}");
    if mask.has_error(&formatted) {
        return Err(format!("'{formatted}' does not have the required length").into());
    }
    Ok(())
}

fn run_import(input: PathBuf, into: Option<PathBuf>, out: Option<PathBuf>) -> CliResult<()> {
    let document = fs::read_to_string(&input)?;
    let schema = match into {
        Some(current) => merge_import(&load_schema(&current)?, &document)?,
        None => import_schema(&document)?,
    };
    let json = export_schema(&schema)?;
    match out {
        Some(path) => {
            fs::write(&path, json)?;
            info!(path = %path.display(), fields = schema.fields.len(), "imported form");
        }
        None => println!("{json}"),
    }
    Ok(())
}

fn run_schema() -> CliResult<()> {
    let schema = schemars::schema_for!(FormSchema);
    println!("{}", serde_json::to_string_pretty(&schema)?);
    Ok(())
}

fn run_new(input: NewFormInput, out_dir: Option<PathBuf>, force: bool) -> CliResult<()> {
    let out_root = resolve_output_root(out_dir)?;
    let schema = build_schema(&input);
    let path = write_schema(&schema, &out_root, force)?;
    info!(form_id = %schema.id, "created form");
    println!("Form written to {}", path.display());
    Ok(())
}

fn resolve_output_root(out: Option<PathBuf>) -> CliResult<PathBuf> {
    let candidate = match out {
        Some(path) => path,
        None => env::var_os(OUTPUT_DIR_ENV)
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from(".")),
    };
    if candidate.as_os_str().is_empty() {
        return Err("output directory cannot be empty".into());
    }
    Ok(candidate)
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_cmd::Command;
    use assert_fs::prelude::*;
    use predicates::prelude::*;
    use serde_json::{Value, json};

    const FIXTURE: &str = include_str!("../../form-spec/tests/fixtures/capital_quiz.json");

    fn workspace_with_fixture() -> assert_fs::TempDir {
        let workspace = assert_fs::TempDir::new().expect("temp dir");
        workspace
            .child("quiz.json")
            .write_str(FIXTURE)
            .expect("write fixture");
        workspace
    }

    #[test]
    fn mask_kind_maps_to_inn_lengths() {
        assert_eq!(
            MaskKind::InnLegal.mask(),
            Mask::Inn { legal_entity: true }
        );
        assert_eq!(run_mask(MaskKind::Inn, "1234567890123").ok(), Some(()));
    }

    #[test]
    fn preview_prints_visible_fields() -> Result<(), Box<dyn std::error::Error>> {
        let workspace = workspace_with_fixture();
        workspace
            .child("answers.json")
            .write_str(&json!({ "travelled": "No" }).to_string())?;

        Command::cargo_bin("formcraft")?
            .arg("preview")
            .arg("--schema")
            .arg(workspace.path().join("quiz.json"))
            .arg("--answers")
            .arg(workspace.path().join("answers.json"))
            .assert()
            .success()
            .stdout(predicate::str::contains("Form: Capitals (capital-quiz)"))
            .stdout(predicate::str::contains("Visible fields (5):"))
            .stdout(predicate::str::contains("capital (").not());
        Ok(())
    }

    #[test]
    fn grade_reports_score() -> Result<(), Box<dyn std::error::Error>> {
        let workspace = workspace_with_fixture();
        workspace.child("answers.json").write_str(
            &json!({
                "travelled": "Yes",
                "capital": "paris",
                "fruits": ["Banana", "Apple"]
            })
            .to_string(),
        )?;

        Command::cargo_bin("formcraft")?
            .arg("grade")
            .arg("--schema")
            .arg(workspace.path().join("quiz.json"))
            .arg("--answers")
            .arg(workspace.path().join("answers.json"))
            .assert()
            .success()
            .stdout(predicate::str::contains("Score: 7 / 7 (100%)"));
        Ok(())
    }

    #[test]
    fn validate_fails_on_missing_required() -> Result<(), Box<dyn std::error::Error>> {
        let workspace = workspace_with_fixture();
        workspace
            .child("answers.json")
            .write_str(&json!({ "travelled": "No", "stray": 1 }).to_string())?;

        Command::cargo_bin("formcraft")?
            .arg("validate")
            .arg("--schema")
            .arg(workspace.path().join("quiz.json"))
            .arg("--answers")
            .arg(workspace.path().join("answers.json"))
            .assert()
            .failure()
            .stdout(predicate::str::contains("Validation result: invalid"))
            .stdout(predicate::str::contains("applicant_firstName"))
            .stdout(predicate::str::contains("Unknown answer fields: stray"));
        Ok(())
    }

    #[test]
    fn mask_formats_passport_series() -> Result<(), Box<dyn std::error::Error>> {
        Command::cargo_bin("formcraft")?
            .args(["mask", "passport-series", "12 34 567890 99"])
            .assert()
            .success()
            .stdout(predicate::str::contains("1234 567890"));

        Command::cargo_bin("formcraft")?
            .args(["mask", "department-code", "12"])
            .assert()
            .failure()
            .stdout(predicate::str::contains("12"));
        Ok(())
    }

    #[test]
    fn import_merges_into_existing_form() -> Result<(), Box<dyn std::error::Error>> {
        let workspace = workspace_with_fixture();
        let current = FormSchema::new("Draft", Some("folder-7".into()));
        workspace
            .child("current.json")
            .write_str(&export_schema(&current)?)?;
        let out = workspace.path().join("merged.json");

        Command::cargo_bin("formcraft")?
            .arg("import")
            .arg("--input")
            .arg(workspace.path().join("quiz.json"))
            .arg("--into")
            .arg(workspace.path().join("current.json"))
            .arg("--out")
            .arg(&out)
            .assert()
            .success();

        let merged: Value = serde_json::from_str(&fs::read_to_string(&out)?)?;
        assert_eq!(merged["id"].as_str(), Some(current.id.as_str()));
        assert_eq!(merged["folderId"], "folder-7");
        assert_eq!(merged["title"], "Capitals");
        Ok(())
    }

    #[test]
    fn import_rejects_documents_without_fields() -> Result<(), Box<dyn std::error::Error>> {
        let workspace = assert_fs::TempDir::new()?;
        workspace.child("bad.json").write_str(r#"{"title": "x"}"#)?;

        Command::cargo_bin("formcraft")?
            .arg("import")
            .arg("--input")
            .arg(workspace.path().join("bad.json"))
            .assert()
            .failure()
            .stderr(predicate::str::contains("MissingFields"));
        Ok(())
    }

    #[test]
    fn schema_prints_json_schema() -> Result<(), Box<dyn std::error::Error>> {
        let output = Command::cargo_bin("formcraft")?.arg("schema").output()?;
        assert!(output.status.success());
        let schema: Value = serde_json::from_slice(&output.stdout)?;
        assert_eq!(schema["title"], "FormSchema");
        assert!(schema["properties"].get("fields").is_some());
        Ok(())
    }

    #[test]
    fn new_writes_into_output_dir_from_env() -> Result<(), Box<dyn std::error::Error>> {
        let workspace = assert_fs::TempDir::new()?;
        let output_root = workspace.path().join("forms-out");

        Command::cargo_bin("formcraft")?
            .env(OUTPUT_DIR_ENV, &output_root)
            .args([
                "new",
                "--title",
                "Team Survey",
                "--field",
                "fullname:Your name",
                "--field",
                "rating",
            ])
            .assert()
            .success()
            .stdout(predicate::str::contains("team_survey_schema.json"));

        let written = fs::read_to_string(output_root.join("team_survey_schema.json"))?;
        let schema = import_schema(&written)?;
        assert_eq!(schema.title, "Team Survey");
        assert_eq!(schema.fields.len(), 2);
        assert_eq!(schema.fields[0].label, "Your name");
        assert_eq!(schema.fields[1].max_rating, Some(5));
        Ok(())
    }

    #[test]
    fn new_rejects_unknown_field_type() -> Result<(), Box<dyn std::error::Error>> {
        let workspace = assert_fs::TempDir::new()?;
        Command::cargo_bin("formcraft")?
            .args(["new", "--title", "X", "--field", "hologram", "--out"])
            .arg(workspace.path())
            .assert()
            .failure()
            .stderr(predicate::str::contains("unknown field type"));
        Ok(())
    }
}
