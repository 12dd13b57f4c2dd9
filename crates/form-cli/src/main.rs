use clap::{Parser, Subcommand, ValueEnum};
use form_spec::{
    FormConfig, LayoutItem, LayoutNode, SchemaType, ValidationResult, ValidatorFactory,
    build_render_plan_with, parse_date, render_json_ui, render_text, to_json_type, to_schema_type,
};
use serde::de::DeserializeOwned;
use serde_json::Value;
use std::fs;
use std::path::{Path, PathBuf};
use tracing_subscriber::EnvFilter;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::{SubscriberInitExt, TryInitError};

type CliResult<T> = Result<T, Box<dyn std::error::Error>>;

const LOG_ENV: &str = "SCHEMA_FORM_LOG";

#[derive(Parser)]
#[command(
    author,
    version,
    about = "JSON-Schema form helper",
    long_about = "Coerces values, parses dates, validates data and renders widget plans for JSON-Schema forms"
)]
struct Cli {
    /// Log debug output to stderr (overrides SCHEMA_FORM_LOG).
    #[arg(long, global = true)]
    verbose: bool,
    #[command(subcommand)]
    command: Command,
}

#[derive(Copy, Clone, Debug, ValueEnum)]
enum RenderFormat {
    Text,
    Json,
}

#[derive(Subcommand)]
enum Command {
    /// Convert a value to one type, or toward the best of several.
    Coerce {
        /// JSON literal; text that is not valid JSON is taken as a string.
        #[arg(long, value_name = "JSON", allow_hyphen_values = true)]
        value: String,
        /// Single target type (strict conversion).
        #[arg(long = "type", value_name = "TYPE", conflicts_with = "types")]
        kind: Option<String>,
        /// Comma-separated allowed types (permissive conversion).
        #[arg(long, value_name = "TYPES", required_unless_present = "kind")]
        types: Option<String>,
    },
    /// Parse an ISO-like date and print its fields.
    Date {
        /// Text such as 1999-09-21 or 2018-05-02T10:30.
        text: String,
    },
    /// Validate a data document against a schema.
    Validate {
        #[arg(long, value_name = "SCHEMA")]
        schema: PathBuf,
        #[arg(long, value_name = "DATA")]
        data: PathBuf,
        /// Extra schemas available to `$ref` by identifier.
        #[arg(long, value_name = "SCHEMA")]
        register: Vec<PathBuf>,
    },
    /// Print the sub-schema found at a property path.
    Resolve {
        #[arg(long, value_name = "SCHEMA")]
        schema: PathBuf,
        /// Slash-separated property path, e.g. /address/city.
        #[arg(long, value_name = "REF")]
        pointer: String,
        #[arg(long, value_name = "SCHEMA")]
        register: Vec<PathBuf>,
    },
    /// Build the widget plan for a schema and print it.
    Render {
        #[arg(long, value_name = "SCHEMA")]
        schema: PathBuf,
        /// JSON array of layout items; defaults to every property.
        #[arg(long, value_name = "LAYOUT")]
        layout: Option<PathBuf>,
        #[arg(long, value_name = "DATA")]
        data: Option<PathBuf>,
        #[arg(long, value_name = "CONFIG")]
        config: Option<PathBuf>,
        #[arg(long, value_name = "SCHEMA")]
        register: Vec<PathBuf>,
        #[arg(long, value_enum, default_value_t = RenderFormat::Text)]
        format: RenderFormat,
    },
    /// Print the JSON schema describing layout nodes.
    OptionsSchema,
}

fn main() -> CliResult<()> {
    let cli = Cli::parse();
    if let Err(err) = init_logging(cli.verbose) {
        eprintln!("schema-form: logging disabled: {err}");
    }
    match cli.command {
        Command::Coerce { value, kind, types } => run_coerce(&value, kind, types),
        Command::Date { text } => run_date(&text),
        Command::Validate {
            schema,
            data,
            register,
        } => run_validate(&schema, &data, &register),
        Command::Resolve {
            schema,
            pointer,
            register,
        } => run_resolve(&schema, &pointer, &register),
        Command::Render {
            schema,
            layout,
            data,
            config,
            register,
            format,
        } => run_render(
            &schema,
            layout.as_deref(),
            data.as_deref(),
            config.as_deref(),
            &register,
            format,
        ),
        Command::OptionsSchema => run_options_schema(),
    }
}

fn init_logging(verbose: bool) -> Result<(), TryInitError> {
    let filter = if verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| EnvFilter::new("warn"))
    };
    tracing_subscriber::registry()
        .with(filter)
        .with(
            tracing_subscriber::fmt::layer()
                .without_time()
                .with_writer(std::io::stderr),
        )
        .try_init()
}

fn run_coerce(raw: &str, kind: Option<String>, types: Option<String>) -> CliResult<()> {
    let value = parse_value_arg(raw);
    if let Some(kind) = kind {
        let converted = to_json_type(&value, &kind)
            .ok_or_else(|| format!("value {value} cannot be converted to {kind}"))?;
        println!("{converted}");
        return Ok(());
    }

    let allowed = parse_types(types.as_deref().unwrap_or_default())?;
    println!("{}", to_schema_type(&value, &allowed));
    Ok(())
}

fn parse_value_arg(raw: &str) -> Value {
    serde_json::from_str(raw).unwrap_or_else(|_| Value::String(raw.to_string()))
}

fn parse_types(list: &str) -> CliResult<Vec<SchemaType>> {
    let mut allowed = Vec::new();
    for name in list.split(',').map(str::trim).filter(|name| !name.is_empty()) {
        allowed.push(name.parse::<SchemaType>()?);
    }
    if allowed.is_empty() {
        return Err("at least one type is required".into());
    }
    Ok(allowed)
}

fn run_date(text: &str) -> CliResult<()> {
    let date = parse_date(Some(text)).ok_or_else(|| format!("'{text}' is not a recognised date"))?;
    println!("Year: {}", date.year());
    println!("Month index: {}", date.month_index());
    println!("Day: {}", date.day());
    println!(
        "Time: {:02}:{:02}:{:02}.{:03}",
        date.hour(),
        date.minute(),
        date.second(),
        date.millisecond()
    );
    println!("ISO: {}", date.to_iso_string());
    println!("Long: {}", date.to_long_string());
    Ok(())
}

fn run_validate(schema_path: &Path, data_path: &Path, register: &[PathBuf]) -> CliResult<()> {
    let factory = load_factory(register)?;
    let schema: Value = read_json(schema_path)?;
    let data: Value = read_json(data_path)?;

    let result = factory.compile(&schema)?.validate(&data);
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
            let path = if error.path.is_empty() { "/" } else { &error.path };
            println!("  {} - {} ({})", path, error.message, error.keyword);
        }
    }
}

fn run_resolve(schema_path: &Path, pointer: &str, register: &[PathBuf]) -> CliResult<()> {
    let factory = load_factory(register)?;
    let schema: Value = read_json(schema_path)?;
    let found = factory
        .get_schema(&schema, pointer)?
        .ok_or_else(|| format!("no sub-schema at '{pointer}'"))?;
    println!("{}", serde_json::to_string_pretty(found)?);
    Ok(())
}

fn run_render(
    schema_path: &Path,
    layout_path: Option<&Path>,
    data_path: Option<&Path>,
    config_path: Option<&Path>,
    register: &[PathBuf],
    format: RenderFormat,
) -> CliResult<()> {
    let factory = load_factory(register)?;
    let schema: Value = read_json(schema_path)?;
    let layout = layout_path
        .map(read_json::<Vec<LayoutItem>>)
        .transpose()?;
    let data: Value = match data_path {
        Some(path) => read_json(path)?,
        None => Value::Object(Default::default()),
    };
    let config: FormConfig = match config_path {
        Some(path) => read_json(path)?,
        None => FormConfig::default(),
    };

    let plan = build_render_plan_with(&factory, &schema, layout.as_deref(), &data, &config)?;
    match format {
        RenderFormat::Text => println!("{}", render_text(&plan)),
        RenderFormat::Json => println!("{}", serde_json::to_string_pretty(&render_json_ui(&plan))?),
    }
    Ok(())
}

fn run_options_schema() -> CliResult<()> {
    let schema = schemars::schema_for!(LayoutNode);
    println!("{}", serde_json::to_string_pretty(&schema)?);
    Ok(())
}

fn load_factory(register: &[PathBuf]) -> CliResult<ValidatorFactory> {
    let mut factory = ValidatorFactory::new();
    for path in register {
        tracing::debug!(path = %path.display(), "loading schema for registry");
        let schema: Value = read_json(path)?;
        factory.register_schema(schema)?;
    }
    Ok(factory)
}

fn read_json<T: DeserializeOwned>(path: &Path) -> CliResult<T> {
    let contents =
        fs::read_to_string(path).map_err(|err| format!("failed to read {}: {err}", path.display()))?;
    let parsed = serde_json::from_str(&contents)
        .map_err(|err| format!("invalid JSON in {}: {err}", path.display()))?;
    Ok(parsed)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use tempfile::TempDir;

    #[test]
    fn repeated_logging_init_reports_an_error() {
        let _ = init_logging(false);
        assert!(init_logging(true).is_err());
    }

    #[test]
    fn value_arg_falls_back_to_string() {
        assert_eq!(parse_value_arg("10"), json!(10));
        assert_eq!(parse_value_arg("\"10\""), json!("10"));
        assert_eq!(parse_value_arg("hello"), json!("hello"));
        assert_eq!(parse_value_arg("null"), Value::Null);
    }

    #[test]
    fn types_list_parses_and_rejects_unknown_names() {
        assert_eq!(
            parse_types("integer, string").expect("types"),
            vec![SchemaType::Integer, SchemaType::String]
        );
        assert!(parse_types("integer,bogus").is_err());
        assert!(parse_types(" , ").is_err());
    }

    #[test]
    fn read_json_reports_path_on_failure() {
        let dir = TempDir::new().expect("temp dir");
        let path = dir.path().join("broken.json");
        fs::write(&path, "{ nope").expect("write");
        let err = read_json::<Value>(&path).expect_err("invalid");
        assert!(err.to_string().contains("broken.json"));
    }

    #[test]
    fn registered_schemas_load_into_factory() {
        let dir = TempDir::new().expect("temp dir");
        let path = dir.path().join("common.json");
        fs::write(
            &path,
            json!({ "$id": "urn:common", "type": "string" }).to_string(),
        )
        .expect("write");
        let factory = load_factory(&[path]).expect("factory");
        assert!(factory.schema("urn:common").is_some());
    }
}
