mod reports;
mod source;

use anyhow::{Context, Result, bail};
use battlestat_core::{Estimator, ModelConfig, PredictionOptions};
use clap::{Parser, ValueEnum};
use colored::Colorize;
use std::fs::{self, File};
use std::io::{BufWriter, Write, stdout};
use std::path::{Path, PathBuf};

use source::{FileSource, InputFormat};

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum ReportFormat {
    /// Colored summary for terminals
    Console,
    /// Pretty-printed JSON
    Json,
    /// Markdown table and per-account notes
    Markdown,
}

#[derive(Debug, Parser)]
#[command(name = "battlestat", version)]
#[command(about = "Estimate an account's battle stats from public telemetry")]
struct Args {
    /// Telemetry JSON files, one account each
    #[arg(required = true)]
    inputs: Vec<PathBuf>,

    /// Shape of the input documents
    #[arg(long, value_enum, default_value_t = InputFormat::Snapshot)]
    input_format: InputFormat,

    /// Model JSON replacing the bundled tables
    #[arg(long)]
    model: Option<PathBuf>,

    /// Pull estimates toward the bracket implied by the rank title
    #[arg(long)]
    rank_correction: bool,

    /// Observation instant (unix seconds); defaults to now for documents without one
    #[arg(long)]
    captured_at: Option<i64>,

    /// Output report format
    #[arg(long, value_enum, default_value_t = ReportFormat::Console)]
    report: ReportFormat,

    /// List every training session in the console report
    #[arg(short, long)]
    verbose: bool,

    /// Optional path to write the report output instead of stdout
    #[arg(long)]
    output: Option<PathBuf>,
}

fn main() -> Result<()> {
    env_logger::init();
    let args = Args::parse();

    let model = load_model(args.model.as_deref())?;
    let captured_at = args
        .captured_at
        .unwrap_or_else(|| chrono::Utc::now().timestamp());
    if captured_at <= 0 {
        bail!("observation instant must be positive (got {captured_at})");
    }
    let source = FileSource::new(args.input_format, captured_at, args.captured_at.is_some());
    let estimator = Estimator::new(source, &model).with_options(PredictionOptions {
        rank_correction: args.rank_correction,
    });

    let mut predictions = Vec::with_capacity(args.inputs.len());
    for input in &args.inputs {
        let account = input.to_string_lossy();
        let prediction = estimator
            .estimate(&account)
            .with_context(|| format!("failed to estimate {}", input.display()))?;
        predictions.push(prediction);
    }

    write_report(&args, &model, &predictions)
}

fn load_model(path: Option<&Path>) -> Result<ModelConfig> {
    let Some(path) = path else {
        return ModelConfig::load_from_static().context("bundled model is invalid");
    };
    let json =
        fs::read_to_string(path).with_context(|| format!("failed to read {}", path.display()))?;
    let model = ModelConfig::from_json(&json)
        .with_context(|| format!("failed to load model {}", path.display()))?;
    log::info!("using model from {}", path.display());
    Ok(model)
}

fn write_report(
    args: &Args,
    model: &ModelConfig,
    predictions: &[battlestat_core::Prediction],
) -> Result<()> {
    let mut output_target = OutputTarget::new(args.output.clone())?;
    match args.report {
        ReportFormat::Json => reports::generate_json_report(&mut output_target, predictions)?,
        ReportFormat::Markdown => {
            reports::generate_markdown_report(&mut output_target, predictions)?;
        }
        ReportFormat::Console => {
            reports::generate_console_report(&mut output_target, predictions, model, args.verbose)?;
        }
    }
    output_target.flush_inner()?;
    if let Some(path) = &args.output {
        eprintln!("{} {}", "📝 Report written to".green(), path.display());
    }
    Ok(())
}

enum OutputTarget {
    Stdout(BufWriter<std::io::Stdout>),
    File(BufWriter<File>),
}

impl OutputTarget {
    fn new(path: Option<PathBuf>) -> Result<Self> {
        if let Some(path) = path {
            let file = File::create(&path)
                .with_context(|| format!("failed to create {}", path.display()))?;
            Ok(Self::File(BufWriter::new(file)))
        } else {
            Ok(Self::Stdout(BufWriter::new(stdout())))
        }
    }

    fn writer(&mut self) -> &mut dyn Write {
        match self {
            Self::Stdout(w) => w,
            Self::File(w) => w,
        }
    }

    fn flush_inner(&mut self) -> std::io::Result<()> {
        match self {
            Self::Stdout(w) => w.flush(),
            Self::File(w) => w.flush(),
        }
    }
}

impl Write for OutputTarget {
    fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
        self.writer().write(buf)
    }

    fn flush(&mut self) -> std::io::Result<()> {
        self.flush_inner()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn args_parse_defaults() {
        let args = Args::try_parse_from(["battlestat", "account.json"]).unwrap();
        assert_eq!(args.inputs, vec![PathBuf::from("account.json")]);
        assert_eq!(args.input_format, InputFormat::Snapshot);
        assert_eq!(args.report, ReportFormat::Console);
        assert!(!args.rank_correction);
        assert!(args.captured_at.is_none());
    }

    #[test]
    fn args_parse_every_option() {
        let args = Args::try_parse_from([
            "battlestat",
            "a.json",
            "b.json",
            "--input-format",
            "payload",
            "--rank-correction",
            "--captured-at",
            "1700000000",
            "--report",
            "markdown",
            "--output",
            "out.md",
            "-v",
        ])
        .unwrap();
        assert_eq!(args.inputs.len(), 2);
        assert_eq!(args.input_format, InputFormat::Payload);
        assert!(args.rank_correction);
        assert_eq!(args.captured_at, Some(1_700_000_000));
        assert_eq!(args.report, ReportFormat::Markdown);
        assert!(args.verbose);
    }

    #[test]
    fn inputs_are_required() {
        assert!(Args::try_parse_from(["battlestat"]).is_err());
    }

    #[test]
    fn bundled_model_loads_without_override() {
        let model = load_model(None).unwrap();
        assert_eq!(model, *ModelConfig::bundled());
    }

    #[test]
    fn missing_model_file_is_reported() {
        let err = load_model(Some(Path::new("/nonexistent/model.json"))).unwrap_err();
        assert!(format!("{err:#}").contains("/nonexistent/model.json"));
    }
}
