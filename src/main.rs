use anyhow::{Context, Result};
use casedash::dashboard::{build_dashboard, DashboardDefinition};
use casedash::data::{results_from_json_str, RowSet};
use casedash::palette::{ColorSource, FixedPalette, RandomRgb};
use casedash::{csv_reader, parser, runtime, OutputFormat, RenderOptions};
use clap::{Parser, Subcommand, ValueEnum};
use std::io::{self, Read, Write};
use std::path::PathBuf;
use tracing::info;
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "casedash")]
#[command(about = "Turn aggregate case counts into chart.js configs and images", long_about = None)]
struct Args {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Build one chart from rows on stdin
    Chart {
        /// Chart DSL string (e.g., 'bar(group: Status, value: CaseCount) | labs(title: "Open")')
        dsl: String,

        #[arg(long, value_enum, default_value_t = InputFormat::Json)]
        input: InputFormat,

        #[arg(long, value_enum, default_value_t = Output::Json)]
        output: Output,

        #[arg(long, default_value_t = 800)]
        width: u32,

        #[arg(long, default_value_t = 600)]
        height: u32,

        #[command(flatten)]
        colors: ColorArgs,
    },
    /// Build every dashboard panel from a `{query: rows}` object on stdin
    Dashboard {
        /// Dashboard definition JSON; defaults to the engineering cases dashboard
        #[arg(long)]
        definition: Option<PathBuf>,

        #[command(flatten)]
        colors: ColorArgs,
    },
}

#[derive(clap::Args, Debug)]
struct ColorArgs {
    /// Seed for reproducible random colors
    #[arg(long)]
    seed: Option<u64>,

    /// Fixed palette instead of random colors: `category10`, `status`,
    /// or a comma-separated list such as `red,#00ff00,rgb(1,2,3)`
    #[arg(long, conflicts_with = "seed")]
    palette: Option<FixedPalette>,
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum InputFormat {
    Json,
    Csv,
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum Output {
    Json,
    Png,
    Svg,
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("casedash=warn")),
        )
        .with_writer(io::stderr)
        .init();

    let args = Args::parse();

    let bytes = match args.command {
        Command::Chart { dsl, input, output, width, height, colors } => {
            run_chart(&dsl, input, output, width, height, colors)?
        }
        Command::Dashboard { definition, colors } => run_dashboard(definition, colors)?,
    };

    // Write output to stdout
    let stdout = io::stdout();
    let mut handle = stdout.lock();
    handle.write_all(&bytes).context("Failed to write output to stdout")?;
    handle.flush().context("Failed to flush stdout")?;

    Ok(())
}

fn run_chart(
    dsl: &str,
    input: InputFormat,
    output: Output,
    width: u32,
    height: u32,
    color_args: ColorArgs,
) -> Result<Vec<u8>> {
    // Parse the DSL string
    let request = match parser::parse_request(dsl) {
        Ok((_, request)) => request,
        Err(e) => {
            eprintln!("Parse error: {:?}", e);
            std::process::exit(1);
        }
    };

    let rows = match input {
        InputFormat::Json => RowSet::from_json_str(&read_stdin()?),
        InputFormat::Csv => csv_reader::read_rows_from_stdin(),
    }
    .context("Failed to read rows from stdin")?;
    info!(rows = rows.len(), kind = %request.chart.kind, "building chart");

    let mut colors = color_source(color_args);
    match output {
        Output::Json => {
            let config = runtime::build_chart(&request, &rows, &mut colors);
            to_json(&config)
        }
        Output::Png | Output::Svg => {
            let options = RenderOptions {
                width,
                height,
                format: if matches!(output, Output::Png) { OutputFormat::Png } else { OutputFormat::Svg },
            };
            runtime::render_request(&request, &rows, &mut colors, &options)
        }
    }
}

fn run_dashboard(definition: Option<PathBuf>, color_args: ColorArgs) -> Result<Vec<u8>> {
    let definition = match definition {
        Some(path) => DashboardDefinition::from_file(&path)?,
        None => DashboardDefinition::engineering_cases(),
    };

    let results = results_from_json_str(&read_stdin()?).context("Failed to read query results from stdin")?;
    info!(dashboard = %definition.name, queries = results.len(), "building dashboard");

    let view = build_dashboard(&definition, &results, color_source(color_args));
    to_json(&view)
}

fn color_source(args: ColorArgs) -> Box<dyn ColorSource> {
    match (args.palette, args.seed) {
        (Some(palette), _) => Box::new(palette),
        (None, Some(seed)) => Box::new(RandomRgb::seeded(seed)),
        (None, None) => Box::new(RandomRgb::new()),
    }
}

fn read_stdin() -> Result<String> {
    let mut text = String::new();
    io::stdin().read_to_string(&mut text).context("Failed to read stdin")?;
    Ok(text)
}

fn to_json<T: serde::Serialize>(value: &T) -> Result<Vec<u8>> {
    let mut bytes = serde_json::to_vec_pretty(value).context("Failed to serialize output")?;
    bytes.push(b'\n');
    Ok(bytes)
}
