use clap::{Parser as ClapParser, Subcommand};
use std::io::{self, Read};
use topk_query::cli::{self, CheckOptions, CliError, LiteralOptions, LiteralShape};
use topk_query::wire::WireLiteral;
use tracing_subscriber::EnvFilter;

#[derive(ClapParser)]
#[command(name = "topkq")]
#[command(about = "topkq - Validate, render and explore search query payloads")]
#[command(version)]
struct Cli {
    /// Log builder and validation events
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Decode and validate a JSON query payload
    Check {
        /// JSON payload (reads from stdin if not provided)
        #[arg(short, long)]
        input: Option<String>,

        /// Print the normalized JSON payload instead of canonical text
        #[arg(long)]
        json: bool,

        /// Pretty-print JSON output
        #[arg(short, long)]
        pretty: bool,
    },

    /// Re-emit a JSON query payload in normalized form
    Render {
        /// JSON payload (reads from stdin if not provided)
        #[arg(short, long)]
        input: Option<String>,

        /// Pretty-print the output
        #[arg(short, long)]
        pretty: bool,
    },

    /// Coerce a JSON value into a typed literal
    Literal {
        /// JSON value, e.g. '[1, 2]'
        value: String,

        /// Target shape
        #[arg(short, long, value_enum, default_value_t = LiteralShape::Auto)]
        shape: LiteralShape,

        /// Element type (f32, f16, f8, u8, i8, binary, u32, u64, i32, i64, f64, string)
        #[arg(short, long)]
        element: Option<String>,

        /// Print the wire JSON of the literal
        #[arg(long)]
        json: bool,
    },

    /// List documentation categories
    Docs,

    /// Show documentation for a specific category
    Doc {
        /// Category name (use 'topkq docs' to list categories)
        category: String,
    },
}

fn main() {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let result = match cli.command {
        Commands::Check {
            input,
            json,
            pretty,
        } => run_check(input, json, pretty),
        Commands::Render { input, pretty } => run_render(input, pretty),
        Commands::Literal {
            value,
            shape,
            element,
            json,
        } => run_literal(value, shape, element, json),
        Commands::Docs => {
            print!("{}", cli::get_docs_overview());
            Ok(())
        }
        Commands::Doc { category } => match cli::get_doc_category(&category) {
            Ok(content) => {
                print!("{}", content);
                Ok(())
            }
            Err(e) => Err(e),
        },
    };

    if let Err(e) = result {
        eprintln!("{}", e);
        std::process::exit(1);
    }
}

fn init_tracing(verbose: bool) {
    let default = if verbose {
        "topk_query=debug"
    } else {
        "topk_query=warn"
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .init();
}

fn read_input(input: Option<String>) -> Result<Option<String>, CliError> {
    match input {
        Some(s) => Ok(Some(s)),
        None if !atty::is(atty::Stream::Stdin) => {
            let mut buffer = String::new();
            io::stdin().read_to_string(&mut buffer)?;
            Ok(Some(buffer))
        }
        None => Ok(None),
    }
}

fn run_check(input: Option<String>, json: bool, pretty: bool) -> Result<(), CliError> {
    let options = CheckOptions {
        input: read_input(input)?,
        json,
        pretty,
    };

    let report = cli::execute_check(&options)?;
    println!("{}", report.output);
    if !json {
        eprintln!(
            "valid: {} stage(s), collector {}",
            report.stages, report.collector
        );
    }
    Ok(())
}

fn run_render(input: Option<String>, pretty: bool) -> Result<(), CliError> {
    let input = read_input(input)?.ok_or(CliError::NoInput)?;
    println!("{}", cli::execute_render(&input, pretty)?);
    Ok(())
}

fn run_literal(
    value: String,
    shape: LiteralShape,
    element: Option<String>,
    json: bool,
) -> Result<(), CliError> {
    let literal = cli::execute_literal(&LiteralOptions {
        value,
        shape,
        element,
    })?;
    if json {
        println!("{}", serde_json::to_string(&WireLiteral::from(&literal))?);
    } else {
        println!("{}", literal);
    }
    Ok(())
}
