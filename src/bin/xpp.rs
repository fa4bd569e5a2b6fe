//! xpp CLI - macro preprocessor and formatter for TeX-like markup

#[cfg(feature = "cli")]
use clap::{ArgAction, Parser};
#[cfg(feature = "cli")]
use std::io::{self, Read, Write};
#[cfg(feature = "cli")]
use std::path::{Path, PathBuf};
#[cfg(feature = "cli")]
use std::process::ExitCode;
#[cfg(feature = "cli")]
use xpp::{FormatOptions, Options, RunMode, StdFileResolver, XppError, XppResult};

#[cfg(feature = "cli")]
#[derive(Parser)]
#[command(name = "xpp")]
#[command(version)]
#[command(about = "xpp - macro preprocessor and formatter for TeX-like markup", long_about = None)]
struct Cli {
    /// Input file path (reads from stdin if not provided)
    input_file: Option<String>,

    /// Output file path (writes to stdout if not provided)
    #[arg(short, long)]
    output: Option<String>,

    /// Reformat the document instead of expanding macros
    #[arg(short = 'f', long)]
    format: bool,

    /// Target line width for --format
    #[arg(short = 'w', long, default_value_t = 100)]
    width: usize,

    /// Extra environment to indent like a list (repeatable)
    #[arg(long = "list-env", value_name = "NAME")]
    list_env: Vec<String>,

    /// Extra directory to search for \Include files (repeatable)
    #[arg(short = 'I', long = "include-dir", value_name = "DIR")]
    include_dirs: Vec<PathBuf>,

    /// Print the token stream as JSON lines and exit
    #[arg(long)]
    print_tokens: bool,

    /// Increase log verbosity (-v debug, -vv trace)
    #[arg(short, long, action = ArgAction::Count)]
    verbose: u8,
}

#[cfg(feature = "cli")]
fn main() -> ExitCode {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    match run(&cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("error: {}", err);
            ExitCode::FAILURE
        }
    }
}

#[cfg(feature = "cli")]
fn init_logging(verbose: u8) {
    let level = match verbose {
        0 => log::LevelFilter::Warn,
        1 => log::LevelFilter::Debug,
        _ => log::LevelFilter::Trace,
    };
    env_logger::Builder::new()
        .filter_level(level)
        .parse_default_env()
        .format_timestamp(None)
        .init();
}

#[cfg(feature = "cli")]
fn run(cli: &Cli) -> XppResult<()> {
    let (input, filename) = match cli.input_file {
        Some(ref path) => (std::fs::read_to_string(path)?, path.clone()),
        None => {
            let mut buffer = String::new();
            io::stdin().read_to_string(&mut buffer)?;
            (buffer, "<stdin>".to_string())
        }
    };

    let mut sink: Box<dyn Write> = match cli.output {
        Some(ref path) => Box::new(io::BufWriter::new(std::fs::File::create(path)?)),
        None => Box::new(io::stdout().lock()),
    };

    if cli.print_tokens {
        for token in xpp::tokenize(&input, &filename)? {
            let line = serde_json::to_string(&token).map_err(|e| XppError::Io {
                message: e.to_string(),
            })?;
            writeln!(sink, "{}", line)?;
        }
        sink.flush()?;
        return Ok(());
    }

    let mut format = FormatOptions::default().with_line_width(cli.width);
    for env in &cli.list_env {
        format = format.with_list_environment(env.as_str());
    }
    let options = Options {
        mode: if cli.format {
            RunMode::Format
        } else {
            RunMode::Transform
        },
        format,
        ..Options::default()
    };

    let mut resolver = match cli.input_file {
        Some(ref path) => match Path::new(path).parent() {
            Some(dir) if !dir.as_os_str().is_empty() => StdFileResolver::with_base_dir(dir),
            _ => StdFileResolver::new(),
        },
        None => StdFileResolver::new(),
    };
    for dir in &cli.include_dirs {
        resolver.add_search_path(dir);
    }

    xpp::run(&input, &filename, &options, &resolver, sink.as_mut())?;

    if let Some(ref path) = cli.output {
        eprintln!("✓ Output written to: {}", path);
    }
    Ok(())
}

#[cfg(not(feature = "cli"))]
fn main() {
    eprintln!("CLI feature not enabled. Build with --features cli");
    eprintln!();
    eprintln!("Usage:");
    eprintln!("  cargo install xpp --features cli");
    eprintln!("  xpp [OPTIONS] [INPUT_FILE]");
}
