mod test_runner;

use std::path::Path;
use std::process;

use clap::{ArgAction, Parser, Subcommand};
use codespan_reporting::files::SimpleFiles;
use codespan_reporting::term;
use codespan_reporting::term::termcolor::{ColorChoice, StandardStream};

use scenario::ScenarioDiagnostic;

const SUBCOMMANDS: &[&str] = &["run", "test", "help"];

#[derive(Parser)]
#[command(name = "quantum", version, about = "Replay scope resolution scenarios")]
struct Cli {
    /// Disable colored output
    #[arg(long, global = true)]
    no_color: bool,

    /// More log output (-v info, -vv debug, -vvv trace)
    #[arg(short, long, action = ArgAction::Count, global = true)]
    verbose: u8,

    /// Only log errors
    #[arg(short, long, global = true, conflicts_with = "verbose")]
    quiet: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Run a scenario and print the resulting chains
    Run(RunArgs),

    /// Run .test.toml scenario tests
    Test(TestArgs),
}

#[derive(clap::Args)]
struct RunArgs {
    /// Scenario file to replay
    file: String,

    /// Parse only, don't replay (exit 0 if valid)
    #[arg(long)]
    check: bool,

    /// Don't print the chain report
    #[arg(long)]
    no_report: bool,

    /// Treat warnings as errors
    #[arg(long)]
    deny_warnings: bool,
}

#[derive(clap::Args)]
struct TestArgs {
    /// Path to a .test.toml file or directory containing them
    path: String,

    /// Run only tests in these categories (subfolder names). Repeatable.
    #[arg(short, long)]
    category: Vec<String>,

    /// List available categories and exit
    #[arg(long)]
    list_categories: bool,
}

fn main() {
    // `quantum file.toml` runs the file.
    let mut args: Vec<String> = std::env::args().collect();
    let first = args
        .iter()
        .enumerate()
        .skip(1)
        .find(|(_, a)| !a.starts_with('-'))
        .map(|(i, a)| (i, a.clone()));
    if let Some((index, first)) = first {
        if !SUBCOMMANDS.contains(&first.as_str()) {
            args.insert(index, "run".to_string());
        }
    }

    let cli = Cli::parse_from(&args);
    init_logging(&cli);

    match cli.command {
        Command::Run(run_args) => do_run(run_args, cli.no_color),
        Command::Test(test_args) => {
            let path = Path::new(&test_args.path);
            if test_args.list_categories {
                test_runner::list_categories(path);
                return;
            }
            let exit_code = test_runner::run_tests(path, cli.no_color, &test_args.category);
            process::exit(exit_code);
        }
    }
}

fn init_logging(cli: &Cli) {
    let level = if cli.quiet {
        tracing::Level::ERROR
    } else {
        match cli.verbose {
            0 => tracing::Level::WARN,
            1 => tracing::Level::INFO,
            2 => tracing::Level::DEBUG,
            _ => tracing::Level::TRACE,
        }
    };
    let _ = tracing_subscriber::fmt()
        .with_max_level(level)
        .with_writer(std::io::stderr)
        .with_ansi(!cli.no_color)
        .without_time()
        .try_init();
}

fn do_run(args: RunArgs, no_color: bool) {
    let color_choice = if no_color {
        ColorChoice::Never
    } else {
        ColorChoice::Auto
    };
    let writer = StandardStream::stderr(color_choice);
    let config = term::Config::default();

    let source = match std::fs::read_to_string(&args.file) {
        Ok(s) => s,
        Err(e) => {
            eprintln!("error: cannot read '{}': {}", args.file, e);
            process::exit(1);
        }
    };

    let mut files = SimpleFiles::new();
    let file_id = files.add(args.file.clone(), source.clone());

    let parsed = match scenario::parse_scenario(&source, file_id) {
        Ok(parsed) => parsed,
        Err(diagnostic) => {
            emit(&writer, &config, &files, &diagnostic);
            process::exit(1);
        }
    };

    if args.check {
        eprintln!(
            "ok: {} parsed successfully ({} blocks, {} steps)",
            args.file,
            parsed.blocks.len(),
            parsed.steps.len()
        );
        return;
    }

    let execution = match scenario::execute(&parsed, file_id) {
        Ok(execution) => execution,
        Err(diagnostic) => {
            emit(&writer, &config, &files, &diagnostic);
            process::exit(1);
        }
    };

    for warning in &execution.warnings {
        emit(&writer, &config, &files, warning);
    }
    if !args.no_report {
        print!("{}", execution.render());
    }
    if args.deny_warnings && !execution.warnings.is_empty() {
        eprintln!(
            "error: {} warning(s) with --deny-warnings",
            execution.warnings.len()
        );
        process::exit(1);
    }
}

fn emit(
    writer: &StandardStream,
    config: &term::Config,
    files: &SimpleFiles<String, String>,
    diagnostic: &ScenarioDiagnostic,
) {
    if diagnostic.span.is_some() {
        let _ = term::emit_to_write_style(
            &mut writer.lock(),
            config,
            files,
            &diagnostic.to_diagnostic(),
        );
    } else {
        let prefix = if diagnostic.is_warning {
            "warning"
        } else {
            "error"
        };
        eprintln!("{}: {}", prefix, diagnostic);
    }
}
