use std::io;
use std::path::PathBuf;
use std::process::ExitCode;
use std::time::Duration;

use clap::Parser;
use indicatif::ProgressBar;
use rayon::prelude::*;

use jflat::{parse_path, parse_source, sorted_object, ClassificationPolicy, Config, Outcome};

#[derive(Parser, Debug)]
#[clap(name = "jflat", version)]
/// Normalize the top-level fields of JSON documents
struct Cli {
    #[clap(short, long, action=clap::ArgAction::SetTrue, default_value_t = false)]
    /// Record flattened object and array fields
    diagnostic: bool,

    #[clap(short, long, value_enum, default_value_t = ClassificationPolicy::Reference)]
    /// Which scalar values are captured
    policy: ClassificationPolicy,

    /// Documents to read, standard input when none are given
    files: Vec<PathBuf>,
}

fn main() -> ExitCode {
    env_logger::Builder::from_env(env_logger::Env::default().filter_or("JFLAT_LOG", "warn"))
        .init();

    let args = Cli::parse();
    let config = Config::new()
        .with_diagnostic_mode(args.diagnostic)
        .with_policy(args.policy);

    // Initialize spinner
    let spinner = ProgressBar::new_spinner().with_message("Reading input…");
    spinner.enable_steady_tick(Duration::from_millis(100));

    // Each input gets its own session so they can run in parallel
    let outcomes: Vec<(Option<&PathBuf>, Outcome)> = if args.files.is_empty() {
        vec![(None, parse_source(io::stdin(), config))]
    } else {
        args.files
            .par_iter()
            .map(|path| (Some(path), parse_path(path, config)))
            .collect()
    };

    // Remove spinner
    spinner.finish_and_clear();

    let mut failed = false;
    for (path, outcome) in &outcomes {
        let rendered = sorted_object(outcome.fields()).dump();
        let label = match path {
            Some(path) => path.display().to_string(),
            None => "<stdin>".to_owned(),
        };

        if args.files.len() > 1 {
            println!("{}: {}", label, rendered);
        } else {
            println!("{}", rendered);
        }

        if let Some(error) = outcome.failure() {
            eprintln!("{}: {}", label, error);
            failed = true;
        }
    }

    if failed {
        ExitCode::FAILURE
    } else {
        ExitCode::SUCCESS
    }
}
