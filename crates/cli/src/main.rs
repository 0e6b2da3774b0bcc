mod args;
mod discover;
mod json;
mod text;

use std::env;

use anyhow::{Context, Result};
use clonescan_core::{DetectionResult, Driver, MemoryStore};

fn main() {
    let argv: Vec<String> = env::args().skip(1).collect();
    let parsed = match args::parse_args(&argv) {
        Ok(Some(parsed)) => parsed,
        Ok(None) => {
            args::print_help();
            return;
        }
        Err(message) => {
            eprintln!("Error: {message}\n");
            args::print_help();
            std::process::exit(2);
        }
    };

    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    match run(&parsed) {
        Ok(exit_code) => std::process::exit(exit_code),
        Err(err) => {
            eprintln!("Error: {err:#}");
            std::process::exit(1);
        }
    }
}

fn run(parsed: &args::ParsedArgs) -> Result<i32> {
    let mut ignore_dirs = discover::default_ignore_dirs();
    ignore_dirs.extend(parsed.ignore_dirs.iter().cloned());

    let sources = discover::discover_sources(
        &parsed.roots,
        &parsed.options.format_exts,
        &discover::DiscoverOptions {
            ignore_dirs,
            respect_gitignore: parsed.respect_gitignore,
        },
    )
    .context("file discovery failed")?;

    let driver = Driver::new(parsed.options.clone(), Box::new(MemoryStore::new()))?;
    let result = driver.run(&sources)?;

    output(parsed, &result)?;

    if parsed.exit_code && !result.clones.is_empty() {
        return Ok(1);
    }
    Ok(0)
}

fn output(parsed: &args::ParsedArgs, result: &DetectionResult) -> Result<()> {
    if parsed.json {
        if parsed.stats {
            json::write_json(&json::JsonReport {
                clones: &result.clones,
                statistic: &result.statistic,
            })?;
        } else {
            json::write_json(&json::JsonClones {
                clones: &result.clones,
            })?;
        }
    } else {
        print!("{}", text::format_clones(&result.clones));
        if parsed.stats {
            eprint!("{}", text::format_statistic(&result.statistic));
        }
    }
    Ok(())
}
