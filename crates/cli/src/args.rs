use std::path::PathBuf;

use clonescan_core::{DetectOptions, MaskMode};

const HELP_TEXT: &str = concat!(
    "clonescan (token-based copy/paste detection)\n",
    "\n",
    "Usage:\n",
    "  clonescan [options] [root ...]\n",
    "\n",
    "Options:\n",
    "  --min-lines <n>      Minimum clone size in lines (default: 5)\n",
    "  --max-lines <n>      Reject clones larger than n lines (default: 1000)\n",
    "  --min-tokens <n>     Window width / minimum clone size in tokens (default: 50)\n",
    "  --max-size <n>       Reject clone sides larger than n bytes\n",
    "  --mode <m>           Mask mode: strict, mild or weak (default: mild)\n",
    "  --ignore-case        Case-insensitive mask keys\n",
    "  --json               Output JSON\n",
    "  --stats              Include statistic (JSON) or print to stderr\n",
    "  --exit-code          Exit non-zero when clones were found\n",
    "  --ignore-dir <name>  Add an ignored directory name (repeatable)\n",
    "  --no-gitignore       Do not respect .gitignore rules\n",
    "  -h, --help           Show help\n",
    "\n",
    "Examples:\n",
    "  clonescan .\n",
    "  clonescan --min-tokens 70 --mode weak src tests\n",
    "  clonescan --json --stats . > report.json\n",
    "\n"
);

#[derive(Debug, Clone)]
pub(crate) struct ParsedArgs {
    pub(crate) json: bool,
    pub(crate) stats: bool,
    pub(crate) exit_code: bool,
    pub(crate) respect_gitignore: bool,
    pub(crate) ignore_dirs: Vec<String>,
    pub(crate) roots: Vec<PathBuf>,
    pub(crate) options: DetectOptions,
}

pub(crate) fn print_help() {
    print!("{HELP_TEXT}");
}

fn parse_count(name: &str, raw: &str, min: usize) -> Result<usize, String> {
    let value = raw
        .parse::<usize>()
        .map_err(|_| format!("{name} must be an integer"))?;
    if value < min {
        return Err(format!("{name} must be >= {min}"));
    }
    Ok(value)
}

/// `Ok(None)` means help was requested.
pub(crate) fn parse_args(argv: &[String]) -> Result<Option<ParsedArgs>, String> {
    let mut roots: Vec<PathBuf> = Vec::new();
    let mut ignore_dirs: Vec<String> = Vec::new();
    let mut json = false;
    let mut stats = false;
    let mut exit_code = false;
    let mut respect_gitignore = true;
    let mut ignore_case = false;
    let mut min_lines: Option<usize> = None;
    let mut max_lines: Option<usize> = None;
    let mut min_tokens: Option<usize> = None;
    let mut max_size: Option<usize> = None;
    let mut mode: Option<MaskMode> = None;

    let mut i = 0;
    while i < argv.len() {
        let arg = &argv[i];
        if arg == "--" {
            roots.extend(argv[(i + 1)..].iter().map(PathBuf::from));
            break;
        }
        if arg == "--json" {
            json = true;
            i += 1;
            continue;
        }
        if arg == "--stats" {
            stats = true;
            i += 1;
            continue;
        }
        if arg == "--exit-code" {
            exit_code = true;
            i += 1;
            continue;
        }
        if arg == "--ignore-case" {
            ignore_case = true;
            i += 1;
            continue;
        }
        if arg == "--no-gitignore" {
            respect_gitignore = false;
            i += 1;
            continue;
        }
        if arg == "--min-lines" {
            let raw = argv.get(i + 1).ok_or("--min-lines requires a value")?;
            min_lines = Some(parse_count("--min-lines", raw, 1)?);
            i += 2;
            continue;
        }
        if arg == "--max-lines" {
            let raw = argv.get(i + 1).ok_or("--max-lines requires a value")?;
            max_lines = Some(parse_count("--max-lines", raw, 1)?);
            i += 2;
            continue;
        }
        if arg == "--min-tokens" {
            let raw = argv.get(i + 1).ok_or("--min-tokens requires a value")?;
            min_tokens = Some(parse_count("--min-tokens", raw, 1)?);
            i += 2;
            continue;
        }
        if arg == "--max-size" {
            let raw = argv.get(i + 1).ok_or("--max-size requires a value")?;
            max_size = Some(parse_count("--max-size", raw, 1)?);
            i += 2;
            continue;
        }
        if arg == "--mode" {
            let raw = argv.get(i + 1).ok_or("--mode requires a value")?;
            mode = Some(
                MaskMode::parse(raw).ok_or("--mode must be one of: strict, mild, weak")?,
            );
            i += 2;
            continue;
        }
        if arg == "--ignore-dir" {
            let value = argv.get(i + 1).ok_or("--ignore-dir requires a value")?;
            ignore_dirs.push(value.to_string());
            i += 2;
            continue;
        }
        if arg == "-h" || arg == "--help" {
            return Ok(None);
        }
        if arg.starts_with('-') {
            return Err(format!("Unknown option: {arg}"));
        }
        roots.push(PathBuf::from(arg));
        i += 1;
    }

    let mut options = DetectOptions {
        ignore_case,
        ..DetectOptions::default()
    };
    if let Some(min_lines) = min_lines {
        options.min_lines = min_lines;
    }
    if let Some(max_lines) = max_lines {
        options.max_lines = max_lines;
    }
    if let Some(min_tokens) = min_tokens {
        options.min_tokens = min_tokens;
    }
    if let Some(max_size) = max_size {
        options.max_size = Some(max_size);
    }
    if let Some(mode) = mode {
        options.mode = mode;
    }

    let roots = if roots.is_empty() {
        vec![PathBuf::from(".")]
    } else {
        roots
    };

    Ok(Some(ParsedArgs {
        json,
        stats,
        exit_code,
        respect_gitignore,
        ignore_dirs,
        roots,
        options,
    }))
}
