use std::collections::{BTreeMap, HashMap, HashSet};
use std::fs;
use std::io;
use std::path::PathBuf;

use ignore::WalkBuilder;

use clonescan_core::SourceFile;

pub(crate) fn default_ignore_dirs() -> HashSet<String> {
    [
        ".git",
        ".hg",
        ".svn",
        "node_modules",
        "target",
        "dist",
        "build",
        "out",
        ".next",
        ".turbo",
        ".cache",
    ]
    .into_iter()
    .map(str::to_string)
    .collect()
}

pub(crate) struct DiscoverOptions {
    pub(crate) ignore_dirs: HashSet<String>,
    pub(crate) respect_gitignore: bool,
}

fn validate_roots(roots: &[PathBuf]) -> io::Result<()> {
    for root in roots {
        let meta = fs::metadata(root)
            .map_err(|err| io::Error::new(err.kind(), format!("root {}: {err}", root.display())))?;
        if !meta.is_dir() {
            return Err(io::Error::new(
                io::ErrorKind::InvalidInput,
                format!("root {} is not a directory", root.display()),
            ));
        }
    }
    Ok(())
}

/// Walk the roots and produce one record per recognized source file.
/// Extensions resolve to formats through `format_exts`; files with unknown
/// extensions are skipped silently, unreadable files with a warning. The
/// result is sorted by id so detection order is stable across runs.
pub(crate) fn discover_sources(
    roots: &[PathBuf],
    format_exts: &BTreeMap<String, Vec<String>>,
    options: &DiscoverOptions,
) -> io::Result<Vec<SourceFile>> {
    validate_roots(roots)?;

    let mut ext_to_format: HashMap<&str, &str> = HashMap::new();
    for (format, exts) in format_exts {
        for ext in exts {
            ext_to_format.entry(ext.as_str()).or_insert(format.as_str());
        }
    }

    let mut files = Vec::new();
    for root in roots {
        let ignore_dirs = options.ignore_dirs.clone();
        let mut builder = WalkBuilder::new(root);
        builder
            .hidden(false)
            .follow_links(false)
            .ignore(false)
            .git_ignore(options.respect_gitignore)
            .parents(false)
            .require_git(false);

        let walker = builder
            .filter_entry(move |entry| {
                if entry.depth() == 0 {
                    return true;
                }
                if !entry.file_type().is_some_and(|ft| ft.is_dir()) {
                    return true;
                }
                entry
                    .file_name()
                    .to_str()
                    .is_none_or(|name| !ignore_dirs.contains(name))
            })
            .build();

        for result in walker {
            let entry = match result {
                Ok(entry) => entry,
                Err(err) => {
                    tracing::warn!(%err, "walk error; skipping entry");
                    continue;
                }
            };
            if !entry.file_type().is_some_and(|ft| ft.is_file()) {
                continue;
            }
            let path = entry.into_path();

            let Some(format) = path
                .extension()
                .and_then(|ext| ext.to_str())
                .map(|ext| ext.to_ascii_lowercase())
                .and_then(|ext| ext_to_format.get(ext.as_str()).copied())
            else {
                continue;
            };

            let bytes = match fs::read(&path) {
                Ok(bytes) => bytes,
                Err(err) => {
                    tracing::warn!(path = %path.display(), %err, "unreadable file; skipping");
                    continue;
                }
            };
            let source = String::from_utf8_lossy(&bytes).into_owned();
            let id = path.to_string_lossy().into_owned();
            files.push(SourceFile::new(id, format, source));
        }
    }

    files.sort_by(|a, b| a.id.cmp(&b.id));
    Ok(files)
}
