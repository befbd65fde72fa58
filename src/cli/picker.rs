//! Interactive data-file picker.
//!
//! Kept separate from clap parsing: clap handles flags and subcommands, the
//! picker provides the "run `forecast fit` and choose a file" flow when no
//! `--input` was given.
//!
//! The picker searches for observation files (`.tsv`, `.csv`, `.json`) under
//! the current working directory. `.txt` files are only listed when none of
//! those exist.

use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use crate::error::AppError;

/// Extensions the ingest layer can read.
pub const DATA_EXTENSIONS: [&str; 4] = ["txt", "tsv", "csv", "json"];

const DEFAULT_SEARCH_DEPTH: usize = 3;

/// Prompt the user to select an observation file from the current directory tree.
///
/// Accepts a number from the list or an explicit path; `q` cancels.
pub fn prompt_for_data_path() -> Result<PathBuf, AppError> {
    let files = discover_data_files();
    if files.is_empty() {
        return Err(AppError::new(
            2,
            "No data files found. Provide one with `--input <file>`.",
        ));
    }

    println!("Found {} data file(s):", files.len());
    for (idx, path) in files.iter().enumerate() {
        println!("{:>3}) {}", idx + 1, pretty_path(path));
    }

    loop {
        print!("Select a file by number (1-{}) or type a path (q to quit): ", files.len());
        io::stdout()
            .flush()
            .map_err(|e| AppError::new(2, format!("Failed to write prompt: {e}")))?;

        let mut input = String::new();
        let bytes = io::stdin()
            .read_line(&mut input)
            .map_err(|e| AppError::new(2, format!("Failed to read input: {e}")))?;

        if bytes == 0 {
            return Err(AppError::new(
                2,
                "No input received. Provide a data file with `--input <file>`.",
            ));
        }

        let input = input.trim();
        if input.eq_ignore_ascii_case("q") {
            return Err(AppError::new(2, "Canceled."));
        }

        if let Ok(choice) = input.parse::<usize>() {
            if (1..=files.len()).contains(&choice) {
                return validate_data_path(&files[choice - 1]);
            }
            println!("Invalid choice: {choice}. Enter a number between 1 and {}.", files.len());
            continue;
        }

        match validate_data_path(Path::new(input)) {
            Ok(path) => return Ok(path),
            Err(err) => println!("{err}"),
        }
    }
}

/// Validate that `path` is an existing file with a supported extension.
pub fn validate_data_path(path: &Path) -> Result<PathBuf, AppError> {
    if !path.exists() {
        return Err(AppError::new(
            2,
            format!("Data file not found: {}", path.display()),
        ));
    }
    if path.is_dir() {
        return Err(AppError::new(
            2,
            format!("Expected a file, got a directory: {}", path.display()),
        ));
    }
    if !has_data_extension(path) {
        return Err(AppError::new(
            2,
            format!(
                "Unsupported file type: {} (expected one of: {}).",
                path.display(),
                DATA_EXTENSIONS.join(", ")
            ),
        ));
    }

    Ok(path.to_path_buf())
}

/// Discover data files under the current directory, sorted by path.
pub fn discover_data_files() -> Vec<PathBuf> {
    find_data_files(Path::new("."), DEFAULT_SEARCH_DEPTH)
}

fn find_data_files(root: &Path, max_depth: usize) -> Vec<PathBuf> {
    let mut out = Vec::new();
    find_data_files_inner(root, 0, max_depth, &mut out);
    if out.iter().any(|p| !is_plain_text(p)) {
        out.retain(|p| !is_plain_text(p));
    }
    out.sort_by_key(|p| pretty_path(p));
    out
}

fn find_data_files_inner(root: &Path, depth: usize, max_depth: usize, out: &mut Vec<PathBuf>) {
    if depth > max_depth {
        return;
    }

    let Ok(entries) = fs::read_dir(root) else {
        return;
    };

    for entry in entries.flatten() {
        let path = entry.path();
        let Ok(file_type) = entry.file_type() else {
            continue;
        };

        if file_type.is_dir() {
            if !should_skip_dir(&path) {
                find_data_files_inner(&path, depth + 1, max_depth, out);
            }
        } else if file_type.is_file() && has_data_extension(&path) {
            out.push(path);
        }
    }
}

fn has_data_extension(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| DATA_EXTENSIONS.iter().any(|d| ext.eq_ignore_ascii_case(d)))
}

fn is_plain_text(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| ext.eq_ignore_ascii_case("txt"))
}

fn should_skip_dir(path: &Path) -> bool {
    let name = path.file_name().and_then(|s| s.to_str()).unwrap_or("");
    matches!(name, ".git" | "target" | "node_modules")
}

fn pretty_path(path: &Path) -> String {
    let stripped = path.strip_prefix("./").unwrap_or(path);
    stripped.display().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn finds_supported_files_and_skips_target() {
        let dir = tempfile::tempdir().unwrap();
        let root = dir.path();
        fs::create_dir_all(root.join("nested")).unwrap();
        fs::create_dir_all(root.join("target")).unwrap();
        for name in ["a.tsv", "b.JSON", "notes.md", "nested/c.csv", "README.txt", "target/d.csv"] {
            fs::write(root.join(name), "").unwrap();
        }

        let names: Vec<String> = find_data_files(root, 3)
            .iter()
            .map(|p| p.strip_prefix(root).unwrap().display().to_string())
            .collect();
        assert_eq!(names, vec!["a.tsv", "b.JSON", "nested/c.csv"]);
    }

    #[test]
    fn text_files_are_listed_only_without_other_data() {
        let dir = tempfile::tempdir().unwrap();
        let root = dir.path();
        fs::write(root.join("fans.txt"), "").unwrap();
        fs::write(root.join("LICENSE.txt"), "").unwrap();

        let names: Vec<String> = find_data_files(root, 3)
            .iter()
            .map(|p| p.strip_prefix(root).unwrap().display().to_string())
            .collect();
        assert_eq!(names, vec!["LICENSE.txt", "fans.txt"]);

        fs::write(root.join("fans.json"), "[]").unwrap();
        assert_eq!(find_data_files(root, 3).len(), 1);
    }

    #[test]
    fn validate_rejects_unknown_extension_and_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let md = dir.path().join("notes.md");
        fs::write(&md, "").unwrap();

        assert_eq!(validate_data_path(&md).unwrap_err().exit_code(), 2);
        assert!(validate_data_path(&dir.path().join("missing.tsv")).is_err());
        assert!(validate_data_path(dir.path()).is_err());
    }
}
