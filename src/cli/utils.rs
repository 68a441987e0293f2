//! Path checks run by clap while parsing arguments.

use std::path::{Path, PathBuf};

/// Accept only paths naming an existing regular file.
pub fn existing_file(input: &str) -> Result<PathBuf, String> {
    let path = PathBuf::from(input);
    if !path.is_file() {
        return Err(format!("{} is not a file", path.display()));
    }
    Ok(path)
}

/// Accept only paths that do not exist yet and whose directory does.
pub fn fresh_output(input: &str) -> Result<PathBuf, String> {
    let path = PathBuf::from(input);
    if path.exists() {
        return Err(format!("output file {} exists", path.display()));
    }
    let parent = match path.parent() {
        Some(p) if !p.as_os_str().is_empty() => p,
        _ => Path::new("."),
    };
    if !parent.is_dir() {
        return Err(format!("cannot put output in {}", parent.display()));
    }
    Ok(path)
}
