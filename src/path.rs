use std::path::{Component, Path, PathBuf};

use thiserror::Error;

#[derive(Debug, Error)]
pub enum PathError {
    #[error("path must not be empty")]
    Empty,

    #[error("cannot expand '{path}': home directory is unavailable")]
    HomeDirUnavailable { path: String },

    #[error("cannot resolve '{path}' against the current directory: {source}")]
    CurrentDir {
        path: String,
        #[source]
        source: std::io::Error,
    },
}

/// Resolves a user supplied path to an absolute one.
///
/// Expands a leading `~`, joins relative paths onto the current directory and
/// folds `.`/`..` segments. The path does not have to exist.
pub fn normalize(path: &str) -> Result<PathBuf, PathError> {
    if path.is_empty() {
        return Err(PathError::Empty);
    }

    let expanded = expand_home(path)?;

    let absolute = if expanded.is_absolute() {
        expanded
    } else {
        let cwd = std::env::current_dir().map_err(|source| PathError::CurrentDir {
            path: path.to_string(),
            source,
        })?;
        cwd.join(expanded)
    };

    Ok(clean(&absolute))
}

fn expand_home(path: &str) -> Result<PathBuf, PathError> {
    let rest = match path.strip_prefix('~') {
        Some("") => "",
        Some(rest) if rest.starts_with('/') || rest.starts_with(std::path::MAIN_SEPARATOR) => {
            &rest[1..]
        }
        // NOTE: `~user` is left alone
        _ => return Ok(PathBuf::from(path)),
    };

    let home = dirs::home_dir().ok_or_else(|| PathError::HomeDirUnavailable {
        path: path.to_string(),
    })?;

    Ok(if rest.is_empty() { home } else { home.join(rest) })
}

fn clean(path: &Path) -> PathBuf {
    let mut out = PathBuf::new();
    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                // popping past the root keeps the root
                out.pop();
            }
            other => out.push(other.as_os_str()),
        }
    }
    out
}
