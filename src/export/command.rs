//! External programs run after writing notes: the editor and git.

use std::env;
use std::ffi::OsStr;
use std::path::Path;
use std::process::Command;

use crate::error::{Error, Result};

/// Editor from `$VISUAL`, then `$EDITOR`, falling back to `vi`.
pub fn editor_command() -> String {
    ["VISUAL", "EDITOR"]
        .iter()
        .filter_map(|var| env::var(var).ok())
        .find(|value| !value.trim().is_empty())
        .unwrap_or_else(|| "vi".to_string())
}

/// Open `path` in the user's editor and wait for it to exit.
pub fn open_in_editor(path: &Path) -> Result<()> {
    let editor = editor_command();
    let mut parts = editor.split_whitespace();
    let program = parts.next().unwrap_or("vi");

    let status = Command::new(program)
        .args(parts)
        .arg(path)
        .status()
        .map_err(|e| Error::Command {
            command: editor.clone(),
            message: e.to_string(),
        })?;
    if !status.success() {
        return Err(Error::Command {
            command: editor,
            message: format!("exited with {status}"),
        });
    }
    Ok(())
}

/// Stage `files` and commit them in the repository containing `folder`.
pub fn commit_files(folder: &Path, files: &[&Path], message: &str) -> Result<()> {
    let mut add: Vec<&OsStr> = vec![OsStr::new("add")];
    add.extend(files.iter().map(|f| f.as_os_str()));
    run_git(folder, &add)?;
    run_git(
        folder,
        &[OsStr::new("commit"), OsStr::new("-m"), OsStr::new(message)],
    )
}

fn run_git(folder: &Path, args: &[&OsStr]) -> Result<()> {
    let command = format!(
        "git {}",
        args.first().map(|a| a.to_string_lossy()).unwrap_or_default()
    );
    let output = Command::new("git")
        .current_dir(folder)
        .args(args)
        .output()
        .map_err(|e| Error::Command {
            command: command.clone(),
            message: e.to_string(),
        })?;
    if !output.status.success() {
        return Err(Error::Command {
            command,
            message: String::from_utf8_lossy(&output.stderr).trim().to_string(),
        });
    }
    log::debug!("{command} in {}", folder.display());
    Ok(())
}
