use std::ffi::OsString;
use std::path::{Path, PathBuf};
use std::process::Output;
use std::time::Duration;

use tokio::process::Command;
use tracing::{debug, warn};

use crate::models::BackupError;

/// Searched after `PG_BIN_DIR` and `PATH`.
pub const WELL_KNOWN_DIRS: &[&str] = &[
    "/usr/bin",
    "/usr/local/bin",
    "/usr/lib/postgresql/16/bin",
    "/usr/lib/postgresql/15/bin",
    "/usr/lib/postgresql/14/bin",
];

/// Finds a PostgreSQL client binary such as `pg_dump` or `psql`.
pub fn locate_tool(name: &str, pg_bin_dir: Option<&str>) -> Option<PathBuf> {
    locate_in(name, pg_bin_dir, std::env::var_os("PATH"), WELL_KNOWN_DIRS)
}

pub(crate) fn locate_in(
    name: &str,
    pg_bin_dir: Option<&str>,
    path_var: Option<OsString>,
    well_known: &[&str],
) -> Option<PathBuf> {
    let file_name = format!("{}{}", name, std::env::consts::EXE_SUFFIX);

    let mut candidates: Vec<PathBuf> = Vec::new();
    if let Some(dir) = pg_bin_dir.filter(|d| !d.is_empty()) {
        candidates.push(PathBuf::from(dir));
    }
    if let Some(path) = path_var {
        candidates.extend(std::env::split_paths(&path));
    }
    candidates.extend(well_known.iter().map(PathBuf::from));

    let found = candidates
        .into_iter()
        .map(|dir| dir.join(&file_name))
        .find(|candidate| candidate.is_file());

    match &found {
        Some(path) => debug!("Using {} at {}", name, path.display()),
        None => warn!("{} not found in PG_BIN_DIR, PATH or default locations", name),
    }
    found
}

/// Connection flags shared by `pg_dump` and `psql`.
pub(crate) fn connection_args(host: &str, port: &str, user: &str, database: &str) -> Vec<String> {
    vec![
        "-h".to_string(),
        host.to_string(),
        "-p".to_string(),
        port.to_string(),
        "-U".to_string(),
        user.to_string(),
        "-d".to_string(),
        database.to_string(),
    ]
}

/// Runs a client tool non-interactively, killing it when the timeout elapses.
pub(crate) async fn run_tool(
    tool: &Path,
    args: &[String],
    password: &str,
    timeout_secs: u64,
) -> Result<Output, BackupError> {
    let tool_name = tool
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| tool.display().to_string());

    let mut command = Command::new(tool);
    command
        .args(args)
        .arg("-w")
        .arg("--no-password")
        .env("PGPASSWORD", password)
        .env("PGCLIENTENCODING", "UTF-8")
        .env("LANG", "en_US.UTF-8")
        .kill_on_drop(true);

    debug!("Running {} with {} arguments", tool_name, args.len());
    let output = tokio::time::timeout(Duration::from_secs(timeout_secs), command.output())
        .await
        .map_err(|_| BackupError::Timeout(timeout_secs))??;

    if output.status.success() {
        Ok(output)
    } else {
        Err(BackupError::CommandFailed {
            tool: tool_name,
            stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs::File;
    use tempfile::tempdir;

    fn touch(dir: &Path, name: &str) -> PathBuf {
        let path = dir.join(format!("{}{}", name, std::env::consts::EXE_SUFFIX));
        File::create(&path).unwrap();
        path
    }

    #[test]
    fn pg_bin_dir_wins_over_path() {
        let configured = tempdir().unwrap();
        let on_path = tempdir().unwrap();
        let expected = touch(configured.path(), "pg_dump");
        touch(on_path.path(), "pg_dump");

        let found = locate_in(
            "pg_dump",
            configured.path().to_str(),
            Some(on_path.path().as_os_str().to_owned()),
            &[],
        );
        assert_eq!(found, Some(expected));
    }

    #[test]
    fn falls_back_to_path_then_well_known_dirs() {
        let on_path = tempdir().unwrap();
        let fallback = tempdir().unwrap();
        let psql = touch(on_path.path(), "psql");
        let pg_dump = touch(fallback.path(), "pg_dump");
        let fallback_dir = fallback.path().to_str().unwrap();

        let path_var = Some(on_path.path().as_os_str().to_owned());
        assert_eq!(
            locate_in("psql", Some("/nonexistent"), path_var.clone(), &[fallback_dir]),
            Some(psql)
        );
        assert_eq!(
            locate_in("pg_dump", None, path_var, &[fallback_dir]),
            Some(pg_dump)
        );
    }

    #[test]
    fn missing_tool_is_none() {
        let empty = tempdir().unwrap();
        let found = locate_in(
            "pg_dump",
            empty.path().to_str(),
            Some(empty.path().as_os_str().to_owned()),
            &[],
        );
        assert!(found.is_none());
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn failing_tool_reports_stderr() {
        let args = vec!["-c".to_string(), "echo 'role does not exist' >&2; exit 2".to_string()];

        let result = run_tool(Path::new("/bin/sh"), &args, "secret", 5).await;

        match result {
            Err(BackupError::CommandFailed { tool, stderr }) => {
                assert_eq!(tool, "sh");
                assert_eq!(stderr, "role does not exist");
            }
            other => panic!("expected CommandFailed, got {:?}", other.map(|o| o.status)),
        }
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn tool_sees_password_and_encoding() {
        let args = vec![
            "-c".to_string(),
            "[ \"$PGPASSWORD\" = secret ] && [ \"$PGCLIENTENCODING\" = UTF-8 ]".to_string(),
        ];

        assert!(run_tool(Path::new("/bin/sh"), &args, "secret", 5).await.is_ok());
    }

    #[test]
    fn connection_args_follow_flag_order() {
        let args = connection_args("db", "5433", "clinic", "clinica");
        assert_eq!(args, ["-h", "db", "-p", "5433", "-U", "clinic", "-d", "clinica"]);
    }
}
