//! External process execution for `invoke $program(...)`.

use crate::diag::{DiagnosticSink, Severity};
use crate::env::Environment;
use std::borrow::Cow;
use std::ffi::OsStr;
use std::path::{Path, PathBuf};
use std::process::{Command, ExitStatus, Stdio};

/// Conventional exit code when the program could not be found or launched.
const LAUNCH_FAILURE: i32 = 127;

/// Run `program` as a child process with the given (already substituted)
/// arguments, inheriting stdin/stdout/stderr, and wait for it to finish.
///
/// Both failure outcomes degrade to diagnostics: a nonzero exit is reported
/// with its status, and a program that cannot be resolved or spawned is
/// reported as a launch failure. Neither aborts the interpretation; the
/// returned code is only used for trace logging. A hung child blocks the
/// whole interpreter, by contract.
pub fn run(
    env: &Environment,
    program: &str,
    args: &[String],
    sink: &dyn DiagnosticSink,
    line: Option<usize>,
) -> i32 {
    let search_paths = env.get_var("PATH").unwrap_or_default();
    let Some(executable) = resolve_program(OsStr::new(&search_paths), Path::new(program)) else {
        sink.report(
            Severity::Error,
            &format!("external command not found: '{}'", program),
            line,
        );
        return LAUNCH_FAILURE;
    };

    let spawned = Command::new(executable.as_ref())
        .args(args)
        .envs(env.vars.iter().map(|(k, v)| (k.as_str(), v.as_str())))
        .current_dir(&env.current_dir)
        .stdin(Stdio::inherit())
        .stdout(Stdio::inherit())
        .stderr(Stdio::inherit())
        .spawn();

    let mut child = match spawned {
        Ok(child) => child,
        Err(err) => {
            sink.report(
                Severity::Error,
                &format!("failed to execute external command '{}': {}", program, err),
                line,
            );
            return LAUNCH_FAILURE;
        }
    };

    match child.wait() {
        Ok(status) => {
            let code = exit_code(status);
            if code != 0 {
                sink.report(
                    Severity::Error,
                    &format!("external command '{}' failed with exit code {}", program, code),
                    line,
                );
            }
            code
        }
        Err(err) => {
            sink.report(
                Severity::Error,
                &format!("failed to wait for external command '{}': {}", program, err),
                line,
            );
            LAUNCH_FAILURE
        }
    }
}

fn exit_code(status: ExitStatus) -> i32 {
    match status.code() {
        Some(code) => code,
        None => terminated_by_signal(status),
    }
}

#[cfg(unix)]
fn terminated_by_signal(status: ExitStatus) -> i32 {
    use std::os::unix::process::ExitStatusExt;
    match status.signal() {
        Some(signal) => 128 + signal,
        None => -1,
    }
}

#[cfg(not(unix))]
fn terminated_by_signal(_status: ExitStatus) -> i32 {
    -1
}

/// Resolve a program name the way a shell would.
///
/// An absolute path or a path with more than one component is used as given,
/// if it exists. A `./`-prefixed name is checked in the working directory. A
/// bare name is searched through the directories in `search_paths` (PATH), in
/// order, and the first existing match wins.
pub fn resolve_program<'a>(search_paths: &OsStr, program: &'a Path) -> Option<Cow<'a, Path>> {
    if program.as_os_str().is_empty() {
        return None;
    }

    if program.is_absolute() {
        return program.exists().then(|| Cow::Borrowed(program));
    }

    if program.starts_with("./") && program.exists() {
        return Some(Cow::Borrowed(program));
    }

    if program.components().count() > 1 {
        return program.exists().then(|| Cow::Borrowed(program));
    }

    search_in_path(search_paths, program.as_os_str()).map(Cow::Owned)
}

fn search_in_path(search_paths: &OsStr, name: &OsStr) -> Option<PathBuf> {
    std::env::split_paths(search_paths)
        .map(|dir| dir.join(name))
        .find(|candidate| candidate.exists())
}
