use std::collections::HashMap;
use std::env as stdenv;
use std::path::PathBuf;

/// Snapshot of the process environment used by the interpreter.
///
/// `{$NAME}` placeholders resolve against `vars`, and external processes are
/// spawned with these variables and `current_dir`. Keeping a mutable copy
/// instead of reading the process tables directly lets tests inject variables
/// without touching global state.
#[derive(Debug, Clone)]
pub struct Environment {
    /// Environment variables visible to substitution and child processes.
    pub vars: HashMap<String, String>,
    /// Working directory for external command execution.
    pub current_dir: PathBuf,
}

impl Environment {
    /// Capture the current process environment.
    pub fn new() -> Self {
        let vars = stdenv::vars().collect();
        let current_dir = stdenv::current_dir().unwrap_or_else(|_| PathBuf::from("."));
        Self { vars, current_dir }
    }

    /// Look up an environment variable, falling back to the live process
    /// environment for variables set after the snapshot was taken.
    pub fn get_var(&self, key: &str) -> Option<String> {
        self.vars
            .get(key)
            .cloned()
            .or_else(|| stdenv::var(key).ok())
    }

    /// Set or override a variable in this snapshot only.
    pub fn set_var(&mut self, key: impl Into<String>, val: impl Into<String>) {
        self.vars.insert(key.into(), val.into());
    }
}

impl Default for Environment {
    fn default() -> Self {
        Self::new()
    }
}
