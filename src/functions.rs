//! In-process function registries backing the invocation resolver.
//!
//! Bare-name resolution is a chain of [`FunctionResolver`]s tried in order,
//! locally registered functions before built-ins so user-supplied behavior can
//! shadow the standard set. Dotted names resolve through [`NativeModules`],
//! a curated two-level namespace, never by reflecting into anything global.

use crate::env::Environment;
use anyhow::{Result, anyhow};
use std::collections::HashMap;
use std::io::Write;
use std::path::{Path, PathBuf};

/// A host-registered script function: positional string arguments in, textual
/// result out.
pub type ScriptFn = Box<dyn Fn(&[String]) -> Result<String>>;

/// Resolves a bare call target to an in-process callable.
///
/// `None` means "not my name, try the next resolver"; `Some` means the call
/// was handled, successfully or not. The textual result is only used for
/// diagnostic logging.
pub trait FunctionResolver {
    fn try_call(
        &self,
        env: &Environment,
        name: &str,
        args: &[String],
        out: &mut dyn Write,
    ) -> Option<Result<String>>;
}

/// Functions registered by the embedding application.
///
/// The script language itself cannot define functions, so this registry is
/// empty unless the host populates it through
/// [`Interpreter::register_function`](crate::Interpreter::register_function).
#[derive(Default)]
pub struct LocalFunctions {
    funcs: HashMap<String, ScriptFn>,
}

impl LocalFunctions {
    pub fn register(&mut self, name: impl Into<String>, func: ScriptFn) {
        self.funcs.insert(name.into(), func);
    }
}

impl FunctionResolver for LocalFunctions {
    fn try_call(
        &self,
        _env: &Environment,
        name: &str,
        args: &[String],
        _out: &mut dyn Write,
    ) -> Option<Result<String>> {
        self.funcs.get(name).map(|f| f(args))
    }
}

type NativeFn = fn(&[String]) -> Result<String>;

/// Curated dotted-name namespace: `module.function` calls resolve here.
///
/// Modules are registered at startup and read-only afterwards; there is no
/// dynamic loading, which keeps `invoke str.upper(...)` from ever reaching
/// outside this allowlist.
pub struct NativeModules {
    modules: HashMap<&'static str, HashMap<&'static str, NativeFn>>,
}

impl NativeModules {
    /// The standard module set: `str` for text transforms, `path` for path
    /// assembly.
    pub fn standard() -> Self {
        let mut modules: HashMap<&'static str, HashMap<&'static str, NativeFn>> = HashMap::new();

        let mut str_mod: HashMap<&'static str, NativeFn> = HashMap::new();
        str_mod.insert("upper", str_upper);
        str_mod.insert("lower", str_lower);
        str_mod.insert("trim", str_trim);
        str_mod.insert("len", str_len);
        modules.insert("str", str_mod);

        let mut path_mod: HashMap<&'static str, NativeFn> = HashMap::new();
        path_mod.insert("join", path_join);
        path_mod.insert("basename", path_basename);
        modules.insert("path", path_mod);

        Self { modules }
    }

    /// Fetch a module's member table, if the module exists.
    pub fn import(&self, module: &str) -> Option<&HashMap<&'static str, NativeFn>> {
        self.modules.get(module)
    }

    /// Import `module`, fetch `function`, and call it. Failures name the part
    /// that did not resolve.
    pub fn call(&self, module: &str, function: &str, args: &[String]) -> Result<String> {
        let members = self
            .import(module)
            .ok_or_else(|| anyhow!("module '{}' is not available", module))?;
        let func = members
            .get(function)
            .ok_or_else(|| anyhow!("module '{}' has no function '{}'", module, function))?;
        func(args)
    }
}

fn str_upper(args: &[String]) -> Result<String> {
    Ok(args.join(" ").to_uppercase())
}

fn str_lower(args: &[String]) -> Result<String> {
    Ok(args.join(" ").to_lowercase())
}

fn str_trim(args: &[String]) -> Result<String> {
    Ok(args.join(" ").trim().to_string())
}

fn str_len(args: &[String]) -> Result<String> {
    Ok(args.join(" ").chars().count().to_string())
}

fn path_join(args: &[String]) -> Result<String> {
    let (first, rest) = args
        .split_first()
        .ok_or_else(|| anyhow!("path.join: expected at least one segment"))?;
    let mut path = PathBuf::from(first);
    for segment in rest {
        path.push(segment);
    }
    Ok(path.to_string_lossy().into_owned())
}

fn path_basename(args: &[String]) -> Result<String> {
    let path = args
        .first()
        .ok_or_else(|| anyhow!("path.basename: expected a path argument"))?;
    Ok(Path::new(path)
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default())
}
