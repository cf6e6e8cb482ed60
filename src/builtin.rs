//! Built-in functions reachable by bare name from `invoke`.
//!
//! Built-ins are parsed with [`argh`](https://docs.rs/argh) (`FromArgs`) from
//! the already-substituted argument tokens and run in-process. They sit last
//! in the resolver chain, so a locally registered function of the same name
//! shadows them.

use crate::env::Environment;
use crate::external;
use crate::functions::FunctionResolver;
use anyhow::{Result, anyhow};
use argh::{EarlyExit, FromArgs};
use std::ffi::OsStr;
use std::io::Write;
use std::path::Path;

/// A built-in function known at compile time.
trait BuiltinCommand: Sized + FromArgs {
    /// Canonical name, e.g. "echo".
    fn name() -> &'static str;

    /// Run the function. The returned text is discarded except for
    /// debug-severity logging; observable output goes to `out`.
    fn run(self, env: &Environment, out: &mut dyn Write) -> Result<String>;
}

/// The built-in namespace as one resolver.
#[derive(Default)]
pub struct Builtins;

impl FunctionResolver for Builtins {
    fn try_call(
        &self,
        env: &Environment,
        name: &str,
        args: &[String],
        out: &mut dyn Write,
    ) -> Option<Result<String>> {
        dispatch::<Echo>(env, name, args, out)
            .or_else(|| dispatch::<Pwd>(env, name, args, out))
            .or_else(|| dispatch::<Which>(env, name, args, out))
    }
}

/// Try one builtin type against the call. Bad flags surface through argh's
/// [`EarlyExit`]: help requests print and succeed, argument errors fail the
/// line.
fn dispatch<T: BuiltinCommand>(
    env: &Environment,
    name: &str,
    args: &[String],
    out: &mut dyn Write,
) -> Option<Result<String>> {
    if name != T::name() {
        return None;
    }
    let arg_refs: Vec<&str> = args.iter().map(|s| s.as_str()).collect();
    Some(match T::from_args(&[name], &arg_refs) {
        Ok(cmd) => cmd.run(env, out),
        Err(EarlyExit { output, status }) => {
            if status.is_err() {
                Err(anyhow!("{}", output.trim_end()))
            } else {
                out.write_all(output.as_bytes())
                    .map(|_| String::new())
                    .map_err(Into::into)
            }
        }
    })
}

#[derive(FromArgs)]
/// Write the arguments to standard output, separated by spaces, with a
/// trailing newline unless -n is given.
struct Echo {
    #[argh(switch, short = 'n')]
    /// do not output the trailing newline.
    no_newline: bool,

    #[argh(positional, greedy)]
    /// values to print as-is, separated by spaces.
    args: Vec<String>,
}

impl BuiltinCommand for Echo {
    fn name() -> &'static str {
        "echo"
    }

    fn run(self, _env: &Environment, out: &mut dyn Write) -> Result<String> {
        let text = self.args.join(" ");
        if self.no_newline {
            write!(out, "{}", text)?;
        } else {
            writeln!(out, "{}", text)?;
        }
        Ok(text)
    }
}

#[derive(FromArgs)]
/// Print the interpreter's working directory.
struct Pwd {}

impl BuiltinCommand for Pwd {
    fn name() -> &'static str {
        "pwd"
    }

    fn run(self, env: &Environment, out: &mut dyn Write) -> Result<String> {
        let dir = env.current_dir.to_string_lossy().into_owned();
        writeln!(out, "{}", dir)?;
        Ok(dir)
    }
}

#[derive(FromArgs)]
/// Print the full path an external invocation of the given program would run.
struct Which {
    #[argh(positional)]
    /// program name to resolve through PATH.
    program: String,
}

impl BuiltinCommand for Which {
    fn name() -> &'static str {
        "which"
    }

    fn run(self, env: &Environment, out: &mut dyn Write) -> Result<String> {
        let search_paths = env.get_var("PATH").unwrap_or_default();
        match external::resolve_program(OsStr::new(&search_paths), Path::new(&self.program)) {
            Some(path) => {
                let path = path.to_string_lossy().into_owned();
                writeln!(out, "{}", path)?;
                Ok(path)
            }
            None => Err(anyhow!("which: '{}' not found", self.program)),
        }
    }
}
