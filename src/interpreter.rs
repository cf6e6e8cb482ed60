use crate::builtin::Builtins;
use crate::diag::{ConsoleSink, DiagnosticSink, Severity};
use crate::env::Environment;
use crate::external;
use crate::functions::{FunctionResolver, LocalFunctions, NativeModules, ScriptFn};
use crate::parser;
use crate::subst::{self, ExpandCtx};
use crate::value::{Scope, Value};
use anyhow::{Context, Result, anyhow};
use regex::Regex;
use rustyline::DefaultEditor;
use rustyline::error::ReadlineError;
use std::collections::HashMap;
use std::fs::File;
use std::io::{self, BufRead, BufReader};
use std::path::Path;
use std::sync::LazyLock;

/// Assignment syntax: an identifier, `=`, then the raw value expression.
static LET_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^(\w+)\s*=\s*(.*)$").expect("assignment pattern"));

type KeywordHandler = fn(&mut Interpreter, &str, usize) -> Result<()>;

/// The line-oriented script interpreter.
///
/// Each instance owns its variable scope, environment snapshot, keyword
/// registry and function registries, so multiple scripts can run in isolation
/// within one process. Lines execute strictly in order on the calling thread;
/// the only blocking point is an external process invocation.
///
/// Example
/// ```
/// use pirat_skript::Interpreter;
/// let mut interp = Interpreter::default();
/// interp.run_line("let greeting = ahoy", 1);
/// ```
pub struct Interpreter {
    scope: Scope,
    env: Environment,
    keywords: HashMap<&'static str, KeywordHandler>,
    modules: NativeModules,
    locals: LocalFunctions,
    builtins: Builtins,
    sink: Box<dyn DiagnosticSink>,
}

impl Interpreter {
    /// Create an interpreter whose script sees `argv` and which reports
    /// diagnostics to `sink`.
    pub fn new(argv: Vec<String>, sink: Box<dyn DiagnosticSink>) -> Self {
        let mut keywords: HashMap<&'static str, KeywordHandler> = HashMap::new();
        keywords.insert("let", Interpreter::handle_let);
        keywords.insert("invoke", Interpreter::handle_invoke);
        keywords.insert("#", Interpreter::handle_comment);

        Self {
            scope: Scope::new(argv),
            env: Environment::new(),
            keywords,
            modules: NativeModules::standard(),
            locals: LocalFunctions::default(),
            builtins: Builtins,
            sink,
        }
    }

    /// The script-visible variables.
    pub fn scope(&self) -> &Scope {
        &self.scope
    }

    /// The environment snapshot used for `{$NAME}` lookups and external
    /// processes. Mutable so embedders and tests can inject variables.
    pub fn env_mut(&mut self) -> &mut Environment {
        &mut self.env
    }

    /// Register a host function callable from scripts by bare name.
    ///
    /// Local functions are tried before built-ins, so registering `echo`
    /// shadows the built-in of the same name.
    pub fn register_function(
        &mut self,
        name: impl Into<String>,
        func: impl Fn(&[String]) -> Result<String> + 'static,
    ) {
        self.locals.register(name, Box::new(func) as ScriptFn);
    }

    /// Interpret a script file line by line.
    ///
    /// Failing to open or read the file is the only fatal outcome; everything
    /// that goes wrong on an individual line is reported and skipped.
    pub fn run_script(&mut self, path: &Path) -> Result<()> {
        let file = File::open(path)
            .with_context(|| format!("cannot open script '{}'", path.display()))?;
        for (idx, line) in BufReader::new(file).lines().enumerate() {
            let line =
                line.with_context(|| format!("cannot read script '{}'", path.display()))?;
            self.run_line(&line, idx + 1);
        }
        Ok(())
    }

    /// Interpret an in-memory sequence of lines, numbering them from 1.
    pub fn run_lines<'a>(&mut self, lines: impl IntoIterator<Item = &'a str>) {
        for (idx, line) in lines.into_iter().enumerate() {
            self.run_line(line, idx + 1);
        }
    }

    /// Interpret one line: tokenize, look up the keyword, run its handler.
    ///
    /// This is the single boundary that turns handler failures into "report
    /// and continue". Blank lines are skipped silently; an unregistered
    /// keyword is a per-line error, never a reason to stop.
    pub fn run_line(&mut self, line: &str, line_no: usize) {
        let Some((keyword, rest)) = parser::split_line(line) else {
            return;
        };
        match self.keywords.get(keyword).copied() {
            Some(handler) => {
                if let Err(err) = handler(self, rest, line_no) {
                    self.sink
                        .report(Severity::Error, &err.to_string(), Some(line_no));
                }
            }
            None => self.sink.report(
                Severity::Error,
                &format!("unknown keyword: '{}'", keyword),
                Some(line_no),
            ),
        }
    }

    /// Interactive session: read, interpret, repeat until Ctrl-C or Ctrl-D.
    pub fn repl(&mut self) -> rustyline::Result<()> {
        let mut rl = DefaultEditor::new()?;
        let mut line_no = 0;

        loop {
            match rl.readline("pirat> ") {
                Ok(line) => {
                    rl.add_history_entry(line.as_str())?;
                    line_no += 1;
                    self.run_line(&line, line_no);
                }
                Err(ReadlineError::Interrupted) | Err(ReadlineError::Eof) => break,
                Err(err) => return Err(err),
            }
        }

        Ok(())
    }

    fn expand_ctx(&self) -> ExpandCtx<'_> {
        ExpandCtx {
            scope: &self.scope,
            env: &self.env,
            modules: &self.modules,
        }
    }

    /// `let <identifier> = <value-expression>`
    ///
    /// A bracketed value is an array literal; anything else becomes a scalar
    /// after substitution. On malformed input the scope is left untouched.
    fn handle_let(&mut self, args: &str, _line_no: usize) -> Result<()> {
        let caps = LET_RE
            .captures(args)
            .ok_or_else(|| anyhow!("invalid variable assignment: '{}'", args))?;
        let name = caps[1].to_string();
        let raw = caps[2].trim();

        let value = {
            let ctx = self.expand_ctx();
            if raw.starts_with('[') && raw.ends_with(']') {
                let elements = parser::split_array_literal(raw);
                Value::List(elements.iter().map(|e| subst::expand(e, &ctx)).collect())
            } else {
                Value::Scalar(subst::expand(raw, &ctx))
            }
        };

        self.scope.set(name, value);
        Ok(())
    }

    /// `invoke [$]target(arg1, arg2, ...)`
    ///
    /// Resolution order: explicit `$` external call, then dotted module
    /// function, then locally registered function, then built-in. A target
    /// matching none of these is a per-line error.
    fn handle_invoke(&mut self, args: &str, line_no: usize) -> Result<()> {
        let call = parser::parse_call(args)?;
        let arguments: Vec<String> = {
            let ctx = self.expand_ctx();
            call.args.iter().map(|a| subst::expand(a, &ctx)).collect()
        };

        if call.external {
            let code = external::run(
                &self.env,
                &call.target,
                &arguments,
                self.sink.as_ref(),
                Some(line_no),
            );
            self.sink.report(
                Severity::Trace,
                &format!("external '{}' exited with code {}", call.target, code),
                Some(line_no),
            );
            return Ok(());
        }

        if let Some((module, function)) = call.target.rsplit_once('.') {
            let result = self
                .modules
                .call(module, function, &arguments)
                .map_err(|err| anyhow!("cannot invoke '{}.{}': {}", module, function, err))?;
            self.report_result(&call.target, &result, line_no);
            return Ok(());
        }

        let mut out = io::stdout();
        for resolver in [
            &self.locals as &dyn FunctionResolver,
            &self.builtins as &dyn FunctionResolver,
        ] {
            if let Some(result) = resolver.try_call(&self.env, &call.target, &arguments, &mut out)
            {
                let text =
                    result.map_err(|err| anyhow!("'{}' failed: {}", call.target, err))?;
                self.report_result(&call.target, &text, line_no);
                return Ok(());
            }
        }

        Err(anyhow!("function '{}' is not implemented", call.target))
    }

    fn handle_comment(&mut self, _args: &str, _line_no: usize) -> Result<()> {
        Ok(())
    }

    fn report_result(&self, target: &str, text: &str, line_no: usize) {
        if !text.is_empty() {
            self.sink.report(
                Severity::Debug,
                &format!("'{}' returned '{}'", target, text),
                Some(line_no),
            );
        }
    }
}

impl Default for Interpreter {
    /// An interpreter with no script arguments, reporting to a non-verbose
    /// console sink.
    fn default() -> Self {
        Self::new(Vec::new(), Box::new(ConsoleSink::new(false)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::diag::testing::{Event, RecordingSink};
    use std::cell::RefCell;
    use std::rc::Rc;

    fn recording_interpreter(argv: Vec<String>) -> (Interpreter, Rc<RefCell<Vec<Event>>>) {
        let (sink, events) = RecordingSink::with_handle();
        (Interpreter::new(argv, Box::new(sink)), events)
    }

    fn errors(events: &[Event]) -> Vec<&Event> {
        events
            .iter()
            .filter(|(sev, _, _)| *sev == Severity::Error)
            .collect()
    }

    #[test]
    fn assignment_round_trip_and_replacement() {
        let (mut interp, _) = recording_interpreter(vec![]);

        interp.run_lines(["let x = hello", "let xs = [a, b, c]"]);
        assert_eq!(interp.scope().get("x"), Some(&Value::Scalar("hello".into())));
        assert_eq!(
            interp.scope().get("xs"),
            Some(&Value::List(vec!["a".into(), "b".into(), "c".into()]))
        );

        // A second assignment replaces value and type.
        interp.run_lines(["let x = [1, 2]"]);
        assert_eq!(
            interp.scope().get("x"),
            Some(&Value::List(vec!["1".into(), "2".into()]))
        );
    }

    #[test]
    fn assignment_substitutes_into_array_elements() {
        let (mut interp, _) = recording_interpreter(vec![]);
        interp.run_lines(["let base = /srv", "let dirs = [{base}/a, {base}/b]"]);
        assert_eq!(
            interp.scope().get("dirs"),
            Some(&Value::List(vec!["/srv/a".into(), "/srv/b".into()]))
        );
    }

    #[test]
    fn empty_array_literal() {
        let (mut interp, _) = recording_interpreter(vec![]);
        interp.run_lines(["let x = []"]);
        assert_eq!(interp.scope().get("x"), Some(&Value::List(vec![])));
    }

    #[test]
    fn invalid_assignment_leaves_scope_unchanged() {
        let (mut interp, events) = recording_interpreter(vec![]);
        interp.run_lines(["let x = 1", "let = broken"]);

        let events = events.borrow();
        let errs = errors(&events);
        assert_eq!(errs.len(), 1);
        assert!(errs[0].1.contains("invalid variable assignment"));
        assert_eq!(errs[0].2, Some(2));
        assert_eq!(interp.scope().get("x"), Some(&Value::Scalar("1".into())));
    }

    #[test]
    fn unknown_keyword_reports_line_and_continues() {
        let (mut interp, events) = recording_interpreter(vec![]);
        interp.run_lines(["let a = 1", "", "frobnicate all the things", "let b = 2"]);

        let events = events.borrow();
        let errs = errors(&events);
        assert_eq!(errs.len(), 1);
        assert!(errs[0].1.contains("frobnicate"));
        assert_eq!(errs[0].2, Some(3));

        // Line 4 still executed.
        assert_eq!(interp.scope().get("b"), Some(&Value::Scalar("2".into())));
    }

    #[test]
    fn comments_and_blank_lines_are_silent() {
        let (mut interp, events) = recording_interpreter(vec![]);
        interp.run_lines(["# set up", "", "   ", "# invoke nothing()"]);
        assert!(events.borrow().is_empty());
    }

    #[test]
    fn argv_is_seeded() {
        let (mut interp, _) = recording_interpreter(vec!["one".into(), "two".into()]);
        interp.run_lines(["let first = {argv[0]}", "let all = {argv[]}"]);
        assert_eq!(interp.scope().get("first"), Some(&Value::Scalar("one".into())));
        assert_eq!(
            interp.scope().get("all"),
            Some(&Value::Scalar("one two".into()))
        );
    }

    #[test]
    fn unresolved_placeholder_is_stored_verbatim() {
        let (mut interp, events) = recording_interpreter(vec![]);
        interp.run_lines(["let x = value: {missing}"]);
        assert_eq!(
            interp.scope().get("x"),
            Some(&Value::Scalar("value: {missing}".into()))
        );
        // Silent fallback: no diagnostic at all.
        assert!(events.borrow().is_empty());
    }

    #[test]
    fn dotted_invocation_of_missing_module_is_non_fatal() {
        let (mut interp, events) = recording_interpreter(vec![]);
        interp.run_lines(["invoke nosuchmod.fn()", "let after = ok"]);

        let events = events.borrow();
        let errs = errors(&events);
        assert_eq!(errs.len(), 1);
        assert!(errs[0].1.contains("nosuchmod.fn"));
        assert_eq!(errs[0].2, Some(1));
        assert_eq!(interp.scope().get("after"), Some(&Value::Scalar("ok".into())));
    }

    #[test]
    fn dotted_invocation_calls_native_module() {
        let (mut interp, events) = recording_interpreter(vec![]);
        interp.run_lines(["invoke str.upper(ahoy)"]);

        let events = events.borrow();
        assert!(errors(&events).is_empty());
        // The textual result surfaces as a debug diagnostic.
        assert!(events
            .iter()
            .any(|(sev, msg, _)| *sev == Severity::Debug && msg.contains("AHOY")));
    }

    #[test]
    fn unimplemented_bare_target_is_reported() {
        let (mut interp, events) = recording_interpreter(vec![]);
        interp.run_lines(["invoke frobnicate(1, 2)", "let after = ok"]);

        let events = events.borrow();
        let errs = errors(&events);
        assert_eq!(errs.len(), 1);
        assert!(errs[0].1.contains("not implemented"));
        assert_eq!(interp.scope().get("after"), Some(&Value::Scalar("ok".into())));
    }

    #[test]
    fn local_function_receives_substituted_arguments() {
        let (mut interp, events) = recording_interpreter(vec![]);
        let seen = Rc::new(RefCell::new(Vec::<String>::new()));
        let seen_handle = seen.clone();
        interp.register_function("collect", move |args| {
            seen_handle.borrow_mut().extend_from_slice(args);
            Ok(String::new())
        });

        interp.run_lines(["let name = world", r#"invoke collect("hello {name}", x)"#]);

        assert!(errors(&events.borrow()).is_empty());
        assert_eq!(*seen.borrow(), vec!["hello world".to_string(), "x".to_string()]);
    }

    #[test]
    fn local_function_shadows_builtin() {
        let (mut interp, events) = recording_interpreter(vec![]);
        interp.register_function("echo", |_| Ok("shadowed".to_string()));
        interp.run_lines(["invoke echo(hi)"]);

        let events = events.borrow();
        assert!(events
            .iter()
            .any(|(sev, msg, _)| *sev == Severity::Debug && msg.contains("shadowed")));
    }

    #[test]
    fn local_function_failure_is_per_line() {
        let (mut interp, events) = recording_interpreter(vec![]);
        interp.register_function("boom", |_| Err(anyhow!("kaputt")));
        interp.run_lines(["invoke boom()", "let after = ok"]);

        let events = events.borrow();
        let errs = errors(&events);
        assert_eq!(errs.len(), 1);
        assert!(errs[0].1.contains("kaputt"));
        assert_eq!(interp.scope().get("after"), Some(&Value::Scalar("ok".into())));
    }

    #[test]
    #[cfg(unix)]
    fn external_invocation_with_substitution() {
        let (mut interp, events) = recording_interpreter(vec![]);
        interp.run_lines(["let name = world", r#"invoke $echo("hello {name}")"#]);
        assert!(errors(&events.borrow()).is_empty());
    }

    #[test]
    #[cfg(unix)]
    fn external_nonzero_exit_is_reported_and_non_fatal() {
        let (mut interp, events) = recording_interpreter(vec![]);
        interp.run_lines(["invoke $false()", "let after = ok"]);

        let events = events.borrow();
        let errs = errors(&events);
        assert_eq!(errs.len(), 1);
        assert!(errs[0].1.contains("'false'"));
        assert_eq!(interp.scope().get("after"), Some(&Value::Scalar("ok".into())));
    }

    #[test]
    fn env_placeholder_uses_interpreter_environment() {
        let (mut interp, _) = recording_interpreter(vec![]);
        interp.env_mut().set_var("PIRAT_PORT", "7070");
        interp.run_lines(["let port = {$PIRAT_PORT}"]);
        assert_eq!(interp.scope().get("port"), Some(&Value::Scalar("7070".into())));
    }

    #[test]
    fn run_script_missing_file_is_fatal() {
        let (mut interp, _) = recording_interpreter(vec![]);
        let missing = std::env::temp_dir().join("pirat_no_such_script_2481.pirat");
        assert!(interp.run_script(&missing).is_err());
    }

    #[test]
    fn run_script_executes_file() {
        use std::io::Write;

        let (mut interp, events) = recording_interpreter(vec![]);
        let path = std::env::temp_dir().join(format!("pirat_script_{}.pirat", std::process::id()));
        let mut file = File::create(&path).expect("create temp script");
        writeln!(file, "# a demo script").unwrap();
        writeln!(file, "let who = crew").unwrap();
        writeln!(file, "let hail = ahoy {{who}}").unwrap();
        drop(file);

        interp.run_script(&path).expect("script should run");
        assert_eq!(
            interp.scope().get("hail"),
            Some(&Value::Scalar("ahoy crew".into()))
        );
        assert!(errors(&events.borrow()).is_empty());

        let _ = std::fs::remove_file(path);
    }
}
