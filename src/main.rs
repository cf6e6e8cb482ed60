use argh::FromArgs;
use pirat_skript::{ConsoleSink, DiagnosticSink, Interpreter, Severity};
use std::path::Path;

#[derive(FromArgs)]
/// Run a pirat script: one command per line, `let` assignments, `invoke`
/// calls, `#` comments.
struct Cli {
    /// also show debug and trace diagnostics
    #[argh(switch, short = 'v')]
    verbose: bool,

    /// start an interactive session instead of running a script
    #[argh(switch, short = 'i')]
    interactive: bool,

    /// path of the script to run, then arguments exposed to it as `argv`
    #[argh(positional, greedy)]
    script_and_args: Vec<String>,
}

fn main() {
    let cli: Cli = argh::from_env();
    // argh only allows one optional positional, so the script path and its
    // arguments arrive as a single greedy list and are split here.
    let mut rest = cli.script_and_args.into_iter();
    let script = rest.next();
    let args: Vec<String> = rest.collect();
    let sink = ConsoleSink::new(cli.verbose);
    let mut interp = Interpreter::new(args, Box::new(sink));

    if cli.interactive {
        if let Err(err) = interp.repl() {
            eprintln!("readline error: {}", err);
            std::process::exit(1);
        }
        return;
    }

    let Some(script) = script else {
        ConsoleSink::new(cli.verbose).report(
            Severity::Error,
            "usage: pirat [-v] [-i] <script> [args...]",
            None,
        );
        std::process::exit(1);
    };

    // Per-line failures are reported as they happen and do not affect the
    // exit status; only an unreadable script is fatal.
    if let Err(err) = interp.run_script(Path::new(&script)) {
        ConsoleSink::new(cli.verbose).report(Severity::Error, &format!("{:#}", err), None);
        std::process::exit(1);
    }
}
