//! repl-breakpoint - demo CLI
//!
//! Seeds a scope with a few variables and a function, then opens a session
//! over it, the same way a program would at a breakpoint.

use anyhow::{Context, Result};
use clap::Parser;
use std::io::IsTerminal;
use std::path::PathBuf;

use repl_breakpoint::repl::line::{EditorSource, LineSource, StdinSource};
use repl_breakpoint::repl::printer::render;
use repl_breakpoint::util::config::{load_config_from, load_user_config};
use repl_breakpoint::util::logger;
use repl_breakpoint::{
    snapshot, Evaluator, Interpreter, ReplOptions, Scope, Session, SessionExit, Value, VERSION,
};

/// Drop into an interactive REPL over a demo scope
#[derive(Parser, Debug)]
#[command(name = "repl-breakpoint")]
#[command(version = VERSION)]
#[command(about = "Interactive breakpoint REPL demo", long_about = None)]
struct Args {
    /// Do not print the intro banner
    #[arg(short, long)]
    quiet: bool,

    /// Function name shown in the banner
    #[arg(long, value_name = "NAME")]
    function: Option<String>,

    /// File name shown in the banner
    #[arg(long, value_name = "FILE")]
    file: Option<String>,

    /// Line number shown in the banner
    #[arg(long, value_name = "LINE")]
    line: Option<u32>,

    /// Configuration file to use instead of the user config
    #[arg(short, long, value_name = "PATH")]
    config: Option<PathBuf>,

    /// Read plain lines from standard input, without line editing
    #[arg(long)]
    plain: bool,

    /// Enable verbose output
    #[arg(short, long)]
    verbose: bool,
}

const INTRO: &str = "\
==========================================================
|                repl-breakpoint example                 |
==========================================================
The REPL can see the following variables and functions
from the demo scope:";

const HELP: &str = "\
    - the function sq(), which returns the square of a number

To print the value of something, write it out without a
semicolon. If you include the semicolon, the result will
not be printed. $_ANS always contains the last result.

Multiline code is accepted: as long as the parens are
unbalanced, the input will be buffered. You can also force
buffering by ending the line with / or \\.
";

fn main() -> Result<()> {
    let args = Args::parse();

    let config = match &args.config {
        Some(path) => load_config_from(path)
            .with_context(|| format!("Failed to load config: {}", path.display()))?,
        None => load_user_config().context("Failed to load user config")?,
    };

    if args.verbose {
        logger::init_debug();
    } else {
        logger::init_with_level(config.log.level);
    }

    // Demo scope
    let a = 2;
    let b = "hello";
    let c: Value = vec![
        Value::from(1),
        Value::from(2),
        Value::from(3),
        Value::from(vec![1, 2, 3, 4]),
    ]
    .into();
    let variables = snapshot!(a, b, c);

    let mut interpreter = Interpreter::new();
    interpreter
        .execute("function sq($x) { return $x * $x; }", &mut Scope::new())
        .context("Failed to declare demo function")?;

    println!("{}", INTRO);
    for (name, value) in &variables {
        println!("    - ${} is {}", name, render(value));
    }
    println!("{}", HELP);

    let mut options = ReplOptions::from_config(&config.repl)
        .function(args.function.unwrap_or_else(|| "main".to_string()))
        .file(args.file.unwrap_or_else(|| file!().to_string()))
        .line(args.line.unwrap_or(line!()));
    if args.quiet {
        options = options.quiet(true);
    }

    let max_line_length = config.repl.max_line_length;
    let use_editor = !args.plain && config.repl.line_editor && std::io::stdin().is_terminal();
    let input: Box<dyn LineSource> = if use_editor {
        Box::new(
            EditorSource::with_config(config.repl.editor_config())
                .context("Failed to start line editor")?
                .with_max_line_length(max_line_length),
        )
    } else {
        Box::new(StdinSource::stdin().with_max_line_length(max_line_length))
    };

    let mut session = Session::with_stdout(interpreter, input, &variables, options);
    let exit = session.run().context("REPL session failed")?;

    if args.verbose {
        eprintln!("Session ended: {:?}", exit);
    }
    if let SessionExit::Fatal(_) = exit {
        std::process::exit(255);
    }

    Ok(())
}
