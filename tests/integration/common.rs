//! Shared helpers for driving whole sessions in memory

use std::cell::RefCell;
use std::io::{self, Cursor, Write};
use std::rc::Rc;

use repl_breakpoint::{
    FatalError, Interpreter, ReplOptions, ScopeSnapshot, Session, SessionExit, StdinSource, Value,
};

/// Writer shared by the session and the interpreter, so prompts, results and
/// `echo` output land in one transcript
#[derive(Clone, Default)]
pub struct SharedBuffer(Rc<RefCell<Vec<u8>>>);

impl SharedBuffer {
    pub fn contents(&self) -> String {
        String::from_utf8_lossy(&self.0.borrow()).into_owned()
    }
}

impl Write for SharedBuffer {
    fn write(
        &mut self,
        buf: &[u8],
    ) -> io::Result<usize> {
        self.0.borrow_mut().extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

/// Everything observable about one finished session
#[derive(Debug)]
pub struct Transcript {
    pub exit: SessionExit,
    pub output: String,
    pub errors: Vec<String>,
    pub fatal: Option<FatalError>,
    pub last_answer: Value,
}

/// Run the bundled interpreter over `input` with quiet options
pub fn run(
    input: &str,
    variables: &ScopeSnapshot,
) -> Transcript {
    run_with(input, variables, ReplOptions::new().quiet(true))
}

pub fn run_with(
    input: &str,
    variables: &ScopeSnapshot,
    options: ReplOptions,
) -> Transcript {
    let output = SharedBuffer::default();
    let errors = Rc::new(RefCell::new(Vec::new()));
    let fatal = Rc::new(RefCell::new(None));

    let error_sink = Rc::clone(&errors);
    let fatal_sink = Rc::clone(&fatal);
    let options = options
        .error_handler(move |severity, message| {
            error_sink.borrow_mut().push(format!("{}: {}", severity, message))
        })
        .shutdown_handler(move |error| *fatal_sink.borrow_mut() = Some(error.clone()));

    let mut session = Session::new(
        Interpreter::with_output(output.clone()),
        StdinSource::new(Cursor::new(input.to_string())),
        output.clone(),
        variables,
        options,
    );
    let exit = match session.run() {
        Ok(exit) => exit,
        Err(e) => panic!("session failed: {}", e),
    };
    let last_answer = session.scope().last_answer();
    drop(session);

    let errors = errors.borrow().clone();
    let fatal = fatal.borrow().clone();
    Transcript {
        exit,
        output: output.contents(),
        errors,
        fatal,
        last_answer,
    }
}

/// Snapshot from name/value pairs
pub fn variables(pairs: &[(&str, Value)]) -> ScopeSnapshot {
    pairs
        .iter()
        .map(|(name, value)| (name.to_string(), value.clone()))
        .collect()
}
