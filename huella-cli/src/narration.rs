//! Text output, optionally read aloud by an external speech program.
use std::io::Write;
use std::process::{Command, Stdio};

/// Where the session sends everything the user sees.
pub trait Narrator {
    /// Display a message and read it aloud when speech is enabled.
    fn say(&mut self, text: &str);

    /// Display a message without speaking it (menus, instructions).
    fn show(&mut self, text: &str);

    /// Display an inline prompt right before reading input.
    fn prompt(&mut self, text: &str);
}

/// External program that speaks its last argument, e.g. `espeak -v es`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SpeechCommand {
    program: String,
    args: Vec<String>,
    enabled: bool,
}

impl SpeechCommand {
    /// Parse a whitespace-separated command line. `None` when blank.
    #[must_use]
    pub fn parse(command_line: &str) -> Option<Self> {
        let mut parts = command_line.split_whitespace().map(str::to_string);
        let program = parts.next()?;
        Some(Self {
            program,
            args: parts.collect(),
            enabled: true,
        })
    }

    /// Speak `text`, blocking until the program exits. Failures are logged
    /// and turn speech off for the rest of the session.
    fn speak(&mut self, text: &str) {
        if !self.enabled {
            return;
        }
        let status = Command::new(&self.program)
            .args(&self.args)
            .arg(text)
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .status();
        match status {
            Ok(status) if status.success() => {}
            Ok(status) => {
                log::warn!("speech command {} exited with {status}", self.program);
                self.enabled = false;
            }
            Err(err) => {
                log::warn!("speech command {} unavailable: {err}", self.program);
                self.enabled = false;
            }
        }
    }
}

/// Writes lines to any writer, usually stdout.
#[derive(Debug)]
pub struct ConsoleNarrator<W: Write> {
    out: W,
    speech: Option<SpeechCommand>,
}

impl<W: Write> ConsoleNarrator<W> {
    pub const fn new(out: W) -> Self {
        Self { out, speech: None }
    }

    #[must_use]
    pub fn with_speech(mut self, speech: Option<SpeechCommand>) -> Self {
        self.speech = speech;
        self
    }

    fn write_line(&mut self, text: &str) {
        if let Err(err) = writeln!(self.out, "{text}").and_then(|()| self.out.flush()) {
            log::warn!("failed to write output: {err}");
        }
    }
}

impl<W: Write> Narrator for ConsoleNarrator<W> {
    fn say(&mut self, text: &str) {
        self.write_line(text);
        if let Some(speech) = self.speech.as_mut() {
            speech.speak(text);
        }
    }

    fn show(&mut self, text: &str) {
        self.write_line(text);
    }

    fn prompt(&mut self, text: &str) {
        if let Err(err) = write!(self.out, "{text}").and_then(|()| self.out.flush()) {
            log::warn!("failed to write prompt: {err}");
        }
    }
}
