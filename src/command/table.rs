//! Command table and prefix matching

/// Commands understood by the interpreter
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    /// List commands
    Help,
    /// Viewer count and state dump
    Status,
    /// Start playback
    Play,
    /// Pause, optionally at a position
    Pause,
    /// Notify every viewer
    Say,
    /// Move the pause position back
    Rewind,
    /// Force viewers to disconnect
    Kick,
    /// Shut the server down
    Exit,
}

/// One entry of a command table
#[derive(Debug, Clone, Copy)]
pub struct CommandSpec {
    /// Name matched against the typed prefix
    pub name: &'static str,
    /// Usage shown by `help`; `None` hides aliases
    pub usage: Option<&'static str>,
    /// One-line description
    pub description: &'static str,
    /// What the entry runs
    pub command: Command,
}

const fn spec(
    name: &'static str,
    usage: Option<&'static str>,
    description: &'static str,
    command: Command,
) -> CommandSpec {
    CommandSpec {
        name,
        usage,
        description,
        command,
    }
}

const SHARED: &[CommandSpec] = &[
    spec("help", Some("help"), "Display this help message", Command::Help),
    spec(
        "status",
        Some("status"),
        "Show how many viewers are connected.",
        Command::Status,
    ),
    spec("play", Some("play"), "Start playing video", Command::Play),
    spec(
        "pause",
        Some("pause [when]"),
        "Pause the video and optionally seek to the specified number of seconds",
        Command::Pause,
    ),
    spec(
        "say",
        Some("say [...words]"),
        "Send a notification to all viewers",
        Command::Say,
    ),
    spec(
        "rewind",
        Some("rewind <seconds>"),
        "Rewind the video <seconds> seconds",
        Command::Rewind,
    ),
    spec(
        "kick",
        Some("kick ([...ids] | everyone)"),
        "Kick one or all viewers",
        Command::Kick,
    ),
];

const CONSOLE_ONLY: &[CommandSpec] = &[
    spec("exit", Some("exit"), "Stop the server", Command::Exit),
    spec("quit", None, "Stop the server", Command::Exit),
];

/// Why a line could not be turned into a command
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ParseError {
    /// No command starts with the typed token
    Unknown(String),
    /// Several commands start with the typed token
    Ambiguous(Vec<&'static str>),
}

impl std::fmt::Display for ParseError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ParseError::Unknown(token) => write!(f, "No such command as \"{}\" exists.", token),
            ParseError::Ambiguous(names) => {
                let quoted: Vec<String> = names.iter().map(|n| format!("\"{}\"", n)).collect();
                write!(
                    f,
                    "Ambiguous command could match any of {}",
                    quoted.join(", ")
                )
            }
        }
    }
}

impl std::error::Error for ParseError {}

/// A resolved command with its arguments
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Invocation<'a> {
    /// Resolved command
    pub command: Command,
    /// Remaining whitespace-separated tokens
    pub args: Vec<&'a str>,
}

/// Set of commands available to one kind of operator
#[derive(Debug, Clone)]
pub struct CommandTable {
    specs: Vec<CommandSpec>,
}

impl CommandTable {
    /// Full table for the local operator console
    pub fn console() -> Self {
        Self {
            specs: SHARED.iter().chain(CONSOLE_ONLY).copied().collect(),
        }
    }

    /// Table for remote controllers (no `exit`/`quit`)
    pub fn remote() -> Self {
        Self {
            specs: SHARED.to_vec(),
        }
    }

    /// Table with arbitrary entries
    pub fn with_specs(specs: Vec<CommandSpec>) -> Self {
        Self { specs }
    }

    /// Entries in display order
    pub fn specs(&self) -> &[CommandSpec] {
        &self.specs
    }

    /// Resolve a typed token by exact name or unambiguous prefix
    pub fn resolve(&self, token: &str) -> Result<Command, ParseError> {
        if let Some(exact) = self.specs.iter().find(|s| s.name == token) {
            return Ok(exact.command);
        }

        let matching: Vec<&CommandSpec> = self
            .specs
            .iter()
            .filter(|s| s.name.starts_with(token))
            .collect();

        match matching.as_slice() {
            [] => Err(ParseError::Unknown(token.to_string())),
            [only] => Ok(only.command),
            many => Err(ParseError::Ambiguous(many.iter().map(|s| s.name).collect())),
        }
    }

    /// Parse a line; `Ok(None)` for a blank line
    pub fn parse<'a>(&self, line: &'a str) -> Result<Option<Invocation<'a>>, ParseError> {
        let mut tokens = line.split_whitespace();
        let Some(token) = tokens.next() else {
            return Ok(None);
        };

        let command = self.resolve(token)?;
        Ok(Some(Invocation {
            command,
            args: tokens.collect(),
        }))
    }

    /// `usage: description` lines for `help`
    pub fn help_lines(&self) -> Vec<String> {
        self.specs
            .iter()
            .filter_map(|s| s.usage.map(|usage| format!("{}: {}", usage, s.description)))
            .collect()
    }
}
