//! Command execution against the state machine

use super::table::{Command, CommandTable, Invocation};
use crate::dispatch::{Dispatch, KickTarget};
use crate::sync::{PauseOutcome, PlayOutcome, SyncMachine};

/// What a command produced
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CommandOutput {
    /// Response line(s) for the operator, if any
    pub text: Option<String>,
    /// The operator asked to stop the server
    pub shutdown: bool,
}

impl CommandOutput {
    fn text(text: impl Into<String>) -> Self {
        Self {
            text: Some(text.into()),
            shutdown: false,
        }
    }

    fn silent() -> Self {
        Self::default()
    }
}

/// Parse and run one line of operator input
pub fn execute<D: Dispatch>(
    table: &CommandTable,
    machine: &mut SyncMachine<D>,
    line: &str,
) -> CommandOutput {
    match table.parse(line) {
        Ok(Some(invocation)) => run(table, machine, invocation),
        Ok(None) => CommandOutput::silent(),
        Err(e) => CommandOutput::text(e.to_string()),
    }
}

fn run<D: Dispatch>(
    table: &CommandTable,
    machine: &mut SyncMachine<D>,
    invocation: Invocation<'_>,
) -> CommandOutput {
    let args = invocation.args;

    match invocation.command {
        Command::Help => CommandOutput::text(table.help_lines().join("\n")),
        Command::Status => CommandOutput::text(status(machine)),
        Command::Play => play(machine),
        Command::Pause => pause(machine, args.first().copied()),
        Command::Say => {
            machine.notify(&args.join(" "));
            CommandOutput::silent()
        }
        Command::Rewind => rewind(machine, args.first().copied()),
        Command::Kick => kick(machine, &args),
        Command::Exit => CommandOutput {
            text: Some("Stopping server".into()),
            shutdown: true,
        },
    }
}

fn status<D: Dispatch>(machine: &SyncMachine<D>) -> String {
    let registry = machine.registry();
    let n = registry.count();
    let (verb, noun) = if n == 1 {
        ("is", "viewer")
    } else {
        ("are", "viewers")
    };

    let viewers: Vec<String> = registry.all().iter().map(|v| v.to_string()).collect();
    let ready: Vec<String> = registry
        .entries()
        .iter()
        .map(|e| match e.readiness {
            Some(when) => format!("{}: {}", e.viewer.name, when),
            None => format!("{}: unknown", e.viewer.name),
        })
        .collect();

    format!(
        "There {} {} {} connected.\nStatus: {:?}\nViewers: [{}]\nReadyWhens: [{}]",
        verb,
        n,
        noun,
        machine.state(),
        viewers.join(", "),
        ready.join(", ")
    )
}

fn play<D: Dispatch>(machine: &mut SyncMachine<D>) -> CommandOutput {
    match machine.play() {
        PlayOutcome::AlreadyPlaying => CommandOutput::text("Already playing"),
        PlayOutcome::Started => CommandOutput::text("Now playing."),
        PlayOutcome::NotPossible => CommandOutput::text("Can't play right now"),
    }
}

fn parse_seconds(arg: &str) -> Option<f64> {
    arg.parse::<f64>().ok().filter(|v| v.is_finite())
}

fn pause<D: Dispatch>(machine: &mut SyncMachine<D>, arg: Option<&str>) -> CommandOutput {
    let when = match arg {
        Some(arg) => match parse_seconds(arg) {
            Some(when) => Some(when),
            None => return CommandOutput::text("Invalid number given."),
        },
        None => None,
    };

    match machine.pause(when) {
        PauseOutcome::PausingAt(when) => CommandOutput::text(format!("Pausing at {}", when)),
        PauseOutcome::CollectingPositions => CommandOutput::text("Instructing viewers to pause"),
        PauseOutcome::Ignored => CommandOutput::text("Can't pause right now"),
    }
}

fn rewind<D: Dispatch>(machine: &mut SyncMachine<D>, arg: Option<&str>) -> CommandOutput {
    let Some(arg) = arg else {
        return CommandOutput::text("You must provide a number of seconds to rewind.");
    };
    let Some(seconds) = parse_seconds(arg) else {
        return CommandOutput::text("Invalid number given.");
    };

    match machine.rewind(seconds) {
        Ok(when) => CommandOutput::text(format!("Rewinding to {}", when)),
        Err(e) => CommandOutput::text(e.to_string()),
    }
}

fn kick<D: Dispatch>(machine: &mut SyncMachine<D>, who: &[&str]) -> CommandOutput {
    if let [only] = who {
        if *only == "everyone" {
            machine.kick(&KickTarget::Everyone);
            return CommandOutput::text("Kicked everyone.");
        }
    }

    if who.is_empty() {
        return CommandOutput::text("You must name who to kick, or everyone.");
    }

    let ids: Vec<String> = who.iter().map(|s| s.to_string()).collect();
    let kicked = machine.kick(&KickTarget::Ids(ids));
    tracing::debug!(requested = who.len(), kicked = ?kicked, "Kick");

    CommandOutput::text(format!("Kicked {}", who.join(", ")))
}
