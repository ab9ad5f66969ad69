use crate::control::{ControlError, Controller};

/// One line typed at the console.
#[derive(Debug, Clone, PartialEq)]
pub enum ConsoleCommand {
    Start,
    Stop,
    Bpm(f64),
    Ppq(u32),
    Quit,
}

pub fn parse_line(line: &str) -> Result<ConsoleCommand, String> {
    let mut words = line.split_whitespace();
    let command = words.next().unwrap_or_default().to_ascii_lowercase();
    let argument = words.next();

    match (command.as_str(), argument) {
        ("start" | "play", None) => Ok(ConsoleCommand::Start),
        ("stop", None) => Ok(ConsoleCommand::Stop),
        ("quit" | "exit" | "q", None) => Ok(ConsoleCommand::Quit),
        ("bpm", Some(value)) => value
            .parse()
            .map(ConsoleCommand::Bpm)
            .map_err(|_| format!("'{}' is not a number", value)),
        ("ppq", Some(value)) => value
            .parse()
            .map(ConsoleCommand::Ppq)
            .map_err(|_| format!("'{}' is not a whole number", value)),
        ("", _) => Err("empty command".to_string()),
        _ => Err(format!(
            "unknown command '{}' (try: start, stop, bpm N, ppq N, quit)",
            line.trim()
        )),
    }
}

/// Forwards a parsed console command. `Quit` is left to the caller.
pub fn dispatch(controller: &Controller, command: &ConsoleCommand) -> Result<(), ControlError> {
    match *command {
        ConsoleCommand::Start => controller.start(),
        ConsoleCommand::Stop => controller.stop(),
        ConsoleCommand::Bpm(bpm) => controller.set_bpm(bpm),
        ConsoleCommand::Ppq(ppq) => controller.set_ppq(ppq),
        ConsoleCommand::Quit => Ok(()),
    }
}
