use thiserror::Error;

/// Prefix stamped onto every queued command so the controller can tell
/// relay traffic from line noise on its serial console.
pub const COMMAND_PREFIX: &str = "CMD:";

/// Verbs accepted bare, with no argument.
pub const CONTROL_COMMANDS: [&str; 3] = ["START", "STOP", "RESUME"];

/// Manual override tokens; each takes a `:0` or `:1` suffix.
pub const MANUAL_COMMANDS: [&str; 4] = [
    "MANUAL_CINTA",
    "MANUAL_BOMBA",
    "MANUAL_LED_G",
    "MANUAL_LED_R",
];

/// Prefix of the batch-target command, e.g. `SET_META:12`.
pub const SET_META_PREFIX: &str = "SET_META:";

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CommandError {
    #[error("invalid SET_META value: must be an integer greater than 0")]
    InvalidMetaValue,
    #[error("unknown manual command: {0}")]
    UnknownManualCommand(String),
    #[error(
        "unrecognized command; accepted: START, STOP, RESUME, MANUAL_CINTA:<0|1>, \
         MANUAL_BOMBA:<0|1>, MANUAL_LED_G:<0|1>, MANUAL_LED_R:<0|1>, SET_META:<n>"
    )]
    UnknownCommand,
}

/// Validates an operator command and renders its qualified wire form.
///
/// Matching is case-insensitive and first match wins, in this order:
/// `SET_META:` payloads, `MANUAL_*:<0|1>` overrides, then the bare
/// control verbs. A well-shaped manual override with an unknown token
/// gets its own error; anything else that fails to match (including a
/// known manual token with a bad suffix, like `MANUAL_CINTA:2`) falls
/// through to the generic rejection.
pub fn qualify(raw: &str) -> Result<String, CommandError> {
    let input = raw.to_uppercase();

    if let Some(remainder) = input.strip_prefix(SET_META_PREFIX) {
        let meta = remainder
            .trim()
            .parse::<i64>()
            .map_err(|_| CommandError::InvalidMetaValue)?;
        if meta <= 0 {
            return Err(CommandError::InvalidMetaValue);
        }
        return Ok(format!("{COMMAND_PREFIX}{SET_META_PREFIX}{meta}"));
    }

    if let Some((token, bit)) = input.split_once(':') {
        if is_manual_shaped(token) && matches!(bit, "0" | "1") {
            if MANUAL_COMMANDS.contains(&token) {
                return Ok(format!("{COMMAND_PREFIX}{token}:{bit}"));
            }
            return Err(CommandError::UnknownManualCommand(token.to_string()));
        }
    }

    if CONTROL_COMMANDS.contains(&input.as_str()) {
        return Ok(format!("{COMMAND_PREFIX}{input}"));
    }

    Err(CommandError::UnknownCommand)
}

fn is_manual_shaped(token: &str) -> bool {
    match token.strip_prefix("MANUAL_") {
        Some(rest) => {
            !rest.is_empty() && rest.chars().all(|c| c.is_ascii_uppercase() || c == '_')
        }
        None => false,
    }
}

#[cfg(test)]
#[path = "tests/command_tests.rs"]
mod tests;
