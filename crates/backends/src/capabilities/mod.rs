//! One module per capability. Each maps action strings to fallback chains
//! and renders the outcome as a [`CommandResult`].

pub mod appearance;
pub mod application;
pub mod clipboard;
pub mod connectivity;
pub mod media;
pub mod notification;
pub mod screenshot;
pub mod sound;
pub mod system;
pub mod window;

use crate::chain::Answer;
use deskpilot_core::{Command, CommandResult, DeskError, DeskResult};
use serde_json::Value;
use std::collections::BTreeMap;

pub(crate) type Data = BTreeMap<String, Value>;

pub(crate) fn data<const N: usize>(pairs: [(&str, Value); N]) -> Data {
    pairs
        .into_iter()
        .map(|(key, value)| (key.to_string(), value))
        .collect()
}

pub(crate) fn unsupported(command: &Command) -> CommandResult {
    let error = DeskError::CapabilityUnsupported(format!(
        "{} has no action '{}'",
        command.command_type(),
        command.action()
    ));
    CommandResult::failure(format!("Cannot run {command}"), error.to_string())
}

pub(crate) fn missing_argument(action: &str, what: &str) -> CommandResult {
    let error = DeskError::OperationFailed(format!("{action} needs a {what}"));
    CommandResult::failure(format!("Cannot {action}: no {what} given"), error.to_string())
}

pub(crate) fn mutation<T>(outcome: DeskResult<Answer<T>>, done: String, failed: &str) -> CommandResult {
    match outcome {
        Ok(_) => CommandResult::success(done),
        Err(e) => CommandResult::failure(format!("Failed to {failed}"), e.to_string()),
    }
}

pub(crate) fn query<T>(
    outcome: DeskResult<Answer<T>>,
    failed: &str,
    render: impl FnOnce(&T) -> (String, Data),
) -> CommandResult {
    match outcome {
        Ok(answer) => {
            let (output, data) = render(&answer.value);
            let result = CommandResult::success_with_data(output, data);
            if answer.degraded {
                result.degraded()
            } else {
                result
            }
        }
        Err(e) => CommandResult::failure(format!("Failed to {failed}"), e.to_string()),
    }
}

/// Tool output that could not be read as the expected value.
pub(crate) fn unparsable(program: &str, output: &str) -> DeskError {
    DeskError::OperationFailed(format!(
        "unexpected {program} output: {}",
        output.trim().lines().next().unwrap_or_default()
    ))
}

/// Text argument from `key`, else the command target.
pub(crate) fn text_argument(command: &Command, key: &str) -> Option<String> {
    command
        .argument_str(key)
        .map(str::to_string)
        .or_else(|| Some(command.target().to_string()))
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
}

/// Expands a leading `~/` against `$HOME`.
pub(crate) fn expand_home(path: &str) -> String {
    match (path.strip_prefix("~/"), std::env::var("HOME")) {
        (Some(rest), Ok(home)) => format!("{}/{}", home.trim_end_matches('/'), rest),
        _ => path.to_string(),
    }
}
