//! External resolution of inputs the tables cannot handle.
//!
//! The augmenter answers with one line in the grammar
//! `TYPE:ACTION:TARGET[:k1=v1,k2=v2]`.

use async_trait::async_trait;
use deskpilot_core::{Arguments, Command, CommandType, DeskError, DeskResult};
use deskpilot_executor::CallContext;
use serde_json::Value;

#[async_trait]
pub trait IntentAugmenter: Send + Sync {
    /// Returns the raw response text for `text`.
    async fn resolve(&self, text: &str, ctx: &CallContext) -> DeskResult<String>;

    fn is_available(&self) -> bool;
}

/// Parses the first non-empty line of an augmenter response. Violations are
/// reported, never repaired.
pub fn parse_augmented_response(response: &str, raw_input: &str) -> DeskResult<Command> {
    let line = response
        .lines()
        .map(str::trim)
        .find(|line| !line.is_empty())
        .ok_or_else(|| DeskError::MalformedAugmentedResponse("empty response".to_string()))?;

    let segments: Vec<&str> = line.splitn(4, ':').collect();
    if segments.len() < 3 {
        return Err(DeskError::MalformedAugmentedResponse(format!(
            "expected TYPE:ACTION:TARGET, got '{line}'"
        )));
    }

    let command_type: CommandType = segments[0]
        .parse()
        .map_err(DeskError::MalformedAugmentedResponse)?;

    let action = segments[1].trim();
    if action.is_empty() {
        return Err(DeskError::MalformedAugmentedResponse(format!(
            "empty action in '{line}'"
        )));
    }

    let arguments: Arguments = segments
        .get(3)
        .map(|pairs| {
            pairs
                .split(',')
                .filter_map(|pair| pair.split_once('='))
                .map(|(k, v)| (k.trim().to_string(), Value::String(v.trim().to_string())))
                .filter(|(k, _)| !k.is_empty())
                .collect()
        })
        .unwrap_or_default();

    Ok(Command::new(command_type, action, segments[2].trim(), raw_input).with_arguments(arguments))
}
