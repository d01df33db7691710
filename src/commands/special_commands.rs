//! Special commands parser for the interactive chat client
//!
//! Lines starting with `/` manage the universal prompt or the session
//! instead of being sent to the relay. Command names are case-insensitive;
//! prompt text keeps its case.

use thiserror::Error;

/// Errors that can occur when parsing special commands
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CommandError {
    /// Unknown command was entered
    #[error("Unknown command: {0}\n\nType '/help' to see available commands")]
    UnknownCommand(String),

    /// Command was given an argument it does not take
    #[error("Unsupported argument for {command}: {arg}\n\nType '/help' to see valid usage")]
    UnsupportedArgument { command: String, arg: String },

    /// Command requires an argument but none was provided
    #[error("Command {command} requires an argument\n\nUsage: {usage}")]
    MissingArgument { command: String, usage: String },
}

/// Special commands that can be executed during interactive chat
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SpecialCommand {
    /// Show the universal prompt settings
    ShowSettings,

    /// Replace the universal prompt
    SetPrompt(String),

    /// Clear the universal prompt
    ClearPrompt,

    /// Display help information
    Help,

    /// Exit the interactive session
    Exit,

    /// Not a special command; the input is a chat message
    None,
}

/// Parse a line of user input into a special command
///
/// # Errors
///
/// Returns `CommandError::UnknownCommand` if the input starts with `/` but
/// names no command, `CommandError::MissingArgument` for `/prompt` without
/// text, and `CommandError::UnsupportedArgument` for arguments given to
/// commands that take none.
///
/// # Examples
///
/// ```
/// use relaychat::commands::special_commands::{parse_special_command, SpecialCommand};
///
/// assert_eq!(
///     parse_special_command("/prompt Respond in Pidgin.").unwrap(),
///     SpecialCommand::SetPrompt("Respond in Pidgin.".to_string())
/// );
/// assert_eq!(parse_special_command("hello").unwrap(), SpecialCommand::None);
/// assert!(parse_special_command("/nope").is_err());
/// ```
pub fn parse_special_command(input: &str) -> Result<SpecialCommand, CommandError> {
    let trimmed = input.trim();
    let lower = trimmed.to_lowercase();

    if !trimmed.starts_with('/') {
        return Ok(SpecialCommand::None);
    }

    let (name, arg) = match trimmed.split_once(char::is_whitespace) {
        Some((name, arg)) => (name.to_lowercase(), arg.trim()),
        None => (lower.clone(), ""),
    };

    let no_arg = |command: SpecialCommand| {
        if arg.is_empty() {
            Ok(command)
        } else {
            Err(CommandError::UnsupportedArgument {
                command: name.clone(),
                arg: arg.to_string(),
            })
        }
    };

    match name.as_str() {
        "/settings" => no_arg(SpecialCommand::ShowSettings),
        "/prompt" => {
            if arg.is_empty() {
                Err(CommandError::MissingArgument {
                    command: "/prompt".to_string(),
                    usage: "/prompt <text>".to_string(),
                })
            } else {
                Ok(SpecialCommand::SetPrompt(arg.to_string()))
            }
        }
        "/clear-prompt" => no_arg(SpecialCommand::ClearPrompt),
        "/help" | "/?" => no_arg(SpecialCommand::Help),
        "/exit" | "/quit" => no_arg(SpecialCommand::Exit),
        _ => Err(CommandError::UnknownCommand(trimmed.to_string())),
    }
}

/// Display help for the interactive chat client
pub fn print_help() {
    println!(
        r#"
Special Commands for Interactive Chat
=====================================

UNIVERSAL PROMPT:
  /settings       - Show the universal prompt and whether it is active
  /prompt <text>  - Set the universal prompt (saved immediately)
  /clear-prompt   - Clear the universal prompt

SESSION CONTROL:
  /help           - Show this help message
  /?              - Same as /help
  /exit           - Exit interactive mode
  /quit           - Same as /exit

NOTES:
  - Commands are case-insensitive
  - Regular text (not starting with /) is sent to the relay
  - The universal prompt is prepended to every conversation you send
"#
    );
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_settings() {
        assert_eq!(
            parse_special_command("/settings").unwrap(),
            SpecialCommand::ShowSettings
        );
    }

    #[test]
    fn test_parse_prompt_keeps_case_and_inner_spacing() {
        assert_eq!(
            parse_special_command("/PROMPT  Respond in  Pidgin English. ").unwrap(),
            SpecialCommand::SetPrompt("Respond in  Pidgin English.".to_string())
        );
    }

    #[test]
    fn test_parse_prompt_without_text_is_error() {
        let err = parse_special_command("/prompt").unwrap_err();
        assert_eq!(
            err,
            CommandError::MissingArgument {
                command: "/prompt".to_string(),
                usage: "/prompt <text>".to_string(),
            }
        );
    }

    #[test]
    fn test_parse_clear_prompt() {
        assert_eq!(
            parse_special_command("/clear-prompt").unwrap(),
            SpecialCommand::ClearPrompt
        );
    }

    #[test]
    fn test_parse_help_aliases() {
        assert_eq!(parse_special_command("/help").unwrap(), SpecialCommand::Help);
        assert_eq!(parse_special_command("/?").unwrap(), SpecialCommand::Help);
    }

    #[test]
    fn test_parse_exit_aliases() {
        for input in ["/exit", "/quit", "/EXIT", " /Quit "] {
            assert_eq!(
                parse_special_command(input).unwrap(),
                SpecialCommand::Exit,
                "input {:?}",
                input
            );
        }
    }

    #[test]
    fn test_parse_regular_text_returns_none() {
        assert_eq!(
            parse_special_command("hello there").unwrap(),
            SpecialCommand::None
        );
        assert_eq!(parse_special_command("").unwrap(), SpecialCommand::None);
    }

    #[test]
    fn test_parse_bare_exit_words_are_chat_messages() {
        for input in ["exit", "quit", "Quit"] {
            assert_eq!(parse_special_command(input).unwrap(), SpecialCommand::None);
        }
    }

    #[test]
    fn test_parse_unknown_command_returns_error() {
        assert_eq!(
            parse_special_command("/mode write").unwrap_err(),
            CommandError::UnknownCommand("/mode write".to_string())
        );
    }

    #[test]
    fn test_parse_unexpected_argument_returns_error() {
        assert_eq!(
            parse_special_command("/clear-prompt now").unwrap_err(),
            CommandError::UnsupportedArgument {
                command: "/clear-prompt".to_string(),
                arg: "now".to_string(),
            }
        );
    }
}
