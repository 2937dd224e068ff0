//! Chat command parsing

/// A prefixed chat message split into a command name and its arguments
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedCommand {
    pub command: String,
    pub args: Vec<String>,
}

/// Parse `"<prefix><command> <args...>"`. Returns `None` for ordinary chat.
pub fn parse_command(prefix: &str, text: &str) -> Option<ParsedCommand> {
    let rest = text.trim_start().strip_prefix(prefix)?;
    let mut parts = rest.split_whitespace();
    let command = parts.next()?.to_lowercase();

    Some(ParsedCommand {
        command,
        args: parts.map(str::to_string).collect(),
    })
}

/// Commands the daemon understands from chat
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ChatCommand {
    /// End the current turn, or start the next speaker if the floor is empty
    Next,
    /// Skip the named participant, or the current speaker if none is given
    Skip { target: Option<String> },
    Status,
    Shuffle,
    Reset,
    /// Toggle listing completed speakers in status replies
    Verbose,
    Unknown(String),
}

impl ChatCommand {
    pub fn from_parsed(parsed: &ParsedCommand) -> Self {
        match parsed.command.as_str() {
            "next" => ChatCommand::Next,
            "skip" => ChatCommand::Skip {
                target: (!parsed.args.is_empty()).then(|| parsed.args.join(" ")),
            },
            "status" | "queue" => ChatCommand::Status,
            "shuffle" => ChatCommand::Shuffle,
            "reset" => ChatCommand::Reset,
            "verbose" => ChatCommand::Verbose,
            other => ChatCommand::Unknown(other.to_string()),
        }
    }

    pub fn parse(prefix: &str, text: &str) -> Option<Self> {
        parse_command(prefix, text).map(|parsed| Self::from_parsed(&parsed))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_command_with_args() {
        assert_eq!(
            parse_command("!", "!next foo"),
            Some(ParsedCommand {
                command: "next".into(),
                args: vec!["foo".into()],
            })
        );
    }

    #[test]
    fn test_plain_text_is_not_a_command() {
        assert_eq!(parse_command("!", "hello everyone"), None);
        assert_eq!(parse_command("!", "!"), None);
        assert_eq!(parse_command("!", ""), None);
    }

    #[test]
    fn test_custom_prefix_and_whitespace() {
        let parsed = parse_command("/q ", "  /q Skip   Jane   Smith ").unwrap();
        assert_eq!(parsed.command, "skip");
        assert_eq!(parsed.args, vec!["Jane", "Smith"]);
    }

    #[test]
    fn test_from_parsed() {
        assert_eq!(ChatCommand::parse("!", "!next"), Some(ChatCommand::Next));
        assert_eq!(
            ChatCommand::parse("!", "!skip"),
            Some(ChatCommand::Skip { target: None })
        );
        assert_eq!(
            ChatCommand::parse("!", "!skip Jane Smith"),
            Some(ChatCommand::Skip {
                target: Some("Jane Smith".into())
            })
        );
        assert_eq!(ChatCommand::parse("!", "!STATUS"), Some(ChatCommand::Status));
        assert_eq!(ChatCommand::parse("!", "!shuffle"), Some(ChatCommand::Shuffle));
        assert_eq!(ChatCommand::parse("!", "!reset"), Some(ChatCommand::Reset));
        assert_eq!(ChatCommand::parse("!", "!verbose"), Some(ChatCommand::Verbose));
        assert_eq!(
            ChatCommand::parse("!", "!dance"),
            Some(ChatCommand::Unknown("dance".into()))
        );
    }
}
