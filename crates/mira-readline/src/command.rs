//! REPL input parsing.

/// Slash commands offered for completion.
pub const COMMANDS: [&str; 13] = [
    "/new", "/sessions", "/open", "/rename", "/delete", "/history", "/do", "/view", "/close",
    "/record", "/stop", "/help", "/quit",
];

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    NewChat,
    Sessions,
    /// Session by list position or id.
    Open(String),
    Rename { key: String, title: String },
    Delete(String),
    History,
    /// Activate the n-th affordance of the latest reply.
    Do(usize),
    /// Open the n-th image of the latest reply.
    View(usize),
    Close,
    Record,
    Stop,
    Help,
    Quit,
    /// Plain text to send.
    Message(String),
    /// Malformed command with a usage hint.
    Invalid(String),
}

pub fn parse(line: &str) -> Command {
    let line = line.trim();
    if !line.starts_with('/') {
        return Command::Message(line.to_string());
    }

    let (name, rest) = match line.split_once(char::is_whitespace) {
        Some((name, rest)) => (name, rest.trim()),
        None => (line, ""),
    };

    match name {
        "/new" => Command::NewChat,
        "/sessions" => Command::Sessions,
        "/history" => Command::History,
        "/close" => Command::Close,
        "/record" => Command::Record,
        "/stop" => Command::Stop,
        "/help" => Command::Help,
        "/quit" | "/exit" => Command::Quit,
        "/open" => required(rest, "/open <n|id>", |key| Command::Open(key.to_string())),
        "/delete" => required(rest, "/delete <n|id>", |key| Command::Delete(key.to_string())),
        "/rename" => match rest.split_once(char::is_whitespace) {
            Some((key, title)) if !title.trim().is_empty() => Command::Rename {
                key: key.to_string(),
                title: title.trim().to_string(),
            },
            _ => Command::Invalid("Usage: /rename <n|id> <title>".to_string()),
        },
        "/do" => position(rest, "/do <n>", Command::Do),
        "/view" => position(rest, "/view <n>", Command::View),
        other => Command::Invalid(format!("Unknown command: {}", other)),
    }
}

fn required(rest: &str, usage: &str, build: impl FnOnce(&str) -> Command) -> Command {
    if rest.is_empty() {
        Command::Invalid(format!("Usage: {}", usage))
    } else {
        build(rest)
    }
}

fn position(rest: &str, usage: &str, build: impl FnOnce(usize) -> Command) -> Command {
    match rest.parse::<usize>() {
        Ok(n) if n >= 1 => build(n),
        _ => Command::Invalid(format!("Usage: {}", usage)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_plain_text_is_message() {
        assert_eq!(
            parse("  How to add a new region? "),
            Command::Message("How to add a new region?".to_string())
        );
    }

    #[test]
    fn test_commands_with_arguments() {
        assert_eq!(parse("/open 2"), Command::Open("2".to_string()));
        assert_eq!(
            parse("/rename abc  Regions setup "),
            Command::Rename {
                key: "abc".to_string(),
                title: "Regions setup".to_string()
            }
        );
        assert_eq!(parse("/do 3"), Command::Do(3));
        assert_eq!(parse("/view 1"), Command::View(1));
    }

    #[test]
    fn test_invalid_commands() {
        assert!(matches!(parse("/open"), Command::Invalid(_)));
        assert!(matches!(parse("/rename abc"), Command::Invalid(_)));
        assert!(matches!(parse("/do 0"), Command::Invalid(_)));
        assert!(matches!(parse("/do x"), Command::Invalid(_)));
        assert!(matches!(parse("/bogus"), Command::Invalid(_)));
    }

    #[test]
    fn test_every_listed_command_parses() {
        for name in COMMANDS {
            let line = match name {
                "/open" | "/delete" => format!("{} 1", name),
                "/rename" => format!("{} 1 title", name),
                "/do" | "/view" => format!("{} 1", name),
                _ => name.to_string(),
            };
            assert!(!matches!(parse(&line), Command::Invalid(_)), "{line}");
        }
    }
}
