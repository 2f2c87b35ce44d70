//! Line commands understood by the terminal view.
//!
//! Lines starting with `/` are controls; every other line is a chat message.

#[derive(Debug, PartialEq, Eq)]
pub enum ConsoleCommand {
    Help,
    Quit,
    List,
    Reload,
    New(String),
    Select(usize),
    /// Raw line for the controller; blank lines are dropped there.
    Submit(String),
    /// Unrecognized or malformed control with a hint for the user.
    Invalid(String),
}

pub fn parse(input: &str) -> ConsoleCommand {
    let trimmed = input.trim();
    if !trimmed.starts_with('/') {
        return ConsoleCommand::Submit(input.to_string());
    }

    let (cmd, arg) = match trimmed.split_once(char::is_whitespace) {
        Some((cmd, arg)) => (cmd, arg.trim()),
        None => (trimmed, ""),
    };

    match cmd.to_lowercase().as_str() {
        "/help" | "/h" | "/?" => ConsoleCommand::Help,
        "/quit" | "/exit" | "/q" => ConsoleCommand::Quit,
        "/list" | "/ls" => ConsoleCommand::List,
        "/reload" => ConsoleCommand::Reload,
        "/new" => {
            if arg.is_empty() {
                ConsoleCommand::Invalid("/new requires a session id".to_string())
            } else {
                ConsoleCommand::New(arg.to_string())
            }
        }
        "/select" | "/s" => match arg.parse::<usize>() {
            Ok(index) => ConsoleCommand::Select(index),
            Err(_) => ConsoleCommand::Invalid(format!(
                "/select expects a session number from /list, got '{arg}'"
            )),
        },
        other => ConsoleCommand::Invalid(format!("unknown command {other}, try /help")),
    }
}

pub const HELP_TEXT: &str = "\
  /list            show sessions
  /select <n>      switch to session n (alias /s)
  /new <id>        create a session
  /reload          re-read settings (delay and reply prefix)
  /help            show this help
  /quit            leave (alias /exit, /q)
  anything else    send as a message";

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn plain_text_is_submitted_verbatim() {
        assert_eq!(
            parse("  hello there "),
            ConsoleCommand::Submit("  hello there ".to_string())
        );
        assert_eq!(parse(""), ConsoleCommand::Submit(String::new()));
    }

    #[test]
    fn select_parses_index_and_aliases() {
        assert_eq!(parse("/select 2"), ConsoleCommand::Select(2));
        assert_eq!(parse("/s   0"), ConsoleCommand::Select(0));
        assert_eq!(parse("/SELECT 1"), ConsoleCommand::Select(1));
    }

    #[test]
    fn negative_or_missing_index_is_invalid() {
        assert!(matches!(parse("/select -1"), ConsoleCommand::Invalid(_)));
        assert!(matches!(parse("/select"), ConsoleCommand::Invalid(_)));
        assert!(matches!(parse("/s two"), ConsoleCommand::Invalid(_)));
    }

    #[test]
    fn new_keeps_inner_spaces_in_id() {
        assert_eq!(
            parse("/new  Weekend plans "),
            ConsoleCommand::New("Weekend plans".to_string())
        );
        assert!(matches!(parse("/new"), ConsoleCommand::Invalid(_)));
    }

    #[test]
    fn control_aliases() {
        for quit in ["/quit", "/exit", "/q"] {
            assert_eq!(parse(quit), ConsoleCommand::Quit);
        }
        assert_eq!(parse("/?"), ConsoleCommand::Help);
        assert_eq!(parse("/ls"), ConsoleCommand::List);
        assert_eq!(parse("/Reload"), ConsoleCommand::Reload);
        assert!(matches!(parse("/dance"), ConsoleCommand::Invalid(_)));
    }
}
