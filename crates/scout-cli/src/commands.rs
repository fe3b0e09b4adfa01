//! Slash commands typed at the prompt. Anything else is a chat message.

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Chat(String),
    New(Option<String>),
    Rename(String),
    Switch(String),
    List,
    Clear,
    Delete(Option<String>),
    Model(Option<String>),
    Compact,
    Retry,
    Discard,
    Help,
    Quit,
    Unknown(String),
}

pub const HELP: &str = "\
/new [name]        start a session (named from your first message if omitted)
/rename <name>     rename the active session
/switch <name|n>   open a session by name or list number
/list              list sessions
/clear             reset the active session
/delete [name]     delete a session (default: the active one)
/model [name]      show or change the completion model
/compact           summarize older messages of the active session now
/retry             write the last change that failed to save
/discard           drop the last change that failed to save
/help              show this help
/quit              exit";

pub fn parse(line: &str) -> Option<Command> {
    let line = line.trim();
    if line.is_empty() {
        return None;
    }
    let Some(rest) = line.strip_prefix('/') else {
        return Some(Command::Chat(line.to_string()));
    };

    let (name, arg) = match rest.split_once(char::is_whitespace) {
        Some((name, arg)) => (name, Some(arg.trim().to_string()).filter(|a| !a.is_empty())),
        None => (rest, None),
    };

    let command = match (name, arg) {
        ("new", arg) => Command::New(arg),
        ("rename", Some(arg)) => Command::Rename(arg),
        ("switch", Some(arg)) => Command::Switch(arg),
        ("list" | "ls", None) => Command::List,
        ("clear", None) => Command::Clear,
        ("delete", arg) => Command::Delete(arg),
        ("model", arg) => Command::Model(arg),
        ("compact", None) => Command::Compact,
        ("retry", None) => Command::Retry,
        ("discard", None) => Command::Discard,
        ("help" | "?", _) => Command::Help,
        ("quit" | "exit" | "q", None) => Command::Quit,
        _ => Command::Unknown(line.to_string()),
    };
    Some(command)
}
