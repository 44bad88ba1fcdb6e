//! Input line parsing.

/// What a line typed at the prompt asks for.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// Show the conversation list
    List,
    /// Show conversations whose title contains the query
    Search(String),
    /// Open the thread with a user
    Open(String),
    /// Reconnect after the connection gave up
    Retry,
    Help,
    Quit,
    /// Send the line to the open thread
    Send(String),
    /// A `/command` that is not known or misses its argument
    Invalid(String),
}

impl Command {
    pub fn parse(line: &str) -> Self {
        let line = line.trim();
        let Some(rest) = line.strip_prefix('/') else {
            return Command::Send(line.to_string());
        };

        let (name, argument) = match rest.split_once(char::is_whitespace) {
            Some((name, argument)) => (name, argument.trim()),
            None => (rest, ""),
        };
        match (name, argument) {
            ("list" | "ls", _) => Command::List,
            ("search", "") | ("open", "") => {
                Command::Invalid(format!("/{} needs an argument", name))
            }
            ("search", query) => Command::Search(query.to_string()),
            ("open", user) => Command::Open(user.to_string()),
            ("retry", _) => Command::Retry,
            ("help", _) => Command::Help,
            ("quit" | "exit", _) => Command::Quit,
            _ => Command::Invalid(format!("unknown command '/{}'", name)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_plain_line_is_a_message() {
        // テスト項目: スラッシュで始まらない行はメッセージとして扱われる
        // given (前提条件):
        let line = "  hello there ";

        // when (操作):
        let command = Command::parse(line);

        // then (期待する結果):
        assert_eq!(command, Command::Send("hello there".to_string()));
    }

    #[test]
    fn test_commands_with_arguments() {
        // テスト項目: 引数付きのコマンドが解析される
        // given (前提条件) / when (操作) / then (期待する結果):
        assert_eq!(Command::parse("/open bob"), Command::Open("bob".to_string()));
        assert_eq!(
            Command::parse("/search  my notes "),
            Command::Search("my notes".to_string())
        );
        assert_eq!(Command::parse("/list"), Command::List);
        assert_eq!(Command::parse("/retry"), Command::Retry);
        assert_eq!(Command::parse("/quit"), Command::Quit);
    }

    #[test]
    fn test_missing_argument_and_unknown_command_are_invalid() {
        // テスト項目: 引数のない /open と未知のコマンドは Invalid になる
        // given (前提条件) / when (操作) / then (期待する結果):
        assert!(matches!(Command::parse("/open"), Command::Invalid(_)));
        assert!(matches!(Command::parse("/dance now"), Command::Invalid(_)));
    }
}
