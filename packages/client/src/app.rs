//! Interactive session: one tab, a prompt, and the inbound event stream.

use std::sync::Arc;

use rustyline::{DefaultEditor, error::ReadlineError};
use tabiji_chat::{
    ChatConfig, ChatError, ChatTab, EventOrigin,
    connection::ConnectionState,
    controller::{HistoryRequest, MessageSide},
    domain::{ChatEvent, CredentialStore, Message, Presence, UserId},
};
use tokio::sync::mpsc;

use crate::{
    command::Command,
    error::ClientError,
    formatter::MessageFormatter,
    ui::{print_above_prompt, prompt},
};

type HistoryOutcome = (HistoryRequest, Result<Vec<Message>, ChatError>);

struct Session {
    tab: ChatTab,
    me: UserId,
    prompt: String,
    history_tx: mpsc::UnboundedSender<HistoryOutcome>,
}

impl Session {
    fn show(&self, output: &str) {
        if !output.is_empty() {
            print_above_prompt(output, &self.prompt);
        }
    }

    /// Name shown for `user_id`: the conversation title when known.
    fn name_of(&self, user_id: &UserId) -> String {
        self.tab
            .list
            .conversations()
            .into_iter()
            .find(|conversation| conversation.counterpart_id == *user_id)
            .map(|conversation| conversation.title().to_string())
            .unwrap_or_else(|| user_id.to_string())
    }

    fn show_list(&self, query: Option<&str>) {
        let conversations = match query {
            Some(query) => self.tab.list.search(query),
            None => self.tab.list.conversations(),
        };
        self.show(&MessageFormatter::format_conversation_list(
            &conversations,
            self.tab.list.presence(),
        ));
    }

    fn format_thread_message(&self, message: &Message) -> String {
        let side = self.tab.thread.side_of(message);
        let from = match side {
            MessageSide::Outgoing => self.me.to_string(),
            MessageSide::Incoming => self.name_of(&message.sender_id),
        };
        let status = self.tab.thread.status_of(message);
        MessageFormatter::format_message(&from, message, side, status)
    }

    /// Start loading the open thread's history in the background.
    fn start_history_load(&mut self) {
        let request = match self.tab.thread.begin_load() {
            Ok(request) => request,
            Err(e) => {
                self.show(&MessageFormatter::format_notice(&e.to_string()));
                return;
            }
        };
        let fetcher = self.tab.thread.fetcher();
        let history_tx = self.history_tx.clone();
        tokio::spawn(async move {
            let outcome = fetcher.fetch(&request).await;
            let _ = history_tx.send((request, outcome));
        });
    }

    fn apply_history(
        &mut self,
        request: &HistoryRequest,
        outcome: Result<Vec<Message>, ChatError>,
    ) {
        match self.tab.thread.apply_history(request, outcome) {
            Ok(()) if self.tab.thread.counterpart() == Some(&request.counterpart_id) => {
                let mut output = String::new();
                let mut current_day = None;
                for message in self.tab.thread.messages() {
                    if let Some(day) = message.created_at.calendar_day()
                        && current_day != Some(day)
                    {
                        current_day = Some(day);
                        output.push_str(&MessageFormatter::format_day_separator(&day));
                    }
                    output.push_str(&self.format_thread_message(message));
                }
                self.show(&output);
            }
            Ok(()) => {}
            Err(e) => self.show(&MessageFormatter::format_notice(&format!(
                "history could not be loaded: {}",
                e
            ))),
        }
    }

    /// Returns `false` when the session should end.
    async fn handle_command(&mut self, command: Command) -> bool {
        match command {
            Command::List => {
                if let Err(e) = self.tab.list.load().await {
                    self.show(&MessageFormatter::format_notice(&e.to_string()));
                }
                self.show_list(None);
            }
            Command::Search(query) => self.show_list(Some(&query)),
            Command::Open(user) => match UserId::new(user) {
                Ok(counterpart_id) => {
                    let header = MessageFormatter::format_thread_header(
                        &self.name_of(&counterpart_id),
                        self.tab.list.presence().get(&counterpart_id),
                    );
                    self.tab.thread.open(counterpart_id);
                    self.show(&header);
                    self.start_history_load();
                }
                Err(e) => self.show(&MessageFormatter::format_notice(&e.to_string())),
            },
            Command::Retry => {
                if self.tab.state().is_active() {
                    self.show(&MessageFormatter::format_notice("already connected"));
                } else if let Err(e) = self.tab.connect() {
                    self.show(&MessageFormatter::format_notice(&e.to_string()));
                }
            }
            Command::Help => self.show(&MessageFormatter::format_help()),
            Command::Quit => return false,
            Command::Invalid(reason) => self.show(&MessageFormatter::format_notice(&reason)),
            Command::Send(text) => self.send(&text),
        }
        true
    }

    fn send(&mut self, text: &str) {
        if self.tab.thread.counterpart().is_none() {
            self.show(&MessageFormatter::format_notice(
                "no thread open, use /open <user> first",
            ));
            return;
        }

        self.tab.thread.on_input(text);
        match self.tab.thread.send(text) {
            Ok(true) => {
                if let Some(pending) = self.tab.thread.messages().last() {
                    self.show(&self.format_thread_message(pending));
                }
            }
            Ok(false) => {}
            Err(e) => {
                let notice = self
                    .tab
                    .thread
                    .notice()
                    .map(str::to_owned)
                    .unwrap_or_else(|| e.to_string());
                self.show(&MessageFormatter::format_notice(&notice));
            }
        }
    }

    async fn handle_event(&mut self, origin: EventOrigin, event: ChatEvent) {
        tracing::debug!("Inbound {} ({:?})", event.name(), origin);
        let in_thread = match (&event, self.tab.thread.counterpart()) {
            (ChatEvent::NewMessage(message), Some(counterpart)) => {
                message.is_between(&self.me, counterpart)
            }
            _ => false,
        };

        if let Err(e) = self.tab.route(&event).await {
            tracing::warn!("Conversation list refresh failed: {}", e);
        }

        match &event {
            ChatEvent::NewMessage(message) if in_thread => {
                self.show(&self.format_thread_message(message));
            }
            ChatEvent::NewMessage(message) if message.sender_id != self.me => {
                self.show(&MessageFormatter::format_message_elsewhere(
                    &self.name_of(&message.sender_id),
                    &message.content,
                ));
            }
            ChatEvent::Typing {
                sender_id,
                is_typing: true,
            } if self.tab.thread.counterpart() == Some(sender_id) => {
                self.show(&MessageFormatter::format_typing(&self.name_of(sender_id)));
            }
            ChatEvent::PresenceUpdate(update) if update.user_id != self.me => {
                let presence = Presence {
                    is_online: update.is_online,
                    last_seen: update.last_seen,
                };
                self.show(&MessageFormatter::format_presence_change(
                    &self.name_of(&update.user_id),
                    &presence,
                ));
            }
            _ => {}
        }
    }
}

/// Read lines on a dedicated thread (rustyline is synchronous).
fn spawn_readline(prompt: String, input_tx: mpsc::UnboundedSender<String>) {
    std::thread::spawn(move || {
        let mut rl = match DefaultEditor::new() {
            Ok(rl) => rl,
            Err(e) => {
                eprintln!("Failed to initialize readline: {}", e);
                return;
            }
        };

        loop {
            match rl.readline(&prompt) {
                Ok(line) => {
                    let line = line.trim();
                    if !line.is_empty() {
                        rl.add_history_entry(line).ok();
                        if input_tx.send(line.to_string()).is_err() {
                            break;
                        }
                    }
                }
                Err(ReadlineError::Interrupted) | Err(ReadlineError::Eof) => {
                    tracing::info!("Input closed");
                    break;
                }
                Err(err) => {
                    tracing::error!("Readline error: {}", err);
                    break;
                }
            }
        }
    });
}

/// Run an interactive chat session until `/quit`, Ctrl+C or Ctrl+D.
///
/// # Errors
///
/// Returns [`ClientError::Chat`] when the connection cannot be started.
pub async fn run_client(
    config: ChatConfig,
    me: UserId,
    credentials: Arc<dyn CredentialStore>,
) -> Result<(), ClientError> {
    let mut tab = ChatTab::new(&config, me.clone(), credentials, None);
    tab.connect()?;
    if let Err(e) = tab.list.load().await {
        tracing::warn!("Initial conversation list load failed: {}", e);
    }

    let (history_tx, mut history_rx) = mpsc::unbounded_channel();
    let mut session = Session {
        prompt: prompt(me.as_str()),
        tab,
        me,
        history_tx,
    };
    let mut state_rx = session.tab.manager.subscribe_state();

    println!(
        "\nYou are '{}'. Type /help for commands. Press Ctrl+C to exit.",
        session.me
    );
    session.show_list(None);

    let (input_tx, mut input_rx) = mpsc::unbounded_channel();
    spawn_readline(session.prompt.clone(), input_tx);

    loop {
        tokio::select! {
            line = input_rx.recv() => {
                let Some(line) = line else { break };
                if !session.handle_command(Command::parse(&line)).await {
                    break;
                }
            }
            Some((origin, event)) = session.tab.next_event() => {
                session.handle_event(origin, event).await;
            }
            Some((request, outcome)) = history_rx.recv() => {
                session.apply_history(&request, outcome);
            }
            changed = state_rx.changed() => {
                if changed.is_err() {
                    break;
                }
                let state: ConnectionState = *state_rx.borrow_and_update();
                session.show(&MessageFormatter::format_connection_state(state));
            }
        }
    }

    session.tab.manager.disconnect();
    println!("\nBye!");
    Ok(())
}
