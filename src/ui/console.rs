use std::{
    io::{self, BufRead, Write},
    sync::mpsc::{self, Receiver, RecvTimeoutError},
    thread,
    time::Duration,
};

use anyhow::{Context, Result};

use crate::{
    domain::{
        events::{ConsoleCommand, ConsoleInput, InputEvent},
        message::ChatMessage,
        state::MessageState,
    },
    infra::config::ChatConfig,
    ui::transcript::{build_transcript, format_message_line},
    usecases::{
        chat_room::ChatRoom,
        contracts::LineSource,
        delivery::DeliveryWaitError,
        load_history::{load_history, LoadHistoryError, LoadHistoryQuery},
        send_message::{send_message, SendMessageCommand, SendMessageOutcome},
    },
};

const INPUT_POLL_TIMEOUT: Duration = Duration::from_millis(100);

const HELP_TEXT: &str = "\
Type a message and press Enter to send it.
  /history  show recent messages
  /unread   show the number of unread messages
  /read     mark incoming messages as read
  /clear    delete this room's history
  /typing   tell the peer you are typing
  /quit     leave the chat";

/// Reads stdin on a background thread so the console can keep printing
/// incoming messages while the user is idle.
pub struct StdinLineSource {
    lines_rx: Receiver<String>,
}

impl StdinLineSource {
    pub fn spawn() -> Result<Self> {
        let (lines_tx, lines_rx) = mpsc::channel();

        thread::Builder::new()
            .name("sipchat-stdin".to_owned())
            .spawn(move || {
                for line in io::stdin().lock().lines() {
                    let Ok(line) = line else { break };
                    if lines_tx.send(line).is_err() {
                        break;
                    }
                }
            })
            .context("failed to spawn stdin reader")?;

        Ok(Self { lines_rx })
    }
}

impl LineSource for StdinLineSource {
    fn poll_line(&mut self) -> Result<InputEvent> {
        match self.lines_rx.recv_timeout(INPUT_POLL_TIMEOUT) {
            Ok(line) => Ok(InputEvent::Line(line)),
            Err(RecvTimeoutError::Timeout) => Ok(InputEvent::Tick),
            Err(RecvTimeoutError::Disconnected) => Ok(InputEvent::Closed),
        }
    }
}

/// Interactive loop for one room.
///
/// Returns when the user quits or the input closes. Incoming messages for
/// other rooms are dropped from `incoming` without being shown.
pub fn run_console(
    room: &dyn ChatRoom,
    incoming: &Receiver<ChatMessage>,
    input: &mut dyn LineSource,
    out: &mut dyn Write,
    chat: &ChatConfig,
) -> Result<()> {
    writeln!(out, "Chatting with {}. Type /help for commands.", room.peer_address())?;
    let mut peer_typing = false;

    loop {
        print_incoming(room, incoming, out)?;
        print_composing(room, &mut peer_typing, out)?;

        let line = match input.poll_line()? {
            InputEvent::Line(line) => line,
            InputEvent::Tick => continue,
            InputEvent::Closed => break,
        };

        match ConsoleInput::parse(&line) {
            None => {}
            Some(ConsoleInput::Command(ConsoleCommand::Quit)) => break,
            Some(ConsoleInput::Command(command)) => run_command(room, command, out, chat)?,
            Some(ConsoleInput::Text(text)) => send_and_report(room, &text, out, chat)?,
        }

        out.flush()?;
    }

    print_incoming(room, incoming, out)?;
    out.flush()?;
    Ok(())
}

/// Sends `text` and blocks until the delivery outcome is known or times out.
pub fn send_and_report(
    room: &dyn ChatRoom,
    text: &str,
    out: &mut dyn Write,
    chat: &ChatConfig,
) -> Result<()> {
    let tracker = match send_message(room, SendMessageCommand::tracked(text)) {
        Ok(SendMessageOutcome::Tracked(tracker)) => tracker,
        Ok(SendMessageOutcome::Queued) => {
            writeln!(out, "queued")?;
            return Ok(());
        }
        Err(error) => {
            writeln!(out, "! {}", error.user_message())?;
            return Ok(());
        }
    };

    let timeout = Duration::from_millis(chat.delivery_timeout_ms);
    match tracker.wait_terminal(timeout) {
        Ok(MessageState::Delivered) => writeln!(out, "✓ delivered ({})", tracker.message_id())?,
        Ok(state) => writeln!(
            out,
            "✗ {} ({})",
            state.as_label(),
            tracker.message_id()
        )?,
        Err(DeliveryWaitError::TimedOut { waited_ms, .. }) => writeln!(
            out,
            "… no delivery report after {waited_ms} ms ({})",
            tracker.message_id()
        )?,
        Err(DeliveryWaitError::Abandoned(id)) => {
            writeln!(out, "✗ delivery abandoned ({id})")?
        }
    }

    Ok(())
}

fn run_command(
    room: &dyn ChatRoom,
    command: ConsoleCommand,
    out: &mut dyn Write,
    chat: &ChatConfig,
) -> Result<()> {
    match command {
        ConsoleCommand::History => print_history(room, out, chat.history_page_size)?,
        ConsoleCommand::Unread => match room.unread_messages_count() {
            Ok(count) => writeln!(out, "{count} unread")?,
            Err(error) => writeln!(out, "! {error}")?,
        },
        ConsoleCommand::MarkRead => match room.mark_as_read() {
            Ok(()) => writeln!(out, "marked as read")?,
            Err(error) => writeln!(out, "! {error}")?,
        },
        ConsoleCommand::ClearHistory => match room.delete_history() {
            Ok(()) => writeln!(out, "history cleared")?,
            Err(error) => writeln!(out, "! {error}")?,
        },
        ConsoleCommand::Typing => match room.compose() {
            Ok(()) => writeln!(
                out,
                "{} knows you are typing",
                room.peer_address().display_name()
            )?,
            Err(error) => writeln!(out, "! {error}")?,
        },
        ConsoleCommand::Help => writeln!(out, "{HELP_TEXT}")?,
        ConsoleCommand::Quit => {}
    }

    Ok(())
}

pub fn print_history(room: &dyn ChatRoom, out: &mut dyn Write, page_size: usize) -> Result<()> {
    let output = match load_history(room, LoadHistoryQuery::new(page_size)) {
        Ok(output) => output,
        Err(LoadHistoryError::TemporarilyUnavailable) => {
            writeln!(out, "! history is temporarily unavailable")?;
            return Ok(());
        }
        Err(LoadHistoryError::DataContractViolation) => {
            writeln!(out, "! history contains messages of another room")?;
            return Ok(());
        }
    };

    if output.messages.is_empty() {
        writeln!(out, "(no messages)")?;
        return Ok(());
    }

    for element in build_transcript(&output.messages) {
        writeln!(out, "{}", element.render())?;
    }
    writeln!(
        out,
        "showing {} of {} ({} unread)",
        output.messages.len(),
        output.total,
        output.unread
    )?;

    Ok(())
}

fn print_incoming(
    room: &dyn ChatRoom,
    incoming: &Receiver<ChatMessage>,
    out: &mut dyn Write,
) -> Result<()> {
    for message in incoming.try_iter() {
        if message.peer() != room.peer_address() {
            tracing::trace!(peer = %message.peer(), "incoming message for another room");
            continue;
        }
        writeln!(out, "{}", format_message_line(&message))?;
    }

    Ok(())
}

/// Announces the peer once each time it starts typing.
fn print_composing(
    room: &dyn ChatRoom,
    peer_typing: &mut bool,
    out: &mut dyn Write,
) -> Result<()> {
    let typing = match room.is_remote_composing() {
        Ok(typing) => typing,
        Err(error) => {
            tracing::trace!(
                peer = %room.peer_address(),
                error = %error,
                "composing state unavailable"
            );
            false
        }
    };

    if typing && !*peer_typing {
        writeln!(out, "… {} is typing", room.peer_address().display_name())?;
    }
    *peer_typing = typing;

    Ok(())
}

#[cfg(test)]
pub struct MockLineSource {
    queue: std::collections::VecDeque<InputEvent>,
}

#[cfg(test)]
impl MockLineSource {
    pub fn from_lines(lines: &[&str]) -> Self {
        Self {
            queue: lines
                .iter()
                .map(|line| InputEvent::Line((*line).to_owned()))
                .collect(),
        }
    }
}

#[cfg(test)]
impl LineSource for MockLineSource {
    fn poll_line(&mut self) -> Result<InputEvent> {
        Ok(self.queue.pop_front().unwrap_or(InputEvent::Closed))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::FakeChatRoom;

    fn run(room: &FakeChatRoom, lines: &[&str]) -> String {
        let (_incoming_tx, incoming_rx) = mpsc::channel();
        run_with_incoming(room, &incoming_rx, lines)
    }

    fn run_with_incoming(
        room: &FakeChatRoom,
        incoming: &Receiver<ChatMessage>,
        lines: &[&str],
    ) -> String {
        let mut input = MockLineSource::from_lines(lines);
        let mut out = Vec::new();

        run_console(room, incoming, &mut input, &mut out, &ChatConfig::default())
            .expect("console should run");

        String::from_utf8(out).expect("console output is utf-8")
    }

    #[test]
    fn sends_text_lines_and_reports_delivery() {
        let room = FakeChatRoom::new("sip:alice@example.org");

        let output = run(&room, &["hello", "/quit", "ignored"]);

        assert_eq!(room.sent_texts(), vec!["hello".to_owned()]);
        assert!(output.contains("✓ delivered"), "output: {output}");
    }

    #[test]
    fn reports_failed_delivery() {
        let room = FakeChatRoom::new("sip:alice@example.org").failing_deliveries();

        let output = run(&room, &["hello"]);

        assert!(output.contains("✗ not delivered"), "output: {output}");
    }

    #[test]
    fn reports_unavailable_engine_without_aborting() {
        let room = FakeChatRoom::new("sip:alice@example.org").unavailable();

        let output = run(&room, &["hello", "/help"]);

        assert!(output.contains("! Messaging engine is not running."));
        assert!(output.contains("/history"));
    }

    #[test]
    fn blank_lines_send_nothing() {
        let room = FakeChatRoom::new("sip:alice@example.org");

        run(&room, &["", "   "]);

        assert!(room.sent_texts().is_empty());
    }

    #[test]
    fn history_command_prints_transcript_with_totals() {
        let room = FakeChatRoom::new("sip:alice@example.org");
        room.push_incoming("first");

        let output = run(&room, &["second", "/history"]);

        assert!(output.contains("← alice: first *"), "output: {output}");
        assert!(output.contains("→ me: second ✓"), "output: {output}");
        assert!(output.contains("showing 2 of 2 (1 unread)"), "output: {output}");
        assert_eq!(room.last_history_limit(), Some(50));
    }

    #[test]
    fn read_command_clears_unread_count() {
        let room = FakeChatRoom::new("sip:alice@example.org");
        room.push_incoming("ping");

        let output = run(&room, &["/unread", "/read", "/unread"]);

        let first = output.find("1 unread").expect("first count");
        let second = output.find("0 unread").expect("second count");
        assert!(first < second);
    }

    #[test]
    fn clear_command_empties_history() {
        let room = FakeChatRoom::new("sip:alice@example.org");
        room.push_incoming("ping");

        let output = run(&room, &["/clear", "/history"]);

        assert!(output.contains("history cleared"));
        assert!(output.contains("(no messages)"));
    }

    #[test]
    fn prints_incoming_messages_for_this_room_only() {
        let room = FakeChatRoom::new("sip:alice@example.org");
        let other = FakeChatRoom::new("sip:bob@example.org");
        let (incoming_tx, incoming_rx) = mpsc::channel();
        incoming_tx
            .send(room.push_incoming("from alice"))
            .expect("send incoming");
        incoming_tx
            .send(other.push_incoming("from bob"))
            .expect("send incoming");

        let output = run_with_incoming(&room, &incoming_rx, &[]);

        assert!(output.contains("from alice"));
        assert!(!output.contains("from bob"));
    }

    #[test]
    fn typing_command_sends_composing_notice() {
        let room = FakeChatRoom::new("sip:alice@example.org");

        let output = run(&room, &["/typing"]);

        assert_eq!(room.composed_count(), 1);
        assert!(output.contains("alice knows you are typing"), "output: {output}");
    }

    #[test]
    fn announces_typing_peer_once() {
        let room = FakeChatRoom::new("sip:alice@example.org");
        room.set_remote_composing(true);

        let output = run(&room, &["/unread", "/unread"]);

        assert_eq!(
            output.matches("… alice is typing").count(),
            1,
            "output: {output}"
        );
    }
}
