use std::io::{self, Write};

use anyhow::Result;

use crate::{
    cli::{Cli, Command},
    domain, engine, infra,
    ui::{
        self,
        console::{run_console, send_and_report, StdinLineSource},
    },
    usecases::{
        self, bootstrap,
        chat_room::{ChatError, ChatRoom},
        context::AppContext,
        contracts::LineSource,
    },
};

const APP_ROOM_SUMMARY_FAILED: &str = "APP_ROOM_SUMMARY_FAILED";

pub fn run(cli: Cli) -> Result<()> {
    tracing::debug!(
        ui = ui::module_name(),
        domain = domain::module_name(),
        engine = engine::module_name(),
        usecases = usecases::module_name(),
        infra = infra::module_name(),
        "module boundaries loaded"
    );

    let context = bootstrap::bootstrap(cli.config.as_deref())?;
    let mut stdout = io::stdout().lock();

    match cli.command {
        Command::Send { to, text } => run_send(&context, &to, &text.join(" "), &mut stdout)?,
        Command::Chat { to } => {
            let mut input = StdinLineSource::spawn()?;
            run_chat(&context, &to, &mut input, &mut stdout)?
        }
        Command::Rooms { to } => run_rooms(&context, &to, &mut stdout)?,
    }

    context.engine.shutdown();
    Ok(())
}

fn run_send(context: &AppContext, to: &str, text: &str, out: &mut dyn Write) -> Result<()> {
    let room = context.rooms.get_or_create_chat_room(to)?;
    send_and_report(room.as_ref(), text, out, &context.config.chat)
}

fn run_chat(
    context: &AppContext,
    to: &str,
    input: &mut dyn LineSource,
    out: &mut dyn Write,
) -> Result<()> {
    let room = context.rooms.get_or_create_chat_room(to)?;
    let incoming = context.engine.subscribe_incoming();

    run_console(room.as_ref(), &incoming, input, out, &context.config.chat)
}

fn run_rooms(context: &AppContext, peers: &[String], out: &mut dyn Write) -> Result<()> {
    for peer in peers {
        context.rooms.get_or_create_chat_room(peer)?;
    }

    let rooms = context.rooms.chat_rooms();
    if rooms.is_empty() {
        writeln!(out, "no chat rooms")?;
        return Ok(());
    }

    for room in rooms {
        match room_summary(room.as_ref()) {
            Ok(line) => writeln!(out, "{line}")?,
            Err(error) => {
                tracing::warn!(
                    code = APP_ROOM_SUMMARY_FAILED,
                    peer = %room.peer_address(),
                    error = %error,
                    "failed to summarize chat room"
                );
                writeln!(out, "{}  unavailable", room.peer_address())?;
            }
        }
    }

    Ok(())
}

fn room_summary(room: &dyn ChatRoom) -> Result<String, ChatError> {
    Ok(format!(
        "{}  {} messages, {} unread",
        room.peer_address(),
        room.history_size()?,
        room.unread_messages_count()?
    ))
}
