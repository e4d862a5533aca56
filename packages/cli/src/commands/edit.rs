use crate::commands::open_session;
use crate::render::{event_line, outline};
use anyhow::Result;
use clap::Args;
use colored::Colorize;
use livedit_editor::{Answer, DurableStore, EditSession, KeyChord, NodeKey, Outcome};
use std::io::Write;
use std::str::FromStr;
use std::time::Duration;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::time::Instant;
use tracing::{debug, info};

#[derive(Debug, Args)]
pub struct EditArgs {
    /// Open without elevated access; edit mode stays locked
    #[arg(long)]
    pub viewer: bool,
}

/// One line of the interactive session
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReplCommand {
    Toggle,
    Undo,
    Redo,
    Key(KeyChord),
    /// Click a node, answering its prompt with `value`
    Press { node: NodeKey, value: Option<String> },
    /// Click the row button with this id
    Add(String),
    Delete(NodeKey),
    Type { node: NodeKey, text: String },
    Blur,
    Show,
    Status,
    Help,
    Quit,
}

impl FromStr for ReplCommand {
    type Err = String;

    fn from_str(line: &str) -> Result<Self, Self::Err> {
        let line = line.trim();
        let (word, rest) = match line.split_once(char::is_whitespace) {
            Some((word, rest)) => (word, rest.trim()),
            None => (line, ""),
        };

        let command = match word {
            "toggle" => ReplCommand::Toggle,
            "undo" => ReplCommand::Undo,
            "redo" => ReplCommand::Redo,
            "key" => {
                let chord = rest.parse::<KeyChord>().map_err(|err| err.to_string())?;
                ReplCommand::Key(chord)
            }
            "press" => {
                let (node, value) = match rest.split_once(char::is_whitespace) {
                    Some((node, value)) => (node, Some(value.trim().to_string())),
                    None => (rest, None),
                };
                ReplCommand::Press {
                    node: parse_node(node)?,
                    value,
                }
            }
            "add" if !rest.is_empty() => ReplCommand::Add(rest.to_string()),
            "add" => return Err("usage: add <button-id>".to_string()),
            "delete" => ReplCommand::Delete(parse_node(rest)?),
            "type" => {
                let (node, text) = rest.split_once(char::is_whitespace).unwrap_or((rest, ""));
                ReplCommand::Type {
                    node: parse_node(node)?,
                    text: text.trim_start().to_string(),
                }
            }
            "blur" => ReplCommand::Blur,
            "show" => ReplCommand::Show,
            "status" => ReplCommand::Status,
            "help" | "?" => ReplCommand::Help,
            "quit" | "exit" => ReplCommand::Quit,
            other => return Err(format!("unknown command `{}`, try `help`", other)),
        };
        Ok(command)
    }
}

fn parse_node(word: &str) -> Result<NodeKey, String> {
    if word.is_empty() {
        return Err("missing node key".to_string());
    }
    word.parse()
        .map_err(|_| format!("invalid node key `{}`", word))
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Flow {
    Continue,
    Quit,
}

pub async fn edit(args: EditArgs, cwd: &str) -> Result<()> {
    let origin = Instant::now();
    let (config, mut session) = open_session(cwd, !args.viewer, Duration::ZERO)?;
    info!(
        store = %session.store().dir().display(),
        "[livedit.cli] session opened"
    );

    println!(
        "{} editing {} {}",
        "✏️".bright_blue(),
        config.document.bright_white(),
        "(type `help` for commands)".dimmed()
    );
    print_events(&mut session);
    prompt(&session)?;

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    loop {
        let deadline = session.next_deadline();
        tokio::select! {
            line = lines.next_line() => {
                let Some(line) = line? else { break };
                if !line.trim().is_empty() {
                    match line.parse::<ReplCommand>() {
                        Ok(command) => {
                            if execute(&mut session, command, origin.elapsed()) == Flow::Quit {
                                break;
                            }
                        }
                        Err(message) => println!("{} {}", "✗".red(), message),
                    }
                }
                print_events(&mut session);
                prompt(&session)?;
            }
            _ = wait_until(origin, deadline) => {
                let outcome = session.tick(origin.elapsed());
                debug!(?outcome, "[livedit.cli] timer fired");
                print_events(&mut session);
            }
        }
    }

    // leaving edit mode commits pending typing
    session.set_edit_mode(false);
    print_events(&mut session);
    Ok(())
}

async fn wait_until(origin: Instant, deadline: Option<Duration>) {
    match deadline {
        Some(at) => tokio::time::sleep_until(origin + at).await,
        None => std::future::pending::<()>().await,
    }
}

fn prompt<S: DurableStore>(session: &EditSession<S>) -> Result<()> {
    let label = if session.edit_mode() { "edit" } else { "view" };
    print!("{} ", format!("{}>", label).bold());
    std::io::stdout().flush()?;
    Ok(())
}

fn print_events<S: DurableStore>(session: &mut EditSession<S>) {
    for event in session.drain_events() {
        println!("  {}", event_line(&event));
    }
}

/// Run one command against the session
pub fn execute<S: DurableStore>(
    session: &mut EditSession<S>,
    command: ReplCommand,
    now: Duration,
) -> Flow {
    match command {
        ReplCommand::Toggle => {
            let wanted = !session.edit_mode();
            if session.toggle_edit_mode() != wanted {
                println!("{} edit mode needs elevated access", "✗".red());
            }
        }
        ReplCommand::Undo => print_step("undo", session.undo()),
        ReplCommand::Redo => print_step("redo", session.redo()),
        ReplCommand::Key(chord) => {
            if !session.handle_key(&chord) {
                println!("{} {} passed through", "·".dimmed(), chord);
            }
        }
        ReplCommand::Press { node, value } => {
            print_outcome(session.activate(node, &mut Answer(value)));
        }
        ReplCommand::Add(button) => match session.document().find_by_id(&button) {
            Some(key) => print_outcome(session.activate(key, &mut Answer::cancel())),
            None => println!("{} no element with id `{}`", "✗".red(), button),
        },
        ReplCommand::Delete(node) => print_outcome(session.delete_item(node)),
        ReplCommand::Type { node, text } => print_outcome(session.input_text(node, &text, now)),
        ReplCommand::Blur => print_outcome(session.blur()),
        ReplCommand::Show => {
            for line in outline(session.document().root(), session.edit_mode()) {
                println!("{}", line);
            }
        }
        ReplCommand::Status => print_status(session),
        ReplCommand::Help => print_help(),
        ReplCommand::Quit => return Flow::Quit,
    }
    Flow::Continue
}

fn print_step(name: &str, moved: bool) {
    if moved {
        println!("{} {}", "✓".green(), name);
    } else {
        println!("{} nothing to {}", "·".dimmed(), name);
    }
}

fn print_outcome(outcome: Outcome) {
    match outcome {
        Outcome::Committed => println!("{} committed", "✓".green()),
        Outcome::Deferred => println!("{} pending", "…".yellow()),
        Outcome::Unchanged => println!("{} unchanged", "·".dimmed()),
        Outcome::Ignored => println!("{} ignored", "·".dimmed()),
    }
}

fn print_status<S: DurableStore>(session: &EditSession<S>) {
    let history = session.history();
    let availability = session.availability();
    let cursor = history
        .cursor()
        .map(|cursor| cursor.to_string())
        .unwrap_or_else(|| "-".to_string());

    println!("  mode     {}", if session.edit_mode() { "edit" } else { "view" });
    println!("  access   {}", if session.is_elevated() { "elevated" } else { "viewer" });
    println!("  history  {} of {} (cursor {})", history.len(), history.max_len(), cursor);
    println!("  undo     {}", availability.can_undo);
    println!("  redo     {}", availability.can_redo);
    println!("  pending  {}", session.has_pending_edit());
}

fn print_help() {
    let commands = [
        ("toggle", "enter or leave edit mode"),
        ("undo / redo", "step through history"),
        ("key <chord>", "send a shortcut, e.g. ctrl+z"),
        ("press <node> [value]", "click a node, answering any prompt"),
        ("add <button-id>", "click a row button"),
        ("delete <node>", "remove an item"),
        ("type <node> <text>", "replace a node's text"),
        ("blur", "commit pending typing now"),
        ("show", "print the document"),
        ("status", "print session state"),
        ("quit", "leave, saving pending edits"),
    ];
    for (usage, about) in commands {
        println!("  {:<22} {}", usage.bright_white(), about.dimmed());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use livedit_editor::{Document, EditorConfig, Element, MemoryStore, StaticGate};

    fn session() -> EditSession<MemoryStore> {
        let template = Document::new(
            Element::new("main")
                .with_child(
                    Element::new("div").with_id("skills-container").with_child(
                        Element::new("div")
                            .with_class("skill-card")
                            .with_child(Element::new("h3").with_text("Languages")),
                    ),
                )
                .with_child(
                    Element::new("button")
                        .with_id("add-skill-card")
                        .with_class("admin-only"),
                ),
        );
        EditSession::open(
            EditorConfig::default(),
            template,
            MemoryStore::new(),
            StaticGate(true),
            Duration::ZERO,
        )
        .unwrap()
    }

    #[test]
    fn test_parse_commands() {
        assert_eq!("undo".parse(), Ok(ReplCommand::Undo));
        assert_eq!(" quit ".parse(), Ok(ReplCommand::Quit));
        assert_eq!(
            "key ctrl+shift+z".parse(),
            Ok(ReplCommand::Key(KeyChord::new("z").ctrl().shift()))
        );
        assert_eq!(
            "press n12 Zig".parse(),
            Ok(ReplCommand::Press {
                node: NodeKey::new(12),
                value: Some("Zig".to_string()),
            })
        );
        assert_eq!(
            "press 7".parse(),
            Ok(ReplCommand::Press {
                node: NodeKey::new(7),
                value: None,
            })
        );
        assert_eq!(
            "type n3 Hello  world".parse(),
            Ok(ReplCommand::Type {
                node: NodeKey::new(3),
                text: "Hello  world".to_string(),
            })
        );
        assert_eq!("add add-cert".parse(), Ok(ReplCommand::Add("add-cert".to_string())));
    }

    #[test]
    fn test_parse_errors() {
        assert!("add".parse::<ReplCommand>().is_err());
        assert!("delete".parse::<ReplCommand>().is_err());
        assert!("delete abc".parse::<ReplCommand>().is_err());
        assert!("key".parse::<ReplCommand>().is_err());
        assert!("fly".parse::<ReplCommand>().is_err());
    }

    #[test]
    fn test_scripted_session() {
        let mut session = session();
        session.settle();

        let script = ["add add-skill-card", "toggle", "add add-skill-card", "key ctrl+z"];
        for line in script {
            let command = line.parse::<ReplCommand>().unwrap();
            assert_eq!(execute(&mut session, command, Duration::ZERO), Flow::Continue);
        }

        // the first add hit a hidden button
        assert_eq!(session.history().len(), 2);
        assert_eq!(session.history().cursor(), Some(0));
        assert_eq!(execute(&mut session, ReplCommand::Quit, Duration::ZERO), Flow::Quit);
    }

    #[test]
    fn test_typing_waits_for_blur() {
        let mut session = session();
        session.settle();
        execute(&mut session, ReplCommand::Toggle, Duration::ZERO);

        let heading = session.document().select(&"h3".parse().unwrap())[0];
        let command = format!("type {} Tools", heading).parse::<ReplCommand>().unwrap();
        execute(&mut session, command, Duration::from_millis(10));
        assert!(session.has_pending_edit());

        execute(&mut session, ReplCommand::Blur, Duration::from_millis(20));
        assert!(!session.has_pending_edit());
        assert_eq!(session.history().len(), 2);
    }
}
