//! Chat session: the intake dialogue on a terminal

use std::sync::Arc;

use colored::Colorize;
use eyre::Result;
use rustyline::DefaultEditor;
use rustyline::error::ReadlineError;
use tracing::{debug, warn};

use crate::domain::{ConversationSession, Speaker};
use crate::events::EventBus;
use crate::intake::{IntakeMachine, messages};
use crate::orchestrator::PlanningOrchestrator;
use crate::report::{render_text, spawn_progress_printer};
use crate::storage::SessionStore;

/// Interactive intake over one conversation session
pub struct ChatSession {
    machine: IntakeMachine,
    store: Arc<dyn SessionStore>,
    session: ConversationSession,
    planner: Option<(PlanningOrchestrator, Arc<EventBus>)>,
}

impl ChatSession {
    /// Start a fresh session
    pub fn new(machine: IntakeMachine, store: Arc<dyn SessionStore>) -> Self {
        let session = machine.start();
        Self {
            machine,
            store,
            session,
            planner: None,
        }
    }

    /// Continue a stored session
    pub fn resume(machine: IntakeMachine, store: Arc<dyn SessionStore>, session: ConversationSession) -> Self {
        debug!(session_id = %session.id, "ChatSession::resume: called");
        Self {
            machine,
            store,
            session,
            planner: None,
        }
    }

    /// Offer to plan the trip once the request is confirmed
    pub fn with_planner(mut self, planner: PlanningOrchestrator, events: Arc<EventBus>) -> Self {
        self.planner = Some((planner, events));
        self
    }

    pub fn session(&self) -> &ConversationSession {
        &self.session
    }

    /// Run the REPL main loop
    pub async fn run(&mut self) -> Result<()> {
        self.print_welcome();
        self.save();
        if let Some(text) = self.session.last_assistant_text() {
            println!("{}\n", text.bright_blue());
        }

        let mut rl = DefaultEditor::new().map_err(|e| eyre::eyre!("Failed to initialize readline: {}", e))?;

        loop {
            match rl.readline(&format!("{} ", ">".bright_green())) {
                Ok(line) => {
                    let input = line.trim();
                    if input.is_empty() {
                        continue;
                    }
                    let _ = rl.add_history_entry(input);

                    if input.starts_with('/') {
                        match self.handle_slash_command(input) {
                            SlashResult::Continue => continue,
                            SlashResult::Quit => break,
                        }
                    }

                    let was_complete = self.session.is_complete();
                    let reply = self.machine.handle_turn(&mut self.session, input).await;
                    self.save();
                    println!("{}\n", reply.bright_blue());

                    if !was_complete && self.session.is_complete() {
                        self.offer_planning(&mut rl).await?;
                    }
                }
                Err(ReadlineError::Interrupted) => {
                    println!("^C");
                    continue;
                }
                Err(ReadlineError::Eof) => {
                    println!();
                    break;
                }
                Err(err) => return Err(eyre::eyre!("Readline error: {}", err)),
            }
        }

        println!("Session {} saved. Goodbye!", self.session.id.cyan());
        Ok(())
    }

    fn save(&self) {
        if let Err(e) = self.store.put_session(&self.session) {
            warn!(session_id = %self.session.id, error = %e, "Failed to save session");
            eprintln!("{} Could not save session: {}", "!".yellow(), e);
        }
    }

    async fn offer_planning(&mut self, rl: &mut DefaultEditor) -> Result<()> {
        let Some((planner, events)) = &self.planner else {
            return Ok(());
        };
        let Some(request) = self.session.request.clone() else {
            return Ok(());
        };

        let answer = match rl.readline(&format!("{} ", "Plan the trip now? (yes/no)".yellow())) {
            Ok(answer) => answer,
            Err(ReadlineError::Interrupted | ReadlineError::Eof) => return Ok(()),
            Err(err) => return Err(eyre::eyre!("Readline error: {}", err)),
        };
        if !crate::intake::parse::is_affirmative(&answer) {
            println!("{}", "Okay. Run `wp plan` later with this session to plan the trip.".dimmed());
            return Ok(());
        }

        let printer = spawn_progress_printer(events);
        let result = planner.plan(&request).await;
        match result {
            Ok(plan) => {
                let _ = printer.await;
                println!("\n{}", render_text(&plan));
                if let Err(e) = self.store.put_plan(&plan) {
                    eprintln!("{} Could not save plan: {}", "!".yellow(), e);
                } else {
                    println!("Plan saved as {}", plan.id.cyan());
                }
            }
            Err(e) => {
                if e.phase().is_some() {
                    let _ = printer.await;
                } else {
                    printer.abort();
                }
                eprintln!("{} {}", "✗".red(), e);
            }
        }
        Ok(())
    }

    fn print_welcome(&self) {
        println!();
        println!("{}", "Waypoint trip planner".bright_cyan().bold());
        println!("Session: {}", self.session.id);
        println!("Type {} for help, {} to quit", "/help".yellow(), "/quit".yellow());
        println!();
    }

    fn handle_slash_command(&mut self, input: &str) -> SlashResult {
        let cmd = input.split_whitespace().next().unwrap_or("");

        match cmd {
            "/help" | "/h" => {
                self.print_help();
                SlashResult::Continue
            }
            "/quit" | "/q" | "/exit" => SlashResult::Quit,
            "/reset" => {
                self.machine.reset(&mut self.session);
                self.save();
                println!("{}", "Request cleared.".dimmed());
                if let Some(text) = self.session.last_assistant_text() {
                    println!("{}\n", text.bright_blue());
                }
                SlashResult::Continue
            }
            "/history" => {
                self.print_history();
                SlashResult::Continue
            }
            "/summary" => {
                println!();
                println!("{}", messages::summary(&self.session.draft, self.machine.canonical()));
                println!("State: {}", self.session.state.to_string().cyan());
                println!();
                SlashResult::Continue
            }
            _ => {
                println!("{} Unknown command: {}", "?".yellow(), cmd);
                println!("Type {} for available commands", "/help".yellow());
                SlashResult::Continue
            }
        }
    }

    fn print_help(&self) {
        println!();
        println!("{}", "Available Commands:".bright_cyan());
        println!("  {:14} Show this help", "/help".yellow());
        println!("  {:14} Exit (the session is kept)", "/quit".yellow());
        println!("  {:14} Start the request over", "/reset".yellow());
        println!("  {:14} Show the conversation so far", "/history".yellow());
        println!("  {:14} Show the details collected so far", "/summary".yellow());
        println!();
    }

    fn print_history(&self) {
        if self.session.turns.is_empty() {
            println!("{}", "No conversation history.".dimmed());
            return;
        }

        println!();
        println!("{}", "Conversation History:".bright_cyan());
        for (i, turn) in self.session.turns.iter().enumerate() {
            let speaker = match turn.speaker {
                Speaker::User => "You".bright_green(),
                Speaker::Assistant => "Waypoint".bright_blue(),
            };
            let preview: String = turn.text.chars().take(80).collect();
            let ellipsis = if turn.text.chars().count() > 80 { "..." } else { "" };
            println!("  {}. {}: {}{}", i + 1, speaker, preview.replace('\n', " "), ellipsis);
        }
        println!();
    }
}

/// Result of handling a slash command
enum SlashResult {
    Continue,
    Quit,
}
