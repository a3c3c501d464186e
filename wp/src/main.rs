//! Waypoint - Conversational Trip Intake and Travel Planner
//!
//! CLI entry point for the intake chat, planning runs and stored records.

use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use clap::{CommandFactory, FromArgMatches};
use colored::Colorize;
use eyre::{Context, Result};
use tracing::{debug, info, warn};

use waypoint::cli::{Cli, Command, OutputFormat, generate_after_help};
use waypoint::config::Config;
use waypoint::domain::{ConversationSession, IdResolver, TravelPlan, TravelRequest};
use waypoint::events::create_event_bus;
use waypoint::intake::{CatalogSuggester, DestinationSuggester, IntakeMachine, LlmSuggester};
use waypoint::llm::{LlmClient, create_client};
use waypoint::orchestrator::PlanningOrchestrator;
use waypoint::prompts::PromptLoader;
use waypoint::repl::ChatSession;
use waypoint::report::{render_text, spawn_progress_printer};
use waypoint::steps::{LlmSpecialist, ScriptedSpecialist, Specialist};
use waypoint::storage::{FileStore, SessionStore};

fn setup_logging(cli_log_level: Option<&str>, config_log_level: Option<&str>) -> Result<()> {
    // Note: Can't log params here since logging isn't initialized yet
    let log_dir = dirs::data_local_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("waypoint")
        .join("logs");

    fs::create_dir_all(&log_dir).context("Failed to create log directory")?;

    // Priority: CLI --log-level > config file > default (INFO)
    let level = match cli_log_level.or(config_log_level) {
        Some(s) => match s.to_uppercase().as_str() {
            "TRACE" => tracing::Level::TRACE,
            "DEBUG" => tracing::Level::DEBUG,
            "INFO" => tracing::Level::INFO,
            "WARN" | "WARNING" => tracing::Level::WARN,
            "ERROR" => tracing::Level::ERROR,
            _ => {
                eprintln!("Warning: Unknown log-level '{}', defaulting to INFO", s);
                tracing::Level::INFO
            }
        },
        None => tracing::Level::INFO,
    };

    let log_file = fs::File::create(log_dir.join("waypoint.log")).context("Failed to create log file")?;

    tracing_subscriber::fmt()
        .with_writer(log_file)
        .with_ansi(false)
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env().add_directive(level.into()))
        .init();

    info!("Logging initialized (level: {:?})", level);
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    let cmd = Cli::command().after_help(generate_after_help());
    let cli = Cli::from_arg_matches(&cmd.get_matches())?;

    let config_log_level = Config::load_log_level(cli.config.as_ref());
    setup_logging(cli.log_level.as_deref(), config_log_level.as_deref()).context("Failed to setup logging")?;

    let config = Config::load(cli.config.as_ref()).context("Failed to load configuration")?;
    config.validate().context("Invalid configuration")?;
    info!(provider = %config.llm.provider, canonical = %config.currency.canonical, "Waypoint loaded config");

    debug!(command = ?cli.command, "main: dispatching command");
    match cli.command {
        Some(Command::Chat { resume, replay }) => cmd_chat(&config, resume.as_deref(), replay.as_deref()).await,
        Some(Command::Plan {
            request,
            session,
            replay,
            format,
            output,
            no_save,
        }) => {
            let source = match (request, session) {
                (Some(path), _) => RequestSource::File(path),
                (None, Some(id)) => RequestSource::Session(id),
                (None, None) => return Err(eyre::eyre!("Give a request file or --session")),
            };
            cmd_plan(&config, source, replay.as_deref(), format, output.as_deref(), no_save).await
        }
        Some(Command::Sessions) => cmd_sessions(&config),
        Some(Command::Plans) => cmd_plans(&config),
        Some(Command::ShowPlan { id, format }) => cmd_show_plan(&config, &id, format),
        Some(Command::DeleteSession { id }) => cmd_delete_session(&config, &id),
        Some(Command::DeletePlan { id }) => cmd_delete_plan(&config, &id),
        Some(Command::Config) => cmd_config(&config),
        None => {
            debug!("main: no command specified, starting chat");
            cmd_chat(&config, None, None).await
        }
    }
}

enum RequestSource {
    File(PathBuf),
    Session(String),
}

fn open_store(config: &Config) -> Result<Arc<dyn SessionStore>> {
    let dir = config.storage.expanded_dir();
    let store = FileStore::open(&dir).context(format!("Failed to open store at {}", dir.display()))?;
    Ok(Arc::new(store))
}

fn prompt_loader() -> Arc<PromptLoader> {
    let base = std::env::current_dir().unwrap_or_else(|_| PathBuf::from("."));
    Arc::new(PromptLoader::new(base))
}

fn llm_client(config: &Config) -> Option<Arc<dyn LlmClient>> {
    match create_client(&config.llm) {
        Ok(client) => Some(client),
        Err(e) => {
            warn!(error = %e, "LLM client unavailable");
            None
        }
    }
}

/// Scripted fixtures when given, otherwise the configured LLM
fn build_specialist(config: &Config, replay: Option<&Path>) -> Result<Arc<dyn Specialist>> {
    if let Some(path) = replay {
        debug!(?path, "build_specialist: using scripted fixtures");
        return Ok(Arc::new(ScriptedSpecialist::from_file(path)?));
    }
    let llm = create_client(&config.llm).context("Planning needs an LLM provider (or --replay fixtures)")?;
    Ok(Arc::new(LlmSpecialist::new(llm, prompt_loader(), config.llm.max_tokens)))
}

/// Resolve an id or unique fragment against stored ids
fn resolve_id(kind: &str, reference: &str, ids: HashMap<String, String>) -> Result<String> {
    match IdResolver::new(&ids).resolve(reference) {
        Ok(Some(id)) => Ok(id),
        Ok(None) => Err(eyre::eyre!("No {} matches '{}'", kind, reference)),
        Err(candidates) => Err(eyre::eyre!(
            "'{}' matches several {}s: {}",
            reference,
            kind,
            candidates.join(", ")
        )),
    }
}

fn find_session(store: &dyn SessionStore, reference: &str) -> Result<ConversationSession> {
    let ids = store
        .list_sessions()?
        .into_iter()
        .map(|s| (s.id.clone(), s.draft.destination.clone().unwrap_or_default()))
        .collect();
    let id = resolve_id("session", reference, ids)?;
    store
        .get_session(&id)?
        .ok_or_else(|| eyre::eyre!("Session {} disappeared", id))
}

fn load_request(path: &Path) -> Result<TravelRequest> {
    let content = fs::read_to_string(path).context(format!("Failed to read request {}", path.display()))?;
    // YAML is a superset of JSON, so one parser covers both
    let request: TravelRequest =
        serde_yaml::from_str(&content).context(format!("Failed to parse request {}", path.display()))?;
    Ok(request)
}

async fn cmd_chat(config: &Config, resume: Option<&str>, replay: Option<&Path>) -> Result<()> {
    debug!(?resume, ?replay, "cmd_chat: called");
    let store = open_store(config)?;
    let llm = llm_client(config);

    let suggester: Arc<dyn DestinationSuggester> = match &llm {
        Some(llm) => Arc::new(LlmSuggester::new(
            llm.clone(),
            prompt_loader(),
            config.suggestions.catalogue.clone(),
        )),
        None => Arc::new(CatalogSuggester::new(config.suggestions.catalogue.clone())),
    };
    let machine = IntakeMachine::from_config(config, suggester);

    let mut chat = match resume {
        Some(reference) => {
            let session = find_session(store.as_ref(), reference)?;
            ChatSession::resume(machine, store.clone(), session)
        }
        None => ChatSession::new(machine, store.clone()),
    };

    let specialist: Option<Arc<dyn Specialist>> = match replay {
        Some(_) => Some(build_specialist(config, replay)?),
        None => llm.map(|llm| {
            Arc::new(LlmSpecialist::new(llm, prompt_loader(), config.llm.max_tokens)) as Arc<dyn Specialist>
        }),
    };
    match specialist {
        Some(specialist) => {
            let events = create_event_bus();
            let planner = PlanningOrchestrator::from_config(config, specialist).with_events(events.clone());
            chat = chat.with_planner(planner, events);
        }
        None => {
            println!(
                "{}",
                format!(
                    "No LLM configured ({} unset): destination ideas come from the offline catalogue and planning is off.",
                    config.llm.api_key_env
                )
                .dimmed()
            );
        }
    }

    chat.run().await
}

async fn cmd_plan(
    config: &Config,
    source: RequestSource,
    replay: Option<&Path>,
    format: OutputFormat,
    output: Option<&Path>,
    no_save: bool,
) -> Result<()> {
    debug!(?replay, %format, ?output, no_save, "cmd_plan: called");
    let store = open_store(config)?;

    let request = match source {
        RequestSource::File(path) => load_request(&path)?,
        RequestSource::Session(reference) => {
            let session = find_session(store.as_ref(), &reference)?;
            if !session.is_complete() {
                return Err(eyre::eyre!("Session {} has not completed intake", session.id));
            }
            session
                .request
                .ok_or_else(|| eyre::eyre!("Session {} has no request", session.id))?
        }
    };

    let specialist = build_specialist(config, replay)?;
    let events = create_event_bus();
    let orchestrator = PlanningOrchestrator::from_config(config, specialist).with_events(events.clone());

    let printer = spawn_progress_printer(&events);
    let result = orchestrator.plan(&request).await;
    let plan = match result {
        Ok(plan) => {
            let _ = printer.await;
            plan
        }
        Err(e) => {
            if e.phase().is_some() {
                let _ = printer.await;
            } else {
                printer.abort();
            }
            return Err(e.into());
        }
    };

    match format {
        OutputFormat::Text => println!("{}", render_text(&plan)),
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&plan)?),
    }

    if let Some(path) = output {
        fs::write(path, serde_json::to_string_pretty(&plan)?).context(format!("Failed to write {}", path.display()))?;
        eprintln!("Plan written to {}", path.display());
    }

    if !no_save {
        store.put_plan(&plan)?;
        eprintln!("Plan saved as {}", plan.id.cyan());
    }
    Ok(())
}

fn cmd_sessions(config: &Config) -> Result<()> {
    debug!("cmd_sessions: called");
    let store = open_store(config)?;
    let sessions = store.list_sessions()?;
    if sessions.is_empty() {
        println!("No sessions");
        return Ok(());
    }

    println!("{:<36} {:<20} {:<20} {:>5}", "ID", "STATE", "DESTINATION", "TURNS");
    for session in sessions {
        println!(
            "{:<36} {:<20} {:<20} {:>5}",
            session.id,
            session.state.to_string(),
            session.draft.destination.as_deref().unwrap_or("-"),
            session.turns.len()
        );
    }
    Ok(())
}

fn cmd_plans(config: &Config) -> Result<()> {
    debug!("cmd_plans: called");
    let store = open_store(config)?;
    let plans = store.list_plans()?;
    if plans.is_empty() {
        println!("No plans");
        return Ok(());
    }

    println!("{:<40} {:<20} {:<16} {}", "ID", "DESTINATION", "BUDGET", "COMPILED");
    for plan in plans {
        println!(
            "{:<40} {:<20} {:<16} {}",
            plan.id,
            plan.request.destination,
            plan.budget.status.to_string(),
            plan.compiled_at.format("%Y-%m-%d %H:%M")
        );
    }
    Ok(())
}

fn find_plan(store: &dyn SessionStore, reference: &str) -> Result<TravelPlan> {
    let ids = store
        .list_plans()?
        .into_iter()
        .map(|p| (p.id.clone(), p.request.destination.clone()))
        .collect();
    let id = resolve_id("plan", reference, ids)?;
    store
        .get_plan(&id)?
        .ok_or_else(|| eyre::eyre!("Plan {} disappeared", id))
}

fn cmd_show_plan(config: &Config, reference: &str, format: OutputFormat) -> Result<()> {
    debug!(%reference, %format, "cmd_show_plan: called");
    let store = open_store(config)?;
    let plan = find_plan(store.as_ref(), reference)?;

    match format {
        OutputFormat::Text => println!("{}", render_text(&plan)),
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&plan)?),
    }
    Ok(())
}

fn cmd_delete_session(config: &Config, reference: &str) -> Result<()> {
    debug!(%reference, "cmd_delete_session: called");
    let store = open_store(config)?;
    let session = find_session(store.as_ref(), reference)?;
    if !store.delete_session(&session.id)? {
        return Err(eyre::eyre!("Session {} disappeared", session.id));
    }
    println!("Deleted session {}", session.id);
    Ok(())
}

fn cmd_delete_plan(config: &Config, reference: &str) -> Result<()> {
    debug!(%reference, "cmd_delete_plan: called");
    let store = open_store(config)?;
    let plan = find_plan(store.as_ref(), reference)?;
    if !store.delete_plan(&plan.id)? {
        return Err(eyre::eyre!("Plan {} disappeared", plan.id));
    }
    println!("Deleted plan {}", plan.id);
    Ok(())
}

fn cmd_config(config: &Config) -> Result<()> {
    debug!("cmd_config: called");
    print!("{}", serde_yaml::to_string(config)?);
    Ok(())
}
