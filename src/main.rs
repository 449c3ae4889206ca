//! vint - resolve analytics questions to intents
//!
//! `vint resolve` is a stdin/stdout host: `{"text": "..."}` in, the resolved intent plus the
//! known vocabularies out. `vint ask` prints a human-readable answer against the corpus, and
//! `vint serve` runs the HTTP host.

use clap::{Parser, Subcommand};
use colored::Colorize;
use std::io::{self, Read};
use tracing::{debug, error};

use voice_intent::answer::{self, Outcome};
use voice_intent::config::Config;
use voice_intent::event::{breakdown, lanes_by_screen, transitions, Event, Field, FlowStep};
use voice_intent::server::{self, AppState, VoiceIntentRequest, VoiceIntentResponse};
use voice_intent::VoiceIntentError;

/// Rows printed per breakdown in `ask` output
const BREAKDOWN_ROWS: usize = 10;

#[derive(Parser)]
#[command(name = "vint", version, about = "Resolve analytics questions to typed intents")]
struct Cli {
    #[command(flatten)]
    config: Config,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Read {"text": ...} from stdin and write the resolved intent as JSON
    Resolve,
    /// Resolve a question and answer it from the corpus
    Ask {
        #[arg(required = true)]
        text: Vec<String>,
    },
    /// Print the corpus taxonomy as JSON
    Taxonomy,
    /// Show screen lanes and step-to-step transitions in corpus order
    Flow,
    /// Run the HTTP host
    Serve {
        #[arg(long, env = "HOST", default_value = "0.0.0.0")]
        host: String,
        #[arg(long, env = "PORT", default_value_t = 8787)]
        port: u16,
    },
}

// ============================================================================
// Main Entry Point
// ============================================================================

#[tokio::main]
async fn main() {
    // Initialize tracing if RUST_LOG is set
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    if let Err(e) = run(cli).await {
        error!("Error: {}", e);
        println!("{}", serde_json::json!({ "error": e.to_string() }));
        std::process::exit(1);
    }
}

async fn run(cli: Cli) -> Result<(), VoiceIntentError> {
    let config = cli.config;
    match cli.command {
        Command::Resolve => resolve_stdin(&config).await,
        Command::Ask { text } => ask(&config, &text.join(" ")).await,
        Command::Taxonomy => {
            let snapshot = config.load_corpus();
            let output = serde_json::to_string_pretty(&snapshot.taxonomy)
                .map_err(VoiceIntentError::OutputSerialize)?;
            println!("{}", output);
            Ok(())
        }
        Command::Flow => {
            let snapshot = config.load_corpus();
            let events: Vec<&Event> = snapshot.events.iter().collect();
            print_lanes(&events);
            print_transitions(&events);
            Ok(())
        }
        Command::Serve { host, port } => {
            let state = AppState::new(config.load_corpus(), config.build_resolver());
            server::serve(state, &format!("{}:{}", host, port)).await
        }
    }
}

async fn resolve_stdin(config: &Config) -> Result<(), VoiceIntentError> {
    let mut input_json = String::new();
    io::stdin()
        .read_to_string(&mut input_json)
        .map_err(VoiceIntentError::StdinRead)?;
    debug!("Received input: {}", input_json);

    let input: VoiceIntentRequest = serde_json::from_str(&input_json)?;
    let text = input.text.ok_or(VoiceIntentError::InputMissing)?;

    let snapshot = config.load_corpus();
    let intent = config
        .build_resolver()
        .resolve(&text, &snapshot.taxonomy)
        .await?;

    let output = VoiceIntentResponse::new(intent, &snapshot.taxonomy);
    println!(
        "{}",
        serde_json::to_string(&output).map_err(VoiceIntentError::OutputSerialize)?
    );
    Ok(())
}

// ============================================================================
// Human-readable answers
// ============================================================================

async fn ask(config: &Config, text: &str) -> Result<(), VoiceIntentError> {
    let snapshot = config.load_corpus();
    let intent = config
        .build_resolver()
        .resolve(text, &snapshot.taxonomy)
        .await?;
    debug!("Resolved {:?}", intent);

    let outcome = answer::apply(&intent, &snapshot.events, &snapshot.taxonomy);
    match &outcome {
        Outcome::Filtered { events, .. } => {
            println!("{}", outcome.message().green().bold());
            print_breakdown("By category", events, Field::Category);
            print_breakdown("By hook name", events, Field::HookName);
            print_transitions(events);
        }
        Outcome::NoMatch { .. } => println!("{}", outcome.message().yellow()),
        Outcome::Listing { .. } => println!("{}", outcome.message()),
        Outcome::Duplicates(duplicates) => {
            println!("{}", outcome.message().bold());
            for dup in duplicates {
                println!(
                    "  #{} repeats #{}: {}",
                    dup.dup_index,
                    dup.first_index,
                    describe(dup.event).dimmed()
                );
            }
        }
        Outcome::NotUnderstood => println!("{}", outcome.message().red()),
    }
    Ok(())
}

fn print_breakdown(title: &str, events: &[&Event], field: Field) {
    let rows = breakdown(events, field);
    if rows.is_empty() {
        return;
    }
    println!("{}", title.bold());
    for (value, count) in rows.iter().take(BREAKDOWN_ROWS) {
        println!("  {:>6}  {}", count.to_string().cyan(), value);
    }
    if rows.len() > BREAKDOWN_ROWS {
        println!("  {}", format!("… {} more", rows.len() - BREAKDOWN_ROWS).dimmed());
    }
}

fn print_transitions(events: &[&Event]) {
    let flows = transitions(events);
    if flows.is_empty() {
        return;
    }
    println!("{}", "Transitions".bold());
    for flow in flows.iter().take(BREAKDOWN_ROWS) {
        println!(
            "  {:>6}  {} → {}  {}  {} → {}",
            flow.count.to_string().cyan(),
            flow.from.screen,
            flow.from.action,
            "⇒".dimmed(),
            flow.to.screen,
            flow.to.action
        );
    }
    if flows.len() > BREAKDOWN_ROWS {
        println!("  {}", format!("… {} more", flows.len() - BREAKDOWN_ROWS).dimmed());
    }
}

fn print_lanes(events: &[&Event]) {
    for lane in lanes_by_screen(events) {
        println!("{} ({})", lane.screen.bold(), lane.steps.len());
        for position in lane.steps {
            let step = FlowStep::of(events[position]);
            println!("  {:>6}  {}", (position + 1).to_string().cyan(), step.action);
        }
    }
}

fn describe(event: &Event) -> String {
    [
        event.screen_name.as_deref(),
        event.field(Field::Category),
        event.field(Field::Action),
        event.hook_name(),
        event.hook_screen(),
    ]
    .into_iter()
    .map(|part| part.unwrap_or("-"))
    .collect::<Vec<_>>()
    .join(" / ")
}
