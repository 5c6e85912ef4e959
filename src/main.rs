//! Rapport CLI
//!
//! Usage:
//!   rapport --user "text" --bot "reply"      # Score a single turn
//!   rapport --interactive                    # Replay a chat (U: / B: prefixes)
//!   rapport --stages                         # Print the stage table
//!   rapport --serve                          # HTTP API server
//!   rapport --user "text" --bot "reply" --json

use clap::Parser;
use colored::Colorize;
use std::io::{self, BufRead, Write};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use rapport::config::{check_server, EngineConfig};
use rapport::core::{run_server, RelationshipEngine};
use rapport::types::{
    stage_color, stage_emoji, HistoryMessage, RelationshipContext, RelationshipStage,
    RelationshipState, StageConfig, TurnInput, TurnOutcome,
};
use rapport::VERSION;

#[derive(Parser, Debug)]
#[command(
    name = "rapport",
    version = VERSION,
    about = "Rapport - score chat turns and track relationship progression",
    long_about = "Rapport scores each user message + companion reply along emotional,\n\
                  disclosure, empathy, humor, intimacy and reciprocity dimensions,\n\
                  turns the scores into stage progress and milestones, and decides\n\
                  when a relationship may advance to its next stage.\n\n\
                  Modes:\n  \
                  --user/--bot   Score a single turn\n  \
                  --interactive  Replay a chat, U: and B: prefixes form turns\n  \
                  --stages       Print the stage table\n  \
                  --serve        HTTP API server mode\n\n\
                  Stages:\n  \
                  New Friend → Close Friend → Best Friend → Romantic Interest →\n  \
                  Dating → Committed Partner → Soulmate"
)]
struct Args {
    /// User message (single mode)
    #[arg(short, long)]
    user: Option<String>,

    /// Companion reply (single mode)
    #[arg(short, long, default_value = "")]
    bot: String,

    /// Interactive mode - read U:/B: lines from stdin
    #[arg(short, long)]
    interactive: bool,

    /// Print the stage table and exit
    #[arg(long)]
    stages: bool,

    /// Run as HTTP API server
    #[arg(short, long)]
    serve: bool,

    /// Server address (overrides server.addr from the config file)
    #[arg(long)]
    addr: Option<String>,

    /// Starting stage name (unknown names fall back to New Friend)
    #[arg(long, default_value = "New Friend")]
    stage: String,

    /// Starting progress within the stage
    #[arg(long, default_value_t = 0)]
    progress: u32,

    /// Personality compatibility, 0-100
    #[arg(long, default_value_t = 0.0)]
    compatibility: f64,

    /// TOML configuration file
    #[arg(short, long, default_value = "rapport.toml")]
    config: String,

    /// Output as JSON
    #[arg(long)]
    json: bool,

    /// Disable colors in output
    #[arg(long)]
    no_color: bool,

    /// Show metric breakdown
    #[arg(long)]
    verbose: bool,
}

#[tokio::main]
async fn main() {
    init_tracing();

    let args = Args::parse();
    if args.no_color {
        colored::control::set_override(false);
    }

    let config = match EngineConfig::load(&args.config) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Config error: {}", e);
            std::process::exit(1);
        }
    };

    if args.stages {
        print_stages(&args);
    } else if args.serve {
        run_serve(&args, config).await;
    } else if args.interactive {
        run_interactive(&args, &config);
    } else if let Some(ref user) = args.user {
        run_single(user, &args, &config);
    } else {
        // Default to interactive if no mode specified
        run_interactive(&args, &config);
    }
}

/// RAPPORT_LOG_FORMAT=json switches to machine-parseable logs; logs go to stderr
fn init_tracing() {
    let log_format = std::env::var("RAPPORT_LOG_FORMAT").unwrap_or_else(|_| "text".to_string());
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "rapport=warn,tower_http=info".into());

    match log_format.as_str() {
        "json" => {
            tracing_subscriber::registry()
                .with(filter)
                .with(tracing_subscriber::fmt::layer().json().with_writer(io::stderr))
                .init();
        }
        _ => {
            tracing_subscriber::registry()
                .with(filter)
                .with(tracing_subscriber::fmt::layer().with_writer(io::stderr))
                .init();
        }
    }
}

/// Initial state from --stage / --progress / --compatibility
fn initial_state(args: &Args) -> RelationshipState {
    let context = RelationshipContext {
        personality_compatibility: args.compatibility,
        ..RelationshipContext::at_stage(RelationshipStage::from_name(&args.stage))
    };
    RelationshipState {
        progress: args.progress,
        ..RelationshipState::new(context)
    }
}

/// Score a single turn
fn run_single(user: &str, args: &Args, config: &EngineConfig) {
    let engine = RelationshipEngine::from_config(config);
    let mut state = initial_state(args);

    match engine.process_turn(&mut state, &TurnInput::new(user, &args.bot)) {
        Ok(outcome) => print_outcome(&outcome, args),
        Err(e) => {
            eprintln!("Error: {}", e);
            std::process::exit(1);
        }
    }
}

/// Replay a chat from stdin
fn run_interactive(args: &Args, config: &EngineConfig) {
    let engine = RelationshipEngine::from_config(config);
    let mut state = initial_state(args);
    let mut history: Vec<HistoryMessage> = Vec::new();
    let mut pending_user: Option<String> = None;

    print_header("Interactive Mode", args.no_color);
    println!("Prefix each line with U: (you) or B: (companion).");
    println!("Example: U: I had a rough day at work");
    println!("         B: I'm sorry, that sounds exhausting. Want to talk about it?");
    println!();
    println!("Commands: 'status', 'advance', 'quit'");
    println!();

    let stdin = io::stdin();
    let mut stdout = io::stdout();

    loop {
        print!("{}", format_prompt(&state));
        if stdout.flush().is_err() {
            break;
        }

        let mut line = String::new();
        match stdin.lock().read_line(&mut line) {
            Ok(0) => break,
            Ok(_) => {}
            Err(_) => break,
        }

        let line = line.trim();
        if line.eq_ignore_ascii_case("quit") || line.eq_ignore_ascii_case("exit") {
            println!(
                "\nSession ended. Stage: {} | Progress: {}/100 | Milestones: {}",
                state.stage(),
                state.progress,
                state.milestones.len()
            );
            break;
        }
        if line.is_empty() {
            continue;
        }
        if line.eq_ignore_ascii_case("status") {
            print_status(&engine, &state, args);
            continue;
        }
        if line.eq_ignore_ascii_case("advance") {
            let advancement = engine.request_advancement(&mut state);
            if args.json {
                print_json(&advancement);
            } else if advancement.advanced {
                println!(
                    "{}",
                    format!("  ✓ Advanced: {} → {}", advancement.from, advancement.to).green()
                );
            } else {
                println!("{}", format!("  ⚠ {}", advancement.readiness.reason).yellow());
                print_missing(&advancement.readiness.missing_requirement_types);
            }
            continue;
        }

        match parse_speaker_prefix(line) {
            Some(('U', text)) => {
                history.push(HistoryMessage::new(text, chrono::Utc::now()));
                pending_user = Some(text.to_string());
            }
            Some((_, text)) => {
                let Some(user) = pending_user.take() else {
                    println!("{}", "⚠ Companion reply without a user message (start with U:)".yellow());
                    continue;
                };
                let turn = TurnInput::new(user, text).with_history(history.clone());
                match engine.process_turn(&mut state, &turn) {
                    Ok(outcome) => print_outcome(&outcome, args),
                    Err(e) => println!("{}", format!("⚠ {}", e).red()),
                }
            }
            None => {
                println!("{}", "⚠ Please prefix with U: or B: (e.g., 'U: Hello')".yellow());
            }
        }
    }
}

/// Parse speaker prefix (U: or B:)
fn parse_speaker_prefix(line: &str) -> Option<(char, &str)> {
    let (prefix, text) = line.trim().split_once(':')?;
    match prefix.trim().to_ascii_uppercase().as_str() {
        "U" => Some(('U', text.trim())),
        "B" => Some(('B', text.trim())),
        _ => None,
    }
}

/// Print the stage table
fn print_stages(args: &Args) {
    let table = StageConfig::table();
    if args.json {
        print_json(&table);
        return;
    }

    print_header("Stages", args.no_color);
    for config in table {
        let required: Vec<&str> = config.required_milestones.iter().map(|t| t.as_str()).collect();
        println!(
            "{} {} (×{:.2})",
            stage_emoji(config.stage),
            config.stage.name().color(stage_color(config.stage)).bold(),
            config.multiplier
        );
        println!("    {}", config.description);
        println!("    requires: [{}]", required.join(", "));
        if args.verbose {
            println!("    tone: {}", config.tone.dimmed());
        }
    }
}

/// Print readiness for the current state
fn print_status(engine: &RelationshipEngine, state: &RelationshipState, args: &Args) {
    let readiness = engine.readiness(state);
    if args.json {
        print_json(&readiness);
        return;
    }
    println!(
        "  {} {} | progress={}/100 | {}",
        stage_emoji(state.stage()),
        state.stage(),
        state.progress,
        readiness.reason
    );
    print_missing(&readiness.missing_requirement_types);
}

fn print_missing(missing: &[rapport::types::MilestoneType]) {
    if missing.is_empty() {
        return;
    }
    let names: Vec<&str> = missing.iter().map(|t| t.as_str()).collect();
    println!("  {}", format!("└─ missing: {}", names.join(", ")).dimmed());
}

/// Print one turn outcome in the selected format
fn print_outcome(outcome: &TurnOutcome, args: &Args) {
    if args.json {
        print_json(outcome);
    } else if args.verbose {
        print_verbose(outcome);
    } else if args.no_color {
        println!("{}", outcome.to_parseable_string());
    } else {
        println!("{}", outcome.to_terminal_string());
    }
}

fn print_json<T: serde::Serialize>(value: &T) {
    match serde_json::to_string_pretty(value) {
        Ok(json) => println!("{}", json),
        Err(e) => eprintln!("Serialization error: {}", e),
    }
}

/// Print verbose output
fn print_verbose(outcome: &TurnOutcome) {
    let m = &outcome.metrics;
    let color = stage_color(outcome.stage);
    let line = |text: String| println!("{}", text.color(color));

    line("┌──────────────────────────────────────┐".to_string());
    line(format!("│ {} {} | +{} (+{} bonus)", stage_emoji(outcome.stage), outcome.stage, outcome.progress_increase, outcome.milestone_bonus));
    line("├──────────────────────────────────────┤".to_string());
    line("│ Metrics:".to_string());
    line(format!("│   length:        {:.2} (w=0.05)", m.message_length));
    line(format!("│   emotional:     {:.2} (w=0.15)", m.emotional_words));
    line(format!("│   sharing:       {:.2} (w=0.20)", m.personal_sharing));
    line(format!("│   empathy:       {:.2} (w=0.15)", m.empathy));
    line(format!("│   humor:         {:.2} (w=0.10)", m.humor));
    line(format!("│   intimacy:      {:.2} (w=0.10)", m.intimacy));
    line(format!("│   flow:          {:.2} (w=0.10)", m.conversation_flow));
    line(format!("│   depth:         {:.2} (w=0.10)", m.emotional_depth));
    line(format!("│   reciprocity:   {:.2} (w=0.05)", m.reciprocity));
    line("├──────────────────────────────────────┤".to_string());
    for milestone in &outcome.milestones {
        line(format!("│ ★ {} [{}] +{}", milestone.title, milestone.kind, milestone.progress_bonus));
    }
    line(format!("│ Progress: {}/100 | {}", outcome.progress, outcome.readiness.reason.code()));
    line("└──────────────────────────────────────┘".to_string());
}

/// Print header
fn print_header(mode: &str, no_color: bool) {
    if no_color {
        println!("========================================");
        println!("  Rapport v{} - {}", VERSION, mode);
        println!("========================================");
    } else {
        println!("{}", "╔══════════════════════════════════════╗".bold());
        println!("{}", format!("║  Rapport v{} - {}", VERSION, mode).bold());
        println!("{}", "╚══════════════════════════════════════╝".bold());
    }
    println!();
}

/// Format interactive prompt
fn format_prompt(state: &RelationshipState) -> String {
    let stage = state.stage();
    format!("{} [{} | {}/100] > ", stage_emoji(stage), stage, state.progress)
        .color(stage_color(stage))
        .to_string()
}

/// Run HTTP API server
async fn run_serve(args: &Args, mut config: EngineConfig) {
    if let Some(ref addr) = args.addr {
        config.server.addr = addr.clone();
    }
    if let Err(e) = check_server(&config.server) {
        eprintln!("Config error: {}", e);
        std::process::exit(1);
    }

    println!();
    println!("Rapport API Server v{}", VERSION);
    println!();

    let addr = config.server.addr.clone();
    if let Err(e) = run_server(&addr, &config).await {
        eprintln!("Server error: {}", e);
        std::process::exit(1);
    }
}
