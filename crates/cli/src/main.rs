use std::path::PathBuf;
use std::thread;
use std::time::Duration;

use anyhow::{bail, Context, Result};
use assistant::{Assistant, CompletionService, OllamaClient};
use clap::{Parser, Subcommand};
use session::{SessionCommand, SessionEvent, SessionRuntime};
use timeline::{demo::demo_engine, EngineEvent, Key, Modifiers, TimelineSnapshot};
use tracing_subscriber::EnvFilter;

mod config;

#[derive(Parser)]
#[command(name = "velocity", version, about = "Velocity timeline core: J-K-L transport, trim tools and an editing assistant")]
struct Cli {
    /// Config file (default: <config dir>/velocity/config.json)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Print the demo project
    Demo {
        #[arg(long)]
        json: bool,
    },

    /// Feed keystrokes to the demo project. `^z` is Cmd+Z, `^Z` is Cmd+Shift+Z
    Keys {
        keys: String,

        /// Let playback run for this long after the last key
        #[arg(long, default_value_t = 0)]
        play_ms: u64,

        #[arg(long)]
        json: bool,
    },

    /// Apply a JSON array of session commands to the demo project
    Run {
        script: PathBuf,

        #[arg(long)]
        json: bool,
    },

    /// Ask the editing assistant a question
    Ask {
        #[arg(required = true)]
        prompt: Vec<String>,
    },

    /// Check that the completion service is reachable
    Check,

    /// Print the effective configuration
    Config,
}

fn main() -> Result<()> {
    let _ = tracing_subscriber::fmt().with_env_filter(EnvFilter::from_default_env()).try_init();
    let cli = Cli::parse();
    let config = config::load(cli.config.as_deref())?;

    match cli.command {
        Commands::Demo { json } => {
            let engine = demo_engine(config.timeline).context("building demo project")?;
            print_snapshot(&engine.snapshot(), json)?;
        }
        Commands::Keys { keys, play_ms, json } => {
            let engine = demo_engine(config.timeline).context("building demo project")?;
            let handle = SessionRuntime::start(engine, config.session);
            for (key, modifiers) in parse_keys(&keys)? {
                if let Err(err) = handle.execute(SessionCommand::Key { key, modifiers }) {
                    eprintln!("✗ {err}");
                }
            }
            if play_ms > 0 {
                thread::sleep(Duration::from_millis(play_ms));
            }
            for event in handle.rx_events.try_iter() {
                if let SessionEvent::Engine { event: EngineEvent::Notice { text } } = event {
                    println!("» {text}");
                }
            }
            let snapshot = handle.snapshot();
            handle.shutdown();
            print_snapshot(&snapshot, json)?;
        }
        Commands::Run { script, json } => {
            let text = std::fs::read_to_string(&script).with_context(|| format!("reading script {}", script.display()))?;
            let commands: Vec<SessionCommand> = serde_json::from_str(&text).with_context(|| format!("parsing script {}", script.display()))?;
            let engine = demo_engine(config.timeline).context("building demo project")?;
            let handle = SessionRuntime::start(engine, config.session);
            for (i, command) in commands.into_iter().enumerate() {
                if let Err(err) = handle.execute(command) {
                    eprintln!("✗ step {}: {err}", i + 1);
                }
            }
            let snapshot = handle.snapshot();
            handle.shutdown();
            print_snapshot(&snapshot, json)?;
        }
        Commands::Ask { prompt } => {
            let client = OllamaClient::new(config.assistant)?;
            let runtime = tokio::runtime::Runtime::new()?;
            let mut assistant = Assistant::new(client);
            let prompt = prompt.join(" ");
            if let Some(reply) = runtime.block_on(assistant.send(&prompt)) {
                println!("{}", reply.content);
                if !reply.actions.is_empty() {
                    println!("[{}]", reply.actions.join("] ["));
                }
            }
        }
        Commands::Check => {
            let client = OllamaClient::new(config.assistant.clone())?;
            let runtime = tokio::runtime::Runtime::new()?;
            if runtime.block_on(client.check_connection()) {
                println!("✓ Ollama reachable at {} (model {})", config.assistant.base_url, config.assistant.model);
            } else {
                bail!("Ollama not detected at {}. Run 'ollama serve' in terminal.", config.assistant.base_url);
            }
        }
        Commands::Config => println!("{}", serde_json::to_string_pretty(&config)?),
    }
    Ok(())
}

/// Splits a keystroke string. `^` applies Command to the next key; an
/// uppercase letter after `^` adds Shift.
fn parse_keys(input: &str) -> Result<Vec<(Key, Modifiers)>> {
    let mut out = Vec::new();
    let mut chars = input.chars();
    while let Some(c) = chars.next() {
        if c != '^' {
            out.push((Key::from(c), Modifiers::NONE));
            continue;
        }
        let Some(next) = chars.next() else { bail!("dangling `^` in {input:?}") };
        let modifiers = if next.is_ascii_uppercase() { Modifiers::COMMAND_SHIFT } else { Modifiers::COMMAND };
        out.push((Key::from(next), modifiers));
    }
    Ok(out)
}

fn print_snapshot(snapshot: &TimelineSnapshot, json: bool) -> Result<()> {
    if json {
        println!("{}", serde_json::to_string_pretty(snapshot)?);
        return Ok(());
    }
    println!("Media:");
    for media in &snapshot.media {
        let proxy = if media.has_proxy { " (proxy)" } else { "" };
        println!("  {:<22} {} {:?}{proxy}", media.display_name, media.source_timecode, media.kind);
    }
    println!("Tracks:");
    for lane in &snapshot.tracks {
        let mut flags = String::new();
        if lane.track.locked {
            flags.push_str(" [locked]");
        }
        if lane.track.muted {
            flags.push_str(" [muted]");
        }
        println!("  {}{flags}", lane.track.display_name);
        for clip in &lane.clips {
            let marker = if snapshot.selection == Some(clip.id) { "*" } else { " " };
            println!("   {marker} {:<22} {:>7.1} .. {:<7.1} src {:.1}-{:.1}", clip.name, clip.start, clip.end(), clip.source_in, clip.source_out);
        }
    }
    let t = &snapshot.transport;
    println!(
        "Transport: playhead {:.1} {} {}",
        t.playhead,
        t.shuttle_glyph(),
        if t.is_playing { "playing" } else { "stopped" }
    );
    if let (Some(i), Some(o)) = (t.mark_in, t.mark_out) {
        println!("Marks: {i:.1} .. {o:.1}");
    }
    println!("Tool: {}  Zoom: {:.1}x  Undo: {}  Redo: {}", snapshot.tool, snapshot.settings.zoom, snapshot.can_undo, snapshot.can_redo);
    Ok(())
}
