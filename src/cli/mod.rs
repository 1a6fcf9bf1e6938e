//! CLI definitions for mcprobe.

pub mod probe;

use clap::{Args, Parser, Subcommand};

/// Security-probing client for MCP challenge servers
#[derive(Parser, Debug)]
#[command(name = "mcprobe", version, about = "Chat with, hint at and probe vulnerable MCP servers")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

/// Top-level CLI commands.
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// List the challenge catalog
    Challenges,
    /// Tool-calling agent bound to one challenge
    Chat(ChatArgs),
    /// Hint agent that runs operations named in plain text
    Hint(HintArgs),
    /// Ask the orchestrator which challenge to try
    Route(RouteArgs),
    /// Run raw protocol operations against a challenge endpoint
    Probe(ProbeArgs),
}

/// Endpoint selection shared by commands that talk to a server.
#[derive(Args, Debug, Clone)]
pub struct TargetArgs {
    /// Challenge number (1-10)
    #[arg(short, long, value_parser = clap::value_parser!(u32).range(1..=10))]
    pub challenge: u32,

    /// Override the challenge endpoint URL
    #[arg(long)]
    pub endpoint: Option<String>,
}

/// Arguments for the `chat` subcommand.
#[derive(Args, Debug)]
pub struct ChatArgs {
    #[command(flatten)]
    pub target: TargetArgs,

    /// Gemini model id
    #[arg(short, long)]
    pub model: Option<String>,

    /// Temperature (0.0 - 2.0)
    #[arg(short, long)]
    pub temperature: Option<f64>,

    /// Reasoning calls allowed per message
    #[arg(long)]
    pub max_turns: Option<usize>,

    /// Print operation calls and results to stderr
    #[arg(short, long)]
    pub verbose: bool,

    /// Single prompt; without it a line-based session reads stdin
    pub prompt: Option<String>,
}

/// Arguments for the `hint` subcommand.
#[derive(Args, Debug)]
pub struct HintArgs {
    /// Challenge number (1-10)
    #[arg(short, long, default_value_t = 1, value_parser = clap::value_parser!(u32).range(1..=10))]
    pub challenge: u32,

    /// Override the challenge endpoint URL
    #[arg(long)]
    pub endpoint: Option<String>,

    /// Gemini model id
    #[arg(short, long)]
    pub model: Option<String>,

    pub prompt: Option<String>,
}

/// Arguments for the `route` subcommand.
#[derive(Args, Debug)]
pub struct RouteArgs {
    /// Gemini model id
    #[arg(short, long)]
    pub model: Option<String>,

    pub prompt: Option<String>,
}

/// Arguments for the `probe` subcommand.
#[derive(Args, Debug)]
pub struct ProbeArgs {
    #[command(flatten)]
    pub target: TargetArgs,

    /// Per-operation timeout in milliseconds
    #[arg(long)]
    pub timeout_ms: Option<u64>,

    #[command(subcommand)]
    pub command: ProbeCommand,
}

/// Raw protocol operations.
#[derive(Subcommand, Debug, Clone, PartialEq)]
pub enum ProbeCommand {
    ListTools,
    ListResources,
    ListPrompts,
    CallTool {
        name: String,
        /// Tool arguments as a JSON object
        #[arg(long)]
        args: Option<String>,
    },
    ReadResource {
        uri: String,
    },
    GetPrompt {
        name: String,
        /// Prompt arguments as a JSON object
        #[arg(long)]
        args: Option<String>,
    },
    /// List resources and tools, read the first resource, call the first tool
    Smoke {
        /// Value used for every parameter of the first tool
        #[arg(long, default_value = "admin")]
        sample: String,
    },
}

impl Cli {
    /// Parse CLI arguments.
    pub fn parse_args() -> Self {
        Self::parse()
    }
}
