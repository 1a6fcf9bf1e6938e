//! mcprobe CLI binary entry point.

use std::io::Write;
use std::sync::Arc;
use std::time::Duration;

use clap::Parser;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing_subscriber::EnvFilter;

use mcprobe::agent::{ChallengeAgent, HintAgent, Orchestrator};
use mcprobe::agent_loop::{RunEvent, RunEventPayload, RunLifecycle};
use mcprobe::challenge::{BuiltinCatalog, ChallengeProfile, ProfileSource};
use mcprobe::cli::probe::run_probe;
use mcprobe::cli::{ChatArgs, Cli, Commands, HintArgs, ProbeArgs, RouteArgs, TargetArgs};
use mcprobe::config::ProbeConfig;
use mcprobe::error::ProbeError;
use mcprobe::mcp::{Endpoint, SessionExecutor};
use mcprobe::provider::create_provider;

type CliResult = Result<(), Box<dyn std::error::Error>>;

#[tokio::main]
async fn main() {
    init_tracing();
    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Challenges => handle_challenges(),
        Commands::Chat(args) => handle_chat(args).await,
        Commands::Hint(args) => handle_hint(args).await,
        Commands::Route(args) => handle_route(args).await,
        Commands::Probe(args) => handle_probe(args).await,
    };

    if let Err(e) = result {
        print_error(e.as_ref());
        std::process::exit(1);
    }
}

fn init_tracing() {
    let filter = std::env::var("MCPROBE_LOG")
        .or_else(|_| std::env::var("RUST_LOG"))
        .ok()
        .and_then(|directives| EnvFilter::try_new(directives).ok())
        .unwrap_or_else(|| EnvFilter::new("warn"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

fn handle_challenges() -> CliResult {
    let config = ProbeConfig::load()?;
    let catalog = BuiltinCatalog::from_config(&config);
    for profile in catalog.all() {
        println!("{}  {}", profile.title(), profile.endpoint.url);
        println!("    {}", profile.description);
    }
    Ok(())
}

async fn handle_chat(args: ChatArgs) -> CliResult {
    let mut config = ProbeConfig::load()?;
    if let Some(model) = args.model {
        config = config.with_model(model);
    }
    if let Some(temperature) = args.temperature {
        config = config.with_temperature(temperature);
    }
    if let Some(max_turns) = args.max_turns {
        config = config.with_max_turns(max_turns);
    }
    config.validate()?;
    let profile = target_profile(&mut config, &args.target)?;

    let provider = create_provider(&config)?;
    let executor = Arc::new(SessionExecutor::new(
        profile.endpoint.clone(),
        config.operation_timeout,
    ));
    let mut agent = ChallengeAgent::new(profile, provider, executor)
        .with_settings(config.reasoning.clone())
        .with_max_turns(config.max_turns);
    if args.verbose {
        agent = agent.with_event_sink(Arc::new(print_event));
    }

    if let Some(prompt) = args.prompt {
        let (cancel, watcher) = interrupt_token();
        let answer = agent.send(prompt, &cancel).await;
        watcher.abort();
        println!("{}", answer?);
        return Ok(());
    }

    eprintln!("🔐 {} at {}", agent.profile().title(), agent.profile().endpoint.url);
    eprintln!("Type a message, `/reset` to start over, or `exit` to quit.");
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    while let Some(line) = next_line(&mut lines).await? {
        if line == "/reset" {
            agent.reset();
            eprintln!("(conversation cleared)");
            continue;
        }
        let (cancel, watcher) = interrupt_token();
        let answer = agent.send(line, &cancel).await;
        watcher.abort();
        report(answer);
    }
    Ok(())
}

async fn handle_hint(args: HintArgs) -> CliResult {
    let mut config = ProbeConfig::load()?;
    if let Some(model) = args.model {
        config = config.with_model(model);
    }
    let target = TargetArgs {
        challenge: args.challenge,
        endpoint: args.endpoint,
    };
    let profile = target_profile(&mut config, &target)?;

    let provider = create_provider(&config)?;
    let executor = Arc::new(SessionExecutor::new(
        profile.endpoint.clone(),
        config.operation_timeout,
    ));
    let mut agent =
        HintAgent::new(profile, provider, executor)?.with_settings(config.reasoning.clone());

    if let Some(prompt) = args.prompt {
        let (cancel, watcher) = interrupt_token();
        let reply = agent.send(prompt, &cancel).await;
        watcher.abort();
        println!("{}", reply?.text);
        return Ok(());
    }

    eprintln!("💡 Hints for {}", agent.profile().title());
    eprintln!("Try `list tools`, `list resources` or `read resource <uri>`; `exit` quits.");
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    while let Some(line) = next_line(&mut lines).await? {
        let (cancel, watcher) = interrupt_token();
        let reply = agent.send(line, &cancel).await;
        watcher.abort();
        report(reply.map(|reply| reply.text));
    }
    Ok(())
}

async fn handle_route(args: RouteArgs) -> CliResult {
    let mut config = ProbeConfig::load()?;
    if let Some(model) = args.model {
        config = config.with_model(model);
    }
    let catalog = BuiltinCatalog::from_config(&config);
    let provider = create_provider(&config)?;
    let mut orchestrator =
        Orchestrator::new(catalog.all(), provider)?.with_model(config.reasoning.model.clone());

    if let Some(prompt) = args.prompt {
        let (cancel, watcher) = interrupt_token();
        let reply = orchestrator.send(prompt, &cancel).await;
        watcher.abort();
        println!("{}", reply?);
        announce_selection(&orchestrator, None);
        return Ok(());
    }

    eprintln!("🧭 Which challenge would you like to try? `exit` quits.");
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    while let Some(line) = next_line(&mut lines).await? {
        let before = orchestrator.selected_challenge();
        let (cancel, watcher) = interrupt_token();
        let reply = orchestrator.send(line, &cancel).await;
        watcher.abort();
        report(reply);
        announce_selection(&orchestrator, before);
    }
    Ok(())
}

fn announce_selection(orchestrator: &Orchestrator, before: Option<u32>) {
    if let Some(profile) = orchestrator.selected_profile() {
        if before != Some(profile.id) {
            eprintln!("→ {}: run `mcprobe chat -c {}`", profile.title(), profile.id);
        }
    }
}

async fn handle_probe(args: ProbeArgs) -> CliResult {
    let mut config = ProbeConfig::load()?;
    if let Some(ms) = args.timeout_ms {
        config.operation_timeout = Duration::from_millis(ms);
    }
    let profile = target_profile(&mut config, &args.target)?;
    let executor = SessionExecutor::new(profile.endpoint.clone(), config.operation_timeout);

    eprintln!("Probing {} at {}...", profile.title(), profile.endpoint.url);
    let (cancel, watcher) = interrupt_token();
    let summary = run_probe(
        &executor,
        &profile,
        &args.command,
        &cancel,
        &mut std::io::stdout(),
    )
    .await;
    watcher.abort();
    let summary = summary?;

    if summary.failed > 0 {
        return Err(format!(
            "{} of {} probe steps failed",
            summary.failed,
            summary.failed + summary.succeeded
        )
        .into());
    }
    Ok(())
}

/// Apply an `--endpoint` override and look up the challenge profile.
fn target_profile(
    config: &mut ProbeConfig,
    target: &TargetArgs,
) -> Result<ChallengeProfile, ProbeError> {
    if let Some(url) = &target.endpoint {
        config
            .endpoints
            .insert(target.challenge, Endpoint::new(url.clone()));
    }
    BuiltinCatalog::from_config(config)
        .lookup(target.challenge)
        .ok_or_else(|| ProbeError::Configuration(format!("unknown challenge {}", target.challenge)))
}

/// Token cancelled by Ctrl-C while the returned watcher runs.
fn interrupt_token() -> (CancellationToken, JoinHandle<()>) {
    let cancel = CancellationToken::new();
    let token = cancel.clone();
    let watcher = tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            token.cancel();
        }
    });
    (cancel, watcher)
}

/// Next non-empty input line; `None` on EOF or `exit`/`quit`.
async fn next_line<R>(lines: &mut tokio::io::Lines<R>) -> Result<Option<String>, ProbeError>
where
    R: tokio::io::AsyncBufRead + Unpin,
{
    loop {
        eprint!("you> ");
        let _ = std::io::stderr().flush();
        let Some(line) = lines.next_line().await? else {
            return Ok(None);
        };
        let line = line.trim();
        match line {
            "" => continue,
            "exit" | "quit" => return Ok(None),
            _ => return Ok(Some(line.to_string())),
        }
    }
}

fn report(answer: Result<String, ProbeError>) {
    match answer {
        Ok(text) => println!("{text}\n"),
        Err(ProbeError::Canceled(_)) => eprintln!("(canceled)"),
        Err(e) => print_error(&e),
    }
}

fn print_error(e: &(dyn std::error::Error + 'static)) {
    eprintln!("Error: {e}");
    let hint = e
        .downcast_ref::<ProbeError>()
        .and_then(|e| e.recovery_suggestion().hint());
    if let Some(hint) = hint {
        eprintln!("Hint: {hint}");
    }
}

fn print_event(event: RunEvent) {
    match &event.payload {
        RunEventPayload::OperationStarted { call } => {
            eprintln!("⚡ {} ({})", call.name, call.id);
        }
        RunEventPayload::OperationResult { outcome, .. } => {
            let output = outcome.text();
            let truncated = if output.len() > 200 {
                let mut end = 200;
                while end > 0 && !output.is_char_boundary(end) {
                    end -= 1;
                }
                format!("{}...", &output[..end])
            } else {
                output.to_string()
            };
            if outcome.is_error() {
                eprintln!("  ❌ {truncated}");
            } else {
                eprintln!("  ✅ {truncated}");
            }
        }
        RunEventPayload::Lifecycle {
            state: RunLifecycle::Failed { error },
        } => {
            eprintln!("❌ {error}");
        }
        _ => {}
    }
}
