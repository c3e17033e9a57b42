use std::io::Write;
use std::path::PathBuf;

use tokio::io::AsyncBufReadExt;
use tracing::{error, info};

use omniread_assistant::models::AssistantPreset;
use omniread_assistant::{AgentClient, ChatEvent, ChatSession, DeviceStore};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env if present (development convenience)
    dotenvy::dotenv().ok();

    // Initialise tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "omniread_assistant=info".into()),
        )
        .init();

    // ── Device storage ────────────────────────────────────────────────────────
    let data_dir = std::env::var("OMNIREAD_DATA_DIR").map(PathBuf::from).unwrap_or_else(|_| {
        dirs::data_dir().unwrap_or_else(|| PathBuf::from(".")).join("omniread")
    });
    let store = DeviceStore::open(&data_dir)?;
    if let Ok(token) = std::env::var("OMNIREAD_TOKEN") {
        store.set_token(&token)?;
    }

    // ── Assistant service client & agent provisioning ─────────────────────────
    let base_url = std::env::var("OMNIREAD_API_BASE_URL")
        .unwrap_or_else(|_| "http://localhost:8080/api".to_string());
    let client = AgentClient::new(&base_url, store.clone());

    let presets = AssistantPreset::builtin();
    let agent_id = client.ensure_agent(&presets[0]).await?;
    info!("Chatting with agent {agent_id} via {base_url}");

    // ── Session wiring ────────────────────────────────────────────────────────
    let (session, mut events) = ChatSession::new(client.clone(), store.clone());

    // Render streaming updates as they arrive.
    let printer = tokio::spawn(async move {
        while let Some(event) = events.recv().await {
            match event {
                ChatEvent::ExchangeStart { .. } => print!("assistant> "),
                ChatEvent::Delta { content, .. } => print!("{content}"),
                ChatEvent::ExchangeEnd { .. } => println!(),
                ChatEvent::Failure { message, .. } => println!("{message}"),
            }
            let _ = std::io::stdout().flush();
        }
    });

    // ── REPL ──────────────────────────────────────────────────────────────────
    println!("Type a message, '/persona <id>' to switch assistants, '/quit' to exit.");
    let mut lines = tokio::io::BufReader::new(tokio::io::stdin()).lines();

    loop {
        print!("you> ");
        let _ = std::io::stdout().flush();

        let Some(line) = lines.next_line().await? else { break };
        let input = line.trim();

        if input.is_empty() {
            continue;
        }
        if input == "/quit" {
            break;
        }
        if let Some(id) = input.strip_prefix("/persona ") {
            match presets.iter().find(|p| p.id == id.trim()) {
                Some(preset) => match client.select_preset(preset).await {
                    Ok(agent_id) => info!("Switched to '{}' (agent {agent_id})", preset.label),
                    Err(e) => error!("Persona switch failed: {e}"),
                },
                None => {
                    let known: Vec<&str> = presets.iter().map(|p| p.id).collect();
                    println!("Unknown persona '{id}'. Available: {}", known.join(", "));
                }
            }
            continue;
        }

        session.send(input).await;
    }

    session.close();
    printer.abort();
    Ok(())
}
