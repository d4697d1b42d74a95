//! Integration tests for the chat turn pipeline
//!
//! These tests drive the Conductor end to end against a scripted backend.
//! Tests cover:
//! - A first turn populating the session with the streamed reply
//! - Model verification on session entry (no pull / exactly one pull)
//! - Failure notices for listing, pulling and generation
//! - Backend process launch notices
//! - Configuration flowing into the Conductor

use std::io::Write;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use pretty_assertions::assert_eq;
use tempfile::NamedTempFile;
use tokio::sync::mpsc;

use chat_conductor::backend::{
    LlmBackend, LlmRequest, ModelDescriptor, ProcessControl, ProcessSettings, StreamingToken,
};
use chat_conductor::config::load_config_with_env;
use chat_conductor::{
    Conductor, ConductorConfig, ConductorMessage, ConductorState, MessageRole, ModelCatalog,
    NotifyLevel, PromptMode, SurfaceEvent, SurfaceType,
};

// =============================================================================
// Scripted Backend
// =============================================================================

/// A backend call, in the order it happened
#[derive(Clone, Debug, PartialEq)]
enum Call {
    List,
    Pull(String),
    Generate { model: String, prompt: String, chat: bool },
}

/// Backend whose answers are fixed up front
struct ScriptedBackend {
    installed: Result<Vec<String>, String>,
    fragments: Vec<String>,
    stream_error: Option<String>,
    send_error: Option<String>,
    pull_error: Option<String>,
    calls: Arc<Mutex<Vec<Call>>>,
}

impl ScriptedBackend {
    fn new(installed: &[&str], fragments: &[&str]) -> Self {
        Self {
            installed: Ok(installed.iter().map(|s| (*s).to_string()).collect()),
            fragments: fragments.iter().map(|s| (*s).to_string()).collect(),
            stream_error: None,
            send_error: None,
            pull_error: None,
            calls: Arc::new(Mutex::new(Vec::new())),
        }
    }

    fn calls(&self) -> Arc<Mutex<Vec<Call>>> {
        self.calls.clone()
    }

    fn record(&self, call: Call) {
        self.calls.lock().unwrap().push(call);
    }
}

#[async_trait]
impl LlmBackend for ScriptedBackend {
    fn name(&self) -> &str {
        "Scripted"
    }

    async fn send_streaming(
        &self,
        request: &LlmRequest,
    ) -> anyhow::Result<mpsc::Receiver<StreamingToken>> {
        self.record(Call::Generate {
            model: request.model.clone(),
            prompt: request.prompt.clone(),
            chat: request.is_chat(),
        });

        if let Some(ref e) = self.send_error {
            anyhow::bail!("{e}");
        }

        let (tx, rx) = mpsc::channel(16);
        let fragments = self.fragments.clone();
        let stream_error = self.stream_error.clone();
        tokio::spawn(async move {
            let mut full = String::new();
            for fragment in fragments {
                full.push_str(&fragment);
                let _ = tx.send(StreamingToken::Token(fragment)).await;
            }
            let last = match stream_error {
                Some(e) => StreamingToken::Error(e),
                None => StreamingToken::Complete { message: full },
            };
            let _ = tx.send(last).await;
        });
        Ok(rx)
    }

    async fn list_models(&self) -> anyhow::Result<Vec<ModelDescriptor>> {
        self.record(Call::List);
        match &self.installed {
            Ok(names) => Ok(names.iter().map(ModelDescriptor::named).collect()),
            Err(e) => Err(anyhow::anyhow!("{e}")),
        }
    }

    async fn pull_model(&self, model: &str) -> anyhow::Result<()> {
        self.record(Call::Pull(model.to_string()));
        match &self.pull_error {
            Some(e) => Err(anyhow::anyhow!("{e}")),
            None => Ok(()),
        }
    }
}

/// Process control reporting the server as absent, with a scripted launch
struct AbsentServer {
    launch_error: Option<String>,
}

#[async_trait]
impl ProcessControl for AbsentServer {
    async fn is_running(&self, _name: &str) -> anyhow::Result<bool> {
        Ok(false)
    }

    fn spawn_detached(&self, _program: &str, _args: &[String]) -> anyhow::Result<()> {
        match &self.launch_error {
            Some(e) => Err(anyhow::anyhow!("{e}")),
            None => Ok(()),
        }
    }
}

// =============================================================================
// Helpers
// =============================================================================

fn config_with_default(model: &str) -> ConductorConfig {
    ConductorConfig {
        catalog: ModelCatalog::new(
            chat_conductor::DEFAULT_MODELS
                .iter()
                .map(|m| (*m).to_string())
                .collect(),
            Some(model.to_string()),
        )
        .unwrap(),
        process: ProcessSettings {
            manage: false,
            ..ProcessSettings::default()
        },
        ..ConductorConfig::default()
    }
}

fn connected() -> SurfaceEvent {
    SurfaceEvent::Connected {
        event_id: SurfaceEvent::new_event_id(),
        surface_type: SurfaceType::Headless,
    }
}

fn drain(rx: &mut mpsc::Receiver<ConductorMessage>) -> Vec<ConductorMessage> {
    let mut out = Vec::new();
    while let Ok(msg) = rx.try_recv() {
        out.push(msg);
    }
    out
}

fn notices(messages: &[ConductorMessage]) -> Vec<(NotifyLevel, String)> {
    messages
        .iter()
        .filter_map(|m| match m {
            ConductorMessage::Notify { level, message } => Some((*level, message.clone())),
            _ => None,
        })
        .collect()
}

// =============================================================================
// Scenario Tests
// =============================================================================

/// Empty session, user says "Hello": history holds the user line and the
/// trimmed concatenation of every fragment.
#[tokio::test]
async fn test_first_turn_records_trimmed_reply() {
    let backend = ScriptedBackend::new(&["llama3.2:latest"], &["  Hi", " there", "!\n"]);
    let calls = backend.calls();
    let (tx, mut rx) = mpsc::channel(256);
    let mut conductor = Conductor::new(backend, config_with_default("llama3.2:latest"), tx);

    conductor.start().await.unwrap();
    conductor
        .handle_event(SurfaceEvent::from_input("Hello".to_string()))
        .await
        .unwrap();

    let history: Vec<(MessageRole, &str)> = conductor
        .session()
        .messages()
        .iter()
        .map(|m| (m.role, m.content.as_str()))
        .collect();
    assert_eq!(
        history,
        vec![
            (MessageRole::User, "Hello"),
            (MessageRole::Assistant, "Hi there!"),
        ]
    );

    // First prompt: exactly one user line, ends with the assistant cue
    let calls = calls.lock().unwrap();
    let Some(Call::Generate { prompt, model, chat }) = calls.last() else {
        panic!("expected a generation call, got {calls:?}");
    };
    assert_eq!(prompt, "User: Hello\nAssistant:");
    assert_eq!(model, "llama3.2:latest");
    assert!(!chat);

    let sent = drain(&mut rx);
    let streamed: String = sent
        .iter()
        .filter_map(|m| match m {
            ConductorMessage::Token { text, .. } => Some(text.as_str()),
            _ => None,
        })
        .collect();
    assert_eq!(streamed, "  Hi there!\n");
    assert!(sent.iter().any(|m| matches!(
        m,
        ConductorMessage::StreamEnd { final_content, .. } if final_content == "Hi there!"
    )));
}

/// Text that starts with a slash but names no command is a normal turn.
#[tokio::test]
async fn test_slash_prefixed_text_starts_a_turn() {
    let backend = ScriptedBackend::new(&["gemma3:12b"], &["A hosts file."]);
    let calls = backend.calls();
    let (tx, _rx) = mpsc::channel(256);
    let mut conductor = Conductor::new(backend, config_with_default("gemma3:12b"), tx);

    conductor.start().await.unwrap();
    conductor
        .handle_event(SurfaceEvent::from_input(
            "/etc/hosts what is this file?".to_string(),
        ))
        .await
        .unwrap();

    let generations = calls
        .lock()
        .unwrap()
        .iter()
        .filter(|c| matches!(c, Call::Generate { .. }))
        .count();
    assert_eq!(generations, 1);

    let history: Vec<&str> = conductor
        .session()
        .messages()
        .iter()
        .map(|m| m.content.as_str())
        .collect();
    assert_eq!(history, vec!["/etc/hosts what is this file?", "A hosts file."]);
}

/// Selected model already installed: no pull.
#[tokio::test]
async fn test_installed_model_is_not_pulled() {
    let backend = ScriptedBackend::new(&["gemma3:12b", "llama3.2:latest"], &["ok"]);
    let calls = backend.calls();
    let (tx, _rx) = mpsc::channel(256);
    let mut conductor = Conductor::new(backend, config_with_default("llama3.2:latest"), tx);

    conductor.start().await.unwrap();
    conductor.handle_event(connected()).await.unwrap();
    conductor
        .handle_event(SurfaceEvent::from_input("Hi".to_string()))
        .await
        .unwrap();

    let calls = calls.lock().unwrap();
    assert!(!calls.iter().any(|c| matches!(c, Call::Pull(_))));
}

/// Selected model absent: exactly one pull, before the first generation.
#[tokio::test]
async fn test_missing_model_pulled_once_before_generation() {
    let backend = ScriptedBackend::new(&["gemma3:12b"], &["ok"]);
    let calls = backend.calls();
    let (tx, mut rx) = mpsc::channel(256);
    let mut conductor = Conductor::new(backend, config_with_default("mistral:latest"), tx);

    conductor.start().await.unwrap();
    conductor.handle_event(connected()).await.unwrap();
    conductor
        .handle_event(SurfaceEvent::from_input("one".to_string()))
        .await
        .unwrap();
    conductor
        .handle_event(SurfaceEvent::from_input("two".to_string()))
        .await
        .unwrap();

    let calls = calls.lock().unwrap().clone();
    let pulls: Vec<_> = calls.iter().filter(|c| matches!(c, Call::Pull(_))).collect();
    assert_eq!(pulls, vec![&Call::Pull("mistral:latest".to_string())]);

    let pull_at = calls.iter().position(|c| matches!(c, Call::Pull(_))).unwrap();
    let first_generate = calls
        .iter()
        .position(|c| matches!(c, Call::Generate { .. }))
        .unwrap();
    assert!(pull_at < first_generate);

    let notes = notices(&drain(&mut rx));
    assert!(notes
        .iter()
        .any(|(_, m)| m.starts_with("Model 'mistral:latest' not found locally")));
    assert!(notes.contains(&(
        NotifyLevel::Success,
        "Successfully pulled 'mistral:latest'.".to_string()
    )));
}

/// Switching to an absent model pulls it; switching back does not pull again.
#[tokio::test]
async fn test_selection_change_verifies_new_model() {
    let backend = ScriptedBackend::new(&["gemma3:12b"], &["ok"]);
    let calls = backend.calls();
    let (tx, mut rx) = mpsc::channel(256);
    let mut conductor = Conductor::new(backend, config_with_default("gemma3:12b"), tx);

    conductor.start().await.unwrap();
    conductor.handle_event(connected()).await.unwrap();
    for model in ["deepseek-r1:8b", "gemma3:12b", "deepseek-r1:8b"] {
        conductor
            .handle_event(SurfaceEvent::ModelSelected {
                event_id: SurfaceEvent::new_event_id(),
                model: model.to_string(),
            })
            .await
            .unwrap();
    }

    assert_eq!(conductor.session().selected_model(), "deepseek-r1:8b");
    let pulls = calls
        .lock()
        .unwrap()
        .iter()
        .filter(|c| matches!(c, Call::Pull(_)))
        .count();
    assert_eq!(pulls, 1);

    let selected: Vec<String> = drain(&mut rx)
        .into_iter()
        .filter_map(|m| match m {
            ConductorMessage::ModelSelected { model } => Some(model),
            _ => None,
        })
        .collect();
    assert_eq!(selected, vec!["deepseek-r1:8b", "gemma3:12b", "deepseek-r1:8b"]);
}

// =============================================================================
// Failure Handling Tests
// =============================================================================

/// Generation failure: partial text kept, error notice sent, loop continues.
#[tokio::test]
async fn test_generation_failure_becomes_notice() {
    let mut backend = ScriptedBackend::new(&["gemma3:12b"], &["Par", "tial "]);
    backend.stream_error = Some("model crashed".to_string());
    let (tx, mut rx) = mpsc::channel(256);
    let mut conductor = Conductor::new(backend, config_with_default("gemma3:12b"), tx);

    conductor.start().await.unwrap();
    conductor
        .handle_event(SurfaceEvent::from_input("Hi".to_string()))
        .await
        .unwrap();

    assert_eq!(conductor.state(), ConductorState::AwaitingInput);
    let last = conductor.session().last().unwrap();
    assert_eq!(last.role, MessageRole::Assistant);
    assert_eq!(last.content, "Partial");

    let sent = drain(&mut rx);
    assert!(sent
        .iter()
        .any(|m| matches!(m, ConductorMessage::StreamError { .. })));
    assert!(notices(&sent)
        .iter()
        .any(|(level, m)| *level == NotifyLevel::Error && m.contains("model crashed")));
}

/// Request rejected before streaming: empty reply recorded.
#[tokio::test]
async fn test_send_failure_records_empty_reply() {
    let mut backend = ScriptedBackend::new(&["gemma3:12b"], &[]);
    backend.send_error = Some("connection refused".to_string());
    let (tx, _rx) = mpsc::channel(256);
    let mut conductor = Conductor::new(backend, config_with_default("gemma3:12b"), tx);

    conductor.start().await.unwrap();
    conductor
        .handle_event(SurfaceEvent::from_input("Hi".to_string()))
        .await
        .unwrap();

    let messages = conductor.session().messages();
    assert_eq!(messages.len(), 2);
    assert_eq!(messages[1].content, "");
}

/// Listing failure: notice, then the model is treated as absent and pulled.
#[tokio::test]
async fn test_listing_failure_attempts_pull() {
    let mut backend = ScriptedBackend::new(&[], &["ok"]);
    backend.installed = Err("connection refused".to_string());
    let calls = backend.calls();
    let (tx, mut rx) = mpsc::channel(256);
    let mut conductor = Conductor::new(backend, config_with_default("gemma3:12b"), tx);

    conductor.handle_event(connected()).await.unwrap();

    let notes = notices(&drain(&mut rx));
    assert!(notes.contains(&(
        NotifyLevel::Error,
        "Error listing locally available models: connection refused".to_string()
    )));
    assert!(calls
        .lock()
        .unwrap()
        .contains(&Call::Pull("gemma3:12b".to_string())));
}

/// Pull failure: error notice, chat still works, reselecting retries.
#[tokio::test]
async fn test_pull_failure_does_not_block_turns() {
    let mut backend = ScriptedBackend::new(&[], &["still here"]);
    backend.pull_error = Some("manifest unknown".to_string());
    let calls = backend.calls();
    let (tx, mut rx) = mpsc::channel(256);
    let mut conductor = Conductor::new(backend, config_with_default("gemma3:12b"), tx);

    conductor.start().await.unwrap();
    conductor.handle_event(connected()).await.unwrap();
    conductor
        .handle_event(SurfaceEvent::from_input("Hi".to_string()))
        .await
        .unwrap();

    assert_eq!(conductor.session().last().unwrap().content, "still here");
    let notes = notices(&drain(&mut rx));
    assert!(notes.iter().any(|(level, m)| *level == NotifyLevel::Error
        && m == "Error pulling model 'gemma3:12b': manifest unknown"));

    conductor
        .handle_event(SurfaceEvent::from_input("/model mistral:latest".to_string()))
        .await
        .unwrap();
    conductor
        .handle_event(SurfaceEvent::from_input("/model gemma3:12b".to_string()))
        .await
        .unwrap();

    let gemma_pulls = calls
        .lock()
        .unwrap()
        .iter()
        .filter(|c| **c == Call::Pull("gemma3:12b".to_string()))
        .count();
    assert_eq!(gemma_pulls, 2);
}

// =============================================================================
// Backend Process Tests
// =============================================================================

#[tokio::test]
async fn test_launch_notice_on_start() {
    let backend = ScriptedBackend::new(&["gemma3:12b"], &["ok"]);
    let (tx, mut rx) = mpsc::channel(256);
    let config = ConductorConfig {
        process: ProcessSettings {
            startup_delay: std::time::Duration::ZERO,
            ..ProcessSettings::default()
        },
        ..config_with_default("gemma3:12b")
    };
    let mut conductor = Conductor::with_process_control(
        backend,
        config,
        AbsentServer { launch_error: None },
        tx,
    );

    conductor.start().await.unwrap();

    assert!(notices(&drain(&mut rx))
        .contains(&(NotifyLevel::Info, "Starting Ollama server...".to_string())));
}

#[tokio::test]
async fn test_launch_failure_notice_does_not_stop_turns() {
    let backend = ScriptedBackend::new(&["gemma3:12b"], &["ok"]);
    let (tx, mut rx) = mpsc::channel(256);
    let config = ConductorConfig {
        process: ProcessSettings {
            startup_delay: std::time::Duration::ZERO,
            ..ProcessSettings::default()
        },
        ..config_with_default("gemma3:12b")
    };
    let mut conductor = Conductor::with_process_control(
        backend,
        config,
        AbsentServer {
            launch_error: Some("ollama: command not found".to_string()),
        },
        tx,
    );

    conductor.start().await.unwrap();
    conductor
        .handle_event(SurfaceEvent::from_input("Hi".to_string()))
        .await
        .unwrap();

    assert_eq!(conductor.session().len(), 2);
    assert!(notices(&drain(&mut rx)).iter().any(|(level, m)| {
        *level == NotifyLevel::Error && m.contains("command not found")
    }));
}

// =============================================================================
// Configuration Flow Tests
// =============================================================================

#[tokio::test]
async fn test_structured_mode_from_config_file() {
    let mut file = NamedTempFile::new().unwrap();
    file.write_all(
        br#"
[process]
manage = false

[models]
allowed = ["llama3.2:latest", "mistral:latest"]

[chat]
prompt_mode = "structured"
"#,
    )
    .unwrap();

    let config = load_config_with_env(Some(file.path()), |_| None).unwrap();
    let conductor_config = config.conductor_config().unwrap();
    assert_eq!(conductor_config.prompt_mode, PromptMode::Structured);

    let backend = ScriptedBackend::new(&["llama3.2:latest"], &["ok"]);
    let calls = backend.calls();
    let (tx, _rx) = mpsc::channel(256);
    let mut conductor = Conductor::new(backend, conductor_config, tx);

    conductor.start().await.unwrap();
    conductor
        .handle_event(SurfaceEvent::from_input("Hi".to_string()))
        .await
        .unwrap();

    let calls = calls.lock().unwrap();
    assert!(calls.iter().any(|c| matches!(
        c,
        Call::Generate { chat: true, model, .. } if model == "llama3.2:latest"
    )));
}

/// The run loop in its own task, driven over channels like the TUI does.
#[tokio::test]
async fn test_run_loop_over_channels() {
    let backend = ScriptedBackend::new(&["gemma3:12b"], &["Hello", " back"]);
    let (tx, mut rx) = mpsc::channel(256);
    let (event_tx, event_rx) = mpsc::channel(16);
    let mut conductor = Conductor::new(backend, config_with_default("gemma3:12b"), tx);

    let handle = tokio::spawn(async move {
        conductor.run(event_rx).await.unwrap();
        conductor
    });

    event_tx.send(connected()).await.unwrap();
    event_tx
        .send(SurfaceEvent::from_input("Hi".to_string()))
        .await
        .unwrap();
    event_tx
        .send(SurfaceEvent::QuitRequested {
            event_id: SurfaceEvent::new_event_id(),
        })
        .await
        .unwrap();

    let conductor = handle.await.unwrap();
    assert_eq!(conductor.session().last().unwrap().content, "Hello back");

    let mut saw_info = false;
    let mut saw_quit = false;
    for msg in drain(&mut rx) {
        match msg {
            ConductorMessage::SessionInfo {
                title,
                available_models,
                ..
            } => {
                assert_eq!(title, "Ollama Chat Interface");
                assert_eq!(available_models.len(), 5);
                saw_info = true;
            }
            ConductorMessage::Quit { .. } => saw_quit = true,
            _ => {}
        }
    }
    assert!(saw_info);
    assert!(saw_quit);
}
