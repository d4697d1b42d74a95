//! Conductor - The Orchestration Core
//!
//! The Conductor owns the chat session and drives every turn:
//!
//! ```text
//! check backend → read model selection → append user message
//!     → build prompt → stream response → append assistant message
//! ```
//!
//! # Design Philosophy
//!
//! The Conductor is UI-agnostic. It talks to whatever surface is attached
//! through two enums:
//! - `ConductorMessage`: Commands sent TO the UI surface
//! - `SurfaceEvent`: Events received FROM the UI surface
//!
//! Events are handled strictly one at a time. A turn awaits its whole
//! response stream before the next event is read, so there is never more
//! than one generation in flight; the surface keeps rendering the fragments
//! it receives meanwhile.
//!
//! Failures never escape a turn. Each one is logged, converted to a
//! [`ChatError`] and shown to the user as a one-shot notice.

use std::collections::HashSet;
use std::sync::Arc;

use tokio::sync::mpsc;
use tokio_stream::wrappers::ReceiverStream;

use crate::backend::{
    BackendSupervisor, LaunchOutcome, LlmBackend, LlmRequest, ProcessControl, ProcessSettings,
    SystemProcesses,
};
use crate::config::DEFAULT_TITLE;
use crate::error::ChatError;
use crate::events::{SurfaceEvent, SurfaceType};
use crate::messages::{
    ConductorMessage, ConductorState, EventId, MessageId, MessageRole, NotifyLevel, SessionId,
};
use crate::models::ModelCatalog;
use crate::prompt::{build_prompt, to_chat_messages, PromptMode};
use crate::session::Session;
use crate::streaming::{stream_response, ChannelSink};

/// Help text for `/help`
const HELP_TEXT: &str =
    "Available commands: /help, /clear, /model <name>, /models, /quit";

/// Conductor configuration
#[derive(Clone, Debug)]
pub struct ConductorConfig {
    /// Selectable models and the startup selection
    pub catalog: ModelCatalog,
    /// Title shown by the surface
    pub title: String,
    /// How history is sent to the backend
    pub prompt_mode: PromptMode,
    /// System prompt sent with every generation
    pub system_prompt: Option<String>,
    /// Sampling temperature (backend default when `None`)
    pub temperature: Option<f32>,
    /// Local server process handling
    pub process: ProcessSettings,
}

impl Default for ConductorConfig {
    fn default() -> Self {
        Self {
            catalog: ModelCatalog::default(),
            title: DEFAULT_TITLE.to_string(),
            prompt_mode: PromptMode::Flat,
            system_prompt: None,
            temperature: None,
            process: ProcessSettings::default(),
        }
    }
}

/// The Conductor - headless orchestration core
pub struct Conductor<B: LlmBackend, P: ProcessControl = SystemProcesses> {
    /// Configuration
    config: ConductorConfig,
    /// LLM backend
    backend: Arc<B>,
    /// Local server check
    supervisor: BackendSupervisor<P>,
    /// Current session
    session: Session,
    /// Current operational state
    state: ConductorState,
    /// Channel to send messages to UI surface
    tx: mpsc::Sender<ConductorMessage>,
    /// Connected surface
    surface_type: Option<SurfaceType>,
    /// Models known to be installed (listed or pulled this session)
    verified_models: HashSet<String>,
    /// Cleared by shutdown
    running: bool,
}

impl<B: LlmBackend + 'static> Conductor<B> {
    /// Create a new Conductor with the given backend
    pub fn new(backend: B, config: ConductorConfig, tx: mpsc::Sender<ConductorMessage>) -> Self {
        Self::with_process_control(backend, config, SystemProcesses, tx)
    }
}

impl<B: LlmBackend + 'static, P: ProcessControl> Conductor<B, P> {
    /// Create a Conductor with a custom process control
    pub fn with_process_control(
        backend: B,
        config: ConductorConfig,
        control: P,
        tx: mpsc::Sender<ConductorMessage>,
    ) -> Self {
        let session = Session::new(config.catalog.default_model());
        let supervisor = BackendSupervisor::with_control(control, config.process.clone());

        Self {
            config,
            backend: Arc::new(backend),
            supervisor,
            session,
            state: ConductorState::Initializing,
            tx,
            surface_type: None,
            verified_models: HashSet::new(),
            running: true,
        }
    }

    /// Get the session ID
    pub fn session_id(&self) -> &SessionId {
        &self.session.id
    }

    /// Get the session
    pub fn session(&self) -> &Session {
        &self.session
    }

    /// Get current state
    pub fn state(&self) -> ConductorState {
        self.state
    }

    /// Connected surface, if any
    pub fn surface_type(&self) -> Option<&SurfaceType> {
        self.surface_type.as_ref()
    }

    /// Whether shutdown has not been requested yet
    pub fn is_running(&self) -> bool {
        self.running
    }

    /// Start the Conductor (make sure the backend is up)
    pub async fn start(&mut self) -> anyhow::Result<()> {
        self.set_state(ConductorState::Initializing).await;
        self.ensure_backend().await;
        self.set_state(ConductorState::AwaitingInput).await;

        tracing::info!(
            session = %self.session.id,
            model = %self.session.selected_model(),
            backend = %self.backend.name(),
            "Conductor started"
        );
        Ok(())
    }

    /// Process events until the surface quits or the channel closes
    pub async fn run(&mut self, mut events: mpsc::Receiver<SurfaceEvent>) -> anyhow::Result<()> {
        self.start().await?;

        while self.running {
            let Some(event) = events.recv().await else {
                tracing::debug!("Surface event channel closed");
                break;
            };
            self.handle_event(event).await?;
        }

        Ok(())
    }

    /// Handle an event from the UI surface
    pub async fn handle_event(&mut self, event: SurfaceEvent) -> anyhow::Result<()> {
        match event {
            SurfaceEvent::Connected {
                event_id,
                surface_type,
            } => {
                tracing::info!(surface = %surface_type.name(), "Surface connected");
                self.surface_type = Some(surface_type);
                self.ack(event_id).await;

                self.send(ConductorMessage::State { state: self.state })
                    .await;
                self.send(ConductorMessage::SessionInfo {
                    session_id: self.session.id.clone(),
                    title: self.config.title.clone(),
                    model: self.session.selected_model().to_string(),
                    available_models: self.config.catalog.models().to_vec(),
                })
                .await;

                // Session entry: make sure the startup model is installed
                self.ensure_model_available().await;
            }

            SurfaceEvent::UserMessage { event_id, content } => {
                self.ack(event_id).await;
                if content.trim().is_empty() {
                    tracing::debug!("Ignoring blank input");
                } else {
                    self.handle_user_message(content).await;
                }
            }

            SurfaceEvent::ModelSelected { event_id, model } => {
                self.ack(event_id).await;
                self.select_model(&model).await;
            }

            SurfaceEvent::UserCommand {
                event_id,
                command,
                args,
            } => {
                self.ack(event_id).await;
                self.handle_command(&command, &args).await?;
            }

            SurfaceEvent::QuitRequested { event_id } => {
                self.ack(event_id).await;
                self.shutdown().await?;
            }
        }

        Ok(())
    }

    /// Run one turn: prompt the selected model and record its reply
    async fn handle_user_message(&mut self, content: String) {
        self.ensure_backend().await;

        let model = self.session.selected_model().to_string();
        self.set_state(ConductorState::ProcessingTurn).await;

        let user_msg_id = self.session.add_user_message(content.clone());
        self.send(ConductorMessage::Message {
            id: user_msg_id,
            role: MessageRole::User,
            content,
        })
        .await;

        let request = self.build_request(&model);
        let reply_id = MessageId::new();
        self.send(ConductorMessage::StreamStart {
            message_id: reply_id.clone(),
            model: model.clone(),
        })
        .await;

        tracing::info!(
            model = %model,
            mode = %self.config.prompt_mode,
            history = self.session.len(),
            "Starting turn"
        );

        let result = match self.backend.send_streaming(&request).await {
            Ok(rx) => {
                let mut sink = ChannelSink::new(self.tx.clone(), reply_id.clone());
                stream_response(ReceiverStream::new(rx), &mut sink).await
            }
            Err(e) => Err(ChatError::generation(e)),
        };

        match result {
            Ok(text) => {
                self.session
                    .add_assistant_message_with_id(reply_id.clone(), text.clone());
                self.send(ConductorMessage::StreamEnd {
                    message_id: reply_id,
                    final_content: text,
                })
                .await;
            }
            Err(err) => {
                // Keep user/assistant alternation even when nothing arrived
                let partial = match &err {
                    ChatError::Generation { partial, .. } => partial.clone(),
                    _ => String::new(),
                };
                tracing::warn!(model = %model, error = %err, "Turn failed");
                self.session
                    .add_assistant_message_with_id(reply_id.clone(), partial);
                self.send(ConductorMessage::StreamError {
                    message_id: reply_id,
                    error: err.to_string(),
                })
                .await;
                self.notify(NotifyLevel::Error, &err.to_string()).await;
            }
        }

        self.set_state(ConductorState::AwaitingInput).await;
    }

    /// Build the backend request for the current history
    fn build_request(&self, model: &str) -> LlmRequest {
        let messages = self.session.messages();
        let mut request = match self.config.prompt_mode {
            PromptMode::Flat => LlmRequest::new(build_prompt(messages), model),
            PromptMode::Structured => LlmRequest::chat(to_chat_messages(messages), model),
        };

        if let Some(ref system) = self.config.system_prompt {
            request = request.with_system(system.clone());
        }
        if let Some(temperature) = self.config.temperature {
            request = request.with_temperature(temperature);
        }

        request
    }

    /// Make sure the local server is running, surfacing what happened
    async fn ensure_backend(&mut self) -> LaunchOutcome {
        let outcome = self.supervisor.ensure_backend_running().await;
        match &outcome {
            LaunchOutcome::Launched => {
                self.notify(NotifyLevel::Info, "Starting Ollama server...")
                    .await;
            }
            LaunchOutcome::LaunchFailed(reason) => {
                let err = ChatError::BackendUnavailable(reason.clone());
                tracing::warn!(error = %err, "Backend launch failed");
                self.notify(NotifyLevel::Error, &err.to_string()).await;
            }
            LaunchOutcome::AlreadyRunning | LaunchOutcome::Unmanaged => {}
        }
        outcome
    }

    /// Change the selected model
    async fn select_model(&mut self, model: &str) {
        if let Err(err) = self.config.catalog.check(model) {
            tracing::warn!(model = %model, "Rejected model selection");
            self.notify(NotifyLevel::Warning, &err.to_string()).await;
            return;
        }

        if !self.session.select_model(model) {
            return;
        }

        self.send(ConductorMessage::ModelSelected {
            model: model.to_string(),
        })
        .await;
        self.notify(NotifyLevel::Info, &format!("Model set to: {model}"))
            .await;

        self.ensure_model_available().await;
    }

    /// Pull the selected model if the backend does not have it yet
    ///
    /// A model found in the listing or pulled successfully is remembered, so
    /// it is pulled at most once per session. Failures only produce a notice.
    pub async fn ensure_model_available(&mut self) {
        let model = self.session.selected_model().to_string();
        if self.verified_models.contains(&model) {
            return;
        }

        let installed = match self.backend.list_models().await {
            Ok(models) => models,
            Err(e) => {
                let err = ChatError::ModelListing(e.to_string());
                tracing::warn!(error = %err, "Model listing failed");
                self.notify(NotifyLevel::Error, &err.to_string()).await;
                Vec::new()
            }
        };

        if installed.iter().any(|m| m.name == model) {
            tracing::debug!(model = %model, "Model installed");
            self.verified_models.insert(model);
            return;
        }

        self.notify(
            NotifyLevel::Info,
            &format!(
                "Model '{model}' not found locally. Pulling the model now. \
                 This is only required once and may take a while..."
            ),
        )
        .await;

        let previous = self.state;
        self.set_state(ConductorState::PullingModel).await;
        tracing::info!(model = %model, "Pulling model");

        match self.backend.pull_model(&model).await {
            Ok(()) => {
                tracing::info!(model = %model, "Model pulled");
                self.notify(NotifyLevel::Success, &format!("Successfully pulled '{model}'."))
                    .await;
                self.verified_models.insert(model);
            }
            Err(e) => {
                let err = ChatError::ModelPull {
                    model,
                    reason: e.to_string(),
                };
                tracing::warn!(error = %err, "Model pull failed");
                self.notify(NotifyLevel::Error, &err.to_string()).await;
            }
        }

        self.set_state(previous).await;
    }

    /// Handle a user command
    async fn handle_command(&mut self, command: &str, args: &[String]) -> anyhow::Result<()> {
        match command {
            "help" => {
                self.notify(NotifyLevel::Info, HELP_TEXT).await;
            }
            "clear" => {
                self.session.clear_history();
                self.send(ConductorMessage::HistoryCleared).await;
                self.notify(NotifyLevel::Info, "Conversation cleared").await;
            }
            "quit" | "exit" => {
                self.shutdown().await?;
            }
            "model" => match args.first() {
                Some(model) => {
                    let model = model.clone();
                    self.select_model(&model).await;
                }
                None => {
                    let message = format!(
                        "Current model: {}. Available: {}",
                        self.session.selected_model(),
                        self.config.catalog.models().join(", ")
                    );
                    self.notify(NotifyLevel::Info, &message).await;
                }
            },
            "models" => match self.backend.list_models().await {
                Ok(models) if models.is_empty() => {
                    self.notify(NotifyLevel::Info, "No models installed locally")
                        .await;
                }
                Ok(models) => {
                    let names: Vec<&str> = models.iter().map(|m| m.name.as_str()).collect();
                    self.notify(
                        NotifyLevel::Info,
                        &format!("Installed models: {}", names.join(", ")),
                    )
                    .await;
                }
                Err(e) => {
                    let err = ChatError::ModelListing(e.to_string());
                    tracing::warn!(error = %err, "Model listing failed");
                    self.notify(NotifyLevel::Error, &err.to_string()).await;
                }
            },
            _ => {
                self.notify(
                    NotifyLevel::Warning,
                    &format!("Unknown command: /{command}"),
                )
                .await;
            }
        }

        Ok(())
    }

    /// Shutdown the Conductor
    pub async fn shutdown(&mut self) -> anyhow::Result<()> {
        tracing::info!(
            session = %self.session.id,
            turns = self.session.metadata.turn_count,
            "Conductor shutting down"
        );
        self.set_state(ConductorState::ShuttingDown).await;
        self.send(ConductorMessage::Quit {
            message: Some("Goodbye!".to_string()),
        })
        .await;
        self.running = false;
        Ok(())
    }

    // ============================================
    // Helpers
    // ============================================

    async fn set_state(&mut self, state: ConductorState) {
        if self.state != state {
            tracing::debug!(from = ?self.state, to = ?state, "State change");
        }
        self.state = state;
        self.send(ConductorMessage::State { state }).await;
    }

    async fn ack(&self, event_id: EventId) {
        self.send(ConductorMessage::Ack { event_id }).await;
    }

    async fn notify(&self, level: NotifyLevel, message: &str) {
        self.send(ConductorMessage::Notify {
            level,
            message: message.to_string(),
        })
        .await;
    }

    async fn send(&self, msg: ConductorMessage) {
        if self.tx.send(msg).await.is_err() {
            tracing::trace!("Surface channel closed, dropping message");
        }
    }
}
