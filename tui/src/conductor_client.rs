//! Conductor Client
//!
//! Thin wrapper around the Conductor for TUI integration.
//! The Conductor runs in its own task; this client holds both ends of the
//! channels that connect it to the render loop.
//!
//! # Architecture
//!
//! The TUI is a "thin client" - it doesn't contain any business logic.
//! All orchestration happens in the Conductor. The TUI's job is:
//! 1. Convert terminal events to SurfaceEvents
//! 2. Send SurfaceEvents to Conductor
//! 3. Receive ConductorMessages
//! 4. Render display state based on messages
//!
//! Because the Conductor awaits a whole turn before reading the next event,
//! keeping it in a separate task is what lets the render loop draw tokens
//! while a response is still streaming.

use tokio::sync::mpsc;
use tokio::task::JoinHandle;

use chat_conductor::{
    ChatConfig, Conductor, ConductorConfig, ConductorMessage, LlmBackend, OllamaBackend,
    SurfaceEvent, SurfaceType,
};

/// Conductor -> TUI channel capacity (one message per token while streaming)
const MESSAGE_BUFFER: usize = 1024;

/// TUI -> Conductor channel capacity
const EVENT_BUFFER: usize = 32;

/// Client for communicating with the Conductor task
pub struct ConductorClient {
    /// Events to the Conductor
    events: mpsc::Sender<SurfaceEvent>,
    /// Messages from the Conductor
    rx: mpsc::Receiver<ConductorMessage>,
    /// The Conductor task
    handle: JoinHandle<()>,
}

impl ConductorClient {
    /// Spawn a Conductor talking to the configured Ollama server
    pub fn from_config(config: &ChatConfig) -> anyhow::Result<Self> {
        let backend = OllamaBackend::new(config.backend.clone())?;
        Ok(Self::spawn(backend, config.conductor_config()?))
    }

    /// Spawn a Conductor over any backend
    pub fn spawn<B: LlmBackend + 'static>(backend: B, config: ConductorConfig) -> Self {
        let (tx, rx) = mpsc::channel(MESSAGE_BUFFER);
        let (events, events_rx) = mpsc::channel(EVENT_BUFFER);

        let mut conductor = Conductor::new(backend, config, tx);
        let handle = tokio::spawn(async move {
            if let Err(e) = conductor.run(events_rx).await {
                tracing::error!(error = %e, "Conductor stopped with an error");
            }
        });

        Self { events, rx, handle }
    }

    /// Connect this surface to the Conductor
    pub async fn connect(&self) -> anyhow::Result<()> {
        self.send_event(SurfaceEvent::Connected {
            event_id: SurfaceEvent::new_event_id(),
            surface_type: SurfaceType::Tui,
        })
        .await
    }

    /// Send what the user typed (slash-prefixed input becomes a command)
    pub async fn send_input(&self, text: String) -> anyhow::Result<()> {
        self.send_event(SurfaceEvent::from_input(text)).await
    }

    /// Ask the Conductor to switch models
    pub async fn select_model(&self, model: String) -> anyhow::Result<()> {
        self.send_event(SurfaceEvent::ModelSelected {
            event_id: SurfaceEvent::new_event_id(),
            model,
        })
        .await
    }

    /// Notify Conductor that user wants to quit
    pub async fn request_quit(&self) -> anyhow::Result<()> {
        self.send_event(SurfaceEvent::QuitRequested {
            event_id: SurfaceEvent::new_event_id(),
        })
        .await
    }

    /// Send raw surface event to Conductor
    pub async fn send_event(&self, event: SurfaceEvent) -> anyhow::Result<()> {
        self.events
            .send(event)
            .await
            .map_err(|_| anyhow::anyhow!("Conductor is no longer running"))
    }

    /// Wait for the next message (None once the Conductor has stopped)
    pub async fn recv(&mut self) -> Option<ConductorMessage> {
        self.rx.recv().await
    }

    /// Receive all pending messages from the Conductor (non-blocking)
    pub fn recv_all(&mut self) -> Vec<ConductorMessage> {
        let mut messages = Vec::new();
        while let Ok(msg) = self.rx.try_recv() {
            messages.push(msg);
        }
        messages
    }
}

impl Drop for ConductorClient {
    fn drop(&mut self) {
        // A turn may still be streaming; nothing is left to render it
        self.handle.abort();
    }
}
