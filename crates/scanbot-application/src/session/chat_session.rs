//! Per-chat conversation state machine.
//!
//! Walks the user through target, source, duplex (feeder only) and mode,
//! then runs the scan and hands the result to the delivery dispatcher.
//! Every error is absorbed here: it is logged, folded into the next prompt,
//! and the chat returns to the "use last configuration" menu.

use scanbot_core::chat::{ChatId, Choice, Prompt, PromptHandle};
use scanbot_core::error::ScanBotError;
use scanbot_core::scanner::{
    Decision, DocumentStream, ScanConfig, ScanFunction, ScanMode, ScanSource, ScanTarget,
    ScannedDocument, read_document, stream_from_bytes,
};
use std::str::FromStr;

use super::SessionServices;
use super::model::{Phase, Selection};

/// Free-text command that resets the conversation from any phase.
pub const RESTART_COMMAND: &str = "/restart";

/// Front pass of a duplex scan, held until the rear pass arrives.
struct PendingFront {
    document: Vec<u8>,
    file_name: String,
}

pub struct ChatSession {
    chat_id: ChatId,
    phase: Phase,
    selection: Selection,
    last_config: Option<ScanConfig>,
    active_function: Option<ScanFunction>,
    pending_front: Option<PendingFront>,
    prompt: Option<PromptHandle>,
    /// Replace the current prompt with a fresh message instead of editing it.
    fresh_prompt: bool,
    /// Outcome line shown on top of the next prompt.
    status: Option<String>,
}

impl ChatSession {
    pub fn new(chat_id: ChatId) -> Self {
        Self {
            chat_id,
            phase: Phase::Init,
            selection: Selection::default(),
            last_config: None,
            active_function: None,
            pending_front: None,
            prompt: None,
            fresh_prompt: false,
            status: None,
        }
    }

    pub fn chat_id(&self) -> ChatId {
        self.chat_id
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn selection(&self) -> &Selection {
        &self.selection
    }

    pub fn last_config(&self) -> Option<ScanConfig> {
        self.last_config
    }

    pub fn active_function(&self) -> Option<ScanFunction> {
        self.active_function
    }

    pub fn has_pending_front(&self) -> bool {
        self.pending_front.is_some()
    }

    /// Handles free text. Only the restart command, or the first contact of
    /// a chat, moves the conversation.
    pub async fn handle_message(&mut self, text: &str, services: &SessionServices) {
        tracing::debug!("[ChatSession] {} message in {:?}", self.chat_id, self.phase);

        if text.trim() == RESTART_COMMAND {
            self.restart(services).await;
        } else if self.phase == Phase::Init {
            self.enter_init(services).await;
        }
    }

    /// Handles a button press carrying `data`.
    pub async fn handle_callback(&mut self, data: &str, services: &SessionServices) {
        tracing::debug!(
            "[ChatSession] {} pressed '{}' in {:?}",
            self.chat_id,
            data,
            self.phase
        );

        match self.phase {
            Phase::Init => self.enter_init(services).await,
            Phase::AwaitReuseLastConfig => {
                let Some(decision) = self.parse::<Decision>(data) else {
                    return;
                };
                match (decision, self.last_config) {
                    (Decision::Yes, Some(config)) => {
                        self.selection = Selection::from(config);
                        self.enter_confirmation(config, services).await;
                    }
                    _ => self.show_target(services).await,
                }
            }
            Phase::SelectTarget => {
                let Some(target) = self.parse::<ScanTarget>(data) else {
                    return;
                };
                if !offered_targets(services).contains(&target) {
                    return self.reject(data);
                }
                self.selection = Selection {
                    target: Some(target),
                    ..Selection::default()
                };
                self.show_source(target, services).await;
            }
            Phase::SelectSource => {
                let (Some(source), Some(target)) =
                    (self.parse::<ScanSource>(data), self.selection.target)
                else {
                    return;
                };
                if !services.catalog.sources(target).contains(&source) {
                    return self.reject(data);
                }
                self.selection.source = Some(source);
                match source {
                    ScanSource::Adf => self.show_duplex(services).await,
                    ScanSource::Flatbed => self.show_mode(target, source, services).await,
                }
            }
            Phase::SelectDuplex => {
                let (Some(decision), Some(target), Some(source)) = (
                    self.parse::<Decision>(data),
                    self.selection.target,
                    self.selection.source,
                ) else {
                    return;
                };
                self.selection.duplex = Some(decision == Decision::Yes);
                self.show_mode(target, source, services).await;
            }
            Phase::SelectMode => {
                let (Some(mode), Some(target), Some(source)) = (
                    self.parse::<ScanMode>(data),
                    self.selection.target,
                    self.selection.source,
                ) else {
                    return;
                };
                if !services.catalog.modes(target, source).contains(&mode) {
                    return self.reject(data);
                }
                self.selection.mode = Some(mode);
                match self.selection.complete() {
                    Some(config) => {
                        self.last_config = Some(config);
                        self.enter_confirmation(config, services).await;
                    }
                    None => self.show_target(services).await,
                }
            }
            Phase::AwaitFrontScanConfirm => match self.parse::<Decision>(data) {
                Some(Decision::Yes) => self.scan_front(services).await,
                Some(Decision::No) => self.finish_cycle(services).await,
                None => {}
            },
            Phase::AwaitRearScanConfirm => match self.parse::<Decision>(data) {
                Some(Decision::Yes) => self.scan_rear(services).await,
                Some(Decision::No) => {
                    self.pending_front = None;
                    self.finish_cycle(services).await;
                }
                None => {}
            },
            Phase::AwaitSimpleScanConfirm => match self.parse::<Decision>(data) {
                Some(Decision::Yes) => self.scan_simple(services).await,
                Some(Decision::No) => self.finish_cycle(services).await,
                None => {}
            },
        }
    }

    async fn restart(&mut self, services: &SessionServices) {
        tracing::info!("[ChatSession] {} restarted", self.chat_id);
        self.phase = Phase::Init;
        self.selection = Selection::default();
        self.active_function = None;
        self.pending_front = None;
        self.status = None;
        self.fresh_prompt = true;
        self.enter_init(services).await;
    }

    async fn enter_init(&mut self, services: &SessionServices) {
        match self.last_config {
            Some(config) => self.show_reuse(config, services).await,
            None => self.show_target(services).await,
        }
    }

    /// Moves to the scan confirmation matching `config`.
    async fn enter_confirmation(&mut self, config: ScanConfig, services: &SessionServices) {
        let Some(function) =
            services
                .catalog
                .resolve(Some(config.target), Some(config.source), Some(config.mode))
        else {
            tracing::warn!("[ChatSession] {} has no scan function for {:?}", self.chat_id, config);
            self.last_config = None;
            self.status = Some("That configuration is no longer available.".to_string());
            return self.show_target(services).await;
        };

        self.active_function = Some(function);
        if config.duplex {
            self.show(
                Phase::AwaitFrontScanConfirm,
                Prompt::yes_no("Start front scan?"),
                services,
            )
            .await;
        } else {
            self.show(
                Phase::AwaitSimpleScanConfirm,
                Prompt::yes_no("Start scan?"),
                services,
            )
            .await;
        }
    }

    async fn scan_front(&mut self, services: &SessionServices) {
        let Some(document) = self.scan(services).await else {
            return self.finish_cycle(services).await;
        };

        if self.selection.duplex != Some(true) {
            self.deliver(document.stream, &document.file_name, services)
                .await;
            return self.finish_cycle(services).await;
        }

        match read_document(document.stream).await {
            Ok(bytes) => {
                self.pending_front = Some(PendingFront {
                    document: bytes,
                    file_name: document.file_name,
                });
                self.show(
                    Phase::AwaitRearScanConfirm,
                    Prompt::yes_no("Front side scanned. Turn the stack over and start rear scan?"),
                    services,
                )
                .await;
            }
            Err(err) => {
                self.fail("Scan failed", &err);
                self.finish_cycle(services).await;
            }
        }
    }

    async fn scan_rear(&mut self, services: &SessionServices) {
        let Some(front) = self.pending_front.take() else {
            tracing::warn!("[ChatSession] {} has no buffered front side", self.chat_id);
            return self.finish_cycle(services).await;
        };

        if let Some(rear) = self.scan(services).await {
            tracing::debug!(
                "[ChatSession] {} merging {} with {}",
                self.chat_id,
                front.file_name,
                rear.file_name
            );
            match services
                .merger
                .merge(stream_from_bytes(front.document), rear.stream)
                .await
            {
                Ok(merged) => self.deliver(merged, &rear.file_name, services).await,
                Err(err) => self.fail("Duplex merge failed", &err),
            }
        }
        self.finish_cycle(services).await;
    }

    async fn scan_simple(&mut self, services: &SessionServices) {
        if let Some(document) = self.scan(services).await {
            self.deliver(document.stream, &document.file_name, services)
                .await;
        }
        self.finish_cycle(services).await;
    }

    /// Runs one scan with the active function. Failures are recorded as status.
    async fn scan(&mut self, services: &SessionServices) -> Option<ScannedDocument> {
        let function = self.active_function?;
        self.place(Prompt::new("Scanning...", Vec::new()), services)
            .await;

        tracing::info!("[ChatSession] {} scanning {}", self.chat_id, function);
        match services.scanner.scan(&function, &services.device_id).await {
            Ok(document) => Some(document),
            Err(err) => {
                self.fail("Scan failed", &err);
                None
            }
        }
    }

    async fn deliver(&mut self, document: DocumentStream, file_name: &str, services: &SessionServices) {
        let Some(target) = self.selection.target else {
            return;
        };

        match services
            .dispatcher
            .deliver(self.chat_id, target, document, file_name)
            .await
        {
            Ok(()) => {
                self.status = Some(format!("Delivered {file_name} to {target}."));
                // Keep the active prompt below the attached document.
                if target == ScanTarget::ChatDelivery {
                    self.fresh_prompt = true;
                }
            }
            Err(err) => self.fail("Delivery failed", &err),
        }
    }

    /// Ends a scan cycle and offers the remembered configuration again.
    async fn finish_cycle(&mut self, services: &SessionServices) {
        self.pending_front = None;
        self.active_function = None;
        self.enter_init(services).await;
    }

    fn fail(&mut self, what: &str, err: &ScanBotError) {
        tracing::error!("[ChatSession] {} {}: {}", self.chat_id, what, err);
        self.status = Some(format!("{what}: {err}"));
    }

    fn parse<T: FromStr<Err = ScanBotError>>(&self, data: &str) -> Option<T> {
        match data.parse() {
            Ok(value) => Some(value),
            Err(err) => {
                self.reject_with(data, &err);
                None
            }
        }
    }

    fn reject(&self, data: &str) {
        self.reject_with(data, &ScanBotError::InvalidChoice(data.to_string()));
    }

    fn reject_with(&self, data: &str, err: &ScanBotError) {
        tracing::warn!(
            "[ChatSession] {} ignoring '{}' in {:?}: {}",
            self.chat_id,
            data,
            self.phase,
            err
        );
    }

    async fn show_reuse(&mut self, config: ScanConfig, services: &SessionServices) {
        let mut text = format!(
            "Use last configuration:\nTarget: {}\nSource: {}\nMode: {}",
            config.target, config.source, config.mode
        );
        if config.source == ScanSource::Adf {
            text.push_str(&format!("\nDuplex: {}", Decision::from_flag(config.duplex)));
        }
        self.show(Phase::AwaitReuseLastConfig, Prompt::yes_no(text), services)
            .await;
    }

    async fn show_target(&mut self, services: &SessionServices) {
        self.selection = Selection::default();
        let choices = offered_targets(services)
            .into_iter()
            .map(Choice::Target)
            .collect();
        self.show(
            Phase::SelectTarget,
            Prompt::new("Select a target to scan to", choices),
            services,
        )
        .await;
    }

    async fn show_source(&mut self, target: ScanTarget, services: &SessionServices) {
        let choices = services
            .catalog
            .sources(target)
            .into_iter()
            .map(Choice::Source)
            .collect();
        self.show(Phase::SelectSource, Prompt::new("Select a source", choices), services)
            .await;
    }

    async fn show_duplex(&mut self, services: &SessionServices) {
        self.show(Phase::SelectDuplex, Prompt::yes_no("Duplex scan?"), services)
            .await;
    }

    async fn show_mode(&mut self, target: ScanTarget, source: ScanSource, services: &SessionServices) {
        let choices = services
            .catalog
            .modes(target, source)
            .into_iter()
            .map(Choice::Mode)
            .collect();
        self.show(Phase::SelectMode, Prompt::new("Select a scan mode", choices), services)
            .await;
    }

    /// Moves to `phase`, showing `prompt` with any pending status on top.
    async fn show(&mut self, phase: Phase, prompt: Prompt, services: &SessionServices) {
        let prompt = match self.status.take() {
            Some(status) => Prompt::new(format!("{status}\n\n{}", prompt.text), prompt.choices),
            None => prompt,
        };
        self.place(prompt, services).await;
        self.phase = phase;
    }

    /// Edits the current prompt in place, or replaces it with a fresh one.
    async fn place(&mut self, prompt: Prompt, services: &SessionServices) {
        let transport = &services.transport;

        if let Some(handle) = self.prompt {
            if self.fresh_prompt {
                self.prompt = None;
                if let Err(err) = transport.delete_prompt(self.chat_id, handle).await {
                    tracing::warn!("[ChatSession] {} failed to delete prompt: {}", self.chat_id, err);
                }
            } else {
                match transport.edit_prompt(self.chat_id, handle, &prompt).await {
                    Ok(()) => return,
                    Err(err) => {
                        tracing::warn!(
                            "[ChatSession] {} failed to edit prompt, sending a new one: {}",
                            self.chat_id,
                            err
                        );
                    }
                }
            }
        }

        self.fresh_prompt = false;
        match transport.send_prompt(self.chat_id, &prompt).await {
            Ok(handle) => self.prompt = Some(handle),
            Err(err) => {
                tracing::error!("[ChatSession] {} failed to send prompt: {}", self.chat_id, err);
                self.prompt = None;
            }
        }
    }
}

/// Catalog targets the dispatcher can actually deliver to.
fn offered_targets(services: &SessionServices) -> Vec<ScanTarget> {
    services
        .catalog
        .targets()
        .into_iter()
        .filter(|target| services.dispatcher.supports(*target))
        .collect()
}
