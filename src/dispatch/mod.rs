//! Command dispatcher
//!
//! Maps a [`ResolvedIntent`] to exactly one handler. Handlers check the
//! parameters they need before touching a capability: a missing parameter
//! yields a clarification and no side effect. Capability errors are caught
//! here and become apologies; nothing a handler does can fail the caller.

mod handlers;

use std::sync::Arc;

use crate::capabilities::{
    DeviceControl, EventTrigger, FileStore, KnowledgeSource, SystemLifecycle, TaskStore,
};
use crate::intent::{Intent, ResolvedIntent};
use crate::lifecycle::Origin;
use crate::locale::{Language, Reply};
use crate::memory::MemoryStore;

/// The capabilities the dispatcher acts through
#[derive(Clone)]
pub struct Capabilities {
    pub devices: Arc<dyn DeviceControl>,
    pub files: Arc<dyn FileStore>,
    pub tasks: Arc<dyn TaskStore>,
    pub events: Arc<dyn EventTrigger>,
    /// Answers `ask_memory` misses; `None` without a language model
    pub knowledge: Option<Arc<dyn KnowledgeSource>>,
    pub lifecycle: Arc<dyn SystemLifecycle>,
}

/// Intent → handler dispatch table
pub struct Dispatcher {
    caps: Capabilities,
    memory: Arc<MemoryStore>,
}

impl Dispatcher {
    #[must_use]
    pub const fn new(caps: Capabilities, memory: Arc<MemoryStore>) -> Self {
        Self { caps, memory }
    }

    /// The shared memory store
    #[must_use]
    pub const fn memory(&self) -> &Arc<MemoryStore> {
        &self.memory
    }

    /// Dispatch a command issued locally
    pub async fn dispatch(&self, resolved: &ResolvedIntent, language: Language) -> String {
        self.dispatch_as(resolved, language, &Origin::Local).await
    }

    /// Dispatch a command on behalf of `origin`
    ///
    /// The origin only matters to lifecycle requests, which must be
    /// confirmed from where they were made.
    pub async fn dispatch_as(
        &self,
        resolved: &ResolvedIntent,
        language: Language,
        origin: &Origin,
    ) -> String {
        tracing::info!(
            intent = %resolved.intent,
            source = ?resolved.source,
            params = ?resolved.params.as_map(),
            %origin,
            "dispatching"
        );
        self.route(resolved, origin).await.into_text(language)
    }

    async fn route(&self, resolved: &ResolvedIntent, origin: &Origin) -> Reply {
        let p = &resolved.params;
        match resolved.intent {
            Intent::GetTime => handlers::get_time(),
            Intent::GetDate => handlers::get_date(),
            Intent::GetWeather => handlers::get_weather(p),
            Intent::ControlDevice => handlers::control_device(self.caps.devices.as_ref(), p).await,
            Intent::AddToList => handlers::add_to_list(self.caps.files.as_ref(), p).await,
            Intent::RemoveFromList => handlers::remove_from_list(self.caps.files.as_ref(), p).await,
            Intent::CreateTask => handlers::create_task(self.caps.tasks.as_ref(), p).await,
            Intent::CancelTask => handlers::cancel_task(self.caps.tasks.as_ref(), p).await,
            Intent::AskMemory => {
                handlers::ask_memory(&self.memory, self.caps.knowledge.as_deref(), p).await
            }
            Intent::SaveMemory => handlers::save_memory(&self.memory, p),
            Intent::ReadFile => handlers::read_file(self.caps.files.as_ref(), p).await,
            Intent::WriteFile => handlers::write_file(self.caps.files.as_ref(), p).await,
            Intent::TellJoke => handlers::tell_joke(),
            Intent::TellFact => handlers::tell_fact(),
            Intent::GenerateIdea => handlers::generate_idea(),
            Intent::GetStatus => handlers::get_status(),
            Intent::RunIfttt => handlers::run_ifttt(self.caps.events.as_ref(), p).await,
            Intent::SwitchMode => handlers::switch_mode(p),
            Intent::AskBuddy => handlers::ask_buddy(),
            Intent::SetReminder => handlers::set_reminder(self.caps.tasks.as_ref(), p).await,
            Intent::PlayMusic => handlers::play_music(p),
            Intent::AskHealth => handlers::ask_health(p),
            Intent::DebugDiagnostics => handlers::debug_diagnostics(),
            Intent::Translate => handlers::translate(p),
            Intent::Exit | Intent::Restart | Intent::ShutdownSystem | Intent::RebootSystem => {
                handlers::request_lifecycle(self.caps.lifecycle.as_ref(), resolved.intent, origin)
            }
            Intent::ConfirmAction => handlers::confirm_action(self.caps.lifecycle.as_ref(), origin),
            Intent::Unknown => handlers::unknown(),
        }
    }
}
