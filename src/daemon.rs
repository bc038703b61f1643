//! Ziggy daemon
//!
//! Builds the command pipeline from configuration, runs the voice and
//! Telegram workers, and shuts everything down together on Ctrl-C or a
//! confirmed lifecycle action.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::watch;
use tokio::task::JoinHandle;

use crate::capabilities::{
    DeviceControl, EventTrigger, KnowledgeSource, SystemLifecycle, Unavailable,
};
use crate::channels::{TelegramBridge, TelegramChannel};
use crate::config::Config;
use crate::devices::MqttDeviceController;
use crate::dispatch::{Capabilities, Dispatcher};
use crate::files::LocalFileStore;
use crate::intent::{CompletionBackend, IntentResolver, SemanticClassifier};
use crate::integrations::IftttClient;
use crate::lifecycle::{LifecycleAction, LifecycleGate, Origin};
use crate::llm::ChatClient;
use crate::locale::Reply;
use crate::memory::{JsonFilePersistence, MemoryStore};
use crate::router::CommandRouter;
use crate::tasks::JsonTaskStore;
use crate::voice::{
    AudioCapture, AudioPlayback, SAMPLE_RATE, SpeechToText, TextToSpeech, WakeWordDetector,
    samples_to_wav,
};
use crate::{Error, Result};

/// How often captured audio is fed to the detector
const VOICE_POLL_INTERVAL: Duration = Duration::from_millis(100);

/// How long workers get to finish in-flight commands on shutdown
const SHUTDOWN_GRACE: Duration = Duration::from_secs(10);

const MEMORY_FILE: &str = "memory.json";
const TASKS_FILE: &str = "tasks.json";

/// The command pipeline and the state shared by both workers
pub struct Assistant {
    router: Arc<CommandRouter>,
    gate: Arc<LifecycleGate>,
    memory: Arc<MemoryStore>,
    mqtt: Option<Arc<MqttDeviceController>>,
}

impl Assistant {
    /// Wire capabilities from configuration
    ///
    /// Missing credentials degrade the matching capability instead of
    /// failing: without an API key the classifier resolves every miss to
    /// `unknown`, without a broker device commands get an apology.
    ///
    /// # Errors
    ///
    /// Returns error if the language model client cannot be built
    pub fn build(config: &Config, shutdown: watch::Receiver<bool>) -> Result<Self> {
        let chat = if config.llm.api_key.is_some() {
            Some(Arc::new(ChatClient::new(&config.llm)?))
        } else {
            tracing::warn!("OPENAI_API_KEY not set, semantic classification disabled");
            None
        };

        let backend: Arc<dyn CompletionBackend> = if let Some(chat) = &chat {
            chat.clone()
        } else {
            Arc::new(Unavailable("language model"))
        };
        let classifier =
            SemanticClassifier::new(backend, &config.assistant_name, config.llm.timeout);
        let resolver = IntentResolver::new(Arc::new(classifier));

        let mqtt = if config.mqtt.host.is_some() {
            Some(Arc::new(MqttDeviceController::connect(
                &config.mqtt,
                config.devices.clone(),
                shutdown,
            )?))
        } else {
            tracing::info!("MQTT_HOST not set, device control unavailable");
            None
        };
        let devices: Arc<dyn DeviceControl> = if let Some(mqtt) = &mqtt {
            mqtt.clone()
        } else {
            Arc::new(Unavailable("MQTT broker"))
        };

        let events: Arc<dyn EventTrigger> = if let Some(key) = &config.ifttt_key {
            Arc::new(IftttClient::new(key.clone()))
        } else {
            Arc::new(Unavailable("IFTTT"))
        };

        let gate = Arc::new(LifecycleGate::new(&config.lifecycle));
        let memory = Arc::new(MemoryStore::open(Box::new(JsonFilePersistence::new(
            config.data_dir.join(MEMORY_FILE),
        ))));

        let caps = Capabilities {
            devices,
            files: Arc::new(LocalFileStore::new(&config.data_dir)),
            tasks: Arc::new(JsonTaskStore::open(config.data_dir.join(TASKS_FILE))),
            events,
            knowledge: chat.map(|c| c as Arc<dyn KnowledgeSource>),
            lifecycle: gate.clone() as Arc<dyn SystemLifecycle>,
        };

        tracing::info!(
            memories = memory.len(),
            data_dir = %config.data_dir.display(),
            "assistant ready"
        );

        let dispatcher = Dispatcher::new(caps, memory.clone());
        Ok(Self {
            router: Arc::new(CommandRouter::new(resolver, dispatcher)),
            gate,
            memory,
            mqtt,
        })
    }

    #[must_use]
    pub const fn router(&self) -> &Arc<CommandRouter> {
        &self.router
    }

    #[must_use]
    pub const fn gate(&self) -> &Arc<LifecycleGate> {
        &self.gate
    }

    /// Flush memory and disconnect from the broker
    pub fn close(&self) {
        self.memory.flush();
        if let Some(mqtt) = &self.mqtt {
            mqtt.disconnect();
        }
    }
}

/// Main daemon that runs the assistant
pub struct Daemon {
    config: Config,
    assistant: Assistant,
    shutdown: watch::Sender<bool>,
}

impl Daemon {
    /// Create a new daemon
    ///
    /// # Errors
    ///
    /// Returns error if the assistant cannot be built
    pub fn new(config: Config) -> Result<Self> {
        let (shutdown, shutdown_rx) = watch::channel(false);
        let assistant = Assistant::build(&config, shutdown_rx)?;
        Ok(Self {
            config,
            assistant,
            shutdown,
        })
    }

    /// Run until Ctrl-C or a confirmed lifecycle action
    ///
    /// Returns the confirmed action, if any, after the workers have
    /// stopped and memory has been flushed. The caller performs it.
    ///
    /// # Errors
    ///
    /// Returns error if the daemon encounters a fatal error
    #[allow(clippy::future_not_send)]
    pub async fn run(self) -> Result<Option<LifecycleAction>> {
        tracing::info!(
            assistant = %self.config.assistant_name,
            voice = self.config.voice.enabled,
            telegram = self.config.telegram.token.is_some(),
            "daemon running"
        );

        let telegram = self.spawn_telegram();

        // cpal streams are not Send, so the voice worker runs on this task
        let voice = async {
            if self.config.voice.enabled {
                run_voice_loop(&self.config, &self.assistant.router, self.shutdown.subscribe())
                    .await
            } else {
                tracing::info!("voice disabled, messaging-only mode");
                Ok(())
            }
        };
        tokio::pin!(voice);

        let stop = wait_for_stop(self.assistant.gate.subscribe());
        tokio::pin!(stop);

        let mut voice_done = false;
        let action = loop {
            tokio::select! {
                action = &mut stop => break action,
                result = &mut voice, if !voice_done => {
                    voice_done = true;
                    if let Err(e) = result {
                        tracing::error!(error = %e, "voice worker stopped");
                    }
                }
            }
        };

        tracing::info!(action = ?action, "shutting down");
        self.shutdown.send_replace(true);

        if !voice_done && tokio::time::timeout(SHUTDOWN_GRACE, &mut voice).await.is_err() {
            tracing::warn!("voice worker did not stop in time");
        }
        if let Some(handle) = telegram {
            match tokio::time::timeout(SHUTDOWN_GRACE, handle).await {
                Ok(Err(e)) => tracing::warn!(error = %e, "Telegram worker failed"),
                Err(_) => tracing::warn!("Telegram worker did not stop in time"),
                Ok(Ok(())) => {}
            }
        }

        self.assistant.close();
        tracing::info!("daemon stopped");
        Ok(action)
    }

    fn spawn_telegram(&self) -> Option<JoinHandle<()>> {
        let Some(token) = &self.config.telegram.token else {
            tracing::info!("TELEGRAM_BOT_TOKEN not set, Telegram bridge disabled");
            return None;
        };

        let bridge = TelegramBridge::new(
            TelegramChannel::new(token.clone()),
            Arc::clone(&self.assistant.router),
            &self.config.telegram,
        );
        tracing::info!(
            allowed_users = self.config.telegram.allowed_users.len(),
            "starting Telegram bridge"
        );
        Some(tokio::spawn(bridge.run(self.shutdown.subscribe())))
    }
}

/// Resolve on Ctrl-C (`None`) or a confirmed lifecycle action
async fn wait_for_stop(
    mut released: watch::Receiver<Option<LifecycleAction>>,
) -> Option<LifecycleAction> {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %e, "failed to listen for Ctrl-C");
            std::future::pending::<()>().await;
        }
    };

    let confirmed = async {
        loop {
            if released.changed().await.is_err() {
                std::future::pending::<()>().await;
            }
            if let Some(action) = *released.borrow_and_update() {
                return action;
            }
        }
    };

    tokio::select! {
        () = ctrl_c => {
            tracing::info!("shutdown requested");
            None
        }
        action = confirmed => Some(action),
    }
}

/// Speech services and audio devices for the voice worker
struct VoiceIo {
    capture: AudioCapture,
    playback: AudioPlayback,
    stt: SpeechToText,
    tts: TextToSpeech,
}

impl VoiceIo {
    fn open(config: &Config) -> Result<Self> {
        let api_key = config
            .llm
            .api_key
            .as_deref()
            .ok_or_else(|| Error::Config("OPENAI_API_KEY required for voice mode".to_string()))?;
        let voice = &config.voice;

        Ok(Self {
            capture: AudioCapture::new()?,
            playback: AudioPlayback::new()?,
            stt: SpeechToText::new(api_key, &config.llm.base_url, &voice.stt_model)?,
            tts: TextToSpeech::new(
                api_key,
                &config.llm.base_url,
                &voice.tts_model,
                &voice.tts_voice,
                voice.tts_speed,
            )?,
        })
    }

    /// Speak `text`, then drop whatever the microphone heard meanwhile
    async fn say(&mut self, text: &str) -> Result<()> {
        tracing::debug!(text, "speaking");
        let audio = self.tts.synthesize(text).await?;
        let played = self.playback.play_mp3(&audio).await;
        self.capture.clear_buffer();
        played
    }

    async fn say_or_log(&mut self, text: &str) {
        if let Err(e) = self.say(text).await {
            tracing::warn!(error = %e, "failed to speak reply");
        }
    }
}

/// Run the voice worker until `shutdown` flips
#[allow(clippy::future_not_send)]
async fn run_voice_loop(
    config: &Config,
    router: &CommandRouter,
    mut shutdown: watch::Receiver<bool>,
) -> Result<()> {
    let mut io = VoiceIo::open(config)?;
    let mut detector = WakeWordDetector::new(&config.voice.wake_words);

    io.say_or_log("זיגי מוכן").await;

    io.capture.start()?;
    tracing::info!(wake_words = ?detector.wake_words(), "listening for wake word");

    loop {
        tokio::select! {
            _ = shutdown.changed() => break,
            () = tokio::time::sleep(VOICE_POLL_INTERVAL) => {
                if let Err(e) = process_voice_chunk(&mut io, &mut detector, router).await {
                    tracing::error!(error = %e, "voice processing error");
                    detector.reset();
                }
            }
        }
    }

    io.capture.stop();
    tracing::info!("voice worker stopped");
    Ok(())
}

/// Feed captured audio to the detector and act on a finished utterance
///
/// A wake word with a command in the same phrase runs the command; a bare
/// wake word is answered with "Yes?" and the next utterance is the command.
#[allow(clippy::future_not_send)]
async fn process_voice_chunk(
    io: &mut VoiceIo,
    detector: &mut WakeWordDetector,
    router: &CommandRouter,
) -> Result<()> {
    let samples = io.capture.take_buffer();
    if samples.is_empty() || !detector.process(&samples) {
        return Ok(());
    }

    let utterance = detector.take_speech_buffer();
    let awaiting_command = detector.is_activated();
    let wav = samples_to_wav(&utterance, SAMPLE_RATE)?;

    let transcript = match io.stt.transcribe(&wav).await {
        Ok(t) => t,
        Err(e) => {
            tracing::warn!(error = %e, "STT failed");
            if awaiting_command {
                io.say_or_log("לא שמעתי, נסה שוב").await;
            }
            detector.reset();
            return Ok(());
        }
    };

    let command = if awaiting_command {
        detector.reset();
        transcript.text.clone()
    } else {
        match detector.check_wake_word(&transcript.text) {
            None => {
                tracing::debug!(transcript = %transcript.text, "no wake word");
                return Ok(());
            }
            Some(command) if command.is_empty() => {
                io.say_or_log(Reply::new("כן?", "Yes?").text(transcript.language))
                    .await;
                return Ok(());
            }
            Some(command) => {
                detector.reset();
                command
            }
        }
    };

    tracing::info!(command = %command, language = %transcript.language, "voice command received");
    let reply = router
        .handle(&command, transcript.language, &Origin::Voice)
        .await;
    io.say_or_log(&reply).await;
    Ok(())
}
