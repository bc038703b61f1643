//! Ziggy - bilingual voice and messaging home assistant

use std::path::PathBuf;
use std::process::ExitCode;
use std::time::Duration;

use clap::{Parser, Subcommand};
use tokio::sync::watch;
use tracing_subscriber::EnvFilter;

use ziggy::daemon::Assistant;
use ziggy::intent::render_catalog;
use ziggy::lifecycle::{self, LifecycleAction};
use ziggy::locale::Language;
use ziggy::voice::{AudioCapture, AudioPlayback, TextToSpeech, peak_level, rms_level, sine_tone};
use ziggy::{Config, Daemon};

/// Ziggy - bilingual voice and messaging home assistant
#[derive(Parser)]
#[command(name = "ziggy", version, about)]
struct Cli {
    /// Config file (defaults to ~/.config/ziggy/config.toml)
    #[arg(short, long, env = "ZIGGY_CONFIG")]
    config: Option<PathBuf>,

    /// Verbosity level (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Disable voice mode (messaging-only)
    #[arg(long, env = "ZIGGY_DISABLE_VOICE")]
    disable_voice: bool,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand)]
enum Command {
    /// Resolve and execute one command, printing the reply
    Ask {
        /// Reply language (he or en); detected from the text if omitted
        #[arg(short, long)]
        lang: Option<String>,

        /// The command text
        #[arg(required = true, num_args = 1..)]
        text: Vec<String>,
    },
    /// Print the resolved intent as JSON without executing it
    Classify {
        #[arg(required = true, num_args = 1..)]
        text: Vec<String>,
    },
    /// Print the intent catalog given to the classifier
    Intents,
    /// Test microphone input (shows audio levels)
    TestMic {
        /// Duration in seconds
        #[arg(short, long, default_value = "5")]
        duration: u64,
    },
    /// Test speaker output (plays a tone)
    TestSpeaker,
    /// Test TTS (synthesizes and plays speech)
    TestTts {
        /// Text to speak
        #[arg(default_value = "זיגי מוכן")]
        text: String,
    },
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    let filter = match cli.verbose {
        0 => "info,ziggy=info",
        1 => "info,ziggy=debug",
        2 => "debug",
        _ => "trace",
    };

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter)))
        .init();

    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::error!("fatal: {e:#}");
            ExitCode::FAILURE
        }
    }
}

#[allow(clippy::future_not_send)]
async fn run(cli: Cli) -> anyhow::Result<()> {
    let config_path = cli.config.as_deref();

    if let Some(cmd) = cli.command {
        return match cmd {
            Command::Ask { lang, text } => ask(config_path, lang.as_deref(), &text.join(" ")).await,
            Command::Classify { text } => classify(config_path, &text.join(" ")).await,
            Command::Intents => {
                println!("{}", render_catalog());
                Ok(())
            }
            Command::TestMic { duration } => test_mic(duration).await,
            Command::TestSpeaker => test_speaker().await,
            Command::TestTts { text } => test_tts(config_path, &text).await,
        };
    }

    tracing::info!(disable_voice = cli.disable_voice, "starting ziggy");

    let config = Config::load(config_path, cli.disable_voice)?;

    let lifecycle_config = config.lifecycle.clone();
    let daemon = Daemon::new(config)?;

    match daemon.run().await? {
        None | Some(LifecycleAction::Exit) => Ok(()),
        Some(action) => {
            lifecycle::perform(action, &lifecycle_config)?;
            Ok(())
        }
    }
}

/// Build the pipeline for a one-shot CLI command
fn one_shot(config_path: Option<&std::path::Path>) -> anyhow::Result<(Assistant, watch::Sender<bool>)> {
    let config = Config::load(config_path, true)?;
    let (shutdown, shutdown_rx) = watch::channel(false);
    let assistant = Assistant::build(&config, shutdown_rx)?;
    Ok((assistant, shutdown))
}

async fn ask(config_path: Option<&std::path::Path>, lang: Option<&str>, text: &str) -> anyhow::Result<()> {
    let language = match lang {
        Some(tag) => Language::from_tag(tag)
            .ok_or_else(|| anyhow::anyhow!("unsupported language '{tag}' (use he or en)"))?,
        None => Language::detect(text),
    };

    let (assistant, shutdown) = one_shot(config_path)?;
    let reply = assistant
        .router()
        .handle(text, language, &ziggy::lifecycle::Origin::Local)
        .await;
    println!("{reply}");

    if let Some(action) = assistant.gate().released() {
        println!("({action} confirmed; run the daemon to act on lifecycle commands)");
    }

    shutdown.send_replace(true);
    assistant.close();
    Ok(())
}

async fn classify(config_path: Option<&std::path::Path>, text: &str) -> anyhow::Result<()> {
    let (assistant, shutdown) = one_shot(config_path)?;
    let resolved = assistant.router().resolve(text).await;
    println!("{}", serde_json::to_string_pretty(&resolved)?);
    shutdown.send_replace(true);
    Ok(())
}

#[allow(clippy::future_not_send)]
async fn test_mic(duration: u64) -> anyhow::Result<()> {
    println!("Testing microphone for {duration} seconds...");
    println!("Speak into your microphone!\n");

    let mut capture = AudioCapture::new()?;
    capture.start()?;
    println!("---");

    for i in 0..duration {
        tokio::time::sleep(Duration::from_secs(1)).await;

        let samples = capture.take_buffer();
        let energy = rms_level(&samples);
        let peak = peak_level(&samples);

        #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
        let meter_len = (energy * 100.0).min(50.0) as usize;
        let meter: String = "#".repeat(meter_len) + &" ".repeat(50 - meter_len);

        println!(
            "[{:2}s] RMS: {:.4} | Peak: {:.4} | [{}]",
            i + 1,
            energy,
            peak,
            meter
        );
    }

    capture.stop();

    println!("\n---");
    println!("If you saw movement in the meter, your mic is working!");
    println!("If RMS stayed near 0, check:");
    println!("  1. Is your mic plugged in?");
    println!("  2. Run: arecord -l (to list devices)");
    println!("  3. Try: pavucontrol (to check levels)");

    Ok(())
}

async fn test_speaker() -> anyhow::Result<()> {
    println!("Testing speaker output...");
    println!("You should hear a 440Hz tone for 2 seconds\n");

    let mut playback = AudioPlayback::new()?;
    playback
        .play(sine_tone(440.0, Duration::from_secs(2), 0.3))
        .await?;

    println!("\n---");
    println!("If you heard the tone, your speakers are working!");
    println!("If you didn't hear anything, check:");
    println!("  1. Run: pactl list sinks short");
    println!("  2. Try: pavucontrol (to check output levels)");

    Ok(())
}

async fn test_tts(config_path: Option<&std::path::Path>, text: &str) -> anyhow::Result<()> {
    println!("Testing TTS with text: \"{text}\"\n");

    let config = Config::load(config_path, false)?;
    let api_key = config
        .llm
        .api_key
        .as_deref()
        .ok_or_else(|| anyhow::anyhow!("OPENAI_API_KEY is required for TTS"))?;

    let tts = TextToSpeech::new(
        api_key,
        &config.llm.base_url,
        &config.voice.tts_model,
        &config.voice.tts_voice,
        config.voice.tts_speed,
    )?;

    println!("Synthesizing speech...");
    let mp3_data = tts.synthesize(text).await?;
    println!("Got {} bytes of audio data", mp3_data.len());

    println!("Playing audio...");
    let mut playback = AudioPlayback::new()?;
    playback.play_mp3(&mp3_data).await?;

    println!("\n---");
    println!("If you heard the speech, TTS is working!");

    Ok(())
}
