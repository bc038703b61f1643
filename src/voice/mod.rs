//! Voice processing module
//!
//! Audio capture and playback, wake word detection and the speech
//! services. The listening loop itself lives in the daemon.

mod capture;
mod playback;
mod stt;
mod tts;
mod wake_word;

pub use capture::{AudioCapture, SAMPLE_RATE, peak_level, rms_level, samples_to_wav};
pub use playback::{AudioPlayback, PLAYBACK_SAMPLE_RATE, decode_mp3, sine_tone};
pub use stt::{SpeechToText, Transcript};
pub use tts::TextToSpeech;
pub use wake_word::{DetectorState, WakeWordDetector};
