//! Speech segmentation and wake word detection
//!
//! Audio is cut into utterances by RMS energy; each utterance is
//! transcribed and the transcript is checked for a wake word. Matching is
//! case-insensitive, respects word boundaries and treats punctuation
//! between words as a space, so "Hey, Ziggy!" matches "hey ziggy".

use crate::voice::{SAMPLE_RATE, rms_level};

/// Minimum audio energy threshold to consider speech
const ENERGY_THRESHOLD: f32 = 0.03;

/// Minimum duration of speech to trigger (0.3 s)
const MIN_SPEECH_SAMPLES: usize = SAMPLE_RATE as usize * 3 / 10;

/// Silence duration that ends an utterance (0.5 s)
const SILENCE_SAMPLES: usize = SAMPLE_RATE as usize / 2;

/// Longest utterance kept before it is cut (10 s)
const MAX_UTTERANCE_SAMPLES: usize = SAMPLE_RATE as usize * 10;

/// How long an activated detector waits for a command (10 s)
const COMMAND_TIMEOUT_SAMPLES: usize = SAMPLE_RATE as usize * 10;

/// State of the detector
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DetectorState {
    /// Waiting for speech
    Idle,
    /// Accumulating a candidate wake phrase
    Listening,
    /// Wake word heard, accumulating the command
    Activated,
}

/// Detects utterances in audio and wake words in transcripts
pub struct WakeWordDetector {
    wake_words: Vec<String>,
    state: DetectorState,
    speech_buffer: Vec<f32>,
    /// Samples of the buffer that were above the energy threshold
    voiced: usize,
    silence_counter: usize,
}

impl WakeWordDetector {
    /// Create a detector for `wake_words`
    ///
    /// Blank entries are dropped; the rest are lowercased and trimmed.
    #[must_use]
    pub fn new<I, S>(wake_words: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let wake_words: Vec<String> = wake_words
            .into_iter()
            .map(|w| w.as_ref().trim().to_lowercase())
            .filter(|w| !w.is_empty())
            .collect();

        tracing::debug!(wake_words = ?wake_words, "wake word detector initialized");

        Self {
            wake_words,
            state: DetectorState::Idle,
            speech_buffer: Vec::new(),
            voiced: 0,
            silence_counter: 0,
        }
    }

    /// Feed captured samples
    ///
    /// Returns `true` when a complete utterance (speech followed by
    /// silence) is buffered and ready to transcribe.
    pub fn process(&mut self, samples: &[f32]) -> bool {
        let energy = rms_level(samples);
        let is_speech = energy > ENERGY_THRESHOLD;

        match self.state {
            DetectorState::Idle => {
                if is_speech {
                    self.state = DetectorState::Listening;
                    self.speech_buffer.clear();
                    self.speech_buffer.extend_from_slice(samples);
                    self.voiced = samples.len();
                    self.silence_counter = 0;
                    tracing::trace!(energy, "speech detected, listening");
                }
                false
            }
            DetectorState::Listening | DetectorState::Activated => {
                self.speech_buffer.extend_from_slice(samples);

                if is_speech {
                    self.voiced += samples.len();
                    self.silence_counter = 0;
                } else {
                    self.silence_counter += samples.len();
                }

                if self.is_utterance_complete() {
                    tracing::debug!(samples = self.speech_buffer.len(), "speech segment complete");
                    return true;
                }

                // Silence without enough speech: drop a stray noise burst
                if self.state == DetectorState::Listening
                    && self.silence_counter > SILENCE_SAMPLES * 2
                {
                    tracing::trace!("timeout - resetting");
                    self.reset();
                } else if self.state == DetectorState::Activated
                    && self.voiced == 0
                    && self.silence_counter > COMMAND_TIMEOUT_SAMPLES
                {
                    tracing::debug!("no command heard after wake word");
                    self.reset();
                }
                false
            }
        }
    }

    /// Whether the buffered audio forms a finished utterance
    #[must_use]
    pub fn is_utterance_complete(&self) -> bool {
        self.state != DetectorState::Idle
            && self.voiced > MIN_SPEECH_SAMPLES
            && (self.silence_counter > SILENCE_SAMPLES
                || self.speech_buffer.len() >= MAX_UTTERANCE_SAMPLES)
    }

    /// Find a wake word in `transcript` and return what follows it
    ///
    /// The earliest match wins; among matches at the same position the
    /// longest wake word wins. The returned command may be empty.
    #[must_use]
    pub fn extract_command(&self, transcript: &str) -> Option<String> {
        let (_, end) = self
            .wake_words
            .iter()
            .filter_map(|w| find_phrase(transcript, w))
            .min_by(|a, b| a.0.cmp(&b.0).then(b.1.cmp(&a.1)))?;

        let command = transcript[end..]
            .trim_start_matches(|c: char| c.is_whitespace() || c.is_ascii_punctuation())
            .trim_end();
        Some(command.to_string())
    }

    /// Check a transcript of the current utterance for a wake word
    ///
    /// On a match the detector becomes [`DetectorState::Activated`] and the
    /// command following the wake word is returned; otherwise it resets.
    pub fn check_wake_word(&mut self, transcript: &str) -> Option<String> {
        let command = self.extract_command(transcript);
        if command.is_some() {
            tracing::info!(transcript, "wake word detected");
            self.activate();
        } else {
            self.reset();
        }
        command
    }

    /// Take the speech buffer, clearing it and the silence counter
    pub fn take_speech_buffer(&mut self) -> Vec<f32> {
        self.voiced = 0;
        self.silence_counter = 0;
        std::mem::take(&mut self.speech_buffer)
    }

    /// Check if the wake word has been heard and a command is awaited
    #[must_use]
    pub fn is_activated(&self) -> bool {
        self.state == DetectorState::Activated
    }

    /// Reset detector to idle state
    pub fn reset(&mut self) {
        self.state = DetectorState::Idle;
        self.speech_buffer.clear();
        self.voiced = 0;
        self.silence_counter = 0;
    }

    /// Get current state
    #[must_use]
    pub const fn state(&self) -> DetectorState {
        self.state
    }

    /// Get the configured wake words
    #[must_use]
    pub fn wake_words(&self) -> &[String] {
        &self.wake_words
    }

    /// Await a command without hearing the wake word again
    pub fn activate(&mut self) {
        self.state = DetectorState::Activated;
        self.speech_buffer.clear();
        self.voiced = 0;
        self.silence_counter = 0;
    }
}

/// Locate `phrase` in `text` on word boundaries, returning byte offsets
fn find_phrase(text: &str, phrase: &str) -> Option<(usize, usize)> {
    text.char_indices()
        .filter(|&(start, _)| !text[..start].chars().next_back().is_some_and(char::is_alphanumeric))
        .find_map(|(start, _)| {
            let end = match_at(&text[start..], phrase)? + start;
            let bounded = !text[end..].chars().next().is_some_and(char::is_alphanumeric);
            bounded.then_some((start, end))
        })
}

/// Match `phrase` at the start of `text`, returning the matched length
///
/// A space in `phrase` matches any run of whitespace and punctuation.
fn match_at(text: &str, phrase: &str) -> Option<usize> {
    let mut chars = text.char_indices().peekable();
    let mut end = 0;

    for pc in phrase.chars() {
        if pc.is_whitespace() {
            let mut consumed = false;
            while let Some(&(i, c)) = chars.peek() {
                if c.is_whitespace() || c.is_ascii_punctuation() {
                    end = i + c.len_utf8();
                    consumed = true;
                    chars.next();
                } else {
                    break;
                }
            }
            if !consumed {
                return None;
            }
        } else {
            let (i, c) = chars.next()?;
            if !c.to_lowercase().eq(pc.to_lowercase()) {
                return None;
            }
            end = i + c.len_utf8();
        }
    }

    Some(end)
}
