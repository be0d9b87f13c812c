use crate::audio::frame::AudioFrame;
use crate::audio::input::InputHandle;
use crate::error::{RecorderError, RecorderResult};
use std::io::Cursor;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tokio::sync::{mpsc, Notify};
use tokio::task::JoinHandle;
use tracing::{error, info};

/// Event delivered by a capture encoder to its session
#[derive(Debug, Clone)]
pub enum CaptureEvent {
    /// One encoded fragment of the recording
    Chunk(Vec<u8>),
    /// All buffered data has been delivered; no further chunks follow
    Flushed,
}

/// Capture encoder capability
///
/// Bound to one input handle and one negotiated format. `start` returns the
/// event channel; `stop` delivers any buffered trailing chunk(s), then
/// `Flushed`, then closes the channel. Chunks arrive in capture order.
#[async_trait::async_trait]
pub trait CaptureEncoder: Send + Sync {
    /// Start encoding the input
    async fn start(&mut self) -> RecorderResult<mpsc::Receiver<CaptureEvent>>;

    /// Stop encoding and flush buffered data
    async fn stop(&mut self) -> RecorderResult<()>;

    /// The negotiated MIME type this encoder produces
    fn mime_type(&self) -> &str;

    /// Check if encoder is currently capturing
    fn is_capturing(&self) -> bool;
}

/// Creates encoders for the formats the platform supports
pub trait EncoderFactory: Send + Sync {
    /// Whether the platform can encode the given MIME type
    fn supports(&self, mime_type: &str) -> bool;

    /// Create an encoder bound to the shared input
    fn create(
        &self,
        input: &InputHandle,
        mime_type: &str,
    ) -> RecorderResult<Box<dyn CaptureEncoder>>;
}

/// Pick the first supported entry of the ordered preference list
///
/// Falls back to the first preference when the platform supports none of
/// them, matching the original recorder's optimistic default.
pub fn negotiate_format(factory: &dyn EncoderFactory, preferences: &[String]) -> String {
    preferences
        .iter()
        .find(|mime| factory.supports(mime))
        .or_else(|| preferences.first())
        .cloned()
        .unwrap_or_else(|| "audio/webm".to_string())
}

/// File extension for a recording of the given MIME type
pub fn extension_for(mime_type: &str) -> &'static str {
    let base = mime_type
        .split(';')
        .next()
        .unwrap_or(mime_type)
        .trim()
        .to_ascii_lowercase();

    match base.as_str() {
        "audio/webm" => "webm",
        "audio/mp4" => "mp4",
        "audio/ogg" => "ogg",
        "audio/wav" | "audio/wave" | "audio/x-wav" => "wav",
        _ => "bin",
    }
}

/// Built-in encoder for hosts that expose the input as raw PCM frames
///
/// Buffers samples in memory while capturing and emits the recording as a
/// single finalized WAV chunk on stop. Intended for headless hosts and test
/// harnesses; browser-style hosts supply their own `CaptureEncoder`.
pub struct WavCaptureEncoder {
    input: InputHandle,
    frames: Option<mpsc::Receiver<AudioFrame>>,
    stop_signal: Arc<Notify>,
    capturing: Arc<AtomicBool>,
    task: Option<JoinHandle<()>>,
}

impl WavCaptureEncoder {
    pub fn new(input: InputHandle, frames: mpsc::Receiver<AudioFrame>) -> Self {
        Self {
            input,
            frames: Some(frames),
            stop_signal: Arc::new(Notify::new()),
            capturing: Arc::new(AtomicBool::new(false)),
            task: None,
        }
    }

    fn encode_wav(samples: &[i16], sample_rate: u32, channels: u16) -> RecorderResult<Vec<u8>> {
        let spec = hound::WavSpec {
            channels,
            sample_rate,
            bits_per_sample: 16,
            sample_format: hound::SampleFormat::Int,
        };

        let mut cursor = Cursor::new(Vec::new());
        {
            let mut writer = hound::WavWriter::new(&mut cursor, spec)
                .map_err(|e| RecorderError::Encoder(e.to_string()))?;
            for &sample in samples {
                writer
                    .write_sample(sample)
                    .map_err(|e| RecorderError::Encoder(e.to_string()))?;
            }
            writer
                .finalize()
                .map_err(|e| RecorderError::Encoder(e.to_string()))?;
        }

        Ok(cursor.into_inner())
    }
}

#[async_trait::async_trait]
impl CaptureEncoder for WavCaptureEncoder {
    async fn start(&mut self) -> RecorderResult<mpsc::Receiver<CaptureEvent>> {
        if self.capturing.load(Ordering::SeqCst) {
            return Err(RecorderError::Encoder("encoder already capturing".into()));
        }

        let mut frames = self
            .frames
            .take()
            .ok_or_else(|| RecorderError::Encoder("encoder cannot be restarted".into()))?;

        let (events_tx, events_rx) = mpsc::channel(32);
        let stop = Arc::clone(&self.stop_signal);
        let capturing = Arc::clone(&self.capturing);
        let sample_rate = self.input.sample_rate;
        let channels = self.input.channels;

        capturing.store(true, Ordering::SeqCst);
        info!("WAV encoder started ({}Hz, {} channels)", sample_rate, channels);

        self.task = Some(tokio::spawn(async move {
            let mut samples: Vec<i16> = Vec::new();

            loop {
                tokio::select! {
                    _ = stop.notified() => break,
                    frame = frames.recv() => match frame {
                        Some(frame) => samples.extend_from_slice(&frame.samples),
                        None => {
                            // Input tap closed; wait for the stop request
                            stop.notified().await;
                            break;
                        }
                    }
                }
            }

            // Pick up frames that were already queued when stop arrived
            while let Ok(frame) = frames.try_recv() {
                samples.extend_from_slice(&frame.samples);
            }

            match Self::encode_wav(&samples, sample_rate, channels) {
                Ok(bytes) => {
                    let _ = events_tx.send(CaptureEvent::Chunk(bytes)).await;
                }
                Err(e) => error!("WAV encoding failed: {}", e),
            }
            let _ = events_tx.send(CaptureEvent::Flushed).await;

            capturing.store(false, Ordering::SeqCst);
        }));

        Ok(events_rx)
    }

    async fn stop(&mut self) -> RecorderResult<()> {
        let Some(task) = self.task.take() else {
            return Ok(());
        };

        self.stop_signal.notify_one();
        task.await
            .map_err(|e| RecorderError::Encoder(format!("encoder task panicked: {}", e)))?;

        Ok(())
    }

    fn mime_type(&self) -> &str {
        "audio/wav"
    }

    fn is_capturing(&self) -> bool {
        self.capturing.load(Ordering::SeqCst)
    }
}

/// Factory for `WavCaptureEncoder`
///
/// The `tap` closure opens a PCM frame stream for the shared input; it is
/// invoked once per recording.
pub struct WavEncoderFactory {
    tap: Box<dyn Fn(&InputHandle) -> mpsc::Receiver<AudioFrame> + Send + Sync>,
}

impl WavEncoderFactory {
    pub fn new(
        tap: impl Fn(&InputHandle) -> mpsc::Receiver<AudioFrame> + Send + Sync + 'static,
    ) -> Self {
        Self { tap: Box::new(tap) }
    }
}

impl EncoderFactory for WavEncoderFactory {
    fn supports(&self, mime_type: &str) -> bool {
        extension_for(mime_type) == "wav"
    }

    fn create(
        &self,
        input: &InputHandle,
        mime_type: &str,
    ) -> RecorderResult<Box<dyn CaptureEncoder>> {
        if !self.supports(mime_type) {
            return Err(RecorderError::Encoder(format!(
                "unsupported format: {}",
                mime_type
            )));
        }

        let frames = (self.tap)(input);
        Ok(Box::new(WavCaptureEncoder::new(input.clone(), frames)))
    }
}
