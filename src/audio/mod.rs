pub mod encoder;
pub mod frame;
pub mod input;

pub use encoder::{
    extension_for, negotiate_format, CaptureEncoder, CaptureEvent, EncoderFactory,
    WavCaptureEncoder, WavEncoderFactory,
};
pub use frame::AudioFrame;
pub use input::{AudioInputSource, InputHandle, MicrophoneBroker};
