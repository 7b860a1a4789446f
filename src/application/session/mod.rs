mod controller;
mod transcript;

pub use controller::{SessionController, SessionError, SessionPhase};
pub use transcript::{EntryId, Transcript, TranscriptEntry};
