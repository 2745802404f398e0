//! Concrete runner implementations shipped with the core, mirroring how
//! the teacher ships `OllamaEngine`/`LlamaCppEngine` alongside the
//! `InferenceEngine` trait. These double as the default catalog and as
//! fixtures for the engine-manager/coordinator test suites.

pub mod echo_llm;
pub mod guardian;
pub mod local_asr;
pub mod local_tts;

#[cfg(test)]
pub mod test_support;

pub use echo_llm::EchoLlmRunner;
pub use guardian::KeywordGuardianRunner;
pub use local_asr::LocalAsrRunner;
pub use local_tts::LocalTtsRunner;
