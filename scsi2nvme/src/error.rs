//! Error taxonomy for the translation engine.

/// Outcome of a single codec invocation (`ToNvme` or `ToScsi`).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TranslationError {
    /// The CDB is malformed, an unsupported bit (e.g. NACA) is set, or a
    /// reserved/unsupported variant was requested.
    InvalidInput,
    /// The request is legal but semantically a no-op, or inexpressible in
    /// NVMe. Surfaces to the caller as Good with no NVMe commands issued.
    NoTranslation,
    /// Internal fault: allocation exhaustion, an unexpected null data
    /// pointer, or a spec-violating device response.
    Failure,
}

/// Outcome of an API call made against the pipeline state machine itself,
/// as distinct from a codec's translation outcome.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PipelineError {
    /// `Complete` was called before `Begin`, or `Begin` was called twice
    /// without an intervening `Complete`/`Abort`.
    NotReady,
}
