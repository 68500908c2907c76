use atrium_core::CallTag;

use crate::CallError;

/// Issuing-side capability of one call variant.
///
/// A call object is pure data shaping: it owns the typed input fields set by
/// the caller and the typed output fields populated after a successful round
/// trip. It performs no I/O itself; moving bytes is the peer's job. Each
/// object is configured once, consumed by one `invoke`, then discarded.
pub trait OutboundCall: Send {
    /// Stable tag of this variant. Pure; no side effects.
    fn tag(&self) -> CallTag;

    /// Serializes the input fields into an envelope payload.
    ///
    /// Fails with [`CallError::Validation`] when a required field is missing
    /// or violates its constraint. Idempotent and side-effect-free on the
    /// object's own state.
    fn encode_request(&self) -> Result<Vec<u8>, CallError>;

    /// Parses a successful response payload into the output fields.
    ///
    /// On failure the output fields are left explicitly unset; a malformed
    /// payload never yields a partially populated object.
    fn decode_response(&mut self, payload: &[u8]) -> Result<(), CallError>;
}

/// Serving-side capability of one call variant.
///
/// The registry constructs the empty variant via `Default`, decodes the
/// request into its input fields, hands it to the registered handler to fill
/// the output fields, then encodes the response payload.
pub trait InboundCall: Default + Send + 'static {
    /// Stable tag of this variant, used as the registry key.
    const TAG: CallTag;

    /// Parses a request payload into the input fields.
    fn decode_request(&mut self, payload: &[u8]) -> Result<(), CallError>;

    /// Serializes the handler-populated output fields into a response payload.
    fn encode_response(&self) -> Result<Vec<u8>, CallError>;
}
