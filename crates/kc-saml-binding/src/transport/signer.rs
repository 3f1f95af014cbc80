//! Envelope signing hook.

use crate::error::SamlResult;

/// Signs outbound SOAP envelopes.
pub trait Signer: Send + Sync {
    /// Returns the signed form of `envelope`.
    ///
    /// `type_name` and `id` identify the message inside the envelope that
    /// the signature references.
    fn sign(&self, envelope: &str, type_name: &str, id: &str) -> SamlResult<String>;
}

impl<F> Signer for F
where
    F: Fn(&str, &str, &str) -> SamlResult<String> + Send + Sync,
{
    fn sign(&self, envelope: &str, type_name: &str, id: &str) -> SamlResult<String> {
        self(envelope, type_name, id)
    }
}
