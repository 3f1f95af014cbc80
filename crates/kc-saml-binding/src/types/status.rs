//! SAML Status types.
//!
//! Status information returned in SAML protocol responses.

use serde::{Deserialize, Serialize};

use super::{status_codes, SAMLP_NS};
use crate::error::{SamlError, SamlResult};
use crate::message::{expect_tag, required_attribute, FromElement, ToElement};
use crate::xml::Element;

/// SAML protocol status.
///
/// Contains the status code and optional message for a SAML response.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Status {
    /// The status code.
    pub status_code: StatusCode,

    /// Optional status message.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status_message: Option<String>,

    /// Optional detailed status information.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status_detail: Option<String>,
}

impl Status {
    /// Creates a success status.
    #[must_use]
    pub fn success() -> Self {
        Self {
            status_code: StatusCode::success(),
            status_message: None,
            status_detail: None,
        }
    }

    /// Creates a requester error status.
    #[must_use]
    pub fn requester_error(message: impl Into<String>) -> Self {
        Self {
            status_code: StatusCode::requester(),
            status_message: Some(message.into()),
            status_detail: None,
        }
    }

    /// Creates a responder error status.
    #[must_use]
    pub fn responder_error(message: impl Into<String>) -> Self {
        Self {
            status_code: StatusCode::responder(),
            status_message: Some(message.into()),
            status_detail: None,
        }
    }

    /// Returns true if this status indicates success.
    #[must_use]
    pub fn is_success(&self) -> bool {
        self.status_code.value == status_codes::SUCCESS
    }

    /// Sets the status message.
    #[must_use]
    pub fn with_message(mut self, message: impl Into<String>) -> Self {
        self.status_message = Some(message.into());
        self
    }

    /// Sets the status detail.
    #[must_use]
    pub fn with_detail(mut self, detail: impl Into<String>) -> Self {
        self.status_detail = Some(detail.into());
        self
    }
}

impl Default for Status {
    fn default() -> Self {
        Self::success()
    }
}

/// SAML status code.
///
/// Status codes can be nested, with a top-level code and optional sub-code.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatusCode {
    /// The status code URI value.
    pub value: String,

    /// Optional nested status code providing more detail.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status_code: Option<Box<StatusCode>>,
}

impl StatusCode {
    /// Creates a new status code with the given value.
    #[must_use]
    pub fn new(value: impl Into<String>) -> Self {
        Self {
            value: value.into(),
            status_code: None,
        }
    }

    /// Creates a success status code.
    #[must_use]
    pub fn success() -> Self {
        Self::new(status_codes::SUCCESS)
    }

    /// Creates a requester error status code.
    #[must_use]
    pub fn requester() -> Self {
        Self::new(status_codes::REQUESTER)
    }

    /// Creates a responder error status code.
    #[must_use]
    pub fn responder() -> Self {
        Self::new(status_codes::RESPONDER)
    }

    /// Creates a version mismatch status code.
    #[must_use]
    pub fn version_mismatch() -> Self {
        Self::new(status_codes::VERSION_MISMATCH)
    }

    /// Adds a sub-status code.
    #[must_use]
    pub fn with_sub_status(mut self, sub: StatusCode) -> Self {
        self.status_code = Some(Box::new(sub));
        self
    }

    /// Returns true if this is a success status code.
    #[must_use]
    pub fn is_success(&self) -> bool {
        self.value == status_codes::SUCCESS
    }

    /// Returns the sub-status code value if present.
    #[must_use]
    pub fn sub_status_value(&self) -> Option<&str> {
        self.status_code.as_ref().map(|s| s.value.as_str())
    }
}

impl ToElement for Status {
    fn to_element(&self) -> Element {
        let mut element = Element::ns(SAMLP_NS, "Status").with_child(self.status_code.to_element());
        if let Some(message) = &self.status_message {
            element.append(Element::ns(SAMLP_NS, "StatusMessage").with_text(message.clone()));
        }
        if let Some(detail) = &self.status_detail {
            element.append(Element::ns(SAMLP_NS, "StatusDetail").with_text(detail.clone()));
        }
        element
    }
}

impl FromElement for Status {
    const NAMESPACE: &'static str = SAMLP_NS;
    const TAG: &'static str = "Status";

    fn from_element(element: &Element) -> SamlResult<Self> {
        expect_tag::<Self>(element)?;
        let code = element
            .find(SAMLP_NS, StatusCode::TAG)
            .ok_or_else(|| SamlError::MissingElement("StatusCode".to_string()))?;
        Ok(Self {
            status_code: StatusCode::from_element(code)?,
            status_message: element.find(SAMLP_NS, "StatusMessage").map(Element::text),
            status_detail: element.find(SAMLP_NS, "StatusDetail").map(Element::text),
        })
    }
}

impl ToElement for StatusCode {
    fn to_element(&self) -> Element {
        let element = Element::ns(SAMLP_NS, Self::TAG).with_attribute("Value", self.value.clone());
        match &self.status_code {
            Some(sub) => element.with_child(sub.to_element()),
            None => element,
        }
    }
}

impl FromElement for StatusCode {
    const NAMESPACE: &'static str = SAMLP_NS;
    const TAG: &'static str = "StatusCode";

    fn from_element(element: &Element) -> SamlResult<Self> {
        expect_tag::<Self>(element)?;
        let sub = element
            .find(SAMLP_NS, Self::TAG)
            .map(Self::from_element)
            .transpose()?;
        Ok(Self {
            value: required_attribute(element, "Value")?.to_string(),
            status_code: sub.map(Box::new),
        })
    }
}
