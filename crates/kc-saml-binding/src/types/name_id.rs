//! SAML Name ID types.
//!
//! Name identifiers are used to identify subjects in SAML messages.

use serde::{Deserialize, Serialize};

use super::{NameIdFormat, SAMLP_NS, SAML_NS};
use crate::error::SamlResult;
use crate::message::{expect_tag, FromElement, ToElement};
use crate::xml::Element;

/// SAML Name ID.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NameId {
    /// The actual identifier value.
    pub value: String,

    /// The format of the name identifier.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub format: Option<String>,

    /// The security or administrative domain that qualifies the name.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name_qualifier: Option<String>,

    /// The service provider's entity ID that qualifies the name.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sp_name_qualifier: Option<String>,
}

impl NameId {
    /// Creates a new name ID with the given value.
    #[must_use]
    pub fn new(value: impl Into<String>) -> Self {
        Self {
            value: value.into(),
            format: None,
            name_qualifier: None,
            sp_name_qualifier: None,
        }
    }

    /// Creates a new transient name ID.
    #[must_use]
    pub fn transient(value: impl Into<String>) -> Self {
        Self::new(value).with_format(NameIdFormat::Transient)
    }

    /// Creates a new persistent name ID.
    #[must_use]
    pub fn persistent(value: impl Into<String>) -> Self {
        Self::new(value).with_format(NameIdFormat::Persistent)
    }

    /// Sets the format for this name ID.
    #[must_use]
    pub fn with_format(mut self, format: NameIdFormat) -> Self {
        self.format = Some(format.uri().to_string());
        self
    }

    /// Sets the name qualifier.
    #[must_use]
    pub fn with_name_qualifier(mut self, qualifier: impl Into<String>) -> Self {
        self.name_qualifier = Some(qualifier.into());
        self
    }

    /// Sets the SP name qualifier.
    #[must_use]
    pub fn with_sp_name_qualifier(mut self, qualifier: impl Into<String>) -> Self {
        self.sp_name_qualifier = Some(qualifier.into());
        self
    }

    /// Returns the parsed name ID format.
    #[must_use]
    pub fn parsed_format(&self) -> NameIdFormat {
        self.format
            .as_deref()
            .and_then(NameIdFormat::from_uri)
            .unwrap_or_default()
    }
}

impl ToElement for NameId {
    fn to_element(&self) -> Element {
        Element::ns(SAML_NS, Self::TAG)
            .with_optional_attribute("Format", self.format.as_deref())
            .with_optional_attribute("NameQualifier", self.name_qualifier.as_deref())
            .with_optional_attribute("SPNameQualifier", self.sp_name_qualifier.as_deref())
            .with_text(self.value.clone())
    }
}

impl FromElement for NameId {
    const NAMESPACE: &'static str = SAML_NS;
    const TAG: &'static str = "NameID";

    fn from_element(element: &Element) -> SamlResult<Self> {
        expect_tag::<Self>(element)?;
        Ok(Self {
            value: element.text(),
            format: element.attribute("Format").map(String::from),
            name_qualifier: element.attribute("NameQualifier").map(String::from),
            sp_name_qualifier: element.attribute("SPNameQualifier").map(String::from),
        })
    }
}

/// Name ID policy for authentication requests.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct NameIdPolicy {
    /// The requested name ID format.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub format: Option<String>,

    /// The SP name qualifier for the name ID.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sp_name_qualifier: Option<String>,

    /// Whether a new identifier should be created for this request.
    #[serde(default)]
    pub allow_create: bool,
}

impl NameIdPolicy {
    /// Creates a policy requesting a specific format.
    #[must_use]
    pub fn with_format(format: NameIdFormat) -> Self {
        Self {
            format: Some(format.uri().to_string()),
            sp_name_qualifier: None,
            allow_create: false,
        }
    }

    /// Sets whether new identifiers can be created.
    #[must_use]
    pub const fn allow_create(mut self, allow: bool) -> Self {
        self.allow_create = allow;
        self
    }
}

impl ToElement for NameIdPolicy {
    fn to_element(&self) -> Element {
        Element::ns(SAMLP_NS, Self::TAG)
            .with_optional_attribute("Format", self.format.as_deref())
            .with_optional_attribute("SPNameQualifier", self.sp_name_qualifier.as_deref())
            .with_attribute("AllowCreate", self.allow_create.to_string())
    }
}

impl FromElement for NameIdPolicy {
    const NAMESPACE: &'static str = SAMLP_NS;
    const TAG: &'static str = "NameIDPolicy";

    fn from_element(element: &Element) -> SamlResult<Self> {
        expect_tag::<Self>(element)?;
        Ok(Self {
            format: element.attribute("Format").map(String::from),
            sp_name_qualifier: element.attribute("SPNameQualifier").map(String::from),
            allow_create: element.attribute("AllowCreate") == Some("true"),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn name_id_transient() {
        let name_id = NameId::transient("abc123");
        assert_eq!(name_id.value, "abc123");
        assert_eq!(name_id.parsed_format(), NameIdFormat::Transient);
    }

    #[test]
    fn name_id_element_roundtrip() {
        let name_id = NameId::persistent("user-1")
            .with_name_qualifier("idp.example.com")
            .with_sp_name_qualifier("sp.example.com");

        let element = name_id.to_element();
        assert_eq!(element.attribute("SPNameQualifier"), Some("sp.example.com"));
        assert_eq!(NameId::from_element(&element).unwrap(), name_id);
    }

    #[test]
    fn name_id_rejects_other_tags() {
        let element = Element::ns(SAML_NS, "Issuer").with_text("x");
        assert!(NameId::from_element(&element).is_err());
    }

    #[test]
    fn name_id_policy_roundtrip() {
        let policy = NameIdPolicy::with_format(NameIdFormat::Email).allow_create(true);
        let parsed = NameIdPolicy::from_element(&policy.to_element()).unwrap();
        assert_eq!(parsed, policy);
        assert!(parsed.allow_create);
    }
}
