//! Detection results

use std::borrow::Cow;
use std::fmt;

use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

/// Label identifying a kind of sensitive data (`email`, `uk_postcode`, a custom pattern name, ...)
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RedactionType(Cow<'static, str>);

impl RedactionType {
    pub const EMAIL: Self = Self::from_static("email");
    pub const PHONE: Self = Self::from_static("phone");
    pub const CREDIT_CARD: Self = Self::from_static("credit_card");
    pub const SSN: Self = Self::from_static("ssn");
    pub const ADDRESS: Self = Self::from_static("address");
    pub const NAME: Self = Self::from_static("name");
    pub const IP_ADDRESS: Self = Self::from_static("ip_address");
    pub const DATE: Self = Self::from_static("date");
    pub const TIME: Self = Self::from_static("time");
    pub const LINK: Self = Self::from_static("link");
    pub const ZIP_CODE: Self = Self::from_static("zip_code");
    pub const PO_BOX: Self = Self::from_static("po_box");
    pub const BTC_ADDRESS: Self = Self::from_static("btc_address");
    pub const MD5_HEX: Self = Self::from_static("md5_hex");
    pub const SHA1_HEX: Self = Self::from_static("sha1_hex");
    pub const SHA256_HEX: Self = Self::from_static("sha256_hex");
    pub const GUID: Self = Self::from_static("guid");
    pub const ISBN: Self = Self::from_static("isbn");
    pub const MAC_ADDRESS: Self = Self::from_static("mac_address");
    pub const IBAN: Self = Self::from_static("iban");
    pub const GIT_REPO: Self = Self::from_static("git_repo");
    pub const CUSTOM: Self = Self::from_static("custom");

    // UK-specific identifiers
    pub const UK_NATIONAL_INSURANCE: Self = Self::from_static("uk_national_insurance");
    pub const UK_NHS_NUMBER: Self = Self::from_static("uk_nhs_number");
    pub const UK_POSTCODE: Self = Self::from_static("uk_postcode");
    pub const UK_PHONE_NUMBER: Self = Self::from_static("uk_phone_number");
    pub const UK_MOBILE_NUMBER: Self = Self::from_static("uk_mobile_number");
    pub const UK_SORT_CODE: Self = Self::from_static("uk_sort_code");
    pub const UK_IBAN: Self = Self::from_static("uk_iban");
    pub const UK_COMPANY_NUMBER: Self = Self::from_static("uk_company_number");
    pub const UK_DRIVING_LICENSE: Self = Self::from_static("uk_driving_license");
    pub const UK_PASSPORT_NUMBER: Self = Self::from_static("uk_passport_number");

    pub const fn from_static(name: &'static str) -> Self {
        Self(Cow::Borrowed(name))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for RedactionType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for RedactionType {
    fn from(name: &str) -> Self {
        Self(Cow::Owned(name.to_string()))
    }
}

impl From<String> for RedactionType {
    fn from(name: String) -> Self {
        Self(Cow::Owned(name))
    }
}

/// One resolved detection. `start`/`end` are half-open byte offsets into the original text.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Redaction {
    #[serde(rename = "type")]
    pub redaction_type: RedactionType,
    pub start: usize,
    pub end: usize,
    pub original: String,
    pub replacement: String,
    pub confidence: f64,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub context: String,
    /// Name of the policy rule that produced this redaction, if any
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rule: Option<String>,
}

impl Redaction {
    pub fn len(&self) -> usize {
        self.end - self.start
    }

    pub fn is_empty(&self) -> bool {
        self.start == self.end
    }

    /// Half-open interval intersection
    pub fn overlaps(&self, other: &Redaction) -> bool {
        self.start < other.end && other.start < self.end
    }
}

/// Outcome of one redaction request
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RedactionResult {
    pub original_text: String,
    pub redacted_text: String,
    /// Sorted by `start` descending
    pub redactions: Vec<Redaction>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub token: Option<String>,
    #[serde(with = "time::serde::rfc3339")]
    pub timestamp: OffsetDateTime,
    /// Non-fatal problems, e.g. a custom pattern that failed to compile and was skipped
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub warnings: Vec<String>,
}

impl RedactionResult {
    pub fn count_of(&self, redaction_type: &RedactionType) -> usize {
        self.redactions
            .iter()
            .filter(|r| &r.redaction_type == redaction_type)
            .count()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RestoreResult {
    pub original_text: String,
    pub token: String,
    #[serde(with = "time::serde::rfc3339")]
    pub restored_at: OffsetDateTime,
    pub key_version: u32,
}
