/// Errors that can occur when creating validated value types.
#[derive(Debug, thiserror::Error)]
pub enum TypeError {
    /// The input did not look like an email address.
    #[error("invalid email address: {0}")]
    InvalidEmail(String),
    /// The input text was empty or contained only whitespace.
    #[error("text cannot be empty")]
    Empty,
}

/// A validated email address.
///
/// This type wraps a `String` and guarantees the content matches the shape
/// `local@domain.tld`: no whitespace, exactly one `@`, and a dot somewhere in
/// the domain part. It deliberately does not attempt full RFC 5322
/// validation; the goal is to catch obviously broken recipient entries
/// before they reach the mailer.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct EmailAddress(String);

impl EmailAddress {
    /// Creates a new `EmailAddress` from the given input.
    ///
    /// The input is trimmed before validation. The original (trimmed) casing
    /// is preserved.
    ///
    /// # Returns
    ///
    /// Returns `Ok(EmailAddress)` if the input has a plausible email shape,
    /// or `Err(TypeError::InvalidEmail)` carrying the offending input.
    pub fn new(input: impl AsRef<str>) -> Result<Self, TypeError> {
        let trimmed = input.as_ref().trim();
        if !Self::looks_valid(trimmed) {
            return Err(TypeError::InvalidEmail(trimmed.to_owned()));
        }
        Ok(Self(trimmed.to_owned()))
    }

    fn looks_valid(s: &str) -> bool {
        if s.is_empty() || s.chars().any(char::is_whitespace) {
            return false;
        }
        let mut parts = s.splitn(2, '@');
        let local = parts.next().unwrap_or_default();
        let Some(domain) = parts.next() else {
            return false;
        };
        if local.is_empty() || domain.is_empty() || domain.contains('@') {
            return false;
        }
        // The domain needs at least one interior dot: "a.b", not ".b" or "a."
        domain
            .split('.')
            .filter(|segment| !segment.is_empty())
            .count()
            >= 2
            && !domain.starts_with('.')
            && !domain.ends_with('.')
    }

    /// Returns the inner address as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for EmailAddress {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl AsRef<str> for EmailAddress {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl serde::Serialize for EmailAddress {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.serialize_str(&self.0)
    }
}

impl<'de> serde::Deserialize<'de> for EmailAddress {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        EmailAddress::new(&s).map_err(serde::de::Error::custom)
    }
}

/// A hospital display name that is never empty.
///
/// Falls back to `"Hospital"` when constructed from blank input, matching the
/// configuration API's default.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(transparent)]
pub struct HospitalName(String);

impl HospitalName {
    pub const DEFAULT: &'static str = "Hospital";

    /// Creates a `HospitalName`, trimming whitespace and substituting the
    /// default when the input is blank.
    pub fn new(input: impl AsRef<str>) -> Self {
        let trimmed = input.as_ref().trim();
        if trimmed.is_empty() {
            Self(Self::DEFAULT.to_owned())
        } else {
            Self(trimmed.to_owned())
        }
    }

    /// Returns the inner name as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Default for HospitalName {
    fn default() -> Self {
        Self(Self::DEFAULT.to_owned())
    }
}

impl std::fmt::Display for HospitalName {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}
