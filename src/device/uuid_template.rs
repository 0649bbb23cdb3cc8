//! Expansion of 16-bit short codes into 128-bit service UUIDs

use uuid::Uuid;

use crate::{MeterError, Result};

const PLACEHOLDER: &str = "xxxx";

/// A UUID string with a four character `xxxx` placeholder for a 16-bit short
/// code, e.g. the Bluetooth base UUID `0000xxxx-0000-1000-8000-00805f9b34fb`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UuidTemplate {
    template: String,
}

impl UuidTemplate {
    /// The Bluetooth SIG base UUID.
    pub const BLUETOOTH_BASE: &'static str = "0000xxxx-0000-1000-8000-00805f9b34fb";

    /// Create a template, checking that it expands to a well-formed UUID.
    pub fn new(template: impl AsRef<str>) -> Result<Self> {
        let template = template.as_ref().to_lowercase();

        match template.matches(PLACEHOLDER).count() {
            1 => {}
            n => {
                return Err(MeterError::parse_error(
                    "UUID template",
                    format!("expected exactly one '{PLACEHOLDER}' placeholder, found {n}"),
                ));
            }
        }

        let template = Self { template };
        template.expand(0)?;
        Ok(template)
    }

    /// Expand a short code, zero-padded to four lowercase hex digits.
    pub fn expand(&self, short_code: u16) -> Result<Uuid> {
        let expanded = self.template.replacen(PLACEHOLDER, &format!("{short_code:04x}"), 1);
        Uuid::parse_str(&expanded).map_err(|e| {
            MeterError::parse_error("UUID template", format!("'{expanded}' is not a UUID: {e}"))
        })
    }

    pub fn as_str(&self) -> &str {
        &self.template
    }
}
