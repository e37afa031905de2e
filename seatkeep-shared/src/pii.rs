use serde::{Deserialize, Serialize, Serializer};
use std::fmt;

/// Wraps passenger contact and payment data so it never shows up in `Debug`
/// output.
///
/// Booking documents are logged whole when they fail the roster cross-check,
/// which would otherwise leak phone numbers into the log stream. Serialization
/// is untouched: the stored document keeps the real value.
#[derive(Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(transparent)]
pub struct Masked<T>(pub T);

impl<T> Masked<T> {
    pub fn new(value: T) -> Self {
        Self(value)
    }

    pub fn expose(&self) -> &T {
        &self.0
    }
}

impl<T> fmt::Debug for Masked<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("********")
    }
}

impl<T: Serialize> Serialize for Masked<T> {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        self.0.serialize(serializer)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_debug_hides_value_but_json_keeps_it() {
        let phone = Masked::new("+2348012345678".to_string());

        assert_eq!(format!("{:?}", phone), "********");
        assert_eq!(serde_json::to_string(&phone).unwrap(), "\"+2348012345678\"");
        assert_eq!(phone.expose(), "+2348012345678");
    }
}
