use std::fmt;

use crate::error::SyncError;

/// Stream API credentials for one library.
///
/// Read fresh from the host settings for every sync event; never cached.
/// Both fields are guaranteed non-empty once constructed.
#[derive(Clone, PartialEq, Eq)]
pub struct Credentials {
    access_key: String,
    library_id: String,
}

impl Credentials {
    pub fn new(
        access_key: impl Into<String>,
        library_id: impl Into<String>,
    ) -> Result<Self, SyncError> {
        let access_key = access_key.into().trim().to_string();
        let library_id = library_id.into().trim().to_string();

        if access_key.is_empty() {
            return Err(SyncError::Configuration(
                "API key missing in plugin settings".to_string(),
            ));
        }
        if library_id.is_empty() {
            return Err(SyncError::Configuration(
                "Library ID missing in plugin settings".to_string(),
            ));
        }

        Ok(Self {
            access_key,
            library_id,
        })
    }

    pub fn access_key(&self) -> &str {
        &self.access_key
    }

    pub fn library_id(&self) -> &str {
        &self.library_id
    }
}

// Never print the access key.
impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("access_key", &"<redacted>")
            .field("library_id", &self.library_id)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_trims_fields() {
        let creds = Credentials::new("  key-123 ", " 4711 ").unwrap();
        assert_eq!(creds.access_key(), "key-123");
        assert_eq!(creds.library_id(), "4711");
    }

    #[test]
    fn test_empty_access_key_rejected() {
        let err = Credentials::new("", "4711").unwrap_err();
        assert!(matches!(err, SyncError::Configuration(_)));
        assert!(err.to_string().contains("API key"));
    }

    #[test]
    fn test_blank_library_id_rejected() {
        let err = Credentials::new("key-123", "   ").unwrap_err();
        assert!(err.to_string().contains("Library ID"));
    }

    #[test]
    fn test_debug_redacts_access_key() {
        let creds = Credentials::new("super-secret", "4711").unwrap();
        let debug = format!("{:?}", creds);
        assert!(!debug.contains("super-secret"));
        assert!(debug.contains("4711"));
    }
}
