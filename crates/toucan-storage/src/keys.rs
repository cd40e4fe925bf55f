use crate::traits::{StorageError, StorageResult};

/// Reject paths that could escape the bucket or address nothing
pub(crate) fn validate_path(path: &str) -> StorageResult<()> {
    if path.trim().is_empty() {
        return Err(StorageError::InvalidKey("Storage path is empty".to_string()));
    }
    if path.contains("..") || path.starts_with('/') || path.contains('\\') {
        return Err(StorageError::InvalidKey(
            "Storage path contains invalid characters".to_string(),
        ));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_path() {
        assert!(validate_path("owner/album/AbCdEf0123").is_ok());
        assert!(validate_path("").is_err());
        assert!(validate_path("   ").is_err());
        assert!(validate_path("/etc/passwd").is_err());
        assert!(validate_path("owner/../../etc").is_err());
        assert!(validate_path("owner\\album").is_err());
    }
}
