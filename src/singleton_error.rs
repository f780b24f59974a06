use thiserror::Error;

/// Errors reported by [`SingletonMap`](crate::SingletonMap) and the locators built on it.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SingletonError {
    /// A map was configured with zero buckets.
    #[error("bucket count must be greater than zero")]
    InvalidBucketCount,

    /// The key already holds a value of a different type than the one requested.
    #[error("singleton {key} is not a {type_name}")]
    TypeMismatch {
        /// Debug rendering of the key.
        key: String,
        /// The type the caller asked for.
        type_name: &'static str,
    },

    /// The key was requested from inside its own factory on the constructing thread.
    #[error("singleton {key} was requested while its own factory was running")]
    CyclicDependency {
        /// Debug rendering of the key.
        key: String,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_invalid_bucket_count_display() {
        let err = SingletonError::InvalidBucketCount;
        assert_eq!(err.to_string(), "bucket count must be greater than zero");
    }

    #[test]
    fn test_type_mismatch_display() {
        let err = SingletonError::TypeMismatch {
            key: "\"db\"".to_string(),
            type_name: "u32",
        };
        assert_eq!(err.to_string(), "singleton \"db\" is not a u32");
    }

    #[test]
    fn test_cyclic_dependency_display() {
        let err = SingletonError::CyclicDependency {
            key: "\"db\"".to_string(),
        };
        assert_eq!(
            err.to_string(),
            "singleton \"db\" was requested while its own factory was running"
        );
    }

    #[test]
    fn test_equality() {
        assert_eq!(
            SingletonError::InvalidBucketCount,
            SingletonError::InvalidBucketCount
        );
        assert_ne!(
            SingletonError::InvalidBucketCount,
            SingletonError::CyclicDependency { key: "a".into() }
        );
    }

    #[test]
    fn test_error_trait() {
        let err: &dyn std::error::Error = &SingletonError::InvalidBucketCount;
        assert!(err.source().is_none());
    }
}
