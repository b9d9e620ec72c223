//! Error types for package operations.
//!
//! Failures from the underlying tools are classified from their stderr so
//! callers can tell a typo in a package name from a network outage or a
//! missing privilege.

use crate::types::PackageManager;
use thiserror::Error;

/// Categories of package manager errors.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    /// Network-related errors (mirror unreachable, DNS, TLS)
    Network,
    /// Package or version not found in any configured source
    NotFound,
    /// Permission denied (usually not running as root)
    Permission,
    /// Another process holds the package database lock
    Locked,
    /// The package manager itself is not installed
    ToolNotFound,
    /// Other/unknown errors
    Other,
}

impl ErrorCategory {
    /// Get a user-friendly description of this error category.
    pub fn description(&self) -> &'static str {
        match self {
            Self::Network => "Network connectivity issue",
            Self::NotFound => "Package not found",
            Self::Permission => "Permission denied",
            Self::Locked => "Package database locked",
            Self::ToolNotFound => "Package manager not installed",
            Self::Other => "Unexpected error",
        }
    }

    /// Get actionable advice for resolving this error category.
    pub fn advice(&self) -> &'static str {
        match self {
            Self::Network => "Check connectivity to the package mirrors and try again",
            Self::NotFound => "Verify the package name and version",
            Self::Permission => "Run as root",
            Self::Locked => "Wait for the other package manager process to finish",
            Self::ToolNotFound => "Install the package manager or pick another platform",
            Self::Other => "Check the error details for more information",
        }
    }
}

/// Errors that can occur during package operations.
#[derive(Debug, Error)]
pub enum Error {
    /// Network-related error
    #[error("{manager}: network error: {message}")]
    Network {
        /// Tool that failed
        manager: PackageManager,
        /// Trimmed stderr of the failed command
        message: String,
    },

    /// Package or version not found
    #[error("{manager}: package not found: {name}")]
    NotFound {
        /// Tool that failed
        manager: PackageManager,
        /// Package that could not be found
        name: String,
    },

    /// Permission denied
    #[error("{manager}: permission denied: {message}")]
    Permission {
        /// Tool that failed
        manager: PackageManager,
        /// Trimmed stderr of the failed command
        message: String,
    },

    /// Package database lock held by another process
    #[error("{manager}: package database locked: {message}")]
    Locked {
        /// Tool that failed
        manager: PackageManager,
        /// Trimmed stderr of the failed command
        message: String,
    },

    /// Package manager executable not found
    #[error("{0} is not installed")]
    ToolNotFound(String),

    /// No system package manager is known for a platform family
    #[error("no package manager known for platform family {0}")]
    UnsupportedFamily(String),

    /// Command execution failed
    #[error("{manager}: {message}: {stderr}")]
    CommandFailed {
        /// Tool that failed
        manager: PackageManager,
        /// Description of what command failed
        message: String,
        /// Standard error output from the failed command
        stderr: String,
    },

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl Error {
    /// Get the error category.
    pub fn category(&self) -> ErrorCategory {
        match self {
            Error::Network { .. } => ErrorCategory::Network,
            Error::NotFound { .. } => ErrorCategory::NotFound,
            Error::Permission { .. } => ErrorCategory::Permission,
            Error::Locked { .. } => ErrorCategory::Locked,
            Error::ToolNotFound(_) | Error::UnsupportedFamily(_) => ErrorCategory::ToolNotFound,
            _ => ErrorCategory::Other,
        }
    }

    /// Create an error from a failed command's stderr.
    ///
    /// Analyzes stderr to categorize the error appropriately.
    pub fn from_output(manager: PackageManager, stderr: &str, package_name: Option<&str>) -> Self {
        let stderr_lower = stderr.to_lowercase();
        let message = stderr.trim().to_string();

        // Lock contention shows up as a permission-like failure on apt, check it first
        if stderr_lower.contains("could not get lock")
            || stderr_lower.contains("unable to lock")
            || stderr_lower.contains("another app is currently holding the yum lock")
            || stderr_lower.contains("database is locked")
        {
            return Error::Locked { manager, message };
        }

        if stderr_lower.contains("permission denied")
            || stderr_lower.contains("are you root")
            || stderr_lower.contains("you need to be root")
            || stderr_lower.contains("operation not permitted")
        {
            return Error::Permission { manager, message };
        }

        if stderr_lower.contains("unable to locate package")
            || stderr_lower.contains("no package")
            || stderr_lower.contains("no matching distribution")
            || stderr_lower.contains("could not find a version")
            || stderr_lower.contains("is not installed")
            || stderr_lower.contains("not found")
            || stderr_lower.contains("no packages found")
        {
            return Error::NotFound {
                manager,
                name: package_name.unwrap_or("unknown").to_string(),
            };
        }

        if stderr_lower.contains("could not resolve")
            || stderr_lower.contains("temporary failure resolving")
            || stderr_lower.contains("connection refused")
            || stderr_lower.contains("timed out")
            || stderr_lower.contains("failed to fetch")
            || stderr_lower.contains("network is unreachable")
            || stderr_lower.contains("ssl")
        {
            return Error::Network { manager, message };
        }

        Error::CommandFailed {
            manager,
            message: format!(
                "command failed{}",
                package_name
                    .map(|n| format!(" for {n}"))
                    .unwrap_or_default()
            ),
            stderr: message,
        }
    }
}

/// Result type for package operations.
pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_output_not_found() {
        let err = Error::from_output(
            PackageManager::Apt,
            "E: Unable to locate package supervisr",
            Some("supervisr"),
        );
        assert_eq!(err.category(), ErrorCategory::NotFound);
        assert_eq!(err.to_string(), "apt: package not found: supervisr");
    }

    #[test]
    fn test_from_output_pip_version_not_found() {
        let err = Error::from_output(
            PackageManager::Pip,
            "ERROR: Could not find a version that satisfies the requirement supervisor==9.9",
            Some("supervisor"),
        );
        assert_eq!(err.category(), ErrorCategory::NotFound);
    }

    #[test]
    fn test_from_output_lock_before_permission() {
        let err = Error::from_output(
            PackageManager::Apt,
            "E: Could not get lock /var/lib/dpkg/lock-frontend. It is held by process 1234\n\
             E: Unable to acquire the dpkg frontend lock, are you root?",
            None,
        );
        assert_eq!(err.category(), ErrorCategory::Locked);
    }

    #[test]
    fn test_from_output_permission() {
        let err = Error::from_output(
            PackageManager::Yum,
            "You need to be root to perform this command.",
            Some("python-pip"),
        );
        assert_eq!(err.category(), ErrorCategory::Permission);
    }

    #[test]
    fn test_from_output_network() {
        let err = Error::from_output(
            PackageManager::Apt,
            "W: Failed to fetch http://deb.debian.org/dists/bookworm/InRelease",
            None,
        );
        assert_eq!(err.category(), ErrorCategory::Network);
    }

    #[test]
    fn test_from_output_fallback() {
        let err = Error::from_output(PackageManager::Pkgin, "  boom  ", Some("py27-expat"));
        assert_eq!(err.category(), ErrorCategory::Other);
        assert_eq!(err.to_string(), "pkgin: command failed for py27-expat: boom");
    }
}
