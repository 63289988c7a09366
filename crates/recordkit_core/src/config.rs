//! Per-kind model configuration.

/// How a model treats a missing `version` attribute.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum VersionPolicy {
    /// A missing version is an error. Kinds must opt in to defaults.
    #[default]
    Required,
    /// A missing version reads as `0`.
    DefaultZero,
}

/// Configuration attached to a kind at registration time.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModelConfig {
    /// Behaviour when the `version` attribute is absent.
    pub version_policy: VersionPolicy,

    /// Suffix appended to the kind name for audit snapshots.
    pub audit_suffix: String,

    /// Whether sensitive (password) columns are blanked on serialization.
    pub redact_sensitive: bool,
}

impl Default for ModelConfig {
    fn default() -> Self {
        Self {
            version_policy: VersionPolicy::Required,
            audit_suffix: "_audit".to_string(),
            redact_sensitive: true,
        }
    }
}

impl ModelConfig {
    /// Creates a new configuration with default values.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the missing-version policy.
    #[must_use]
    pub const fn version_policy(mut self, policy: VersionPolicy) -> Self {
        self.version_policy = policy;
        self
    }

    /// Sets the audit kind suffix.
    #[must_use]
    pub fn audit_suffix(mut self, suffix: impl Into<String>) -> Self {
        self.audit_suffix = suffix.into();
        self
    }

    /// Sets whether sensitive columns are redacted.
    #[must_use]
    pub const fn redact_sensitive(mut self, value: bool) -> Self {
        self.redact_sensitive = value;
        self
    }
}
