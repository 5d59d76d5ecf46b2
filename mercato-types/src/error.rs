use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::data_type::DataType;

/// Classification of a single adapter failure.
///
/// Every adapter error maps onto one of these; the registry uses the kind to
/// pick the health transition and the metrics layer uses it for labelling.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FailureKind {
    /// The provider has no data for this symbol/parameter.
    NotFound,
    /// The provider is temporarily exhausted.
    RateLimited,
    /// The call exceeded its time budget.
    Timeout,
    /// Parsing, connectivity or any other unexpected provider failure.
    Provider,
}

impl FailureKind {
    /// Stable label for logs.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::NotFound => "not_found",
            Self::RateLimited => "rate_limited",
            Self::Timeout => "timeout",
            Self::Provider => "provider_error",
        }
    }
}

/// Unified error type for the mercato workspace.
///
/// Adapter failures (`NotFound`, `RateLimited`, `ProviderTimeout`, `Provider`)
/// are recovered by the service; the remaining variants describe how a whole
/// request ended.
#[derive(Debug, Error, Serialize, Deserialize, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum MercatoError {
    /// A resource or symbol could not be found.
    #[error("not found: {what}")]
    NotFound {
        /// Description of missing resource, e.g. "quote for AAPL".
        what: String,
    },

    /// The provider refused the call because its rate budget is spent.
    #[error("{provider} rate limited (retry_after_ms={retry_after_ms:?})")]
    RateLimited {
        /// Provider name.
        provider: String,
        /// Provider-suggested wait before retrying, when known.
        retry_after_ms: Option<u64>,
    },

    /// An individual provider call exceeded the configured timeout.
    #[error("provider timed out: {data_type} via {provider}")]
    ProviderTimeout {
        /// Provider name that timed out.
        provider: String,
        /// Data type being fetched.
        data_type: DataType,
    },

    /// An individual provider failed for any other reason.
    #[error("{provider} failed: {msg}")]
    Provider {
        /// Provider name that failed.
        provider: String,
        /// Human-readable error message.
        msg: String,
    },

    /// No registered provider implements the requested data type.
    #[error("unsupported capability: {capability}")]
    Unsupported {
        /// Capability label, e.g. "options_chain".
        capability: String,
    },

    /// Providers exist for the data type but all of them are cooling down.
    #[error("no eligible providers for {data_type}")]
    NoEligibleProviders {
        /// Requested data type.
        data_type: DataType,
    },

    /// All attempted providers failed; contains the individual failures in try order.
    #[error("all providers failed for {data_type}: {errors:?}")]
    AllProvidersFailed {
        /// Requested data type.
        data_type: DataType,
        /// Per-provider failures.
        errors: Vec<MercatoError>,
    },

    /// All attempted providers timed out.
    #[error("all providers timed out: {data_type}")]
    AllProvidersTimedOut {
        /// Requested data type.
        data_type: DataType,
    },

    /// The caller's overall deadline elapsed before a provider succeeded.
    #[error("request timed out: {data_type} (last error: {last_error:?})")]
    RequestTimeout {
        /// Requested data type.
        data_type: DataType,
        /// Last adapter error observed before the deadline, if any.
        last_error: Option<Box<MercatoError>>,
    },

    /// A deduplicated follower gave up waiting for the in-flight leader.
    #[error("timed out waiting for in-flight request {key}")]
    DedupWaitTimeout {
        /// Dedup key that was being awaited.
        key: String,
    },

    /// The in-flight leader went away without publishing a result.
    #[error("in-flight request {key} was abandoned")]
    DedupLeaderAbandoned {
        /// Dedup key that was being awaited.
        key: String,
    },

    /// Issues with the returned or expected data (wrong envelope, missing fields).
    #[error("data issue: {0}")]
    Data(String),

    /// Invalid input argument.
    #[error("invalid argument: {0}")]
    InvalidArg(String),

    /// Invalid or unreadable configuration.
    #[error("invalid configuration: {0}")]
    Config(String),
}

impl MercatoError {
    /// Helper: build a `NotFound` error for a description of the missing resource.
    pub fn not_found(what: impl Into<String>) -> Self {
        Self::NotFound { what: what.into() }
    }

    /// Helper: build a `Provider` error with the provider name and message.
    pub fn provider(provider: impl Into<String>, msg: impl Into<String>) -> Self {
        Self::Provider {
            provider: provider.into(),
            msg: msg.into(),
        }
    }

    /// Helper: build a `RateLimited` error.
    pub fn rate_limited(provider: impl Into<String>, retry_after_ms: Option<u64>) -> Self {
        Self::RateLimited {
            provider: provider.into(),
            retry_after_ms,
        }
    }

    /// Helper: build a `ProviderTimeout` error.
    pub fn provider_timeout(provider: impl Into<String>, data_type: DataType) -> Self {
        Self::ProviderTimeout {
            provider: provider.into(),
            data_type,
        }
    }

    /// Helper: build an `Unsupported` error for a capability string.
    #[must_use]
    pub fn unsupported(capability: impl Into<String>) -> Self {
        Self::Unsupported {
            capability: capability.into(),
        }
    }

    /// Classify this error into the adapter failure taxonomy.
    ///
    /// `RequestTimeout` counts as a timeout. Every variant that is not part of
    /// the taxonomy is treated as a generic provider failure.
    #[must_use]
    pub const fn kind(&self) -> FailureKind {
        match self {
            Self::NotFound { .. } => FailureKind::NotFound,
            Self::RateLimited { .. } => FailureKind::RateLimited,
            Self::ProviderTimeout { .. }
            | Self::AllProvidersTimedOut { .. }
            | Self::RequestTimeout { .. } => FailureKind::Timeout,
            _ => FailureKind::Provider,
        }
    }

    /// Returns true when the error means "data temporarily unavailable".
    ///
    /// Argument, configuration and envelope errors are not transient; everything
    /// produced by exhausting providers is.
    #[must_use]
    pub const fn is_unavailable(&self) -> bool {
        !matches!(
            self,
            Self::InvalidArg(_) | Self::Config(_) | Self::Data(_) | Self::Unsupported { .. }
        )
    }

    /// Flatten nested `AllProvidersFailed` structures into a plain vector.
    #[must_use]
    pub fn flatten(self) -> Vec<Self> {
        match self {
            Self::AllProvidersFailed { errors, .. } => {
                errors.into_iter().flat_map(Self::flatten).collect()
            }
            other => vec![other],
        }
    }
}

/// Collapse a set of provider errors into a uniform outcome.
///
/// Rules:
/// - If nothing was attempted → `NoEligibleProviders`.
/// - If all errors are timeouts → `AllProvidersTimedOut`.
/// - If all errors are `NotFound` → `NotFound(not_found_what)`.
/// - Else → `AllProvidersFailed(errors)`.
#[must_use]
pub fn collapse_errors(
    data_type: DataType,
    errors: Vec<MercatoError>,
    not_found_what: impl Into<String>,
) -> MercatoError {
    if errors.is_empty() {
        return MercatoError::NoEligibleProviders { data_type };
    }
    if errors
        .iter()
        .all(|e| matches!(e, MercatoError::ProviderTimeout { .. }))
    {
        return MercatoError::AllProvidersTimedOut { data_type };
    }
    if errors
        .iter()
        .all(|e| matches!(e, MercatoError::NotFound { .. }))
    {
        return MercatoError::not_found(not_found_what);
    }
    MercatoError::AllProvidersFailed { data_type, errors }
}
