//! Inference endpoint configuration.
//!
//! Resolved once by the application bootstrap and passed by value into the
//! transport. Nothing in this crate reads the process environment; the
//! bootstrap collects the raw inputs into [`EndpointSources`].

use std::fmt;
use std::time::Duration;

use tracing::info;

/// Local inference server used when nothing else is configured.
pub const DEFAULT_ENDPOINT: &str = "http://localhost:11434";

/// Service address of the inference server inside a compose network.
pub const CONTAINER_ENDPOINT: &str = "http://ollama:11434";

/// Default per-call timeout; generous enough for the slowest vision model.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(120);

pub const DEFAULT_MAX_RETRIES: u32 = 3;

/// Which input won endpoint resolution.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EndpointSource {
    Explicit,
    Container,
    Environment,
    Default,
}

impl fmt::Display for EndpointSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Explicit => "explicit",
            Self::Container => "container",
            Self::Environment => "environment",
            Self::Default => "default",
        })
    }
}

/// Raw inputs for endpoint resolution, in priority order.
#[derive(Debug, Clone, Default)]
pub struct EndpointSources {
    /// Operator-supplied override.
    pub explicit: Option<String>,
    /// Host name of the running process; containers get a generated one.
    pub hostname: Option<String>,
    /// Endpoint advertised by the deployment environment.
    pub env_endpoint: Option<String>,
}

impl EndpointSources {
    /// Resolve to a base URL without trailing slash.
    pub fn resolve(&self) -> (String, EndpointSource) {
        let (url, source) = if let Some(url) = non_empty(&self.explicit) {
            (url, EndpointSource::Explicit)
        } else if self
            .hostname
            .as_deref()
            .is_some_and(|h| h.to_ascii_lowercase().contains("docker"))
        {
            (CONTAINER_ENDPOINT, EndpointSource::Container)
        } else if let Some(url) = non_empty(&self.env_endpoint) {
            (url, EndpointSource::Environment)
        } else {
            (DEFAULT_ENDPOINT, EndpointSource::Default)
        };
        (url.trim_end_matches('/').to_string(), source)
    }
}

fn non_empty(value: &Option<String>) -> Option<&str> {
    value.as_deref().map(str::trim).filter(|s| !s.is_empty())
}

/// Everything the inference transport needs to know about its server.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InferenceConfig {
    /// Base URL, no trailing slash.
    pub endpoint: String,
    /// Upper bound for one remote call.
    pub timeout: Duration,
    /// Total attempts per logical call, including the first.
    pub max_retries: u32,
    /// Backoff before retry `n` (0-based) is `retry_base_delay * 2^n`.
    pub retry_base_delay: Duration,
}

impl Default for InferenceConfig {
    fn default() -> Self {
        Self {
            endpoint: DEFAULT_ENDPOINT.to_string(),
            timeout: DEFAULT_TIMEOUT,
            max_retries: DEFAULT_MAX_RETRIES,
            retry_base_delay: Duration::from_secs(1),
        }
    }
}

impl InferenceConfig {
    /// Build a config from endpoint sources, keeping default timing.
    pub fn from_sources(sources: &EndpointSources) -> Self {
        let (endpoint, source) = sources.resolve();
        info!(endpoint = %endpoint, source = %source, "resolved inference endpoint");
        Self {
            endpoint,
            ..Self::default()
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// At least one attempt is always made.
    pub fn with_max_retries(mut self, max_retries: u32) -> Self {
        self.max_retries = max_retries.max(1);
        self
    }

    pub fn with_retry_base_delay(mut self, delay: Duration) -> Self {
        self.retry_base_delay = delay;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sources(
        explicit: Option<&str>,
        hostname: Option<&str>,
        env: Option<&str>,
    ) -> EndpointSources {
        EndpointSources {
            explicit: explicit.map(Into::into),
            hostname: hostname.map(Into::into),
            env_endpoint: env.map(Into::into),
        }
    }

    #[test]
    fn explicit_override_wins() {
        let (url, src) = sources(
            Some("http://gpu-box:11434/"),
            Some("docker-abc"),
            Some("http://env:1"),
        )
        .resolve();
        assert_eq!(url, "http://gpu-box:11434");
        assert_eq!(src, EndpointSource::Explicit);
    }

    #[test]
    fn container_hostname_beats_environment() {
        let (url, src) = sources(None, Some("My-Docker-Host"), Some("http://env:1")).resolve();
        assert_eq!(url, CONTAINER_ENDPOINT);
        assert_eq!(src, EndpointSource::Container);
    }

    #[test]
    fn environment_endpoint_used_outside_containers() {
        let (url, src) =
            sources(None, Some("workstation"), Some("http://10.0.0.5:11434//")).resolve();
        assert_eq!(url, "http://10.0.0.5:11434");
        assert_eq!(src, EndpointSource::Environment);
    }

    #[test]
    fn falls_back_to_local_default() {
        let (url, src) = sources(None, None, None).resolve();
        assert_eq!(url, DEFAULT_ENDPOINT);
        assert_eq!(src, EndpointSource::Default);

        let (url, src) = sources(Some("  "), None, Some("")).resolve();
        assert_eq!(url, DEFAULT_ENDPOINT);
        assert_eq!(src, EndpointSource::Default);
    }

    #[test]
    fn config_builders() {
        let cfg = InferenceConfig::from_sources(&sources(Some("http://stub:9"), None, None))
            .with_timeout(Duration::from_secs(5))
            .with_max_retries(0)
            .with_retry_base_delay(Duration::from_millis(10));
        assert_eq!(cfg.endpoint, "http://stub:9");
        assert_eq!(cfg.timeout, Duration::from_secs(5));
        assert_eq!(cfg.max_retries, 1);
        assert_eq!(cfg.retry_base_delay, Duration::from_millis(10));
    }

    #[test]
    fn defaults() {
        let cfg = InferenceConfig::default();
        assert_eq!(cfg.endpoint, DEFAULT_ENDPOINT);
        assert_eq!(cfg.timeout, Duration::from_secs(120));
        assert_eq!(cfg.max_retries, 3);
    }
}
