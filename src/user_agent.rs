//! User-Agent sources for per-attempt request identity.
//!
//! The engine asks its [`UserAgentSource`] for a fresh string on every
//! attempt, so a retried request can present a different browser identity
//! than the attempt that failed.

use rand::seq::SliceRandom;

use crate::fetch::EngineError;

/// Browser User-Agent strings used by [`RandomUserAgent::new`].
const BROWSER_USER_AGENTS: &[&str] = &[
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) \
     Chrome/131.0.0.0 Safari/537.36",
    "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) AppleWebKit/537.36 (KHTML, like Gecko) \
     Chrome/131.0.0.0 Safari/537.36",
    "Mozilla/5.0 (X11; Linux x86_64) AppleWebKit/537.36 (KHTML, like Gecko) \
     Chrome/130.0.0.0 Safari/537.36",
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64; rv:133.0) Gecko/20100101 Firefox/133.0",
    "Mozilla/5.0 (X11; Ubuntu; Linux x86_64; rv:132.0) Gecko/20100101 Firefox/132.0",
    "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) AppleWebKit/605.1.15 (KHTML, like Gecko) \
     Version/18.1 Safari/605.1.15",
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) \
     Chrome/131.0.0.0 Safari/537.36 Edg/131.0.0.0",
    "Mozilla/5.0 (iPhone; CPU iPhone OS 18_1 like Mac OS X) AppleWebKit/605.1.15 \
     (KHTML, like Gecko) Version/18.1 Mobile/15E148 Safari/604.1",
];

/// Default User-Agent identifying this tool.
#[must_use]
pub fn default_user_agent() -> String {
    let version = env!("CARGO_PKG_VERSION");
    format!("fetch-engine/{version}")
}

/// Supplies a User-Agent string for each fetch attempt.
pub trait UserAgentSource: Send + Sync {
    /// Returns the User-Agent for the next attempt.
    fn random_string(&self) -> String;
}

/// Picks a User-Agent uniformly at random from a fixed list.
#[derive(Debug, Clone)]
pub struct RandomUserAgent {
    agents: Vec<String>,
}

impl Default for RandomUserAgent {
    fn default() -> Self {
        Self::new()
    }
}

impl RandomUserAgent {
    /// Creates a source over the built-in desktop and mobile browser strings.
    #[must_use]
    pub fn new() -> Self {
        Self {
            agents: BROWSER_USER_AGENTS.iter().map(|ua| (*ua).to_string()).collect(),
        }
    }

    /// Creates a source over a custom list.
    ///
    /// # Errors
    ///
    /// Returns [`EngineError::InvalidArgument`] if the list is empty.
    pub fn from_agents<I, S>(agents: I) -> Result<Self, EngineError>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let agents: Vec<String> = agents.into_iter().map(Into::into).collect();
        if agents.is_empty() {
            return Err(EngineError::invalid_argument(
                "user_agents",
                "at least one User-Agent is required",
            ));
        }
        Ok(Self { agents })
    }

    /// Returns the candidate list.
    #[must_use]
    pub fn agents(&self) -> &[String] {
        &self.agents
    }
}

impl UserAgentSource for RandomUserAgent {
    fn random_string(&self) -> String {
        self.agents
            .choose(&mut rand::thread_rng())
            .cloned()
            .unwrap_or_else(default_user_agent)
    }
}

/// Always returns the same User-Agent.
#[derive(Debug, Clone)]
pub struct FixedUserAgent(String);

impl FixedUserAgent {
    /// Creates a source that always returns `agent`.
    pub fn new(agent: impl Into<String>) -> Self {
        Self(agent.into())
    }
}

impl Default for FixedUserAgent {
    fn default() -> Self {
        Self(default_user_agent())
    }
}

impl UserAgentSource for FixedUserAgent {
    fn random_string(&self) -> String {
        self.0.clone()
    }
}
