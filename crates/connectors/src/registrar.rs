//! Connector registration
//!
//! Registration retries on a fixed delay up to a bounded number of attempts.
//! The loop is an explicit state machine so each transition can be tested
//! without a clock:
//!
//! ```text
//! Attempting{n} --ok--> Registered
//!      |  err, n < max
//!      v
//! Backoff{n} --delay--> Attempting{n+1}
//!      |  err, n == max
//!      v
//! Exhausted
//! ```
//!
//! Exhaustion is returned as a value. The caller decides whether to carry on
//! (ingestion does; the connector watchdog covers the gap).

use std::time::Duration;

use shadowmesh_config::ConnectorConfig;
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};

use crate::error::ConnectorError;
use crate::traits::{ConnectorControl, RegisterResponse};

/// Default registration attempts
pub const DEFAULT_MAX_ATTEMPTS: u32 = 10;

/// Default delay between attempts
pub const DEFAULT_RETRY_DELAY: Duration = Duration::from_secs(5);

/// Bounded fixed-delay retry policy
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Total attempts, including the first
    pub max_attempts: u32,
    /// Delay between attempts
    pub delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: DEFAULT_MAX_ATTEMPTS,
            delay: DEFAULT_RETRY_DELAY,
        }
    }
}

impl From<&ConnectorConfig> for RetryPolicy {
    fn from(config: &ConnectorConfig) -> Self {
        Self {
            max_attempts: config.max_attempts.max(1),
            delay: config.retry_delay,
        }
    }
}

/// Registration state
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RegistrationState {
    /// About to make attempt `attempt` (1-based)
    Attempting { attempt: u32 },
    /// Attempt `attempt` failed; waiting before the next one
    Backoff { attempt: u32, last_error: String },
    /// Registered (or already present) after `attempts` attempts
    Registered {
        response: RegisterResponse,
        attempts: u32,
    },
    /// Gave up after `attempts` attempts
    Exhausted { attempts: u32, last_error: String },
}

impl RegistrationState {
    /// Initial state
    pub fn start() -> Self {
        Self::Attempting { attempt: 1 }
    }

    /// Transition on the result of an attempt
    ///
    /// Only meaningful from `Attempting`; other states are returned unchanged.
    pub fn on_attempt(
        self,
        result: Result<RegisterResponse, ConnectorError>,
        policy: &RetryPolicy,
    ) -> Self {
        let Self::Attempting { attempt } = self else {
            return self;
        };

        match result {
            Ok(response) => Self::Registered {
                response,
                attempts: attempt,
            },
            Err(e) if attempt >= policy.max_attempts => Self::Exhausted {
                attempts: attempt,
                last_error: e.to_string(),
            },
            Err(e) => Self::Backoff {
                attempt,
                last_error: e.to_string(),
            },
        }
    }

    /// Transition once the backoff delay has elapsed
    pub fn on_delay_elapsed(self) -> Self {
        match self {
            Self::Backoff { attempt, .. } => Self::Attempting {
                attempt: attempt + 1,
            },
            other => other,
        }
    }

    /// Whether the machine has stopped
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Registered { .. } | Self::Exhausted { .. })
    }
}

/// Final result of a registration run
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RegistrationOutcome {
    Registered {
        response: RegisterResponse,
        attempts: u32,
    },
    Exhausted {
        attempts: u32,
        last_error: String,
    },
    /// Shutdown requested before a terminal state was reached
    Cancelled { attempts: u32 },
}

impl RegistrationOutcome {
    /// Whether the connector is known to be registered
    pub fn is_registered(&self) -> bool {
        matches!(self, Self::Registered { .. })
    }
}

/// Drives registration of one connector
pub struct ConnectorRegistrar<C> {
    control: C,
    policy: RetryPolicy,
}

impl<C: ConnectorControl> ConnectorRegistrar<C> {
    pub fn new(control: C, policy: RetryPolicy) -> Self {
        Self { control, policy }
    }

    /// Underlying connector control
    pub fn control(&self) -> &C {
        &self.control
    }

    /// Consume the registrar, returning the connector control
    pub fn into_control(self) -> C {
        self.control
    }

    /// Register with bounded retries
    pub async fn register(&self, cancel: &CancellationToken) -> RegistrationOutcome {
        let name = self.control.name();
        let mut state = RegistrationState::start();

        loop {
            state = match state {
                RegistrationState::Attempting { attempt } => {
                    info!(
                        connector = %name,
                        attempt,
                        max_attempts = self.policy.max_attempts,
                        "registering connector"
                    );
                    let result = tokio::select! {
                        _ = cancel.cancelled() => {
                            return RegistrationOutcome::Cancelled { attempts: attempt };
                        }
                        result = self.control.register() => result,
                    };
                    state.on_attempt(result, &self.policy)
                }
                RegistrationState::Backoff {
                    attempt,
                    ref last_error,
                } => {
                    warn!(
                        connector = %name,
                        attempt,
                        error = %last_error,
                        delay_ms = self.policy.delay.as_millis() as u64,
                        "connector registration failed, will retry"
                    );
                    tokio::select! {
                        _ = cancel.cancelled() => {
                            return RegistrationOutcome::Cancelled { attempts: attempt };
                        }
                        _ = tokio::time::sleep(self.policy.delay) => {}
                    }
                    state.on_delay_elapsed()
                }
                RegistrationState::Registered { response, attempts } => {
                    match response {
                        RegisterResponse::Created => {
                            info!(connector = %name, attempts, "connector registered")
                        }
                        RegisterResponse::AlreadyExists => {
                            info!(connector = %name, attempts, "connector already registered")
                        }
                    }
                    return RegistrationOutcome::Registered { response, attempts };
                }
                RegistrationState::Exhausted {
                    attempts,
                    last_error,
                } => {
                    error!(
                        connector = %name,
                        attempts,
                        error = %last_error,
                        fatal = true,
                        "connector registration exhausted all attempts"
                    );
                    return RegistrationOutcome::Exhausted {
                        attempts,
                        last_error,
                    };
                }
            };
        }
    }
}
