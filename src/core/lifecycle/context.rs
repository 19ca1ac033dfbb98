//! Per-call behaviour switches

use crate::domain::Environment;

/// How a lifecycle call behaves
///
/// Interactive calls surface validation, signature and final rejection
/// errors to the caller. Scheduled calls never fail per document: every
/// problem becomes a log entry and a state transition.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CallContext {
    pub interactive: bool,
    /// When false a rejection does not move the document to `rejected`
    pub allow_state_change: bool,
    pub environment: Environment,
}

impl CallContext {
    /// Caller waiting for the result, e.g. the `declare` command
    pub fn interactive(environment: Environment) -> Self {
        Self {
            interactive: true,
            allow_state_change: true,
            environment,
        }
    }

    /// Scheduled pass
    pub fn scheduled(environment: Environment) -> Self {
        Self {
            interactive: false,
            allow_state_change: true,
            environment,
        }
    }

    /// Same context with rejections kept from changing the state
    pub fn without_state_change(self) -> Self {
        Self {
            allow_state_change: false,
            ..self
        }
    }

    /// Whether a final rejection is raised to the caller
    pub fn escalates_rejection(&self) -> bool {
        self.interactive && self.environment == Environment::Production
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_escalation_only_interactive_production() {
        assert!(CallContext::interactive(Environment::Production).escalates_rejection());
        assert!(!CallContext::interactive(Environment::Test).escalates_rejection());
        assert!(!CallContext::scheduled(Environment::Production).escalates_rejection());
    }

    #[test]
    fn test_without_state_change() {
        let ctx = CallContext::scheduled(Environment::Test).without_state_change();
        assert!(!ctx.allow_state_change);
        assert!(!ctx.interactive);
    }
}
