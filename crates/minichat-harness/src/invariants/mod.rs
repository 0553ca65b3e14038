//! Session invariants checked after every simulated step.
//!
//! Scenario tests pin down one conversation at a time; these properties must
//! hold for any ordering of sends, host replies, config pushes and clock ticks.
//!
//! # Architecture
//!
//! Observable state is extracted from the Adapter and the simulated host into
//! a [`SessionSnapshot`], then every registered [`Invariant`] is run against
//! it.
//!
//! # Usage
//!
//! ```ignore
//! let registry = InvariantRegistry::standard();
//! snapshot.observe(runtime.adapter(), host.handshakes());
//! registry.check_all(&snapshot)?;
//! ```

mod checks;
mod snapshot;

pub use checks::{
    HandshakeAtMostOnce, HistoryAppendOnly, HistoryHidesSystem, NoReplyWithoutTransport,
    SystemSeedPreserved,
};
pub use snapshot::SessionSnapshot;

/// Outcome of a single check.
pub type InvariantResult = Result<(), Violation>;

/// A broken property, named so test output points at the check.
#[derive(Debug, Clone)]
pub struct Violation {
    /// Name of the violated invariant.
    pub invariant: &'static str,
    /// Description of what went wrong.
    pub message: String,
}

impl std::fmt::Display for Violation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.invariant, self.message)
    }
}

impl std::error::Error for Violation {}

/// An invariant that can be checked against session state.
pub trait Invariant {
    /// Invariant name for error reporting.
    fn name(&self) -> &'static str;

    /// Check the invariant against a snapshot.
    ///
    /// Returns `Ok(())` if the invariant holds, or a [`Violation`]
    /// describing what went wrong.
    fn check(&self, state: &SessionSnapshot) -> InvariantResult;
}

/// Registry of invariants to check.
///
/// Use [`InvariantRegistry::standard()`] for the session invariants.
pub struct InvariantRegistry {
    invariants: Vec<Box<dyn Invariant>>,
}

impl Default for InvariantRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl InvariantRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self { invariants: Vec::new() }
    }

    /// Create a registry with the standard session invariants.
    ///
    /// Includes:
    /// - [`SystemSeedPreserved`]: the seed stays at the head
    /// - [`HistoryAppendOnly`]: turns are never removed or reordered
    /// - [`HistoryHidesSystem`]: the view projection drops system turns
    /// - [`HandshakeAtMostOnce`]: one init per session at most
    /// - [`NoReplyWithoutTransport`]: no assistant turn before detection
    pub fn standard() -> Self {
        let mut registry = Self::new();
        registry.add(SystemSeedPreserved);
        registry.add(HistoryAppendOnly);
        registry.add(HistoryHidesSystem);
        registry.add(HandshakeAtMostOnce);
        registry.add(NoReplyWithoutTransport);
        registry
    }

    /// Add an invariant to the registry.
    pub fn add<I: Invariant + 'static>(&mut self, invariant: I) {
        self.invariants.push(Box::new(invariant));
    }

    /// Run every check, collecting all violations rather than stopping early.
    pub fn check_all(&self, state: &SessionSnapshot) -> Result<(), Vec<Violation>> {
        let violations: Vec<_> =
            self.invariants.iter().filter_map(|inv| inv.check(state).err()).collect();

        if violations.is_empty() { Ok(()) } else { Err(violations) }
    }

    /// Panic with every violation listed, tagged with `context`.
    #[allow(clippy::panic, reason = "test helper surfaces violations as failures")]
    pub fn assert_all(&self, state: &SessionSnapshot, context: &str) {
        if let Err(violations) = self.check_all(state) {
            let messages: Vec<_> = violations.iter().map(ToString::to_string).collect();
            panic!("Invariant violation {context}:\n  {}", messages.join("\n  "));
        }
    }

    /// Number of registered invariants.
    pub fn len(&self) -> usize {
        self.invariants.len()
    }

    /// Check if registry is empty.
    pub fn is_empty(&self) -> bool {
        self.invariants.is_empty()
    }
}
