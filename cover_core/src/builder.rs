//! Type-state builder for `Cover`.
//!
//! The builder enforces at compile time that the spec, publisher and store are
//! provided before `build()` is available. `try_build()` is always available
//! for dynamic checks.

use std::marker::PhantomData;
use std::sync::Arc;

use cover_traits::clock::{Clock, MonotonicClock};
use cover_traits::{CommandPublisher, PositionStore};

use crate::config::{ControllerCfg, CoverSpec};
use crate::cover::Cover;
use crate::error::{BuildError, Result};

pub struct Missing;
pub struct Set;

type SharedPublisher = Arc<dyn CommandPublisher + Send + Sync>;
type SharedStore = Arc<dyn PositionStore + Send + Sync>;
type SharedClock = Arc<dyn Clock + Send + Sync>;

/// Builder for `Cover`. All fields are validated on `build()`.
pub struct CoverBuilder<C, P, S> {
    spec: Option<CoverSpec>,
    timing: Option<ControllerCfg>,
    publisher: Option<SharedPublisher>,
    store: Option<SharedStore>,
    clock: Option<SharedClock>,
    _c: PhantomData<C>,
    _p: PhantomData<P>,
    _s: PhantomData<S>,
}

impl Default for CoverBuilder<Missing, Missing, Missing> {
    fn default() -> Self {
        Self {
            spec: None,
            timing: None,
            publisher: None,
            store: None,
            clock: None,
            _c: PhantomData,
            _p: PhantomData,
            _s: PhantomData,
        }
    }
}

impl Cover {
    /// Start building a Cover.
    pub fn builder() -> CoverBuilder<Missing, Missing, Missing> {
        CoverBuilder::default()
    }
}

fn validate(spec: &CoverSpec, timing: &ControllerCfg) -> Result<()> {
    let invalid = |msg| Err(eyre::Report::new(BuildError::InvalidConfig(msg)));
    if spec.id.trim().is_empty() {
        return invalid("cover id must not be empty");
    }
    if spec.command_topic.trim().is_empty() {
        return invalid("command topic must not be empty");
    }
    if spec.open_payload.is_empty() || spec.close_payload.is_empty() || spec.stop_payload.is_empty()
    {
        return invalid("payloads must not be empty");
    }
    if timing.tick.is_zero() {
        return invalid("tick must be > 0");
    }
    if timing.cancel_ack_timeout.is_zero() {
        return invalid("cancel_ack_timeout must be > 0");
    }
    Ok(())
}

impl<C, P, S> CoverBuilder<C, P, S> {
    /// Fallible build available in any type-state; returns detailed error for missing pieces.
    pub fn try_build(self) -> Result<Cover> {
        let spec = self
            .spec
            .ok_or_else(|| eyre::Report::new(BuildError::MissingSpec))?;
        let publisher = self
            .publisher
            .ok_or_else(|| eyre::Report::new(BuildError::MissingPublisher))?;
        let store = self
            .store
            .ok_or_else(|| eyre::Report::new(BuildError::MissingStore))?;
        let timing = self.timing.unwrap_or_default();
        validate(&spec, &timing)?;

        let clock: SharedClock = match self.clock {
            Some(c) => c,
            None => Arc::new(MonotonicClock::new()),
        };
        Ok(Cover::from_parts(spec, timing, publisher, store, clock))
    }

    fn retype<C2, P2, S2>(self) -> CoverBuilder<C2, P2, S2> {
        CoverBuilder {
            spec: self.spec,
            timing: self.timing,
            publisher: self.publisher,
            store: self.store,
            clock: self.clock,
            _c: PhantomData,
            _p: PhantomData,
            _s: PhantomData,
        }
    }
}

/// Chainable setters that do not affect type-state.
impl<C, P, S> CoverBuilder<C, P, S> {
    pub fn with_timing(mut self, timing: ControllerCfg) -> Self {
        self.timing = Some(timing);
        self
    }
    /// Provide a custom clock implementation; defaults to `MonotonicClock` when not provided.
    pub fn with_clock(self, clock: impl Clock + Send + Sync + 'static) -> Self {
        self.with_shared_clock(Arc::new(clock))
    }
    pub fn with_shared_clock(mut self, clock: SharedClock) -> Self {
        self.clock = Some(clock);
        self
    }
}

// Setters that advance type-state
impl<P, S> CoverBuilder<Missing, P, S> {
    pub fn with_spec(mut self, spec: CoverSpec) -> CoverBuilder<Set, P, S> {
        self.spec = Some(spec);
        self.retype()
    }
}

impl<C, S> CoverBuilder<C, Missing, S> {
    pub fn with_publisher(
        self,
        publisher: impl CommandPublisher + Send + Sync + 'static,
    ) -> CoverBuilder<C, Set, S> {
        self.with_shared_publisher(Arc::new(publisher))
    }
    /// Share one transport between several covers.
    pub fn with_shared_publisher(mut self, publisher: SharedPublisher) -> CoverBuilder<C, Set, S> {
        self.publisher = Some(publisher);
        self.retype()
    }
}

impl<C, P> CoverBuilder<C, P, Missing> {
    pub fn with_store(
        self,
        store: impl PositionStore + Send + Sync + 'static,
    ) -> CoverBuilder<C, P, Set> {
        self.with_shared_store(Arc::new(store))
    }
    pub fn with_shared_store(mut self, store: SharedStore) -> CoverBuilder<C, P, Set> {
        self.store = Some(store);
        self.retype()
    }
}

impl CoverBuilder<Set, Set, Set> {
    /// Validate and build the Cover. Only available when spec, publisher and store are set.
    pub fn build(self) -> Result<Cover> {
        self.try_build()
    }
}
