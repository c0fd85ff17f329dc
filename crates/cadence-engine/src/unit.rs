//! Schedulable units.
//!
//! A unit pairs a user-supplied body implementing [`Schedulable`] with the
//! scheduling attributes a [`Network`](crate::Network) sorts by: the clock
//! that drives it, its phase ([`When`]), an integer `order`, and an
//! `active` flag.
//!
//! Handles are reference-counted. [`Unit<T>`] is the typed handle the
//! creator keeps; [`AnyUnit`] is the type-erased handle networks and
//! registries hand out. Networks and registries only hold weak references,
//! so dropping every handle destroys the unit and it silently leaves every
//! network it was in.

use std::any::type_name;
use std::cell::{Cell, Ref, RefCell, RefMut};
use std::fmt;
use std::ops::Deref;
use std::rc::{Rc, Weak};

use cadence_core::{UnitId, UpdateError, When};

use crate::clock::SharedClock;
use crate::network::StopHandle;
use crate::registry::Registry;

// ── Schedulable ────────────────────────────────────────────────────

/// Behaviour of a unit's body.
pub trait Schedulable: 'static {
    /// Called at the start of every run, before the first update.
    fn prepare(&mut self) {}

    /// Called when a network is asked to reinitialise its units.
    fn reinit(&mut self) {}

    /// Called once for each tick of the unit's clock.
    fn update(&mut self, ctx: &mut UpdateContext<'_>) -> Result<(), UpdateError>;
}

/// What a unit sees of the running network during an update.
pub struct UpdateContext<'a> {
    t: f64,
    dt: f64,
    name: &'a str,
    stop: &'a StopHandle,
}

impl<'a> UpdateContext<'a> {
    pub(crate) fn new(t: f64, dt: f64, name: &'a str, stop: &'a StopHandle) -> Self {
        Self { t, dt, name, stop }
    }

    /// Time of the unit's clock at this tick.
    pub fn t(&self) -> f64 {
        self.t
    }

    /// Step of the unit's clock.
    pub fn dt(&self) -> f64 {
        self.dt
    }

    /// Name of the unit being updated.
    pub fn name(&self) -> &str {
        self.name
    }

    /// Ask the running network to stop after the current sub-step.
    pub fn stop(&self) {
        self.stop.stop();
    }
}

// ── Schedule ───────────────────────────────────────────────────────

/// Scheduling attributes for a new unit.
#[derive(Clone, Debug)]
pub struct Schedule {
    clock: Option<SharedClock>,
    when: When,
    order: i32,
    active: bool,
    name: Option<String>,
}

impl Default for Schedule {
    fn default() -> Self {
        Self {
            clock: None,
            when: When::default(),
            order: 0,
            active: true,
            name: None,
        }
    }
}

impl Schedule {
    /// Drive the unit with `clock` instead of the registry's default clock.
    pub fn on(mut self, clock: &SharedClock) -> Self {
        self.clock = Some(Rc::clone(clock));
        self
    }

    /// Run in phase `when`.
    pub fn when(mut self, when: When) -> Self {
        self.when = when;
        self
    }

    /// Order within the phase; lower runs first.
    pub fn order(mut self, order: i32) -> Self {
        self.order = order;
        self
    }

    /// Initial value of the active flag.
    pub fn active(mut self, active: bool) -> Self {
        self.active = active;
        self
    }

    /// Name used in logs and errors.
    pub fn named(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }
}

// ── UnitCell ───────────────────────────────────────────────────────

/// Shared state of a unit: scheduling attributes plus the body.
pub struct UnitCell<T: ?Sized> {
    id: UnitId,
    name: String,
    clock: SharedClock,
    when: When,
    order: i32,
    active: Cell<bool>,
    body: RefCell<T>,
}

/// Type-erased unit handle.
pub type AnyUnit = Rc<UnitCell<dyn Schedulable>>;

/// Non-owning unit reference, as held by networks and registries.
pub type WeakUnit = Weak<UnitCell<dyn Schedulable>>;

impl<T: ?Sized> UnitCell<T> {
    /// Unique identifier.
    pub fn id(&self) -> UnitId {
        self.id
    }

    /// Name used in logs and errors.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The clock driving this unit.
    pub fn clock(&self) -> &SharedClock {
        &self.clock
    }

    /// Scheduling phase.
    pub fn when(&self) -> When {
        self.when
    }

    /// Order within the phase.
    pub fn order(&self) -> i32 {
        self.order
    }

    /// Whether updates run. Inactive units still have their clock advanced.
    pub fn is_active(&self) -> bool {
        self.active.get()
    }

    /// Enable or disable updates.
    pub fn set_active(&self, active: bool) {
        self.active.set(active);
    }
}

impl UnitCell<dyn Schedulable> {
    pub(crate) fn try_body_mut(&self) -> Option<RefMut<'_, dyn Schedulable>> {
        self.body.try_borrow_mut().ok()
    }
}

impl<T: ?Sized> fmt::Debug for UnitCell<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("UnitCell")
            .field("id", &self.id)
            .field("name", &self.name)
            .field("clock", &self.clock.id())
            .field("when", &self.when)
            .field("order", &self.order)
            .field("active", &self.active.get())
            .finish_non_exhaustive()
    }
}

// ── Unit ───────────────────────────────────────────────────────────

/// Typed, owning handle to a unit.
///
/// Cloning the handle shares the unit.
pub struct Unit<T: Schedulable>(Rc<UnitCell<T>>);

impl<T: Schedulable> Unit<T> {
    /// Create a unit and register it with the thread's implicit registry.
    ///
    /// Without an explicit clock the unit runs on the registry's default
    /// clock.
    pub fn new(body: T, schedule: Schedule) -> Self {
        let clock = match &schedule.clock {
            Some(clock) => Rc::clone(clock),
            None => crate::magic::default_clock(),
        };
        let unit = Self::build(body, schedule, clock);
        crate::magic::register(&unit.erase());
        unit
    }

    /// Create a unit registered with an explicit `registry`.
    pub fn new_in(body: T, schedule: Schedule, registry: &mut Registry) -> Self {
        let clock = match &schedule.clock {
            Some(clock) => Rc::clone(clock),
            None => registry.default_clock(),
        };
        let unit = Self::build(body, schedule, clock);
        registry.register(&unit.erase());
        unit
    }

    fn build(body: T, schedule: Schedule, clock: SharedClock) -> Self {
        let id = UnitId::next();
        let name = schedule
            .name
            .unwrap_or_else(|| format!("{}#{}", short_type_name::<T>(), id.get()));
        Self(Rc::new(UnitCell {
            id,
            name,
            clock,
            when: schedule.when,
            order: schedule.order,
            active: Cell::new(schedule.active),
            body: RefCell::new(body),
        }))
    }

    /// Shared access to the body.
    ///
    /// # Panics
    ///
    /// Panics if the body is currently being updated.
    pub fn borrow(&self) -> Ref<'_, T> {
        self.0.body.borrow()
    }

    /// Exclusive access to the body.
    ///
    /// # Panics
    ///
    /// Panics if the body is currently borrowed.
    pub fn borrow_mut(&self) -> RefMut<'_, T> {
        self.0.body.borrow_mut()
    }

    /// Type-erased handle to the same unit.
    pub fn erase(&self) -> AnyUnit {
        let erased: AnyUnit = self.0.clone();
        erased
    }
}

impl<T: Schedulable> Clone for Unit<T> {
    fn clone(&self) -> Self {
        Self(Rc::clone(&self.0))
    }
}

impl<T: Schedulable> Deref for Unit<T> {
    type Target = UnitCell<T>;

    fn deref(&self) -> &UnitCell<T> {
        &self.0
    }
}

impl<T: Schedulable> fmt::Debug for Unit<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(&*self.0, f)
    }
}

fn short_type_name<T: ?Sized>() -> String {
    let full = type_name::<T>();
    let base = full.split('<').next().unwrap_or(full);
    base.rsplit("::").next().unwrap_or(base).to_lowercase()
}

// ── Members ────────────────────────────────────────────────────────

/// Anything that can be added to or removed from a network: single units,
/// type-erased handles, and arbitrarily nested groups of them.
pub trait Members {
    /// Append every unit in `self` to `out`, flattening groups.
    fn collect_units(&self, out: &mut Vec<AnyUnit>);
}

impl<T: Schedulable> Members for Unit<T> {
    fn collect_units(&self, out: &mut Vec<AnyUnit>) {
        out.push(self.erase());
    }
}

impl Members for AnyUnit {
    fn collect_units(&self, out: &mut Vec<AnyUnit>) {
        out.push(Rc::clone(self));
    }
}

impl<M: Members + ?Sized> Members for &M {
    fn collect_units(&self, out: &mut Vec<AnyUnit>) {
        (**self).collect_units(out);
    }
}

impl<M: Members> Members for [M] {
    fn collect_units(&self, out: &mut Vec<AnyUnit>) {
        for m in self {
            m.collect_units(out);
        }
    }
}

impl<M: Members, const N: usize> Members for [M; N] {
    fn collect_units(&self, out: &mut Vec<AnyUnit>) {
        self.as_slice().collect_units(out);
    }
}

impl<M: Members> Members for Vec<M> {
    fn collect_units(&self, out: &mut Vec<AnyUnit>) {
        self.as_slice().collect_units(out);
    }
}

impl<A: Members, B: Members> Members for (A, B) {
    fn collect_units(&self, out: &mut Vec<AnyUnit>) {
        self.0.collect_units(out);
        self.1.collect_units(out);
    }
}

impl<A: Members, B: Members, C: Members> Members for (A, B, C) {
    fn collect_units(&self, out: &mut Vec<AnyUnit>) {
        self.0.collect_units(out);
        self.1.collect_units(out);
        self.2.collect_units(out);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::Clock;

    struct Nop;

    impl Schedulable for Nop {
        fn update(&mut self, _ctx: &mut UpdateContext<'_>) -> Result<(), UpdateError> {
            Ok(())
        }
    }

    #[test]
    fn schedule_defaults() {
        let mut registry = Registry::new();
        let u = Unit::new_in(Nop, Schedule::default(), &mut registry);
        assert_eq!(u.when(), When::Groups);
        assert_eq!(u.order(), 0);
        assert!(u.is_active());
        assert!(Rc::ptr_eq(u.clock(), &registry.default_clock()));
        assert!(u.name().starts_with("nop#"), "{}", u.name());
    }

    #[test]
    fn schedule_builder_sets_every_field() {
        let mut registry = Registry::new();
        let clock = Clock::shared(1e-3, 2).unwrap();
        let u = Unit::new_in(
            Nop,
            Schedule::default()
                .on(&clock)
                .when(When::Resets)
                .order(-3)
                .active(false)
                .named("probe"),
            &mut registry,
        );
        assert_eq!(u.when(), When::Resets);
        assert_eq!(u.order(), -3);
        assert!(!u.is_active());
        assert_eq!(u.name(), "probe");
        assert!(Rc::ptr_eq(u.clock(), &clock));
        u.set_active(true);
        assert!(u.is_active());
    }

    #[test]
    fn nested_groups_flatten_in_order() {
        let mut registry = Registry::new();
        let a = Unit::new_in(Nop, Schedule::default(), &mut registry);
        let b = Unit::new_in(Nop, Schedule::default(), &mut registry);
        let c = Unit::new_in(Nop, Schedule::default(), &mut registry);
        let mut out = Vec::new();
        (&a, [&b], vec![c.erase()]).collect_units(&mut out);
        let ids: Vec<_> = out.iter().map(|u| u.id()).collect();
        assert_eq!(ids, vec![a.id(), b.id(), c.id()]);
    }

    #[test]
    fn erased_handle_shares_state() {
        let mut registry = Registry::new();
        let u = Unit::new_in(Nop, Schedule::default(), &mut registry);
        let any = u.erase();
        any.set_active(false);
        assert!(!u.is_active());
        assert_eq!(Rc::strong_count(&any), 2);
    }

    #[test]
    fn short_type_name_strips_paths_and_generics() {
        assert_eq!(short_type_name::<Nop>(), "nop");
        assert_eq!(short_type_name::<Vec<u8>>(), "vec");
    }
}
