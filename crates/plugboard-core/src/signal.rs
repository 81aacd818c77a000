//! Typed, time-stamped, lazily recomputed signals
//!
//! A [`Signal`] is a cheap cloneable handle over one cell. The cell holds
//! either a constant value, a recompute callback, or a plug onto another
//! signal's output. Reads are pull-based and memoized by tick: a computed
//! signal runs its callback at most once per requested tick, and branches
//! of the graph nobody pulls are never evaluated.

use std::cell::{Cell, RefCell};
use std::fmt;
use std::rc::{Rc, Weak};

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::time::Tick;
use crate::value::{Value, ValueType};

/// Whether a signal is an input or an output of its entity
///
/// Wiring metadata only: the plug protocol does not enforce direction, the
/// one-line display and the graph export report it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SignalDirection {
    In,
    Out,
}

impl fmt::Display for SignalDirection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SignalDirection::In => write!(f, "in"),
            SignalDirection::Out => write!(f, "out"),
        }
    }
}

/// Recompute callback: derives the value for a requested tick
pub type Callback = Rc<dyn Fn(Tick) -> Result<Value>>;

/// Value source of a signal
enum SignalKind {
    /// Holds a stored value; never advances its own time
    Constant,
    /// Derives its value through a callback, memoized by tick
    Computed(Callback),
    /// Delegates to another signal's output; non-owning edge
    Plugged(Weak<RefCell<SignalCell>>),
}

impl SignalKind {
    fn name(&self) -> &'static str {
        match self {
            SignalKind::Constant => "constant",
            SignalKind::Computed(_) => "computed",
            SignalKind::Plugged(_) => "plugged",
        }
    }
}

struct SignalCell {
    entity: String,
    name: String,
    direction: SignalDirection,
    ty: ValueType,
    value: Option<Value>,
    time: Tick,
    kind: SignalKind,
    destroyed: bool,
}

impl SignalCell {
    fn full_name(&self) -> String {
        format!("{}.{}", self.entity, self.name)
    }
}

/// Maximum pull depth before a traversal is declared cyclic
///
/// Control graphs are shallow; anything deeper than this is a self-plug or
/// a mutually-plugged chain and must fail instead of overflowing the stack.
const MAX_EVAL_DEPTH: usize = 256;

thread_local! {
    static EVAL_DEPTH: Cell<usize> = const { Cell::new(0) };
}

struct DepthGuard;

impl DepthGuard {
    fn enter(signal: &str) -> Result<DepthGuard> {
        EVAL_DEPTH.with(|depth| {
            if depth.get() >= MAX_EVAL_DEPTH {
                return Err(Error::GraphCycleDetected(signal.to_string()));
            }
            depth.set(depth.get() + 1);
            Ok(DepthGuard)
        })
    }
}

impl Drop for DepthGuard {
    fn drop(&mut self) {
        EVAL_DEPTH.with(|depth| depth.set(depth.get() - 1));
    }
}

/// Outcome of inspecting a cell under a short-lived borrow
enum Pull {
    Cached(Value),
    Recompute(Callback),
    Delegate(Rc<RefCell<SignalCell>>),
}

/// A typed, named, time-stamped signal handle
///
/// Handles are reference-counted clones over one shared cell; the owning
/// entity keeps one, plugs keep weak ones, callbacks capture as many as
/// they read.
#[derive(Clone)]
pub struct Signal {
    cell: Rc<RefCell<SignalCell>>,
}

impl Signal {
    /// Create a signal owned by the named entity
    ///
    /// Fresh signals hold no value: reading one before `set`, a callback
    /// bind or a plug fails with [`Error::SignalNotInitialized`].
    pub fn new(
        entity: impl Into<String>,
        name: impl Into<String>,
        direction: SignalDirection,
        ty: ValueType,
    ) -> Self {
        Self {
            cell: Rc::new(RefCell::new(SignalCell {
                entity: entity.into(),
                name: name.into(),
                direction,
                ty,
                value: None,
                time: 0,
                kind: SignalKind::Constant,
                destroyed: false,
            })),
        }
    }

    /// Get the signal name (unique within the owning entity)
    pub fn name(&self) -> String {
        self.cell.borrow().name.clone()
    }

    /// Get the owning entity's instance name
    pub fn entity(&self) -> String {
        self.cell.borrow().entity.clone()
    }

    /// Get the `entity.signal` qualified name
    pub fn full_name(&self) -> String {
        self.cell.borrow().full_name()
    }

    /// Get the wiring direction
    pub fn direction(&self) -> SignalDirection {
        self.cell.borrow().direction
    }

    /// Get the fixed type tag
    pub fn value_type(&self) -> ValueType {
        self.cell.borrow().ty
    }

    /// Get the tick of the last computation
    pub fn time(&self) -> Tick {
        self.cell.borrow().time
    }

    /// Check whether this signal currently delegates to an upstream
    pub fn is_plugged(&self) -> bool {
        matches!(self.cell.borrow().kind, SignalKind::Plugged(_))
    }

    /// Get the upstream signal if plugged and still alive
    pub fn upstream(&self) -> Option<Signal> {
        match &self.cell.borrow().kind {
            SignalKind::Plugged(weak) => weak.upgrade().map(|cell| Signal { cell }),
            _ => None,
        }
    }

    /// Store a constant value
    ///
    /// Clears any plug first; the signal reverts to `Constant`. The value
    /// must carry the signal's declared type (an `Int` fits a scalar
    /// signal). No time semantics: the stamp of the last computation stays.
    pub fn set(&self, value: impl Into<Value>) -> Result<()> {
        let value = value.into();
        let mut cell = self.cell.borrow_mut();
        let got = value.value_type();
        let coerced = value.coerce_to(cell.ty).ok_or_else(|| Error::SignalTypeMismatch {
            src: "assigned value".to_string(),
            got,
            target: cell.full_name(),
            expected: cell.ty,
        })?;
        cell.kind = SignalKind::Constant;
        cell.value = Some(coerced);
        Ok(())
    }

    /// Bind a recompute callback
    ///
    /// Clears any plug and any stale cached value; the next read runs the
    /// callback.
    pub fn set_callback(&self, callback: impl Fn(Tick) -> Result<Value> + 'static) {
        let mut cell = self.cell.borrow_mut();
        cell.kind = SignalKind::Computed(Rc::new(callback));
        cell.value = None;
    }

    /// Pull the value for the requested tick
    ///
    /// Constant signals return their stored value unconditionally. Computed
    /// signals recompute only when nothing is cached or `time` is newer
    /// than the cached stamp; a request at or before the cached stamp
    /// returns the cache without running the callback. Plugged signals
    /// delegate to their upstream. Cycles anywhere along the pull fail with
    /// [`Error::GraphCycleDetected`] before the stack can overflow.
    pub fn get(&self, time: Tick) -> Result<Value> {
        let full_name = self.cell.borrow().full_name();
        let _guard = DepthGuard::enter(&full_name)?;

        let pull = {
            let cell = self.cell.borrow();
            if cell.destroyed {
                return Err(Error::UpstreamEntityDestroyed(cell.full_name()));
            }
            match &cell.kind {
                SignalKind::Constant => match &cell.value {
                    Some(value) => Pull::Cached(value.clone()),
                    None => return Err(Error::SignalNotInitialized(cell.full_name())),
                },
                SignalKind::Computed(callback) => match &cell.value {
                    Some(value) if time <= cell.time => Pull::Cached(value.clone()),
                    _ => Pull::Recompute(Rc::clone(callback)),
                },
                SignalKind::Plugged(weak) => match weak.upgrade() {
                    Some(upstream) => Pull::Delegate(upstream),
                    None => return Err(Error::UpstreamEntityDestroyed(cell.full_name())),
                },
            }
        };

        match pull {
            Pull::Cached(value) => Ok(value),
            Pull::Recompute(callback) => {
                // The borrow is released: the callback may pull other
                // signals, including (cyclically) this one.
                let value = callback(time)?;
                let got = value.value_type();
                let declared = self.cell.borrow().ty;
                let value = value.coerce_to(declared).ok_or_else(|| Error::SignalTypeMismatch {
                    src: format!("{} callback result", full_name),
                    got,
                    target: full_name.clone(),
                    expected: declared,
                })?;
                let mut cell = self.cell.borrow_mut();
                cell.value = Some(value.clone());
                if time > cell.time {
                    cell.time = time;
                }
                Ok(value)
            }
            Pull::Delegate(upstream) => Signal { cell: upstream }.get(time),
        }
    }

    /// Pull for the side effect only, discarding the value
    ///
    /// The driver loop uses this to push time forward on output signals it
    /// does not itself consume.
    pub fn recompute(&self, time: Tick) -> Result<()> {
        self.get(time).map(|_| ())
    }

    /// One-line diagnostic summary: `name (direction, type): value@time`
    pub fn summary(&self) -> String {
        let cell = self.cell.borrow();
        let value = match &cell.value {
            Some(v) => v.to_string(),
            None => "-".to_string(),
        };
        format!(
            "{} ({}, {}): {}@{}",
            cell.name, cell.direction, cell.ty, value, cell.time
        )
    }

    /// Mark this signal as belonging to a destroyed entity
    pub(crate) fn mark_destroyed(&self) {
        self.cell.borrow_mut().destroyed = true;
    }
}

impl fmt::Debug for Signal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let cell = self.cell.borrow();
        f.debug_struct("Signal")
            .field("name", &cell.full_name())
            .field("direction", &cell.direction)
            .field("type", &cell.ty)
            .field("kind", &cell.kind.name())
            .field("time", &cell.time)
            .finish()
    }
}

/// Plug an output signal into an input signal
///
/// Both sides must carry the same type tag; a mismatch fails with
/// [`Error::SignalTypeMismatch`] naming both signals and both types, and
/// mutates nothing. Re-plugging the identical pair is a no-op; plugging a
/// new output onto an already-plugged input replaces the previous edge.
/// Cycles are not checked here: they surface as
/// [`Error::GraphCycleDetected`] when the input is read.
pub fn plug(output: &Signal, input: &Signal) -> Result<()> {
    {
        let out_cell = output.cell.borrow();
        let in_cell = input.cell.borrow();
        if out_cell.ty != in_cell.ty {
            return Err(Error::SignalTypeMismatch {
                src: out_cell.full_name(),
                got: out_cell.ty,
                target: in_cell.full_name(),
                expected: in_cell.ty,
            });
        }
        if let SignalKind::Plugged(existing) = &in_cell.kind {
            if existing.ptr_eq(&Rc::downgrade(&output.cell)) {
                return Ok(());
            }
        }
    }
    input.cell.borrow_mut().kind = SignalKind::Plugged(Rc::downgrade(&output.cell));
    Ok(())
}

/// Remove the plug of an input signal
///
/// Reverts the signal to `Constant` with its last stored value, if any.
/// No-op on a signal that is not plugged.
pub fn unplug(input: &Signal) {
    let mut cell = input.cell.borrow_mut();
    if matches!(cell.kind, SignalKind::Plugged(_)) {
        cell.kind = SignalKind::Constant;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;

    fn scalar(entity: &str, name: &str, direction: SignalDirection) -> Signal {
        Signal::new(entity, name, direction, ValueType::Scalar)
    }

    #[test]
    fn test_fresh_signal_is_uninitialized() {
        let s = scalar("a", "out", SignalDirection::Out);
        assert_eq!(
            s.get(0),
            Err(Error::SignalNotInitialized("a.out".to_string()))
        );
    }

    #[test]
    fn test_constant_value() {
        let s = scalar("a", "out", SignalDirection::Out);
        s.set(2.5).unwrap();
        assert_eq!(s.get(0).unwrap(), Value::Scalar(2.5));
        assert_eq!(s.get(100).unwrap(), Value::Scalar(2.5));
        assert_eq!(s.time(), 0);
    }

    #[test]
    fn test_set_rejects_wrong_type() {
        let s = scalar("a", "out", SignalDirection::Out);
        let err = s.set(true).unwrap_err();
        assert!(matches!(err, Error::SignalTypeMismatch { .. }));
        // an int fits a scalar signal
        s.set(3i64).unwrap();
        assert_eq!(s.get(0).unwrap(), Value::Scalar(3.0));
    }

    #[test]
    fn test_memoization_one_recompute_per_tick() {
        let s = scalar("a", "out", SignalDirection::Out);
        let calls = Rc::new(Cell::new(0usize));
        let counter = Rc::clone(&calls);
        s.set_callback(move |t| {
            counter.set(counter.get() + 1);
            Ok(Value::Scalar(t as f64))
        });

        assert_eq!(s.get(1).unwrap(), Value::Scalar(1.0));
        assert_eq!(s.get(1).unwrap(), Value::Scalar(1.0));
        assert_eq!(calls.get(), 1);

        assert_eq!(s.get(2).unwrap(), Value::Scalar(2.0));
        assert_eq!(calls.get(), 2);
        assert_eq!(s.time(), 2);

        // a request before the cached stamp returns the cache untouched
        assert_eq!(s.get(1).unwrap(), Value::Scalar(2.0));
        assert_eq!(calls.get(), 2);
    }

    #[test]
    fn test_new_callback_drops_stale_cache() {
        let s = scalar("a", "out", SignalDirection::Out);
        s.set_callback(|_| Ok(Value::Scalar(1.0)));
        assert_eq!(s.get(5).unwrap(), Value::Scalar(1.0));

        s.set_callback(|_| Ok(Value::Scalar(2.0)));
        assert_eq!(s.get(5).unwrap(), Value::Scalar(2.0));
    }

    #[test]
    fn test_callback_result_is_type_checked() {
        let s = scalar("a", "out", SignalDirection::Out);
        s.set_callback(|_| Ok(Value::Bool(true)));
        assert!(matches!(
            s.get(0),
            Err(Error::SignalTypeMismatch { .. })
        ));

        // int results are widened to the declared scalar
        s.set_callback(|t| Ok(Value::Int(t as i64)));
        assert_eq!(s.get(3).unwrap(), Value::Scalar(3.0));
    }

    #[test]
    fn test_plug_delegates_to_upstream() {
        let out = scalar("a", "out", SignalDirection::Out);
        let input = scalar("b", "in", SignalDirection::In);
        out.set(7.5).unwrap();
        plug(&out, &input).unwrap();

        assert!(input.is_plugged());
        assert_eq!(input.get(0).unwrap(), out.get(0).unwrap());
        assert_eq!(input.upstream().unwrap().full_name(), "a.out");
    }

    #[test]
    fn test_plug_type_mismatch_mutates_nothing() {
        let out = Signal::new("a", "out", SignalDirection::Out, ValueType::Vector);
        let input = scalar("b", "in", SignalDirection::In);
        input.set(1.0).unwrap();

        let err = plug(&out, &input).unwrap_err();
        assert_eq!(
            err,
            Error::SignalTypeMismatch {
                src: "a.out".to_string(),
                got: ValueType::Vector,
                target: "b.in".to_string(),
                expected: ValueType::Scalar,
            }
        );
        assert!(!input.is_plugged());
        assert_eq!(input.get(0).unwrap(), Value::Scalar(1.0));
    }

    #[test]
    fn test_set_on_plugged_signal_unplugs() {
        let out = scalar("a", "out", SignalDirection::Out);
        let input = scalar("b", "in", SignalDirection::In);
        out.set(1.0).unwrap();
        plug(&out, &input).unwrap();
        assert_eq!(input.get(0).unwrap(), Value::Scalar(1.0));

        input.set(5.0).unwrap();
        out.set(9.0).unwrap();
        assert!(!input.is_plugged());
        assert_eq!(input.get(0).unwrap(), Value::Scalar(5.0));
    }

    #[test]
    fn test_replug_replaces_previous_edge() {
        let first = scalar("a", "out", SignalDirection::Out);
        let second = scalar("b", "out", SignalDirection::Out);
        let input = scalar("c", "in", SignalDirection::In);
        first.set(1.0).unwrap();
        second.set(2.0).unwrap();

        plug(&first, &input).unwrap();
        plug(&second, &input).unwrap();
        assert_eq!(input.get(0).unwrap(), Value::Scalar(2.0));

        // identical pair is a no-op
        plug(&second, &input).unwrap();
        assert_eq!(input.get(0).unwrap(), Value::Scalar(2.0));
    }

    #[test]
    fn test_unplug_keeps_last_stored_value() {
        let out = scalar("a", "out", SignalDirection::Out);
        let input = scalar("b", "in", SignalDirection::In);
        input.set(1.0).unwrap();
        out.set(7.0).unwrap();
        plug(&out, &input).unwrap();
        assert_eq!(input.get(0).unwrap(), Value::Scalar(7.0));

        unplug(&input);
        assert!(!input.is_plugged());
        assert_eq!(input.get(0).unwrap(), Value::Scalar(1.0));
    }

    #[test]
    fn test_self_plug_is_a_cycle_on_read() {
        let s = scalar("a", "out", SignalDirection::Out);
        plug(&s, &s).unwrap();
        assert!(matches!(s.get(0), Err(Error::GraphCycleDetected(_))));
        // the guard unwinds cleanly; a repaired signal reads again
        unplug(&s);
        s.set(1.0).unwrap();
        assert_eq!(s.get(0).unwrap(), Value::Scalar(1.0));
    }

    #[test]
    fn test_mutual_plug_is_a_cycle_on_read() {
        let a = scalar("a", "out", SignalDirection::Out);
        let b = scalar("b", "out", SignalDirection::Out);
        plug(&a, &b).unwrap();
        plug(&b, &a).unwrap();
        assert!(matches!(a.get(0), Err(Error::GraphCycleDetected(_))));
    }

    #[test]
    fn test_cycle_through_callbacks_is_detected() {
        let a = scalar("a", "out", SignalDirection::Out);
        let b = scalar("b", "out", SignalDirection::Out);
        let b_handle = b.clone();
        a.set_callback(move |t| b_handle.get(t));
        let a_handle = a.clone();
        b.set_callback(move |t| a_handle.get(t));
        assert!(matches!(a.get(0), Err(Error::GraphCycleDetected(_))));
    }

    #[test]
    fn test_chain_pull_recomputes_dependencies() {
        let source = scalar("a", "out", SignalDirection::Out);
        source.set_callback(|t| Ok(Value::Scalar(t as f64)));

        let input = scalar("b", "in", SignalDirection::In);
        plug(&source, &input).unwrap();

        let doubled = scalar("b", "out", SignalDirection::Out);
        let tap = input.clone();
        doubled.set_callback(move |t| {
            let x = tap.get(t)?.as_scalar().unwrap_or_default();
            Ok(Value::Scalar(2.0 * x))
        });

        assert_eq!(doubled.get(3).unwrap(), Value::Scalar(6.0));
        assert_eq!(source.time(), 3);
    }

    #[test]
    fn test_summary_format() {
        let s = scalar("a", "pos", SignalDirection::Out);
        s.set(1.5).unwrap();
        assert_eq!(s.summary(), "pos (out, scalar): 1.5@0");

        let fresh = Signal::new("a", "vel", SignalDirection::In, ValueType::Vector);
        assert_eq!(fresh.summary(), "vel (in, vector): -@0");
    }
}
