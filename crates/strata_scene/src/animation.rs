//! # Animators and Constraints
//!
//! The update tick's Animate and ApplyConstraints states operate on the
//! records defined here. The interpolation *math* is an external
//! collaborator: the tick only looks up a pure interpolation function by
//! value type and applies its result.
//!
//! A fault in one animator or constraint is isolated to its node - logged
//! and skipped, never allowed to stall the frame for everyone else.

use std::collections::HashMap;

use thiserror::Error;

use strata_core::math::Vec3;
use strata_core::sync::UpdateBufferIndex;

use crate::node::{Node, NodeId};
use crate::property::{PropertyKind, ResetterHandle};

/// Identity of a playing animation, reported back in completion
/// notifications.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct AnimationId(pub u64);

/// A property value in transit through the animation system.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum PropertyValue {
    /// Three-component vector (position, scale).
    Vector3(Vec3),
    /// Scalar (opacity).
    Float(f32),
}

impl PropertyValue {
    /// The value's type, used for interpolator lookup.
    #[must_use]
    pub fn kind(&self) -> ValueKind {
        match self {
            Self::Vector3(_) => ValueKind::Vector3,
            Self::Float(_) => ValueKind::Float,
        }
    }
}

/// Type tag of a [`PropertyValue`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ValueKind {
    /// `PropertyValue::Vector3`
    Vector3,
    /// `PropertyValue::Float`
    Float,
}

/// Per-node runtime faults isolated by the update tick.
#[derive(Debug, Error)]
pub enum SceneError {
    /// No interpolation function registered for the value type.
    #[error("no interpolator registered for {0:?}")]
    MissingInterpolator(ValueKind),
    /// Animator endpoints disagree on value type.
    #[error("animator endpoints have mismatched value types")]
    MismatchedEndpoints,
    /// A value of the wrong type was applied to a property.
    #[error("property {kind:?} cannot take a {value:?} value")]
    WrongValueType {
        /// Target property.
        kind: PropertyKind,
        /// Offending value type.
        value: ValueKind,
    },
    /// A constraint reported a failure for its node.
    #[error("constraint failed: {0}")]
    Constraint(String),
}

/// Pure interpolation function: `f(from, to, t)` with `t` in `[0, 1]`.
///
/// Both endpoints are guaranteed to share the kind the function was
/// registered under.
pub type Interpolator = fn(PropertyValue, PropertyValue, f32) -> PropertyValue;

/// Lookup table of interpolation functions by value type.
pub struct InterpolatorRegistry {
    functions: HashMap<ValueKind, Interpolator>,
}

impl InterpolatorRegistry {
    /// Creates a registry with linear interpolators for every built-in
    /// value type.
    #[must_use]
    pub fn with_defaults() -> Self {
        let mut registry = Self {
            functions: HashMap::new(),
        };
        registry.register(ValueKind::Vector3, |from, to, t| {
            match (from, to) {
                (PropertyValue::Vector3(a), PropertyValue::Vector3(b)) => {
                    PropertyValue::Vector3(a.lerp(b, t))
                }
                // Kinds are checked before dispatch.
                _ => from,
            }
        });
        registry.register(ValueKind::Float, |from, to, t| match (from, to) {
            (PropertyValue::Float(a), PropertyValue::Float(b)) => {
                PropertyValue::Float(a + (b - a) * t)
            }
            _ => from,
        });
        registry
    }

    /// Creates an empty registry (for collaborators supplying their own
    /// math).
    #[must_use]
    pub fn empty() -> Self {
        Self {
            functions: HashMap::new(),
        }
    }

    /// Registers (or replaces) the interpolator for a value type.
    pub fn register(&mut self, kind: ValueKind, function: Interpolator) {
        self.functions.insert(kind, function);
    }

    /// Looks up the interpolator for a value type.
    #[must_use]
    pub fn get(&self, kind: ValueKind) -> Option<Interpolator> {
        self.functions.get(&kind).copied()
    }
}

/// Lifecycle of an animator record.
#[derive(Debug, PartialEq, Eq)]
pub(crate) enum AnimatorState {
    /// Advancing every tick.
    Playing,
    /// Done (or faulted); kept alive `age` more ticks so the resetter
    /// covers both buffer slots before it unregisters.
    Retiring {
        /// Ticks since retirement began.
        age: u8,
    },
}

/// One playing animation over one property of one node.
pub struct Animator {
    /// Animation identity for completion notifications.
    pub id: AnimationId,
    /// Target node.
    pub node: NodeId,
    /// Target property.
    pub property: PropertyKind,
    pub(crate) from: PropertyValue,
    pub(crate) to: PropertyValue,
    pub(crate) duration_frames: u32,
    pub(crate) elapsed_frames: u32,
    pub(crate) state: AnimatorState,
    // Keeps the property registered for per-frame resets; released when the
    // animator fully retires.
    pub(crate) _resetter: ResetterHandle,
}

impl Animator {
    /// Whether the animator is still advancing.
    #[must_use]
    pub fn is_playing(&self) -> bool {
        self.state == AnimatorState::Playing
    }

    /// Progress in `[0, 1]`.
    #[must_use]
    pub fn progress(&self) -> f32 {
        if self.duration_frames == 0 {
            return 1.0;
        }
        (self.elapsed_frames as f32 / self.duration_frames as f32).min(1.0)
    }
}

/// Constraint evaluation callback.
///
/// Receives exclusive access to its target node for the current update
/// slot; errors are logged and isolated to that node.
pub type ConstraintFn =
    Box<dyn FnMut(&mut Node, UpdateBufferIndex) -> Result<(), SceneError> + Send>;

/// One registered constraint on one node.
pub struct Constraint {
    /// Target node.
    pub node: NodeId,
    pub(crate) apply: ConstraintFn,
}

impl Constraint {
    /// Creates a constraint over `node`.
    #[must_use]
    pub fn new(node: NodeId, apply: ConstraintFn) -> Self {
        Self { node, apply }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_interpolators() {
        let registry = InterpolatorRegistry::with_defaults();

        let lerp = registry.get(ValueKind::Float).unwrap();
        let mid = lerp(PropertyValue::Float(0.0), PropertyValue::Float(10.0), 0.5);
        assert_eq!(mid, PropertyValue::Float(5.0));

        let lerp3 = registry.get(ValueKind::Vector3).unwrap();
        let mid = lerp3(
            PropertyValue::Vector3(Vec3::ZERO),
            PropertyValue::Vector3(Vec3::new(2.0, 4.0, 6.0)),
            0.5,
        );
        assert_eq!(mid, PropertyValue::Vector3(Vec3::new(1.0, 2.0, 3.0)));
    }

    #[test]
    fn test_empty_registry_has_no_functions() {
        let registry = InterpolatorRegistry::empty();
        assert!(registry.get(ValueKind::Float).is_none());
        assert!(registry.get(ValueKind::Vector3).is_none());
    }
}
