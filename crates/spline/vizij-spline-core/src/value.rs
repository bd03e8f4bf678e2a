//! Value types a spline can carry.
//!
//! A spline is generic over its value type. Time is always `f64`; values only
//! need addition, negation and scaling by a real factor, plus per-component
//! access for the few formulas that divide or compare values (ease slopes,
//! tangent conversion in breakdown).

use std::fmt::Debug;
use std::ops::{Add, Neg, Sub};

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use crate::error::SplineError;

#[derive(Copy, Clone, Debug, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum ValueKind {
    Float,
    Double,
    Vec2,
    Vec3,
    Vec4,
}

impl ValueKind {
    /// Stable type name used at the persistence boundary.
    pub fn name(self) -> &'static str {
        match self {
            ValueKind::Float => "float",
            ValueKind::Double => "double",
            ValueKind::Vec2 => "vec2",
            ValueKind::Vec3 => "vec3",
            ValueKind::Vec4 => "vec4",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "float" => Some(ValueKind::Float),
            "double" => Some(ValueKind::Double),
            "vec2" => Some(ValueKind::Vec2),
            "vec3" => Some(ValueKind::Vec3),
            "vec4" => Some(ValueKind::Vec4),
            _ => None,
        }
    }

    /// Number of scalar components.
    pub fn dimension(self) -> usize {
        match self {
            ValueKind::Float | ValueKind::Double => 1,
            ValueKind::Vec2 => 2,
            ValueKind::Vec3 => 3,
            ValueKind::Vec4 => 4,
        }
    }

    /// Kinds with the same number of components convert losslessly enough
    /// (float <-> double); everything else is a mismatch.
    pub fn can_cast_to(self, other: ValueKind) -> bool {
        self.dimension() == other.dimension()
    }
}

/// Arithmetic a spline needs from its values.
pub trait SplineValue:
    Copy
    + Debug
    + Default
    + PartialEq
    + Add<Output = Self>
    + Sub<Output = Self>
    + Neg<Output = Self>
    + Serialize
    + DeserializeOwned
    + Send
    + Sync
    + 'static
{
    const KIND: ValueKind;

    /// Apply `f` to every component.
    fn map<F: Fn(f64) -> f64>(self, f: F) -> Self;

    /// Combine two values component by component.
    fn zip_map<F: Fn(f64, f64) -> f64>(self, other: Self, f: F) -> Self;

    fn components(&self) -> Vec<f64>;

    /// Build a value from exactly `KIND.dimension()` components.
    fn from_components(components: &[f64]) -> Option<Self>;

    #[inline]
    fn zero() -> Self {
        Self::default()
    }

    #[inline]
    fn scale(self, factor: f64) -> Self {
        self.map(|c| c * factor)
    }

    /// Largest absolute component.
    fn max_abs(&self) -> f64 {
        self.components()
            .into_iter()
            .fold(0.0_f64, |acc, c| acc.max(c.abs()))
    }

    fn approx_eq(&self, other: &Self, eps: f64) -> bool {
        (*self - *other).max_abs() <= eps
    }
}

impl SplineValue for f64 {
    const KIND: ValueKind = ValueKind::Double;

    #[inline]
    fn map<F: Fn(f64) -> f64>(self, f: F) -> Self {
        f(self)
    }

    #[inline]
    fn zip_map<F: Fn(f64, f64) -> f64>(self, other: Self, f: F) -> Self {
        f(self, other)
    }

    fn components(&self) -> Vec<f64> {
        vec![*self]
    }

    fn from_components(components: &[f64]) -> Option<Self> {
        match components {
            [c] => Some(*c),
            _ => None,
        }
    }

    #[inline]
    fn max_abs(&self) -> f64 {
        self.abs()
    }
}

impl SplineValue for f32 {
    const KIND: ValueKind = ValueKind::Float;

    #[inline]
    fn map<F: Fn(f64) -> f64>(self, f: F) -> Self {
        f(self as f64) as f32
    }

    #[inline]
    fn zip_map<F: Fn(f64, f64) -> f64>(self, other: Self, f: F) -> Self {
        f(self as f64, other as f64) as f32
    }

    fn components(&self) -> Vec<f64> {
        vec![*self as f64]
    }

    fn from_components(components: &[f64]) -> Option<Self> {
        match components {
            [c] => Some(*c as f32),
            _ => None,
        }
    }

    #[inline]
    fn max_abs(&self) -> f64 {
        (*self as f64).abs()
    }
}

macro_rules! vector_value {
    ($name:ident, $n:literal, $kind:ident) => {
        #[derive(Copy, Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(pub [f64; $n]);

        impl $name {
            pub const fn new(components: [f64; $n]) -> Self {
                Self(components)
            }
        }

        impl From<[f64; $n]> for $name {
            fn from(components: [f64; $n]) -> Self {
                Self(components)
            }
        }

        impl Add for $name {
            type Output = Self;
            fn add(self, rhs: Self) -> Self {
                self.zip_map(rhs, |a, b| a + b)
            }
        }

        impl Sub for $name {
            type Output = Self;
            fn sub(self, rhs: Self) -> Self {
                self.zip_map(rhs, |a, b| a - b)
            }
        }

        impl Neg for $name {
            type Output = Self;
            fn neg(self) -> Self {
                self.map(|c| -c)
            }
        }

        impl SplineValue for $name {
            const KIND: ValueKind = ValueKind::$kind;

            fn map<F: Fn(f64) -> f64>(self, f: F) -> Self {
                let mut out = self.0;
                for c in out.iter_mut() {
                    *c = f(*c);
                }
                Self(out)
            }

            fn zip_map<F: Fn(f64, f64) -> f64>(self, other: Self, f: F) -> Self {
                let mut out = self.0;
                for (c, o) in out.iter_mut().zip(other.0.iter()) {
                    *c = f(*c, *o);
                }
                Self(out)
            }

            fn components(&self) -> Vec<f64> {
                self.0.to_vec()
            }

            fn from_components(components: &[f64]) -> Option<Self> {
                let arr: [f64; $n] = components.try_into().ok()?;
                Some(Self(arr))
            }
        }
    };
}

vector_value!(Vec2, 2, Vec2);
vector_value!(Vec3, 3, Vec3);
vector_value!(Vec4, 4, Vec4);

/// Convert a value between castable kinds.
pub fn cast_value<S: SplineValue, T: SplineValue>(value: S) -> Result<T, SplineError> {
    if !S::KIND.can_cast_to(T::KIND) {
        return Err(SplineError::TypeMismatch {
            expected: T::KIND.name().to_string(),
            actual: S::KIND.name().to_string(),
        });
    }
    T::from_components(&value.components()).ok_or_else(|| SplineError::TypeMismatch {
        expected: T::KIND.name().to_string(),
        actual: S::KIND.name().to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn vector_arithmetic_is_component_wise() {
        let a = Vec3::new([1.0, 2.0, 3.0]);
        let b = Vec3::new([0.5, -1.0, 2.0]);
        assert_eq!(a + b, Vec3::new([1.5, 1.0, 5.0]));
        assert_eq!(a - b, Vec3::new([0.5, 3.0, 1.0]));
        assert_eq!(a.scale(2.0), Vec3::new([2.0, 4.0, 6.0]));
        assert_eq!(-a, Vec3::new([-1.0, -2.0, -3.0]));
        assert_eq!(b.max_abs(), 2.0);
    }

    #[test]
    fn cast_between_scalars_and_reject_dimension_change() {
        let v: f32 = cast_value(2.5_f64).unwrap();
        assert_eq!(v, 2.5_f32);
        let err = cast_value::<f64, Vec2>(1.0).unwrap_err();
        assert!(matches!(err, SplineError::TypeMismatch { .. }));
    }

    #[test]
    fn kind_names_round_trip() {
        for kind in [
            ValueKind::Float,
            ValueKind::Double,
            ValueKind::Vec2,
            ValueKind::Vec3,
            ValueKind::Vec4,
        ] {
            assert_eq!(ValueKind::from_name(kind.name()), Some(kind));
        }
        assert_eq!(ValueKind::from_name("quat"), None);
    }
}
