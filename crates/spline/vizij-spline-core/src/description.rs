//! Persistence boundary.
//!
//! A [`SplineDescription`] is the plain-data form of a spline. Loading goes
//! back through the public mutators, so a hand-written or stale description
//! comes out with tangents resolved and loop parameters validated. Stored
//! tangent widths are taken as already de-regressed: knots are loaded with
//! anti-regression off, so a spline authored with it disabled reloads
//! unchanged.

use log::debug;
use serde::{Deserialize, Serialize};

use crate::config::SplineConfig;
use crate::data::{CurveType, Extrapolation, LoopParams};
use crate::error::{Result, SplineError};
use crate::knot::Knot;
use crate::regression::{AntiRegressionMode, AntiRegressionSelector};
use crate::spline::Spline;
use crate::value::{SplineValue, ValueKind};

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(bound(deserialize = "V: SplineValue"))]
pub struct SplineDescription<V> {
    /// Value type name, e.g. `"double"` or `"vec3"`.
    pub value_type: String,
    #[serde(default)]
    pub curve_type: CurveType,
    #[serde(default)]
    pub pre_extrapolation: Extrapolation<V>,
    #[serde(default)]
    pub post_extrapolation: Extrapolation<V>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub loop_params: Option<LoopParams<V>>,
    #[serde(default)]
    pub config: SplineConfig,
    #[serde(default)]
    pub knots: Vec<Knot<V>>,
}

/// Check a stored value type name against the type being loaded.
fn check_value_type(name: &str, expected: ValueKind) -> Result<()> {
    match ValueKind::from_name(name) {
        None => Err(SplineError::UnsupportedValueType {
            type_name: name.to_string(),
        }),
        Some(kind) if kind != expected => Err(SplineError::TypeMismatch {
            expected: expected.name().to_string(),
            actual: name.to_string(),
        }),
        Some(_) => Ok(()),
    }
}

impl<V: SplineValue> Spline<V> {
    pub fn to_description(&self) -> SplineDescription<V> {
        SplineDescription {
            value_type: V::KIND.name().to_string(),
            curve_type: self.curve_type(),
            pre_extrapolation: self.pre_extrapolation(),
            post_extrapolation: self.post_extrapolation(),
            loop_params: self.inner_loop_params().copied(),
            config: self.config().clone(),
            knots: self.knots().to_vec(),
        }
    }

    /// Rebuild a spline from its description. Fails on the first invalid
    /// piece; nothing partial is returned.
    pub fn from_description(desc: SplineDescription<V>) -> Result<Self> {
        check_value_type(&desc.value_type, V::KIND)?;
        let mut spline = Spline::with_config(desc.config);
        // curve type first so Hermite widths are normalized on insertion
        spline.set_curve_type(desc.curve_type);
        spline.set_pre_extrapolation(desc.pre_extrapolation);
        spline.set_post_extrapolation(desc.post_extrapolation);
        spline.set_inner_loop_params(desc.loop_params)?;
        {
            let _stored = AntiRegressionSelector::new(AntiRegressionMode::None);
            for knot in desc.knots {
                spline.set_knot(knot)?;
            }
        }
        debug!(
            "loaded {} spline with {} knots",
            desc.value_type,
            spline.len()
        );
        Ok(spline)
    }

    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(&self.to_description())?)
    }

    /// Parse a JSON description. The value type is checked before the
    /// knots are decoded, so a description of another type reports
    /// `TypeMismatch` rather than a decoding error.
    pub fn from_json(json: &str) -> Result<Self> {
        let raw: serde_json::Value = serde_json::from_str(json)?;
        let name = raw
            .get("value_type")
            .and_then(|v| v.as_str())
            .ok_or_else(|| SplineError::Serialization {
                reason: "missing value_type".to_string(),
            })?;
        check_value_type(name, V::KIND)?;
        let desc: SplineDescription<V> = serde_json::from_value(raw)?;
        Self::from_description(desc)
    }
}
