use std::collections::BTreeMap;

use crate::animation::ease::{Ease, EaseId};
use crate::foundation::error::{SlidecastError, SlidecastResult};

/// Explicit id -> curve lookup table for persisted easing selections.
///
/// Construct one with [`EasingRegistry::builtin`] and hand it to whatever needs to resolve ids;
/// there is no process-wide instance.
#[derive(Clone, Debug)]
pub struct EasingRegistry {
    by_id: BTreeMap<EaseId, Ease>,
}

impl EasingRegistry {
    /// An empty registry.
    pub fn empty() -> Self {
        Self {
            by_id: BTreeMap::new(),
        }
    }

    /// Registry holding the nine built-in families under their stable ids.
    pub fn builtin() -> Self {
        let mut reg = Self::empty();
        for ease in [
            Ease::Linear,
            Ease::Quadratic,
            Ease::Cubic,
            Ease::Quartic,
            Ease::Quintic,
            Ease::Sine,
            Ease::Exponential,
            Ease::Circular,
            Ease::ELASTIC,
        ] {
            reg.by_id.insert(ease.id(), ease);
        }
        reg
    }

    /// Resolve an id. Unknown ids are `None`; the caller picks the fallback.
    pub fn get(&self, id: EaseId) -> Option<Ease> {
        self.by_id.get(&id).copied()
    }

    /// Resolve an id, substituting `default` when it is unknown.
    pub fn get_or(&self, id: EaseId, default: Ease) -> Ease {
        self.get(id).unwrap_or(default)
    }

    /// Resolve a family name (case-insensitive), e.g. `"cubic"`. `"sinusoidal"` names the sine
    /// family.
    pub fn by_name(&self, name: &str) -> Option<Ease> {
        let name = name.trim().to_ascii_lowercase();
        let name = match name.as_str() {
            "sinusoidal" => "sine",
            other => other,
        };
        self.by_id.values().copied().find(|e| e.name() == name)
    }

    /// Add a curve under `id`. Ids are never silently remapped.
    pub fn register(&mut self, id: EaseId, ease: Ease) -> SlidecastResult<()> {
        if self.by_id.contains_key(&id) {
            return Err(SlidecastError::animation(format!(
                "easing id {} is already registered",
                id.0
            )));
        }
        if let Ease::Elastic {
            amplitude,
            oscillations,
        } = ease
            && !(amplitude.is_finite() && oscillations.is_finite())
        {
            return Err(SlidecastError::animation(format!(
                "elastic amplitude {amplitude} and oscillations {oscillations} must be finite"
            )));
        }
        self.by_id.insert(id, ease);
        Ok(())
    }

    /// Entries in ascending id order.
    pub fn iter(&self) -> impl Iterator<Item = (EaseId, Ease)> + '_ {
        self.by_id.iter().map(|(&id, &e)| (id, e))
    }

    /// Number of registered curves.
    pub fn len(&self) -> usize {
        self.by_id.len()
    }

    /// `true` when nothing is registered.
    pub fn is_empty(&self) -> bool {
        self.by_id.is_empty()
    }
}

impl Default for EasingRegistry {
    fn default() -> Self {
        Self::builtin()
    }
}

#[cfg(test)]
#[path = "../../tests/unit/animation/registry.rs"]
mod tests;
