//! Typed components attached to compounds and formula candidates.
//!
//! Every owner (a compound or a formula candidate) carries an
//! [`AnnotationSet`]: a partial map from [`ComponentKind`] to exactly one
//! [`Component`] value. A kind missing from the set means *not loaded*, not
//! *absent upstream*; callers request kinds explicitly.
//!
//! Typed access goes through [`ComponentPayload`], the single place where a
//! `Component` is narrowed to its payload type.

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::compound::{Ms2Experiment, ProjectSpaceConfig};
use crate::score::FormulaScoring;
use crate::tree::{FragmentationTree, LipidSpecies};

/// The closed set of component kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ComponentKind {
    /// Raw spectrum data of a compound.
    Experiment,
    /// Per-compound tool configuration.
    Config,
    /// Fragmentation tree of a formula candidate.
    FragmentationTree,
    /// Score set of a formula candidate.
    FormulaScoring,
    /// Lipid classification of a formula candidate.
    LipidSpecies,
}

impl ComponentKind {
    /// Every component kind.
    pub const ALL: [ComponentKind; 5] = [
        Self::Experiment,
        Self::Config,
        Self::FragmentationTree,
        Self::FormulaScoring,
        Self::LipidSpecies,
    ];
}

impl fmt::Display for ComponentKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Experiment => "Experiment",
            Self::Config => "Config",
            Self::FragmentationTree => "FragmentationTree",
            Self::FormulaScoring => "FormulaScoring",
            Self::LipidSpecies => "LipidSpecies",
        };
        f.write_str(name)
    }
}

/// A component value, tagged by its kind.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "value", rename_all = "snake_case")]
pub enum Component {
    /// Raw MS/MS input.
    Experiment(Ms2Experiment),
    /// Recorded tool configuration.
    Config(ProjectSpaceConfig),
    /// Fragmentation tree metrics.
    FragmentationTree(FragmentationTree),
    /// Score set.
    FormulaScoring(FormulaScoring),
    /// Lipid class annotation.
    LipidSpecies(LipidSpecies),
}

impl Component {
    /// The kind this value is stored under.
    #[must_use]
    pub const fn kind(&self) -> ComponentKind {
        match self {
            Self::Experiment(_) => ComponentKind::Experiment,
            Self::Config(_) => ComponentKind::Config,
            Self::FragmentationTree(_) => ComponentKind::FragmentationTree,
            Self::FormulaScoring(_) => ComponentKind::FormulaScoring,
            Self::LipidSpecies(_) => ComponentKind::LipidSpecies,
        }
    }
}

/// Payload types that can be stored as a [`Component`].
pub trait ComponentPayload: Sized {
    /// The kind this payload is stored under.
    const KIND: ComponentKind;

    /// Narrows a component to this payload, if the variant matches.
    fn from_component(component: &Component) -> Option<&Self>;

    /// Wraps this payload into its component variant.
    fn into_component(self) -> Component;
}

macro_rules! component_payload {
    ($ty:ty, $variant:ident) => {
        impl ComponentPayload for $ty {
            const KIND: ComponentKind = ComponentKind::$variant;

            fn from_component(component: &Component) -> Option<&Self> {
                match component {
                    Component::$variant(v) => Some(v),
                    _ => None,
                }
            }

            fn into_component(self) -> Component {
                Component::$variant(self)
            }
        }

        impl From<$ty> for Component {
            fn from(value: $ty) -> Self {
                value.into_component()
            }
        }
    };
}

component_payload!(Ms2Experiment, Experiment);
component_payload!(ProjectSpaceConfig, Config);
component_payload!(FragmentationTree, FragmentationTree);
component_payload!(FormulaScoring, FormulaScoring);
component_payload!(LipidSpecies, LipidSpecies);

/// Removes duplicates from a kind list while keeping first-seen order.
#[must_use]
pub fn distinct_kinds(kinds: &[ComponentKind]) -> Vec<ComponentKind> {
    let mut out = Vec::with_capacity(kinds.len());
    for kind in kinds {
        if !out.contains(kind) {
            out.push(*kind);
        }
    }
    out
}

/// Partial, typed component storage for one owner.
///
/// Not synchronized; the owning cache serializes access.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AnnotationSet {
    components: BTreeMap<ComponentKind, Component>,
}

impl AnnotationSet {
    /// An empty set.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// True when `kind` is loaded.
    #[must_use]
    pub fn has(&self, kind: ComponentKind) -> bool {
        self.components.contains_key(&kind)
    }

    /// The loaded component of `kind`.
    #[must_use]
    pub fn get(&self, kind: ComponentKind) -> Option<&Component> {
        self.components.get(&kind)
    }

    /// Typed lookup.
    #[must_use]
    pub fn get_as<T: ComponentPayload>(&self) -> Option<&T> {
        self.components.get(&T::KIND).and_then(T::from_component)
    }

    /// Stores `component` under its own kind, replacing any previous value.
    pub fn set(&mut self, component: impl Into<Component>) {
        let component = component.into();
        self.components.insert(component.kind(), component);
    }

    /// Unloads `kind`, returning its value.
    pub fn remove(&mut self, kind: ComponentKind) -> Option<Component> {
        self.components.remove(&kind)
    }

    /// Unloads every kind.
    pub fn clear(&mut self) {
        self.components.clear();
    }

    /// Copies the listed kinds from `other`.
    ///
    /// Kinds not listed are left untouched. A listed kind that `other` does
    /// not hold is left untouched as well.
    pub fn merge_from(&mut self, other: &AnnotationSet, kinds: &[ComponentKind]) {
        for kind in kinds {
            if let Some(component) = other.components.get(kind) {
                self.components.insert(*kind, component.clone());
            }
        }
    }

    /// Listed kinds not present in this set, without duplicates.
    #[must_use]
    pub fn missing(&self, kinds: &[ComponentKind]) -> Vec<ComponentKind> {
        distinct_kinds(kinds)
            .into_iter()
            .filter(|k| !self.has(*k))
            .collect()
    }

    /// A copy holding only the listed kinds.
    #[must_use]
    pub fn restricted_to(&self, kinds: &[ComponentKind]) -> AnnotationSet {
        let mut out = AnnotationSet::new();
        out.merge_from(self, kinds);
        out
    }

    /// Loaded kinds.
    pub fn kinds(&self) -> impl Iterator<Item = ComponentKind> + '_ {
        self.components.keys().copied()
    }

    /// Number of loaded kinds.
    #[must_use]
    pub fn len(&self) -> usize {
        self.components.len()
    }

    /// True when nothing is loaded.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.components.is_empty()
    }
}
