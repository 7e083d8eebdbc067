//! The species catalog.
//!
//! Quota ledgers store one balance per species, indexed densely, so a
//! species is identified by its position in the catalog rather than a
//! UUID. [`SpeciesId`] is a thin index newtype; [`SpeciesCatalog`] maps
//! indices to descriptors and is fixed for the lifetime of a run.

use serde::{Deserialize, Serialize};

/// Dense index identifying a species within the catalog.
///
/// Ledger arrays (`yearly_allowance`, `remaining`) are indexed by this
/// value, so it must stay in `0..catalog.len()`.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, Default,
)]
pub struct SpeciesId(pub usize);

impl SpeciesId {
    /// Return the raw catalog index.
    pub const fn index(self) -> usize {
        self.0
    }
}

impl core::fmt::Display for SpeciesId {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(f, "species#{}", self.0)
    }
}

/// Descriptor for one species in the catalog.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Species {
    /// Catalog index of this species.
    pub id: SpeciesId,
    /// Human-readable name (e.g. "yelloweye rockfish").
    pub name: String,
}

/// The fixed set of species present in a simulation run.
///
/// Built once at scenario setup; never mutated afterwards. Iteration order
/// is catalog order, which is deterministic.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SpeciesCatalog {
    /// Species descriptors, in index order.
    species: Vec<Species>,
}

impl SpeciesCatalog {
    /// Build a catalog from a list of species names, assigning indices in
    /// list order.
    pub fn from_names<I, S>(names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let species = names
            .into_iter()
            .enumerate()
            .map(|(index, name)| Species {
                id: SpeciesId(index),
                name: name.into(),
            })
            .collect();
        Self { species }
    }

    /// Return the number of species in the catalog.
    pub const fn len(&self) -> usize {
        self.species.len()
    }

    /// Return whether the catalog is empty.
    pub const fn is_empty(&self) -> bool {
        self.species.is_empty()
    }

    /// Look up a species descriptor by id.
    pub fn get(&self, id: SpeciesId) -> Option<&Species> {
        self.species.get(id.index())
    }

    /// Iterate over all species in catalog order.
    pub fn iter(&self) -> impl Iterator<Item = &Species> {
        self.species.iter()
    }

    /// Iterate over all species ids in catalog order.
    pub fn ids(&self) -> impl Iterator<Item = SpeciesId> + use<> {
        (0..self.species.len()).map(SpeciesId)
    }
}

impl<'a> IntoIterator for &'a SpeciesCatalog {
    type Item = &'a Species;
    type IntoIter = core::slice::Iter<'a, Species>;

    fn into_iter(self) -> Self::IntoIter {
        self.species.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn from_names_assigns_dense_indices() {
        let catalog = SpeciesCatalog::from_names(["cod", "haddock", "pollock"]);
        assert_eq!(catalog.len(), 3);
        let ids: Vec<usize> = catalog.ids().map(SpeciesId::index).collect();
        assert_eq!(ids, vec![0, 1, 2]);
    }

    #[test]
    fn get_returns_descriptor() {
        let catalog = SpeciesCatalog::from_names(["cod", "haddock"]);
        let haddock = catalog.get(SpeciesId(1));
        assert_eq!(haddock.map(|s| s.name.as_str()), Some("haddock"));
    }

    #[test]
    fn get_out_of_range_is_none() {
        let catalog = SpeciesCatalog::from_names(["cod"]);
        assert!(catalog.get(SpeciesId(5)).is_none());
    }
}
