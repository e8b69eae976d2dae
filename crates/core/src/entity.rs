//! Entity trait: records with identity (pessoa, vacina, vacinação).

/// A persistence-backed record identified by a stable, copyable id.
pub trait Entity {
    /// Strongly-typed entity identifier.
    type Id: Copy + Eq + core::hash::Hash + core::fmt::Debug + core::fmt::Display;

    /// Returns the entity identifier.
    fn id(&self) -> &Self::Id;

    /// Two entities are the same record when their ids match, whatever their state.
    fn same_identity(&self, other: &Self) -> bool {
        self.id() == other.id()
    }
}
