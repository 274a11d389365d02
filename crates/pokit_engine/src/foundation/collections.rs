//! Specialized collection types

pub use slotmap::SlotMap;

slotmap::new_key_type! {
    /// Generated, immutable identity of a live entity
    pub struct EntityId;

    /// Identity of a scene owned by the registry
    pub struct SceneId;
}
