//! Directional passability of colliders

use bitflags::bitflags;
use serde_json::Value;

use super::{DYNAMIC_COLLIDER, STATIC_COLLIDER};
use crate::ecs::World;
use crate::foundation::collections::EntityId;

bitflags! {
    /// Sides of a collider that stop an agent striking them
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct BlockFlags: u8 {
        /// Top face (`blockNorth`)
        const NORTH = 1 << 0;
        /// Right face (`blockEast`)
        const EAST = 1 << 1;
        /// Bottom face (`blockSouth`)
        const SOUTH = 1 << 2;
        /// Left face (`blockWest`)
        const WEST = 1 << 3;
    }
}

impl BlockFlags {
    /// Read `blockNorth` / `blockEast` / `blockSouth` / `blockWest` from a collider value
    pub fn from_component(value: &Value) -> Self {
        let mut flags = Self::empty();
        for (key, flag) in [
            ("blockNorth", Self::NORTH),
            ("blockEast", Self::EAST),
            ("blockSouth", Self::SOUTH),
            ("blockWest", Self::WEST),
        ] {
            if value.get(key).and_then(Value::as_bool).unwrap_or(false) {
                flags |= flag;
            }
        }
        flags
    }

    /// Flags of an entity's collider, static first.
    ///
    /// Entities without a collider block nothing.
    pub fn of(world: &World, id: EntityId) -> Self {
        world
            .get(id, STATIC_COLLIDER)
            .or_else(|| world.get(id, DYNAMIC_COLLIDER))
            .map_or_else(Self::empty, |value| Self::from_component(&value))
    }

    /// Whether an agent travelling toward `side` is stopped
    pub fn blocks(self, side: Side) -> bool {
        self.contains(side.struck_face())
    }
}

/// Direction an agent travels when it strikes a collider
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Side {
    /// Moving up
    North,
    /// Moving right
    East,
    /// Moving down
    South,
    /// Moving left
    West,
}

impl Side {
    /// Face of the collider met when travelling this way
    pub fn struck_face(self) -> BlockFlags {
        match self {
            Self::North => BlockFlags::SOUTH,
            Self::East => BlockFlags::WEST,
            Self::South => BlockFlags::NORTH,
            Self::West => BlockFlags::EAST,
        }
    }
}
