//! Entity implementation
//!
//! An entity is a transform node (local position, scale and rotation relative
//! to its parent) plus a store of named components. The transform fields are
//! exposed to scripts as the implicit `identity` component.

use std::borrow::Cow;
use std::cell::Cell;
use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::component::IDENTITY;
use crate::foundation::collections::{EntityId, SceneId};
use crate::foundation::math::Vector;

/// What an entity's transform is relative to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ParentLink {
    /// The owning scene's transform
    Scene,
    /// Another live entity
    Entity(EntityId),
}

/// Serialized transform and placement data of an entity
///
/// This is the shape of the `identity` component in templates and of the
/// per-instance overrides in scene templates.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct IdentityProps {
    /// Optional name other instances may use as their `parent`
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    /// Name of the parent entity, resolved once the whole batch exists
    #[serde(skip_serializing_if = "Option::is_none")]
    pub parent: Option<String>,
    /// Local position
    pub position: Vector,
    /// Local scale
    pub scale: Vector,
    /// Local rotation in degrees
    pub rotation: f64,
    /// Layer
    pub z: f64,
    /// Extent along the layer axis
    pub depth: f64,
    /// Full width and height of the collision box before scaling
    pub bounds: Vector,
    /// Route the entity to the persistent scene
    pub persistent: bool,
}

impl Default for IdentityProps {
    fn default() -> Self {
        Self {
            id: None,
            parent: None,
            position: Vector::ZERO,
            scale: Vector::ONE,
            rotation: 0.0,
            z: 0.0,
            depth: 1.0,
            bounds: Vector::splat(32.0),
            persistent: false,
        }
    }
}

/// Memoized global position and the inputs it was computed from
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub(crate) struct TransformCache {
    pub parent_position: Vector,
    pub parent_scale: Vector,
    pub parent_rotation: f64,
    pub local_position: Vector,
    pub global: Option<Vector>,
}

impl TransformCache {
    /// Cached value, if every input still matches
    pub fn lookup(
        &self,
        parent_position: Vector,
        parent_scale: Vector,
        parent_rotation: f64,
        local_position: Vector,
    ) -> Option<Vector> {
        let fresh = self.parent_position == parent_position
            && self.parent_scale == parent_scale
            && self.parent_rotation == parent_rotation
            && self.local_position == local_position;
        if fresh {
            self.global
        } else {
            None
        }
    }
}

/// A positioned node owning named component data
#[derive(Debug)]
pub struct Entity {
    pub(crate) name: Option<String>,
    pub(crate) scene: SceneId,
    pub(crate) parent: ParentLink,

    /// Local position relative to the parent
    pub position: Vector,
    /// Local scale relative to the parent
    pub scale: Vector,
    /// Local rotation in degrees relative to the parent
    pub rotation: f64,
    /// Layer
    pub z: f64,
    /// Extent along the layer axis
    pub depth: f64,
    /// Full collision box size before scaling
    pub bounds: Vector,
    /// Lives in the persistent scene
    pub persistent: bool,

    pub(crate) components: HashMap<String, Value>,
    pub(crate) cache: Cell<TransformCache>,
}

impl Entity {
    pub(crate) fn new(scene: SceneId, parent: ParentLink, props: &IdentityProps) -> Self {
        Self {
            name: props.id.clone(),
            scene,
            parent,
            position: props.position,
            scale: props.scale,
            rotation: props.rotation,
            z: props.z,
            depth: props.depth,
            bounds: props.bounds,
            persistent: props.persistent,
            components: HashMap::new(),
            cache: Cell::new(TransformCache::default()),
        }
    }

    /// Template-assigned name, if any
    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    /// Scene that owns this entity
    pub fn scene(&self) -> SceneId {
        self.scene
    }

    /// Current parent link
    pub fn parent(&self) -> ParentLink {
        self.parent
    }

    /// Snapshot of the transform fields as identity data
    pub fn identity(&self) -> IdentityProps {
        IdentityProps {
            id: self.name.clone(),
            parent: None,
            position: self.position,
            scale: self.scale,
            rotation: self.rotation,
            z: self.z,
            depth: self.depth,
            bounds: self.bounds,
            persistent: self.persistent,
        }
    }

    /// Overwrite the local transform fields from identity data
    pub(crate) fn apply_identity(&mut self, props: &IdentityProps) {
        self.position = props.position;
        self.scale = props.scale;
        self.rotation = props.rotation;
        self.z = props.z;
        self.depth = props.depth;
        self.bounds = props.bounds;
        self.persistent = props.persistent;
    }

    /// True if the entity holds `component`; `identity` is always held
    pub fn has(&self, component: &str) -> bool {
        component == IDENTITY || self.components.contains_key(component)
    }

    /// Component data, or `None` if the entity does not hold it
    ///
    /// `identity` is computed from the transform fields on each call.
    pub fn get(&self, component: &str) -> Option<Cow<'_, Value>> {
        if component == IDENTITY {
            return serde_json::to_value(self.identity()).ok().map(Cow::Owned);
        }
        self.components.get(component).map(Cow::Borrowed)
    }

    /// Mutable access to stored component data
    ///
    /// Edits made here bypass default merging and lifecycle events.
    pub fn get_mut(&mut self, component: &str) -> Option<&mut Value> {
        self.components.get_mut(component)
    }

    /// Names of the stored components (`identity` excluded)
    pub fn component_names(&self) -> impl Iterator<Item = &str> {
        self.components.keys().map(String::as_str)
    }
}
