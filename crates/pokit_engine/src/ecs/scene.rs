//! Scenes: entity ownership, the subscription index and system ordering

use std::collections::{BTreeSet, HashMap};

use super::entity::IdentityProps;
use super::system::RegisteredSystem;
use crate::foundation::collections::EntityId;
use crate::foundation::math::Vector;

/// Name of the scene entities land in when no scene is given
pub const DEFAULT_SCENE: &str = "__default__";

/// Name of the scene that survives transitions
pub const PERSISTENT_SCENE: &str = "__persistent__";

/// Result of adding an entity to a subscription set
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct Subscribed {
    /// The entity was not subscribed before
    pub added: bool,
    /// The component had no subscribers before
    pub first: bool,
}

/// A group of entities sharing a system schedule
///
/// A scene is also a transform root: entities without an entity parent are
/// placed relative to the scene's own position, scale and rotation.
#[derive(Debug)]
pub struct Scene {
    pub(crate) name: String,
    pub(crate) entities: BTreeSet<EntityId>,
    pub(crate) subscriptions: HashMap<String, BTreeSet<EntityId>>,
    pub(crate) systems: Option<Vec<String>>,
    pub(crate) sorted: Vec<usize>,
    pub(crate) active: bool,

    /// Scene origin
    pub position: Vector,
    /// Scene scale
    pub scale: Vector,
    /// Scene rotation in degrees
    pub rotation: f64,
}

impl Scene {
    pub(crate) fn new(name: impl Into<String>, systems: Option<Vec<String>>, placement: &IdentityProps) -> Self {
        Self {
            name: name.into(),
            entities: BTreeSet::new(),
            subscriptions: HashMap::new(),
            systems,
            sorted: Vec::new(),
            active: false,
            position: placement.position,
            scale: placement.scale,
            rotation: placement.rotation,
        }
    }

    /// Template name this scene was loaded from
    pub fn name(&self) -> &str {
        &self.name
    }

    /// True while the scene receives events
    pub fn is_active(&self) -> bool {
        self.active
    }

    /// True for the default and persistent scenes
    pub fn is_builtin(&self) -> bool {
        self.name == DEFAULT_SCENE || self.name == PERSISTENT_SCENE
    }

    /// Entities owned by this scene
    pub fn entities(&self) -> impl Iterator<Item = EntityId> + '_ {
        self.entities.iter().copied()
    }

    /// Current subscribers of `component`
    pub fn subscribers(&self, component: &str) -> impl Iterator<Item = EntityId> + '_ {
        self.subscriptions.get(component).into_iter().flatten().copied()
    }

    /// True if at least one entity holds `component`
    pub fn has_subscribers(&self, component: &str) -> bool {
        self.subscriptions.get(component).is_some_and(|set| !set.is_empty())
    }

    /// Catalog indices of the scheduled systems, in execution order
    pub fn sorted(&self) -> &[usize] {
        &self.sorted
    }

    /// Explicit execution prefix, if the scene declared one
    pub fn system_prefix(&self) -> Option<&[String]> {
        self.systems.as_deref()
    }

    /// Idempotent insert into the subscription set of `component`
    pub(crate) fn subscribe(&mut self, component: &str, entity: EntityId) -> Subscribed {
        let set = self.subscriptions.entry(component.to_owned()).or_default();
        let first = set.is_empty();
        let added = set.insert(entity);
        Subscribed { added, first: first && added }
    }

    /// Remove from the subscription set; true if it was present
    pub(crate) fn unsubscribe(&mut self, component: &str, entity: EntityId) -> bool {
        self.subscriptions
            .get_mut(component)
            .is_some_and(|set| set.remove(&entity))
    }

    /// Drop the subscription entry if nothing holds it anymore
    pub(crate) fn prune(&mut self, component: &str) -> bool {
        if self.subscriptions.get(component).is_some_and(BTreeSet::is_empty) {
            self.subscriptions.remove(component);
            return true;
        }
        false
    }

    /// Rebuild the execution order from the system catalog.
    ///
    /// The explicit prefix runs first, in its declared order. Every other
    /// system follows if it has no default component or its default
    /// component has subscribers here, ordered by descending priority with
    /// ties kept in registration order.
    pub(crate) fn sort_systems(&mut self, catalog: &[RegisteredSystem]) {
        let mut sorted = Vec::with_capacity(catalog.len());

        for name in self.systems.iter().flatten() {
            match catalog.iter().position(|entry| &entry.name == name) {
                Some(index) if !sorted.contains(&index) => sorted.push(index),
                Some(_) => {}
                None => log::warn!("Scene '{}' lists unknown system '{name}', skipping", self.name),
            }
        }
        let prefix_len = sorted.len();

        for (index, entry) in catalog.iter().enumerate() {
            if sorted[..prefix_len].contains(&index) {
                continue;
            }
            let scheduled = match &entry.system.default_component {
                Some(component) => self.has_subscribers(component),
                None => true,
            };
            if scheduled {
                sorted.push(index);
            }
        }

        sorted[prefix_len..].sort_by_key(|&index| std::cmp::Reverse(catalog[index].system.priority));
        self.sorted = sorted;
    }
}
