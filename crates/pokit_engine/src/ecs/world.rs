//! ECS World: the registry of scenes, entities, systems and component defaults

use std::any::{Any, TypeId};
use std::collections::{BTreeSet, HashMap};

use serde_json::Value;

use super::component::{Component, IDENTITY};
use super::entity::{Entity, IdentityProps, ParentLink};
use super::scene::{Scene, DEFAULT_SCENE, PERSISTENT_SCENE};
use super::system::{events, RegisteredSystem, System, Target};
use super::template::{EntityStub, SceneStub};
use super::EcsError;
use crate::events::EventPayload;
use crate::foundation::collections::{EntityId, SceneId, SlotMap};
use crate::foundation::merge::{deep_merge, with_defaults};

/// ECS World containing every scene, entity and system
pub struct World {
    pub(crate) entities: SlotMap<EntityId, Entity>,
    pub(crate) scenes: SlotMap<SceneId, Scene>,
    pub(crate) active: Vec<SceneId>,
    default_scene: SceneId,
    persistent_scene: SceneId,

    components: HashMap<String, Value>,
    pub(crate) systems: Vec<RegisteredSystem>,
    pub(crate) entity_stubs: HashMap<String, EntityStub>,
    pub(crate) scene_stubs: HashMap<String, SceneStub>,

    resources: HashMap<TypeId, Box<dyn Any>>,
}

impl World {
    /// Create a world holding only the built-in scenes
    pub fn new() -> Self {
        let mut scenes = SlotMap::with_key();
        let mut default = Scene::new(DEFAULT_SCENE, None, &IdentityProps::default());
        default.active = true;
        let mut persistent = Scene::new(PERSISTENT_SCENE, None, &IdentityProps::default());
        persistent.active = true;
        let default_scene = scenes.insert(default);
        let persistent_scene = scenes.insert(persistent);

        Self {
            entities: SlotMap::with_key(),
            scenes,
            active: vec![default_scene, persistent_scene],
            default_scene,
            persistent_scene,
            components: HashMap::new(),
            systems: Vec::new(),
            entity_stubs: HashMap::new(),
            scene_stubs: HashMap::new(),
            resources: HashMap::new(),
        }
    }

    // ----- scenes -------------------------------------------------------

    /// The scene entities land in when no scene is given
    pub fn default_scene(&self) -> SceneId {
        self.default_scene
    }

    /// The scene that survives transitions
    pub fn persistent_scene(&self) -> SceneId {
        self.persistent_scene
    }

    /// Look up a scene
    pub fn scene(&self, id: SceneId) -> Result<&Scene, EcsError> {
        self.scenes.get(id).ok_or(EcsError::UnknownScene(id))
    }

    /// Look up a scene for mutation
    pub fn scene_mut(&mut self, id: SceneId) -> Result<&mut Scene, EcsError> {
        self.scenes.get_mut(id).ok_or(EcsError::UnknownScene(id))
    }

    /// Active scenes in activation order
    pub fn active_scenes(&self) -> &[SceneId] {
        &self.active
    }

    // ----- entities -----------------------------------------------------

    /// Look up an entity
    pub fn entity(&self, id: EntityId) -> Result<&Entity, EcsError> {
        self.entities.get(id).ok_or(EcsError::UnknownEntity(id))
    }

    /// Look up an entity for mutation
    pub fn entity_mut(&mut self, id: EntityId) -> Result<&mut Entity, EcsError> {
        self.entities.get_mut(id).ok_or(EcsError::UnknownEntity(id))
    }

    /// True if the entity is live
    pub fn contains(&self, id: EntityId) -> bool {
        self.entities.contains_key(id)
    }

    /// Number of live entities across every scene
    pub fn entity_count(&self) -> usize {
        self.entities.len()
    }

    /// First live entity in `scene` carrying the template name `name`
    pub fn find_by_name(&self, scene: SceneId, name: &str) -> Option<EntityId> {
        let scene = self.scenes.get(scene)?;
        scene
            .entities()
            .find(|&id| self.entities.get(id).and_then(Entity::name) == Some(name))
    }

    /// Create an entity in `scene` and announce it.
    ///
    /// A named `parent` in `props` is looked up among the scene's entities.
    pub fn create_entity(&mut self, scene: SceneId, props: &IdentityProps) -> Result<EntityId, EcsError> {
        let id = self.insert_entity(scene, props, ParentLink::Scene)?;
        if let Some(parent) = &props.parent {
            match self.find_by_name(scene, parent) {
                Some(parent_id) => self.set_parent(id, ParentLink::Entity(parent_id))?,
                None => {
                    self.discard_entity(id);
                    return Err(EcsError::UnresolvedParent { entity: id, parent: parent.clone() });
                }
            }
        }
        self.announce(id)?;
        Ok(id)
    }

    /// Add an entity to the arena without firing any event
    pub(crate) fn insert_entity(
        &mut self,
        scene: SceneId,
        props: &IdentityProps,
        parent: ParentLink,
    ) -> Result<EntityId, EcsError> {
        let scene_ref = self.scenes.get_mut(scene).ok_or(EcsError::UnknownScene(scene))?;
        let id = self.entities.insert(Entity::new(scene, parent, props));
        scene_ref.entities.insert(id);
        scene_ref.subscribe(IDENTITY, id);
        Ok(id)
    }

    /// Fire the entity-wide `init` if its scene is live
    pub(crate) fn announce(&mut self, id: EntityId) -> Result<(), EcsError> {
        let scene = self.entity(id)?.scene;
        if self.scene(scene)?.active {
            self.call_event_single(events::INIT, id, None, &EventPayload::Empty)?;
        }
        Ok(())
    }

    /// Remove an entity and every link to it without firing events
    pub(crate) fn discard_entity(&mut self, id: EntityId) {
        let Some(entity) = self.entities.remove(id) else {
            return;
        };
        if let Some(scene) = self.scenes.get_mut(entity.scene) {
            scene.entities.remove(&id);
            for set in scene.subscriptions.values_mut() {
                set.remove(&id);
            }
            let before = scene.subscriptions.len();
            scene.subscriptions.retain(|_, set| !set.is_empty());
            if scene.subscriptions.len() != before {
                self.resort(entity.scene);
            }
        }
    }

    /// Destroy an entity and its descendants.
    ///
    /// Every component is unsubscribed (firing its scoped `destroy`), then
    /// the entity-wide `destroy` runs and the entity leaves the arena.
    pub fn destroy_entity(&mut self, id: EntityId) -> Result<(), EcsError> {
        self.entity(id)?;
        for child in self.children(id) {
            self.destroy_entity(child)?;
        }

        let mut components: Vec<String> = self.entity(id)?.components.keys().cloned().collect();
        components.sort_unstable();
        components.push(IDENTITY.to_owned());
        for component in components {
            if !self.contains(id) {
                return Ok(());
            }
            if let Some(entity) = self.entities.get_mut(id) {
                entity.components.remove(&component);
            }
            self.unsubscribe(id, &component)?;
        }

        if self.contains(id) {
            self.call_event_single(events::DESTROY, id, None, &EventPayload::Empty)?;
        }
        log::trace!("Destroyed entity {id:?}");
        self.discard_entity(id);
        Ok(())
    }

    /// Direct children of an entity
    pub fn children(&self, id: EntityId) -> Vec<EntityId> {
        self.entities
            .iter()
            .filter(|(_, e)| e.parent == ParentLink::Entity(id))
            .map(|(child, _)| child)
            .collect()
    }

    // ----- components ---------------------------------------------------

    /// Register the default value merged under every `set` of `name`
    pub fn register_component(&mut self, name: impl Into<String>, default: Value) {
        let name = name.into();
        log::debug!("Registered component '{name}'");
        self.components.insert(name, default);
    }

    /// Registered default for a component
    pub fn component_default(&self, name: &str) -> Option<&Value> {
        self.components.get(name)
    }

    /// Component data of an entity
    pub fn get(&self, id: EntityId, component: &str) -> Option<Value> {
        self.entities.get(id)?.get(component).map(std::borrow::Cow::into_owned)
    }

    /// True if the entity holds `component`
    pub fn has(&self, id: EntityId, component: &str) -> bool {
        self.entities.get(id).is_some_and(|e| e.has(component))
    }

    /// Merge the registered default with `overrides` and store the result.
    ///
    /// The first time an entity gains a component it is subscribed to it and,
    /// in a live scene, the systems iterating that component get a scoped
    /// `init`. Setting `identity` updates the transform fields instead, and a
    /// `parent` name in it re-parents the entity under that scene entity.
    pub fn set(&mut self, id: EntityId, component: &str, overrides: Value) -> Result<(), EcsError> {
        if component == IDENTITY {
            let entity = self.entity_mut(id)?;
            let current = serde_json::to_value(entity.identity())?;
            let props: IdentityProps = serde_json::from_value(deep_merge(&current, &overrides))?;
            entity.apply_identity(&props);
            let scene = entity.scene;
            if let Some(parent) = props.parent {
                let parent_id = self
                    .find_by_name(scene, &parent)
                    .ok_or(EcsError::UnresolvedParent { entity: id, parent })?;
                self.set_parent(id, ParentLink::Entity(parent_id))?;
            }
            return Ok(());
        }

        let data = with_defaults(self.components.get(component), &overrides);
        self.entity_mut(id)?.components.insert(component.to_owned(), data);
        self.subscribe(id, component)
    }

    /// Remove a component, firing its scoped `destroy`
    pub fn delete(&mut self, id: EntityId, component: &str) -> Result<Option<Value>, EcsError> {
        if component == IDENTITY {
            return Ok(None);
        }
        let removed = self.entity_mut(id)?.components.remove(component);
        if removed.is_some() {
            self.unsubscribe(id, component)?;
        }
        Ok(removed)
    }

    /// Read a component through its typed view
    pub fn get_as<T: Component>(&self, id: EntityId) -> Option<T> {
        let value = self.entities.get(id)?.components.get(T::NAME)?;
        match T::deserialize(value) {
            Ok(typed) => Some(typed),
            Err(e) => {
                log::warn!("Component '{}' on {id:?} is malformed: {e}", T::NAME);
                None
            }
        }
    }

    /// Store a typed component through `set`
    pub fn set_as<T: Component>(&mut self, id: EntityId, component: &T) -> Result<(), EcsError> {
        let value = serde_json::to_value(component)?;
        self.set(id, T::NAME, value)
    }

    /// Edit a held component in place through its typed view.
    ///
    /// Returns `Ok(None)` if the entity does not hold the component.
    pub fn update_as<T: Component, R>(
        &mut self,
        id: EntityId,
        f: impl FnOnce(&mut T) -> R,
    ) -> Result<Option<R>, EcsError> {
        let Some(slot) = self.entity_mut(id)?.components.get_mut(T::NAME) else {
            return Ok(None);
        };
        let mut typed = T::deserialize(&*slot)?;
        let result = f(&mut typed);
        *slot = serde_json::to_value(&typed)?;
        Ok(Some(result))
    }

    /// Union of the subscribers of `component` across every active scene
    pub fn subscriptions(&self, component: &str) -> BTreeSet<EntityId> {
        self.active
            .iter()
            .filter_map(|&scene| self.scenes.get(scene))
            .flat_map(|scene| scene.subscribers(component))
            .collect()
    }

    pub(crate) fn subscribe(&mut self, id: EntityId, component: &str) -> Result<(), EcsError> {
        let scene_id = self.entity(id)?.scene;
        let scene = self.scene_mut(scene_id)?;
        let outcome = scene.subscribe(component, id);
        let active = scene.active;

        if outcome.first {
            self.resort(scene_id);
        }
        if outcome.added && active {
            self.call_event_single(events::INIT, id, Some(component), &EventPayload::Empty)?;
        }
        Ok(())
    }

    pub(crate) fn unsubscribe(&mut self, id: EntityId, component: &str) -> Result<(), EcsError> {
        let scene_id = self.entity(id)?.scene;
        self.scene_mut(scene_id)?.unsubscribe(component, id);
        self.call_event_single(events::DESTROY, id, Some(component), &EventPayload::Empty)?;

        if let Some(scene) = self.scenes.get_mut(scene_id) {
            if scene.prune(component) {
                self.resort(scene_id);
            }
        }
        Ok(())
    }

    // ----- systems ------------------------------------------------------

    /// Register a system under `name`, replacing any previous one in place
    pub fn register_system(&mut self, name: impl Into<String>, system: System) {
        let name = name.into();
        log::debug!(
            "Registered system '{name}' (priority {}, component {:?})",
            system.priority,
            system.default_component
        );
        match self.systems.iter_mut().find(|entry| entry.name == name) {
            Some(entry) => entry.system = system,
            None => self.systems.push(RegisteredSystem { name, system }),
        }
        self.sort_systems();
    }

    /// Look up a registered system
    pub fn system(&self, name: &str) -> Option<&System> {
        self.systems.iter().find(|entry| entry.name == name).map(|entry| &entry.system)
    }

    /// Names of the systems scheduled in `scene`, in execution order
    pub fn scheduled_systems(&self, scene: SceneId) -> Result<Vec<&str>, EcsError> {
        let scene = self.scene(scene)?;
        Ok(scene
            .sorted()
            .iter()
            .filter_map(|&index| self.systems.get(index))
            .map(|entry| entry.name.as_str())
            .collect())
    }

    /// Recompute the execution order of every scene
    pub fn sort_systems(&mut self) {
        let catalog = &self.systems;
        for (_, scene) in &mut self.scenes {
            scene.sort_systems(catalog);
        }
    }

    pub(crate) fn resort(&mut self, scene: SceneId) {
        if let Some(scene) = self.scenes.get_mut(scene) {
            scene.sort_systems(&self.systems);
        }
    }

    // ----- events -------------------------------------------------------

    /// Run `event` in every active scene, in activation order
    pub fn call_event(&mut self, event: &str, payload: &EventPayload) -> Result<(), EcsError> {
        for scene in self.active.clone() {
            if self.scenes.get(scene).is_some_and(|s| s.active) {
                self.call_scene_event(scene, event, payload)?;
            }
        }
        Ok(())
    }

    /// Run `event` through the scheduled systems of one scene.
    ///
    /// Systems with a default component are called once per subscriber,
    /// from a snapshot taken when the system's turn comes. Other systems get
    /// the scene's live entities as one batch.
    pub fn call_scene_event(&mut self, scene: SceneId, event: &str, payload: &EventPayload) -> Result<(), EcsError> {
        let sorted = self.scene(scene)?.sorted.clone();

        for index in sorted {
            let Some(entry) = self.systems.get(index) else {
                continue;
            };
            let Some(callback) = entry.system.capability(event) else {
                continue;
            };
            let component = entry.system.default_component.clone();
            let Some(scene_ref) = self.scenes.get(scene) else {
                break;
            };

            match component {
                Some(component) => {
                    let subscribers: Vec<EntityId> = scene_ref.subscribers(&component).collect();
                    for id in subscribers {
                        if self.contains(id) {
                            callback(self, Target::Entity(id), payload)?;
                        }
                    }
                }
                None => {
                    let batch: Vec<EntityId> = scene_ref.entities().collect();
                    callback(self, Target::Batch(&batch), payload)?;
                }
            }
        }
        Ok(())
    }

    /// Run `event` for one entity.
    ///
    /// With a `component`, only systems whose default component matches are
    /// called. Without one, batch systems get a one-entity batch and systems
    /// whose default component the entity holds get the entity.
    pub fn call_event_single(
        &mut self,
        event: &str,
        id: EntityId,
        component: Option<&str>,
        payload: &EventPayload,
    ) -> Result<(), EcsError> {
        let scene = self.entity(id)?.scene;
        let sorted = self.scene(scene)?.sorted.clone();

        for index in sorted {
            let Some(entry) = self.systems.get(index) else {
                continue;
            };
            let Some(callback) = entry.system.capability(event) else {
                continue;
            };
            let Some(entity) = self.entities.get(id) else {
                break;
            };

            let target = match (component, entry.system.default_component.as_deref()) {
                (Some(wanted), Some(own)) if wanted == own => Some(Target::Entity(id)),
                (None, None) => Some(Target::Batch(std::slice::from_ref(&id))),
                (None, Some(own)) if entity.has(own) => Some(Target::Entity(id)),
                _ => None,
            };
            if let Some(target) = target {
                callback(self, target, payload)?;
            }
        }
        Ok(())
    }

    /// Script-facing per-entity dispatch of a custom event
    pub fn call_entity_event(&mut self, id: EntityId, event: &str, payload: &EventPayload) -> Result<(), EcsError> {
        self.call_event_single(event, id, None, payload)
    }

    // ----- resources ----------------------------------------------------

    /// Store a module-owned value, replacing any previous one of its type
    pub fn insert_resource<T: 'static>(&mut self, resource: T) {
        self.resources.insert(TypeId::of::<T>(), Box::new(resource));
    }

    /// Borrow a resource
    pub fn resource<T: 'static>(&self) -> Option<&T> {
        self.resources.get(&TypeId::of::<T>())?.downcast_ref()
    }

    /// Borrow a resource mutably
    pub fn resource_mut<T: 'static>(&mut self) -> Option<&mut T> {
        self.resources.get_mut(&TypeId::of::<T>())?.downcast_mut()
    }

    /// Remove a resource
    pub fn remove_resource<T: 'static>(&mut self) -> Option<T> {
        let boxed = self.resources.remove(&TypeId::of::<T>())?;
        boxed.downcast::<T>().ok().map(|b| *b)
    }

    /// Check a resource out for the duration of `f`, giving `f` the world too.
    ///
    /// The resource is absent from the world while `f` runs.
    pub fn with_resource_mut<T: 'static, R>(&mut self, f: impl FnOnce(&mut T, &mut Self) -> R) -> Option<R> {
        let mut resource = self.remove_resource::<T>()?;
        let result = f(&mut resource, self);
        self.insert_resource(resource);
        Some(result)
    }
}

impl Default for World {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    /// Records every call into a `log` component on the world's log entity
    #[derive(Default)]
    struct CallLog(Vec<String>);

    fn record(world: &mut World, label: &str, target: Target<'_>) {
        let count = target.entities().len();
        if let Some(log) = world.resource_mut::<CallLog>() {
            log.0.push(format!("{label}:{count}"));
        }
    }

    fn sprite_init(world: &mut World, target: Target<'_>, _: &EventPayload) -> Result<(), EcsError> {
        record(world, "sprite.init", target);
        Ok(())
    }

    fn sprite_destroy(world: &mut World, target: Target<'_>, _: &EventPayload) -> Result<(), EcsError> {
        record(world, "sprite.destroy", target);
        Ok(())
    }

    fn batch_init(world: &mut World, target: Target<'_>, _: &EventPayload) -> Result<(), EcsError> {
        record(world, "batch.init", target);
        Ok(())
    }

    fn batch_update(world: &mut World, target: Target<'_>, _: &EventPayload) -> Result<(), EcsError> {
        record(world, "batch.update", target);
        Ok(())
    }

    fn batch_destroy(world: &mut World, target: Target<'_>, _: &EventPayload) -> Result<(), EcsError> {
        record(world, "batch.destroy", target);
        Ok(())
    }

    fn sprite_update(world: &mut World, target: Target<'_>, _: &EventPayload) -> Result<(), EcsError> {
        record(world, "sprite.update", target);
        Ok(())
    }

    fn world() -> World {
        let mut world = World::new();
        world.insert_resource(CallLog::default());
        world.register_component("sprite", json!({"visible": true, "frame": {"x": 0, "y": 0}}));
        world.register_system(
            "Sprites",
            System::new()
                .with_default_component("sprite")
                .on_init(sprite_init)
                .on_update(sprite_update)
                .on_destroy(sprite_destroy),
        );
        world.register_system(
            "Batch",
            System::new().on_init(batch_init).on_update(batch_update).on_destroy(batch_destroy),
        );
        world
    }

    fn take_log(world: &mut World) -> Vec<String> {
        world
            .resource_mut::<CallLog>()
            .map(|log| std::mem::take(&mut log.0))
            .unwrap_or_default()
    }

    #[test]
    fn test_set_merges_defaults_and_inits_once() {
        let mut world = world();
        let scene = world.default_scene();
        let e = world.create_entity(scene, &IdentityProps::default()).unwrap();
        assert_eq!(take_log(&mut world), ["batch.init:1"]);

        world.set(e, "sprite", json!({"frame": {"x": 3}})).unwrap();
        world.set(e, "sprite", json!({"visible": false})).unwrap();

        assert_eq!(take_log(&mut world), ["sprite.init:1"]);
        assert_eq!(world.get(e, "sprite").unwrap(), json!({"visible": false, "frame": {"x": 0, "y": 0}}));
        assert!(world.subscriptions("sprite").contains(&e));
    }

    #[test]
    fn test_subscription_drives_scheduling() {
        let mut world = world();
        let scene = world.default_scene();
        assert_eq!(world.scheduled_systems(scene).unwrap(), ["Batch"]);

        let e = world.create_entity(scene, &IdentityProps::default()).unwrap();
        world.set(e, "sprite", json!({})).unwrap();
        assert_eq!(world.scheduled_systems(scene).unwrap(), ["Sprites", "Batch"]);

        let removed = world.delete(e, "sprite").unwrap();
        assert!(removed.is_some());
        assert!(!world.has(e, "sprite"));
        assert_eq!(world.scheduled_systems(scene).unwrap(), ["Batch"]);
    }

    #[test]
    fn test_update_runs_per_subscriber_and_batch() {
        let mut world = world();
        let scene = world.default_scene();
        for _ in 0..3 {
            let e = world.create_entity(scene, &IdentityProps::default()).unwrap();
            world.set(e, "sprite", json!({})).unwrap();
        }
        take_log(&mut world);

        world.call_event(events::UPDATE, &EventPayload::Empty).unwrap();
        assert_eq!(
            take_log(&mut world),
            [
                "sprite.update:1",
                "sprite.update:1",
                "sprite.update:1",
                "batch.update:3",
                "batch.update:0",
            ]
        );
    }

    #[test]
    fn test_destroy_unsubscribes_everything() {
        let mut world = world();
        let scene = world.default_scene();
        let e = world.create_entity(scene, &IdentityProps::default()).unwrap();
        world.set(e, "sprite", json!({})).unwrap();
        take_log(&mut world);

        world.destroy_entity(e).unwrap();

        assert_eq!(take_log(&mut world), ["sprite.destroy:1", "batch.destroy:1"]);
        assert!(!world.contains(e));
        assert!(world.subscriptions("sprite").is_empty());
        assert!(world.subscriptions(IDENTITY).is_empty());
        assert_eq!(world.scheduled_systems(scene).unwrap(), ["Batch"]);
    }

    #[test]
    fn test_destroy_takes_children_along() {
        let mut world = world();
        let scene = world.default_scene();
        let parent = world.create_entity(scene, &IdentityProps::default()).unwrap();
        let child = world.create_entity(scene, &IdentityProps::default()).unwrap();
        world.set_parent(child, ParentLink::Entity(parent)).unwrap();

        world.destroy_entity(parent).unwrap();
        assert!(!world.contains(child));
        assert_eq!(world.entity_count(), 0);
    }

    #[test]
    fn test_identity_set_updates_transform() {
        let mut world = world();
        let e = world.create_entity(world.default_scene(), &IdentityProps::default()).unwrap();

        world.set(e, IDENTITY, json!({"position": {"x": 12.0}, "depth": 4.0})).unwrap();

        let entity = world.entity(e).unwrap();
        assert_eq!(entity.position.x, 12.0);
        assert_eq!(entity.depth, 4.0);
        assert_eq!(entity.bounds.x, 32.0);
    }

    #[test]
    fn test_reregistering_replaces_in_place() {
        let mut world = world();
        world.register_system("Sprites", System::new().with_priority(3));

        let scene = world.default_scene();
        assert_eq!(world.scheduled_systems(scene).unwrap(), ["Sprites", "Batch"]);
        assert_eq!(world.systems.len(), 2);
    }

    #[test]
    fn test_resource_checkout() {
        let mut world = World::new();
        world.insert_resource(5_u32);

        let seen = world.with_resource_mut::<u32, _>(|value, world| {
            *value += 1;
            world.resource::<u32>().is_none()
        });

        assert_eq!(seen, Some(true));
        assert_eq!(world.resource::<u32>(), Some(&6));
    }

    #[derive(Default)]
    struct Hunt {
        visited: Vec<EntityId>,
        victim: Option<EntityId>,
        spawned: Option<EntityId>,
    }

    /// On its first visit, spawns a new subscriber and destroys a pending one
    fn hunt_update(world: &mut World, target: Target<'_>, _: &EventPayload) -> Result<(), EcsError> {
        for &id in target.entities() {
            let Some(hunt) = world.resource_mut::<Hunt>() else {
                continue;
            };
            hunt.visited.push(id);
            if hunt.visited.len() > 1 {
                continue;
            }
            let victim = hunt.victim;
            let scene = world.default_scene();
            let spawned = world.create_entity(scene, &IdentityProps::default())?;
            world.set(spawned, "hunter", json!({}))?;
            if let Some(victim) = victim {
                world.destroy_entity(victim)?;
            }
            if let Some(hunt) = world.resource_mut::<Hunt>() {
                hunt.spawned = Some(spawned);
            }
        }
        Ok(())
    }

    #[test]
    fn test_call_event_iterates_a_snapshot() {
        let mut world = World::new();
        world.register_system("Hunters", System::new().with_default_component("hunter").on_update(hunt_update));
        let scene = world.default_scene();
        let first = world.create_entity(scene, &IdentityProps::default()).unwrap();
        let second = world.create_entity(scene, &IdentityProps::default()).unwrap();
        world.set(first, "hunter", json!({})).unwrap();
        world.set(second, "hunter", json!({})).unwrap();
        world.insert_resource(Hunt { victim: Some(second), ..Hunt::default() });

        world.call_event(events::UPDATE, &EventPayload::Empty).unwrap();

        let hunt = world.resource::<Hunt>().unwrap();
        let spawned = hunt.spawned.unwrap();
        // Destroyed mid-event: skipped. Subscribed mid-event: not visited yet.
        assert_eq!(hunt.visited, [first]);
        assert!(!world.contains(second));
        assert!(world.has(spawned, "hunter"));

        world.call_event(events::UPDATE, &EventPayload::Empty).unwrap();
        let visited = &world.resource::<Hunt>().unwrap().visited;
        assert_eq!(visited.len(), 3);
        assert!(visited.contains(&spawned));
        assert!(!visited.contains(&second));
    }

    #[test]
    fn test_identity_parent_reparents_by_name() {
        let mut world = World::new();
        let scene = world.default_scene();
        let base = world
            .create_entity(scene, &IdentityProps { id: Some("base".into()), ..IdentityProps::default() })
            .unwrap();
        let child = world.create_entity(scene, &IdentityProps::default()).unwrap();

        world.set(child, IDENTITY, json!({"parent": "base", "position": {"x": 1.0}})).unwrap();
        assert_eq!(world.entity(child).unwrap().parent, ParentLink::Entity(base));
        assert_eq!(world.entity(child).unwrap().position.x, 1.0);

        let err = world.set(child, IDENTITY, json!({"parent": "nowhere"})).unwrap_err();
        assert!(matches!(err, EcsError::UnresolvedParent { entity, .. } if entity == child));
        assert_eq!(world.entity(child).unwrap().parent, ParentLink::Entity(base));
    }
}
