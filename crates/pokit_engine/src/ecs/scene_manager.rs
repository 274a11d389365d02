//! # Scene Manager
//!
//! Instantiates scenes and entities from cart templates and drives the scene
//! lifecycle: load, activate, destroy and transition.
//!
//! Instantiation runs in three phases so that templates may reference
//! parents by name before those parents exist:
//!
//! 1. create every entity silently,
//! 2. link named parents and reject cycles,
//! 3. announce each entity and set its components.

use serde_json::Value;

use super::component::IDENTITY;
use super::entity::{IdentityProps, ParentLink};
use super::scene::Scene;
use super::system::events;
use super::template::{resolve_stubs, CartManifest};
use super::{EcsError, World};
use crate::events::EventPayload;
use crate::foundation::collections::{EntityId, SceneId};
use crate::foundation::merge::with_defaults;

/// Entities created by one load, pending announcement
#[derive(Debug, Default)]
struct Batch {
    created: Vec<(EntityId, String)>,
    named_parents: Vec<(EntityId, String)>,
}

impl World {
    /// Resolve and store every template of a cart
    pub fn load_stubs(&mut self, cart: &CartManifest) -> Result<(), EcsError> {
        let stubs = resolve_stubs(cart)?;
        log::info!(
            "Loaded cart '{}': {} entity templates, {} scene templates",
            cart.name,
            stubs.len(),
            cart.scenes.len()
        );
        self.entity_stubs.extend(stubs);
        self.scene_stubs
            .extend(cart.scenes.iter().map(|(name, stub)| (name.clone(), stub.clone())));
        Ok(())
    }

    /// Build an inactive scene from its template.
    ///
    /// `placement` positions the scene itself; entities without an entity
    /// parent are placed relative to it.
    pub fn load_scene(&mut self, name: &str, placement: Option<&IdentityProps>) -> Result<SceneId, EcsError> {
        let stub = self
            .scene_stubs
            .get(name)
            .cloned()
            .ok_or_else(|| EcsError::UnknownSceneStub(name.to_owned()))?;
        for system in stub.systems.iter().flatten() {
            if self.system(system).is_none() {
                return Err(EcsError::UnknownSystem(system.clone()));
            }
        }

        let placement = placement.cloned().unwrap_or_default();
        let scene = self.scenes.insert(Scene::new(name, stub.systems.clone(), &placement));
        self.resort(scene);

        let mut batch = Batch::default();
        let created = stub.entities.iter().try_for_each(|(stub_name, instances)| {
            instances.iter().try_for_each(|overrides| {
                self.instantiate(stub_name, overrides, scene, ParentLink::Scene, &mut batch)
                    .map(drop)
            })
        });
        if let Err(e) = created.and_then(|()| self.link_parents(scene, &batch)) {
            for (id, _) in &batch.created {
                self.discard_entity(*id);
            }
            self.scenes.remove(scene);
            return Err(e);
        }

        self.announce_batch(&batch)?;
        log::info!("Loaded scene '{name}' with {} entities", batch.created.len());
        Ok(scene)
    }

    /// Instantiate one template at runtime, children included.
    ///
    /// Without a `scene` the entity lands in the default scene; persistent
    /// templates always land in the persistent scene.
    pub fn spawn(&mut self, stub: &str, overrides: &Value, scene: Option<SceneId>) -> Result<EntityId, EcsError> {
        let scene = scene.unwrap_or(self.default_scene());
        self.scene(scene)?;

        let mut batch = Batch::default();
        let result = self
            .instantiate(stub, overrides, scene, ParentLink::Scene, &mut batch)
            .and_then(|id| self.link_parents(scene, &batch).map(|()| id));
        let id = match result {
            Ok(id) => id,
            Err(e) => {
                for (id, _) in &batch.created {
                    self.discard_entity(*id);
                }
                return Err(e);
            }
        };

        self.announce_batch(&batch)?;
        Ok(id)
    }

    /// Re-parent an entity, refusing links that would form a cycle
    pub fn set_parent(&mut self, id: EntityId, parent: ParentLink) -> Result<(), EcsError> {
        self.entity(id)?;
        if let ParentLink::Entity(parent_id) = parent {
            self.entity(parent_id)?;
            if self.is_ancestor(id, parent_id) {
                return Err(EcsError::ParentCycle(id));
            }
        }
        self.entity_mut(id)?.parent = parent;
        Ok(())
    }

    /// Register a loaded scene as active and fire its scene-wide `init`
    pub fn activate_scene(&mut self, id: SceneId) -> Result<(), EcsError> {
        let scene = self.scene_mut(id)?;
        if scene.active {
            return Ok(());
        }
        scene.active = true;
        log::info!("Activating scene '{}'", scene.name);
        self.active.push(id);
        self.call_scene_event(id, events::INIT, &EventPayload::Empty)
    }

    /// Fire the scene-wide `destroy`, deregister the scene and drop its
    /// entities without further events
    pub fn destroy_scene(&mut self, id: SceneId) -> Result<(), EcsError> {
        let scene = self.scene(id)?;
        if scene.is_builtin() {
            return Err(EcsError::BuiltinScene(scene.name.clone()));
        }
        log::info!("Destroying scene '{}'", scene.name);

        self.call_scene_event(id, events::DESTROY, &EventPayload::Empty)?;
        self.active.retain(|&active| active != id);
        if let Some(scene) = self.scenes.remove(id) {
            for entity in scene.entities {
                self.entities.remove(entity);
            }
        }
        Ok(())
    }

    /// Destroy every other active scene except the built-in ones, then
    /// activate `id`
    pub fn transition(&mut self, id: SceneId) -> Result<(), EcsError> {
        self.scene(id)?;
        let outgoing: Vec<SceneId> = self
            .active
            .iter()
            .copied()
            .filter(|&scene| scene != id && self.scenes.get(scene).is_some_and(|s| !s.is_builtin()))
            .collect();
        for scene in outgoing {
            self.destroy_scene(scene)?;
        }
        self.activate_scene(id)
    }

    fn instantiate(
        &mut self,
        stub_name: &str,
        overrides: &Value,
        scene: SceneId,
        parent: ParentLink,
        batch: &mut Batch,
    ) -> Result<EntityId, EcsError> {
        let stub = self
            .entity_stubs
            .get(stub_name)
            .cloned()
            .ok_or_else(|| EcsError::UnknownStub(stub_name.to_owned()))?;

        let identity = with_defaults(stub.components.get(IDENTITY), overrides);
        let props: IdentityProps = if identity.is_null() {
            IdentityProps::default()
        } else {
            serde_json::from_value(identity)?
        };

        let target = if props.persistent { self.persistent_scene() } else { scene };
        let id = self.insert_entity(target, &props, parent)?;
        batch.created.push((id, stub_name.to_owned()));
        if parent == ParentLink::Scene {
            if let Some(name) = &props.parent {
                batch.named_parents.push((id, name.clone()));
            }
        }

        for (child_stub, instances) in stub.children.iter().flatten() {
            for child_overrides in instances {
                self.instantiate(child_stub, child_overrides, target, ParentLink::Entity(id), batch)?;
            }
        }
        Ok(id)
    }

    /// Link named parents: entities of this batch first, then the scene
    fn link_parents(&mut self, scene: SceneId, batch: &Batch) -> Result<(), EcsError> {
        for (id, name) in &batch.named_parents {
            let in_batch = batch
                .created
                .iter()
                .map(|(created, _)| *created)
                .find(|&created| self.entities.get(created).and_then(|e| e.name()) == Some(name.as_str()));
            let parent = in_batch
                .or_else(|| self.find_by_name(scene, name))
                .ok_or_else(|| EcsError::UnresolvedParent { entity: *id, parent: name.clone() })?;
            self.set_parent(*id, ParentLink::Entity(parent))?;
        }
        Ok(())
    }

    fn announce_batch(&mut self, batch: &Batch) -> Result<(), EcsError> {
        for (id, stub_name) in &batch.created {
            if !self.contains(*id) {
                continue;
            }
            self.announce(*id)?;

            let components = self
                .entity_stubs
                .get(stub_name)
                .map(|stub| stub.components.clone())
                .unwrap_or_default();
            for (component, data) in components {
                if component == IDENTITY || !self.contains(*id) {
                    continue;
                }
                self.set(*id, &component, data)?;
            }
        }
        Ok(())
    }

    /// True if `id` is `candidate` or one of its ancestors
    fn is_ancestor(&self, id: EntityId, candidate: EntityId) -> bool {
        let mut current = Some(candidate);
        let mut steps = 0;
        while let Some(node) = current {
            if node == id {
                return true;
            }
            steps += 1;
            if steps > self.entities.len() {
                return true;
            }
            current = match self.entities.get(node).map(|e| e.parent) {
                Some(ParentLink::Entity(next)) => Some(next),
                _ => None,
            };
        }
        false
    }
}
