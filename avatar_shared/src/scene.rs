//! Scene abstraction.
//!
//! This crate intentionally does not depend on a graphics backend. The core
//! only needs somewhere to place the avatar and the camera each frame; a
//! renderer implementation satisfies [`SceneBackend`].

use crate::{
    camera::CameraPose,
    math::{Quat, Vec3},
};

/// Handle to a placed object.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ObjectId(pub u32);

/// What the core asks of the scene graph.
pub trait SceneBackend {
    fn add_object(&mut self, name: &str) -> ObjectId;
    fn set_transform(&mut self, id: ObjectId, position: Vec3, orientation: Quat);
    fn set_camera(&mut self, pose: CameraPose);
    fn render(&mut self);
}

/// Placed object as last seen by the headless scene.
#[derive(Debug, Clone, PartialEq)]
pub struct PlacedObject {
    pub name: String,
    pub position: Vec3,
    pub orientation: Quat,
}

/// Scene that records placements instead of drawing; useful for headless
/// runs and tests.
#[derive(Debug, Default)]
pub struct HeadlessScene {
    objects: Vec<PlacedObject>,
    camera: CameraPose,
    frames_rendered: u64,
}

impl HeadlessScene {
    pub fn object(&self, id: ObjectId) -> Option<&PlacedObject> {
        self.objects.get(id.0 as usize)
    }

    pub fn camera(&self) -> CameraPose {
        self.camera
    }

    pub fn frames_rendered(&self) -> u64 {
        self.frames_rendered
    }
}

impl SceneBackend for HeadlessScene {
    fn add_object(&mut self, name: &str) -> ObjectId {
        let id = ObjectId(self.objects.len() as u32);
        self.objects.push(PlacedObject {
            name: name.to_string(),
            position: Vec3::ZERO,
            orientation: Quat::IDENTITY,
        });
        id
    }

    fn set_transform(&mut self, id: ObjectId, position: Vec3, orientation: Quat) {
        if let Some(obj) = self.objects.get_mut(id.0 as usize) {
            obj.position = position;
            obj.orientation = orientation;
        }
    }

    fn set_camera(&mut self, pose: CameraPose) {
        self.camera = pose;
    }

    fn render(&mut self) {
        self.frames_rendered += 1;
    }
}
