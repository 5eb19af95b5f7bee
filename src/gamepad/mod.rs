//! The button registry.
//!
//! A [`GamepadModel`] is an ordered, name-keyed set of buttons with a fixed
//! capacity. Buttons are addressed by [`ButtonId`], their index in insertion
//! order. Replacing a model drops the outgoing one whole, artwork included.

pub mod geometry;

use std::collections::HashMap;
use std::ops::{Index, IndexMut};

use serde::Serialize;
use thiserror::Error;
use tracing::debug;

use crate::config::models::{Button, ButtonType};
use geometry::{Rect, ScreenBounds};

/// Default maximum number of buttons in a layout.
pub const DEFAULT_CAPACITY: usize = 64;

/// Stable handle to a button within one model.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct ButtonId(usize);

impl ButtonId {
    pub const fn index(self) -> usize {
        self.0
    }
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum RegistryError {
    #[error("cannot add button '{name}': layout already holds {capacity} buttons")]
    CapacityExceeded { name: String, capacity: usize },
}

#[derive(Debug, Clone, PartialEq)]
pub struct GamepadModel {
    buttons: Vec<Button>,
    by_name: HashMap<String, ButtonId>,
    capacity: usize,
}

impl Default for GamepadModel {
    fn default() -> Self {
        Self::with_capacity(DEFAULT_CAPACITY)
    }
}

impl GamepadModel {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            buttons: Vec::new(),
            by_name: HashMap::new(),
            capacity,
        }
    }

    pub fn len(&self) -> usize {
        self.buttons.len()
    }

    pub fn is_empty(&self) -> bool {
        self.buttons.is_empty()
    }

    /// Id of the button with this name, if any.
    pub fn find(&self, name: &str) -> Option<ButtonId> {
        self.by_name.get(name).copied()
    }

    /// Return the existing button with this name or append a new one of type `ty`.
    ///
    /// `ty` is ignored when the button already exists.
    pub fn find_or_create(
        &mut self,
        name: &str,
        ty: ButtonType,
    ) -> Result<ButtonId, RegistryError> {
        if let Some(id) = self.find(name) {
            return Ok(id);
        }
        if self.buttons.len() >= self.capacity {
            return Err(RegistryError::CapacityExceeded {
                name: name.to_owned(),
                capacity: self.capacity,
            });
        }
        let id = ButtonId(self.buttons.len());
        self.buttons.push(Button::new(name, ty));
        self.by_name.insert(name.to_owned(), id);
        Ok(id)
    }

    pub fn get(&self, id: ButtonId) -> Option<&Button> {
        self.buttons.get(id.0)
    }

    pub fn get_mut(&mut self, id: ButtonId) -> Option<&mut Button> {
        self.buttons.get_mut(id.0)
    }

    pub fn by_name(&self, name: &str) -> Option<&Button> {
        self.find(name).and_then(|id| self.get(id))
    }

    /// Buttons in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = (ButtonId, &Button)> {
        self.buttons.iter().enumerate().map(|(i, b)| (ButtonId(i), b))
    }

    pub fn buttons_mut(&mut self) -> impl Iterator<Item = &mut Button> {
        self.buttons.iter_mut()
    }

    /// Resolved screen rectangle of a button.
    pub fn rect(&self, id: ButtonId, screen: ScreenBounds) -> Option<Rect> {
        self.get(id).map(|b| geometry::resolve(&b.placement, screen))
    }

    /// Install `next` in place of this model. The outgoing model, with all of
    /// its artwork, is dropped before this returns.
    pub fn replace(&mut self, next: GamepadModel) {
        let outgoing = std::mem::replace(self, next);
        let artwork = outgoing.buttons.iter().filter(|b| b.artwork.is_some()).count();
        debug!(
            target: "touchjoy::gamepad",
            released_buttons = outgoing.len(),
            released_artwork = artwork,
            installed_buttons = self.len(),
            "Replaced gamepad model"
        );
        drop(outgoing);
    }
}

impl Index<ButtonId> for GamepadModel {
    type Output = Button;

    fn index(&self, id: ButtonId) -> &Button {
        &self.buttons[id.0]
    }
}

impl IndexMut<ButtonId> for GamepadModel {
    fn index_mut(&mut self, id: ButtonId) -> &mut Button {
        &mut self.buttons[id.0]
    }
}
