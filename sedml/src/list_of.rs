// SPDX-License-Identifier: MIT OR Apache-2.0

//! The generic `listOfX` container.

use crate::document::ElementId;
use crate::error::SedErrorCode;
use crate::object::{impl_object_boilerplate, ReadContext, SedObject, TypeCode};
use crate::token::XmlToken;

/// Builds the item for a child tag name, or `None` if the list doesn't hold that kind.
pub type ItemFactory = fn(&str) -> Option<Box<dyn SedObject>>;

#[derive(Clone)]
pub struct SedListOf {
    element_name: &'static str,
    factory: ItemFactory,
    items: Vec<ElementId>,
    position: i32,
    attributes_code: Option<SedErrorCode>,
}

impl std::fmt::Debug for SedListOf {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SedListOf")
            .field("element_name", &self.element_name)
            .field("items", &self.items)
            .finish()
    }
}

impl SedListOf {
    pub fn new(element_name: &'static str, factory: ItemFactory) -> Self {
        Self {
            element_name,
            factory,
            items: Vec::new(),
            position: -1,
            attributes_code: None,
        }
    }

    /// Sets the list's ordinal among its parent's children.
    pub fn with_position(self, position: i32) -> Self {
        Self { position, ..self }
    }

    /// Reports unknown attributes on the list under `code`.
    pub fn with_attributes_code(self, code: SedErrorCode) -> Self {
        Self {
            attributes_code: Some(code),
            ..self
        }
    }

    /// True if an element named `name` may be an item.
    pub fn accepts(&self, name: &str) -> bool {
        (self.factory)(name).is_some()
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn get(&self, i: usize) -> Option<ElementId> {
        self.items.get(i).copied()
    }

    pub fn items(&self) -> &[ElementId] {
        &self.items
    }

    pub(crate) fn push(&mut self, item: ElementId) {
        self.items.push(item);
    }

    pub(crate) fn remove(&mut self, i: usize) -> Option<ElementId> {
        if i < self.items.len() {
            Some(self.items.remove(i))
        } else {
            None
        }
    }
}

impl SedObject for SedListOf {
    fn type_code(&self) -> TypeCode {
        TypeCode::ListOf
    }

    fn element_name(&self) -> &str {
        self.element_name
    }

    fn allowed_attributes_code(&self) -> Option<SedErrorCode> {
        self.attributes_code
    }

    fn create_object(&mut self, ctx: &mut ReadContext, token: &XmlToken) -> Option<ElementId> {
        let object = (self.factory)(token.name())?;
        let id = ctx.create_child(object);
        self.items.push(id);
        Some(id)
    }

    fn children(&self) -> Vec<ElementId> {
        self.items.clone()
    }

    fn remove_child(&mut self, child: ElementId) -> bool {
        let before = self.items.len();
        self.items.retain(|&i| i != child);
        self.items.len() != before
    }

    fn remap_children(&mut self, map: &dyn Fn(ElementId) -> Option<ElementId>) {
        self.items = self.items.iter().filter_map(|&i| map(i)).collect();
    }

    fn element_position(&self) -> i32 {
        self.position
    }

    impl_object_boilerplate!();
}
