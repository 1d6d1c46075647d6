// SPDX-License-Identifier: MIT OR Apache-2.0

//! The element arena, tree links, and the generic read and write engines.
//!
//! Every element of a document lives in a slot owned by its [`SedDocument`]
//! and is named by an [`ElementId`]. Deleting an element bumps its slot's
//! generation, so stale handles stop resolving rather than aliasing whatever
//! reuses the slot.

use log::{debug, trace};

use crate::base::SedBase;
use crate::de::XmlInputStream;
use crate::elements::DocumentElement;
use crate::error::{ConstructorError, OpResult, OperationError, SedError, SedErrorCode, SedErrorLog};
use crate::list_of::SedListOf;
use crate::namespaces::{is_sed_namespace, SedNamespaces, SEDML_DEFAULT_LEVEL, SEDML_DEFAULT_VERSION};
use crate::node::XmlNode;
use crate::object::{ExpectedAttributes, ReadContext, SedObject, TypeCode, WriteContext};
use crate::ser::{self, XmlOutputStream};
use crate::syntax::check_notes_content;
use crate::token::{XmlNamespaces, XmlToken};
use crate::XSI_NS;

/// A handle to an element within a [`SedDocument`].
#[derive(Copy, Clone, Debug, Eq, Hash, PartialEq)]
pub struct ElementId {
    index: u32,
    generation: u32,
}

#[derive(Debug)]
struct Entry {
    base: SedBase,

    /// `None` only while the element's own hooks are running during a read.
    object: Option<Box<dyn SedObject>>,
    parent: Option<ElementId>,

    /// The document root, if the element is attached to it.
    owner: Option<ElementId>,
}

#[derive(Debug)]
struct Slot {
    generation: u32,
    entry: Option<Entry>,
}

/// A SED-ML document: the arena holding its elements plus its error log.
#[derive(Debug)]
pub struct SedDocument {
    slots: Vec<Slot>,
    free: Vec<u32>,
    root: ElementId,
    log: SedErrorLog,
}

impl Default for SedDocument {
    fn default() -> Self {
        Self::new(SEDML_DEFAULT_LEVEL, SEDML_DEFAULT_VERSION)
    }
}

impl SedDocument {
    pub fn new(level: u32, version: u32) -> Self {
        let mut doc = SedDocument {
            slots: Vec::new(),
            free: Vec::new(),
            root: ElementId {
                index: 0,
                generation: 0,
            },
            log: SedErrorLog::new(),
        };
        let base = SedBase::new(level, version);
        doc.root = doc.insert(base, Box::new(DocumentElement::default()));
        doc.set_owner(doc.root, Some(doc.root));
        doc
    }

    /// Creates a document for the given namespaces, which must be supplied.
    pub fn with_namespaces(namespaces: Option<&SedNamespaces>) -> Result<Self, ConstructorError> {
        let namespaces = namespaces.ok_or_else(|| {
            ConstructorError("Unable to create SedDocument: namespaces are missing".to_owned())
        })?;
        let mut doc = Self::new(namespaces.level(), namespaces.version());
        let root = doc.root;
        if let Some(b) = doc.base_mut(root) {
            *b.namespaces_mut() = namespaces.clone();
        }
        Ok(doc)
    }

    /// The `sedML` root element.
    pub fn root(&self) -> ElementId {
        self.root
    }

    pub fn level(&self) -> u32 {
        self.base(self.root).map_or(SEDML_DEFAULT_LEVEL, SedBase::level)
    }

    pub fn version(&self) -> u32 {
        self.base(self.root).map_or(SEDML_DEFAULT_VERSION, SedBase::version)
    }

    /// Changes the level and version of the document and every element in it.
    pub fn set_level_version(&mut self, level: u32, version: u32) -> OpResult {
        if level != 1 || !(1..=5).contains(&version) {
            return Err(OperationError::InvalidAttributeValue);
        }
        self.set_level_version_unchecked(level, version);
        Ok(())
    }

    pub(crate) fn set_level_version_unchecked(&mut self, level: u32, version: u32) {
        debug!("setting document to level {} version {}", level, version);
        for slot in &mut self.slots {
            if let Some(e) = slot.entry.as_mut() {
                e.base.set_level_version(level, version);
            }
        }
    }

    /// Namespaces declared on the root element.
    pub fn namespaces(&self) -> &SedNamespaces {
        match self.base(self.root) {
            Some(b) => b.namespaces(),
            None => unreachable!("document root is never deleted"),
        }
    }

    pub fn namespaces_mut(&mut self) -> &mut SedNamespaces {
        let root = self.root;
        match self.entry_mut(root) {
            Some(e) => e.base.namespaces_mut(),
            None => unreachable!("document root is never deleted"),
        }
    }

    pub fn error_log(&self) -> &SedErrorLog {
        &self.log
    }

    pub fn error_log_mut(&mut self) -> &mut SedErrorLog {
        &mut self.log
    }

    pub fn num_errors(&self) -> usize {
        self.log.num_errors()
    }

    pub fn error(&self, i: usize) -> Option<&SedError> {
        self.log.error(i)
    }

    fn root_object(&self) -> Option<&DocumentElement> {
        self.get::<DocumentElement>(self.root)
    }

    pub fn list_of_models(&self) -> Option<ElementId> {
        self.root_object().and_then(|r| r.models)
    }

    pub fn list_of_simulations(&self) -> Option<ElementId> {
        self.root_object().and_then(|r| r.simulations)
    }

    pub fn list_of_tasks(&self) -> Option<ElementId> {
        self.root_object().and_then(|r| r.tasks)
    }

    pub fn list_of_data_generators(&self) -> Option<ElementId> {
        self.root_object().and_then(|r| r.data_generators)
    }

    pub fn list_of_outputs(&self) -> Option<ElementId> {
        self.root_object().and_then(|r| r.outputs)
    }

    // ---- arena ----

    fn alloc(&mut self, entry: Entry) -> ElementId {
        match self.free.pop() {
            Some(index) => {
                let slot = &mut self.slots[index as usize];
                slot.entry = Some(entry);
                ElementId {
                    index,
                    generation: slot.generation,
                }
            }
            None => {
                self.slots.push(Slot {
                    generation: 0,
                    entry: Some(entry),
                });
                ElementId {
                    index: (self.slots.len() - 1) as u32,
                    generation: 0,
                }
            }
        }
    }

    /// Stores a new detached element, creating the lists it owns.
    fn insert(&mut self, mut base: SedBase, mut object: Box<dyn SedObject>) -> ElementId {
        let (level, version) = (base.level(), base.version());
        base.set_pre_v4_rules(object.id_allowed_pre_v4(), object.name_allowed_pre_v4());
        let id = self.alloc(Entry {
            base,
            object: None,
            parent: None,
            owner: None,
        });
        object.create_lists(&mut |list: SedListOf| {
            let lid = self.insert(SedBase::new(level, version), Box::new(list));
            if let Some(e) = self.entry_mut(lid) {
                e.parent = Some(id);
            }
            lid
        });
        self.put_object(id, object);
        id
    }

    /// Stores `object` as a new, detached element at the document's level and version.
    pub fn create_element(&mut self, object: Box<dyn SedObject>) -> ElementId {
        let base = SedBase::new(self.level(), self.version());
        self.insert(base, object)
    }

    fn entry(&self, id: ElementId) -> Option<&Entry> {
        self.slots
            .get(id.index as usize)
            .filter(|s| s.generation == id.generation)
            .and_then(|s| s.entry.as_ref())
    }

    fn entry_mut(&mut self, id: ElementId) -> Option<&mut Entry> {
        self.slots
            .get_mut(id.index as usize)
            .filter(|s| s.generation == id.generation)
            .and_then(|s| s.entry.as_mut())
    }

    /// True if `id` still names a live element.
    pub fn contains(&self, id: ElementId) -> bool {
        self.entry(id).is_some()
    }

    pub fn base(&self, id: ElementId) -> Option<&SedBase> {
        self.entry(id).map(|e| &e.base)
    }

    pub fn base_mut(&mut self, id: ElementId) -> Option<&mut SedBase> {
        self.entry_mut(id).map(|e| &mut e.base)
    }

    pub fn object(&self, id: ElementId) -> Option<&dyn SedObject> {
        self.entry(id).and_then(|e| e.object.as_deref())
    }

    pub fn object_mut(&mut self, id: ElementId) -> Option<&mut (dyn SedObject + 'static)> {
        self.entry_mut(id).and_then(|e| e.object.as_deref_mut())
    }

    /// Downcasts the element's object to its concrete kind.
    pub fn get<T: SedObject + 'static>(&self, id: ElementId) -> Option<&T> {
        self.object(id).and_then(|o| o.as_any().downcast_ref::<T>())
    }

    pub fn get_mut<T: SedObject + 'static>(&mut self, id: ElementId) -> Option<&mut T> {
        self.object_mut(id)
            .and_then(|o| o.as_any_mut().downcast_mut::<T>())
    }

    pub fn type_code(&self, id: ElementId) -> Option<TypeCode> {
        self.object(id).map(|o| o.type_code())
    }

    pub fn element_name(&self, id: ElementId) -> Option<&str> {
        self.object(id).map(|o| o.element_name())
    }

    fn take_object(&mut self, id: ElementId) -> Option<Box<dyn SedObject>> {
        self.entry_mut(id).and_then(|e| e.object.take())
    }

    fn put_object(&mut self, id: ElementId, object: Box<dyn SedObject>) {
        if let Some(e) = self.entry_mut(id) {
            e.object = Some(object);
        }
    }

    // ---- tree ----

    pub fn parent(&self, id: ElementId) -> Option<ElementId> {
        self.entry(id).and_then(|e| e.parent)
    }

    pub fn children(&self, id: ElementId) -> Vec<ElementId> {
        self.object(id).map(|o| o.children()).unwrap_or_default()
    }

    /// The document root if `id` is attached to it.
    pub fn owner_document(&self, id: ElementId) -> Option<ElementId> {
        self.entry(id).and_then(|e| e.owner)
    }

    /// Level the element is effectively at: the document's when attached, else its own.
    pub fn element_level(&self, id: ElementId) -> Option<u32> {
        let e = self.entry(id)?;
        Some(match e.owner {
            Some(_) => self.level(),
            None => e.base.level(),
        })
    }

    pub fn element_version(&self, id: ElementId) -> Option<u32> {
        let e = self.entry(id)?;
        Some(match e.owner {
            Some(_) => self.version(),
            None => e.base.version(),
        })
    }

    /// Returns the nearest ancestor of `id` with the given type.
    ///
    /// The document root is never returned by the walk. Asking for
    /// [`TypeCode::Document`] returns the owning document directly.
    pub fn ancestor_of_type(&self, id: ElementId, type_code: TypeCode) -> Option<ElementId> {
        let mut cur = self.entry(id)?;
        if type_code == TypeCode::Document {
            return cur.owner;
        }
        while let Some(p) = cur.parent {
            if p == self.root {
                return None;
            }
            cur = self.entry(p)?;
            if cur.object.as_ref().map(|o| o.type_code()) == Some(type_code) {
                return Some(p);
            }
        }
        None
    }

    /// Descendants of `id` accepted by `filter`, depth first in write order.
    ///
    /// `id` itself is not included.
    pub fn all_elements<F>(&self, id: ElementId, filter: F) -> Vec<ElementId>
    where
        F: Fn(&SedBase, &dyn SedObject) -> bool,
    {
        let mut out = Vec::new();
        self.collect_elements(id, &filter, &mut out);
        out
    }

    fn collect_elements(
        &self,
        id: ElementId,
        filter: &dyn Fn(&SedBase, &dyn SedObject) -> bool,
        out: &mut Vec<ElementId>,
    ) {
        for c in self.children(id) {
            if let Some(e) = self.entry(c) {
                if let Some(o) = e.object.as_deref() {
                    if filter(&e.base, o) {
                        out.push(c);
                    }
                }
            }
            self.collect_elements(c, filter, out);
        }
    }

    fn find_descendant(&self, id: ElementId, pred: &dyn Fn(&SedBase) -> bool) -> Option<ElementId> {
        for c in self.children(id) {
            if self.base(c).map_or(false, pred) {
                return Some(c);
            }
            if let Some(found) = self.find_descendant(c, pred) {
                return Some(found);
            }
        }
        None
    }

    /// The first descendant of `id` whose `id` attribute is `sid`.
    pub fn element_by_sid(&self, id: ElementId, sid: &str) -> Option<ElementId> {
        if sid.is_empty() {
            return None;
        }
        self.find_descendant(id, &|b| b.id() == sid)
    }

    /// The first descendant of `id` whose `metaid` is `metaid`.
    pub fn element_by_metaid(&self, id: ElementId, metaid: &str) -> Option<ElementId> {
        if metaid.is_empty() {
            return None;
        }
        self.find_descendant(id, &|b| b.metaid() == metaid)
    }

    /// Sets `child`'s parent, updating the owning document of its whole subtree.
    ///
    /// The parent's own child list isn't changed; containers call this for
    /// children they have just stored.
    pub fn connect_to_parent(&mut self, child: ElementId, parent: Option<ElementId>) -> OpResult {
        if !self.contains(child) {
            return Err(OperationError::OperationFailed);
        }
        if let Some(p) = parent {
            if !self.contains(p) {
                return Err(OperationError::OperationFailed);
            }
            let mut cur = Some(p);
            while let Some(c) = cur {
                if c == child {
                    return Err(OperationError::InvalidObject);
                }
                cur = self.parent(c);
            }
        }
        self.link(child, parent);
        Ok(())
    }

    pub(crate) fn link(&mut self, child: ElementId, parent: Option<ElementId>) {
        let owner = parent.and_then(|p| self.owner_document(p));
        if let Some(e) = self.entry_mut(child) {
            e.parent = parent;
        }
        self.set_owner(child, owner);
    }

    fn set_owner(&mut self, id: ElementId, owner: Option<ElementId>) {
        let (level, version) = (self.level(), self.version());
        let children = match self.entry_mut(id) {
            Some(e) => {
                e.owner = owner;
                if owner.is_some() && (e.base.level() != level || e.base.version() != version) {
                    e.base.set_level_version(level, version);
                }
                e.object.as_ref().map(|o| o.children()).unwrap_or_default()
            }
            None => return,
        };
        for c in children {
            self.set_owner(c, owner);
        }
    }

    /// Makes `id` an orphan without deleting it.
    pub fn detach(&mut self, id: ElementId) -> OpResult {
        if id == self.root || !self.contains(id) {
            return Err(OperationError::OperationFailed);
        }
        if let Some(p) = self.parent(id) {
            if let Some(o) = self.object_mut(p) {
                o.remove_child(id);
            }
        }
        self.link(id, None);
        Ok(())
    }

    /// Removes `id` from its parent and deletes it and its descendants.
    pub fn remove_from_parent(&mut self, id: ElementId) -> OpResult {
        let parent = self.parent(id).ok_or(OperationError::OperationFailed)?;
        let removed = self
            .object_mut(parent)
            .map_or(false, |o| o.remove_child(id));
        if !removed {
            return Err(OperationError::OperationFailed);
        }
        self.delete(id);
        Ok(())
    }

    /// Deletes an orphaned element and its descendants.
    pub fn delete_element(&mut self, id: ElementId) -> OpResult {
        if id == self.root || !self.contains(id) || self.parent(id).is_some() {
            return Err(OperationError::OperationFailed);
        }
        self.delete(id);
        Ok(())
    }

    fn delete(&mut self, id: ElementId) {
        for c in self.children(id) {
            self.delete(c);
        }
        if let Some(slot) = self.slots.get_mut(id.index as usize) {
            if slot.generation == id.generation && slot.entry.take().is_some() {
                trace!("freed slot {}", id.index);
                slot.generation = slot.generation.wrapping_add(1);
                self.free.push(id.index);
            }
        }
    }

    /// Copies the subtree at `id` into new detached slots.
    ///
    /// Notes and annotation are copied; parent and document links are not.
    pub fn deep_copy(&mut self, id: ElementId) -> Option<ElementId> {
        let (base, object) = {
            let e = self.entry(id)?;
            (e.base.clone(), e.object.as_ref()?.clone_object())
        };
        let children = object.children();
        let new = self.alloc(Entry {
            base,
            object: Some(object),
            parent: None,
            owner: None,
        });
        let mut map = Vec::with_capacity(children.len());
        for c in children {
            if let Some(nc) = self.deep_copy(c) {
                if let Some(e) = self.entry_mut(nc) {
                    e.parent = Some(new);
                }
                map.push((c, nc));
            }
        }
        if let Some(o) = self.object_mut(new) {
            o.remap_children(&|old| map.iter().find(|(from, _)| *from == old).map(|(_, to)| *to));
        }
        Some(new)
    }

    /// Checks that `candidate` may be added under `parent`.
    pub fn check_compatibility(&self, parent: ElementId, candidate: ElementId) -> OpResult {
        let c = self.entry(candidate).ok_or(OperationError::OperationFailed)?;
        let o = c.object.as_ref().ok_or(OperationError::OperationFailed)?;
        if !o.has_required_attributes(&c.base) || !o.has_required_elements() {
            return Err(OperationError::InvalidObject);
        }
        let p = self.entry(parent).ok_or(OperationError::OperationFailed)?;
        let level = self.element_level(parent).unwrap_or_else(|| p.base.level());
        let version = self.element_version(parent).unwrap_or_else(|| p.base.version());
        if c.base.level() != level {
            Err(OperationError::LevelMismatch)
        } else if c.base.version() != version {
            Err(OperationError::VersionMismatch)
        } else if c.base.element_namespace() != p.base.element_namespace() {
            Err(OperationError::NamespacesMismatch)
        } else {
            Ok(())
        }
    }

    // ---- lists ----

    /// Appends the detached element `item` to the list `list`.
    pub fn list_append(&mut self, list: ElementId, item: ElementId) -> OpResult {
        self.check_compatibility(list, item)?;
        if self.parent(item).is_some() || item == self.root {
            return Err(OperationError::OperationFailed);
        }
        let item_name = self
            .element_name(item)
            .ok_or(OperationError::OperationFailed)?
            .to_owned();
        let l = self
            .get_mut::<SedListOf>(list)
            .ok_or(OperationError::OperationFailed)?;
        if !l.accepts(&item_name) {
            return Err(OperationError::InvalidObject);
        }
        l.push(item);
        self.link(item, Some(list));
        Ok(())
    }

    pub fn list_len(&self, list: ElementId) -> usize {
        self.get::<SedListOf>(list).map_or(0, SedListOf::len)
    }

    pub fn list_get(&self, list: ElementId, i: usize) -> Option<ElementId> {
        self.get::<SedListOf>(list).and_then(|l| l.get(i))
    }

    /// Finds the item of `list` with the given `id` attribute.
    pub fn list_get_by_id(&self, list: ElementId, id: &str) -> Option<ElementId> {
        let l = self.get::<SedListOf>(list)?;
        l.items()
            .iter()
            .copied()
            .find(|&item| self.base(item).map_or(false, |b| b.id() == id))
    }

    /// Removes item `i` of `list`, returning it detached.
    pub fn list_remove(&mut self, list: ElementId, i: usize) -> Option<ElementId> {
        let item = self.get_mut::<SedListOf>(list)?.remove(i)?;
        self.link(item, None);
        Some(item)
    }

    // ---- generic attribute access ----

    pub fn get_attribute(&self, id: ElementId, name: &str) -> Option<String> {
        let e = self.entry(id)?;
        let b = &e.base;
        let v = match name {
            "metaid" => b.metaid(),
            "id" => b.id(),
            "name" => b.name(),
            _ => return e.object.as_ref()?.get_attribute(name),
        };
        if v.is_empty() {
            None
        } else {
            Some(v.to_owned())
        }
    }

    pub fn is_set_attribute(&self, id: ElementId, name: &str) -> bool {
        self.get_attribute(id, name).is_some()
    }

    pub fn set_attribute(&mut self, id: ElementId, name: &str, value: &str) -> OpResult {
        let e = self.entry_mut(id).ok_or(OperationError::OperationFailed)?;
        match name {
            "metaid" => e.base.set_metaid(value),
            "id" => e.base.set_id(value),
            "name" => e.base.set_name(value),
            _ => e
                .object
                .as_mut()
                .and_then(|o| o.set_attribute(name, value))
                .unwrap_or(Err(OperationError::OperationFailed)),
        }
    }

    pub fn unset_attribute(&mut self, id: ElementId, name: &str) -> OpResult {
        let e = self.entry_mut(id).ok_or(OperationError::OperationFailed)?;
        match name {
            "metaid" => e.base.unset_metaid(),
            "id" => e.base.unset_id(),
            "name" => e.base.unset_name(),
            _ => e
                .object
                .as_mut()
                .and_then(|o| o.unset_attribute(name))
                .unwrap_or(Err(OperationError::OperationFailed)),
        }
    }

    // ---- notes and annotation from strings, with the document's prefixes in scope ----

    fn with_base_and_namespaces<F>(&mut self, id: ElementId, f: F) -> OpResult
    where
        F: FnOnce(&mut SedBase, &XmlNamespaces) -> OpResult,
    {
        let ns = self.namespaces().namespaces().clone();
        let base = self.base_mut(id).ok_or(OperationError::OperationFailed)?;
        f(base, &ns)
    }

    pub fn set_notes_str(&mut self, id: ElementId, notes: &str, add_xhtml_markup: bool) -> OpResult {
        self.with_base_and_namespaces(id, |b, ns| b.set_notes_str_in(notes, add_xhtml_markup, Some(ns)))
    }

    pub fn append_notes_str(&mut self, id: ElementId, notes: &str) -> OpResult {
        self.with_base_and_namespaces(id, |b, ns| b.append_notes_str_in(notes, Some(ns)))
    }

    pub fn set_annotation_str(&mut self, id: ElementId, annotation: &str) -> OpResult {
        self.with_base_and_namespaces(id, |b, ns| b.set_annotation_str_in(annotation, Some(ns)))
    }

    pub fn append_annotation_str(&mut self, id: ElementId, annotation: &str) -> OpResult {
        self.with_base_and_namespaces(id, |b, ns| b.append_annotation_str_in(annotation, Some(ns)))
    }

    pub fn replace_top_level_annotation_element_str(&mut self, id: ElementId, annotation: &str) -> OpResult {
        self.with_base_and_namespaces(id, |b, ns| {
            b.replace_top_level_annotation_element_str_in(annotation, Some(ns))
        })
    }

    // ---- reading ----

    fn log_at(&mut self, code: SedErrorCode, message: &str, line: u32, column: u32) {
        let (level, version) = (self.level(), self.version());
        self.log.log(code, level, version, message, line, column);
    }

    /// Reads the element starting at the stream's next token into `id`.
    ///
    /// Does nothing if the next token isn't a start tag.
    pub(crate) fn read_element(&mut self, id: ElementId, stream: &mut XmlInputStream) {
        if !stream.peek().is_start() {
            return;
        }
        let element = stream.next();
        let mut object = match self.take_object(id) {
            Some(o) => o,
            None => {
                stream.skip_past_end(&element);
                return;
            }
        };
        let name = object.element_name().to_owned();
        let is_root = object.type_code() == TypeCode::Document;
        let (line, column) = (element.line(), element.column());
        if let Some(b) = self.base_mut(id) {
            b.set_position(line, column);
        }

        let mut expected = ExpectedAttributes::new();
        if let Some(b) = self.base(id) {
            b.add_expected_attributes(&mut expected);
        }
        object.add_expected_attributes(&mut expected);
        let first_error = self.log.num_errors();
        let problems = match self.base_mut(id) {
            Some(b) => b.read_attributes(&name, element.attributes(), &expected),
            None => Vec::new(),
        };
        for (code, message) in problems {
            self.log_at(code, &message, line, column);
        }
        object.read_attributes(&mut ReadContext { doc: &mut *self, id }, element.attributes());
        if let Some(code) = object.allowed_attributes_code() {
            self.log.remap(first_error, SedErrorCode::SedUnknownCoreAttribute, code);
        }

        if is_root {
            self.read_root_namespaces(&element);
        } else {
            self.check_element_namespace(id, &element);
        }

        if !element.is_end() {
            self.read_children(id, object.as_mut(), &element, stream);
        }
        self.put_object(id, object);
    }

    fn read_children(
        &mut self,
        id: ElementId,
        object: &mut dyn SedObject,
        element: &XmlToken,
        stream: &mut XmlInputStream,
    ) {
        let name = object.element_name().to_owned();
        let mut position = -1;
        while stream.is_good() {
            let mut text = String::new();
            while stream.is_good() && stream.peek().is_text() {
                text.push_str(stream.next().characters());
            }
            object.set_element_text(&text);

            if !stream.is_good() {
                break;
            }
            let next = stream.peek();
            if next.is_end_for(element) {
                stream.next();
                break;
            }
            if !next.is_start() {
                stream.next();
                continue;
            }
            let next = next.clone();
            let child = object.create_object(&mut ReadContext { doc: &mut *self, id }, &next);
            match child {
                Some(child) => {
                    let child_position = self.object(child).map_or(-1, |o| o.element_position());
                    if child_position != -1 && child_position < position {
                        self.log_at(
                            SedErrorCode::SedNotSchemaConformant,
                            &format!(
                                "Element <{}> is out of order within the <{}> element.",
                                next.name(),
                                name
                            ),
                            next.line(),
                            next.column(),
                        );
                    }
                    position = position.max(child_position);
                    self.link(child, Some(id));
                    self.read_element(child, stream);
                    if !stream.is_good() {
                        break;
                    }
                    self.check_list_populated(child, &next);
                }
                None => {
                    let mut claimed = object.read_other_xml(&mut ReadContext { doc: &mut *self, id }, stream);
                    if !claimed {
                        claimed = self.read_annotation(id, &name, stream) || self.read_notes(id, &name, stream);
                    }
                    if !claimed {
                        self.log_at(
                            SedErrorCode::SedUnrecognizedElement,
                            &format!(
                                "Element '{}' is not part of the definition of SED-ML Level {} Version {}.",
                                next.name(),
                                self.level(),
                                self.version()
                            ),
                            next.line(),
                            next.column(),
                        );
                        let skipped = stream.next();
                        stream.skip_past_end(&skipped);
                    }
                }
            }
        }
    }

    fn check_list_populated(&mut self, child: ElementId, token: &XmlToken) {
        let empty = self
            .get::<SedListOf>(child)
            .map_or(false, |l| l.len() == 0);
        if empty {
            self.log_at(
                SedErrorCode::SedEmptyListElement,
                &format!("{} cannot be empty.", token.name()),
                token.line(),
                token.column(),
            );
        }
    }

    fn read_root_namespaces(&mut self, element: &XmlToken) {
        let declared = element.namespaces();
        if !declared.is_empty() {
            let uri = declared.uri_for_prefix(element.prefix()).unwrap_or("");
            let deduplicate = [
                SedErrorCode::SedmlDocumentAllowedCoreAttributes,
                SedErrorCode::SedmlDocumentLevelMustBeNonNegativeInteger,
                SedErrorCode::SedmlDocumentVersionMustBeNonNegativeInteger,
                SedErrorCode::InvalidNamespaceOnSed,
            ];
            if !is_sed_namespace(uri) && uri != XSI_NS && !deduplicate.iter().any(|&c| self.log.contains(c)) {
                self.log_at(
                    SedErrorCode::InvalidNamespaceOnSed,
                    "The prefix for the <sedml> element does not match the prefix for the SED-ML namespace.  \
                     This means that the <sedml> element in not in the SedNamespace.",
                    element.line(),
                    element.column(),
                );
            }
        }

        let ns = self.namespaces_mut();
        let core = ns.uri();
        let table = ns.namespaces_mut();
        *table = XmlNamespaces::new();
        if declared.is_empty() {
            table.add(core, "");
            return;
        }
        for (prefix, uri) in declared.iter() {
            table.add(uri, prefix);
        }
        if !declared.iter().any(|(_, u)| is_sed_namespace(u)) && table.index_of_prefix(element.prefix()).is_none() {
            table.add(core, element.prefix());
        }
    }

    fn check_element_namespace(&mut self, id: ElementId, element: &XmlToken) {
        let problems: Vec<_> = match self.base_mut(id) {
            Some(b) => {
                b.namespaces_mut().add_namespaces(element.namespaces());
                let mut p: Vec<_> = b
                    .default_namespace_problem(element.namespaces(), element.name(), "")
                    .into_iter()
                    .collect();
                if !element.prefix().is_empty() {
                    p.extend(b.default_namespace_problem(element.namespaces(), element.name(), element.prefix()));
                }
                p
            }
            None => return,
        };
        for (code, message) in problems {
            self.log_at(code, &message, element.line(), element.column());
        }
    }

    fn read_annotation(&mut self, id: ElementId, element_name: &str, stream: &mut XmlInputStream) -> bool {
        let (line, column) = {
            let next = stream.peek();
            if next.name() != "annotation" {
                return false;
            }
            (next.line(), next.column())
        };
        let annotation = match XmlNode::from_stream(stream) {
            Some(a) => a,
            None => return true,
        };
        let doc_ns = self.namespaces().namespaces().clone();
        let problems = match self.base_mut(id) {
            Some(b) => {
                let mut p = Vec::new();
                if b.is_set_annotation() {
                    p.push((
                        SedErrorCode::SedMultipleAnnotations,
                        format!("A SED-ML <{}> element has multiple <annotation> children.", element_name),
                    ));
                }
                b.replace_annotation(annotation);
                p.extend(b.annotation_problems(element_name, Some(&doc_ns)));
                p
            }
            None => return true,
        };
        for (code, message) in problems {
            self.log_at(code, &message, line, column);
        }
        true
    }

    fn read_notes(&mut self, id: ElementId, element_name: &str, stream: &mut XmlInputStream) -> bool {
        let (line, column) = {
            let next = stream.peek();
            if next.name() != "notes" {
                return false;
            }
            (next.line(), next.column())
        };
        let notes = match XmlNode::from_stream(stream) {
            Some(n) => n,
            None => return true,
        };
        let doc_ns = self.namespaces().namespaces().clone();
        let mut problems = Vec::new();
        let check_xhtml = match self.base_mut(id) {
            Some(b) => {
                if b.is_set_notes() {
                    problems.push((
                        SedErrorCode::SedOnlyOneNotesElementAllowed,
                        format!("A SED-ML <{}> element has multiple <notes> children.", element_name),
                    ));
                }
                if b.is_set_annotation() {
                    problems.push((
                        SedErrorCode::SedNotSchemaConformant,
                        format!(
                            "The <notes> element of a SED-ML <{}> element must precede its <annotation>.",
                            element_name
                        ),
                    ));
                }
                problems.extend(b.default_namespace_problem(notes.namespaces(), "notes", ""));
                let check = b.requires_xhtml();
                b.replace_notes(notes);
                check
            }
            None => return true,
        };
        if check_xhtml {
            for e in self.log.errors() {
                match e.code {
                    SedErrorCode::BadXmlDeclLocation => {
                        problems.push((SedErrorCode::SedNotesContainsXmlDecl, String::new()))
                    }
                    SedErrorCode::BadlyFormedXml => {
                        problems.push((SedErrorCode::SedNotesContainsDoctype, String::new()))
                    }
                    _ => {}
                }
            }
            if let Some(n) = self.base(id).and_then(SedBase::notes) {
                for code in check_notes_content(n, Some(&doc_ns)) {
                    problems.push((code, String::new()));
                }
            }
        }
        for (code, message) in problems {
            self.log_at(code, &message, line, column);
        }
        true
    }

    // ---- writing ----

    /// Prefix the core namespace is written with.
    pub(crate) fn core_prefix(&self) -> &str {
        let ns = self.namespaces();
        match ns.namespaces().prefix_for_uri(ns.uri()) {
            Some(p) => p,
            None if ns.namespaces().index_of_prefix("").is_none() => "",
            None => "sedml",
        }
    }

    fn prefix_for(&self, base: &SedBase) -> String {
        let uri = base.element_namespace();
        if uri == self.namespaces().uri() {
            return self.core_prefix().to_owned();
        }
        self.namespaces()
            .namespaces()
            .prefix_for_uri(uri)
            .or_else(|| base.namespaces().namespaces().prefix_for_uri(uri))
            .unwrap_or("")
            .to_owned()
    }

    /// True for a list with no items, notes or annotation, which is left out when writing.
    fn is_bare_empty_list(&self, id: ElementId) -> bool {
        let empty = self.get::<SedListOf>(id).map_or(false, |l| l.len() == 0);
        empty
            && self
                .base(id)
                .map_or(true, |b| !b.is_set_notes() && !b.is_set_annotation())
    }

    /// Serializes the element `id` and its subtree without an XML declaration.
    pub fn to_sed_string(&self, id: ElementId) -> Result<String, ser::Error> {
        ser::Serializer::new()
            .fragment(true)
            .to_string(|s| self.write_element(id, s))
    }

    /// Writes the element `id` and its subtree.
    pub(crate) fn write_element(&self, id: ElementId, stream: &mut XmlOutputStream) -> Result<(), ser::Error> {
        let e = self
            .entry(id)
            .ok_or_else(|| ser::Error(format!("stale element handle {:?}", id)))?;
        let object = e
            .object
            .as_ref()
            .ok_or_else(|| ser::Error(format!("element {:?} is being read", id)))?;
        let name = object.element_name();
        let prefix = self.prefix_for(&e.base);
        let ctx = WriteContext { doc: self, id };
        stream.start_element(name, &prefix)?;
        object.write_xmlns(&ctx, stream)?;
        e.base.write_attributes(stream)?;
        object.write_attributes(&ctx, stream)?;
        if let Some(n) = e.base.notes() {
            stream.write_node(n)?;
        }
        if let Some(a) = e.base.annotation() {
            stream.write_node(a)?;
        }
        for c in object.children() {
            if self.is_bare_empty_list(c) {
                continue;
            }
            self.write_element(c, stream)?;
        }
        for n in object.other_xml() {
            stream.write_node(n)?;
        }
        stream.end_element(name, &prefix)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::elements::{ChangeAttribute, Model};
    use assert_matches::assert_matches;

    fn init() {
        let _ = env_logger::Builder::new().is_test(true).try_init();
    }

    fn model(doc: &mut SedDocument, id: &str) -> ElementId {
        let m = doc.create_element(Box::new(Model::default()));
        doc.base_mut(m).unwrap().set_id(id).unwrap();
        doc.set_attribute(m, "source", "m.xml").unwrap();
        doc.set_attribute(m, "language", "urn:sedml:language:sbml").unwrap();
        m
    }

    #[test]
    fn stale_handles_stop_resolving() {
        init();
        let mut doc = SedDocument::new(1, 4);
        let models = doc.list_of_models().unwrap();
        let m = model(&mut doc, "m1");
        doc.list_append(models, m).unwrap();
        assert_eq!(doc.owner_document(m), Some(doc.root()));
        doc.remove_from_parent(m).unwrap();
        assert!(!doc.contains(m));
        assert_eq!(doc.ancestor_of_type(m, TypeCode::Document), None);
        let reused = model(&mut doc, "m2");
        assert_ne!(reused, m);
        assert!(doc.base(m).is_none());
    }

    #[test]
    fn ancestors() {
        init();
        let mut doc = SedDocument::new(1, 4);
        let models = doc.list_of_models().unwrap();
        let m = model(&mut doc, "m1");
        doc.list_append(models, m).unwrap();
        let changes = doc.get::<Model>(m).unwrap().list_of_changes().unwrap();
        let c = doc.create_element(Box::new(ChangeAttribute::default()));
        doc.set_attribute(c, "target", "/x").unwrap();
        doc.set_attribute(c, "newValue", "1").unwrap();
        doc.list_append(changes, c).unwrap();

        assert_eq!(doc.ancestor_of_type(c, TypeCode::Model), Some(m));
        assert_eq!(doc.ancestor_of_type(c, TypeCode::ListOf), Some(changes));
        assert_eq!(doc.ancestor_of_type(c, TypeCode::Document), Some(doc.root()));
        assert_eq!(doc.ancestor_of_type(c, TypeCode::Task), None);

        doc.detach(m).unwrap();
        assert_eq!(doc.ancestor_of_type(c, TypeCode::Document), None);
        assert_eq!(doc.ancestor_of_type(c, TypeCode::Model), Some(m));
        assert_eq!(doc.list_len(models), 0);
    }

    #[test]
    fn cycles_rejected() {
        let mut doc = SedDocument::new(1, 4);
        let m = model(&mut doc, "m1");
        let changes = doc.get::<Model>(m).unwrap().list_of_changes().unwrap();
        assert_eq!(doc.connect_to_parent(m, Some(changes)), Err(OperationError::InvalidObject));
        assert_eq!(doc.parent(changes), Some(m));
    }

    #[test]
    fn compatibility() {
        let mut doc = SedDocument::new(1, 4);
        let models = doc.list_of_models().unwrap();
        let incomplete = doc.create_element(Box::new(Model::default()));
        assert_eq!(doc.list_append(models, incomplete), Err(OperationError::InvalidObject));
        let m = model(&mut doc, "m1");
        doc.base_mut(m).unwrap().set_level_version(1, 3);
        assert_eq!(doc.check_compatibility(models, m), Err(OperationError::VersionMismatch));
        doc.base_mut(m).unwrap().set_level_version(1, 4);
        doc.base_mut(m).unwrap().set_element_namespace("http://example.com/ext").unwrap();
        assert_eq!(doc.check_compatibility(models, m), Err(OperationError::NamespacesMismatch));
        doc.delete_element(m).unwrap();
        assert_eq!(doc.check_compatibility(models, m), Err(OperationError::OperationFailed));
    }

    #[test]
    fn deep_copy_is_detached() {
        init();
        let mut doc = SedDocument::new(1, 4);
        let models = doc.list_of_models().unwrap();
        let m = model(&mut doc, "m1");
        doc.base_mut(m).unwrap().set_user_data(7);
        doc.set_notes_str(m, "<p xmlns=\"http://www.w3.org/1999/xhtml\">n</p>", false).unwrap();
        doc.list_append(models, m).unwrap();
        let changes = doc.get::<Model>(m).unwrap().list_of_changes().unwrap();
        let c = doc.create_element(Box::new(ChangeAttribute::default()));
        doc.set_attribute(c, "target", "/x").unwrap();
        doc.set_attribute(c, "newValue", "1").unwrap();
        doc.list_append(changes, c).unwrap();

        let copy = doc.deep_copy(m).unwrap();
        assert_eq!(doc.parent(copy), None);
        assert_eq!(doc.owner_document(copy), None);
        assert_eq!(doc.base(copy).unwrap().user_data(), Some(7));
        assert_eq!(doc.base(copy).unwrap().notes_string(), doc.base(m).unwrap().notes_string());
        let copied_changes = doc.get::<Model>(copy).unwrap().list_of_changes().unwrap();
        assert_ne!(copied_changes, changes);
        assert_eq!(doc.parent(copied_changes), Some(copy));
        let copied_change = doc.list_get(copied_changes, 0).unwrap();
        assert_ne!(copied_change, c);
        assert_eq!(doc.get_attribute(copied_change, "target").as_deref(), Some("/x"));
        assert_eq!(doc.ancestor_of_type(copied_change, TypeCode::Model), Some(copy));
    }

    #[test]
    fn generic_attributes() {
        let mut doc = SedDocument::new(1, 4);
        let m = model(&mut doc, "m1");
        assert_eq!(doc.get_attribute(m, "id").as_deref(), Some("m1"));
        assert!(doc.is_set_attribute(m, "source"));
        assert_matches!(doc.set_attribute(m, "metaid", "x"), Err(OperationError::UnexpectedAttribute));
        assert_matches!(doc.set_attribute(m, "bogus", "x"), Err(OperationError::OperationFailed));
        doc.unset_attribute(m, "source").unwrap();
        assert!(!doc.is_set_attribute(m, "source"));
    }

    #[test]
    fn level_version_propagates() {
        let mut doc = SedDocument::new(1, 3);
        let m = model(&mut doc, "m1");
        let models = doc.list_of_models().unwrap();
        doc.list_append(models, m).unwrap();
        doc.set_level_version(1, 4).unwrap();
        assert_eq!(doc.base(m).unwrap().version(), 4);
        assert_eq!(
            doc.base(m).unwrap().element_namespace(),
            crate::namespaces::SEDML_XMLNS_L1V4
        );
        assert_eq!(doc.set_level_version(2, 1), Err(OperationError::InvalidAttributeValue));
    }

    #[test]
    fn lookups_walk_descendants() {
        init();
        let mut doc = SedDocument::new(1, 4);
        let models = doc.list_of_models().unwrap();
        let m1 = model(&mut doc, "m1");
        let m2 = model(&mut doc, "m2");
        doc.list_append(models, m1).unwrap();
        doc.list_append(models, m2).unwrap();
        let c = doc.create_element(Box::new(ChangeAttribute::default()));
        doc.set_attribute(c, "target", "/x").unwrap();
        doc.set_attribute(c, "newValue", "1").unwrap();
        let changes = doc.get::<Model>(m1).unwrap().list_of_changes().unwrap();
        doc.list_append(changes, c).unwrap();

        let root = doc.root();
        assert_eq!(doc.element_by_sid(root, "m2"), Some(m2));
        assert_eq!(doc.element_by_sid(root, "nope"), None);
        assert_eq!(doc.element_by_sid(root, ""), None);
        // The starting element itself is not a candidate.
        assert_eq!(doc.element_by_sid(m2, "m2"), None);

        let all = doc.all_elements(root, |_, _| true);
        assert_eq!(all[..4], [doc.list_of_models().unwrap(), m1, changes, c]);
        assert_eq!(all.iter().position(|&e| e == m2), Some(4));
        let found = doc.all_elements(root, |_, o| o.type_code() == TypeCode::Model);
        assert_eq!(found, vec![m1, m2]);
        assert_eq!(doc.all_elements(c, |_, _| true), Vec::new());
    }

    #[test]
    fn metaid_lookup() {
        init();
        let mut doc = SedDocument::new(2, 1);
        let models = doc.list_of_models().unwrap();
        let m = model(&mut doc, "m1");
        doc.base_mut(m).unwrap().set_metaid("meta_m1").unwrap();
        doc.list_append(models, m).unwrap();
        let root = doc.root();
        assert_eq!(doc.element_by_metaid(root, "meta_m1"), Some(m));
        assert_eq!(doc.element_by_metaid(root, "meta_m2"), None);
        assert_eq!(doc.element_by_metaid(root, ""), None);
    }

    #[test]
    fn single_element_to_string() {
        init();
        let mut doc = SedDocument::new(1, 4);
        let models = doc.list_of_models().unwrap();
        let m = model(&mut doc, "m1");
        doc.list_append(models, m).unwrap();
        let xml = doc.to_sed_string(m).unwrap();
        assert!(xml.starts_with("<model "), "{}", &xml);
        assert!(xml.contains(r#"id="m1""#), "{}", &xml);
        assert!(!xml.contains("<?xml"), "{}", &xml);
        assert!(!xml.contains("listOfChanges"), "{}", &xml);
    }

    #[test]
    fn annotated_empty_list_is_written() {
        init();
        let mut doc = SedDocument::new(1, 4);
        let root = doc.root();
        let tasks = doc.list_of_tasks().unwrap();
        doc.set_notes_str(tasks, "no tasks yet", true).unwrap();
        let xml = doc.to_sed_string(root).unwrap();
        assert!(xml.contains("<listOfTasks>"), "{}", &xml);
        assert!(xml.contains("no tasks yet"), "{}", &xml);
        assert!(!xml.contains("listOfModels"), "{}", &xml);
    }
}
