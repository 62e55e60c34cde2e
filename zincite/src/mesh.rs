//! Element identities and the mesh that owns them
//!
//! The mesh is the sole owner of its elements.  Everything else in the crate
//! refers to elements by [`ElementId`], a plain integer handle: holding an id
//! never extends an element's lifetime, and an id whose element has been
//! destroyed simply stops resolving.
use crate::Error;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Maximum parametric (xi) dimension of an element
pub const MAX_ELEMENT_DIMENSION: usize = 3;

/// Identifier for a single element within a [`Mesh`]
#[derive(
    Copy, Clone, Debug, Eq, PartialEq, Hash, Ord, PartialOrd, Serialize, Deserialize,
)]
pub struct ElementId(u32);

impl std::fmt::Display for ElementId {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[derive(Copy, Clone, Debug)]
struct Element {
    dimension: usize,
    parent: Option<ElementId>,
}

/// An id-keyed store of finite elements
///
/// Elements are cells of dimension 1 to [`MAX_ELEMENT_DIMENSION`], optionally
/// arranged in a parent/face hierarchy: a face of a 3D element is a 2D
/// element whose `parent` is the volume.  The *top-level* element of any
/// element is its outermost ancestor, used to resolve field values defined
/// with respect to a higher-dimensional context.
///
/// Destroying an element does not notify evaluation caches; the owner of a
/// [`FieldCache`](crate::FieldCache) is expected to call
/// [`mesh_changed`](crate::FieldCache::mesh_changed) after structural edits,
/// the same channel used for nodal parameter changes.
#[derive(Debug, Default)]
pub struct Mesh {
    elements: HashMap<ElementId, Element>,
    next_id: u32,
}

impl Mesh {
    /// Builds an empty mesh
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a top-level element of the given dimension
    pub fn create_element(&mut self, dimension: usize) -> Result<ElementId, Error> {
        if dimension == 0 || dimension > MAX_ELEMENT_DIMENSION {
            return Err(Error::BadDimension(dimension));
        }
        Ok(self.store(Element {
            dimension,
            parent: None,
        }))
    }

    /// Creates a face-style child element of `parent`
    ///
    /// The child's dimension must be strictly below its parent's (and at
    /// least 1; 0-dimensional entities are nodes, not elements).
    pub fn create_child(
        &mut self,
        parent: ElementId,
        dimension: usize,
    ) -> Result<ElementId, Error> {
        let parent_dimension = self.dimension(parent)?;
        if dimension == 0 || dimension >= parent_dimension {
            return Err(Error::BadChildDimension(dimension, parent_dimension));
        }
        Ok(self.store(Element {
            dimension,
            parent: Some(parent),
        }))
    }

    fn store(&mut self, element: Element) -> ElementId {
        let id = ElementId(self.next_id);
        self.next_id += 1;
        self.elements.insert(id, element);
        id
    }

    /// Removes an element from the mesh
    ///
    /// Children of the element are left in place and become top-level for the
    /// purposes of [`top_level_of`](Self::top_level_of).
    pub fn destroy_element(&mut self, element: ElementId) -> Result<(), Error> {
        self.elements
            .remove(&element)
            .map(|_| ())
            .ok_or(Error::UnknownElement(element))
    }

    /// Checks whether an element is present
    pub fn contains(&self, element: ElementId) -> bool {
        self.elements.contains_key(&element)
    }

    /// Returns the parametric dimension of an element
    pub fn dimension(&self, element: ElementId) -> Result<usize, Error> {
        self.elements
            .get(&element)
            .map(|e| e.dimension)
            .ok_or(Error::UnknownElement(element))
    }

    /// Returns the immediate parent of an element, if it has one
    pub fn parent(&self, element: ElementId) -> Result<Option<ElementId>, Error> {
        self.elements
            .get(&element)
            .map(|e| e.parent)
            .ok_or(Error::UnknownElement(element))
    }

    /// Walks to the outermost ancestor of an element
    ///
    /// An element with no (surviving) parent is its own top-level element.
    pub fn top_level_of(&self, element: ElementId) -> Result<ElementId, Error> {
        let mut current = element;
        let mut info = self
            .elements
            .get(&current)
            .ok_or(Error::UnknownElement(element))?;
        while let Some(parent) = info.parent {
            match self.elements.get(&parent) {
                Some(parent_info) => {
                    current = parent;
                    info = parent_info;
                }
                None => break,
            }
        }
        Ok(current)
    }

    /// Number of elements in the mesh
    pub fn len(&self) -> usize {
        self.elements.len()
    }

    /// Checks whether the mesh has no elements
    pub fn is_empty(&self) -> bool {
        self.elements.is_empty()
    }
}
