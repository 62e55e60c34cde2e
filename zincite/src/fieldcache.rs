//! Caller-scoped evaluation contexts
//!
//! A [`FieldCache`] bundles an evaluation location (element + xi, plus time)
//! with one [`ElementValuesCache`] per field it has evaluated.  Contexts are
//! single-threaded and never share their caches: sharing across contexts
//! would save some recomputation but aliases per-context times in subtle
//! ways, so each context pays for its own table.
use crate::cache::{CacheSettings, ElementValuesCache, ValuesRequest};
use crate::eval::NodalInterpolation;
use crate::field::Field;
use crate::mesh::{ElementId, Mesh, MAX_ELEMENT_DIMENSION};
use crate::Error;
use arrayvec::ArrayVec;
use nalgebra::{DMatrix, DVector};
use std::collections::HashMap;

/// An evaluation context: a location, a time, and per-field value caches
///
/// Invalidation is synchronous and caller-driven: whoever mutates a field or
/// the mesh calls [`field_changed`](Self::field_changed) or
/// [`mesh_changed`](Self::mesh_changed) on every live context afterwards.
/// Element destruction rides the same channel: a context told the mesh
/// changed drops every cached record, so entries for dead elements never
/// survive.
#[derive(Debug, Default)]
pub struct FieldCache {
    element: Option<ElementId>,
    top_level: Option<ElementId>,
    xi: ArrayVec<f64, MAX_ELEMENT_DIMENSION>,
    time: f64,
    settings: CacheSettings,
    caches: HashMap<String, ElementValuesCache>,
}

impl FieldCache {
    /// Builds a context with no location, at time 0
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds a context whose per-field caches use the given settings
    pub fn with_settings(settings: CacheSettings) -> Self {
        Self {
            settings,
            ..Self::default()
        }
    }

    /// Sets the evaluation time
    pub fn set_time(&mut self, time: f64) {
        self.time = time;
    }

    /// Current evaluation time
    pub fn time(&self) -> f64 {
        self.time
    }

    /// Sets the evaluation location to an element-local xi coordinate
    ///
    /// The xi count must match the element's dimension; this is checked at
    /// evaluation time against the mesh.  The top-level context defaults to
    /// the element's outermost ancestor.
    pub fn set_mesh_location(&mut self, element: ElementId, xi: &[f64]) -> Result<(), Error> {
        if xi.is_empty() || xi.len() > MAX_ELEMENT_DIMENSION {
            return Err(Error::BadXiCount(xi.len(), MAX_ELEMENT_DIMENSION));
        }
        self.element = Some(element);
        self.top_level = None;
        self.xi = xi.iter().copied().collect();
        Ok(())
    }

    /// Like [`set_mesh_location`](Self::set_mesh_location), with an explicit
    /// top-level element to inherit from
    pub fn set_mesh_location_with_top_level(
        &mut self,
        element: ElementId,
        xi: &[f64],
        top_level: ElementId,
    ) -> Result<(), Error> {
        self.set_mesh_location(element, xi)?;
        self.top_level = Some(top_level);
        Ok(())
    }

    /// Forgets the evaluation location
    pub fn clear_location(&mut self) {
        self.element = None;
        self.top_level = None;
        self.xi.clear();
    }

    /// Evaluates a field's components at the current location
    pub fn evaluate(&mut self, mesh: &Mesh, field: &Field) -> Result<DVector<f64>, Error> {
        let request = self.request(mesh, field, false, &[])?;
        let evaluator = NodalInterpolation::new(mesh, field);
        let cache = Self::cache_for(&mut self.caches, self.settings, field);
        let values = cache.get_or_compute(&evaluator, &request)?;
        values.evaluate(&self.xi)
    }

    /// Evaluates a field's component derivatives with respect to xi
    ///
    /// Returns a components x dimension matrix.
    pub fn evaluate_derivatives(
        &mut self,
        mesh: &Mesh,
        field: &Field,
    ) -> Result<DMatrix<f64>, Error> {
        let request = self.request(mesh, field, true, &[])?;
        let evaluator = NodalInterpolation::new(mesh, field);
        let cache = Self::cache_for(&mut self.caches, self.settings, field);
        let values = cache.get_or_compute(&evaluator, &request)?;
        values.evaluate_derivatives(&self.xi)
    }

    /// Evaluates successive directional derivatives of a field
    ///
    /// The field's interpolation is differentiated once per entry of
    /// `directions` (xi indices, applied in order) before evaluation, so
    /// `&[0, 0]` yields the second derivative along xi1.
    pub fn evaluate_basis_derivative(
        &mut self,
        mesh: &Mesh,
        field: &Field,
        directions: &[u8],
    ) -> Result<DVector<f64>, Error> {
        let request = self.request(mesh, field, false, directions)?;
        let evaluator = NodalInterpolation::new(mesh, field);
        let cache = Self::cache_for(&mut self.caches, self.settings, field);
        let values = cache.get_or_compute(&evaluator, &request)?;
        values.evaluate(&self.xi)
    }

    fn request(
        &self,
        mesh: &Mesh,
        field: &Field,
        need_derivatives: bool,
        directions: &[u8],
    ) -> Result<ValuesRequest, Error> {
        let element = self.element.ok_or(Error::NoLocation)?;
        let top_level = match self.top_level {
            Some(top_level) => top_level,
            None => mesh.top_level_of(element)?,
        };
        // A field with no time sequence always evaluates at time 0, so a
        // time sweep over static fields stays a cache hit.
        let time = if field.is_time_dependent() { self.time } else { 0.0 };
        Ok(ValuesRequest {
            element,
            time,
            top_level,
            need_derivatives,
            differential: directions.to_vec(),
        })
    }

    fn cache_for<'a>(
        caches: &'a mut HashMap<String, ElementValuesCache>,
        settings: CacheSettings,
        field: &Field,
    ) -> &'a mut ElementValuesCache {
        caches
            .entry(field.name().to_owned())
            .or_insert_with(|| ElementValuesCache::with_settings(settings))
    }

    /// Read-only view of the value cache held for a field, if any
    pub fn values_cache(&self, field_name: &str) -> Option<&ElementValuesCache> {
        self.caches.get(field_name)
    }

    /// Drops cached values for one field
    ///
    /// Call after the field's parameters change (for example at the end of a
    /// change batch): every interpolation computed from them is now stale.
    pub fn field_changed(&mut self, field_name: &str) {
        if let Some(cache) = self.caches.get_mut(field_name) {
            cache.clear();
        }
    }

    /// Drops every cached value
    ///
    /// Call after structural mesh edits, including element destruction.
    pub fn mesh_changed(&mut self) {
        for cache in self.caches.values_mut() {
            cache.clear();
        }
    }

    /// Drops every cached value unconditionally
    pub fn clear(&mut self) {
        self.mesh_changed();
    }
}
