//! Zincite is a library for cached evaluation of finite-element fields.
//!
//! A **field** is a named, multi-component quantity defined over the
//! elements of a **mesh** by interpolating corner ("nodal") parameters.
//! Evaluating a field at a point inside an element first builds the
//! element's interpolation coefficients (an expensive conversion of nodal
//! parameters into monomial form) and then evaluates that polynomial at the
//! local `xi` coordinate.  Quadrature loops evaluate the same element at
//! many points in a row, so the coefficient step dominates unless it is
//! memoized; the heart of this crate is the per-context memo table that does
//! exactly that.
//!
//! # Meshes and fields
//! A [`Mesh`] owns elements and hands out copyable [`ElementId`] handles.
//! Fields store parameters per element and may carry a time sequence:
//! ```
//! use zincite::{Field, Mesh};
//! use nalgebra::DMatrix;
//!
//! let mut mesh = Mesh::new();
//! let element = mesh.create_element(2)?;
//! let mut field = Field::new("temperature", 1);
//! field.define_on(element, DMatrix::from_row_slice(1, 4, &[0.0, 1.0, 2.0, 3.0]))?;
//! # Ok::<(), zincite::Error>(())
//! ```
//!
//! # Evaluation
//! Evaluation goes through a [`FieldCache`], a caller-scoped context holding
//! the current location and time plus one value cache per field:
//! ```
//! use zincite::{Field, FieldCache, Mesh};
//! use nalgebra::DMatrix;
//!
//! let mut mesh = Mesh::new();
//! let element = mesh.create_element(2)?;
//! let mut field = Field::new("temperature", 1);
//! field.define_on(element, DMatrix::from_row_slice(1, 4, &[0.0, 1.0, 2.0, 3.0]))?;
//!
//! let mut context = FieldCache::new();
//! context.set_mesh_location(element, &[0.5, 0.5])?;
//! let values = context.evaluate(&mesh, &field)?;
//! assert_eq!(values[0], 1.5);
//! # Ok::<(), zincite::Error>(())
//! ```
//!
//! Repeating the evaluation at a different `xi` in the same element reuses
//! the cached coefficients without touching the field's parameters again.
//! Contexts deliberately do not share caches with each other; create one
//! context per concurrent evaluation pass.
//!
//! # Caching and invalidation
//! The memo table itself is [`ElementValuesCache`]: element-keyed records of
//! [`ElementValues`](crate::eval::ElementValues), validated per request by
//! [`classify`](ElementValuesCache::classify) and refreshed in place when a
//! request's time, inheritance context, derivative needs or applied
//! differential no longer match.  Caches are bounded: growing past
//! [`CacheSettings::capacity`] (1000 by default) clears the whole table
//! rather than evicting piecemeal.
//!
//! Cache coherence is caller-driven and synchronous: after changing nodal
//! parameters call [`FieldCache::field_changed`], and after structural mesh
//! edits (including element destruction) call
//! [`FieldCache::mesh_changed`].  A field mutated inside an open
//! [`begin_change`](Field::begin_change)/[`end_change`](Field::end_change)
//! batch reports *unsettled changes* and is recomputed on every request
//! until the batch closes.
#![warn(missing_docs)]

mod cache;
mod error;
mod field;
mod fieldcache;
mod mesh;

pub mod eval;

pub use cache::{
    CacheSettings, ElementValuesCache, Validity, ValuesRequest, DEFAULT_CACHE_CAPACITY,
};
pub use error::Error;
pub use eval::{BasisEvaluator, ElementValues, MonomialExpansion, NodalInterpolation};
pub use field::Field;
pub use fieldcache::FieldCache;
pub use mesh::{ElementId, Mesh, MAX_ELEMENT_DIMENSION};
