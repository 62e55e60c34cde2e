//! Element-keyed memoization of interpolated element values
//!
//! Computing [`ElementValues`](crate::ElementValues) is the expensive step of
//! every field evaluation, and quadrature loops ask for the same element over
//! and over.  [`ElementValuesCache`] remembers one record per element,
//! recomputes a record in place when a request no longer matches it, and
//! clears itself wholesale when it grows past its capacity.  Each field
//! keeps its own independent cache and upstream changes invalidate
//! everything at once anyway, so nothing finer than a full clear is
//! attempted.
use crate::eval::{BasisEvaluator, ElementValues};
use crate::mesh::ElementId;
use crate::Error;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Default number of element records held before a full clear
pub const DEFAULT_CACHE_CAPACITY: usize = 1000;

/// Tuning knobs for an [`ElementValuesCache`]
#[derive(Copy, Clone, Debug, Serialize, Deserialize)]
pub struct CacheSettings {
    /// Record count at which an insertion clears the whole cache first
    pub capacity: usize,
}

impl Default for CacheSettings {
    fn default() -> Self {
        Self {
            capacity: DEFAULT_CACHE_CAPACITY,
        }
    }
}

/// One field-evaluation request against the cache
///
/// A record is reusable only for an exactly matching request; see
/// [`ElementValuesCache::classify`].
#[derive(Clone, Debug, PartialEq)]
pub struct ValuesRequest {
    /// Element to evaluate on
    pub element: ElementId,
    /// Time to evaluate at
    pub time: f64,
    /// Ancestor element used to resolve inherited values
    pub top_level: ElementId,
    /// Whether derivative expansions must be populated
    pub need_derivatives: bool,
    /// Directional differentiations to apply after computing, in order
    ///
    /// Monomial differentiation is destructive and cumulative, so a record
    /// computed under one differential can never be patched into another;
    /// any mismatch forces recomputation from scratch.
    pub differential: Vec<u8>,
}

impl ValuesRequest {
    /// Builds a plain value request with no derivatives or differential
    pub fn new(element: ElementId, time: f64, top_level: ElementId) -> Self {
        Self {
            element,
            time,
            top_level,
            need_derivatives: false,
            differential: Vec::new(),
        }
    }
}

/// How an existing record relates to a request
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum Validity {
    /// The record satisfies the request as-is
    Reuse,
    /// A record exists for the element but must be recomputed in place
    NeedsRecompute,
    /// No record exists for the element
    Absent,
}

/// An element-keyed table of [`ElementValues`] with a full-clear bound
///
/// Each evaluation context owns one cache per field it touches; caches are
/// never shared between contexts, so no locking is involved anywhere.  The
/// cache stores element *ids* only and never extends element lifetime.
#[derive(Debug)]
pub struct ElementValuesCache {
    records: HashMap<ElementId, ElementValues>,
    capacity: usize,
}

impl Default for ElementValuesCache {
    fn default() -> Self {
        Self::new()
    }
}

impl ElementValuesCache {
    /// Builds an empty cache with default settings
    pub fn new() -> Self {
        Self::with_settings(CacheSettings::default())
    }

    /// Builds an empty cache with the given settings
    pub fn with_settings(settings: CacheSettings) -> Self {
        Self {
            records: HashMap::new(),
            capacity: settings.capacity,
        }
    }

    /// Decides whether an existing record can satisfy a request
    ///
    /// Pure classification, no side effects.  A record is reusable only if
    /// it is populated for the exact `(element, time, top level)` triple,
    /// has derivatives whenever the request needs them, carries exactly the
    /// requested differential, and the field has no unsettled changes.
    pub fn classify(
        candidate: Option<&ElementValues>,
        request: &ValuesRequest,
        unsettled_changes: bool,
    ) -> Validity {
        let Some(values) = candidate else {
            return Validity::Absent;
        };
        let matches = values.element() == Some(request.element)
            && values.time() == request.time
            && values.top_level() == Some(request.top_level)
            && (!request.need_derivatives || values.derivatives_computed())
            && values.differential() == request.differential.as_slice();
        if matches && !unsettled_changes {
            Validity::Reuse
        } else {
            Validity::NeedsRecompute
        }
    }

    /// Looks up the record for an element, if any
    pub fn find(&self, element: ElementId) -> Option<&ElementValues> {
        self.records.get(&element)
    }

    /// Number of records currently held
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// Checks whether the cache holds no records
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Drops every record
    ///
    /// Used both by the capacity policy and by external invalidation when an
    /// upstream dependency (nodal parameters, mesh structure) changes.
    pub fn clear(&mut self) {
        if !self.records.is_empty() {
            log::debug!("clearing element values cache ({} records)", self.records.len());
            self.records.clear();
        }
    }

    /// Returns up-to-date values for a request, computing only when needed
    ///
    /// The single entry point used by field evaluation:
    ///
    /// 1. A record matching the request is returned unchanged; the evaluator
    ///    is not invoked.
    /// 2. A mismatched record is cleared and recomputed in its keyed slot (a
    ///    refresh, not a reallocation).  If the evaluator fails, the record
    ///    is left cleared and the error propagates.
    /// 3. With no record present, values are computed first and only then
    ///    inserted, so a failed computation never leaves a half-valid
    ///    record.  Insertion of a fresh record runs the capacity policy: at
    ///    `capacity` records the whole cache is cleared before the insert.
    pub fn get_or_compute<E: BasisEvaluator>(
        &mut self,
        evaluator: &E,
        request: &ValuesRequest,
    ) -> Result<&ElementValues, Error> {
        let unsettled = evaluator.has_unsettled_changes();
        if self.records.contains_key(&request.element) {
            if Self::classify(self.records.get(&request.element), request, unsettled)
                == Validity::Reuse
            {
                return Ok(self.records.get(&request.element).unwrap());
            }
            log::trace!("recomputing element values for element {}", request.element);
            let values = self.records.get_mut(&request.element).unwrap();
            values.clear();
            *values = Self::compute_values(evaluator, request)?;
            return Ok(self.records.get(&request.element).unwrap());
        }

        let values = Self::compute_values(evaluator, request)?;
        if self.records.len() >= self.capacity {
            log::debug!(
                "element values cache reached capacity ({}); clearing",
                self.capacity,
            );
            self.records.clear();
        }
        Ok(self.records.entry(request.element).or_insert(values))
    }

    /// Computes fresh values and applies the requested differential
    fn compute_values<E: BasisEvaluator>(
        evaluator: &E,
        request: &ValuesRequest,
    ) -> Result<ElementValues, Error> {
        let mut values = evaluator.compute(
            request.element,
            request.time,
            request.top_level,
            request.need_derivatives,
        )?;
        for &xi_index in &request.differential {
            values.differentiate(xi_index as usize)?;
        }
        Ok(values)
    }
}
