//! Fields and their per-element nodal parameters
//!
//! A field is a named, multi-component quantity interpolated over elements
//! from corner ("nodal") parameters.  Fields are commonly defined on only a
//! subset of a mesh; asking for parameters on an element that has none is a
//! normal outcome, reported as [`Error::NotDefined`](crate::Error::NotDefined)
//! by the evaluator rather than here.
use crate::mesh::ElementId;
use crate::Error;
use nalgebra::DMatrix;
use std::collections::HashMap;

/// A named, multi-component, optionally time-varying field
///
/// Parameters are stored per element as a components x corners matrix, one
/// matrix per time step.  A field constructed with [`Field::new`] has no time
/// sequence and is time-invariant; one constructed with
/// [`Field::with_times`] interpolates parameters linearly between its time
/// steps, clamping outside the sequence.
///
/// Mutations made between [`begin_change`](Self::begin_change) and
/// [`end_change`](Self::end_change) leave the field with *unsettled changes*:
/// evaluation caches must not trust entries computed from it until the batch
/// ends and change notifications have been delivered.
#[derive(Debug)]
pub struct Field {
    name: String,
    components: usize,
    times: Vec<f64>,
    parameters: HashMap<ElementId, Vec<DMatrix<f64>>>,
    in_change_batch: bool,
    changed_in_batch: bool,
}

impl Field {
    /// Builds a time-invariant field with the given component count
    pub fn new(name: impl Into<String>, components: usize) -> Self {
        Self {
            name: name.into(),
            components,
            times: Vec::new(),
            parameters: HashMap::new(),
            in_change_batch: false,
            changed_in_batch: false,
        }
    }

    /// Builds a time-varying field over a strictly increasing time sequence
    pub fn with_times(
        name: impl Into<String>,
        components: usize,
        times: Vec<f64>,
    ) -> Result<Self, Error> {
        if times.is_empty() || times.windows(2).any(|w| w[0] >= w[1]) {
            return Err(Error::BadTimeSequence);
        }
        Ok(Self {
            times,
            ..Self::new(name, components)
        })
    }

    /// Name of the field
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Number of components
    pub fn component_count(&self) -> usize {
        self.components
    }

    /// Checks whether the field has a time sequence
    pub fn is_time_dependent(&self) -> bool {
        !self.times.is_empty()
    }

    /// Defines a time-invariant field on an element
    ///
    /// `parameters` must have one row per component; its column count is
    /// checked against the element's corner count at evaluation time.
    pub fn define_on(
        &mut self,
        element: ElementId,
        parameters: DMatrix<f64>,
    ) -> Result<(), Error> {
        self.define_on_with_steps(element, vec![parameters])
    }

    /// Defines the field on an element with one parameter matrix per time step
    pub fn define_on_with_steps(
        &mut self,
        element: ElementId,
        steps: Vec<DMatrix<f64>>,
    ) -> Result<(), Error> {
        let expected = self.times.len().max(1);
        if steps.len() != expected {
            return Err(Error::BadTimeStepCount(steps.len(), expected));
        }
        for step in &steps {
            if step.nrows() != self.components {
                return Err(Error::BadParameterShape {
                    rows: step.nrows(),
                    cols: step.ncols(),
                    components: self.components,
                    corners: step.ncols(),
                });
            }
        }
        self.parameters.insert(element, steps);
        self.mark_changed();
        Ok(())
    }

    /// Replaces the parameters for one time step on an already-defined element
    pub fn set_parameters(
        &mut self,
        element: ElementId,
        step: usize,
        parameters: DMatrix<f64>,
    ) -> Result<(), Error> {
        let name = self.name.clone();
        let components = self.components;
        let steps = self
            .parameters
            .get_mut(&element)
            .ok_or(Error::NotDefined { field: name, element })?;
        if step >= steps.len() {
            return Err(Error::BadTimeStepCount(step, steps.len()));
        }
        if parameters.nrows() != components {
            return Err(Error::BadParameterShape {
                rows: parameters.nrows(),
                cols: parameters.ncols(),
                components,
                corners: parameters.ncols(),
            });
        }
        steps[step] = parameters;
        self.mark_changed();
        Ok(())
    }

    /// Removes the field's parameters from an element
    pub fn undefine_on(&mut self, element: ElementId) {
        if self.parameters.remove(&element).is_some() {
            self.mark_changed();
        }
    }

    /// Checks whether the field has parameters on an element
    pub fn is_defined_on(&self, element: ElementId) -> bool {
        self.parameters.contains_key(&element)
    }

    /// Parameters on an element at a time, or `None` where undefined
    ///
    /// Time-varying parameters are interpolated linearly between the two
    /// bracketing time steps and clamped outside the sequence.  The time
    /// argument is ignored for time-invariant fields.
    pub fn parameters_at(&self, element: ElementId, time: f64) -> Option<DMatrix<f64>> {
        let steps = self.parameters.get(&element)?;
        if self.times.is_empty() {
            return steps.first().cloned();
        }
        let after = self.times.partition_point(|&t| t <= time);
        if after == 0 {
            return steps.first().cloned();
        }
        if after == self.times.len() {
            return steps.last().cloned();
        }
        let (t0, t1) = (self.times[after - 1], self.times[after]);
        let s = (time - t0) / (t1 - t0);
        Some(&steps[after - 1] * (1.0 - s) + &steps[after] * s)
    }

    /// Opens a change batch
    pub fn begin_change(&mut self) {
        self.in_change_batch = true;
    }

    /// Closes a change batch and settles any changes made within it
    ///
    /// The owner is expected to deliver change notifications (for example
    /// [`FieldCache::field_changed`](crate::FieldCache::field_changed)) at
    /// this point.
    pub fn end_change(&mut self) {
        self.in_change_batch = false;
        self.changed_in_batch = false;
    }

    /// Checks whether the field was modified inside a still-open change batch
    ///
    /// While this holds, cached values computed from the field cannot be
    /// trusted and must be recomputed on every request.
    pub fn has_unsettled_changes(&self) -> bool {
        self.in_change_batch && self.changed_in_batch
    }

    fn mark_changed(&mut self) {
        if self.in_change_batch {
            self.changed_in_batch = true;
        }
    }
}
