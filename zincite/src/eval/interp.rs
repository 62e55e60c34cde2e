//! The basis evaluation service seam and its nodal-interpolation impl
use crate::eval::{ElementValues, MonomialExpansion};
use crate::field::Field;
use crate::mesh::{ElementId, Mesh};
use crate::Error;

/// Produces interpolation coefficients for an element
///
/// This is the single capability the value cache consumes: given an element,
/// a time and a top-level inheritance context, build a populated
/// [`ElementValues`], with derivative expansions when asked.  Implementations
/// are free to interpolate nodal parameters, sample grids, or delegate to an
/// external solver; the cache only cares that recomputation is expensive
/// enough to be worth remembering.
pub trait BasisEvaluator {
    /// Computes coefficients for `element` at `time`
    fn compute(
        &self,
        element: ElementId,
        time: f64,
        top_level: ElementId,
        need_derivatives: bool,
    ) -> Result<ElementValues, Error>;

    /// Checks whether the underlying field is mid-way through a change batch
    ///
    /// While this holds, previously cached coefficients cannot be trusted and
    /// the cache recomputes on every request.
    fn has_unsettled_changes(&self) -> bool {
        false
    }
}

/// Multilinear nodal interpolation of a [`Field`] over a [`Mesh`]
///
/// Corner parameters are looked up at the requested time (interpolating the
/// field's time sequence) and converted to monomial coefficients; derivative
/// expansions are differentiated copies of the value expansions.
pub struct NodalInterpolation<'a> {
    mesh: &'a Mesh,
    field: &'a Field,
}

impl<'a> NodalInterpolation<'a> {
    /// Builds an evaluator borrowing the mesh and field
    pub fn new(mesh: &'a Mesh, field: &'a Field) -> Self {
        Self { mesh, field }
    }
}

impl BasisEvaluator for NodalInterpolation<'_> {
    fn compute(
        &self,
        element: ElementId,
        time: f64,
        top_level: ElementId,
        need_derivatives: bool,
    ) -> Result<ElementValues, Error> {
        let dimension = self.mesh.dimension(element)?;
        if !self.mesh.contains(top_level) {
            return Err(Error::UnknownElement(top_level));
        }
        let parameters =
            self.field
                .parameters_at(element, time)
                .ok_or_else(|| Error::NotDefined {
                    field: self.field.name().to_owned(),
                    element,
                })?;
        let corners = 1 << dimension;
        if parameters.ncols() != corners || parameters.nrows() != self.field.component_count() {
            return Err(Error::BadParameterShape {
                rows: parameters.nrows(),
                cols: parameters.ncols(),
                components: self.field.component_count(),
                corners,
            });
        }

        let mut components = Vec::with_capacity(parameters.nrows());
        for row in parameters.row_iter() {
            let corner_values: Vec<f64> = row.iter().copied().collect();
            components.push(MonomialExpansion::from_corner_values(
                dimension,
                &corner_values,
            )?);
        }

        let derivatives = if need_derivatives {
            let mut all = Vec::with_capacity(components.len() * dimension);
            for component in &components {
                for d in 0..dimension {
                    let mut derivative = component.clone();
                    derivative.differentiate(d)?;
                    all.push(derivative);
                }
            }
            Some(all)
        } else {
            None
        };

        ElementValues::from_components(element, top_level, time, components, derivatives)
    }

    fn has_unsettled_changes(&self) -> bool {
        self.field.has_unsettled_changes()
    }
}
