//! Monomial coefficient payloads for a single element
use crate::mesh::{ElementId, MAX_ELEMENT_DIMENSION};
use crate::Error;
use arrayvec::ArrayVec;
use nalgebra::{DMatrix, DVector};

/// A polynomial over element xi coordinates in monomial form
///
/// Coefficients are stored in tensor-product order with xi1 varying fastest:
/// in 3D with orders `[1, 1, 1]` the terms are
/// `1, x, y, xy, z, xz, yz, xyz`.  The expansion owns its coefficients and
/// is mutated destructively by [`differentiate`](Self::differentiate).
#[derive(Clone, Debug, PartialEq)]
pub struct MonomialExpansion {
    /// Highest power of each xi coordinate
    orders: ArrayVec<u8, MAX_ELEMENT_DIMENSION>,
    coefficients: DVector<f64>,
}

impl MonomialExpansion {
    /// Builds an expansion from explicit orders and coefficients
    ///
    /// `coefficients` must hold one value per tensor-product term, i.e. the
    /// product of `order + 1` over every xi coordinate.
    pub fn new(orders: &[u8], coefficients: DVector<f64>) -> Result<Self, Error> {
        if orders.is_empty() || orders.len() > MAX_ELEMENT_DIMENSION {
            return Err(Error::BadDimension(orders.len()));
        }
        let expected: usize = orders.iter().map(|&o| o as usize + 1).product();
        if coefficients.len() != expected {
            return Err(Error::BadCoefficientCount(coefficients.len(), expected));
        }
        Ok(Self {
            orders: orders.iter().copied().collect(),
            coefficients,
        })
    }

    /// Builds the multilinear expansion interpolating corner values
    ///
    /// `corners` holds one value per element corner, ordered with the xi1
    /// bit varying fastest (corner index `c` has xi_d = 1 where bit `d` of
    /// `c` is set).  The monomial coefficients follow by inclusion-exclusion
    /// over the corners.
    pub fn from_corner_values(dimension: usize, corners: &[f64]) -> Result<Self, Error> {
        if dimension == 0 || dimension > MAX_ELEMENT_DIMENSION {
            return Err(Error::BadDimension(dimension));
        }
        let n = 1 << dimension;
        if corners.len() != n {
            return Err(Error::BadCoefficientCount(corners.len(), n));
        }
        // With all orders equal to 1 the tensor-product term index is
        // exactly a corner bitmask, so coefficient m sums the corners that
        // are subsets of m with alternating sign.
        let mut coefficients = DVector::zeros(n);
        for m in 0..n {
            let mut sum = 0.0;
            for c in 0..n {
                if c & m == c {
                    let sign = ((m ^ c) as u32).count_ones();
                    sum += if sign % 2 == 0 { corners[c] } else { -corners[c] };
                }
            }
            coefficients[m] = sum;
        }
        Ok(Self {
            orders: std::iter::repeat(1).take(dimension).collect(),
            coefficients,
        })
    }

    /// Parametric dimension of the expansion
    pub fn dimension(&self) -> usize {
        self.orders.len()
    }

    /// Highest power of each xi coordinate
    pub fn orders(&self) -> &[u8] {
        &self.orders
    }

    /// Raw coefficients in tensor-product order
    pub fn coefficients(&self) -> &DVector<f64> {
        &self.coefficients
    }

    fn term_count(orders: &[u8]) -> usize {
        orders.iter().map(|&o| o as usize + 1).product()
    }

    /// Evaluates the expansion at a xi location
    pub fn evaluate(&self, xi: &[f64]) -> Result<f64, Error> {
        if xi.len() != self.orders.len() {
            return Err(Error::BadXiCount(xi.len(), self.orders.len()));
        }
        let mut sum = 0.0;
        for (i, &coefficient) in self.coefficients.iter().enumerate() {
            let mut term = coefficient;
            let mut rest = i;
            for (d, &order) in self.orders.iter().enumerate() {
                let radix = order as usize + 1;
                let power = rest % radix;
                rest /= radix;
                term *= xi[d].powi(power as i32);
            }
            sum += term;
        }
        Ok(sum)
    }

    /// Differentiates the expansion in place along one xi direction
    ///
    /// This is destructive and cumulative: differentiating twice yields the
    /// second derivative, and the original coefficients are gone.  An
    /// expansion constant in the given direction collapses to zeros.
    pub fn differentiate(&mut self, xi_index: usize) -> Result<(), Error> {
        if xi_index >= self.orders.len() {
            return Err(Error::BadXiIndex(xi_index, self.orders.len()));
        }
        let order = self.orders[xi_index] as usize;
        if order == 0 {
            self.coefficients.fill(0.0);
            return Ok(());
        }
        let mut new_orders = self.orders.clone();
        new_orders[xi_index] = (order - 1) as u8;
        let mut new_coefficients = DVector::zeros(Self::term_count(&new_orders));
        for i in 0..new_coefficients.len() {
            // Decode i against the reduced shape, bump the differentiated
            // power by one, and re-encode against the original shape.
            let mut rest = i;
            let mut source = 0;
            let mut stride = 1;
            let mut scale = 0.0;
            for (d, &o) in new_orders.iter().enumerate() {
                let radix = o as usize + 1;
                let mut power = rest % radix;
                rest /= radix;
                if d == xi_index {
                    scale = (power + 1) as f64;
                    power += 1;
                }
                source += power * stride;
                stride *= self.orders[d] as usize + 1;
            }
            new_coefficients[i] = scale * self.coefficients[source];
        }
        self.orders = new_orders;
        self.coefficients = new_coefficients;
        Ok(())
    }
}

/// Computed interpolation coefficients for a single element
///
/// One cache record: per-component [`MonomialExpansion`]s valid for a
/// specific `(element, time, top-level element)` triple, optionally with
/// per-xi derivative expansions, and a record of the directional
/// differentiations applied since computation.  A cleared record holds no
/// coefficients and matches no request.
#[derive(Clone, Debug, Default)]
pub struct ElementValues {
    element: Option<ElementId>,
    top_level: Option<ElementId>,
    time: f64,
    derivatives_computed: bool,
    differential: Vec<u8>,
    components: Vec<MonomialExpansion>,
    // component-major: derivatives[c * dimension + d]
    derivatives: Vec<MonomialExpansion>,
}

impl ElementValues {
    /// Builds a cleared record holding no coefficients
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds a populated record from per-component expansions
    ///
    /// `derivatives`, when present, must hold one expansion per component
    /// per xi direction, component-major.
    pub fn from_components(
        element: ElementId,
        top_level: ElementId,
        time: f64,
        components: Vec<MonomialExpansion>,
        derivatives: Option<Vec<MonomialExpansion>>,
    ) -> Result<Self, Error> {
        let dimension = match components.first() {
            Some(first) => first.dimension(),
            None => return Err(Error::NoValues),
        };
        if let Some(other) = components.iter().find(|c| c.dimension() != dimension) {
            return Err(Error::BadDimension(other.dimension()));
        }
        let derivatives_computed = derivatives.is_some();
        let derivatives = derivatives.unwrap_or_default();
        if derivatives_computed {
            let expected = components.len() * dimension;
            if derivatives.len() != expected {
                return Err(Error::BadCoefficientCount(derivatives.len(), expected));
            }
        }
        Ok(Self {
            element: Some(element),
            top_level: Some(top_level),
            time,
            derivatives_computed,
            differential: Vec::new(),
            components,
            derivatives,
        })
    }

    /// Element these coefficients were computed for, or `None` if cleared
    pub fn element(&self) -> Option<ElementId> {
        self.element
    }

    /// Top-level element the computation inherited from
    pub fn top_level(&self) -> Option<ElementId> {
        self.top_level
    }

    /// Time the coefficients were computed for
    pub fn time(&self) -> f64 {
        self.time
    }

    /// Checks whether derivative expansions are populated
    pub fn derivatives_computed(&self) -> bool {
        self.derivatives_computed
    }

    /// Directional differentiations applied since computation, in order
    pub fn differential(&self) -> &[u8] {
        &self.differential
    }

    /// Checks whether the record holds coefficients
    pub fn is_populated(&self) -> bool {
        self.element.is_some()
    }

    /// Number of field components
    pub fn component_count(&self) -> usize {
        self.components.len()
    }

    /// Parametric dimension, or `None` if cleared
    pub fn dimension(&self) -> Option<usize> {
        self.components.first().map(|c| c.dimension())
    }

    /// Resets the record to the cleared state, dropping all coefficients
    pub fn clear(&mut self) {
        *self = Self::default();
    }

    /// Differentiates every expansion in place along one xi direction
    ///
    /// Destructive and cumulative, like
    /// [`MonomialExpansion::differentiate`]; the applied direction is
    /// recorded in [`differential`](Self::differential).
    pub fn differentiate(&mut self, xi_index: usize) -> Result<(), Error> {
        if !self.is_populated() {
            return Err(Error::NoValues);
        }
        for component in &mut self.components {
            component.differentiate(xi_index)?;
        }
        for derivative in &mut self.derivatives {
            derivative.differentiate(xi_index)?;
        }
        self.differential.push(xi_index as u8);
        Ok(())
    }

    /// Evaluates all components at a xi location
    pub fn evaluate(&self, xi: &[f64]) -> Result<DVector<f64>, Error> {
        if !self.is_populated() {
            return Err(Error::NoValues);
        }
        let mut out = DVector::zeros(self.components.len());
        for (i, component) in self.components.iter().enumerate() {
            out[i] = component.evaluate(xi)?;
        }
        Ok(out)
    }

    /// Evaluates all component derivatives at a xi location
    ///
    /// Returns a components x dimension matrix.  Fails with
    /// [`Error::DerivativesNotComputed`] when the record was computed
    /// without derivatives.
    pub fn evaluate_derivatives(&self, xi: &[f64]) -> Result<DMatrix<f64>, Error> {
        if !self.is_populated() {
            return Err(Error::NoValues);
        }
        if !self.derivatives_computed {
            return Err(Error::DerivativesNotComputed);
        }
        let dimension = self.dimension().unwrap_or(0);
        let mut out = DMatrix::zeros(self.components.len(), dimension);
        for c in 0..self.components.len() {
            for d in 0..dimension {
                out[(c, d)] = self.derivatives[c * dimension + d].evaluate(xi)?;
            }
        }
        Ok(out)
    }
}
