//! Interpolated element values and the basis evaluation service
//!
//! [`ElementValues`] is one computed-coefficient record for a single element:
//! per-component monomial expansions of the field over the element's xi
//! space, with optional derivative expansions.  Computing one is the
//! expensive operation this crate exists to avoid repeating; the
//! [`BasisEvaluator`] trait is the seam between the cache and whatever
//! produces the coefficients, and [`NodalInterpolation`] is the built-in
//! implementation interpolating corner parameters.

mod interp;
mod values;

pub use interp::{BasisEvaluator, NodalInterpolation};
pub use values::{ElementValues, MonomialExpansion};
