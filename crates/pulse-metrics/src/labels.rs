//! Fixed label schemas.
//!
//! An instrument is generic over the type describing its labels, so the
//! label names and their order are decided once, by the type, and can never
//! drift between call sites.

use metrics::Label;

/// An ordered, fixed-arity set of label values.
///
/// Implementors must return the same label names, in the same order, for
/// every value of the type. Only the values vary.
pub trait LabelSet {
    /// Returns the labels identifying one series.
    fn labels(&self) -> Vec<Label>;
}

/// The empty label set, for instruments with a single series.
impl LabelSet for () {
    fn labels(&self) -> Vec<Label> {
        Vec::new()
    }
}

impl<L: LabelSet + ?Sized> LabelSet for &L {
    fn labels(&self) -> Vec<Label> {
        (**self).labels()
    }
}
