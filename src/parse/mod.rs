//! XML parsers that turn a case-folded document into rows ready for
//! [crate::database::entity] or [crate::reconcile]. Decompression and
//! case-folding live in [crate::extract]; this module is pure
//! tag-to-row extraction.

pub mod promos;
pub mod stores;
