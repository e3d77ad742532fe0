//! The cover-set search engine.
//!
//! All three tree operations descend level by level over a frontier of
//! candidates, constrained by a distance threshold that the operation
//! recomputes at each level. The frontier is a [`cover_set::CoverSet`]: a
//! stack of [`layer::CoverSetLayer`]s, one per level descended, each sorted
//! by distance to the query.

pub(crate) mod cover_set;
pub(crate) mod layer;
