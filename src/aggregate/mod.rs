//! Two-pass aggregation pipes.
//!
//! Each of these needs the whole stream before it can emit anything, so it
//! takes a [`RecordBuffer`](crate::data::RecordBuffer) instead of an
//! iterator: call [`RecordStreamExt::materialize`](crate::stream::RecordStreamExt::materialize)
//! first. The input is traversed twice, but only in memory.

mod group;
mod labels;
mod pca;
mod tokens;
mod votes;

pub use group::group_by_attrs;
pub use labels::{Threshold, majority_label, mean_value, threshold, threshold_in_place};
pub use pca::{CombineFeatures, pca_combine_embeddings};
pub use tokens::count_cutoff;
pub use votes::{VoteCounts, VoteMap};
