//! Query variant selection and result shaping for the span status report.
//!
//! A request's filter presence picks one of four [`QueryVariant`]s. Each
//! variant is a [`VariantDescriptor`] over one shared derivation pipeline that
//! joins spans to link states, applies liveness and text filters, normalises
//! display fields and computes the aggregate production share.

mod normalize;
mod pipeline;
mod variant;

pub use normalize::{normalize_idf, normalize_splice_rack};
pub use pipeline::{aggregate_health, build_span_report, LinkStateIndex, SpanQuery};
pub use variant::{
    filter_is_absent, select_variant, ColorRule, PeerFormat, QueryVariant, StatusMatch,
    VariantDescriptor, NO_FILTER_SENTINEL,
};
