//! Query variant selection and the per-variant pipeline descriptors.

use vso_types::{
    SpanColor, STATUS_FINAL, STATUS_IN_MAINTENANCE, STATUS_IN_PRODUCTION, STATUS_NEW,
};

use crate::normalize::contains_ignore_case;

/// Filter value clients send to mean "no filter".
pub const NO_FILTER_SENTINEL: &str = "N";

const FACILITY_LINK_BASE: &str = "https://phynet.trafficmanager.net/Optical/OpticalLinkMonitor?";
const SPAN_DETAILS_LINK_BASE: &str =
    "https://phynet.trafficmanager.net/Optical/OpticalLinkMonitor/LoadSpanDetails?";

/// Returns true when a filter is missing or carries the no-filter sentinel.
pub fn filter_is_absent(value: Option<&str>) -> bool {
    match value {
        None => true,
        Some(value) => value == NO_FILTER_SENTINEL,
    }
}

/// The four analytical query shapes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum QueryVariant {
    FacilityOnly,
    DiversityAndSplice,
    FacilityAndDiversity,
    FacilityAndSplice,
}

impl QueryVariant {
    pub const ALL: [Self; 4] = [
        Self::FacilityOnly,
        Self::DiversityAndSplice,
        Self::FacilityAndDiversity,
        Self::FacilityAndSplice,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::FacilityOnly => "facility_only",
            Self::DiversityAndSplice => "diversity_and_splice",
            Self::FacilityAndDiversity => "facility_and_diversity",
            Self::FacilityAndSplice => "facility_and_splice",
        }
    }

    /// Returns the pipeline parameters that distinguish this variant.
    pub fn descriptor(self) -> VariantDescriptor {
        match self {
            Self::FacilityOnly => VariantDescriptor {
                filter_diversity: false,
                filter_splice_rack: false,
                exclude_omt_devices: false,
                new_state_bypass: false,
                color_rule: ColorRule::Containment,
                health_match: StatusMatch::Contains,
                link_base: FACILITY_LINK_BASE,
                peer_format: PeerFormat::Plain,
            },
            Self::DiversityAndSplice => VariantDescriptor {
                filter_diversity: true,
                filter_splice_rack: true,
                exclude_omt_devices: true,
                new_state_bypass: true,
                color_rule: ColorRule::ExactWithAttentionFallback,
                health_match: StatusMatch::Exact,
                link_base: SPAN_DETAILS_LINK_BASE,
                peer_format: PeerFormat::Quoted,
            },
            Self::FacilityAndDiversity => VariantDescriptor {
                filter_diversity: true,
                filter_splice_rack: false,
                exclude_omt_devices: true,
                new_state_bypass: true,
                color_rule: ColorRule::Containment,
                health_match: StatusMatch::Exact,
                link_base: SPAN_DETAILS_LINK_BASE,
                peer_format: PeerFormat::Quoted,
            },
            Self::FacilityAndSplice => VariantDescriptor {
                filter_diversity: false,
                filter_splice_rack: true,
                exclude_omt_devices: true,
                new_state_bypass: true,
                color_rule: ColorRule::Containment,
                health_match: StatusMatch::Exact,
                link_base: SPAN_DETAILS_LINK_BASE,
                peer_format: PeerFormat::Quoted,
            },
        }
    }
}

/// Maps filter presence to the query variant. Total over all inputs.
pub fn select_variant(diversity: Option<&str>, splice_rack: Option<&str>) -> QueryVariant {
    match (!filter_is_absent(diversity), !filter_is_absent(splice_rack)) {
        (false, false) => QueryVariant::FacilityOnly,
        (true, true) => QueryVariant::DiversityAndSplice,
        (true, false) => QueryVariant::FacilityAndDiversity,
        (false, true) => QueryVariant::FacilityAndSplice,
    }
}

/// Parametric differences between the query variants.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct VariantDescriptor {
    pub filter_diversity: bool,
    pub filter_splice_rack: bool,
    /// Drop link rows whose start device contains `omt` before the join.
    pub exclude_omt_devices: bool,
    /// Keep unlinked spans whose own state is `New`, and report them as `New`.
    pub new_state_bypass: bool,
    pub color_rule: ColorRule,
    pub health_match: StatusMatch,
    pub link_base: &'static str,
    pub peer_format: PeerFormat,
}

impl VariantDescriptor {
    /// Deep link into the optical link monitor for one span over the last 7 days.
    pub fn optical_link(&self, span_id: &str) -> String {
        format!(
            "{}spanId={span_id}&timespan=7d&multiSpanMode=false",
            self.link_base
        )
    }
}

/// How a status label is turned into a display colour.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColorRule {
    /// Substring match on the lifecycle labels; unmatched statuses are `Accent`.
    Containment,
    /// Exact match on the lifecycle labels; unmatched statuses are `Attention`.
    ExactWithAttentionFallback,
}

impl ColorRule {
    pub fn classify(self, status: &str) -> SpanColor {
        match self {
            Self::Containment => {
                if contains_ignore_case(status, STATUS_IN_PRODUCTION) {
                    SpanColor::Good
                } else if contains_ignore_case(status, STATUS_IN_MAINTENANCE) {
                    SpanColor::Warning
                } else if contains_ignore_case(status, STATUS_FINAL) {
                    SpanColor::Attention
                } else {
                    SpanColor::Accent
                }
            }
            Self::ExactWithAttentionFallback => match status {
                STATUS_IN_PRODUCTION => SpanColor::Good,
                STATUS_IN_MAINTENANCE => SpanColor::Warning,
                STATUS_NEW => SpanColor::Accent,
                _ => SpanColor::Attention,
            },
        }
    }
}

/// How statuses are matched when counting production and maintenance spans.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatusMatch {
    Contains,
    Exact,
}

impl StatusMatch {
    pub fn matches(self, status: &str, label: &str) -> bool {
        match self {
            Self::Contains => contains_ignore_case(status, label),
            Self::Exact => status == label,
        }
    }
}

/// Rendering of the peer span list.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PeerFormat {
    /// `A,B,C`
    Plain,
    /// `"A", "B", "C"`
    Quoted,
}

impl PeerFormat {
    pub fn join<'a>(self, span_ids: impl IntoIterator<Item = &'a str>) -> String {
        let upper = span_ids.into_iter().map(str::to_uppercase);
        match self {
            Self::Plain => upper.collect::<Vec<_>>().join(","),
            Self::Quoted => upper
                .map(|span_id| format!("\"{span_id}\""))
                .collect::<Vec<_>>()
                .join(", "),
        }
    }
}
