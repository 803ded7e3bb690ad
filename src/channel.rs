//! Channel category classification from ARIB network/service ids.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::constants::channel::{
    BS_NETWORK_ID, CS1_NETWORK_ID, CS2_NETWORK_ID, PAID_BS_SERVICE_IDS, TERRESTRIAL_NETWORK_IDS,
};
use crate::types::{NetworkId, ServiceId};

/// Mutually exclusive channel categories used for stratified sampling.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum ChannelCategory {
    /// Terrestrial digital broadcasters.
    Terrestrial,
    /// Free-to-air BS channels.
    FreeSatellite,
    /// Pay BS channels plus 110-degree CS.
    PaidSatelliteOrCable,
    /// Anything else; kept in the full pool but never stratum-sampled.
    Unclassified,
}

impl ChannelCategory {
    /// Categories that take part in stratified sampling, in sampling order.
    pub const SAMPLED: [ChannelCategory; 3] = [
        ChannelCategory::Terrestrial,
        ChannelCategory::FreeSatellite,
        ChannelCategory::PaidSatelliteOrCable,
    ];

    /// Classify a network/service pair, checking terrestrial, free BS, then paid BS/CS.
    pub fn classify(network_id: NetworkId, service_id: ServiceId) -> Self {
        if is_terrestrial(network_id) {
            ChannelCategory::Terrestrial
        } else if is_free_satellite(network_id, service_id) {
            ChannelCategory::FreeSatellite
        } else if is_paid_satellite_or_cable(network_id, service_id) {
            ChannelCategory::PaidSatelliteOrCable
        } else {
            ChannelCategory::Unclassified
        }
    }

    /// Short label used in logs and reports.
    pub fn label(&self) -> &'static str {
        match self {
            ChannelCategory::Terrestrial => "terrestrial",
            ChannelCategory::FreeSatellite => "free_bs",
            ChannelCategory::PaidSatelliteOrCable => "paid_bs_cs",
            ChannelCategory::Unclassified => "unclassified",
        }
    }
}

impl fmt::Display for ChannelCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

pub fn is_terrestrial(network_id: NetworkId) -> bool {
    TERRESTRIAL_NETWORK_IDS.contains(&network_id)
}

pub fn is_free_satellite(network_id: NetworkId, service_id: ServiceId) -> bool {
    network_id == BS_NETWORK_ID && !is_paid_bs_service(service_id)
}

pub fn is_paid_satellite_or_cable(network_id: NetworkId, service_id: ServiceId) -> bool {
    network_id == CS1_NETWORK_ID
        || network_id == CS2_NETWORK_ID
        || (network_id == BS_NETWORK_ID && is_paid_bs_service(service_id))
}

fn is_paid_bs_service(service_id: ServiceId) -> bool {
    PAID_BS_SERVICE_IDS
        .iter()
        .any(|range| range.contains(&service_id))
}
