use conbee::{
    ClusterId, DestinationAddress, Endpoint, ExtendedAddress, ReceivedDataResponse, ShortAddress,
};

use crate::zcl::ZclHeader;

/// Either address form a frame's sender can be known by.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum Address {
    Nwk(ShortAddress),
    Ieee(ExtendedAddress),
}

/// An application-layer frame surfaced to the caller.
#[derive(Clone, Debug)]
pub struct ZclPayload {
    pub address: Address,
    pub data: Vec<u8>,
    pub cluster_id: ClusterId,
    pub header: Option<ZclHeader>,
    pub endpoint: Endpoint,
    pub linkquality: u8,
    pub group_id: u16,
    pub was_broadcast: bool,
    pub destination_endpoint: Endpoint,
}

#[derive(Clone, Debug)]
pub enum Event {
    DeviceJoined {
        network_address: ShortAddress,
        ieee_addr: String,
    },
    DeviceAnnounce {
        network_address: ShortAddress,
        ieee_addr: String,
    },
    DeviceLeave {
        network_address: ShortAddress,
        ieee_addr: String,
    },
    ZclPayload(ZclPayload),
}

/// Resolves IEEE addresses to short addresses for indications where the
/// radio delivered only the 64-bit source. Implemented by the caller's
/// device registry.
pub trait DeviceDirectory: Send + Sync {
    fn short_address(&self, ieee: ExtendedAddress) -> Option<ShortAddress>;
}

/// Builds the caller-facing payload view of a data indication.
///
/// The sender is identified by its IEEE address only when the frame was
/// addressed to us by IEEE; group and broadcast metadata come from the
/// destination the radio reported.
pub(crate) fn zcl_payload(response: &ReceivedDataResponse, header: Option<ZclHeader>) -> ZclPayload {
    let address = match (response.destination_address, response.source_address.extended) {
        (DestinationAddress::Ieee(_), Some(extended)) => Address::Ieee(extended),
        _ => Address::Nwk(response.source_address.short.unwrap_or_default()),
    };

    let group_id = match response.destination_address {
        DestinationAddress::Group(group) => group,
        _ => 0,
    };

    let was_broadcast = matches!(
        response.destination_address,
        DestinationAddress::Group(_) | DestinationAddress::Broadcast(_)
    );

    ZclPayload {
        address,
        data: response.asdu.clone(),
        cluster_id: response.cluster_id,
        header,
        endpoint: response.source_endpoint,
        linkquality: response.lqi,
        group_id,
        was_broadcast,
        destination_endpoint: response.destination_endpoint,
    }
}
