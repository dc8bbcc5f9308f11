//! Task consuming the driver's unsolicited traffic: normalizes source
//! addresses, feeds the pending-request table and the waitress, and emits
//! the caller-facing events.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use tokio::stream::StreamExt;
use tokio::sync::mpsc;

use conbee::{mac_addr_array_to_string, DriverEvent, EventReader, GpDataInd, ReceivedDataResponse};

use crate::events::{zcl_payload, Address, DeviceDirectory, Event, ZclPayload};
use crate::pending::PendingRequests;
use crate::waitress::Waitress;
use crate::zcl::ZclHeader;
use crate::{zdo, GP_CLUSTER_ID, GP_ENDPOINT, GP_GROUP_ID};

pub(crate) struct Router {
    pub events: EventReader,
    pub pending: PendingRequests,
    pub waitress: Waitress,
    pub sink: mpsc::Sender<Event>,
    pub join_permitted: Arc<AtomicBool>,
    pub devices: Option<Arc<dyn DeviceDirectory>>,
}

impl Router {
    pub async fn task(mut self) {
        while let Some(event) = self.events.next().await {
            match event {
                DriverEvent::ReceivedDataPayload(response) => self.handle_data(response).await,
                DriverEvent::ReceivedGreenPowerIndication(ind) => {
                    self.handle_green_power(ind).await
                }
            }
        }
    }

    async fn handle_data(&mut self, mut response: ReceivedDataResponse) {
        // Correlation and events key on the short address; resolve it from
        // the IEEE address when the radio delivered only the latter.
        if response.source_address.short.is_none() {
            let resolved = response.source_address.extended.and_then(|ieee| {
                self.devices
                    .as_ref()
                    .and_then(|devices| devices.short_address(ieee))
            });

            match resolved {
                Some(short) => response.source_address.short = Some(short),
                None => {
                    debug_assert!(
                        false,
                        "indication with unresolvable source {:?}",
                        response.source_address
                    );
                    error!(
                        "dropping indication with unresolvable source {:?}",
                        response.source_address
                    );
                    return;
                }
            }
        }

        let header = if response.profile_id != zdo::PROFILE_ID {
            ZclHeader::parse(&response.asdu)
        } else {
            None
        };

        self.pending.resolve(
            &response,
            header.map(|header| header.transaction_sequence_number),
        );

        if response.profile_id == zdo::PROFILE_ID && response.cluster_id == zdo::DEVICE_ANNCE {
            self.handle_device_annce(&response).await;
        }

        if response.profile_id != zdo::PROFILE_ID {
            let payload = zcl_payload(&response, header);
            self.waitress.resolve(&payload);
            self.emit(Event::ZclPayload(payload)).await;
        }
    }

    async fn handle_device_annce(&mut self, response: &ReceivedDataResponse) {
        let asdu = &response.asdu;
        if asdu.len() < 11 {
            warn!("short device announcement: {} bytes", asdu.len());
            return;
        }

        let network_address = u16::from_le_bytes([asdu[1], asdu[2]]);
        let mut ieee = [0; 8];
        ieee.copy_from_slice(&asdu[3..11]);
        let ieee_addr = mac_addr_array_to_string(&ieee);

        debug!("device announcement from {} ({:#06x})", ieee_addr, network_address);

        let event = if self.join_permitted.load(Ordering::SeqCst) {
            Event::DeviceJoined {
                network_address,
                ieee_addr,
            }
        } else {
            Event::DeviceAnnounce {
                network_address,
                ieee_addr,
            }
        };
        self.emit(event).await;
    }

    /// Re-frames a green-power indication as a ZCL notification on the
    /// green-power cluster so it flows through the same matching paths as
    /// ordinary payloads.
    async fn handle_green_power(&mut self, ind: GpDataInd) {
        let mut data = Vec::with_capacity(15 + ind.command_frame.len());
        data.push(0b0000_0001); // frame control: cluster-specific
        data.push(ind.seq_nr);
        data.push(ind.id);
        data.extend_from_slice(&0u16.to_le_bytes()); // options
        data.extend_from_slice(&ind.src_id.to_le_bytes());
        data.extend_from_slice(&ind.frame_counter.to_le_bytes());
        data.push(ind.command_id);
        data.push(ind.command_frame.len() as u8);
        data.extend_from_slice(&ind.command_frame);

        let header = ZclHeader::parse(&data);
        let payload = ZclPayload {
            address: Address::Nwk((ind.src_id & 0xFFFF) as u16),
            data,
            cluster_id: GP_CLUSTER_ID,
            header,
            endpoint: GP_ENDPOINT,
            linkquality: 0xFF,
            group_id: GP_GROUP_ID,
            was_broadcast: true,
            destination_endpoint: GP_ENDPOINT,
        };

        self.waitress.resolve(&payload);
        self.emit(Event::ZclPayload(payload)).await;
    }

    async fn emit(&mut self, event: Event) {
        // A dropped receiver only silences events; correlation keeps working.
        let _ = self.sink.send(event).await;
    }
}
