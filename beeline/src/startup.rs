//! Startup-time housekeeping: the channel-mask conversion used by the
//! network-parameter reconciler, and the background task that makes sure
//! endpoint 1 of the coordinator advertises the cluster set the stack
//! expects.

use std::time::Duration;

use tokio::time::delay_for;

use conbee::{ClusterId, Driver, Parameter, ShortAddress};

use crate::adapter::Adapter;
use crate::errors::Result;
use crate::zdo::SimpleDescriptor;
use crate::COORDINATOR_ENDPOINT;

/// The coordinator answers ZDP queries on its own short address.
const COORDINATOR_ADDRESS: ShortAddress = 0x0000;

/// How long to wait between descriptor checks.
const CHECK_INTERVAL: Duration = Duration::from_secs(3);

/// Input clusters endpoint 1 must serve.
const REQUIRED_INPUT_CLUSTERS: [ClusterId; 5] = [0x0000, 0x0006, 0x000A, 0x0019, 0x0501];

/// Output clusters endpoint 1 must offer.
const REQUIRED_OUTPUT_CLUSTERS: [ClusterId; 4] = [0x0001, 0x0020, 0x0500, 0x0502];

/// The descriptor written into parameter slot 0x13 when the check fails:
/// endpoint 1, profile 0x0104, device 0x0005, version 0, with the required
/// cluster lists. Stored in natural order; the wire wants it reversed.
const ENDPOINT_DESCRIPTOR: [u8; 27] = [
    0x00, // descriptor index
    0x01, // endpoint
    0x04, 0x01, // profile
    0x05, 0x00, // device
    0x00, // version
    0x05, // input cluster count
    0x00, 0x00, 0x06, 0x00, 0x0A, 0x00, 0x19, 0x00, 0x01, 0x05, // input clusters
    0x04, // output cluster count
    0x01, 0x00, 0x20, 0x00, 0x00, 0x05, 0x02, 0x05, // output clusters
];

/// Converts a channel number to the stick's channel-mask form. Returns 0 for
/// anything outside the 2.4 GHz range 11..=26.
pub fn channel_mask(channel: u8) -> u32 {
    match channel {
        11..=26 => 1 << channel,
        _ => 0,
    }
}

pub(crate) fn coordinator_descriptor() -> Vec<u8> {
    let mut descriptor = ENDPOINT_DESCRIPTOR.to_vec();
    descriptor.reverse();
    descriptor
}

/// Whether the coordinator's advertised simple descriptor carries every
/// cluster the stack relies on.
pub(crate) fn has_required_clusters(descriptor: &SimpleDescriptor) -> bool {
    REQUIRED_INPUT_CLUSTERS
        .iter()
        .all(|cluster| descriptor.input_clusters.contains(cluster))
        && REQUIRED_OUTPUT_CLUSTERS
            .iter()
            .all(|cluster| descriptor.output_clusters.contains(cluster))
}

/// Background task spawned at adapter construction. Every 3 seconds it asks
/// the coordinator for its own endpoint-1 simple descriptor over ZDP; a
/// failed check rewrites the descriptor slot and the loop runs again until
/// a query confirms the expected clusters. Query and write errors only
/// delay the next attempt.
pub(crate) struct EndpointCheck {
    pub adapter: Adapter,
    pub driver: Driver,
}

impl EndpointCheck {
    pub async fn task(self) {
        loop {
            delay_for(CHECK_INTERVAL).await;

            match self.check().await {
                Ok(true) => {
                    debug!("coordinator endpoint descriptor verified");
                    return;
                }
                Ok(false) => {
                    debug!("coordinator endpoint descriptor out of date, rewriting");
                    if let Err(error) = self.install().await {
                        debug!("endpoint descriptor write failed: {}", error);
                    }
                }
                Err(error) => {
                    debug!("endpoint descriptor query failed: {}", error);
                }
            }
        }
    }

    async fn check(&self) -> Result<bool> {
        let descriptor = self
            .adapter
            .simple_descriptor(COORDINATOR_ADDRESS, COORDINATOR_ENDPOINT)
            .await?;
        Ok(has_required_clusters(&descriptor))
    }

    async fn install(&self) -> Result<()> {
        self.driver
            .write_parameter(Parameter::Endpoint(coordinator_descriptor()))
            .await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn descriptor(input_clusters: Vec<ClusterId>, output_clusters: Vec<ClusterId>) -> SimpleDescriptor {
        SimpleDescriptor {
            endpoint: 1,
            profile: 0x0104,
            device_identifier: 0x0005,
            device_version: 0,
            input_clusters,
            output_clusters,
        }
    }

    #[test]
    fn channel_mask_covers_2_4_ghz_band() {
        for channel in 11..=26 {
            assert_eq!(channel_mask(channel), 1 << channel);
        }
        assert_eq!(channel_mask(0), 0);
        assert_eq!(channel_mask(10), 0);
        assert_eq!(channel_mask(27), 0);
        assert_eq!(channel_mask(255), 0);
    }

    #[test]
    fn full_cluster_sets_pass_the_check() {
        let descriptor = descriptor(
            REQUIRED_INPUT_CLUSTERS.to_vec(),
            REQUIRED_OUTPUT_CLUSTERS.to_vec(),
        );
        assert!(has_required_clusters(&descriptor));
    }

    #[test]
    fn superset_cluster_lists_pass_the_check() {
        let mut input = REQUIRED_INPUT_CLUSTERS.to_vec();
        input.push(0x0300);
        let descriptor = descriptor(input, REQUIRED_OUTPUT_CLUSTERS.to_vec());
        assert!(has_required_clusters(&descriptor));
    }

    #[test]
    fn missing_cluster_fails_the_check() {
        let mut input = REQUIRED_INPUT_CLUSTERS.to_vec();
        input.retain(|cluster| *cluster != 0x0501);
        assert!(!has_required_clusters(&descriptor(
            input,
            REQUIRED_OUTPUT_CLUSTERS.to_vec()
        )));

        let mut output = REQUIRED_OUTPUT_CLUSTERS.to_vec();
        output.retain(|cluster| *cluster != 0x0020);
        assert!(!has_required_clusters(&descriptor(
            REQUIRED_INPUT_CLUSTERS.to_vec(),
            output
        )));
    }

    #[test]
    fn replacement_descriptor_advertises_the_required_clusters() {
        // Natural order: index, endpoint, profile, device, version, then the
        // counted cluster lists.
        let bytes = ENDPOINT_DESCRIPTOR;
        assert_eq!(bytes[1], 0x01);
        assert_eq!(u16::from_le_bytes([bytes[2], bytes[3]]), 0x0104);
        assert_eq!(u16::from_le_bytes([bytes[4], bytes[5]]), 0x0005);

        let input_count = usize::from(bytes[7]);
        let mut input_clusters = Vec::new();
        for i in 0..input_count {
            input_clusters.push(u16::from_le_bytes([bytes[8 + i * 2], bytes[9 + i * 2]]));
        }
        let output_offset = 8 + input_count * 2;
        let output_count = usize::from(bytes[output_offset]);
        let mut output_clusters = Vec::new();
        for i in 0..output_count {
            output_clusters.push(u16::from_le_bytes([
                bytes[output_offset + 1 + i * 2],
                bytes[output_offset + 2 + i * 2],
            ]));
        }

        assert_eq!(input_clusters, REQUIRED_INPUT_CLUSTERS.to_vec());
        assert_eq!(output_clusters, REQUIRED_OUTPUT_CLUSTERS.to_vec());

        // The wire form is the same bytes reversed.
        let mut wire = coordinator_descriptor();
        assert_eq!(wire.len(), 27);
        wire.reverse();
        assert_eq!(wire, ENDPOINT_DESCRIPTOR.to_vec());
    }
}
