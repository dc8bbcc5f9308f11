//! In-flight request table: each dispatcher send registers the reply it is
//! waiting for before the frame leaves, and the inbound router fulfils the
//! registration when the matching indication arrives. Entries that outlive
//! their timeout are rejected by the periodic sweep.

use std::sync::{Arc, Mutex};
use std::time::Duration;

use tokio::sync::oneshot;
use tokio::time::Instant;

use conbee::{ClusterId, ProfileId, ReceivedDataResponse, ShortAddress};

use crate::errors::{Error, ErrorKind, Result};

pub const DEFAULT_TIMEOUT: Duration = Duration::from_millis(60_000);
pub const SWEEP_INTERVAL: Duration = Duration::from_secs(1);

struct Entry {
    id: u64,
    address: ShortAddress,
    profile_id: ProfileId,
    cluster_id: ClusterId,
    transaction_sequence_number: Option<u8>,
    deadline: Instant,
    sender: oneshot::Sender<Result<ReceivedDataResponse>>,
}

impl Entry {
    fn matches(&self, response: &ReceivedDataResponse, tsn: Option<u8>) -> bool {
        response.source_address.short == Some(self.address)
            && response.profile_id == self.profile_id
            && response.cluster_id == self.cluster_id
            && match self.transaction_sequence_number {
                Some(expected) => tsn == Some(expected),
                None => true,
            }
    }
}

#[derive(Default)]
struct Inner {
    next_id: u64,
    entries: Vec<Entry>,
}

#[derive(Clone)]
pub struct PendingRequests {
    inner: Arc<Mutex<Inner>>,
}

impl PendingRequests {
    pub fn new() -> Self {
        Self {
            inner: Arc::new(Mutex::new(Inner::default())),
        }
    }

    /// Registers an expected reply and returns the entry ID (for
    /// [`PendingRequests::fail`]) and the future that will carry it.
    pub fn register(
        &self,
        address: ShortAddress,
        profile_id: ProfileId,
        cluster_id: ClusterId,
        transaction_sequence_number: Option<u8>,
        timeout: Option<Duration>,
    ) -> (u64, oneshot::Receiver<Result<ReceivedDataResponse>>) {
        let (sender, receiver) = oneshot::channel();
        let mut inner = self.inner.lock().expect("poisoned");

        inner.next_id += 1;
        let id = inner.next_id;
        inner.entries.push(Entry {
            id,
            address,
            profile_id,
            cluster_id,
            transaction_sequence_number,
            deadline: Instant::now() + timeout.unwrap_or(DEFAULT_TIMEOUT),
            sender,
        });

        (id, receiver)
    }

    /// Rejects and removes a single entry; used when the submit path fails
    /// before the frame ever reaches the air.
    pub fn fail(&self, id: u64, error: Error) {
        let mut inner = self.inner.lock().expect("poisoned");

        if let Some(position) = inner.entries.iter().position(|entry| entry.id == id) {
            let entry = inner.entries.remove(position);
            let _ = entry.sender.send(Err(error));
        }
    }

    /// Fulfils every entry matching the indication. Returns how many were
    /// resolved.
    pub fn resolve(&self, response: &ReceivedDataResponse, tsn: Option<u8>) -> usize {
        let mut inner = self.inner.lock().expect("poisoned");

        let mut resolved = 0;
        let mut index = 0;
        while index < inner.entries.len() {
            if inner.entries[index].matches(response, tsn) {
                let entry = inner.entries.remove(index);
                let _ = entry.sender.send(Ok(response.clone()));
                resolved += 1;
            } else {
                index += 1;
            }
        }

        resolved
    }

    /// Rejects entries whose deadline has passed.
    pub fn sweep(&self, now: Instant) {
        let mut inner = self.inner.lock().expect("poisoned");

        let mut index = 0;
        while index < inner.entries.len() {
            if now >= inner.entries[index].deadline {
                let entry = inner.entries.remove(index);
                debug!(
                    "pending request to {:#06x} cluster {:#06x} timed out",
                    entry.address, entry.cluster_id
                );
                let _ = entry.sender.send(Err(ErrorKind::Timeout.into()));
            } else {
                index += 1;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use conbee::{DestinationAddress, SourceAddress};

    use super::*;

    fn indication(
        short: Option<ShortAddress>,
        profile_id: ProfileId,
        cluster_id: ClusterId,
    ) -> ReceivedDataResponse {
        ReceivedDataResponse {
            destination_address: DestinationAddress::Nwk(0x0000),
            destination_endpoint: 0,
            source_address: SourceAddress {
                short,
                extended: None,
            },
            source_endpoint: 0,
            profile_id,
            cluster_id,
            asdu: vec![0x01, 0x00],
            lqi: 255,
            rssi: -50,
        }
    }

    #[tokio::test]
    async fn resolves_on_matching_indication() {
        let pending = PendingRequests::new();
        let (_, receiver) = pending.register(0x1234, 0, 0x8002, None, None);

        assert_eq!(pending.resolve(&indication(Some(0x1234), 0, 0x8002), None), 1);
        let response = receiver.await.unwrap().unwrap();
        assert_eq!(response.cluster_id, 0x8002);

        // The entry is gone; a second indication resolves nothing.
        assert_eq!(pending.resolve(&indication(Some(0x1234), 0, 0x8002), None), 0);
    }

    #[tokio::test]
    async fn ignores_mismatched_indications() {
        let pending = PendingRequests::new();
        let (_, mut receiver) = pending.register(0x1234, 0, 0x8002, None, None);

        assert_eq!(pending.resolve(&indication(Some(0x9999), 0, 0x8002), None), 0);
        assert_eq!(pending.resolve(&indication(Some(0x1234), 0x104, 0x8002), None), 0);
        assert_eq!(pending.resolve(&indication(Some(0x1234), 0, 0x8005), None), 0);
        assert!(receiver.try_recv().is_err());
    }

    #[tokio::test]
    async fn tsn_is_checked_only_when_registered() {
        let pending = PendingRequests::new();
        let (_, with_tsn) = pending.register(0x1234, 0x104, 0x0006, Some(7), None);
        let (_, without_tsn) = pending.register(0x1234, 0x104, 0x0006, None, None);

        assert_eq!(pending.resolve(&indication(Some(0x1234), 0x104, 0x0006), Some(3)), 1);
        assert!(without_tsn.await.unwrap().is_ok());

        assert_eq!(pending.resolve(&indication(Some(0x1234), 0x104, 0x0006), Some(7)), 1);
        assert!(with_tsn.await.unwrap().is_ok());
    }

    #[tokio::test]
    async fn sweep_rejects_expired_entries() {
        let pending = PendingRequests::new();
        let (_, receiver) =
            pending.register(0x1234, 0, 0x8002, None, Some(Duration::from_millis(10)));

        // Not yet due.
        pending.sweep(Instant::now());
        pending.sweep(Instant::now() + Duration::from_millis(20));

        let error = receiver.await.unwrap().unwrap_err();
        assert_eq!(error.to_string(), "waiting for response TIMEOUT");

        // Expired entries are removed, not re-rejected.
        assert_eq!(pending.resolve(&indication(Some(0x1234), 0, 0x8002), None), 0);
    }

    #[tokio::test]
    async fn fail_removes_a_single_entry() {
        let pending = PendingRequests::new();
        let (id, receiver) = pending.register(0x1234, 0, 0x8002, None, None);
        let (_, mut other) = pending.register(0x4321, 0, 0x8002, None, None);

        pending.fail(id, ErrorKind::ChannelError.into());
        assert!(receiver.await.unwrap().is_err());
        assert!(other.try_recv().is_err());
        assert_eq!(pending.resolve(&indication(Some(0x4321), 0, 0x8002), None), 1);
    }
}
