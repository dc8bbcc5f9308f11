//! One-shot matcher for ZCL frames that arrive outside the dispatcher's
//! send path: attribute reports, asynchronous command responses. Callers
//! register a matcher and deadline; every inbound payload is offered here
//! before it reaches the external event sink.

use std::sync::{Arc, Mutex};
use std::time::Duration;

use tokio::sync::oneshot;
use tokio::time::Instant;

use conbee::{ClusterId, Endpoint, ShortAddress};

use crate::errors::{ErrorKind, Result};
use crate::events::{Address, ZclPayload};
use crate::zcl::{Direction, FrameType};

#[derive(Clone, Debug)]
pub struct ZclMatcher {
    pub address: Option<ShortAddress>,
    pub endpoint: Endpoint,
    pub transaction_sequence_number: Option<u8>,
    pub frame_type: FrameType,
    pub cluster_id: ClusterId,
    pub command_id: u8,
    pub direction: Direction,
}

impl ZclMatcher {
    fn matches(&self, payload: &ZclPayload) -> bool {
        let header = match &payload.header {
            Some(header) => header,
            None => return false,
        };

        if let Some(address) = self.address {
            if payload.address != Address::Nwk(address) {
                return false;
            }
        }
        if let Some(tsn) = self.transaction_sequence_number {
            if header.transaction_sequence_number != tsn {
                return false;
            }
        }

        payload.endpoint == self.endpoint
            && payload.cluster_id == self.cluster_id
            && header.frame_type == self.frame_type
            && header.command_id == self.command_id
            && header.direction == self.direction
    }
}

struct Entry {
    id: u64,
    matcher: ZclMatcher,
    timeout: Duration,
    deadline: Instant,
    sender: oneshot::Sender<Result<ZclPayload>>,
}

#[derive(Default)]
struct Inner {
    next_id: u64,
    entries: Vec<Entry>,
}

#[derive(Clone)]
pub struct Waitress {
    inner: Arc<Mutex<Inner>>,
}

/// A registered wait: the future plus a handle to withdraw it.
pub struct Waiter {
    id: u64,
    waitress: Waitress,
    receiver: oneshot::Receiver<Result<ZclPayload>>,
}

impl Waiter {
    pub async fn wait(self) -> Result<ZclPayload> {
        self.receiver.await?
    }

    pub fn cancel(self) {
        self.waitress.cancel(self.id);
    }
}

impl Waitress {
    pub fn new() -> Self {
        Self {
            inner: Arc::new(Mutex::new(Inner::default())),
        }
    }

    pub fn register(&self, matcher: ZclMatcher, timeout: Duration) -> Waiter {
        let (sender, receiver) = oneshot::channel();
        let mut inner = self.inner.lock().expect("poisoned");

        inner.next_id += 1;
        let id = inner.next_id;
        inner.entries.push(Entry {
            id,
            matcher,
            timeout,
            deadline: Instant::now() + timeout,
            sender,
        });

        Waiter {
            id,
            waitress: self.clone(),
            receiver,
        }
    }

    pub fn cancel(&self, id: u64) {
        let mut inner = self.inner.lock().expect("poisoned");
        inner.entries.retain(|entry| entry.id != id);
    }

    /// Offers a payload; the oldest matching entry (if any) takes it.
    pub fn resolve(&self, payload: &ZclPayload) -> bool {
        let mut inner = self.inner.lock().expect("poisoned");

        if let Some(position) = inner
            .entries
            .iter()
            .position(|entry| entry.matcher.matches(payload))
        {
            let entry = inner.entries.remove(position);
            let _ = entry.sender.send(Ok(payload.clone()));
            true
        } else {
            false
        }
    }

    pub fn sweep(&self, now: Instant) {
        let mut inner = self.inner.lock().expect("poisoned");

        let mut index = 0;
        while index < inner.entries.len() {
            if now >= inner.entries[index].deadline {
                let entry = inner.entries.remove(index);
                let matcher = &entry.matcher;
                let description = format!(
                    "timeout - {:?} - {} - {:?} - {} - {} after {}ms",
                    matcher.address,
                    matcher.endpoint,
                    matcher.transaction_sequence_number,
                    matcher.cluster_id,
                    matcher.command_id,
                    entry.timeout.as_millis(),
                );
                let _ = entry
                    .sender
                    .send(Err(ErrorKind::WaitForTimeout(description).into()));
            } else {
                index += 1;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::zcl::ZclHeader;

    fn matcher(tsn: Option<u8>) -> ZclMatcher {
        ZclMatcher {
            address: Some(0x1234),
            endpoint: 1,
            transaction_sequence_number: tsn,
            frame_type: FrameType::Global,
            cluster_id: 0x0006,
            command_id: 0x0B,
            direction: Direction::ServerToClient,
        }
    }

    fn payload(tsn: u8) -> ZclPayload {
        ZclPayload {
            address: Address::Nwk(0x1234),
            data: vec![0x18, tsn, 0x0B],
            cluster_id: 0x0006,
            header: ZclHeader::parse(&[0x18, tsn, 0x0B]),
            endpoint: 1,
            linkquality: 100,
            group_id: 0,
            was_broadcast: false,
            destination_endpoint: 1,
        }
    }

    #[tokio::test]
    async fn resolves_first_matching_entry() {
        let waitress = Waitress::new();
        let first = waitress.register(matcher(None), Duration::from_secs(10));
        let second = waitress.register(matcher(None), Duration::from_secs(10));

        assert!(waitress.resolve(&payload(1)));
        assert_eq!(first.wait().await.unwrap().cluster_id, 0x0006);

        // Insertion order breaks the tie; the second entry is still waiting.
        assert!(waitress.resolve(&payload(2)));
        assert_eq!(
            second
                .wait()
                .await
                .unwrap()
                .header
                .unwrap()
                .transaction_sequence_number,
            2
        );
    }

    #[tokio::test]
    async fn tsn_and_fields_must_match() {
        let waitress = Waitress::new();
        let _waiter = waitress.register(matcher(Some(9)), Duration::from_secs(10));

        assert!(!waitress.resolve(&payload(1)));

        let mut headerless = payload(9);
        headerless.header = None;
        assert!(!waitress.resolve(&headerless));

        assert!(waitress.resolve(&payload(9)));
    }

    #[tokio::test]
    async fn cancel_withdraws_the_entry() {
        let waitress = Waitress::new();
        let waiter = waitress.register(matcher(None), Duration::from_secs(10));
        waiter.cancel();

        assert!(!waitress.resolve(&payload(1)));
    }

    #[tokio::test]
    async fn sweep_rejects_expired_entries() {
        let waitress = Waitress::new();
        let waiter = waitress.register(matcher(None), Duration::from_millis(5));

        waitress.sweep(Instant::now() + Duration::from_millis(10));

        let error = waiter.wait().await.unwrap_err();
        assert!(error.to_string().starts_with("timeout - "));
        assert!(error.to_string().contains("after 5ms"));
    }
}
