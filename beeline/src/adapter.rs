use std::fmt::{self, Display};
use std::io::Cursor;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use tokio::sync::{mpsc, oneshot};
use tokio::time::{delay_for, interval};

use beeline_helpers::{submit_queue, SubmitQueue, TransactionIds};
use conbee::{
    ApsDataRequest, Destination, Driver, Endpoint, EventReader, ExtendedAddress, FirmwareVersion,
    NetworkState, Parameter, ParameterId, ReadWireExt, ShortAddress, WriteWireExt,
    BROADCAST_ROUTERS, BROADCAST_RX_ON_WHEN_IDLE, DEFAULT_RADIUS, RADIUS_UNLIMITED,
    TX_OPTION_APS_ACK,
};

use crate::errors::{Error, ErrorKind, Result};
use crate::events::{zcl_payload, DeviceDirectory, Event, ZclPayload};
use crate::pending::{PendingRequests, SWEEP_INTERVAL};
use crate::router::Router;
use crate::startup::{channel_mask, EndpointCheck};
use crate::waitress::{Waiter, Waitress, ZclMatcher};
use crate::zcl::{ZclFrame, ZclHeader};
use crate::zdo::{self, Request, Response};
use crate::{COORDINATOR_ENDPOINT, GP_ENDPOINT, GP_PROFILE_ID, HA_PROFILE_ID};

/// Manufacturer code the coordinator reports for itself.
pub const COORDINATOR_MANUFACTURER_ID: u16 = 0x1135;

/// Stick-side lifetime of an outgoing request, in seconds.
const REQUEST_TIMEOUT: u16 = 30;
const PERMIT_JOIN_TIMEOUT: u16 = 5;

/// Inter-submission delays at or above this many milliseconds switch the
/// adapter-wide TX options to request APS acknowledgements.
const APS_ACK_DELAY_THRESHOLD: u64 = 200;

#[derive(Clone, Debug)]
pub struct SerialPortOptions {
    pub path: String,
    pub baud_rate: u32,
}

impl SerialPortOptions {
    pub fn new<P>(path: P) -> Self
    where
        P: Into<String>,
    {
        Self {
            path: path.into(),
            baud_rate: conbee::BAUD,
        }
    }
}

#[derive(Clone, Debug)]
pub struct AdapterOptions {
    /// Maximum driver submissions in flight at once.
    pub concurrent: usize,
    /// Milliseconds to wait between submissions.
    pub delay: u64,
}

impl Default for AdapterOptions {
    fn default() -> Self {
        Self {
            concurrent: 2,
            delay: 0,
        }
    }
}

#[derive(Clone, Debug)]
pub struct NetworkOptions {
    pub pan_id: u16,
    pub extended_pan_id: [u8; 8],
    pub network_key: [u8; 16],
    /// The first entry is the channel the network should run on.
    pub channel_list: Vec<u8>,
}

#[derive(Clone, Debug)]
pub struct Config {
    pub serial_port: SerialPortOptions,
    pub adapter: AdapterOptions,
    pub network: NetworkOptions,
}

#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum Started {
    Resumed,
}

impl Display for Started {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Started::Resumed => write!(f, "resumed"),
        }
    }
}

#[derive(Clone, Debug)]
pub struct Coordinator {
    pub network_address: ShortAddress,
    pub manufacturer_id: u16,
    pub ieee_addr: String,
    pub endpoints: Vec<Endpoint>,
}

#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub struct NetworkParameters {
    pub pan_id: u16,
    pub extended_pan_id: u64,
    pub channel: u8,
}

/// The adapter core: translates the caller's Zigbee operations into APS
/// requests, correlates the radio's indications back to them, and surfaces
/// unsolicited traffic as [`Event`]s.
#[derive(Clone)]
pub struct Adapter {
    driver: Driver,
    queue: SubmitQueue,
    pending: PendingRequests,
    waitress: Waitress,
    transaction_ids: Arc<TransactionIds>,
    join_permitted: Arc<AtomicBool>,
    tx_options: u8,
    serial_port: SerialPortOptions,
    network: NetworkOptions,
    version: Arc<Mutex<Option<FirmwareVersion>>>,
    events: mpsc::Sender<Event>,
}

impl Adapter {
    /// Wires up the adapter against a driver pair and spawns its background
    /// tasks. Must run inside a tokio runtime.
    pub fn new(
        driver: Driver,
        events: EventReader,
        devices: Option<Arc<dyn DeviceDirectory>>,
        config: Config,
    ) -> (Adapter, mpsc::Receiver<Event>) {
        let (sink_tx, sink_rx) = mpsc::channel(1);

        let pending = PendingRequests::new();
        let waitress = Waitress::new();
        let join_permitted = Arc::new(AtomicBool::new(false));

        let (queue, worker) = submit_queue(
            config.adapter.concurrent,
            Duration::from_millis(config.adapter.delay),
        );
        let tx_options = if config.adapter.delay >= APS_ACK_DELAY_THRESHOLD {
            TX_OPTION_APS_ACK
        } else {
            0
        };

        let router = Router {
            events,
            pending: pending.clone(),
            waitress: waitress.clone(),
            sink: sink_tx.clone(),
            join_permitted: join_permitted.clone(),
            devices,
        };
        tokio::spawn(worker.task());
        tokio::spawn(router.task());
        tokio::spawn(sweeper(pending.clone(), waitress.clone()));

        let adapter = Adapter {
            driver,
            queue,
            pending,
            waitress,
            transaction_ids: Arc::new(TransactionIds::new()),
            join_permitted,
            tx_options,
            serial_port: config.serial_port,
            network: config.network,
            version: Arc::new(Mutex::new(None)),
            events: sink_tx,
        };

        // The installer queries the coordinator over ZDP, so it needs the
        // full dispatch path, not just the driver handle.
        let endpoint_check = EndpointCheck {
            adapter: adapter.clone(),
            driver: adapter.driver.clone(),
        };
        tokio::spawn(endpoint_check.task());

        (adapter, sink_rx)
    }

    /// Opens the driver and reconciles the radio's network parameters with
    /// the configured ones, cycling the network when anything changed.
    pub async fn start(&self) -> Result<Started> {
        self.driver.open(self.serial_port.baud_rate).await?;

        let mut changed = false;

        let pan_id = self.network.pan_id;
        changed |= self
            .reconcile_parameter(
                ParameterId::NwkPanId,
                |parameter| match parameter {
                    Parameter::NwkPanId(value) => Some(*value),
                    _ => None,
                },
                pan_id,
                Parameter::NwkPanId(pan_id),
            )
            .await;

        let extended_pan_id = u64::from_le_bytes(self.network.extended_pan_id);
        changed |= self
            .reconcile_parameter(
                ParameterId::ApsExtendedPanId,
                |parameter| match parameter {
                    Parameter::ApsExtendedPanId(value) => Some(*value),
                    _ => None,
                },
                extended_pan_id,
                Parameter::ApsExtendedPanId(extended_pan_id),
            )
            .await;

        if let Some(channel) = self.network.channel_list.first().copied() {
            changed |= self
                .reconcile_parameter(
                    ParameterId::CurrentChannel,
                    |parameter| match parameter {
                        Parameter::CurrentChannel(value) => Some(*value),
                        _ => None,
                    },
                    channel,
                    Parameter::ChannelMask(channel_mask(channel)),
                )
                .await;
        }

        let network_key = self.network.network_key;
        changed |= self
            .reconcile_parameter(
                ParameterId::NetworkKey,
                |parameter| match parameter {
                    Parameter::NetworkKey(value) => Some(*value),
                    _ => None,
                },
                network_key,
                Parameter::NetworkKey(network_key),
            )
            .await;

        if changed {
            info!("network parameters changed, cycling the network");
            self.driver
                .change_network_state(NetworkState::Offline)
                .await?;
            delay_for(Duration::from_secs(2)).await;
            self.driver
                .change_network_state(NetworkState::Connected)
                .await?;
            delay_for(Duration::from_secs(2)).await;
        }

        Ok(Started::Resumed)
    }

    pub async fn stop(&self) -> Result<()> {
        self.driver.close().await?;
        Ok(())
    }

    pub async fn get_coordinator(&self) -> Result<Coordinator> {
        let network_address = self
            .read_parameter(ParameterId::NwkAddress, |parameter| match parameter {
                Parameter::NwkAddress(value) => Some(*value),
                _ => None,
            })
            .await?;
        let ieee = self
            .read_parameter(ParameterId::MacAddress, |parameter| match parameter {
                Parameter::MacAddress(value) => Some(*value),
                _ => None,
            })
            .await?;

        Ok(Coordinator {
            network_address,
            manufacturer_id: COORDINATOR_MANUFACTURER_ID,
            ieee_addr: format!("{:#018x}", ieee),
            endpoints: vec![COORDINATOR_ENDPOINT, GP_ENDPOINT],
        })
    }

    pub async fn get_coordinator_version(&self) -> Result<FirmwareVersion> {
        if let Some(version) = *self.version.lock().expect("poisoned") {
            return Ok(version);
        }

        let version = self.driver.read_firmware_version().await?;
        debug!("coordinator firmware: {}", version);
        *self.version.lock().expect("poisoned") = Some(version);
        Ok(version)
    }

    pub async fn get_network_parameters(&self) -> Result<NetworkParameters> {
        let pan_id = self
            .read_parameter(ParameterId::NwkPanId, |parameter| match parameter {
                Parameter::NwkPanId(value) => Some(*value),
                _ => None,
            })
            .await?;
        let extended_pan_id = self
            .read_parameter(ParameterId::ApsExtendedPanId, |parameter| match parameter {
                Parameter::ApsExtendedPanId(value) => Some(*value),
                _ => None,
            })
            .await?;
        let channel = self
            .read_parameter(ParameterId::CurrentChannel, |parameter| match parameter {
                Parameter::CurrentChannel(value) => Some(*value),
                _ => None,
            })
            .await?;

        Ok(NetworkParameters {
            pan_id,
            extended_pan_id,
            channel,
        })
    }

    pub fn supports_backup(&self) -> bool {
        false
    }

    /// Opens (or closes, with 0 seconds) the join window. Failures are
    /// retried until the whole sequence goes through.
    pub async fn permit_join(
        &self,
        seconds: u8,
        network_address: Option<ShortAddress>,
    ) -> Result<()> {
        loop {
            match self.try_permit_join(seconds, network_address).await {
                Ok(()) => break,
                Err(error) => warn!("permit join failed, retrying: {}", error),
            }
        }

        self.join_permitted.store(seconds > 0, Ordering::SeqCst);
        Ok(())
    }

    async fn try_permit_join(
        &self,
        seconds: u8,
        network_address: Option<ShortAddress>,
    ) -> Result<()> {
        let id = self.transaction_ids.next();
        let mut asdu = Vec::with_capacity(3);
        asdu.write_wire(id)?;
        asdu.write_wire(zdo::MgmtPermitJoiningRequest {
            permit_duration: seconds,
            tc_significance: 0,
        })?;

        // Broadcasts go out in NWK address mode, aimed at the router set.
        let (destination, radius) = match network_address {
            Some(addr) => (Destination::Nwk(addr, zdo::ENDPOINT), DEFAULT_RADIUS),
            None => (
                Destination::Nwk(BROADCAST_ROUTERS, zdo::ENDPOINT),
                RADIUS_UNLIMITED,
            ),
        };
        let request = ApsDataRequest {
            request_id: id,
            radius,
            destination,
            profile_id: zdo::PROFILE_ID,
            cluster_id: zdo::MgmtPermitJoiningRequest::CLUSTER_ID,
            source_endpoint: zdo::ENDPOINT,
            asdu,
            tx_options: self.tx_options,
            timeout: PERMIT_JOIN_TIMEOUT,
        };

        self.submit_confirmed(request).await?;
        self.driver
            .write_parameter(Parameter::PermitJoin(seconds))
            .await?;
        Ok(())
    }

    pub async fn node_descriptor(
        &self,
        network_address: ShortAddress,
    ) -> Result<zdo::NodeDescResponse> {
        self.zdo_request(
            network_address,
            zdo::NodeDescRequest {
                addr: network_address,
            },
        )
        .await
    }

    pub async fn active_endpoints(&self, network_address: ShortAddress) -> Result<Vec<Endpoint>> {
        let response = self
            .zdo_request(
                network_address,
                zdo::ActiveEpRequest {
                    addr: network_address,
                },
            )
            .await?;
        Ok(response.active_endpoints)
    }

    pub async fn simple_descriptor(
        &self,
        network_address: ShortAddress,
        endpoint: Endpoint,
    ) -> Result<zdo::SimpleDescriptor> {
        let response = self
            .zdo_request(
                network_address,
                zdo::SimpleDescRequest {
                    addr: network_address,
                    endpoint,
                },
            )
            .await?;
        Ok(response.simple_descriptor)
    }

    /// Reads the device's full neighbor table, issuing as many paged
    /// requests as it takes. Pages are fetched strictly one at a time.
    pub async fn lqi(&self, network_address: ShortAddress) -> Result<Vec<zdo::Neighbor>> {
        let mut start_index = 0;
        let mut neighbors = Vec::new();

        loop {
            let response = self
                .zdo_request(network_address, zdo::MgmtLqiRequest { start_index })
                .await?;

            let total = usize::from(response.neighbor_table_entries);
            let count = response.neighbor_table_list.len() as u8;
            neighbors.extend(response.neighbor_table_list);

            if neighbors.len() >= total || count == 0 {
                return Ok(neighbors);
            }

            start_index += count;
        }
    }

    pub async fn routing_table(&self, network_address: ShortAddress) -> Result<Vec<zdo::Route>> {
        let mut start_index = 0;
        let mut routes = Vec::new();

        loop {
            let response = self
                .zdo_request(network_address, zdo::MgmtRtgRequest { start_index })
                .await?;

            let total = usize::from(response.routing_table_entries);
            let count = response.routing_table_list.len() as u8;
            routes.extend(response.routing_table_list);

            if routes.len() >= total || count == 0 {
                return Ok(routes);
            }

            start_index += count;
        }
    }

    pub async fn bind(
        &self,
        destination_network_address: ShortAddress,
        source_ieee: ExtendedAddress,
        source_endpoint: Endpoint,
        cluster_id: conbee::ClusterId,
        target: zdo::BindTarget,
    ) -> Result<()> {
        ensure_bind_endpoint(destination_network_address, &target)?;
        self.zdo_request(
            destination_network_address,
            zdo::BindRequest {
                src_ieee: source_ieee,
                src_endpoint: source_endpoint,
                cluster_id,
                target,
            },
        )
        .await?;
        Ok(())
    }

    pub async fn unbind(
        &self,
        destination_network_address: ShortAddress,
        source_ieee: ExtendedAddress,
        source_endpoint: Endpoint,
        cluster_id: conbee::ClusterId,
        target: zdo::BindTarget,
    ) -> Result<()> {
        ensure_bind_endpoint(destination_network_address, &target)?;
        self.zdo_request(
            destination_network_address,
            zdo::UnbindRequest {
                src_ieee: source_ieee,
                src_endpoint: source_endpoint,
                cluster_id,
                target,
            },
        )
        .await?;
        Ok(())
    }

    pub async fn remove_device(
        &self,
        network_address: ShortAddress,
        ieee_addr: ExtendedAddress,
    ) -> Result<()> {
        self.zdo_request(network_address, zdo::MgmtLeaveRequest).await?;

        let event = Event::DeviceLeave {
            network_address,
            ieee_addr: format!("{:#018x}", ieee_addr),
        };
        let _ = self.events.clone().send(event).await;
        Ok(())
    }

    /// Sends a caller-encoded ZCL frame to one endpoint. When the command
    /// declares a response and the frame asks for one, the returned payload
    /// is the correlated reply; fire-and-forget sends return `None`.
    pub async fn send_zcl_frame_to_endpoint(
        &self,
        network_address: ShortAddress,
        endpoint: Endpoint,
        frame: &ZclFrame,
        timeout: Duration,
        disable_response: bool,
        source_endpoint: Option<Endpoint>,
    ) -> Result<Option<ZclPayload>> {
        let source_endpoint = source_endpoint.unwrap_or(COORDINATOR_ENDPOINT);
        let request = ApsDataRequest {
            request_id: self.transaction_ids.next(),
            destination: Destination::Nwk(network_address, endpoint),
            profile_id: Self::unicast_profile(source_endpoint, endpoint),
            cluster_id: frame.cluster_id,
            source_endpoint,
            asdu: frame.data.clone(),
            tx_options: self.tx_options,
            radius: DEFAULT_RADIUS,
            timeout: request_timeout(timeout),
        };

        let awaits_response = frame.command_has_response
            && !disable_response
            && !frame.header.disable_default_response;

        if awaits_response {
            let (pending_id, receiver) = self.pending.register(
                network_address,
                HA_PROFILE_ID,
                frame.cluster_id,
                Some(frame.header.transaction_sequence_number),
                Some(timeout),
            );
            self.submit_correlated(request, pending_id).await?;

            let response = receiver.await??;
            let header = ZclHeader::parse(&response.asdu);
            Ok(Some(zcl_payload(&response, header)))
        } else {
            self.submit_confirmed(request).await?;
            Ok(None)
        }
    }

    pub async fn send_zcl_frame_to_group(
        &self,
        group_id: u16,
        frame: &ZclFrame,
        source_endpoint: Option<Endpoint>,
    ) -> Result<()> {
        let request = ApsDataRequest {
            request_id: self.transaction_ids.next(),
            destination: Destination::Group(group_id),
            profile_id: HA_PROFILE_ID,
            cluster_id: frame.cluster_id,
            source_endpoint: source_endpoint.unwrap_or(COORDINATOR_ENDPOINT),
            asdu: frame.data.clone(),
            tx_options: self.tx_options,
            radius: RADIUS_UNLIMITED,
            timeout: REQUEST_TIMEOUT,
        };
        self.submit_confirmed(request).await
    }

    pub async fn send_zcl_frame_to_all(
        &self,
        endpoint: Endpoint,
        frame: &ZclFrame,
        source_endpoint: Endpoint,
    ) -> Result<()> {
        let request = ApsDataRequest {
            request_id: self.transaction_ids.next(),
            // Broadcast travels as a NWK-mode send to the broadcast address.
            destination: Destination::Nwk(BROADCAST_RX_ON_WHEN_IDLE, endpoint),
            profile_id: Self::unicast_profile(source_endpoint, endpoint),
            cluster_id: frame.cluster_id,
            source_endpoint,
            asdu: frame.data.clone(),
            tx_options: self.tx_options,
            radius: RADIUS_UNLIMITED,
            timeout: REQUEST_TIMEOUT,
        };
        self.submit_confirmed(request).await
    }

    /// Registers a waitress entry for an arbitrary ZCL frame.
    pub fn wait_for(&self, matcher: ZclMatcher, timeout: Duration) -> Waiter {
        self.waitress.register(matcher, timeout)
    }

    pub fn add_install_code(&self) -> Result<()> {
        Err(ErrorKind::Unsupported("add install code").into())
    }

    pub fn reset(&self) -> Result<()> {
        Err(ErrorKind::Unsupported("reset").into())
    }

    pub fn backup(&self) -> Result<()> {
        Err(ErrorKind::Unsupported("backup").into())
    }

    pub fn restore_channel_inter_pan(&self) -> Result<()> {
        Err(ErrorKind::Unsupported("restore InterPAN channel").into())
    }

    pub fn send_zcl_frame_inter_pan_to_ieee_addr(&self) -> Result<()> {
        Err(ErrorKind::Unsupported("send InterPAN ZCL frame").into())
    }

    pub fn send_zcl_frame_inter_pan_broadcast(&self) -> Result<()> {
        Err(ErrorKind::Unsupported("send InterPAN ZCL frame").into())
    }

    pub fn set_channel_inter_pan(&self) -> Result<()> {
        Err(ErrorKind::Unsupported("set InterPAN channel").into())
    }

    pub fn change_channel(&self, _channel: u8) -> Result<()> {
        Err(ErrorKind::Unsupported("change channel").into())
    }

    pub fn set_transmit_power(&self, _value: i8) -> Result<()> {
        Err(ErrorKind::Unsupported("set transmit power").into())
    }

    /// Green-power traffic runs on its own profile when both ends are the
    /// well-known green-power endpoint.
    fn unicast_profile(source_endpoint: Endpoint, endpoint: Endpoint) -> u16 {
        if source_endpoint == GP_ENDPOINT && endpoint == GP_ENDPOINT {
            GP_PROFILE_ID
        } else {
            HA_PROFILE_ID
        }
    }

    /// Shared path for ZDP queries: allocate the transaction ID, register
    /// the expected reply, submit, await, parse, and turn a non-zero status
    /// byte into an error.
    async fn zdo_request<R>(&self, network_address: ShortAddress, request: R) -> Result<R::Response>
    where
        R: Request,
    {
        let id = self.transaction_ids.next();
        let mut asdu = Vec::with_capacity(1 + usize::from(request.wire_len()));
        asdu.write_wire(id)?;
        asdu.write_wire(request)?;

        let aps = ApsDataRequest {
            request_id: id,
            destination: Destination::Nwk(network_address, zdo::ENDPOINT),
            profile_id: zdo::PROFILE_ID,
            cluster_id: R::CLUSTER_ID,
            source_endpoint: zdo::ENDPOINT,
            asdu,
            tx_options: if R::APS_ACK {
                TX_OPTION_APS_ACK
            } else {
                self.tx_options
            },
            radius: DEFAULT_RADIUS,
            timeout: REQUEST_TIMEOUT,
        };

        let (pending_id, receiver) = self.pending.register(
            network_address,
            zdo::PROFILE_ID,
            <R::Response as Response>::CLUSTER_ID,
            None,
            None,
        );
        self.submit_correlated(aps, pending_id).await?;

        let response = receiver.await??;

        // Byte 0 is the echoed transaction sequence number.
        let mut cursor = Cursor::new(response.asdu.get(1..).unwrap_or(&[]));
        let parsed: R::Response = cursor.read_wire()?;
        if parsed.status() != 0 {
            return Err(ErrorKind::Status(parsed.status()).into());
        }

        Ok(parsed)
    }

    /// Queues a submission whose semantic reply is an already-registered
    /// pending entry; a failed submit rejects that entry instead of the
    /// caller directly.
    async fn submit_correlated(&self, request: ApsDataRequest, pending_id: u64) -> Result<()> {
        let driver = self.driver.clone();
        let pending = self.pending.clone();

        self.queue
            .push(async move {
                let request_id = request.request_id;
                if let Err(error) = driver.aps_data_request(request).await {
                    warn!("aps data request {} failed: {}", request_id, error);
                    pending.fail(pending_id, error.into());
                }
            })
            .await
            .map_err(|_| Error::from(ErrorKind::ChannelError))
    }

    /// Queues a submission and waits for the driver to accept it.
    async fn submit_confirmed(&self, request: ApsDataRequest) -> Result<()> {
        let driver = self.driver.clone();
        let (sender, receiver) = oneshot::channel();

        self.queue
            .push(async move {
                let _ = sender.send(driver.aps_data_request(request).await);
            })
            .await
            .map_err(|_| Error::from(ErrorKind::ChannelError))?;

        receiver.await??;
        Ok(())
    }

    async fn read_parameter<T>(
        &self,
        parameter_id: ParameterId,
        extract: fn(&Parameter) -> Option<T>,
    ) -> Result<T> {
        let parameter = self.driver.read_parameter(parameter_id).await?;
        extract(&parameter).ok_or_else(|| {
            conbee::Error::from(conbee::ErrorKind::UnexpectedParameter(parameter.id())).into()
        })
    }

    /// Compares one radio parameter against the desired value, writing the
    /// replacement on mismatch or unreadable state. Returns whether the
    /// parameter needed changing; write failures are tolerated.
    async fn reconcile_parameter<T>(
        &self,
        parameter_id: ParameterId,
        extract: fn(&Parameter) -> Option<T>,
        desired: T,
        replacement: Parameter,
    ) -> bool
    where
        T: PartialEq,
    {
        match self.read_parameter(parameter_id, extract).await {
            Ok(current) if current == desired => false,
            Ok(_) => {
                debug!("{} differs from configuration, rewriting", parameter_id);
                self.write_network_parameter(replacement).await;
                true
            }
            Err(error) => {
                debug!("reading {} failed: {}", parameter_id, error);
                self.write_network_parameter(replacement).await;
                true
            }
        }
    }

    async fn write_network_parameter(&self, parameter: Parameter) {
        let parameter_id = parameter.id();
        if let Err(error) = self.driver.write_parameter(parameter).await {
            debug!("writing {} failed: {}", parameter_id, error);
        }
    }
}

/// An endpoint-type bind target must name its destination endpoint.
fn ensure_bind_endpoint(network_address: ShortAddress, target: &zdo::BindTarget) -> Result<()> {
    if let zdo::BindTarget::Endpoint(_, None) = target {
        debug_assert!(
            false,
            "endpoint bind for {:#06x} without a destination endpoint",
            network_address
        );
        error!(
            "dropping bind for {:#06x}: endpoint target without a destination endpoint",
            network_address
        );
        return Err(ErrorKind::MissingDestinationEndpoint.into());
    }
    Ok(())
}

/// Single timer expiring both correlation tables once a second.
async fn sweeper(pending: PendingRequests, waitress: Waitress) {
    let mut interval = interval(SWEEP_INTERVAL);
    loop {
        let now = interval.tick().await;
        pending.sweep(now);
        waitress.sweep(now);
    }
}

fn request_timeout(timeout: Duration) -> u16 {
    let seconds = timeout.as_secs();
    if seconds == 0 {
        1
    } else if seconds > u64::from(u16::max_value()) {
        u16::max_value()
    } else {
        seconds as u16
    }
}
