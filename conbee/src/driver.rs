use tokio::stream::Stream;
use tokio::sync::{mpsc, oneshot};

use crate::{
    ApsDataRequest, Error, ErrorKind, FirmwareVersion, GpDataInd, NetworkState, Parameter,
    ParameterId, ReceivedDataResponse, Result,
};

type Reply<T> = oneshot::Sender<Result<T>>;

/// A command from the adapter core to the byte-level driver implementation.
pub enum Command {
    Open { baud: u32, reply: Reply<()> },
    Close { reply: Reply<()> },
    ReadParameter {
        parameter_id: ParameterId,
        reply: Reply<Parameter>,
    },
    WriteParameter {
        parameter: Parameter,
        reply: Reply<ParameterId>,
    },
    ReadFirmwareVersion { reply: Reply<FirmwareVersion> },
    ChangeNetworkState {
        state: NetworkState,
        reply: Reply<()>,
    },
    ApsDataRequest {
        request: ApsDataRequest,
        reply: Reply<()>,
    },
}

/// Unsolicited traffic surfaced by the driver's frame parser.
#[derive(Clone, Debug)]
pub enum DriverEvent {
    ReceivedDataPayload(ReceivedDataResponse),
    ReceivedGreenPowerIndication(GpDataInd),
}

/// Handle through which the adapter core talks to the driver. Cheap to clone;
/// every method sends a [`Command`] and awaits its reply channel.
#[derive(Clone)]
pub struct Driver {
    commands: mpsc::Sender<Command>,
}

/// The other half of [`channel`], consumed by the byte-level implementation:
/// it services `commands` and pushes unsolicited frames into `events`.
pub struct DriverServer {
    pub commands: mpsc::Receiver<Command>,
    pub events: mpsc::Sender<DriverEvent>,
}

/// Stream of unsolicited driver events, consumed by the inbound router.
pub struct EventReader {
    rx: mpsc::Receiver<DriverEvent>,
}

impl Stream for EventReader {
    type Item = DriverEvent;

    fn poll_next(
        mut self: std::pin::Pin<&mut Self>,
        cx: &mut std::task::Context<'_>,
    ) -> std::task::Poll<Option<Self::Item>> {
        self.rx.poll_recv(cx)
    }
}

pub fn channel() -> (Driver, EventReader, DriverServer) {
    let (commands_tx, commands_rx) = mpsc::channel(1);
    let (events_tx, events_rx) = mpsc::channel(1);

    let driver = Driver {
        commands: commands_tx,
    };
    let reader = EventReader { rx: events_rx };
    let server = DriverServer {
        commands: commands_rx,
        events: events_tx,
    };

    (driver, reader, server)
}

impl Driver {
    async fn command<T, F>(&self, make: F) -> Result<T>
    where
        F: FnOnce(Reply<T>) -> Command,
    {
        let (sender, receiver) = oneshot::channel();

        self.commands
            .clone()
            .send(make(sender))
            .await
            .map_err(|_| ErrorKind::ChannelError)?;

        receiver.await.map_err(|_| Error::from(ErrorKind::ChannelError))?
    }

    pub async fn open(&self, baud: u32) -> Result<()> {
        self.command(|reply| Command::Open { baud, reply }).await
    }

    pub async fn close(&self) -> Result<()> {
        self.command(|reply| Command::Close { reply }).await
    }

    pub async fn read_parameter(&self, parameter_id: ParameterId) -> Result<Parameter> {
        self.command(|reply| Command::ReadParameter {
            parameter_id,
            reply,
        })
        .await
    }

    pub async fn write_parameter(&self, parameter: Parameter) -> Result<ParameterId> {
        self.command(|reply| Command::WriteParameter { parameter, reply })
            .await
    }

    pub async fn read_firmware_version(&self) -> Result<FirmwareVersion> {
        self.command(|reply| Command::ReadFirmwareVersion { reply })
            .await
    }

    pub async fn change_network_state(&self, state: NetworkState) -> Result<()> {
        self.command(|reply| Command::ChangeNetworkState { state, reply })
            .await
    }

    pub async fn aps_data_request(&self, request: ApsDataRequest) -> Result<()> {
        self.command(|reply| Command::ApsDataRequest { request, reply })
            .await
    }
}
