//! Typed ZDP (Zigbee Device Profile) requests and responses. Every payload
//! is prefixed on the wire with the transaction sequence number allocated by
//! the dispatcher; the layouts here cover everything after that byte.

pub mod protocol;

use conbee::{ClusterId, ReadWire, WriteWire};

pub use self::protocol::{
    ActiveEpRequest, ActiveEpResponse, BindRequest, BindResponse, BindTarget, DeviceType,
    MgmtLeaveRequest, MgmtLeaveResponse, MgmtLqiRequest, MgmtLqiResponse,
    MgmtPermitJoiningRequest, MgmtRtgRequest, MgmtRtgResponse, Neighbor, NodeDescRequest,
    NodeDescResponse, Route, RouteStatus, SimpleDescRequest, SimpleDescResponse, SimpleDescriptor,
    UnbindRequest, UnbindResponse,
};

/// ZDP runs on profile 0, endpoint 0.
pub const PROFILE_ID: u16 = 0x0000;
pub const ENDPOINT: u8 = 0x00;

/// Cluster of the unsolicited Device_annce notification.
pub const DEVICE_ANNCE: ClusterId = 0x0013;

pub trait Request: WriteWire {
    const CLUSTER_ID: ClusterId;

    /// Whether this request insists on an APS acknowledgement regardless of
    /// the adapter-wide TX options.
    const APS_ACK: bool = false;

    type Response: Response;
}

pub trait Response: ReadWire {
    const CLUSTER_ID: ClusterId;

    /// The ZDP status byte; non-zero means the peer rejected the request.
    fn status(&self) -> u8;
}
