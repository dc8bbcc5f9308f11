//! Host-side adapter core for deCONZ family (ConBee / RaspBee) coordinator
//! radios: translates a Zigbee stack's operations into APS data requests,
//! correlates the radio's indications back to their callers, and surfaces
//! unsolicited traffic as events.

mod adapter;
mod errors;
mod events;
mod pending;
mod router;
mod startup;
mod waitress;
pub mod zcl;
pub mod zdo;

#[macro_use]
extern crate log;

use conbee::{Endpoint, ProfileId};

pub use crate::adapter::{
    Adapter, AdapterOptions, Config, Coordinator, NetworkOptions, NetworkParameters,
    SerialPortOptions, Started, COORDINATOR_MANUFACTURER_ID,
};
pub use crate::errors::{Error, ErrorKind, Result};
pub use crate::events::{Address, DeviceDirectory, Event, ZclPayload};
pub use crate::startup::channel_mask;
pub use crate::waitress::{Waiter, ZclMatcher};
pub use crate::zcl::{Direction, FrameType, ZclFrame, ZclHeader};

/// Home-automation profile carried by ordinary ZCL traffic.
pub const HA_PROFILE_ID: ProfileId = 0x0104;

/// Profile used when both ends of a unicast are the green-power endpoint.
pub const GP_PROFILE_ID: ProfileId = 0xA1E0;

pub const GP_CLUSTER_ID: conbee::ClusterId = 0x0021;
pub const GP_ENDPOINT: Endpoint = 242;
pub const GP_GROUP_ID: u16 = 0x0B84;

/// The endpoint the coordinator serves application traffic on.
pub const COORDINATOR_ENDPOINT: Endpoint = 1;
