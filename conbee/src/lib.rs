mod driver;
mod errors;
mod parameters;
mod types;
mod wire;

pub use crate::driver::{channel, Command, Driver, DriverEvent, DriverServer, EventReader};
pub use crate::errors::{Error, ErrorKind, Result};
pub use crate::parameters::{Parameter, ParameterId, PARAMETERS};
pub use crate::types::{
    general_array_to_string, mac_addr_array_to_string, mac_addr_string_to_array, ApsDataRequest,
    ClusterId, Destination, DestinationAddress, Endpoint, ExtendedAddress, FirmwareVersion,
    GpDataInd, NetworkState, Platform, ProfileId, ReceivedDataResponse, RequestId, ShortAddress,
    SourceAddress, BAUD, BROADCAST_ALL, BROADCAST_ROUTERS, BROADCAST_RX_ON_WHEN_IDLE,
    DEFAULT_RADIUS, RADIUS_UNLIMITED, TX_OPTION_APS_ACK,
};
pub use crate::wire::{ReadWire, ReadWireExt, WriteWire, WriteWireExt};
