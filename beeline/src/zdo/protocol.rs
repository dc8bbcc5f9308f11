use std::fmt::{self, Display};
use std::io::{self, Read, Write};

use conbee::{
    ClusterId, Endpoint, ExtendedAddress, ProfileId, ReadWire, ReadWireExt, Result, ShortAddress,
    WriteWire, WriteWireExt,
};

use super::{Request, Response};

#[derive(Debug)]
pub struct NodeDescRequest {
    pub addr: ShortAddress,
}

impl Request for NodeDescRequest {
    const CLUSTER_ID: ClusterId = 0x0002;

    type Response = NodeDescResponse;
}

impl WriteWire for NodeDescRequest {
    fn wire_len(&self) -> u16 {
        2
    }

    fn write_wire<W>(self, w: &mut W) -> Result<()>
    where
        W: Write,
    {
        w.write_wire(self.addr)?;
        Ok(())
    }
}

#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum DeviceType {
    Coordinator,
    Router,
    EndDevice,
    Unknown,
}

impl Display for DeviceType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DeviceType::Coordinator => write!(f, "Coordinator"),
            DeviceType::Router => write!(f, "Router"),
            DeviceType::EndDevice => write!(f, "EndDevice"),
            DeviceType::Unknown => write!(f, "Unknown"),
        }
    }
}

#[derive(Debug)]
pub struct NodeDescResponse {
    pub status: u8,
    pub addr: ShortAddress,
    pub device_type: DeviceType,
    pub manufacturer_code: u16,
}

impl Response for NodeDescResponse {
    const CLUSTER_ID: ClusterId = 0x8002;

    fn status(&self) -> u8 {
        self.status
    }
}

impl ReadWire for NodeDescResponse {
    fn read_wire<R>(r: &mut R) -> Result<Self>
    where
        R: Read,
    {
        let status = r.read_wire()?;
        let addr = r.read_wire()?;

        let byte: u8 = r.read_wire()?;
        let device_type = match byte & 0b111 {
            0x0 => DeviceType::Coordinator,
            0x1 => DeviceType::Router,
            0x2 => DeviceType::EndDevice,
            _ => DeviceType::Unknown,
        };

        let _flags: u8 = r.read_wire()?;
        let _mac_capabilities: u8 = r.read_wire()?;
        let manufacturer_code = r.read_wire()?;

        Ok(NodeDescResponse {
            status,
            addr,
            device_type,
            manufacturer_code,
        })
    }
}

#[derive(Debug)]
pub struct ActiveEpRequest {
    pub addr: ShortAddress,
}

impl Request for ActiveEpRequest {
    const CLUSTER_ID: ClusterId = 0x0005;

    type Response = ActiveEpResponse;
}

impl WriteWire for ActiveEpRequest {
    fn wire_len(&self) -> u16 {
        2
    }

    fn write_wire<W>(self, w: &mut W) -> Result<()>
    where
        W: Write,
    {
        w.write_wire(self.addr)?;
        Ok(())
    }
}

#[derive(Debug)]
pub struct ActiveEpResponse {
    pub status: u8,
    pub addr: ShortAddress,
    pub active_endpoints: Vec<Endpoint>,
}

impl Response for ActiveEpResponse {
    const CLUSTER_ID: ClusterId = 0x8005;

    fn status(&self) -> u8 {
        self.status
    }
}

impl ReadWire for ActiveEpResponse {
    fn read_wire<R>(r: &mut R) -> Result<Self>
    where
        R: Read,
    {
        let status = r.read_wire()?;
        let addr = r.read_wire()?;

        let count: u8 = r.read_wire()?;
        let mut active_endpoints = Vec::with_capacity(usize::from(count));
        for _ in 0..count {
            active_endpoints.push(r.read_wire()?);
        }

        Ok(ActiveEpResponse {
            status,
            addr,
            active_endpoints,
        })
    }
}

#[derive(Debug)]
pub struct SimpleDescRequest {
    pub addr: ShortAddress,
    pub endpoint: Endpoint,
}

impl Request for SimpleDescRequest {
    const CLUSTER_ID: ClusterId = 0x0004;

    type Response = SimpleDescResponse;
}

impl WriteWire for SimpleDescRequest {
    fn wire_len(&self) -> u16 {
        3
    }

    fn write_wire<W>(self, w: &mut W) -> Result<()>
    where
        W: Write,
    {
        w.write_wire(self.addr)?;
        w.write_wire(self.endpoint)?;
        Ok(())
    }
}

#[derive(Debug)]
pub struct SimpleDescResponse {
    pub status: u8,
    pub addr: ShortAddress,
    pub simple_descriptor: SimpleDescriptor,
}

impl Response for SimpleDescResponse {
    const CLUSTER_ID: ClusterId = 0x8004;

    fn status(&self) -> u8 {
        self.status
    }
}

impl ReadWire for SimpleDescResponse {
    fn read_wire<R>(r: &mut R) -> Result<Self>
    where
        R: Read,
    {
        let status = r.read_wire()?;
        let addr = r.read_wire()?;
        let _len: u8 = r.read_wire()?;

        let endpoint = r.read_wire()?;
        let profile = r.read_wire()?;
        let device_identifier = r.read_wire()?;
        let device_version = r.read_wire()?;

        let input_count: u8 = r.read_wire()?;
        let mut input_clusters = Vec::with_capacity(usize::from(input_count));
        for _ in 0..input_count {
            input_clusters.push(r.read_wire()?);
        }

        let output_count: u8 = r.read_wire()?;
        let mut output_clusters = Vec::with_capacity(usize::from(output_count));
        for _ in 0..output_count {
            output_clusters.push(r.read_wire()?);
        }

        let simple_descriptor = SimpleDescriptor {
            endpoint,
            profile,
            device_identifier,
            device_version,
            input_clusters,
            output_clusters,
        };

        Ok(SimpleDescResponse {
            status,
            addr,
            simple_descriptor,
        })
    }
}

#[derive(Debug)]
pub struct SimpleDescriptor {
    pub endpoint: Endpoint,
    pub profile: ProfileId,
    pub device_identifier: u16,
    pub device_version: u8, // 4 bits
    pub input_clusters: Vec<ClusterId>,
    pub output_clusters: Vec<ClusterId>,
}

#[derive(Debug)]
pub struct MgmtLqiRequest {
    pub start_index: u8,
}

impl Request for MgmtLqiRequest {
    const CLUSTER_ID: ClusterId = 0x0031;

    type Response = MgmtLqiResponse;
}

impl WriteWire for MgmtLqiRequest {
    fn wire_len(&self) -> u16 {
        1
    }

    fn write_wire<W>(self, w: &mut W) -> Result<()>
    where
        W: Write,
    {
        w.write_wire(self.start_index)?;
        Ok(())
    }
}

#[derive(Debug)]
pub struct MgmtLqiResponse {
    pub status: u8,
    pub neighbor_table_entries: u8,
    pub start_index: u8,
    pub neighbor_table_list: Vec<Neighbor>,
}

impl Response for MgmtLqiResponse {
    const CLUSTER_ID: ClusterId = 0x8031;

    fn status(&self) -> u8 {
        self.status
    }
}

impl ReadWire for MgmtLqiResponse {
    fn read_wire<R>(r: &mut R) -> Result<Self>
    where
        R: Read,
    {
        let status = r.read_wire()?;
        let neighbor_table_entries = r.read_wire()?;
        let start_index = r.read_wire()?;

        let count: u8 = r.read_wire()?;
        let mut neighbor_table_list = Vec::with_capacity(usize::from(count));
        for _ in 0..count {
            let _extended_pan_id: u64 = r.read_wire()?;
            let ieee_addr = r.read_wire()?;
            let network_address = r.read_wire()?;

            let byte: u8 = r.read_wire()?;
            let relationship = (byte >> 1) & 0b111;

            let _permit_joining: u8 = r.read_wire()?;
            let depth = r.read_wire()?;
            let link_quality = r.read_wire()?;

            neighbor_table_list.push(Neighbor {
                ieee_addr,
                network_address,
                relationship,
                depth,
                link_quality,
            });
        }

        Ok(MgmtLqiResponse {
            status,
            neighbor_table_entries,
            start_index,
            neighbor_table_list,
        })
    }
}

#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Neighbor {
    pub ieee_addr: ExtendedAddress,
    pub network_address: ShortAddress,
    pub relationship: u8,
    pub depth: u8,
    pub link_quality: u8,
}

#[derive(Debug)]
pub struct MgmtRtgRequest {
    pub start_index: u8,
}

impl Request for MgmtRtgRequest {
    const CLUSTER_ID: ClusterId = 0x0032;

    type Response = MgmtRtgResponse;
}

impl WriteWire for MgmtRtgRequest {
    fn wire_len(&self) -> u16 {
        1
    }

    fn write_wire<W>(self, w: &mut W) -> Result<()>
    where
        W: Write,
    {
        w.write_wire(self.start_index)?;
        Ok(())
    }
}

#[derive(Debug)]
pub struct MgmtRtgResponse {
    pub status: u8,
    pub routing_table_entries: u8,
    pub start_index: u8,
    pub routing_table_list: Vec<Route>,
}

impl Response for MgmtRtgResponse {
    const CLUSTER_ID: ClusterId = 0x8032;

    fn status(&self) -> u8 {
        self.status
    }
}

impl ReadWire for MgmtRtgResponse {
    fn read_wire<R>(r: &mut R) -> Result<Self>
    where
        R: Read,
    {
        let status = r.read_wire()?;
        let routing_table_entries = r.read_wire()?;
        let start_index = r.read_wire()?;

        let count: u8 = r.read_wire()?;
        let mut routing_table_list = Vec::with_capacity(usize::from(count));
        for _ in 0..count {
            let destination_address = r.read_wire()?;

            let byte: u8 = r.read_wire()?;
            let route_status = match (byte >> 5) & 0b111 {
                0x0 => RouteStatus::Active,
                0x1 => RouteStatus::DiscoveryUnderway,
                0x2 => RouteStatus::DiscoveryFailed,
                0x3 => RouteStatus::Inactive,
                _ => RouteStatus::Unknown,
            };

            let next_hop = r.read_wire()?;

            routing_table_list.push(Route {
                destination_address,
                status: route_status,
                next_hop,
            });
        }

        Ok(MgmtRtgResponse {
            status,
            routing_table_entries,
            start_index,
            routing_table_list,
        })
    }
}

#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum RouteStatus {
    Active,
    DiscoveryUnderway,
    DiscoveryFailed,
    Inactive,
    Unknown,
}

#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Route {
    pub destination_address: ShortAddress,
    pub status: RouteStatus,
    pub next_hop: ShortAddress,
}

/// Where a binding points: a group address, or an endpoint on a device
/// identified by IEEE address. Callers may omit the destination endpoint;
/// such a target cannot be encoded and is dropped by the dispatcher.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum BindTarget {
    Group(ShortAddress),
    Endpoint(ExtendedAddress, Option<Endpoint>),
}

impl BindTarget {
    fn address_mode(&self) -> u8 {
        match self {
            BindTarget::Group(_) => 0x01,
            BindTarget::Endpoint(_, _) => 0x03,
        }
    }
}

impl WriteWire for BindTarget {
    fn wire_len(&self) -> u16 {
        match self {
            BindTarget::Group(_) => 3,
            BindTarget::Endpoint(_, Some(_)) => 10,
            BindTarget::Endpoint(_, None) => 9,
        }
    }

    fn write_wire<W>(self, w: &mut W) -> Result<()>
    where
        W: Write,
    {
        w.write_wire(self.address_mode())?;
        match self {
            BindTarget::Group(addr) => w.write_wire(addr)?,
            BindTarget::Endpoint(addr, endpoint) => {
                w.write_wire(addr)?;
                let endpoint = endpoint.ok_or_else(|| {
                    io::Error::new(io::ErrorKind::InvalidInput, "missing destination endpoint")
                })?;
                w.write_wire(endpoint)?;
            }
        }
        Ok(())
    }
}

#[derive(Debug)]
pub struct BindRequest {
    pub src_ieee: ExtendedAddress,
    pub src_endpoint: Endpoint,
    pub cluster_id: ClusterId,
    pub target: BindTarget,
}

impl Request for BindRequest {
    const CLUSTER_ID: ClusterId = 0x0021;
    const APS_ACK: bool = true;

    type Response = BindResponse;
}

impl WriteWire for BindRequest {
    fn wire_len(&self) -> u16 {
        11 + self.target.wire_len()
    }

    fn write_wire<W>(self, w: &mut W) -> Result<()>
    where
        W: Write,
    {
        w.write_wire(self.src_ieee)?;
        w.write_wire(self.src_endpoint)?;
        w.write_wire(self.cluster_id)?;
        w.write_wire(self.target)?;
        Ok(())
    }
}

#[derive(Debug)]
pub struct BindResponse {
    pub status: u8,
}

impl Response for BindResponse {
    const CLUSTER_ID: ClusterId = 0x8021;

    fn status(&self) -> u8 {
        self.status
    }
}

impl ReadWire for BindResponse {
    fn read_wire<R>(r: &mut R) -> Result<Self>
    where
        R: Read,
    {
        let status = r.read_wire()?;
        Ok(BindResponse { status })
    }
}

#[derive(Debug)]
pub struct UnbindRequest {
    pub src_ieee: ExtendedAddress,
    pub src_endpoint: Endpoint,
    pub cluster_id: ClusterId,
    pub target: BindTarget,
}

impl Request for UnbindRequest {
    const CLUSTER_ID: ClusterId = 0x0022;
    const APS_ACK: bool = true;

    type Response = UnbindResponse;
}

impl WriteWire for UnbindRequest {
    fn wire_len(&self) -> u16 {
        11 + self.target.wire_len()
    }

    fn write_wire<W>(self, w: &mut W) -> Result<()>
    where
        W: Write,
    {
        w.write_wire(self.src_ieee)?;
        w.write_wire(self.src_endpoint)?;
        w.write_wire(self.cluster_id)?;
        w.write_wire(self.target)?;
        Ok(())
    }
}

#[derive(Debug)]
pub struct UnbindResponse {
    pub status: u8,
}

impl Response for UnbindResponse {
    const CLUSTER_ID: ClusterId = 0x8022;

    fn status(&self) -> u8 {
        self.status
    }
}

impl ReadWire for UnbindResponse {
    fn read_wire<R>(r: &mut R) -> Result<Self>
    where
        R: Read,
    {
        let status = r.read_wire()?;
        Ok(UnbindResponse { status })
    }
}

#[derive(Debug)]
pub struct MgmtLeaveRequest;

impl Request for MgmtLeaveRequest {
    const CLUSTER_ID: ClusterId = 0x0034;

    type Response = MgmtLeaveResponse;
}

impl WriteWire for MgmtLeaveRequest {
    fn wire_len(&self) -> u16 {
        9
    }

    fn write_wire<W>(self, w: &mut W) -> Result<()>
    where
        W: Write,
    {
        // TODO: encode the target's IEEE address once confirmed the stick
        // accepts it; the all-zero form relies on APS addressing alone.
        w.write_wire(0 as u64)?;
        w.write_wire(0 as u8)?;
        Ok(())
    }
}

#[derive(Debug)]
pub struct MgmtLeaveResponse {
    pub status: u8,
}

impl Response for MgmtLeaveResponse {
    const CLUSTER_ID: ClusterId = 0x8034;

    fn status(&self) -> u8 {
        self.status
    }
}

impl ReadWire for MgmtLeaveResponse {
    fn read_wire<R>(r: &mut R) -> Result<Self>
    where
        R: Read,
    {
        let status = r.read_wire()?;
        Ok(MgmtLeaveResponse { status })
    }
}

/// Fire-and-forget: the dispatcher does not wait for 0x8036.
#[derive(Debug)]
pub struct MgmtPermitJoiningRequest {
    pub permit_duration: u8,
    pub tc_significance: u8,
}

impl MgmtPermitJoiningRequest {
    pub const CLUSTER_ID: ClusterId = 0x0036;
}

impl WriteWire for MgmtPermitJoiningRequest {
    fn wire_len(&self) -> u16 {
        2
    }

    fn write_wire<W>(self, w: &mut W) -> Result<()>
    where
        W: Write,
    {
        w.write_wire(self.permit_duration)?;
        w.write_wire(self.tc_significance)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use std::io::Cursor;

    use super::*;

    fn parse<T: ReadWire>(bytes: &[u8]) -> T {
        Cursor::new(bytes).read_wire().unwrap()
    }

    #[test]
    fn node_desc_decodes_type_and_manufacturer() {
        // status, addr, byte4 (logical type), flags, capabilities, manufacturer
        let resp: NodeDescResponse =
            parse(&[0x00, 0x34, 0x12, 0x01, 0x40, 0x8E, 0x35, 0x11, 0xAA, 0xBB]);
        assert_eq!(resp.status, 0);
        assert_eq!(resp.addr, 0x1234);
        assert_eq!(resp.device_type, DeviceType::Router);
        assert_eq!(resp.manufacturer_code, 0x1135);

        let resp: NodeDescResponse = parse(&[0x00, 0x00, 0x00, 0x00, 0, 0, 0, 0]);
        assert_eq!(resp.device_type, DeviceType::Coordinator);
        let resp: NodeDescResponse = parse(&[0x00, 0x00, 0x00, 0x02, 0, 0, 0, 0]);
        assert_eq!(resp.device_type, DeviceType::EndDevice);
        let resp: NodeDescResponse = parse(&[0x00, 0x00, 0x00, 0x07, 0, 0, 0, 0]);
        assert_eq!(resp.device_type, DeviceType::Unknown);
    }

    #[test]
    fn active_ep_lists_endpoints() {
        let resp: ActiveEpResponse = parse(&[0x00, 0x34, 0x12, 0x03, 0x01, 0x0A, 0xF2]);
        assert_eq!(resp.active_endpoints, vec![0x01, 0x0A, 0xF2]);
    }

    #[test]
    fn simple_desc_decodes_cluster_lists() {
        let resp: SimpleDescResponse = parse(&[
            0x00, // status
            0x34, 0x12, // addr
            0x0E, // length
            0x01, // endpoint
            0x04, 0x01, // profile
            0x05, 0x00, // device identifier
            0x00, // version
            0x02, // input count
            0x00, 0x00, 0x06, 0x00, // input clusters
            0x01, // output count
            0x19, 0x00, // output clusters
        ]);
        let desc = resp.simple_descriptor;
        assert_eq!(desc.endpoint, 1);
        assert_eq!(desc.profile, 0x0104);
        assert_eq!(desc.device_identifier, 0x0005);
        assert_eq!(desc.input_clusters, vec![0x0000, 0x0006]);
        assert_eq!(desc.output_clusters, vec![0x0019]);
    }

    fn neighbor_entry(nwk: u16, lqi: u8) -> Vec<u8> {
        let mut entry = Vec::new();
        entry.extend_from_slice(&[0x11; 8]); // extended PAN
        entry.extend_from_slice(&[0x01, 0x02, 0x03, 0x04, 0x05, 0x06, 0x07, 0x08]); // ieee
        entry.extend_from_slice(&nwk.to_le_bytes());
        entry.push(0b0000_0100); // relationship bits 1..3 = 2
        entry.push(0x00); // permit joining
        entry.push(0x02); // depth
        entry.push(lqi);
        entry
    }

    #[test]
    fn lqi_decodes_22_byte_entries() {
        let mut bytes = vec![0x00, 0x02, 0x00, 0x02];
        bytes.extend(neighbor_entry(0xAB12, 0xC8));
        bytes.extend(neighbor_entry(0xCD34, 0x64));

        let resp: MgmtLqiResponse = parse(&bytes);
        assert_eq!(resp.neighbor_table_entries, 2);
        assert_eq!(resp.neighbor_table_list.len(), 2);

        let first = &resp.neighbor_table_list[0];
        assert_eq!(first.ieee_addr, 0x0807_0605_0403_0201);
        assert_eq!(first.network_address, 0xAB12);
        assert_eq!(first.relationship, 2);
        assert_eq!(first.depth, 2);
        assert_eq!(first.link_quality, 0xC8);
    }

    #[test]
    fn routing_table_decodes_5_byte_entries() {
        let resp: MgmtRtgResponse = parse(&[
            0x00, 0x02, 0x00, 0x02, // status, total, start, count
            0x12, 0xAB, 0b0000_0000, 0x01, 0x00, // active route
            0x34, 0xCD, 0b0110_0000, 0x02, 0x00, // inactive route
        ]);
        assert_eq!(
            resp.routing_table_list,
            vec![
                Route {
                    destination_address: 0xAB12,
                    status: RouteStatus::Active,
                    next_hop: 0x0001,
                },
                Route {
                    destination_address: 0xCD34,
                    status: RouteStatus::Inactive,
                    next_hop: 0x0002,
                },
            ]
        );
    }

    #[test]
    fn bind_request_layout_for_group_target() {
        let request = BindRequest {
            src_ieee: 0x0807_0605_0403_0201,
            src_endpoint: 2,
            cluster_id: 0x0006,
            target: BindTarget::Group(0x1A2B),
        };
        let mut buffer = Vec::new();
        buffer.write_wire(request).unwrap();
        assert_eq!(
            buffer,
            [
                0x01, 0x02, 0x03, 0x04, 0x05, 0x06, 0x07, 0x08, // src ieee
                0x02, // src endpoint
                0x06, 0x00, // cluster
                0x01, // group address mode
                0x2B, 0x1A, // group
            ]
        );
    }

    #[test]
    fn bind_request_layout_for_endpoint_target() {
        let request = BindRequest {
            src_ieee: 0x1,
            src_endpoint: 1,
            cluster_id: 0x0500,
            target: BindTarget::Endpoint(0xAABB_CCDD_EEFF_0011, Some(0x0B)),
        };
        let mut buffer = Vec::new();
        buffer.write_wire(request).unwrap();
        assert_eq!(buffer.len(), 21);
        assert_eq!(buffer[11], 0x03); // ieee address mode
        assert_eq!(&buffer[12..20], &[0x11, 0x00, 0xFF, 0xEE, 0xDD, 0xCC, 0xBB, 0xAA]);
        assert_eq!(buffer[20], 0x0B);
    }

    #[test]
    fn endpoint_target_without_endpoint_fails_to_encode() {
        let request = BindRequest {
            src_ieee: 0x1,
            src_endpoint: 1,
            cluster_id: 0x0500,
            target: BindTarget::Endpoint(0xAABB_CCDD_EEFF_0011, None),
        };
        let mut buffer = Vec::new();
        assert!(buffer.write_wire(request).is_err());
    }

    #[test]
    fn leave_request_is_zero_filled() {
        let mut buffer = Vec::new();
        buffer.write_wire(MgmtLeaveRequest).unwrap();
        assert_eq!(buffer, [0; 9]);
    }

    #[test]
    fn permit_joining_payload() {
        let mut buffer = Vec::new();
        buffer
            .write_wire(MgmtPermitJoiningRequest {
                permit_duration: 60,
                tc_significance: 0,
            })
            .unwrap();
        assert_eq!(buffer, [60, 0]);
    }
}
