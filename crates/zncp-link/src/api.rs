//! Typed convenience calls layered over [`Link::execute`].
//!
//! Each method pairs a request with its response type and unwraps the part
//! callers actually want.

use zncp_protocol::{
    ApsDataIndicationResponse, ApsDataRequest, ChangeNetworkStateRequest,
    ChangeNetworkStateResponse, DeviceState, DeviceStateRequest, DeviceStateResponse,
    MacCapabilities, NeighborAction, NetworkState, ParameterValue, QuerySendDataRequest,
    QuerySendDataResponse, ReadParameterRequest, ReadParameterResponse, ReadReceivedDataRequest,
    ReceiveFlags, SendDataResponse, UpdateNeighborRequest, UpdateNeighborResponse,
    VersionRequest, VersionResponse, WriteParameterRequest, WriteParameterResponse,
};

use crate::error::LinkError;
use crate::link::Link;

impl Link {
    /// Query the firmware version and platform.
    pub fn read_firmware_version(&self) -> Result<VersionResponse, LinkError> {
        self.execute(VersionRequest, VersionResponse::default())
    }

    /// Read a parameter's raw value bytes.
    pub fn read_parameter_raw(&self, parameter_id: u8) -> Result<Vec<u8>, LinkError> {
        let response = self.execute(
            ReadParameterRequest::new(parameter_id),
            ReadParameterResponse::default(),
        )?;
        Ok(response.value)
    }

    /// Read a parameter as a typed value.
    pub fn read_parameter<V: ParameterValue>(&self, parameter_id: u8) -> Result<V, LinkError> {
        self.read_parameter_with(parameter_id, &[])
    }

    /// Read an indexed parameter, passing selector bytes (a key slot, a ZDO
    /// descriptor slot, a peer address) after the identifier.
    pub fn read_parameter_with<V: ParameterValue>(
        &self,
        parameter_id: u8,
        selector: &[u8],
    ) -> Result<V, LinkError> {
        let response = self.execute(
            ReadParameterRequest {
                parameter_id,
                arguments: selector.to_vec(),
            },
            ReadParameterResponse::default(),
        )?;
        Ok(V::decode(&response.value)?)
    }

    /// Write a parameter's raw value bytes.
    pub fn write_parameter_raw(&self, parameter_id: u8, value: &[u8]) -> Result<(), LinkError> {
        self.execute(
            WriteParameterRequest {
                parameter_id,
                value: value.to_vec(),
            },
            WriteParameterResponse::default(),
        )?;
        Ok(())
    }

    /// Write a parameter from a typed value.
    pub fn write_parameter<V: ParameterValue>(
        &self,
        parameter_id: u8,
        value: &V,
    ) -> Result<(), LinkError> {
        self.write_parameter_with(parameter_id, &[], value)
    }

    /// Write an indexed parameter. Selector bytes precede the encoded value,
    /// mirroring the layout [`read_parameter_with`](Link::read_parameter_with)
    /// selects with.
    pub fn write_parameter_with<V: ParameterValue>(
        &self,
        parameter_id: u8,
        selector: &[u8],
        value: &V,
    ) -> Result<(), LinkError> {
        let mut raw = selector.to_vec();
        value.encode(&mut raw);
        self.write_parameter_raw(parameter_id, &raw)
    }

    /// Poll the current device state word.
    pub fn device_state(&self) -> Result<DeviceState, LinkError> {
        let response = self.execute(DeviceStateRequest, DeviceStateResponse::default())?;
        Ok(response.state)
    }

    /// Ask the firmware to move to `state`; returns the state it reports
    /// immediately after the transition is accepted.
    pub fn change_network_state(&self, state: NetworkState) -> Result<NetworkState, LinkError> {
        let response = self.execute(
            ChangeNetworkStateRequest { state },
            ChangeNetworkStateResponse::default(),
        )?;
        Ok(response.state)
    }

    /// Fetch one pending APSDE data indication. Call when the device state
    /// advertises `data_indication`.
    pub fn read_received_data(
        &self,
        flags: ReceiveFlags,
    ) -> Result<ApsDataIndicationResponse, LinkError> {
        self.execute(
            ReadReceivedDataRequest { flags },
            ApsDataIndicationResponse::default(),
        )
    }

    /// Enqueue an outgoing APSDE data request. The returned device state
    /// shows whether further requests fit in the firmware queue; the actual
    /// delivery confirm is fetched with
    /// [`query_send_data`](Link::query_send_data) once the device state
    /// advertises `data_confirm`.
    pub fn send_data(&self, request: ApsDataRequest) -> Result<SendDataResponse, LinkError> {
        self.execute(request, SendDataResponse::default())
    }

    /// Fetch one pending APSDE data confirm.
    pub fn query_send_data(&self) -> Result<QuerySendDataResponse, LinkError> {
        self.execute(QuerySendDataRequest, QuerySendDataResponse::default())
    }

    /// Add or refresh a firmware neighbor table entry. Some firmware
    /// revisions acknowledge this without applying it.
    pub fn add_neighbor(
        &self,
        short: u16,
        extended: u64,
        capabilities: MacCapabilities,
    ) -> Result<(), LinkError> {
        self.update_neighbor(NeighborAction::Add, short, extended, capabilities)
    }

    /// Remove a firmware neighbor table entry.
    pub fn remove_neighbor(
        &self,
        short: u16,
        extended: u64,
        capabilities: MacCapabilities,
    ) -> Result<(), LinkError> {
        self.update_neighbor(NeighborAction::Remove, short, extended, capabilities)
    }

    fn update_neighbor(
        &self,
        action: NeighborAction,
        short: u16,
        extended: u64,
        capabilities: MacCapabilities,
    ) -> Result<(), LinkError> {
        self.execute(
            UpdateNeighborRequest {
                action,
                short,
                extended,
                capabilities,
            },
            UpdateNeighborResponse::default(),
        )?;
        Ok(())
    }
}
