use crate::control::{CallResult, CameraCommand, CameraControl, Params};
use crate::errors::ControlFailure;
use crate::net::Transport;
use crate::types::CameraEndpoint;
use async_trait::async_trait;

/// Issues control commands as plain HTTP GETs against one endpoint
#[derive(Debug, Clone)]
pub struct CameraControlClient {
    endpoint: CameraEndpoint,
    transport: Transport,
}

impl CameraControlClient {
    pub fn new(endpoint: CameraEndpoint, transport: Transport) -> Self {
        if endpoint.profile() != transport.profile() {
            log::warn!(
                "Endpoint {} paired with a {:?} transport",
                endpoint,
                transport.profile()
            );
        }
        Self {
            endpoint,
            transport,
        }
    }

    pub fn transport(&self) -> &Transport {
        &self.transport
    }
}

#[async_trait]
impl CameraControl for CameraControlClient {
    fn endpoint(&self) -> &CameraEndpoint {
        &self.endpoint
    }

    async fn call(&self, command: CameraCommand, params: &Params) -> CallResult {
        let url = command.url(self.endpoint.base_url());
        log::debug!("GET {} {:?}", url, params);

        let mut request = self.transport.client().get(&url);
        if !params.is_empty() {
            request = request.query(params);
        }

        let response = request.send().await.map_err(|e| {
            log::error!("{} request failed: {}", command, e);
            ControlFailure::NetworkError(e.to_string())
        })?;

        let status = response.status();
        if !status.is_success() {
            log::error!("{} failed with status {}", command, status);
            return Err(ControlFailure::HttpError(status.as_u16()));
        }

        let body = response.bytes().await.map_err(|e| {
            log::error!("{} body read failed: {}", command, e);
            ControlFailure::NetworkError(e.to_string())
        })?;

        if body.is_empty() {
            log::error!("{} returned an empty body", command);
            return Err(ControlFailure::EmptyBody);
        }

        log::debug!("{} succeeded ({} bytes)", command, body.len());
        Ok(body)
    }
}
