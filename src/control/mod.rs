//! Camera HTTP control protocol

pub mod client;
pub mod command;

pub use client::CameraControlClient;
pub use command::{wired_mode_params, CameraCommand, Params};

use crate::errors::ControlFailure;
use crate::types::CameraEndpoint;
use async_trait::async_trait;
use bytes::Bytes;
use std::sync::Arc;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

/// Body of a successful control response
pub type ResponseBody = Bytes;

pub type CallResult = Result<ResponseBody, ControlFailure>;

/// Anything that can issue control commands to a camera.
///
/// Success means HTTP 2xx with a non-empty body; every other outcome is a
/// [`ControlFailure`]. Implementations never panic or leak transport errors.
#[async_trait]
pub trait CameraControl: Send + Sync {
    fn endpoint(&self) -> &CameraEndpoint;

    async fn call(&self, command: CameraCommand, params: &Params) -> CallResult;
}

/// Issue `command` on a worker task and hand the outcome to `on_complete`.
///
/// Cancelling `cancel` drops the in-flight request; `on_complete` then sees
/// [`ControlFailure::Cancelled`].
pub fn spawn_call<F>(
    control: Arc<dyn CameraControl>,
    command: CameraCommand,
    params: Params,
    cancel: CancellationToken,
    on_complete: F,
) -> JoinHandle<()>
where
    F: FnOnce(CallResult) + Send + 'static,
{
    tokio::spawn(async move {
        let result = tokio::select! {
            _ = cancel.cancelled() => Err(ControlFailure::Cancelled),
            result = control.call(command, &params) => result,
        };
        on_complete(result);
    })
}

/// Fire-and-forget variant of [`spawn_call`] that only logs the outcome
pub fn fire_and_forget(
    control: Arc<dyn CameraControl>,
    command: CameraCommand,
    cancel: CancellationToken,
) -> JoinHandle<()> {
    spawn_call(control, command, Params::new(), cancel, move |result| match result {
        Ok(_) => log::info!("{} succeeded", command),
        Err(e) => log::warn!("{} failed: {}", command, e),
    })
}

/// Toggle wired USB control off and then on.
///
/// The second call is issued only after the first completes, whatever its
/// outcome; the camera tolerates a redundant "off". Returns the outcome of the
/// "on" call.
pub async fn negotiate_wired_mode(control: &dyn CameraControl) -> CallResult {
    log::info!("Negotiating wired mode on {}", control.endpoint());

    match control
        .call(CameraCommand::WiredUsbControl, &wired_mode_params(false))
        .await
    {
        Ok(_) => log::info!("Wired mode disabled"),
        Err(e) => log::warn!("Disabling wired mode failed: {}", e),
    }

    let result = control
        .call(CameraCommand::WiredUsbControl, &wired_mode_params(true))
        .await;
    match &result {
        Ok(_) => log::info!("Wired mode enabled"),
        Err(e) => log::warn!("Enabling wired mode failed: {}", e),
    }
    result
}
