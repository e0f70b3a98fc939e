use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// Query parameters of a control call, kept ordered so URLs are deterministic
pub type Params = BTreeMap<String, String>;

/// Named control commands understood by the camera's HTTP API
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CameraCommand {
    StartRecording,
    StopRecording,
    StartStream,
    StopStream,
    /// Takes `p=0|1`
    WiredUsbControl,
}

impl CameraCommand {
    /// `(group, action)` of the `gopro/camera/{group}/{action}` path
    pub fn route(&self) -> (&'static str, &'static str) {
        match self {
            CameraCommand::StartRecording => ("shutter", "start"),
            CameraCommand::StopRecording => ("shutter", "stop"),
            CameraCommand::StartStream => ("stream", "start"),
            CameraCommand::StopStream => ("stream", "stop"),
            CameraCommand::WiredUsbControl => ("control", "wired_usb"),
        }
    }

    /// Full URL without the query string
    pub fn url(&self, base_url: &str) -> String {
        let (group, action) = self.route();
        format!(
            "{}/gopro/camera/{}/{}",
            base_url.trim_end_matches('/'),
            group,
            action
        )
    }
}

impl fmt::Display for CameraCommand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let (group, action) = self.route();
        write!(f, "{}/{}", group, action)
    }
}

/// Parameters for `control/wired_usb`
pub fn wired_mode_params(enabled: bool) -> Params {
    let mut params = Params::new();
    params.insert("p".to_string(), if enabled { "1" } else { "0" }.to_string());
    params
}
