use crate::reconnect::ReconnectState;
use crate::session::CameraSession;
use crate::types::{LinkStatus, StreamState, TransportProfile};
use serde::{Deserialize, Serialize};

/// Snapshot of a session for display
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StreamStatusInfo {
    pub session_id: String,
    pub status: LinkStatus,
    pub stream_state: StreamState,
    pub reconnect_state: ReconnectState,
    pub base_url: String,
    pub profile: TransportProfile,
}

/// Start (or restart) the live stream
pub async fn request_stream(session: &CameraSession) -> Result<String, String> {
    match session.stream().start_stream_detailed().await {
        Ok(()) => Ok(session.config().camera.stream_url.clone()),
        Err(e) => {
            log::error!("request_stream failed: {}", e);
            Err(format!("Failed to start stream: {}", e))
        }
    }
}

/// Stop the live stream
pub async fn stop_stream(session: &CameraSession) -> Result<String, String> {
    match session.stream().stop_stream_detailed().await {
        Ok(()) => Ok("Stream stopped".to_string()),
        Err(e) => {
            log::error!("stop_stream failed: {}", e);
            Err(format!("Failed to stop stream: {}", e))
        }
    }
}

pub fn get_stream_status(session: &CameraSession) -> StreamStatusInfo {
    let endpoint = session.endpoint();
    StreamStatusInfo {
        session_id: session.id().to_string(),
        status: session.status(),
        stream_state: session.stream_state(),
        reconnect_state: session.supervisor().state(),
        base_url: endpoint.base_url().to_string(),
        profile: endpoint.profile(),
    }
}
