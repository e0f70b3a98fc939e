use crate::session::CameraSession;

/// Start recording on the camera. Fire-and-forget: the outcome is only logged.
pub fn start_recording(session: &CameraSession) -> Result<String, String> {
    session.start_recording();
    Ok(format!("Start recording issued to {}", session.endpoint().base_url()))
}

/// Stop recording on the camera. Fire-and-forget, like `start_recording`.
pub fn stop_recording(session: &CameraSession) -> Result<String, String> {
    session.stop_recording();
    Ok(format!("Stop recording issued to {}", session.endpoint().base_url()))
}
