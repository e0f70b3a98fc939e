use crate::platform::{DeviceEvent, DeviceMonitor};
use crate::types::DeviceDescriptor;

/// Start device monitoring
pub async fn start_device_monitoring(monitor: &DeviceMonitor) -> Result<String, String> {
    if monitor.is_monitoring().await {
        return Ok("Device monitoring already active".to_string());
    }
    monitor
        .start_monitoring()
        .await
        .map_err(|e| format!("Failed to start monitoring: {}", e))?;
    Ok("Device monitoring started".to_string())
}

/// Stop device monitoring
pub async fn stop_device_monitoring(monitor: &DeviceMonitor) -> Result<String, String> {
    if !monitor.is_monitoring().await {
        return Ok("Device monitoring not active".to_string());
    }
    monitor
        .stop_monitoring()
        .await
        .map_err(|e| format!("Failed to stop monitoring: {}", e))?;
    Ok("Device monitoring stopped".to_string())
}

/// Poll for device events (non-blocking)
pub async fn poll_device_event(monitor: &DeviceMonitor) -> Result<Option<DeviceEventInfo>, String> {
    if !monitor.is_monitoring().await {
        return Err("Device monitoring not started".to_string());
    }
    Ok(monitor.poll_event().await.map(DeviceEventInfo::from_event))
}

/// Get list of currently attached devices
pub async fn get_monitored_devices(monitor: &DeviceMonitor) -> Vec<DeviceDescriptor> {
    monitor.get_active_devices().await
}

/// Device event information for consumers
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct DeviceEventInfo {
    pub event_type: String,
    pub device_id: String,
    pub wired_control: bool,
}

impl DeviceEventInfo {
    fn from_event(event: DeviceEvent) -> Self {
        match event {
            DeviceEvent::Attached(descriptor) => Self {
                event_type: "attached".to_string(),
                device_id: descriptor.id,
                wired_control: descriptor.capabilities.wired_control,
            },
            DeviceEvent::Detached(id) => Self {
                event_type: "detached".to_string(),
                device_id: id,
                wired_control: false,
            },
        }
    }
}
