use crate::errors::TetherError;
use crate::types::NetworkInterfaceDescriptor;

/// Pick the interface that reaches `target`.
///
/// Interfaces and their addresses are scanned in the order given; the first
/// interface holding an address whose host text contains `target` wins.
/// Returns `None` when nothing matches; callers decide whether to retry.
pub fn select<'a>(
    target: &str,
    interfaces: &'a [NetworkInterfaceDescriptor],
) -> Option<&'a NetworkInterfaceDescriptor> {
    let selected = interfaces
        .iter()
        .find(|iface| iface.address_matching(target).is_some());

    match selected {
        Some(iface) => log::debug!("Interface {} reaches {}", iface.id, target),
        None => log::debug!(
            "None of {} interfaces reaches {}",
            interfaces.len(),
            target
        ),
    }

    selected
}

/// [`select`], reporting a miss as [`TetherError::InterfaceNotFound`]
pub fn require<'a>(
    target: &str,
    interfaces: &'a [NetworkInterfaceDescriptor],
) -> Result<&'a NetworkInterfaceDescriptor, TetherError> {
    select(target, interfaces).ok_or_else(|| TetherError::InterfaceNotFound(target.to_string()))
}
