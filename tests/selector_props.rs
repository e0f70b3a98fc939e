//! Property tests for interface selection

use camtether::{select, NetworkInterfaceDescriptor};
use proptest::prelude::*;
use std::net::{IpAddr, Ipv4Addr};

fn arb_interfaces() -> impl Strategy<Value = Vec<NetworkInterfaceDescriptor>> {
    prop::collection::vec(
        prop::collection::vec(any::<[u8; 4]>(), 0..4),
        0..6,
    )
    .prop_map(|ifaces| {
        ifaces
            .into_iter()
            .enumerate()
            .map(|(i, octets)| {
                NetworkInterfaceDescriptor::new(
                    format!("if{}", i),
                    octets
                        .into_iter()
                        .map(|o| IpAddr::V4(Ipv4Addr::from(o)))
                        .collect(),
                )
            })
            .collect()
    })
}

proptest! {
    #[test]
    fn prop_selected_interface_is_first_match(
        interfaces in arb_interfaces(),
        target in "[0-9]{1,3}\\.[0-9]{1,3}",
    ) {
        let expected = interfaces
            .iter()
            .position(|iface| iface.addresses.iter().any(|a| a.host().contains(&target)));

        match select(&target, &interfaces) {
            Some(chosen) => {
                let index = interfaces.iter().position(|i| i.id == chosen.id);
                prop_assert_eq!(index, expected);
            }
            None => prop_assert!(expected.is_none()),
        }
    }

    #[test]
    fn prop_selection_is_deterministic(
        interfaces in arb_interfaces(),
        target in "1[0-9]{0,2}\\.",
    ) {
        let first = select(&target, &interfaces).map(|i| i.id.clone());
        let second = select(&target, &interfaces).map(|i| i.id.clone());
        prop_assert_eq!(first, second);
    }

    #[test]
    fn prop_ipv6_only_hosts_never_match_dotted_targets(
        segments in prop::collection::vec(any::<u16>(), 8),
    ) {
        let mut octets = [0u16; 8];
        octets.copy_from_slice(&segments);
        let iface = NetworkInterfaceDescriptor::new(
            "v6",
            vec![IpAddr::from(octets)],
        );
        let host = iface.addresses[0].host();
        prop_assume!(!host.contains("172.2"));
        prop_assert!(select("172.2", &[iface]).is_none());
    }
}
