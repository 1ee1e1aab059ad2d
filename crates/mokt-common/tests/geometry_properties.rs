//! Property tests for launch geometry validation and size parsing.

use mokt_common::{parse_sizes, KernelTestError, LaunchGeometry, LocalSize};
use proptest::prelude::*;

proptest! {
    #[test]
    fn divisibility_decides_validity(global in 1usize..4096, local in 1usize..512) {
        let result = LaunchGeometry::new(vec![global], LocalSize::Explicit(vec![local]));
        if global % local == 0 {
            let geometry = result.unwrap();
            prop_assert_eq!(geometry.work_group_items(), Some(local));
            prop_assert_eq!(geometry.total_work_items(), global);
        } else {
            let is_dim0 = matches!(
                result,
                Err(KernelTestError::InvalidWorkGroupSize { dimension: Some(0), .. })
            );
            prop_assert!(is_dim0);
        }
    }

    #[test]
    fn local_size_display_parses_back(sizes in prop::collection::vec(1usize..1024, 1..=3)) {
        let local = LocalSize::Explicit(sizes.clone());
        let text = local.to_string();
        prop_assert_eq!(text.parse::<LocalSize>().unwrap(), local);
        prop_assert_eq!(parse_sizes(&format!("({})", text.replace(',', ", "))).unwrap(), sizes);
    }
}
