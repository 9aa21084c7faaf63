/// PROPERTY-BASED TESTS: Ghost maintenance invariants
///
/// Uses proptest to drive a real around a row of cells along random paths.
///
/// Key invariants:
/// 1. Once settled, the haunts of a real are exactly the required set
/// 2. Every haunt is backed by a ghost and every ghost by a haunt
/// 3. The real is owned by exactly one cell

use cellrep_shared::{EntityId, Position};
use cellrep_test::{
    assert_ghosts_follow_haunts, assert_haunts_match_required, tick_and_exchange_n, GridSpace,
    TestCluster,
};
use proptest::prelude::*;

fn path_strategy() -> impl Strategy<Value = Vec<f32>> {
    prop::collection::vec(-50.0f32..350.0f32, 1..8)
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(32))]

    #[test]
    fn prop_haunts_settle_on_required_set(
        path in path_strategy(),
        appeal_radius in 0.0f32..60.0f32,
    ) {
        let mut cluster = TestCluster::new(3, 100.0, TestCluster::small_config());
        let entity = EntityId::from_u64(1);
        let settle = cluster.cell(&GridSpace::address(0)).config().ghost.min_ghost_lifespan as usize + 2;

        cluster
            .cell_mut(&GridSpace::address(0))
            .create_real(entity, Position::flat(50.0, 0.0), appeal_radius, Vec::new())
            .unwrap();
        tick_and_exchange_n(&mut cluster, settle);

        for x in path {
            let owner = cluster.owner_of(&entity).unwrap();
            cluster
                .cell_mut(&owner)
                .set_position(&entity, Position::flat(x, 0.0))
                .unwrap();
            tick_and_exchange_n(&mut cluster, settle);

            prop_assert_eq!(cluster.cells().filter(|cell| cell.is_real(&entity)).count(), 1);
            assert_haunts_match_required!(cluster, entity);
            assert_ghosts_follow_haunts!(cluster, entity);
        }
        prop_assert!(cluster.take_receive_errors().is_empty());
    }
}
