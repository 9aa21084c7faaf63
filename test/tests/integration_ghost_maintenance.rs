/// Integration tests for ghost maintenance across a cluster
/// These tests verify that the haunts of a real follow the cells around it,
/// that reconciliation settles, and that deletions wait for lifespans

use cellrep_server::CellEvent;
use cellrep_shared::{EntityId, Position};
use cellrep_test::{
    assert_ghosts_follow_haunts, assert_haunts_match_required, tick_and_exchange,
    tick_and_exchange_n, GridSpace, TestCluster,
};

fn ghost_changes(events: &[CellEvent]) -> usize {
    events
        .iter()
        .filter(|event| {
            matches!(
                event,
                CellEvent::GhostCreated { .. } | CellEvent::GhostDestroyed { .. }
            )
        })
        .count()
}

/// A real near a boundary is ghosted on the neighbour, and only there
#[test]
fn haunts_equal_required_set() {
    let _ = env_logger::builder().is_test(true).try_init();
    let mut cluster = TestCluster::new(3, 100.0, TestCluster::small_config());
    let (west, middle, east) = (
        GridSpace::address(0),
        GridSpace::address(1),
        GridSpace::address(2),
    );
    let entity = EntityId::from_u64(1);

    cluster
        .cell_mut(&middle)
        .create_real(entity, Position::flat(190.0, 0.0), 0.0, vec![1])
        .unwrap();
    tick_and_exchange(&mut cluster);

    assert_haunts_match_required!(cluster, entity);
    assert_ghosts_follow_haunts!(cluster, entity);
    assert_eq!(cluster.ghost_holders(&entity), vec![east]);

    // a wide appeal radius reaches both neighbours
    let wide = EntityId::from_u64(2);
    cluster
        .cell_mut(&middle)
        .create_real(wide, Position::flat(150.0, 0.0), 60.0, Vec::new())
        .unwrap();
    tick_and_exchange(&mut cluster);

    assert_haunts_match_required!(cluster, wide);
    assert_ghosts_follow_haunts!(cluster, wide);
    assert_eq!(cluster.ghost_holders(&wide), vec![west, east]);
}

/// Reconciling an unchanged real creates and deletes nothing
#[test]
fn reconciliation_is_idempotent() {
    let mut cluster = TestCluster::new(2, 100.0, TestCluster::small_config());
    let (west, east) = (GridSpace::address(0), GridSpace::address(1));
    let entity = EntityId::from_u64(1);

    cluster
        .cell_mut(&west)
        .create_real(entity, Position::flat(90.0, 0.0), 0.0, Vec::new())
        .unwrap();
    tick_and_exchange(&mut cluster);
    assert_eq!(ghost_changes(&cluster.take_events(&east)), 1);

    let sent = cluster.network.sent();
    tick_and_exchange_n(&mut cluster, 5);

    assert_eq!(ghost_changes(&cluster.take_events(&east)), 0);
    assert_eq!(cluster.network.sent(), sent, "nothing should be sent");
    assert_haunts_match_required!(cluster, entity);
}

/// A ghost no longer required is deleted once old enough
#[test]
fn young_haunts_outlive_the_real_leaving() {
    let mut cluster = TestCluster::new(2, 100.0, TestCluster::small_config());
    let (west, east) = (GridSpace::address(0), GridSpace::address(1));
    let entity = EntityId::from_u64(1);
    let lifespan = cluster.cell(&west).config().ghost.min_ghost_lifespan;

    cluster
        .cell_mut(&west)
        .create_real(entity, Position::flat(90.0, 0.0), 0.0, Vec::new())
        .unwrap();
    tick_and_exchange(&mut cluster);
    assert_eq!(cluster.ghost_holders(&entity), vec![east]);

    cluster
        .cell_mut(&west)
        .set_position(&entity, Position::flat(40.0, 0.0))
        .unwrap();
    tick_and_exchange(&mut cluster);

    // the ghost is kept, and still follows the real
    let ghost = cluster.cell(&east).ghost(&entity).unwrap();
    assert_eq!(ghost.position(), &Position::flat(40.0, 0.0));

    tick_and_exchange_n(&mut cluster, lifespan as usize);
    assert!(cluster.ghost_holders(&entity).is_empty());
    assert_haunts_match_required!(cluster, entity);
}

/// Cells being retired get no new ghosts
#[test]
fn retiring_cells_are_not_ghosted() {
    let mut cluster = TestCluster::new(2, 100.0, TestCluster::small_config());
    let (west, east) = (GridSpace::address(0), GridSpace::address(1));
    cluster.space.set_delete_pending(&east, true);
    let entity = EntityId::from_u64(1);

    cluster
        .cell_mut(&west)
        .create_real(entity, Position::flat(95.0, 0.0), 0.0, Vec::new())
        .unwrap();
    tick_and_exchange(&mut cluster);

    assert!(cluster.ghost_holders(&entity).is_empty());
    assert_haunts_match_required!(cluster, entity);
}

/// Destroying a real removes its ghosts everywhere
#[test]
fn destroyed_real_takes_its_ghosts() {
    let mut cluster = TestCluster::new(2, 100.0, TestCluster::small_config());
    let (west, east) = (GridSpace::address(0), GridSpace::address(1));
    let entity = EntityId::from_u64(1);

    cluster
        .cell_mut(&west)
        .create_real(entity, Position::flat(95.0, 0.0), 0.0, Vec::new())
        .unwrap();
    tick_and_exchange(&mut cluster);
    cluster.take_events(&east);

    cluster.cell_mut(&west).destroy_real(&entity).unwrap();
    tick_and_exchange(&mut cluster);

    assert!(cluster.ghost_holders(&entity).is_empty());
    assert!(cluster
        .take_events(&east)
        .contains(&CellEvent::GhostDestroyed { entity }));
}

/// Haunt deletions are capped per tick and the rest follow on later ticks
#[test]
fn deletions_are_spread_over_ticks() {
    let _ = env_logger::builder().is_test(true).try_init();
    let mut config = TestCluster::small_config();
    config.ghost.max_ghost_deletions_per_tick = 1;
    let mut cluster = TestCluster::new(2, 100.0, config);
    let (west, east) = (GridSpace::address(0), GridSpace::address(1));
    let entities: Vec<EntityId> = (1..=3).map(EntityId::from_u64).collect();

    for (index, entity) in entities.iter().enumerate() {
        cluster
            .cell_mut(&west)
            .create_real(
                *entity,
                Position::flat(90.0 + index as f32 * 2.0, 0.0),
                0.0,
                Vec::new(),
            )
            .unwrap();
    }
    tick_and_exchange(&mut cluster);
    for entity in &entities {
        assert_eq!(cluster.ghost_holders(entity), vec![east]);
    }
    cluster.take_events(&east);

    // all three leave the east cell's ghost range at once
    for entity in &entities {
        cluster
            .cell_mut(&west)
            .set_position(entity, Position::flat(40.0, 0.0))
            .unwrap();
    }

    let mut destroyed_per_tick = Vec::new();
    for _ in 0..10 {
        tick_and_exchange(&mut cluster);
        let destroyed = cluster
            .take_events(&east)
            .iter()
            .filter(|event| matches!(event, CellEvent::GhostDestroyed { .. }))
            .count();
        destroyed_per_tick.push(destroyed);
    }

    assert!(
        destroyed_per_tick.iter().all(|destroyed| *destroyed <= 1),
        "more than one deletion in a tick: {:?}",
        destroyed_per_tick
    );
    assert_eq!(destroyed_per_tick.iter().sum::<usize>(), 3);
    for entity in &entities {
        assert!(cluster.ghost_holders(entity).is_empty());
        assert_haunts_match_required!(cluster, *entity);
        assert_ghosts_follow_haunts!(cluster, *entity);
    }
}
