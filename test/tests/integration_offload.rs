/// Integration tests for handing reals between cells
/// These tests verify that authority moves exactly once, that the ghosts of
/// a moved real follow their new owner, and that boundary jitter is ignored

use cellrep_server::CellEvent;
use cellrep_shared::{EntityId, EventDescription, EventLevel, Position};
use cellrep_test::{
    assert_ghosts_follow_haunts, assert_haunts_match_required, assert_real_on,
    tick_and_exchange, tick_and_exchange_n, GridSpace, TestCluster,
};

/// A real crossing into a neighbour moves there along with its history,
/// and the remaining ghosts switch to the new owner
#[test]
fn offload_end_to_end() {
    let _ = env_logger::builder().is_test(true).try_init();
    let mut cluster = TestCluster::new(3, 100.0, TestCluster::small_config());
    let (west, middle, east) = (
        GridSpace::address(0),
        GridSpace::address(1),
        GridSpace::address(2),
    );
    let entity = EntityId::from_u64(7);

    cluster
        .cell_mut(&middle)
        .create_real(entity, Position::flat(190.0, 0.0), 100.0, vec![1])
        .unwrap();
    cluster.cell_mut(&middle).enable_witness(&entity, Some(40.0)).unwrap();
    tick_and_exchange(&mut cluster);
    assert_eq!(cluster.ghost_holders(&entity), vec![west, east]);

    let description = EventDescription::reliable(EventLevel::Priority(1000.0));
    let mut last = 0;
    for payload in 0..3u8 {
        last = cluster
            .cell_mut(&middle)
            .add_event(&entity, description, vec![payload])
            .unwrap();
    }
    tick_and_exchange(&mut cluster);
    assert_eq!(
        cluster.cell(&east).ghost(&entity).unwrap().history().last_event_number(),
        last
    );

    cluster
        .cell_mut(&middle)
        .set_position(&entity, Position::flat(210.0, 0.0))
        .unwrap();
    tick_and_exchange(&mut cluster);

    assert_real_on!(cluster, entity, east);
    assert_eq!(cluster.ghost_holders(&entity), vec![west, middle]);
    for holder in [west, middle] {
        assert_eq!(cluster.cell(&holder).ghost(&entity).unwrap().real(), east);
        assert_eq!(cluster.cell(&holder).ghost(&entity).unwrap().next_real(), None);
    }

    let real = cluster.cell(&east).real(&entity).unwrap();
    assert_eq!(real.history().last_event_number(), last);
    assert_eq!(real.state(), &[1]);
    assert_eq!(cluster.cell(&east).witness(&entity).unwrap().aoi_radius(), 40.0);
    assert!(cluster.cell(&middle).pending_offloads(&east).is_empty());

    assert!(cluster.take_events(&middle).contains(&CellEvent::AuthorityLost {
        entity,
        to: east,
    }));
    assert!(cluster.take_events(&east).contains(&CellEvent::AuthorityGained {
        entity,
        from: middle,
    }));
    assert!(cluster.take_receive_errors().is_empty());

    // the new owner keeps the haunts it inherited
    tick_and_exchange_n(&mut cluster, 2);
    assert_haunts_match_required!(cluster, entity);
    assert_ghosts_follow_haunts!(cluster, entity);

    // and updates reach the ghosts from it
    cluster
        .cell_mut(&east)
        .set_state(&entity, vec![2])
        .unwrap();
    tick_and_exchange(&mut cluster);
    assert_eq!(cluster.cell(&west).ghost(&entity).unwrap().state(), &[2]);
    assert_eq!(cluster.cell(&middle).ghost(&entity).unwrap().state(), &[2]);
    assert!(cluster.take_receive_errors().is_empty());
}

/// Jitter across a boundary within the hysteresis neither moves authority
/// nor touches the haunts
#[test]
fn boundary_jitter_does_not_flap() {
    let mut cluster = TestCluster::new(2, 100.0, TestCluster::small_config());
    let (west, east) = (GridSpace::address(0), GridSpace::address(1));
    let entity = EntityId::from_u64(3);
    let hysteresis = cluster.cell(&west).config().ghost.offload_hysteresis;

    cluster
        .cell_mut(&west)
        .create_real(entity, Position::flat(99.0, 0.0), 0.0, Vec::new())
        .unwrap();
    tick_and_exchange(&mut cluster);
    cluster.take_events(&west);
    cluster.take_events(&east);
    let haunts = cluster.cell(&west).real(&entity).unwrap().haunt_addresses();

    for step in 0..20 {
        let x = if step % 2 == 0 {
            100.0 + hysteresis * 0.9
        } else {
            100.0 - hysteresis * 0.9
        };
        cluster
            .cell_mut(&west)
            .set_position(&entity, Position::flat(x, 0.0))
            .unwrap();
        tick_and_exchange(&mut cluster);

        assert_real_on!(cluster, entity, west);
        assert_eq!(cluster.cell(&west).real(&entity).unwrap().haunt_addresses(), haunts);
    }

    let west_events = cluster.take_events(&west);
    assert!(!west_events
        .iter()
        .any(|event| matches!(event, CellEvent::AuthorityLost { .. })));
    let east_events = cluster.take_events(&east);
    assert!(east_events
        .iter()
        .all(|event| matches!(event, CellEvent::GhostUpdated { .. })));
}

/// Offloads wait while a cell death is being recovered from
#[test]
fn offloads_pause_during_death_recovery() {
    let mut cluster = TestCluster::new(3, 100.0, TestCluster::small_config());
    let (west, middle, east) = (
        GridSpace::address(0),
        GridSpace::address(1),
        GridSpace::address(2),
    );
    let entity = EntityId::from_u64(4);
    let recovery = cluster.cell(&west).config().ghost.death_recovery_period;

    cluster
        .cell_mut(&west)
        .create_real(entity, Position::flat(50.0, 0.0), 0.0, Vec::new())
        .unwrap();
    tick_and_exchange(&mut cluster);

    cluster.kill(&east);
    cluster.report_failure(&east);
    assert!(cluster.cell(&west).is_recovering());

    cluster
        .cell_mut(&west)
        .set_position(&entity, Position::flat(150.0, 0.0))
        .unwrap();
    tick_and_exchange(&mut cluster);
    assert_real_on!(cluster, entity, west);

    tick_and_exchange_n(&mut cluster, recovery as usize);
    assert!(!cluster.cell(&west).is_recovering());
    assert_real_on!(cluster, entity, middle);
}
