/// Integration tests for witnesses streaming their surroundings
/// These tests verify detail levels, refreshes of stale observers, and that
/// history trimming never outruns what a witness still has to send

use cellrep_server::{
    CacheFlags, CellEvent, DistanceScheme, Witness, WitnessConfig, WitnessMessage,
};
use cellrep_shared::{EntityId, EventDescription, EventLevel, Position};
use cellrep_test::{tick_and_exchange, GridSpace, TestCluster, TestWorld};

const OBSERVER: u64 = 1;
const OBSERVED: u64 = 2;

fn observer() -> EntityId {
    EntityId::from_u64(OBSERVER)
}

fn observed() -> EntityId {
    EntityId::from_u64(OBSERVED)
}

/// Moving steadily away, the detail level never decreases or skips a level
#[test]
fn detail_level_is_monotonic_in_distance() {
    let config = WitnessConfig::default();
    let scheme = DistanceScheme::default();
    let origin = Position::flat(0.0, 0.0);

    for speed in [7.0, 40.0, 160.0] {
        let mut world = TestWorld::new();
        world.spawn(observed(), origin);
        let mut witness = Witness::new(observer(), 490.0);

        let mut previous = None;
        for step in 0..80u16 {
            let distance = (f32::from(step) * speed).min(480.0);
            world.move_to(&observed(), Position::flat(distance, 0.0));
            witness.update(&origin, &world, &config, &scheme);

            let level = witness.entry(&observed()).unwrap().detail_level();
            if let Some(previous) = previous {
                assert!(level >= previous, "detail went from {} to {}", previous, level);
                assert!(level - previous <= 1, "detail skipped from {} to {}", previous, level);
            }
            previous = Some(level);
        }
        assert_eq!(previous, Some(config.detail_levels.coarsest()));
    }
}

/// An observer that saw up to 40 is refreshed when the history was trimmed
/// to 50, instead of being caught up
#[test]
fn stale_observer_is_refreshed() {
    let config = WitnessConfig::default();
    let scheme = DistanceScheme::default();
    let origin = Position::flat(0.0, 0.0);
    let description = EventDescription::reliable(EventLevel::Priority(1000.0));

    let mut world = TestWorld::new();
    world.spawn(observed(), Position::flat(10.0, 0.0));
    for _ in 0..40 {
        world.record(&observed(), description, Vec::new());
    }
    let mut witness = Witness::new(observer(), 100.0);
    witness.update(&origin, &world, &config, &scheme);
    assert_eq!(witness.entry(&observed()).unwrap().last_event_number(), 40);
    witness.take_messages();

    for _ in 0..20 {
        world.record(&observed(), description, Vec::new());
    }
    world.history_mut(&observed()).trim(50);
    assert_eq!(world.history(&observed()).last_trimmed_event_number(), 50);

    witness.update(&origin, &world, &config, &scheme);
    let entry = witness.entry(&observed()).unwrap();
    assert!(entry.flags().contains(CacheFlags::REFRESH));
    assert!(witness.pending_messages().is_empty());

    witness.update(&origin, &world, &config, &scheme);
    let messages = witness.take_messages();
    assert!(matches!(messages[0], WitnessMessage::LeaveAoi { .. }));
    assert!(matches!(messages[1], WitnessMessage::EnterAoi { .. }));
    assert!(matches!(
        messages[2],
        WitnessMessage::Create {
            last_event_number: 60,
            ..
        }
    ));
    assert!(!messages
        .iter()
        .any(|message| matches!(message, WitnessMessage::Event { .. })));
    assert_eq!(witness.entry(&observed()).unwrap().last_event_number(), 60);
}

/// Events a coarse witness skipped survive trimming, and are sent once the
/// witness gets close enough to need them
#[test]
fn trimming_keeps_what_witnesses_need() {
    let _ = env_logger::builder().is_test(true).try_init();
    let mut cluster = TestCluster::new(1, 100.0, TestCluster::small_config());
    let cell = GridSpace::address(0);
    let trim_period = cluster.cell(&cell).config().history.trim_period;

    cluster
        .cell_mut(&cell)
        .create_real(observer(), Position::flat(0.0, 0.0), 0.0, Vec::new())
        .unwrap();
    cluster
        .cell_mut(&cell)
        .create_real(observed(), Position::flat(200.0, 0.0), 0.0, Vec::new())
        .unwrap();
    cluster.cell_mut(&cell).enable_witness(&observer(), Some(400.0)).unwrap();
    tick_and_exchange(&mut cluster);

    let entry = cluster.cell(&cell).witness(&observer()).unwrap().entry(&observed()).unwrap();
    assert_eq!(entry.detail_level(), 2);
    assert!(cluster.take_events(&cell).contains(&CellEvent::EnteredAoi {
        witness: observer(),
        entity: observed(),
        detail_level: 2,
    }));

    let detailed = cluster
        .cell_mut(&cell)
        .add_event(
            &observed(),
            EventDescription::reliable(EventLevel::Detail(0)),
            vec![42],
        )
        .unwrap();
    while cluster.now() % trim_period != 0 {
        tick_and_exchange(&mut cluster);
    }
    let history = cluster.cell(&cell).real(&observed()).unwrap().history();
    assert!(history.get(detailed).is_some());
    cluster.cell_mut(&cell).take_witness_messages(&observer());

    cluster
        .cell_mut(&cell)
        .set_position(&observed(), Position::flat(10.0, 0.0))
        .unwrap();
    tick_and_exchange(&mut cluster);
    tick_and_exchange(&mut cluster);

    let messages = cluster.cell_mut(&cell).take_witness_messages(&observer());
    assert!(messages.contains(&WitnessMessage::DetailLevel {
        entity: observed(),
        detail_level: 0,
    }));
    assert!(messages.iter().any(|message| matches!(
        message,
        WitnessMessage::Event { event, .. } if event.number() == detailed
    )));
}

/// Leaving the AoI is reported to the embedding layer
#[test]
fn leaving_the_aoi_is_reported() {
    let mut cluster = TestCluster::new(1, 100.0, TestCluster::small_config());
    let cell = GridSpace::address(0);

    cluster
        .cell_mut(&cell)
        .create_real(observer(), Position::flat(0.0, 0.0), 0.0, Vec::new())
        .unwrap();
    cluster
        .cell_mut(&cell)
        .create_real(observed(), Position::flat(20.0, 0.0), 0.0, Vec::new())
        .unwrap();
    cluster.cell_mut(&cell).enable_witness(&observer(), Some(50.0)).unwrap();
    tick_and_exchange(&mut cluster);
    cluster.take_events(&cell);

    cluster
        .cell_mut(&cell)
        .set_position(&observed(), Position::flat(80.0, 0.0))
        .unwrap();
    tick_and_exchange(&mut cluster);

    assert!(cluster.take_events(&cell).contains(&CellEvent::LeftAoi {
        witness: observer(),
        entity: observed(),
    }));
    assert!(cluster.cell(&cell).witness(&observer()).unwrap().is_empty());
}
