/// Assert that `entity` is real on exactly the cell at `address`
#[macro_export]
macro_rules! assert_real_on {
    ($cluster:expr, $entity:expr, $address:expr) => {
        assert_eq!(
            $cluster.owner_of(&$entity),
            Some($address),
            "Entity {} should be real on {}",
            $entity,
            $address
        );
        assert_eq!(
            $cluster.cells().filter(|cell| cell.is_real(&$entity)).count(),
            1,
            "Entity {} is real on more than one cell",
            $entity
        );
    };
}

/// Assert that the haunts of a real are exactly the cells required to ghost it
#[macro_export]
macro_rules! assert_haunts_match_required {
    ($cluster:expr, $entity:expr) => {
        let owner = $cluster
            .owner_of(&$entity)
            .expect("entity should be real somewhere");
        let cell = $cluster.cell(&owner);
        let real = cell.real(&$entity).unwrap();
        let required = cellrep_server::GhostMaintainer::required_haunts(
            real,
            &owner,
            &$cluster.space,
            cell.registry(),
            &cell.config().ghost,
        );
        assert_eq!(
            real.haunt_addresses(),
            required,
            "Haunts of {} on {} differ from the required set",
            $entity,
            owner
        );
    };
}

/// Assert that every haunt of a real is matched by a ghost on that cell
#[macro_export]
macro_rules! assert_ghosts_follow_haunts {
    ($cluster:expr, $entity:expr) => {
        let owner = $cluster
            .owner_of(&$entity)
            .expect("entity should be real somewhere");
        let mut haunts: Vec<_> = $cluster
            .cell(&owner)
            .real(&$entity)
            .unwrap()
            .haunt_addresses()
            .into_iter()
            .collect();
        haunts.sort();
        assert_eq!(
            $cluster.ghost_holders(&$entity),
            haunts,
            "Ghosts of {} don't match the haunts of its real",
            $entity
        );
    };
}
