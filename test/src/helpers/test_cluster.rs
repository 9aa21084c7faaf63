use std::collections::BTreeMap;
use std::net::SocketAddr;

use cellrep_server::{Cell, CellConfig, CellError, CellEvent, GhostConfig};
use cellrep_shared::{EntityId, GameTime};

use crate::{grid_space::GridSpace, local_network::LocalNetwork};

/// Several cells over one grid and one in-memory network
pub struct TestCluster {
    pub space: GridSpace,
    pub network: LocalNetwork,
    config: CellConfig,
    cells: BTreeMap<SocketAddr, Cell>,
    now: GameTime,
    receive_errors: Vec<CellError>,
}

impl TestCluster {
    /// `count` columns of `width` each, one cell per column
    pub fn new(count: u16, width: f32, config: CellConfig) -> Self {
        let mut cluster = Self {
            space: GridSpace::columns(count, width),
            network: LocalNetwork::new(),
            config,
            cells: BTreeMap::new(),
            now: 0,
            receive_errors: Vec::new(),
        };
        for address in cluster.space.addresses() {
            cluster.start(&address);
        }
        cluster
    }

    /// Small ghost distance so tests can reason about single boundaries
    pub fn small_config() -> CellConfig {
        CellConfig {
            ghost: GhostConfig {
                ghost_distance: 20.0,
                ghost_fudge: 5.0,
                min_ghost_lifespan: 3,
                real_grace_period: 3,
                ..GhostConfig::default()
            },
            ..CellConfig::default()
        }
    }

    /// Starts a fresh cell at `address`, replacing any previous one
    pub fn start(&mut self, address: &SocketAddr) {
        self.network.bring_up(address);
        let mut cell = Cell::new(
            *address,
            self.config.clone(),
            Box::new(self.space.clone()),
            Box::new(self.network.transport(*address)),
        );
        cell.tick(self.now);
        self.cells.insert(*address, cell);
    }

    /// Takes the cell at `address` off the network without telling anyone
    pub fn kill(&mut self, address: &SocketAddr) -> Option<Cell> {
        self.network.take_down(address);
        self.cells.remove(address)
    }

    /// Delivers the failure of `address` to every live cell, as the
    /// transport would
    pub fn report_failure(&mut self, address: &SocketAddr) {
        for cell in self.cells.values_mut() {
            cell.remote_failure(address);
        }
    }

    pub fn now(&self) -> GameTime {
        self.now
    }

    pub fn cell(&self, address: &SocketAddr) -> &Cell {
        &self.cells[address]
    }

    pub fn cell_mut(&mut self, address: &SocketAddr) -> &mut Cell {
        self.cells.get_mut(address).unwrap()
    }

    pub fn cells(&self) -> impl Iterator<Item = &Cell> {
        self.cells.values()
    }

    pub fn cells_mut(&mut self) -> impl Iterator<Item = &mut Cell> {
        self.cells.values_mut()
    }

    pub fn is_live(&self, address: &SocketAddr) -> bool {
        self.cells.contains_key(address)
    }

    /// Advances every cell by one tick without exchanging bundles
    pub fn tick_cells(&mut self) {
        self.now += 1;
        let now = self.now;
        for cell in self.cells.values_mut() {
            cell.tick(now);
        }
    }

    /// The cell holding `entity` as a real, if any
    pub fn owner_of(&self, entity: &EntityId) -> Option<SocketAddr> {
        self.cells
            .values()
            .find(|cell| cell.is_real(entity))
            .map(Cell::address)
    }

    /// Cells holding a ghost of `entity`, sorted
    pub fn ghost_holders(&self, entity: &EntityId) -> Vec<SocketAddr> {
        self.cells
            .values()
            .filter(|cell| cell.ghost(entity).is_some())
            .map(Cell::address)
            .collect()
    }

    pub fn take_events(&mut self, address: &SocketAddr) -> Vec<CellEvent> {
        self.cell_mut(address).take_events()
    }

    pub fn take_receive_errors(&mut self) -> Vec<CellError> {
        std::mem::take(&mut self.receive_errors)
    }

    pub(crate) fn deliver(&mut self, from: &SocketAddr, to: &SocketAddr, payload: &[u8]) {
        let Some(cell) = self.cells.get_mut(to) else {
            log::debug!("dropping bundle from {} to dead cell {}", from, to);
            return;
        };
        if let Err(error) = cell.receive(from, payload) {
            self.receive_errors.push(error);
        }
    }

    pub(crate) fn flush_all(&mut self) {
        for cell in self.cells.values_mut() {
            cell.flush();
        }
    }
}
