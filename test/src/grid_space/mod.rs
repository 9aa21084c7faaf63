//! A fixed partitioning of a space into columns along x

use std::net::SocketAddr;
use std::sync::{Arc, Mutex};

use cellrep_server::{CellInfo, SpaceQuery};
use cellrep_shared::{Position, Rect};

pub const BASE_PORT: u16 = 9000;

/// Columns of equal width along x, cell `i` listening on `BASE_PORT + i`.
/// The outer columns extend to infinity. Clones share state, so a test can
/// retire a cell while every cell queries the same grid.
#[derive(Clone)]
pub struct GridSpace {
    cells: Arc<Mutex<Vec<CellInfo>>>,
}

impl GridSpace {
    pub fn columns(count: u16, width: f32) -> Self {
        let cells = (0..count)
            .map(|index| {
                let x_min = if index == 0 {
                    f32::NEG_INFINITY
                } else {
                    f32::from(index) * width
                };
                let x_max = if index + 1 == count {
                    f32::INFINITY
                } else {
                    f32::from(index + 1) * width
                };
                CellInfo {
                    address: Self::address(index),
                    region: Rect::new(x_min, f32::NEG_INFINITY, x_max, f32::INFINITY),
                    is_delete_pending: false,
                }
            })
            .collect();
        Self {
            cells: Arc::new(Mutex::new(cells)),
        }
    }

    pub fn address(index: u16) -> SocketAddr {
        SocketAddr::from(([127, 0, 0, 1], BASE_PORT + index))
    }

    pub fn addresses(&self) -> Vec<SocketAddr> {
        self.cells
            .lock()
            .unwrap()
            .iter()
            .map(|cell| cell.address)
            .collect()
    }

    pub fn set_delete_pending(&self, address: &SocketAddr, is_delete_pending: bool) {
        for cell in self.cells.lock().unwrap().iter_mut() {
            if cell.address == *address {
                cell.is_delete_pending = is_delete_pending;
            }
        }
    }
}

impl SpaceQuery for GridSpace {
    fn cells_intersecting(&self, rect: &Rect) -> Vec<CellInfo> {
        self.cells
            .lock()
            .unwrap()
            .iter()
            .filter(|cell| cell.region.intersects(rect))
            .cloned()
            .collect()
    }

    fn cell_at(&self, position: &Position) -> Option<CellInfo> {
        self.cells
            .lock()
            .unwrap()
            .iter()
            .find(|cell| cell.region.contains(position))
            .cloned()
    }

    fn cell_info(&self, address: &SocketAddr) -> Option<CellInfo> {
        self.cells
            .lock()
            .unwrap()
            .iter()
            .find(|cell| cell.address == *address)
            .cloned()
    }
}
