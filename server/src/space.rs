use std::net::SocketAddr;

use cellrep_shared::{Position, Rect};

/// What the space knows about one cell
#[derive(Clone, Debug, PartialEq)]
pub struct CellInfo {
    pub address: SocketAddr,
    pub region: Rect,
    /// The cell is being retired and must not receive new ghosts or reals
    pub is_delete_pending: bool,
}

/// Answers spatial questions about the partitioning of a space.
///
/// The index behind it lives outside the cell and may change between ticks.
pub trait SpaceQuery {
    /// Every cell whose region intersects `rect`
    fn cells_intersecting(&self, rect: &Rect) -> Vec<CellInfo>;

    /// The cell that should own an entity at `position`
    fn cell_at(&self, position: &Position) -> Option<CellInfo>;

    fn cell_info(&self, address: &SocketAddr) -> Option<CellInfo>;
}
