use std::net::SocketAddr;

use cellrep_shared::{ChannelHandle, GameTime};

/// Records that the cell at `address` holds a ghost of a real
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Haunt {
    channel: ChannelHandle,
    address: SocketAddr,
    created: GameTime,
}

impl Haunt {
    pub fn new(channel: ChannelHandle, address: SocketAddr, created: GameTime) -> Self {
        Self {
            channel,
            address,
            created,
        }
    }

    pub fn channel(&self) -> &ChannelHandle {
        &self.channel
    }

    pub fn address(&self) -> SocketAddr {
        self.address
    }

    pub fn created(&self) -> GameTime {
        self.created
    }

    pub fn age(&self, now: GameTime) -> GameTime {
        now.saturating_sub(self.created)
    }
}
