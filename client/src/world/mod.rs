use std::collections::HashMap;

use rv_core::types::location::pack_key;
use rv_core::types::Location;

pub mod picking;

/// Client-side view of a single map tile, as far as movement cares.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct MapTile {
    blocked: bool,
    movement_cost: i32,
    hidden: bool,
    elevation: i32,
}

impl MapTile {
    pub fn new(movement_cost: i32) -> Self {
        MapTile {
            blocked: false,
            movement_cost,
            hidden: false,
            elevation: 0,
        }
    }

    pub fn blocked() -> Self {
        MapTile {
            blocked: true,
            movement_cost: 0,
            hidden: false,
            elevation: 0,
        }
    }

    pub fn with_elevation(mut self, elevation: i32) -> Self {
        self.elevation = elevation;
        self
    }

    pub fn with_hidden(mut self, hidden: bool) -> Self {
        self.hidden = hidden;
        self
    }

    pub fn is_blocked(&self) -> bool {
        self.blocked
    }

    pub fn movement_cost(&self) -> i32 {
        self.movement_cost
    }

    pub fn is_hidden(&self) -> bool {
        self.hidden
    }

    pub fn elevation(&self) -> i32 {
        self.elevation
    }
}

/// Read access to the tiles around the player. The movement scheduler only
/// ever asks for single tiles and elevations.
pub trait WorldMap {
    fn map_at(&self, x: i32, y: i32, z: i32) -> Option<&MapTile>;

    fn map_at_loc(&self, loc: &Location) -> Option<&MapTile> {
        self.map_at(loc.server_x(), loc.server_y(), loc.server_z())
    }

    fn elevation_at(&self, loc: &Location) -> i32 {
        self.map_at_loc(loc).map(MapTile::elevation).unwrap_or(0)
    }
}

/// The tiles the client currently knows about, keyed by the packed
/// server-coordinate key.
#[derive(Debug, Default)]
pub struct ClientMap {
    tiles: HashMap<i64, MapTile>,
}

impl ClientMap {
    pub fn new() -> Self {
        ClientMap::default()
    }

    pub fn insert(&mut self, x: i32, y: i32, z: i32, tile: MapTile) {
        self.tiles.insert(pack_key(x, y, z), tile);
    }

    pub fn remove(&mut self, x: i32, y: i32, z: i32) {
        self.tiles.remove(&pack_key(x, y, z));
    }

    pub fn len(&self) -> usize {
        self.tiles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tiles.is_empty()
    }
}

impl WorldMap for ClientMap {
    fn map_at(&self, x: i32, y: i32, z: i32) -> Option<&MapTile> {
        self.tiles.get(&pack_key(x, y, z))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tiles_are_stored_and_found_by_server_coordinates() {
        let mut map = ClientMap::new();
        map.insert(4, -2, 1, MapTile::new(3));

        assert_eq!(map.map_at(4, -2, 1), Some(&MapTile::new(3)));
        assert_eq!(map.map_at(4, -2, 0), None);

        let loc = Location::from_server(4, -2, 1);
        assert_eq!(map.map_at_loc(&loc), Some(&MapTile::new(3)));
    }

    #[test]
    fn elevation_defaults_to_zero_for_unknown_tiles() {
        let mut map = ClientMap::new();
        map.insert(0, 0, 0, MapTile::new(2).with_elevation(12));

        assert_eq!(map.elevation_at(&Location::from_server(0, 0, 0)), 12);
        assert_eq!(map.elevation_at(&Location::from_server(9, 9, 0)), 0);
    }

    #[test]
    fn blocked_tiles_report_as_blocked() {
        assert!(MapTile::blocked().is_blocked());
        assert!(!MapTile::new(4).is_blocked());
    }
}
