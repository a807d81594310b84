//! Resolving a display-space point to the map tile drawn there.
//!
//! Tiles from up to five map levels overlap on screen; higher levels are
//! shifted by a fixed perspective offset per level and elevated tiles are
//! drawn raised by their elevation. The probe walks the levels from the top
//! and returns the first tile that is actually visible at the point.

use rv_core::constants::TILE_PERSPECTIVE_OFFSET;
use rv_core::types::Location;

use super::{MapTile, WorldMap};

/// Finds the tile shown at the given display coordinates, or `None` when
/// the point hits no visible tile.
pub fn tile_on_display_loc<W: WorldMap>(
    map: &W,
    player_base_level: i32,
    display_x: i32,
    display_y: i32,
) -> Option<&MapTile> {
    let mut help = Location::from_display(display_x, display_y, 0);

    let base = player_base_level - 2;
    let low_x = help.server_x() - base * TILE_PERSPECTIVE_OFFSET;
    let low_y = help.server_y() + base * TILE_PERSPECTIVE_OFFSET;

    for i in (0..5).rev() {
        let level_offset = TILE_PERSPECTIVE_OFFSET * i;

        let tile_x = low_x - level_offset;
        let tile_y = low_y + level_offset;
        let tile_z = base + i;

        // A raised tile one column further back may cover this point.
        if let Some(elevated) = map.map_at(tile_x - 1, tile_y + 1, tile_z) {
            if elevated.elevation() > 0 {
                help.set_display(display_x, display_y + elevated.elevation(), 0);

                let elevated_x = help.server_x() - tile_z * TILE_PERSPECTIVE_OFFSET;
                let elevated_y = help.server_y() + tile_z * TILE_PERSPECTIVE_OFFSET;

                if elevated_x == tile_x - 1 && elevated_y == tile_y + 1 {
                    return Some(elevated);
                }
            }
        }

        if let Some(tile) = map.map_at(tile_x, tile_y, tile_z) {
            if !tile.is_hidden() {
                return Some(tile);
            }
        }
    }

    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::world::ClientMap;
    use rv_core::constants::STEP_Y;

    #[test]
    fn finds_the_tile_under_the_point_on_the_player_level() {
        let mut map = ClientMap::new();
        map.insert(5, 5, 0, MapTile::new(2));

        let probe = Location::from_server(5, 5, 0);
        let found = tile_on_display_loc(&map, 2, probe.display_x(), probe.display_y());
        assert_eq!(found, Some(&MapTile::new(2)));
    }

    #[test]
    fn hidden_tiles_are_skipped() {
        let mut map = ClientMap::new();
        map.insert(5, 5, 0, MapTile::new(2).with_hidden(true));

        let probe = Location::from_server(5, 5, 0);
        assert_eq!(
            tile_on_display_loc(&map, 2, probe.display_x(), probe.display_y()),
            None
        );
    }

    #[test]
    fn higher_levels_win_over_lower_ones() {
        let mut map = ClientMap::new();
        // The level-2 tile that projects onto the same display point sits
        // two perspective offsets away from the level-0 tile.
        map.insert(5, 5, 0, MapTile::new(2));
        map.insert(
            5 - 2 * TILE_PERSPECTIVE_OFFSET,
            5 + 2 * TILE_PERSPECTIVE_OFFSET,
            2,
            MapTile::new(7),
        );

        let probe = Location::from_server(5, 5, 0);
        let found = tile_on_display_loc(&map, 2, probe.display_x(), probe.display_y());
        assert_eq!(found, Some(&MapTile::new(7)));
    }

    #[test]
    fn elevated_neighbour_catches_the_point_when_reprojection_matches() {
        let mut map = ClientMap::new();
        // Raising a tile by two display steps shifts its server position by
        // (-1, +1); such a tile at (4, 6) covers the point over (5, 5).
        map.insert(4, 6, 0, MapTile::new(9).with_elevation(2 * STEP_Y));
        map.insert(5, 5, 0, MapTile::new(2));

        let probe = Location::from_server(5, 5, 0);
        let found = tile_on_display_loc(&map, 2, probe.display_x(), probe.display_y());
        assert_eq!(found, Some(&MapTile::new(9).with_elevation(2 * STEP_Y)));
    }

    #[test]
    fn empty_map_yields_none() {
        let map = ClientMap::new();
        assert_eq!(tile_on_display_loc(&map, 2, 0, 0), None);
    }
}
