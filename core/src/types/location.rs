use std::cell::Cell;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::io::{self, Read};

use bitflags::bitflags;

use crate::constants::{
    DISPLAY_Z_OFFSET_MOD, KEY_MOD_X, KEY_MOD_Y, KEY_MOD_Z, LAYER_DISTANCE, LAYER_LEVEL, STEP_X,
    STEP_Y,
};

use super::Direction;

bitflags! {
    /// Marks which of the three coordinate spaces need recomputation.
    #[derive(Clone, Copy, Debug, PartialEq, Eq)]
    struct Dirty: u8 {
        const SERVER = 0b001;
        const MAP = 0b010;
        const DISPLAY = 0b100;
    }
}

/// A single position on the game map, held in three coordinate spaces at
/// once: the server grid (x, y, z), the isometric client map (col, row) and
/// the display space (pixels plus a draw-ordering depth).
///
/// Exactly one space is written at a time; the other two are recomputed
/// lazily on the next read. Recomputation prefers the server representation
/// and falls back to the map representation, so reads stay consistent no
/// matter which space was written last. Equality and hashing only consider
/// the server coordinates.
///
/// Not thread safe; the client mutates positions on the update thread only.
#[derive(Clone)]
pub struct Location {
    sc: Cell<(i32, i32, i32)>,
    mc: Cell<(i32, i32)>,
    dc: Cell<(i32, i32, i32)>,
    dirty: Cell<Dirty>,
}

impl Location {
    /// A location at the server origin (0, 0, 0).
    pub fn new() -> Self {
        Location::from_server(0, 0, 0)
    }

    pub fn from_server(x: i32, y: i32, z: i32) -> Self {
        Location {
            sc: Cell::new((x, y, z)),
            mc: Cell::new((0, 0)),
            dc: Cell::new((0, 0, 0)),
            dirty: Cell::new(Dirty::MAP | Dirty::DISPLAY),
        }
    }

    pub fn from_map(col: i32, row: i32) -> Self {
        let mut loc = Location::new();
        loc.set_map(col, row);
        loc
    }

    pub fn from_display(dc_x: i32, dc_y: i32, dc_z: i32) -> Self {
        let mut loc = Location::new();
        loc.set_display(dc_x, dc_y, dc_z);
        loc
    }

    /// Reads a location from the wire: three little-endian `i16` values
    /// (x, y, z of the server coordinates).
    pub fn from_reader<R: Read>(reader: &mut R) -> io::Result<Self> {
        let mut buf = [0u8; 2];
        reader.read_exact(&mut buf)?;
        let x = i16::from_le_bytes(buf);
        reader.read_exact(&mut buf)?;
        let y = i16::from_le_bytes(buf);
        reader.read_exact(&mut buf)?;
        let z = i16::from_le_bytes(buf);
        Ok(Location::from_server(x as i32, y as i32, z as i32))
    }

    /// Rebuilds a location from a packed key created by [`Location::key`].
    pub fn from_key(key: i64) -> Self {
        let (x, y, z) = unpack_key(key);
        Location::from_server(x, y, z)
    }

    pub fn set_server(&mut self, x: i32, y: i32, z: i32) {
        self.sc.set((x, y, z));
        self.dirty.set(Dirty::MAP | Dirty::DISPLAY);
    }

    pub fn set_map(&mut self, col: i32, row: i32) {
        self.mc.set((col, row));
        self.dirty.set(Dirty::SERVER | Dirty::DISPLAY);
    }

    pub fn set_display(&mut self, dc_x: i32, dc_y: i32, dc_z: i32) {
        self.dc.set((dc_x, dc_y, dc_z));
        self.dirty.set(Dirty::SERVER | Dirty::MAP);
    }

    /// Replaces the server coordinates from a packed key.
    pub fn set_key(&mut self, key: i64) {
        let (x, y, z) = unpack_key(key);
        self.set_server(x, y, z);
    }

    pub fn add_server(&mut self, dx: i32, dy: i32, dz: i32) {
        self.sync_server();
        let (x, y, z) = self.sc.get();
        self.sc.set((x + dx, y + dy, z + dz));
        self.dirty.set(Dirty::MAP | Dirty::DISPLAY);
    }

    pub fn add_map(&mut self, dcol: i32, drow: i32) {
        self.sync_map();
        let (col, row) = self.mc.get();
        self.mc.set((col + dcol, row + drow));
        self.dirty.set(Dirty::SERVER | Dirty::DISPLAY);
    }

    pub fn add_display(&mut self, dx: i32, dy: i32, dz: i32) {
        self.sync_display();
        let (x, y, z) = self.dc.get();
        self.dc.set((x + dx, y + dy, z + dz));
        self.dirty.set(Dirty::SERVER | Dirty::MAP);
    }

    /// Takes one step on the server grid in the given direction.
    pub fn move_by(&mut self, dir: Direction) {
        self.add_server(dir.vector_x(), dir.vector_y(), 0);
    }

    pub fn server_x(&self) -> i32 {
        self.sync_server();
        self.sc.get().0
    }

    pub fn server_y(&self) -> i32 {
        self.sync_server();
        self.sc.get().1
    }

    pub fn server_z(&self) -> i32 {
        self.sync_server();
        self.sc.get().2
    }

    pub fn map_col(&self) -> i32 {
        self.sync_map();
        self.mc.get().0
    }

    pub fn map_row(&self) -> i32 {
        self.sync_map();
        self.mc.get().1
    }

    pub fn display_x(&self) -> i32 {
        self.sync_display();
        self.dc.get().0
    }

    pub fn display_y(&self) -> i32 {
        self.sync_display();
        self.dc.get().1
    }

    pub fn display_z(&self) -> i32 {
        self.sync_display();
        self.dc.get().2
    }

    /// Packs the server coordinates into a single map key.
    pub fn key(&self) -> i64 {
        let (x, y, z) = self.server();
        pack_key(x, y, z)
    }

    /// True if the server coordinates compare equal to the given triple.
    pub fn equals_server(&self, x: i32, y: i32, z: i32) -> bool {
        self.server() == (x, y, z)
    }

    /// True if all three server components are zero.
    pub fn is_origin(&self) -> bool {
        self.server() == (0, 0, 0)
    }

    /// The direction from this location towards the given server column,
    /// derived from the signs of both deltas. `None` when the target shares
    /// this location's column.
    pub fn direction_to_xy(&self, x: i32, y: i32) -> Option<Direction> {
        let (sx, sy, _) = self.server();
        Direction::from_components(x - sx, y - sy)
    }

    /// The direction from this location towards another one.
    pub fn direction_to(&self, other: &Location) -> Option<Direction> {
        self.direction_to_xy(other.server_x(), other.server_y())
    }

    /// Steps needed to reach `other` ignoring obstacles: the Chebyshev
    /// distance on the server grid.
    pub fn distance_to(&self, other: &Location) -> i32 {
        let (ax, ay, _) = self.server();
        let (bx, by, _) = other.server();
        (bx - ax).abs().max((by - ay).abs())
    }

    /// Straight-line length between the two server positions.
    pub fn sqrt_distance_to(&self, other: &Location) -> f32 {
        let (ax, ay, _) = self.server();
        let (bx, by, _) = other.server();
        let dx = (bx - ax) as f32;
        let dy = (by - ay) as f32;
        (dx * dx + dy * dy).sqrt()
    }

    /// True when the two locations touch (8-connected, includes self).
    pub fn is_neighbour(&self, other: &Location) -> bool {
        let (ax, ay, _) = self.server();
        let (bx, by, _) = other.server();
        (bx - ax).abs() < 2 && (by - ay).abs() < 2
    }

    fn server(&self) -> (i32, i32, i32) {
        self.sync_server();
        self.sc.get()
    }

    fn sync_server(&self) {
        let dirty = self.dirty.get();
        if !dirty.contains(Dirty::SERVER) {
            return;
        }
        if !dirty.contains(Dirty::MAP) {
            let (col, row) = self.mc.get();
            // Map space has no level, z comes out as 0.
            self.sc.set(((row + col) / 2, (col - row) / 2, 0));
            self.dirty.set(dirty - Dirty::SERVER);
        } else if !dirty.contains(Dirty::DISPLAY) {
            let (dc_x, dc_y, _) = self.dc.get();
            let fx = dc_x as f32 / STEP_X as f32;
            let fy = -dc_y as f32 / STEP_Y as f32;
            let x = ((fy + fx) / 2.0).round() as i32;
            let y = ((fx - fy) / 2.0).round() as i32;
            self.sc.set((x, y, 0));
            self.dirty.set(dirty - Dirty::SERVER);
        }
    }

    fn sync_map(&self) {
        let dirty = self.dirty.get();
        if !dirty.contains(Dirty::MAP) {
            return;
        }
        if !dirty.contains(Dirty::SERVER) {
            let (x, y, _) = self.sc.get();
            self.mc.set((x + y, x - y));
            self.dirty.set(dirty - Dirty::MAP);
        } else if !dirty.contains(Dirty::DISPLAY) {
            let (dc_x, dc_y, _) = self.dc.get();
            let col = (dc_x as f32 / STEP_X as f32).round() as i32;
            let row = (-dc_y as f32 / STEP_Y as f32).round() as i32;
            self.mc.set((col, row));
            self.dirty.set(dirty - Dirty::MAP);
        }
    }

    fn sync_display(&self) {
        let dirty = self.dirty.get();
        if !dirty.contains(Dirty::DISPLAY) {
            return;
        }
        if !dirty.contains(Dirty::SERVER) {
            let (x, y, z) = self.sc.get();
            let dc_x = (x + y) * STEP_X;
            let dc_y = -((x - y) * STEP_Y + DISPLAY_Z_OFFSET_MOD * z * STEP_Y);
            let dc_z = (x - y - z * LAYER_LEVEL) * LAYER_DISTANCE;
            self.dc.set((dc_x, dc_y, dc_z));
            self.dirty.set(dirty - Dirty::DISPLAY);
        } else if !dirty.contains(Dirty::MAP) {
            let (col, row) = self.mc.get();
            self.dc
                .set((col * STEP_X, -row * STEP_Y, row * LAYER_DISTANCE));
            self.dirty.set(dirty - Dirty::DISPLAY);
        }
    }
}

impl Default for Location {
    fn default() -> Self {
        Location::new()
    }
}

impl PartialEq for Location {
    fn eq(&self, other: &Self) -> bool {
        self.server() == other.server()
    }
}

impl Eq for Location {}

impl Hash for Location {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.server().hash(state);
    }
}

impl fmt::Display for Location {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let (x, y, z) = self.server();
        write!(f, "({x}, {y}, {z})")
    }
}

impl fmt::Debug for Location {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let (x, y, z) = self.server();
        write!(f, "Location({x}, {y}, {z})")
    }
}

/// Packs server coordinates into a single key for map lookups.
pub fn pack_key(x: i32, y: i32, z: i32) -> i64 {
    (z as i64 * KEY_MOD_Z) + (x as i64 * KEY_MOD_X) + (y as i64 * KEY_MOD_Y)
}

/// Recovers the server coordinates from a packed key. Exact inverse of
/// [`pack_key`] for coordinates inside the non-negative domain of the key
/// moduli (x and y below 65536, z below 2^31).
pub fn unpack_key(key: i64) -> (i32, i32, i32) {
    let y = (key % KEY_MOD_Z) % KEY_MOD_X;
    let x = (key % KEY_MOD_Z) / KEY_MOD_X;
    let z = key / KEY_MOD_Z;
    (x as i32, y as i32, z as i32)
}

/// Display X for floating server coordinates, truncated towards zero.
pub fn display_coordinate_x(x: f32, y: f32, _z: f32) -> i32 {
    ((x + y) * STEP_X as f32) as i32
}

/// Display Y for floating server coordinates, truncated towards zero.
pub fn display_coordinate_y(x: f32, y: f32, z: f32) -> i32 {
    ((x - y) * STEP_Y as f32 + (DISPLAY_Z_OFFSET_MOD as f32 * z * STEP_Y as f32)) as i32
}

/// Display depth for floating server coordinates, truncated towards zero.
pub fn display_coordinate_z(x: f32, y: f32, z: f32) -> i32 {
    ((x - y - z * LAYER_LEVEL as f32) * LAYER_DISTANCE as f32) as i32
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::Rng;

    #[test]
    fn server_to_map_uses_projection_formulas() {
        let loc = Location::from_server(7, 3, 0);
        assert_eq!(loc.map_col(), 10);
        assert_eq!(loc.map_row(), 4);
    }

    #[test]
    fn map_to_server_roundtrips() {
        for x in -8..8 {
            for y in -8..8 {
                let loc = Location::from_server(x, y, 0);
                let back = Location::from_map(loc.map_col(), loc.map_row());
                assert_eq!(back.server_x(), x, "x for ({x}, {y})");
                assert_eq!(back.server_y(), y, "y for ({x}, {y})");
                assert_eq!(back.server_z(), 0);
            }
        }
    }

    #[test]
    fn display_from_server_applies_level_offset() {
        let loc = Location::from_server(4, 2, 1);
        assert_eq!(loc.display_x(), (4 + 2) * STEP_X);
        assert_eq!(loc.display_y(), -((4 - 2) * STEP_Y + DISPLAY_Z_OFFSET_MOD * STEP_Y));
        assert_eq!(loc.display_z(), (4 - 2 - LAYER_LEVEL) * LAYER_DISTANCE);
    }

    #[test]
    fn display_prefers_map_when_server_is_dirty() {
        let mut loc = Location::new();
        loc.set_map(6, 2);
        assert_eq!(loc.display_x(), 6 * STEP_X);
        assert_eq!(loc.display_y(), -2 * STEP_Y);
        assert_eq!(loc.display_z(), 2 * LAYER_DISTANCE);
    }

    #[test]
    fn server_recomputes_from_display_with_rounding() {
        let reference = Location::from_server(5, -3, 0);
        let mut loc = Location::new();
        loc.set_display(reference.display_x(), reference.display_y(), 0);
        assert_eq!(loc.server_x(), 5);
        assert_eq!(loc.server_y(), -3);
    }

    #[test]
    fn add_server_resyncs_own_space_first() {
        let mut loc = Location::new();
        loc.set_map(10, 0); // server dirty at this point
        loc.add_server(1, 0, 0);
        assert_eq!(loc.server_x(), 6);
        assert_eq!(loc.server_y(), 5);
    }

    #[test]
    fn move_by_steps_one_tile() {
        let mut loc = Location::from_server(10, 10, 0);
        loc.move_by(Direction::East);
        assert!(loc.equals_server(11, 10, 0));
        loc.move_by(Direction::NorthWest);
        assert!(loc.equals_server(10, 9, 0));
    }

    #[test]
    fn key_roundtrips_in_valid_domain() {
        let mut rng = rand::thread_rng();
        for _ in 0..1000 {
            let x = rng.gen_range(0..65536);
            let y = rng.gen_range(0..65536);
            let z = rng.gen_range(0..1024);
            assert_eq!(unpack_key(pack_key(x, y, z)), (x, y, z));
        }
    }

    #[test]
    fn key_matches_modulus_layout() {
        assert_eq!(pack_key(1, 0, 0), 65_536);
        assert_eq!(pack_key(0, 1, 0), 1);
        assert_eq!(pack_key(0, 0, 1), 4_294_967_296);
        assert_eq!(pack_key(2, 3, 1), 4_294_967_296 + 2 * 65_536 + 3);
    }

    #[test]
    fn set_key_restores_server_coordinates() {
        let loc = Location::from_server(123, 456, 3);
        let mut other = Location::new();
        other.set_key(loc.key());
        assert_eq!(other, loc);
    }

    #[test]
    fn distance_is_chebyshev_and_symmetric() {
        let a = Location::from_server(0, 0, 0);
        let b = Location::from_server(3, -5, 0);
        assert_eq!(a.distance_to(&b), 5);
        assert_eq!(b.distance_to(&a), 5);
    }

    #[test]
    fn neighbour_matches_distance_of_at_most_one() {
        let origin = Location::from_server(0, 0, 0);
        for x in -3..=3 {
            for y in -3..=3 {
                let other = Location::from_server(x, y, 0);
                assert_eq!(
                    origin.is_neighbour(&other),
                    origin.distance_to(&other) <= 1,
                    "({x}, {y})"
                );
            }
        }
    }

    #[test]
    fn sqrt_distance_is_euclidean() {
        let a = Location::from_server(0, 0, 0);
        let b = Location::from_server(3, 4, 0);
        assert!((a.sqrt_distance_to(&b) - 5.0).abs() < f32::EPSILON);
    }

    #[test]
    fn direction_to_uses_signs() {
        let a = Location::from_server(10, 10, 0);
        assert_eq!(
            a.direction_to(&Location::from_server(14, 10, 0)),
            Some(Direction::East)
        );
        assert_eq!(
            a.direction_to(&Location::from_server(9, 12, 0)),
            Some(Direction::SouthWest)
        );
        assert_eq!(a.direction_to(&Location::from_server(10, 10, 2)), None);
    }

    #[test]
    fn equality_ignores_which_space_was_written() {
        let a = Location::from_server(4, 2, 0);
        let b = Location::from_map(6, 2);
        assert_eq!(a, b);

        use std::collections::hash_map::DefaultHasher;
        use std::hash::{Hash, Hasher};
        let mut ha = DefaultHasher::new();
        let mut hb = DefaultHasher::new();
        a.hash(&mut ha);
        b.hash(&mut hb);
        assert_eq!(ha.finish(), hb.finish());
    }

    #[test]
    fn from_reader_decodes_three_shorts() {
        let bytes: Vec<u8> = [12i16, -7, 2]
            .iter()
            .flat_map(|v| v.to_le_bytes())
            .collect();
        let loc = Location::from_reader(&mut bytes.as_slice()).unwrap();
        assert!(loc.equals_server(12, -7, 2));
    }

    #[test]
    fn from_reader_propagates_short_reads() {
        let bytes = [0x01u8, 0x00, 0x02];
        let err = Location::from_reader(&mut bytes.as_ref()).unwrap_err();
        assert_eq!(err.kind(), std::io::ErrorKind::UnexpectedEof);
    }

    #[test]
    fn float_display_helpers_truncate() {
        assert_eq!(display_coordinate_x(0.9, 0.0, 0.0), (0.9 * STEP_X as f32) as i32);
        // 0.99 tiles stays below one full step, rounding would not.
        assert!(display_coordinate_x(0.99, 0.0, 0.0) < STEP_X);
        assert_eq!(display_coordinate_y(1.0, 0.0, 0.0), STEP_Y);
        assert_eq!(
            display_coordinate_z(1.0, 0.0, 0.0),
            LAYER_DISTANCE
        );
    }
}
