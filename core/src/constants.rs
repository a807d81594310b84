//! Shared constants for the isometric projection and position keys.

/// Width of one tile on screen, in pixels.
pub const TILE_WIDTH: i32 = 76;

/// Height of one tile on screen, in pixels.
pub const TILE_HEIGHT: i32 = 37;

/// Horizontal display offset between two neighbouring tiles.
pub const STEP_X: i32 = 38;

/// Vertical display offset between two neighbouring tiles.
pub const STEP_Y: i32 = 19;

/// Display Y modifier applied per level for tiles above or below level 0.
pub const DISPLAY_Z_OFFSET_MOD: i32 = 6;

/// Server-coordinate shift of `x - y` between two map levels.
pub const LAYER_LEVEL: i32 = 6;

/// Spread factor for the display Z (draw ordering) coordinate.
pub const LAYER_DISTANCE: i32 = 50;

/// Perspective shift in server units per map level. One level down moves the
/// probed column by (-3, +3), keeping `x + y` constant while `x - y` changes
/// by [`LAYER_LEVEL`].
pub const TILE_PERSPECTIVE_OFFSET: i32 = 3;

/// Modifier of the X server coordinate inside a packed position key.
pub const KEY_MOD_X: i64 = 65_536;

/// Modifier of the Y server coordinate inside a packed position key.
pub const KEY_MOD_Y: i64 = 1;

/// Modifier of the Z server coordinate inside a packed position key.
pub const KEY_MOD_Z: i64 = 4_294_967_296;
