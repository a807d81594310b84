//! The playing character and the pieces of its state movement works with.

use rv_core::types::{CharacterId, Direction, Location};

use crate::movement::MovementMode;

/// The avatar as the rest of the client sees it: the facing, the current
/// position and the flags that track a move animation in flight.
#[derive(Clone, Debug)]
pub struct Char {
    location: Location,
    direction: Direction,
    agility: i32,
    moving: bool,
    move_mode: MovementMode,
    move_duration: u32,
    hold_animation_reset: bool,
}

impl Char {
    pub fn new(location: Location) -> Self {
        Char {
            location,
            direction: Direction::North,
            agility: 10,
            moving: false,
            move_mode: MovementMode::None,
            move_duration: 0,
            hold_animation_reset: false,
        }
    }

    pub fn location(&self) -> &Location {
        &self.location
    }

    pub fn set_location(&mut self, location: &Location) {
        self.location = location.clone();
    }

    pub fn direction(&self) -> Direction {
        self.direction
    }

    pub fn set_direction(&mut self, direction: Direction) {
        self.direction = direction;
    }

    pub fn agility(&self) -> i32 {
        self.agility
    }

    pub fn set_agility(&mut self, agility: i32) {
        self.agility = agility;
    }

    /// Begins a move animation towards `target`. The logical position jumps
    /// ahead immediately; the view catches up over `duration` milliseconds.
    pub fn move_to(&mut self, target: &Location, mode: MovementMode, duration: u32) {
        self.location = target.clone();
        self.moving = true;
        self.move_mode = mode;
        self.move_duration = duration;
    }

    pub fn move_mode(&self) -> MovementMode {
        self.move_mode
    }

    pub fn move_duration(&self) -> u32 {
        self.move_duration
    }

    pub fn update_move_duration(&mut self, duration: u32) {
        self.move_duration = duration;
    }

    pub fn is_moving(&self) -> bool {
        self.moving
    }

    /// Arms a one-shot guard so the next non-forced [`Char::reset_animation`]
    /// call is swallowed. Used when a new step is scheduled while the
    /// previous one is still finishing.
    pub fn hold_back_animation_reset(&mut self) {
        self.hold_animation_reset = true;
    }

    /// Drops an armed reset guard without touching the animation state.
    pub fn clear_animation_reset_hold(&mut self) {
        self.hold_animation_reset = false;
    }

    pub fn reset_animation(&mut self, force: bool) {
        if !force && self.hold_animation_reset {
            self.hold_animation_reset = false;
            return;
        }
        self.hold_animation_reset = false;
        self.moving = false;
    }
}

/// How much the character carries relative to what it can carry.
#[derive(Clone, Copy, Debug)]
pub struct CarryLoad {
    current: i32,
    maximum: i32,
}

impl CarryLoad {
    pub fn new(current: i32, maximum: i32) -> Self {
        CarryLoad { current, maximum }
    }

    /// Load in tenths of the maximum, clamped to `0..=10`.
    pub fn load_factor(&self) -> f64 {
        if self.maximum <= 0 {
            return 10.0;
        }
        (f64::from(self.current) / f64::from(self.maximum) * 10.0).clamp(0.0, 10.0)
    }

    pub fn is_walking_possible(&self) -> bool {
        self.current <= self.maximum
    }
}

impl Default for CarryLoad {
    fn default() -> Self {
        CarryLoad::new(0, 100)
    }
}

/// The player: the character plus the client-only state around it.
///
/// `location` is the view position the camera follows. It normally trails
/// the character's logical position while a move animates.
#[derive(Clone, Debug)]
pub struct Player {
    id: Option<CharacterId>,
    location: Location,
    character: Char,
    carry_load: CarryLoad,
}

impl Player {
    pub fn new(location: Location) -> Self {
        Player {
            id: None,
            character: Char::new(location.clone()),
            location,
            carry_load: CarryLoad::default(),
        }
    }

    pub fn id(&self) -> Option<CharacterId> {
        self.id
    }

    pub fn set_id(&mut self, id: CharacterId) {
        self.id = Some(id);
    }

    pub fn location(&self) -> &Location {
        &self.location
    }

    /// Moves only the view position; the character keeps its own location.
    pub fn update_location(&mut self, location: &Location) {
        self.location = location.clone();
    }

    /// Snaps both the view position and the character to `location`.
    pub fn set_location(&mut self, location: &Location) {
        self.location = location.clone();
        self.character.set_location(location);
    }

    pub fn character(&self) -> &Char {
        &self.character
    }

    pub fn character_mut(&mut self) -> &mut Char {
        &mut self.character
    }

    pub fn carry_load(&self) -> CarryLoad {
        self.carry_load
    }

    pub fn set_carry_load(&mut self, load: CarryLoad) {
        self.carry_load = load;
    }
}
