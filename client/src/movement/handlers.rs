//! Input sources that feed the movement scheduler one step at a time.

use rv_core::types::{Direction, Location};

use super::MovementMode;

/// One requested step: which way and how fast.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct StepData {
    pub mode: MovementMode,
    pub direction: Direction,
}

/// The currently engaged input source. The scheduler polls whichever
/// handler is active whenever it is ready for the next step.
#[derive(Clone, Debug)]
pub enum MovementHandler {
    Keyboard(KeyboardHandler),
    WalkTo(WalkToHandler),
}

impl MovementHandler {
    pub fn keyboard() -> Self {
        MovementHandler::Keyboard(KeyboardHandler::new())
    }

    pub fn walk_to(target: Location) -> Self {
        MovementHandler::WalkTo(WalkToHandler::new(target))
    }

    /// The next step this handler wants, given where the character stands
    /// now, or `None` when it has nothing to do.
    pub fn next_step(&mut self, current: &Location, default_mode: MovementMode) -> Option<StepData> {
        match self {
            MovementHandler::Keyboard(handler) => handler.next_step(default_mode),
            MovementHandler::WalkTo(handler) => handler.next_step(current, default_mode),
        }
    }

    pub fn keyboard_mut(&mut self) -> Option<&mut KeyboardHandler> {
        match self {
            MovementHandler::Keyboard(handler) => Some(handler),
            MovementHandler::WalkTo(_) => None,
        }
    }

    pub fn walk_to_mut(&mut self) -> Option<&mut WalkToHandler> {
        match self {
            MovementHandler::Keyboard(_) => None,
            MovementHandler::WalkTo(handler) => Some(handler),
        }
    }

    pub fn disengage(&mut self) {
        match self {
            MovementHandler::Keyboard(handler) => handler.release_all(),
            MovementHandler::WalkTo(handler) => handler.clear_target(),
        }
    }
}

/// Steps in the direction of the most recently pressed key that is still
/// held down.
#[derive(Clone, Debug, Default)]
pub struct KeyboardHandler {
    held: Vec<Direction>,
}

impl KeyboardHandler {
    pub fn new() -> Self {
        KeyboardHandler::default()
    }

    /// Records a key press. Pressing an already-held direction moves it
    /// back to the top, so the newest press always wins.
    pub fn press(&mut self, direction: Direction) {
        self.held.retain(|&d| d != direction);
        self.held.push(direction);
    }

    pub fn release(&mut self, direction: Direction) {
        self.held.retain(|&d| d != direction);
    }

    pub fn release_all(&mut self) {
        self.held.clear();
    }

    pub fn is_any_key_held(&self) -> bool {
        !self.held.is_empty()
    }

    fn next_step(&self, default_mode: MovementMode) -> Option<StepData> {
        self.held.last().map(|&direction| StepData {
            mode: default_mode,
            direction,
        })
    }
}

/// Walks towards a fixed target location, one step per poll, until the
/// character arrives.
#[derive(Clone, Debug, Default)]
pub struct WalkToHandler {
    target: Option<Location>,
}

impl WalkToHandler {
    pub fn new(target: Location) -> Self {
        WalkToHandler {
            target: Some(target),
        }
    }

    pub fn set_target(&mut self, target: Location) {
        self.target = Some(target);
    }

    pub fn clear_target(&mut self) {
        self.target = None;
    }

    fn next_step(&mut self, current: &Location, default_mode: MovementMode) -> Option<StepData> {
        let target = self.target.as_ref()?;
        let Some(direction) = current.direction_to(target) else {
            // Already there.
            self.target = None;
            return None;
        };
        Some(StepData {
            mode: default_mode,
            direction,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn newest_held_key_wins() {
        let mut handler = KeyboardHandler::new();
        handler.press(Direction::North);
        handler.press(Direction::East);
        assert_eq!(
            handler.next_step(MovementMode::Walk),
            Some(StepData {
                mode: MovementMode::Walk,
                direction: Direction::East
            })
        );

        handler.release(Direction::East);
        assert_eq!(
            handler.next_step(MovementMode::Walk),
            Some(StepData {
                mode: MovementMode::Walk,
                direction: Direction::North
            })
        );

        handler.release(Direction::North);
        assert_eq!(handler.next_step(MovementMode::Walk), None);
    }

    #[test]
    fn repressing_a_key_moves_it_back_on_top() {
        let mut handler = KeyboardHandler::new();
        handler.press(Direction::North);
        handler.press(Direction::East);
        handler.press(Direction::North);
        assert_eq!(
            handler.next_step(MovementMode::Walk).map(|s| s.direction),
            Some(Direction::North)
        );
    }

    #[test]
    fn walk_to_steps_towards_the_target_and_stops_on_arrival() {
        let mut handler = WalkToHandler::new(Location::from_server(12, 10, 0));
        let current = Location::from_server(10, 10, 0);

        assert_eq!(
            handler.next_step(&current, MovementMode::Walk).map(|s| s.direction),
            Some(Direction::East)
        );

        let arrived = Location::from_server(12, 10, 0);
        assert_eq!(handler.next_step(&arrived, MovementMode::Walk), None);
        // Target is cleared once reached.
        assert_eq!(handler.next_step(&current, MovementMode::Walk), None);
    }
}
