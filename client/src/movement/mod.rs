//! Player movement: turning local input into server commands and server
//! responses into animated steps.
//!
//! The scheduler is optimistic. A step starts animating the moment the
//! input arrives; the server's answer later confirms it, adjusts its
//! timing, or rejects it, in which case the player snaps back to the
//! position the server reported.

use std::collections::VecDeque;

use log::{error, warn};
use serde::{Deserialize, Serialize};

use rv_core::types::{Direction, Location};

use crate::animation::MoveAnimation;
use crate::network::{ClientCommand, CommandSink};
use crate::player::Player;
use crate::world::WorldMap;

pub mod animator;
pub mod handlers;

pub use animator::{MoveAnimator, Signals, TaskId};
pub use handlers::{KeyboardHandler, MovementHandler, StepData, WalkToHandler};

pub(crate) const LOG_TARGET: &str = "movement";

/// How a character moves. The numeric ids are part of the wire protocol.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum MovementMode {
    /// Not moving; a move answer with this mode rejects the request.
    None,
    #[default]
    Walk,
    Run,
    /// Shoved by someone else; never requested locally.
    Push,
}

impl MovementMode {
    pub fn id(self) -> u8 {
        match self {
            MovementMode::None => 0,
            MovementMode::Walk => 1,
            MovementMode::Run => 2,
            MovementMode::Push => 3,
        }
    }
}

/// Agility above this no longer speeds up walking.
const MAX_WALK_AGI: i32 = 20;
/// Step duration bounds in milliseconds.
const MIN_WALK_COST: f64 = 300.0;
const MAX_WALK_COST: f64 = 800.0;

/// A server response waiting to be applied on the next update.
#[derive(Clone, Debug)]
enum Queued {
    Move {
        /// Where the server said the character stood before this move.
        before: Location,
        mode: MovementMode,
        target: Location,
        duration: u32,
    },
    Turn {
        direction: Direction,
    },
    TooEarly,
}

/// The movement scheduler. Owns the player, the animator and the outgoing
/// command channel; driven once per frame from the client loop.
pub struct Movement<A: MoveAnimation, S: CommandSink> {
    player: Player,
    /// The last position the server confirmed or reported.
    server_location: Location,
    default_mode: MovementMode,
    /// True from sending a move request until the step is done or rejected.
    step_in_progress: bool,
    animator: MoveAnimator<A>,
    active_handler: Option<MovementHandler>,
    last_sent_move: Option<ClientCommand>,
    sink: S,
    pending: VecDeque<Queued>,
}

impl<A: MoveAnimation, S: CommandSink> Movement<A, S> {
    pub fn new(player: Player, animation: A, sink: S) -> Self {
        let server_location = player.character().location().clone();
        Movement {
            player,
            server_location,
            default_mode: MovementMode::Walk,
            step_in_progress: false,
            animator: MoveAnimator::new(animation),
            active_handler: None,
            last_sent_move: None,
            sink,
            pending: VecDeque::new(),
        }
    }

    pub fn player(&self) -> &Player {
        &self.player
    }

    pub fn player_mut(&mut self) -> &mut Player {
        &mut self.player
    }

    pub fn server_location(&self) -> &Location {
        &self.server_location
    }

    pub fn default_mode(&self) -> MovementMode {
        self.default_mode
    }

    pub fn set_default_mode(&mut self, mode: MovementMode) {
        self.default_mode = mode;
    }

    pub fn is_moving(&self) -> bool {
        self.animator.is_animating()
    }

    pub fn current_offset(&self) -> (i32, i32, i32) {
        self.animator.current_offset()
    }

    pub fn sink(&self) -> &S {
        &self.sink
    }

    pub fn sink_mut(&mut self) -> &mut S {
        &mut self.sink
    }

    pub fn activate_keyboard_handler(&mut self) {
        self.active_handler = Some(MovementHandler::keyboard());
    }

    pub fn walk_to(&mut self, target: Location) {
        self.active_handler = Some(MovementHandler::walk_to(target));
    }

    pub fn disengage_handler(&mut self) {
        if let Some(handler) = &mut self.active_handler {
            handler.disengage();
        }
        self.active_handler = None;
    }

    pub fn handler_mut(&mut self) -> Option<&mut MovementHandler> {
        self.active_handler.as_mut()
    }

    /// Records a move answer from the server. Applied on the next update;
    /// the confirmed server position advances immediately.
    pub fn handle_server_move(&mut self, mode: MovementMode, target: Location, duration: u32) {
        let before = self.server_location.clone();
        self.server_location = target.clone();
        self.pending.push_back(Queued::Move {
            before,
            mode,
            target,
            duration,
        });
    }

    pub fn handle_server_turn(&mut self, direction: Direction) {
        self.pending.push_back(Queued::Turn { direction });
    }

    /// The server saw the move request before the previous step finished
    /// server-side and wants it again.
    pub fn handle_server_move_too_early(&mut self) {
        self.pending.push_back(Queued::TooEarly);
    }

    /// Throws away every prediction and puts the player where the server
    /// says. The active handler is disengaged since its plan is now stale.
    pub fn execute_server_location(&mut self, target: &Location) {
        self.animator.cancel_all(&mut self.player);
        self.step_in_progress = false;
        self.player.set_location(target);
        self.server_location = target.clone();
        self.disengage_handler();
    }

    /// One frame of movement: applies queued server answers, advances the
    /// animation and asks the active handler for the next step when idle.
    pub fn update<W: WorldMap>(&mut self, world: &W, delta_ms: u32) {
        let mut signals = Signals::default();

        while let Some(queued) = self.pending.pop_front() {
            match queued {
                Queued::Move {
                    before,
                    mode,
                    target,
                    duration,
                } => {
                    if mode == MovementMode::None || before == target {
                        // The move was rejected.
                        self.animator.cancel_move(&mut self.player, &target);
                        signals.merge(Signals {
                            ready_for_next_step: true,
                            snap_to: None,
                        });
                    } else {
                        signals.merge(self.animator.confirm_move(
                            &mut self.player,
                            world,
                            mode,
                            target,
                            duration,
                        ));
                    }
                }
                Queued::Turn { direction } => {
                    signals.merge(
                        self.animator
                            .schedule_turn(&mut self.player, world, direction),
                    );
                }
                Queued::TooEarly => self.resend(),
            }
        }

        // A refuted prediction snaps before the stale animation gets
        // another frame.
        if let Some(snap) = signals.snap_to.take() {
            self.execute_server_location(&snap);
            return;
        }

        signals.merge(self.animator.tick(&mut self.player, world, delta_ms));

        if signals.ready_for_next_step {
            self.step_in_progress = false;
        }
        self.pump_handler(world);
    }

    /// Asks the active handler for a step and gets it going, unless one is
    /// already on its way to the server.
    fn pump_handler<W: WorldMap>(&mut self, world: &W) {
        if self.step_in_progress {
            return;
        }
        let step = match self.active_handler.as_mut() {
            Some(handler) => {
                match handler.next_step(self.player.character().location(), self.default_mode) {
                    Some(step) => step,
                    None => return,
                }
            }
            None => return,
        };

        if step.mode == MovementMode::None {
            self.send_turn_to_server(step.direction);
            self.animator
                .schedule_turn(&mut self.player, world, step.direction);
            return;
        }

        self.step_in_progress = true;
        self.send_move_to_server(step.mode, step.direction);
        self.animator
            .schedule_turn(&mut self.player, world, step.direction);
        self.schedule_early_move(world, step.mode, step.direction);
    }

    /// Predicts the outcome of a move request and starts animating it.
    /// Does nothing when the move is plainly impossible; the server's
    /// answer settles those cases.
    fn schedule_early_move<W: WorldMap>(&mut self, world: &W, mode: MovementMode, direction: Direction) {
        if !self.player.carry_load().is_walking_possible() {
            return;
        }

        let target = self.target_location(mode, direction);
        let Some(target_tile) = world.map_at_loc(&target) else {
            return;
        };
        if target_tile.is_blocked() {
            return;
        }

        let mods = self.duration_mods();
        let diagonal = direction.is_diagonal();
        let running = mode == MovementMode::Run;
        let mut duration = movement_duration(target_tile.movement_cost(), mods, diagonal, running);

        if running {
            let mut walk_target = self.server_location.clone();
            walk_target.move_by(direction);
            let Some(walk_tile) = world.map_at_loc(&walk_target) else {
                return;
            };
            if walk_tile.is_blocked() {
                return;
            }
            duration += movement_duration(walk_tile.movement_cost(), mods, diagonal, true);
        }

        let duration = (duration as u32 / 100) * 100;
        self.animator
            .schedule_early_move(&mut self.player, world, mode, target, duration);
    }

    /// The tile a move in `direction` ends on: one step for walking, two
    /// for running.
    fn target_location(&self, mode: MovementMode, direction: Direction) -> Location {
        let mut target = self.server_location.clone();
        match mode {
            MovementMode::None => {
                panic!("no move target exists for movement mode {mode:?}")
            }
            MovementMode::Walk | MovementMode::Push => target.move_by(direction),
            MovementMode::Run => {
                target.move_by(direction);
                target.move_by(direction);
            }
        }
        target
    }

    fn duration_mods(&self) -> f64 {
        let agility = self.player.character().agility().min(MAX_WALK_AGI);
        (10.0 - f64::from(agility)) / 100.0 + self.player.carry_load().load_factor() / 10.0 * 3.0
            + 1.0
    }

    fn send_move_to_server(&mut self, mode: MovementMode, direction: Direction) {
        let Some(id) = self.player.id() else {
            error!(
                target: LOG_TARGET,
                "cannot send a move request, the player has no character id yet"
            );
            return;
        };
        let command = ClientCommand::new_move(id, mode, direction);
        self.last_sent_move = Some(command.clone());
        self.sink.send_command(command);
    }

    fn send_turn_to_server(&mut self, direction: Direction) {
        if self.player.character().direction() == direction {
            return;
        }
        self.sink.send_command(ClientCommand::new_turn(direction));
    }

    fn resend(&mut self) {
        match &self.last_sent_move {
            Some(command) => {
                warn!(
                    target: LOG_TARGET,
                    "server was not ready for the last move, sending it again"
                );
                let command = command.clone();
                self.sink.send_command(command);
            }
            None => {
                warn!(
                    target: LOG_TARGET,
                    "server reported a move as too early but none was sent"
                );
            }
        }
    }
}

/// Duration of a single step in milliseconds. The tile cost is clamped
/// into the walk bounds first; the diagonal and run multipliers apply on
/// top and may leave the bounds again.
fn movement_duration(movement_cost: i32, mods: f64, diagonal: bool, running: bool) -> f64 {
    let mut duration =
        (f64::from(movement_cost) * 100.0 * mods).clamp(MIN_WALK_COST, MAX_WALK_COST);
    if diagonal {
        duration *= std::f64::consts::SQRT_2;
    }
    if running {
        duration *= 0.6;
    }
    duration
}
