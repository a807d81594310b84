//! Queueing and reconciliation of move animations.
//!
//! The client starts walking before the server has answered. Every move
//! is therefore scheduled twice: once early, from local input, and once
//! confirmed, from the server's response. The animator keeps the two in
//! sync and repairs the player position when they disagree.

use std::collections::VecDeque;

use log::warn;

use rv_core::types::{Direction, Location};

use crate::animation::MoveAnimation;
use crate::player::Player;
use crate::world::WorldMap;

use super::{MovementMode, LOG_TARGET};

/// Identity of a scheduled move, used to match a server confirmation to
/// the early move it answers.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct TaskId(u64);

/// A scheduled step: where to, how, and how long it takes.
#[derive(Clone, Debug)]
pub struct MoveTask {
    id: TaskId,
    mode: MovementMode,
    target: Location,
    duration: u32,
}

impl MoveTask {
    pub fn id(&self) -> TaskId {
        self.id
    }

    pub fn target(&self) -> &Location {
        &self.target
    }

    pub fn duration(&self) -> u32 {
        self.duration
    }
}

#[derive(Clone, Debug)]
enum Task {
    Move(MoveTask),
    Turn(Direction),
}

/// The early move currently awaiting its server confirmation, and whether
/// it already started animating.
#[derive(Clone, Debug)]
struct PendingMove {
    task: MoveTask,
    executed: bool,
}

/// What the animator wants its owner to do after a call.
#[derive(Clone, Debug, Default)]
pub struct Signals {
    /// The current step is over; the scheduler may request the next one.
    pub ready_for_next_step: bool,
    /// Prediction and server disagree; snap the player here.
    pub snap_to: Option<Location>,
}

impl Signals {
    fn ready() -> Self {
        Signals {
            ready_for_next_step: true,
            snap_to: None,
        }
    }

    fn snap(target: Location) -> Self {
        Signals {
            ready_for_next_step: true,
            snap_to: Some(target),
        }
    }

    pub fn merge(&mut self, other: Signals) {
        self.ready_for_next_step |= other.ready_for_next_step;
        if other.snap_to.is_some() {
            self.snap_to = other.snap_to;
        }
    }
}

pub struct MoveAnimator<A: MoveAnimation> {
    animation: A,
    queue: VecDeque<Task>,
    next_task_id: u64,
    /// The early move waiting for the server, at most one at a time.
    unconfirmed: Option<PendingMove>,
    /// The server's answer for a not-yet-executed early move. Swapped into
    /// the queue slot when execution reaches it.
    confirmed: Option<MoveTask>,
    animation_in_progress: bool,
    reporting_done: bool,
    last_requested_turn: Option<Direction>,
    /// Display offset the character is currently drawn at, relative to
    /// its tile.
    current_offset: (i32, i32, i32),
}

impl<A: MoveAnimation> MoveAnimator<A> {
    pub fn new(animation: A) -> Self {
        MoveAnimator {
            animation,
            queue: VecDeque::new(),
            next_task_id: 0,
            unconfirmed: None,
            confirmed: None,
            animation_in_progress: false,
            reporting_done: false,
            last_requested_turn: None,
            current_offset: (0, 0, 0),
        }
    }

    fn allocate_task_id(&mut self) -> TaskId {
        let id = TaskId(self.next_task_id);
        self.next_task_id += 1;
        id
    }

    fn reporting_required(&self) -> bool {
        !self.reporting_done && self.unconfirmed.is_none()
    }

    pub fn is_animating(&self) -> bool {
        self.animation_in_progress
    }

    pub fn current_offset(&self) -> (i32, i32, i32) {
        self.current_offset
    }

    /// Schedules a move predicted from local input, before the server has
    /// confirmed it. Only one early move may be outstanding; further ones
    /// are dropped until the server answers.
    pub fn schedule_early_move<W: WorldMap>(
        &mut self,
        player: &mut Player,
        world: &W,
        mode: MovementMode,
        target: Location,
        duration: u32,
    ) -> Signals {
        if self.unconfirmed.is_some() {
            warn!(
                target: LOG_TARGET,
                "dropping early move to {target}, another one is still unconfirmed"
            );
            return Signals::default();
        }

        let task = MoveTask {
            id: self.allocate_task_id(),
            mode,
            target,
            duration,
        };
        self.unconfirmed = Some(PendingMove {
            task: task.clone(),
            executed: false,
        });
        if self.animation_in_progress {
            // The finish of the still-running step must not clobber the
            // animation state of the one we are about to start.
            player.character_mut().hold_back_animation_reset();
        }
        self.schedule_task(player, world, Task::Move(task))
    }

    /// Schedules a move the server reported on its own, for instance when
    /// the character was pushed.
    pub fn schedule_server_move<W: WorldMap>(
        &mut self,
        player: &mut Player,
        world: &W,
        mode: MovementMode,
        target: Location,
        duration: u32,
    ) -> Signals {
        let task = MoveTask {
            id: self.allocate_task_id(),
            mode,
            target,
            duration,
        };
        self.schedule_task(player, world, Task::Move(task))
    }

    pub fn schedule_turn<W: WorldMap>(
        &mut self,
        player: &mut Player,
        world: &W,
        direction: Direction,
    ) -> Signals {
        if self.last_requested_turn == Some(direction) {
            return Signals::default();
        }
        self.last_requested_turn = Some(direction);
        self.schedule_task(player, world, Task::Turn(direction))
    }

    fn schedule_task<W: WorldMap>(
        &mut self,
        player: &mut Player,
        world: &W,
        task: Task,
    ) -> Signals {
        self.queue.push_back(task);
        if self.animation_in_progress {
            Signals::default()
        } else {
            self.execute_next(player, world)
        }
    }

    /// Applies the server's answer to the outstanding early move. Repairs
    /// duration or position where the prediction was wrong.
    pub fn confirm_move<W: WorldMap>(
        &mut self,
        player: &mut Player,
        world: &W,
        mode: MovementMode,
        target: Location,
        duration: u32,
    ) -> Signals {
        match self.unconfirmed.take() {
            None => {
                // Nothing was predicted; treat it like a fresh server move.
                self.schedule_server_move(player, world, mode, target, duration)
            }
            Some(pending) if pending.executed => {
                if self.animation.is_running() {
                    if player.character().location() == &target {
                        // Right tile, possibly wrong speed.
                        if self.animation.duration() != duration {
                            self.animation.set_duration(duration);
                            player.character_mut().update_move_duration(duration);
                        }
                        Signals::default()
                    } else {
                        warn!(
                            target: LOG_TARGET,
                            "server corrected a running move to {target}"
                        );
                        Signals::snap(target)
                    }
                } else {
                    // The animation already finished while the confirmation
                    // was in flight.
                    Signals::ready()
                }
            }
            Some(pending) => {
                if pending.task.target == target && pending.task.mode == mode {
                    self.confirmed = Some(MoveTask {
                        duration,
                        ..pending.task.clone()
                    });
                } else {
                    warn!(
                        target: LOG_TARGET,
                        "server replaced a queued move, expected {} got {target}",
                        pending.task.target
                    );
                    self.confirmed = Some(MoveTask {
                        id: pending.task.id,
                        mode,
                        target,
                        duration,
                    });
                }
                self.unconfirmed = Some(pending);
                Signals::default()
            }
        }
    }

    /// Aborts the outstanding early move because the server rejected it.
    /// `authoritative` is where the server says the character stands.
    /// Everything queued behind the rejected move is stale and dropped.
    pub fn cancel_move(&mut self, player: &mut Player, authoritative: &Location) {
        match self.unconfirmed.take() {
            None => {
                player.set_location(authoritative);
            }
            Some(pending) if pending.executed => {
                self.queue.clear();
                if self.animation.is_running() {
                    self.animation.stop();
                }
                self.animation_in_progress = false;
                self.current_offset = (0, 0, 0);
                player.character_mut().reset_animation(true);
                player.set_location(authoritative);
            }
            Some(_) => {
                // The move never started; drop it together with the
                // server's answer for it. A running animation for an
                // earlier task keeps going.
                self.queue.clear();
                self.confirmed = None;
                player.character_mut().clear_animation_reset_hold();
            }
        }
    }

    /// Drops everything scheduled and halts the current animation. The
    /// caller decides where the player ends up.
    pub fn cancel_all(&mut self, player: &mut Player) {
        self.queue.clear();
        if self.animation.is_running() {
            self.animation.stop();
        }
        self.animation_in_progress = false;
        self.current_offset = (0, 0, 0);
        self.last_requested_turn = None;
        player.character_mut().reset_animation(true);
    }

    /// Advances the running animation by `delta_ms` and starts the next
    /// queued task once the current one is done.
    pub fn tick<W: WorldMap>(&mut self, player: &mut Player, world: &W, delta_ms: u32) -> Signals {
        let mut signals = Signals::default();

        if self.animation.is_running() {
            let tick = self.animation.update(delta_ms);
            if let Some(offset) = tick.position {
                self.current_offset = offset;
            }

            if tick.finished {
                self.animation_in_progress = false;
                let arrived = player.character().location().clone();
                player.set_location(&arrived);
                player.character_mut().reset_animation(false);
                if self.reporting_required() {
                    self.reporting_done = true;
                    signals.merge(Signals::ready());
                }
            } else if self.reporting_required() && self.animation.time_remaining() < 20 {
                // Ask for the next step slightly before the animation ends
                // so consecutive steps blend together.
                self.reporting_done = true;
                signals.merge(Signals::ready());
            }
        }

        if !self.animation_in_progress {
            signals.merge(self.execute_next(player, world));
        }
        signals
    }

    /// Starts queued tasks until one of them animates or the queue runs
    /// dry. Halts while an executed early move still awaits the server.
    fn execute_next<W: WorldMap>(&mut self, player: &mut Player, world: &W) -> Signals {
        let mut signals = Signals::default();
        loop {
            if let Some(pending) = &self.unconfirmed {
                if pending.executed {
                    return signals;
                }
            }

            let Some(task) = self.queue.pop_front() else {
                return signals;
            };

            let task = match task {
                Task::Turn(direction) => {
                    player.character_mut().set_direction(direction);
                    if self.last_requested_turn == Some(direction) {
                        self.last_requested_turn = None;
                    }
                    continue;
                }
                Task::Move(task) => task,
            };

            // If the server already answered this early move, its answer
            // replaces the prediction.
            let task = match self.confirmed.take() {
                Some(confirmed)
                    if self
                        .unconfirmed
                        .as_ref()
                        .is_some_and(|p| p.task.id == task.id) =>
                {
                    self.unconfirmed = None;
                    confirmed
                }
                other => {
                    self.confirmed = other;
                    task
                }
            };

            if let Some(pending) = &mut self.unconfirmed {
                if pending.task.id == task.id {
                    pending.executed = true;
                }
            }

            self.animation_in_progress = true;
            if self.execute_move(player, world, &task) {
                return signals;
            }
            // The move completed instantly; the step it belonged to is
            // over.
            self.animation_in_progress = false;
            signals.merge(Signals::ready());
        }
    }

    /// Starts the animation for one move. Returns `false` when there is
    /// nothing to animate and the move completed instantly.
    fn execute_move<W: WorldMap>(
        &mut self,
        player: &mut Player,
        world: &W,
        task: &MoveTask,
    ) -> bool {
        if task.mode == MovementMode::None || player.character().location() == &task.target {
            player.set_location(&task.target);
            return false;
        }

        self.reporting_done = false;

        let old_elevation = world.elevation_at(player.character().location());
        let new_elevation = world.elevation_at(&task.target);

        let x_offset = player.character().location().display_x() - task.target.display_x();
        let y_offset = player.character().location().display_y() - task.target.display_y();

        player
            .character_mut()
            .move_to(&task.target, task.mode, task.duration);

        self.current_offset = (x_offset, y_offset - old_elevation, 0);
        self.animation.start(
            self.current_offset,
            (0, -new_elevation, 0),
            task.duration,
        );

        player.update_location(&task.target);
        true
    }
}
