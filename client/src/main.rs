use log::{debug, info, LevelFilter};

use rv_core::initialize_logger;
use rv_core::types::{CharacterId, Direction, Location};

use client::animation::OffsetAnimation;
use client::movement::{Movement, MovementHandler, MovementMode};
use client::network::{ClientCommandType, RecordingSink};
use client::player::Player;
use client::preferences::{load_settings, UserSettings};
use client::world::{ClientMap, MapTile};

const FRAME_MS: u32 = 50;
/// Frames between a command going out and the answer coming back.
const SERVER_LATENCY_FRAMES: usize = 3;

/// A confirmation on its way back from the pretend server.
struct InFlight {
    frames_left: usize,
    mode: MovementMode,
    target: Location,
    duration: u32,
}

/// Headless demonstration of the movement pipeline: a player walks east
/// across a small map while a pretend server confirms each step with a
/// little latency.
fn main() {
    let settings: UserSettings = load_settings(std::path::Path::new("settings.json"));
    let log_level: LevelFilter = settings.log_level.parse().unwrap_or(LevelFilter::Info);
    if let Err(e) = initialize_logger(log_level, None) {
        eprintln!("Unable to initialize logging: {e}");
        return;
    }

    let mut map = ClientMap::new();
    for x in 0..40 {
        for y in 0..40 {
            map.insert(x, y, 0, MapTile::new(2));
        }
    }

    let mut player = Player::new(Location::from_server(10, 10, 0));
    player.set_id(CharacterId(1));
    let mut movement = Movement::new(player, OffsetAnimation::new(), RecordingSink::new());
    movement.set_default_mode(settings.default_movement_mode);
    movement.activate_keyboard_handler();
    if let Some(keyboard) = movement.handler_mut().and_then(MovementHandler::keyboard_mut) {
        keyboard.press(Direction::East);
    }

    info!(
        "starting at {}, walking east",
        movement.player().location()
    );

    let mut in_flight: Vec<InFlight> = Vec::new();
    for frame in 0..40 {
        // Release the key after a while so the walk winds down.
        if frame == 25 {
            if let Some(keyboard) = movement.handler_mut().and_then(MovementHandler::keyboard_mut)
            {
                keyboard.release(Direction::East);
            }
        }

        // Deliver confirmations whose latency has elapsed.
        let mut still_waiting = Vec::new();
        for mut answer in in_flight.drain(..) {
            if answer.frames_left == 0 {
                debug!("server confirms move to {}", answer.target);
                movement.handle_server_move(answer.mode, answer.target, answer.duration);
            } else {
                answer.frames_left -= 1;
                still_waiting.push(answer);
            }
        }
        in_flight = still_waiting;

        movement.update(&map, FRAME_MS);

        // Pick up what the client sent and fake the server's side of it.
        for command in movement.sink_mut().drain() {
            if command.command_type() != ClientCommandType::CmdMove {
                continue;
            }
            let payload = command.payload();
            let (Some(&mode_id), Some(&direction_id)) = (payload.get(4), payload.get(5)) else {
                continue;
            };
            let mode = match mode_id {
                2 => MovementMode::Run,
                _ => MovementMode::Walk,
            };
            let Some(direction) = Direction::from_id(direction_id) else {
                continue;
            };
            let mut target = movement.server_location().clone();
            target.move_by(direction);
            if mode == MovementMode::Run {
                target.move_by(direction);
            }
            in_flight.push(InFlight {
                frames_left: SERVER_LATENCY_FRAMES,
                mode,
                target,
                duration: 300,
            });
        }

        debug!(
            "frame {frame:2}: player at {}, offset {:?}, moving: {}",
            movement.player().location(),
            movement.current_offset(),
            movement.is_moving()
        );
    }

    info!(
        "done, player ended up at {} (server: {})",
        movement.player().location(),
        movement.server_location()
    );
}
