use std::io::Read;

use swapalloc::{Allocator, Arena, ArenaConfig, Buffer, Growth, SYSTEM};
use tracing::{Level, info};

/// Waits until the user presses ENTER when the demo runs with `--step`.
/// Useful when you want to inspect memory state with tools like `pmap`,
/// `htop` or `gdb` between the steps.
fn block_until_enter_pressed(
  step: bool,
) {
  if step {
    println!("\n>>> Press ENTER to continue...");
    let _ = std::io::stdin().bytes().next();
  }
}

/// Per-entity state, allocated the same way whatever backs the handle.
#[repr(C)]
struct EntityState<'a> {
  allocator: &'a dyn Allocator,
  position: [f32; 3],
  velocity: [f32; 3],
  frame: u64,
}

fn spawn_entity<'a>(
  allocator: &'a dyn Allocator,
) -> Option<&'a mut EntityState<'a>> {
  let state = allocator.zero_alloc(size_of::<EntityState>()) as *mut EntityState;

  if state.is_null() {
    return None;
  }

  unsafe {
    state.write(EntityState {
      allocator,
      position: [0.0; 3],
      velocity: [0.5, 1.0, 0.0],
      frame: 0,
    });
    Some(&mut *state)
  }
}

/// One simulated frame: integrate, then build a scratch label through the
/// entity's own allocator.
fn tick(
  entity: &mut EntityState<'_>,
) -> usize {
  entity.frame += 1;
  for axis in 0..3 {
    entity.position[axis] += entity.velocity[axis];
  }

  let mut label = Buffer::new(entity.allocator);
  let text = format!("frame {} at {:?}", entity.frame, entity.position);
  match label.extend_from_slice(text.as_bytes()) {
    Ok(()) => label.len(),
    Err(err) => {
      info!(%err, "label dropped");
      0
    }
  }
}

fn run(
  name: &str,
  allocator: &dyn Allocator,
  step: bool,
) {
  let Some(entity) = spawn_entity(allocator) else {
    info!(name, "could not allocate entity state");
    return;
  };
  info!(name, address = ?(&*entity as *const EntityState), "entity spawned");

  for _ in 0..4 {
    let written = tick(entity);
    info!(name, frame = entity.frame, written, "tick");
  }

  block_until_enter_pressed(step);

  let state = entity as *mut EntityState as *mut u8;
  unsafe { allocator.free(state) };
  info!(name, "entity released");
}

fn main() {
  tracing_subscriber::fmt().with_max_level(Level::DEBUG).init();

  let step = std::env::args().any(|arg| arg == "--step");

  // --------------------------------------------------------------------
  // 1) The host heap: every request maps straight onto malloc/free.
  // --------------------------------------------------------------------
  run("system", &SYSTEM, step);

  // --------------------------------------------------------------------
  // 2) An arena: same call sites, bump allocation, frees are no-ops.
  // --------------------------------------------------------------------
  let config = ArenaConfig::new(256).with_growth(Growth::Doubling);
  let mut arena = match Arena::system(config) {
    Ok(arena) => arena,
    Err(err) => {
      info!(%err, "arena rejected");
      return;
    }
  };

  run("arena", &arena, step);
  info!(
    blocks = arena.block_count(),
    capacity = arena.capacity(),
    used = arena.used(),
    "arena after first pass"
  );

  // --------------------------------------------------------------------
  // 3) Reset: everything goes at once, and the layout replays exactly.
  // --------------------------------------------------------------------
  arena.reset();
  let first = arena.alloc(8);
  info!(
    replayed = Some(first) == arena.first_block_base(),
    "arena after reset"
  );

  // --------------------------------------------------------------------
  // 4) End of demo. Dropping the arena hands its blocks back to the heap.
  // --------------------------------------------------------------------
  drop(arena);
  println!("\nEnd of demo.");
}
