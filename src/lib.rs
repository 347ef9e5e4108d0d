//! # swapalloc - A Swappable Allocator Abstraction
//!
//! This crate lets application code obtain and release memory without
//! depending on a concrete allocation strategy. Every request funnels through
//! one call shape, and two interchangeable strategies implement it: the host
//! heap and a growable **arena** (bump) allocator.
//!
//! ## Overview
//!
//! ```text
//!   Call shape:
//!
//!   ┌──────────────┐  dispatch(op, new_size, old_size, old_ptr, user)  ┌──────────────────┐
//!   │  call site   │ ─────────────────────────────────────────────────▶│  &dyn Allocator  │
//!   │ (app, state) │ ◀─────────────────────────────────────────────────│                  │
//!   └──────────────┘                  ptr | null                       └────────┬─────────┘
//!                                                                               │
//!                                    ┌──────────────────────────────────────────┼──────┐
//!                                    ▼                                          ▼      │
//!                           ┌─────────────────┐                         ┌──────────────┐
//!                           │ SystemAllocator │◀──── blocks ────────────│    Arena     │
//!                           │ malloc / calloc │      (upstream)         │ bump offset  │
//!                           │ realloc / free  │                         │ over blocks  │
//!                           └─────────────────┘                         └──────────────┘
//! ```
//!
//! Four operations exist, no more: `Alloc`, `ZeroAlloc`, `Realloc`, `Free`.
//! The only failure is exhaustion, reported as a null pointer. The
//! `try_*` calls lift that into [`AllocError`].
//!
//! ## Crate Structure
//!
//! ```text
//!   swapalloc
//!   ├── align      - Alignment macros (align!, align_to!)
//!   ├── allocator  - AllocOp and the Allocator trait
//!   ├── arena      - Arena and the context-driven ArenaAllocator handle
//!   ├── block      - Backing block record (internal)
//!   ├── buffer     - Growable byte buffer over any allocator
//!   ├── config     - ArenaConfig and Growth policy
//!   ├── error      - AllocError
//!   └── system     - SystemAllocator (libc heap)
//! ```
//!
//! ## Quick Start
//!
//! ```rust
//! use swapalloc::{Allocator, Arena, ArenaConfig, SYSTEM};
//!
//! fn fill(allocator: &dyn Allocator) -> *mut u8 {
//!     let ptr = allocator.zero_alloc(64);
//!     assert!(!ptr.is_null());
//!     ptr
//! }
//!
//! // The host heap...
//! let ptr = fill(&SYSTEM);
//! unsafe { SYSTEM.free(ptr) };
//!
//! // ...or an arena, with no change at the call site.
//! let mut arena = Arena::system(ArenaConfig::new(4096)).unwrap();
//! let first = fill(&arena);
//! arena.reset();
//! assert_eq!(fill(&arena), first);
//! ```
//!
//! ## Arena Growth
//!
//! ```text
//!   block_size = 64, Growth::Doubling
//!
//!   blocks[0] ┌──────── 64 ────────┐
//!   blocks[1] ┌──────────────── 128 ───────────────┐
//!   blocks[2] ┌──────────────────────────────── 256 ───────────────────────────────┐
//!
//!   An oversized request gets a dedicated block sized exactly to it, and the
//!   next regular block keeps following the doubling sequence.
//! ```
//!
//! ## Limitations
//!
//! - **Single-threaded only**: no allocator here synchronizes; share an
//!   arena across threads only behind your own lock, or give each thread one
//! - **No per-allocation reclamation in arenas**: `Free` is a no-op, memory
//!   comes back on `reset`, `release` or drop
//! - **Natural alignment only**: every pointer is aligned to
//!   [`NATURAL_ALIGN`](align::NATURAL_ALIGN) unless an arena is configured
//!   with a stricter alignment
//!
//! ## Safety
//!
//! `Realloc` and `Free` take raw pointers and are `unsafe`: the pointer must
//! come from the same allocator and still be live. Arena pointers die with the
//! arena's next reset, release or drop.

pub mod align;
pub mod allocator;
pub mod arena;
mod block;
pub mod buffer;
pub mod config;
pub mod error;
pub mod system;

pub use allocator::{AllocOp, Allocator, ContextFree};
pub use arena::{Arena, ArenaAllocator};
pub use buffer::Buffer;
pub use config::{ArenaConfig, Growth};
pub use error::{AllocError, AllocResult};
pub use system::{SYSTEM, SystemAllocator};
