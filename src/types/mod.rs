//! Structured values carried inside packet bodies.

pub mod attribute;
pub mod block_action;
pub mod boss;
pub mod creative;
pub mod enchant;
pub mod entity;
pub mod game_rule;
pub mod item;
pub mod map;
pub mod math;
pub mod palette;
pub mod player;
pub mod recipe;
pub mod scoreboard;
pub mod stack_request;
pub mod sub_chunk;
pub mod transaction;

pub use item::ItemStack;
pub use math::{BlockCoordinates, Vec2, Vec3};
