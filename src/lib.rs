#![allow(clippy::needless_arbitrary_self_type)]
pub mod client;
pub mod error;
pub mod model;
pub mod poll;
pub mod scene_selection;
pub mod workflow;
