//! Local persistent todo state.

pub mod storage;
pub mod todos;
