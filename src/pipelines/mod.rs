//! Render pipelines.
//!
//! - `basic` builds the PBR scene pipeline and the shared pipeline helper
//! - `post` holds the [`post::Composer`], the fixed scene → RGB shift chain

pub mod basic;
pub mod post;
