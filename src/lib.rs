//! Records interactions against a live document tree as replayable steps.
//!
//! `capture` turns an interaction into an [`Operation`](sequence::operation::Operation)
//! with two synthesized locators; `sequence` owns the ordered step list and
//! its persistence; `playback` gates which mutations are legal.

pub mod capture;
pub mod cli;
pub mod dom;
pub mod playback;
pub mod sequence;
pub mod trace;
pub mod transport;
