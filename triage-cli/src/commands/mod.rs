//! One module per subcommand concern, mirroring the teacher's
//! `commands/episode.rs`-per-concern layout.

pub mod config;
pub mod experiment;
pub mod pattern;
pub mod pick;
pub mod run;
