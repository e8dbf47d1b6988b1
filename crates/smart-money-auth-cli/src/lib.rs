/*
[INPUT]:  CLI configuration sources
[OUTPUT]: Public CLI library surface
[POS]:    Crate root - module wiring
[UPDATE]: When public modules or exports change
*/

pub mod config;

pub use config::CliConfig;
