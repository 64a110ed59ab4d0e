#![deny(unused_variables)]
#![deny(dead_code)]
#![deny(unused_imports)]
#![deny(clippy::no_effect_underscore_binding)]

#[path = "../shared/config.rs"]
pub mod config;

#[path = "../heatmap/mod.rs"]
pub mod heatmap;

#[path = "../prevalence/mod.rs"]
pub mod prevalence;
