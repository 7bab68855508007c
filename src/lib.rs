extern crate serde;
extern crate serde_json;

extern crate clap;
extern crate itertools;
#[macro_use]
extern crate lazy_static;
#[macro_use]
extern crate tracing;
extern crate tracing_subscriber;

pub mod cluster;
pub mod cluster_container;
pub mod errors;
pub mod file_format;
pub mod label_selection;
pub mod logging;
pub mod scene;
