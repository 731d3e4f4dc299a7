// Copyright (c) 2022 SIGMA LABS <dev@sigmaengine.io>

mod config;
mod tools;

pub use config::*;
pub use tools::*;
