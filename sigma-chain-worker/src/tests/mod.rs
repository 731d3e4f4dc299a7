// Copyright (c) 2022 SIGMA LABS <dev@sigmaengine.io>

mod scenarios_state;
pub(crate) mod tools;
