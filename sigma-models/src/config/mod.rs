// Copyright (c) 2022 SIGMA LABS <dev@sigmaengine.io>
//! Protocol constants.
//!
//! These values are the hard-coded defaults of the chain configuration. Code
//! applying blocks reads them through the configuration structure it is given,
//! never directly, so tests can run with shorter periods.

pub mod constants;
