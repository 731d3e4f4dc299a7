// Copyright (c) 2022 SIGMA LABS <dev@sigmaengine.io>

//! Evaluators grouped by concern. Each one checks every precondition with
//! reads only, then mutates.

pub(crate) mod account;
pub(crate) mod admin;
pub(crate) mod bobserver;
pub(crate) mod custom;
pub(crate) mod mining;
pub(crate) mod recovery;
pub(crate) mod savings;
pub(crate) mod staking;
pub(crate) mod supply;
pub(crate) mod transfer;
