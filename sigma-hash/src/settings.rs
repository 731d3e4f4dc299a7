// Copyright (c) 2022 SIGMA LABS <dev@sigmaengine.io>

/// Hash size
pub const HASH_SIZE_BYTES: usize = 32;
