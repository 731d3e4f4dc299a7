// Copyright (c) 2022 SIGMA LABS <dev@sigmaengine.io>

use sigma_hash::Hash;
use sigma_models::config::constants::PUBLIC_KEY_PREFIX;
use sigma_models::{AccountName, Approval, Authority, AuthorityLevel, PublicKey};
use std::str::FromStr;

/// Parses an account name, panicking on invalid input
pub fn account(name: &str) -> AccountName {
    AccountName::from_str(name).expect("invalid test account name")
}

/// Deterministic public key derived from `seed`
pub fn test_public_key(seed: &str) -> PublicKey {
    let data = bs58::encode(Hash::compute_from(seed.as_bytes()).to_bytes()).into_string();
    PublicKey::from_str(&format!("{}{}", PUBLIC_KEY_PREFIX, data)).expect("invalid test key")
}

/// Single-key authority derived from `seed`
pub fn key_authority(seed: &str) -> Authority {
    Authority::from_key(test_public_key(seed))
}

/// Approval of `name` at `level`
pub fn approval(name: &str, level: AuthorityLevel) -> Approval {
    Approval::new(account(name), level)
}

/// Owner approval of `name`
pub fn owner(name: &str) -> Approval {
    approval(name, AuthorityLevel::Owner)
}

/// Active approval of `name`
pub fn active(name: &str) -> Approval {
    approval(name, AuthorityLevel::Active)
}

/// Posting approval of `name`
pub fn posting(name: &str) -> Approval {
    approval(name, AuthorityLevel::Posting)
}
