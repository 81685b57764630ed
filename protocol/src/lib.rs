// Copyright (c) 2026 ALAS Technology. MIT License.
// See LICENSE for details.

//! # Burst Protocol — Core Library
//!
//! Chain model and Economic Clustering for a Burst-lineage
//! proof-of-capacity node.
//!
//! Proof-of-capacity shares proof-of-stake's oldest headache: forging a
//! competing history costs almost nothing. Economic Clustering answers it by
//! making every transaction commit to a recent block of the chain its sender
//! saw. A fork that lacks that block cannot carry the transaction, so a
//! cheap private fork ends up with none of the network's economic activity.
//!
//! ## Architecture
//!
//! - **config** — Protocol constants and the tunable [`config::EcParams`].
//! - **crypto** — SHA-256 ids, Ed25519 keys, constant-time comparisons.
//! - **storage** — Blocks, the [`storage::Chain`] trait, the in-memory chain.
//! - **transaction** — Transaction construction, signing and validation.
//! - **consensus** — Anchor selection, fork verification, feature schedule.
//! - **network** — The unconfirmed transaction pool.
//!
//! ## Design Philosophy
//!
//! 1. Peer input is answered with yes or no. Reasons go to the log.
//! 2. No global state. Chains, schedules and authenticators are passed in.
//! 3. Every traversal is bounded by a protocol constant, never by chain length.
//! 4. If it touches consensus, it has tests. Plural.

pub mod config;
pub mod consensus;
pub mod crypto;
pub mod network;
pub mod storage;
pub mod transaction;
