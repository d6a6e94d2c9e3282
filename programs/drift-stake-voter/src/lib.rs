//! # Introduction
//!
//! The Drift stake voter is an "addin" to the SPL governance program that
//! lets a wallet vote with the tokens it has staked in a Drift insurance
//! fund. This crate is the client side of that addin: it reads the accounts
//! involved, computes the weight the addin will write, and assembles the
//! instructions a front end has to send before voting.
//!
//! The flow for voting with the addin is as follows:
//!
//! - The realm has a `Registrar` naming the Drift program and spot market.
//! - The voter stakes into that spot market's insurance fund on Drift.
//! - Before voting, the client calls `update_voter_weight_record` so the
//!   addin writes a fresh `VoterWeightRecord` for the current slot.
//! - SPL governance reads that record as the voter's weight.
//!
//! # Weight
//!
//! A voter's weight is the input weight handed to the plugin (the
//! governance deposit, or the output of a previous plugin) plus the token
//! value of their insurance fund shares. Shares under an open withdraw
//! request count for the value locked in at request time, the rest count
//! pro-rata against the current vault balance. See
//! [`drift::unstake_shares_to_amount_with_open_request`].
//!
//! # Plugins
//!
//! [`VoterWeightPlugin`] is the interface shared by all voter weight
//! plugins. Plugins advertise what they support through
//! [`plugin::PluginCapabilities`]; the Drift plugin does not provide a max
//! voter weight, so [`VoterWeightPlugin::max_voter_weight`] returns `None`
//! for it and callers skip it when computing max weights.

use anchor_lang::prelude::*;

pub mod account;
pub mod client;
pub mod config;
pub mod context;
pub mod drift;
pub mod error;
pub mod fetch;
pub mod governance;
pub mod plugin;
pub mod realm_weights;
pub mod treasury;
pub mod weights;

pub use client::DriftVoterClient;
pub use error::{ClientError, Result};
pub use fetch::{AccountSource, Fetched, RawAccount};
pub use plugin::{UpdateVoterWeightInstructions, VoterWeightPlugin};

// The address of the Drift stake voter addin.
declare_id!("dVoTE1AJqkZVoE1mPbWcqYPmEEvAUBksHY2NiM2UJQe");
