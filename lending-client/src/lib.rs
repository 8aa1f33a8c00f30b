// solana-lending-client — client-side helpers for liquidating obligations on
//                         a Solana token-lending program
// © 2024 by Composable Foundation
// © 2025 by Michał Nazarewicz <mina86@mina86.com>
//
// This program is free software; you can redistribute it and/or modify it under
// the terms of the GNU General Public License as published by the Free Software
// Foundation; either version 2 of the License, or (at your option) any later
// version.
//
// This program is distributed in the hope that it will be useful, but WITHOUT
// ANY WARRANTY; without even the implied warranty of MERCHANTABILITY or FITNESS
// FOR A PARTICULAR PURPOSE.  See the GNU General Public License for more
// details.
//
// You should have received a copy of the GNU General Public License along with
// this program; if not, see <https://www.gnu.org/licenses/>.

//! Client helpers for interacting with a Solana token-lending program.
//!
//! The lending program does all the interesting work on chain.  What’s left
//! for a client is building well-formed instructions and making sure the
//! token accounts those instructions refer to exist.  This crate covers both:
//!
//! - [`instruction`] serialises the *liquidate obligation* instruction and
//!   builds its ordered account list,
//! - [`layout`] parses raw SPL token account records,
//! - [`token`] builds instructions creating token accounts,
//! - [`account`] finds the largest token account an owner holds for a mint,
//!   creating the associated token account if there is none,
//! - [`send`] assembles, signs and submits transactions and
//! - [`notify`] forwards human-readable log lines to an optional webhook.
//!
//! Network access goes through the [`ledger::Ledger`] trait.  With the `rpc`
//! feature it is implemented for Solana’s non-blocking `RpcClient`.
//!
//! # Features
#![doc = document_features::document_features!()]

pub mod account;
mod error;
pub mod instruction;
pub mod layout;
pub mod ledger;
pub mod notify;
pub mod send;
pub mod token;

pub use error::{Error, Result};
