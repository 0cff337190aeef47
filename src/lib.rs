// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! ExoQuest Research API - Researcher Authentication & Community Service
//!
//! Issues signed bearer tokens to ExoQuest researchers and serves the
//! research community feed behind them.
//!
//! ## Modules
//!
//! - `api` - HTTP API handlers (Axum)
//! - `auth` - Password hashing, session tokens, authorization gate
//! - `storage` - Researcher store (redb, in-memory) and connection pool

pub mod api;
pub mod auth;
pub mod config;
pub mod error;
pub mod models;
pub mod state;
pub mod storage;
pub mod tls;
