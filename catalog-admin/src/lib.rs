/*
 * catalog-admin - browse and edit a product catalog from the terminal
 *
 * SPDX-FileCopyrightText: 2025-2026 Steve Schoettler
 * SPDX-License-Identifier: Apache-2.0
 */
//! Admin screens for a product catalog.
//!
//! [`state`] holds the screen logic: the paginated product list, the item
//! editor with its independently loading tiers, and the image and location
//! pickers. It is synchronous and has no terminal or network code, so every
//! transition can be tested directly.
//!
//! [`tui`] drives those screens in a terminal with `ratatui`, running
//! fetches on a tokio runtime through the `catalog` client.
#![warn(clippy::pedantic)]
#![warn(clippy::nursery)]
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::missing_const_for_fn)]
#![allow(clippy::must_use_candidate)]
#![warn(clippy::default_trait_access)]
#![warn(clippy::doc_markdown)]
#![warn(clippy::explicit_iter_loop)]
#![warn(clippy::implicit_clone)]
#![warn(clippy::match_same_arms)]
#![warn(clippy::option_if_let_else)]
#![warn(clippy::redundant_clone)]
#![warn(clippy::redundant_closure)]
#![warn(clippy::uninlined_format_args)]
#![warn(clippy::unused_async)]

pub mod state;
pub mod tui;
