// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Middleware modules (authentication, page redirects, security headers).

pub mod auth;
pub mod pages;
pub mod security;

pub use auth::{attach_viewer, require_auth};
pub use pages::redirect_pages;
