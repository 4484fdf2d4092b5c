// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Abstract adapter capability sets over the two external collaborators:
//! the recursive resolver's rewrite API ([`dns`]) and the reverse proxy's
//! control API ([`proxy`]).
//!
//! Concrete adapters (`dns::adguard::AdGuardDnsProvider`,
//! `proxy::traefik::TraefikProxyProvider`) never leak their transport
//! details to the reconciler; it only ever sees the trait objects defined
//! here.

pub mod dns;
pub mod proxy;
