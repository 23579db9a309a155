//! HTTP surface - route construction and the proxy handler

pub mod routes;
