//! TCP acceptor.

pub mod listener;
