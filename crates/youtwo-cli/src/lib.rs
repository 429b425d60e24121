//! # YouTwo CLI
//!
//! Library half of the `youtwo` binary: argument definitions in [`cli`],
//! one module per subcommand in [`commands`], and graph source selection in
//! [`source`].

pub mod cli;
pub mod commands;
pub mod source;
