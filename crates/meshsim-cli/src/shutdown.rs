//! # meshsim-cli::shutdown
//!
//! Installs a SIGINT handler that flips a shared flag instead of exiting the
//! process directly, so the Driver can finish its current tick and print a
//! final summary before the run actually stops.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use anyhow::{Context, Result};

pub fn install() -> Result<Arc<AtomicBool>> {
    let flag = Arc::new(AtomicBool::new(false));
    let handler_flag = flag.clone();
    ctrlc::set_handler(move || {
        handler_flag.store(true, Ordering::Relaxed);
    })
    .context("installing SIGINT handler")?;
    Ok(flag)
}
