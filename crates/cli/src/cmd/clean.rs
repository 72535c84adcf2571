//! Implementation of the `clean` command.

use anyhow::Result;

use super::{ProjectContext, selected_parts};
use crate::output::print_success;

pub fn cmd_clean(ctx: &ProjectContext, parts: &[String]) -> Result<()> {
  let mut lifecycle = ctx.lifecycle()?;
  lifecycle.clean(selected_parts(parts))?;

  match selected_parts(parts) {
    Some(names) => print_success(&format!("Cleaned {}", names.join(", "))),
    None => print_success("Cleaned all parts"),
  }
  Ok(())
}
