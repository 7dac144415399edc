//! Reasons command implementation.

use crate::error::Result;
use crate::output::Formatter;

/// Execute the reasons command.
pub fn execute_reasons(formatter: &Formatter) -> Result<()> {
    println!("{}", formatter.format_reasons()?);
    Ok(())
}
