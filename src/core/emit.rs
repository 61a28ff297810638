//! Decision emitter: the boundary between [`Verdict`] and the hook host.
//!
//! Allow echoes the request verbatim on stdout and exits 0. Block writes a
//! delimited diagnostic on stderr, nothing on stdout, and exits
//! [`BLOCK_EXIT_CODE`], which the host reads as "deny and show the message".

use crate::core::gatekeeper::{BlockReason, Verdict};
use std::io::{self, Write};

pub const ALLOW_EXIT_CODE: u8 = 0;
pub const BLOCK_EXIT_CODE: u8 = 2;
/// Invocation problems (bad arguments). Never 2, which would read as a block.
pub const USAGE_EXIT_CODE: u8 = 1;

const RULE: &str = "================================================================";

pub fn render_block(reason: &BlockReason) -> String {
    format!(
        "==================== DELEGATE-GATE: BLOCKED ====================\n\
         check:       {}\n\
         resource:    {}\n\
         reason:      {}\n\
         remediation: {}\n\
         {}\n",
        reason.check, reason.resource, reason.message, reason.remediation, RULE
    )
}

/// Write the verdict to the host channels and return the exit code.
pub fn emit<O: Write, E: Write>(verdict: &Verdict, out: &mut O, err: &mut E) -> io::Result<u8> {
    match verdict {
        Verdict::Allow(payload) => {
            out.write_all(payload.as_bytes())?;
            out.flush()?;
            Ok(ALLOW_EXIT_CODE)
        }
        Verdict::Block(reason) => {
            err.write_all(render_block(reason).as_bytes())?;
            err.flush()?;
            Ok(BLOCK_EXIT_CODE)
        }
    }
}
