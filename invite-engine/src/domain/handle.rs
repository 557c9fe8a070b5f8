//! `username#1234` handles used when searching for a friend to add.

use std::fmt;

use crate::error::{EngineError, EngineResult};

pub const DISCRIMINATOR_LEN: usize = 4;

/// A parsed user handle: username plus numeric discriminator.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Handle {
    pub username: String,
    pub discriminator: String,
}

impl Handle {
    /// Parse `username#1234`. The split happens at the *last* `#`, so a
    /// username containing `#` still resolves as long as the suffix is a
    /// 4-digit discriminator.
    pub fn parse(input: &str) -> EngineResult<Handle> {
        let Some(sep) = input.rfind('#') else {
            return Err(EngineError::Validation(
                "handle must look like username#1234".to_string(),
            ));
        };

        let username = &input[..sep];
        let discriminator = &input[sep + 1..];
        if username.is_empty() {
            return Err(EngineError::Validation("handle has no username".to_string()));
        }
        if discriminator.len() != DISCRIMINATOR_LEN
            || !discriminator.bytes().all(|b| b.is_ascii_digit())
        {
            return Err(EngineError::Validation(format!(
                "discriminator must be {DISCRIMINATOR_LEN} digits"
            )));
        }

        Ok(Handle {
            username: username.to_string(),
            discriminator: discriminator.to_string(),
        })
    }
}

impl fmt::Display for Handle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}#{}", self.username, self.discriminator)
    }
}
