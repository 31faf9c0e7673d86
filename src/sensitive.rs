//! Symmetric-cipher capability for sensitive detail blocks.

use crate::error::Result;

/// Encryption capability consumed when folding a sensitive block.
///
/// `encrypt` turns one sub-serialised block into ciphertext; `serialise`
/// renders that ciphertext as text placeable inside a value record.
pub trait Cipher: Send + Sync {
    /// Encrypt the plaintext of one folded block.
    fn encrypt(&self, plaintext: &[u8]) -> Result<Vec<u8>>;

    /// Render ciphertext as record-value text.
    fn serialise(&self, ciphertext: &[u8]) -> String;
}
