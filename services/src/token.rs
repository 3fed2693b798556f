use uuid::Uuid;

/// Mints the opaque token embedded in a session's QR code.
///
/// UUIDv4 carries 122 random bits, so tokens are practically unguessable and
/// pairwise distinct across all sessions ever created. The value encodes no
/// course or timing information.
pub fn mint_token() -> String {
    Uuid::new_v4().to_string()
}
