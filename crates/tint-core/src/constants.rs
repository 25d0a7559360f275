//! Protocol constants. All monetary values are in the ledger's smallest unit.

/// Size of a serialized color identifier: one type byte plus a 32-byte digest.
pub const COLOR_ID_SIZE: usize = 33;

/// Size of a pubkey hash or script hash embedded in a locking script.
pub const HASH160_SIZE: usize = 20;

/// Fixed supply of an NFT color.
pub const NFT_SUPPLY: u64 = 1;

/// Default fee charged by the fixed fee policy.
pub const DEFAULT_FIXED_FEE: u64 = 10_000;

/// Extra plain value reserved on top of the fee when burning tokens, so an
/// output holding exactly the fee is not picked as the only funding source.
pub const DEFAULT_DUST_BUFFER: u64 = 600;

/// Transaction version produced by the builder.
pub const TX_VERSION: u32 = 1;

/// Script opcodes used by the standard locking-script shapes.
pub mod opcodes {
    pub const OP_DUP: u8 = 0x76;
    pub const OP_HASH160: u8 = 0xa9;
    pub const OP_EQUAL: u8 = 0x87;
    pub const OP_EQUALVERIFY: u8 = 0x88;
    pub const OP_CHECKSIG: u8 = 0xac;
    /// Marks the preceding push as a color identifier.
    pub const OP_COLOR: u8 = 0xbc;
}
