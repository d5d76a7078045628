//! # Core-Chain Transactions
//!
//! Just enough of the core chain's consensus serialization to find the
//! output an asset lock points at:
//!
//! ```text
//! u16 version | u16 type | varint n_in  | inputs  | varint n_out | outputs
//! | u32 lock_time | [varint len | extra payload]   (version >= 3, type != 0)
//!
//! input  = 32-byte prev hash | u32 prev index | varint len | script | u32 sequence
//! output = u64 satoshis | varint len | script
//! ```
//!
//! All integers are little-endian. Witness data is not part of this format.
//! [`CoreTransaction::to_bytes`] writes exactly what [`CoreTransaction::from_bytes`]
//! reads, so a parsed transaction re-serializes to the same txid.

use super::AssetLockError;
use crate::config::PUBLIC_KEY_HASH_LENGTH;
use crate::crypto::hash::{double_sha256, Hash256};

/// `OP_RETURN`
const OP_RETURN: u8 = 0x6a;

/// Special transactions carry an extra payload from this version on.
const SPECIAL_TRANSACTION_VERSION: u16 = 3;

/// Upper bound on input/output counts so a hostile length prefix cannot
/// make us allocate gigabytes.
const MAX_ITEMS: u64 = 100_000;

/// Smallest encodings: hash, index, empty script, sequence.
const MIN_INPUT_SIZE: usize = 32 + 4 + 1 + 4;
/// Value and empty script.
const MIN_OUTPUT_SIZE: usize = 8 + 1;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransactionInput {
    pub previous_tx_hash: Hash256,
    pub previous_output_index: u32,
    pub script: Vec<u8>,
    pub sequence: u32,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransactionOutput {
    /// Value in duffs (satoshis).
    pub satoshis: u64,
    pub script: Vec<u8>,
}

impl TransactionOutput {
    /// Output that burns `satoshis` and commits to `public_key_hash`.
    pub fn asset_lock(satoshis: u64, public_key_hash: [u8; PUBLIC_KEY_HASH_LENGTH]) -> Self {
        let mut script = Vec::with_capacity(2 + PUBLIC_KEY_HASH_LENGTH);
        script.push(OP_RETURN);
        script.push(PUBLIC_KEY_HASH_LENGTH as u8);
        script.extend_from_slice(&public_key_hash);
        Self { satoshis, script }
    }

    /// The 20-byte public-key hash committed to by an
    /// `OP_RETURN <20 bytes>` script.
    pub fn asset_lock_public_key_hash(&self) -> Result<[u8; PUBLIC_KEY_HASH_LENGTH], AssetLockError> {
        match self.script.as_slice() {
            [OP_RETURN, len, hash @ ..]
                if usize::from(*len) == PUBLIC_KEY_HASH_LENGTH && hash.len() == PUBLIC_KEY_HASH_LENGTH =>
            {
                let mut out = [0u8; PUBLIC_KEY_HASH_LENGTH];
                out.copy_from_slice(hash);
                Ok(out)
            }
            _ => Err(AssetLockError::InvalidOutputScript {
                script: hex::encode(&self.script),
            }),
        }
    }
}

/// A parsed core-chain transaction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CoreTransaction {
    pub version: u16,
    pub transaction_type: u16,
    pub inputs: Vec<TransactionInput>,
    pub outputs: Vec<TransactionOutput>,
    pub lock_time: u32,
    pub extra_payload: Option<Vec<u8>>,
}

impl CoreTransaction {
    /// A plain version-2 transaction with the given outputs and no inputs.
    /// Handy for building asset locks in tests and tooling.
    pub fn with_outputs(outputs: Vec<TransactionOutput>) -> Self {
        Self {
            version: 2,
            transaction_type: 0,
            inputs: Vec::new(),
            outputs,
            lock_time: 0,
            extra_payload: None,
        }
    }

    pub fn from_bytes(bytes: &[u8]) -> Result<Self, AssetLockError> {
        let mut reader = Reader::new(bytes);

        let version = reader.read_u16("version")?;
        let transaction_type = reader.read_u16("type")?;

        let input_count = reader.read_count("input count", MIN_INPUT_SIZE)?;
        let mut inputs = Vec::with_capacity(input_count);
        for _ in 0..input_count {
            let previous_tx_hash = reader.read_array::<32>("input.prev_hash")?;
            let previous_output_index = reader.read_u32("input.prev_index")?;
            let script_len = reader.read_len("input.script_len")?;
            let script = reader.read_bytes(script_len, "input.script")?.to_vec();
            let sequence = reader.read_u32("input.sequence")?;
            inputs.push(TransactionInput {
                previous_tx_hash,
                previous_output_index,
                script,
                sequence,
            });
        }

        let output_count = reader.read_count("output count", MIN_OUTPUT_SIZE)?;
        let mut outputs = Vec::with_capacity(output_count);
        for _ in 0..output_count {
            let satoshis = reader.read_u64("output.value")?;
            let script_len = reader.read_len("output.script_len")?;
            let script = reader.read_bytes(script_len, "output.script")?.to_vec();
            outputs.push(TransactionOutput { satoshis, script });
        }

        let lock_time = reader.read_u32("lock_time")?;

        let extra_payload = if version >= SPECIAL_TRANSACTION_VERSION && transaction_type != 0 {
            let len = reader.read_len("extra_payload_len")?;
            Some(reader.read_bytes(len, "extra_payload")?.to_vec())
        } else {
            None
        };

        if !reader.is_empty() {
            return Err(AssetLockError::InvalidTransaction(format!(
                "{} trailing bytes",
                reader.remaining()
            )));
        }

        Ok(Self {
            version,
            transaction_type,
            inputs,
            outputs,
            lock_time,
            extra_payload,
        })
    }

    pub fn to_bytes(&self) -> Vec<u8> {
        let mut out = Vec::new();
        out.extend_from_slice(&self.version.to_le_bytes());
        out.extend_from_slice(&self.transaction_type.to_le_bytes());

        write_varint(&mut out, self.inputs.len() as u64);
        for input in &self.inputs {
            out.extend_from_slice(&input.previous_tx_hash);
            out.extend_from_slice(&input.previous_output_index.to_le_bytes());
            write_varint(&mut out, input.script.len() as u64);
            out.extend_from_slice(&input.script);
            out.extend_from_slice(&input.sequence.to_le_bytes());
        }

        write_varint(&mut out, self.outputs.len() as u64);
        for output in &self.outputs {
            out.extend_from_slice(&output.satoshis.to_le_bytes());
            write_varint(&mut out, output.script.len() as u64);
            out.extend_from_slice(&output.script);
        }

        out.extend_from_slice(&self.lock_time.to_le_bytes());

        if self.version >= SPECIAL_TRANSACTION_VERSION && self.transaction_type != 0 {
            let payload = self.extra_payload.as_deref().unwrap_or_default();
            write_varint(&mut out, payload.len() as u64);
            out.extend_from_slice(payload);
        }
        out
    }

    /// Transaction id in internal byte order: `double_sha256(bytes)`.
    pub fn hash(&self) -> Hash256 {
        double_sha256(&self.to_bytes())
    }

    pub fn output(&self, index: u32) -> Result<&TransactionOutput, AssetLockError> {
        self.outputs
            .get(index as usize)
            .ok_or(AssetLockError::OutputNotFound {
                output_index: index,
                output_count: self.outputs.len(),
            })
    }
}

fn write_varint(out: &mut Vec<u8>, value: u64) {
    match value {
        0..=0xfc => out.push(value as u8),
        0xfd..=0xffff => {
            out.push(0xfd);
            out.extend_from_slice(&(value as u16).to_le_bytes());
        }
        0x1_0000..=0xffff_ffff => {
            out.push(0xfe);
            out.extend_from_slice(&(value as u32).to_le_bytes());
        }
        _ => {
            out.push(0xff);
            out.extend_from_slice(&value.to_le_bytes());
        }
    }
}

// ---------------------------------------------------------------------------
// Reader
// ---------------------------------------------------------------------------

struct Reader<'a> {
    data: &'a [u8],
}

impl<'a> Reader<'a> {
    fn new(data: &'a [u8]) -> Self {
        Self { data }
    }

    fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    fn remaining(&self) -> usize {
        self.data.len()
    }

    fn read_bytes(&mut self, len: usize, context: &'static str) -> Result<&'a [u8], AssetLockError> {
        if self.data.len() < len {
            return Err(AssetLockError::InvalidTransaction(format!(
                "unexpected end of data reading {context}"
            )));
        }
        let (head, tail) = self.data.split_at(len);
        self.data = tail;
        Ok(head)
    }

    fn read_array<const N: usize>(&mut self, context: &'static str) -> Result<[u8; N], AssetLockError> {
        let mut out = [0u8; N];
        out.copy_from_slice(self.read_bytes(N, context)?);
        Ok(out)
    }

    fn read_u16(&mut self, context: &'static str) -> Result<u16, AssetLockError> {
        Ok(u16::from_le_bytes(self.read_array(context)?))
    }

    fn read_u32(&mut self, context: &'static str) -> Result<u32, AssetLockError> {
        Ok(u32::from_le_bytes(self.read_array(context)?))
    }

    fn read_u64(&mut self, context: &'static str) -> Result<u64, AssetLockError> {
        Ok(u64::from_le_bytes(self.read_array(context)?))
    }

    fn read_varint(&mut self, context: &'static str) -> Result<u64, AssetLockError> {
        let [prefix] = self.read_array::<1>(context)?;
        Ok(match prefix {
            0xfd => u64::from(self.read_u16(context)?),
            0xfe => u64::from(self.read_u32(context)?),
            0xff => self.read_u64(context)?,
            n => u64::from(n),
        })
    }

    /// A length prefix that must fit in what is left of the buffer.
    fn read_len(&mut self, context: &'static str) -> Result<usize, AssetLockError> {
        let len = self.read_varint(context)?;
        if len > self.data.len() as u64 {
            return Err(AssetLockError::InvalidTransaction(format!(
                "{context} of {len} exceeds remaining {} bytes",
                self.data.len()
            )));
        }
        Ok(len as usize)
    }

    /// An item count whose items, at `min_item_size` bytes each, must fit in
    /// what is left of the buffer. The result is safe to pre-allocate.
    fn read_count(&mut self, context: &'static str, min_item_size: usize) -> Result<usize, AssetLockError> {
        let count = self.read_varint(context)?;
        if count > MAX_ITEMS {
            return Err(AssetLockError::InvalidTransaction(format!(
                "{context} of {count} exceeds {MAX_ITEMS}"
            )));
        }
        let fits = (self.data.len() / min_item_size.max(1)) as u64;
        if count > fits {
            return Err(AssetLockError::InvalidTransaction(format!(
                "{context} of {count} cannot fit in remaining {} bytes",
                self.data.len()
            )));
        }
        Ok(count as usize)
    }
}
