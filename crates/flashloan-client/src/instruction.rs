//! Flashloan program instruction encoding.
//!
//! The program has no finalized binary schema. The opcode is written as its
//! JSON number text (`0` → `b"0"`), followed by the raw payload bytes.

use solana_program::instruction::{AccountMeta, Instruction};
use solana_program::pubkey::Pubkey;

use crate::errors::{FlashloanError, FlashloanResult};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FlashloanInstruction {
    Init = 0,
    ExecuteOperation = 1,
    Call = 2,
}

impl FlashloanInstruction {
    pub fn tag(self) -> u8 {
        self as u8
    }

    /// Split instruction data into its opcode and payload.
    pub fn from_tag(data: &[u8]) -> Option<(Self, &[u8])> {
        let (&first, rest) = data.split_first()?;
        let op = match first {
            b'0' => Self::Init,
            b'1' => Self::ExecuteOperation,
            b'2' => Self::Call,
            _ => return None,
        };
        Some((op, rest))
    }

    pub fn encode(self, payload: &[u8]) -> FlashloanResult<Vec<u8>> {
        let mut out = serde_json::to_vec(&self.tag())
            .map_err(|e| FlashloanError::configuration(format!("encode opcode: {e}")))?;
        out.extend_from_slice(payload);
        Ok(out)
    }
}

/// An instruction for the flashloan program before encoding.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InstructionCall {
    pub program_id: Pubkey,
    pub accounts: Vec<AccountMeta>,
    pub opcode: FlashloanInstruction,
    pub payload: Vec<u8>,
}

impl InstructionCall {
    pub fn into_instruction(self) -> FlashloanResult<Instruction> {
        let data = self.opcode.encode(&self.payload)?;
        Ok(Instruction {
            program_id: self.program_id,
            accounts: self.accounts,
            data,
        })
    }
}
